//! Failure classification for user-facing replies
//!
//! Every failure that reaches a front end is mapped to an [`ErrorKind`] and a
//! fixed, friendly message. The raw error text travels separately in
//! `details` for logs and is never shown in place of the message.

use crate::data::DataError;
use crate::error::CoachError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Category of a failed turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    ApiKeyMissing,
    ApiConnectionFailed,
    ApiRateLimit,
    ApiAuthenticationError,
    ApiServerError,
    ApiBadRequest,
    PromptLoadError,
    UserDataLoadError,
    ContextGenerationError,
    ResponseParsingError,
    UnknownError,
}

impl ErrorKind {
    /// Wire name of the kind
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ApiKeyMissing => "API_KEY_MISSING",
            Self::ApiConnectionFailed => "API_CONNECTION_FAILED",
            Self::ApiRateLimit => "API_RATE_LIMIT",
            Self::ApiAuthenticationError => "API_AUTHENTICATION_ERROR",
            Self::ApiServerError => "API_SERVER_ERROR",
            Self::ApiBadRequest => "API_BAD_REQUEST",
            Self::PromptLoadError => "PROMPT_LOAD_ERROR",
            Self::UserDataLoadError => "USER_DATA_LOAD_ERROR",
            Self::ContextGenerationError => "CONTEXT_GENERATION_ERROR",
            Self::ResponseParsingError => "RESPONSE_PARSING_ERROR",
            Self::UnknownError => "UNKNOWN_ERROR",
        }
    }

    /// The message shown to the user for this kind
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::ApiKeyMissing => {
                "There's an issue with the application configuration. Please contact support."
            }
            Self::ApiAuthenticationError => {
                "Could not authenticate with the AI service. Please check configuration or contact support."
            }
            Self::ApiRateLimit => {
                "I'm experiencing high demand. Please try again in a few minutes."
            }
            Self::ApiServerError => {
                "The AI service is temporarily unavailable. Please try again later."
            }
            Self::ApiBadRequest => {
                "There was an issue with the request to the AI service. If this persists, contact support."
            }
            Self::PromptLoadError | Self::UserDataLoadError | Self::ContextGenerationError => {
                "I'm having trouble accessing necessary information. Please try again or contact support."
            }
            Self::ResponseParsingError => {
                "I received a response, but I'm having trouble understanding it. Could you try rephrasing?"
            }
            Self::ApiConnectionFailed => {
                "I'm having a little trouble connecting right now. Please try again in a moment."
            }
            Self::UnknownError => {
                "An unexpected issue occurred. Please try again. If it continues, contact support."
            }
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A classified failure, ready to show
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserFacingError {
    pub kind: ErrorKind,
    /// Friendly text for the user
    pub message: String,
    /// Raw error text, for logs only
    pub details: String,
}

impl UserFacingError {
    pub fn new(kind: ErrorKind, details: impl Into<String>) -> Self {
        Self {
            kind,
            message: kind.user_message().to_string(),
            details: details.into(),
        }
    }
}

impl fmt::Display for UserFacingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

fn kind_for_status(status: u16) -> Option<ErrorKind> {
    match status {
        401 | 403 => Some(ErrorKind::ApiAuthenticationError),
        429 => Some(ErrorKind::ApiRateLimit),
        400 => Some(ErrorKind::ApiBadRequest),
        500..=599 => Some(ErrorKind::ApiServerError),
        _ => None,
    }
}

fn kind_for_coach_error(error: &CoachError) -> Option<ErrorKind> {
    match error {
        CoachError::ApiKeyMissing => Some(ErrorKind::ApiKeyMissing),
        CoachError::Api { status, .. } => kind_for_status(*status),
        CoachError::Connection(_) | CoachError::Timeout(_) => Some(ErrorKind::ApiConnectionFailed),
        CoachError::PromptLoad(_) => Some(ErrorKind::PromptLoadError),
        CoachError::ContextGeneration(_) => Some(ErrorKind::ContextGenerationError),
        CoachError::ResponseParsing(_) => Some(ErrorKind::ResponseParsingError),
        CoachError::Config(_)
        | CoachError::Io(_)
        | CoachError::Serialization(_)
        | CoachError::Yaml(_) => None,
    }
}

fn kind_for_message(message: &str) -> ErrorKind {
    let lower = message.to_lowercase();
    if message.contains("OpenAI API key is not configured") {
        ErrorKind::ApiKeyMissing
    } else if message.contains("Failed to load base system prompt") {
        ErrorKind::PromptLoadError
    } else if message.contains("Failed to load or parse user data")
        || message.contains("User data is missing persona or daily_metrics")
    {
        ErrorKind::UserDataLoadError
    } else if message.contains("context message") {
        ErrorKind::ContextGenerationError
    } else if lower.contains("fetch")
        || lower.contains("network")
        || lower.contains("failed to get chat completion")
    {
        ErrorKind::ApiConnectionFailed
    } else {
        ErrorKind::UnknownError
    }
}

/// Map any failure to a [`UserFacingError`]
///
/// Typed errors anywhere in the chain are used first: API status codes, then
/// the [`CoachError`] variant, then [`DataError`]. Untyped errors fall back to
/// matching known phrases in the message text.
///
/// # Examples
///
/// ```
/// use recovery_coach::classifier::{classify, ErrorKind};
/// use recovery_coach::error::CoachError;
///
/// let err = anyhow::Error::from(CoachError::Api { status: 429, message: "slow down".into() });
/// let classified = classify(&err);
/// assert_eq!(classified.kind, ErrorKind::ApiRateLimit);
/// assert_eq!(classified.message, "I'm experiencing high demand. Please try again in a few minutes.");
/// ```
pub fn classify(error: &anyhow::Error) -> UserFacingError {
    let details = format!("{:#}", error);

    let typed = error.chain().find_map(|cause| {
        if let Some(coach) = cause.downcast_ref::<CoachError>() {
            return Some(kind_for_coach_error(coach));
        }
        if cause.downcast_ref::<DataError>().is_some() {
            return Some(Some(ErrorKind::UserDataLoadError));
        }
        None
    });

    let kind = match typed {
        Some(Some(kind)) => kind,
        // a typed error with no direct mapping still gets a look at its text
        Some(None) | None => kind_for_message(&details),
    };

    tracing::error!("Coach error: kind={}, details={}", kind, details);
    UserFacingError::new(kind, details)
}
