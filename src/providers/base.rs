//! Base provider trait and common message types
//!
//! This module defines the [`Provider`] trait the completion client drives,
//! along with the chat message type shared by the whole pipeline and the
//! per-request completion options.

use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Default model identifier sent to the completion API
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";

/// Default sampling temperature
pub const DEFAULT_TEMPERATURE: f32 = 0.7;

/// Default cap on generated tokens
pub const DEFAULT_MAX_TOKENS: u32 = 500;

/// Role of a chat message sender
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Pinned instructions that establish the coach's behavior
    System,
    /// A question or statement from the user
    User,
    /// A reply produced by the model
    Assistant,
}

impl Role {
    /// Wire representation of the role
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::System => "system",
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single message in a conversation
///
/// Messages are immutable once created; the fields are only reachable
/// through accessors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    role: Role,
    content: String,
}

impl ChatMessage {
    /// Creates a message with an explicit role
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    /// Creates a new system message
    ///
    /// # Examples
    ///
    /// ```
    /// use recovery_coach::providers::{ChatMessage, Role};
    ///
    /// let msg = ChatMessage::system("You are a recovery coach");
    /// assert_eq!(msg.role(), Role::System);
    /// ```
    pub fn system(content: impl Into<String>) -> Self {
        Self::new(Role::System, content)
    }

    /// Creates a new user message
    ///
    /// # Examples
    ///
    /// ```
    /// use recovery_coach::providers::{ChatMessage, Role};
    ///
    /// let msg = ChatMessage::user("How did I sleep?");
    /// assert_eq!(msg.role(), Role::User);
    /// assert_eq!(msg.content(), "How did I sleep?");
    /// ```
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    /// Creates a new assistant message
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }

    /// Role of the sender
    pub fn role(&self) -> Role {
        self.role
    }

    /// Text content of the message
    pub fn content(&self) -> &str {
        &self.content
    }

    /// Returns true for system messages
    pub fn is_system(&self) -> bool {
        self.role == Role::System
    }
}

/// Per-request options for the completion API
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletionOptions {
    /// Model identifier
    pub model: String,
    /// Sampling temperature
    pub temperature: f32,
    /// Maximum number of generated tokens
    pub max_tokens: u32,
}

impl Default for CompletionOptions {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            temperature: DEFAULT_TEMPERATURE,
            max_tokens: DEFAULT_MAX_TOKENS,
        }
    }
}

/// Chat completion backend
///
/// A provider performs exactly one request per call. Retry, backoff and
/// timeouts belong to [`crate::providers::CompletionClient`].
///
/// Implementations report API failures as
/// [`CoachError::Api`](crate::error::CoachError::Api) so the retry policy
/// and the classifier can read the status code, and transport failures as
/// [`CoachError::Connection`](crate::error::CoachError::Connection).
///
/// # Examples
///
/// ```
/// use async_trait::async_trait;
/// use recovery_coach::error::Result;
/// use recovery_coach::providers::{ChatMessage, CompletionOptions, Provider};
///
/// struct Echo;
///
/// #[async_trait]
/// impl Provider for Echo {
///     async fn complete(
///         &self,
///         messages: &[ChatMessage],
///         _options: &CompletionOptions,
///     ) -> Result<Option<String>> {
///         Ok(messages.last().map(|m| m.content().to_string()))
///     }
/// }
/// ```
#[async_trait]
pub trait Provider: Send + Sync {
    /// Sends the ordered messages and returns the first choice's content
    ///
    /// `Ok(None)` means the API answered successfully without any text.
    async fn complete(
        &self,
        messages: &[ChatMessage],
        options: &CompletionOptions,
    ) -> Result<Option<String>>;

    /// Human readable provider name used in logs
    fn name(&self) -> &str {
        "provider"
    }
}
