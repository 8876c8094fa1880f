//! HTTP chat API
//!
//! Routes:
//! - `GET /health` reports liveness
//! - `POST /api/chat` runs one coach turn, either in a server-held session
//!   (`{ "message", "session_id"? }`) or over a client-held conversation
//!   (`{ "messages": [...] }`)
//!
//! Failed turns are answered with the classified user-facing message and an
//! HTTP status derived from the error kind.

use crate::agent::{preprocess_user_message, Coach, SessionStore};
use crate::classifier::{ErrorKind, UserFacingError};
use crate::providers::{ChatMessage, Role};
use crate::response::ParsedResponse;
use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

/// Error text for a request with nothing to answer
pub const MESSAGE_REQUIRED: &str = "Message is required in the request body.";

/// Shared state for the HTTP handlers
#[derive(Clone)]
pub struct AppState {
    coach: Arc<Coach>,
    sessions: SessionStore,
}

impl AppState {
    pub fn new(coach: Arc<Coach>) -> Self {
        Self::with_sessions(coach, SessionStore::new())
    }

    /// State backed by a caller-configured session registry
    pub fn with_sessions(coach: Arc<Coach>, sessions: SessionStore) -> Self {
        Self { coach, sessions }
    }

    pub fn sessions(&self) -> &SessionStore {
        &self.sessions
    }
}

/// Body of `POST /api/chat`
#[derive(Debug, Default, Deserialize)]
pub struct ChatRequest {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub session_id: Option<Uuid>,
    #[serde(default)]
    pub messages: Option<Vec<ChatMessage>>,
}

/// Successful answer of `POST /api/chat`
#[derive(Debug, Serialize, Deserialize)]
pub struct ChatReply {
    pub reply: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<Uuid>,
    pub sections: ParsedResponse,
}

impl ChatReply {
    fn new(parsed: ParsedResponse, session_id: Option<Uuid>) -> Self {
        Self {
            reply: parsed.text(),
            session_id,
            sections: parsed,
        }
    }
}

/// Error body returned by the API
///
/// Failed turns carry only the user-facing message and kind; the underlying
/// error text is logged, never returned.
#[derive(Debug, Serialize)]
pub struct ApiError {
    #[serde(skip)]
    status: StatusCode,
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<ErrorKind>,
}

impl ApiError {
    fn bad_request(error: impl Into<String>, details: Option<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            error: error.into(),
            details,
            kind: None,
        }
    }
}

impl From<UserFacingError> for ApiError {
    fn from(e: UserFacingError) -> Self {
        Self {
            status: status_for_kind(e.kind),
            error: e.message,
            details: None,
            kind: Some(e.kind),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self)).into_response()
    }
}

/// HTTP status reported for a failed turn of the given kind
pub fn status_for_kind(kind: ErrorKind) -> StatusCode {
    match kind {
        ErrorKind::ApiRateLimit => StatusCode::TOO_MANY_REQUESTS,
        ErrorKind::ApiConnectionFailed => StatusCode::SERVICE_UNAVAILABLE,
        ErrorKind::ApiAuthenticationError
        | ErrorKind::ApiServerError
        | ErrorKind::ApiBadRequest
        | ErrorKind::ResponseParsingError => StatusCode::BAD_GATEWAY,
        ErrorKind::ApiKeyMissing
        | ErrorKind::PromptLoadError
        | ErrorKind::UserDataLoadError
        | ErrorKind::ContextGenerationError
        | ErrorKind::UnknownError => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// Build the API router
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/chat", post(chat))
        .with_state(state)
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "message": "Server is healthy"
    }))
}

async fn chat(
    State(state): State<AppState>,
    body: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Json<ChatReply>, ApiError> {
    let Json(request) = body.map_err(|rejection| {
        tracing::warn!("Rejected chat request: {}", rejection.body_text());
        ApiError::bad_request("Invalid request body.", Some(rejection.body_text()))
    })?;

    match request.messages {
        Some(messages) if !messages.is_empty() => chat_stateless(&state, messages).await,
        _ => chat_in_session(&state, request.message, request.session_id).await,
    }
}

async fn chat_in_session(
    state: &AppState,
    message: Option<String>,
    session_id: Option<Uuid>,
) -> Result<Json<ChatReply>, ApiError> {
    let message = message
        .as_deref()
        .and_then(preprocess_user_message)
        .ok_or_else(|| ApiError::bad_request(MESSAGE_REQUIRED, None))?;

    let coach = &state.coach;
    let shared = match session_id {
        Some(id) => {
            state
                .sessions
                .get_or_insert_with(id, || coach.new_session_with_id(id))
                .await
        }
        None => state.sessions.insert(coach.new_session()).await,
    };

    let mut session = shared.lock().await;
    let id = session.id();
    tracing::debug!("Chat turn for session {}", id);

    match coach.handle_turn(&mut session, message).await {
        Ok(parsed) => Ok(Json(ChatReply::new(parsed, Some(id)))),
        Err(e) => {
            tracing::error!("Session {} turn failed ({}): {}", id, e.kind, e.details);
            Err(e.into())
        }
    }
}

async fn chat_stateless(
    state: &AppState,
    mut messages: Vec<ChatMessage>,
) -> Result<Json<ChatReply>, ApiError> {
    let last = messages
        .pop()
        .filter(|m| m.role() == Role::User)
        .and_then(|m| preprocess_user_message(m.content()))
        .ok_or_else(|| ApiError::bad_request(MESSAGE_REQUIRED, None))?;
    messages.push(last);

    match state.coach.respond_to_messages(&messages).await {
        Ok(parsed) => Ok(Json(ChatReply::new(parsed, None))),
        Err(e) => {
            let e = crate::classifier::classify(&e);
            tracing::error!("Stateless turn failed ({}): {}", e.kind, e.details);
            Err(e.into())
        }
    }
}
