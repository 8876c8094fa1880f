//! Coach turn orchestration
//!
//! One turn runs the pipeline end to end:
//! - update the session state through the turn classifier
//! - append the user message to the session history
//! - send the recent window (system message pinned) to the completion client
//! - record the reply and parse it into sections
//!
//! Failures propagate as `anyhow::Error`; [`Coach::handle_turn`] maps them to
//! a [`UserFacingError`] for front ends.

use crate::agent::history::{DEFAULT_MAX_HISTORY, DEFAULT_RECENT_WINDOW};
use crate::agent::session::Session;
use crate::agent::state::{NoopClassifier, TurnClassifier};
use crate::classifier::{classify, UserFacingError};
use crate::config::Config;
use crate::data::MetricStore;
use crate::error::{CoachError, Result};
use crate::prompts::{system_message_for, PromptTemplate};
use crate::providers::{
    create_provider, ChatMessage, CompletionClient, CompletionOptions, RetryPolicy, Role,
};
use crate::response::{parse, ParsedResponse};
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Default number of days rendered in the recent trends block
pub const DEFAULT_TREND_DAYS: usize = 3;

/// Smallest context window: the system message plus the user's question
pub const MIN_RECENT_WINDOW: usize = 2;

/// The recovery coach
///
/// Holds everything shared between sessions: the completion client, the
/// prompt template and the metric store. Conversation state lives in
/// [`Session`]s passed to each call.
///
/// # Examples
///
/// ```no_run
/// use recovery_coach::agent::{preprocess_user_message, Coach};
/// use recovery_coach::config::Config;
///
/// # async fn example() -> recovery_coach::error::Result<()> {
/// let coach = Coach::from_config(&Config::default())?;
/// let mut session = coach.new_session();
/// let message = preprocess_user_message("Should I train hard today?").unwrap();
/// let reply = coach.respond(&mut session, message).await?;
/// println!("{}", reply.tldr.unwrap_or_default());
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct Coach {
    client: CompletionClient,
    options: CompletionOptions,
    template: PromptTemplate,
    store: Arc<MetricStore>,
    classifier: Arc<dyn TurnClassifier>,
    trend_days: usize,
    max_history: usize,
    recent_window: usize,
}

impl Coach {
    /// Creates a coach with default limits and a no-op turn classifier
    pub fn new(
        client: CompletionClient,
        options: CompletionOptions,
        template: PromptTemplate,
        store: Arc<MetricStore>,
    ) -> Self {
        Self {
            client,
            options,
            template,
            store,
            classifier: Arc::new(NoopClassifier),
            trend_days: DEFAULT_TREND_DAYS,
            max_history: DEFAULT_MAX_HISTORY,
            recent_window: DEFAULT_RECENT_WINDOW,
        }
    }

    /// Builds the coach described by the configuration
    ///
    /// The template and user data degrade to their fallbacks when missing.
    ///
    /// # Errors
    ///
    /// Returns error if the completion provider cannot be created
    pub fn from_config(config: &Config) -> Result<Self> {
        let provider = create_provider(&config.provider)?;
        let client = CompletionClient::new(provider, RetryPolicy::from_config(&config.retry));
        let template = PromptTemplate::load_or_builtin(&config.data.prompt_path);
        let store = Arc::new(MetricStore::load_or_empty(&config.data.user_data_path));

        info!(
            "Coach ready: model={}, {} days of metrics, builtin_template={}",
            config.provider.model,
            store.len(),
            template.is_builtin()
        );

        Ok(Self::new(
            client,
            config.provider.completion_options(),
            template,
            store,
        )
        .with_limits(
            config.conversation.max_history,
            config.conversation.recent_window,
        )
        .with_trend_days(config.data.trend_days))
    }

    /// Sets the history cap and the per-turn context window
    ///
    /// The window always holds at least the system message and the latest
    /// user message.
    pub fn with_limits(mut self, max_history: usize, recent_window: usize) -> Self {
        self.max_history = max_history;
        self.recent_window = recent_window.max(MIN_RECENT_WINDOW);
        self
    }

    pub fn with_trend_days(mut self, trend_days: usize) -> Self {
        self.trend_days = trend_days;
        self
    }

    /// Installs a classifier that updates session state on each turn
    pub fn with_classifier(mut self, classifier: Arc<dyn TurnClassifier>) -> Self {
        self.classifier = classifier;
        self
    }

    pub fn store(&self) -> &MetricStore {
        &self.store
    }

    pub fn options(&self) -> &CompletionOptions {
        &self.options
    }

    pub fn template(&self) -> &PromptTemplate {
        &self.template
    }

    /// The system message grounding every session
    pub fn system_message(&self) -> ChatMessage {
        system_message_for(&self.template, &self.store, self.trend_days)
    }

    /// Starts a new session seeded with the system message
    pub fn new_session(&self) -> Session {
        Session::new(self.system_message(), self.max_history)
    }

    /// Starts a new session under a caller-chosen id
    pub fn new_session_with_id(&self, id: Uuid) -> Session {
        Session::with_id(id, self.system_message(), self.max_history)
    }

    /// Clears a session back to just the system message
    pub fn reset_session(&self, session: &mut Session) {
        session.reset(self.system_message());
    }

    /// Runs one turn for `message` in `session`
    ///
    /// The user message stays in the history even if the completion fails.
    /// An empty completion yields the canned fallback reply and is not
    /// recorded in the history.
    ///
    /// # Errors
    ///
    /// Returns the completion client's error after retries are exhausted or
    /// for non-retryable failures
    pub async fn respond(
        &self,
        session: &mut Session,
        message: ChatMessage,
    ) -> Result<ParsedResponse> {
        if message.role() != Role::User {
            return Err(CoachError::ContextGeneration(format!(
                "expected a user message, got {}",
                message.role()
            ))
            .into());
        }

        let update = self.classifier.classify(&message, session.state());
        if !update.is_empty() {
            debug!("Session {} state update: {:?}", session.id(), update);
            session.state_mut().apply(update);
        }

        session.history_mut().append(message);
        let context = session.history().recent_with_system(self.recent_window);
        debug!(
            "Session {}: sending {} of {} messages",
            session.id(),
            context.len(),
            session.history().len()
        );

        match self.client.complete(&context, &self.options).await? {
            Some(text) => {
                session
                    .history_mut()
                    .append(ChatMessage::assistant(text.clone()));
                Ok(parse(&text))
            }
            None => {
                warn!("Session {}: model returned no text", session.id());
                Ok(parse(""))
            }
        }
    }

    /// Runs one turn and classifies any failure
    pub async fn handle_turn(
        &self,
        session: &mut Session,
        message: ChatMessage,
    ) -> std::result::Result<ParsedResponse, UserFacingError> {
        self.respond(session, message)
            .await
            .map_err(|e| classify(&e))
    }

    /// Answers a client-held conversation without touching any stored session
    ///
    /// System messages from the client are ignored in favor of the coach's
    /// own. The last message must come from the user.
    ///
    /// # Errors
    ///
    /// Returns error if the conversation does not end with a user message or
    /// the completion fails
    pub async fn respond_to_messages(&self, messages: &[ChatMessage]) -> Result<ParsedResponse> {
        let (last, earlier) = messages.split_last().ok_or_else(|| {
            CoachError::ContextGeneration("conversation has no messages".to_string())
        })?;

        let mut session = self.new_session();
        for message in earlier.iter().filter(|m| !m.is_system()) {
            session.history_mut().append(message.clone());
        }
        self.respond(&mut session, last.clone()).await
    }
}
