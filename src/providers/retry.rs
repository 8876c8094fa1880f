//! Completion client with bounded retry and exponential backoff
//!
//! The client wraps a [`Provider`] and owns the retry policy:
//!
//! - HTTP 429, any 5xx and any non-API failure (transport, timeout, unreadable
//!   body) are retried;
//! - other 4xx API errors and a missing API key fail immediately;
//! - a successful call that carries no text is returned as `Ok(None)` and is
//!   never retried.
//!
//! Between attempts the client sleeps `current_delay + jitter` and then
//! doubles `current_delay`.

use crate::config::RetryConfig;
use crate::error::{CoachError, Result};
use crate::providers::{ChatMessage, CompletionOptions, Provider};

use async_trait::async_trait;
use rand::Rng;
use std::sync::Arc;
use std::time::Duration;

/// Retry and timeout settings for completion calls
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Additional attempts after the first one
    pub max_retries: u32,
    /// Delay before the first retry; doubled after every retry
    pub initial_delay: Duration,
    /// Upper bound (exclusive) of the random jitter added to each delay
    pub max_jitter: Duration,
    /// Time budget for a single attempt
    pub attempt_timeout: Option<Duration>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_delay: Duration::from_millis(1000),
            max_jitter: Duration::from_millis(500),
            attempt_timeout: Some(Duration::from_secs(30)),
        }
    }
}

impl RetryPolicy {
    /// Build a policy from the retry section of the configuration
    pub fn from_config(config: &RetryConfig) -> Self {
        Self {
            max_retries: config.max_retries,
            initial_delay: Duration::from_millis(config.initial_delay_ms),
            max_jitter: Duration::from_millis(config.max_jitter_ms),
            attempt_timeout: (config.attempt_timeout_seconds > 0)
                .then(|| Duration::from_secs(config.attempt_timeout_seconds)),
        }
    }

    /// Random jitter in `0..max_jitter`
    fn jitter(&self) -> Duration {
        let max_ms = self.max_jitter.as_millis() as u64;
        if max_ms == 0 {
            return Duration::ZERO;
        }
        Duration::from_millis(rand::rng().random_range(0..max_ms))
    }
}

/// Returns true when a failed completion attempt may succeed if repeated
///
/// # Examples
///
/// ```
/// use recovery_coach::error::CoachError;
/// use recovery_coach::providers::is_retryable;
///
/// let rate_limited = anyhow::Error::from(CoachError::Api { status: 429, message: String::new() });
/// let bad_request = anyhow::Error::from(CoachError::Api { status: 400, message: String::new() });
/// assert!(is_retryable(&rate_limited));
/// assert!(!is_retryable(&bad_request));
/// ```
pub fn is_retryable(error: &anyhow::Error) -> bool {
    match error.downcast_ref::<CoachError>() {
        Some(CoachError::Api { status, .. }) => *status == 429 || (500..600).contains(status),
        Some(CoachError::ApiKeyMissing) | Some(CoachError::Config(_)) => false,
        _ => true,
    }
}

/// Suspends the retry loop between attempts
#[async_trait]
pub trait Sleeper: Send + Sync {
    /// Wait for `duration`
    async fn sleep(&self, duration: Duration);
}

/// [`Sleeper`] backed by the tokio timer
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Completion client that applies a [`RetryPolicy`] around a [`Provider`]
///
/// # Examples
///
/// ```no_run
/// use std::sync::Arc;
/// use recovery_coach::config::ProviderConfig;
/// use recovery_coach::providers::{
///     ChatMessage, CompletionClient, CompletionOptions, OpenAiProvider, RetryPolicy,
/// };
///
/// # async fn example() -> recovery_coach::error::Result<()> {
/// let provider = OpenAiProvider::new(&ProviderConfig::default())?;
/// let client = CompletionClient::new(Arc::new(provider), RetryPolicy::default());
/// let reply = client
///     .complete(&[ChatMessage::user("How recovered am I?")], &CompletionOptions::default())
///     .await?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct CompletionClient {
    provider: Arc<dyn Provider>,
    policy: RetryPolicy,
    sleeper: Arc<dyn Sleeper>,
}

impl CompletionClient {
    /// Create a client that sleeps on the tokio timer
    pub fn new(provider: Arc<dyn Provider>, policy: RetryPolicy) -> Self {
        Self {
            provider,
            policy,
            sleeper: Arc::new(TokioSleeper),
        }
    }

    /// Replace the sleeping primitive
    pub fn with_sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.sleeper = sleeper;
        self
    }

    /// The active retry policy
    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Request a completion, retrying transient failures
    ///
    /// # Errors
    ///
    /// Returns the first non-retryable error, or the last error once
    /// `max_retries` retries have been spent.
    pub async fn complete(
        &self,
        messages: &[ChatMessage],
        options: &CompletionOptions,
    ) -> Result<Option<String>> {
        let mut delay = self.policy.initial_delay;
        let mut retries = 0;

        loop {
            match self.attempt(messages, options).await {
                Ok(content) => {
                    if content.is_none() {
                        tracing::warn!(
                            "{} returned an empty completion; not retrying",
                            self.provider.name()
                        );
                    }
                    return Ok(content);
                }
                Err(error) => {
                    if !is_retryable(&error) {
                        tracing::warn!("Completion failed with non-retryable error: {}", error);
                        return Err(error);
                    }
                    if retries >= self.policy.max_retries {
                        tracing::error!(
                            "Completion failed after {} retries: {}",
                            self.policy.max_retries,
                            error
                        );
                        return Err(error);
                    }

                    retries += 1;
                    let wait = delay + self.policy.jitter();
                    tracing::warn!(
                        "Completion attempt failed ({}); retry {}/{} in {}ms",
                        error,
                        retries,
                        self.policy.max_retries,
                        wait.as_millis()
                    );
                    self.sleeper.sleep(wait).await;
                    delay = delay.saturating_mul(2);
                }
            }
        }
    }

    async fn attempt(
        &self,
        messages: &[ChatMessage],
        options: &CompletionOptions,
    ) -> Result<Option<String>> {
        let Some(limit) = self.policy.attempt_timeout else {
            return self.provider.complete(messages, options).await;
        };

        match tokio::time::timeout(limit, self.provider.complete(messages, options)).await {
            Ok(result) => result,
            Err(_) => Err(CoachError::Timeout(limit).into()),
        }
    }
}
