//! Provider module for Recovery Coach
//!
//! This module contains the completion provider abstraction, the
//! OpenAI-compatible implementation and the retrying completion client.

pub mod base;
pub mod openai;
pub mod retry;

pub use base::{
    ChatMessage, CompletionOptions, Provider, Role, DEFAULT_MAX_TOKENS, DEFAULT_MODEL,
    DEFAULT_TEMPERATURE,
};
pub use openai::OpenAiProvider;
pub use retry::{is_retryable, CompletionClient, RetryPolicy, Sleeper, TokioSleeper};

use crate::config::ProviderConfig;
use crate::error::Result;
use std::sync::Arc;

/// Create the completion provider described by the configuration
///
/// # Errors
///
/// Returns error if provider initialization fails
pub fn create_provider(config: &ProviderConfig) -> Result<Arc<dyn Provider>> {
    Ok(Arc::new(OpenAiProvider::new(config)?))
}
