//! System prompt construction
//!
//! This module merges the static instruction template with the persona and
//! metrics text, producing the system message that grounds every turn.

pub mod format;
pub mod template;

pub use format::{format_current_metrics, format_persona_profile, format_recent_trends, NO_DATA};
pub use template::{build_system_message, PromptTemplate, BUILTIN_TEMPLATE};

use crate::data::MetricStore;
use crate::providers::ChatMessage;

/// Builds the system message for a store, rendering `trend_days` days of trends
///
/// # Examples
///
/// ```
/// use recovery_coach::data::MetricStore;
/// use recovery_coach::prompts::{system_message_for, PromptTemplate};
///
/// let msg = system_message_for(&PromptTemplate::builtin(), &MetricStore::default(), 3);
/// assert!(msg.content().contains("No data available"));
/// ```
pub fn system_message_for(
    template: &PromptTemplate,
    store: &MetricStore,
    trend_days: usize,
) -> ChatMessage {
    template.render(
        store.persona(),
        store.current_metrics(),
        store.recent_metrics(trend_days),
    )
}
