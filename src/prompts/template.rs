//! Instruction template loading and placeholder substitution

use crate::data::{DailyMetric, PersonaProfile};
use crate::error::{CoachError, Result};
use crate::prompts::format::{
    format_current_metrics, format_persona_profile, format_recent_trends, NO_DATA,
};
use crate::providers::ChatMessage;
use std::path::Path;

/// Placeholder replaced with the persona block
pub const PERSONA_PLACEHOLDER: &str = "{{persona_profile}}";

/// Placeholder replaced with the current day block
pub const CURRENT_METRICS_PLACEHOLDER: &str = "{{current_metrics}}";

/// Placeholder replaced with the recent trends block
pub const RECENT_TRENDS_PLACEHOLDER: &str = "{{recent_trends}}";

/// Minimal instructions used when the template file is unavailable
pub const BUILTIN_TEMPLATE: &str = "\
You are a supportive recovery and sleep coach. Ground every answer in the \
user's data below and keep replies short and practical.

## User profile
{{persona_profile}}

## Today's metrics
{{current_metrics}}

## Recent trends
{{recent_trends}}

Answer using these sections:
**TL;DR:** one or two sentences.
**Why it matters:** the physiological reason.
**Next best action:** one concrete step for today.
**Optional deeper dive:** extra context, only if useful.
End with: *Ready for more?* followed by a short follow-up question.
";

/// Build the system message from a template and the user's data
///
/// Every occurrence of each placeholder is replaced. Missing data renders as
/// `No data available`, so all three blocks are always present.
///
/// `recent` is newest first; it is rendered oldest to newest.
///
/// # Examples
///
/// ```
/// use recovery_coach::prompts::build_system_message;
///
/// let msg = build_system_message("P: {{persona_profile}} / {{persona_profile}}", None, None, &[]);
/// assert!(msg.is_system());
/// assert_eq!(msg.content(), "P: No data available / No data available");
/// ```
pub fn build_system_message(
    template: &str,
    persona: Option<&PersonaProfile>,
    current: Option<&DailyMetric>,
    recent: &[DailyMetric],
) -> ChatMessage {
    let persona_text = persona
        .map(format_persona_profile)
        .unwrap_or_else(|| NO_DATA.to_string());
    let current_text = current
        .map(format_current_metrics)
        .unwrap_or_else(|| NO_DATA.to_string());
    let trends_text = format_recent_trends(recent).unwrap_or_else(|| NO_DATA.to_string());

    let content = template
        .replace(PERSONA_PLACEHOLDER, &persona_text)
        .replace(CURRENT_METRICS_PLACEHOLDER, &current_text)
        .replace(RECENT_TRENDS_PLACEHOLDER, &trends_text);

    ChatMessage::system(content)
}

/// The instruction template text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptTemplate {
    text: String,
    builtin: bool,
}

impl PromptTemplate {
    /// Wrap template text
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            builtin: false,
        }
    }

    /// The built-in fallback template
    pub fn builtin() -> Self {
        Self {
            text: BUILTIN_TEMPLATE.to_string(),
            builtin: true,
        }
    }

    /// Read the template from disk
    ///
    /// # Errors
    ///
    /// Returns [`CoachError::PromptLoad`] if the file cannot be read
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| {
            CoachError::PromptLoad(format!("cannot read {}: {}", path.display(), e))
        })?;
        tracing::debug!("Loaded prompt template from {}", path.display());
        Ok(Self::new(text))
    }

    /// Read the template from disk, falling back to [`BUILTIN_TEMPLATE`]
    pub fn load_or_builtin(path: impl AsRef<Path>) -> Self {
        match Self::load(path) {
            Ok(template) => template,
            Err(e) => {
                tracing::warn!("{}; using built-in prompt template", e);
                Self::builtin()
            }
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Returns true when this is the built-in fallback
    pub fn is_builtin(&self) -> bool {
        self.builtin
    }

    /// Substitute the user's data into this template
    pub fn render(
        &self,
        persona: Option<&PersonaProfile>,
        current: Option<&DailyMetric>,
        recent: &[DailyMetric],
    ) -> ChatMessage {
        build_system_message(&self.text, persona, current, recent)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::MetricStore;

    const USER_DATA: &str = r#"{
        "persona": {"name": "Alex", "age": 42, "gender": "male", "goals": ["sleep"],
                    "whoop_usage_level": "daily"},
        "daily_metrics": [
            {"date": "2025-05-29", "hrv_ms": 45, "rhr_bpm": 57, "recovery_score_percent": 40,
             "sleep_performance_percent": 70, "sleep_hours_total": 6.1, "strain_level": 12.0},
            {"date": "2025-05-30", "hrv_ms": 49, "rhr_bpm": 55, "recovery_score_percent": 58,
             "sleep_performance_percent": 80, "sleep_hours_total": 7.0, "strain_level": 8.0},
            {"date": "2025-05-31", "hrv_ms": 53, "rhr_bpm": 53, "recovery_score_percent": 75,
             "sleep_performance_percent": 88, "sleep_hours_total": 7.6, "strain_level": 10.0},
            {"date": "2025-05-28", "hrv_ms": 44, "rhr_bpm": 58, "recovery_score_percent": 33,
             "sleep_performance_percent": 65, "sleep_hours_total": 5.9, "strain_level": 15.0}
        ]
    }"#;

    #[test]
    fn test_all_placeholders_replaced() {
        let store = MetricStore::from_json(USER_DATA).unwrap();
        let msg = PromptTemplate::builtin().render(
            store.persona(),
            store.current_metrics(),
            store.recent_metrics(3),
        );

        assert!(msg.is_system());
        assert!(!msg.content().contains("{{"));
        assert!(msg.content().contains("Name: Alex"));
        assert!(msg.content().contains("Date: 2025-05-31"));
        assert!(msg.content().contains("Last 3 days"));
        assert!(!msg.content().contains("2025-05-28"));
    }

    #[test]
    fn test_missing_data_renders_placeholder_text() {
        let msg = build_system_message(BUILTIN_TEMPLATE, None, None, &[]);
        assert_eq!(msg.content().matches(NO_DATA).count(), 3);
        assert!(msg.content().contains("## User profile\nNo data available"));
    }

    #[test]
    fn test_persona_without_metrics() {
        let store = MetricStore::from_json(USER_DATA).unwrap();
        let msg = build_system_message(
            "{{persona_profile}}\n--\n{{current_metrics}}",
            store.persona(),
            None,
            &[],
        );
        let (persona, metrics) = msg.content().split_once("\n--\n").unwrap();
        assert!(persona.starts_with("Name: Alex\nAge: 42\nGender: male"));
        assert!(persona.contains("Usage Level: daily"));
        assert_eq!(metrics, NO_DATA);
    }

    #[test]
    fn test_repeated_placeholder_replaced_everywhere() {
        let msg = build_system_message(
            "{{recent_trends}}|{{recent_trends}}",
            None,
            None,
            &[],
        );
        assert_eq!(msg.content(), "No data available|No data available");
    }

    #[test]
    fn test_builtin_carries_all_placeholders() {
        assert!(BUILTIN_TEMPLATE.contains(PERSONA_PLACEHOLDER));
        assert!(BUILTIN_TEMPLATE.contains(CURRENT_METRICS_PLACEHOLDER));
        assert!(BUILTIN_TEMPLATE.contains(RECENT_TRENDS_PLACEHOLDER));
    }

    #[test]
    fn test_load_or_builtin_falls_back() {
        let template = PromptTemplate::load_or_builtin("/nonexistent/system_prompt.md");
        assert!(template.is_builtin());
        assert_eq!(template.text(), BUILTIN_TEMPLATE);
    }

    #[test]
    fn test_load_error_is_prompt_load() {
        let err = PromptTemplate::load("/nonexistent/system_prompt.md").unwrap_err();
        assert!(matches!(
            err.downcast_ref::<CoachError>(),
            Some(CoachError::PromptLoad(_))
        ));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("prompt.md");
        std::fs::write(&path, "Coach {{persona_profile}}").unwrap();

        let template = PromptTemplate::load_or_builtin(&path);
        assert!(!template.is_builtin());
        assert_eq!(template.text(), "Coach {{persona_profile}}");
    }
}
