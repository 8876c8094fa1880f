//! Test utilities for Recovery Coach
//!
//! Fixtures shared by unit tests: a scripted completion provider and a
//! sample persona/metrics document.

use crate::data::MetricStore;
use crate::error::Result;
use crate::providers::{ChatMessage, CompletionOptions, Provider};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;

/// Persona plus four days of metrics, deliberately out of order
pub const SAMPLE_USER_DATA: &str = r#"{
  "persona": {
    "name": "Alex",
    "age": 42,
    "gender": "male",
    "goals": ["Improve sleep quality", "Manage stress"],
    "typical_day_stressors": ["Back-to-back meetings", "Late emails"],
    "exercise_preferences": ["Running", "Strength training"],
    "dietary_habits": "Balanced, frequent business dinners",
    "sleep_challenges": ["Inconsistent bedtime"],
    "whoop_usage_level": "Daily"
  },
  "daily_metrics": [
    {"date": "2025-05-29", "hrv_ms": 45, "rhr_bpm": 57, "recovery_score_percent": 41,
     "sleep_performance_percent": 72, "sleep_hours_total": 6.2, "sleep_hours_rem": 1.3,
     "sleep_hours_deep": 1.0, "sleep_hours_light": 3.9, "sleep_consistency_percent": 64,
     "strain_level": 14.1, "avg_heart_rate_bpm": 63, "max_heart_rate_bpm": 171,
     "calories_burned": 2850},
    {"date": "2025-05-31", "hrv_ms": 53, "rhr_bpm": 53, "recovery_score_percent": 76,
     "sleep_performance_percent": 88, "sleep_hours_total": 7.6, "sleep_hours_rem": 1.7,
     "sleep_hours_deep": 1.4, "sleep_hours_light": 4.5, "sleep_consistency_percent": 81,
     "strain_level": 9.6, "avg_heart_rate_bpm": 60, "max_heart_rate_bpm": 152,
     "calories_burned": 2380},
    {"date": "2025-05-30", "hrv_ms": 49, "rhr_bpm": 55, "recovery_score_percent": 58,
     "sleep_performance_percent": 80, "sleep_hours_total": 7.0, "sleep_hours_rem": 1.5,
     "sleep_hours_deep": 1.2, "sleep_hours_light": 4.3, "sleep_consistency_percent": 72,
     "strain_level": 11.2, "avg_heart_rate_bpm": 61, "max_heart_rate_bpm": 160,
     "calories_burned": 2560},
    {"date": "2025-05-28", "hrv_ms": 44, "rhr_bpm": 58, "recovery_score_percent": 35,
     "sleep_performance_percent": 66, "sleep_hours_total": 5.9, "sleep_hours_rem": 1.1,
     "sleep_hours_deep": 0.9, "sleep_hours_light": 3.9, "sleep_consistency_percent": 60,
     "strain_level": 15.3, "avg_heart_rate_bpm": 64, "max_heart_rate_bpm": 175,
     "calories_burned": 3010}
  ]
}"#;

/// A store built from [`SAMPLE_USER_DATA`]
///
/// # Panics
///
/// Panics if the sample document stops parsing
pub fn sample_store() -> MetricStore {
    MetricStore::from_json(SAMPLE_USER_DATA).expect("sample user data should parse")
}

/// Provider that replays a fixed script of outcomes and records requests
///
/// Once the script runs out every call fails.
pub struct ScriptedProvider {
    script: Mutex<VecDeque<Result<Option<String>>>>,
    requests: Mutex<Vec<Vec<ChatMessage>>>,
}

impl ScriptedProvider {
    pub fn new(script: Vec<Result<Option<String>>>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// A provider answering each call with the next reply
    pub fn replies(replies: &[&str]) -> Self {
        Self::new(
            replies
                .iter()
                .map(|reply| Ok(Some(reply.to_string())))
                .collect(),
        )
    }

    /// Messages sent on each call so far
    pub fn requests(&self) -> Vec<Vec<ChatMessage>> {
        self.requests.lock().unwrap().clone()
    }

    pub fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl Provider for ScriptedProvider {
    async fn complete(
        &self,
        messages: &[ChatMessage],
        _options: &CompletionOptions,
    ) -> Result<Option<String>> {
        self.requests.lock().unwrap().push(messages.to_vec());
        self.script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(anyhow::anyhow!("scripted provider exhausted")))
    }

    fn name(&self) -> &str {
        "scripted"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_store_sorted() {
        let store = sample_store();
        assert_eq!(store.len(), 4);
        assert_eq!(
            store.current_metrics().unwrap().date.to_string(),
            "2025-05-31"
        );
    }

    #[tokio::test]
    async fn test_scripted_provider_records_requests() {
        let provider = ScriptedProvider::replies(&["one"]);
        let reply = provider
            .complete(&[ChatMessage::user("hi")], &CompletionOptions::default())
            .await
            .unwrap();
        assert_eq!(reply.as_deref(), Some("one"));
        assert_eq!(provider.calls(), 1);
        assert!(provider
            .complete(&[], &CompletionOptions::default())
            .await
            .is_err());
    }
}
