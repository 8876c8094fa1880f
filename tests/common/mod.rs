use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

use recovery_coach::config::Config;

/// Persona plus three days of metrics
#[allow(dead_code)]
pub const USER_DATA: &str = r#"{
  "persona": {
    "name": "Jordan",
    "age": 35,
    "gender": "female",
    "goals": ["Run a half marathon"],
    "typical_day_stressors": ["Commute"],
    "exercise_preferences": ["Running"],
    "dietary_habits": "Mostly vegetarian",
    "sleep_challenges": ["Wakes early"],
    "usage_level": "Daily"
  },
  "daily_metrics": [
    {"date": "2025-06-01", "hrv_ms": 62, "rhr_bpm": 51, "recovery_score_percent": 81,
     "sleep_performance_percent": 90, "sleep_hours_total": 7.8, "strain_level": 10.4},
    {"date": "2025-05-31", "hrv_ms": 55, "rhr_bpm": 54, "recovery_score_percent": 63,
     "sleep_performance_percent": 79, "sleep_hours_total": 6.9, "strain_level": 15.2},
    {"date": "2025-05-30", "hrv_ms": 58, "rhr_bpm": 53, "recovery_score_percent": 70,
     "sleep_performance_percent": 84, "sleep_hours_total": 7.3, "strain_level": 12.0}
  ]
}"#;

#[allow(dead_code)]
pub fn temp_config_file(contents: &str) -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().expect("failed to create tempdir");
    let config_path = temp_dir.path().join("config.yaml");
    fs::write(&config_path, contents).expect("failed to write config file");
    (temp_dir, config_path)
}

#[allow(dead_code)]
pub fn temp_user_data() -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().expect("failed to create tempdir");
    let data_path = temp_dir.path().join("user_data.json");
    fs::write(&data_path, USER_DATA).expect("failed to write user data");
    (temp_dir, data_path)
}

/// Configuration pointing the provider at `api_base` with retries that do
/// not wait
#[allow(dead_code)]
pub fn test_config(api_base: &str, user_data: PathBuf) -> Config {
    let mut config = Config::default();
    config.provider.api_base = api_base.to_string();
    config.provider.api_key = Some("sk-test".to_string());
    config.retry.initial_delay_ms = 0;
    config.retry.max_jitter_ms = 0;
    config.retry.attempt_timeout_seconds = 5;
    config.data.user_data_path = user_data;
    config.data.prompt_path = PathBuf::from("/nonexistent/system_prompt.md");
    config
}

/// A successful chat completion body carrying `content`
#[allow(dead_code)]
pub fn completion_body(content: &str) -> serde_json::Value {
    serde_json::json!({
        "id": "chatcmpl-test",
        "object": "chat.completion",
        "choices": [{
            "index": 0,
            "message": {"role": "assistant", "content": content},
            "finish_reason": "stop"
        }],
        "usage": {"prompt_tokens": 120, "completion_tokens": 40, "total_tokens": 160}
    })
}
