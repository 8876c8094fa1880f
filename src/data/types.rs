use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One calendar day of physiological metrics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyMetric {
    /// Calendar day (`YYYY-MM-DD`)
    pub date: NaiveDate,
    /// Heart-rate variability in milliseconds
    pub hrv_ms: f64,
    /// Resting heart rate
    pub rhr_bpm: f64,
    /// Recovery score, 0-100
    pub recovery_score_percent: f64,
    /// Sleep performance, 0-100
    pub sleep_performance_percent: f64,
    /// Total time asleep in hours
    pub sleep_hours_total: f64,
    #[serde(default)]
    pub sleep_hours_rem: f64,
    #[serde(default)]
    pub sleep_hours_deep: f64,
    #[serde(default)]
    pub sleep_hours_light: f64,
    #[serde(default)]
    pub sleep_consistency_percent: f64,
    /// Day strain on the 0-21 scale
    pub strain_level: f64,
    #[serde(default)]
    pub avg_heart_rate_bpm: f64,
    #[serde(default)]
    pub max_heart_rate_bpm: f64,
    #[serde(default)]
    pub calories_burned: f64,
}

/// Personal baselines the coach compares daily values against
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Baselines {
    #[serde(default)]
    pub hrv_ms: Option<f64>,
    #[serde(default)]
    pub rhr_bpm: Option<f64>,
    #[serde(default)]
    pub sleep_hours: Option<f64>,
}

/// Who the coach is talking to
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersonaProfile {
    pub name: String,
    pub age: u32,
    pub gender: String,
    #[serde(default)]
    pub goals: Vec<String>,
    #[serde(default)]
    pub typical_day_stressors: Vec<String>,
    #[serde(default)]
    pub exercise_preferences: Vec<String>,
    #[serde(default)]
    pub dietary_habits: String,
    #[serde(default)]
    pub sleep_challenges: Vec<String>,
    /// How much the person relies on their wearable
    #[serde(default, alias = "whoop_usage_level")]
    pub usage_level: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub baselines: Option<Baselines>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lifestyle_notes: Option<String>,
}

/// Raw shape of the persona/metrics document
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserData {
    #[serde(default)]
    pub persona: Option<PersonaProfile>,
    #[serde(default)]
    pub daily_metrics: Vec<DailyMetric>,
}
