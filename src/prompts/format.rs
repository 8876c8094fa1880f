//! Plain-text renderings of the persona and metrics for the system prompt

use crate::data::{Baselines, DailyMetric, PersonaProfile};

/// Text substituted for any block whose data is missing
pub const NO_DATA: &str = "No data available";

/// Render the persona as one `Label: value` line per field
///
/// # Examples
///
/// ```
/// use recovery_coach::data::PersonaProfile;
/// use recovery_coach::prompts::format_persona_profile;
///
/// let persona: PersonaProfile = serde_json::from_str(
///     r#"{"name": "Alex", "age": 42, "gender": "male", "goals": ["sleep", "focus"]}"#,
/// ).unwrap();
/// let text = format_persona_profile(&persona);
/// assert!(text.starts_with("Name: Alex\nAge: 42"));
/// assert!(text.contains("Goals: sleep, focus"));
/// ```
pub fn format_persona_profile(persona: &PersonaProfile) -> String {
    let mut lines = vec![
        format!("Name: {}", persona.name),
        format!("Age: {}", persona.age),
        format!("Gender: {}", persona.gender),
        format!("Goals: {}", persona.goals.join(", ")),
        format!(
            "Typical Day Stressors: {}",
            persona.typical_day_stressors.join(", ")
        ),
        format!(
            "Exercise Preferences: {}",
            persona.exercise_preferences.join(", ")
        ),
        format!("Dietary Habits: {}", persona.dietary_habits),
        format!("Sleep Challenges: {}", persona.sleep_challenges.join(", ")),
        format!("Usage Level: {}", persona.usage_level),
    ];

    if let Some(baselines) = persona.baselines.as_ref().and_then(format_baselines) {
        lines.push(format!("Baselines: {}", baselines));
    }

    if let Some(notes) = persona
        .lifestyle_notes
        .as_deref()
        .map(str::trim)
        .filter(|notes| !notes.is_empty())
    {
        lines.push(format!("Lifestyle Notes: {}", notes));
    }

    lines.join("\n")
}

fn format_baselines(baselines: &Baselines) -> Option<String> {
    let mut parts = Vec::new();
    if let Some(hrv) = baselines.hrv_ms {
        parts.push(format!("HRV {} ms", hrv));
    }
    if let Some(rhr) = baselines.rhr_bpm {
        parts.push(format!("RHR {} bpm", rhr));
    }
    if let Some(sleep) = baselines.sleep_hours {
        parts.push(format!("Sleep {:.1} hrs", sleep));
    }
    (!parts.is_empty()).then(|| parts.join(", "))
}

/// Render a single day's metrics
pub fn format_current_metrics(metric: &DailyMetric) -> String {
    [
        format!("Date: {}", metric.date),
        format!("HRV: {} ms", metric.hrv_ms),
        format!("RHR: {} bpm", metric.rhr_bpm),
        format!("Recovery: {}%", metric.recovery_score_percent),
        format!("Sleep Performance: {}%", metric.sleep_performance_percent),
        format!(
            "Total Sleep: {:.1} hrs (REM: {:.1}h, Deep: {:.1}h, Light: {:.1}h)",
            metric.sleep_hours_total,
            metric.sleep_hours_rem,
            metric.sleep_hours_deep,
            metric.sleep_hours_light
        ),
        format!("Sleep Consistency: {}%", metric.sleep_consistency_percent),
        format!("Strain: {:.1}", metric.strain_level),
        format!("Avg HR: {} bpm", metric.avg_heart_rate_bpm),
        format!("Max HR: {} bpm", metric.max_heart_rate_bpm),
        format!("Calories Burned: {}", metric.calories_burned),
    ]
    .join("\n")
}

/// Render recent days oldest to newest
///
/// `recent` is expected newest first, as returned by
/// [`MetricStore::recent_metrics`](crate::data::MetricStore::recent_metrics).
/// Returns `None` when there is nothing to show.
pub fn format_recent_trends(recent: &[DailyMetric]) -> Option<String> {
    if recent.is_empty() {
        return None;
    }

    let mut text = format!(
        "Last {} days (Oldest to Newest - Recovery %, Sleep Perf. %, Strain):",
        recent.len()
    );
    for metric in recent.iter().rev() {
        text.push_str(&format!(
            "\n- {}: Rec {}%, Sleep {}%, Strain {:.1}",
            metric.date,
            metric.recovery_score_percent,
            metric.sleep_performance_percent,
            metric.strain_level
        ));
    }
    Some(text)
}
