//! Persona and daily metrics store
//!
//! Loads the user data document once and serves read-only views over it.
//! Metrics are held newest first with at most one record per calendar day.

use crate::data::types::{DailyMetric, PersonaProfile, UserData};
use chrono::NaiveDate;
use std::path::Path;
use thiserror::Error;

/// Failures while loading the persona/metrics document
#[derive(Error, Debug)]
pub enum DataError {
    /// The file could not be read
    #[error("Failed to load or parse user data: cannot read {path}: {source}")]
    Unreadable {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// The file is not valid JSON of the expected shape
    #[error("Failed to load or parse user data: {0}")]
    Malformed(#[from] serde_json::Error),

    /// `persona` is absent or `daily_metrics` is absent or empty
    #[error("User data is missing persona or daily_metrics, or daily_metrics is empty")]
    MissingSection,
}

/// Immutable view over the persona profile and daily metrics
///
/// # Examples
///
/// ```
/// use recovery_coach::data::MetricStore;
///
/// let json = r#"{
///   "persona": {"name": "Alex", "age": 42, "gender": "male"},
///   "daily_metrics": [
///     {"date": "2025-05-30", "hrv_ms": 48, "rhr_bpm": 56, "recovery_score_percent": 61,
///      "sleep_performance_percent": 80, "sleep_hours_total": 7.1, "strain_level": 11.2},
///     {"date": "2025-05-31", "hrv_ms": 52, "rhr_bpm": 54, "recovery_score_percent": 72,
///      "sleep_performance_percent": 85, "sleep_hours_total": 7.5, "strain_level": 9.8}
///   ]
/// }"#;
///
/// let store = MetricStore::from_json(json).unwrap();
/// assert_eq!(store.current_metrics().unwrap().date.to_string(), "2025-05-31");
/// assert_eq!(store.recent_metrics(5).len(), 2);
/// ```
#[derive(Debug, Clone, Default)]
pub struct MetricStore {
    persona: Option<PersonaProfile>,
    metrics: Vec<DailyMetric>,
}

impl MetricStore {
    /// Build a store from an already parsed document
    ///
    /// # Errors
    ///
    /// Returns [`DataError::MissingSection`] if the persona or metrics are absent
    pub fn from_user_data(data: UserData) -> Result<Self, DataError> {
        let persona = data.persona.ok_or(DataError::MissingSection)?;
        if data.daily_metrics.is_empty() {
            return Err(DataError::MissingSection);
        }

        let mut metrics = data.daily_metrics;
        let total = metrics.len();
        // stable: among equal dates the first record in the document stays first
        metrics.sort_by(|a, b| b.date.cmp(&a.date));
        metrics.dedup_by(|later, kept| later.date == kept.date);

        if metrics.len() < total {
            tracing::warn!(
                "Dropped {} duplicate daily metric record(s); first record per date kept",
                total - metrics.len()
            );
        }

        Ok(Self {
            persona: Some(persona),
            metrics,
        })
    }

    /// Parse a store from JSON text
    ///
    /// # Errors
    ///
    /// Returns [`DataError::Malformed`] for invalid JSON and
    /// [`DataError::MissingSection`] for incomplete documents
    pub fn from_json(json: &str) -> Result<Self, DataError> {
        let data: UserData = serde_json::from_str(json)?;
        Self::from_user_data(data)
    }

    /// Load the store from a JSON file
    ///
    /// # Errors
    ///
    /// Returns a [`DataError`] describing why the document is unusable
    pub fn load(path: impl AsRef<Path>) -> Result<Self, DataError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|source| DataError::Unreadable {
            path: path.display().to_string(),
            source,
        })?;

        let store = Self::from_json(&contents)?;
        tracing::info!(
            "Loaded {} daily metric records from {}",
            store.metrics.len(),
            path.display()
        );
        Ok(store)
    }

    /// Load the store, falling back to an empty one on any failure
    pub fn load_or_empty(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        match Self::load(path) {
            Ok(store) => store,
            Err(e) => {
                tracing::warn!("Using empty metric store ({}): {}", path.display(), e);
                Self::default()
            }
        }
    }

    /// Returns true when neither persona nor metrics are available
    pub fn is_empty(&self) -> bool {
        self.persona.is_none() && self.metrics.is_empty()
    }

    /// Number of distinct days held
    pub fn len(&self) -> usize {
        self.metrics.len()
    }

    /// The newest day
    pub fn current_metrics(&self) -> Option<&DailyMetric> {
        self.metrics.first()
    }

    /// Up to `n` days, newest first
    pub fn recent_metrics(&self, n: usize) -> &[DailyMetric] {
        &self.metrics[..n.min(self.metrics.len())]
    }

    pub fn persona(&self) -> Option<&PersonaProfile> {
        self.persona.as_ref()
    }

    /// The record for a specific calendar day
    pub fn metric_for_date(&self, date: NaiveDate) -> Option<&DailyMetric> {
        self.metrics
            .binary_search_by(|m| date.cmp(&m.date))
            .ok()
            .map(|index| &self.metrics[index])
    }
}
