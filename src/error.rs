//! Error types for Recovery Coach
//!
//! This module defines the error types used throughout the coaching pipeline,
//! using `thiserror` for ergonomic error handling. Callers generally work with
//! `anyhow::Error` (see [`Result`]) and the classifier downcasts back to
//! [`CoachError`] when it needs the structured variant.

use std::time::Duration;
use thiserror::Error;

/// Main error type for Recovery Coach operations
///
/// Covers completion API failures, static data loading, prompt construction,
/// configuration and the usual IO/serialization conversions.
#[derive(Error, Debug)]
pub enum CoachError {
    /// No API key is available for the completion API
    #[error("OpenAI API key is not configured")]
    ApiKeyMissing,

    /// The completion API answered with a non-success status
    #[error("Completion API returned error {status}: {message}")]
    Api {
        /// HTTP status code returned by the API
        status: u16,
        /// Response body or provider error message
        message: String,
    },

    /// Transport-level failure talking to the completion API
    #[error("Failed to get chat completion: {0}")]
    Connection(String),

    /// A single completion attempt exceeded its time budget
    #[error("Completion attempt timed out after {0:?}")]
    Timeout(Duration),

    /// The instruction template could not be loaded
    #[error("Failed to load base system prompt: {0}")]
    PromptLoad(String),

    /// The system context message could not be assembled
    #[error("Failed to generate system context message: {0}")]
    ContextGeneration(String),

    /// The model reply could not be interpreted
    #[error("Failed to parse coach response: {0}")]
    ResponseParsing(String),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// YAML parsing errors
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl CoachError {
    /// Returns the HTTP status for API errors
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Result type alias for Recovery Coach operations
///
/// Uses `anyhow::Error` so context can be attached freely while the
/// structured [`CoachError`] remains recoverable via downcasting.
pub type Result<T> = anyhow::Result<T>;
