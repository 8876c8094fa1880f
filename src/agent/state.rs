//! Per-session conversation state
//!
//! Tracks the current topic and the user's mood. Nothing in the pipeline
//! infers these on its own; a [`TurnClassifier`] supplied by the caller may
//! update them after each user message.

use crate::providers::ChatMessage;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// How the user seems to feel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserMood {
    Neutral,
    Positive,
    Negative,
    Curious,
    Confused,
    Frustrated,
}

impl UserMood {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Neutral => "neutral",
            Self::Positive => "positive",
            Self::Negative => "negative",
            Self::Curious => "curious",
            Self::Confused => "confused",
            Self::Frustrated => "frustrated",
        }
    }
}

impl fmt::Display for UserMood {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UserMood {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "neutral" => Ok(Self::Neutral),
            "positive" => Ok(Self::Positive),
            "negative" => Ok(Self::Negative),
            "curious" => Ok(Self::Curious),
            "confused" => Ok(Self::Confused),
            "frustrated" => Ok(Self::Frustrated),
            other => Err(format!("Unknown mood: {}", other)),
        }
    }
}

/// Topic and mood of an ongoing conversation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationState {
    pub current_topic: Option<String>,
    pub user_mood: Option<UserMood>,
}

impl Default for ConversationState {
    fn default() -> Self {
        Self {
            current_topic: None,
            user_mood: Some(UserMood::Neutral),
        }
    }
}

/// Partial update to a [`ConversationState`]
///
/// The outer `Option` says whether a field changes; the inner value is the
/// new value, which may itself be cleared to `None`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StateUpdate {
    pub current_topic: Option<Option<String>>,
    pub user_mood: Option<Option<UserMood>>,
}

impl StateUpdate {
    pub fn topic(topic: impl Into<String>) -> Self {
        Self {
            current_topic: Some(Some(topic.into())),
            ..Default::default()
        }
    }

    pub fn mood(mood: UserMood) -> Self {
        Self {
            user_mood: Some(Some(mood)),
            ..Default::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.current_topic.is_none() && self.user_mood.is_none()
    }
}

impl ConversationState {
    /// Apply the fields present in `update`
    pub fn apply(&mut self, update: StateUpdate) {
        if let Some(topic) = update.current_topic {
            self.current_topic = topic;
        }
        if let Some(mood) = update.user_mood {
            self.user_mood = mood;
        }
    }

    /// Restore the defaults
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Derives state changes from a user message
pub trait TurnClassifier: Send + Sync {
    /// Inspect the incoming message and the current state
    fn classify(&self, message: &ChatMessage, state: &ConversationState) -> StateUpdate;
}

/// Classifier that never changes the state
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopClassifier;

impl TurnClassifier for NoopClassifier {
    fn classify(&self, _message: &ChatMessage, _state: &ConversationState) -> StateUpdate {
        StateUpdate::default()
    }
}
