//! Agent module for Recovery Coach
//!
//! This module contains the per-turn coach orchestrator together with the
//! conversation history, conversation state and session types it drives.

pub mod core;
pub mod history;
pub mod input;
pub mod session;
pub mod state;

pub use core::Coach;
pub use history::ConversationHistory;
pub use input::preprocess_user_message;
pub use session::{Session, SessionStore, SharedSession};
pub use state::{ConversationState, NoopClassifier, StateUpdate, TurnClassifier, UserMood};
