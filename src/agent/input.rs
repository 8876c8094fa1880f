//! User input preprocessing

use crate::providers::ChatMessage;

/// Turn raw user input into a user message
///
/// Surrounding whitespace is trimmed. Blank input yields `None` and must not
/// be sent to the model.
///
/// # Examples
///
/// ```
/// use recovery_coach::agent::preprocess_user_message;
///
/// let msg = preprocess_user_message("  How was my sleep?\n").unwrap();
/// assert_eq!(msg.content(), "How was my sleep?");
/// assert!(preprocess_user_message(" \t ").is_none());
/// ```
pub fn preprocess_user_message(input: &str) -> Option<ChatMessage> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        tracing::warn!("User input was empty after trimming");
        return None;
    }
    Some(ChatMessage::user(trimmed))
}
