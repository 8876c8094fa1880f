//! Bounded conversation history
//!
//! Keeps at most `max_messages` messages. A system message at index 0 is
//! pinned: trimming always drops the oldest non-system messages first.

use crate::providers::ChatMessage;

/// Default cap on stored messages, system message included
pub const DEFAULT_MAX_HISTORY: usize = 20;

/// Default number of messages sent to the model per turn
pub const DEFAULT_RECENT_WINDOW: usize = 10;

/// Ordered, length-capped list of chat messages
///
/// # Examples
///
/// ```
/// use recovery_coach::agent::ConversationHistory;
/// use recovery_coach::providers::ChatMessage;
///
/// let mut history = ConversationHistory::new(3);
/// history.initialize(Some(ChatMessage::system("coach")));
/// for i in 0..5 {
///     history.append(ChatMessage::user(format!("q{}", i)));
/// }
/// assert_eq!(history.len(), 3);
/// assert!(history.messages()[0].is_system());
/// assert_eq!(history.messages()[2].content(), "q4");
/// ```
#[derive(Debug, Clone)]
pub struct ConversationHistory {
    messages: Vec<ChatMessage>,
    max_messages: usize,
}

impl Default for ConversationHistory {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_HISTORY)
    }
}

impl ConversationHistory {
    /// Creates an empty history holding at most `max_messages` messages
    ///
    /// A cap of zero is raised to one.
    pub fn new(max_messages: usize) -> Self {
        Self {
            messages: Vec::new(),
            max_messages: max_messages.max(1),
        }
    }

    /// Resets the history, optionally seeding it with a system message
    pub fn initialize(&mut self, system: Option<ChatMessage>) {
        self.messages.clear();
        if let Some(system) = system {
            if !system.is_system() {
                tracing::warn!(
                    "Seeding history with a {} message; it will not be pinned",
                    system.role()
                );
            }
            self.messages.push(system);
        }
    }

    /// Pushes a message and trims to the cap
    pub fn append(&mut self, message: ChatMessage) {
        self.messages.push(message);
        self.trim();
    }

    fn trim(&mut self) {
        if self.messages.len() <= self.max_messages {
            return;
        }

        let pinned = usize::from(self.has_system_message());
        let keep_recent = self.max_messages.saturating_sub(pinned);
        let drop_end = self.messages.len() - keep_recent;
        let dropped = drop_end - pinned;
        self.messages.drain(pinned..drop_end);

        tracing::debug!(
            "Trimmed {} message(s) from history; {} remain",
            dropped,
            self.messages.len()
        );
    }

    /// Returns true when index 0 holds a system message
    pub fn has_system_message(&self) -> bool {
        self.messages.first().is_some_and(ChatMessage::is_system)
    }

    /// The pinned system message, if any
    pub fn system_message(&self) -> Option<&ChatMessage> {
        self.messages.first().filter(|m| m.is_system())
    }

    /// The context window for a turn
    ///
    /// Returns the whole history when it holds `count` messages or fewer;
    /// otherwise the pinned system message (if any) followed by the most
    /// recent `count - 1` (or `count`, without a system message) messages.
    pub fn recent_with_system(&self, count: usize) -> Vec<ChatMessage> {
        if self.messages.len() <= count {
            return self.messages.clone();
        }

        let pinned = usize::from(self.has_system_message());
        let keep_recent = count.saturating_sub(pinned);
        let start = self.messages.len() - keep_recent;

        self.messages[..pinned]
            .iter()
            .chain(&self.messages[start..])
            .cloned()
            .collect()
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn max_messages(&self) -> usize {
        self.max_messages
    }

    /// Removes every message, the system message included
    pub fn clear(&mut self) {
        self.messages.clear();
    }
}
