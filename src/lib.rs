//! Recovery Coach - conversational recovery coaching library
//!
//! This library grounds a chat model in a member's persona and daily
//! wearable metrics and turns its replies into structured coaching advice.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//!
//! - `agent`: Per-turn orchestration, conversation history, state and sessions
//! - `providers`: Completion API abstraction, OpenAI client and retry policy
//! - `data`: Persona profile and daily metrics store
//! - `prompts`: System prompt template and context formatting
//! - `response`: Sectioned reply parser
//! - `classifier`: Maps failures to user-facing error kinds
//! - `server`: HTTP chat API
//! - `config`: Configuration management and validation
//! - `error`: Error types and result aliases
//! - `cli`: Command-line interface definition
//!
//! # Example
//!
//! ```no_run
//! use recovery_coach::{Coach, Config};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load("config/config.yaml", &Default::default())?;
//!     config.validate()?;
//!
//!     let coach = Coach::from_config(&config)?;
//!     let mut session = coach.new_session();
//!     let message = recovery_coach::agent::preprocess_user_message("How did I sleep?").unwrap();
//!     let reply = coach.respond(&mut session, message).await?;
//!     println!("{:?}", reply.tldr);
//!     Ok(())
//! }
//! ```

pub mod agent;
pub mod classifier;
pub mod cli;
pub mod commands;
pub mod config;
pub mod data;
pub mod error;
pub mod prompts;
pub mod providers;
pub mod response;
pub mod server;

// Re-export commonly used types
pub use agent::{Coach, Session, SessionStore};
pub use classifier::{classify, ErrorKind, UserFacingError};
pub use config::Config;
pub use data::MetricStore;
pub use error::{CoachError, Result};
pub use response::{parse, ParsedResponse};

#[cfg(test)]
pub mod test_utils;
