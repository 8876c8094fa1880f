//! Special commands parser for interactive chat mode
//!
//! Special commands are handled by the REPL instead of being sent to the
//! coach. They are prefixed with `/` and are case-insensitive; `exit` and
//! `quit` also work without the slash.

use thiserror::Error;

/// Errors that can occur when parsing special commands
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CommandError {
    /// Unknown command was entered
    #[error("Unknown command: {0}\n\nType '/help' to see available commands")]
    UnknownCommand(String),

    /// Command was given an unsupported argument
    #[error("Unsupported argument for {command}: {arg}\n\nType '/help' to see valid usage")]
    UnsupportedArgument { command: String, arg: String },
}

/// Special commands that can be executed during interactive chat
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpecialCommand {
    /// Show session status: model, history size, topic and mood
    ShowStatus,

    /// Show the most recent days of metrics, optionally a specific count
    ShowMetrics(Option<usize>),

    /// Start the conversation over with a fresh system message
    Reset,

    /// Clear the terminal
    Clear,

    /// Display help information
    Help,

    /// Exit the session
    Exit,

    /// Not a special command; send the input to the coach
    None,
}

/// Parse a line of REPL input
///
/// # Examples
///
/// ```
/// use recovery_coach::commands::special_commands::{parse_special_command, SpecialCommand};
///
/// assert_eq!(parse_special_command("/HELP").unwrap(), SpecialCommand::Help);
/// assert_eq!(parse_special_command("/metrics 5").unwrap(), SpecialCommand::ShowMetrics(Some(5)));
/// assert_eq!(parse_special_command("quit").unwrap(), SpecialCommand::Exit);
/// assert_eq!(parse_special_command("How did I sleep?").unwrap(), SpecialCommand::None);
/// assert!(parse_special_command("/foo").is_err());
/// ```
pub fn parse_special_command(input: &str) -> Result<SpecialCommand, CommandError> {
    let trimmed = input.trim();
    let lower = trimmed.to_lowercase();

    if !trimmed.starts_with('/') && lower != "exit" && lower != "quit" {
        return Ok(SpecialCommand::None);
    }

    match lower.as_str() {
        "/status" => Ok(SpecialCommand::ShowStatus),
        "/metrics" => Ok(SpecialCommand::ShowMetrics(None)),
        input if input.starts_with("/metrics ") => {
            let arg = input["/metrics ".len()..].trim();
            match arg.parse::<usize>() {
                Ok(days) if days > 0 => Ok(SpecialCommand::ShowMetrics(Some(days))),
                _ => Err(CommandError::UnsupportedArgument {
                    command: "/metrics".to_string(),
                    arg: arg.to_string(),
                }),
            }
        }
        "/reset" => Ok(SpecialCommand::Reset),
        "/clear" => Ok(SpecialCommand::Clear),
        "/help" | "/?" => Ok(SpecialCommand::Help),
        "/exit" | "/quit" | "exit" | "quit" => Ok(SpecialCommand::Exit),
        _ => Err(CommandError::UnknownCommand(trimmed.to_string())),
    }
}

/// Display help information for interactive chat
pub fn print_help() {
    println!(
        r#"
Special Commands for Interactive Chat
=====================================

SESSION INFORMATION:
  /status         - Show model, conversation size, topic and mood
  /metrics [N]    - Show the most recent N days of metrics (default 7)
  /help           - Show this help message
  /?              - Same as /help

SESSION CONTROL:
  /reset          - Start the conversation over
  /clear          - Clear the screen
  /exit, exit     - Exit interactive mode
  /quit, quit     - Same as exit

NOTES:
  - Commands are case-insensitive
  - Anything else is sent to the coach
"#
    );
}
