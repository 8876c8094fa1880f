//! Command-line interface definition for Recovery Coach
//!
//! This module defines the CLI structure using clap's derive API,
//! providing commands for interactive chat, one-shot questions, metric
//! inspection and the HTTP server.

use clap::{Parser, Subcommand};

/// Recovery Coach - conversational coaching grounded in daily recovery metrics
///
/// Ask questions about HRV, sleep and strain; replies are grounded in the
/// persona and metrics document configured under `data`.
#[derive(Parser, Debug, Clone)]
#[command(name = "recovery-coach")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "config/config.yaml")]
    pub config: Option<String>,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long)]
    pub json_logs: bool,

    /// Command to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands for Recovery Coach
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Start an interactive coaching session
    Chat {
        /// Override the model from config
        #[arg(short, long)]
        model: Option<String>,
    },

    /// Ask a single question and print the reply
    Ask {
        /// The question for the coach
        question: String,

        /// Print the unparsed model reply
        #[arg(long)]
        raw: bool,

        /// Override the model from config
        #[arg(short, long)]
        model: Option<String>,
    },

    /// Show the most recent daily metrics
    Metrics {
        /// Number of days to show
        #[arg(short, long, default_value_t = 7)]
        days: usize,
    },

    /// Serve the chat API over HTTP
    Serve {
        /// Listen address (overrides config)
        #[arg(long)]
        host: Option<String>,

        /// Listen port (overrides config)
        #[arg(short, long)]
        port: Option<u16>,
    },
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

impl Default for Cli {
    fn default() -> Self {
        Self {
            config: Some("config/config.yaml".to_string()),
            verbose: false,
            json_logs: false,
            command: Commands::Metrics { days: 7 },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_default() {
        let cli = Cli::default();
        assert_eq!(cli.config, Some("config/config.yaml".to_string()));
        assert!(!cli.verbose);
        assert!(!cli.json_logs);
    }

    #[test]
    fn test_cli_parse_chat_command() {
        let cli = Cli::try_parse_from(["recovery-coach", "chat"]).unwrap();
        assert!(matches!(cli.command, Commands::Chat { model: None }));
    }

    #[test]
    fn test_cli_parse_chat_with_model() {
        let cli = Cli::try_parse_from(["recovery-coach", "chat", "--model", "gpt-4o"]).unwrap();
        match cli.command {
            Commands::Chat { model } => assert_eq!(model.as_deref(), Some("gpt-4o")),
            _ => panic!("Expected Chat command"),
        }
    }

    #[test]
    fn test_cli_parse_ask() {
        let cli =
            Cli::try_parse_from(["recovery-coach", "ask", "How did I sleep?", "--raw"]).unwrap();
        match cli.command {
            Commands::Ask {
                question,
                raw,
                model,
            } => {
                assert_eq!(question, "How did I sleep?");
                assert!(raw);
                assert!(model.is_none());
            }
            _ => panic!("Expected Ask command"),
        }
    }

    #[test]
    fn test_cli_parse_ask_requires_question() {
        assert!(Cli::try_parse_from(["recovery-coach", "ask"]).is_err());
    }

    #[test]
    fn test_cli_parse_metrics_default_days() {
        let cli = Cli::try_parse_from(["recovery-coach", "metrics"]).unwrap();
        assert!(matches!(cli.command, Commands::Metrics { days: 7 }));
    }

    #[test]
    fn test_cli_parse_metrics_days() {
        let cli = Cli::try_parse_from(["recovery-coach", "metrics", "--days", "3"]).unwrap();
        assert!(matches!(cli.command, Commands::Metrics { days: 3 }));
    }

    #[test]
    fn test_cli_parse_serve() {
        let cli = Cli::try_parse_from([
            "recovery-coach",
            "serve",
            "--host",
            "0.0.0.0",
            "--port",
            "8080",
        ])
        .unwrap();
        match cli.command {
            Commands::Serve { host, port } => {
                assert_eq!(host.as_deref(), Some("0.0.0.0"));
                assert_eq!(port, Some(8080));
            }
            _ => panic!("Expected Serve command"),
        }
    }

    #[test]
    fn test_cli_global_flags() {
        let cli = Cli::try_parse_from([
            "recovery-coach",
            "-v",
            "--json-logs",
            "-c",
            "custom.yaml",
            "metrics",
        ])
        .unwrap();
        assert!(cli.verbose);
        assert!(cli.json_logs);
        assert_eq!(cli.config.as_deref(), Some("custom.yaml"));
    }
}
