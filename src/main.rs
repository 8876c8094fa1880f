//! Recovery Coach - conversational recovery coaching CLI
//!
#![doc = "Recovery Coach - conversational recovery coaching CLI"]
#![doc = "Main entry point for the recovery-coach application."]

use anyhow::Result;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use recovery_coach::cli::{Cli, Commands};
use recovery_coach::commands;
use recovery_coach::config::Config;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command line arguments
    let cli = Cli::parse_args();

    // Initialize tracing
    init_tracing(cli.verbose, cli.json_logs);

    // Load configuration
    let config_path = cli.config.as_deref().unwrap_or("config/config.yaml");
    let config = Config::load(config_path, &cli)?;

    // Validate configuration
    config.validate()?;

    // Execute command
    match cli.command {
        Commands::Chat { model } => {
            if let Some(m) = &model {
                tracing::debug!("Using model override: {}", m);
            }
            commands::chat::run_chat(config).await?;
            Ok(())
        }
        Commands::Ask { question, raw, .. } => {
            tracing::info!("Answering a single question");
            commands::ask::run_ask(config, question, raw).await?;
            Ok(())
        }
        Commands::Metrics { days } => {
            commands::metrics::show_metrics(config, days)?;
            Ok(())
        }
        Commands::Serve { .. } => {
            tracing::info!("Starting chat API server");
            commands::serve::run_serve(config).await?;
            Ok(())
        }
    }
}

/// Initialize tracing subscriber with environment filter
///
/// Logs go to stderr so command output on stdout stays clean.
fn init_tracing(verbose: bool, json_logs: bool) {
    let default_level = if verbose {
        "recovery_coach=debug"
    } else {
        "recovery_coach=info"
    };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let registry = tracing_subscriber::registry().with(env_filter);
    if json_logs {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr),
            )
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}
