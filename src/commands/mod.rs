/*!
Command handlers for the CLI

This module provides the handlers invoked by the CLI entrypoint:

- `chat`    - Interactive coaching session
- `ask`     - Single question, single reply
- `metrics` - Table of recent daily metrics
- `serve`   - HTTP chat API

Each handler builds a [`Coach`] from the loaded configuration and drives it.
*/

use crate::agent::{preprocess_user_message, Coach, Session};
use crate::config::Config;
use crate::data::{DailyMetric, MetricStore};
use crate::error::{CoachError, Result};
use crate::response::ParsedResponse;
use colored::Colorize;

// Special commands parser for the chat REPL
pub mod special_commands;

/// Render a parsed reply for the terminal
///
/// Structured replies are printed section by section under colored headings.
/// Replies with no recognized sections are printed as returned by the model.
pub fn render_reply(reply: &ParsedResponse) -> String {
    if !reply.is_structured() {
        return reply.raw.trim().to_string();
    }

    let mut out = String::new();
    for (kind, body) in reply.sections() {
        out.push_str(&format!("{}\n", kind.label().bold().cyan()));
        if !body.is_empty() {
            out.push_str(body);
            out.push('\n');
        }
        out.push('\n');
    }
    if let Some(cta) = reply.closing_cta.as_deref() {
        out.push_str(&format!("{}\n", cta.italic().green()));
    }
    out.trim_end().to_string()
}

// Chat command handler
pub mod chat {
    //! Interactive chat mode handler.
    //!
    //! Builds a `Coach` and a single session, then runs a readline loop that
    //! sends each line to the coach and prints the sectioned reply.

    use super::*;
    use crate::commands::special_commands::{parse_special_command, print_help, SpecialCommand};
    use rustyline::error::ReadlineError;
    use rustyline::DefaultEditor;
    use std::io::Write;

    /// Start an interactive coaching session
    ///
    /// # Arguments
    ///
    /// * `config` - Global configuration (consumed)
    ///
    /// # Examples
    ///
    /// ```
    /// use recovery_coach::commands::chat;
    /// use recovery_coach::config::Config;
    ///
    /// // In application code:
    /// // chat::run_chat(Config::default()).await?;
    /// ```
    pub async fn run_chat(config: Config) -> Result<()> {
        tracing::info!("Starting interactive chat mode");

        let coach = Coach::from_config(&config)?;
        let mut session = coach.new_session();
        let mut rl = DefaultEditor::new()?;

        print_welcome_banner(&config, coach.store());

        loop {
            let prompt = format!("{} ", "coach>".green().bold());
            match rl.readline(&prompt) {
                Ok(line) => {
                    let trimmed = line.trim();
                    if trimmed.is_empty() {
                        continue;
                    }

                    match parse_special_command(trimmed) {
                        Ok(SpecialCommand::ShowStatus) => {
                            print_status_display(&config, &session, coach.store());
                            continue;
                        }
                        Ok(SpecialCommand::ShowMetrics(days)) => {
                            let days = days.unwrap_or(metrics::DEFAULT_DAYS);
                            metrics::print_metrics(coach.store(), days);
                            continue;
                        }
                        Ok(SpecialCommand::Reset) => {
                            coach.reset_session(&mut session);
                            println!("Conversation reset.\n");
                            continue;
                        }
                        Ok(SpecialCommand::Clear) => {
                            print!("\x1B[2J\x1B[1;1H");
                            std::io::stdout().flush()?;
                            continue;
                        }
                        Ok(SpecialCommand::Help) => {
                            print_help();
                            continue;
                        }
                        Ok(SpecialCommand::Exit) => break,
                        Ok(SpecialCommand::None) => {
                            // Regular question for the coach
                        }
                        Err(e) => {
                            eprintln!("{}\n", e.to_string().yellow());
                            continue;
                        }
                    }

                    rl.add_history_entry(trimmed)?;

                    let Some(message) = preprocess_user_message(trimmed) else {
                        continue;
                    };

                    match coach.handle_turn(&mut session, message).await {
                        Ok(reply) => {
                            println!("\n{}\n", render_reply(&reply));
                        }
                        Err(e) => {
                            tracing::error!("Turn failed ({}): {}", e.kind, e.details);
                            eprintln!("{}\n", e.message.red());
                        }
                    }
                }
                Err(ReadlineError::Interrupted) => {
                    println!("CTRL-C");
                    break;
                }
                Err(ReadlineError::Eof) => {
                    println!("CTRL-D");
                    break;
                }
                Err(err) => {
                    tracing::error!("Readline error: {:?}", err);
                    break;
                }
            }
        }

        println!("Goodbye!");
        Ok(())
    }

    /// Display the welcome banner with the active model and data summary
    fn print_welcome_banner(config: &Config, store: &MetricStore) {
        println!("\n╔══════════════════════════════════════════════════════════════╗");
        println!("║            Recovery Coach Interactive Chat - Welcome!        ║");
        println!("╚══════════════════════════════════════════════════════════════╝\n");
        println!("Model:  {}", config.provider.model.cyan());
        match store.persona() {
            Some(persona) => println!(
                "Member: {} ({} days of metrics)\n",
                persona.name.cyan(),
                store.len()
            ),
            None => println!("Member: {}\n", "no user data loaded".yellow()),
        }
        println!("Type '/help' for available commands, 'exit' to quit\n");
    }

    /// Display detailed status information about the current session
    fn print_status_display(config: &Config, session: &Session, store: &MetricStore) {
        let state = session.state();

        println!("\n╔══════════════════════════════════════════════════════════════╗");
        println!("║                  Recovery Coach Session Status               ║");
        println!("╚══════════════════════════════════════════════════════════════╝\n");
        println!("Session:           {}", session.id());
        println!(
            "Started:           {}",
            session.created_at().format("%Y-%m-%d %H:%M:%S UTC")
        );
        println!("Model:             {}", config.provider.model.cyan());
        println!(
            "Conversation Size: {} messages ({} from you)",
            session.history().len(),
            session.user_turns()
        );
        println!(
            "Topic:             {}",
            state.current_topic.as_deref().unwrap_or("none")
        );
        println!(
            "Mood:              {}",
            state
                .user_mood
                .map(|m| m.to_string())
                .unwrap_or_else(|| "unknown".to_string())
        );
        println!(
            "Latest Metrics:    {}",
            store
                .current_metrics()
                .map(|m| m.date.to_string())
                .unwrap_or_else(|| "none".to_string())
        );
        println!();
    }
}

// Single-question handler
pub mod ask {
    use super::*;

    /// Ask the coach one question and print the reply
    ///
    /// # Arguments
    ///
    /// * `config` - Global configuration (consumed)
    /// * `question` - The question text
    /// * `raw` - Print the model's reply verbatim instead of rendering sections;
    ///   an empty reply prints the fallback text
    ///
    /// # Errors
    ///
    /// Returns error if the question is blank or the turn fails
    pub async fn run_ask(config: Config, question: String, raw: bool) -> Result<()> {
        let message = preprocess_user_message(&question).ok_or_else(|| {
            CoachError::ContextGeneration("question must not be empty".to_string())
        })?;

        let coach = Coach::from_config(&config)?;
        let mut session = coach.new_session();

        match coach.handle_turn(&mut session, message).await {
            Ok(reply) if raw => {
                println!("{}", reply.text());
                Ok(())
            }
            Ok(reply) => {
                println!("{}", render_reply(&reply));
                Ok(())
            }
            Err(e) => {
                tracing::error!("Turn failed ({}): {}", e.kind, e.details);
                anyhow::bail!("{} [{}]", e.message, e.kind)
            }
        }
    }
}

// Metrics table handler
pub mod metrics {
    use super::*;
    use prettytable::{row, Table};

    /// Days shown when no count is given
    pub const DEFAULT_DAYS: usize = 7;

    /// Show the most recent days of metrics from the configured user data
    ///
    /// # Errors
    ///
    /// Returns error if the user data file cannot be loaded
    pub fn show_metrics(config: Config, days: usize) -> Result<()> {
        let store = MetricStore::load(&config.data.user_data_path)?;
        print_metrics(&store, days);
        Ok(())
    }

    /// Print the metrics table for `store`
    pub fn print_metrics(store: &MetricStore, days: usize) {
        if store.is_empty() {
            println!("No metrics available.");
            return;
        }

        if let Some(persona) = store.persona() {
            println!("\nRecent metrics for {}:\n", persona.name);
        }
        metrics_table(store.recent_metrics(days)).printstd();
        println!();
    }

    /// Build the table for `metrics`, newest first
    pub fn metrics_table(metrics: &[DailyMetric]) -> Table {
        let mut table = Table::new();
        table.add_row(row![
            "Date",
            "HRV (ms)",
            "RHR (bpm)",
            "Recovery %",
            "Sleep Perf. %",
            "Sleep (h)",
            "Strain"
        ]);

        for metric in metrics {
            table.add_row(row![
                metric.date.to_string(),
                format!("{:.0}", metric.hrv_ms),
                format!("{:.0}", metric.rhr_bpm),
                format!("{:.0}", metric.recovery_score_percent),
                format!("{:.0}", metric.sleep_performance_percent),
                format!("{:.1}", metric.sleep_hours_total),
                format!("{:.1}", metric.strain_level)
            ]);
        }

        table
    }
}

// HTTP server handler
pub mod serve {
    use super::*;
    use crate::server::{router, AppState};
    use std::sync::Arc;

    /// Serve the chat API until interrupted
    ///
    /// # Errors
    ///
    /// Returns error if the coach cannot be built or the address cannot be bound
    pub async fn run_serve(config: Config) -> Result<()> {
        let coach = Coach::from_config(&config)?;
        let sessions = config.server.session_store();
        let app = router(AppState::with_sessions(Arc::new(coach), sessions));

        let addr = format!("{}:{}", config.server.host, config.server.port);
        let listener = tokio::net::TcpListener::bind(&addr).await?;
        tracing::info!("Recovery coach API listening on {}", addr);

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        tracing::info!("Server stopped");
        Ok(())
    }

    async fn shutdown_signal() {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!("Failed to listen for shutdown signal: {}", e);
        }
    }
}
