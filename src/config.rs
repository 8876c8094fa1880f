//! Configuration management for Recovery Coach
//!
//! This module handles loading, parsing, validating, and managing
//! configuration from files, environment variables, and CLI overrides.

use crate::agent::session::{DEFAULT_MAX_SESSIONS, DEFAULT_SESSION_IDLE_TTL};
use crate::agent::SessionStore;
use crate::error::{CoachError, Result};
use crate::providers::{CompletionOptions, DEFAULT_MAX_TOKENS, DEFAULT_MODEL, DEFAULT_TEMPERATURE};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Main configuration structure for Recovery Coach
///
/// Holds the completion API settings, the retry policy, conversation limits,
/// the locations of the static coaching data and the HTTP listener address.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Completion API settings
    #[serde(default)]
    pub provider: ProviderConfig,
    /// Retry and backoff settings for completion calls
    #[serde(default)]
    pub retry: RetryConfig,
    /// Conversation history limits
    #[serde(default)]
    pub conversation: ConversationConfig,
    /// Instruction template and persona/metrics document locations
    #[serde(default)]
    pub data: DataConfig,
    /// HTTP server settings
    #[serde(default)]
    pub server: ServerConfig,
}

/// Completion API configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Base URL of the OpenAI-compatible API
    #[serde(default = "default_api_base")]
    pub api_base: String,

    /// Model identifier
    #[serde(default = "default_model")]
    pub model: String,

    /// Sampling temperature (0.0 to 2.0)
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Maximum generated tokens per reply
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// Overall HTTP client timeout (seconds)
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,

    /// API key, normally taken from `OPENAI_API_KEY`
    #[serde(default, skip_serializing)]
    pub api_key: Option<String>,
}

fn default_api_base() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_model() -> String {
    DEFAULT_MODEL.to_string()
}

fn default_temperature() -> f32 {
    DEFAULT_TEMPERATURE
}

fn default_max_tokens() -> u32 {
    DEFAULT_MAX_TOKENS
}

fn default_timeout_seconds() -> u64 {
    120
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            api_base: default_api_base(),
            model: default_model(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            timeout_seconds: default_timeout_seconds(),
            api_key: None,
        }
    }
}

impl ProviderConfig {
    /// Per-request options derived from this configuration
    pub fn completion_options(&self) -> CompletionOptions {
        CompletionOptions {
            model: self.model.clone(),
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        }
    }
}

/// Retry policy configuration for completion calls
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Additional attempts after the first
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Delay before the first retry, doubled after each retry (milliseconds)
    #[serde(default = "default_initial_delay_ms")]
    pub initial_delay_ms: u64,

    /// Exclusive upper bound for random jitter (milliseconds)
    #[serde(default = "default_max_jitter_ms")]
    pub max_jitter_ms: u64,

    /// Per-attempt timeout (seconds, 0 disables)
    #[serde(default = "default_attempt_timeout_seconds")]
    pub attempt_timeout_seconds: u64,
}

fn default_max_retries() -> u32 {
    3
}

fn default_initial_delay_ms() -> u64 {
    1000
}

fn default_max_jitter_ms() -> u64 {
    500
}

fn default_attempt_timeout_seconds() -> u64 {
    30
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            initial_delay_ms: default_initial_delay_ms(),
            max_jitter_ms: default_max_jitter_ms(),
            attempt_timeout_seconds: default_attempt_timeout_seconds(),
        }
    }
}

/// Conversation history configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationConfig {
    /// Maximum number of messages kept per session, system message included
    #[serde(default = "default_max_history")]
    pub max_history: usize,

    /// Number of messages sent to the model per turn
    #[serde(default = "default_recent_window")]
    pub recent_window: usize,
}

fn default_max_history() -> usize {
    20
}

fn default_recent_window() -> usize {
    10
}

impl Default for ConversationConfig {
    fn default() -> Self {
        Self {
            max_history: default_max_history(),
            recent_window: default_recent_window(),
        }
    }
}

/// Static coaching data configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataConfig {
    /// Instruction template with `{{...}}` placeholders
    #[serde(default = "default_prompt_path")]
    pub prompt_path: PathBuf,

    /// Persona and daily metrics JSON document
    #[serde(default = "default_user_data_path")]
    pub user_data_path: PathBuf,

    /// Number of days rendered in the recent trends block
    #[serde(default = "default_trend_days")]
    pub trend_days: usize,
}

fn default_prompt_path() -> PathBuf {
    PathBuf::from("prompts/system_prompt.md")
}

fn default_user_data_path() -> PathBuf {
    PathBuf::from("data/synthetic_user_data.json")
}

fn default_trend_days() -> usize {
    3
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            prompt_path: default_prompt_path(),
            user_data_path: default_user_data_path(),
            trend_days: default_trend_days(),
        }
    }
}

/// HTTP server configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Listen address
    #[serde(default = "default_host")]
    pub host: String,

    /// Listen port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Idle time after which a chat session is dropped (seconds)
    #[serde(default = "default_session_idle_ttl_seconds")]
    pub session_idle_ttl_seconds: u64,

    /// Maximum number of chat sessions held in memory
    #[serde(default = "default_max_sessions")]
    pub max_sessions: usize,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3001
}

fn default_session_idle_ttl_seconds() -> u64 {
    DEFAULT_SESSION_IDLE_TTL.as_secs()
}

fn default_max_sessions() -> usize {
    DEFAULT_MAX_SESSIONS
}

impl ServerConfig {
    /// Session registry bounded by this configuration
    pub fn session_store(&self) -> SessionStore {
        SessionStore::with_limits(
            Duration::from_secs(self.session_idle_ttl_seconds),
            self.max_sessions,
        )
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            session_idle_ttl_seconds: default_session_idle_ttl_seconds(),
            max_sessions: default_max_sessions(),
        }
    }
}

/// Parses a numeric environment override, warning on invalid values
fn parse_env<T: std::str::FromStr>(name: &str) -> Option<T> {
    let raw = std::env::var(name).ok()?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            tracing::warn!("Invalid {}: {}", name, raw);
            None
        }
    }
}

impl Config {
    /// Load configuration from file with environment and CLI overrides
    ///
    /// A missing file is not an error; defaults are used instead.
    ///
    /// # Errors
    ///
    /// Returns error if the file exists but cannot be read or parsed
    pub fn load(path: &str, cli: &crate::cli::Cli) -> Result<Self> {
        let mut config = if Path::new(path).exists() {
            Self::from_file(path)?
        } else {
            tracing::warn!("Config file not found at {}, using defaults", path);
            Self::default()
        };

        config.apply_env_vars();
        config.apply_cli_overrides(cli);

        Ok(config)
    }

    fn from_file(path: &str) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| CoachError::Config(format!("Failed to read config file: {}", e)))?;
        serde_yaml::from_str(&contents)
            .map_err(|e| CoachError::Config(format!("Failed to parse config: {}", e)).into())
    }

    fn apply_env_vars(&mut self) {
        if let Ok(key) = std::env::var("OPENAI_API_KEY") {
            if !key.trim().is_empty() {
                self.provider.api_key = Some(key);
            }
        }

        if let Ok(api_base) = std::env::var("COACH_API_BASE") {
            self.provider.api_base = api_base;
        }

        if let Ok(model) = std::env::var("COACH_MODEL") {
            self.provider.model = model;
        }

        if let Some(value) = parse_env("COACH_TEMPERATURE") {
            self.provider.temperature = value;
        }

        if let Some(value) = parse_env("COACH_MAX_TOKENS") {
            self.provider.max_tokens = value;
        }

        if let Some(value) = parse_env("COACH_MAX_RETRIES") {
            self.retry.max_retries = value;
        }

        if let Some(value) = parse_env("COACH_INITIAL_DELAY_MS") {
            self.retry.initial_delay_ms = value;
        }

        if let Some(value) = parse_env("COACH_MAX_HISTORY") {
            self.conversation.max_history = value;
        }

        if let Ok(path) = std::env::var("COACH_PROMPT_PATH") {
            self.data.prompt_path = PathBuf::from(path);
        }

        if let Ok(path) = std::env::var("COACH_USER_DATA_PATH") {
            self.data.user_data_path = PathBuf::from(path);
        }

        if let Ok(host) = std::env::var("COACH_HOST") {
            self.server.host = host;
        }

        if let Some(value) = parse_env("PORT") {
            self.server.port = value;
        }
    }

    fn apply_cli_overrides(&mut self, cli: &crate::cli::Cli) {
        if cli.verbose {
            tracing::debug!("Verbose mode enabled");
        }

        match &cli.command {
            crate::cli::Commands::Chat { model } | crate::cli::Commands::Ask { model, .. } => {
                if let Some(model) = model {
                    tracing::debug!("Using model override: {}", model);
                    self.provider.model = model.clone();
                }
            }
            crate::cli::Commands::Serve { host, port } => {
                if let Some(host) = host {
                    self.server.host = host.clone();
                }
                if let Some(port) = port {
                    self.server.port = *port;
                }
            }
            crate::cli::Commands::Metrics { .. } => {}
        }
    }

    /// Validate the configuration
    ///
    /// # Errors
    ///
    /// Returns error if any value is out of range or a required field is empty
    pub fn validate(&self) -> Result<()> {
        if self.provider.model.trim().is_empty() {
            return Err(CoachError::Config("provider.model cannot be empty".to_string()).into());
        }

        if !(0.0..=2.0).contains(&self.provider.temperature) {
            return Err(CoachError::Config(
                "provider.temperature must be between 0.0 and 2.0".to_string(),
            )
            .into());
        }

        if self.provider.max_tokens == 0 {
            return Err(CoachError::Config(
                "provider.max_tokens must be greater than 0".to_string(),
            )
            .into());
        }

        if self.provider.timeout_seconds == 0 {
            return Err(CoachError::Config(
                "provider.timeout_seconds must be greater than 0".to_string(),
            )
            .into());
        }

        if self.conversation.max_history < 2 {
            return Err(CoachError::Config(
                "conversation.max_history must be at least 2".to_string(),
            )
            .into());
        }

        if self.conversation.recent_window < 2 {
            return Err(CoachError::Config(
                "conversation.recent_window must be at least 2".to_string(),
            )
            .into());
        }

        if self.data.trend_days == 0 {
            return Err(
                CoachError::Config("data.trend_days must be greater than 0".to_string()).into(),
            );
        }

        if self.server.port == 0 {
            return Err(
                CoachError::Config("server.port must be greater than 0".to_string()).into(),
            );
        }

        if self.server.session_idle_ttl_seconds == 0 {
            return Err(CoachError::Config(
                "server.session_idle_ttl_seconds must be greater than 0".to_string(),
            )
            .into());
        }

        if self.server.max_sessions == 0 {
            return Err(CoachError::Config(
                "server.max_sessions must be greater than 0".to_string(),
            )
            .into());
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::{Cli, Commands};
    use serial_test::serial;

    const ENV_VARS: &[&str] = &[
        "OPENAI_API_KEY",
        "COACH_API_BASE",
        "COACH_MODEL",
        "COACH_TEMPERATURE",
        "COACH_MAX_TOKENS",
        "COACH_MAX_RETRIES",
        "COACH_INITIAL_DELAY_MS",
        "COACH_MAX_HISTORY",
        "COACH_PROMPT_PATH",
        "COACH_USER_DATA_PATH",
        "COACH_HOST",
        "PORT",
    ];

    fn clear_env() {
        for name in ENV_VARS {
            std::env::remove_var(name);
        }
    }

    fn cli_with(command: Commands) -> Cli {
        Cli {
            command,
            ..Cli::default()
        }
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.provider.api_base, "https://api.openai.com/v1");
        assert_eq!(config.provider.model, "gpt-4o-mini");
        assert_eq!(config.provider.max_tokens, 500);
        assert_eq!(config.retry.max_retries, 3);
        assert_eq!(config.retry.initial_delay_ms, 1000);
        assert_eq!(config.retry.max_jitter_ms, 500);
        assert_eq!(config.conversation.max_history, 20);
        assert_eq!(config.conversation.recent_window, 10);
        assert_eq!(config.data.trend_days, 3);
        assert_eq!(config.server.port, 3001);
        assert_eq!(config.server.session_idle_ttl_seconds, 1800);
        assert_eq!(config.server.max_sessions, 1000);
    }

    #[test]
    fn test_config_validation_success() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn test_config_validation_temperature_range() {
        let mut config = Config::default();
        config.provider.temperature = 2.5;
        assert!(config.validate().is_err());
        config.provider.temperature = -0.1;
        assert!(config.validate().is_err());
        config.provider.temperature = 0.0;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation_rejects_zero_values() {
        let mut config = Config::default();
        config.provider.max_tokens = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.conversation.recent_window = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.data.trend_days = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.provider.timeout_seconds = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.server.port = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.server.session_idle_ttl_seconds = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.server.max_sessions = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_validation_max_history_minimum() {
        let mut config = Config::default();
        config.conversation.max_history = 1;
        assert!(config.validate().is_err());
        config.conversation.max_history = 2;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation_recent_window_minimum() {
        let mut config = Config::default();
        config.conversation.recent_window = 1;
        assert!(config.validate().is_err());
        config.conversation.recent_window = 2;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation_empty_model() {
        let mut config = Config::default();
        config.provider.model = "  ".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_from_yaml() {
        let yaml = r#"
provider:
  model: gpt-4o
  temperature: 0.2
retry:
  max_retries: 5
conversation:
  max_history: 30
data:
  user_data_path: fixtures/user.json
server:
  port: 8080
"#;
        let config: Config = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.provider.model, "gpt-4o");
        assert_eq!(config.provider.temperature, 0.2);
        assert_eq!(config.provider.max_tokens, 500);
        assert_eq!(config.retry.max_retries, 5);
        assert_eq!(config.retry.initial_delay_ms, 1000);
        assert_eq!(config.conversation.max_history, 30);
        assert_eq!(
            config.data.user_data_path,
            PathBuf::from("fixtures/user.json")
        );
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.max_sessions, 1000);
    }

    #[test]
    fn test_api_key_never_serialized() {
        let mut config = Config::default();
        config.provider.api_key = Some("sk-secret".to_string());
        let yaml = serde_yaml::to_string(&config).unwrap();
        assert!(!yaml.contains("sk-secret"));
        assert!(!yaml.contains("api_key"));
    }

    #[test]
    fn test_completion_options_from_provider_config() {
        let config = ProviderConfig {
            model: "gpt-4o".to_string(),
            temperature: 0.1,
            max_tokens: 64,
            ..Default::default()
        };
        let options = config.completion_options();
        assert_eq!(options.model, "gpt-4o");
        assert_eq!(options.temperature, 0.1);
        assert_eq!(options.max_tokens, 64);
    }

    #[test]
    #[serial]
    fn test_load_nonexistent_file_uses_defaults() {
        clear_env();
        let config = Config::load("nonexistent.yaml", &Cli::default()).unwrap();
        assert_eq!(config.provider.model, "gpt-4o-mini");
        assert!(config.provider.api_key.is_none());
    }

    #[test]
    #[serial]
    fn test_load_from_file() {
        clear_env();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        std::fs::write(&path, "provider:\n  model: gpt-4o\n").unwrap();

        let config = Config::load(path.to_str().unwrap(), &Cli::default()).unwrap();
        assert_eq!(config.provider.model, "gpt-4o");
    }

    #[test]
    #[serial]
    fn test_load_invalid_yaml_fails() {
        clear_env();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        std::fs::write(&path, "provider: [not, a, map").unwrap();

        assert!(Config::load(path.to_str().unwrap(), &Cli::default()).is_err());
    }

    #[test]
    #[serial]
    fn test_apply_env_vars_overrides() {
        clear_env();
        std::env::set_var("OPENAI_API_KEY", "sk-env");
        std::env::set_var("COACH_MODEL", "gpt-4o");
        std::env::set_var("COACH_TEMPERATURE", "0.3");
        std::env::set_var("COACH_MAX_RETRIES", "1");
        std::env::set_var("COACH_USER_DATA_PATH", "/tmp/user.json");
        std::env::set_var("PORT", "4000");

        let mut config = Config::default();
        config.apply_env_vars();

        assert_eq!(config.provider.api_key.as_deref(), Some("sk-env"));
        assert_eq!(config.provider.model, "gpt-4o");
        assert_eq!(config.provider.temperature, 0.3);
        assert_eq!(config.retry.max_retries, 1);
        assert_eq!(config.data.user_data_path, PathBuf::from("/tmp/user.json"));
        assert_eq!(config.server.port, 4000);

        clear_env();
    }

    #[test]
    #[serial]
    fn test_invalid_numeric_env_is_ignored() {
        clear_env();
        std::env::set_var("COACH_MAX_HISTORY", "lots");
        std::env::set_var("PORT", "-1");

        let mut config = Config::default();
        config.apply_env_vars();

        assert_eq!(config.conversation.max_history, 20);
        assert_eq!(config.server.port, 3001);

        clear_env();
    }

    #[test]
    #[serial]
    fn test_blank_api_key_env_ignored() {
        clear_env();
        std::env::set_var("OPENAI_API_KEY", "   ");

        let mut config = Config::default();
        config.apply_env_vars();
        assert!(config.provider.api_key.is_none());

        clear_env();
    }

    #[test]
    fn test_cli_overrides_model() {
        let mut config = Config::default();
        config.apply_cli_overrides(&cli_with(Commands::Ask {
            question: "hi".to_string(),
            raw: false,
            model: Some("gpt-4o".to_string()),
        }));
        assert_eq!(config.provider.model, "gpt-4o");
    }

    #[test]
    fn test_cli_overrides_server_address() {
        let mut config = Config::default();
        config.apply_cli_overrides(&cli_with(Commands::Serve {
            host: Some("0.0.0.0".to_string()),
            port: Some(9000),
        }));
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 9000);
    }
}
