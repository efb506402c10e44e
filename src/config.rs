//! Environment-driven configuration.

use std::path::PathBuf;

use secrecy::SecretString;

use crate::error::ConfigError;

/// Default chat-completion model.
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";

/// Default OpenAI-compatible API base URL.
pub const DEFAULT_API_URL: &str = "https://api.openai.com";

/// Runtime configuration, read once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// API key for the chat-completion service.
    pub api_key: SecretString,
    /// Base URL of the chat-completion service.
    pub api_url: String,
    /// Model identifier, swappable via environment.
    pub model: String,
    /// Path to the local profile database.
    pub db_path: PathBuf,
    /// Port for the webhook server.
    pub port: u16,
}

impl Config {
    /// Read configuration from the process environment.
    ///
    /// Recognized variables: `OPENAI_API_KEY` (required), `OPENAI_API_URL`,
    /// `HEALTH_ASSIST_MODEL`, `HEALTH_ASSIST_DB_PATH`, `HEALTH_ASSIST_PORT`.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let api_key = lookup("OPENAI_API_KEY")
            .ok_or_else(|| ConfigError::MissingEnvVar("OPENAI_API_KEY".to_string()))?;

        let api_url = lookup("OPENAI_API_URL").unwrap_or_else(|| DEFAULT_API_URL.to_string());
        let model = lookup("HEALTH_ASSIST_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string());

        let db_path = lookup("HEALTH_ASSIST_DB_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("./data/health-assist.db"));

        let port = match lookup("HEALTH_ASSIST_PORT") {
            Some(raw) => raw.parse().map_err(|_| ConfigError::InvalidValue {
                key: "HEALTH_ASSIST_PORT".to_string(),
                message: format!("not a valid port: {raw}"),
            })?,
            None => 3000,
        };

        Ok(Self {
            api_key: SecretString::from(api_key),
            api_url,
            model,
            db_path,
            port,
        })
    }
}
