use std::env;
use std::time::Duration;

const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 5000;
const DEFAULT_TIMEOUT_SECS: u64 = 100;

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum ConfigError {
    #[error("{0} must be configured")]
    Missing(&'static str),
    #[error("{name} has an invalid value '{value}'")]
    Invalid { name: &'static str, value: String },
}

/// Remote platform settings.
#[derive(Debug, Clone, PartialEq)]
pub struct AIForgedSettings {
    pub base_url: String,
    pub api_key: String,
    pub timeout: Duration,
    /// Report delete failures instead of always confirming the delete.
    pub strict_delete: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub host: String,
    pub port: u16,
    pub aiforged: AIForgedSettings,
}

impl Settings {
    /// Reads settings from the process environment (after `.env` has been loaded).
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let value = |name: &str| lookup(name).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let base_url = value("AIFORGED_BASE_URL").ok_or(ConfigError::Missing("AIFORGED_BASE_URL"))?;
        let api_key = value("AIFORGED_API_KEY").ok_or(ConfigError::Missing("AIFORGED_API_KEY"))?;

        let timeout_secs = match value("AIFORGED_TIMEOUT_SECS") {
            Some(raw) => raw.parse::<u64>().ok().filter(|secs| *secs > 0).ok_or(ConfigError::Invalid {
                name: "AIFORGED_TIMEOUT_SECS",
                value: raw,
            })?,
            None => DEFAULT_TIMEOUT_SECS,
        };

        let strict_delete = match value("AIFORGED_STRICT_DELETE") {
            Some(raw) => parse_flag(&raw).ok_or(ConfigError::Invalid {
                name: "AIFORGED_STRICT_DELETE",
                value: raw,
            })?,
            None => false,
        };

        let host = value("HOST").unwrap_or_else(|| DEFAULT_HOST.to_string());
        let port = match value("PORT") {
            Some(raw) => raw.parse::<u16>().map_err(|_| ConfigError::Invalid {
                name: "PORT",
                value: raw,
            })?,
            None => DEFAULT_PORT,
        };

        Ok(Self {
            host,
            port,
            aiforged: AIForgedSettings {
                base_url,
                api_key,
                timeout: Duration::from_secs(timeout_secs),
                strict_delete,
            },
        })
    }
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
