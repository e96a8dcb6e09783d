//! Client configuration
//!
//! Loaded from the environment for native callers, or from a Python dict
//! when the module is driven from scripting tooling.

use crate::error::{Result, TradeCenterError};
use crate::logging::{parse_level, LogConfig};
use pyo3::types::{PyAnyMethods, PyDict, PyDictMethods};
use pyo3::Bound;

/// Backend base URL, same variable the web client reads
pub const ENV_API_URL: &str = "NEXT_PUBLIC_API_URL";
/// Bearer token for the initial session
pub const ENV_TOKEN: &str = "TRADE_CENTER_TOKEN";
/// Log level name
pub const ENV_LOG: &str = "TRADE_CENTER_LOG";
/// "1"/"true" switches logs to JSON lines
pub const ENV_LOG_JSON: &str = "TRADE_CENTER_LOG_JSON";

/// Settings for [`crate::client::ApiClient`]
#[derive(Debug, Clone, PartialEq)]
pub struct ClientConfig {
    pub api_url: String,
    pub bearer_token: Option<String>,
    pub log: LogConfig,
}

impl ClientConfig {
    pub fn new(api_url: impl Into<String>) -> Self {
        Self {
            api_url: api_url.into(),
            bearer_token: None,
            log: LogConfig::default(),
        }
    }

    /// Load from process environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load through an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_url = lookup(ENV_API_URL)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .ok_or_else(|| TradeCenterError::Config(format!("{} is not set", ENV_API_URL)))?;

        let bearer_token = lookup(ENV_TOKEN).filter(|v| !v.is_empty());

        let mut log = LogConfig::default();
        if let Some(level) = lookup(ENV_LOG) {
            log.level = parse_level(&level)?;
        }
        if let Some(json) = lookup(ENV_LOG_JSON) {
            log.json = parse_flag(&json)?;
        }

        let config = Self {
            api_url,
            bearer_token,
            log,
        };
        config.validate()?;
        Ok(config)
    }

    /// The base URL must be absolute http(s)
    pub fn validate(&self) -> Result<()> {
        if !(self.api_url.starts_with("http://") || self.api_url.starts_with("https://")) {
            return Err(TradeCenterError::Config(format!(
                "api_url must start with http:// or https://, got '{}'",
                self.api_url
            )));
        }
        Ok(())
    }
}

fn parse_flag(value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        other => Err(TradeCenterError::Config(format!("Invalid flag value: {}", other))),
    }
}

/// Deserialize client config from a Python dict.
/// Expected format: {"api_url": str, "token": str | None, "log_level": str, "log_json": bool}
pub fn deserialize_client_config(config: &Bound<'_, PyDict>) -> pyo3::PyResult<ClientConfig> {
    let api_url: String = config
        .get_item("api_url")?
        .ok_or_else(|| TradeCenterError::Config("api_url not found".to_string()))?
        .extract()?;

    let mut client_config = ClientConfig::new(api_url.trim());

    if let Some(token) = config.get_item("token")? {
        if !token.is_none() {
            let token: String = token.extract()?;
            client_config.bearer_token = Some(token).filter(|t| !t.is_empty());
        }
    }

    if let Some(level) = config.get_item("log_level")? {
        let level: String = level.extract()?;
        client_config.log.level = parse_level(&level)?;
    }

    if let Some(json) = config.get_item("log_json")? {
        client_config.log.json = json.extract()?;
    }

    client_config.validate()?;
    Ok(client_config)
}
