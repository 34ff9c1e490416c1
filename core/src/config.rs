//! Client configuration.
//!
//! ## Environment Variables
//! - `NETISTRAR_ENVIRONMENT`: `Development`, `OTE` or `Production` (default `Production`)
//! - `NETISTRAR_API_KEY`: API key (required)
//! - `NETISTRAR_API_SECRET`: API secret (required)
//! - `NETISTRAR_TRANSPORT`: `agent` or `socket` (default `agent`)
//! - `NETISTRAR_TIMEOUT`: per-call timeout in seconds (default 15)
//! - `NETISTRAR_API_URL`: overrides the environment's base URL

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{ApiError, Result};
use crate::http::DEFAULT_TIMEOUT_SECS;
use crate::transport::TransportKind;

/// Target deployment of the remote API.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Environment {
    Development,
    #[serde(rename = "OTE")]
    Ote,
    #[default]
    Production,
}

impl Environment {
    pub fn api_url(&self) -> &'static str {
        match self {
            Environment::Development => "http://restapi.netistrar.test",
            Environment::Ote => "https://restapi.netistrar-ote.uk",
            Environment::Production => "https://restapi.netistrar.com",
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Environment::Development => "Development",
            Environment::Ote => "OTE",
            Environment::Production => "Production",
        })
    }
}

impl FromStr for Environment {
    type Err = ApiError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "development" | "dev" => Ok(Environment::Development),
            "ote" => Ok(Environment::Ote),
            "production" | "prod" | "live" => Ok(Environment::Production),
            other => Err(ApiError::Config(format!("unknown environment: {other}"))),
        }
    }
}

fn default_timeout() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

/// Settings an `ApiProvider` is built from.
///
/// The key and secret are never serialised and are redacted from `Debug`.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientConfig {
    #[serde(default)]
    pub environment: Environment,
    #[serde(default, skip_serializing)]
    pub api_key: String,
    #[serde(default, skip_serializing)]
    pub api_secret: String,
    #[serde(default)]
    pub transport: TransportKind,
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_url: Option<String>,
}

impl ClientConfig {
    pub fn new(environment: Environment, api_key: impl Into<String>, api_secret: impl Into<String>) -> Self {
        Self {
            environment,
            api_key: api_key.into(),
            api_secret: api_secret.into(),
            transport: TransportKind::default(),
            timeout_seconds: DEFAULT_TIMEOUT_SECS,
            api_url: None,
        }
    }

    pub fn with_transport(mut self, transport: TransportKind) -> Self {
        self.transport = transport;
        self
    }

    pub fn with_timeout(mut self, seconds: u64) -> Self {
        self.timeout_seconds = seconds;
        self
    }

    /// Point the client at an explicit base URL instead of the environment's.
    pub fn with_api_url(mut self, url: impl Into<String>) -> Self {
        self.api_url = Some(url.into());
        self
    }

    /// The base URL calls are made against.
    pub fn api_url(&self) -> &str {
        self.api_url.as_deref().unwrap_or(self.environment.api_url())
    }

    /// # Errors
    /// Returns `ApiError::Config` if the key or secret is empty or the
    /// timeout is zero.
    pub fn validate(&self) -> Result<()> {
        if self.api_key.trim().is_empty() {
            return Err(ApiError::Config("API key is required".to_string()));
        }
        if self.api_secret.trim().is_empty() {
            return Err(ApiError::Config("API secret is required".to_string()));
        }
        if self.timeout_seconds == 0 {
            return Err(ApiError::Config("timeout must be at least one second".to_string()));
        }
        Ok(())
    }

    /// Load configuration from the process environment.
    ///
    /// # Errors
    /// Returns `ApiError::Config` if a required variable is missing or a
    /// value cannot be parsed.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration through `lookup`, which maps a variable name to
    /// its value.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |name: &str| {
            lookup(name)
                .filter(|value| !value.trim().is_empty())
                .ok_or_else(|| ApiError::Config(format!("{name} is not set")))
        };

        let environment = match lookup("NETISTRAR_ENVIRONMENT") {
            Some(value) => value.parse()?,
            None => Environment::default(),
        };
        let transport = match lookup("NETISTRAR_TRANSPORT") {
            Some(value) => value.parse()?,
            None => TransportKind::default(),
        };
        let timeout_seconds = match lookup("NETISTRAR_TIMEOUT") {
            Some(value) => value
                .trim()
                .parse::<u64>()
                .map_err(|e| ApiError::Config(format!("invalid NETISTRAR_TIMEOUT: {e}")))?,
            None => DEFAULT_TIMEOUT_SECS,
        };

        let config = Self {
            environment,
            api_key: required("NETISTRAR_API_KEY")?,
            api_secret: required("NETISTRAR_API_SECRET")?,
            transport,
            timeout_seconds,
            api_url: lookup("NETISTRAR_API_URL").filter(|url| !url.trim().is_empty()),
        };
        config.validate()?;

        tracing::debug!(environment = %config.environment, api_url = config.api_url(), transport = ?config.transport, "configuration loaded from environment");
        Ok(config)
    }
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("environment", &self.environment)
            .field("api_key", &"<redacted>")
            .field("api_secret", &"<redacted>")
            .field("transport", &self.transport)
            .field("timeout_seconds", &self.timeout_seconds)
            .field("api_url", &self.api_url)
            .finish()
    }
}
