//! Configuration for the advisor and its backend.

use crate::errors::ConfigError;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Environment variable overriding the backend base URL.
pub const ENV_BASE_URL: &str = "PURCHASEFLOW_OLLAMA_URL";
/// Environment variable overriding the model identifier.
pub const ENV_MODEL: &str = "PURCHASEFLOW_MODEL";
/// Environment variable overriding the sampling temperature.
pub const ENV_TEMPERATURE: &str = "PURCHASEFLOW_TEMPERATURE";
/// Environment variable setting a request timeout in seconds.
pub const ENV_TIMEOUT_SECS: &str = "PURCHASEFLOW_TIMEOUT_SECS";

/// Settings for the text-generation backend and the invoker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdvisorConfig {
    /// Base URL of the Ollama-compatible backend.
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Model identifier sent with every request.
    #[serde(default = "default_model")]
    pub model: String,
    /// Sampling temperature.
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    /// Per-request timeout. None leaves timing to the HTTP client.
    #[serde(default)]
    pub request_timeout_seconds: Option<f64>,
}

fn default_base_url() -> String {
    "http://localhost:11434".to_string()
}

fn default_model() -> String {
    "llama3.2:1b".to_string()
}

fn default_temperature() -> f32 {
    0.7
}

impl Default for AdvisorConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            model: default_model(),
            temperature: default_temperature(),
            request_timeout_seconds: None,
        }
    }
}

impl AdvisorConfig {
    /// Creates the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a configuration from defaults overlaid with `PURCHASEFLOW_*`
    /// environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if a numeric variable cannot be parsed or the result
    /// fails [`validate`](Self::validate).
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) with an injectable lookup.
    ///
    /// # Errors
    ///
    /// See [`from_env`](Self::from_env).
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let config = Self::parse_lookup(lookup)?;
        config.validate()?;
        Ok(config)
    }

    /// Overlays `PURCHASEFLOW_*` variables on the defaults without calling
    /// [`validate`](Self::validate), so callers can apply further overrides
    /// first.
    ///
    /// # Errors
    ///
    /// Returns an error if a numeric variable cannot be parsed.
    pub fn parse_env() -> Result<Self, ConfigError> {
        Self::parse_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`parse_env`](Self::parse_env) with an injectable lookup.
    ///
    /// # Errors
    ///
    /// See [`parse_env`](Self::parse_env).
    pub fn parse_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(url) = lookup(ENV_BASE_URL) {
            config.base_url = url;
        }
        if let Some(model) = lookup(ENV_MODEL) {
            config.model = model;
        }
        if let Some(raw) = lookup(ENV_TEMPERATURE) {
            config.temperature = parse_number(ENV_TEMPERATURE, &raw)?;
        }
        if let Some(raw) = lookup(ENV_TIMEOUT_SECS) {
            config.request_timeout_seconds = Some(parse_number(ENV_TIMEOUT_SECS, &raw)?);
        }
        Ok(config)
    }

    /// Sets the base URL.
    #[must_use]
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Sets the model identifier.
    #[must_use]
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Sets the sampling temperature.
    #[must_use]
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    /// Sets the request timeout.
    #[must_use]
    pub fn with_request_timeout(mut self, seconds: f64) -> Self {
        self.request_timeout_seconds = Some(seconds);
        self
    }

    /// Returns the request timeout as a `Duration`.
    ///
    /// A value that does not fit a `Duration` yields `None`; [`validate`](Self::validate)
    /// rejects such values.
    #[must_use]
    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_seconds
            .and_then(|secs| Duration::try_from_secs_f64(secs).ok())
    }

    /// Checks the configuration for obviously unusable values.
    ///
    /// # Errors
    ///
    /// Returns an error for an empty URL or model, a temperature outside
    /// 0.0–2.0, or a non-positive timeout.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.base_url.trim().is_empty() {
            return Err(ConfigError::Invalid("base_url cannot be empty".to_string()));
        }
        if !self.base_url.starts_with("http://") && !self.base_url.starts_with("https://") {
            return Err(ConfigError::Invalid(format!(
                "base_url must be an http(s) URL, got '{}'",
                self.base_url
            )));
        }
        if self.model.trim().is_empty() {
            return Err(ConfigError::Invalid("model cannot be empty".to_string()));
        }
        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(ConfigError::Invalid(format!(
                "temperature must be between 0.0 and 2.0, got {}",
                self.temperature
            )));
        }
        if let Some(secs) = self.request_timeout_seconds {
            if !secs.is_finite() || secs <= 0.0 {
                return Err(ConfigError::Invalid(format!(
                    "request timeout must be positive, got {secs}"
                )));
            }
            if Duration::try_from_secs_f64(secs).is_err() {
                return Err(ConfigError::Invalid(format!(
                    "request timeout is too large, got {secs}"
                )));
            }
        }
        Ok(())
    }
}

fn parse_number<T>(key: &str, raw: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim().parse().map_err(|e: T::Err| ConfigError::InvalidValue {
        key: key.to_string(),
        value: raw.to_string(),
        reason: e.to_string(),
    })
}
