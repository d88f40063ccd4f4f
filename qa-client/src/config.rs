use std::env;
use std::time::Duration;

use crate::backend::ClientError;

/// Default settings for talking to the backend.
#[derive(Debug, Clone, Copy)]
pub struct ClientDefaults {
    pub base_url: &'static str,
    pub base_url_env: &'static str,
    pub timeout_env: &'static str,
    pub timeout_secs: u64,
}

/// Shared defaults so CLI, GUI and tests can stay in sync.
///
/// The timeout is generous because `/api/ask` runs a local LLM that may take
/// up to a minute before answering.
pub const CLIENT_DEFAULTS: ClientDefaults = ClientDefaults {
    base_url: "http://127.0.0.1:5000",
    base_url_env: "PDFQA_BACKEND_URL",
    timeout_env: "PDFQA_TIMEOUT_SECS",
    timeout_secs: 120,
};

/// Backend base URL baked in at build time, if any.
const BUILD_BASE_URL: Option<&str> = option_env!("PDFQA_BACKEND_URL");

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Scheme + host (+ optional prefix) without a trailing slash.
    pub base_url: String,
    /// Whole-request timeout; `None` waits forever.
    pub timeout: Option<Duration>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: normalize_base_url(BUILD_BASE_URL.unwrap_or(CLIENT_DEFAULTS.base_url))
                .unwrap_or_else(|| CLIENT_DEFAULTS.base_url.to_string()),
            timeout: Some(Duration::from_secs(CLIENT_DEFAULTS.timeout_secs)),
        }
    }
}

impl ClientConfig {
    /// Resolves the config from the process environment.
    ///
    /// Precedence: explicit override, `PDFQA_BACKEND_URL` at runtime, the same
    /// variable at build time, then the built-in default.
    pub fn from_env(override_url: Option<&str>) -> Self {
        Self::resolve(
            override_url,
            env::var(CLIENT_DEFAULTS.base_url_env).ok().as_deref(),
            env::var(CLIENT_DEFAULTS.timeout_env).ok().as_deref(),
        )
    }

    /// Same as [`ClientConfig::from_env`] but with the environment passed in.
    pub fn resolve(override_url: Option<&str>, env_url: Option<&str>, env_timeout: Option<&str>) -> Self {
        let mut cfg = Self::default();
        if let Some(url) = override_url.and_then(normalize_base_url).or_else(|| env_url.and_then(normalize_base_url)) {
            cfg.base_url = url;
        }
        if let Some(raw) = env_timeout {
            match raw.trim().parse::<u64>() {
                Ok(0) => cfg.timeout = None,
                Ok(secs) => cfg.timeout = Some(Duration::from_secs(secs)),
                Err(_) => tracing::warn!(value = raw, "ignoring unparsable {}", CLIENT_DEFAULTS.timeout_env),
            }
        }
        cfg
    }

    pub fn with_base_url(mut self, url: &str) -> Self {
        if let Some(url) = normalize_base_url(url) {
            self.base_url = url;
        }
        self
    }

    pub fn validate(&self) -> Result<(), ClientError> {
        let rest = self
            .base_url
            .strip_prefix("http://")
            .or_else(|| self.base_url.strip_prefix("https://"))
            .ok_or_else(|| ClientError::InvalidConfiguration {
                message: format!("base url must start with http:// or https://: {}", self.base_url),
            })?;
        if rest.is_empty() {
            return Err(ClientError::InvalidConfiguration {
                message: format!("base url has no host: {}", self.base_url),
            });
        }
        Ok(())
    }
}

/// Trims whitespace and trailing slashes; empty input yields `None`.
pub fn normalize_base_url(raw: &str) -> Option<String> {
    let trimmed = raw.trim().trim_end_matches('/');
    if trimmed.is_empty() { None } else { Some(trimmed.to_string()) }
}
