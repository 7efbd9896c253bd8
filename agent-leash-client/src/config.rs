//! Configuration for the authorization server client.

use std::time::Duration;

use crate::error::ClientError;

/// Environment variable holding the server base URL.
pub const ENV_URL: &str = "AGENT_LEASH_URL";

/// Environment variable holding the request timeout in seconds.
pub const ENV_TIMEOUT_SECS: &str = "AGENT_LEASH_TIMEOUT_SECS";

/// Configuration for [`LeashClient`](crate::LeashClient).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Base URL of the authorization server, without a trailing path.
    ///
    /// Default: `http://127.0.0.1:8787`
    pub base_url: String,

    /// Timeout applied to every request.
    ///
    /// Default: 10 seconds
    pub timeout: Duration,

    /// `User-Agent` header sent with every request.
    ///
    /// Default: `agent-leash-client/<version>`
    pub user_agent: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8787".to_string(),
            timeout: Duration::from_secs(10),
            user_agent: concat!("agent-leash-client/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

impl ClientConfig {
    /// Creates a new configuration with defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a configuration from `AGENT_LEASH_URL` and
    /// `AGENT_LEASH_TIMEOUT_SECS`, falling back to defaults for unset
    /// variables.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::InvalidConfig` if the timeout is not a whole
    /// number of seconds.
    pub fn from_env() -> Result<Self, ClientError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ClientError> {
        let mut config = Self::default();

        if let Some(url) = lookup(ENV_URL).filter(|url| !url.trim().is_empty()) {
            config.base_url = url.trim().to_string();
        }

        if let Some(raw) = lookup(ENV_TIMEOUT_SECS) {
            let secs = raw
                .trim()
                .parse::<u64>()
                .map_err(|e| ClientError::InvalidConfig {
                    reason: format!("{ENV_TIMEOUT_SECS}='{raw}' is not a number of seconds: {e}"),
                })?;
            config.timeout = Duration::from_secs(secs);
        }

        Ok(config)
    }

    /// Sets the server base URL.
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Sets the request timeout.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sets the `User-Agent` header.
    #[must_use]
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Joins `path` onto the base URL.
    pub(crate) fn endpoint(&self, path: &str) -> String {
        format!("{}{path}", self.base_url.trim_end_matches('/'))
    }
}
