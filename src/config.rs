//! Process configuration for the relay
//!
//! Loaded once at process start and shared read-only with the validator and
//! the webhook relay. All values come from environment variables:
//!
//! - `GAS_WEB_APP_URL`: destination webhook URL (optional; an unset URL fails
//!   each delivery with a configuration error instead of aborting startup)
//! - `SPREADSHEET_SECRET`: shared secret (default [`DEFAULT_SHARED_SECRET`])
//! - `VOTE_RELAY_TIMEOUT_SECS`: override of the 30 second delivery deadline

use std::env;
use std::time::Duration;

use tracing::{info, warn};
use url::Url;

use crate::error::{ConfigError, Result};

/// Environment variable holding the destination webhook URL
pub const WEBHOOK_URL_ENV_VAR: &str = "GAS_WEB_APP_URL";

/// Environment variable holding the shared secret
pub const SHARED_SECRET_ENV_VAR: &str = "SPREADSHEET_SECRET";

/// Environment variable overriding the delivery deadline
pub const TIMEOUT_ENV_VAR: &str = "VOTE_RELAY_TIMEOUT_SECS";

/// Documented default secret; deployments are expected to override it
pub const DEFAULT_SHARED_SECRET: &str = "METAGRI_HIMITSU_WORD_VOTE";

/// Placeholder left in deployment templates when the URL was never filled in
pub const UNSET_URL_SENTINEL: &str = "YOUR_GAS_WEB_APP_URL_HERE";

/// Delivery deadline measured from request start
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Client label sent as `User-Agent`
pub const DEFAULT_USER_AGENT: &str = concat!("vote-relay/", env!("CARGO_PKG_VERSION"));

/// Immutable relay configuration
#[derive(Clone)]
pub struct RelayConfig {
    /// Destination webhook URL, if configured
    pub webhook_url: Option<String>,
    /// Shared secret placed in every payload and checked before delivery
    pub shared_secret: String,
    /// Deadline for a complete webhook response
    pub timeout: Duration,
    /// Identifying client label
    pub user_agent: String,
}

impl std::fmt::Debug for RelayConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RelayConfig")
            .field("webhook_url", &self.webhook_url)
            .field("shared_secret", &"***")
            .field("timeout", &self.timeout)
            .field("user_agent", &self.user_agent)
            .finish()
    }
}

impl RelayConfig {
    /// Create a configuration with the given destination and secret
    pub fn new(webhook_url: impl Into<String>, shared_secret: impl Into<String>) -> Self {
        Self {
            webhook_url: Some(webhook_url.into()),
            shared_secret: shared_secret.into(),
            timeout: DEFAULT_TIMEOUT,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }

    /// Load configuration from the process environment
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the secret is empty, the URL is not an
    /// http(s) URL, or the timeout override is not a positive integer.
    pub fn from_env() -> Result<Self> {
        Ok(Self::from_lookup(|key| env::var(key).ok())?)
    }

    /// Load configuration through an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> std::result::Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let webhook_url = lookup(WEBHOOK_URL_ENV_VAR).filter(|u| !u.trim().is_empty());

        match webhook_url.as_deref() {
            None => warn!(
                "{} is not set; every delivery will fail until it is configured",
                WEBHOOK_URL_ENV_VAR
            ),
            Some(UNSET_URL_SENTINEL) => warn!(
                "{} still holds the placeholder value; deliveries will fail",
                WEBHOOK_URL_ENV_VAR
            ),
            Some(raw) => validate_url(raw)?,
        }

        let shared_secret = match lookup(SHARED_SECRET_ENV_VAR) {
            Some(secret) if secret.is_empty() => return Err(ConfigError::EmptySecret),
            Some(secret) => secret,
            None => {
                warn!(
                    "{} not set, falling back to the documented default secret",
                    SHARED_SECRET_ENV_VAR
                );
                DEFAULT_SHARED_SECRET.to_string()
            }
        };

        let timeout = match lookup(TIMEOUT_ENV_VAR) {
            Some(raw) => {
                let secs = raw
                    .trim()
                    .parse::<u64>()
                    .map_err(|e| ConfigError::InvalidTimeout(format!("{raw}: {e}")))?;
                if secs == 0 {
                    return Err(ConfigError::InvalidTimeout(
                        "Timeout cannot be 0".to_string(),
                    ));
                }
                Duration::from_secs(secs)
            }
            None => DEFAULT_TIMEOUT,
        };

        info!(
            webhook_configured = webhook_url.is_some(),
            timeout_secs = timeout.as_secs(),
            "Relay configuration loaded"
        );

        Ok(Self {
            webhook_url,
            shared_secret,
            timeout,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        })
    }

    /// Override the delivery deadline
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Clear the destination URL
    pub fn without_webhook_url(mut self) -> Self {
        self.webhook_url = None;
        self
    }

    /// The destination URL, unless it is unset or still the placeholder
    pub fn destination(&self) -> Option<&str> {
        self.webhook_url
            .as_deref()
            .filter(|u| !u.is_empty() && *u != UNSET_URL_SENTINEL)
    }
}

fn validate_url(raw: &str) -> std::result::Result<(), ConfigError> {
    let url = Url::parse(raw).map_err(|e| ConfigError::InvalidUrl(format!("{raw}: {e}")))?;
    match url.scheme() {
        "http" | "https" => Ok(()),
        other => Err(ConfigError::InvalidUrl(format!(
            "unsupported scheme {other}: {raw}"
        ))),
    }
}
