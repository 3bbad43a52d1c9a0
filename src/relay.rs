//! Webhook delivery
//!
//! Sends one validated [`RelayPayload`] to the spreadsheet endpoint and
//! classifies the result. One attempt per call, no retries.
//!
//! # Lifecycle
//!
//! ```text
//! destination configured? ──no──> ConfigurationError
//!          │
//! secret authenticates?   ──no──> AuthenticationError
//!          │
//!          ▼
//!   POST + read body ──── races ──── deadline ──> Timeout (request dropped)
//!          │
//!          ├── transport error ──> NetworkError
//!          ├── body not JSON   ──> ResponseParseError
//!          ├── 200 + "success" ──> RelayResponse
//!          └── anything else   ──> RemoteRejection
//! ```
//!
//! The deadline covers the whole exchange, including reading the body. When
//! it fires the request future is dropped, which closes its connection.

use std::sync::Arc;
use std::time::{Duration, Instant};

use http::header::CONTENT_TYPE;
use http::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::time::timeout;
use tracing::{debug, error, info, instrument, warn};

use crate::auth::authenticate_payload;
use crate::config::RelayConfig;
use crate::error::{Error, RelayError, RelayResult, Result};
use crate::types::RelayPayload;

/// Content type sent with every delivery
pub const JSON_CONTENT_TYPE: &str = "application/json; charset=utf-8";

/// `status` value the endpoint returns on acceptance
pub const SUCCESS_STATUS: &str = "success";

/// Message used when a rejection carries no `message` field
pub const UNKNOWN_ERROR_MESSAGE: &str = "unknown error";

/// Longest body excerpt written to logs
const LOG_BODY_LIMIT: usize = 512;

/// Accepted response from the endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelayResponse {
    /// HTTP status code (always 200 for an accepted delivery)
    pub status: u16,
    /// Parsed response body
    pub body: Value,
}

/// Delivers payloads to the configured webhook
#[derive(Debug, Clone)]
pub struct WebhookRelay {
    client: reqwest::Client,
    config: Arc<RelayConfig>,
}

impl WebhookRelay {
    /// Create a relay for the given configuration
    ///
    /// # Errors
    ///
    /// Fails if the HTTP client cannot be built.
    pub fn new(config: Arc<RelayConfig>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .redirect(reqwest::redirect::Policy::none())
            .pool_max_idle_per_host(0)
            .build()
            .map_err(|e| Error::generic(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self { client, config })
    }

    /// Deliver a payload and classify the outcome
    ///
    /// # Errors
    ///
    /// Returns the [`RelayError`] matching the failure; see the module docs.
    #[instrument(skip(self, payload), fields(user_id = %payload.user_id))]
    pub async fn deliver(&self, payload: &RelayPayload) -> RelayResult<RelayResponse> {
        let url = self.config.destination().ok_or_else(|| {
            error!("Webhook URL is unset or still the placeholder");
            RelayError::ConfigurationError
        })?;

        authenticate_payload(payload, &self.config.shared_secret)?;

        let request = self
            .client
            .post(url)
            .header(CONTENT_TYPE, JSON_CONTENT_TYPE)
            .json(payload);

        let exchange = async move {
            let response = request.send().await?;
            let status = response.status();
            let body = response.bytes().await?;
            Ok::<_, reqwest::Error>((status, body))
        };

        let started = Instant::now();
        let deadline = self.config.timeout;
        let deadline_ms = duration_ms(deadline);

        match timeout(deadline, exchange).await {
            Err(_) => {
                warn!(
                    elapsed_ms = duration_ms(started.elapsed()),
                    "Webhook request timed out; request aborted"
                );
                Err(RelayError::Timeout(deadline_ms))
            }
            Ok(Err(e)) => Err(classify_transport_error(&e, deadline_ms)),
            Ok(Ok((status, body))) => {
                debug!(
                    status = status.as_u16(),
                    bytes = body.len(),
                    elapsed_ms = duration_ms(started.elapsed()),
                    "Webhook response received"
                );
                interpret_response(status, &body)
            }
        }
    }
}

/// Whole milliseconds in `d`, saturating at `u64::MAX`
pub(crate) fn duration_ms(d: Duration) -> u64 {
    u64::try_from(d.as_millis()).unwrap_or(u64::MAX)
}

/// Map a transport-level failure onto the error taxonomy
fn classify_transport_error(err: &reqwest::Error, deadline_ms: u64) -> RelayError {
    if err.is_timeout() {
        warn!(error = %err, "Webhook request timed out");
        return RelayError::Timeout(deadline_ms);
    }

    error!(
        error = %err,
        connect = err.is_connect(),
        "Webhook request failed"
    );
    RelayError::NetworkError(error_chain(err))
}

fn error_chain(err: &dyn std::error::Error) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}

/// Classify a fully received response
///
/// Parsing comes first, so a non-JSON body is a parse error whatever the
/// status code.
pub fn interpret_response(status: StatusCode, body: &[u8]) -> RelayResult<RelayResponse> {
    let parsed: Value = match serde_json::from_slice(body) {
        Ok(value) => value,
        Err(e) => {
            error!(
                status = status.as_u16(),
                error = %e,
                body = %body_excerpt(body),
                "Failed to parse webhook response"
            );
            return Err(RelayError::ResponseParseError(e.to_string()));
        }
    };

    let accepted = status == StatusCode::OK
        && parsed.get("status").and_then(Value::as_str) == Some(SUCCESS_STATUS);

    if accepted {
        info!(response = %parsed, "Webhook accepted the vote");
        return Ok(RelayResponse {
            status: status.as_u16(),
            body: parsed,
        });
    }

    let message = parsed
        .get("message")
        .and_then(Value::as_str)
        .unwrap_or(UNKNOWN_ERROR_MESSAGE)
        .to_string();

    error!(
        status = status.as_u16(),
        response = %parsed,
        "Webhook rejected the vote"
    );

    Err(RelayError::RemoteRejection {
        status: status.as_u16(),
        message,
    })
}

fn body_excerpt(body: &[u8]) -> String {
    let text = String::from_utf8_lossy(body);
    if text.chars().count() <= LOG_BODY_LIMIT {
        return text.into_owned();
    }
    let mut excerpt: String = text.chars().take(LOG_BODY_LIMIT).collect();
    excerpt.push_str("...");
    excerpt
}
