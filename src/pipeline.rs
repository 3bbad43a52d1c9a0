//! Per-event relay pipeline
//!
//! Runs validation and delivery for one vote event and turns every result
//! into a terminal [`RelayOutcome`]. Nothing here returns an error to the
//! caller: failures are logged and reported, the trigger is never asked to
//! redeliver.

use std::sync::Arc;
use std::time::Instant;

use serde::Serialize;
use tracing::{error, info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::config::RelayConfig;
use crate::error::{RelayError, Result};
use crate::identity::IdentityLookup;
use crate::relay::{duration_ms, RelayResponse, WebhookRelay};
use crate::types::VoteEvent;
use crate::validator::EventValidator;

/// Terminal result of one relay invocation
#[derive(Debug, Clone, PartialEq)]
pub enum RelayOutcome {
    /// The endpoint accepted the vote
    Delivered(RelayResponse),
    /// The event was dropped
    Failed(RelayError),
}

impl RelayOutcome {
    /// Stable label for logs and acknowledgements
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Delivered(_) => "delivered",
            Self::Failed(e) => e.kind(),
        }
    }

    /// Whether the vote reached the spreadsheet
    pub fn is_delivered(&self) -> bool {
        matches!(self, Self::Delivered(_))
    }

    /// Short summary returned to the trigger
    pub fn summary(&self) -> OutcomeSummary {
        OutcomeSummary {
            outcome: self.kind(),
            error: match self {
                Self::Delivered(_) => None,
                Self::Failed(e) => Some(e.to_string()),
            },
        }
    }
}

/// Serializable acknowledgement body
#[derive(Debug, Clone, Serialize)]
pub struct OutcomeSummary {
    /// Outcome label
    pub outcome: &'static str,
    /// Failure description, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Validator and relay wired together
#[derive(Clone)]
pub struct VoteRelay {
    validator: EventValidator,
    relay: WebhookRelay,
}

impl VoteRelay {
    /// Build the pipeline from configuration and an identity lookup
    ///
    /// # Errors
    ///
    /// Fails if the HTTP client cannot be built.
    pub fn new(config: RelayConfig, identity: Arc<dyn IdentityLookup>) -> Result<Self> {
        let config = Arc::new(config);
        let relay = WebhookRelay::new(Arc::clone(&config))?;
        let validator = EventValidator::new(identity, config);
        Ok(Self { validator, relay })
    }

    /// Process one vote event end to end
    pub async fn process(&self, event: VoteEvent) -> RelayOutcome {
        let span = info_span!(
            "relay",
            relay_id = %Uuid::new_v4(),
            user_id = %event.user_id
        );

        async {
            let started = Instant::now();
            info!(voted_for = %event.voted_for, "Vote relay started");

            let result = match self.validator.validate(&event).await {
                Ok(payload) => {
                    info!(?payload, "Sending vote to webhook");
                    self.relay.deliver(&payload).await
                }
                Err(e) => Err(e),
            };

            let outcome = match result {
                Ok(response) => RelayOutcome::Delivered(response),
                Err(e) => RelayOutcome::Failed(e),
            };
            record_outcome(&outcome, duration_ms(started.elapsed()));
            outcome
        }
        .instrument(span)
        .await
    }
}

/// Log a terminal outcome
pub fn record_outcome(outcome: &RelayOutcome, duration_ms: u64) {
    match outcome {
        RelayOutcome::Delivered(response) => info!(
            duration_ms,
            response = %response.body,
            "Vote relay completed"
        ),
        RelayOutcome::Failed(e) if e.is_pre_flight() => warn!(
            duration_ms,
            error_kind = e.kind(),
            error = %e,
            "Vote dropped before delivery"
        ),
        RelayOutcome::Failed(e) => error!(
            duration_ms,
            error_kind = e.kind(),
            error = %e,
            "Vote relay failed"
        ),
    }
}
