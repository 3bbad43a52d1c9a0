//! Event validation
//!
//! Turns a raw [`VoteEvent`] into a sendable [`RelayPayload`], or rejects it
//! before any delivery is attempted.
//!
//! ```text
//! VoteEvent ──> identity lookup ──> defaulting ──> payload ──> required fields
//!                     │                                              │
//!                     ▼                                              ▼
//!          UserResolutionFailed                           MissingRequiredField
//! ```

use std::sync::Arc;

use tracing::{debug, instrument, warn};

use crate::config::RelayConfig;
use crate::error::{RelayError, RelayResult};
use crate::identity::IdentityLookup;
use crate::types::{RelayPayload, VoteEvent};

/// Resolves and validates vote events
#[derive(Clone)]
pub struct EventValidator {
    identity: Arc<dyn IdentityLookup>,
    config: Arc<RelayConfig>,
}

impl EventValidator {
    /// Create a validator backed by the given identity lookup
    pub fn new(identity: Arc<dyn IdentityLookup>, config: Arc<RelayConfig>) -> Self {
        Self { identity, config }
    }

    /// Build an authenticated payload for the event
    ///
    /// # Errors
    ///
    /// - [`RelayError::UserResolutionFailed`] if the identity lookup fails
    /// - [`RelayError::MissingRequiredField`] if `userId`, `email` or
    ///   `votedFor` is empty after defaulting
    #[instrument(skip(self, event), fields(user_id = %event.user_id))]
    pub async fn validate(&self, event: &VoteEvent) -> RelayResult<RelayPayload> {
        let profile = self.identity.lookup(&event.user_id).await.map_err(|e| {
            warn!(error = %e, "User lookup failed");
            RelayError::UserResolutionFailed {
                user_id: event.user_id.clone(),
                reason: format!("{e:#}"),
            }
        })?;

        let payload = RelayPayload {
            secret: self.config.shared_secret.clone(),
            user_id: profile.uid.clone(),
            user_name: profile.display_name_or_default().to_string(),
            email: profile.email_or_default().to_string(),
            voted_for: event.voted_for.clone(),
        };

        if let Some(field) = payload.missing_required_field() {
            warn!(field, ?payload, "Payload is missing a required field");
            return Err(RelayError::MissingRequiredField(field));
        }

        debug!(?payload, "Payload assembled");
        Ok(payload)
    }
}
