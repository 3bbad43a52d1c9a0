//! Trigger ingress for the relay
//!
//! Hosts the pipeline behind an HTTP endpoint that receives Firestore
//! document-created events (JSON encoding) for the `votes` collection.
//!
//! - `POST /` - one document event; always acknowledged with `200`
//! - `GET /health` - liveness check
//!
//! # Event shape
//!
//! ```json
//! {
//!   "value": {
//!     "name": "projects/p/databases/(default)/documents/votes/USER_ID",
//!     "fields": { "votedFor": { "stringValue": "team-a" } }
//!   }
//! }
//! ```
//!
//! The document id is the user id. Failures are acknowledged too, so the
//! event store never redelivers.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use axum::body::Bytes;
use axum::extract::State;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::error::{RelayError, RelayResult};
use crate::pipeline::{record_outcome, OutcomeSummary, RelayOutcome, VoteRelay};
use crate::relay::duration_ms;
use crate::types::VoteEvent;

/// Collection whose created documents are relayed
pub const VOTES_COLLECTION: &str = "votes";

/// Document field holding the vote target
pub const VOTED_FOR_FIELD: &str = "votedFor";

/// Firestore document event, JSON encoding
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentEvent {
    /// The created document; absent when the trigger carried no data
    #[serde(default)]
    pub value: Option<Document>,
}

/// A Firestore document
#[derive(Debug, Clone, Deserialize)]
pub struct Document {
    /// Full resource name, ending in `documents/<collection>/<id>`
    pub name: String,
    /// Typed field values
    #[serde(default)]
    pub fields: HashMap<String, FieldValue>,
}

/// A Firestore typed value; only strings are relayed
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldValue {
    /// Set when the field holds a string
    #[serde(default)]
    pub string_value: Option<String>,
}

impl DocumentEvent {
    /// Parse an event from a raw request body
    pub fn from_bytes(bytes: &[u8]) -> RelayResult<Self> {
        serde_json::from_slice(bytes)
            .map_err(|e| RelayError::MissingEventData(format!("malformed event body: {e}")))
    }

    /// Extract the vote carried by this event
    ///
    /// A missing `votedFor` becomes an empty string and is rejected later by
    /// the validator.
    pub fn into_vote_event(self) -> RelayResult<VoteEvent> {
        let document = self
            .value
            .ok_or_else(|| RelayError::MissingEventData("event carried no document".to_string()))?;

        let user_id = vote_document_id(&document.name).ok_or_else(|| {
            RelayError::MissingEventData(format!(
                "document {} is not in the {} collection",
                document.name, VOTES_COLLECTION
            ))
        })?;

        let voted_for = document
            .fields
            .get(VOTED_FOR_FIELD)
            .and_then(|v| v.string_value.clone())
            .unwrap_or_default();

        Ok(VoteEvent::new(user_id, voted_for))
    }
}

/// Document id of a `votes/<id>` resource name
fn vote_document_id(name: &str) -> Option<&str> {
    let (_, path) = name.rsplit_once("/documents/").unwrap_or(("", name));
    let mut segments = path.split('/');
    match (segments.next(), segments.next(), segments.next()) {
        (Some(VOTES_COLLECTION), Some(id), None) if !id.is_empty() => Some(id),
        _ => None,
    }
}

/// Liveness response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Always "healthy" if responding
    pub status: String,
}

impl Default for HealthResponse {
    fn default() -> Self {
        Self {
            status: "healthy".to_string(),
        }
    }
}

/// Build the trigger router
pub fn trigger_router(relay: Arc<VoteRelay>) -> Router {
    Router::new()
        .route("/", post(vote_created_handler))
        .route("/health", get(health_handler))
        .with_state(relay)
}

/// Handle one document-created event
#[instrument(skip(relay, body), fields(bytes = body.len()))]
pub async fn vote_created_handler(
    State(relay): State<Arc<VoteRelay>>,
    body: Bytes,
) -> Json<OutcomeSummary> {
    let started = Instant::now();

    let event = DocumentEvent::from_bytes(&body).and_then(DocumentEvent::into_vote_event);

    let outcome = match event {
        Ok(event) => relay.process(event).await,
        Err(e) => {
            let outcome = RelayOutcome::Failed(e);
            record_outcome(&outcome, duration_ms(started.elapsed()));
            outcome
        }
    };

    debug!(outcome = outcome.kind(), "Acknowledging trigger");
    Json(outcome.summary())
}

async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::default())
}
