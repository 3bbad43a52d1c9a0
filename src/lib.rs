//! Vote Relay - Firestore vote records to a spreadsheet webhook
//!
//! This crate relays each newly created vote record to a spreadsheet-backed
//! HTTP endpoint, authenticated with a shared secret, and reports a
//! classified outcome.
//!
//! # Architecture
//!
//! ```text
//! Trigger ──▶ EventValidator ──▶ WebhookRelay ──▶ Spreadsheet endpoint
//!                  │                   │
//!                  ▼                   ▼
//!           IdentityLookup      deadline race (30s)
//!                  │                   │
//!                  └───────┬───────────┘
//!                          ▼
//!                    RelayOutcome (logged, never retried)
//! ```
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use vote_relay::{InMemoryDirectory, RelayConfig, UserProfile, VoteEvent, VoteRelay};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = RelayConfig::from_env()?;
//!     let directory = InMemoryDirectory::new()
//!         .with_user(UserProfile::new("u1").with_email("u1@example.com"));
//!
//!     let relay = VoteRelay::new(config, Arc::new(directory))?;
//!     let outcome = relay.process(VoteEvent::new("u1", "team-a")).await;
//!
//!     println!("Outcome: {}", outcome.kind());
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod auth;
pub mod config;
pub mod error;
pub mod identity;
pub mod pipeline;
pub mod relay;
pub mod trigger;
pub mod types;
pub mod validator;

// Re-exports for convenience
pub use auth::authenticate_payload;
pub use config::RelayConfig;
pub use error::{ConfigError, Error, RelayError, RelayResult, Result};
pub use identity::{IdentityLookup, IdentityToolkitLookup, InMemoryDirectory, TokenSource};
pub use pipeline::{RelayOutcome, VoteRelay};
pub use relay::{RelayResponse, WebhookRelay};
pub use trigger::trigger_router;
pub use types::{RelayPayload, UserProfile, VoteEvent};
pub use validator::EventValidator;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");
