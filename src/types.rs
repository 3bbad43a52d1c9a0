//! Vote relay data model
//!
//! Strongly-typed representations of the trigger input, the resolved user
//! profile and the outbound payload. All of them are created and dropped
//! within one relay invocation.

use serde::{Deserialize, Serialize};

/// Placeholder used when the profile has no display name
pub const NAME_UNSET: &str = "name unset";

/// Placeholder used when the profile has no email
pub const EMAIL_UNSET: &str = "email unset";

/// A newly created vote record, as delivered by the trigger
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoteEvent {
    /// Per-record identifier, used as the user id
    pub user_id: String,
    /// The option the user voted for
    #[serde(default)]
    pub voted_for: String,
}

impl VoteEvent {
    /// Create a new vote event
    pub fn new(user_id: impl Into<String>, voted_for: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            voted_for: voted_for.into(),
        }
    }
}

/// User profile returned by the identity service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    /// Stable user id
    pub uid: String,
    /// Display name, if the user set one
    #[serde(default)]
    pub display_name: Option<String>,
    /// Email, if known
    #[serde(default)]
    pub email: Option<String>,
}

impl UserProfile {
    /// Create a profile with only a uid
    pub fn new(uid: impl Into<String>) -> Self {
        Self {
            uid: uid.into(),
            display_name: None,
            email: None,
        }
    }

    /// Set the display name
    pub fn with_display_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = Some(name.into());
        self
    }

    /// Set the email
    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    /// Display name, or [`NAME_UNSET`] when absent or empty
    pub fn display_name_or_default(&self) -> &str {
        self.display_name
            .as_deref()
            .filter(|n| !n.is_empty())
            .unwrap_or(NAME_UNSET)
    }

    /// Email, or [`EMAIL_UNSET`] when absent or empty
    pub fn email_or_default(&self) -> &str {
        self.email
            .as_deref()
            .filter(|e| !e.is_empty())
            .unwrap_or(EMAIL_UNSET)
    }
}

/// JSON body posted to the spreadsheet endpoint
///
/// The `Debug` impl redacts `secret`, so payloads can go straight into logs.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelayPayload {
    /// Shared secret checked by the receiving endpoint
    pub secret: String,
    /// Resolved user id
    pub user_id: String,
    /// Display name or placeholder
    pub user_name: String,
    /// Email or placeholder
    pub email: String,
    /// Vote target
    pub voted_for: String,
}

impl std::fmt::Debug for RelayPayload {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RelayPayload")
            .field("secret", &"***")
            .field("user_id", &self.user_id)
            .field("user_name", &self.user_name)
            .field("email", &self.email)
            .field("voted_for", &self.voted_for)
            .finish()
    }
}

impl RelayPayload {
    /// Name of the first required field that is empty, if any
    pub fn missing_required_field(&self) -> Option<&'static str> {
        if self.user_id.is_empty() {
            Some("userId")
        } else if self.email.is_empty() {
            Some("email")
        } else if self.voted_for.is_empty() {
            Some("votedFor")
        } else {
            None
        }
    }
}
