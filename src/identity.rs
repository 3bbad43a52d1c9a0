//! User identity lookup
//!
//! The validator resolves every event's user id through an [`IdentityLookup`]
//! before building a payload. Profiles are fetched fresh per event and never
//! cached.
//!
//! Two implementations are provided:
//!
//! - [`InMemoryDirectory`]: a fixed map of profiles, for tests and local runs
//! - [`IdentityToolkitLookup`]: Firebase Auth's `accounts:lookup` REST call

use std::collections::HashMap;
use std::time::Duration;

use anyhow::{anyhow, bail, Context};
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use crate::types::UserProfile;

/// Identity Toolkit API root
pub const IDENTITY_TOOLKIT_BASE_URL: &str = "https://identitytoolkit.googleapis.com/v1";

/// GCE metadata server token endpoint for the default service account
pub const METADATA_TOKEN_URL: &str =
    "http://metadata.google.internal/computeMetadata/v1/instance/service-accounts/default/token";

const LOOKUP_TIMEOUT: Duration = Duration::from_secs(10);

/// Resolves a user id into a full profile
#[async_trait::async_trait]
pub trait IdentityLookup: Send + Sync + 'static {
    /// Look up the profile for `uid`; unknown users are an error
    async fn lookup(&self, uid: &str) -> anyhow::Result<UserProfile>;
}

/// Map-backed identity lookup
#[derive(Debug, Clone, Default)]
pub struct InMemoryDirectory {
    users: HashMap<String, UserProfile>,
}

impl InMemoryDirectory {
    /// Create an empty directory
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a profile, keyed by its uid
    pub fn with_user(mut self, profile: UserProfile) -> Self {
        self.users.insert(profile.uid.clone(), profile);
        self
    }
}

#[async_trait::async_trait]
impl IdentityLookup for InMemoryDirectory {
    async fn lookup(&self, uid: &str) -> anyhow::Result<UserProfile> {
        self.users
            .get(uid)
            .cloned()
            .ok_or_else(|| anyhow!("no user record for uid {uid}"))
    }
}

/// Where [`IdentityToolkitLookup`] gets its bearer token
#[derive(Clone)]
pub enum TokenSource {
    /// A fixed access token
    Static(String),
    /// The GCE/Cloud Run metadata server
    MetadataServer,
}

impl std::fmt::Debug for TokenSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Static(_) => f.write_str("Static(***)"),
            Self::MetadataServer => f.write_str("MetadataServer"),
        }
    }
}

/// Firebase Auth lookup through the Identity Toolkit REST API
#[derive(Debug, Clone)]
pub struct IdentityToolkitLookup {
    client: reqwest::Client,
    base_url: String,
    project_id: String,
    token_source: TokenSource,
}

#[derive(Debug, Deserialize)]
struct AccessToken {
    access_token: String,
}

#[derive(Debug, Deserialize)]
struct LookupResponse {
    #[serde(default)]
    users: Vec<AccountInfo>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AccountInfo {
    local_id: String,
    #[serde(default)]
    display_name: Option<String>,
    #[serde(default)]
    email: Option<String>,
}

impl From<AccountInfo> for UserProfile {
    fn from(info: AccountInfo) -> Self {
        Self {
            uid: info.local_id,
            display_name: info.display_name,
            email: info.email,
        }
    }
}

impl IdentityToolkitLookup {
    /// Create a lookup for the given Firebase project
    ///
    /// # Errors
    ///
    /// Fails if the HTTP client cannot be built.
    pub fn new(project_id: impl Into<String>, token_source: TokenSource) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(LOOKUP_TIMEOUT)
            .build()
            .context("failed to build identity lookup client")?;

        Ok(Self {
            client,
            base_url: IDENTITY_TOOLKIT_BASE_URL.to_string(),
            project_id: project_id.into(),
            token_source,
        })
    }

    /// Point the lookup at a different API root
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    async fn bearer_token(&self) -> anyhow::Result<String> {
        match &self.token_source {
            TokenSource::Static(token) => Ok(token.clone()),
            TokenSource::MetadataServer => {
                let response = self
                    .client
                    .get(METADATA_TOKEN_URL)
                    .header("Metadata-Flavor", "Google")
                    .send()
                    .await
                    .context("metadata server unreachable")?
                    .error_for_status()
                    .context("metadata server refused token request")?;
                let token: AccessToken = response
                    .json()
                    .await
                    .context("metadata server returned a malformed token")?;
                Ok(token.access_token)
            }
        }
    }
}

#[async_trait::async_trait]
impl IdentityLookup for IdentityToolkitLookup {
    async fn lookup(&self, uid: &str) -> anyhow::Result<UserProfile> {
        let token = self.bearer_token().await?;
        let url = format!(
            "{}/projects/{}/accounts:lookup",
            self.base_url.trim_end_matches('/'),
            self.project_id
        );

        debug!(uid = %uid, "Looking up user record");

        let response = self
            .client
            .post(&url)
            .bearer_auth(token)
            .json(&json!({ "localId": [uid] }))
            .send()
            .await
            .with_context(|| format!("identity lookup request failed for {uid}"))?;

        let status = response.status();
        if !status.is_success() {
            bail!("identity lookup for {uid} returned HTTP {}", status.as_u16());
        }

        let body: LookupResponse = response
            .json()
            .await
            .context("identity lookup returned a malformed body")?;

        body.users
            .into_iter()
            .find(|u| u.local_id == uid)
            .map(UserProfile::from)
            .ok_or_else(|| anyhow!("no user record for uid {uid}"))
    }
}
