//! Error types for Vote Relay
//!
//! This module provides the error hierarchy using `thiserror`. Every
//! [`RelayError`] is terminal for the event it belongs to: the pipeline logs
//! it and acknowledges the trigger, nothing is retried.

use thiserror::Error;

/// The main error type for Vote Relay operations
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration loading errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Generic error with message
    #[error("{0}")]
    Generic(String),
}

/// Errors raised while loading process configuration
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// Shared secret was set but empty
    #[error("SPREADSHEET_SECRET cannot be empty")]
    EmptySecret,

    /// Destination URL could not be parsed
    #[error("Invalid webhook URL: {0}")]
    InvalidUrl(String),

    /// Deadline override was not a positive integer
    #[error("Invalid timeout: {0}")]
    InvalidTimeout(String),
}

/// Classified failure of a single relay invocation
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RelayError {
    /// Trigger delivered no document data
    #[error("Event data missing: {0}")]
    MissingEventData(String),

    /// Identity lookup failed for the event's user id
    #[error("User resolution failed for {user_id}: {reason}")]
    UserResolutionFailed {
        /// User id that could not be resolved
        user_id: String,
        /// Underlying lookup failure
        reason: String,
    },

    /// A required payload field was empty after defaulting
    #[error("Missing required field: {0}")]
    MissingRequiredField(&'static str),

    /// Destination URL unset or still the placeholder
    #[error("Webhook URL is not configured")]
    ConfigurationError,

    /// Payload secret does not match the configured secret
    #[error("Payload secret does not match the configured secret")]
    AuthenticationError,

    /// Connection-level failure contacting the endpoint
    #[error("Network error: {0}")]
    NetworkError(String),

    /// No complete response within the deadline
    #[error("Webhook request timed out after {0}ms")]
    Timeout(u64),

    /// Non-200 status, or 200 without `status: "success"`
    #[error("Remote rejected the relay (HTTP {status}): {message}")]
    RemoteRejection {
        /// HTTP status code
        status: u16,
        /// Remote `message` field, or "unknown error"
        message: String,
    },

    /// Response body was not valid JSON
    #[error("Response parse error: {0}")]
    ResponseParseError(String),
}

impl RelayError {
    /// Stable label used in structured logs and trigger acknowledgements
    pub fn kind(&self) -> &'static str {
        match self {
            Self::MissingEventData(_) => "missing_event_data",
            Self::UserResolutionFailed { .. } => "user_resolution_failed",
            Self::MissingRequiredField(_) => "missing_required_field",
            Self::ConfigurationError => "configuration_error",
            Self::AuthenticationError => "authentication_error",
            Self::NetworkError(_) => "network_error",
            Self::Timeout(_) => "timeout",
            Self::RemoteRejection { .. } => "remote_rejection",
            Self::ResponseParseError(_) => "response_parse_error",
        }
    }

    /// Whether the failure happened before any outbound request was issued
    pub fn is_pre_flight(&self) -> bool {
        matches!(
            self,
            Self::MissingEventData(_)
                | Self::UserResolutionFailed { .. }
                | Self::MissingRequiredField(_)
                | Self::ConfigurationError
                | Self::AuthenticationError
        )
    }
}

/// Result type alias for Vote Relay operations
pub type Result<T> = std::result::Result<T, Error>;

/// Result type alias for a single relay invocation
pub type RelayResult<T> = std::result::Result<T, RelayError>;

impl Error {
    /// Create a generic error from a string
    pub fn generic<S: Into<String>>(msg: S) -> Self {
        Error::Generic(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::Config(ConfigError::InvalidUrl("ftp://sheet".to_string()));
        assert!(err.to_string().contains("Invalid webhook URL"));
        assert!(err.to_string().contains("ftp://sheet"));
    }

    #[test]
    fn test_config_error_converts() {
        let err: Error = ConfigError::EmptySecret.into();
        assert!(matches!(err, Error::Config(ConfigError::EmptySecret)));
        assert_eq!(
            err.to_string(),
            "Configuration error: SPREADSHEET_SECRET cannot be empty"
        );
    }

    #[test]
    fn test_remote_rejection_display() {
        let err = RelayError::RemoteRejection {
            status: 500,
            message: "db down".to_string(),
        };
        assert!(err.to_string().contains("500"));
        assert!(err.to_string().contains("db down"));
    }

    #[test]
    fn test_timeout_and_network_are_distinct() {
        let timeout = RelayError::Timeout(30_000);
        let network = RelayError::NetworkError("connection refused".to_string());
        assert_ne!(timeout.kind(), network.kind());
        assert!(!timeout.is_pre_flight());
        assert!(!network.is_pre_flight());
    }

    #[test]
    fn test_pre_flight_kinds() {
        assert!(RelayError::ConfigurationError.is_pre_flight());
        assert!(RelayError::AuthenticationError.is_pre_flight());
        assert!(RelayError::MissingRequiredField("votedFor").is_pre_flight());
        assert!(!RelayError::ResponseParseError("eof".to_string()).is_pre_flight());
    }

    #[test]
    fn test_generic_error() {
        let err = Error::generic("something went wrong");
        assert_eq!(err.to_string(), "something went wrong");
    }
}
