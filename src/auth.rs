//! Shared-secret payload authentication
//!
//! The only place the payload secret is compared against configuration.
//! The comparison is a plain equality check; the secret is a coarse token
//! checked by the receiving endpoint, not a signature.

use tracing::warn;

use crate::error::{RelayError, RelayResult};
use crate::types::RelayPayload;

/// Check that the payload carries the configured shared secret
///
/// # Errors
///
/// Returns [`RelayError::AuthenticationError`] when the secrets differ or the
/// payload secret is empty.
pub fn authenticate_payload(payload: &RelayPayload, configured_secret: &str) -> RelayResult<()> {
    if payload.secret.is_empty() || payload.secret != configured_secret {
        warn!(user_id = %payload.user_id, "Payload secret does not match configuration");
        return Err(RelayError::AuthenticationError);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn payload_with_secret(secret: &str) -> RelayPayload {
        RelayPayload {
            secret: secret.to_string(),
            user_id: "u1".to_string(),
            user_name: "name unset".to_string(),
            email: "u1@example.com".to_string(),
            voted_for: "team-a".to_string(),
        }
    }

    #[test]
    fn test_matching_secret_passes() {
        assert!(authenticate_payload(&payload_with_secret("S1"), "S1").is_ok());
    }

    #[test]
    fn test_empty_secret_rejected() {
        let err = authenticate_payload(&payload_with_secret(""), "").unwrap_err();
        assert_eq!(err, RelayError::AuthenticationError);
    }

    proptest! {
        #[test]
        fn prop_identical_secrets_authenticate(secret in ".{1,64}") {
            prop_assert!(authenticate_payload(&payload_with_secret(&secret), &secret).is_ok());
        }

        #[test]
        fn prop_mismatched_secrets_rejected(a in ".{0,64}", b in ".{1,64}") {
            prop_assume!(a != b);
            prop_assert_eq!(
                authenticate_payload(&payload_with_secret(&a), &b),
                Err(RelayError::AuthenticationError)
            );
        }
    }
}
