//! Pure verification functions.
//!
//! Everything the verifier decides after a signature has verified lives
//! here as small side-effect free functions: instant parsing, the expiry
//! comparison and the claim expectations.
//!
//! | Function | Property |
//! |----------|----------|
//! | [`parse_instant`] | Only RFC 3339 instants are accepted |
//! | [`check_expiration`] | Current time is strictly less than expiration |
//! | [`check_action_hash`] | Claimed action hash equals the expected one |
//! | [`check_agent_id`] | Claimed agent id equals the expected one |

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::TokenError;

/// Why a proof token was rejected.
///
/// Serializes as the human-readable reason string used on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum InvalidReason {
    /// Signature verified but `exp` is not after the verification time.
    Expired,
    /// No candidate key verified the token.
    NoMatchingKey,
    /// The token is longer than [`MAX_TOKEN_LENGTH`](crate::MAX_TOKEN_LENGTH).
    TooLong,
    /// The `action_hash` claim differs from the expected value.
    ActionHashMismatch,
    /// The `agent_id` claim differs from the expected value.
    AgentIdMismatch,
    /// Any other reason, as reported by a remote verifier.
    Other(String),
}

impl InvalidReason {
    /// Returns the wire form of this reason.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Expired => "Token expired",
            Self::NoMatchingKey => "No matching key found or invalid signature",
            Self::TooLong => "Token too long",
            Self::ActionHashMismatch => "action_hash mismatch",
            Self::AgentIdMismatch => "agent_id mismatch",
            Self::Other(reason) => reason,
        }
    }
}

impl fmt::Display for InvalidReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<String> for InvalidReason {
    fn from(reason: String) -> Self {
        match reason.as_str() {
            "Token expired" => Self::Expired,
            "No matching key found or invalid signature" => Self::NoMatchingKey,
            "Token too long" => Self::TooLong,
            "action_hash mismatch" => Self::ActionHashMismatch,
            "agent_id mismatch" => Self::AgentIdMismatch,
            _ => Self::Other(reason),
        }
    }
}

impl From<InvalidReason> for String {
    fn from(reason: InvalidReason) -> Self {
        match reason {
            InvalidReason::Other(reason) => reason,
            known => known.as_str().to_string(),
        }
    }
}

/// Parses an RFC 3339 instant such as `2024-01-15T10:32:00.000Z`.
///
/// # Errors
///
/// Returns `TokenError::InvalidExpiration` carrying the raw value if it
/// cannot be parsed.
///
/// # Examples
///
/// ```
/// use agent_leash::parse_instant;
///
/// assert!(parse_instant("2024-01-15T10:32:00.000Z").is_ok());
/// assert!(parse_instant("2024-01-15T12:32:00+02:00").is_ok());
/// assert!(parse_instant("not-a-timestamp").is_err());
/// ```
pub fn parse_instant(value: &str) -> Result<DateTime<Utc>, TokenError> {
    DateTime::parse_from_rfc3339(value)
        .map(|instant| instant.with_timezone(&Utc))
        .map_err(|_| TokenError::InvalidExpiration {
            value: value.to_string(),
        })
}

/// Returns true if a token expiring at `exp` is expired at `now`.
///
/// The boundary is inclusive: a token is expired at its `exp` instant.
#[must_use]
pub fn is_expired(exp: DateTime<Utc>, now: DateTime<Utc>) -> bool {
    now >= exp
}

/// Checks if a token has expired at a given time.
///
/// # Errors
///
/// Returns `InvalidReason::Expired` if `now >= exp`.
///
/// # Examples
///
/// ```
/// use chrono::{Duration, Utc};
/// use agent_leash::check_expiration;
///
/// let now = Utc::now();
///
/// assert!(check_expiration(now + Duration::hours(1), now).is_ok());
/// assert!(check_expiration(now - Duration::hours(1), now).is_err());
/// assert!(check_expiration(now, now).is_err());
/// ```
pub fn check_expiration(exp: DateTime<Utc>, now: DateTime<Utc>) -> Result<(), InvalidReason> {
    if is_expired(exp, now) {
        Err(InvalidReason::Expired)
    } else {
        Ok(())
    }
}

/// Checks the `action_hash` claim against an expected value.
///
/// An absent or empty expectation always passes. A missing claim fails any
/// non-empty expectation.
///
/// # Errors
///
/// Returns `InvalidReason::ActionHashMismatch` on mismatch.
pub fn check_action_hash(
    expected: Option<&str>,
    claimed: Option<&str>,
) -> Result<(), InvalidReason> {
    if expectation_holds(expected, claimed) {
        Ok(())
    } else {
        Err(InvalidReason::ActionHashMismatch)
    }
}

/// Checks the `agent_id` claim against an expected value.
///
/// Same rules as [`check_action_hash`].
///
/// # Errors
///
/// Returns `InvalidReason::AgentIdMismatch` on mismatch.
pub fn check_agent_id(
    expected: Option<&str>,
    claimed: Option<&str>,
) -> Result<(), InvalidReason> {
    if expectation_holds(expected, claimed) {
        Ok(())
    } else {
        Err(InvalidReason::AgentIdMismatch)
    }
}

fn expectation_holds(expected: Option<&str>, claimed: Option<&str>) -> bool {
    match expected {
        None | Some("") => true,
        Some(expected) => claimed == Some(expected),
    }
}
