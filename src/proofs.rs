//! Kani formal verification proof harnesses.
//!
//! # Running Proofs
//!
//! ```bash
//! cargo kani -p agent-leash
//! ```
//!
//! # Properties Verified
//!
//! | Category | Property | Harness |
//! |----------|----------|---------|
//! | Expiration | Never panics | `check_expiration_never_panics` |
//! | Expiration | Boundary is expired | `exp_equal_to_now_is_expired` |
//! | Expiration | Agrees with `is_expired` | `check_expiration_matches_predicate` |
//! | Expectations | Absent always passes | `absent_expectation_always_passes` |
//! | Expectations | Equal values pass | `equal_values_pass` |
//! | Signing string | Five fields | `signing_string_has_five_fields` |
//! | Keys | From bytes safe | `signing_key_from_bytes_no_panic` |

// Proofs module is conditionally compiled only when running Kani
#![cfg(kani)]

use chrono::{TimeZone, Utc};

use crate::keys::SigningKey;
use crate::signing::build_signing_input;
use crate::verification::{check_action_hash, check_agent_id, check_expiration, is_expired};

const CENTURY_SECS: i64 = 86400 * 365 * 100;

mod expiration_proofs {
    use super::*;

    /// Prove `check_expiration` never panics with valid timestamps.
    #[kani::proof]
    #[kani::unwind(2)]
    fn check_expiration_never_panics() {
        let exp_secs: i64 = kani::any();
        let now_secs: i64 = kani::any();

        kani::assume(exp_secs > -CENTURY_SECS && exp_secs < CENTURY_SECS);
        kani::assume(now_secs > -CENTURY_SECS && now_secs < CENTURY_SECS);

        if let (Some(exp), Some(now)) = (
            Utc.timestamp_opt(exp_secs, 0).single(),
            Utc.timestamp_opt(now_secs, 0).single(),
        ) {
            let _ = check_expiration(exp, now);
        }
    }

    /// Prove a token is expired at exactly its `exp` instant.
    #[kani::proof]
    #[kani::unwind(2)]
    fn exp_equal_to_now_is_expired() {
        let secs: i64 = kani::any();
        kani::assume(secs > 0 && secs < CENTURY_SECS);

        if let Some(instant) = Utc.timestamp_opt(secs, 0).single() {
            assert!(is_expired(instant, instant));
            assert!(check_expiration(instant, instant).is_err());
        }
    }

    /// Prove the `Result` form agrees with the predicate.
    #[kani::proof]
    #[kani::unwind(2)]
    fn check_expiration_matches_predicate() {
        let exp_secs: i64 = kani::any();
        let now_secs: i64 = kani::any();

        kani::assume(exp_secs > 0 && exp_secs < CENTURY_SECS);
        kani::assume(now_secs > 0 && now_secs < CENTURY_SECS);

        if let (Some(exp), Some(now)) = (
            Utc.timestamp_opt(exp_secs, 0).single(),
            Utc.timestamp_opt(now_secs, 0).single(),
        ) {
            assert_eq!(check_expiration(exp, now).is_err(), is_expired(exp, now));
            assert_eq!(is_expired(exp, now), now_secs >= exp_secs);
        }
    }
}

mod expectation_proofs {
    use super::*;

    /// Prove an absent expectation passes whatever the claim.
    #[kani::proof]
    #[kani::unwind(4)]
    fn absent_expectation_always_passes() {
        let has_claim: bool = kani::any();
        let claim = if has_claim { Some("abc") } else { None };

        assert!(check_action_hash(None, claim).is_ok());
        assert!(check_agent_id(None, claim).is_ok());
    }

    /// Prove equal values always pass.
    #[kani::proof]
    #[kani::unwind(4)]
    fn equal_values_pass() {
        let pick: bool = kani::any();
        let value = if pick { "agent-a" } else { "agent-b" };

        assert!(check_agent_id(Some(value), Some(value)).is_ok());
        assert!(check_action_hash(Some(value), Some(value)).is_ok());
    }
}

mod signing_proofs {
    use super::*;

    /// Prove the signing string always has five fields for newline-free inputs.
    #[kani::proof]
    #[kani::unwind(64)]
    fn signing_string_has_five_fields() {
        let use_empty: bool = kani::any();
        let nonce = if use_empty { "" } else { "n" };

        let s = build_signing_input("POST", "/p", "t", nonce, "h");
        assert_eq!(s.matches('\n').count(), 4);
    }
}

mod key_proofs {
    use super::*;

    /// Prove creating a signing key from any seed never panics.
    #[kani::proof]
    #[kani::unwind(33)]
    fn signing_key_from_bytes_no_panic() {
        let bytes: [u8; 32] = kani::any();
        let key = SigningKey::from_bytes(&bytes);
        assert_eq!(key.to_bytes(), bytes);
    }
}
