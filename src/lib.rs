//! Request signing and offline proof verification for AI agent authorization.
//!
//! An agent signs every outbound action request with its Ed25519 key, and
//! the authorization server answers with a decision plus, on approval, a
//! signed proof token. Anyone holding the server's public keys can check
//! that proof without a network round trip.
//!
//! # Overview
//!
//! - [`sign_request`] builds the canonical signing string and returns the
//!   `X-Timestamp`, `X-Nonce`, `X-Body-Sha256` and `X-Signature` headers.
//! - [`verify_proof`] tries a PASETO v4.public proof token against an
//!   ordered list of candidate keys, decodes its claims and enforces expiry.
//!
//! # Quick Start
//!
//! ```rust
//! use agent_leash::{sign_request, SigningKey};
//!
//! let signing_key = SigningKey::generate();
//! let body = br#"{"hello":"world"}"#;
//!
//! let headers = sign_request(
//!     "POST",
//!     "/v1/authorize",
//!     "2024-01-15T10:30:00.000Z",
//!     "test-nonce",
//!     body,
//!     &signing_key,
//! );
//!
//! assert_eq!(
//!     headers.body_sha256,
//!     "93a23971a914e5eacbf0a8d25154cda309c3c1c72fbb9914d47c60f3cb681588"
//! );
//! ```
//!
//! # Verifying Proofs
//!
//! ```rust
//! use agent_leash::{CandidateKey, ProofVerifier, SigningKey, VerificationResult};
//!
//! let server_key = SigningKey::generate().verifying_key();
//! let verifier = ProofVerifier::with_keys([
//!     CandidateKey::from_verifying_key("kid-1", &server_key).unwrap(),
//! ]);
//!
//! match verifier.verify("v4.public.not-a-real-token") {
//!     VerificationResult::Valid { claims } => println!("approved: {:?}", claims.action_type),
//!     VerificationResult::Invalid { reason, .. } => println!("rejected: {reason}"),
//! }
//! ```
//!
//! # Expiry Ownership
//!
//! | Layer | Checks |
//! |-------|--------|
//! | [`PublicToken`] | Header, framing, base64url, Ed25519 signature |
//! | [`verify_proof`] | Claims decoding, `exp` against the caller's clock |
//! | [`ProofExpectations`] | `action_hash`, `agent_id` |
//!
//! Rejections are values ([`VerificationResult::Invalid`]), never errors.

#![deny(missing_docs)]
#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

mod claims;
mod constants;
mod error;
mod keys;
pub mod prelude;
#[cfg(kani)]
mod proofs;
mod signing;
mod token;
mod verification;
mod verifier;

pub use claims::ProofClaims;
pub use constants::{
    HEADER_AGENT_ID, HEADER_BODY_SHA256, HEADER_NONCE, HEADER_SIGNATURE, HEADER_TIMESTAMP,
    MAX_TOKEN_LENGTH, SIGNATURE_LENGTH, SIGNING_FIELD_COUNT, SIGNING_FIELD_SEPARATOR,
    TIMESTAMP_FORMAT, TOKEN_HEADER,
};
pub use error::{KeyFormatError, TokenError, VerifyError};
pub use keys::{Keypair, SigningKey, VerifyingKey};
pub use signing::{
    SignatureHeaders, SigningInput, body_sha256, build_signing_input, new_nonce,
    request_timestamp, sign_challenge, sign_request, sign_request_b64, verify_request_signature,
};
pub use token::PublicToken;
pub use verification::{
    InvalidReason, check_action_hash, check_agent_id, check_expiration, is_expired, parse_instant,
};
pub use verifier::{
    CandidateKey, ProofExpectations, ProofVerifier, VerificationReport, VerificationResult,
    verify_proof, verify_proof_offline,
};
