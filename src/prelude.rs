//! Convenient re-exports for glob imports.
//!
//! ```rust
//! use agent_leash::prelude::*;
//!
//! let key = SigningKey::generate();
//! let verifier = ProofVerifier::new();
//! assert!(!verifier.verify("v4.public.AAAA").is_valid());
//! # let _ = key;
//! ```
//!
//! Constants and the pure check functions are left out; import them from
//! the crate root.

pub use crate::{
    // Keys
    CandidateKey, Keypair, SigningKey, VerifyingKey,
    // Signing
    SignatureHeaders, SigningInput, sign_request,
    // Verification
    InvalidReason, ProofClaims, ProofExpectations, ProofVerifier, PublicToken, VerificationResult,
    verify_proof, verify_proof_offline,
    // Errors
    KeyFormatError, TokenError, VerifyError,
};
