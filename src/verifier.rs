//! Offline proof token verification.
//!
//! The verifier tries each candidate key in order and stops at the first
//! key under which the token verifies. The token's own `kid` claim is never
//! used to pick a key.
//!
//! Verification is split in two layers. The envelope codec
//! ([`PublicToken`]) checks structure and signature only. This module owns
//! every claim policy: expiry and the optional expectations.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::claims::ProofClaims;
use crate::error::{KeyFormatError, TokenError, VerifyError};
use crate::keys::VerifyingKey;
use crate::token::PublicToken;
use crate::verification::{InvalidReason, check_action_hash, check_agent_id, check_expiration};

/// A public key the verifier may try.
///
/// Holds DER `SubjectPublicKeyInfo` bytes. The bytes are only decoded when
/// the key is tried, so a broken entry is skipped rather than failing the
/// whole key set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "CandidateKeyRecord", into = "CandidateKeyRecord")]
pub struct CandidateKey {
    /// Key identifier
    pub kid: String,
    /// DER `SubjectPublicKeyInfo` bytes
    pub public_key_der: Vec<u8>,
}

impl CandidateKey {
    /// Creates a candidate from DER bytes.
    #[must_use]
    pub fn new(kid: impl Into<String>, public_key_der: Vec<u8>) -> Self {
        Self {
            kid: kid.into(),
            public_key_der,
        }
    }

    /// Creates a candidate from base64 DER, as published by the server.
    ///
    /// # Errors
    ///
    /// Returns `KeyFormatError::InvalidBase64` if `public_key_b64` is not
    /// standard base64. The DER itself is not checked here.
    pub fn from_base64(
        kid: impl Into<String>,
        public_key_b64: &str,
    ) -> Result<Self, KeyFormatError> {
        let der = STANDARD
            .decode(public_key_b64.trim())
            .map_err(|e| KeyFormatError::InvalidBase64 {
                reason: e.to_string(),
            })?;
        Ok(Self::new(kid, der))
    }

    /// Creates a candidate from an already decoded key.
    ///
    /// # Errors
    ///
    /// Returns `KeyFormatError` if DER encoding fails.
    pub fn from_verifying_key(
        kid: impl Into<String>,
        key: &VerifyingKey,
    ) -> Result<Self, KeyFormatError> {
        Ok(Self::new(kid, key.to_public_key_der()?))
    }

    /// Decodes the DER bytes into a usable key.
    ///
    /// # Errors
    ///
    /// Returns `KeyFormatError::InvalidPublicKey` if the bytes are not an
    /// Ed25519 SPKI document.
    pub fn decode(&self) -> Result<VerifyingKey, KeyFormatError> {
        VerifyingKey::from_public_key_der(&self.public_key_der)
    }
}

#[derive(Serialize, Deserialize)]
struct CandidateKeyRecord {
    kid: String,
    public_key_b64: String,
}

impl TryFrom<CandidateKeyRecord> for CandidateKey {
    type Error = KeyFormatError;

    fn try_from(record: CandidateKeyRecord) -> Result<Self, Self::Error> {
        Self::from_base64(record.kid, &record.public_key_b64)
    }
}

impl From<CandidateKey> for CandidateKeyRecord {
    fn from(key: CandidateKey) -> Self {
        Self {
            kid: key.kid,
            public_key_b64: STANDARD.encode(key.public_key_der),
        }
    }
}

/// Outcome of verifying a proof token.
///
/// Rejection is a value, never an error. Claims are present on an
/// `Invalid` outcome when the signature verified but a later check failed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "VerificationReport", into = "VerificationReport")]
pub enum VerificationResult {
    /// The token verified and passed every check.
    Valid {
        /// Decoded claims
        claims: ProofClaims,
    },
    /// The token was rejected.
    Invalid {
        /// Why the token was rejected
        reason: InvalidReason,
        /// Decoded claims, if the signature verified
        claims: Option<ProofClaims>,
    },
}

impl VerificationResult {
    /// Returns true for `Valid`.
    #[must_use]
    pub const fn is_valid(&self) -> bool {
        matches!(self, Self::Valid { .. })
    }

    /// Returns the decoded claims, if any.
    #[must_use]
    pub const fn claims(&self) -> Option<&ProofClaims> {
        match self {
            Self::Valid { claims } => Some(claims),
            Self::Invalid { claims, .. } => claims.as_ref(),
        }
    }

    /// Returns the rejection reason, if any.
    #[must_use]
    pub const fn reason(&self) -> Option<&InvalidReason> {
        match self {
            Self::Valid { .. } => None,
            Self::Invalid { reason, .. } => Some(reason),
        }
    }

    /// Applies claim expectations to a `Valid` outcome.
    ///
    /// When both `agent_id` and `action_hash` mismatch, the `agent_id`
    /// mismatch is reported. `Invalid` outcomes pass through unchanged.
    #[must_use]
    pub fn expect(self, expectations: &ProofExpectations) -> Self {
        let Self::Valid { claims } = self else {
            return self;
        };

        let checked = check_agent_id(expectations.agent_id.as_deref(), claims.agent_id.as_deref())
            .and_then(|()| {
                check_action_hash(
                    expectations.action_hash.as_deref(),
                    claims.action_hash.as_deref(),
                )
            });

        match checked {
            Ok(()) => Self::Valid { claims },
            Err(reason) => {
                tracing::debug!(%reason, "proof token failed expectations");
                Self::Invalid {
                    reason,
                    claims: Some(claims),
                }
            }
        }
    }

    fn no_matching_key() -> Self {
        Self::Invalid {
            reason: InvalidReason::NoMatchingKey,
            claims: None,
        }
    }
}

/// Wire form of a [`VerificationResult`]: `{valid, reason?, claims?}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerificationReport {
    /// Whether the token was accepted
    pub valid: bool,
    /// Rejection reason
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    /// Decoded claims
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub claims: Option<ProofClaims>,
}

impl From<VerificationResult> for VerificationReport {
    fn from(result: VerificationResult) -> Self {
        match result {
            VerificationResult::Valid { claims } => Self {
                valid: true,
                reason: None,
                claims: Some(claims),
            },
            VerificationResult::Invalid { reason, claims } => Self {
                valid: false,
                reason: Some(reason.into()),
                claims,
            },
        }
    }
}

impl From<VerificationReport> for VerificationResult {
    fn from(report: VerificationReport) -> Self {
        if report.valid {
            Self::Valid {
                claims: report.claims.unwrap_or_default(),
            }
        } else {
            Self::Invalid {
                reason: report
                    .reason
                    .map_or_else(|| InvalidReason::Other(String::new()), InvalidReason::from),
                claims: report.claims,
            }
        }
    }
}

/// Optional claim values a caller requires of a valid token.
///
/// # Example
///
/// ```
/// use agent_leash::ProofExpectations;
///
/// let expectations = ProofExpectations::new()
///     .with_action_hash("a9f0...")
///     .with_agent_id("agent-1");
///
/// assert_eq!(expectations.agent_id.as_deref(), Some("agent-1"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProofExpectations {
    /// Required `action_hash` claim
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action_hash: Option<String>,
    /// Required `agent_id` claim
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agent_id: Option<String>,
}

impl ProofExpectations {
    /// Creates empty expectations.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Requires an `action_hash` claim.
    #[must_use]
    pub fn with_action_hash(mut self, action_hash: impl Into<String>) -> Self {
        self.action_hash = Some(action_hash.into());
        self
    }

    /// Requires an `agent_id` claim.
    #[must_use]
    pub fn with_agent_id(mut self, agent_id: impl Into<String>) -> Self {
        self.agent_id = Some(agent_id.into());
        self
    }

    /// Returns true if nothing is required.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.action_hash.is_none() && self.agent_id.is_none()
    }
}

/// Verifies a proof token against candidate keys at `now`.
///
/// Keys are tried in order. A key that cannot be decoded, or under which
/// the token fails to verify or decode, is skipped. The first key that
/// verifies decides the outcome:
///
/// - `exp` present and `now >= exp`: `Invalid` with reason "Token expired"
///   and the claims
/// - otherwise: `Valid` with the claims
///
/// If no key verifies, the outcome is `Invalid` with reason
/// "No matching key found or invalid signature" and no claims. A token
/// longer than [`MAX_TOKEN_LENGTH`](crate::MAX_TOKEN_LENGTH) is rejected
/// up front with "Token too long".
///
/// # Example
///
/// ```
/// use agent_leash::{verify_proof, InvalidReason};
/// use chrono::Utc;
///
/// let result = verify_proof("v4.public.AAAA", &[], Utc::now());
/// assert_eq!(result.reason(), Some(&InvalidReason::NoMatchingKey));
/// ```
#[must_use]
pub fn verify_proof(token: &str, keys: &[CandidateKey], now: DateTime<Utc>) -> VerificationResult {
    let envelope = match PublicToken::parse(token) {
        Ok(envelope) => envelope,
        Err(err @ TokenError::TooLong { .. }) => {
            tracing::debug!(error = %err, "rejected proof token envelope");
            return VerificationResult::Invalid {
                reason: InvalidReason::TooLong,
                claims: None,
            };
        }
        Err(err) => {
            tracing::debug!(error = %err, "rejected proof token envelope");
            return VerificationResult::no_matching_key();
        }
    };

    for key in keys {
        match try_key(&envelope, key) {
            Ok((claims, expires_at)) => {
                return match expires_at.and_then(|exp| check_expiration(exp, now).err()) {
                    Some(reason) => {
                        tracing::debug!(kid = %key.kid, "proof token expired");
                        VerificationResult::Invalid {
                            reason,
                            claims: Some(claims),
                        }
                    }
                    None => VerificationResult::Valid { claims },
                };
            }
            Err(err) => {
                tracing::debug!(kid = %key.kid, error = %err, "candidate key skipped");
            }
        }
    }

    VerificationResult::no_matching_key()
}

/// Verifies a proof token against candidate keys at the current time.
///
/// Reads the clock exactly once.
#[must_use]
pub fn verify_proof_offline(token: &str, keys: &[CandidateKey]) -> VerificationResult {
    verify_proof(token, keys, Utc::now())
}

/// One trial of the key loop.
fn try_key(
    envelope: &PublicToken<'_>,
    key: &CandidateKey,
) -> Result<(ProofClaims, Option<DateTime<Utc>>), VerifyError> {
    let verifying_key = key.decode().map_err(|source| VerifyError::UnusableKey {
        kid: key.kid.clone(),
        source,
    })?;
    let payload = envelope.verify(&verifying_key)?;
    let claims = ProofClaims::from_json(&payload)?;
    let expires_at = claims.expires_at()?;
    Ok((claims, expires_at))
}

/// An ordered set of candidate keys.
///
/// # Example
///
/// ```
/// use agent_leash::{CandidateKey, ProofVerifier, SigningKey};
///
/// let signing_key = SigningKey::generate();
/// let mut verifier = ProofVerifier::new();
/// verifier.add_key(CandidateKey::from_verifying_key("k1", &signing_key.verifying_key()).unwrap());
///
/// assert_eq!(verifier.key_count(), 1);
/// assert!(!verifier.verify("v4.public.AAAA").is_valid());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProofVerifier {
    keys: Vec<CandidateKey>,
}

impl ProofVerifier {
    /// Creates a verifier with no keys.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a verifier from keys in trial order.
    #[must_use]
    pub fn with_keys(keys: impl IntoIterator<Item = CandidateKey>) -> Self {
        Self {
            keys: keys.into_iter().collect(),
        }
    }

    /// Appends a key to the end of the trial order.
    pub fn add_key(&mut self, key: CandidateKey) {
        self.keys.push(key);
    }

    /// Returns the keys in trial order.
    #[must_use]
    pub fn keys(&self) -> &[CandidateKey] {
        &self.keys
    }

    /// Returns the number of keys.
    #[must_use]
    pub fn key_count(&self) -> usize {
        self.keys.len()
    }

    /// Verifies a token at the current time.
    #[must_use]
    pub fn verify(&self, token: &str) -> VerificationResult {
        verify_proof_offline(token, &self.keys)
    }

    /// Verifies a token at `now`.
    #[must_use]
    pub fn verify_at(&self, token: &str, now: DateTime<Utc>) -> VerificationResult {
        verify_proof(token, &self.keys, now)
    }

    /// Verifies a token at the current time and applies expectations.
    #[must_use]
    pub fn verify_expecting(
        &self,
        token: &str,
        expectations: &ProofExpectations,
    ) -> VerificationResult {
        self.verify(token).expect(expectations)
    }

    /// Verifies a token at `now` and applies expectations.
    #[must_use]
    pub fn verify_expecting_at(
        &self,
        token: &str,
        expectations: &ProofExpectations,
        now: DateTime<Utc>,
    ) -> VerificationResult {
        self.verify_at(token, now).expect(expectations)
    }
}
