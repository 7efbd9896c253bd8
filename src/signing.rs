//! Ed25519 request signing.
//!
//! A signed request carries four headers. The signature covers a canonical
//! signing string of exactly five newline-joined fields:
//!
//! ```text
//! METHOD\nPATH\nTIMESTAMP\nNONCE\nBODY_SHA256_HEX
//! ```
//!
//! The signer performs no normalization: the method, path, timestamp and
//! nonce are signed verbatim, and the body digest is taken over the exact
//! bytes that go on the wire.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::constants::{
    HEADER_BODY_SHA256, HEADER_NONCE, HEADER_SIGNATURE, HEADER_TIMESTAMP, SIGNING_FIELD_SEPARATOR,
    TIMESTAMP_FORMAT,
};
use crate::error::KeyFormatError;
use crate::keys::{SigningKey, VerifyingKey};

/// Returns the lowercase hex SHA-256 digest of `body`.
///
/// # Example
///
/// ```
/// use agent_leash::body_sha256;
///
/// assert_eq!(
///     body_sha256(b""),
///     "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
/// );
/// ```
#[must_use]
pub fn body_sha256(body: &[u8]) -> String {
    hex::encode(Sha256::digest(body))
}

/// Joins the five signing fields with single newlines.
#[must_use]
pub fn build_signing_input(
    method: &str,
    path: &str,
    timestamp: &str,
    nonce: &str,
    body_sha256: &str,
) -> String {
    let mut out = String::with_capacity(
        method.len() + path.len() + timestamp.len() + nonce.len() + body_sha256.len() + 4,
    );
    for (i, field) in [method, path, timestamp, nonce, body_sha256]
        .into_iter()
        .enumerate()
    {
        if i > 0 {
            out.push(SIGNING_FIELD_SEPARATOR);
        }
        out.push_str(field);
    }
    out
}

/// The fields covered by a request signature.
///
/// # Example
///
/// ```
/// use agent_leash::SigningInput;
///
/// let input = SigningInput::new(
///     "POST",
///     "/v1/authorize",
///     "2024-01-15T10:30:00.000Z",
///     "test-nonce",
///     br#"{"hello":"world"}"#,
/// );
///
/// assert!(input.to_signing_string().starts_with("POST\n/v1/authorize\n"));
/// assert_eq!(input.to_signing_string().split('\n').count(), 5);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SigningInput<'a> {
    /// Uppercase HTTP verb
    pub method: &'a str,
    /// Request path exactly as the server will see it
    pub path: &'a str,
    /// Caller-supplied timestamp
    pub timestamp: &'a str,
    /// Caller-supplied nonce
    pub nonce: &'a str,
    /// Lowercase hex SHA-256 of the body bytes
    pub body_sha256: String,
}

impl<'a> SigningInput<'a> {
    /// Builds the signing input, hashing `body`.
    #[must_use]
    pub fn new(
        method: &'a str,
        path: &'a str,
        timestamp: &'a str,
        nonce: &'a str,
        body: &[u8],
    ) -> Self {
        Self {
            method,
            path,
            timestamp,
            nonce,
            body_sha256: body_sha256(body),
        }
    }

    /// Returns the canonical signing string.
    #[must_use]
    pub fn to_signing_string(&self) -> String {
        build_signing_input(
            self.method,
            self.path,
            self.timestamp,
            self.nonce,
            &self.body_sha256,
        )
    }

    /// Signs this input.
    #[must_use]
    pub fn sign(&self, signing_key: &SigningKey) -> SignatureHeaders {
        let signature = signing_key.sign(self.to_signing_string().as_bytes());
        tracing::trace!(method = self.method, path = self.path, "signed request");

        SignatureHeaders {
            timestamp: self.timestamp.to_string(),
            nonce: self.nonce.to_string(),
            body_sha256: self.body_sha256.clone(),
            signature_b64: STANDARD.encode(signature),
        }
    }
}

/// Headers produced by signing a request.
///
/// Serializes with the transport header names, so the struct can be
/// emitted directly as a header map.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignatureHeaders {
    /// Value of `X-Timestamp`
    #[serde(rename = "X-Timestamp")]
    pub timestamp: String,
    /// Value of `X-Nonce`
    #[serde(rename = "X-Nonce")]
    pub nonce: String,
    /// Value of `X-Body-Sha256`
    #[serde(rename = "X-Body-Sha256")]
    pub body_sha256: String,
    /// Value of `X-Signature`
    #[serde(rename = "X-Signature")]
    pub signature_b64: String,
}

impl SignatureHeaders {
    /// Returns `(header name, value)` pairs in a fixed order.
    #[must_use]
    pub fn pairs(&self) -> [(&'static str, &str); 4] {
        [
            (HEADER_TIMESTAMP, self.timestamp.as_str()),
            (HEADER_NONCE, self.nonce.as_str()),
            (HEADER_BODY_SHA256, self.body_sha256.as_str()),
            (HEADER_SIGNATURE, self.signature_b64.as_str()),
        ]
    }
}

/// Signs an HTTP request.
///
/// Pure and deterministic: the same inputs and key always produce the same
/// headers.
///
/// # Example
///
/// ```
/// use agent_leash::{sign_request, SigningKey};
///
/// let key = SigningKey::generate();
/// let headers = sign_request(
///     "POST",
///     "/v1/authorize",
///     "2024-01-15T10:30:00.000Z",
///     "test-nonce",
///     br#"{"hello":"world"}"#,
///     &key,
/// );
///
/// assert_eq!(headers.nonce, "test-nonce");
/// assert_eq!(headers.body_sha256.len(), 64);
/// ```
#[must_use]
pub fn sign_request(
    method: &str,
    path: &str,
    timestamp: &str,
    nonce: &str,
    body: &[u8],
    signing_key: &SigningKey,
) -> SignatureHeaders {
    SigningInput::new(method, path, timestamp, nonce, body).sign(signing_key)
}

/// Signs an HTTP request with a base64 DER PKCS#8 private key.
///
/// # Errors
///
/// Returns `KeyFormatError` if `private_key_b64` is not a valid Ed25519
/// private key encoding.
pub fn sign_request_b64(
    method: &str,
    path: &str,
    timestamp: &str,
    nonce: &str,
    body: &[u8],
    private_key_b64: &str,
) -> Result<SignatureHeaders, KeyFormatError> {
    let signing_key = SigningKey::from_pkcs8_base64(private_key_b64)?;
    Ok(sign_request(method, path, timestamp, nonce, body, &signing_key))
}

/// Checks a request signature the way the authorization server does.
///
/// Any decoding failure counts as an invalid signature.
#[must_use]
pub fn verify_request_signature(
    method: &str,
    path: &str,
    timestamp: &str,
    nonce: &str,
    body_sha256: &str,
    signature_b64: &str,
    verifying_key: &VerifyingKey,
) -> bool {
    let Ok(signature) = STANDARD.decode(signature_b64) else {
        return false;
    };
    let signing_input = build_signing_input(method, path, timestamp, nonce, body_sha256);
    verifying_key.verify(signing_input.as_bytes(), &signature)
}

/// Signs raw registration-challenge bytes, returning base64.
#[must_use]
pub fn sign_challenge(signing_key: &SigningKey, challenge: &[u8]) -> String {
    STANDARD.encode(signing_key.sign(challenge))
}

/// Formats `now` as a request timestamp, e.g. `2024-01-15T10:30:00.000Z`.
#[must_use]
pub fn request_timestamp(now: DateTime<Utc>) -> String {
    now.format(TIMESTAMP_FORMAT).to_string()
}

/// Returns a fresh random nonce (UUID v4).
#[must_use]
pub fn new_nonce() -> String {
    uuid::Uuid::new_v4().to_string()
}
