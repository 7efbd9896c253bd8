//! Error types for key handling and proof verification.

use std::fmt;

/// Errors raised when key material cannot be decoded.
///
/// These are caller bugs (a malformed private key handed to the signer) and
/// are propagated immediately.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyFormatError {
    /// The key text is not valid standard base64.
    InvalidBase64 {
        /// Description of the decoding error
        reason: String,
    },
    /// The bytes are not a DER PKCS#8 Ed25519 private key.
    InvalidPrivateKey {
        /// Description of the decoding error
        reason: String,
    },
    /// The bytes are not a DER SPKI Ed25519 public key.
    InvalidPublicKey {
        /// Description of the decoding error
        reason: String,
    },
}

impl fmt::Display for KeyFormatError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidBase64 { reason } => {
                write!(f, "key is not valid base64: {reason}")
            }
            Self::InvalidPrivateKey { reason } => {
                write!(
                    f,
                    "invalid Ed25519 private key; expected DER PKCS#8: {reason}"
                )
            }
            Self::InvalidPublicKey { reason } => {
                write!(
                    f,
                    "invalid Ed25519 public key; expected DER SubjectPublicKeyInfo: {reason}"
                )
            }
        }
    }
}

impl std::error::Error for KeyFormatError {}

/// Reasons a proof token could not be accepted under a given key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenError {
    /// Token exceeds the maximum accepted length.
    TooLong {
        /// Actual length in bytes
        length: usize,
        /// Maximum allowed length
        max: usize,
    },
    /// Token does not start with the `v4.public.` header.
    UnsupportedHeader,
    /// Token framing or encoding is broken.
    MalformedEnvelope {
        /// Description of the framing error
        reason: String,
    },
    /// Signature did not verify under the key.
    InvalidSignature,
    /// Payload is not a JSON claims object.
    InvalidClaims {
        /// Description of the parsing error
        reason: String,
    },
    /// The `exp` claim is present but not an RFC 3339 instant.
    InvalidExpiration {
        /// The raw claim value
        value: String,
    },
}

impl fmt::Display for TokenError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TooLong { length, max } => {
                write!(f, "token is {length} bytes; maximum is {max}")
            }
            Self::UnsupportedHeader => {
                write!(f, "token is not a v4.public PASETO token")
            }
            Self::MalformedEnvelope { reason } => {
                write!(f, "malformed token envelope: {reason}")
            }
            Self::InvalidSignature => {
                write!(
                    f,
                    "token signature verification failed; token may have been tampered with"
                )
            }
            Self::InvalidClaims { reason } => {
                write!(f, "failed to parse claims: {reason}")
            }
            Self::InvalidExpiration { value } => {
                write!(f, "exp claim '{value}' is not an RFC 3339 timestamp")
            }
        }
    }
}

impl std::error::Error for TokenError {}

/// Failure of a single candidate key during trial verification.
///
/// The trial loop treats every variant as "try the next key".
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerifyError {
    /// The candidate key could not be decoded.
    UnusableKey {
        /// Identifier of the candidate key
        kid: String,
        /// The decoding error
        source: KeyFormatError,
    },
    /// The token was rejected under this key.
    Token(TokenError),
}

impl fmt::Display for VerifyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnusableKey { kid, source } => {
                write!(f, "candidate key '{kid}' is unusable: {source}")
            }
            Self::Token(err) => err.fmt(f),
        }
    }
}

impl std::error::Error for VerifyError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::UnusableKey { source, .. } => Some(source),
            Self::Token(err) => Some(err),
        }
    }
}

impl From<TokenError> for VerifyError {
    fn from(err: TokenError) -> Self {
        Self::Token(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_format_error_mentions_expected_encoding() {
        let err = KeyFormatError::InvalidPrivateKey {
            reason: "bad tag".to_string(),
        };
        assert!(err.to_string().contains("PKCS#8"));
        assert!(err.to_string().contains("bad tag"));
    }

    #[test]
    fn verify_error_exposes_key_source() {
        use std::error::Error;

        let err = VerifyError::UnusableKey {
            kid: "k1".to_string(),
            source: KeyFormatError::InvalidBase64 {
                reason: "x".to_string(),
            },
        };
        assert!(err.to_string().contains("'k1'"));
        assert!(err.source().is_some());
    }

    #[test]
    fn token_error_converts_into_verify_error() {
        let err: VerifyError = TokenError::InvalidSignature.into();
        assert_eq!(err, VerifyError::Token(TokenError::InvalidSignature));
    }
}
