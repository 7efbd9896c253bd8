//! PASETO v4.public token envelope.
//!
//! Only structure and signature are checked here. No claim is interpreted:
//! expiry belongs to the verifier.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use rusty_paseto::prelude::*;

use crate::constants::{MAX_TOKEN_LENGTH, SIGNATURE_LENGTH, TOKEN_HEADER};
use crate::error::TokenError;
use crate::keys::VerifyingKey;

/// A structurally valid, not yet verified, v4.public token.
///
/// # Example
///
/// ```
/// use agent_leash::PublicToken;
///
/// assert!(PublicToken::parse("v2.public.AAAA").is_err());
/// assert!(PublicToken::parse("v4.public.").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublicToken<'a> {
    raw: &'a str,
    message: Vec<u8>,
    footer: Option<String>,
}

impl<'a> PublicToken<'a> {
    /// Parses the token envelope.
    ///
    /// # Errors
    ///
    /// Returns `TokenError::TooLong` for oversized input,
    /// `TokenError::UnsupportedHeader` for anything but `v4.public.`, and
    /// `TokenError::MalformedEnvelope` for bad framing or encoding.
    pub fn parse(raw: &'a str) -> Result<Self, TokenError> {
        if raw.len() > MAX_TOKEN_LENGTH {
            return Err(TokenError::TooLong {
                length: raw.len(),
                max: MAX_TOKEN_LENGTH,
            });
        }

        let rest = raw
            .strip_prefix(TOKEN_HEADER)
            .ok_or(TokenError::UnsupportedHeader)?;

        let mut parts = rest.split('.');
        let body = parts.next().unwrap_or_default();
        let footer = parts.next();
        if parts.next().is_some() {
            return Err(malformed("too many segments"));
        }

        let decoded = URL_SAFE_NO_PAD
            .decode(body)
            .map_err(|e| malformed(format!("payload is not base64url: {e}")))?;
        if decoded.len() < SIGNATURE_LENGTH {
            return Err(malformed(format!(
                "payload is {} bytes; a signature alone is {SIGNATURE_LENGTH}",
                decoded.len()
            )));
        }
        let message = decoded[..decoded.len() - SIGNATURE_LENGTH].to_vec();

        let footer = match footer {
            None => None,
            Some("") => return Err(malformed("empty footer segment")),
            Some(encoded) => {
                let bytes = URL_SAFE_NO_PAD
                    .decode(encoded)
                    .map_err(|e| malformed(format!("footer is not base64url: {e}")))?;
                Some(
                    String::from_utf8(bytes)
                        .map_err(|e| malformed(format!("footer is not UTF-8: {e}")))?,
                )
            }
        };

        Ok(Self {
            raw,
            message,
            footer,
        })
    }

    /// Returns the token text.
    #[must_use]
    pub const fn as_str(&self) -> &'a str {
        self.raw
    }

    /// Returns the unverified payload bytes.
    #[must_use]
    pub fn unverified_message(&self) -> &[u8] {
        &self.message
    }

    /// Returns the decoded footer, if present.
    #[must_use]
    pub fn footer(&self) -> Option<&str> {
        self.footer.as_deref()
    }

    /// Verifies the signature under `key` and returns the payload.
    ///
    /// # Errors
    ///
    /// Returns `TokenError::InvalidSignature` if the signature does not
    /// verify under `key`.
    pub fn verify(&self, key: &VerifyingKey) -> Result<String, TokenError> {
        let key_bytes = key.to_bytes();
        let key_wrapper = Key::<32>::from(&key_bytes);
        let paseto_key = PasetoAsymmetricPublicKey::<V4, Public>::from(&key_wrapper);

        let footer = self.footer.as_deref().map(Footer::from);

        Paseto::<V4, Public>::try_verify(self.raw, &paseto_key, footer, None::<ImplicitAssertion>)
            .map_err(|_| TokenError::InvalidSignature)
    }
}

fn malformed(reason: impl Into<String>) -> TokenError {
    TokenError::MalformedEnvelope {
        reason: reason.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn body_of(len: usize) -> String {
        URL_SAFE_NO_PAD.encode(vec![0u8; len])
    }

    #[test]
    fn rejects_other_versions() {
        let token = format!("v2.public.{}", body_of(80));

        assert_eq!(PublicToken::parse(&token), Err(TokenError::UnsupportedHeader));
    }

    #[test]
    fn rejects_local_purpose() {
        let token = format!("v4.local.{}", body_of(80));

        assert_eq!(PublicToken::parse(&token), Err(TokenError::UnsupportedHeader));
    }

    #[test]
    fn rejects_oversized_tokens() {
        let token = format!("v4.public.{}", "A".repeat(MAX_TOKEN_LENGTH));

        assert!(matches!(
            PublicToken::parse(&token),
            Err(TokenError::TooLong { .. })
        ));
    }

    #[test]
    fn rejects_short_body() {
        let token = format!("v4.public.{}", body_of(63));

        assert!(matches!(
            PublicToken::parse(&token),
            Err(TokenError::MalformedEnvelope { .. })
        ));
    }

    #[test]
    fn accepts_signature_only_body() {
        let token = format!("v4.public.{}", body_of(64));
        let parsed = PublicToken::parse(&token).unwrap();

        assert!(parsed.unverified_message().is_empty());
        assert_eq!(parsed.footer(), None);
    }

    #[test]
    fn rejects_padded_base64() {
        let token = format!("v4.public.{}=", body_of(65));

        assert!(matches!(
            PublicToken::parse(&token),
            Err(TokenError::MalformedEnvelope { .. })
        ));
    }

    #[test]
    fn rejects_extra_segments() {
        let token = format!("v4.public.{}.e30.e30", body_of(80));

        assert!(matches!(
            PublicToken::parse(&token),
            Err(TokenError::MalformedEnvelope { .. })
        ));
    }

    #[test]
    fn rejects_empty_footer_segment() {
        let token = format!("v4.public.{}.", body_of(80));

        assert!(matches!(
            PublicToken::parse(&token),
            Err(TokenError::MalformedEnvelope { .. })
        ));
    }

    #[test]
    fn decodes_footer() {
        let footer = URL_SAFE_NO_PAD.encode(r#"{"kid":"k1"}"#);
        let token = format!("v4.public.{}.{footer}", body_of(80));
        let parsed = PublicToken::parse(&token).unwrap();

        assert_eq!(parsed.footer(), Some(r#"{"kid":"k1"}"#));
        assert_eq!(parsed.unverified_message().len(), 16);
        assert_eq!(parsed.as_str(), token);
    }

    #[test]
    fn forged_signature_does_not_verify() {
        let token = format!("v4.public.{}", body_of(80));
        let parsed = PublicToken::parse(&token).unwrap();
        let key = crate::keys::SigningKey::generate().verifying_key();

        assert_eq!(parsed.verify(&key), Err(TokenError::InvalidSignature));
    }
}
