//! Key types for request signing and proof verification.
//!
//! Keys cross the wire as base64 DER: `SubjectPublicKeyInfo` for public keys
//! and PKCS#8 for private keys. Decoding is a typed step that fails with
//! [`KeyFormatError`] instead of assuming the bytes hold an Ed25519 key.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use ed25519_dalek::pkcs8::{DecodePrivateKey, DecodePublicKey, EncodePrivateKey, EncodePublicKey};
use ed25519_dalek::{
    Signature, Signer, SigningKey as DalekSigningKey, Verifier as _,
    VerifyingKey as DalekVerifyingKey,
};
use serde::{Deserialize, Serialize};

use crate::constants::SIGNATURE_LENGTH;
use crate::error::KeyFormatError;

/// An agent's Ed25519 private key.
///
/// # Example
///
/// ```
/// use agent_leash::SigningKey;
///
/// let signing_key = SigningKey::generate();
/// let encoded = signing_key.to_pkcs8_base64().unwrap();
///
/// let recovered = SigningKey::from_pkcs8_base64(&encoded).unwrap();
/// assert_eq!(signing_key.to_bytes(), recovered.to_bytes());
/// ```
#[derive(Clone)]
pub struct SigningKey {
    inner: DalekSigningKey,
}

impl SigningKey {
    /// Creates a new random signing key.
    #[must_use]
    pub fn generate() -> Self {
        let mut rng = rand::thread_rng();
        Self {
            inner: DalekSigningKey::generate(&mut rng),
        }
    }

    /// Creates a signing key from its 32-byte seed.
    #[must_use]
    pub fn from_bytes(bytes: &[u8; 32]) -> Self {
        Self {
            inner: DalekSigningKey::from_bytes(bytes),
        }
    }

    /// Decodes a DER PKCS#8 Ed25519 private key.
    ///
    /// # Errors
    ///
    /// Returns `KeyFormatError::InvalidPrivateKey` if the bytes are not a
    /// PKCS#8 document holding an Ed25519 key.
    pub fn from_pkcs8_der(der: &[u8]) -> Result<Self, KeyFormatError> {
        DalekSigningKey::from_pkcs8_der(der)
            .map(|inner| Self { inner })
            .map_err(|e| KeyFormatError::InvalidPrivateKey {
                reason: e.to_string(),
            })
    }

    /// Decodes a base64 DER PKCS#8 Ed25519 private key.
    ///
    /// # Errors
    ///
    /// Returns `KeyFormatError::InvalidBase64` for bad base64 and
    /// `KeyFormatError::InvalidPrivateKey` for bad DER.
    pub fn from_pkcs8_base64(encoded: &str) -> Result<Self, KeyFormatError> {
        Self::from_pkcs8_der(&decode_base64(encoded)?)
    }

    /// Encodes this key as base64 DER PKCS#8.
    ///
    /// # Errors
    ///
    /// Returns `KeyFormatError::InvalidPrivateKey` if DER encoding fails.
    pub fn to_pkcs8_base64(&self) -> Result<String, KeyFormatError> {
        let document =
            self.inner
                .to_pkcs8_der()
                .map_err(|e| KeyFormatError::InvalidPrivateKey {
                    reason: e.to_string(),
                })?;
        Ok(STANDARD.encode(document.as_bytes()))
    }

    /// Returns the 32-byte seed.
    #[must_use]
    pub fn to_bytes(&self) -> [u8; 32] {
        self.inner.to_bytes()
    }

    /// Returns the corresponding verifying (public) key.
    #[must_use]
    pub fn verifying_key(&self) -> VerifyingKey {
        VerifyingKey {
            inner: self.inner.verifying_key(),
        }
    }

    /// Signs a message, returning the raw 64-byte signature.
    #[must_use]
    pub fn sign(&self, message: &[u8]) -> [u8; SIGNATURE_LENGTH] {
        self.inner.sign(message).to_bytes()
    }
}

impl std::fmt::Debug for SigningKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SigningKey")
            .field("public_key", &self.verifying_key())
            .finish_non_exhaustive()
    }
}

/// An Ed25519 public key used to check request signatures and proof tokens.
///
/// # Example
///
/// ```
/// use agent_leash::{SigningKey, VerifyingKey};
///
/// let verifying_key = SigningKey::generate().verifying_key();
/// let encoded = verifying_key.to_public_key_base64().unwrap();
///
/// let recovered = VerifyingKey::from_public_key_base64(&encoded).unwrap();
/// assert_eq!(verifying_key, recovered);
/// ```
#[derive(Clone, PartialEq, Eq)]
pub struct VerifyingKey {
    inner: DalekVerifyingKey,
}

impl VerifyingKey {
    /// Creates a verifying key from raw bytes.
    ///
    /// # Errors
    ///
    /// Returns `KeyFormatError::InvalidPublicKey` if the bytes are not a
    /// valid Ed25519 curve point.
    pub fn from_bytes(bytes: &[u8; 32]) -> Result<Self, KeyFormatError> {
        DalekVerifyingKey::from_bytes(bytes)
            .map(|inner| Self { inner })
            .map_err(|e| KeyFormatError::InvalidPublicKey {
                reason: e.to_string(),
            })
    }

    /// Decodes a DER `SubjectPublicKeyInfo` Ed25519 public key.
    ///
    /// # Errors
    ///
    /// Returns `KeyFormatError::InvalidPublicKey` if the bytes are not an
    /// SPKI document holding an Ed25519 key.
    pub fn from_public_key_der(der: &[u8]) -> Result<Self, KeyFormatError> {
        DalekVerifyingKey::from_public_key_der(der)
            .map(|inner| Self { inner })
            .map_err(|e| KeyFormatError::InvalidPublicKey {
                reason: e.to_string(),
            })
    }

    /// Decodes a base64 DER `SubjectPublicKeyInfo` Ed25519 public key.
    ///
    /// # Errors
    ///
    /// Returns `KeyFormatError::InvalidBase64` for bad base64 and
    /// `KeyFormatError::InvalidPublicKey` for bad DER.
    pub fn from_public_key_base64(encoded: &str) -> Result<Self, KeyFormatError> {
        Self::from_public_key_der(&decode_base64(encoded)?)
    }

    /// Encodes this key as DER `SubjectPublicKeyInfo`.
    ///
    /// # Errors
    ///
    /// Returns `KeyFormatError::InvalidPublicKey` if DER encoding fails.
    pub fn to_public_key_der(&self) -> Result<Vec<u8>, KeyFormatError> {
        self.inner
            .to_public_key_der()
            .map(|document| document.as_bytes().to_vec())
            .map_err(|e| KeyFormatError::InvalidPublicKey {
                reason: e.to_string(),
            })
    }

    /// Encodes this key as base64 DER `SubjectPublicKeyInfo`.
    ///
    /// # Errors
    ///
    /// Returns `KeyFormatError::InvalidPublicKey` if DER encoding fails.
    pub fn to_public_key_base64(&self) -> Result<String, KeyFormatError> {
        Ok(STANDARD.encode(self.to_public_key_der()?))
    }

    /// Returns the raw key bytes.
    #[must_use]
    pub fn to_bytes(&self) -> [u8; 32] {
        self.inner.to_bytes()
    }

    /// Returns true if `signature` is a valid Ed25519 signature of `message`.
    ///
    /// Signatures of the wrong length are rejected rather than reported as errors.
    #[must_use]
    pub fn verify(&self, message: &[u8], signature: &[u8]) -> bool {
        Signature::from_slice(signature)
            .is_ok_and(|signature| self.inner.verify(message, &signature).is_ok())
    }
}

impl std::fmt::Debug for VerifyingKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Show first 4 bytes of public key for identification
        let bytes = self.to_bytes();
        write!(
            f,
            "VerifyingKey({:02x}{:02x}{:02x}{:02x}...)",
            bytes[0], bytes[1], bytes[2], bytes[3]
        )
    }
}

/// A freshly generated key pair in its wire encoding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Keypair {
    /// Base64 DER `SubjectPublicKeyInfo`
    pub public_key_b64: String,
    /// Base64 DER PKCS#8
    pub private_key_b64: String,
}

impl Keypair {
    /// Generates a new Ed25519 key pair.
    ///
    /// # Errors
    ///
    /// Returns `KeyFormatError` if DER encoding of the new key fails.
    ///
    /// # Example
    ///
    /// ```
    /// use agent_leash::{Keypair, SigningKey, VerifyingKey};
    ///
    /// let keypair = Keypair::generate().unwrap();
    /// let signing_key = SigningKey::from_pkcs8_base64(&keypair.private_key_b64).unwrap();
    /// let verifying_key = VerifyingKey::from_public_key_base64(&keypair.public_key_b64).unwrap();
    ///
    /// assert_eq!(signing_key.verifying_key(), verifying_key);
    /// ```
    pub fn generate() -> Result<Self, KeyFormatError> {
        Self::from_signing_key(&SigningKey::generate())
    }

    /// Encodes an existing signing key and its public half.
    ///
    /// # Errors
    ///
    /// Returns `KeyFormatError` if DER encoding fails.
    pub fn from_signing_key(signing_key: &SigningKey) -> Result<Self, KeyFormatError> {
        Ok(Self {
            public_key_b64: signing_key.verifying_key().to_public_key_base64()?,
            private_key_b64: signing_key.to_pkcs8_base64()?,
        })
    }
}

fn decode_base64(encoded: &str) -> Result<Vec<u8>, KeyFormatError> {
    STANDARD
        .decode(encoded.trim())
        .map_err(|e| KeyFormatError::InvalidBase64 {
            reason: e.to_string(),
        })
}
