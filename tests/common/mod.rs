//! Shared fixtures and token minting for integration tests.

#![allow(dead_code)]

use agent_leash::{CandidateKey, SigningKey};
use rusty_paseto::prelude::*;
use serde::Deserialize;

/// Cross-language test vectors shared with the other SDKs.
#[derive(Debug, Deserialize)]
pub struct Vectors {
    pub action: serde_json::Value,
    pub body: String,
    pub body_sha256: String,
    pub public_key_b64: String,
    pub private_key_b64: String,
    pub public_key_hex: String,
    pub secondary_public_key_b64: String,
    pub secondary_private_key_b64: String,
    pub signing_input: String,
    pub signature_b64: String,
    pub hello_body_sha256: String,
    pub hello_signature_b64: String,
    pub paseto_claims: serde_json::Value,
    pub paseto_token: String,
    pub paseto_token_unexpired: String,
    pub paseto_token_no_exp: String,
    pub paseto_token_malformed_exp: String,
    pub paseto_token_with_footer: String,
    pub paseto_token_secondary_key: String,
}

pub const SIGNING_NONCE: &str = "00000000-0000-0000-0000-000000000099";
pub const SIGNING_TIMESTAMP: &str = "2024-01-15T10:30:00.000Z";
pub const PROOF_KID: &str = "00000000-0000-0000-0000-000000000088";

pub fn vectors() -> Vectors {
    serde_json::from_str(include_str!("../fixtures/testvectors.json")).unwrap()
}

pub fn primary_key() -> CandidateKey {
    CandidateKey::from_base64(PROOF_KID, &vectors().public_key_b64).unwrap()
}

pub fn secondary_key() -> CandidateKey {
    CandidateKey::from_base64("secondary", &vectors().secondary_public_key_b64).unwrap()
}

pub fn candidate_for(kid: &str, signing_key: &SigningKey) -> CandidateKey {
    CandidateKey::from_verifying_key(kid, &signing_key.verifying_key()).unwrap()
}

/// Signs `payload` verbatim as a v4.public token.
pub fn mint(signing_key: &SigningKey, payload: &str) -> String {
    mint_with_footer(signing_key, payload, None)
}

/// Signs `payload` verbatim as a v4.public token with an optional footer.
pub fn mint_with_footer(signing_key: &SigningKey, payload: &str, footer: Option<&str>) -> String {
    let keypair_bytes =
        ed25519_dalek::SigningKey::from_bytes(&signing_key.to_bytes()).to_keypair_bytes();
    let key_wrapper = Key::<64>::from(&keypair_bytes);
    let paseto_key = PasetoAsymmetricPrivateKey::<V4, Public>::from(&key_wrapper);

    let mut paseto = Paseto::<V4, Public>::default();
    paseto.set_payload(Payload::from(payload));
    if let Some(footer) = footer {
        paseto.set_footer(Footer::from(footer));
    }
    paseto.try_sign(&paseto_key).unwrap()
}

/// Flips one character inside the base64url body of a token.
pub fn tamper(token: &str, offset: usize) -> String {
    let mut bytes = token.as_bytes().to_vec();
    let index = "v4.public.".len() + offset;
    bytes[index] = if bytes[index] == b'A' { b'B' } else { b'A' };
    String::from_utf8(bytes).unwrap()
}
