//! Wire types for the authorization server API.

use agent_leash::{CandidateKey, KeyFormatError};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Body of `POST /v1/agents/registration-challenge`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChallengeRequest {
    /// Agent identifier chosen by the owner
    pub agent_id: String,
    /// Base64 DER SPKI public key of the agent
    pub agent_pubkey_b64: String,
    /// Owner the agent will belong to
    pub owner_principal_id: Option<String>,
}

/// A registration challenge issued by the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistrationChallenge {
    /// Challenge identifier to echo back on registration
    pub challenge_id: String,
    /// Base64 challenge bytes to sign
    pub challenge_b64: String,
    /// When the challenge stops being accepted
    pub expires_at: String,
}

/// Body of `POST /v1/agents/register`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisterAgentRequest {
    /// Challenge being answered
    pub challenge_id: String,
    /// Agent identifier
    pub agent_id: String,
    /// Base64 DER SPKI public key of the agent
    pub agent_pubkey_b64: String,
    /// Base64 signature over the raw challenge bytes
    pub signature_b64: String,
    /// Owner the agent belongs to
    pub owner_principal_id: String,
}

/// A registered agent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisteredAgent {
    /// Principal id assigned to the agent
    pub agent_principal_id: String,
    /// Agent identifier
    pub agent_id: String,
    /// Owning principal
    pub owner_principal_id: String,
    /// Lifecycle status, e.g. `ACTIVE`
    pub status: String,
    /// Creation instant
    pub created_at: String,
}

/// Outcome of an authorization request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Decision {
    /// The action may proceed.
    Allow,
    /// The action is refused.
    Deny,
    /// A human must approve first.
    RequireApproval,
    /// Stronger authentication is required first.
    RequireStepUp,
    /// A deposit is required first.
    RequireDeposit,
}

impl Decision {
    /// Returns true for `Allow`.
    #[must_use]
    pub const fn is_allowed(self) -> bool {
        matches!(self, Self::Allow)
    }
}

/// Response of `POST /v1/authorize`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthorizeResponse {
    /// Decision identifier
    pub decision_id: String,
    /// Action the decision applies to
    pub action_id: String,
    /// Hash of the canonical action
    pub action_hash: String,
    /// The decision
    pub result: Decision,
    /// Policy rule that produced the decision
    #[serde(default)]
    pub matched_rule_id: Option<String>,
    /// Human-readable explanation
    #[serde(default)]
    pub reason: String,
    /// Signed proof of the decision, if issued
    #[serde(default)]
    pub proof_token: Option<String>,
    /// Expiry of the proof token
    #[serde(default)]
    pub proof_expires_at: Option<String>,
    /// Outstanding obligations, passed through as JSON
    #[serde(default)]
    pub obligations: Vec<Value>,
}

/// Body of `POST /v1/verify-proof`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerifyProofRequest {
    /// Token to verify
    pub token: String,
    /// Required `action_hash` claim
    pub expected_action_hash: Option<String>,
    /// Required `agent_id` claim
    pub expected_agent_id: Option<String>,
}

/// A server signing key as published by `GET /v1/public-keys`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublishedKey {
    /// Key identifier
    pub kid: String,
    /// Key type, `OKP` for Ed25519
    #[serde(default)]
    pub kty: Option<String>,
    /// Signature algorithm, `EdDSA`
    #[serde(default)]
    pub alg: Option<String>,
    /// Base64 DER SPKI public key
    pub public_key_b64: String,
    /// Creation instant
    #[serde(default)]
    pub created_at: Option<String>,
    /// Revocation instant; revoked keys are not trusted
    #[serde(default)]
    pub revoked_at: Option<String>,
}

impl PublishedKey {
    /// Returns true if the key has been revoked.
    #[must_use]
    pub fn is_revoked(&self) -> bool {
        self.revoked_at.is_some()
    }

    /// Converts the published key into a verification candidate.
    ///
    /// # Errors
    ///
    /// Returns `KeyFormatError::InvalidBase64` if the key text is not base64.
    pub fn to_candidate(&self) -> Result<CandidateKey, KeyFormatError> {
        CandidateKey::from_base64(self.kid.clone(), &self.public_key_b64)
    }
}

/// Response of `GET /v1/public-keys`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicKeySet {
    /// Published keys
    pub keys: Vec<PublishedKey>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decision_uses_screaming_case() {
        let decision: Decision = serde_json::from_str(r#""REQUIRE_STEP_UP""#).unwrap();
        assert_eq!(decision, Decision::RequireStepUp);
        assert_eq!(
            serde_json::to_string(&Decision::RequireApproval).unwrap(),
            r#""REQUIRE_APPROVAL""#
        );
    }

    #[test]
    fn authorize_response_tolerates_null_proof() {
        let response: AuthorizeResponse = serde_json::from_str(
            r#"{
                "decision_id": "d1",
                "action_id": "a1",
                "action_hash": "h",
                "result": "DENY",
                "matched_rule_id": null,
                "reason": "no rule",
                "proof_token": null,
                "proof_expires_at": null,
                "obligations": []
            }"#,
        )
        .unwrap();

        assert!(!response.result.is_allowed());
        assert!(response.proof_token.is_none());
    }

    #[test]
    fn published_key_revocation() {
        let key: PublishedKey = serde_json::from_str(
            r#"{"kid":"k1","kty":"OKP","alg":"EdDSA","public_key_b64":"AAAA","created_at":"2024-01-01T00:00:00Z","revoked_at":"2024-02-01T00:00:00Z"}"#,
        )
        .unwrap();

        assert!(key.is_revoked());
        assert_eq!(key.to_candidate().unwrap().public_key_der, vec![0, 0, 0]);
    }
}
