//! Proof token claims.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::TokenError;
use crate::verification::parse_instant;

/// Claims carried by a proof token.
///
/// Recognized claims are opaque strings. Only `exp` is interpreted, and
/// only by the verifier. Every other claim is kept in `extra`, as is a
/// recognized claim other than `exp` whose value is not a string.
///
/// # Example
///
/// ```
/// use agent_leash::ProofClaims;
///
/// let claims = ProofClaims::from_json(
///     r#"{"iss":"openleash","agent_id":"a1","decision_id":"d1"}"#,
/// )
/// .unwrap();
///
/// assert_eq!(claims.agent_id.as_deref(), Some("a1"));
/// assert_eq!(claims.extra["decision_id"], "d1");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Map<String, Value>")]
pub struct ProofClaims {
    /// Issuer
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iss: Option<String>,
    /// Identifier of the issuing key
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kid: Option<String>,
    /// Issue instant
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iat: Option<String>,
    /// Expiry instant
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exp: Option<String>,
    /// Agent the decision applies to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agent_id: Option<String>,
    /// Kind of action authorized
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action_type: Option<String>,
    /// Hash of the authorized action
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action_hash: Option<String>,
    /// Policy rule that produced the decision, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub matched_rule_id: Option<String>,
    /// Claims not listed above
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ProofClaims {
    /// Decodes claims from a JSON object.
    ///
    /// # Errors
    ///
    /// Returns `TokenError::InvalidClaims` if the payload is not a JSON
    /// object or `exp` is present but not a string.
    pub fn from_json(payload: &str) -> Result<Self, TokenError> {
        let object: Map<String, Value> =
            serde_json::from_str(payload).map_err(|e| TokenError::InvalidClaims {
                reason: format!("payload is not a JSON object: {e}"),
            })?;

        Self::try_from(object)
    }

    /// Returns the parsed expiry instant, or `None` if there is no `exp`.
    ///
    /// # Errors
    ///
    /// Returns `TokenError::InvalidExpiration` if `exp` is present but not
    /// an RFC 3339 instant.
    ///
    /// # Example
    ///
    /// ```
    /// use agent_leash::ProofClaims;
    ///
    /// let claims = ProofClaims::from_json(r#"{"exp":"2024-01-15T10:32:00.000Z"}"#).unwrap();
    /// assert!(claims.expires_at().unwrap().is_some());
    ///
    /// let claims = ProofClaims::from_json("{}").unwrap();
    /// assert!(claims.expires_at().unwrap().is_none());
    /// ```
    pub fn expires_at(&self) -> Result<Option<DateTime<Utc>>, TokenError> {
        self.exp.as_deref().map(parse_instant).transpose()
    }

    /// Returns an unrecognized claim by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.extra.get(name)
    }
}

impl TryFrom<Map<String, Value>> for ProofClaims {
    type Error = TokenError;

    fn try_from(mut object: Map<String, Value>) -> Result<Self, Self::Error> {
        let exp = match object.remove("exp") {
            None | Some(Value::Null) => None,
            Some(Value::String(exp)) => Some(exp),
            Some(other) => {
                return Err(TokenError::InvalidClaims {
                    reason: format!("exp must be a string, got {other}"),
                });
            }
        };
        let iss = take_string(&mut object, "iss");
        let kid = take_string(&mut object, "kid");
        let iat = take_string(&mut object, "iat");
        let agent_id = take_string(&mut object, "agent_id");
        let action_type = take_string(&mut object, "action_type");
        let action_hash = take_string(&mut object, "action_hash");
        let matched_rule_id = take_string(&mut object, "matched_rule_id");

        Ok(Self {
            iss,
            kid,
            iat,
            exp,
            agent_id,
            action_type,
            action_hash,
            matched_rule_id,
            extra: object,
        })
    }
}

/// Removes a string or null claim. Any other value stays in `object`.
fn take_string(object: &mut Map<String, Value>, name: &str) -> Option<String> {
    if !matches!(object.get(name), Some(Value::String(_) | Value::Null)) {
        return None;
    }
    match object.remove(name) {
        Some(Value::String(value)) => Some(value),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FULL_CLAIMS: &str = r#"{
        "iss": "openleash",
        "kid": "00000000-0000-0000-0000-000000000088",
        "iat": "2024-01-15T10:30:00.000Z",
        "exp": "2024-01-15T10:32:00.000Z",
        "decision_id": "00000000-0000-0000-0000-000000000077",
        "owner_principal_id": "00000000-0000-0000-0000-000000000001",
        "agent_id": "test-agent",
        "action_type": "purchase",
        "action_hash": "aaaa",
        "matched_rule_id": "test-rule"
    }"#;

    #[test]
    fn decodes_recognized_and_extra_claims() {
        let claims = ProofClaims::from_json(FULL_CLAIMS).unwrap();

        assert_eq!(claims.iss.as_deref(), Some("openleash"));
        assert_eq!(claims.action_type.as_deref(), Some("purchase"));
        assert_eq!(claims.matched_rule_id.as_deref(), Some("test-rule"));
        assert_eq!(claims.extra.len(), 2);
        assert!(claims.get("owner_principal_id").is_some());
    }

    #[test]
    fn null_matched_rule_is_absent() {
        let claims = ProofClaims::from_json(r#"{"matched_rule_id":null}"#).unwrap();

        assert_eq!(claims.matched_rule_id, None);
    }

    #[test]
    fn structured_extra_claims_are_kept() {
        let claims =
            ProofClaims::from_json(r#"{"constraints_snapshot":{"max_amount":100}}"#).unwrap();

        assert_eq!(claims.extra["constraints_snapshot"]["max_amount"], 100);
    }

    #[test]
    fn rejects_non_object_payloads() {
        for payload in ["[]", "\"claims\"", "42", "not json"] {
            assert!(matches!(
                ProofClaims::from_json(payload),
                Err(TokenError::InvalidClaims { .. })
            ));
        }
    }

    #[test]
    fn non_string_recognized_claims_move_to_extra() {
        let claims =
            ProofClaims::from_json(r#"{"agent_id":"a","iat":1705314600,"kid":7}"#).unwrap();

        assert_eq!(claims.agent_id.as_deref(), Some("a"));
        assert_eq!(claims.iat, None);
        assert_eq!(claims.kid, None);
        assert_eq!(claims.extra["iat"], 1_705_314_600);
        assert_eq!(claims.extra["kid"], 7);
    }

    #[test]
    fn deserialize_matches_from_json() {
        let claims: ProofClaims =
            serde_json::from_str(r#"{"iat":1705314600,"action_type":"purchase"}"#).unwrap();

        assert_eq!(claims.action_type.as_deref(), Some("purchase"));
        assert_eq!(claims.get("iat"), Some(&Value::from(1_705_314_600)));
    }

    #[test]
    fn rejects_numeric_exp() {
        let result = ProofClaims::from_json(r#"{"exp":1705314720}"#);

        assert!(matches!(result, Err(TokenError::InvalidClaims { .. })));
    }

    #[test]
    fn malformed_exp_surfaces_on_access() {
        let claims = ProofClaims::from_json(r#"{"exp":"not-a-timestamp"}"#).unwrap();

        assert!(matches!(
            claims.expires_at(),
            Err(TokenError::InvalidExpiration { .. })
        ));
    }

    #[test]
    fn serialization_keeps_extra_claims_flat() {
        let claims = ProofClaims::from_json(FULL_CLAIMS).unwrap();
        let value = serde_json::to_value(&claims).unwrap();

        assert_eq!(value["decision_id"], "00000000-0000-0000-0000-000000000077");
        assert_eq!(value["agent_id"], "test-agent");
        assert!(value.get("extra").is_none());
    }
}
