//! Client tests against a mocked authorization server.

use agent_leash::{
    InvalidReason, ProofExpectations, SigningKey, VerifyingKey, verify_request_signature,
};
use agent_leash_client::{ClientConfig, ClientError, Decision, LeashClient};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use mockito::{Matcher, Server};
use serde_json::json;

const ZERO_SEED_SPKI_B64: &str = "MCowBQYDK2VwAyEAO2onvM62pC1io6jQKm8Nc2UyFXcd4kOmOsBIoYtZ2ik=";
const SECONDARY_SPKI_B64: &str = "MCowBQYDK2VwAyEAiojj3XQJ8ZX9UtstPLpdcspnCb8dlBIb83SIAbQPb1w=";

fn client_for(server: &Server) -> LeashClient {
    LeashClient::new(ClientConfig::new().with_base_url(server.url())).unwrap()
}

fn header(request: &mockito::Request, name: &str) -> String {
    request
        .header(name)
        .first()
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default()
        .to_string()
}

fn allow_response() -> serde_json::Value {
    json!({
        "decision_id": "00000000-0000-0000-0000-000000000077",
        "action_id": "00000000-0000-0000-0000-000000000001",
        "action_hash": "a".repeat(64),
        "result": "ALLOW",
        "matched_rule_id": "test-rule",
        "reason": "matched rule",
        "proof_token": "v4.public.token",
        "proof_expires_at": "2024-01-15T10:32:00.000Z",
        "obligations": []
    })
}

#[tokio::test]
async fn authorize_signs_exactly_the_bytes_sent() {
    let mut server = Server::new_async().await;
    let signing_key = SigningKey::from_bytes(&[0u8; 32]);
    let verifying_key = signing_key.verifying_key();

    let mock = server
        .mock("POST", "/v1/authorize")
        .match_header("x-agent-id", "test-agent")
        .match_header("content-type", "application/json")
        .match_header("x-nonce", Matcher::Regex("^[0-9a-f-]{36}$".to_string()))
        .match_header(
            "x-timestamp",
            Matcher::Regex(r"^\d{4}-\d{2}-\d{2}T\d{2}:\d{2}:\d{2}\.\d{3}Z$".to_string()),
        )
        .match_request(move |request| {
            let Ok(body) = request.body() else {
                return false;
            };
            let digest = agent_leash::body_sha256(body);
            header(request, "x-body-sha256") == digest
                && verify_request_signature(
                    "POST",
                    "/v1/authorize",
                    &header(request, "x-timestamp"),
                    &header(request, "x-nonce"),
                    &digest,
                    &header(request, "x-signature"),
                    &verifying_key,
                )
        })
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(allow_response().to_string())
        .create_async()
        .await;

    let action = json!({"action_type": "purchase", "payload": {"amount_minor": 5000}});
    let response = client_for(&server)
        .authorize("test-agent", &signing_key, &action)
        .await
        .unwrap();

    mock.assert_async().await;
    assert_eq!(response.result, Decision::Allow);
    assert_eq!(response.proof_token.as_deref(), Some("v4.public.token"));
}

#[tokio::test]
async fn authorize_error_status_is_reported() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/v1/authorize")
        .with_status(401)
        .with_body(r#"{"error":{"code":"INVALID_SIGNATURE"}}"#)
        .create_async()
        .await;

    let result = client_for(&server)
        .authorize("test-agent", &SigningKey::generate(), &json!({}))
        .await;

    mock.assert_async().await;
    match result {
        Err(ClientError::Status { status, body }) => {
            assert_eq!(status, 401);
            assert!(body.contains("INVALID_SIGNATURE"));
        }
        other => panic!("expected status error, got {other:?}"),
    }
}

#[tokio::test]
async fn register_signs_decoded_challenge() {
    let mut server = Server::new_async().await;
    let signing_key = SigningKey::generate();
    let agent_pubkey_b64 = signing_key.verifying_key().to_public_key_base64().unwrap();
    let challenge = [7u8; 32];

    let challenge_mock = server
        .mock("POST", "/v1/agents/registration-challenge")
        .match_body(Matcher::Json(json!({
            "agent_id": "test-agent",
            "agent_pubkey_b64": agent_pubkey_b64,
            "owner_principal_id": "owner-1"
        })))
        .with_status(200)
        .with_body(
            json!({
                "challenge_id": "c1",
                "challenge_b64": STANDARD.encode(challenge),
                "expires_at": "2024-01-15T10:35:00.000Z"
            })
            .to_string(),
        )
        .create_async()
        .await;

    let register_mock = server
        .mock("POST", "/v1/agents/register")
        .match_body(Matcher::PartialJson(json!({
            "challenge_id": "c1",
            "agent_id": "test-agent",
            "owner_principal_id": "owner-1"
        })))
        .match_request(move |request| {
            let Ok(body) = request.body() else {
                return false;
            };
            let Ok(value) = serde_json::from_slice::<serde_json::Value>(body) else {
                return false;
            };
            let signature = value["signature_b64"]
                .as_str()
                .and_then(|s| STANDARD.decode(s).ok())
                .unwrap_or_default();
            let pubkey = value["agent_pubkey_b64"].as_str().unwrap_or_default();
            VerifyingKey::from_public_key_base64(pubkey)
                .is_ok_and(|key| key.verify(&challenge, &signature))
        })
        .with_status(200)
        .with_body(
            json!({
                "agent_principal_id": "p1",
                "agent_id": "test-agent",
                "owner_principal_id": "owner-1",
                "status": "ACTIVE",
                "created_at": "2024-01-15T10:30:00.000Z"
            })
            .to_string(),
        )
        .create_async()
        .await;

    let agent = client_for(&server)
        .register("test-agent", &signing_key, "owner-1")
        .await
        .unwrap();

    challenge_mock.assert_async().await;
    register_mock.assert_async().await;
    assert_eq!(agent.agent_principal_id, "p1");
    assert_eq!(agent.status, "ACTIVE");
}

#[tokio::test]
async fn register_rejects_non_base64_challenge() {
    let mut server = Server::new_async().await;
    server
        .mock("POST", "/v1/agents/registration-challenge")
        .with_status(200)
        .with_body(r#"{"challenge_id":"c1","challenge_b64":"%%%","expires_at":"x"}"#)
        .create_async()
        .await;

    let result = client_for(&server)
        .register("test-agent", &SigningKey::generate(), "owner-1")
        .await;

    assert!(matches!(result, Err(ClientError::InvalidChallenge { .. })));
}

#[tokio::test]
async fn online_verification_maps_reasons() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/v1/verify-proof")
        .match_body(Matcher::Json(json!({
            "token": "v4.public.token",
            "expected_action_hash": null,
            "expected_agent_id": "test-agent"
        })))
        .with_status(200)
        .with_body(r#"{"valid":false,"reason":"agent_id mismatch","claims":{"agent_id":"other"}}"#)
        .create_async()
        .await;

    let result = client_for(&server)
        .verify_proof_online(
            "v4.public.token",
            &ProofExpectations::new().with_agent_id("test-agent"),
        )
        .await
        .unwrap();

    mock.assert_async().await;
    assert_eq!(result.reason(), Some(&InvalidReason::AgentIdMismatch));
    assert_eq!(
        result.claims().and_then(|c| c.agent_id.as_deref()),
        Some("other")
    );
}

#[tokio::test]
async fn public_keys_exclude_revoked_and_malformed() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", "/v1/public-keys")
        .with_status(200)
        .with_body(
            json!({
                "keys": [
                    {
                        "kid": "active",
                        "kty": "OKP",
                        "alg": "EdDSA",
                        "public_key_b64": ZERO_SEED_SPKI_B64,
                        "created_at": "2024-01-01T00:00:00Z",
                        "revoked_at": null
                    },
                    {
                        "kid": "revoked",
                        "kty": "OKP",
                        "alg": "EdDSA",
                        "public_key_b64": SECONDARY_SPKI_B64,
                        "created_at": "2024-01-01T00:00:00Z",
                        "revoked_at": "2024-02-01T00:00:00Z"
                    },
                    {"kid": "broken", "public_key_b64": "%%%"}
                ]
            })
            .to_string(),
        )
        .expect(2)
        .create_async()
        .await;

    let client = client_for(&server);
    let published = client.published_keys().await.unwrap();
    let candidates = client.public_keys().await.unwrap();

    assert_eq!(published.len(), 3);
    let kids: Vec<_> = candidates.iter().map(|k| k.kid.as_str()).collect();
    assert_eq!(kids, vec!["active"]);
}

#[tokio::test]
async fn malformed_response_is_decode_error() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", "/v1/public-keys")
        .with_status(200)
        .with_body("not json")
        .create_async()
        .await;

    let result = client_for(&server).public_keys().await;

    assert!(matches!(result, Err(ClientError::Decode { .. })));
}

#[tokio::test]
async fn unreachable_server_is_transport_error() {
    let client =
        LeashClient::new(ClientConfig::new().with_base_url("http://127.0.0.1:1")).unwrap();

    let result = client.public_keys().await;

    assert!(matches!(result, Err(ClientError::Transport { .. })));
}

#[tokio::test]
async fn offline_verifier_uses_published_keys() {
    let vectors: serde_json::Value =
        serde_json::from_str(include_str!("../../tests/fixtures/testvectors.json")).unwrap();
    let token = vectors["paseto_token_unexpired"].as_str().unwrap();

    let mut server = Server::new_async().await;
    server
        .mock("GET", "/v1/public-keys")
        .with_status(200)
        .with_body(
            json!({
                "keys": [
                    {"kid": "rotated", "public_key_b64": SECONDARY_SPKI_B64, "revoked_at": null},
                    {"kid": "current", "public_key_b64": ZERO_SEED_SPKI_B64, "revoked_at": null}
                ]
            })
            .to_string(),
        )
        .create_async()
        .await;

    let verifier = client_for(&server).offline_verifier().await.unwrap();
    let expectations = ProofExpectations::new().with_agent_id("test-agent");
    let result = verifier.verify_expecting(token, &expectations);

    assert_eq!(verifier.key_count(), 2);
    assert!(result.is_valid());
}
