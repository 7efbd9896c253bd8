//! HTTP client for the authorization server.

use agent_leash::{
    CandidateKey, HEADER_AGENT_ID, ProofExpectations, ProofVerifier, SigningKey,
    VerificationResult, new_nonce, request_timestamp, sign_challenge, sign_request,
};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use chrono::Utc;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, Response};
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::config::ClientConfig;
use crate::error::ClientError;
use crate::types::{
    AuthorizeResponse, ChallengeRequest, PublicKeySet, PublishedKey, RegisterAgentRequest,
    RegisteredAgent, RegistrationChallenge, VerifyProofRequest,
};

/// Path of the registration challenge endpoint.
pub const REGISTRATION_CHALLENGE_PATH: &str = "/v1/agents/registration-challenge";
/// Path of the agent registration endpoint.
pub const REGISTER_PATH: &str = "/v1/agents/register";
/// Path of the signed authorization endpoint.
pub const AUTHORIZE_PATH: &str = "/v1/authorize";
/// Path of the online proof verification endpoint.
pub const VERIFY_PROOF_PATH: &str = "/v1/verify-proof";
/// Path of the public key discovery endpoint.
pub const PUBLIC_KEYS_PATH: &str = "/v1/public-keys";

/// Client for the authorization server.
///
/// Holds one pooled `reqwest::Client`; clones share the pool.
///
/// # Example
///
/// ```no_run
/// use agent_leash::SigningKey;
/// use agent_leash_client::{ClientConfig, LeashClient};
///
/// # async fn run() -> Result<(), agent_leash_client::ClientError> {
/// let client = LeashClient::new(ClientConfig::from_env()?)?;
/// let signing_key = SigningKey::generate();
///
/// let action = serde_json::json!({"action_type": "purchase"});
/// let response = client.authorize("my-agent", &signing_key, &action).await?;
///
/// if let Some(token) = &response.proof_token {
///     let verifier = client.offline_verifier().await?;
///     assert!(verifier.verify(token).is_valid());
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct LeashClient {
    config: ClientConfig,
    http: Client,
}

impl LeashClient {
    /// Creates a client with its own connection pool.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::InvalidConfig` if the HTTP client cannot be built.
    pub fn new(config: ClientConfig) -> Result<Self, ClientError> {
        let http = Client::builder()
            .timeout(config.timeout)
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| ClientError::InvalidConfig {
                reason: e.to_string(),
            })?;
        Ok(Self { config, http })
    }

    /// Returns the configuration.
    #[must_use]
    pub const fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Requests a registration challenge for an agent key.
    ///
    /// # Errors
    ///
    /// Returns `ClientError` on transport failure, an error status or an
    /// unparsable response.
    pub async fn registration_challenge(
        &self,
        agent_id: &str,
        agent_pubkey_b64: &str,
        owner_principal_id: Option<&str>,
    ) -> Result<RegistrationChallenge, ClientError> {
        let request = ChallengeRequest {
            agent_id: agent_id.to_string(),
            agent_pubkey_b64: agent_pubkey_b64.to_string(),
            owner_principal_id: owner_principal_id.map(str::to_string),
        };
        self.post_json(REGISTRATION_CHALLENGE_PATH, &request).await
    }

    /// Registers an agent by answering a challenge.
    ///
    /// # Errors
    ///
    /// Returns `ClientError` on transport failure, an error status or an
    /// unparsable response.
    pub async fn register_agent(
        &self,
        request: &RegisterAgentRequest,
    ) -> Result<RegisteredAgent, ClientError> {
        self.post_json(REGISTER_PATH, request).await
    }

    /// Runs the full registration handshake for `signing_key`.
    ///
    /// Requests a challenge, signs the decoded challenge bytes and submits
    /// the registration.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::InvalidChallenge` if the server sends a
    /// challenge that is not base64, and any error of the two calls.
    pub async fn register(
        &self,
        agent_id: &str,
        signing_key: &SigningKey,
        owner_principal_id: &str,
    ) -> Result<RegisteredAgent, ClientError> {
        let agent_pubkey_b64 = signing_key.verifying_key().to_public_key_base64()?;
        let challenge = self
            .registration_challenge(agent_id, &agent_pubkey_b64, Some(owner_principal_id))
            .await?;

        let challenge_bytes =
            STANDARD
                .decode(&challenge.challenge_b64)
                .map_err(|e| ClientError::InvalidChallenge {
                    reason: e.to_string(),
                })?;

        let request = RegisterAgentRequest {
            challenge_id: challenge.challenge_id,
            agent_id: agent_id.to_string(),
            agent_pubkey_b64,
            signature_b64: sign_challenge(signing_key, &challenge_bytes),
            owner_principal_id: owner_principal_id.to_string(),
        };
        self.register_agent(&request).await
    }

    /// Requests authorization for an action.
    ///
    /// The action is serialized once and exactly those bytes are signed and
    /// sent.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Encode` if the action cannot be serialized, and
    /// `ClientError` on transport failure, an error status or an unparsable
    /// response.
    pub async fn authorize<A: Serialize + ?Sized>(
        &self,
        agent_id: &str,
        signing_key: &SigningKey,
        action: &A,
    ) -> Result<AuthorizeResponse, ClientError> {
        let body = serde_json::to_vec(action).map_err(|e| ClientError::Encode {
            reason: e.to_string(),
        })?;
        self.authorize_body(agent_id, signing_key, body).await
    }

    /// Requests authorization for an already serialized action.
    ///
    /// # Errors
    ///
    /// Returns `ClientError` on transport failure, an error status or an
    /// unparsable response.
    pub async fn authorize_body(
        &self,
        agent_id: &str,
        signing_key: &SigningKey,
        body: Vec<u8>,
    ) -> Result<AuthorizeResponse, ClientError> {
        let timestamp = request_timestamp(Utc::now());
        let nonce = new_nonce();
        let headers = sign_request("POST", AUTHORIZE_PATH, &timestamp, &nonce, &body, signing_key);

        let mut request = self
            .http
            .post(self.config.endpoint(AUTHORIZE_PATH))
            .header(CONTENT_TYPE, "application/json")
            .header(HEADER_AGENT_ID, agent_id);
        for (name, value) in headers.pairs() {
            request = request.header(name, value);
        }

        tracing::debug!(agent_id, %nonce, "sending signed authorize request");
        let response = request.body(body).send().await?;
        read_json(response).await
    }

    /// Verifies a proof token on the server.
    ///
    /// # Errors
    ///
    /// Returns `ClientError` on transport failure, an error status or an
    /// unparsable response. A rejected token is an `Ok` `Invalid` result.
    pub async fn verify_proof_online(
        &self,
        token: &str,
        expectations: &ProofExpectations,
    ) -> Result<VerificationResult, ClientError> {
        let request = VerifyProofRequest {
            token: token.to_string(),
            expected_action_hash: expectations.action_hash.clone(),
            expected_agent_id: expectations.agent_id.clone(),
        };
        self.post_json(VERIFY_PROOF_PATH, &request).await
    }

    /// Lists every published server key, revoked ones included.
    ///
    /// # Errors
    ///
    /// Returns `ClientError` on transport failure, an error status or an
    /// unparsable response.
    pub async fn published_keys(&self) -> Result<Vec<PublishedKey>, ClientError> {
        let url = self.config.endpoint(PUBLIC_KEYS_PATH);
        tracing::debug!(%url, "fetching public keys");
        let response = self.http.get(url).send().await?;
        let set: PublicKeySet = read_json(response).await?;
        Ok(set.keys)
    }

    /// Returns the server keys usable for offline verification.
    ///
    /// Revoked keys and keys that are not valid base64 are left out.
    ///
    /// # Errors
    ///
    /// Returns `ClientError` on transport failure, an error status or an
    /// unparsable response.
    pub async fn public_keys(&self) -> Result<Vec<CandidateKey>, ClientError> {
        let keys = self
            .published_keys()
            .await?
            .into_iter()
            .filter(|key| !key.is_revoked())
            .filter_map(|key| match key.to_candidate() {
                Ok(candidate) => Some(candidate),
                Err(err) => {
                    tracing::warn!(
                        kid = %key.kid,
                        error = %err,
                        "ignoring malformed published key"
                    );
                    None
                }
            })
            .collect();
        Ok(keys)
    }

    /// Builds an offline verifier from the current server keys.
    ///
    /// # Errors
    ///
    /// Returns any error of [`LeashClient::public_keys`].
    pub async fn offline_verifier(&self) -> Result<ProofVerifier, ClientError> {
        Ok(ProofVerifier::with_keys(self.public_keys().await?))
    }

    async fn post_json<B, R>(&self, path: &str, body: &B) -> Result<R, ClientError>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let url = self.config.endpoint(path);
        tracing::debug!(%url, "sending request");
        let response = self.http.post(url).json(body).send().await?;
        read_json(response).await
    }
}

async fn read_json<R: DeserializeOwned>(response: Response) -> Result<R, ClientError> {
    let status = response.status();
    let bytes = response.bytes().await?;

    if status.as_u16() >= 400 {
        let body = String::from_utf8_lossy(&bytes).into_owned();
        tracing::warn!(status = status.as_u16(), %body, "authorization server returned an error");
        return Err(ClientError::Status {
            status: status.as_u16(),
            body,
        });
    }

    serde_json::from_slice(&bytes).map_err(|e| ClientError::Decode {
        reason: e.to_string(),
    })
}
