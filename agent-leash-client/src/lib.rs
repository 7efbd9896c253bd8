//! Async client for an agent authorization server.
//!
//! Wraps the server's HTTP API around the synchronous core in
//! [`agent_leash`]: agent registration by challenge, signed authorization
//! requests, online proof verification and public key discovery for
//! offline verification.
//!
//! # Endpoints
//!
//! | Operation | Endpoint |
//! |-----------|----------|
//! | [`LeashClient::registration_challenge`] | `POST /v1/agents/registration-challenge` |
//! | [`LeashClient::register_agent`] | `POST /v1/agents/register` |
//! | [`LeashClient::authorize`] | `POST /v1/authorize` |
//! | [`LeashClient::verify_proof_online`] | `POST /v1/verify-proof` |
//! | [`LeashClient::public_keys`] | `GET /v1/public-keys` |
//!
//! Retries are left to the caller.

#![deny(missing_docs)]
#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

mod client;
mod config;
mod error;
mod types;

pub use client::{
    AUTHORIZE_PATH, LeashClient, PUBLIC_KEYS_PATH, REGISTER_PATH, REGISTRATION_CHALLENGE_PATH,
    VERIFY_PROOF_PATH,
};
pub use config::{ClientConfig, ENV_TIMEOUT_SECS, ENV_URL};
pub use error::ClientError;
pub use types::{
    AuthorizeResponse, ChallengeRequest, Decision, PublicKeySet, PublishedKey,
    RegisterAgentRequest, RegisteredAgent, RegistrationChallenge, VerifyProofRequest,
};
