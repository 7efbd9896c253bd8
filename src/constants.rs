//! Constants for request signing and proof token handling.

/// Header carrying the caller-supplied request timestamp.
pub const HEADER_TIMESTAMP: &str = "X-Timestamp";

/// Header carrying the caller-supplied request nonce.
pub const HEADER_NONCE: &str = "X-Nonce";

/// Header carrying the lowercase hex SHA-256 of the request body.
pub const HEADER_BODY_SHA256: &str = "X-Body-Sha256";

/// Header carrying the base64 Ed25519 request signature.
pub const HEADER_SIGNATURE: &str = "X-Signature";

/// Header identifying the agent on authorize requests.
pub const HEADER_AGENT_ID: &str = "X-Agent-Id";

/// Separator between signing-string fields.
pub const SIGNING_FIELD_SEPARATOR: char = '\n';

/// Number of fields in a signing string.
pub const SIGNING_FIELD_COUNT: usize = 5;

/// `strftime` format for request timestamps (millisecond precision, literal `Z`).
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3fZ";

/// Version and purpose prefix of a PASETO v4.public token.
pub const TOKEN_HEADER: &str = "v4.public.";

/// Length of a raw Ed25519 signature in bytes.
pub const SIGNATURE_LENGTH: usize = 64;

/// Maximum accepted token length in bytes (1 MiB).
///
/// Proofs may embed arbitrary constraint snapshots, so this only bounds
/// pathological input.
pub const MAX_TOKEN_LENGTH: usize = 1024 * 1024;
