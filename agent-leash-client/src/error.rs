//! Error types for authorization server calls.

use std::fmt;

use agent_leash::KeyFormatError;

/// Errors that can occur while talking to the authorization server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientError {
    /// The client configuration is unusable.
    InvalidConfig {
        /// What is wrong with the configuration
        reason: String,
    },
    /// The request could not be sent or the response could not be read.
    Transport {
        /// Description of the transport failure
        reason: String,
    },
    /// The server answered with an error status.
    Status {
        /// HTTP status code
        status: u16,
        /// Response body as returned by the server
        body: String,
    },
    /// A request body could not be serialized.
    Encode {
        /// Description of the serialization error
        reason: String,
    },
    /// A response body could not be parsed.
    Decode {
        /// Description of the parsing error
        reason: String,
    },
    /// Key material supplied by the caller or returned by the server is malformed.
    Key(KeyFormatError),
    /// The registration challenge is not valid base64.
    InvalidChallenge {
        /// Description of the decoding error
        reason: String,
    },
}

impl fmt::Display for ClientError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidConfig { reason } => {
                write!(f, "invalid client configuration: {reason}")
            }
            Self::Transport { reason } => {
                write!(
                    f,
                    "request to authorization server failed: {reason}; check the base URL and that the server is running"
                )
            }
            Self::Status { status, body } => {
                write!(f, "authorization server returned HTTP {status}: {body}")
            }
            Self::Encode { reason } => {
                write!(f, "failed to serialize request body: {reason}")
            }
            Self::Decode { reason } => {
                write!(f, "failed to parse server response: {reason}")
            }
            Self::Key(err) => err.fmt(f),
            Self::InvalidChallenge { reason } => {
                write!(f, "registration challenge is not valid base64: {reason}")
            }
        }
    }
}

impl std::error::Error for ClientError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Key(err) => Some(err),
            _ => None,
        }
    }
}

impl From<KeyFormatError> for ClientError {
    fn from(err: KeyFormatError) -> Self {
        Self::Key(err)
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            Self::Decode {
                reason: err.to_string(),
            }
        } else {
            Self::Transport {
                reason: err.to_string(),
            }
        }
    }
}
