//! Error type for API operations.

use thiserror::Error;
use umschlag_api_models::Message;

/// Result alias for client operations.
pub type ClientResult<T> = Result<T, ClientError>;

/// Failures raised while talking to the API server.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The server answered with an error status.
    #[error("{message}")]
    Api {
        /// HTTP status code of the response.
        status: u16,
        /// Message from the error envelope, or the raw body when it was not an envelope.
        message: String,
    },
    /// The request never produced a response (DNS, connect, TLS, timeout).
    #[error(transparent)]
    Transport(#[from] reqwest::Error),
    /// A successful response carried a body that could not be decoded.
    #[error("failed to decode response: {source}")]
    Decode {
        /// Underlying serde error.
        #[source]
        source: serde_json::Error,
    },
    /// The configured server address cannot be used as a base URL.
    #[error("invalid server address '{server}': {reason}")]
    InvalidServer {
        /// Address as supplied by the caller.
        server: String,
        /// Why it was rejected.
        reason: String,
    },
    /// The token cannot be carried in an HTTP header.
    #[error("token contains characters not allowed in an HTTP header")]
    InvalidToken,
    /// The request identifier cannot be carried in an HTTP header.
    #[error("request identifier contains characters not allowed in an HTTP header")]
    InvalidRequestId,
}

impl ClientError {
    /// Build an API error from a failed response body.
    ///
    /// The body is decoded as a `{status, message}` envelope; when that fails the
    /// trimmed body text becomes the message.
    #[must_use]
    pub fn from_body(status: u16, body: &[u8]) -> Self {
        let message = serde_json::from_slice::<Message>(body).map_or_else(
            |_| String::from_utf8_lossy(body).trim().to_string(),
            |envelope| envelope.message,
        );
        Self::Api { status, message }
    }

    /// HTTP status of the failure, when the server produced one.
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => Some(*status),
            _ => None,
        }
    }
}
