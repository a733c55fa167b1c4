use thiserror::Error;

/// Errors returned by the hosted backend client.
#[derive(Debug, Error)]
pub enum BackendError {
    /// Network or TLS failure from the underlying HTTP client.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The access token is missing, expired or was rejected (HTTP 401/403).
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// Any other non-2xx response, with the message from the error body.
    #[error("backend error ({status}): {message}")]
    Api { status: u16, message: String },

    /// A write succeeded but the backend returned no representation.
    #[error("empty response for {0}")]
    EmptyResponse(String),

    /// The response body could not be deserialized into the expected type.
    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid base URL '{url}': {reason}")]
    InvalidBaseUrl { url: String, reason: String },
}

impl BackendError {
    /// `true` when the caller's session was rejected rather than the request failing.
    #[must_use]
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, BackendError::Unauthorized(_))
    }
}
