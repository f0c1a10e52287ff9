use std::fmt;

/// Everything the server sent back for one request, kept verbatim so a
/// caller can inspect the exact bytes when diagnosing a failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    pub status: u16,
    pub body: String,
    /// Raw header lines in the order the server emitted them.
    pub headers: Vec<String>,
}

impl fmt::Display for RawResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "status={} body={}", self.status, self.body)
    }
}

/// Error type for the Marzban client.
#[derive(thiserror::Error, Debug)]
pub enum ApiError {
    #[error("URL parsing error: {0}")]
    UrlParse(#[from] url::ParseError),
    /// Caller-supplied arguments rejected before any network call.
    #[error("invalid input: {0}")]
    InvalidInput(String),
    /// Request body could not be encoded; never reaches the network.
    #[error("failed to serialize request body: {0}")]
    Serialize(serde_json::Error),
    /// No response was obtained from the server.
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("unauthorized: {0}")]
    Unauthorized(RawResponse),
    #[error("forbidden: {0}")]
    Forbidden(RawResponse),
    #[error("not found: {0}")]
    NotFound(RawResponse),
    #[error("validation failed: {0}")]
    Validation(RawResponse),
    #[error("server error: {0}")]
    Server(RawResponse),
    /// Success status but the body did not parse into the expected type.
    #[error("failed to decode response ({message}): {response}")]
    Decode {
        response: RawResponse,
        message: String,
    },
    /// The token endpoint itself failed; terminal, never retried.
    #[error("authentication failed: {0}")]
    Auth(#[source] Box<ApiError>),
}

impl ApiError {
    /// The raw server response attached to this error, when one exists.
    pub fn response(&self) -> Option<&RawResponse> {
        match self {
            ApiError::Unauthorized(raw)
            | ApiError::Forbidden(raw)
            | ApiError::NotFound(raw)
            | ApiError::Validation(raw)
            | ApiError::Server(raw) => Some(raw),
            ApiError::Decode { response, .. } => Some(response),
            ApiError::Auth(inner) => inner.response(),
            _ => None,
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        matches!(self, ApiError::Unauthorized(_))
    }
}
