use thiserror::Error;

/// Failures talking to the discussion service.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("server returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("malformed response: {0}")]
    Decode(#[from] serde_json::Error),
}

pub type ApiResult<T> = Result<T, ApiError>;
