//! Error taxonomy shared by the ingestion pipeline.

use std::fmt;

/// Input rejected before any work was attempted.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("unsupported audio format: {0:?}")]
    UnsupportedFormat(String),
    #[error("invalid URL: {0}")]
    InvalidUrl(String),
    #[error("audio could not be read: {0}")]
    UnreadableAudio(String),
    #[error("no video resolver configured")]
    NoVideoResolver,
}

#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("validation failed: {0}")]
    Validation(#[from] ValidationError),

    #[error("authentication failed: {0}")]
    Auth(String),

    #[error("transport error: {0}")]
    Transport(String),

    #[error("operation still pending after {attempts} polling attempts")]
    Timeout { attempts: u32 },

    #[error("unexpected response: {0}")]
    Parse(String),

    #[error("playback error: {0}")]
    Playback(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl PipelineError {
    pub(crate) fn auth(err: impl fmt::Display) -> Self {
        Self::Auth(err.to_string())
    }

    pub(crate) fn parse(err: impl fmt::Display) -> Self {
        Self::Parse(err.to_string())
    }
}

impl From<reqwest::Error> for PipelineError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            Self::Parse(err.to_string())
        } else {
            Self::Transport(err.to_string())
        }
    }
}

impl From<jsonwebtoken::errors::Error> for PipelineError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        Self::Auth(err.to_string())
    }
}

impl From<serde_json::Error> for PipelineError {
    fn from(err: serde_json::Error) -> Self {
        Self::Parse(err.to_string())
    }
}

pub type Result<T, E = PipelineError> = std::result::Result<T, E>;

/// Turn a non-2xx response into `Transport`, keeping the body text.
pub(crate) async fn ensure_success(response: reqwest::Response) -> Result<reqwest::Response> {
    if response.status().is_success() {
        return Ok(response);
    }
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    Err(PipelineError::Transport(format!("API error {}: {}", status, body)))
}
