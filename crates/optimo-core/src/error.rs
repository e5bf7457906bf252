//! Error types for the external service clients.

use thiserror::Error;

use crate::config::ConfigError;

/// Result type alias for core operations.
pub type Result<T> = std::result::Result<T, CoreError>;

/// Errors from configuration or upstream AI services.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Network failure or timeout.
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// Upstream answered with a non-success status.
    #[error("API error ({status}): {body}")]
    Api { status: u16, body: String },

    /// Upstream answered with an unexpected body.
    #[error("unexpected response: {0}")]
    Parse(String),

    /// Transcription job ended in the error state.
    #[error("transcription failed: {0}")]
    TranscriptionFailed(String),

    /// Transcription did not finish within the poll budget.
    #[error("transcription timed out after {attempts} polls")]
    TranscriptionTimedOut { attempts: u32 },

    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl CoreError {
    /// Builds an [`CoreError::Api`] from a failed response, keeping the body for logs.
    pub(crate) async fn from_response(response: reqwest::Response) -> Self {
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        CoreError::Api { status, body }
    }
}
