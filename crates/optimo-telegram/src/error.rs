//! Error types for the Telegram bot.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Errors that can occur while handling updates or running the bot.
#[derive(Debug, Error)]
pub enum BotError {
    /// Telegram Bot API call failed.
    #[error("Telegram error: {0}")]
    Telegram(#[from] teloxide::RequestError),

    /// Key-value store failure.
    #[error("Store error: {0}")]
    Store(#[from] optimo_persistence::PersistenceError),

    /// Completion or transcription service failure.
    #[error("Service error: {0}")]
    Service(#[from] optimo_core::CoreError),

    /// Invalid or missing configuration.
    #[error("Configuration error: {0}")]
    Config(#[from] optimo_core::ConfigError),

    /// Failed to start the bot.
    #[error("Failed to start bot: {0}")]
    StartFailed(String),

    /// Webhook registration failed.
    #[error("Failed to register webhook: {0}")]
    WebhookFailed(String),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for bot operations.
pub type Result<T> = std::result::Result<T, BotError>;

/// Errors surfaced by the HTTP endpoints.
///
/// The webhook itself never returns these for downstream failures; they
/// cover authentication and the cron endpoint.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Missing or wrong shared secret.
    #[error("unauthorized")]
    Unauthorized,

    /// Internal server error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl ApiError {
    /// Returns the HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = Json(json!({
            "ok": false,
            "error": self.to_string()
        }));
        (status, body).into_response()
    }
}

impl From<BotError> for ApiError {
    fn from(err: BotError) -> Self {
        ApiError::Internal(err.to_string())
    }
}
