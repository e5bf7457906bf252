//! Configuration and external AI services for Optimo.
//!
//! - [`config`]: environment-driven [`BotConfig`] and state paths
//! - [`completion`]: chat completion client behind [`CompletionService`]
//! - [`transcription`]: submit-and-poll speech-to-text behind [`TranscriptionService`]

pub mod completion;
pub mod config;
pub mod error;
pub mod transcription;

use std::time::Duration;

pub use completion::{CompletionService, OpenAiCompletion};
pub use config::{BotConfig, CompletionConfig, ConfigError, TranscriptionConfig};
pub use error::{CoreError, Result};
pub use transcription::{AssemblyAiTranscriber, TranscriptStatus, TranscriptionService};

/// Builds the shared outbound HTTP client. Every request inherits `timeout`.
pub fn http_client(timeout: Duration) -> Result<reqwest::Client> {
    Ok(reqwest::Client::builder().timeout(timeout).build()?)
}

/// Loads `.env.local` from the state directory, then `.env.local` or `.env`
/// from the working directory. Variables already in the environment win.
pub fn load_dotenv() {
    let state_env = config::env_file();
    if state_env.exists() {
        if let Err(e) = dotenvy::from_path(&state_env) {
            tracing::warn!(path = %state_env.display(), error = %e, "Failed to load env file");
        }
    }
    let _ = dotenvy::from_filename(".env.local").or_else(|_| dotenvy::dotenv());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_client_builds() {
        assert!(http_client(Duration::from_secs(5)).is_ok());
    }
}
