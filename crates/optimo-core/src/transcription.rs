//! Speech-to-text client used for voice notes.
//!
//! Transcription is a submit-then-poll job: [`TranscriptionService::submit`]
//! hands the provider an audio URL and gets a job id back, and
//! [`TranscriptionService::transcribe`] polls until the job completes, fails,
//! or the poll budget runs out.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::TranscriptionConfig;
use crate::error::{CoreError, Result};

/// State of a submitted transcription job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TranscriptStatus {
    /// Queued or processing.
    Pending,
    Completed(String),
    Error(String),
}

#[async_trait]
pub trait TranscriptionService: Send + Sync {
    /// Submits `audio_url` and returns the job id.
    async fn submit(&self, audio_url: &str) -> Result<String>;

    /// Fetches the current job status.
    async fn poll(&self, job_id: &str) -> Result<TranscriptStatus>;

    /// Delay between polls.
    fn poll_interval(&self) -> Duration;

    /// Polls before giving up.
    fn max_polls(&self) -> u32;

    /// Submits and waits for a non-empty transcript.
    ///
    /// An empty transcript counts as a failure.
    async fn transcribe(&self, audio_url: &str) -> Result<String> {
        let job_id = self.submit(audio_url).await?;
        debug!(job_id = %job_id, "Transcription submitted");

        for attempt in 1..=self.max_polls() {
            match self.poll(&job_id).await? {
                TranscriptStatus::Completed(text) => {
                    let text = text.trim();
                    if text.is_empty() {
                        return Err(CoreError::TranscriptionFailed("empty transcript".into()));
                    }
                    debug!(job_id = %job_id, attempt, "Transcription completed");
                    return Ok(text.to_string());
                }
                TranscriptStatus::Error(message) => {
                    warn!(job_id = %job_id, error = %message, "Transcription job failed");
                    return Err(CoreError::TranscriptionFailed(message));
                }
                TranscriptStatus::Pending => {
                    if attempt < self.max_polls() {
                        tokio::time::sleep(self.poll_interval()).await;
                    }
                }
            }
        }

        Err(CoreError::TranscriptionTimedOut {
            attempts: self.max_polls(),
        })
    }
}

/// AssemblyAI `/v2/transcript` client.
#[derive(Clone)]
pub struct AssemblyAiTranscriber {
    client: reqwest::Client,
    config: TranscriptionConfig,
}

impl AssemblyAiTranscriber {
    pub fn new(client: reqwest::Client, config: TranscriptionConfig) -> Self {
        Self { client, config }
    }

    fn transcript_url(&self) -> String {
        format!("{}/v2/transcript", self.config.base_url)
    }
}

#[derive(Debug, Serialize)]
struct SubmitRequest<'a> {
    audio_url: &'a str,
    language_detection: bool,
    punctuate: bool,
}

#[derive(Debug, Deserialize)]
struct TranscriptBody {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

impl TranscriptBody {
    fn into_status(self) -> Result<TranscriptStatus> {
        match self.status.as_deref() {
            Some("queued") | Some("processing") => Ok(TranscriptStatus::Pending),
            Some("completed") => Ok(TranscriptStatus::Completed(self.text.unwrap_or_default())),
            Some("error") => Ok(TranscriptStatus::Error(
                self.error.unwrap_or_else(|| "unknown error".to_string()),
            )),
            other => Err(CoreError::Parse(format!("unknown transcript status {:?}", other))),
        }
    }
}

#[async_trait]
impl TranscriptionService for AssemblyAiTranscriber {
    async fn submit(&self, audio_url: &str) -> Result<String> {
        let response = self
            .client
            .post(self.transcript_url())
            .header("authorization", &self.config.api_key)
            .json(&SubmitRequest {
                audio_url,
                language_detection: true,
                punctuate: true,
            })
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(CoreError::from_response(response).await);
        }

        let body: TranscriptBody = response
            .json()
            .await
            .map_err(|e| CoreError::Parse(e.to_string()))?;
        body.id
            .ok_or_else(|| CoreError::Parse("transcript id missing".to_string()))
    }

    async fn poll(&self, job_id: &str) -> Result<TranscriptStatus> {
        let response = self
            .client
            .get(format!("{}/{}", self.transcript_url(), job_id))
            .header("authorization", &self.config.api_key)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(CoreError::from_response(response).await);
        }

        let body: TranscriptBody = response
            .json()
            .await
            .map_err(|e| CoreError::Parse(e.to_string()))?;
        body.into_status()
    }

    fn poll_interval(&self) -> Duration {
        self.config.poll_interval
    }

    fn max_polls(&self) -> u32 {
        self.config.max_polls
    }
}
