//! In-crate fakes for handler and server tests.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use optimo_core::{CompletionService, CoreError, TranscriptStatus, TranscriptionService};
use optimo_persistence::{MemoryStore, SharedKv, DEFAULT_MODE_TTL};

use crate::error::{BotError, Result};
use crate::state::{AppState, ServerSettings};
use crate::transport::{ChatTransport, SendOptions};

#[derive(Debug, Clone)]
pub struct SentMessage {
    pub chat_id: i64,
    pub text: String,
    pub options: SendOptions,
}

/// Records everything sent; can be told to fail.
#[derive(Default)]
pub struct RecordingTransport {
    sent: Mutex<Vec<SentMessage>>,
    answered: Mutex<Vec<String>>,
    fail_all: AtomicBool,
    failing_chats: Mutex<HashSet<i64>>,
}

impl RecordingTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sent(&self) -> Vec<SentMessage> {
        self.sent.lock().unwrap().clone()
    }

    pub fn texts(&self) -> Vec<String> {
        self.sent().into_iter().map(|m| m.text).collect()
    }

    pub fn answered(&self) -> Vec<String> {
        self.answered.lock().unwrap().clone()
    }

    pub fn fail_sends(&self, fail: bool) {
        self.fail_all.store(fail, Ordering::SeqCst);
    }

    pub fn fail_chat(&self, chat_id: i64) {
        self.failing_chats.lock().unwrap().insert(chat_id);
    }
}

#[async_trait]
impl ChatTransport for RecordingTransport {
    async fn send_message(&self, chat_id: i64, text: &str, options: SendOptions) -> Result<()> {
        if self.fail_all.load(Ordering::SeqCst)
            || self.failing_chats.lock().unwrap().contains(&chat_id)
        {
            return Err(BotError::Io(std::io::Error::new(
                std::io::ErrorKind::ConnectionRefused,
                "transport down",
            )));
        }
        self.sent.lock().unwrap().push(SentMessage {
            chat_id,
            text: text.to_string(),
            options,
        });
        Ok(())
    }

    async fn answer_callback(&self, callback_id: &str, _text: Option<&str>) -> Result<()> {
        self.answered.lock().unwrap().push(callback_id.to_string());
        Ok(())
    }

    async fn file_url(&self, file_id: &str) -> Result<String> {
        Ok(format!("https://files.test/{}", file_id))
    }
}

/// Completion fake returning a fixed reply or an API error.
pub struct FakeCompletion {
    reply: Option<String>,
    calls: Mutex<Vec<(String, String)>>,
}

impl FakeCompletion {
    pub fn replying(reply: &str) -> Self {
        Self {
            reply: Some(reply.to_string()),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn failing() -> Self {
        Self {
            reply: None,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<(String, String)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl CompletionService for FakeCompletion {
    async fn complete(&self, system: &str, user: &str) -> optimo_core::Result<String> {
        self.calls
            .lock()
            .unwrap()
            .push((system.to_string(), user.to_string()));
        self.reply.clone().ok_or(CoreError::Api {
            status: 500,
            body: "upstream down".to_string(),
        })
    }
}

/// Transcription fake that answers every poll with the same status.
pub struct FakeTranscriber {
    status: TranscriptStatus,
}

impl FakeTranscriber {
    pub fn completed(text: &str) -> Self {
        Self {
            status: TranscriptStatus::Completed(text.to_string()),
        }
    }

    pub fn erroring(message: &str) -> Self {
        Self {
            status: TranscriptStatus::Error(message.to_string()),
        }
    }

    pub fn stuck() -> Self {
        Self {
            status: TranscriptStatus::Pending,
        }
    }
}

#[async_trait]
impl TranscriptionService for FakeTranscriber {
    async fn submit(&self, _audio_url: &str) -> optimo_core::Result<String> {
        Ok("job-1".to_string())
    }

    async fn poll(&self, _job_id: &str) -> optimo_core::Result<TranscriptStatus> {
        Ok(self.status.clone())
    }

    fn poll_interval(&self) -> Duration {
        Duration::from_millis(1)
    }

    fn max_polls(&self) -> u32 {
        3
    }
}

/// A state over an in-memory store with handles to its fakes.
pub struct Harness {
    pub state: AppState,
    pub kv: SharedKv,
    pub transport: Arc<RecordingTransport>,
    pub completion: Arc<FakeCompletion>,
}

impl Harness {
    pub fn new() -> Self {
        Self::with(
            FakeCompletion::replying("Go for it."),
            FakeTranscriber::completed("hello from voice"),
        )
    }

    pub fn with(completion: FakeCompletion, transcriber: FakeTranscriber) -> Self {
        Self::with_settings(
            ServerSettings::new(chrono_tz::Asia::Singapore, Duration::from_secs(60)),
            completion,
            transcriber,
        )
    }

    pub fn with_settings(
        settings: ServerSettings,
        completion: FakeCompletion,
        transcriber: FakeTranscriber,
    ) -> Self {
        let kv: SharedKv = Arc::new(MemoryStore::new());
        let transport = Arc::new(RecordingTransport::new());
        let completion = Arc::new(completion);
        let state = AppState::new(
            settings,
            kv.clone(),
            DEFAULT_MODE_TTL,
            transport.clone(),
            completion.clone(),
            Arc::new(transcriber),
        );
        Self {
            state,
            kv,
            transport,
            completion,
        }
    }
}
