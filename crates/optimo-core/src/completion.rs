//! Chat completion client used for decision advice.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::config::CompletionConfig;
use crate::error::{CoreError, Result};

/// Something that turns a system prompt and a user message into one reply.
#[async_trait]
pub trait CompletionService: Send + Sync {
    /// Returns the assistant's reply text. May be empty if the model said nothing.
    async fn complete(&self, system: &str, user: &str) -> Result<String>;
}

/// OpenAI-compatible `/chat/completions` client.
#[derive(Clone)]
pub struct OpenAiCompletion {
    client: reqwest::Client,
    config: CompletionConfig,
}

impl OpenAiCompletion {
    /// Create a client sharing `client` (and its timeout).
    pub fn new(client: reqwest::Client, config: CompletionConfig) -> Self {
        Self { client, config }
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.config.base_url)
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

#[async_trait]
impl CompletionService for OpenAiCompletion {
    async fn complete(&self, system: &str, user: &str) -> Result<String> {
        let request = ChatRequest {
            model: &self.config.model,
            messages: [
                ChatMessage {
                    role: "system",
                    content: system,
                },
                ChatMessage {
                    role: "user",
                    content: user,
                },
            ],
        };
        trace!(?request, "Sending completion request");

        let response = self
            .client
            .post(self.endpoint())
            .bearer_auth(&self.config.api_key)
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(CoreError::from_response(response).await);
        }

        let body: ChatResponse = response
            .json()
            .await
            .map_err(|e| CoreError::Parse(e.to_string()))?;

        let content = body
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .map(|c| c.trim().to_string())
            .unwrap_or_default();

        debug!(model = %self.config.model, chars = content.len(), "Completion received");
        Ok(content)
    }
}
