//! Outbound chat delivery.
//!
//! Handlers and the sweeper talk to Telegram only through [`ChatTransport`],
//! so tests can swap in a recording fake.

use std::time::Duration;

use async_trait::async_trait;
use teloxide::prelude::*;
use teloxide::types::{ChatId, InlineKeyboardMarkup, ParseMode};
use tracing::debug;

use crate::error::{BotError, Result};

/// Formatting and markup for an outgoing message.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SendOptions {
    pub parse_mode: Option<ParseMode>,
    pub keyboard: Option<InlineKeyboardMarkup>,
}

impl SendOptions {
    /// Plain text, no markup.
    pub fn plain() -> Self {
        Self::default()
    }

    pub fn html() -> Self {
        Self {
            parse_mode: Some(ParseMode::Html),
            keyboard: None,
        }
    }

    pub fn markdown() -> Self {
        Self {
            parse_mode: Some(ParseMode::MarkdownV2),
            keyboard: None,
        }
    }

    /// Attaches an inline keyboard.
    pub fn with_keyboard(mut self, keyboard: InlineKeyboardMarkup) -> Self {
        self.keyboard = Some(keyboard);
        self
    }
}

/// Chat platform operations the bot needs.
#[async_trait]
pub trait ChatTransport: Send + Sync {
    /// Sends a message to a chat.
    async fn send_message(&self, chat_id: i64, text: &str, options: SendOptions) -> Result<()>;

    /// Acknowledges a button press, optionally with a toast.
    async fn answer_callback(&self, callback_id: &str, text: Option<&str>) -> Result<()>;

    /// Resolves a file id to a downloadable URL.
    async fn file_url(&self, file_id: &str) -> Result<String>;
}

/// [`ChatTransport`] over teloxide's [`Bot`].
#[derive(Clone)]
pub struct TeloxideTransport {
    bot: Bot,
}

impl TeloxideTransport {
    /// Create a transport whose requests time out after `timeout`.
    pub fn new(token: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = teloxide::net::default_reqwest_settings()
            .timeout(timeout)
            .build()
            .map_err(|e| BotError::StartFailed(format!("HTTP client: {}", e)))?;
        Ok(Self {
            bot: Bot::with_client(token, client),
        })
    }

    /// The underlying bot, for setup calls such as `setWebhook`.
    pub fn bot(&self) -> &Bot {
        &self.bot
    }
}

#[async_trait]
impl ChatTransport for TeloxideTransport {
    async fn send_message(&self, chat_id: i64, text: &str, options: SendOptions) -> Result<()> {
        let mut req = self.bot.send_message(ChatId(chat_id), text);
        if let Some(mode) = options.parse_mode {
            req = req.parse_mode(mode);
        }
        if let Some(kb) = options.keyboard {
            req = req.reply_markup(kb);
        }
        req.await?;
        debug!(chat_id, "Message sent");
        Ok(())
    }

    async fn answer_callback(&self, callback_id: &str, text: Option<&str>) -> Result<()> {
        let mut req = self.bot.answer_callback_query(callback_id.to_string());
        if let Some(text) = text {
            req = req.text(text);
        }
        req.await?;
        Ok(())
    }

    async fn file_url(&self, file_id: &str) -> Result<String> {
        let file = self.bot.get_file(file_id.to_string()).await?;
        Ok(format!(
            "{}/file/bot{}/{}",
            self.bot.api_url().as_str().trim_end_matches('/'),
            self.bot.token(),
            file.path
        ))
    }
}
