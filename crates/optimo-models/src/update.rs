//! Inbound Telegram update envelope.
//!
//! Only the fields the router reads are modelled; everything else in the
//! Bot API payload is ignored. A payload that does not fit this shape is
//! treated as unrecognizable by the caller.

use serde::{Deserialize, Serialize};

/// One webhook delivery from Telegram.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Update {
    /// Telegram's monotonically increasing update id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub update_id: Option<i64>,

    /// A new incoming message.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<InboundMessage>,

    /// An inline keyboard button press.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub callback_query: Option<CallbackQuery>,
}

/// The chat a message belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chat {
    pub id: i64,
}

/// A voice attachment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Voice {
    pub file_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<u32>,
}

/// An incoming message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InboundMessage {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message_id: Option<i64>,
    pub chat: Chat,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub voice: Option<Voice>,
}

impl InboundMessage {
    /// Creates a plain text message (mostly for tests and tooling).
    pub fn text(chat_id: i64, text: impl Into<String>) -> Self {
        Self {
            message_id: None,
            chat: Chat { id: chat_id },
            text: Some(text.into()),
            voice: None,
        }
    }

    /// Creates a voice message.
    pub fn voice(chat_id: i64, file_id: impl Into<String>) -> Self {
        Self {
            message_id: None,
            chat: Chat { id: chat_id },
            text: None,
            voice: Some(Voice {
                file_id: file_id.into(),
                duration: None,
            }),
        }
    }

    /// Returns the chat id.
    pub fn chat_id(&self) -> i64 {
        self.chat.id
    }

    /// Returns the trimmed text, if any non-empty text is present.
    pub fn trimmed_text(&self) -> Option<&str> {
        self.text.as_deref().map(str::trim).filter(|t| !t.is_empty())
    }
}

/// The message a callback button was attached to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallbackMessage {
    pub chat: Chat,
}

/// A button press.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallbackQuery {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<CallbackMessage>,
}

impl CallbackQuery {
    /// Returns the chat the pressed button lives in.
    pub fn chat_id(&self) -> Option<i64> {
        self.message.as_ref().map(|m| m.chat.id)
    }
}

impl Update {
    /// Parses a raw webhook body.
    pub fn from_slice(body: &[u8]) -> serde_json::Result<Self> {
        serde_json::from_slice(body)
    }

    /// Returns true if the update carries neither a message nor a callback.
    pub fn is_empty(&self) -> bool {
        self.message.is_none() && self.callback_query.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_text_message() {
        let body = br#"{
            "update_id": 10,
            "message": {
                "message_id": 5,
                "date": 1700000000,
                "from": {"id": 7, "is_bot": false, "first_name": "A"},
                "chat": {"id": 7, "type": "private"},
                "text": "09:00 buy milk"
            }
        }"#;

        let update = Update::from_slice(body).unwrap();
        let msg = update.message.unwrap();
        assert_eq!(msg.chat_id(), 7);
        assert_eq!(msg.trimmed_text(), Some("09:00 buy milk"));
        assert!(msg.voice.is_none());
    }

    #[test]
    fn test_parse_voice_message() {
        let body = br#"{"message": {"chat": {"id": 3}, "voice": {"file_id": "AwAD", "duration": 4}}}"#;

        let update = Update::from_slice(body).unwrap();
        let msg = update.message.unwrap();
        assert_eq!(msg.voice.unwrap().file_id, "AwAD");
        assert!(msg.text.is_none());
    }

    #[test]
    fn test_parse_callback_query() {
        let body = br#"{"callback_query": {"id": "cb1", "data": "notes", "message": {"chat": {"id": 9}}}}"#;

        let update = Update::from_slice(body).unwrap();
        let cb = update.callback_query.unwrap();
        assert_eq!(cb.id, "cb1");
        assert_eq!(cb.data.as_deref(), Some("notes"));
        assert_eq!(cb.chat_id(), Some(9));
    }

    #[test]
    fn test_empty_update() {
        let update = Update::from_slice(br#"{"update_id": 1, "edited_message": {}}"#).unwrap();
        assert!(update.is_empty());
    }

    #[test]
    fn test_message_without_chat_is_rejected() {
        assert!(Update::from_slice(br#"{"message": {"text": "hi"}}"#).is_err());
    }

    #[test]
    fn test_blank_text_is_none() {
        let msg = InboundMessage::text(1, "   ");
        assert_eq!(msg.trimmed_text(), None);
    }
}
