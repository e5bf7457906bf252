//! Note types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// How a note was captured.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoteKind {
    /// Transcribed from a voice message.
    Voice,
    /// Typed text.
    Text,
}

impl NoteKind {
    /// Returns the lowercase name.
    pub fn as_str(&self) -> &'static str {
        match self {
            NoteKind::Voice => "voice",
            NoteKind::Text => "text",
        }
    }
}

impl std::fmt::Display for NoteKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single entry in a chat's note log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Note {
    /// Note body.
    pub text: String,

    /// When the note was captured (stored as epoch milliseconds).
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub timestamp: DateTime<Utc>,

    /// Capture kind.
    pub kind: NoteKind,
}

impl Note {
    /// Creates a note stamped with the given time.
    pub fn new(text: impl Into<String>, kind: NoteKind, timestamp: DateTime<Utc>) -> Self {
        Self {
            text: text.into(),
            timestamp,
            kind,
        }
    }

    /// Creates a text note stamped now.
    pub fn text(text: impl Into<String>) -> Self {
        Self::new(text, NoteKind::Text, Utc::now())
    }

    /// Creates a voice note stamped now.
    pub fn voice(text: impl Into<String>) -> Self {
        Self::new(text, NoteKind::Voice, Utc::now())
    }
}
