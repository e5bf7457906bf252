//! Reminder type.

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A pending reminder for a chat.
///
/// Serialized as `{"id", "chatId", "task", "dueMs"}`. The serialized form is
/// also the sorted-set member, so field order and naming must stay stable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reminder {
    /// Unique identifier (`r:<chat_id>:<uuid>`).
    pub id: String,

    /// Telegram chat the reminder is delivered to.
    pub chat_id: i64,

    /// Free-text task.
    pub task: String,

    /// Due time in epoch milliseconds. The only ordering key.
    pub due_ms: i64,
}

impl Reminder {
    /// Creates a new reminder with a fresh id.
    pub fn new(chat_id: i64, task: impl Into<String>, due_ms: i64) -> Self {
        Self {
            id: format!("r:{}:{}", chat_id, Uuid::new_v4().simple()),
            chat_id,
            task: task.into(),
            due_ms,
        }
    }

    /// Returns the due time as a UTC timestamp.
    pub fn due_at(&self) -> Option<DateTime<Utc>> {
        Utc.timestamp_millis_opt(self.due_ms).single()
    }

    /// Serializes the reminder to its stored member form.
    pub fn to_member(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    /// Parses a reminder from its stored member form.
    pub fn from_member(member: &str) -> serde_json::Result<Self> {
        serde_json::from_str(member)
    }
}
