//! Append-only per-chat note log.

use optimo_models::Note;
use tracing::warn;

use crate::error::Result;
use crate::kv::SharedKv;

/// Key prefix for note lists.
pub const NOTES_PREFIX: &str = "tg:notes:";

/// Per-chat ordered note log.
///
/// Backed by list append, so concurrent appends for the same chat never
/// overwrite each other. There is no update or delete.
#[derive(Clone)]
pub struct NoteLog {
    kv: SharedKv,
}

impl NoteLog {
    pub fn new(kv: SharedKv) -> Self {
        Self { kv }
    }

    fn key(chat_id: i64) -> String {
        format!("{}{}", NOTES_PREFIX, chat_id)
    }

    /// Appends a note. Returns the chat's note count after the append.
    pub async fn append(&self, chat_id: i64, note: &Note) -> Result<u64> {
        let value = serde_json::to_string(note)?;
        self.kv.push(&Self::key(chat_id), &value).await
    }

    /// Returns all notes for a chat, oldest first.
    pub async fn all(&self, chat_id: i64) -> Result<Vec<Note>> {
        let raw = self.kv.list(&Self::key(chat_id)).await?;
        Ok(raw
            .iter()
            .filter_map(|value| match serde_json::from_str::<Note>(value) {
                Ok(note) => Some(note),
                Err(e) => {
                    warn!(error = %e, chat_id, "Skipping unreadable note");
                    None
                }
            })
            .collect())
    }

    /// Returns the last `limit` notes, oldest first.
    pub async fn recent(&self, chat_id: i64, limit: usize) -> Result<Vec<Note>> {
        let mut notes = self.all(chat_id).await?;
        let skip = notes.len().saturating_sub(limit);
        Ok(notes.split_off(skip))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryStore;
    use chrono::{TimeZone, Utc};
    use optimo_models::NoteKind;
    use std::sync::Arc;

    fn note(text: &str, ms: i64) -> Note {
        Note::new(text, NoteKind::Text, Utc.timestamp_millis_opt(ms).unwrap())
    }

    #[tokio::test]
    async fn test_append_never_overwrites() {
        let log = NoteLog::new(Arc::new(MemoryStore::new()));

        assert_eq!(log.append(1, &note("a", 1)).await.unwrap(), 1);
        assert_eq!(log.append(1, &note("b", 2)).await.unwrap(), 2);
        assert_eq!(log.append(1, &note("c", 3)).await.unwrap(), 3);

        let texts: Vec<_> = log
            .all(1)
            .await
            .unwrap()
            .into_iter()
            .map(|n| n.text)
            .collect();
        assert_eq!(texts, vec!["a", "b", "c"]);
    }

    #[tokio::test]
    async fn test_chats_are_isolated() {
        let log = NoteLog::new(Arc::new(MemoryStore::new()));
        log.append(1, &note("mine", 1)).await.unwrap();

        assert!(log.all(2).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_recent() {
        let log = NoteLog::new(Arc::new(MemoryStore::new()));
        for i in 0..5 {
            log.append(1, &note(&format!("n{}", i), i)).await.unwrap();
        }

        let recent = log.recent(1, 2).await.unwrap();
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].text, "n3");
        assert_eq!(recent[1].text, "n4");

        assert_eq!(log.recent(1, 10).await.unwrap().len(), 5);
    }
}
