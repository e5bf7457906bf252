//! Soft-expiring per-chat mode hint.

use std::time::Duration;

use optimo_models::ChatMode;
use tracing::debug;

use crate::error::Result;
use crate::kv::SharedKv;

/// Key prefix for chat modes.
pub const MODE_PREFIX: &str = "tg:mode:";

/// Default lifetime of a selected mode (15 minutes).
pub const DEFAULT_MODE_TTL: Duration = Duration::from_secs(15 * 60);

/// Stores the skill each chat picked from the menu.
///
/// Last write wins; there is no locking between concurrent updates.
#[derive(Clone)]
pub struct ModeStore {
    kv: SharedKv,
    ttl: Duration,
}

impl ModeStore {
    pub fn new(kv: SharedKv, ttl: Duration) -> Self {
        Self { kv, ttl }
    }

    fn key(chat_id: i64) -> String {
        format!("{}{}", MODE_PREFIX, chat_id)
    }

    /// Records the selected mode; it expires after the configured TTL.
    pub async fn set(&self, chat_id: i64, mode: ChatMode) -> Result<()> {
        self.kv
            .set(&Self::key(chat_id), mode.as_str(), Some(self.ttl))
            .await?;
        debug!(chat_id, mode = %mode, "Chat mode set");
        Ok(())
    }

    /// Returns the unexpired mode, if any. Unknown stored values read as none.
    pub async fn get(&self, chat_id: i64) -> Result<Option<ChatMode>> {
        Ok(self
            .kv
            .get(&Self::key(chat_id))
            .await?
            .and_then(|value| ChatMode::from_callback_data(&value)))
    }
}
