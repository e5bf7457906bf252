//! Reminder store backed by a sorted set.

use std::time::Duration;

use optimo_models::Reminder;
use tracing::{debug, warn};

use crate::error::Result;
use crate::kv::SharedKv;

/// Sorted set holding all pending reminders (score = due time in ms).
pub const REMINDERS_KEY: &str = "tg:reminders";

/// Prefix for per-reminder delivery leases.
pub const CLAIM_PREFIX: &str = "tg:reminders:claim:";

/// A reminder together with the exact member string it is stored under.
///
/// Removal goes by member, so the original string is kept rather than
/// re-serialized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredReminder {
    pub member: String,
    pub reminder: Reminder,
}

/// Durable, time-ordered collection of pending reminders.
#[derive(Clone)]
pub struct ReminderStore {
    kv: SharedKv,
}

impl ReminderStore {
    /// Creates a store over the given backend.
    pub fn new(kv: SharedKv) -> Self {
        Self { kv }
    }

    fn claim_key(id: &str) -> String {
        format!("{}{}", CLAIM_PREFIX, id)
    }

    /// Persists a new reminder.
    pub async fn add(&self, reminder: &Reminder) -> Result<()> {
        let member = reminder.to_member()?;
        self.kv.zadd(REMINDERS_KEY, reminder.due_ms, &member).await?;
        debug!(id = %reminder.id, chat_id = reminder.chat_id, due_ms = reminder.due_ms, "Reminder stored");
        Ok(())
    }

    /// Returns reminders in `[min_ms, max_ms]`, earliest first.
    ///
    /// Members that don't parse as reminders are logged and dropped from the
    /// set so they can't block every later sweep.
    async fn range(&self, min_ms: i64, max_ms: i64) -> Result<Vec<StoredReminder>> {
        let members = self.kv.zrange_by_score(REMINDERS_KEY, min_ms, max_ms).await?;
        let mut reminders = Vec::with_capacity(members.len());

        for member in members {
            match Reminder::from_member(&member) {
                Ok(reminder) => reminders.push(StoredReminder { member, reminder }),
                Err(e) => {
                    warn!(error = %e, member = %member, "Dropping malformed reminder");
                    self.kv.zrem(REMINDERS_KEY, &member).await?;
                }
            }
        }

        Ok(reminders)
    }

    /// Returns every reminder due at or before `now_ms`.
    pub async fn due(&self, now_ms: i64) -> Result<Vec<StoredReminder>> {
        self.range(i64::MIN, now_ms).await
    }

    /// Returns all pending reminders for one chat, earliest first.
    ///
    /// Scans the whole set; fine for a personal bot, not for many users.
    pub async fn for_chat(&self, chat_id: i64) -> Result<Vec<StoredReminder>> {
        Ok(self
            .range(i64::MIN, i64::MAX)
            .await?
            .into_iter()
            .filter(|r| r.reminder.chat_id == chat_id)
            .collect())
    }

    /// Takes a delivery lease on a reminder.
    ///
    /// Returns `false` if another sweep currently holds it.
    pub async fn claim(&self, reminder: &Reminder, lease: Duration) -> Result<bool> {
        self.kv
            .set_if_absent(&Self::claim_key(&reminder.id), "1", lease)
            .await
    }

    /// Drops a delivery lease so the next sweep can retry.
    pub async fn release(&self, reminder: &Reminder) -> Result<()> {
        self.kv.delete(&Self::claim_key(&reminder.id)).await?;
        Ok(())
    }

    /// Removes a reminder. Returns `true` if it was still pending.
    pub async fn remove(&self, stored: &StoredReminder) -> Result<bool> {
        self.kv.zrem(REMINDERS_KEY, &stored.member).await
    }

    /// Cancels the `index`-th (1-based) pending reminder of a chat.
    pub async fn cancel(&self, chat_id: i64, index: usize) -> Result<Option<Reminder>> {
        let Some(position) = index.checked_sub(1) else {
            return Ok(None);
        };
        let pending = self.for_chat(chat_id).await?;
        let Some(stored) = pending.into_iter().nth(position) else {
            return Ok(None);
        };

        if self.remove(&stored).await? {
            debug!(id = %stored.reminder.id, chat_id, "Reminder cancelled");
            Ok(Some(stored.reminder))
        } else {
            Ok(None)
        }
    }
}
