//! KvStore trait definition for storage backends.
//!
//! The capability set mirrors the small slice of Redis the bot needs: plain
//! string keys with optional expiry, append-only lists, and sorted sets
//! scored by an integer. Values are opaque strings; typed access lives in the
//! stores built on top ([`ReminderStore`](crate::ReminderStore),
//! [`NoteLog`](crate::NoteLog), [`ModeStore`](crate::ModeStore)).

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::error::Result;

/// Trait for key-value storage backends.
///
/// All operations are async so local and remote backends share one
/// interface. Implementations must be safe to share across concurrent
/// webhook handlers.
#[async_trait]
pub trait KvStore: Send + Sync {
    /// Short backend name for logs.
    fn name(&self) -> &'static str;

    /// Get a string value. Expired keys read as `None`.
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Set a string value, replacing any previous one.
    ///
    /// With `ttl`, the key expires after that duration.
    async fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> Result<()>;

    /// Set a string value only if the key is absent (or expired).
    ///
    /// Returns `true` if this call wrote the value.
    async fn set_if_absent(&self, key: &str, value: &str, ttl: Duration) -> Result<bool>;

    /// Delete a key of any type. Returns `true` if something was removed.
    async fn delete(&self, key: &str) -> Result<bool>;

    /// Append a value to the list at `key`. Returns the new length.
    async fn push(&self, key: &str, value: &str) -> Result<u64>;

    /// Return the whole list at `key`, oldest first.
    async fn list(&self, key: &str) -> Result<Vec<String>>;

    /// Add `member` to the sorted set at `key` with `score`.
    ///
    /// Re-adding an existing member updates its score.
    async fn zadd(&self, key: &str, score: i64, member: &str) -> Result<()>;

    /// Return members with `min <= score <= max`, lowest score first.
    async fn zrange_by_score(&self, key: &str, min: i64, max: i64) -> Result<Vec<String>>;

    /// Remove `member` from the sorted set. Returns `true` if it was present.
    async fn zrem(&self, key: &str, member: &str) -> Result<bool>;
}

/// Shared, type-erased store handle.
pub type SharedKv = Arc<dyn KvStore>;
