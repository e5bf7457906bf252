//! In-process key-value backend.
//!
//! [`KvState`] holds the data and implements the Redis-like semantics;
//! [`MemoryStore`] wraps it in a lock for shared use. The file backend reuses
//! the same state type and snapshots it to disk.

use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use crate::error::{PersistenceError, Result};
use crate::kv::KvStore;

/// A string value with an optional absolute expiry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct StringEntry {
    value: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    expires_at_ms: Option<i64>,
}

impl StringEntry {
    fn is_expired(&self, now_ms: i64) -> bool {
        self.expires_at_ms.is_some_and(|at| at <= now_ms)
    }
}

/// One sorted-set member.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub(crate) struct ZEntry {
    score: i64,
    member: String,
}

/// Data for every key, grouped by value type.
///
/// Sorted sets are kept ordered by `(score, member)`, matching Redis' order
/// for equal scores.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub(crate) struct KvState {
    #[serde(default)]
    strings: BTreeMap<String, StringEntry>,
    #[serde(default)]
    lists: BTreeMap<String, Vec<String>>,
    #[serde(default)]
    zsets: BTreeMap<String, Vec<ZEntry>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Kind {
    String,
    List,
    ZSet,
}

pub(crate) fn now_ms() -> i64 {
    Utc::now().timestamp_millis()
}

fn expiry(now_ms: i64, ttl: Duration) -> i64 {
    now_ms.saturating_add(i64::try_from(ttl.as_millis()).unwrap_or(i64::MAX))
}

impl KvState {
    /// Drops every expired string, not just the key being touched.
    fn purge_expired(&mut self, now_ms: i64) {
        self.strings.retain(|_, e| !e.is_expired(now_ms));
    }

    fn kind_of(&self, key: &str) -> Option<Kind> {
        if self.strings.contains_key(key) {
            Some(Kind::String)
        } else if self.lists.contains_key(key) {
            Some(Kind::List)
        } else if self.zsets.contains_key(key) {
            Some(Kind::ZSet)
        } else {
            None
        }
    }

    fn expect_kind(&mut self, key: &str, kind: Kind, now_ms: i64) -> Result<()> {
        self.purge_expired(now_ms);
        match self.kind_of(key) {
            Some(found) if found != kind => Err(PersistenceError::WrongType(key.to_string())),
            _ => Ok(()),
        }
    }

    pub(crate) fn get(&mut self, key: &str, now_ms: i64) -> Result<Option<String>> {
        self.expect_kind(key, Kind::String, now_ms)?;
        Ok(self.strings.get(key).map(|e| e.value.clone()))
    }

    pub(crate) fn set(&mut self, key: &str, value: &str, ttl: Option<Duration>, now_ms: i64) {
        self.purge_expired(now_ms);
        // SET overwrites keys of any type
        self.lists.remove(key);
        self.zsets.remove(key);
        self.strings.insert(
            key.to_string(),
            StringEntry {
                value: value.to_string(),
                expires_at_ms: ttl.map(|ttl| expiry(now_ms, ttl)),
            },
        );
    }

    pub(crate) fn set_if_absent(
        &mut self,
        key: &str,
        value: &str,
        ttl: Duration,
        now_ms: i64,
    ) -> bool {
        self.purge_expired(now_ms);
        if self.kind_of(key).is_some() {
            return false;
        }
        self.set(key, value, Some(ttl), now_ms);
        true
    }

    pub(crate) fn delete(&mut self, key: &str, now_ms: i64) -> bool {
        self.purge_expired(now_ms);
        let removed_string = self.strings.remove(key).is_some();
        let removed_list = self.lists.remove(key).is_some();
        let removed_zset = self.zsets.remove(key).is_some();
        removed_string || removed_list || removed_zset
    }

    pub(crate) fn push(&mut self, key: &str, value: &str, now_ms: i64) -> Result<u64> {
        self.expect_kind(key, Kind::List, now_ms)?;
        let list = self.lists.entry(key.to_string()).or_default();
        list.push(value.to_string());
        Ok(list.len() as u64)
    }

    pub(crate) fn list(&mut self, key: &str, now_ms: i64) -> Result<Vec<String>> {
        self.expect_kind(key, Kind::List, now_ms)?;
        Ok(self.lists.get(key).cloned().unwrap_or_default())
    }

    pub(crate) fn zadd(&mut self, key: &str, score: i64, member: &str, now_ms: i64) -> Result<()> {
        self.expect_kind(key, Kind::ZSet, now_ms)?;
        let set = self.zsets.entry(key.to_string()).or_default();
        set.retain(|e| e.member != member);
        let entry = ZEntry {
            score,
            member: member.to_string(),
        };
        let pos = set.binary_search(&entry).unwrap_or_else(|pos| pos);
        set.insert(pos, entry);
        Ok(())
    }

    pub(crate) fn zrange_by_score(
        &mut self,
        key: &str,
        min: i64,
        max: i64,
        now_ms: i64,
    ) -> Result<Vec<String>> {
        self.expect_kind(key, Kind::ZSet, now_ms)?;
        Ok(self
            .zsets
            .get(key)
            .map(|set| {
                set.iter()
                    .filter(|e| e.score >= min && e.score <= max)
                    .map(|e| e.member.clone())
                    .collect()
            })
            .unwrap_or_default())
    }

    pub(crate) fn zrem(&mut self, key: &str, member: &str, now_ms: i64) -> Result<bool> {
        self.expect_kind(key, Kind::ZSet, now_ms)?;
        let Some(set) = self.zsets.get_mut(key) else {
            return Ok(false);
        };
        let before = set.len();
        set.retain(|e| e.member != member);
        let removed = set.len() != before;
        if set.is_empty() {
            self.zsets.remove(key);
        }
        Ok(removed)
    }
}

/// Volatile in-memory store.
///
/// Data lives as long as the process. Useful for tests and local runs;
/// reminders stored here do not survive a restart.
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: RwLock<KvState>,
}

impl MemoryStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KvStore for MemoryStore {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn get(&self, key: &str) -> Result<Option<String>> {
        self.state.write().await.get(key, now_ms())
    }

    async fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> Result<()> {
        self.state.write().await.set(key, value, ttl, now_ms());
        Ok(())
    }

    async fn set_if_absent(&self, key: &str, value: &str, ttl: Duration) -> Result<bool> {
        Ok(self
            .state
            .write()
            .await
            .set_if_absent(key, value, ttl, now_ms()))
    }

    async fn delete(&self, key: &str) -> Result<bool> {
        Ok(self.state.write().await.delete(key, now_ms()))
    }

    async fn push(&self, key: &str, value: &str) -> Result<u64> {
        self.state.write().await.push(key, value, now_ms())
    }

    async fn list(&self, key: &str) -> Result<Vec<String>> {
        self.state.write().await.list(key, now_ms())
    }

    async fn zadd(&self, key: &str, score: i64, member: &str) -> Result<()> {
        self.state.write().await.zadd(key, score, member, now_ms())
    }

    async fn zrange_by_score(&self, key: &str, min: i64, max: i64) -> Result<Vec<String>> {
        self.state
            .write()
            .await
            .zrange_by_score(key, min, max, now_ms())
    }

    async fn zrem(&self, key: &str, member: &str) -> Result<bool> {
        self.state.write().await.zrem(key, member, now_ms())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_get_set() {
        let store = MemoryStore::new();

        assert_eq!(store.get("k").await.unwrap(), None);
        store.set("k", "v1", None).await.unwrap();
        store.set("k", "v2", None).await.unwrap();
        assert_eq!(store.get("k").await.unwrap(), Some("v2".to_string()));
    }

    #[test]
    fn test_expired_key_reads_as_none() {
        let mut state = KvState::default();
        state.set("k", "v", Some(Duration::from_secs(10)), 1_000);

        assert_eq!(state.get("k", 10_999).unwrap(), Some("v".to_string()));
        assert_eq!(state.get("k", 11_000).unwrap(), None);
    }

    #[test]
    fn test_set_if_absent_respects_expiry() {
        let mut state = KvState::default();

        assert!(state.set_if_absent("lease", "a", Duration::from_secs(1), 0));
        assert!(!state.set_if_absent("lease", "b", Duration::from_secs(1), 500));
        assert!(state.set_if_absent("lease", "c", Duration::from_secs(1), 1_000));
        assert_eq!(state.get("lease", 1_000).unwrap(), Some("c".to_string()));
    }

    #[test]
    fn test_writes_purge_unrelated_expired_keys() {
        let mut state = KvState::default();
        state.set_if_absent("lease:a", "1", Duration::from_millis(10), 0);
        state.set_if_absent("lease:b", "1", Duration::from_millis(10), 0);
        state.set("mode", "notes", Some(Duration::from_secs(60)), 0);

        state.zadd("reminders", 5, "r1", 20).unwrap();

        assert_eq!(state.strings.keys().collect::<Vec<_>>(), vec!["mode"]);
    }

    #[tokio::test]
    async fn test_delete() {
        let store = MemoryStore::new();
        store.set("k", "v", None).await.unwrap();

        assert!(store.delete("k").await.unwrap());
        assert!(!store.delete("k").await.unwrap());
    }

    #[tokio::test]
    async fn test_list_append_order() {
        let store = MemoryStore::new();

        assert_eq!(store.push("l", "a").await.unwrap(), 1);
        assert_eq!(store.push("l", "b").await.unwrap(), 2);
        assert_eq!(store.push("l", "c").await.unwrap(), 3);

        assert_eq!(store.list("l").await.unwrap(), vec!["a", "b", "c"]);
        assert!(store.list("missing").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_zrange_orders_by_score() {
        let store = MemoryStore::new();
        store.zadd("z", 30, "c").await.unwrap();
        store.zadd("z", 10, "a").await.unwrap();
        store.zadd("z", 20, "b").await.unwrap();

        assert_eq!(
            store.zrange_by_score("z", 0, 25).await.unwrap(),
            vec!["a", "b"]
        );
        assert_eq!(
            store.zrange_by_score("z", i64::MIN, i64::MAX).await.unwrap(),
            vec!["a", "b", "c"]
        );
    }

    #[tokio::test]
    async fn test_zadd_existing_member_updates_score() {
        let store = MemoryStore::new();
        store.zadd("z", 10, "a").await.unwrap();
        store.zadd("z", 50, "a").await.unwrap();

        assert!(store.zrange_by_score("z", 0, 20).await.unwrap().is_empty());
        assert_eq!(store.zrange_by_score("z", 0, 50).await.unwrap(), vec!["a"]);
    }

    #[tokio::test]
    async fn test_zrem() {
        let store = MemoryStore::new();
        store.zadd("z", 1, "a").await.unwrap();

        assert!(store.zrem("z", "a").await.unwrap());
        assert!(!store.zrem("z", "a").await.unwrap());
        assert!(!store.zrem("missing", "a").await.unwrap());
    }

    #[tokio::test]
    async fn test_wrong_type() {
        let store = MemoryStore::new();
        store.set("k", "v", None).await.unwrap();

        let result = store.push("k", "x").await;
        assert!(matches!(result, Err(PersistenceError::WrongType(_))));
    }
}
