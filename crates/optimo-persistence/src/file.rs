//! Single-file JSON backend.
//!
//! The whole key space is kept in memory and snapshotted to one JSON file
//! after every mutation using an atomic write, so reminders survive restarts
//! of a single-instance deployment without an external store:
//! ```text
//! state_dir/
//! └── store/
//!     └── kv.json
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::atomic::{atomic_write, read_json_optional};
use crate::error::{PersistenceError, Result};
use crate::kv::KvStore;
use crate::memory::{now_ms, KvState};

/// File name of the snapshot inside the store directory.
pub const SNAPSHOT_FILE: &str = "kv.json";

/// Key-value store persisted to a JSON snapshot.
///
/// Only one process may own a snapshot file; concurrent writers from
/// different processes would overwrite each other.
pub struct FileStore {
    path: PathBuf,
    state: Mutex<KvState>,
}

impl FileStore {
    /// Opens (or creates) the store under `dir`.
    pub fn open(dir: impl AsRef<Path>) -> Result<Self> {
        let path = dir.as_ref().join(SNAPSHOT_FILE);
        let state: KvState = read_json_optional(&path)?.unwrap_or_default();
        info!(path = %path.display(), "Opened file store");
        Ok(Self {
            path,
            state: Mutex::new(state),
        })
    }

    /// Path of the snapshot file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Runs `op` on a copy of the state and keeps the copy only if its
    /// snapshot was written. `op` reports whether it changed anything.
    async fn update<T>(&self, op: impl FnOnce(&mut KvState) -> Result<(T, bool)>) -> Result<T> {
        let mut state = self.state.lock().await;
        let mut next = state.clone();
        let (output, changed) = op(&mut next)?;
        if changed {
            self.persist(&next).await?;
        }
        *state = next;
        Ok(output)
    }

    async fn persist(&self, state: &KvState) -> Result<()> {
        let data = serde_json::to_vec(state)?;
        let path = self.path.clone();
        tokio::task::spawn_blocking(move || atomic_write(&path, &data))
            .await
            .map_err(|e| PersistenceError::WriteError {
                path: self.path.clone(),
                source: std::io::Error::other(e),
            })??;
        debug!(path = %self.path.display(), "Saved store snapshot");
        Ok(())
    }
}

#[async_trait]
impl KvStore for FileStore {
    fn name(&self) -> &'static str {
        "file"
    }

    async fn get(&self, key: &str) -> Result<Option<String>> {
        self.state.lock().await.get(key, now_ms())
    }

    async fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> Result<()> {
        self.update(|state| {
            state.set(key, value, ttl, now_ms());
            Ok(((), true))
        })
        .await
    }

    async fn set_if_absent(&self, key: &str, value: &str, ttl: Duration) -> Result<bool> {
        self.update(|state| {
            let written = state.set_if_absent(key, value, ttl, now_ms());
            Ok((written, written))
        })
        .await
    }

    async fn delete(&self, key: &str) -> Result<bool> {
        self.update(|state| {
            let removed = state.delete(key, now_ms());
            Ok((removed, removed))
        })
        .await
    }

    async fn push(&self, key: &str, value: &str) -> Result<u64> {
        self.update(|state| Ok((state.push(key, value, now_ms())?, true)))
            .await
    }

    async fn list(&self, key: &str) -> Result<Vec<String>> {
        self.state.lock().await.list(key, now_ms())
    }

    async fn zadd(&self, key: &str, score: i64, member: &str) -> Result<()> {
        self.update(|state| Ok((state.zadd(key, score, member, now_ms())?, true)))
            .await
    }

    async fn zrange_by_score(&self, key: &str, min: i64, max: i64) -> Result<Vec<String>> {
        self.state
            .lock()
            .await
            .zrange_by_score(key, min, max, now_ms())
    }

    async fn zrem(&self, key: &str, member: &str) -> Result<bool> {
        self.update(|state| {
            let removed = state.zrem(key, member, now_ms())?;
            Ok((removed, removed))
        })
        .await
    }
}
