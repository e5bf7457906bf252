//! Backend selection.

use std::path::PathBuf;
use std::sync::Arc;

use tracing::info;

use crate::error::Result;
use crate::file::FileStore;
use crate::kv::SharedKv;
use crate::memory::MemoryStore;
use crate::upstash::UpstashStore;

/// Which key-value backend to run against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreBackend {
    /// Volatile, process-local.
    Memory,
    /// JSON snapshot under a directory.
    File { dir: PathBuf },
    /// Upstash Redis REST.
    Upstash { url: String, token: String },
}

impl StoreBackend {
    /// Short name for logs.
    pub fn name(&self) -> &'static str {
        match self {
            StoreBackend::Memory => "memory",
            StoreBackend::File { .. } => "file",
            StoreBackend::Upstash { .. } => "upstash",
        }
    }

    /// Opens the backend. Remote backends reuse `client`.
    pub fn open(&self, client: reqwest::Client) -> Result<SharedKv> {
        let kv: SharedKv = match self {
            StoreBackend::Memory => Arc::new(MemoryStore::new()),
            StoreBackend::File { dir } => Arc::new(FileStore::open(dir)?),
            StoreBackend::Upstash { url, token } => {
                Arc::new(UpstashStore::with_client(client, url, token))
            }
        };
        info!(backend = kv.name(), "Key-value store ready");
        Ok(kv)
    }
}
