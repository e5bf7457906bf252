//! Persistence layer for Optimo.
//!
//! This crate provides a small Redis-shaped [`KvStore`] interface with three
//! backends (in-memory, crash-safe JSON file, Upstash Redis REST), and the
//! typed stores the bot builds on it:
//!
//! - [`ReminderStore`]: pending reminders in a sorted set scored by due time,
//!   with per-reminder delivery leases
//! - [`NoteLog`]: append-only per-chat notes
//! - [`ModeStore`]: per-chat menu selection with a soft expiry
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use optimo_models::Reminder;
//! use optimo_persistence::{MemoryStore, ReminderStore, SharedKv};
//!
//! # async fn run() -> optimo_persistence::Result<()> {
//! let kv: SharedKv = Arc::new(MemoryStore::new());
//! let reminders = ReminderStore::new(kv);
//!
//! reminders.add(&Reminder::new(42, "buy milk", 1_700_000_000_000)).await?;
//! let due = reminders.due(1_700_000_000_000).await?;
//! assert_eq!(due.len(), 1);
//! # Ok(())
//! # }
//! ```

pub mod atomic;
pub mod backend;
pub mod error;
pub mod file;
pub mod kv;
pub mod memory;
pub mod modes;
pub mod notes;
pub mod reminders;
pub mod upstash;

pub use backend::StoreBackend;
pub use error::{PersistenceError, Result};
pub use file::FileStore;
pub use kv::{KvStore, SharedKv};
pub use memory::MemoryStore;
pub use modes::{ModeStore, DEFAULT_MODE_TTL};
pub use notes::NoteLog;
pub use reminders::{ReminderStore, StoredReminder, REMINDERS_KEY};
pub use upstash::UpstashStore;
