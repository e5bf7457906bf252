//! Core data models for Optimo.
//!
//! This crate provides the data types shared by the store and the bot:
//! reminders, notes, the per-chat mode hint, and the inbound Telegram
//! update envelope.

pub mod mode;
pub mod note;
pub mod reminder;
pub mod update;

// Re-export main types
pub use mode::ChatMode;
pub use note::{Note, NoteKind};
pub use reminder::Reminder;
pub use update::{CallbackMessage, CallbackQuery, Chat, InboundMessage, Update, Voice};
