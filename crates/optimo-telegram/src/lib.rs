//! Optimo Telegram bot.
//!
//! A webhook bot with three skills:
//!
//! - **Reminders**: `HH:MM task`, delivered by a cron-triggered sweep
//! - **Notes**: text, or voice transcribed to text
//! - **Decisions**: short advice from a chat completion model
//!
//! # Routes
//!
//! - `POST /webhook`: Telegram updates; always answered with `{"ok": true}`
//! - `GET|POST /cron`: one reminder sweep
//! - `GET /health`: liveness
//!
//! Reminders are only as punctual as whatever calls `/cron` (or the
//! `--sweep-interval` loop): a 5-minute cron delivers up to 5 minutes late.
//!
//! # Usage
//!
//! ```bash
//! TELEGRAM_BOT_TOKEN=... OPENAI_API_KEY=... ASSEMBLYAI_API_KEY=... \
//!   WEBHOOK_URL=https://bot.example.com cargo run -p optimo-telegram
//! ```

pub mod bot;
pub mod error;
pub mod handlers;
pub mod messages;
pub mod server;
pub mod skills;
pub mod state;
pub mod sweeper;
pub mod transport;

#[cfg(test)]
mod testing;

pub use bot::{OptimoBot, RunOptions};
pub use error::{ApiError, BotError, Result};
pub use handlers::{handle_update, Command, Dispatch};
pub use server::create_router;
pub use state::{AppState, ServerSettings};
pub use sweeper::{SweepReport, Sweeper};
pub use transport::{ChatTransport, SendOptions, TeloxideTransport};
