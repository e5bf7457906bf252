//! Skill handlers: reminders, notes and decisions.
//!
//! Each handler replies through the chat transport. On an external-service
//! failure it sends the user an apology and returns the error so the router
//! can log it.

pub mod decisions;
pub mod notes;
pub mod reminders;

use tracing::warn;

use crate::state::AppState;
use crate::transport::SendOptions;

/// Best-effort apology; a failed send is only logged.
pub(crate) async fn apologize(state: &AppState, chat_id: i64, text: &str) {
    if let Err(e) = state
        .transport
        .send_message(chat_id, text, SendOptions::plain())
        .await
    {
        warn!(chat_id, error = %e, "Failed to send apology");
    }
}
