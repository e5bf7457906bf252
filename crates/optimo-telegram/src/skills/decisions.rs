//! Decision advice via the completion service.

use tracing::{info, warn};

use crate::error::Result;
use crate::messages;
use crate::skills::apologize;
use crate::state::AppState;
use crate::transport::SendOptions;

/// Asks the completion service about `question` and relays the advice.
pub async fn handle(state: &AppState, chat_id: i64, question: &str) -> Result<()> {
    state
        .transport
        .send_message(chat_id, messages::THINKING, SendOptions::plain())
        .await?;

    let advice = match state
        .completion
        .complete(messages::DECISION_SYSTEM_PROMPT, question)
        .await
    {
        Ok(advice) => advice,
        Err(e) => {
            warn!(chat_id, error = %e, "Decision advice failed");
            apologize(state, chat_id, messages::ADVICE_FAILED).await;
            return Err(e.into());
        }
    };

    let advice = if advice.trim().is_empty() {
        messages::NO_ADVICE
    } else {
        advice.trim()
    };
    info!(chat_id, chars = advice.len(), "Decision advice sent");

    state
        .transport
        .send_message(chat_id, &messages::decision_advice(advice), SendOptions::plain())
        .await
}
