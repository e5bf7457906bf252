//! Text and voice notes.

use optimo_models::{Note, NoteKind};
use tracing::{info, warn};

use crate::error::Result;
use crate::messages;
use crate::skills::apologize;
use crate::state::AppState;
use crate::transport::SendOptions;

/// How many notes `/notes` shows.
pub const RECENT_NOTES: usize = 10;

/// Saves a text note and echoes it back.
pub async fn handle_text(state: &AppState, chat_id: i64, text: &str) -> Result<()> {
    if let Err(e) = state.notes.append(chat_id, &Note::text(text)).await {
        apologize(state, chat_id, messages::STORE_FAILED).await;
        return Err(e.into());
    }
    info!(chat_id, kind = "text", "Note saved");

    state
        .transport
        .send_message(chat_id, &messages::text_note_saved(text), SendOptions::plain())
        .await
}

/// Transcribes a voice message and saves the transcript.
///
/// Nothing is stored unless transcription produced text.
pub async fn handle_voice(state: &AppState, chat_id: i64, file_id: &str) -> Result<()> {
    let audio_url = match state.transport.file_url(file_id).await {
        Ok(url) => url,
        Err(e) => {
            apologize(state, chat_id, messages::TRANSCRIPTION_FAILED).await;
            return Err(e);
        }
    };

    state
        .transport
        .send_message(chat_id, messages::TRANSCRIBING, SendOptions::plain())
        .await?;

    let transcript = match state.transcriber.transcribe(&audio_url).await {
        Ok(text) => text,
        Err(e) => {
            warn!(chat_id, error = %e, "Voice note transcription failed");
            apologize(state, chat_id, messages::TRANSCRIPTION_FAILED).await;
            return Err(e.into());
        }
    };

    if let Err(e) = state.notes.append(chat_id, &Note::voice(&transcript)).await {
        apologize(state, chat_id, messages::STORE_FAILED).await;
        return Err(e.into());
    }
    info!(chat_id, kind = "voice", chars = transcript.len(), "Note saved");

    state
        .transport
        .send_message(
            chat_id,
            &messages::voice_note_saved(&transcript),
            SendOptions::plain(),
        )
        .await
}

/// `/notes`: the chat's most recent notes, oldest first.
pub async fn list(state: &AppState, chat_id: i64) -> Result<()> {
    let notes = state.notes.recent(chat_id, RECENT_NOTES).await?;

    let text = if notes.is_empty() {
        "No notes yet. Pick Notes from /start and send one.".to_string()
    } else {
        let tz = state.settings.timezone;
        let entries: Vec<String> = notes
            .iter()
            .enumerate()
            .map(|(i, note)| {
                let icon = match note.kind {
                    NoteKind::Text => "📝",
                    NoteKind::Voice => "🎤",
                };
                format!(
                    "{}. {} {}\n{}",
                    i + 1,
                    icon,
                    note.timestamp.with_timezone(&tz).format("%d %b %H:%M"),
                    note.text
                )
            })
            .collect();
        format!("📒 Your last {} notes:\n\n{}", notes.len(), entries.join("\n\n"))
    };

    state
        .transport
        .send_message(chat_id, &text, SendOptions::plain())
        .await
}
