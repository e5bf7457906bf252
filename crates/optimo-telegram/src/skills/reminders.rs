//! `HH:MM task` reminders.

use std::sync::OnceLock;

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;
use optimo_models::Reminder;
use regex::Regex;
use thiserror::Error;
use tracing::info;

use crate::error::Result;
use crate::messages;
use crate::skills::apologize;
use crate::state::AppState;
use crate::transport::SendOptions;

fn reminder_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(?s)^([0-9]{2}):([0-9]{2})\s+(.+)$").expect("Invalid regex pattern")
    })
}

/// Returns true if `text` has the `HH:MM task` shape (range not checked).
pub fn looks_like_reminder(text: &str) -> bool {
    reminder_pattern().is_match(text)
}

/// Why a reminder message was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ReminderInputError {
    #[error("expected HH:MM task")]
    Format,
    #[error("hour or minute out of range")]
    Time,
}

/// A validated reminder request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedReminder {
    pub hour: u32,
    pub minute: u32,
    pub task: String,
    pub due: DateTime<Utc>,
}

impl ParsedReminder {
    /// `HH:MM` as typed.
    pub fn hhmm(&self) -> String {
        format!("{:02}:{:02}", self.hour, self.minute)
    }
}

/// Parses `HH:MM task` relative to `now` in `tz`.
///
/// The due time is today at `HH:MM:00` local time if that is still ahead of
/// `now`, otherwise the same time tomorrow.
pub fn parse_reminder(
    text: &str,
    now: DateTime<Utc>,
    tz: Tz,
) -> std::result::Result<ParsedReminder, ReminderInputError> {
    let caps = reminder_pattern()
        .captures(text.trim())
        .ok_or(ReminderInputError::Format)?;

    let hour: u32 = caps[1].parse().map_err(|_| ReminderInputError::Format)?;
    let minute: u32 = caps[2].parse().map_err(|_| ReminderInputError::Format)?;
    let task = caps[3].trim().to_string();
    if task.is_empty() {
        return Err(ReminderInputError::Format);
    }

    let time = NaiveTime::from_hms_opt(hour, minute, 0).ok_or(ReminderInputError::Time)?;

    let local_now = now.with_timezone(&tz);
    let today = local_now.date_naive();
    let mut due = resolve_local(tz, today, time).ok_or(ReminderInputError::Time)?;
    if due <= local_now {
        let tomorrow = today.succ_opt().ok_or(ReminderInputError::Time)?;
        due = resolve_local(tz, tomorrow, time).ok_or(ReminderInputError::Time)?;
    }

    Ok(ParsedReminder {
        hour,
        minute,
        task,
        due: due.with_timezone(&Utc),
    })
}

/// Maps a wall-clock time to an instant. Times skipped by a DST jump move
/// forward an hour; ambiguous times take the earlier instant.
fn resolve_local(tz: Tz, date: NaiveDate, time: NaiveTime) -> Option<DateTime<Tz>> {
    let naive = date.and_time(time);
    tz.from_local_datetime(&naive)
        .earliest()
        .or_else(|| tz.from_local_datetime(&(naive + Duration::hours(1))).earliest())
}

/// Handles a message routed to the reminders skill.
pub async fn handle(state: &AppState, chat_id: i64, text: &str) -> Result<()> {
    let parsed = match parse_reminder(text, Utc::now(), state.settings.timezone) {
        Ok(parsed) => parsed,
        Err(ReminderInputError::Format) => {
            state
                .transport
                .send_message(chat_id, messages::INVALID_FORMAT, SendOptions::html())
                .await?;
            return Ok(());
        }
        Err(ReminderInputError::Time) => {
            state
                .transport
                .send_message(chat_id, messages::INVALID_TIME, SendOptions::plain())
                .await?;
            return Ok(());
        }
    };

    let reminder = Reminder::new(chat_id, parsed.task.clone(), parsed.due.timestamp_millis());
    if let Err(e) = state.reminders.add(&reminder).await {
        apologize(state, chat_id, messages::STORE_FAILED).await;
        return Err(e.into());
    }
    info!(chat_id, id = %reminder.id, due = %parsed.due, "Reminder scheduled");

    state
        .transport
        .send_message(
            chat_id,
            &messages::reminder_saved(&parsed.hhmm(), &parsed.task),
            SendOptions::plain(),
        )
        .await
}

/// `/reminders`: numbered list of pending reminders, earliest first.
pub async fn list(state: &AppState, chat_id: i64) -> Result<()> {
    let pending = state.reminders.for_chat(chat_id).await?;

    let text = if pending.is_empty() {
        "No pending reminders.".to_string()
    } else {
        let tz = state.settings.timezone;
        let lines: Vec<String> = pending
            .iter()
            .enumerate()
            .map(|(i, stored)| {
                let when = stored
                    .reminder
                    .due_at()
                    .map(|t| t.with_timezone(&tz).format("%a %d %b %H:%M").to_string())
                    .unwrap_or_else(|| "?".to_string());
                format!("{}. {}: {}", i + 1, when, stored.reminder.task)
            })
            .collect();
        format!(
            "⏰ Pending reminders:\n{}\n\nCancel one with /cancel <n>",
            lines.join("\n")
        )
    };

    state
        .transport
        .send_message(chat_id, &text, SendOptions::plain())
        .await
}

/// `/cancel <n>`: removes the n-th pending reminder.
pub async fn cancel(state: &AppState, chat_id: i64, arg: &str) -> Result<()> {
    let text = match arg.trim().parse::<usize>() {
        Err(_) => "Usage: /cancel <n> (numbers from /reminders)".to_string(),
        Ok(n) => match state.reminders.cancel(chat_id, n).await? {
            Some(reminder) => format!("🗑️ Reminder cancelled: {}", reminder.task),
            None => format!("No reminder number {}.", n),
        },
    };

    state
        .transport
        .send_message(chat_id, &text, SendOptions::plain())
        .await
}
