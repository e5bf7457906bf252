//! Per-chat mode hint.

use serde::{Deserialize, Serialize};

/// The skill a chat last selected from the menu.
///
/// Used to disambiguate the next free-text message. The wire names match the
/// inline keyboard callback data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChatMode {
    /// `HH:MM task` reminders.
    Reminder,
    /// Text and voice notes.
    Notes,
    /// Decision advice.
    Decisions,
}

impl ChatMode {
    /// All modes, in menu order.
    pub const ALL: [ChatMode; 3] = [ChatMode::Reminder, ChatMode::Notes, ChatMode::Decisions];

    /// Returns the callback data / storage name.
    pub fn as_str(&self) -> &'static str {
        match self {
            ChatMode::Reminder => "reminder",
            ChatMode::Notes => "notes",
            ChatMode::Decisions => "decisions",
        }
    }

    /// Returns the button label.
    pub fn label(&self) -> &'static str {
        match self {
            ChatMode::Reminder => "Reminders",
            ChatMode::Notes => "Notes",
            ChatMode::Decisions => "Decisions",
        }
    }

    /// Parses callback data into a mode.
    pub fn from_callback_data(data: &str) -> Option<Self> {
        match data.trim() {
            "reminder" | "reminders" => Some(ChatMode::Reminder),
            "notes" | "note" => Some(ChatMode::Notes),
            "decisions" | "decision" => Some(ChatMode::Decisions),
            _ => None,
        }
    }
}

impl std::fmt::Display for ChatMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
