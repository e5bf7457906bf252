//! User-facing texts and the main menu.

use optimo_models::ChatMode;
use teloxide::types::{InlineKeyboardButton, InlineKeyboardMarkup};

pub const MENU: &str = "Hi! I'm Optimo 🤖. Choose a mode:";

pub const UNKNOWN_COMMAND: &str = "Unknown command. Type /help to see what I can do.";

pub const REMINDER_PROMPT: &str = "⏰ Send your reminder in this format:\n`HH:MM Task`";
pub const NOTES_PROMPT: &str = "📝 Send me a note (text or voice).";
pub const DECISIONS_PROMPT: &str = "⚖️ Describe your decision question:";

pub const INVALID_FORMAT: &str = "❌ Invalid format. Use <code>HH:MM Task</code>";
pub const INVALID_TIME: &str = "❌ Invalid time. Use 24h HH:MM.";

pub const THINKING: &str = "🤔 Thinking about your decision...";
pub const NO_ADVICE: &str = "No advice available.";
pub const ADVICE_FAILED: &str = "❌ Sorry, I couldn’t generate advice at the moment.";

pub const TRANSCRIBING: &str = "🎤 Transcribing your voice note...";
pub const TRANSCRIPTION_FAILED: &str = "❌ Transcription failed. Please try again.";

pub const STORE_FAILED: &str = "❌ Sorry, something went wrong saving that. Please try again.";

/// System prompt for decision advice.
pub const DECISION_SYSTEM_PROMPT: &str = "You are a concise decision-making assistant. \
     Provide clear, balanced advice (2–3 short paragraphs).";

/// Prompt sent after a mode is picked from the menu.
pub fn prompt_for(mode: ChatMode) -> &'static str {
    match mode {
        ChatMode::Reminder => REMINDER_PROMPT,
        ChatMode::Notes => NOTES_PROMPT,
        ChatMode::Decisions => DECISIONS_PROMPT,
    }
}

/// One button per mode, callback data = mode name.
pub fn menu_keyboard() -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![ChatMode::ALL
        .iter()
        .map(|mode| InlineKeyboardButton::callback(mode.label(), mode.as_str()))
        .collect::<Vec<_>>()])
}

pub fn reminder_saved(hhmm: &str, task: &str) -> String {
    format!("✅ Reminder saved for {}: {}", hhmm, task)
}

pub fn reminder_delivery(task: &str) -> String {
    format!("⏰ Reminder: {}", task)
}

pub fn decision_advice(advice: &str) -> String {
    format!("🧠 Decision advice:\n\n{}", advice)
}

pub fn text_note_saved(text: &str) -> String {
    format!("📝 Text note saved:\n{}", text)
}

pub fn voice_note_saved(text: &str) -> String {
    format!("📝 Voice note saved:\n{}", text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use teloxide::types::InlineKeyboardButtonKind;

    #[test]
    fn test_menu_keyboard_has_one_button_per_mode() {
        let kb = menu_keyboard();
        assert_eq!(kb.inline_keyboard.len(), 1);

        let data: Vec<_> = kb.inline_keyboard[0]
            .iter()
            .map(|b| match &b.kind {
                InlineKeyboardButtonKind::CallbackData(d) => d.clone(),
                other => panic!("unexpected button kind: {:?}", other),
            })
            .collect();
        assert_eq!(data, vec!["reminder", "notes", "decisions"]);
    }

    #[test]
    fn test_prompts() {
        assert!(prompt_for(ChatMode::Reminder).contains("HH:MM Task"));
        assert!(prompt_for(ChatMode::Notes).contains("text or voice"));
        assert_eq!(reminder_delivery("buy milk"), "⏰ Reminder: buy milk");
    }
}
