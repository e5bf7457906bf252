//! Update routing.
//!
//! Classification order for one inbound update:
//!
//! 1. slash command: direct reply
//! 2. button callback: set the chat mode, send its prompt, acknowledge
//! 3. message: voice is always a note; otherwise the stored mode, or a mode
//!    inferred from the text, picks the skill
//! 4. anything else: the main menu

use teloxide::utils::command::BotCommands;
use tracing::{debug, info, warn};

use optimo_models::{CallbackQuery, ChatMode, InboundMessage, Update};

use crate::error::Result;
use crate::messages;
use crate::skills::{decisions, notes, reminders};
use crate::state::AppState;
use crate::transport::SendOptions;

/// Bot commands that can be invoked with /.
#[derive(BotCommands, Clone, Debug, PartialEq, Eq)]
#[command(rename_rule = "lowercase", description = "Available commands:")]
pub enum Command {
    #[command(description = "Show the main menu")]
    Start,

    #[command(description = "Show the main menu")]
    Menu,

    #[command(description = "Show this help message")]
    Help,

    #[command(description = "List pending reminders")]
    Reminders,

    #[command(description = "Cancel a reminder: /cancel <n>")]
    Cancel(String),

    #[command(description = "Show your last 10 notes")]
    Notes,
}

/// What the router did with an update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatch {
    /// Nothing recognizable; no reply.
    Ignored,
    /// A slash command (known or not) was answered.
    Command,
    /// A button press was handled.
    Callback,
    /// Routed to a skill.
    Skill(ChatMode),
    /// The main menu was shown.
    Menu,
}

/// Picks a skill for free text when no mode is stored.
pub fn infer_mode(text: &str) -> ChatMode {
    if reminders::looks_like_reminder(text) {
        ChatMode::Reminder
    } else if text.contains('?') {
        ChatMode::Decisions
    } else {
        ChatMode::Notes
    }
}

/// Routes one update. Skill errors are returned after the user was told.
pub async fn handle_update(state: &AppState, update: Update) -> Result<Dispatch> {
    if let Some(msg) = update.message {
        return handle_message(state, msg).await;
    }
    if let Some(callback) = update.callback_query {
        handle_callback(state, callback).await?;
        return Ok(Dispatch::Callback);
    }
    Ok(Dispatch::Ignored)
}

async fn handle_message(state: &AppState, msg: InboundMessage) -> Result<Dispatch> {
    let chat_id = msg.chat_id();

    if let Some(text) = msg.trimmed_text() {
        if text.starts_with('/') {
            handle_command(state, chat_id, text).await?;
            return Ok(Dispatch::Command);
        }
    }

    if let Some(voice) = &msg.voice {
        notes::handle_voice(state, chat_id, &voice.file_id).await?;
        return Ok(Dispatch::Skill(ChatMode::Notes));
    }

    let Some(text) = msg.trimmed_text() else {
        send_menu(state, chat_id).await?;
        return Ok(Dispatch::Menu);
    };

    let stored = match state.modes.get(chat_id).await {
        Ok(mode) => mode,
        Err(e) => {
            warn!(chat_id, error = %e, "Failed to read chat mode, inferring");
            None
        }
    };
    let mode = stored.unwrap_or_else(|| infer_mode(text));
    debug!(chat_id, mode = %mode, stored = stored.is_some(), "Routing message");

    match mode {
        ChatMode::Reminder => reminders::handle(state, chat_id, text).await?,
        ChatMode::Notes => notes::handle_text(state, chat_id, text).await?,
        ChatMode::Decisions => decisions::handle(state, chat_id, text).await?,
    }
    Ok(Dispatch::Skill(mode))
}

async fn handle_command(state: &AppState, chat_id: i64, text: &str) -> Result<()> {
    let command = match Command::parse(text, &state.settings.bot_username) {
        Ok(command) => command,
        Err(e) => {
            debug!(chat_id, text, error = %e, "Unknown command");
            return state
                .transport
                .send_message(chat_id, messages::UNKNOWN_COMMAND, SendOptions::plain())
                .await;
        }
    };

    info!(chat_id, command = ?command, "Command received");
    match command {
        Command::Start | Command::Menu => send_menu(state, chat_id).await,
        Command::Help => {
            state
                .transport
                .send_message(
                    chat_id,
                    &Command::descriptions().to_string(),
                    SendOptions::plain(),
                )
                .await
        }
        Command::Reminders => reminders::list(state, chat_id).await,
        Command::Cancel(arg) => reminders::cancel(state, chat_id, &arg).await,
        Command::Notes => notes::list(state, chat_id).await,
    }
}

async fn handle_callback(state: &AppState, callback: CallbackQuery) -> Result<()> {
    let mode = callback.data.as_deref().and_then(ChatMode::from_callback_data);

    let outcome = match (callback.chat_id(), mode) {
        (Some(chat_id), Some(mode)) => {
            if let Err(e) = state.modes.set(chat_id, mode).await {
                warn!(chat_id, error = %e, "Failed to store chat mode");
            }
            let options = match mode {
                ChatMode::Reminder => SendOptions::markdown(),
                _ => SendOptions::plain(),
            };
            info!(chat_id, mode = %mode, "Mode selected");
            state
                .transport
                .send_message(chat_id, messages::prompt_for(mode), options)
                .await
        }
        (Some(chat_id), None) => {
            debug!(chat_id, data = ?callback.data, "Unknown callback data");
            send_menu(state, chat_id).await
        }
        (None, _) => Ok(()),
    };

    // Always acknowledge, so the client stops its spinner.
    let ack = state.transport.answer_callback(&callback.id, None).await;
    outcome.and(ack)
}

async fn send_menu(state: &AppState, chat_id: i64) -> Result<()> {
    state
        .transport
        .send_message(
            chat_id,
            messages::MENU,
            SendOptions::plain().with_keyboard(messages::menu_keyboard()),
        )
        .await
}
