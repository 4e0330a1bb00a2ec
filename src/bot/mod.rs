//! Bot module for handling Telegram interactions
//!
//! This module is split into several submodules for better organization:
//! - `message_handler`: Handles incoming text messages and commands
//! - `callback_handler`: Handles inline keyboard callback queries
//! - `ui_builder`: Creates the inline keyboards

pub mod callback_handler;
pub mod message_handler;
pub mod ui_builder;

// Re-export main handler functions for use in main.rs
pub use callback_handler::callback_handler;
pub use message_handler::message_handler;

use std::sync::Arc;

use anyhow::Result;
use rusqlite::Connection;
use teloxide::prelude::*;
use teloxide::types::ParseMode;
use tokio::sync::Mutex;
use tracing::{error, info};

use crate::dialogue::{advance, Effect, Event, NotaDialogue};
use crate::error::NotaError;
use crate::finalize::finalize_receipt;
use self::ui_builder::keyboard_for;

/// Feed one event through the state machine, send the resulting reply and
/// run the resulting effect, then store the next state.
pub(crate) async fn run_event(
    bot: &Bot,
    chat_id: ChatId,
    user_id: i64,
    dialogue: &NotaDialogue,
    conn: &Arc<Mutex<Connection>>,
    event: Event,
) -> Result<()> {
    let state = dialogue.get().await?.unwrap_or_default();
    let step = advance(state, event);

    if let Some(Effect::Finalize { draft, paid }) = step.effect {
        let number = draft.number.clone();
        match finalize_receipt(conn, user_id, draft, paid).await {
            Ok(text) => {
                info!(user_id, number = %number, "Receipt finalized");
                bot.send_message(chat_id, text)
                    .parse_mode(ParseMode::Markdown)
                    .await?;
            }
            Err(NotaError::Render(reason)) => {
                // Already persisted at this point
                error!(user_id, %reason, "Receipt stored but rendering failed");
                bot.send_message(chat_id, "⚠️ Nota tersimpan, tetapi gagal menampilkan nota.")
                    .await?;
            }
            Err(e) => {
                error!(user_id, error = %e, "Receipt finalization failed");
                bot.send_message(
                    chat_id,
                    "❌ Gagal menyimpan nota! Silakan mulai ulang dengan /start.",
                )
                .await?;
            }
        }
    }

    if let Some(prompt) = step.reply {
        let mut request = bot
            .send_message(chat_id, prompt.text)
            .parse_mode(ParseMode::Markdown);
        if let Some(menu) = &prompt.menu {
            request = request.reply_markup(keyboard_for(menu));
        }
        request.await?;
    }

    dialogue.update(step.next).await?;
    Ok(())
}
