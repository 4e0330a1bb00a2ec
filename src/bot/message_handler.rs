//! Message Handler module for processing incoming Telegram messages

use std::sync::Arc;

use anyhow::Result;
use rusqlite::Connection;
use teloxide::prelude::*;
use teloxide::types::ParseMode;
use tokio::sync::Mutex;
use tracing::debug;

use crate::dialogue::{Event, NotaDialogue, NotaDialogueState};

use super::run_event;
use super::ui_builder::main_menu_keyboard;

const WELCOME_MESSAGE: &str = "👋 *BOT MANAJEMEN KEUANGAN*\n*BERKAH DUA PUTRI*\n\n\
    Catat penjualan dan belanja, lengkap dengan nota otomatis.\n\n\
    Perintah:\n\
    /start - tampilkan menu utama\n\
    /batal - batalkan proses berjalan\n\n\
    Silakan pilih menu di bawah:";

async fn handle_text_message(
    bot: &Bot,
    msg: &Message,
    text: &str,
    dialogue: NotaDialogue,
    conn: Arc<Mutex<Connection>>,
) -> Result<()> {
    debug!(user_id = %msg.chat.id, message_length = text.len(), "Received text message from user");

    match text.trim() {
        "/start" => {
            dialogue.update(NotaDialogueState::Idle).await?;
            bot.send_message(msg.chat.id, WELCOME_MESSAGE)
                .parse_mode(ParseMode::Markdown)
                .reply_markup(main_menu_keyboard())
                .await?;
        }
        "/batal" | "/cancel" => {
            dialogue.update(NotaDialogueState::Idle).await?;
            bot.send_message(msg.chat.id, "❌ Proses dibatalkan")
                .reply_markup(main_menu_keyboard())
                .await?;
        }
        trimmed => {
            run_event(
                bot,
                msg.chat.id,
                msg.chat.id.0,
                &dialogue,
                &conn,
                Event::Text(trimmed.to_string()),
            )
            .await?;
        }
    }
    Ok(())
}

async fn handle_unsupported_message(bot: &Bot, msg: &Message) -> Result<()> {
    debug!(user_id = %msg.chat.id, "Received unsupported message type from user");

    bot.send_message(
        msg.chat.id,
        "🤔 Bot ini hanya menerima pesan teks.\n\nKetik /start untuk membuka menu.",
    )
    .await?;
    Ok(())
}

pub async fn message_handler(
    bot: Bot,
    msg: Message,
    conn: Arc<Mutex<Connection>>,
    dialogue: NotaDialogue,
) -> Result<()> {
    if let Some(text) = msg.text() {
        let text = text.to_string();
        handle_text_message(&bot, &msg, &text, dialogue, conn).await?;
    } else {
        handle_unsupported_message(&bot, &msg).await?;
    }

    Ok(())
}
