//! Callback Handler module for processing inline keyboard callback queries

use std::sync::Arc;

use anyhow::Result;
use rusqlite::Connection;
use teloxide::prelude::*;
use teloxide::types::ParseMode;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::catalog;
use crate::db;
use crate::dialogue::{Choice, Event, NotaDialogue};
use crate::receipt::{format_rupiah, ReceiptKind};

use super::run_event;
use super::ui_builder::history_keyboard;

const HISTORY_LIMIT: u32 = 10;

const INFO_MESSAGE: &str = "ℹ️ *TENTANG BOT INI*\n\n\
    Bot pencatat keuangan *Kacang Bawang Berkah Dua Putri*.\n\n\
    🛒 JUAL - buat nota penjualan\n\
    🛍️ BELI - catat belanja bahan\n\
    📜 HISTORI - 10 nota terakhir\n\
    📊 STATISTIK - ringkasan bulan ini\n\n\
    Ketik /batal kapan saja untuk membatalkan proses.";

/// Handle callback queries from inline keyboards
pub async fn callback_handler(
    bot: Bot,
    q: teloxide::types::CallbackQuery,
    conn: Arc<Mutex<Connection>>,
    dialogue: NotaDialogue,
) -> Result<()> {
    debug!(user_id = %q.from.id, data = ?q.data, "Received callback query from user");

    let Some(msg) = &q.message else {
        // Nothing to act on when the original message is gone
        bot.answer_callback_query(q.id).await?;
        return Ok(());
    };
    let chat_id = msg.chat().id;
    let user_id = chat_id.0;
    let data = q.data.as_deref().unwrap_or("");

    match data {
        "menu_jual" => {
            run_event(
                &bot,
                chat_id,
                user_id,
                &dialogue,
                &conn,
                Event::Start(ReceiptKind::Sale),
            )
            .await?;
        }
        "menu_beli" => {
            run_event(
                &bot,
                chat_id,
                user_id,
                &dialogue,
                &conn,
                Event::Start(ReceiptKind::Purchase),
            )
            .await?;
        }
        "menu_histori" => {
            bot.send_message(chat_id, "📜 *HISTORI NOTA*\n\nPilih pelanggan:")
                .parse_mode(ParseMode::Markdown)
                .reply_markup(history_keyboard())
                .await?;
        }
        "menu_statistik" => {
            show_stats(&bot, chat_id, user_id, &conn).await?;
        }
        "menu_info" => {
            bot.send_message(chat_id, INFO_MESSAGE)
                .parse_mode(ParseMode::Markdown)
                .await?;
        }
        "histori_semua" => {
            show_history(&bot, chat_id, user_id, &conn, None).await?;
        }
        _ if data.starts_with("histori_pelanggan_") => {
            let index = data
                .strip_prefix("histori_pelanggan_")
                .and_then(|rest| rest.parse::<usize>().ok());
            match index.and_then(catalog::customer) {
                Some(party) => {
                    show_history(&bot, chat_id, user_id, &conn, Some(party)).await?;
                }
                None => {
                    warn!(user_id, data, "History filter with unknown customer index");
                }
            }
        }
        _ => match Choice::parse(data) {
            Some(choice) => {
                run_event(&bot, chat_id, user_id, &dialogue, &conn, Event::Choice(choice))
                    .await?;
            }
            None => {
                warn!(user_id, data, "Unrecognized callback data ignored");
            }
        },
    }

    // Answer the callback query to remove the loading state
    bot.answer_callback_query(q.id).await?;

    Ok(())
}

/// Send the last receipts for this user, newest first
async fn show_history(
    bot: &Bot,
    chat_id: ChatId,
    user_id: i64,
    conn: &Arc<Mutex<Connection>>,
    party: Option<&str>,
) -> Result<()> {
    let records = {
        let guard = conn.lock().await;
        db::recent_receipts(&guard, user_id, party, HISTORY_LIMIT)?
    };

    if records.is_empty() {
        bot.send_message(chat_id, "📜 Belum ada nota tersimpan.")
            .await?;
        return Ok(());
    }

    let title = match party {
        Some(party) => format!("📜 *HISTORI NOTA: {party}*"),
        None => "📜 *HISTORI NOTA*".to_string(),
    };
    let mut text = format!("{title}\n\n");
    let mut running_total = 0i64;
    for record in &records {
        running_total += record.net_total;
        text.push_str(&format!(
            "{} `{}`\n{} | {} | {}\n\n",
            db::status_marker(&record.status),
            record.number,
            record.date,
            record.party,
            format_rupiah(record.net_total)
        ));
    }
    text.push_str(&format!(
        "💰 *Total {} nota: {}*",
        records.len(),
        format_rupiah(running_total)
    ));

    bot.send_message(chat_id, text)
        .parse_mode(ParseMode::Markdown)
        .await?;
    Ok(())
}

/// Send this month's sale and purchase totals
async fn show_stats(
    bot: &Bot,
    chat_id: ChatId,
    user_id: i64,
    conn: &Arc<Mutex<Connection>>,
) -> Result<()> {
    let month = chrono::Local::now().format("%m/%Y").to_string();
    let stats = {
        let guard = conn.lock().await;
        db::monthly_stats(&guard, user_id, &month)?
    };

    let profit = stats.sale_total - stats.purchase_total;
    let text = format!(
        "📊 *STATISTIK BULAN {month}*\n\n\
         🛒 Penjualan: {} nota\n💰 Total: {}\n\n\
         🛍️ Belanja: {} nota\n💸 Total: {}\n\n\
         📈 *Selisih: {}*",
        stats.sale_count,
        format_rupiah(stats.sale_total),
        stats.purchase_count,
        format_rupiah(stats.purchase_total),
        format_rupiah(profit)
    );

    bot.send_message(chat_id, text)
        .parse_mode(ParseMode::Markdown)
        .await?;
    Ok(())
}
