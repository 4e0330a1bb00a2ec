//! # Nota Telegram Bot
//!
//! A Telegram bot for a small snack business that records sales and
//! purchases through a guided conversation and produces formatted
//! receipts backed by a sqlite history.

pub mod bot;
pub mod catalog;
pub mod db;
pub mod dialogue;
pub mod error;
pub mod finalize;
pub mod receipt;
pub mod render;
