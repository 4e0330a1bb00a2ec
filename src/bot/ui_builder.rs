//! UI Builder module for creating inline keyboards

use teloxide::types::{InlineKeyboardButton, InlineKeyboardMarkup};

use crate::catalog;
use crate::dialogue::Menu;
use crate::receipt::{format_rupiah, ReceiptKind};

/// Build the keyboard for a menu token produced by the state machine
pub fn keyboard_for(menu: &Menu) -> InlineKeyboardMarkup {
    match menu {
        Menu::Main => main_menu_keyboard(),
        Menu::Party => party_keyboard(),
        Menu::SaleItems { customer } => sale_items_keyboard(customer),
        Menu::PurchaseItems => purchase_items_keyboard(),
        Menu::MoreItems { kind } => more_items_keyboard(*kind),
        Menu::MoreReturns => more_returns_keyboard(),
        Menu::Payment { net_total } => payment_keyboard(*net_total),
    }
}

pub fn main_menu_keyboard() -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![
        vec![
            InlineKeyboardButton::callback("🛒 JUAL", "menu_jual"),
            InlineKeyboardButton::callback("🛍️ BELI", "menu_beli"),
        ],
        vec![
            InlineKeyboardButton::callback("📜 HISTORI", "menu_histori"),
            InlineKeyboardButton::callback("📊 STATISTIK", "menu_statistik"),
        ],
        vec![InlineKeyboardButton::callback("ℹ️ INFO", "menu_info")],
    ])
}

fn party_keyboard() -> InlineKeyboardMarkup {
    let mut buttons: Vec<Vec<InlineKeyboardButton>> = catalog::CUSTOMERS
        .iter()
        .enumerate()
        .map(|(i, name)| vec![InlineKeyboardButton::callback(*name, format!("pelanggan_{i}"))])
        .collect();
    buttons.push(vec![InlineKeyboardButton::callback("🚫 Batalkan", "cancel")]);
    InlineKeyboardMarkup::new(buttons)
}

/// Sale item buttons. The tiered item shows the customer's price so the
/// skipped price-entry step is visible up front.
fn sale_items_keyboard(customer: &str) -> InlineKeyboardMarkup {
    let mut buttons: Vec<Vec<InlineKeyboardButton>> = catalog::SALE_ITEMS
        .iter()
        .enumerate()
        .map(|(i, name)| {
            let label = if *name == catalog::TIERED_ITEM {
                format!("{} ({})", name, format_rupiah(catalog::tiered_price(customer)))
            } else {
                name.to_string()
            };
            vec![InlineKeyboardButton::callback(label, format!("barang_{i}"))]
        })
        .collect();
    buttons.push(vec![InlineKeyboardButton::callback("🚫 Batalkan", "cancel")]);
    InlineKeyboardMarkup::new(buttons)
}

fn purchase_items_keyboard() -> InlineKeyboardMarkup {
    let mut buttons: Vec<Vec<InlineKeyboardButton>> = Vec::new();
    for (row_index, pair) in catalog::PURCHASE_ITEMS.chunks(2).enumerate() {
        let row = pair
            .iter()
            .enumerate()
            .map(|(col, name)| {
                let index = row_index * 2 + col;
                InlineKeyboardButton::callback(
                    format!("{}. {}", index + 1, name),
                    format!("barang_{index}"),
                )
            })
            .collect();
        buttons.push(row);
    }
    buttons.push(vec![InlineKeyboardButton::callback("🚫 Batalkan", "cancel")]);
    InlineKeyboardMarkup::new(buttons)
}

fn more_items_keyboard(kind: ReceiptKind) -> InlineKeyboardMarkup {
    let mut buttons = vec![vec![InlineKeyboardButton::callback(
        "➕ Tambah Barang",
        "tambah_barang",
    )]];
    if kind == ReceiptKind::Sale {
        buttons.push(vec![InlineKeyboardButton::callback(
            "🔄 Retur Barang",
            "retur_barang",
        )]);
    }
    buttons.push(vec![InlineKeyboardButton::callback(
        "✅ Selesai",
        "selesai_barang",
    )]);
    buttons.push(vec![InlineKeyboardButton::callback("🚫 Batalkan", "cancel")]);
    InlineKeyboardMarkup::new(buttons)
}

fn more_returns_keyboard() -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![
        vec![InlineKeyboardButton::callback(
            "➕ Tambah Retur",
            "tambah_barang",
        )],
        vec![InlineKeyboardButton::callback(
            "✅ Selesai",
            "selesai_barang",
        )],
        vec![InlineKeyboardButton::callback("🚫 Batalkan", "cancel")],
    ])
}

fn payment_keyboard(net_total: i64) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![
        vec![InlineKeyboardButton::callback(
            format!("💰 Bayar LUNAS: {}", format_rupiah(net_total)),
            format!("bayar_pas_{net_total}"),
        )],
        vec![InlineKeyboardButton::callback(
            "⌨️ Input Manual",
            "bayar_manual",
        )],
        vec![InlineKeyboardButton::callback("🚫 Batalkan", "cancel")],
    ])
}

/// Keyboard for the history menu: per-customer filters plus a show-all row
pub fn history_keyboard() -> InlineKeyboardMarkup {
    let mut buttons: Vec<Vec<InlineKeyboardButton>> = catalog::CUSTOMERS
        .iter()
        .enumerate()
        .map(|(i, name)| {
            vec![InlineKeyboardButton::callback(
                format!("👤 {name}"),
                format!("histori_pelanggan_{i}"),
            )]
        })
        .collect();
    buttons.push(vec![InlineKeyboardButton::callback(
        "📊 Semua Nota",
        "histori_semua",
    )]);
    buttons.push(vec![InlineKeyboardButton::callback("🚫 Tutup", "cancel")]);
    InlineKeyboardMarkup::new(buttons)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn callback_data(markup: &InlineKeyboardMarkup) -> Vec<String> {
        markup
            .inline_keyboard
            .iter()
            .flatten()
            .filter_map(|b| match &b.kind {
                teloxide::types::InlineKeyboardButtonKind::CallbackData(data) => {
                    Some(data.clone())
                }
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_main_menu_callbacks() {
        let data = callback_data(&main_menu_keyboard());
        assert_eq!(
            data,
            vec![
                "menu_jual",
                "menu_beli",
                "menu_histori",
                "menu_statistik",
                "menu_info"
            ]
        );
    }

    #[test]
    fn test_sale_items_show_tiered_price() {
        let markup = sale_items_keyboard("ASEP RIDWAN");
        let labels: Vec<_> = markup
            .inline_keyboard
            .iter()
            .flatten()
            .map(|b| b.text.clone())
            .collect();
        assert!(labels.iter().any(|l| l.contains("Rp 1.050")));
    }

    #[test]
    fn test_purchase_items_cover_whole_catalog() {
        let data = callback_data(&purchase_items_keyboard());
        // One button per item plus the cancel row
        assert_eq!(data.len(), catalog::PURCHASE_ITEMS.len() + 1);
        assert!(data.contains(&"barang_0".to_string()));
        assert!(data.contains(&format!("barang_{}", catalog::PURCHASE_ITEMS.len() - 1)));
    }

    #[test]
    fn test_more_items_keyboard_offers_returns_only_for_sales() {
        let sale = callback_data(&more_items_keyboard(ReceiptKind::Sale));
        assert!(sale.contains(&"retur_barang".to_string()));

        let purchase = callback_data(&more_items_keyboard(ReceiptKind::Purchase));
        assert!(!purchase.contains(&"retur_barang".to_string()));
    }

    #[test]
    fn test_payment_keyboard_embeds_total() {
        let data = callback_data(&payment_keyboard(2000));
        assert!(data.contains(&"bayar_pas_2000".to_string()));
        assert!(data.contains(&"bayar_manual".to_string()));
    }
}
