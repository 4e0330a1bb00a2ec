//! # Catalog Module
//!
//! Static customer and item tables plus the tiered pricing rule for
//! "Kc Bawang Renceng". The catalog is read-only and shared by every
//! conversation; lookups are case-insensitive exact matches.

use crate::error::NotaError;
use crate::receipt::ReceiptKind;

/// Customers offered in the sales flow
pub const CUSTOMERS: &[&str] = &["ASEP RIDWAN", "UJANG", "Pelanggan Umum"];

/// Items offered in the sales flow
pub const SALE_ITEMS: &[&str] = &["Kc Bawang Renceng", "Kc Bawang Kiloan"];

/// Expense categories offered in the purchase flow
pub const PURCHASE_ITEMS: &[&str] = &[
    "Kacang Kupas",
    "Bumbu",
    "Minyak",
    "Plastik",
    "Label",
    "Biaya Produksi",
    "Gas LPG",
    "Upah goreng",
    "Upah Bungkus",
    "Lain-lain",
];

/// The one sale item whose unit price is tiered by customer
pub const TIERED_ITEM: &str = "Kc Bawang Renceng";

/// Item table for the given receipt kind
pub fn items_for(kind: ReceiptKind) -> &'static [&'static str] {
    match kind {
        ReceiptKind::Sale => SALE_ITEMS,
        ReceiptKind::Purchase => PURCHASE_ITEMS,
    }
}

/// Customer name by menu index
pub fn customer(index: usize) -> Option<&'static str> {
    CUSTOMERS.get(index).copied()
}

/// Item name by menu index for the given receipt kind
pub fn item(kind: ReceiptKind, index: usize) -> Option<&'static str> {
    items_for(kind).get(index).copied()
}

/// Look up an item by name, case-insensitively, returning its canonical name
pub fn lookup(kind: ReceiptKind, name: &str) -> Result<&'static str, NotaError> {
    let needle = name.trim();
    items_for(kind)
        .iter()
        .find(|candidate| candidate.eq_ignore_ascii_case(needle))
        .copied()
        .ok_or_else(|| NotaError::NotFound(needle.to_string()))
}

/// Unit price of the tiered item for a given customer
pub fn tiered_price(customer: &str) -> i64 {
    let upper = customer.to_uppercase();
    if upper.contains("ASEP R") {
        1050
    } else if upper.contains("UJANG") {
        1200
    } else {
        1600 // Pelanggan Umum
    }
}

/// Auto-determined unit price, when the pricing rule applies.
///
/// Only the tiered item in a sales flow has its price substituted; every
/// other selection goes through manual price entry.
pub fn auto_price(kind: ReceiptKind, item_name: &str, customer: &str) -> Option<i64> {
    if kind == ReceiptKind::Sale && item_name == TIERED_ITEM {
        Some(tiered_price(customer))
    } else {
        None
    }
}
