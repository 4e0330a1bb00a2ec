//! # Receipt Module
//!
//! Core receipt data model: line items, the in-progress draft owned by one
//! conversation, totals computation, receipt number generation, and the
//! rupiah formatting / numeric parsing helpers shared by the whole bot.

use std::sync::LazyLock;

use rand::Rng;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::NotaError;

/// Amounts may carry digit-group separators ("1.000.000", "25,000")
static AMOUNT_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\d[\d.,]*$").unwrap());

/// Upper bounds on accepted input. Together they keep every
/// `unit_price * qty` product, and any realistic sum of them, inside `i64`.
pub const MAX_AMOUNT: i64 = 999_999_999_999;
pub const MAX_QTY: u32 = 999_999;

/// Which kind of receipt a conversation is building
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReceiptKind {
    Sale,
    Purchase,
}

impl ReceiptKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReceiptKind::Sale => "penjualan",
            ReceiptKind::Purchase => "belanja",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "penjualan" => Some(ReceiptKind::Sale),
            "belanja" => Some(ReceiptKind::Purchase),
            _ => None,
        }
    }

    fn number_prefix(&self) -> &'static str {
        match self {
            ReceiptKind::Sale => "PNJ",
            ReceiptKind::Purchase => "BLJ",
        }
    }
}

/// A fully-entered line on a receipt. Immutable once appended to a draft;
/// `subtotal == unit_price * qty` holds by construction.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LineItem {
    pub name: String,
    pub unit_price: i64,
    pub qty: u32,
    pub subtotal: i64,
}

impl LineItem {
    pub fn new(name: impl Into<String>, unit_price: i64, qty: u32) -> Self {
        Self {
            name: name.into(),
            unit_price,
            qty,
            subtotal: unit_price * i64::from(qty),
        }
    }
}

/// An in-progress, unsaved receipt owned by exactly one conversation.
///
/// Returns are only filled in sales flows; a purchase draft keeps the
/// vector empty.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ReceiptDraft {
    pub number: String,
    pub date: String,
    pub kind: ReceiptKind,
    pub party: String,
    pub items: Vec<LineItem>,
    pub returns: Vec<LineItem>,
}

impl ReceiptDraft {
    pub fn new(kind: ReceiptKind) -> Self {
        Self {
            number: generate_receipt_number(kind),
            date: chrono::Local::now().format("%d/%m/%Y").to_string(),
            kind,
            party: String::new(),
            items: Vec::new(),
            returns: Vec::new(),
        }
    }

    pub fn total_before_return(&self) -> i64 {
        self.items.iter().map(|item| item.subtotal).sum()
    }

    pub fn total_return(&self) -> i64 {
        self.returns.iter().map(|item| item.subtotal).sum()
    }

    pub fn net_total(&self) -> i64 {
        self.total_before_return() - self.total_return()
    }

    /// Final numbers for a draft with the payment amount entered
    pub fn totals(&self, paid: i64) -> Totals {
        let total_before_return = self.total_before_return();
        let total_return = self.total_return();
        let net_total = total_before_return - total_return;
        let balance = paid - net_total;
        Totals {
            total_before_return,
            total_return,
            net_total,
            paid,
            balance,
            status: if balance >= 0 {
                PaymentStatus::Paid
            } else {
                PaymentStatus::Unpaid
            },
        }
    }
}

/// Payment status of a finalized receipt
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PaymentStatus {
    Paid,
    Unpaid,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Paid => "LUNAS",
            PaymentStatus::Unpaid => "BELUM LUNAS",
        }
    }
}

/// Computed totals for a finalized receipt
#[derive(Clone, Debug, PartialEq)]
pub struct Totals {
    pub total_before_return: i64,
    pub total_return: i64,
    pub net_total: i64,
    pub paid: i64,
    pub balance: i64,
    pub status: PaymentStatus,
}

impl Totals {
    /// The remark column stored alongside the receipt
    pub fn remark(&self) -> String {
        if self.balance >= 0 {
            format!("Sisa {}", format_rupiah(self.balance))
        } else {
            format!("Kurang {}", format_rupiah(-self.balance))
        }
    }
}

/// Generate a receipt number: `{prefix}-{dd}-{mm}-{yy}-{nnn}`.
///
/// The random suffix is not guaranteed unique; the UNIQUE column in storage
/// catches collisions and the finalizer regenerates on conflict.
pub fn generate_receipt_number(kind: ReceiptKind) -> String {
    let now = chrono::Local::now();
    let suffix: u32 = rand::thread_rng().gen_range(1..1000);
    format!(
        "{}-{}-{:03}",
        kind.number_prefix(),
        now.format("%d-%m-%y"),
        suffix
    )
}

/// Format an amount in the smallest currency unit as rupiah: `Rp 1.234.567`
pub fn format_rupiah(amount: i64) -> String {
    if amount < 0 {
        return format!("-{}", format_rupiah(-amount));
    }
    let digits = amount.to_string();
    let mut grouped = String::new();
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(c);
    }
    format!("Rp {grouped}")
}

/// Parse a money amount, stripping digit-group separators first
pub fn parse_amount(input: &str) -> Result<i64, NotaError> {
    let trimmed = input.trim();
    if !AMOUNT_RE.is_match(trimmed) {
        return Err(NotaError::Validation(format!(
            "not a valid amount: {trimmed}"
        )));
    }
    let cleaned: String = trimmed.chars().filter(|c| c.is_ascii_digit()).collect();
    let amount: i64 = cleaned
        .parse()
        .map_err(|_| NotaError::Validation(format!("not a valid amount: {trimmed}")))?;
    if amount > MAX_AMOUNT {
        return Err(NotaError::Validation(format!(
            "amount too large: {trimmed}"
        )));
    }
    Ok(amount)
}

/// Parse a quantity; must be a positive integer
pub fn parse_qty(input: &str) -> Result<u32, NotaError> {
    let trimmed = input.trim();
    let qty: u32 = trimmed
        .parse()
        .map_err(|_| NotaError::Validation(format!("not a valid quantity: {trimmed}")))?;
    if qty == 0 {
        return Err(NotaError::Validation("quantity must be positive".to_string()));
    }
    if qty > MAX_QTY {
        return Err(NotaError::Validation(format!(
            "quantity too large: {trimmed}"
        )));
    }
    Ok(qty)
}
