//! Receipt dialogue module for handling conversation state with users.
//!
//! The conversation is a closed state enum advanced by a pure transition
//! function over typed events. Handlers translate Telegram updates into
//! [`Event`]s, call [`advance`], send the returned prompt, run the returned
//! effect, and store the next state in the per-user teloxide dialogue.

use serde::{Deserialize, Serialize};
use teloxide::dispatching::dialogue::{Dialogue, InMemStorage};
use tracing::debug;

use crate::catalog;
use crate::receipt::{
    format_rupiah, parse_amount, parse_qty, LineItem, ReceiptDraft, ReceiptKind,
};

/// Represents the conversation state for one user's receipt entry.
///
/// In-flow variants carry the draft; the price/quantity variants also carry
/// the pending, partially-entered line item.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub enum NotaDialogueState {
    #[default]
    Idle,
    AwaitPartyName {
        draft: ReceiptDraft,
    },
    AwaitItemSelection {
        draft: ReceiptDraft,
    },
    AwaitItemPrice {
        draft: ReceiptDraft,
        item_name: String,
    },
    AwaitItemQuantity {
        draft: ReceiptDraft,
        item_name: String,
        unit_price: i64,
    },
    AwaitMoreItemsChoice {
        draft: ReceiptDraft,
    },
    AwaitReturnSelection {
        draft: ReceiptDraft,
    },
    AwaitReturnPrice {
        draft: ReceiptDraft,
        item_name: String,
    },
    AwaitReturnQuantity {
        draft: ReceiptDraft,
        item_name: String,
        unit_price: i64,
    },
    AwaitMoreReturnsChoice {
        draft: ReceiptDraft,
    },
    AwaitPaymentAmount {
        draft: ReceiptDraft,
    },
}

/// Type alias for our receipt dialogue
pub type NotaDialogue = Dialogue<NotaDialogueState, InMemStorage<NotaDialogueState>>;

/// A button choice, parsed from inline keyboard callback data
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Choice {
    Party(usize),
    Item(usize),
    AddMore,
    Done,
    StartReturns,
    PayExact(i64),
    PayManual,
    Cancel,
}

impl Choice {
    /// Parse callback data into a choice token. Menu-level callbacks
    /// ("menu_*", "histori_*") are handled outside the state machine and
    /// yield `None` here.
    pub fn parse(data: &str) -> Option<Choice> {
        if let Some(rest) = data.strip_prefix("pelanggan_") {
            return rest.parse().ok().map(Choice::Party);
        }
        if let Some(rest) = data.strip_prefix("barang_") {
            return rest.parse().ok().map(Choice::Item);
        }
        if let Some(rest) = data.strip_prefix("bayar_pas_") {
            return rest.parse().ok().map(Choice::PayExact);
        }
        match data {
            "tambah_barang" => Some(Choice::AddMore),
            "selesai_barang" => Some(Choice::Done),
            "retur_barang" => Some(Choice::StartReturns),
            "bayar_manual" => Some(Choice::PayManual),
            "cancel" => Some(Choice::Cancel),
            _ => None,
        }
    }
}

/// An inbound conversation event
#[derive(Clone, Debug, PartialEq)]
pub enum Event {
    /// A brand-new receipt was requested; discards any draft in progress
    Start(ReceiptKind),
    /// A free-text message
    Text(String),
    /// An inline keyboard button press
    Choice(Choice),
}

/// Which inline keyboard to attach to a prompt
#[derive(Clone, Debug, PartialEq)]
pub enum Menu {
    Main,
    Party,
    SaleItems { customer: String },
    PurchaseItems,
    MoreItems { kind: ReceiptKind },
    MoreReturns,
    Payment { net_total: i64 },
}

/// The outbound reply for one transition
#[derive(Clone, Debug, PartialEq)]
pub struct Prompt {
    pub text: String,
    pub menu: Option<Menu>,
}

impl Prompt {
    fn text_only(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            menu: None,
        }
    }

    fn with_menu(text: impl Into<String>, menu: Menu) -> Self {
        Self {
            text: text.into(),
            menu: Some(menu),
        }
    }
}

/// A side effect the handler must run after the transition
#[derive(Clone, Debug, PartialEq)]
pub enum Effect {
    /// Persist and render the completed draft with the entered payment
    Finalize { draft: ReceiptDraft, paid: i64 },
}

/// The result of one transition: next state, reply, and optional effect
#[derive(Clone, Debug, PartialEq)]
pub struct Step {
    pub next: NotaDialogueState,
    pub reply: Option<Prompt>,
    pub effect: Option<Effect>,
}

impl Step {
    fn to(next: NotaDialogueState, prompt: Prompt) -> Self {
        Self {
            next,
            reply: Some(prompt),
            effect: None,
        }
    }
}

/// Re-prompt in place: the state (and any pending item in it) is unchanged
fn reprompt(state: NotaDialogueState, text: impl Into<String>, menu: Option<Menu>) -> Step {
    Step {
        next: state,
        reply: Some(Prompt {
            text: text.into(),
            menu,
        }),
        effect: None,
    }
}

/// Advance the conversation state machine by one event.
///
/// Pure: no I/O happens here. Invalid input re-prompts without changing
/// state; `Cancel` drops to `Idle` from anywhere; `Start` unconditionally
/// replaces whatever was in progress.
pub fn advance(state: NotaDialogueState, event: Event) -> Step {
    if let Event::Start(kind) = &event {
        return start_step(*kind);
    }
    if event == Event::Choice(Choice::Cancel) {
        return Step::to(
            NotaDialogueState::Idle,
            Prompt::with_menu("❌ Proses dibatalkan", Menu::Main),
        );
    }

    match state {
        NotaDialogueState::Idle => Step::to(
            NotaDialogueState::Idle,
            Prompt::with_menu("Silakan pilih menu di bawah", Menu::Main),
        ),

        NotaDialogueState::AwaitPartyName { mut draft } => match event {
            Event::Text(text) => {
                let name = text.trim();
                if name.is_empty() {
                    return party_reprompt(draft);
                }
                draft.party = name.to_string();
                item_selection_step(draft, false)
            }
            Event::Choice(Choice::Party(index)) if draft.kind == ReceiptKind::Sale => {
                match catalog::customer(index) {
                    Some(name) => {
                        draft.party = name.to_string();
                        item_selection_step(draft, false)
                    }
                    None => party_reprompt(draft),
                }
            }
            _ => party_reprompt(draft),
        },

        NotaDialogueState::AwaitItemSelection { draft } => match event {
            Event::Choice(Choice::Item(index)) => match catalog::item(draft.kind, index) {
                Some(name) => item_chosen_step(draft, name, false),
                None => selection_reprompt(draft, false),
            },
            Event::Text(text) => match catalog::lookup(draft.kind, &text) {
                Ok(name) => item_chosen_step(draft, name, false),
                Err(err) => {
                    debug!(%err, "Item lookup failed");
                    reprompt(
                        NotaDialogueState::AwaitItemSelection {
                            draft: draft.clone(),
                        },
                        "❌ Barang tidak dikenal. Pilih dari menu di bawah.",
                        Some(item_menu(&draft)),
                    )
                }
            },
            _ => selection_reprompt(draft, false),
        },

        NotaDialogueState::AwaitItemPrice { draft, item_name } => match event {
            Event::Text(text) => match parse_amount(&text) {
                Ok(price) if price > 0 => Step::to(
                    NotaDialogueState::AwaitItemQuantity {
                        draft,
                        item_name,
                        unit_price: price,
                    },
                    Prompt::text_only(format!(
                        "💰 *Harga:* {}\n\nMasukkan jumlah barang:",
                        format_rupiah(price)
                    )),
                ),
                _ => reprompt(
                    NotaDialogueState::AwaitItemPrice { draft, item_name },
                    "❌ Masukkan angka yang valid!",
                    None,
                ),
            },
            _ => reprompt(
                NotaDialogueState::AwaitItemPrice { draft, item_name },
                "Masukkan harga satuan:",
                None,
            ),
        },

        NotaDialogueState::AwaitItemQuantity {
            mut draft,
            item_name,
            unit_price,
        } => match event {
            Event::Text(text) => match parse_qty(&text) {
                Ok(qty) => {
                    let item = LineItem::new(item_name, unit_price, qty);
                    let summary = added_item_summary(&draft, &item, false);
                    draft.items.push(item);
                    let kind = draft.kind;
                    Step::to(
                        NotaDialogueState::AwaitMoreItemsChoice { draft },
                        Prompt::with_menu(summary, Menu::MoreItems { kind }),
                    )
                }
                Err(_) => reprompt(
                    NotaDialogueState::AwaitItemQuantity {
                        draft,
                        item_name,
                        unit_price,
                    },
                    "❌ Jumlah harus angka lebih dari 0!",
                    None,
                ),
            },
            _ => reprompt(
                NotaDialogueState::AwaitItemQuantity {
                    draft,
                    item_name,
                    unit_price,
                },
                "Masukkan jumlah barang:",
                None,
            ),
        },

        NotaDialogueState::AwaitMoreItemsChoice { draft } => match event {
            Event::Choice(Choice::AddMore) => item_selection_step(draft, false),
            Event::Choice(Choice::StartReturns) if draft.kind == ReceiptKind::Sale => {
                item_selection_step(draft, true)
            }
            Event::Choice(Choice::Done) => {
                if draft.items.is_empty() {
                    let kind = draft.kind;
                    reprompt(
                        NotaDialogueState::AwaitMoreItemsChoice { draft },
                        "❌ Minimal harus ada 1 barang!",
                        Some(Menu::MoreItems { kind }),
                    )
                } else {
                    payment_step(draft)
                }
            }
            _ => {
                let kind = draft.kind;
                reprompt(
                    NotaDialogueState::AwaitMoreItemsChoice { draft },
                    "Pilih opsi di bawah:",
                    Some(Menu::MoreItems { kind }),
                )
            }
        },

        NotaDialogueState::AwaitReturnSelection { draft } => match event {
            Event::Choice(Choice::Item(index)) => match catalog::item(draft.kind, index) {
                Some(name) => item_chosen_step(draft, name, true),
                None => selection_reprompt(draft, true),
            },
            Event::Text(text) => match catalog::lookup(draft.kind, &text) {
                Ok(name) => item_chosen_step(draft, name, true),
                Err(err) => {
                    debug!(%err, "Return item lookup failed");
                    reprompt(
                        NotaDialogueState::AwaitReturnSelection {
                            draft: draft.clone(),
                        },
                        "❌ Barang tidak dikenal. Pilih dari menu di bawah.",
                        Some(item_menu(&draft)),
                    )
                }
            },
            _ => selection_reprompt(draft, true),
        },

        NotaDialogueState::AwaitReturnPrice { draft, item_name } => match event {
            Event::Text(text) => match parse_amount(&text) {
                Ok(price) if price > 0 => Step::to(
                    NotaDialogueState::AwaitReturnQuantity {
                        draft,
                        item_name,
                        unit_price: price,
                    },
                    Prompt::text_only(format!(
                        "💰 *Harga:* {}\n\nMasukkan jumlah retur:",
                        format_rupiah(price)
                    )),
                ),
                _ => reprompt(
                    NotaDialogueState::AwaitReturnPrice { draft, item_name },
                    "❌ Masukkan angka yang valid!",
                    None,
                ),
            },
            _ => reprompt(
                NotaDialogueState::AwaitReturnPrice { draft, item_name },
                "Masukkan harga satuan:",
                None,
            ),
        },

        NotaDialogueState::AwaitReturnQuantity {
            mut draft,
            item_name,
            unit_price,
        } => match event {
            Event::Text(text) => match parse_qty(&text) {
                Ok(qty) => {
                    let item = LineItem::new(item_name, unit_price, qty);
                    let summary = added_item_summary(&draft, &item, true);
                    draft.returns.push(item);
                    Step::to(
                        NotaDialogueState::AwaitMoreReturnsChoice { draft },
                        Prompt::with_menu(summary, Menu::MoreReturns),
                    )
                }
                Err(_) => reprompt(
                    NotaDialogueState::AwaitReturnQuantity {
                        draft,
                        item_name,
                        unit_price,
                    },
                    "❌ Jumlah harus angka lebih dari 0!",
                    None,
                ),
            },
            _ => reprompt(
                NotaDialogueState::AwaitReturnQuantity {
                    draft,
                    item_name,
                    unit_price,
                },
                "Masukkan jumlah retur:",
                None,
            ),
        },

        NotaDialogueState::AwaitMoreReturnsChoice { draft } => match event {
            Event::Choice(Choice::AddMore) => item_selection_step(draft, true),
            // Zero or more returns are fine; Done always proceeds
            Event::Choice(Choice::Done) => payment_step(draft),
            _ => reprompt(
                NotaDialogueState::AwaitMoreReturnsChoice { draft },
                "Pilih opsi di bawah:",
                Some(Menu::MoreReturns),
            ),
        },

        NotaDialogueState::AwaitPaymentAmount { draft } => match event {
            // Callback data is attacker-controlled; hold the button path to
            // the same non-negativity rule as manual entry
            Event::Choice(Choice::PayExact(amount)) if amount >= 0 => {
                finalize_step(draft, amount)
            }
            Event::Choice(Choice::PayManual) => {
                let net_total = draft.net_total();
                reprompt(
                    NotaDialogueState::AwaitPaymentAmount { draft },
                    format!(
                        "💰 *Total yang harus dibayar:* {}\n\nMasukkan jumlah pembayaran:",
                        format_rupiah(net_total)
                    ),
                    None,
                )
            }
            Event::Text(text) => match parse_amount(&text) {
                Ok(paid) => finalize_step(draft, paid),
                Err(_) => reprompt(
                    NotaDialogueState::AwaitPaymentAmount { draft },
                    "❌ Masukkan angka yang valid!",
                    None,
                ),
            },
            _ => {
                let net_total = draft.net_total();
                reprompt(
                    NotaDialogueState::AwaitPaymentAmount { draft },
                    "Pilih nominal pembayaran:",
                    Some(Menu::Payment { net_total }),
                )
            }
        },
    }
}

/// Fresh draft, whatever was in progress before
fn start_step(kind: ReceiptKind) -> Step {
    let draft = ReceiptDraft::new(kind);
    let prompt = match kind {
        ReceiptKind::Sale => Prompt::with_menu(
            "🛒 *BUAT NOTA PENJUALAN*\n\nPilih Nama Pelanggan",
            Menu::Party,
        ),
        ReceiptKind::Purchase => {
            Prompt::text_only("🛍️ *BUAT NOTA BELANJA*\n\nMasukkan nama supplier:")
        }
    };
    Step::to(NotaDialogueState::AwaitPartyName { draft }, prompt)
}

fn party_reprompt(draft: ReceiptDraft) -> Step {
    let prompt = match draft.kind {
        ReceiptKind::Sale => Prompt::with_menu("Pilih Nama Pelanggan", Menu::Party),
        ReceiptKind::Purchase => Prompt::text_only("Masukkan nama supplier:"),
    };
    Step {
        next: NotaDialogueState::AwaitPartyName { draft },
        reply: Some(prompt),
        effect: None,
    }
}

fn item_menu(draft: &ReceiptDraft) -> Menu {
    match draft.kind {
        ReceiptKind::Sale => Menu::SaleItems {
            customer: draft.party.clone(),
        },
        ReceiptKind::Purchase => Menu::PurchaseItems,
    }
}

/// Move to (return-)item selection with the right item menu for the kind
fn item_selection_step(draft: ReceiptDraft, returning: bool) -> Step {
    let menu = item_menu(&draft);
    let text = if returning {
        "🔄 Pilih barang retur:".to_string()
    } else {
        match draft.kind {
            ReceiptKind::Sale => format!("👤 *Pelanggan: {}*\n\n📦 Pilih barang", draft.party),
            ReceiptKind::Purchase => {
                format!("🏢 *Supplier: {}*\n\n📦 Pilih jenis belanja:", draft.party)
            }
        }
    };
    let next = if returning {
        NotaDialogueState::AwaitReturnSelection { draft }
    } else {
        NotaDialogueState::AwaitItemSelection { draft }
    };
    Step::to(next, Prompt::with_menu(text, menu))
}

fn selection_reprompt(draft: ReceiptDraft, returning: bool) -> Step {
    let menu = item_menu(&draft);
    let state = if returning {
        NotaDialogueState::AwaitReturnSelection { draft }
    } else {
        NotaDialogueState::AwaitItemSelection { draft }
    };
    reprompt(state, "📦 Pilih barang dari menu:", Some(menu))
}

/// An item was picked; skip price entry when the pricing rule applies
fn item_chosen_step(draft: ReceiptDraft, name: &str, returning: bool) -> Step {
    if let Some(price) = catalog::auto_price(draft.kind, name, &draft.party) {
        let text = format!(
            "📦 *Barang:* {}\n💰 *Harga otomatis:* {}\n\nMasukkan jumlah {}:",
            name,
            format_rupiah(price),
            if returning { "retur" } else { "barang" }
        );
        let next = if returning {
            NotaDialogueState::AwaitReturnQuantity {
                draft,
                item_name: name.to_string(),
                unit_price: price,
            }
        } else {
            NotaDialogueState::AwaitItemQuantity {
                draft,
                item_name: name.to_string(),
                unit_price: price,
            }
        };
        return Step::to(next, Prompt::text_only(text));
    }

    let text = format!("📦 *Barang:* {name}\n\nMasukkan harga satuan:");
    let next = if returning {
        NotaDialogueState::AwaitReturnPrice {
            draft,
            item_name: name.to_string(),
        }
    } else {
        NotaDialogueState::AwaitItemPrice {
            draft,
            item_name: name.to_string(),
        }
    };
    Step::to(next, Prompt::text_only(text))
}

/// Interim summary shown after each added line
fn added_item_summary(draft: &ReceiptDraft, item: &LineItem, returning: bool) -> String {
    let running_total = draft.net_total()
        + if returning {
            -item.subtotal
        } else {
            item.subtotal
        };
    format!(
        "✅ *{} ditambahkan:*\n{}\n{} x {} = {}\n\n💰 *Total sementara:* {}\n\nPilih opsi di bawah:",
        if returning { "Retur" } else { "Barang" },
        item.name,
        item.qty,
        format_rupiah(item.unit_price),
        format_rupiah(item.subtotal),
        format_rupiah(running_total)
    )
}

/// Receipt summary plus the payment keyboard
fn payment_step(draft: ReceiptDraft) -> Step {
    let mut text = String::from("📋 *RINGKASAN NOTA*\n\n");
    for item in &draft.items {
        text.push_str(&format!(
            "• {}x {} = {}\n",
            item.qty,
            item.name,
            format_rupiah(item.subtotal)
        ));
    }
    if !draft.returns.is_empty() {
        text.push_str("\n🔄 *BARANG RETUR:*\n");
        for item in &draft.returns {
            text.push_str(&format!(
                "• {}x {} = {}\n",
                item.qty,
                item.name,
                format_rupiah(item.subtotal)
            ));
        }
    }
    let net_total = draft.net_total();
    text.push_str(&format!(
        "\n💰 *TOTAL: {}*\n\nPilih nominal pembayaran:",
        format_rupiah(net_total)
    ));
    Step::to(
        NotaDialogueState::AwaitPaymentAmount { draft },
        Prompt::with_menu(text, Menu::Payment { net_total }),
    )
}

fn finalize_step(draft: ReceiptDraft, paid: i64) -> Step {
    Step {
        next: NotaDialogueState::Idle,
        reply: None,
        effect: Some(Effect::Finalize { draft, paid }),
    }
}
