//! Markdown receipt rendering.

use crate::error::NotaError;
use crate::receipt::{format_rupiah, PaymentStatus, ReceiptDraft, ReceiptKind, Totals};

const SHOP_NAME: &str = "Kacang Bawang Berkah Dua Putri";

/// Render a completed receipt as Telegram Markdown text
pub fn render_receipt(draft: &ReceiptDraft, totals: &Totals) -> Result<String, NotaError> {
    if draft.items.is_empty() {
        return Err(NotaError::Render(
            "cannot render a receipt with no items".to_string(),
        ));
    }

    let separator = "─".repeat(40);
    let mut out = String::new();

    match draft.kind {
        ReceiptKind::Sale => {
            out.push_str("🛒 *NOTA PENJUALAN*\n");
            out.push_str(&format!("*{SHOP_NAME}*\n"));
            out.push_str(&format!("{separator}\n"));
            out.push_str(&format!("No: `{}`\n", draft.number));
            out.push_str(&format!("Pelanggan: *{}*\n", draft.party));
        }
        ReceiptKind::Purchase => {
            out.push_str("🛍️ *NOTA BELANJA*\n");
            out.push_str(&format!("*{SHOP_NAME}*\n"));
            out.push_str(&format!("{separator}\n"));
            out.push_str(&format!("No: `{}`\n", draft.number));
            out.push_str(&format!("Supplier: *{}*\n", draft.party));
        }
    }
    out.push_str(&format!("Tanggal: {}\n", draft.date));
    out.push_str(&format!("{separator}\n"));

    for (index, item) in draft.items.iter().enumerate() {
        out.push_str(&format!(
            "{:2}. {}\n     {}x @ {} = {}\n",
            index + 1,
            item.name,
            item.qty,
            format_rupiah(item.unit_price),
            format_rupiah(item.subtotal)
        ));
    }

    if !draft.returns.is_empty() {
        out.push_str(&format!("{separator}\n"));
        out.push_str("🔄 *BARANG RETUR:*\n");
        for (index, item) in draft.returns.iter().enumerate() {
            out.push_str(&format!(
                "{:2}. {}\n     {}x @ {} = {}\n",
                index + 1,
                item.name,
                item.qty,
                format_rupiah(item.unit_price),
                format_rupiah(item.subtotal)
            ));
        }
    }

    out.push_str(&format!("{separator}\n"));
    out.push_str("💰 *RINGKASAN PEMBAYARAN:*\n");
    out.push_str(&format!(
        "Total Barang: {}\n",
        format_rupiah(totals.total_before_return)
    ));
    if totals.total_return > 0 {
        out.push_str(&format!(
            "Total Retur: -{}\n",
            format_rupiah(totals.total_return)
        ));
    }
    out.push_str(&format!(
        "*Total Bersih: {}*\n",
        format_rupiah(totals.net_total)
    ));
    out.push_str(&format!("Bayar: {}\n", format_rupiah(totals.paid)));
    out.push_str(&format!("*{}*\n", totals.remark()));

    let status_icon = match totals.status {
        PaymentStatus::Paid => "✅",
        PaymentStatus::Unpaid => "❌",
    };
    out.push_str(&format!(
        "{status_icon} *Status: {}*\n",
        totals.status.as_str()
    ));
    out.push_str(&format!("{separator}\n"));

    match draft.kind {
        ReceiptKind::Sale => out.push_str("_*Terima kasih atas kepercayaannya*_ 🙏"),
        ReceiptKind::Purchase => out.push_str("_*Catatan pembelian tersimpan*_ 📝"),
    }

    Ok(out)
}
