//! Storage integration tests against a real sqlite file.

use anyhow::Result;
use rusqlite::Connection;
use tempfile::NamedTempFile;

use nota_bot::db;
use nota_bot::receipt::{LineItem, ReceiptDraft, ReceiptKind};

fn setup() -> Result<(Connection, NamedTempFile)> {
    let temp_file = NamedTempFile::new()?;
    let conn = Connection::open(temp_file.path())?;
    db::init_database_schema(&conn)?;
    Ok((conn, temp_file))
}

fn draft_with(number: &str, kind: ReceiptKind, party: &str, date: &str) -> ReceiptDraft {
    let mut draft = ReceiptDraft::new(kind);
    draft.number = number.to_string();
    draft.party = party.to_string();
    draft.date = date.to_string();
    draft.items.push(LineItem::new("Kc Bawang Renceng", 1200, 2));
    draft
}

#[test]
fn test_schema_init_is_idempotent() -> Result<()> {
    let (conn, _temp_file) = setup()?;
    db::init_database_schema(&conn)?;
    Ok(())
}

#[test]
fn test_full_record_round_trip() -> Result<()> {
    let (conn, _temp_file) = setup()?;

    let mut draft = draft_with("PNJ-05-03-25-001", ReceiptKind::Sale, "UJANG", "05/03/2025");
    draft.returns.push(LineItem::new("Kc Bawang Renceng", 1200, 1));
    let totals = draft.totals(1000);
    db::insert_receipt(&conn, 7, &draft, &totals)?;

    let records = db::recent_receipts(&conn, 7, None, 10)?;
    assert_eq!(records.len(), 1);
    let record = &records[0];
    assert_eq!(record.user_id, 7);
    assert_eq!(record.kind, ReceiptKind::Sale);
    assert_eq!(record.number, draft.number);
    assert_eq!(record.party, "UJANG");
    assert_eq!(record.date, "05/03/2025");
    assert_eq!(record.items, draft.items);
    assert_eq!(record.returns, draft.returns);
    assert_eq!(record.total_before_return, 2400);
    assert_eq!(record.total_return, 1200);
    assert_eq!(record.net_total, 1200);
    assert_eq!(record.paid, 1000);
    assert_eq!(record.balance, -200);
    assert_eq!(record.status, "BELUM LUNAS");
    assert_eq!(record.remark, "Kurang Rp 200");
    Ok(())
}

#[test]
fn test_duplicate_receipt_number_rejected() -> Result<()> {
    let (conn, _temp_file) = setup()?;

    let draft = draft_with("PNJ-05-03-25-002", ReceiptKind::Sale, "UJANG", "05/03/2025");
    let totals = draft.totals(2400);
    db::insert_receipt(&conn, 7, &draft, &totals)?;

    let err = db::insert_receipt(&conn, 7, &draft, &totals).unwrap_err();
    assert!(db::is_unique_violation(&err));

    // Unrelated errors are not mistaken for collisions
    let other = anyhow::anyhow!("disk on fire");
    assert!(!db::is_unique_violation(&other));
    Ok(())
}

#[test]
fn test_history_filtering_and_limit() -> Result<()> {
    let (conn, _temp_file) = setup()?;

    let parties = ["UJANG", "ASEP RIDWAN", "UJANG", "Pelanggan Umum"];
    for (i, party) in parties.iter().enumerate() {
        let draft = draft_with(
            &format!("PNJ-05-03-25-{i:03}"),
            ReceiptKind::Sale,
            party,
            "05/03/2025",
        );
        db::insert_receipt(&conn, 7, &draft, &draft.totals(2400))?;
        conn.execute(
            "UPDATE nota_history SET timestamp = ?1 WHERE nomor_nota = ?2",
            rusqlite::params![format!("2025-03-05T10:{i:02}:00+07:00"), draft.number],
        )?;
    }

    let all = db::recent_receipts(&conn, 7, None, 10)?;
    assert_eq!(all.len(), 4);
    assert_eq!(all[0].number, "PNJ-05-03-25-003");

    let limited = db::recent_receipts(&conn, 7, None, 2)?;
    assert_eq!(limited.len(), 2);

    let ujang = db::recent_receipts(&conn, 7, Some("UJANG"), 10)?;
    assert_eq!(ujang.len(), 2);
    assert!(ujang.iter().all(|r| r.party == "UJANG"));
    Ok(())
}

#[test]
fn test_monthly_stats_by_kind_and_month() -> Result<()> {
    let (conn, _temp_file) = setup()?;

    let sale = draft_with("PNJ-05-03-25-001", ReceiptKind::Sale, "UJANG", "05/03/2025");
    db::insert_receipt(&conn, 7, &sale, &sale.totals(2400))?;

    let mut purchase = ReceiptDraft::new(ReceiptKind::Purchase);
    purchase.number = "BLJ-07-03-25-001".to_string();
    purchase.party = "Toko Makmur".to_string();
    purchase.date = "07/03/2025".to_string();
    purchase.items.push(LineItem::new("Minyak", 14000, 1));
    db::insert_receipt(&conn, 7, &purchase, &purchase.totals(14000))?;

    let previous = draft_with("PNJ-05-02-25-001", ReceiptKind::Sale, "UJANG", "05/02/2025");
    db::insert_receipt(&conn, 7, &previous, &previous.totals(2400))?;

    let march = db::monthly_stats(&conn, 7, "03/2025")?;
    assert_eq!(march.sale_count, 1);
    assert_eq!(march.sale_total, 2400);
    assert_eq!(march.purchase_count, 1);
    assert_eq!(march.purchase_total, 14000);

    let february = db::monthly_stats(&conn, 7, "02/2025")?;
    assert_eq!(february.sale_count, 1);
    assert_eq!(february.purchase_count, 0);
    Ok(())
}
