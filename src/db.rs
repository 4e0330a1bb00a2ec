use anyhow::{Context, Result};
use rusqlite::{params, Connection};
use tracing::info;

use crate::receipt::{LineItem, PaymentStatus, ReceiptDraft, ReceiptKind, Totals};

/// A persisted, completed receipt
#[derive(Debug, Clone, PartialEq)]
pub struct ReceiptRecord {
    pub id: i64,
    pub user_id: i64,
    pub kind: ReceiptKind,
    pub number: String,
    pub party: String,
    pub date: String,
    pub items: Vec<LineItem>,
    pub returns: Vec<LineItem>,
    pub total_before_return: i64,
    pub total_return: i64,
    pub net_total: i64,
    pub paid: i64,
    pub balance: i64,
    pub status: String,
    pub remark: String,
}

/// Per-month totals broken down by receipt kind
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MonthlyStats {
    pub sale_count: i64,
    pub sale_total: i64,
    pub purchase_count: i64,
    pub purchase_total: i64,
}

/// Initialize the database schema
pub fn init_database_schema(conn: &Connection) -> Result<()> {
    info!("Initializing database schema...");

    conn.execute(
        "CREATE TABLE IF NOT EXISTS nota_history (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id INTEGER NOT NULL,
            kind TEXT NOT NULL,
            nomor_nota TEXT NOT NULL UNIQUE,
            party TEXT NOT NULL,
            tanggal TEXT NOT NULL,
            timestamp TEXT NOT NULL,
            daftar_barang TEXT NOT NULL,
            retur_items TEXT NOT NULL,
            total_sebelum_retur INTEGER NOT NULL,
            total_retur INTEGER NOT NULL,
            total_setelah_retur INTEGER NOT NULL,
            bayar INTEGER NOT NULL,
            sisa INTEGER NOT NULL,
            status TEXT NOT NULL,
            keterangan TEXT NOT NULL
        )",
        [],
    )
    .context("Failed to create nota_history table")?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_nota_history_user_time
         ON nota_history (user_id, timestamp)",
        [],
    )
    .context("Failed to create nota_history index")?;

    info!("Database schema initialized successfully");
    Ok(())
}

/// Insert a completed receipt.
///
/// The UNIQUE constraint on `nomor_nota` surfaces as a constraint-violation
/// error here; intentionally no `.context()` on the execute so callers can
/// detect it with [`is_unique_violation`] and regenerate the number.
pub fn insert_receipt(
    conn: &Connection,
    user_id: i64,
    draft: &ReceiptDraft,
    totals: &Totals,
) -> Result<i64> {
    let items_json =
        serde_json::to_string(&draft.items).context("Failed to serialize receipt items")?;
    let returns_json =
        serde_json::to_string(&draft.returns).context("Failed to serialize return items")?;
    let timestamp = chrono::Local::now().to_rfc3339();

    conn.execute(
        "INSERT INTO nota_history (
            user_id, kind, nomor_nota, party, tanggal, timestamp,
            daftar_barang, retur_items,
            total_sebelum_retur, total_retur, total_setelah_retur,
            bayar, sisa, status, keterangan
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)",
        params![
            user_id,
            draft.kind.as_str(),
            draft.number,
            draft.party,
            draft.date,
            timestamp,
            items_json,
            returns_json,
            totals.total_before_return,
            totals.total_return,
            totals.net_total,
            totals.paid,
            totals.balance,
            totals.status.as_str(),
            totals.remark(),
        ],
    )?;

    let receipt_id = conn.last_insert_rowid();
    info!(
        user_id,
        number = %draft.number,
        receipt_id,
        "Receipt stored"
    );

    Ok(receipt_id)
}

/// True when the error is a UNIQUE constraint failure from sqlite
pub fn is_unique_violation(err: &anyhow::Error) -> bool {
    matches!(
        err.downcast_ref::<rusqlite::Error>(),
        Some(rusqlite::Error::SqliteFailure(e, _))
            if e.code == rusqlite::ErrorCode::ConstraintViolation
    )
}

fn record_from_row(row: &rusqlite::Row<'_>) -> Result<ReceiptRecord> {
    let kind_str: String = row.get("kind")?;
    let kind = ReceiptKind::parse(&kind_str)
        .with_context(|| format!("Unknown receipt kind in database: {kind_str}"))?;
    let items_json: String = row.get("daftar_barang")?;
    let returns_json: String = row.get("retur_items")?;

    Ok(ReceiptRecord {
        id: row.get("id")?,
        user_id: row.get("user_id")?,
        kind,
        number: row.get("nomor_nota")?,
        party: row.get("party")?,
        date: row.get("tanggal")?,
        items: serde_json::from_str(&items_json).context("Failed to parse stored items")?,
        returns: serde_json::from_str(&returns_json).context("Failed to parse stored returns")?,
        total_before_return: row.get("total_sebelum_retur")?,
        total_return: row.get("total_retur")?,
        net_total: row.get("total_setelah_retur")?,
        paid: row.get("bayar")?,
        balance: row.get("sisa")?,
        status: row.get("status")?,
        remark: row.get("keterangan")?,
    })
}

/// Most recent receipts for a user, newest first, optionally filtered by party
pub fn recent_receipts(
    conn: &Connection,
    user_id: i64,
    party: Option<&str>,
    limit: u32,
) -> Result<Vec<ReceiptRecord>> {
    let mut records = Vec::new();
    match party {
        Some(party) => {
            let mut stmt = conn
                .prepare(
                    "SELECT * FROM nota_history
                     WHERE user_id = ?1 AND party = ?2
                     ORDER BY timestamp DESC LIMIT ?3",
                )
                .context("Failed to prepare filtered history query")?;
            let mut rows = stmt.query(params![user_id, party, limit])?;
            while let Some(row) = rows.next()? {
                records.push(record_from_row(row)?);
            }
        }
        None => {
            let mut stmt = conn
                .prepare(
                    "SELECT * FROM nota_history
                     WHERE user_id = ?1
                     ORDER BY timestamp DESC LIMIT ?2",
                )
                .context("Failed to prepare history query")?;
            let mut rows = stmt.query(params![user_id, limit])?;
            while let Some(row) = rows.next()? {
                records.push(record_from_row(row)?);
            }
        }
    }
    Ok(records)
}

/// Sale and purchase totals for one month. `month` is "mm/yyyy", matched
/// against the dd/mm/yyyy receipt date.
pub fn monthly_stats(conn: &Connection, user_id: i64, month: &str) -> Result<MonthlyStats> {
    let pattern = format!("%/{month}");
    let mut stmt = conn
        .prepare(
            "SELECT kind, COUNT(*), COALESCE(SUM(total_setelah_retur), 0)
             FROM nota_history
             WHERE user_id = ?1 AND tanggal LIKE ?2
             GROUP BY kind",
        )
        .context("Failed to prepare stats query")?;

    let mut stats = MonthlyStats::default();
    let mut rows = stmt.query(params![user_id, pattern])?;
    while let Some(row) = rows.next()? {
        let kind: String = row.get(0)?;
        let count: i64 = row.get(1)?;
        let total: i64 = row.get(2)?;
        match ReceiptKind::parse(&kind) {
            Some(ReceiptKind::Sale) => {
                stats.sale_count = count;
                stats.sale_total = total;
            }
            Some(ReceiptKind::Purchase) => {
                stats.purchase_count = count;
                stats.purchase_total = total;
            }
            None => {}
        }
    }
    Ok(stats)
}

/// Paid/unpaid marker used in history listings
pub fn status_marker(status: &str) -> &'static str {
    if status == PaymentStatus::Paid.as_str() {
        "✅"
    } else {
        "⏳"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    fn setup_test_db() -> Result<(Connection, NamedTempFile)> {
        let temp_file = NamedTempFile::new()?;
        let conn = Connection::open(temp_file.path())?;
        init_database_schema(&conn)?;
        Ok((conn, temp_file))
    }

    fn sample_draft(number: &str) -> ReceiptDraft {
        let mut draft = ReceiptDraft::new(ReceiptKind::Sale);
        draft.number = number.to_string();
        draft.party = "UJANG".to_string();
        draft.items.push(LineItem::new("Kc Bawang Renceng", 1200, 2));
        draft
    }

    #[test]
    fn test_insert_and_read_back() -> Result<()> {
        let (conn, _temp_file) = setup_test_db()?;

        let draft = sample_draft("PNJ-01-01-25-001");
        let totals = draft.totals(2400);
        let id = insert_receipt(&conn, 42, &draft, &totals)?;
        assert!(id > 0);

        let records = recent_receipts(&conn, 42, None, 10)?;
        assert_eq!(records.len(), 1);
        let record = &records[0];
        assert_eq!(record.number, "PNJ-01-01-25-001");
        assert_eq!(record.kind, ReceiptKind::Sale);
        assert_eq!(record.items, draft.items);
        assert_eq!(record.net_total, 2400);
        assert_eq!(record.status, "LUNAS");

        Ok(())
    }

    #[test]
    fn test_duplicate_number_is_unique_violation() -> Result<()> {
        let (conn, _temp_file) = setup_test_db()?;

        let draft = sample_draft("PNJ-01-01-25-002");
        let totals = draft.totals(2400);
        insert_receipt(&conn, 42, &draft, &totals)?;

        let err = insert_receipt(&conn, 42, &draft, &totals).unwrap_err();
        assert!(is_unique_violation(&err));

        Ok(())
    }

    #[test]
    fn test_recent_receipts_newest_first_and_limited() -> Result<()> {
        let (conn, _temp_file) = setup_test_db()?;

        for i in 0..5 {
            let mut draft = sample_draft(&format!("PNJ-01-01-25-{i:03}"));
            draft.party = if i % 2 == 0 { "UJANG" } else { "ASEP RIDWAN" }.to_string();
            let totals = draft.totals(0);
            insert_receipt(&conn, 42, &draft, &totals)?;
            // rfc3339 timestamps at the same second still order by rowid,
            // so force distinct timestamps
            conn.execute(
                "UPDATE nota_history SET timestamp = ?1 WHERE nomor_nota = ?2",
                params![format!("2025-01-01T10:{i:02}:00+07:00"), draft.number],
            )?;
        }

        let records = recent_receipts(&conn, 42, None, 3)?;
        assert_eq!(records.len(), 3);
        assert_eq!(records[0].number, "PNJ-01-01-25-004");
        assert_eq!(records[2].number, "PNJ-01-01-25-002");

        let filtered = recent_receipts(&conn, 42, Some("UJANG"), 10)?;
        assert_eq!(filtered.len(), 3);
        assert!(filtered.iter().all(|r| r.party == "UJANG"));

        Ok(())
    }

    #[test]
    fn test_recent_receipts_scoped_to_user() -> Result<()> {
        let (conn, _temp_file) = setup_test_db()?;

        let draft = sample_draft("PNJ-01-01-25-010");
        let totals = draft.totals(0);
        insert_receipt(&conn, 42, &draft, &totals)?;

        let records = recent_receipts(&conn, 99, None, 10)?;
        assert!(records.is_empty());

        Ok(())
    }

    #[test]
    fn test_returns_round_trip_through_json() -> Result<()> {
        let (conn, _temp_file) = setup_test_db()?;

        let mut draft = sample_draft("PNJ-01-01-25-020");
        draft.returns.push(LineItem::new("Kc Bawang Renceng", 1200, 1));
        let totals = draft.totals(1200);
        insert_receipt(&conn, 42, &draft, &totals)?;

        let records = recent_receipts(&conn, 42, None, 1)?;
        assert_eq!(records[0].returns, draft.returns);
        assert_eq!(records[0].total_return, 1200);
        assert_eq!(records[0].net_total, 1200);

        Ok(())
    }

    #[test]
    fn test_monthly_stats_split_by_kind() -> Result<()> {
        let (conn, _temp_file) = setup_test_db()?;

        let mut sale = sample_draft("PNJ-05-03-25-001");
        sale.date = "05/03/2025".to_string();
        insert_receipt(&conn, 42, &sale, &sale.totals(2400))?;

        let mut purchase = ReceiptDraft::new(ReceiptKind::Purchase);
        purchase.number = "BLJ-06-03-25-001".to_string();
        purchase.party = "Toko Makmur".to_string();
        purchase.date = "06/03/2025".to_string();
        purchase.items.push(LineItem::new("Minyak", 14000, 2));
        insert_receipt(&conn, 42, &purchase, &purchase.totals(28000))?;

        let mut other_month = sample_draft("PNJ-05-04-25-001");
        other_month.date = "05/04/2025".to_string();
        insert_receipt(&conn, 42, &other_month, &other_month.totals(2400))?;

        let stats = monthly_stats(&conn, 42, "03/2025")?;
        assert_eq!(stats.sale_count, 1);
        assert_eq!(stats.sale_total, 2400);
        assert_eq!(stats.purchase_count, 1);
        assert_eq!(stats.purchase_total, 28000);

        Ok(())
    }

    #[test]
    fn test_monthly_stats_empty_month() -> Result<()> {
        let (conn, _temp_file) = setup_test_db()?;

        let stats = monthly_stats(&conn, 42, "12/2030")?;
        assert_eq!(stats, MonthlyStats::default());

        Ok(())
    }
}
