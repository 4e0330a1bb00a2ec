//! Finalization of a completed draft: persist, then render.
//!
//! The receipt is stored before any text goes back to the user, so a render
//! problem can never lose a sale. Receipt-number collisions are resolved by
//! regenerating the random suffix and retrying the insert.

use std::sync::Arc;

use rusqlite::Connection;
use tokio::sync::Mutex;
use tracing::{error, warn};

use crate::db;
use crate::error::NotaError;
use crate::receipt::{generate_receipt_number, ReceiptDraft};
use crate::render::render_receipt;

const MAX_INSERT_ATTEMPTS: u32 = 3;

/// Persist the draft and return the rendered receipt text.
///
/// Errors are [`NotaError::Persistence`] when the receipt could not be
/// stored, and [`NotaError::Render`] when it was stored but could not be
/// rendered.
pub async fn finalize_receipt(
    conn: &Arc<Mutex<Connection>>,
    user_id: i64,
    mut draft: ReceiptDraft,
    paid: i64,
) -> Result<String, NotaError> {
    let totals = draft.totals(paid);

    {
        let conn = conn.lock().await;
        let mut attempts = 0;
        loop {
            match db::insert_receipt(&conn, user_id, &draft, &totals) {
                Ok(_) => break,
                Err(err) if db::is_unique_violation(&err) && attempts + 1 < MAX_INSERT_ATTEMPTS => {
                    attempts += 1;
                    let fresh = generate_receipt_number(draft.kind);
                    warn!(
                        user_id,
                        colliding = %draft.number,
                        regenerated = %fresh,
                        "Receipt number collision, retrying"
                    );
                    draft.number = fresh;
                }
                Err(err) => {
                    error!(user_id, error = %err, "Failed to store receipt");
                    return Err(NotaError::Persistence(err.to_string()));
                }
            }
        }
    }

    render_receipt(&draft, &totals)
}
