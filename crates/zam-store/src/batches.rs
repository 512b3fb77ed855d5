use chrono::Utc;
use rusqlite::{Connection, params};
use tracing::debug;

use crate::StoreError;

pub fn create_batch(conn: &Connection) -> Result<i64, StoreError> {
    conn.execute(
        "INSERT INTO batches (created_at) VALUES (?1)",
        params![Utc::now().to_rfc3339()],
    )?;
    let id = conn.last_insert_rowid();
    debug!(batch_id = id, "created batch");
    Ok(id)
}

/// Delete batches no amendement points to anymore.
pub fn delete_empty_batches(conn: &Connection) -> Result<usize, StoreError> {
    let deleted = conn.execute(
        "DELETE FROM batches WHERE id NOT IN
           (SELECT batch_id FROM amendements WHERE batch_id IS NOT NULL)",
        [],
    )?;
    Ok(deleted)
}
