use crate::errors::StoreError;
use chrono::NaiveDateTime;
use rusqlite::{params, Connection};

/// One row of the `sync_runs` history table.
#[derive(Debug, Clone, PartialEq)]
pub struct SyncRun {
    pub id: i64,
    pub source: String,
    pub started_at: NaiveDateTime,
    pub finished_at: Option<NaiveDateTime>,
    pub total: Option<i64>,
    pub new: Option<i64>,
    pub skipped: Option<i64>,
    pub failed_categories: Option<String>,
    pub success: bool,
    pub error_message: Option<String>,
}

/// How a run ended, written back by [`finish_sync_run`].
#[derive(Debug, Default, Clone, PartialEq)]
pub struct RunOutcome {
    pub total: usize,
    pub new: usize,
    pub skipped: usize,
    pub failed_categories: Vec<String>,
    pub error: Option<String>,
}

pub fn start_sync_run(
    conn: &Connection,
    source: &str,
    now: NaiveDateTime,
) -> Result<i64, StoreError> {
    conn.execute(
        "INSERT INTO sync_runs (source, started_at, success) VALUES (?1, ?2, 0)",
        params![source, now],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn finish_sync_run(
    conn: &Connection,
    run_id: i64,
    now: NaiveDateTime,
    outcome: &RunOutcome,
) -> Result<(), StoreError> {
    let failed = (!outcome.failed_categories.is_empty())
        .then(|| outcome.failed_categories.join(","));

    conn.execute(
        r#"
        UPDATE sync_runs
        SET finished_at = ?1, total = ?2, new = ?3, skipped = ?4,
            failed_categories = ?5, success = ?6, error_message = ?7
        WHERE id = ?8
        "#,
        params![
            now,
            outcome.total as i64,
            outcome.new as i64,
            outcome.skipped as i64,
            failed,
            outcome.error.is_none(),
            &outcome.error,
            run_id,
        ],
    )?;
    Ok(())
}

pub fn recent_sync_runs(conn: &Connection, limit: usize) -> Result<Vec<SyncRun>, StoreError> {
    let mut stmt = conn.prepare(
        r#"
        SELECT id, source, started_at, finished_at, total, new, skipped,
               failed_categories, success, error_message
        FROM sync_runs
        ORDER BY started_at DESC, id DESC
        LIMIT ?1
        "#,
    )?;

    let rows = stmt.query_map(params![limit as i64], |row| {
        Ok(SyncRun {
            id: row.get(0)?,
            source: row.get(1)?,
            started_at: row.get(2)?,
            finished_at: row.get(3)?,
            total: row.get(4)?,
            new: row.get(5)?,
            skipped: row.get(6)?,
            failed_categories: row.get(7)?,
            success: row.get(8)?,
            error_message: row.get(9)?,
        })
    })?;

    let mut runs = Vec::new();
    for r in rows {
        runs.push(r?);
    }
    Ok(runs)
}
