// pipeline.rs
use crate::config::SyncConfig;
use crate::db::runs::{finish_sync_run, start_sync_run};
use crate::db::{Database, RunOutcome};
use crate::domain::{SyncEngine, SyncStats};
use crate::errors::RunError;
use crate::feed::{fetch_all, FeedSource};
use crate::reports::export_reports;
use chrono::{NaiveDateTime, Utc};
use std::path::PathBuf;
use tracing::{error, info, warn};

/// What a finished run reports back to the operator.
#[derive(Debug)]
pub struct RunSummary {
    pub run_id: i64,
    pub synced_at: NaiveDateTime,
    pub stats: SyncStats,
    /// Categories whose fetch failed and were treated as empty.
    pub failed_categories: Vec<String>,
    pub reports: Vec<PathBuf>,
}

/// Opens the configured database, creating the schema if needed.
pub fn open_database(config: &SyncConfig) -> Result<Database, RunError> {
    let db = Database::open(&config.db_path)?;
    db.init()?;
    Ok(db)
}

/// One full pass: fetch every category, reconcile with the store, export reports.
pub fn run_sync<S>(config: &SyncConfig, source: &S) -> Result<RunSummary, RunError>
where
    S: FeedSource + ?Sized,
{
    run_sync_at(config, source, Utc::now().naive_utc())
}

/// [`run_sync`] with the run's timestamp supplied by the caller. Every record
/// created or refreshed by the run carries `now`.
pub fn run_sync_at<S>(
    config: &SyncConfig,
    source: &S,
    now: NaiveDateTime,
) -> Result<RunSummary, RunError>
where
    S: FeedSource + ?Sized,
{
    config.setup_directories()?;
    let mut db = open_database(config)?;

    let origin = source.describe();
    let run_id = start_sync_run(db.conn(), &origin, now)?;
    info!(run_id, source = %origin, "sync run started");

    let fetched = fetch_all(source, &config.category_list());
    let failed_categories = fetched.failed_categories();

    let engine = SyncEngine::new(config.field_policy.clone());
    let stats = match db.sync_datasets(&engine, &fetched.datasets, now) {
        Ok(stats) => stats,
        Err(e) => {
            error!(run_id, error = %e, "sync failed, nothing committed");
            let outcome = RunOutcome {
                failed_categories,
                error: Some(e.to_string()),
                ..RunOutcome::default()
            };
            if let Err(log_err) = finish_sync_run(db.conn(), run_id, Utc::now().naive_utc(), &outcome)
            {
                warn!(run_id, error = %log_err, "could not record failed run");
            }
            return Err(e.into());
        }
    };

    finish_sync_run(
        db.conn(),
        run_id,
        Utc::now().naive_utc(),
        &RunOutcome {
            total: stats.total,
            new: stats.new,
            skipped: stats.skipped,
            failed_categories: failed_categories.clone(),
            error: None,
        },
    )?;
    info!(
        run_id,
        total = stats.total,
        new = stats.new,
        skipped = stats.skipped,
        failed = failed_categories.len(),
        "sync run finished"
    );

    let reports = export_reports(db.conn(), config)?;

    Ok(RunSummary {
        run_id,
        synced_at: now,
        stats,
        failed_categories,
        reports,
    })
}
