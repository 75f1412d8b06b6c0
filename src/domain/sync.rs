// src/domain/sync.rs

use crate::domain::{Category, ChangeEvent, FieldPolicy, InterestRecord, NormalizedRecord, RawRow};
use crate::errors::StoreError;
use chrono::NaiveDateTime;
use std::collections::BTreeMap;
use tracing::{debug, info, warn};

/// Freshly fetched rows, grouped by the category they were published under.
pub type Datasets = BTreeMap<Category, Vec<RawRow>>;

/// What the sync engine needs from durable storage.
///
/// `insert` must refuse a hash that is already stored with
/// [`StoreError::DuplicateHash`] rather than overwrite it.
pub trait InterestStore {
    fn find_by_hash(&self, hash: &str) -> Result<Option<InterestRecord>, StoreError>;
    fn insert(&self, interest: &InterestRecord) -> Result<(), StoreError>;
    fn append_change(&self, change: &ChangeEvent) -> Result<(), StoreError>;
    fn touch_last_seen(&self, hash: &str, at: NaiveDateTime) -> Result<(), StoreError>;
}

/// Counts reported at the end of a run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SyncStats {
    /// Rows reconciled against the store.
    pub total: usize,
    /// Rows stored for the first time.
    pub new: usize,
    /// Rows already stored whose `last_seen` moved forward.
    pub touched: usize,
    /// Malformed rows left out of the run.
    pub skipped: usize,
}

/// Reconciles fetched rows with stored interests.
#[derive(Debug, Clone, Default)]
pub struct SyncEngine {
    policy: FieldPolicy,
}

impl SyncEngine {
    pub fn new(policy: FieldPolicy) -> Self {
        Self { policy }
    }

    /// Walks every row once. Unseen hashes are inserted together with a
    /// `new` change event, known ones only get `last_seen = now`.
    ///
    /// A store error aborts the run; the caller owns the transaction and
    /// decides whether anything is committed.
    pub fn sync<S>(
        &self,
        datasets: &Datasets,
        store: &S,
        now: NaiveDateTime,
    ) -> Result<SyncStats, StoreError>
    where
        S: InterestStore + ?Sized,
    {
        let mut stats = SyncStats::default();

        for (category, rows) in datasets {
            if rows.is_empty() {
                debug!(%category, "no rows, skipping category");
                continue;
            }

            let before = stats;
            for (index, row) in rows.iter().enumerate() {
                let record = match self.policy.normalize(row, *category) {
                    Ok(record) => record,
                    Err(e) => {
                        warn!(%category, row = index, error = %e, "skipping malformed row");
                        stats.skipped += 1;
                        continue;
                    }
                };

                if reconcile(store, record, now)? {
                    stats.new += 1;
                } else {
                    stats.touched += 1;
                }
                stats.total += 1;
            }

            info!(
                %category,
                rows = stats.total - before.total,
                new = stats.new - before.new,
                skipped = stats.skipped - before.skipped,
                "category synced"
            );
        }

        Ok(stats)
    }
}

/// Returns `true` when the record was stored for the first time.
fn reconcile<S>(store: &S, record: NormalizedRecord, now: NaiveDateTime) -> Result<bool, StoreError>
where
    S: InterestStore + ?Sized,
{
    if store.find_by_hash(&record.hash)?.is_some() {
        store.touch_last_seen(&record.hash, now)?;
        return Ok(false);
    }

    let interest = InterestRecord::first_seen(record, now);
    match store.insert(&interest) {
        Ok(()) => {
            store.append_change(&ChangeEvent::new_interest(&interest))?;
            Ok(true)
        }
        // Another writer stored the same hash between lookup and insert.
        Err(StoreError::DuplicateHash(hash)) => {
            debug!(%hash, "hash inserted concurrently, refreshing instead");
            store.touch_last_seen(&hash, now)?;
            Ok(false)
        }
        Err(e) => Err(e),
    }
}
