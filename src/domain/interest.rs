// src/domain/interest.rs

use crate::domain::Category;
use chrono::NaiveDateTime;

/// One disclosed interest as read from the register, cleaned and identified.
/// Nothing here depends on when it was seen, so the same row always yields
/// the same value.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedRecord {
    pub category: Category,
    pub member: Option<String>,
    pub party: Option<String>,
    pub mnis_id: Option<i64>,
    pub twfy_id: Option<String>,
    pub summary: Option<String>,
    pub value: Option<f64>,
    pub payer_name: Option<String>,
    pub received_date: Option<String>,
    pub registered: Option<String>,
    pub published: Option<String>,
    /// The source row verbatim, kept for forensics.
    pub raw_json: String,
    /// Deduplication key, see [`crate::domain::normalize::identity_hash`].
    pub hash: String,
}

/// A normalized record as stored in the `interests` table.
///
/// Only `last_seen` ever changes after the first insert.
#[derive(Debug, Clone, PartialEq)]
pub struct InterestRecord {
    pub record: NormalizedRecord,
    pub first_seen: NaiveDateTime,
    pub last_seen: NaiveDateTime,
}

impl InterestRecord {
    /// A record seen for the first time during the run stamped `now`.
    pub fn first_seen(record: NormalizedRecord, now: NaiveDateTime) -> Self {
        Self {
            record,
            first_seen: now,
            last_seen: now,
        }
    }

    pub fn hash(&self) -> &str {
        &self.record.hash
    }
}
