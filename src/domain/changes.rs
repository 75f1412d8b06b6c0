// src/domain/changes.rs

use crate::domain::{Category, InterestRecord};
use chrono::NaiveDateTime;
use std::fmt;

/// Kind of audit entry. Only first sightings are recorded today.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeType {
    New,
}

impl ChangeType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChangeType::New => "new",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "new" => Some(ChangeType::New),
            _ => None,
        }
    }
}

impl fmt::Display for ChangeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An entry of the append-only `changes` log.
#[derive(Debug, Clone, PartialEq)]
pub struct ChangeEvent {
    /// Sequence number, assigned by the store on append.
    pub id: Option<i64>,
    pub interest_hash: String,
    pub change_type: ChangeType,
    pub detected_at: NaiveDateTime,
    pub old_value: Option<String>,
    pub new_value: Option<String>,
    pub member: Option<String>,
    pub category: Category,
}

impl ChangeEvent {
    /// The event logged when `interest` is stored for the first time.
    pub fn new_interest(interest: &InterestRecord) -> Self {
        let record = &interest.record;
        Self {
            id: None,
            interest_hash: record.hash.clone(),
            change_type: ChangeType::New,
            detected_at: interest.first_seen,
            old_value: None,
            new_value: record.summary.clone(),
            member: record.member.clone(),
            category: record.category,
        }
    }
}
