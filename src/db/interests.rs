use crate::domain::{
    Category, ChangeEvent, ChangeType, InterestRecord, InterestStore, NormalizedRecord,
};
use crate::errors::StoreError;
use chrono::NaiveDateTime;
use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use rusqlite::{ffi, params, Connection, OptionalExtension, Row};

pub(crate) const INTEREST_COLUMNS: &str = r#"
    hash, category, member, party, mnis_id, twfy_id, summary, value, payer_name,
    received_date, registered, published, raw_json, first_seen, last_seen
"#;

pub(crate) const CHANGE_COLUMNS: &str = r#"
    id, interest_hash, change_type, detected_at, old_value, new_value, member, category
"#;

impl ToSql for Category {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for Category {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value
            .as_str()?
            .parse()
            .map_err(|e| FromSqlError::Other(Box::new(e)))
    }
}

impl ToSql for ChangeType {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for ChangeType {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        ChangeType::parse(value.as_str()?).ok_or(FromSqlError::InvalidType)
    }
}

/// Maps a row selected with [`INTEREST_COLUMNS`].
pub(crate) fn interest_from_row(row: &Row<'_>) -> rusqlite::Result<InterestRecord> {
    Ok(InterestRecord {
        record: NormalizedRecord {
            hash: row.get("hash")?,
            category: row.get("category")?,
            member: row.get("member")?,
            party: row.get("party")?,
            mnis_id: row.get("mnis_id")?,
            twfy_id: row.get("twfy_id")?,
            summary: row.get("summary")?,
            value: row.get("value")?,
            payer_name: row.get("payer_name")?,
            received_date: row.get("received_date")?,
            registered: row.get("registered")?,
            published: row.get("published")?,
            raw_json: row.get("raw_json")?,
        },
        first_seen: row.get("first_seen")?,
        last_seen: row.get("last_seen")?,
    })
}

/// Maps a row selected with [`CHANGE_COLUMNS`].
pub(crate) fn change_from_row(row: &Row<'_>) -> rusqlite::Result<ChangeEvent> {
    Ok(ChangeEvent {
        id: row.get("id")?,
        interest_hash: row.get("interest_hash")?,
        change_type: row.get("change_type")?,
        detected_at: row.get("detected_at")?,
        old_value: row.get("old_value")?,
        new_value: row.get("new_value")?,
        member: row.get("member")?,
        category: row.get("category")?,
    })
}

/// The `interests` and `changes` tables as seen by the sync engine. Works on a
/// plain connection or, through deref, on an open transaction.
impl InterestStore for Connection {
    fn find_by_hash(&self, hash: &str) -> Result<Option<InterestRecord>, StoreError> {
        let sql = format!("SELECT {INTEREST_COLUMNS} FROM interests WHERE hash = ?1");
        let interest = self
            .prepare_cached(&sql)?
            .query_row(params![hash], interest_from_row)
            .optional()?;
        Ok(interest)
    }

    fn insert(&self, interest: &InterestRecord) -> Result<(), StoreError> {
        let r = &interest.record;
        let mut stmt = self.prepare_cached(
            r#"
            INSERT INTO interests (
                hash, category, member, party, mnis_id, twfy_id, summary, value, payer_name,
                received_date, registered, published, raw_json, first_seen, last_seen
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)
            "#,
        )?;
        let result = stmt.execute(params![
            &r.hash,
            r.category,
            &r.member,
            &r.party,
            r.mnis_id,
            &r.twfy_id,
            &r.summary,
            r.value,
            &r.payer_name,
            &r.received_date,
            &r.registered,
            &r.published,
            &r.raw_json,
            interest.first_seen,
            interest.last_seen,
        ]);

        match result {
            Ok(_) => Ok(()),
            Err(rusqlite::Error::SqliteFailure(err, _))
                if err.extended_code == ffi::SQLITE_CONSTRAINT_UNIQUE =>
            {
                Err(StoreError::DuplicateHash(r.hash.clone()))
            }
            Err(e) => Err(e.into()),
        }
    }

    fn append_change(&self, change: &ChangeEvent) -> Result<(), StoreError> {
        self.prepare_cached(
            r#"
            INSERT INTO changes (
                interest_hash, change_type, detected_at, old_value, new_value, member, category
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
        )?
        .execute(params![
            &change.interest_hash,
            change.change_type,
            change.detected_at,
            &change.old_value,
            &change.new_value,
            &change.member,
            change.category,
        ])?;
        Ok(())
    }

    fn touch_last_seen(&self, hash: &str, at: NaiveDateTime) -> Result<(), StoreError> {
        self.prepare_cached("UPDATE interests SET last_seen = ?1 WHERE hash = ?2")?
            .execute(params![at, hash])?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;
    use crate::domain::normalize::normalize;
    use chrono::NaiveDate;
    use serde_json::json;

    fn at(hour: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 5, 1)
            .unwrap()
            .and_hms_opt(hour, 0, 0)
            .unwrap()
    }

    fn interest() -> InterestRecord {
        let row = json!({
            "member": "A",
            "party": "Green",
            "mnis_id": 12,
            "summary": "gift",
            "value": 100,
            "payer_name": "X",
            "received_date": "2024-01-01",
        });
        let record = normalize(row.as_object().unwrap(), Category::GiftsUk).unwrap();
        InterestRecord::first_seen(record, at(9))
    }

    fn db() -> Database {
        let db = Database::open_in_memory().unwrap();
        db.init().unwrap();
        db
    }

    #[test]
    fn inserted_interest_reads_back_unchanged() {
        let db = db();
        let interest = interest();
        db.conn().insert(&interest).unwrap();

        let stored = db.conn().find_by_hash(interest.hash()).unwrap().unwrap();
        assert_eq!(stored, interest);
    }

    #[test]
    fn unknown_hash_is_absent() {
        assert!(db().conn().find_by_hash("nope").unwrap().is_none());
    }

    #[test]
    fn duplicate_insert_fails_loudly() {
        let db = db();
        let interest = interest();
        db.conn().insert(&interest).unwrap();

        let mut again = interest.clone();
        again.record.summary = Some("overwritten".into());
        let err = db.conn().insert(&again).unwrap_err();
        assert!(matches!(err, StoreError::DuplicateHash(h) if h == interest.hash()));

        let stored = db.conn().find_by_hash(interest.hash()).unwrap().unwrap();
        assert_eq!(stored.record.summary.as_deref(), Some("gift"));
    }

    #[test]
    fn touch_moves_only_last_seen() {
        let db = db();
        let interest = interest();
        db.conn().insert(&interest).unwrap();
        db.conn().touch_last_seen(interest.hash(), at(18)).unwrap();

        let stored = db.conn().find_by_hash(interest.hash()).unwrap().unwrap();
        assert_eq!(stored.first_seen, at(9));
        assert_eq!(stored.last_seen, at(18));
        assert_eq!(stored.record, interest.record);
    }

    #[test]
    fn change_events_are_appended_in_sequence() {
        let db = db();
        let interest = interest();
        db.conn().append_change(&ChangeEvent::new_interest(&interest)).unwrap();
        db.conn().append_change(&ChangeEvent::new_interest(&interest)).unwrap();

        let sql = format!("SELECT {CHANGE_COLUMNS} FROM changes ORDER BY id");
        let mut stmt = db.conn().prepare(&sql).unwrap();
        let changes: Vec<ChangeEvent> = stmt
            .query_map([], change_from_row)
            .unwrap()
            .collect::<Result<_, _>>()
            .unwrap();

        assert_eq!(changes.len(), 2);
        assert_eq!(changes[0].id, Some(1));
        assert_eq!(changes[1].id, Some(2));
        assert_eq!(changes[0].change_type, ChangeType::New);
        assert_eq!(changes[0].category, Category::GiftsUk);
        assert_eq!(changes[0].new_value.as_deref(), Some("gift"));
    }
}
