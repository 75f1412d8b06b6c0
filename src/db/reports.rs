use crate::db::interests::{change_from_row, interest_from_row, CHANGE_COLUMNS, INTEREST_COLUMNS};
use crate::domain::{Category, ChangeEvent, InterestRecord};
use crate::errors::StoreError;
use rusqlite::{params, Connection};

/// A member ranked by the summed value of their disclosed interests.
#[derive(Debug, Clone, PartialEq)]
pub struct TopMember {
    pub member: Option<String>,
    pub party: Option<String>,
    pub total_value: f64,
    /// Interests with a value; unvalued ones don't count.
    pub num_interests: i64,
}

/// Members by total declared value, highest first. Interests without a value
/// are left out; ties are ordered by member name.
pub fn top_members(conn: &Connection, limit: usize) -> Result<Vec<TopMember>, StoreError> {
    let mut stmt = conn.prepare(
        r#"
        SELECT member, MAX(party) AS party, SUM(value) AS total_value, COUNT(*) AS num_interests
        FROM interests
        WHERE value IS NOT NULL
        GROUP BY member
        ORDER BY total_value DESC, member ASC
        LIMIT ?1
        "#,
    )?;

    let rows = stmt.query_map(params![limit as i64], |row| {
        Ok(TopMember {
            member: row.get("member")?,
            party: row.get("party")?,
            total_value: row.get("total_value")?,
            num_interests: row.get("num_interests")?,
        })
    })?;

    let mut members = Vec::new();
    for row in rows {
        members.push(row?);
    }
    Ok(members)
}

/// The latest change events, newest first.
pub fn recent_changes(conn: &Connection, limit: usize) -> Result<Vec<ChangeEvent>, StoreError> {
    let sql = format!(
        "SELECT {CHANGE_COLUMNS} FROM changes ORDER BY detected_at DESC, id DESC LIMIT ?1"
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params![limit as i64], change_from_row)?;

    let mut changes = Vec::new();
    for row in rows {
        changes.push(row?);
    }
    Ok(changes)
}

/// Every stored interest in `category`, in insertion order.
pub fn interests_by_category(
    conn: &Connection,
    category: Category,
) -> Result<Vec<InterestRecord>, StoreError> {
    let sql = format!("SELECT {INTEREST_COLUMNS} FROM interests WHERE category = ?1 ORDER BY id");
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params![category], interest_from_row)?;

    let mut interests = Vec::new();
    for row in rows {
        interests.push(row?);
    }
    Ok(interests)
}

pub fn count_interests(conn: &Connection) -> Result<i64, StoreError> {
    Ok(conn.query_row("SELECT COUNT(*) FROM interests", [], |r| r.get(0))?)
}

pub fn count_changes(conn: &Connection) -> Result<i64, StoreError> {
    Ok(conn.query_row("SELECT COUNT(*) FROM changes", [], |r| r.get(0))?)
}
