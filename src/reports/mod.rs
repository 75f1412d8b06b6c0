pub mod export_csv;
pub mod export_xlsx;

use crate::config::{ReportFormat, SyncConfig};
use crate::db::reports::{interests_by_category, recent_changes, top_members};
use crate::db::TopMember;
use crate::domain::{ChangeEvent, InterestRecord};
use crate::errors::ReportError;
use chrono::NaiveDateTime;
use rusqlite::Connection;
use std::path::PathBuf;
use tracing::info;

/// A single spreadsheet cell.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Text(String),
    Number(f64),
    Empty,
}

impl Cell {
    fn text(value: &Option<String>) -> Self {
        value.clone().map(Cell::Text).unwrap_or(Cell::Empty)
    }

    fn time(value: NaiveDateTime) -> Self {
        Cell::Text(value.format("%Y-%m-%d %H:%M:%S").to_string())
    }
}

/// One report view: a named table ready for any writer.
#[derive(Debug, Clone)]
pub struct Table {
    pub name: String,
    pub headers: &'static [&'static str],
    pub rows: Vec<Vec<Cell>>,
}

const TOP_MEMBER_HEADERS: &[&str] = &["member", "party", "total_earnings", "num_interests"];

const CHANGE_HEADERS: &[&str] = &[
    "id",
    "interest_hash",
    "change_type",
    "detected_at",
    "old_value",
    "new_value",
    "member",
    "category",
];

const INTEREST_HEADERS: &[&str] = &[
    "hash",
    "category",
    "member",
    "party",
    "mnis_id",
    "twfy_id",
    "summary",
    "value",
    "payer_name",
    "received_date",
    "registered",
    "published",
    "raw_json",
    "first_seen",
    "last_seen",
];

fn top_members_table(members: &[TopMember]) -> Table {
    let rows = members
        .iter()
        .map(|m| {
            vec![
                Cell::text(&m.member),
                Cell::text(&m.party),
                Cell::Number(m.total_value),
                Cell::Number(m.num_interests as f64),
            ]
        })
        .collect();
    Table {
        name: "top_earners".into(),
        headers: TOP_MEMBER_HEADERS,
        rows,
    }
}

fn changes_table(changes: &[ChangeEvent]) -> Table {
    let rows = changes
        .iter()
        .map(|c| {
            vec![
                c.id.map(|id| Cell::Number(id as f64)).unwrap_or(Cell::Empty),
                Cell::Text(c.interest_hash.clone()),
                Cell::Text(c.change_type.to_string()),
                Cell::time(c.detected_at),
                Cell::text(&c.old_value),
                Cell::text(&c.new_value),
                Cell::text(&c.member),
                Cell::Text(c.category.to_string()),
            ]
        })
        .collect();
    Table {
        name: "recent_changes".into(),
        headers: CHANGE_HEADERS,
        rows,
    }
}

fn interests_table(name: String, interests: &[InterestRecord]) -> Table {
    let rows = interests
        .iter()
        .map(|i| {
            let r = &i.record;
            vec![
                Cell::Text(r.hash.clone()),
                Cell::Text(r.category.to_string()),
                Cell::text(&r.member),
                Cell::text(&r.party),
                r.mnis_id.map(|n| Cell::Number(n as f64)).unwrap_or(Cell::Empty),
                Cell::text(&r.twfy_id),
                Cell::text(&r.summary),
                r.value.map(Cell::Number).unwrap_or(Cell::Empty),
                Cell::text(&r.payer_name),
                Cell::text(&r.received_date),
                Cell::text(&r.registered),
                Cell::text(&r.published),
                Cell::Text(r.raw_json.clone()),
                Cell::time(i.first_seen),
                Cell::time(i.last_seen),
            ]
        })
        .collect();
    Table {
        name,
        headers: INTEREST_HEADERS,
        rows,
    }
}

/// Reads every report view from the store.
pub fn build_tables(conn: &Connection, config: &SyncConfig) -> Result<Vec<Table>, ReportError> {
    let mut tables = vec![
        top_members_table(&top_members(conn, config.top_members_limit)?),
        changes_table(&recent_changes(conn, config.recent_changes_limit)?),
    ];
    for &category in &config.report_categories {
        let interests = interests_by_category(conn, category)?;
        tables.push(interests_table(format!("{category}_full"), &interests));
    }
    Ok(tables)
}

/// Writes all reports to `config.output_dir` and returns the files written.
pub fn export_reports(conn: &Connection, config: &SyncConfig) -> Result<Vec<PathBuf>, ReportError> {
    let tables = build_tables(conn, config)?;
    std::fs::create_dir_all(&config.output_dir)?;

    let written = match config.report_format {
        ReportFormat::Csv => export_csv::write_tables(&config.output_dir, &tables)?,
        ReportFormat::Xlsx => {
            vec![export_xlsx::write_workbook(&config.output_dir.join("reports.xlsx"), &tables)?]
        }
    };

    info!(
        dir = %config.output_dir.display(),
        files = written.len(),
        "reports exported"
    );
    Ok(written)
}
