use crate::domain::RawRow;
use crate::feed::FeedError;
use serde_json::Value;
use std::io::Read;
use tracing::debug;

/// Reads a published CSV into rows keyed by header. Empty cells become
/// `Null`; every other cell stays text exactly as published, numbers included.
pub fn parse_csv<R: Read>(reader: R) -> Result<Vec<RawRow>, FeedError> {
    let mut rdr = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::Headers)
        .from_reader(reader);
    let headers = rdr.headers()?.clone();

    let mut rows = Vec::new();
    for (index, record) in rdr.records().enumerate() {
        let record = record?;
        if record.len() != headers.len() {
            debug!(
                row = index,
                expected = headers.len(),
                found = record.len(),
                "ragged CSV row"
            );
        }
        // Short rows leave trailing columns absent; extra cells are dropped.
        let row: RawRow = headers
            .iter()
            .zip(record.iter())
            .map(|(column, cell)| (column.to_string(), parse_cell(cell)))
            .collect();
        rows.push(row);
    }
    Ok(rows)
}

fn parse_cell(cell: &str) -> Value {
    if cell.trim().is_empty() {
        Value::Null
    } else {
        Value::String(cell.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::normalize::normalize;
    use crate::domain::Category;
    use serde_json::json;

    #[test]
    fn cells_stay_text() {
        let csv = "member,value,mnis_id,received_date,summary\n\
                   Jane Doe,1500.50,172,2024-01-01,\"Speech, London\"\n";
        let rows = parse_csv(csv.as_bytes()).unwrap();

        assert_eq!(rows.len(), 1);
        let row = &rows[0];
        assert_eq!(row["member"], json!("Jane Doe"));
        assert_eq!(row["value"], json!("1500.50"));
        assert_eq!(row["mnis_id"], json!("172"));
        assert_eq!(row["received_date"], json!("2024-01-01"));
        assert_eq!(row["summary"], json!("Speech, London"));
    }

    #[test]
    fn empty_cells_are_null() {
        let rows = parse_csv("member,value,payer_name\nJane,,\n".as_bytes()).unwrap();
        assert_eq!(rows[0]["value"], Value::Null);
        assert_eq!(rows[0]["payer_name"], Value::Null);
    }

    #[test]
    fn short_rows_leave_columns_absent() {
        let rows = parse_csv("member,summary,value\nJane,gift\n".as_bytes()).unwrap();
        assert_eq!(rows[0].get("value"), None);
        assert_eq!(rows[0]["summary"], json!("gift"));
    }

    #[test]
    fn headers_only_means_no_rows() {
        assert!(parse_csv("member,value\n".as_bytes()).unwrap().is_empty());
    }

    #[test]
    fn numeric_looking_text_survives_normalization() {
        let csv = "member,summary,value,payer_name,received_date\n\
                   A,1.50,100,007,20240101\n";
        let rows = parse_csv(csv.as_bytes()).unwrap();
        let record = normalize(&rows[0], Category::GiftsUk).unwrap();

        assert_eq!(record.payer_name.as_deref(), Some("007"));
        assert_eq!(record.summary.as_deref(), Some("1.50"));
        assert_eq!(record.received_date.as_deref(), Some("20240101"));
        assert_eq!(record.value, Some(100.0));

        let raw: Value = serde_json::from_str(&record.raw_json).unwrap();
        assert_eq!(raw["payer_name"], json!("007"));
        assert_eq!(raw["summary"], json!("1.50"));
        assert_eq!(raw["received_date"], json!("20240101"));
        assert_eq!(raw["value"], json!("100"));
    }

    #[test]
    fn nan_stays_text() {
        let rows = parse_csv("value\nNaN\n".as_bytes()).unwrap();
        assert_eq!(rows[0]["value"], json!("NaN"));
    }
}
