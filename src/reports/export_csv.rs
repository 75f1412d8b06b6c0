use crate::errors::ReportError;
use crate::reports::{Cell, Table};
use std::path::{Path, PathBuf};

/// Writes each table to `<dir>/<name>.csv`.
pub fn write_tables(dir: &Path, tables: &[Table]) -> Result<Vec<PathBuf>, ReportError> {
    let mut written = Vec::with_capacity(tables.len());
    for table in tables {
        let path = dir.join(format!("{}.csv", table.name));
        let mut wtr = csv::Writer::from_path(&path)?;
        wtr.write_record(table.headers)?;
        for row in &table.rows {
            wtr.write_record(row.iter().map(render))?;
        }
        wtr.flush()?;
        written.push(path);
    }
    Ok(written)
}

fn render(cell: &Cell) -> String {
    match cell {
        Cell::Text(s) => s.clone(),
        Cell::Number(n) => n.to_string(),
        Cell::Empty => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writes_header_and_rows() {
        let dir = tempfile::tempdir().unwrap();
        let table = Table {
            name: "top_earners".into(),
            headers: &["member", "total"],
            rows: vec![
                vec![Cell::Text("Ann, MP".into()), Cell::Number(750.5)],
                vec![Cell::Empty, Cell::Number(10.0)],
            ],
        };

        let paths = write_tables(dir.path(), &[table]).unwrap();
        let text = std::fs::read_to_string(&paths[0]).unwrap();
        assert_eq!(text, "member,total\n\"Ann, MP\",750.5\n,10\n");
    }
}
