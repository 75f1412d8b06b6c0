use crate::errors::ReportError;
use crate::reports::{Cell, Table};
use rust_xlsxwriter::Workbook;
use std::path::{Path, PathBuf};

/// Excel's limit on worksheet names.
const MAX_SHEET_NAME: usize = 31;

/// Writes every table to its own worksheet of one workbook at `path`.
pub fn write_workbook(path: &Path, tables: &[Table]) -> Result<PathBuf, ReportError> {
    let mut workbook = Workbook::new();

    for table in tables {
        let worksheet = workbook.add_worksheet();
        let name: String = table.name.chars().take(MAX_SHEET_NAME).collect();
        worksheet.set_name(name)?;

        for (col, header) in table.headers.iter().enumerate() {
            worksheet.write_string(0, col as u16, *header)?;
        }

        for (i, row) in table.rows.iter().enumerate() {
            let r = (i + 1) as u32;
            for (col, cell) in row.iter().enumerate() {
                let c = col as u16;
                match cell {
                    Cell::Text(s) => {
                        worksheet.write_string(r, c, s)?;
                    }
                    Cell::Number(n) => {
                        worksheet.write_number(r, c, *n)?;
                    }
                    Cell::Empty => {}
                }
            }
        }
    }

    workbook.save(path)?;
    Ok(path.to_path_buf())
}
