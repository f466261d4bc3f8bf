// Ledger loading: any supported spreadsheet becomes a grid of cells, and the
// grid becomes engine rows once the subject column is located.

use std::path::{Path, PathBuf};

use ledgerdoc_recon::config::LedgerConfig;
use ledgerdoc_recon::{LedgerInput, LedgerRow, ReconError};

use crate::error::IoError;

/// One spreadsheet cell, as far as ledgers care.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Empty,
    Text(String),
    Number(f64),
    /// Spreadsheet date serial.
    Date(f64),
    Bool(bool),
}

impl Cell {
    /// Display text: integers without `.0`, booleans as TRUE/FALSE.
    pub fn display(&self) -> String {
        match self {
            Self::Empty => String::new(),
            Self::Text(s) => s.clone(),
            Self::Number(n) | Self::Date(n) => {
                if n.fract() == 0.0 && n.abs() < 1e15 {
                    format!("{}", *n as i64)
                } else {
                    format!("{n}")
                }
            }
            Self::Bool(true) => "TRUE".to_string(),
            Self::Bool(false) => "FALSE".to_string(),
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Self::Empty => true,
            Self::Text(s) => s.trim().is_empty(),
            _ => false,
        }
    }
}

/// A ledger's chosen worksheet. `rows[0]` is sheet row 1.
#[derive(Debug, Clone, PartialEq)]
pub struct LedgerSheet {
    pub path: PathBuf,
    pub sheet_name: String,
    pub rows: Vec<Vec<Cell>>,
}

impl LedgerSheet {
    /// File name used for logs, reports and the output prefix.
    pub fn name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.path.display().to_string())
    }

    pub fn width(&self) -> usize {
        self.rows.iter().map(Vec::len).max().unwrap_or(0)
    }

    /// Column whose header, trimmed, equals `column`.
    pub fn subject_column(&self, header_row: usize, column: &str) -> Result<usize, ReconError> {
        let missing = || ReconError::MissingRequiredColumn {
            ledger: self.name(),
            column: column.to_string(),
        };
        let header = header_row
            .checked_sub(1)
            .and_then(|r| self.rows.get(r))
            .ok_or_else(missing)?;
        header
            .iter()
            .position(|cell| cell.display().trim() == column)
            .ok_or_else(missing)
    }

    /// Engine rows below the header. Fully empty rows are dropped but keep
    /// their index, so `index + header_row` is always the sheet row.
    pub fn to_input(&self, header_row: usize, column: &str) -> Result<LedgerInput, ReconError> {
        let subject_col = self.subject_column(header_row, column)?;

        let rows = self
            .rows
            .iter()
            .enumerate()
            .skip(header_row)
            .filter(|(_, cells)| !cells.iter().all(Cell::is_empty))
            .map(|(i, cells)| {
                let subject = cells
                    .get(subject_col)
                    .filter(|c| !c.is_empty())
                    .map(Cell::display);
                LedgerRow {
                    index: i + 1 - header_row,
                    subject,
                    fields: cells.iter().map(Cell::display).collect(),
                }
            })
            .collect();

        Ok(LedgerInput {
            name: self.name(),
            rows,
        })
    }
}

/// Read the configured worksheet of any supported ledger file.
pub fn read_ledger(path: &Path, config: &LedgerConfig) -> Result<LedgerSheet, IoError> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();

    let sheet = if ext == "csv" || ext == "tsv" {
        crate::csv::read_sheet(path)?
    } else {
        crate::xlsx::read_sheet(path, config.sheet.as_deref())?
    };
    log::debug!(
        "{}: sheet '{}', {} rows x {} cols",
        sheet.name(),
        sheet.sheet_name,
        sheet.rows.len(),
        sheet.width()
    );
    Ok(sheet)
}

/// Read a ledger and turn it into engine input in one step.
pub fn load_ledger(path: &Path, config: &LedgerConfig) -> Result<(LedgerSheet, LedgerInput), IoError> {
    let sheet = read_ledger(path, config)?;
    let input = sheet.to_input(config.header_row, &config.subject_column)?;
    Ok((sheet, input))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(s: &str) -> Cell {
        Cell::Text(s.to_string())
    }

    fn sheet(rows: Vec<Vec<Cell>>) -> LedgerSheet {
        LedgerSheet {
            path: PathBuf::from("/tmp/应收账款_2024.xlsx"),
            sheet_name: "Sheet1".into(),
            rows,
        }
    }

    #[test]
    fn number_display() {
        assert_eq!(Cell::Number(42.0).display(), "42");
        assert_eq!(Cell::Number(-3.5).display(), "-3.5");
        assert_eq!(Cell::Bool(true).display(), "TRUE");
    }

    #[test]
    fn rows_indexed_from_header() {
        let s = sheet(vec![
            vec![text("日期"), text(" 科目名称 "), text("金额")],
            vec![text("2024-01-01"), text("应收账款_ACME"), Cell::Number(100.0)],
            vec![Cell::Empty, Cell::Empty, Cell::Empty],
            vec![text("2024-01-03"), Cell::Empty, Cell::Number(5.0)],
        ]);
        let input = s.to_input(1, "科目名称").unwrap();
        assert_eq!(input.name, "应收账款_2024.xlsx");
        assert_eq!(input.rows.len(), 2);
        assert_eq!(input.rows[0].index, 1);
        assert_eq!(input.rows[0].subject.as_deref(), Some("应收账款_ACME"));
        assert_eq!(input.rows[0].fields[2], "100");
        // The blank row is dropped but keeps its slot.
        assert_eq!(input.rows[1].index, 3);
        assert_eq!(input.rows[1].subject, None);
    }

    #[test]
    fn header_row_offset() {
        let s = sheet(vec![
            vec![text("2024 年度明细")],
            vec![text("科目名称")],
            vec![text("x_ACME")],
        ]);
        let input = s.to_input(2, "科目名称").unwrap();
        assert_eq!(input.rows.len(), 1);
        assert_eq!(input.rows[0].index, 1);
    }

    #[test]
    fn missing_column_is_reported() {
        let s = sheet(vec![vec![text("Subject")], vec![text("x_ACME")]]);
        let err = s.to_input(1, "科目名称").unwrap_err();
        assert_eq!(
            err,
            ReconError::MissingRequiredColumn {
                ledger: "应收账款_2024.xlsx".into(),
                column: "科目名称".into(),
            }
        );
        // Header row past the end of the sheet.
        assert!(s.to_input(9, "Subject").is_err());
    }
}
