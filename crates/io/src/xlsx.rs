// Excel ledger import (xlsx, xlsm, xls, ods) and annotated export (xlsx only)
//
// Import: the chosen worksheet's cell values. Formatting is not read.
// Export: the same values, header bold, rows without documents filled.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use calamine::{open_workbook_auto, Data, Reader};
use rust_xlsxwriter::{Format, FormatPattern, Workbook as XlsxWorkbook, Worksheet};

use crate::error::IoError;
use crate::ledger::{Cell, LedgerSheet};

/// Maximum dimensions read from a ledger sheet
const MAX_ROWS: usize = 1_048_576;
const MAX_COLS: usize = 16_384;

/// Read one worksheet: `sheet` by name, or the first one.
pub fn read_sheet(path: &Path, sheet: Option<&str>) -> Result<LedgerSheet, IoError> {
    let mut workbook = open_workbook_auto(path).map_err(|e| IoError::open(path, e))?;

    let sheet_names: Vec<String> = workbook.sheet_names().to_vec();
    let sheet_name = match sheet {
        Some(name) => sheet_names
            .iter()
            .find(|n| n.as_str() == name)
            .cloned()
            .ok_or_else(|| IoError::read(path, format!("no sheet named '{name}'")))?,
        None => sheet_names
            .first()
            .cloned()
            .ok_or_else(|| IoError::read(path, "workbook contains no sheets"))?,
    };

    let range = workbook
        .worksheet_range(&sheet_name)
        .map_err(|e| IoError::read(path, format!("sheet '{sheet_name}': {e}")))?;

    // Range start offset (data may not begin at A1)
    let (start_row, start_col) = range
        .start()
        .map(|(r, c)| (r as usize, c as usize))
        .unwrap_or((0, 0));

    let mut rows: Vec<Vec<Cell>> = vec![Vec::new(); start_row.min(MAX_ROWS)];
    for row in range.rows() {
        if rows.len() >= MAX_ROWS {
            log::warn!("{}: truncated at {MAX_ROWS} rows", path.display());
            break;
        }
        let mut cells = vec![Cell::Empty; start_col.min(MAX_COLS)];
        cells.extend(row.iter().take(MAX_COLS.saturating_sub(start_col)).map(to_cell));
        while cells.last().is_some_and(|c| *c == Cell::Empty) {
            cells.pop();
        }
        rows.push(cells);
    }

    Ok(LedgerSheet {
        path: PathBuf::from(path),
        sheet_name,
        rows,
    })
}

fn to_cell(data: &Data) -> Cell {
    match data {
        Data::Empty => Cell::Empty,
        Data::String(s) if s.is_empty() => Cell::Empty,
        Data::String(s) => Cell::Text(s.clone()),
        Data::Float(n) => Cell::Number(*n),
        Data::Int(n) => Cell::Number(*n as f64),
        Data::Bool(b) => Cell::Bool(*b),
        Data::Error(e) => Cell::Text(format!("{e}")),
        Data::DateTime(dt) => Cell::Date(dt.as_f64()),
        Data::DateTimeIso(s) | Data::DurationIso(s) => Cell::Text(s.clone()),
    }
}

/// Write the annotated copy of a ledger.
///
/// `flagged` holds 1-based data row indices; data row `n` is sheet row
/// `n + header_row`. Every cell of a flagged row, blanks included, gets a
/// solid `highlight_rgb` fill.
///
/// The copy is rebuilt from cell values: it holds only the ledger's own
/// worksheet, formulas come through as their cached results, and the
/// source's styles, column widths, merged cells and other sheets are not
/// carried over. Dates get a plain `yyyy-mm-dd` format.
pub fn write_annotated(
    sheet: &LedgerSheet,
    flagged: &[usize],
    header_row: usize,
    highlight_rgb: u32,
    path: &Path,
) -> Result<(), IoError> {
    let flagged_rows: BTreeSet<usize> = flagged.iter().map(|r| r + header_row).collect();
    let width = sheet.width().max(1);

    let plain = Format::new();
    let header = Format::new().set_bold();
    let fill = Format::new()
        .set_pattern(FormatPattern::Solid)
        .set_background_color(highlight_rgb);
    let date = Format::new().set_num_format("yyyy-mm-dd");
    let date_fill = fill.clone().set_num_format("yyyy-mm-dd");

    let mut workbook = XlsxWorkbook::new();
    let worksheet = workbook.add_worksheet();
    if let Err(e) = worksheet.set_name(&sheet.sheet_name) {
        log::debug!("sheet name '{}' not usable in xlsx: {e}", sheet.sheet_name);
    }

    for (i, cells) in sheet.rows.iter().enumerate() {
        let sheet_row = i + 1;
        let is_flagged = flagged_rows.contains(&sheet_row);
        let (format, date_format) = if is_flagged {
            (&fill, &date_fill)
        } else if sheet_row == header_row {
            (&header, &date)
        } else {
            (&plain, &date)
        };

        let row = i as u32;
        let last_col = if is_flagged { width } else { cells.len() };
        for col in 0..last_col {
            let cell = cells.get(col).unwrap_or(&Cell::Empty);
            write_cell(worksheet, row, col as u16, cell, format, date_format, is_flagged)
                .map_err(|e| IoError::write(path, e))?;
        }
    }

    workbook.save(path).map_err(|e| IoError::write(path, e))?;
    log::debug!("{}: {} rows highlighted", path.display(), flagged_rows.len());
    Ok(())
}

fn write_cell(
    worksheet: &mut Worksheet,
    row: u32,
    col: u16,
    cell: &Cell,
    format: &Format,
    date_format: &Format,
    blank_needs_format: bool,
) -> Result<(), rust_xlsxwriter::XlsxError> {
    match cell {
        Cell::Empty if blank_needs_format => {
            worksheet.write_blank(row, col, format)?;
        }
        Cell::Empty => {}
        Cell::Text(s) => {
            worksheet.write_string_with_format(row, col, s, format)?;
        }
        Cell::Number(n) => {
            worksheet.write_number_with_format(row, col, *n, format)?;
        }
        Cell::Date(serial) => {
            worksheet.write_number_with_format(row, col, *serial, date_format)?;
        }
        Cell::Bool(b) => {
            worksheet.write_boolean_with_format(row, col, *b, format)?;
        }
    }
    Ok(())
}
