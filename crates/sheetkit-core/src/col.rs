//! Column operations for worksheet manipulation.
//!
//! All functions operate directly on a [`WorksheetXml`] structure, keeping the
//! business logic decoupled from the [`Workbook`](crate::workbook::Workbook)
//! wrapper.

use sheetkit_xml::worksheet::{Cell, Col, Cols, WorksheetXml};

use crate::cell::CellValue;
use crate::error::{Error, Result};
use crate::sst::SharedStringTable;
use crate::utils::cell_ref::{
    cell_name_to_coordinates, column_name_to_number, column_number_to_name,
    coordinates_to_cell_name,
};
use crate::utils::constants::{MAX_COLUMNS, MAX_COLUMN_WIDTH};

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Set the width of a column. Creates the `Cols` container and/or a `Col`
/// entry if they do not yet exist.
///
/// Valid range: `0.0 ..= 255.0`.
pub fn set_col_width(ws: &mut WorksheetXml, col: &str, width: f64) -> Result<()> {
    let col_num = column_name_to_number(col)?;
    if !(0.0..=MAX_COLUMN_WIDTH).contains(&width) {
        return Err(Error::ColumnWidthExceeded {
            width,
            max: MAX_COLUMN_WIDTH,
        });
    }

    let col_entry = find_or_create_col(ws, col_num);
    col_entry.width = Some(width);
    col_entry.custom_width = Some(true);
    Ok(())
}

/// Get the width of a column. Returns `None` when there is no explicit width
/// defined for the column.
pub fn get_col_width(ws: &WorksheetXml, col: &str) -> Option<f64> {
    let col_num = column_name_to_number(col).ok()?;
    ws.cols
        .as_ref()
        .and_then(|cols| {
            cols.cols
                .iter()
                .find(|c| col_num >= c.min && col_num <= c.max)
        })
        .and_then(|c| c.width)
}

/// Set the visibility of a column.
pub fn set_col_visible(ws: &mut WorksheetXml, col: &str, visible: bool) -> Result<()> {
    let col_num = column_name_to_number(col)?;
    let col_entry = find_or_create_col(ws, col_num);
    col_entry.hidden = if visible { None } else { Some(true) };
    Ok(())
}

/// Get the visibility of a column. Returns `true` (visible) if the column
/// has no explicit entry or no `hidden` attribute.
pub fn get_col_visible(ws: &WorksheetXml, col: &str) -> Result<bool> {
    let col_num = column_name_to_number(col)?;
    let hidden = ws
        .cols
        .as_ref()
        .and_then(|cols| {
            cols.cols
                .iter()
                .find(|c| col_num >= c.min && col_num <= c.max)
        })
        .and_then(|c| c.hidden)
        .unwrap_or(false);
    Ok(!hidden)
}

/// Set the outline (grouping) level of a column.
///
/// Valid range: `0..=7` (Excel supports up to 7 outline levels).
pub fn set_col_outline_level(ws: &mut WorksheetXml, col: &str, level: u8) -> Result<()> {
    let col_num = column_name_to_number(col)?;
    if level > 7 {
        return Err(Error::Internal(format!(
            "outline level {level} exceeds maximum 7"
        )));
    }

    let col_entry = find_or_create_col(ws, col_num);
    col_entry.outline_level = if level == 0 { None } else { Some(level) };
    Ok(())
}

/// Get the outline (grouping) level of a column. Returns 0 if not set.
pub fn get_col_outline_level(ws: &WorksheetXml, col: &str) -> Result<u8> {
    let col_num = column_name_to_number(col)?;
    let level = ws
        .cols
        .as_ref()
        .and_then(|cols| {
            cols.cols
                .iter()
                .find(|c| col_num >= c.min && col_num <= c.max)
        })
        .and_then(|c| c.outline_level)
        .unwrap_or(0);
    Ok(level)
}

/// Set the style applied to every cell in a column. Creates the `Cols`
/// container and/or a `Col` entry if they do not yet exist.
///
/// Callers are expected to have already validated `style_id` against the
/// stylesheet's `cellXfs` table.
pub fn set_col_style(ws: &mut WorksheetXml, col: &str, style_id: u32) -> Result<()> {
    let col_num = column_name_to_number(col)?;
    let col_entry = find_or_create_col(ws, col_num);
    col_entry.style = Some(style_id);
    Ok(())
}

/// Get the style ID for a column. Returns 0 (default) if not set.
pub fn get_col_style(ws: &WorksheetXml, col: &str) -> Result<u32> {
    let col_num = column_name_to_number(col)?;
    let style = ws
        .cols
        .as_ref()
        .and_then(|cols| {
            cols.cols
                .iter()
                .find(|c| col_num >= c.min && col_num <= c.max)
        })
        .and_then(|c| c.style)
        .unwrap_or(0);
    Ok(style)
}

/// Read every column that has at least one cell, decoding each cell to a
/// [`CellValue`]. Columns are returned in ascending column order; within a
/// column, cells are returned in ascending row order.
///
/// Mirrors [`crate::row::get_rows`]: a bulk convenience with no access to the
/// stylesheet, so numeric cells never decode as [`CellValue::Date`].
pub fn get_cols(
    ws: &WorksheetXml,
    sst: &SharedStringTable,
) -> Result<Vec<(String, Vec<(u32, CellValue)>)>> {
    use std::collections::BTreeMap;

    let mut by_col: BTreeMap<u32, Vec<(u32, CellValue)>> = BTreeMap::new();
    for row in &ws.sheet_data.rows {
        for cell in &row.cells {
            let (col_num, row_num) = cell_name_to_coordinates(&cell.r)?;
            let value = xml_cell_to_value(ws, sst, cell)?;
            by_col.entry(col_num).or_default().push((row_num, value));
        }
    }

    by_col
        .into_iter()
        .map(|(col_num, cells)| Ok((column_number_to_name(col_num)?, cells)))
        .collect()
}

/// Decode a single worksheet cell to a [`CellValue`], resolving shared
/// formulas against the rest of the sheet. Mirrors
/// `Workbook::xml_cell_to_value`, minus date detection (no stylesheet here).
fn xml_cell_to_value(ws: &WorksheetXml, sst: &SharedStringTable, cell: &Cell) -> Result<CellValue> {
    if let Some(ref formula) = cell.f {
        let expr = match formula.t.as_deref() {
            Some("array") => {
                return Err(Error::FormulaError(
                    "array formulas are not supported".to_string(),
                ));
            }
            Some("shared") => match &formula.value {
                Some(v) if !v.is_empty() => v.clone(),
                _ => {
                    let si = formula.si.ok_or_else(|| {
                        Error::FormulaError(
                            "shared formula is missing its group index".to_string(),
                        )
                    })?;
                    resolve_shared_formula(ws, cell, si)?
                }
            },
            _ => formula.value.clone().unwrap_or_default(),
        };
        let result = match (&cell.t, &cell.v) {
            (Some(t), Some(v)) if t == "b" => Some(Box::new(CellValue::Bool(v == "1"))),
            (Some(t), Some(v)) if t == "e" => Some(Box::new(CellValue::Error(v.clone()))),
            (_, Some(v)) => v.parse::<f64>().ok().map(|n| Box::new(CellValue::Number(n))),
            _ => None,
        };
        return Ok(CellValue::Formula { expr, result });
    }

    match (cell.t.as_deref(), cell.v.as_deref()) {
        (Some("s"), Some(v)) => {
            let idx: usize = v
                .parse()
                .map_err(|_| Error::Internal(format!("invalid SST index: {v}")))?;
            Ok(CellValue::String(sst.get(idx).unwrap_or("").to_string()))
        }
        (Some("b"), Some(v)) => Ok(CellValue::Bool(v == "1")),
        (Some("e"), Some(v)) => Ok(CellValue::Error(v.to_string())),
        (Some("inlineStr"), _) => {
            let s = cell.is.as_ref().and_then(|is| is.t.clone()).unwrap_or_default();
            Ok(CellValue::String(s))
        }
        (Some("str"), Some(v)) => Ok(CellValue::String(v.to_string())),
        (None | Some("n"), Some(v)) => {
            let n: f64 = v
                .parse()
                .map_err(|_| Error::Internal(format!("invalid number: {v}")))?;
            Ok(CellValue::Number(n))
        }
        _ => Ok(CellValue::Empty),
    }
}

/// Resolve a shared-formula slave cell to its expanded expression. See
/// `Workbook::resolve_shared_formula` for the algorithm.
fn resolve_shared_formula(ws: &WorksheetXml, cell: &Cell, si: u32) -> Result<String> {
    let (this_col, this_row) = cell_name_to_coordinates(&cell.r)?;

    let master = ws
        .sheet_data
        .rows
        .iter()
        .flat_map(|r| r.cells.iter())
        .find_map(|c| {
            let f = c.f.as_ref()?;
            if f.t.as_deref() != Some("shared") || f.si != Some(si) {
                return None;
            }
            let expr = f.value.as_ref()?;
            if expr.is_empty() {
                return None;
            }
            Some((c, expr.clone()))
        });
    let (master_cell, master_expr) = master.ok_or_else(|| {
        Error::FormulaError(format!("no master cell found for shared formula {si}"))
    })?;
    let (master_col, master_row) = cell_name_to_coordinates(&master_cell.r)?;
    let col_delta = this_col as i32 - master_col as i32;
    let row_delta = this_row as i32 - master_row as i32;

    crate::cell_ref_shift::shift_cell_references_with_abs(&master_expr, |col, row, abs_col, abs_row| {
        let new_col = if abs_col { col } else { (col as i32 + col_delta) as u32 };
        let new_row = if abs_row { row } else { (row as i32 + row_delta) as u32 };
        (new_col, new_row)
    })
}

/// Insert `count` columns starting at `col`, shifting existing columns at
/// and to the right of `col` further right.
///
/// Cell references are updated: e.g. when inserting 2 columns at "B", a cell
/// "C3" becomes "E3".
pub fn insert_cols(ws: &mut WorksheetXml, col: &str, count: u32) -> Result<()> {
    let start_col = column_name_to_number(col)?;
    if count == 0 {
        return Ok(());
    }

    // Validate we won't exceed max columns.
    let max_existing = ws
        .sheet_data
        .rows
        .iter()
        .flat_map(|r| r.cells.iter())
        .filter_map(|c| cell_name_to_coordinates(&c.r).ok())
        .map(|(col_n, _)| col_n)
        .max()
        .unwrap_or(0);
    let furthest = max_existing.max(start_col);
    if furthest
        .checked_add(count)
        .is_none_or(|v| v > MAX_COLUMNS)
    {
        return Err(Error::InvalidColumnNumber(furthest + count));
    }

    // Shift cell references.
    for row in ws.sheet_data.rows.iter_mut() {
        for cell in row.cells.iter_mut() {
            let (c, r) = cell_name_to_coordinates(&cell.r)?;
            if c >= start_col {
                cell.r = coordinates_to_cell_name(c + count, r)?;
            }
        }
    }

    // Shift Col definitions.
    if let Some(ref mut cols) = ws.cols {
        for c in cols.cols.iter_mut() {
            if c.min >= start_col {
                c.min += count;
            }
            if c.max >= start_col {
                c.max += count;
            }
        }
    }

    Ok(())
}

/// Remove a single column, shifting columns to its right leftward by one.
pub fn remove_col(ws: &mut WorksheetXml, col: &str) -> Result<()> {
    let col_num = column_name_to_number(col)?;

    // Remove cells in the target column and shift cells to the right.
    for row in ws.sheet_data.rows.iter_mut() {
        // Remove cells at the target column.
        row.cells.retain(|cell| {
            cell_name_to_coordinates(&cell.r)
                .map(|(c, _)| c != col_num)
                .unwrap_or(true)
        });

        // Shift cells that are to the right of the removed column.
        for cell in row.cells.iter_mut() {
            let (c, r) = cell_name_to_coordinates(&cell.r).unwrap();
            if c > col_num {
                cell.r = coordinates_to_cell_name(c - 1, r).unwrap();
            }
        }
    }

    // Shift Col definitions.
    if let Some(ref mut cols) = ws.cols {
        // Remove col entries that exactly span the removed column only.
        cols.cols
            .retain(|c| !(c.min == col_num && c.max == col_num));

        for c in cols.cols.iter_mut() {
            if c.min > col_num {
                c.min -= 1;
            }
            if c.max >= col_num {
                // Only shrink max if it's above the removed column.
                if c.max > col_num {
                    c.max -= 1;
                }
            }
        }

        // Remove the Cols wrapper if it's now empty.
        if cols.cols.is_empty() {
            ws.cols = None;
        }
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Internal helpers
// ---------------------------------------------------------------------------

/// Find an existing Col entry that covers exactly `col_num`, or create a
/// new single-column entry for it.
fn find_or_create_col(ws: &mut WorksheetXml, col_num: u32) -> &mut Col {
    // Ensure the Cols container exists.
    if ws.cols.is_none() {
        ws.cols = Some(Cols { cols: vec![] });
    }
    let cols = ws.cols.as_mut().unwrap();

    // Look for an existing entry that spans exactly this column.
    let existing = cols
        .cols
        .iter()
        .position(|c| c.min == col_num && c.max == col_num);

    if let Some(idx) = existing {
        return &mut cols.cols[idx];
    }

    // Create a new single-column entry.
    cols.cols.push(Col {
        min: col_num,
        max: col_num,
        width: None,
        style: None,
        hidden: None,
        custom_width: None,
        outline_level: None,
    });
    let last = cols.cols.len() - 1;
    &mut cols.cols[last]
}

// ===========================================================================
// Tests
// ===========================================================================
