//! Row operations for worksheet manipulation.
//!
//! All functions operate directly on a [`WorksheetXml`] structure, keeping the
//! business logic decoupled from the [`Workbook`](crate::workbook::Workbook)
//! wrapper.

use sheetkit_xml::worksheet::{Cell, Row, WorksheetXml};

use crate::cell::CellValue;
use crate::error::{Error, Result};
use crate::sst::SharedStringTable;
use crate::utils::cell_ref::{cell_name_to_coordinates, coordinates_to_cell_name};
use crate::utils::constants::{MAX_ROWS, MAX_ROW_HEIGHT};

/// Insert `count` empty rows starting at `start_row`, shifting existing rows
/// at and below `start_row` downward.
///
/// Cell references inside shifted rows are updated so that e.g. "B5" becomes
/// "B8" when 3 rows are inserted at row 5.
pub fn insert_rows(ws: &mut WorksheetXml, start_row: u32, count: u32) -> Result<()> {
    if start_row == 0 {
        return Err(Error::InvalidRowNumber(0));
    }
    if count == 0 {
        return Ok(());
    }
    // Validate that shifting won't exceed MAX_ROWS.
    let max_existing = ws.sheet_data.rows.iter().map(|r| r.r).max().unwrap_or(0);
    let furthest = max_existing.max(start_row);
    if furthest.checked_add(count).is_none_or(|v| v > MAX_ROWS) {
        return Err(Error::InvalidRowNumber(furthest + count));
    }

    // Shift rows that are >= start_row downward by `count`.
    // Iterate in reverse to avoid overwriting.
    for row in ws.sheet_data.rows.iter_mut().rev() {
        if row.r >= start_row {
            let new_row_num = row.r + count;
            shift_row_cells(row, new_row_num)?;
            row.r = new_row_num;
        }
    }

    Ok(())
}

/// Remove a single row, shifting rows below it upward by one.
pub fn remove_row(ws: &mut WorksheetXml, row: u32) -> Result<()> {
    if row == 0 {
        return Err(Error::InvalidRowNumber(0));
    }

    // Remove the target row.
    ws.sheet_data.rows.retain(|r| r.r != row);

    // Shift rows above `row` upward.
    for r in ws.sheet_data.rows.iter_mut() {
        if r.r > row {
            let new_row_num = r.r - 1;
            shift_row_cells(r, new_row_num)?;
            r.r = new_row_num;
        }
    }

    Ok(())
}

/// Duplicate a row, inserting the copy directly below the source row.
pub fn duplicate_row(ws: &mut WorksheetXml, row: u32) -> Result<()> {
    duplicate_row_to(ws, row, row + 1)
}

/// Duplicate a row to a specific target row number. Existing rows at and
/// below `target` are shifted down to make room.
pub fn duplicate_row_to(ws: &mut WorksheetXml, row: u32, target: u32) -> Result<()> {
    if row == 0 {
        return Err(Error::InvalidRowNumber(0));
    }
    if target == 0 {
        return Err(Error::InvalidRowNumber(0));
    }
    if target > MAX_ROWS {
        return Err(Error::InvalidRowNumber(target));
    }

    // Find and clone the source row.
    let source = ws
        .sheet_data
        .rows
        .iter()
        .find(|r| r.r == row)
        .cloned()
        .ok_or(Error::InvalidRowNumber(row))?;

    // Shift existing rows at target downward.
    insert_rows(ws, target, 1)?;

    // Build the duplicated row with updated cell references.
    let mut new_row = source;
    shift_row_cells(&mut new_row, target)?;
    new_row.r = target;

    // Insert the new row in sorted position.
    let pos = ws
        .sheet_data
        .rows
        .iter()
        .position(|r| r.r > target)
        .unwrap_or(ws.sheet_data.rows.len());
    // Check if there's already a row at target (shouldn't be, but be safe).
    if let Some(existing) = ws.sheet_data.rows.iter().position(|r| r.r == target) {
        ws.sheet_data.rows[existing] = new_row;
    } else {
        ws.sheet_data.rows.insert(pos, new_row);
    }

    Ok(())
}

/// Set the height of a row in points. Creates the row if it does not exist.
///
/// Valid range: `0.0 ..= 409.0`.
pub fn set_row_height(ws: &mut WorksheetXml, row: u32, height: f64) -> Result<()> {
    if row == 0 || row > MAX_ROWS {
        return Err(Error::InvalidRowNumber(row));
    }
    if !(0.0..=MAX_ROW_HEIGHT).contains(&height) {
        return Err(Error::RowHeightExceeded {
            height,
            max: MAX_ROW_HEIGHT,
        });
    }

    let r = find_or_create_row(ws, row);
    r.ht = Some(height);
    r.custom_height = Some(true);
    Ok(())
}

/// Get the height of a row. Returns `None` if the row does not exist or has
/// no explicit height set.
pub fn get_row_height(ws: &WorksheetXml, row: u32) -> Option<f64> {
    ws.sheet_data
        .rows
        .iter()
        .find(|r| r.r == row)
        .and_then(|r| r.ht)
}

/// Set the visibility of a row. Creates the row if it does not exist.
pub fn set_row_visible(ws: &mut WorksheetXml, row: u32, visible: bool) -> Result<()> {
    if row == 0 || row > MAX_ROWS {
        return Err(Error::InvalidRowNumber(row));
    }

    let r = find_or_create_row(ws, row);
    r.hidden = if visible { None } else { Some(true) };
    Ok(())
}

/// Set the outline (grouping) level of a row.
///
/// Valid range: `0..=7` (Excel supports up to 7 outline levels).
pub fn set_row_outline_level(ws: &mut WorksheetXml, row: u32, level: u8) -> Result<()> {
    if row == 0 || row > MAX_ROWS {
        return Err(Error::InvalidRowNumber(row));
    }
    if level > 7 {
        return Err(Error::Internal(format!(
            "outline level {level} exceeds maximum 7"
        )));
    }

    let r = find_or_create_row(ws, row);
    r.outline_level = if level == 0 { None } else { Some(level) };
    Ok(())
}

/// Get the visibility of a row. Returns `true` (visible) if the row does not
/// exist or has no explicit `hidden` attribute.
pub fn get_row_visible(ws: &WorksheetXml, row: u32) -> bool {
    !ws.sheet_data
        .rows
        .iter()
        .find(|r| r.r == row)
        .and_then(|r| r.hidden)
        .unwrap_or(false)
}

/// Get the outline (grouping) level of a row. Returns 0 if not set.
pub fn get_row_outline_level(ws: &WorksheetXml, row: u32) -> u8 {
    ws.sheet_data
        .rows
        .iter()
        .find(|r| r.r == row)
        .and_then(|r| r.outline_level)
        .unwrap_or(0)
}

/// Set the style index applied to every cell in a row. Creates the row if it
/// does not exist.
///
/// Callers are expected to have already validated `style_id` against the
/// stylesheet's `cellXfs` table.
pub fn set_row_style(ws: &mut WorksheetXml, row: u32, style_id: u32) -> Result<()> {
    if row == 0 || row > MAX_ROWS {
        return Err(Error::InvalidRowNumber(row));
    }

    let r = find_or_create_row(ws, row);
    r.s = Some(style_id);
    r.custom_format = Some(true);
    Ok(())
}

/// Get the style index applied to a row. Returns 0 (default) if not set.
pub fn get_row_style(ws: &WorksheetXml, row: u32) -> u32 {
    ws.sheet_data
        .rows
        .iter()
        .find(|r| r.r == row)
        .and_then(|r| r.s)
        .unwrap_or(0)
}

/// Read every row that has at least one cell, decoding each cell to a
/// [`CellValue`]. Rows and cells are returned in sheet order.
///
/// This is a bulk convenience over [`crate::cell`]'s single-cell accessors;
/// unlike them it has no access to the stylesheet, so numeric cells are
/// always returned as [`CellValue::Number`] even when a date number format
/// is applied. Shared formulas are resolved the same way as single-cell
/// reads.
pub fn get_rows(
    ws: &WorksheetXml,
    sst: &SharedStringTable,
) -> Result<Vec<(u32, Vec<(u32, CellValue)>)>> {
    let mut rows = Vec::new();
    for row in &ws.sheet_data.rows {
        if row.cells.is_empty() {
            continue;
        }
        let mut cells = Vec::with_capacity(row.cells.len());
        for cell in &row.cells {
            let (col, _) = cell_name_to_coordinates(&cell.r)?;
            let value = xml_cell_to_value(ws, sst, cell)?;
            cells.push((col, value));
        }
        rows.push((row.r, cells));
    }
    Ok(rows)
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

/// Update all cell references in a row to point to `new_row_num`.
fn shift_row_cells(row: &mut Row, new_row_num: u32) -> Result<()> {
    for cell in row.cells.iter_mut() {
        let (col, _) = cell_name_to_coordinates(&cell.r)?;
        cell.r = coordinates_to_cell_name(col, new_row_num)?;
    }
    Ok(())
}

/// Find an existing row or create a new empty one, keeping rows sorted.
fn find_or_create_row(ws: &mut WorksheetXml, row: u32) -> &mut Row {
    // Check if row exists already.
    let exists = ws.sheet_data.rows.iter().position(|r| r.r == row);
    if let Some(idx) = exists {
        return &mut ws.sheet_data.rows[idx];
    }

    // Insert in sorted order.
    let pos = ws
        .sheet_data
        .rows
        .iter()
        .position(|r| r.r > row)
        .unwrap_or(ws.sheet_data.rows.len());
    ws.sheet_data.rows.insert(
        pos,
        Row {
            r: row,
            spans: None,
            s: None,
            custom_format: None,
            ht: None,
            hidden: None,
            custom_height: None,
            outline_level: None,
            cells: vec![],
        },
    );
    &mut ws.sheet_data.rows[pos]
}

#[cfg(test)]
mod tests {
    use super::*;
    use sheetkit_xml::worksheet::{Cell, SheetData};

    /// Helper: build a minimal worksheet with some pre-populated rows.
    fn sample_ws() -> WorksheetXml {
        let mut ws = WorksheetXml::default();
        ws.sheet_data = SheetData {
            rows: vec![
                Row {
                    r: 1,
                    spans: None,
                    s: None,
                    custom_format: None,
                    ht: None,
                    hidden: None,
                    custom_height: None,
                    outline_level: None,
                    cells: vec![
                        Cell {
                            r: "A1".to_string(),
                            s: None,
                            t: None,
                            v: Some("10".to_string()),
                            f: None,
                            is: None,
                        },
                        Cell {
                            r: "B1".to_string(),
                            s: None,
                            t: None,
                            v: Some("20".to_string()),
                            f: None,
                            is: None,
                        },
                    ],
                },
                Row {
                    r: 2,
                    spans: None,
                    s: None,
                    custom_format: None,
                    ht: None,
                    hidden: None,
                    custom_height: None,
                    outline_level: None,
                    cells: vec![Cell {
                        r: "A2".to_string(),
                        s: None,
                        t: None,
                        v: Some("30".to_string()),
                        f: None,
                        is: None,
                    }],
                },
                Row {
                    r: 5,
                    spans: None,
                    s: None,
                    custom_format: None,
                    ht: None,
                    hidden: None,
                    custom_height: None,
                    outline_level: None,
                    cells: vec![Cell {
                        r: "C5".to_string(),
                        s: None,
                        t: None,
                        v: Some("50".to_string()),
                        f: None,
                        is: None,
                    }],
                },
            ],
        };
        ws
    }

    #[test]
    fn test_insert_rows_shifts_cells_down() {
        let mut ws = sample_ws();
        insert_rows(&mut ws, 2, 3).unwrap();

        // Row 1 should be untouched.
        assert_eq!(ws.sheet_data.rows[0].r, 1);
        assert_eq!(ws.sheet_data.rows[0].cells[0].r, "A1");

        // Row 2 -> 5 (shifted by 3).
        assert_eq!(ws.sheet_data.rows[1].r, 5);
        assert_eq!(ws.sheet_data.rows[1].cells[0].r, "A5");

        // Row 5 -> 8 (shifted by 3).
        assert_eq!(ws.sheet_data.rows[2].r, 8);
        assert_eq!(ws.sheet_data.rows[2].cells[0].r, "C8");
    }

    #[test]
    fn test_insert_rows_at_row_1() {
        let mut ws = sample_ws();
        insert_rows(&mut ws, 1, 2).unwrap();

        // All rows shift by 2.
        assert_eq!(ws.sheet_data.rows[0].r, 3);
        assert_eq!(ws.sheet_data.rows[0].cells[0].r, "A3");
        assert_eq!(ws.sheet_data.rows[1].r, 4);
        assert_eq!(ws.sheet_data.rows[2].r, 7);
    }

    #[test]
    fn test_insert_rows_count_zero_is_noop() {
        let mut ws = sample_ws();
        insert_rows(&mut ws, 1, 0).unwrap();
        assert_eq!(ws.sheet_data.rows[0].r, 1);
        assert_eq!(ws.sheet_data.rows[1].r, 2);
        assert_eq!(ws.sheet_data.rows[2].r, 5);
    }

    #[test]
    fn test_insert_rows_row_zero_returns_error() {
        let mut ws = sample_ws();
        let result = insert_rows(&mut ws, 0, 1);
        assert!(result.is_err());
    }

    #[test]
    fn test_insert_rows_beyond_max_returns_error() {
        let mut ws = WorksheetXml::default();
        ws.sheet_data.rows.push(Row {
            r: MAX_ROWS,
            spans: None,
            s: None,
            custom_format: None,
            ht: None,
            hidden: None,
            custom_height: None,
            outline_level: None,
            cells: vec![],
        });
        let result = insert_rows(&mut ws, 1, 1);
        assert!(result.is_err());
    }

    #[test]
    fn test_insert_rows_on_empty_sheet() {
        let mut ws = WorksheetXml::default();
        insert_rows(&mut ws, 1, 5).unwrap();
        assert!(ws.sheet_data.rows.is_empty());
    }

    #[test]
    fn test_remove_row_shifts_up() {
        let mut ws = sample_ws();
        remove_row(&mut ws, 2).unwrap();

        // Row 1 untouched.
        assert_eq!(ws.sheet_data.rows[0].r, 1);
        assert_eq!(ws.sheet_data.rows[0].cells[0].r, "A1");

        // Original row 2 is gone; row 5 shifted to 4.
        assert_eq!(ws.sheet_data.rows.len(), 2);
        assert_eq!(ws.sheet_data.rows[1].r, 4);
        assert_eq!(ws.sheet_data.rows[1].cells[0].r, "C4");
    }

    #[test]
    fn test_remove_first_row() {
        let mut ws = sample_ws();
        remove_row(&mut ws, 1).unwrap();

        // Remaining rows shift up.
        assert_eq!(ws.sheet_data.rows[0].r, 1);
        assert_eq!(ws.sheet_data.rows[0].cells[0].r, "A1");
        assert_eq!(ws.sheet_data.rows[1].r, 4);
    }

    #[test]
    fn test_remove_nonexistent_row_still_shifts() {
        let mut ws = sample_ws();
        // Row 3 doesn't exist, but rows below should shift.
        remove_row(&mut ws, 3).unwrap();
        assert_eq!(ws.sheet_data.rows.len(), 3); // no row removed
        assert_eq!(ws.sheet_data.rows[2].r, 4); // row 5 -> 4
    }

    #[test]
    fn test_remove_row_zero_returns_error() {
        let mut ws = sample_ws();
        let result = remove_row(&mut ws, 0);
        assert!(result.is_err());
    }

    #[test]
    fn test_duplicate_row_inserts_copy_below() {
        let mut ws = sample_ws();
        duplicate_row(&mut ws, 1).unwrap();

        // Row 1 stays.
        assert_eq!(ws.sheet_data.rows[0].r, 1);
        assert_eq!(ws.sheet_data.rows[0].cells[0].r, "A1");
        assert_eq!(ws.sheet_data.rows[0].cells[0].v, Some("10".to_string()));

        // Row 2 is the duplicate with updated refs.
        assert_eq!(ws.sheet_data.rows[1].r, 2);
        assert_eq!(ws.sheet_data.rows[1].cells[0].r, "A2");
        assert_eq!(ws.sheet_data.rows[1].cells[0].v, Some("10".to_string()));
        assert_eq!(ws.sheet_data.rows[1].cells.len(), 2);

        // Original row 2 shifted to 3.
        assert_eq!(ws.sheet_data.rows[2].r, 3);
        assert_eq!(ws.sheet_data.rows[2].cells[0].r, "A3");
    }

    #[test]
    fn test_duplicate_row_to_specific_target() {
        let mut ws = sample_ws();
        duplicate_row_to(&mut ws, 1, 5).unwrap();

        // Row 1 unchanged.
        assert_eq!(ws.sheet_data.rows[0].r, 1);

        // Target row 5 is the copy.
        let row5 = ws.sheet_data.rows.iter().find(|r| r.r == 5).unwrap();
        assert_eq!(row5.cells[0].r, "A5");
        assert_eq!(row5.cells[0].v, Some("10".to_string()));

        // Original row 5 shifted to 6.
        let row6 = ws.sheet_data.rows.iter().find(|r| r.r == 6).unwrap();
        assert_eq!(row6.cells[0].r, "C6");
    }

    #[test]
    fn test_duplicate_nonexistent_row_returns_error() {
        let mut ws = sample_ws();
        let result = duplicate_row(&mut ws, 99);
        assert!(result.is_err());
    }

    #[test]
    fn test_set_and_get_row_height() {
        let mut ws = sample_ws();
        set_row_height(&mut ws, 1, 25.5).unwrap();

        assert_eq!(get_row_height(&ws, 1), Some(25.5));
        let row = ws.sheet_data.rows.iter().find(|r| r.r == 1).unwrap();
        assert_eq!(row.custom_height, Some(true));
    }

    #[test]
    fn test_set_row_height_creates_row_if_missing() {
        let mut ws = WorksheetXml::default();
        set_row_height(&mut ws, 10, 30.0).unwrap();

        assert_eq!(get_row_height(&ws, 10), Some(30.0));
        assert_eq!(ws.sheet_data.rows.len(), 1);
        assert_eq!(ws.sheet_data.rows[0].r, 10);
    }

    #[test]
    fn test_set_row_height_zero_is_valid() {
        let mut ws = WorksheetXml::default();
        set_row_height(&mut ws, 1, 0.0).unwrap();
        assert_eq!(get_row_height(&ws, 1), Some(0.0));
    }

    #[test]
    fn test_set_row_height_max_is_valid() {
        let mut ws = WorksheetXml::default();
        set_row_height(&mut ws, 1, 409.0).unwrap();
        assert_eq!(get_row_height(&ws, 1), Some(409.0));
    }

    #[test]
    fn test_set_row_height_exceeds_max_returns_error() {
        let mut ws = WorksheetXml::default();
        let result = set_row_height(&mut ws, 1, 410.0);
        assert!(result.is_err());
        assert!(matches!(
            result.unwrap_err(),
            Error::RowHeightExceeded { .. }
        ));
    }

    #[test]
    fn test_set_row_height_negative_returns_error() {
        let mut ws = WorksheetXml::default();
        let result = set_row_height(&mut ws, 1, -1.0);
        assert!(result.is_err());
    }

    #[test]
    fn test_set_row_height_row_zero_returns_error() {
        let mut ws = WorksheetXml::default();
        let result = set_row_height(&mut ws, 0, 15.0);
        assert!(result.is_err());
    }

    #[test]
    fn test_get_row_height_nonexistent_returns_none() {
        let ws = WorksheetXml::default();
        assert_eq!(get_row_height(&ws, 99), None);
    }

    #[test]
    fn test_set_row_hidden() {
        let mut ws = sample_ws();
        set_row_visible(&mut ws, 1, false).unwrap();

        let row = ws.sheet_data.rows.iter().find(|r| r.r == 1).unwrap();
        assert_eq!(row.hidden, Some(true));
    }

    #[test]
    fn test_set_row_visible_clears_hidden() {
        let mut ws = sample_ws();
        set_row_visible(&mut ws, 1, false).unwrap();
        set_row_visible(&mut ws, 1, true).unwrap();

        let row = ws.sheet_data.rows.iter().find(|r| r.r == 1).unwrap();
        assert_eq!(row.hidden, None);
    }

    #[test]
    fn test_set_row_visible_creates_row_if_missing() {
        let mut ws = WorksheetXml::default();
        set_row_visible(&mut ws, 3, false).unwrap();
        assert_eq!(ws.sheet_data.rows.len(), 1);
        assert_eq!(ws.sheet_data.rows[0].r, 3);
        assert_eq!(ws.sheet_data.rows[0].hidden, Some(true));
    }

    #[test]
    fn test_set_row_visible_row_zero_returns_error() {
        let mut ws = WorksheetXml::default();
        let result = set_row_visible(&mut ws, 0, true);
        assert!(result.is_err());
    }

    #[test]
    fn test_set_row_outline_level() {
        let mut ws = sample_ws();
        set_row_outline_level(&mut ws, 1, 3).unwrap();

        let row = ws.sheet_data.rows.iter().find(|r| r.r == 1).unwrap();
        assert_eq!(row.outline_level, Some(3));
    }

    #[test]
    fn test_set_row_outline_level_zero_clears() {
        let mut ws = sample_ws();
        set_row_outline_level(&mut ws, 1, 3).unwrap();
        set_row_outline_level(&mut ws, 1, 0).unwrap();

        let row = ws.sheet_data.rows.iter().find(|r| r.r == 1).unwrap();
        assert_eq!(row.outline_level, None);
    }

    #[test]
    fn test_set_row_outline_level_exceeds_max_returns_error() {
        let mut ws = sample_ws();
        let result = set_row_outline_level(&mut ws, 1, 8);
        assert!(result.is_err());
    }

    #[test]
    fn test_set_row_outline_level_row_zero_returns_error() {
        let mut ws = WorksheetXml::default();
        let result = set_row_outline_level(&mut ws, 0, 1);
        assert!(result.is_err());
    }

    // ----- get_row_visible / get_row_outline_level -----------------------

    #[test]
    fn test_get_row_visible_defaults_true() {
        let ws = sample_ws();
        assert!(get_row_visible(&ws, 1));
        assert!(get_row_visible(&ws, 99)); // nonexistent row
    }

    #[test]
    fn test_get_row_visible_reflects_hidden() {
        let mut ws = sample_ws();
        set_row_visible(&mut ws, 1, false).unwrap();
        assert!(!get_row_visible(&ws, 1));
    }

    #[test]
    fn test_get_row_outline_level_defaults_zero() {
        let ws = sample_ws();
        assert_eq!(get_row_outline_level(&ws, 1), 0);
        assert_eq!(get_row_outline_level(&ws, 99), 0);
    }

    #[test]
    fn test_get_row_outline_level_reflects_set_value() {
        let mut ws = sample_ws();
        set_row_outline_level(&mut ws, 1, 4).unwrap();
        assert_eq!(get_row_outline_level(&ws, 1), 4);
    }

    // ----- set_row_style / get_row_style -----------------------------------

    #[test]
    fn test_set_and_get_row_style() {
        let mut ws = sample_ws();
        set_row_style(&mut ws, 1, 5).unwrap();
        assert_eq!(get_row_style(&ws, 1), 5);

        let row = ws.sheet_data.rows.iter().find(|r| r.r == 1).unwrap();
        assert_eq!(row.custom_format, Some(true));
    }

    #[test]
    fn test_get_row_style_defaults_zero() {
        let ws = sample_ws();
        assert_eq!(get_row_style(&ws, 1), 0);
        assert_eq!(get_row_style(&ws, 99), 0);
    }

    #[test]
    fn test_set_row_style_creates_row() {
        let mut ws = WorksheetXml::default();
        set_row_style(&mut ws, 3, 7).unwrap();
        assert_eq!(get_row_style(&ws, 3), 7);
    }

    #[test]
    fn test_set_row_style_row_zero_returns_error() {
        let mut ws = WorksheetXml::default();
        assert!(set_row_style(&mut ws, 0, 1).is_err());
    }

    // ----- get_rows ---------------------------------------------------------

    #[test]
    fn test_get_rows_skips_empty_rows() {
        let mut ws = sample_ws();
        // sample_ws's row 2 is populated; add an explicit empty row 5.
        ws.sheet_data.rows.push(Row {
            r: 5,
            spans: None,
            s: None,
            custom_format: None,
            ht: None,
            hidden: None,
            custom_height: None,
            outline_level: None,
            cells: vec![],
        });

        let sst = SharedStringTable::new();
        let rows = get_rows(&ws, &sst).unwrap();
        assert!(rows.iter().all(|(r, _)| *r != 5));
    }

    #[test]
    fn test_get_rows_decodes_values_in_column_order() {
        let ws = sample_ws();
        let sst = SharedStringTable::new();
        let rows = get_rows(&ws, &sst).unwrap();

        let (row_num, cells) = &rows[0];
        assert_eq!(*row_num, 1);
        assert_eq!(cells[0], (1, CellValue::Number(10.0)));
        assert_eq!(cells[1], (2, CellValue::Number(20.0)));
    }

    #[test]
    fn test_get_rows_resolves_shared_string() {
        let mut ws = WorksheetXml::default();
        let mut sst = SharedStringTable::new();
        let idx = sst.add("Hello");
        ws.sheet_data.rows.push(Row {
            r: 1,
            spans: None,
            s: None,
            custom_format: None,
            ht: None,
            hidden: None,
            custom_height: None,
            outline_level: None,
            cells: vec![Cell {
                r: "A1".to_string(),
                s: None,
                t: Some("s".to_string()),
                v: Some(idx.to_string()),
                f: None,
                is: None,
            }],
        });

        let rows = get_rows(&ws, &sst).unwrap();
        assert_eq!(rows[0].1[0], (1, CellValue::String("Hello".to_string())));
    }
}
