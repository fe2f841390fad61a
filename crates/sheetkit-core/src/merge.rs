//! Merge cell operations.
//!
//! Provides functions for merging and unmerging ranges of cells in a worksheet.

use crate::error::{Error, Result};
use crate::utils::cell_ref::cell_name_to_coordinates;
use sheetkit_xml::worksheet::{MergeCell, MergeCells, WorksheetXml};

/// Parse a range reference like "A1:C3" into ((col1, row1), (col2, row2)) coordinates,
/// both 1-based. Ensures the returned rectangle is normalized so that
/// (col1, row1) is the top-left and (col2, row2) is the bottom-right.
fn parse_range(reference: &str) -> Result<(u32, u32, u32, u32)> {
    let parts: Vec<&str> = reference.split(':').collect();
    if parts.len() != 2 {
        return Err(Error::InvalidCellReference(format!(
            "expected range like 'A1:C3', got '{reference}'"
        )));
    }
    let (c1, r1) = cell_name_to_coordinates(parts[0])?;
    let (c2, r2) = cell_name_to_coordinates(parts[1])?;
    let min_col = c1.min(c2);
    let max_col = c1.max(c2);
    let min_row = r1.min(r2);
    let max_row = r1.max(r2);
    Ok((min_col, min_row, max_col, max_row))
}

/// Check whether two rectangular ranges overlap.
fn ranges_overlap(a: (u32, u32, u32, u32), b: (u32, u32, u32, u32)) -> bool {
    let (a_min_col, a_min_row, a_max_col, a_max_row) = a;
    let (b_min_col, b_min_row, b_max_col, b_max_row) = b;
    a_min_col <= b_max_col
        && a_max_col >= b_min_col
        && a_min_row <= b_max_row
        && a_max_row >= b_min_row
}

/// Controls what happens to the non-top-left cells of a merge region.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MergePolicy {
    /// Leave every cell in the range as-is.
    #[default]
    Keep,
    /// Clear every cell in the range to `Empty` except the top-left cell.
    EmptyHiddenCells,
}

/// Clear every cell within `[min_col,min_row]..[max_col,max_row]` to `Empty`,
/// except the cell at `keep`.
fn empty_hidden_cells(
    ws: &mut WorksheetXml,
    min_col: u32,
    min_row: u32,
    max_col: u32,
    max_row: u32,
    keep: (u32, u32),
) {
    for row in ws.sheet_data.rows.iter_mut() {
        if row.r < min_row || row.r > max_row {
            continue;
        }
        row.cells.retain(|c| match cell_name_to_coordinates(&c.r) {
            Ok(coord @ (col, _)) if col >= min_col && col <= max_col && coord != keep => false,
            _ => true,
        });
    }
}

/// Merge a range of cells on the given worksheet.
///
/// `top_left` and `bottom_right` are cell references like "A1" and "C3".
/// Returns an error if the new range overlaps with any existing merge region.
/// `policy` controls whether non-top-left cells in the range are cleared.
pub fn merge_cells(
    ws: &mut WorksheetXml,
    top_left: &str,
    bottom_right: &str,
    policy: MergePolicy,
) -> Result<()> {
    let (tl_col, tl_row) = cell_name_to_coordinates(top_left)?;
    let (br_col, br_row) = cell_name_to_coordinates(bottom_right)?;

    let min_col = tl_col.min(br_col);
    let max_col = tl_col.max(br_col);
    let min_row = tl_row.min(br_row);
    let max_row = tl_row.max(br_row);
    let new_range = (min_col, min_row, max_col, max_row);

    let reference = format!("{top_left}:{bottom_right}");

    // Check for overlaps with existing merge regions.
    if let Some(ref mc) = ws.merge_cells {
        for existing in &mc.merge_cells {
            let existing_range = parse_range(&existing.reference)?;
            if ranges_overlap(new_range, existing_range) {
                return Err(Error::MergeCellOverlap {
                    new: reference,
                    existing: existing.reference.clone(),
                });
            }
        }
    }

    // Add the merge cell entry.
    let merge_cells = ws.merge_cells.get_or_insert_with(|| MergeCells {
        count: None,
        merge_cells: Vec::new(),
    });
    merge_cells.merge_cells.push(MergeCell { reference });
    merge_cells.count = Some(merge_cells.merge_cells.len() as u32);

    if policy == MergePolicy::EmptyHiddenCells {
        empty_hidden_cells(ws, min_col, min_row, max_col, max_row, (min_col, min_row));
    }

    Ok(())
}

/// Find the index of the merge region containing `cell_ref`, if any.
///
/// Returns `Ok(None)` rather than an error when the cell simply isn't
/// merged.
pub fn find_merge_by_cell(ws: &WorksheetXml, cell_ref: &str) -> Result<Option<usize>> {
    let (col, row) = cell_name_to_coordinates(cell_ref)?;

    let Some(mc) = ws.merge_cells.as_ref() else {
        return Ok(None);
    };

    for (idx, m) in mc.merge_cells.iter().enumerate() {
        let (min_col, min_row, max_col, max_row) = parse_range(&m.reference)?;
        if col >= min_col && col <= max_col && row >= min_row && row <= max_row {
            return Ok(Some(idx));
        }
    }

    Ok(None)
}

/// Remove a specific merge cell range from the worksheet.
///
/// `reference` is the exact range string like "A1:C3" that was previously merged.
/// Returns an error if the range is not found.
pub fn unmerge_cell(ws: &mut WorksheetXml, reference: &str) -> Result<()> {
    let mc = ws
        .merge_cells
        .as_mut()
        .ok_or_else(|| Error::MergeCellNotFound(reference.to_string()))?;

    let initial_len = mc.merge_cells.len();
    mc.merge_cells.retain(|m| m.reference != reference);

    if mc.merge_cells.len() == initial_len {
        return Err(Error::MergeCellNotFound(reference.to_string()));
    }

    if mc.merge_cells.is_empty() {
        ws.merge_cells = None;
    } else {
        mc.count = Some(mc.merge_cells.len() as u32);
    }

    Ok(())
}

/// Get all merge cell references in the worksheet.
///
/// Returns a list of range strings like `["A1:B2", "D1:F3"]`.
pub fn get_merge_cells(ws: &WorksheetXml) -> Vec<String> {
    ws.merge_cells
        .as_ref()
        .map(|mc| mc.merge_cells.iter().map(|m| m.reference.clone()).collect())
        .unwrap_or_default()
}
