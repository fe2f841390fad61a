//! Table and auto-filter management utilities.
//!
//! Provides functions for setting and removing auto-filters on worksheets,
//! plus building and inspecting Excel "Table" (`ListObject`) definitions.

use crate::error::{Error, Result};
use sheetkit_xml::namespaces;
use sheetkit_xml::table::{
    TableAutoFilter, TableColumnXml, TableColumnsXml, TableStyleInfoXml, TableXml,
};
use sheetkit_xml::worksheet::{AutoFilter, WorksheetXml};

/// Configuration for a table.
#[derive(Debug, Clone)]
pub struct TableConfig {
    /// The table name (used internally).
    pub name: String,
    /// The display name shown in the UI.
    pub display_name: String,
    /// The cell range (e.g. "A1:D10").
    pub range: String,
    /// Column definitions.
    pub columns: Vec<TableColumn>,
    /// Whether to show the header row.
    pub show_header_row: bool,
    /// The table style name (e.g. "TableStyleMedium2").
    pub style_name: Option<String>,
    /// Whether to enable auto-filter on the table.
    pub auto_filter: bool,
}

impl Default for TableConfig {
    fn default() -> Self {
        Self {
            name: String::new(),
            display_name: String::new(),
            range: String::new(),
            columns: Vec::new(),
            show_header_row: true,
            style_name: None,
            auto_filter: false,
        }
    }
}

/// A column within a table.
#[derive(Debug, Clone, PartialEq)]
pub struct TableColumn {
    /// The column header name.
    pub name: String,
    /// Aggregation function shown in the totals row (e.g. "sum", "average").
    pub totals_row_function: Option<String>,
    /// Literal label shown in the totals row cell instead of a function result.
    pub totals_row_label: Option<String>,
}

/// Metadata describing an existing table, as returned by [`Workbook::get_tables`](crate::workbook::Workbook::get_tables).
#[derive(Debug, Clone, PartialEq)]
pub struct TableInfo {
    /// The table name.
    pub name: String,
    /// The display name shown in the UI.
    pub display_name: String,
    /// The cell range (e.g. "A1:D10").
    pub range: String,
    /// Column header names, in order.
    pub columns: Vec<String>,
    /// Whether the header row is shown.
    pub show_header_row: bool,
    /// The table style name, if any.
    pub style_name: Option<String>,
    /// Whether auto-filter is enabled on the table.
    pub auto_filter: bool,
}

/// Validate a table configuration before it is added to a workbook.
pub fn validate_table_config(config: &TableConfig) -> Result<()> {
    if config.name.is_empty() {
        return Err(Error::InvalidSheetName(
            "table name must not be empty".to_string(),
        ));
    }
    if config.range.is_empty() {
        return Err(Error::InvalidCellReference(
            "table range must not be empty".to_string(),
        ));
    }
    if config.columns.is_empty() {
        return Err(Error::Internal(
            "table must have at least one column".to_string(),
        ));
    }
    Ok(())
}

/// Build the `xl/tables/table{N}.xml` XML structure for a table.
pub fn build_table_xml(config: &TableConfig, table_id: u32) -> TableXml {
    let columns = config
        .columns
        .iter()
        .enumerate()
        .map(|(i, col)| TableColumnXml {
            id: (i + 1) as u32,
            name: col.name.clone(),
            totals_row_function: col.totals_row_function.clone(),
            totals_row_label: col.totals_row_label.clone(),
        })
        .collect::<Vec<_>>();

    let has_totals_row = config
        .columns
        .iter()
        .any(|c| c.totals_row_function.is_some() || c.totals_row_label.is_some());

    TableXml {
        xmlns: namespaces::SPREADSHEET_ML.to_string(),
        id: table_id,
        name: config.name.clone(),
        display_name: config.display_name.clone(),
        reference: config.range.clone(),
        totals_row_count: if has_totals_row { Some(1) } else { None },
        totals_row_shown: if has_totals_row { Some(true) } else { None },
        header_row_count: if config.show_header_row { None } else { Some(0) },
        auto_filter: if config.auto_filter {
            Some(TableAutoFilter {
                reference: config.range.clone(),
            })
        } else {
            None
        },
        table_columns: TableColumnsXml {
            count: columns.len() as u32,
            columns,
        },
        table_style_info: config.style_name.as_ref().map(|name| TableStyleInfoXml {
            name: Some(name.clone()),
            show_first_column: Some(false),
            show_last_column: Some(false),
            show_row_stripes: Some(true),
            show_column_stripes: Some(false),
        }),
    }
}

/// Convert a parsed [`TableXml`] back into the high-level [`TableInfo`] view.
pub fn table_xml_to_info(table_xml: &TableXml) -> TableInfo {
    TableInfo {
        name: table_xml.name.clone(),
        display_name: table_xml.display_name.clone(),
        range: table_xml.reference.clone(),
        columns: table_xml
            .table_columns
            .columns
            .iter()
            .map(|c| c.name.clone())
            .collect(),
        show_header_row: table_xml.header_row_count != Some(0),
        style_name: table_xml
            .table_style_info
            .as_ref()
            .and_then(|s| s.name.clone()),
        auto_filter: table_xml.auto_filter.is_some(),
    }
}

/// Set an auto-filter on a worksheet for the given cell range.
pub fn set_auto_filter(ws: &mut WorksheetXml, range: &str) -> Result<()> {
    ws.auto_filter = Some(AutoFilter {
        reference: range.to_string(),
    });
    Ok(())
}

/// Remove any auto-filter from a worksheet.
pub fn remove_auto_filter(ws: &mut WorksheetXml) {
    ws.auto_filter = None;
}
