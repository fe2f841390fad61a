//! Error types for the SheetKit core library.
//!
//! Provides a comprehensive [`Error`] enum covering all failure modes
//! encountered when reading, writing, and manipulating Excel workbooks.

use thiserror::Error;

/// The top-level error type for SheetKit.
#[derive(Error, Debug)]
pub enum Error {
    // ===== Cell reference errors =====
    /// The given string is not a valid A1-style cell reference.
    #[error("invalid cell reference: {0}")]
    InvalidCellReference(String),

    /// The row number is out of the allowed range (1..=1_048_576).
    #[error("invalid row number: {0}")]
    InvalidRowNumber(u32),

    /// The column number is out of the allowed range (1..=16_384).
    #[error("invalid column number: {0}")]
    InvalidColumnNumber(u32),

    // ===== Sheet errors =====
    /// No sheet with the given name exists in the workbook.
    #[error("sheet '{name}' does not exist")]
    SheetNotFound { name: String },

    /// A sheet with the given name already exists.
    #[error("sheet '{name}' already exists")]
    SheetAlreadyExists { name: String },

    /// The sheet name violates Excel naming rules.
    #[error("invalid sheet name: {0}")]
    InvalidSheetName(String),

    // ===== I/O errors =====
    /// No file exists at the given path.
    #[error("file not found: {path}")]
    FileNotFound { path: String },

    /// A file already exists at the given path and the caller did not opt
    /// in to overwriting it.
    #[error("file already exists: {path}")]
    FileExists { path: String },

    /// An underlying I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// An error originating from the ZIP layer.
    #[error("ZIP error: {0}")]
    Zip(String),

    /// An error encountered while parsing XML.
    #[error("XML parse error: {0}")]
    XmlParse(String),

    /// An error encountered while deserializing XML into typed structures.
    #[error("XML deserialization error: {0}")]
    XmlDeserialize(String),

    // ===== Value errors =====
    /// A cell value exceeds the maximum character limit.
    #[error("cell value too long: {length} characters (max {max})")]
    CellValueTooLong { length: usize, max: usize },

    /// A caller-supplied argument is out of range or otherwise invalid, for
    /// cases not covered by a more specific variant.
    #[error("invalid argument: {message}")]
    InvalidArgument { message: String },

    // ===== Style errors =====
    /// No style exists at the given cellXfs index.
    #[error("style {id} does not exist")]
    StyleNotFound { id: u32 },

    /// Adding another cell style would exceed Excel's cellXfs limit.
    #[error("maximum number of cell styles exceeded (max {max})")]
    CellStylesExceeded { max: usize },

    // ===== Row/column errors =====
    /// A row height is outside the allowed range.
    #[error("row height {height} exceeds maximum of {max}")]
    RowHeightExceeded { height: f64, max: f64 },

    /// A column width is outside the allowed range.
    #[error("column width {width} exceeds maximum of {max}")]
    ColumnWidthExceeded { width: f64, max: f64 },

    /// A 0-based sheet index is out of bounds for the workbook.
    #[error("sheet index {index} is out of bounds")]
    SheetIndexOutOfBounds { index: usize },

    // ===== Merge cell errors =====
    /// No merge region matches the given reference.
    #[error("merge cell '{0}' not found")]
    MergeCellNotFound(String),

    /// A new merge region overlaps an existing one.
    #[error("merge range '{new}' overlaps existing merge range '{existing}'")]
    MergeCellOverlap { new: String, existing: String },

    // ===== Handle/package state errors =====
    /// An operation would leave the workbook in an invalid state, such as
    /// hiding the only remaining visible sheet.
    #[error("invalid state: {detail}")]
    InvalidState { detail: String },

    /// A save-time invariant check failed: content-type coverage is missing
    /// for a package part, or a relationship id referenced from a part's XML
    /// has no corresponding entry in that part's `.rels`.
    #[error("inconsistent package state: {detail}")]
    InconsistentState { detail: String },

    // ===== Table errors =====
    /// A table with the given name already exists in the workbook.
    #[error("table '{name}' already exists")]
    TableAlreadyExists { name: String },

    /// No table with the given name exists on the sheet.
    #[error("table '{name}' not found")]
    TableNotFound { name: String },

    // ===== Image/drawing errors =====
    /// No picture anchor exists at the given sheet/cell.
    #[error("no picture found at {sheet}!{cell}")]
    PictureNotFound { sheet: String, cell: String },

    /// An image file extension or format string is not recognized.
    #[error("unsupported image format: {format}")]
    UnsupportedImageFormat { format: String },

    // ===== Package size limits =====
    /// The total decompressed size of the ZIP package exceeds the configured limit.
    #[error("decompressed package size {actual} exceeds maximum of {max}")]
    ZipSizeExceeded { actual: u64, max: u64 },

    /// The number of entries in the ZIP package exceeds the configured limit.
    #[error("ZIP entry count {actual} exceeds maximum of {max}")]
    ZipEntryCountExceeded { actual: usize, max: usize },

    // ===== Formula errors =====
    /// A formula references a feature this crate does not evaluate or resolve.
    #[error("formula error: {0}")]
    FormulaError(String),

    /// An internal or otherwise unclassified error.
    #[error("internal error: {0}")]
    Internal(String),
}

/// A convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;
