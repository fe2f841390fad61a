//! Cell value representation.
//!
//! Provides the [`CellValue`] enum which represents the typed value of a
//! single cell in a worksheet. This is the high-level counterpart to the
//! raw XML `Cell` element from `sheetkit-xml`.

use std::fmt;

use chrono::{Datelike, NaiveDate, NaiveDateTime, Timelike};

use crate::error::{Error, Result};

/// Represents the value of a cell.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    /// No value (empty cell).
    Empty,
    /// Boolean value.
    Bool(bool),
    /// Numeric value (integers are stored as f64 in Excel).
    Number(f64),
    /// Date/time value, stored as a 1900-date-system serial day count. A date
    /// cell is otherwise an ordinary numeric cell whose style carries a date
    /// number format; the variant exists so callers don't have to track the
    /// style out of band.
    Date(f64),
    /// String value.
    String(String),
    /// Rich text value: a sequence of independently-formatted runs.
    RichString(Vec<crate::rich_text::RichTextRun>),
    /// Formula with optional cached result.
    Formula {
        expr: String,
        result: Option<Box<CellValue>>,
    },
    /// Error value (e.g. #DIV/0!, #N/A, #VALUE!).
    Error(String),
}

impl Default for CellValue {
    fn default() -> Self {
        Self::Empty
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Empty => write!(f, ""),
            CellValue::Bool(b) => write!(f, "{}", if *b { "TRUE" } else { "FALSE" }),
            CellValue::Number(n) | CellValue::Date(n) => {
                // Display integers without decimal point
                if n.fract() == 0.0 && n.is_finite() {
                    write!(f, "{}", *n as i64)
                } else {
                    write!(f, "{n}")
                }
            }
            CellValue::String(s) => write!(f, "{s}"),
            CellValue::RichString(runs) => write!(f, "{}", crate::rich_text::rich_text_to_plain(runs)),
            CellValue::Formula { result, expr, .. } => {
                if let Some(result) = result {
                    write!(f, "{result}")
                } else {
                    write!(f, "={expr}")
                }
            }
            CellValue::Error(e) => write!(f, "{e}"),
        }
    }
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        CellValue::String(s.to_string())
    }
}

impl From<String> for CellValue {
    fn from(s: String) -> Self {
        CellValue::String(s)
    }
}

impl From<f64> for CellValue {
    fn from(n: f64) -> Self {
        CellValue::Number(n)
    }
}

impl From<i32> for CellValue {
    fn from(n: i32) -> Self {
        CellValue::Number(f64::from(n))
    }
}

impl From<i64> for CellValue {
    fn from(n: i64) -> Self {
        CellValue::Number(n as f64)
    }
}

impl From<bool> for CellValue {
    fn from(b: bool) -> Self {
        CellValue::Bool(b)
    }
}

impl From<NaiveDate> for CellValue {
    fn from(date: NaiveDate) -> Self {
        CellValue::Date(date_to_serial(date))
    }
}

impl From<NaiveDateTime> for CellValue {
    fn from(dt: NaiveDateTime) -> Self {
        CellValue::Date(datetime_to_serial(dt))
    }
}

/// The epoch used by the (default) 1900 date system: the day before serial 1.
/// `1900-01-01` is serial `1`.
fn epoch_1900() -> NaiveDate {
    NaiveDate::from_ymd_opt(1899, 12, 31).expect("valid epoch date")
}

/// Convert a calendar date to its Excel 1900-date-system serial number.
///
/// Excel's 1900 date system treats 1900 as a leap year (it isn't), so every
/// real date from 1900-03-01 onward is shifted one serial higher than a
/// plain day-count from the epoch would give. This mirrors Excel's own
/// (incorrect but universally emulated) behavior.
pub fn date_to_serial(date: NaiveDate) -> f64 {
    let epoch = epoch_1900();
    let mut days = (date - epoch).num_days();
    if date >= NaiveDate::from_ymd_opt(1900, 3, 1).expect("valid date") {
        days += 1;
    }
    days as f64
}

/// Convert a date and time of day to its Excel 1900-date-system serial
/// number, with the time of day encoded as a fraction of a day.
pub fn datetime_to_serial(dt: NaiveDateTime) -> f64 {
    let date_serial = date_to_serial(dt.date());
    let time = dt.time();
    let day_fraction = (time.hour() as f64 * 3600.0
        + time.minute() as f64 * 60.0
        + time.second() as f64
        + time.nanosecond() as f64 / 1_000_000_000.0)
        / 86_400.0;
    date_serial + day_fraction
}

/// Convert an Excel 1900-date-system serial number back to a calendar date,
/// discarding any time-of-day fraction.
///
/// Serial `60` refers to the fictitious `1900-02-29` that Excel's 1900 date
/// system carries for historical compatibility with Lotus 1-2-3; since no
/// such date exists, it is rejected rather than silently rounded.
pub fn serial_to_date(serial: f64) -> Result<NaiveDate> {
    if !serial.is_finite() || serial < 0.0 {
        return Err(Error::InvalidArgument {
            message: format!("invalid date serial number: {serial}"),
        });
    }
    let whole = serial.trunc() as i64;
    if whole == 60 {
        return Err(Error::InvalidArgument {
            message: "serial 60 refers to the fictitious 1900-02-29 and has no real date"
                .to_string(),
        });
    }
    let epoch = epoch_1900();
    let offset = if whole >= 61 { whole - 1 } else { whole };
    epoch
        .checked_add_signed(chrono::Duration::days(offset))
        .ok_or_else(|| Error::InvalidArgument {
            message: format!("date serial number out of range: {serial}"),
        })
}

/// Whether a built-in number format ID (see `crate::style::builtin_num_fmts`)
/// represents a date or time format.
pub fn is_date_num_fmt(num_fmt_id: u32) -> bool {
    matches!(num_fmt_id, 14..=22 | 27..=36 | 45..=47)
}

/// Heuristically determine whether a custom number format code represents a
/// date or time format, by looking for date/time pattern letters (`y`, `m`,
/// `d`, `h`, `s`) outside of quoted literals and `[...]` locale/color tags.
pub fn is_date_format_code(code: &str) -> bool {
    let mut in_quotes = false;
    let mut in_brackets = false;
    let mut letters = String::new();
    let mut chars = code.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '\\' => {
                chars.next();
            }
            '"' => in_quotes = !in_quotes,
            '[' if !in_quotes => in_brackets = true,
            ']' if !in_quotes && in_brackets => in_brackets = false,
            c if !in_quotes && !in_brackets && c.is_ascii_alphabetic() => {
                letters.push(c.to_ascii_lowercase());
            }
            _ => {}
        }
    }
    if letters.contains('g') || letters.contains('@') {
        return false;
    }
    letters.contains('y')
        || letters.contains('d')
        || letters.contains('h')
        || letters.contains('s')
        || letters.contains('m')
}
