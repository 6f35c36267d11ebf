use std::path::PathBuf;

use thiserror::Error;

use crate::convert::ConvertError;

/// Convenient alias for fallible results returned throughout the crate.
pub type Result<T> = std::result::Result<T, ToolError>;

/// Error type covering the different failure cases that can occur when the
/// tool reads workbooks, converts cells, or writes the record sets.
#[derive(Debug, Error)]
pub enum ToolError {
    /// Wrapper for IO failures such as reading or writing files.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Raised when JSON serialization fails.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Raised when the YAML run configuration cannot be parsed.
    #[error("configuration error: {0}")]
    Config(#[from] serde_yaml::Error),

    /// Errors bubbled up from the CSV writer.
    #[error("CSV write error: {0}")]
    Csv(#[from] csv::Error),

    /// Errors bubbled up from the xlsx reader implementation.
    #[error("Excel read error: {0}")]
    ExcelRead(#[from] calamine::XlsxError),

    /// Errors bubbled up from the format-sniffing workbook reader.
    #[error("Excel read error: {0}")]
    Workbook(#[from] calamine::Error),

    /// Raised when a workbook is missing an expected sheet.
    #[error("invalid workbook structure: {0}")]
    InvalidWorkbook(String),

    /// Raised when a sheet does not follow the four-row header contract.
    #[error("schema error in sheet '{sheet}': {reason}")]
    Schema { sheet: String, reason: String },

    /// Raised when a cell cannot be converted to its column type.
    #[error(
        "cannot convert cell {cell} of sheet '{sheet}' (field '{field}', type '{type_tag}', raw '{raw}'): {source}"
    )]
    Conversion {
        sheet: String,
        cell: String,
        field: String,
        type_tag: String,
        raw: String,
        #[source]
        source: ConvertError,
    },

    /// Wraps a sheet-level failure with the workbook it came from.
    #[error("{file}: {source}")]
    InFile {
        file: PathBuf,
        #[source]
        source: Box<ToolError>,
    },

    /// Raised when the user provides a path that does not exist.
    #[error("input not found: {0}")]
    MissingInput(PathBuf),

    /// Raised when the configured export format is not known.
    #[error("unsupported export format '{0}' (expected json, csv or sql)")]
    UnsupportedFormat(String),

    /// Raised when the tracing subscriber fails to initialise.
    #[error("failed to initialise logging: {0}")]
    Logging(String),
}

impl ToolError {
    /// Attaches the workbook path to an error raised while processing it.
    pub fn in_file(self, file: impl Into<PathBuf>) -> Self {
        match self {
            already @ ToolError::InFile { .. } => already,
            other => ToolError::InFile {
                file: file.into(),
                source: Box::new(other),
            },
        }
    }
}
