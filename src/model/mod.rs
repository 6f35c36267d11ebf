use std::path::PathBuf;

use indexmap::IndexMap;
use serde::Serialize;
use serde_json::Value;

/// One exported row: field name → converted value, in column order.
pub type Record = IndexMap<String, TypedValue>;

/// Represents a converted cell value.
///
/// Serialization is untagged so that the exported JSON contains plain
/// numbers, strings, objects and arrays. `Pair` and `Triple` serialize as
/// `{"x":..,"y":..}` and `{"x":..,"y":..,"z":..}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum TypedValue {
    /// Integer literal (`int`, `long`, integral `number`).
    Int(i64),
    /// Floating point literal (`float`, decimal `number`).
    Float(f64),
    /// Boolean literal.
    Bool(bool),
    /// Plain string literal.
    String(String),
    /// Normalized `YYYY-MM-DD HH:MM:SS` date-time text.
    Date(String),
    /// Ordered key/value object.
    Object(IndexMap<String, TypedValue>),
    /// Ordered heterogeneous sequence.
    Array(Vec<TypedValue>),
    /// Two-component integer tuple.
    Pair { x: i64, y: i64 },
    /// Three-component integer tuple.
    Triple { x: i64, y: i64, z: i64 },
    /// JSON `null` carried over from a JSON literal cell.
    Null,
}

impl TypedValue {
    /// Converts a parsed JSON literal into a typed value. Integral numbers
    /// that fit in an `i64` become [`TypedValue::Int`], every other number
    /// becomes [`TypedValue::Float`].
    pub fn from_json(value: Value) -> Self {
        match value {
            Value::Null => TypedValue::Null,
            Value::Bool(value) => TypedValue::Bool(value),
            Value::Number(number) => match number.as_i64() {
                Some(int) => TypedValue::Int(int),
                None => TypedValue::Float(number.as_f64().unwrap_or_default()),
            },
            Value::String(value) => TypedValue::String(value),
            Value::Array(items) => {
                TypedValue::Array(items.into_iter().map(TypedValue::from_json).collect())
            }
            Value::Object(entries) => TypedValue::Object(
                entries
                    .into_iter()
                    .map(|(key, value)| (key, TypedValue::from_json(value)))
                    .collect(),
            ),
        }
    }

    /// Converts the value into its JSON representation.
    pub fn to_json(&self) -> Value {
        match self {
            TypedValue::Int(value) => Value::from(*value),
            TypedValue::Float(value) => serde_json::Number::from_f64(*value)
                .map(Value::Number)
                .unwrap_or(Value::Null),
            TypedValue::Bool(value) => Value::Bool(*value),
            TypedValue::String(value) | TypedValue::Date(value) => Value::String(value.clone()),
            TypedValue::Object(entries) => Value::Object(
                entries
                    .iter()
                    .map(|(key, value)| (key.clone(), value.to_json()))
                    .collect(),
            ),
            TypedValue::Array(items) => Value::Array(items.iter().map(Self::to_json).collect()),
            TypedValue::Pair { x, y } => serde_json::json!({ "x": x, "y": y }),
            TypedValue::Triple { x, y, z } => serde_json::json!({ "x": x, "y": y, "z": z }),
            TypedValue::Null => Value::Null,
        }
    }
}

/// Header metadata for one column, built from the four header rows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnDescriptor {
    /// Zero-based column index.
    pub index: usize,
    /// Comment row text. A leading `#` excludes the column.
    pub comment: String,
    /// Field name used as the record key.
    pub name: String,
    /// Type tag selecting the converter.
    pub type_tag: String,
    /// Routing tag selecting client and/or server output.
    pub route_tag: String,
    /// Whether the column is ignored.
    pub excluded: bool,
}

/// Inclusive rectangular merged range with the value of its anchor cell.
/// Coordinates are zero-based.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergedRange {
    pub start_row: usize,
    pub start_col: usize,
    pub end_row: usize,
    pub end_col: usize,
    pub anchor_value: String,
}

impl MergedRange {
    pub fn new(
        start: (usize, usize),
        end: (usize, usize),
        anchor_value: impl Into<String>,
    ) -> Self {
        Self {
            start_row: start.0,
            start_col: start.1,
            end_row: end.0,
            end_col: end.1,
            anchor_value: anchor_value.into(),
        }
    }

    /// Builds a range from 1-based spreadsheet coordinates.
    pub fn from_one_based(
        start: (usize, usize),
        end: (usize, usize),
        anchor_value: impl Into<String>,
    ) -> Self {
        Self::new(
            (start.0.saturating_sub(1), start.1.saturating_sub(1)),
            (end.0.saturating_sub(1), end.1.saturating_sub(1)),
            anchor_value,
        )
    }
}

/// Cell text and merged-range geometry of one worksheet, as delivered by a
/// workbook reader.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawSheet {
    pub name: String,
    /// Rows of cell text; blank cells are empty strings.
    pub rows: Vec<Vec<String>>,
    pub merged: Vec<MergedRange>,
}

impl RawSheet {
    pub fn new(name: impl Into<String>, rows: Vec<Vec<String>>) -> Self {
        Self {
            name: name.into(),
            rows,
            merged: Vec::new(),
        }
    }

    pub fn with_merged(mut self, merged: Vec<MergedRange>) -> Self {
        self.merged = merged;
        self
    }
}

/// Client and server records extracted from one sheet.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SheetResult {
    /// Workbook the sheet was read from; empty for in-memory sheets.
    pub file: PathBuf,
    pub sheet_name: String,
    pub client_records: Vec<Record>,
    pub server_records: Vec<Record>,
}

impl SheetResult {
    pub fn new(sheet_name: impl Into<String>) -> Self {
        Self {
            sheet_name: sheet_name.into(),
            ..Self::default()
        }
    }
}
