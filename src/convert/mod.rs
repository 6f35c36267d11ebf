//! Conversion of raw cell text into [`TypedValue`]s, keyed by the column's
//! type tag.
//!
//! Every converter is a plain function registered under one or more tags in a
//! [`ConverterRegistry`]. Unknown tags fall back to the `string` converter, so
//! a sheet never fails because of a tag the registry does not know.

mod shorthand;

use std::collections::HashMap;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::classify::{NumberShape, classify};
use crate::model::TypedValue;

pub use shorthand::{
    convert_array, convert_object, convert_pair, convert_string_map, convert_triple,
};

/// Signature shared by all converters.
pub type Converter = fn(&str, &ConvertOptions) -> Result<TypedValue, ConvertError>;

/// Format used to validate normalized dates in strict mode.
pub const DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// How malformed `int`, `long`, `float`, `bool` and `date` cells are handled.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Leniency {
    /// Malformed text silently becomes zero, `false` or the unparsed date.
    #[default]
    Lenient,
    /// Malformed text is a conversion error.
    Strict,
}

/// How `pair`/`triple` shorthand with several comma-separated groups is handled.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShorthandGroups {
    /// Only the last group's values are kept.
    #[default]
    KeepLast,
    /// More than one group is a conversion error.
    Reject,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConvertOptions {
    pub leniency: Leniency,
    pub shorthand_groups: ShorthandGroups,
}

/// Raised when a cell's text does not fit its column type.
#[derive(Debug, Error)]
pub enum ConvertError {
    #[error("'{0}' is not a number")]
    NotANumber(String),

    #[error("'{0}' is not an integer")]
    NotAnInteger(String),

    #[error("malformed JSON literal: {0}")]
    MalformedJson(#[source] serde_json::Error),

    #[error("shorthand entry '{0}' is missing its ':' separator")]
    MissingSeparator(String),

    #[error("shorthand entry '{0}' has an empty key or value")]
    EmptyEntry(String),

    #[error("expected {expected} ':'-separated parts in '{text}', found {found}")]
    TooFewParts {
        expected: usize,
        found: usize,
        text: String,
    },

    #[error("expected a single shorthand group, found {0}")]
    MultipleGroups(usize),

    #[error("'{text}' is not a valid {tag}")]
    Invalid { tag: &'static str, text: String },
}

/// Maps type tags to converters.
#[derive(Debug, Clone)]
pub struct ConverterRegistry {
    converters: HashMap<String, Converter>,
    options: ConvertOptions,
}

impl Default for ConverterRegistry {
    fn default() -> Self {
        Self::new(ConvertOptions::default())
    }
}

impl ConverterRegistry {
    /// Creates a registry holding the built-in tags.
    pub fn new(options: ConvertOptions) -> Self {
        let mut registry = Self {
            converters: HashMap::new(),
            options,
        };

        registry.register("string", convert_string);
        registry.register("int", convert_int);
        registry.register("long", convert_long);
        registry.register("float", convert_float);
        registry.register("number", convert_number);
        registry.register("bool", convert_bool);
        registry.register("date", convert_date);
        registry.register("object", convert_object);
        registry.register("map<string>", convert_string_map);
        for tag in ["array", "int[]", "string[]"] {
            registry.register(tag, convert_array);
        }
        registry.register("pair", convert_pair);
        registry.register("triple", convert_triple);
        registry
    }

    /// Registers (or replaces) the converter for `tag`.
    pub fn register(&mut self, tag: impl Into<String>, converter: Converter) {
        self.converters.insert(tag.into(), converter);
    }

    pub fn options(&self) -> &ConvertOptions {
        &self.options
    }

    pub fn contains(&self, tag: &str) -> bool {
        self.converters.contains_key(tag)
    }

    /// Converts `raw` according to `tag`.
    pub fn convert(&self, tag: &str, raw: &str) -> Result<TypedValue, ConvertError> {
        let converter = self
            .converters
            .get(tag)
            .copied()
            .unwrap_or(convert_string as Converter);
        converter(raw, &self.options)
    }
}

pub fn convert_string(raw: &str, _options: &ConvertOptions) -> Result<TypedValue, ConvertError> {
    Ok(TypedValue::String(raw.to_string()))
}

pub fn convert_int(raw: &str, options: &ConvertOptions) -> Result<TypedValue, ConvertError> {
    match raw.trim().parse::<i32>() {
        Ok(value) => Ok(TypedValue::Int(i64::from(value))),
        Err(_) => lenient_default(options, "int", raw, TypedValue::Int(0)),
    }
}

pub fn convert_long(raw: &str, options: &ConvertOptions) -> Result<TypedValue, ConvertError> {
    match raw.trim().parse::<i64>() {
        Ok(value) => Ok(TypedValue::Int(value)),
        Err(_) => lenient_default(options, "long", raw, TypedValue::Int(0)),
    }
}

pub fn convert_float(raw: &str, options: &ConvertOptions) -> Result<TypedValue, ConvertError> {
    match raw.trim().parse::<f64>() {
        Ok(value) => Ok(TypedValue::Float(value)),
        Err(_) => lenient_default(options, "float", raw, TypedValue::Float(0.0)),
    }
}

/// Integral text becomes an `Int`, decimal text a `Float`. Scientific
/// notation is kept verbatim as a string.
pub fn convert_number(raw: &str, _options: &ConvertOptions) -> Result<TypedValue, ConvertError> {
    match numeric_value(raw)? {
        Some(value) => Ok(value),
        None => Err(ConvertError::NotANumber(raw.to_string())),
    }
}

pub fn convert_bool(raw: &str, options: &ConvertOptions) -> Result<TypedValue, ConvertError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "t" | "1" => Ok(TypedValue::Bool(true)),
        "false" | "f" | "0" => Ok(TypedValue::Bool(false)),
        _ => lenient_default(options, "bool", raw, TypedValue::Bool(false)),
    }
}

pub fn convert_date(raw: &str, options: &ConvertOptions) -> Result<TypedValue, ConvertError> {
    let normalized = normalize_date(raw);
    if options.leniency == Leniency::Strict
        && NaiveDateTime::parse_from_str(&normalized, DATE_FORMAT).is_err()
    {
        return Err(ConvertError::Invalid {
            tag: "date",
            text: raw.to_string(),
        });
    }
    Ok(TypedValue::Date(normalized))
}

/// Completes a date to `YYYY-MM-DD HH:MM:SS`: slashes become dashes and the
/// missing time components are filled with zeros.
pub fn normalize_date(text: &str) -> String {
    let text = text.trim().replace('/', "-");
    let mut parts = text.split_whitespace();
    let day = parts.next().unwrap_or_default();
    match parts.next() {
        None => format!("{day} 00:00:00"),
        Some(time) => match time.matches(':').count() {
            0 => format!("{day} {time}:00:00"),
            1 => format!("{day} {time}:00"),
            _ => format!("{day} {time}"),
        },
    }
}

/// Applies the `number` rule to numeric-shaped text. Returns `Ok(None)` when
/// the text is not numeric at all.
pub(crate) fn numeric_value(raw: &str) -> Result<Option<TypedValue>, ConvertError> {
    let text = raw.trim();
    let value = match classify(text) {
        NumberShape::Int => TypedValue::Int(
            text.parse::<i64>()
                .map_err(|_| ConvertError::NotAnInteger(text.to_string()))?,
        ),
        NumberShape::Decimal => TypedValue::Float(
            text.parse::<f64>()
                .map_err(|_| ConvertError::NotANumber(text.to_string()))?,
        ),
        NumberShape::Scientific => TypedValue::String(raw.to_string()),
        NumberShape::Other => return Ok(None),
    };
    Ok(Some(value))
}

fn lenient_default(
    options: &ConvertOptions,
    tag: &'static str,
    raw: &str,
    fallback: TypedValue,
) -> Result<TypedValue, ConvertError> {
    match options.leniency {
        Leniency::Lenient => Ok(fallback),
        Leniency::Strict => Err(ConvertError::Invalid {
            tag,
            text: raw.to_string(),
        }),
    }
}
