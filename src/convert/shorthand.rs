use indexmap::IndexMap;
use serde_json::Value;

use super::{ConvertError, ConvertOptions, ShorthandGroups, numeric_value};
use crate::model::TypedValue;

/// JSON object literal, or `key:int,key:int` shorthand.
pub fn convert_object(raw: &str, _options: &ConvertOptions) -> Result<TypedValue, ConvertError> {
    object_like(raw, |value| parse_integer(value).map(TypedValue::Int))
}

/// JSON object literal, or `key:text,key:text` shorthand.
pub fn convert_string_map(
    raw: &str,
    _options: &ConvertOptions,
) -> Result<TypedValue, ConvertError> {
    object_like(raw, |value| Ok(TypedValue::String(value.to_string())))
}

/// JSON array literal, or comma-separated elements where numeric-shaped
/// elements follow the `number` rule and the rest stay strings.
pub fn convert_array(raw: &str, _options: &ConvertOptions) -> Result<TypedValue, ConvertError> {
    let text = raw.trim();
    if text.is_empty() {
        return Ok(TypedValue::Array(Vec::new()));
    }
    if text.starts_with('[') {
        return parse_json(text);
    }

    let items = if text.contains(',') {
        text.split(',').map(array_element).collect::<Result<Vec<_>, _>>()?
    } else {
        vec![array_element(text)?]
    };
    Ok(TypedValue::Array(items))
}

/// JSON object literal, or `x:y` shorthand.
pub fn convert_pair(raw: &str, options: &ConvertOptions) -> Result<TypedValue, ConvertError> {
    let text = raw.trim();
    if text.starts_with('{') {
        return parse_json(text);
    }
    let [x, y] = shorthand_tuple::<2>(text, options)?;
    Ok(TypedValue::Pair { x, y })
}

/// JSON object literal, or `x:y:z` shorthand.
pub fn convert_triple(raw: &str, options: &ConvertOptions) -> Result<TypedValue, ConvertError> {
    let text = raw.trim();
    if text.starts_with('{') {
        return parse_json(text);
    }
    let [x, y, z] = shorthand_tuple::<3>(text, options)?;
    Ok(TypedValue::Triple { x, y, z })
}

fn object_like(
    raw: &str,
    value_of: impl Fn(&str) -> Result<TypedValue, ConvertError>,
) -> Result<TypedValue, ConvertError> {
    let text = raw.trim();
    if text.is_empty() {
        return Ok(TypedValue::Object(IndexMap::new()));
    }
    if text.starts_with('{') {
        return parse_json(text);
    }

    let mut entries = IndexMap::new();
    for entry in text.split(',') {
        let (key, value) = entry
            .split_once(':')
            .ok_or_else(|| ConvertError::MissingSeparator(entry.to_string()))?;
        let (key, value) = (key.trim(), value.trim());
        if key.is_empty() || value.is_empty() {
            return Err(ConvertError::EmptyEntry(entry.to_string()));
        }
        entries.insert(key.to_string(), value_of(value)?);
    }
    Ok(TypedValue::Object(entries))
}

// Earlier groups are parsed (and so validated) but only the last one survives
// under `KeepLast`.
fn shorthand_tuple<const N: usize>(
    text: &str,
    options: &ConvertOptions,
) -> Result<[i64; N], ConvertError> {
    let groups: Vec<&str> = text.split(',').collect();
    if groups.len() > 1 && options.shorthand_groups == ShorthandGroups::Reject {
        return Err(ConvertError::MultipleGroups(groups.len()));
    }

    let mut values = [0_i64; N];
    for group in groups {
        let parts: Vec<&str> = group.split(':').collect();
        if parts.len() < N {
            return Err(ConvertError::TooFewParts {
                expected: N,
                found: parts.len(),
                text: group.to_string(),
            });
        }
        for (slot, part) in values.iter_mut().zip(&parts) {
            *slot = parse_integer(part)?;
        }
    }
    Ok(values)
}

fn array_element(text: &str) -> Result<TypedValue, ConvertError> {
    let text = text.trim();
    Ok(numeric_value(text)?.unwrap_or_else(|| TypedValue::String(text.to_string())))
}

fn parse_json(text: &str) -> Result<TypedValue, ConvertError> {
    let value: Value = serde_json::from_str(text).map_err(ConvertError::MalformedJson)?;
    Ok(TypedValue::from_json(value))
}

fn parse_integer(text: &str) -> Result<i64, ConvertError> {
    let text = text.trim();
    text.parse::<i64>()
        .map_err(|_| ConvertError::NotAnInteger(text.to_string()))
}
