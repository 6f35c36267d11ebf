//! Text-shape detection for numeric cells.

use once_cell::sync::Lazy;
use regex::Regex;

static INT_PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[+-]?[0-9]+$").unwrap());
static DECIMAL_LEADING: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[+-]?[0-9]*\.[0-9]+$").unwrap());
static DECIMAL_TRAILING: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[+-]?[0-9]+\.[0-9]*$").unwrap());

/// Shape of a cell's text when read as a number.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NumberShape {
    /// Optional sign followed by digits.
    Int,
    /// Digits around a single point, e.g. `11.15`, `3.`, `.15`.
    Decimal,
    /// Int-or-decimal mantissa, `e`/`E`, integer exponent.
    Scientific,
    Other,
}

/// Classifies `text` after trimming surrounding whitespace.
pub fn classify(text: &str) -> NumberShape {
    let text = text.trim();
    if let Some(split) = text.find(['e', 'E']) {
        let (mantissa, exponent) = (&text[..split], &text[split + 1..]);
        return if is_scientific(mantissa, exponent) {
            NumberShape::Scientific
        } else {
            NumberShape::Other
        };
    }

    if is_int(text) {
        NumberShape::Int
    } else if is_decimal(text) {
        NumberShape::Decimal
    } else {
        NumberShape::Other
    }
}

pub fn is_int(text: &str) -> bool {
    INT_PATTERN.is_match(text)
}

pub fn is_decimal(text: &str) -> bool {
    DECIMAL_LEADING.is_match(text) || DECIMAL_TRAILING.is_match(text)
}

fn is_scientific(mantissa: &str, exponent: &str) -> bool {
    if mantissa.is_empty() || exponent.is_empty() {
        return false;
    }
    (is_int(mantissa) || is_decimal(mantissa)) && is_int(exponent)
}
