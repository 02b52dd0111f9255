//! Loose numeric values
//!
//! Tween inputs may arrive as numbers or as text (configuration files,
//! command lines, scripting bridges). They are coerced to `f64` exactly once,
//! when they enter a [`Properties`](crate::Properties) map, using one of two
//! rules:
//!
//! - [`parse_float`]: the longest numeric prefix wins (`"12px"` is `12`).
//!   Used for the values a target starts out with.
//! - [`to_number`]: the whole string must be numeric (`"12px"` is NaN, `""`
//!   is `0`). Used for end values.
//!
//! Neither rule fails. Unparseable input becomes NaN.

use serde::{Deserialize, Serialize};

/// A field value before coercion
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Number(f64),
    Text(String),
}

impl Value {
    /// Coerce with prefix semantics, see [`parse_float`]
    pub fn parse_float(&self) -> f64 {
        match self {
            Value::Number(n) => *n,
            Value::Text(s) => parse_float(s),
        }
    }

    /// Coerce with whole-string semantics, see [`to_number`]
    pub fn to_number(&self) -> f64 {
        match self {
            Value::Number(n) => *n,
            Value::Text(s) => to_number(s),
        }
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Number(value)
    }
}

impl From<f32> for Value {
    fn from(value: f32) -> Self {
        Value::Number(value as f64)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Number(value as f64)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Number(value as f64)
    }
}

impl From<u32> for Value {
    fn from(value: u32) -> Self {
        Value::Number(value as f64)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Text(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Text(value)
    }
}

/// Parse the longest numeric prefix of `s`, ignoring leading whitespace.
///
/// Returns NaN when no prefix parses.
pub fn parse_float(s: &str) -> f64 {
    let s = s.trim_start();

    if let Some((value, _)) = signed_infinity(s) {
        return value;
    }

    let len = decimal_prefix_len(s);
    if len == 0 {
        return f64::NAN;
    }
    s[..len].parse().unwrap_or(f64::NAN)
}

/// Convert the whole of `s` to a number.
///
/// Surrounding whitespace is ignored and a blank string is `0`. Accepts
/// decimal literals, `Infinity`, and `0x`/`0o`/`0b` integer literals.
/// Anything else is NaN.
pub fn to_number(s: &str) -> f64 {
    let s = s.trim();
    if s.is_empty() {
        return 0.0;
    }

    if let Some((value, rest)) = signed_infinity(s) {
        return if rest.is_empty() { value } else { f64::NAN };
    }

    if let Some(value) = radix_literal(s) {
        return value;
    }

    let len = decimal_prefix_len(s);
    if len == 0 || len != s.len() {
        return f64::NAN;
    }
    s.parse().unwrap_or(f64::NAN)
}

/// Match an optionally signed `Infinity` at the start of `s`
fn signed_infinity(s: &str) -> Option<(f64, &str)> {
    let (sign, unsigned) = match s.as_bytes().first() {
        Some(b'-') => (-1.0, &s[1..]),
        Some(b'+') => (1.0, &s[1..]),
        _ => (1.0, s),
    };
    unsigned
        .strip_prefix("Infinity")
        .map(|rest| (sign * f64::INFINITY, rest))
}

/// Unsigned `0x`/`0o`/`0b` integer literal
fn radix_literal(s: &str) -> Option<f64> {
    let radix = match s.get(..2)? {
        "0x" | "0X" => 16,
        "0o" | "0O" => 8,
        "0b" | "0B" => 2,
        _ => return None,
    };

    let digits = &s[2..];
    if digits.is_empty() {
        return Some(f64::NAN);
    }

    let value = digits.chars().try_fold(0.0_f64, |acc, c| {
        c.to_digit(radix)
            .map(|d| acc * radix as f64 + d as f64)
    });
    Some(value.unwrap_or(f64::NAN))
}

/// Byte length of the decimal literal (sign, digits, fraction, exponent) at
/// the start of `s`, or 0 when there is none.
fn decimal_prefix_len(s: &str) -> usize {
    let bytes = s.as_bytes();
    let mut i = 0;

    if matches!(bytes.first(), Some(b'+' | b'-')) {
        i = 1;
    }

    let int_start = i;
    while i < bytes.len() && bytes[i].is_ascii_digit() {
        i += 1;
    }
    let mut digits = i - int_start;

    if i < bytes.len() && bytes[i] == b'.' {
        let mut j = i + 1;
        while j < bytes.len() && bytes[j].is_ascii_digit() {
            j += 1;
        }
        let fraction = j - (i + 1);
        if digits + fraction > 0 {
            digits += fraction;
            i = j;
        }
    }

    if digits == 0 {
        return 0;
    }

    // An exponent only counts when at least one digit follows it
    if i < bytes.len() && matches!(bytes[i], b'e' | b'E') {
        let mut j = i + 1;
        if j < bytes.len() && matches!(bytes[j], b'+' | b'-') {
            j += 1;
        }
        let exp_start = j;
        while j < bytes.len() && bytes[j].is_ascii_digit() {
            j += 1;
        }
        if j > exp_start {
            i = j;
        }
    }

    i
}
