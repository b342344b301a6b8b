//! Parses a trimmed field into its resolved type, including null/true/false
//! matching and the COBOL signed-overpunch convention.

use std::collections::HashMap;

use crate::error::{ConversionErrorSnafu, Result};
use crate::options::ConvertOptions;
use crate::row::trim_ascii_spaces;
use crate::schema::DataType;

/// A single converted cell. `Null` is a first-class outcome distinct from
/// `String(vec![])`: an empty field and a null field are different things
/// unless `null_values` says otherwise.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Int64(i64),
    Float64(f64),
    String(Vec<u8>),
}

/// Attempts a bool parse against `true_values`/`false_values`. Used both by
/// the type inferencer (as a probe) and by final conversion.
pub fn try_parse_bool(trimmed: &[u8], options: &ConvertOptions) -> Option<bool> {
    if options.true_values.contains(trimmed) {
        Some(true)
    } else if options.false_values.contains(trimmed) {
        Some(false)
    } else {
        None
    }
}

/// Ordinary (non-COBOL) signed decimal integer: optional leading sign,
/// remaining bytes ASCII digits.
pub fn try_parse_plain_int64(trimmed: &[u8]) -> Option<i64> {
    if trimmed.is_empty() {
        return None;
    }
    let digits = match trimmed[0] {
        b'+' | b'-' => &trimmed[1..],
        _ => trimmed,
    };
    if digits.is_empty() || !digits.iter().all(u8::is_ascii_digit) {
        return None;
    }
    std::str::from_utf8(trimmed).ok()?.parse::<i64>().ok()
}

/// Int64 parse honoring `is_cobol`'s signed-overpunch convention on the
/// final character. Falls back to an ordinary signed decimal when the final
/// character isn't a mapped overpunch digit.
pub fn try_parse_int64(
    trimmed: &[u8],
    is_cobol: bool,
    pos_values: &HashMap<u8, u8>,
    neg_values: &HashMap<u8, u8>,
) -> Option<i64> {
    if is_cobol {
        if let Some(value) = try_parse_overpunch(trimmed, pos_values, neg_values) {
            return Some(value);
        }
    }
    try_parse_plain_int64(trimmed)
}

fn try_parse_overpunch(
    trimmed: &[u8],
    pos_values: &HashMap<u8, u8>,
    neg_values: &HashMap<u8, u8>,
) -> Option<i64> {
    let (&last, rest) = trimmed.split_last()?;
    let (digit, negative) = if let Some(&d) = pos_values.get(&last) {
        (d, false)
    } else if let Some(&d) = neg_values.get(&last) {
        (d, true)
    } else {
        return None;
    };
    let mut digits = rest.to_vec();
    digits.push(b'0' + digit);
    let value = try_parse_plain_int64(&digits)?;
    Some(if negative { -value } else { value })
}

pub fn try_parse_float64(trimmed: &[u8]) -> Option<f64> {
    if trimmed.is_empty() {
        return None;
    }
    std::str::from_utf8(trimmed).ok()?.parse::<f64>().ok()
}

/// Converts one field to its resolved `target` type. `raw` is the field's
/// untrimmed bytes (needed for STRING, which preserves internal spaces);
/// `trimmed` is ASCII-space-trimmed.
pub struct ValueConverter<'a> {
    options: &'a ConvertOptions,
}

impl<'a> ValueConverter<'a> {
    pub fn new(options: &'a ConvertOptions) -> Self {
        Self { options }
    }

    pub fn convert(
        &self,
        row: usize,
        column: &str,
        raw: &[u8],
        target: DataType,
    ) -> Result<Value> {
        let trimmed = trim_ascii_spaces(raw);

        if target == DataType::String {
            return if self.options.strings_can_be_null && self.options.is_null(trimmed) {
                Ok(Value::Null)
            } else {
                Ok(Value::String(raw.to_vec()))
            };
        }

        if self.options.is_null(trimmed) {
            return Ok(Value::Null);
        }

        match target {
            DataType::Null => Ok(Value::Null),
            DataType::Bool => try_parse_bool(trimmed, self.options)
                .map(Value::Bool)
                .ok_or_else(|| conversion_error(row, column, target, trimmed)),
            DataType::Int64 => try_parse_int64(
                trimmed,
                self.options.is_cobol,
                &self.options.pos_values,
                &self.options.neg_values,
            )
            .map(Value::Int64)
            .ok_or_else(|| conversion_error(row, column, target, trimmed)),
            DataType::Float64 => try_parse_float64(trimmed)
                .map(Value::Float64)
                .ok_or_else(|| conversion_error(row, column, target, trimmed)),
            DataType::String | DataType::Binary => Ok(Value::String(raw.to_vec())),
        }
    }
}

fn conversion_error(
    row: usize,
    column: &str,
    target_type: DataType,
    trimmed: &[u8],
) -> crate::error::FwfError {
    ConversionErrorSnafu {
        row,
        column: column.to_string(),
        target_type,
        value: String::from_utf8_lossy(trimmed).into_owned(),
    }
    .build()
}
