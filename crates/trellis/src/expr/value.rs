//! Argument casting and data model lookups.

use serde_json::{Number, Value};

use trellis_parser::DataBinding;

use crate::expr::ExprError;

/// Casts a value to a string. `null` stays `None`.
pub(crate) fn cast_string(value: &Value) -> Result<Option<String>, ExprError> {
    match value {
        Value::Null => Ok(None),
        Value::String(s) => Ok(Some(s.clone())),
        Value::Bool(b) => Ok(Some(b.to_string())),
        Value::Number(n) => Ok(Some(number_to_string(n))),
        other => Err(cast_error(other, "string")),
    }
}

/// Casts a value to a number. Strings must be plain decimal numbers.
pub(crate) fn cast_number(value: &Value) -> Result<Option<f64>, ExprError> {
    match value {
        Value::Null => Ok(None),
        Value::Number(n) => n.as_f64().map(Some).ok_or_else(|| cast_error(value, "number")),
        Value::String(s) if is_decimal(s) => s
            .parse::<f64>()
            .map(Some)
            .map_err(|_| cast_error(value, "number")),
        other => Err(cast_error(other, "number")),
    }
}

/// Casts a value to a boolean.
///
/// Accepts booleans, `"true"`, `"false"`, `"1"`, `"0"`, `1` and `0`.
pub(crate) fn cast_boolean(value: &Value) -> Result<Option<bool>, ExprError> {
    match value {
        Value::Null => Ok(None),
        Value::Bool(b) => Ok(Some(*b)),
        Value::String(s) => match s.as_str() {
            "true" | "1" => Ok(Some(true)),
            "false" | "0" => Ok(Some(false)),
            _ => Err(cast_error(value, "boolean")),
        },
        Value::Number(n) => match n.as_f64() {
            Some(f) if f == 1.0 => Ok(Some(true)),
            Some(f) if f == 0.0 => Ok(Some(false)),
            _ => Err(cast_error(value, "boolean")),
        },
        other => Err(cast_error(other, "boolean")),
    }
}

fn number_to_string(n: &Number) -> String {
    match n.as_f64() {
        Some(f) if n.is_f64() && f.fract() == 0.0 && f.abs() < i64::MAX as f64 => {
            (f as i64).to_string()
        }
        _ => n.to_string(),
    }
}

fn is_decimal(s: &str) -> bool {
    let digits = s.strip_prefix('-').unwrap_or(s);
    let (whole, fraction) = match digits.split_once('.') {
        Some((whole, fraction)) => (whole, Some(fraction)),
        None => (digits, None),
    };

    !whole.is_empty()
        && whole.bytes().all(|b| b.is_ascii_digit())
        && fraction.is_none_or(|f| !f.is_empty() && f.bytes().all(|b| b.is_ascii_digit()))
}

fn cast_error(value: &Value, target: &'static str) -> ExprError {
    ExprError::Cast {
        value: value.to_string(),
        target,
    }
}

/// Reads a scalar from the form data at `path`.
///
/// Flat documents (an object whose keys are full dotted paths) are checked
/// first, then the path is walked through nested objects and arrays. Only
/// strings, numbers and booleans are returned; anything else reads as `null`.
pub(crate) fn pick_simple_value(form_data: &Value, path: &str) -> Value {
    if let Some(value) = form_data.as_object().and_then(|object| object.get(path)) {
        return scalar_or_null(value);
    }

    let binding = DataBinding::parse(path);
    let mut current = form_data;
    for segment in binding.segments() {
        let Some(next) = current.get(segment.base()) else {
            return Value::Null;
        };
        current = match segment.array_index() {
            Some(index) => match next.get(index) {
                Some(item) => item,
                None => return Value::Null,
            },
            None => next,
        };
    }

    scalar_or_null(current)
}

fn scalar_or_null(value: &Value) -> Value {
    match value {
        Value::String(_) | Value::Number(_) | Value::Bool(_) => value.clone(),
        _ => Value::Null,
    }
}
