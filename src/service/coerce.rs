//! Type coercion for loosely typed form input: numbers and flags often arrive as strings.

use crate::error::AppError;
use crate::store::Record;
use serde_json::{Number, Value};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Coercion {
    Int,
    Float,
    Bool,
}

/// Coerce each listed field that is present and non-null. Other fields are untouched.
pub fn coerce_fields(body: &mut Record, rules: &[(&str, Coercion)]) -> Result<(), AppError> {
    for (field, kind) in rules {
        let Some(v) = body.get(*field).filter(|v| !v.is_null()) else { continue };
        let coerced = match kind {
            Coercion::Int => to_int(field, v)?,
            Coercion::Float => to_float(field, v)?,
            Coercion::Bool => to_bool(field, v)?,
        };
        body.insert(field.to_string(), coerced);
    }
    Ok(())
}

/// Integers pass through; floats and numeric strings are truncated toward zero.
pub fn to_int(field: &str, v: &Value) -> Result<Value, AppError> {
    let invalid = || AppError::Validation(format!("{} must be an integer", field));
    match v {
        Value::Null => Ok(Value::Null),
        Value::Number(n) => match n.as_i64() {
            Some(i) => Ok(Value::from(i)),
            None => n.as_f64().and_then(truncate).ok_or_else(invalid),
        },
        Value::String(s) => {
            let s = s.trim();
            if let Ok(i) = s.parse::<i64>() {
                return Ok(Value::from(i));
            }
            s.parse::<f64>().ok().and_then(truncate).ok_or_else(invalid)
        }
        _ => Err(invalid()),
    }
}

fn truncate(f: f64) -> Option<Value> {
    if f.is_finite() && f.abs() < i64::MAX as f64 {
        Some(Value::from(f.trunc() as i64))
    } else {
        None
    }
}

/// Blank strings become null.
pub fn to_float(field: &str, v: &Value) -> Result<Value, AppError> {
    let invalid = || AppError::Validation(format!("{} must be a number", field));
    match v {
        Value::Null => Ok(Value::Null),
        Value::Number(_) => Ok(v.clone()),
        Value::String(s) if s.trim().is_empty() => Ok(Value::Null),
        Value::String(s) => s
            .trim()
            .parse::<f64>()
            .ok()
            .and_then(Number::from_f64)
            .map(Value::Number)
            .ok_or_else(invalid),
        _ => Err(invalid()),
    }
}

pub fn to_bool(field: &str, v: &Value) -> Result<Value, AppError> {
    match v {
        Value::Null => Ok(Value::Bool(false)),
        Value::Bool(b) => Ok(Value::Bool(*b)),
        Value::Number(n) => Ok(Value::Bool(n.as_f64().map(|f| f != 0.0).unwrap_or(false))),
        Value::String(s) => match s.trim().to_lowercase().as_str() {
            "true" | "t" | "yes" | "y" | "on" | "1" => Ok(Value::Bool(true)),
            "false" | "f" | "no" | "n" | "off" | "0" | "" => Ok(Value::Bool(false)),
            _ => Err(AppError::Validation(format!("{} must be a boolean", field))),
        },
        _ => Err(AppError::Validation(format!("{} must be a boolean", field))),
    }
}
