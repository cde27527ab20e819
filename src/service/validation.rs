//! Request validation: required fields and enumerated values.

use crate::error::AppError;
use crate::store::Record;
use serde_json::Value;

pub struct RequestValidator;

impl RequestValidator {
    /// Every field must be present and non-blank. The first missing one is named in the error.
    pub fn require(body: &Record, fields: &[&str]) -> Result<(), AppError> {
        for field in fields {
            if is_blank(body.get(*field)) {
                return Err(AppError::Validation(format!("{} is required", field)));
            }
        }
        Ok(())
    }

    /// When `field` is present and non-null it must be one of `allowed`.
    pub fn one_of(body: &Record, field: &str, allowed: &[&str]) -> Result<(), AppError> {
        let Some(v) = body.get(field).filter(|v| !v.is_null()) else {
            return Ok(());
        };
        match v.as_str() {
            Some(s) if allowed.contains(&s) => Ok(()),
            _ => Err(AppError::Validation(format!(
                "{} must be one of: {}",
                field,
                allowed.join(", ")
            ))),
        }
    }
}

/// Absent, null, or a string with nothing but whitespace.
pub fn is_blank(v: Option<&Value>) -> bool {
    match v {
        None | Some(Value::Null) => true,
        Some(Value::String(s)) => s.trim().is_empty(),
        Some(_) => false,
    }
}
