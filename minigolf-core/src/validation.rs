//! Input checks shared by the booking and contact flows.

use crate::{CoreError, CoreResult};

/// Trimmed value of a required text field.
pub fn required(field: &str, value: Option<&str>) -> CoreResult<String> {
    match value.map(str::trim) {
        Some(v) if !v.is_empty() => Ok(v.to_string()),
        _ => Err(CoreError::ValidationError(format!("{} is required", field))),
    }
}

pub fn optional(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Required email: non-empty, exactly one `@`, something on both sides.
pub fn email(field: &str, value: Option<&str>) -> CoreResult<String> {
    let email = required(field, value)?;
    let valid = match email.split_once('@') {
        Some((local, domain)) => !local.is_empty() && !domain.is_empty() && !domain.contains('@'),
        None => false,
    };
    if !valid {
        return Err(CoreError::ValidationError(format!("{} is not a valid email address", field)));
    }
    Ok(email)
}
