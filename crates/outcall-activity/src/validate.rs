//! Field checks shared by activity records and activity reports.

use outcall_core::parse_timestamp;

use crate::error::ActivityError;

/// Fails with `"<name> must not be empty"` when `value` is empty.
pub fn check_required(name: &str, value: &str) -> Result<(), ActivityError> {
    if value.is_empty() {
        return Err(ActivityError::Validation(format!("{name} must not be empty")));
    }
    Ok(())
}

/// Identifiers use zero as "unset".
pub fn check_required_id(name: &str, value: i64) -> Result<(), ActivityError> {
    if value == 0 {
        return Err(ActivityError::Validation(format!("{name} must not be empty")));
    }
    Ok(())
}

/// Empty passes; anything else must parse under `layout`.
pub fn check_datetime(name: &str, value: &str, layout: &str) -> Result<(), ActivityError> {
    if value.is_empty() || parse_timestamp(value, layout).is_some() {
        return Ok(());
    }
    Err(ActivityError::Validation(format!("{name} not valid")))
}
