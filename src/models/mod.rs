pub mod concept;
pub mod cycle;
pub mod drug_context;
pub mod filters;
pub mod regimen;
pub mod tree;

pub use concept::*;
pub use cycle::*;
pub use drug_context::*;
pub use filters::*;
pub use regimen::*;
pub use tree::*;

use crate::config::MAX_LABEL_LEN;
use crate::db::DatabaseError;

/// Reject values longer than a `String(250)` column allows.
pub(crate) fn check_label(field: &str, value: &str) -> Result<(), DatabaseError> {
    let len = value.chars().count();
    if len > MAX_LABEL_LEN {
        return Err(DatabaseError::ConstraintViolation(format!(
            "{field} is {len} characters, limit is {MAX_LABEL_LEN}"
        )));
    }
    Ok(())
}

pub(crate) fn check_optional_label(field: &str, value: Option<&str>) -> Result<(), DatabaseError> {
    match value {
        Some(v) => check_label(field, v),
        None => Ok(()),
    }
}
