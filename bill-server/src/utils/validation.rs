//! Input validation helpers
//!
//! Centralized text length constants and validation functions.
//! SQLite TEXT has no built-in length enforcement.

use crate::utils::AppError;
use rust_decimal::Decimal;

// ── Text length limits ──────────────────────────────────────────────

/// Bill notes
pub const MAX_NOTE_LEN: usize = 500;

/// Payment references: card slip number, transfer id, etc.
pub const MAX_REFERENCE_LEN: usize = 100;

/// Free-text list search
pub const MAX_SEARCH_LEN: usize = 100;

// ── Validation helpers ──────────────────────────────────────────────

/// Validate that an optional string, if present, is within the length limit.
pub fn validate_optional_text(
    value: &Option<String>,
    field: &str,
    max_len: usize,
) -> Result<(), AppError> {
    if let Some(v) = value
        && v.chars().count() > max_len
    {
        return Err(AppError::validation(format!(
            "{field} is too long ({} chars, max {max_len})",
            v.chars().count()
        ))
        .with_detail("field", field));
    }
    Ok(())
}

/// Validate that an optional amount, if present, is not negative.
pub fn validate_non_negative(value: Option<Decimal>, field: &str) -> Result<(), AppError> {
    if let Some(v) = value
        && v.is_sign_negative()
        && !v.is_zero()
    {
        return Err(
            AppError::validation(format!("{field} must be non-negative, got {v}"))
                .with_detail("field", field),
        );
    }
    Ok(())
}

/// Trim an optional string and drop it when empty
pub fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
