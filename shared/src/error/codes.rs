//! Unified error codes for the billing service
//!
//! Error codes are organized by category:
//! - 0xxx: General errors
//! - 4xxx: Order errors
//! - 5xxx: Bill / payment errors
//! - 9xxx: System errors

use serde::{Deserialize, Serialize};
use std::fmt;

/// Unified error code enum
///
/// All error codes are represented as u16 values for efficient serialization
/// and cross-language compatibility (Rust, TypeScript, etc.)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u16", try_from = "u16")]
#[repr(u16)]
pub enum ErrorCode {
    // ==================== 0xxx: General ====================
    /// Operation completed successfully
    Success = 0,
    /// Unknown error
    Unknown = 1,
    /// Validation failed
    ValidationFailed = 2,
    /// Resource not found
    NotFound = 3,
    /// Resource already exists
    AlreadyExists = 4,
    /// Invalid request
    InvalidRequest = 5,
    /// Invalid format
    InvalidFormat = 6,
    /// Value out of range
    ValueOutOfRange = 8,

    // ==================== 4xxx: Order ====================
    /// Order not found
    OrderNotFound = 4001,
    /// Order snapshot cannot be billed (no items, bad quantity or price)
    InvalidOrder = 4002,

    // ==================== 5xxx: Bill / Payment ====================
    /// Bill not found
    BillNotFound = 5001,
    /// Computed total would be negative
    NegativeTotal = 5002,
    /// Order already has an active bill
    DuplicateBill = 5003,
    /// Payment amount must be positive
    InvalidPaymentAmount = 5004,
    /// Bill does not accept payments in its current status
    BillNotPayable = 5005,
    /// Requested status transition is not allowed
    InvalidStateTransition = 5006,
    /// Bill can only be deleted while in draft
    BillNotDeletable = 5007,
    /// Invalid payment method
    PaymentInvalidMethod = 5008,
    /// Bill was modified concurrently, retry
    ConcurrentModification = 5009,

    // ==================== 9xxx: System ====================
    /// Internal server error
    InternalError = 9001,
    /// Database error
    DatabaseError = 9002,
    /// Operation timeout
    TimeoutError = 9004,
    /// Configuration error
    ConfigError = 9005,
}

impl ErrorCode {
    /// Get the numeric code value
    #[inline]
    pub const fn code(&self) -> u16 {
        *self as u16
    }

    /// Check if this is a success code
    #[inline]
    pub const fn is_success(&self) -> bool {
        matches!(self, ErrorCode::Success)
    }

    /// Machine-readable error kind reported to clients as `error_kind`
    pub const fn kind(&self) -> &'static str {
        match self {
            ErrorCode::Success => "success",
            ErrorCode::Unknown => "unknown",
            ErrorCode::ValidationFailed => "validation_failed",
            ErrorCode::NotFound | ErrorCode::OrderNotFound | ErrorCode::BillNotFound => {
                "not_found"
            }
            ErrorCode::AlreadyExists => "already_exists",
            ErrorCode::InvalidRequest => "invalid_request",
            ErrorCode::InvalidFormat => "invalid_format",
            ErrorCode::ValueOutOfRange => "value_out_of_range",
            ErrorCode::InvalidOrder => "invalid_order",
            ErrorCode::NegativeTotal => "negative_total",
            ErrorCode::DuplicateBill => "duplicate_bill",
            ErrorCode::InvalidPaymentAmount => "invalid_payment_amount",
            ErrorCode::BillNotPayable => "bill_not_payable",
            ErrorCode::InvalidStateTransition => "invalid_state_transition",
            ErrorCode::BillNotDeletable => "bill_not_deletable",
            ErrorCode::PaymentInvalidMethod => "invalid_payment_method",
            ErrorCode::ConcurrentModification => "concurrent_modification",
            ErrorCode::InternalError => "internal_error",
            ErrorCode::DatabaseError => "database_error",
            ErrorCode::TimeoutError => "timeout",
            ErrorCode::ConfigError => "config_error",
        }
    }

    /// Get the developer-facing English message for this error code
    pub const fn message(&self) -> &'static str {
        match self {
            // General
            ErrorCode::Success => "Operation completed successfully",
            ErrorCode::Unknown => "An unknown error occurred",
            ErrorCode::ValidationFailed => "Validation failed",
            ErrorCode::NotFound => "Resource not found",
            ErrorCode::AlreadyExists => "Resource already exists",
            ErrorCode::InvalidRequest => "Invalid request",
            ErrorCode::InvalidFormat => "Invalid format",
            ErrorCode::ValueOutOfRange => "Value is out of range",

            // Order
            ErrorCode::OrderNotFound => "Order not found",
            ErrorCode::InvalidOrder => "Order cannot be billed",

            // Bill / Payment
            ErrorCode::BillNotFound => "Bill not found",
            ErrorCode::NegativeTotal => "Bill total cannot be negative",
            ErrorCode::DuplicateBill => "Order already has an active bill",
            ErrorCode::InvalidPaymentAmount => "Payment amount must be greater than zero",
            ErrorCode::BillNotPayable => "Bill does not accept payments",
            ErrorCode::InvalidStateTransition => "Bill status transition not allowed",
            ErrorCode::BillNotDeletable => "Only draft bills can be deleted",
            ErrorCode::PaymentInvalidMethod => "Invalid payment method",
            ErrorCode::ConcurrentModification => "Bill was modified concurrently, please retry",

            // System
            ErrorCode::InternalError => "Internal server error",
            ErrorCode::DatabaseError => "Database error",
            ErrorCode::TimeoutError => "Operation timed out",
            ErrorCode::ConfigError => "Configuration error",
        }
    }
}

impl From<ErrorCode> for u16 {
    #[inline]
    fn from(code: ErrorCode) -> Self {
        code.code()
    }
}

/// Error when converting from an invalid u16 to ErrorCode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidErrorCode(pub u16);

impl fmt::Display for InvalidErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid error code: {}", self.0)
    }
}

impl std::error::Error for InvalidErrorCode {}

impl TryFrom<u16> for ErrorCode {
    type Error = InvalidErrorCode;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        match value {
            // General
            0 => Ok(ErrorCode::Success),
            1 => Ok(ErrorCode::Unknown),
            2 => Ok(ErrorCode::ValidationFailed),
            3 => Ok(ErrorCode::NotFound),
            4 => Ok(ErrorCode::AlreadyExists),
            5 => Ok(ErrorCode::InvalidRequest),
            6 => Ok(ErrorCode::InvalidFormat),
            8 => Ok(ErrorCode::ValueOutOfRange),

            // Order
            4001 => Ok(ErrorCode::OrderNotFound),
            4002 => Ok(ErrorCode::InvalidOrder),

            // Bill / Payment
            5001 => Ok(ErrorCode::BillNotFound),
            5002 => Ok(ErrorCode::NegativeTotal),
            5003 => Ok(ErrorCode::DuplicateBill),
            5004 => Ok(ErrorCode::InvalidPaymentAmount),
            5005 => Ok(ErrorCode::BillNotPayable),
            5006 => Ok(ErrorCode::InvalidStateTransition),
            5007 => Ok(ErrorCode::BillNotDeletable),
            5008 => Ok(ErrorCode::PaymentInvalidMethod),
            5009 => Ok(ErrorCode::ConcurrentModification),

            // System
            9001 => Ok(ErrorCode::InternalError),
            9002 => Ok(ErrorCode::DatabaseError),
            9004 => Ok(ErrorCode::TimeoutError),
            9005 => Ok(ErrorCode::ConfigError),

            _ => Err(InvalidErrorCode(value)),
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: &[ErrorCode] = &[
        ErrorCode::Success,
        ErrorCode::Unknown,
        ErrorCode::ValidationFailed,
        ErrorCode::NotFound,
        ErrorCode::AlreadyExists,
        ErrorCode::InvalidRequest,
        ErrorCode::InvalidFormat,
        ErrorCode::ValueOutOfRange,
        ErrorCode::OrderNotFound,
        ErrorCode::InvalidOrder,
        ErrorCode::BillNotFound,
        ErrorCode::NegativeTotal,
        ErrorCode::DuplicateBill,
        ErrorCode::InvalidPaymentAmount,
        ErrorCode::BillNotPayable,
        ErrorCode::InvalidStateTransition,
        ErrorCode::BillNotDeletable,
        ErrorCode::PaymentInvalidMethod,
        ErrorCode::ConcurrentModification,
        ErrorCode::InternalError,
        ErrorCode::DatabaseError,
        ErrorCode::TimeoutError,
        ErrorCode::ConfigError,
    ];

    #[test]
    fn test_every_code_converts_back_from_u16() {
        for code in ALL {
            assert_eq!(ErrorCode::try_from(code.code()), Ok(*code));
        }
    }

    #[test]
    fn test_invalid_code() {
        assert_eq!(ErrorCode::try_from(7777), Err(InvalidErrorCode(7777)));
    }

    #[test]
    fn test_serde_as_number() {
        let json = serde_json::to_string(&ErrorCode::DuplicateBill).unwrap();
        assert_eq!(json, "5003");
        let code: ErrorCode = serde_json::from_str("5006").unwrap();
        assert_eq!(code, ErrorCode::InvalidStateTransition);
    }

    #[test]
    fn test_kind_names() {
        assert_eq!(ErrorCode::InvalidOrder.kind(), "invalid_order");
        assert_eq!(ErrorCode::BillNotFound.kind(), "not_found");
        assert_eq!(ErrorCode::BillNotDeletable.kind(), "bill_not_deletable");
    }
}
