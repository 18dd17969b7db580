//! Billing error taxonomy
//!
//! Every variant is recoverable by the caller. Conversion into [`AppError`]
//! is the only place billing failures meet the wire format.

use rust_decimal::Decimal;
use shared::error::{AppError, ErrorCode};
use shared::models::BillStatus;
use thiserror::Error;

use crate::db::repository::RepoError;

#[derive(Debug, Error)]
pub enum BillingError {
    #[error("Order {order_id} cannot be billed: {reason}")]
    InvalidOrder { order_id: i64, reason: String },

    #[error("Bill total would be negative ({total})")]
    NegativeTotal { total: Decimal },

    #[error("Order {order_id} already has an active bill ({bill_number})")]
    DuplicateBill { order_id: i64, bill_number: String },

    #[error("Payment amount must be greater than zero, got {0}")]
    InvalidPaymentAmount(Decimal),

    #[error("Bill {bill_id} is {status} and does not accept payments")]
    BillNotPayable { bill_id: i64, status: BillStatus },

    #[error("Cannot {action} bill {bill_id} in status {from}")]
    InvalidStateTransition {
        bill_id: i64,
        from: BillStatus,
        action: &'static str,
    },

    #[error("Bill {bill_id} is {status}; only draft bills can be deleted")]
    BillNotDeletable { bill_id: i64, status: BillStatus },

    #[error("Bill {0} not found")]
    BillNotFound(i64),

    #[error("Order {0} not found")]
    OrderNotFound(i64),

    #[error("{0}")]
    Validation(AppError),

    #[error("Bill {0} was modified concurrently, please retry")]
    ConcurrentModification(i64),

    #[error(transparent)]
    Repo(#[from] RepoError),
}

pub type BillingResult<T> = Result<T, BillingError>;

impl From<AppError> for BillingError {
    fn from(err: AppError) -> Self {
        BillingError::Validation(err)
    }
}

impl BillingError {
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::InvalidOrder { .. } => ErrorCode::InvalidOrder,
            Self::NegativeTotal { .. } => ErrorCode::NegativeTotal,
            Self::DuplicateBill { .. } => ErrorCode::DuplicateBill,
            Self::InvalidPaymentAmount(_) => ErrorCode::InvalidPaymentAmount,
            Self::BillNotPayable { .. } => ErrorCode::BillNotPayable,
            Self::InvalidStateTransition { .. } => ErrorCode::InvalidStateTransition,
            Self::BillNotDeletable { .. } => ErrorCode::BillNotDeletable,
            Self::BillNotFound(_) => ErrorCode::BillNotFound,
            Self::OrderNotFound(_) => ErrorCode::OrderNotFound,
            Self::Validation(e) => e.code,
            Self::ConcurrentModification(_) => ErrorCode::ConcurrentModification,
            Self::Repo(RepoError::NotFound(_)) => ErrorCode::NotFound,
            Self::Repo(RepoError::Duplicate(_)) => ErrorCode::DuplicateBill,
            Self::Repo(RepoError::Conflict(_)) => ErrorCode::ConcurrentModification,
            Self::Repo(RepoError::Validation(_)) => ErrorCode::ValidationFailed,
            Self::Repo(RepoError::Database(_)) => ErrorCode::DatabaseError,
        }
    }
}

impl From<BillingError> for AppError {
    fn from(err: BillingError) -> Self {
        match err {
            BillingError::Validation(app_err) => app_err,
            BillingError::Repo(RepoError::Database(msg)) => {
                // Storage details stay in the log
                tracing::error!(error = %msg, "Billing database error");
                AppError::new(ErrorCode::DatabaseError)
            }
            BillingError::BillNotFound(id) => {
                AppError::with_message(ErrorCode::BillNotFound, err.to_string())
                    .with_detail("bill_id", id)
            }
            BillingError::OrderNotFound(id) => {
                AppError::with_message(ErrorCode::OrderNotFound, err.to_string())
                    .with_detail("order_id", id)
            }
            BillingError::InvalidStateTransition { bill_id, from, action } => {
                AppError::with_message(ErrorCode::InvalidStateTransition, err.to_string())
                    .with_detail("bill_id", bill_id)
                    .with_detail("status", from.as_str())
                    .with_detail("action", action)
            }
            other => AppError::with_message(other.code(), other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::dec;

    #[test]
    fn test_error_kinds() {
        let cases = [
            (
                BillingError::InvalidOrder {
                    order_id: 1,
                    reason: "no items".into(),
                },
                "invalid_order",
            ),
            (BillingError::NegativeTotal { total: dec!(-1) }, "negative_total"),
            (
                BillingError::DuplicateBill {
                    order_id: 1,
                    bill_number: "BILL-20260301-0001".into(),
                },
                "duplicate_bill",
            ),
            (BillingError::InvalidPaymentAmount(dec!(0)), "invalid_payment_amount"),
            (
                BillingError::BillNotPayable {
                    bill_id: 1,
                    status: BillStatus::Cancelled,
                },
                "bill_not_payable",
            ),
            (
                BillingError::BillNotDeletable {
                    bill_id: 1,
                    status: BillStatus::Paid,
                },
                "bill_not_deletable",
            ),
            (BillingError::BillNotFound(1), "not_found"),
            (BillingError::OrderNotFound(1), "not_found"),
            (BillingError::ConcurrentModification(1), "concurrent_modification"),
        ];
        for (err, kind) in cases {
            let app: AppError = err.into();
            assert_eq!(app.code.kind(), kind);
        }
    }

    #[test]
    fn test_database_details_are_hidden() {
        let app: AppError = BillingError::Repo(RepoError::Database("disk I/O error".into())).into();
        assert_eq!(app.code, ErrorCode::DatabaseError);
        assert!(!app.message.contains("disk"));
    }

    #[test]
    fn test_transition_details() {
        let app: AppError = BillingError::InvalidStateTransition {
            bill_id: 3,
            from: BillStatus::Paid,
            action: "cancel",
        }
        .into();
        assert_eq!(app.message, "Cannot cancel bill 3 in status paid");
        let details = app.details.unwrap();
        assert_eq!(details["status"], "paid");
        assert_eq!(details["action"], "cancel");
    }
}
