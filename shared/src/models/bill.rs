//! Bill Model

use crate::money::{self, fixed2};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Bill lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
#[cfg_attr(feature = "db", sqlx(rename_all = "snake_case"))]
pub enum BillStatus {
    Draft,
    #[default]
    Generated,
    Paid,
    Cancelled,
    Refunded,
}

impl BillStatus {
    pub const ALL: [BillStatus; 5] = [
        BillStatus::Draft,
        BillStatus::Generated,
        BillStatus::Paid,
        BillStatus::Cancelled,
        BillStatus::Refunded,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Generated => "generated",
            Self::Paid => "paid",
            Self::Cancelled => "cancelled",
            Self::Refunded => "refunded",
        }
    }

    /// Cancelled and refunded bills accept no further changes
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Cancelled | Self::Refunded)
    }
}

/// Payment progress derived from paid vs total
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
#[cfg_attr(feature = "db", sqlx(rename_all = "snake_case"))]
pub enum PaymentStatus {
    #[default]
    Pending,
    PartiallyPaid,
    Paid,
    Refunded,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::PartiallyPaid => "partially_paid",
            Self::Paid => "paid",
            Self::Refunded => "refunded",
        }
    }
}

/// Payment method
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
#[cfg_attr(feature = "db", sqlx(rename_all = "snake_case"))]
pub enum PaymentMethod {
    Cash,
    Card,
    Digital,
    BankTransfer,
}

impl PaymentMethod {
    pub const ALL: [PaymentMethod; 4] = [
        PaymentMethod::Cash,
        PaymentMethod::Card,
        PaymentMethod::Digital,
        PaymentMethod::BankTransfer,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Cash => "cash",
            Self::Card => "card",
            Self::Digital => "digital",
            Self::BankTransfer => "bank_transfer",
        }
    }
}

/// How the order was served
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
#[cfg_attr(feature = "db", sqlx(rename_all = "snake_case"))]
pub enum OrderType {
    #[default]
    DineIn,
    Takeaway,
    Delivery,
}

impl OrderType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::DineIn => "dine_in",
            Self::Takeaway => "takeaway",
            Self::Delivery => "delivery",
        }
    }
}

/// Error returned when a status string does not name a known variant
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownVariant {
    pub kind: &'static str,
    pub value: String,
}

impl fmt::Display for UnknownVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown {}: {}", self.kind, self.value)
    }
}

impl std::error::Error for UnknownVariant {}

macro_rules! str_enum {
    ($ty:ident, $kind:literal, [$($variant:ident),+ $(,)?]) => {
        impl FromStr for $ty {
            type Err = UnknownVariant;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let s = s.trim();
                $(
                    if $ty::$variant.as_str().eq_ignore_ascii_case(s) {
                        return Ok($ty::$variant);
                    }
                )+
                Err(UnknownVariant {
                    kind: $kind,
                    value: s.to_string(),
                })
            }
        }

        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

str_enum!(BillStatus, "bill status", [Draft, Generated, Paid, Cancelled, Refunded]);
str_enum!(PaymentStatus, "payment status", [Pending, PartiallyPaid, Paid, Refunded]);
str_enum!(PaymentMethod, "payment method", [Cash, Card, Digital, BankTransfer]);
str_enum!(OrderType, "order type", [DineIn, Takeaway, Delivery]);

/// Bill line captured from the order at generation time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BillItem {
    pub name: String,
    pub quantity: i32,
    #[serde(with = "fixed2")]
    pub unit_price: Decimal,
    /// quantity × unit_price
    #[serde(with = "fixed2")]
    pub line_total: Decimal,
}

/// Bill entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bill {
    pub id: i64,
    /// Human readable number, `BILL-YYYYMMDD-NNNN`
    pub bill_number: String,
    pub order_id: i64,
    pub customer_name: Option<String>,
    pub table_number: Option<String>,
    #[serde(default)]
    pub order_type: OrderType,
    pub items: Vec<BillItem>,

    #[serde(with = "fixed2")]
    pub subtotal_amount: Decimal,
    /// Percent at full precision, e.g. `8.00` or `8.875`
    #[serde(with = "money::rate")]
    pub tax_rate: Decimal,
    #[serde(with = "fixed2")]
    pub tax_amount: Decimal,
    #[serde(with = "fixed2")]
    pub service_charge: Decimal,
    #[serde(with = "fixed2")]
    pub discount_amount: Decimal,
    #[serde(with = "fixed2")]
    pub total_amount: Decimal,
    /// Cumulative amount received
    #[serde(with = "fixed2")]
    pub paid_amount: Decimal,
    /// Change reported by the latest payment
    #[serde(with = "fixed2")]
    pub change_amount: Decimal,

    pub status: BillStatus,
    pub payment_status: PaymentStatus,
    pub payment_method: Option<PaymentMethod>,
    pub payment_reference: Option<String>,
    pub notes: Option<String>,

    /// Unix millis
    pub printed_at: Option<i64>,
    pub created_at: i64,
    pub updated_at: i64,
    /// Optimistic concurrency counter, 0 means never persisted
    #[serde(default)]
    pub version: i64,
}

impl Bill {
    /// Amount still owed, never negative
    pub fn balance_due(&self) -> Decimal {
        (self.total_amount - self.paid_amount).max(Decimal::ZERO)
    }
}

/// Options accepted when generating a bill
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GenerateBillOptions {
    /// Percent; falls back to the configured default
    #[serde(default, with = "money::rate::option")]
    pub tax_rate: Option<Decimal>,
    #[serde(default, with = "fixed2::option")]
    pub discount_amount: Option<Decimal>,
    #[serde(default, with = "fixed2::option")]
    pub service_charge: Option<Decimal>,
    pub payment_method: Option<PaymentMethod>,
    pub notes: Option<String>,
    /// Create the bill as a draft instead of generated
    #[serde(default)]
    pub draft: bool,
}

/// Create bill payload (`POST /api/bills`)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BillCreate {
    pub order_id: i64,
    #[serde(flatten)]
    pub options: GenerateBillOptions,
}

/// A single payment event, tagged by its method
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentInstruction {
    pub payment_method: PaymentMethod,
    #[serde(with = "fixed2")]
    pub paid_amount: Decimal,
    pub payment_reference: Option<String>,
}

/// Result of recording a payment
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentReceipt {
    pub bill: Bill,
    /// max(0, paid_after − total) for this call
    #[serde(with = "fixed2")]
    pub change_amount: Decimal,
}

/// Bill list filters (`GET /api/bills`)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BillFilters {
    pub status: Option<BillStatus>,
    pub payment_status: Option<PaymentStatus>,
    /// Business date `YYYY-MM-DD`, inclusive
    pub date_from: Option<String>,
    /// Business date `YYYY-MM-DD`, inclusive
    pub date_to: Option<String>,
    /// Matches bill number, customer name or table number
    pub search: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// Paged bill listing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BillPage {
    pub bills: Vec<Bill>,
    pub total: i64,
    pub limit: i64,
    pub offset: i64,
}
