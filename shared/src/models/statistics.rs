//! Billing statistics

use crate::money::fixed2;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Bill counts per lifecycle status
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BillsByStatus {
    pub draft: i64,
    pub generated: i64,
    pub paid: i64,
    pub cancelled: i64,
    pub refunded: i64,
}

/// Paid revenue per payment method
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RevenueByMethod {
    #[serde(with = "fixed2")]
    pub cash: Decimal,
    #[serde(with = "fixed2")]
    pub card: Decimal,
    #[serde(with = "fixed2")]
    pub digital: Decimal,
    #[serde(with = "fixed2")]
    pub bank_transfer: Decimal,
}

/// Aggregated view over bills in a date range
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BillStatistics {
    /// Σ total of paid bills
    #[serde(with = "fixed2")]
    pub total_revenue: Decimal,
    pub total_bills: i64,
    pub bills_by_status: BillsByStatus,
    pub today_bills: i64,
    #[serde(with = "fixed2")]
    pub today_revenue: Decimal,
    /// Mean total of paid bills, 0 when there are none
    #[serde(with = "fixed2")]
    pub average_bill_amount: Decimal,
    /// Σ (total − paid) over generated bills
    #[serde(with = "fixed2")]
    pub outstanding_amount: Decimal,
    pub revenue_by_method: RevenueByMethod,
}

/// Statistics query range (`GET /api/bills/statistics`)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StatisticsRange {
    /// Business date `YYYY-MM-DD`, inclusive
    pub date_from: Option<String>,
    /// Business date `YYYY-MM-DD`, inclusive
    pub date_to: Option<String>,
}
