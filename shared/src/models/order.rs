//! Order Snapshot Model
//!
//! Read-only view of an order as the billing side sees it. Orders are owned
//! by the ordering workflow; billing never writes them.

use super::bill::OrderType;
use crate::money::fixed2;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Order workflow status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
#[cfg_attr(feature = "db", sqlx(rename_all = "snake_case"))]
pub enum OrderStatus {
    #[default]
    Pending,
    Preparing,
    Ready,
    Served,
    Completed,
    Cancelled,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Preparing => "preparing",
            Self::Ready => "ready",
            Self::Served => "served",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        }
    }
}

/// Order line at snapshot time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderItemSnapshot {
    pub name: String,
    pub quantity: i32,
    #[serde(with = "fixed2")]
    pub unit_price: Decimal,
}

/// Immutable, point-in-time copy of an order used to generate a bill
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderSnapshot {
    pub order_id: i64,
    pub order_number: String,
    pub status: OrderStatus,
    #[serde(default)]
    pub order_type: OrderType,
    pub table_number: Option<String>,
    pub customer_name: Option<String>,
    pub items: Vec<OrderItemSnapshot>,
    /// Unix millis
    pub completed_at: Option<i64>,
}

impl OrderSnapshot {
    /// Σ quantity × unit_price, unrounded
    pub fn items_total(&self) -> Decimal {
        self.items
            .iter()
            .map(|i| Decimal::from(i.quantity) * i.unit_price)
            .sum()
    }
}
