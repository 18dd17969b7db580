//! Data models
//!
//! Shared between bill-server and its API clients.
//! Enums use `#[cfg_attr(feature = "db", derive(sqlx::Type))]`.
//! All IDs are `i64`, all timestamps Unix millis.

pub mod bill;
pub mod order;
pub mod statistics;

// Re-exports
pub use bill::*;
pub use order::*;
pub use statistics::*;
