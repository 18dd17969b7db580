//! Shared types for the billing service
//!
//! Wire models, money serialization helpers, the unified error system and
//! small utilities used by the server crate and its clients.

pub mod error;
pub mod models;
pub mod money;
pub mod util;

// Re-exports
pub use axum::Json;
pub use http;
pub use rust_decimal::Decimal;
pub use serde::{Deserialize, Serialize};
