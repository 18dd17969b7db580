//! Order snapshots consumed by billing

mod provider;

pub use provider::{OrderSnapshotProvider, SqliteOrderProvider};
