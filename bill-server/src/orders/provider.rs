use async_trait::async_trait;
use shared::models::{OrderSnapshot, OrderStatus};
use sqlx::SqlitePool;

use crate::db::repository::{RepoResult, order};

/// Supplies immutable order views at billing time
#[async_trait]
pub trait OrderSnapshotProvider: Send + Sync {
    /// `None` when the order does not exist
    async fn snapshot(&self, order_id: i64) -> RepoResult<Option<OrderSnapshot>>;

    /// Every order whose workflow reached `completed`
    async fn completed_orders(&self) -> RepoResult<Vec<OrderSnapshot>>;
}

/// Reads the `orders` / `order_items` tables of the shared store
#[derive(Clone)]
pub struct SqliteOrderProvider {
    pool: SqlitePool,
}

impl SqliteOrderProvider {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl OrderSnapshotProvider for SqliteOrderProvider {
    async fn snapshot(&self, order_id: i64) -> RepoResult<Option<OrderSnapshot>> {
        order::find_snapshot(&self.pool, order_id).await
    }

    async fn completed_orders(&self) -> RepoResult<Vec<OrderSnapshot>> {
        order::find_by_status(&self.pool, OrderStatus::Completed).await
    }
}
