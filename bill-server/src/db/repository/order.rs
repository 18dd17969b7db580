//! Order Repository (read side)
//!
//! Orders belong to the ordering workflow. Billing reads them as snapshots;
//! `insert` exists for seeding and tests.

use super::{RepoError, RepoResult};
use shared::models::{OrderItemSnapshot, OrderSnapshot, OrderStatus, OrderType};
use shared::money::parse_money;
use sqlx::SqlitePool;
use std::collections::HashMap;

#[derive(sqlx::FromRow)]
struct OrderRow {
    id: i64,
    order_number: String,
    status: OrderStatus,
    order_type: OrderType,
    table_number: Option<String>,
    customer_name: Option<String>,
    completed_at: Option<i64>,
}

#[derive(sqlx::FromRow)]
struct OrderItemRow {
    order_id: i64,
    name: String,
    quantity: i32,
    unit_price: String,
}

impl TryFrom<OrderItemRow> for OrderItemSnapshot {
    type Error = RepoError;

    fn try_from(row: OrderItemRow) -> Result<Self, Self::Error> {
        Ok(OrderItemSnapshot {
            name: row.name,
            quantity: row.quantity,
            unit_price: parse_money(&row.unit_price)?,
        })
    }
}

fn into_snapshot(row: OrderRow, items: Vec<OrderItemSnapshot>) -> OrderSnapshot {
    OrderSnapshot {
        order_id: row.id,
        order_number: row.order_number,
        status: row.status,
        order_type: row.order_type,
        table_number: row.table_number,
        customer_name: row.customer_name,
        items,
        completed_at: row.completed_at,
    }
}

pub async fn find_snapshot(pool: &SqlitePool, order_id: i64) -> RepoResult<Option<OrderSnapshot>> {
    let Some(row) = sqlx::query_as::<_, OrderRow>(
        "SELECT id, order_number, status, order_type, table_number, customer_name, completed_at FROM orders WHERE id = ?",
    )
    .bind(order_id)
    .fetch_optional(pool)
    .await?
    else {
        return Ok(None);
    };

    let items = sqlx::query_as::<_, OrderItemRow>(
        "SELECT order_id, name, quantity, unit_price FROM order_items WHERE order_id = ? ORDER BY position, id",
    )
    .bind(order_id)
    .fetch_all(pool)
    .await?
    .into_iter()
    .map(OrderItemSnapshot::try_from)
    .collect::<RepoResult<Vec<_>>>()?;

    Ok(Some(into_snapshot(row, items)))
}

/// Orders in `status`, most recently completed first
pub async fn find_by_status(pool: &SqlitePool, status: OrderStatus) -> RepoResult<Vec<OrderSnapshot>> {
    let rows = sqlx::query_as::<_, OrderRow>(
        "SELECT id, order_number, status, order_type, table_number, customer_name, completed_at FROM orders WHERE status = ? ORDER BY completed_at DESC, id DESC",
    )
    .bind(status)
    .fetch_all(pool)
    .await?;

    // Items for every matching order in one round trip
    let item_rows = sqlx::query_as::<_, OrderItemRow>(
        "SELECT oi.order_id, oi.name, oi.quantity, oi.unit_price FROM order_items oi JOIN orders o ON o.id = oi.order_id WHERE o.status = ? ORDER BY oi.order_id, oi.position, oi.id",
    )
    .bind(status)
    .fetch_all(pool)
    .await?;

    let mut items_by_order: HashMap<i64, Vec<OrderItemSnapshot>> = HashMap::new();
    for row in item_rows {
        let order_id = row.order_id;
        items_by_order
            .entry(order_id)
            .or_default()
            .push(OrderItemSnapshot::try_from(row)?);
    }

    Ok(rows
        .into_iter()
        .map(|row| {
            let items = items_by_order.remove(&row.id).unwrap_or_default();
            into_snapshot(row, items)
        })
        .collect())
}

/// Insert an order with its items in one transaction
pub async fn insert(pool: &SqlitePool, order: &OrderSnapshot) -> RepoResult<()> {
    let now = shared::util::now_millis();
    let mut tx = pool.begin().await?;

    sqlx::query(
        "INSERT INTO orders (id, order_number, status, order_type, table_number, customer_name, completed_at, created_at, updated_at) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?8)",
    )
    .bind(order.order_id)
    .bind(&order.order_number)
    .bind(order.status)
    .bind(order.order_type)
    .bind(&order.table_number)
    .bind(&order.customer_name)
    .bind(order.completed_at)
    .bind(now)
    .execute(&mut *tx)
    .await?;

    for (position, item) in order.items.iter().enumerate() {
        sqlx::query(
            "INSERT INTO order_items (order_id, position, name, quantity, unit_price) VALUES (?1, ?2, ?3, ?4, ?5)",
        )
        .bind(order.order_id)
        .bind(position as i64)
        .bind(&item.name)
        .bind(item.quantity)
        .bind(item.unit_price.to_string())
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::dec;
    use sqlx::sqlite::SqlitePoolOptions;

    async fn test_pool() -> SqlitePool {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        crate::db::run_migrations(&pool).await.unwrap();
        pool
    }

    fn order(id: i64, status: OrderStatus, completed_at: Option<i64>) -> OrderSnapshot {
        OrderSnapshot {
            order_id: id,
            order_number: format!("ORD-{id:04}"),
            status,
            order_type: OrderType::Takeaway,
            table_number: None,
            customer_name: Some("Pau".to_string()),
            items: vec![
                OrderItemSnapshot {
                    name: "Bocadillo".to_string(),
                    quantity: 2,
                    unit_price: dec!(12.99),
                },
                OrderItemSnapshot {
                    name: "Horchata".to_string(),
                    quantity: 1,
                    unit_price: dec!(8.99),
                },
            ],
            completed_at,
        }
    }

    #[tokio::test]
    async fn test_insert_and_snapshot() {
        let pool = test_pool().await;
        let o = order(1, OrderStatus::Completed, Some(5000));
        insert(&pool, &o).await.unwrap();

        let snap = find_snapshot(&pool, 1).await.unwrap().unwrap();
        assert_eq!(snap, o);
        assert_eq!(snap.items[0].name, "Bocadillo");
        assert!(find_snapshot(&pool, 2).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_find_by_status() {
        let pool = test_pool().await;
        insert(&pool, &order(1, OrderStatus::Completed, Some(1000))).await.unwrap();
        insert(&pool, &order(2, OrderStatus::Preparing, None)).await.unwrap();
        insert(&pool, &order(3, OrderStatus::Completed, Some(3000))).await.unwrap();

        let completed = find_by_status(&pool, OrderStatus::Completed).await.unwrap();
        assert_eq!(
            completed.iter().map(|o| o.order_id).collect::<Vec<_>>(),
            vec![3, 1]
        );
        assert!(completed.iter().all(|o| o.items.len() == 2));
    }
}
