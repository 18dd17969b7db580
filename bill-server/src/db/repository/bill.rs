//! Bill Repository
//!
//! Money columns are stored as 2-decimal TEXT, the tax rate as exact decimal
//! TEXT and the item snapshot as JSON.
//! Writes after the initial insert only touch the mutable columns and are
//! guarded by the `version` column.

use super::{RepoError, RepoResult, like_pattern};
use async_trait::async_trait;
use rust_decimal::Decimal;
use shared::models::{Bill, BillItem, BillStatus, OrderType, PaymentMethod, PaymentStatus};
use shared::money::{normalize_rate, parse_money, parse_rate, round_money};
use sqlx::{QueryBuilder, Sqlite, SqlitePool};

const COLUMNS: &str = "id, bill_number, order_id, customer_name, table_number, order_type, items, subtotal_amount, tax_rate, tax_amount, service_charge, discount_amount, total_amount, paid_amount, change_amount, status, payment_status, payment_method, payment_reference, notes, printed_at, created_at, updated_at, version";

/// Storage-level bill query, dates already resolved to Unix millis
#[derive(Debug, Clone, Default)]
pub struct BillQuery {
    pub status: Option<BillStatus>,
    pub payment_status: Option<PaymentStatus>,
    /// Inclusive lower bound on `created_at`
    pub created_from: Option<i64>,
    /// Exclusive upper bound on `created_at`
    pub created_to: Option<i64>,
    /// Case-insensitive substring of bill number, customer name or table number
    pub search: Option<String>,
    /// `None` returns every match
    pub limit: Option<i64>,
    pub offset: i64,
}

/// Bill persistence capability the ledger depends on
#[async_trait]
pub trait BillRepository: Send + Sync {
    /// Insert when `bill.version == 0`, otherwise update guarded by `version`.
    ///
    /// Returns the stored bill with its new version. A stale version yields
    /// [`RepoError::Conflict`].
    async fn save(&self, bill: &Bill) -> RepoResult<Bill>;

    async fn find_by_id(&self, id: i64) -> RepoResult<Option<Bill>>;

    /// Matching bills, newest first, plus the total match count
    async fn find_by_filters(&self, query: &BillQuery) -> RepoResult<(Vec<Bill>, i64)>;

    async fn delete(&self, id: i64) -> RepoResult<bool>;

    async fn find_by_order(&self, order_id: i64) -> RepoResult<Vec<Bill>>;

    async fn count_created_between(&self, from: Option<i64>, to: Option<i64>) -> RepoResult<i64>;

    /// Highest bill number starting with `prefix`
    async fn latest_bill_number(&self, prefix: &str) -> RepoResult<Option<String>>;

    /// Distinct order ids having at least one bill in one of `statuses`
    async fn order_ids_with_status(&self, statuses: &[BillStatus]) -> RepoResult<Vec<i64>>;
}

#[derive(sqlx::FromRow)]
struct BillRow {
    id: i64,
    bill_number: String,
    order_id: i64,
    customer_name: Option<String>,
    table_number: Option<String>,
    order_type: OrderType,
    items: String,
    subtotal_amount: String,
    tax_rate: String,
    tax_amount: String,
    service_charge: String,
    discount_amount: String,
    total_amount: String,
    paid_amount: String,
    change_amount: String,
    status: BillStatus,
    payment_status: PaymentStatus,
    payment_method: Option<PaymentMethod>,
    payment_reference: Option<String>,
    notes: Option<String>,
    printed_at: Option<i64>,
    created_at: i64,
    updated_at: i64,
    version: i64,
}

impl TryFrom<BillRow> for Bill {
    type Error = RepoError;

    fn try_from(row: BillRow) -> Result<Self, Self::Error> {
        let items: Vec<BillItem> = serde_json::from_str(&row.items)?;
        Ok(Bill {
            id: row.id,
            bill_number: row.bill_number,
            order_id: row.order_id,
            customer_name: row.customer_name,
            table_number: row.table_number,
            order_type: row.order_type,
            items,
            subtotal_amount: parse_money(&row.subtotal_amount)?,
            tax_rate: parse_rate(&row.tax_rate)?,
            tax_amount: parse_money(&row.tax_amount)?,
            service_charge: parse_money(&row.service_charge)?,
            discount_amount: parse_money(&row.discount_amount)?,
            total_amount: parse_money(&row.total_amount)?,
            paid_amount: parse_money(&row.paid_amount)?,
            change_amount: parse_money(&row.change_amount)?,
            status: row.status,
            payment_status: row.payment_status,
            payment_method: row.payment_method,
            payment_reference: row.payment_reference,
            notes: row.notes,
            printed_at: row.printed_at,
            created_at: row.created_at,
            updated_at: row.updated_at,
            version: row.version,
        })
    }
}

fn money(value: Decimal) -> String {
    round_money(value).to_string()
}

fn push_filters(qb: &mut QueryBuilder<'_, Sqlite>, query: &BillQuery) {
    qb.push(" WHERE 1 = 1");
    if let Some(status) = query.status {
        qb.push(" AND status = ").push_bind(status.as_str());
    }
    if let Some(payment_status) = query.payment_status {
        qb.push(" AND payment_status = ")
            .push_bind(payment_status.as_str());
    }
    if let Some(from) = query.created_from {
        qb.push(" AND created_at >= ").push_bind(from);
    }
    if let Some(to) = query.created_to {
        qb.push(" AND created_at < ").push_bind(to);
    }
    if let Some(search) = query.search.as_deref() {
        let pattern = like_pattern(search);
        qb.push(" AND (lower(bill_number) LIKE ")
            .push_bind(pattern.clone())
            .push(" ESCAPE '\\' OR lower(coalesce(customer_name, '')) LIKE ")
            .push_bind(pattern.clone())
            .push(" ESCAPE '\\' OR lower(coalesce(table_number, '')) LIKE ")
            .push_bind(pattern)
            .push(" ESCAPE '\\')");
    }
}

/// SQLite-backed [`BillRepository`]
#[derive(Clone)]
pub struct SqliteBillRepository {
    pool: SqlitePool,
}

impl SqliteBillRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    async fn insert(&self, bill: &Bill) -> RepoResult<Bill> {
        let items = serde_json::to_string(&bill.items)?;
        sqlx::query(
            "INSERT INTO bill (id, bill_number, order_id, customer_name, table_number, order_type, items, subtotal_amount, tax_rate, tax_amount, service_charge, discount_amount, total_amount, paid_amount, change_amount, status, payment_status, payment_method, payment_reference, notes, printed_at, created_at, updated_at, version) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18, ?19, ?20, ?21, ?22, ?23, 1)",
        )
        .bind(bill.id)
        .bind(&bill.bill_number)
        .bind(bill.order_id)
        .bind(&bill.customer_name)
        .bind(&bill.table_number)
        .bind(bill.order_type)
        .bind(items)
        .bind(money(bill.subtotal_amount))
        .bind(normalize_rate(bill.tax_rate).to_string())
        .bind(money(bill.tax_amount))
        .bind(money(bill.service_charge))
        .bind(money(bill.discount_amount))
        .bind(money(bill.total_amount))
        .bind(money(bill.paid_amount))
        .bind(money(bill.change_amount))
        .bind(bill.status)
        .bind(bill.payment_status)
        .bind(bill.payment_method)
        .bind(&bill.payment_reference)
        .bind(&bill.notes)
        .bind(bill.printed_at)
        .bind(bill.created_at)
        .bind(bill.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(Bill {
            version: 1,
            ..bill.clone()
        })
    }

    async fn update(&self, bill: &Bill) -> RepoResult<Bill> {
        let rows = sqlx::query(
            "UPDATE bill SET paid_amount = ?1, change_amount = ?2, status = ?3, payment_status = ?4, payment_method = ?5, payment_reference = ?6, notes = ?7, printed_at = ?8, updated_at = ?9, version = version + 1 WHERE id = ?10 AND version = ?11",
        )
        .bind(money(bill.paid_amount))
        .bind(money(bill.change_amount))
        .bind(bill.status)
        .bind(bill.payment_status)
        .bind(bill.payment_method)
        .bind(&bill.payment_reference)
        .bind(&bill.notes)
        .bind(bill.printed_at)
        .bind(bill.updated_at)
        .bind(bill.id)
        .bind(bill.version)
        .execute(&self.pool)
        .await?;

        if rows.rows_affected() == 0 {
            let exists: Option<i64> = sqlx::query_scalar("SELECT version FROM bill WHERE id = ?")
                .bind(bill.id)
                .fetch_optional(&self.pool)
                .await?;
            return Err(match exists {
                Some(current) => RepoError::Conflict(format!(
                    "Bill {} is at version {current}, expected {}",
                    bill.id, bill.version
                )),
                None => RepoError::NotFound(format!("Bill {}", bill.id)),
            });
        }

        Ok(Bill {
            version: bill.version + 1,
            ..bill.clone()
        })
    }
}

#[async_trait]
impl BillRepository for SqliteBillRepository {
    async fn save(&self, bill: &Bill) -> RepoResult<Bill> {
        if bill.version == 0 {
            self.insert(bill).await
        } else {
            self.update(bill).await
        }
    }

    async fn find_by_id(&self, id: i64) -> RepoResult<Option<Bill>> {
        let row = sqlx::query_as::<_, BillRow>(&format!("SELECT {COLUMNS} FROM bill WHERE id = ?"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.map(Bill::try_from).transpose()
    }

    async fn find_by_filters(&self, query: &BillQuery) -> RepoResult<(Vec<Bill>, i64)> {
        let mut count_qb = QueryBuilder::<Sqlite>::new("SELECT COUNT(*) FROM bill");
        push_filters(&mut count_qb, query);
        let total = count_qb
            .build_query_scalar::<i64>()
            .fetch_one(&self.pool)
            .await?;

        let mut qb = QueryBuilder::<Sqlite>::new(format!("SELECT {COLUMNS} FROM bill"));
        push_filters(&mut qb, query);
        qb.push(" ORDER BY created_at DESC, id DESC");
        match query.limit {
            Some(limit) => {
                qb.push(" LIMIT ").push_bind(limit);
                qb.push(" OFFSET ").push_bind(query.offset);
            }
            None if query.offset > 0 => {
                qb.push(" LIMIT -1 OFFSET ").push_bind(query.offset);
            }
            None => {}
        }

        let rows = qb.build_query_as::<BillRow>().fetch_all(&self.pool).await?;
        let bills = rows
            .into_iter()
            .map(Bill::try_from)
            .collect::<RepoResult<Vec<_>>>()?;
        Ok((bills, total))
    }

    async fn delete(&self, id: i64) -> RepoResult<bool> {
        let rows = sqlx::query("DELETE FROM bill WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(rows.rows_affected() > 0)
    }

    async fn find_by_order(&self, order_id: i64) -> RepoResult<Vec<Bill>> {
        let rows = sqlx::query_as::<_, BillRow>(&format!(
            "SELECT {COLUMNS} FROM bill WHERE order_id = ? ORDER BY created_at DESC"
        ))
        .bind(order_id)
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(Bill::try_from).collect()
    }

    async fn count_created_between(&self, from: Option<i64>, to: Option<i64>) -> RepoResult<i64> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM bill WHERE (?1 IS NULL OR created_at >= ?1) AND (?2 IS NULL OR created_at < ?2)",
        )
        .bind(from)
        .bind(to)
        .fetch_one(&self.pool)
        .await?;
        Ok(count)
    }

    async fn latest_bill_number(&self, prefix: &str) -> RepoResult<Option<String>> {
        let number = sqlx::query_scalar::<_, String>(
            "SELECT bill_number FROM bill WHERE substr(bill_number, 1, length(?1)) = ?1 ORDER BY length(bill_number) DESC, bill_number DESC LIMIT 1",
        )
        .bind(prefix)
        .fetch_optional(&self.pool)
        .await?;
        Ok(number)
    }

    async fn order_ids_with_status(&self, statuses: &[BillStatus]) -> RepoResult<Vec<i64>> {
        if statuses.is_empty() {
            return Ok(Vec::new());
        }
        let mut qb = QueryBuilder::<Sqlite>::new("SELECT DISTINCT order_id FROM bill WHERE status IN (");
        let mut separated = qb.separated(", ");
        for status in statuses {
            separated.push_bind(status.as_str());
        }
        separated.push_unseparated(")");
        let ids = qb.build_query_scalar::<i64>().fetch_all(&self.pool).await?;
        Ok(ids)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::dec;
    use sqlx::sqlite::SqlitePoolOptions;

    /// In-memory SQLite pool with the real schema (single connection: each
    /// connection to `sqlite::memory:` is its own database).
    async fn test_pool() -> SqlitePool {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        crate::db::run_migrations(&pool).await.unwrap();
        pool
    }

    fn bill(id: i64, order_id: i64, number: &str, created_at: i64) -> Bill {
        Bill {
            id,
            bill_number: number.to_string(),
            order_id,
            customer_name: Some("María López".to_string()),
            table_number: Some("T12".to_string()),
            order_type: OrderType::DineIn,
            items: vec![BillItem {
                name: "Croquetas".to_string(),
                quantity: 2,
                unit_price: dec!(12.99),
                line_total: dec!(25.98),
            }],
            subtotal_amount: dec!(25.98),
            tax_rate: dec!(8),
            tax_amount: dec!(2.08),
            service_charge: Decimal::ZERO,
            discount_amount: Decimal::ZERO,
            total_amount: dec!(28.06),
            paid_amount: Decimal::ZERO,
            change_amount: Decimal::ZERO,
            status: BillStatus::Generated,
            payment_status: PaymentStatus::Pending,
            payment_method: None,
            payment_reference: None,
            notes: None,
            printed_at: None,
            created_at,
            updated_at: created_at,
            version: 0,
        }
    }

    #[tokio::test]
    async fn test_insert_and_find_round_trip() {
        let repo = SqliteBillRepository::new(test_pool().await);
        let saved = repo.save(&bill(1, 10, "BILL-20260301-0001", 1000)).await.unwrap();
        assert_eq!(saved.version, 1);

        let found = repo.find_by_id(1).await.unwrap().unwrap();
        assert_eq!(found, saved);
        assert_eq!(found.tax_rate.to_string(), "8.00");
        assert_eq!(found.items[0].unit_price, dec!(12.99));
        assert!(repo.find_by_id(2).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_update_requires_current_version() {
        let repo = SqliteBillRepository::new(test_pool().await);
        let saved = repo.save(&bill(1, 10, "BILL-20260301-0001", 1000)).await.unwrap();

        let mut first = saved.clone();
        first.paid_amount = dec!(10);
        first.payment_status = PaymentStatus::PartiallyPaid;
        let first = repo.save(&first).await.unwrap();
        assert_eq!(first.version, 2);

        // A writer still holding version 1 loses
        let mut stale = saved.clone();
        stale.paid_amount = dec!(5);
        let err = repo.save(&stale).await.unwrap_err();
        assert!(matches!(err, RepoError::Conflict(_)));

        let stored = repo.find_by_id(1).await.unwrap().unwrap();
        assert_eq!(stored.paid_amount, dec!(10));
        assert_eq!(stored.version, 2);
    }

    #[tokio::test]
    async fn test_update_missing_bill_is_not_found() {
        let repo = SqliteBillRepository::new(test_pool().await);
        let mut ghost = bill(99, 10, "BILL-20260301-0099", 1000);
        ghost.version = 3;
        assert!(matches!(repo.save(&ghost).await, Err(RepoError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_one_active_bill_per_order() {
        let repo = SqliteBillRepository::new(test_pool().await);
        repo.save(&bill(1, 10, "BILL-20260301-0001", 1000)).await.unwrap();
        let err = repo
            .save(&bill(2, 10, "BILL-20260301-0002", 2000))
            .await
            .unwrap_err();
        assert!(matches!(err, RepoError::Duplicate(_)));

        // Cancelled bills free the order
        let mut cancelled = repo.find_by_id(1).await.unwrap().unwrap();
        cancelled.status = BillStatus::Cancelled;
        repo.save(&cancelled).await.unwrap();
        repo.save(&bill(2, 10, "BILL-20260301-0002", 2000)).await.unwrap();
        assert_eq!(repo.find_by_order(10).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_filters_and_paging() {
        let repo = SqliteBillRepository::new(test_pool().await);
        for i in 1..=5 {
            let mut b = bill(i, 100 + i, &format!("BILL-20260301-000{i}"), i * 1000);
            if i % 2 == 0 {
                b.status = BillStatus::Paid;
                b.payment_status = PaymentStatus::Paid;
            }
            if i == 5 {
                b.customer_name = Some("Jordi_50%".to_string());
            }
            repo.save(&b).await.unwrap();
        }

        let (all, total) = repo.find_by_filters(&BillQuery::default()).await.unwrap();
        assert_eq!(total, 5);
        let ids: Vec<i64> = all.iter().map(|b| b.id).collect();
        assert_eq!(ids, vec![5, 4, 3, 2, 1]);

        let paid = BillQuery {
            status: Some(BillStatus::Paid),
            ..Default::default()
        };
        let (bills, total) = repo.find_by_filters(&paid).await.unwrap();
        assert_eq!(total, 2);
        assert!(bills.iter().all(|b| b.status == BillStatus::Paid));

        let page = BillQuery {
            limit: Some(2),
            offset: 2,
            ..Default::default()
        };
        let (bills, total) = repo.find_by_filters(&page).await.unwrap();
        assert_eq!(total, 5);
        assert_eq!(bills.iter().map(|b| b.id).collect::<Vec<_>>(), vec![3, 2]);

        let range = BillQuery {
            created_from: Some(2000),
            created_to: Some(4000),
            ..Default::default()
        };
        let (_, total) = repo.find_by_filters(&range).await.unwrap();
        assert_eq!(total, 2);

        let search = BillQuery {
            search: Some("0003".to_string()),
            ..Default::default()
        };
        let (bills, _) = repo.find_by_filters(&search).await.unwrap();
        assert_eq!(bills.len(), 1);
        assert_eq!(bills[0].id, 3);

        let literal = BillQuery {
            search: Some("_50%".to_string()),
            ..Default::default()
        };
        let (bills, _) = repo.find_by_filters(&literal).await.unwrap();
        assert_eq!(bills.len(), 1);
        assert_eq!(bills[0].id, 5);

        let table = BillQuery {
            search: Some("t12".to_string()),
            ..Default::default()
        };
        let (_, total) = repo.find_by_filters(&table).await.unwrap();
        assert_eq!(total, 5);
    }

    #[tokio::test]
    async fn test_numbering_and_counts() {
        let repo = SqliteBillRepository::new(test_pool().await);
        assert!(repo.latest_bill_number("BILL-20260301-").await.unwrap().is_none());

        repo.save(&bill(1, 1, "BILL-20260301-0009", 1000)).await.unwrap();
        repo.save(&bill(2, 2, "BILL-20260301-0010", 2000)).await.unwrap();
        repo.save(&bill(3, 3, "BILL-20260302-0001", 3000)).await.unwrap();

        assert_eq!(
            repo.latest_bill_number("BILL-20260301-").await.unwrap().as_deref(),
            Some("BILL-20260301-0010")
        );
        assert_eq!(repo.count_created_between(Some(1000), Some(3000)).await.unwrap(), 2);
        assert_eq!(repo.count_created_between(None, None).await.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_delete_and_order_ids() {
        let repo = SqliteBillRepository::new(test_pool().await);
        let mut draft = bill(1, 7, "BILL-20260301-0001", 1000);
        draft.status = BillStatus::Draft;
        repo.save(&draft).await.unwrap();
        repo.save(&bill(2, 8, "BILL-20260301-0002", 2000)).await.unwrap();

        let billed = repo
            .order_ids_with_status(&[BillStatus::Generated, BillStatus::Paid])
            .await
            .unwrap();
        assert_eq!(billed, vec![8]);

        assert!(repo.delete(1).await.unwrap());
        assert!(!repo.delete(1).await.unwrap());
        assert!(repo.find_by_order(7).await.unwrap().is_empty());
    }
}
