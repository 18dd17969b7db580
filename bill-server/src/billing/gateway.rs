//! Billing Gateway
//!
//! Request-facing façade over the ledger: resolves order snapshots, turns
//! business dates into millis ranges, clamps paging and aggregates
//! statistics. All writes go through [`BillLedger`].

use std::collections::HashSet;
use std::sync::Arc;

use chrono_tz::Tz;
use rust_decimal::Decimal;
use shared::models::{
    Bill, BillFilters, BillPage, BillStatistics, BillStatus, BillsByStatus, GenerateBillOptions,
    OrderSnapshot, PaymentInstruction, PaymentMethod, PaymentReceipt, RevenueByMethod,
    StatisticsRange,
};
use shared::money::round_money;

use super::error::{BillingError, BillingResult};
use super::ledger::BillLedger;
use crate::db::repository::{BillQuery, BillRepository};
use crate::orders::OrderSnapshotProvider;
use crate::utils::AppError;
use crate::utils::time;
use crate::utils::validation::{MAX_SEARCH_LEN, non_empty, validate_optional_text};

/// Page size when the request does not specify one
pub const DEFAULT_PAGE_SIZE: i64 = 50;

/// Any bill that is not cancelled blocks a new one for the same order
const ACTIVE_STATUSES: [BillStatus; 4] = [
    BillStatus::Draft,
    BillStatus::Generated,
    BillStatus::Paid,
    BillStatus::Refunded,
];

pub struct BillingGateway {
    ledger: Arc<BillLedger>,
    repo: Arc<dyn BillRepository>,
    orders: Arc<dyn OrderSnapshotProvider>,
    timezone: Tz,
    max_page_size: i64,
}

impl BillingGateway {
    pub fn new(
        ledger: Arc<BillLedger>,
        repo: Arc<dyn BillRepository>,
        orders: Arc<dyn OrderSnapshotProvider>,
        timezone: Tz,
        max_page_size: i64,
    ) -> Self {
        Self {
            ledger,
            repo,
            orders,
            timezone,
            max_page_size: max_page_size.max(1),
        }
    }

    pub fn ledger(&self) -> &BillLedger {
        &self.ledger
    }

    // ── Queries ─────────────────────────────────────────────────────

    /// Filtered, paged listing, newest first
    pub async fn list_bills(&self, filters: BillFilters) -> BillingResult<BillPage> {
        let search = non_empty(filters.search);
        validate_optional_text(&search, "search", MAX_SEARCH_LEN)?;

        let limit = match filters.limit {
            Some(l) if l <= 0 => {
                return Err(AppError::validation(format!("limit must be positive, got {l}"))
                    .with_detail("field", "limit")
                    .into());
            }
            Some(l) => l.min(self.max_page_size),
            None => DEFAULT_PAGE_SIZE.min(self.max_page_size),
        };
        let offset = filters.offset.unwrap_or(0);
        if offset < 0 {
            return Err(AppError::validation(format!("offset must be non-negative, got {offset}"))
                .with_detail("field", "offset")
                .into());
        }

        let (created_from, created_to) = time::date_range_millis(
            filters.date_from.as_deref(),
            filters.date_to.as_deref(),
            self.timezone,
        )?;

        let query = BillQuery {
            status: filters.status,
            payment_status: filters.payment_status,
            created_from,
            created_to,
            search,
            limit: Some(limit),
            offset,
        };
        let (bills, total) = self.repo.find_by_filters(&query).await?;

        Ok(BillPage {
            bills,
            total,
            limit,
            offset,
        })
    }

    pub async fn get_bill(&self, bill_id: i64) -> BillingResult<Bill> {
        self.ledger.get_bill(bill_id).await
    }

    /// Completed orders without a generated or paid bill
    pub async fn completed_orders_awaiting_billing(&self) -> BillingResult<Vec<OrderSnapshot>> {
        let billed: HashSet<i64> = self
            .repo
            .order_ids_with_status(&ACTIVE_STATUSES)
            .await?
            .into_iter()
            .collect();
        let orders = self.orders.completed_orders().await?;
        Ok(orders
            .into_iter()
            .filter(|o| !billed.contains(&o.order_id))
            .collect())
    }

    /// Aggregate bills created within the range. Today's figures always use
    /// the current business day.
    pub async fn compute_statistics(&self, range: StatisticsRange) -> BillingResult<BillStatistics> {
        let (created_from, created_to) = time::date_range_millis(
            range.date_from.as_deref(),
            range.date_to.as_deref(),
            self.timezone,
        )?;
        let (bills, _) = self
            .repo
            .find_by_filters(&BillQuery {
                created_from,
                created_to,
                ..Default::default()
            })
            .await?;

        let today = time::today(self.timezone);
        let today_from = time::day_start_millis(today, self.timezone);
        let today_to = time::day_end_millis(today, self.timezone);
        let today_bills = self
            .repo
            .count_created_between(Some(today_from), Some(today_to))
            .await?;
        let (today_paid, _) = self
            .repo
            .find_by_filters(&BillQuery {
                status: Some(BillStatus::Paid),
                created_from: Some(today_from),
                created_to: Some(today_to),
                ..Default::default()
            })
            .await?;

        let mut stats = summarize(&bills);
        stats.today_bills = today_bills;
        stats.today_revenue = round_money(today_paid.iter().map(|b| b.total_amount).sum());
        Ok(stats)
    }

    // ── Commands ────────────────────────────────────────────────────

    /// Snapshot the order and hand it to the ledger
    pub async fn generate_bill(
        &self,
        order_id: i64,
        options: GenerateBillOptions,
    ) -> BillingResult<Bill> {
        let snapshot = self
            .orders
            .snapshot(order_id)
            .await?
            .ok_or(BillingError::OrderNotFound(order_id))?;
        self.ledger.generate_bill(&snapshot, options).await
    }

    pub async fn record_payment(
        &self,
        bill_id: i64,
        instruction: PaymentInstruction,
    ) -> BillingResult<PaymentReceipt> {
        self.ledger.record_payment(bill_id, instruction).await
    }

    pub async fn mark_printed(&self, bill_id: i64) -> BillingResult<Bill> {
        self.ledger.mark_printed(bill_id).await
    }

    pub async fn delete_bill(&self, bill_id: i64) -> BillingResult<()> {
        self.ledger.delete_bill(bill_id).await
    }

    pub async fn cancel_bill(&self, bill_id: i64) -> BillingResult<Bill> {
        self.ledger.cancel_bill(bill_id).await
    }

    pub async fn finalize_bill(&self, bill_id: i64) -> BillingResult<Bill> {
        self.ledger.finalize_bill(bill_id).await
    }

    pub async fn refund_bill(&self, bill_id: i64) -> BillingResult<Bill> {
        self.ledger.refund_bill(bill_id).await
    }
}

/// Range-level aggregation. Revenue counts `paid` bills only, so refunds
/// drop out of revenue.
fn summarize(bills: &[Bill]) -> BillStatistics {
    let mut by_status = BillsByStatus::default();
    let mut by_method = RevenueByMethod::default();
    let mut revenue = Decimal::ZERO;
    let mut paid_count: i64 = 0;
    let mut outstanding = Decimal::ZERO;

    for bill in bills {
        match bill.status {
            BillStatus::Draft => by_status.draft += 1,
            BillStatus::Generated => {
                by_status.generated += 1;
                outstanding += bill.balance_due();
            }
            BillStatus::Paid => {
                by_status.paid += 1;
                paid_count += 1;
                revenue += bill.total_amount;
                match bill.payment_method {
                    Some(PaymentMethod::Cash) => by_method.cash += bill.total_amount,
                    Some(PaymentMethod::Card) => by_method.card += bill.total_amount,
                    Some(PaymentMethod::Digital) => by_method.digital += bill.total_amount,
                    Some(PaymentMethod::BankTransfer) => {
                        by_method.bank_transfer += bill.total_amount
                    }
                    None => {}
                }
            }
            BillStatus::Cancelled => by_status.cancelled += 1,
            BillStatus::Refunded => by_status.refunded += 1,
        }
    }

    let average = if paid_count > 0 {
        revenue / Decimal::from(paid_count)
    } else {
        Decimal::ZERO
    };

    BillStatistics {
        total_revenue: round_money(revenue),
        total_bills: bills.len() as i64,
        bills_by_status: by_status,
        today_bills: 0,
        today_revenue: round_money(Decimal::ZERO),
        average_bill_amount: round_money(average),
        outstanding_amount: round_money(outstanding),
        revenue_by_method: RevenueByMethod {
            cash: round_money(by_method.cash),
            card: round_money(by_method.card),
            digital: round_money(by_method.digital),
            bank_transfer: round_money(by_method.bank_transfer),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repository::{SqliteBillRepository, order};
    use crate::orders::SqliteOrderProvider;
    use rust_decimal::dec;
    use shared::models::{OrderItemSnapshot, OrderStatus, OrderType, PaymentStatus};
    use sqlx::SqlitePool;
    use sqlx::sqlite::SqlitePoolOptions;

    async fn setup() -> (BillingGateway, SqlitePool) {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        crate::db::run_migrations(&pool).await.unwrap();

        let repo: Arc<dyn BillRepository> = Arc::new(SqliteBillRepository::new(pool.clone()));
        let ledger = Arc::new(BillLedger::new(
            repo.clone(),
            dec!(8),
            chrono_tz::Europe::Madrid,
        ));
        let gateway = BillingGateway::new(
            ledger,
            repo,
            Arc::new(SqliteOrderProvider::new(pool.clone())),
            chrono_tz::Europe::Madrid,
            3,
        );
        (gateway, pool)
    }

    async fn seed_order(pool: &SqlitePool, id: i64, status: OrderStatus, customer: &str) {
        let snapshot = OrderSnapshot {
            order_id: id,
            order_number: format!("ORD-{id:04}"),
            status,
            order_type: OrderType::DineIn,
            table_number: Some(format!("T{id}")),
            customer_name: Some(customer.to_string()),
            items: vec![
                OrderItemSnapshot {
                    name: "Gazpacho".to_string(),
                    quantity: 2,
                    unit_price: dec!(12.99),
                },
                OrderItemSnapshot {
                    name: "Flan".to_string(),
                    quantity: 1,
                    unit_price: dec!(8.99),
                },
            ],
            completed_at: (status == OrderStatus::Completed).then_some(1_700_000_000_000 + id),
        };
        order::insert(pool, &snapshot).await.unwrap();
    }

    fn cash(amount: Decimal) -> PaymentInstruction {
        PaymentInstruction {
            payment_method: PaymentMethod::Cash,
            paid_amount: amount,
            payment_reference: None,
        }
    }

    #[tokio::test]
    async fn test_generate_missing_order() {
        let (gateway, _pool) = setup().await;
        let err = gateway
            .generate_bill(99, GenerateBillOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, BillingError::OrderNotFound(99)));
        let app: AppError = err.into();
        assert_eq!(app.code.kind(), "not_found");
    }

    #[tokio::test]
    async fn test_generate_from_stored_order() {
        let (gateway, pool) = setup().await;
        seed_order(&pool, 1, OrderStatus::Completed, "Ana").await;

        let bill = gateway.generate_bill(1, Default::default()).await.unwrap();
        assert_eq!(bill.total_amount, dec!(37.77));
        assert_eq!(bill.customer_name.as_deref(), Some("Ana"));
        assert_eq!(gateway.get_bill(bill.id).await.unwrap(), bill);
    }

    #[tokio::test]
    async fn test_completed_orders_awaiting_billing() {
        let (gateway, pool) = setup().await;
        seed_order(&pool, 1, OrderStatus::Completed, "Ana").await;
        seed_order(&pool, 2, OrderStatus::Completed, "Biel").await;
        seed_order(&pool, 3, OrderStatus::Completed, "Carla").await;
        seed_order(&pool, 4, OrderStatus::Served, "Dani").await;

        seed_order(&pool, 5, OrderStatus::Completed, "Eva").await;
        seed_order(&pool, 6, OrderStatus::Completed, "Fede").await;

        gateway.generate_bill(1, Default::default()).await.unwrap();
        // Drafts and refunded bills still block a new bill
        gateway
            .generate_bill(
                2,
                GenerateBillOptions {
                    draft: true,
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        let refunded = gateway.generate_bill(5, Default::default()).await.unwrap();
        gateway.record_payment(refunded.id, cash(dec!(37.77))).await.unwrap();
        gateway.refund_bill(refunded.id).await.unwrap();
        // A cancelled draft frees the order again
        let cancelled = gateway
            .generate_bill(
                6,
                GenerateBillOptions {
                    draft: true,
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        gateway.cancel_bill(cancelled.id).await.unwrap();

        let awaiting = gateway.completed_orders_awaiting_billing().await.unwrap();
        let mut ids: Vec<i64> = awaiting.iter().map(|o| o.order_id).collect();
        ids.sort();
        assert_eq!(ids, vec![3, 6]);

        // Every listed order can actually be billed
        for id in ids {
            gateway.generate_bill(id, Default::default()).await.unwrap();
        }
        assert!(gateway.completed_orders_awaiting_billing().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_list_bills_paging_and_filters() {
        let (gateway, pool) = setup().await;
        for (id, name) in [(1, "Ana"), (2, "Biel"), (3, "Carla"), (4, "Dani")] {
            seed_order(&pool, id, OrderStatus::Completed, name).await;
            gateway.generate_bill(id, Default::default()).await.unwrap();
        }
        let first = gateway.list_bills(BillFilters::default()).await.unwrap();
        // Capped by max_page_size
        assert_eq!(first.limit, 3);
        assert_eq!(first.bills.len(), 3);
        assert_eq!(first.total, 4);

        let paid_id = first.bills[0].id;
        gateway.record_payment(paid_id, cash(dec!(37.77))).await.unwrap();

        let paid = gateway
            .list_bills(BillFilters {
                payment_status: Some(PaymentStatus::Paid),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(paid.total, 1);
        assert_eq!(paid.bills[0].id, paid_id);

        let search = gateway
            .list_bills(BillFilters {
                search: Some("  carla ".to_string()),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(search.total, 1);

        let today = time::today(chrono_tz::Europe::Madrid).to_string();
        let ranged = gateway
            .list_bills(BillFilters {
                date_from: Some(today.clone()),
                date_to: Some(today),
                offset: Some(3),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(ranged.total, 4);
        assert_eq!(ranged.bills.len(), 1);
    }

    #[tokio::test]
    async fn test_list_bills_rejects_bad_input() {
        let (gateway, _pool) = setup().await;
        for filters in [
            BillFilters {
                limit: Some(0),
                ..Default::default()
            },
            BillFilters {
                offset: Some(-1),
                ..Default::default()
            },
            BillFilters {
                date_from: Some("2026-03-02".to_string()),
                date_to: Some("2026-03-01".to_string()),
                ..Default::default()
            },
            BillFilters {
                date_from: Some("yesterday".to_string()),
                ..Default::default()
            },
        ] {
            assert!(matches!(
                gateway.list_bills(filters).await,
                Err(BillingError::Validation(_))
            ));
        }
    }

    #[tokio::test]
    async fn test_statistics() {
        let (gateway, pool) = setup().await;
        for id in 1..=5 {
            seed_order(&pool, id, OrderStatus::Completed, "Guest").await;
        }
        let paid_cash = gateway.generate_bill(1, Default::default()).await.unwrap();
        gateway.record_payment(paid_cash.id, cash(dec!(50))).await.unwrap();

        let paid_card = gateway.generate_bill(2, Default::default()).await.unwrap();
        gateway
            .record_payment(
                paid_card.id,
                PaymentInstruction {
                    payment_method: PaymentMethod::Card,
                    paid_amount: dec!(37.77),
                    payment_reference: Some("AUTH-1".to_string()),
                },
            )
            .await
            .unwrap();

        let partial = gateway.generate_bill(3, Default::default()).await.unwrap();
        gateway.record_payment(partial.id, cash(dec!(20))).await.unwrap();

        let draft = gateway
            .generate_bill(
                4,
                GenerateBillOptions {
                    draft: true,
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        gateway.cancel_bill(draft.id).await.unwrap();

        let refunded = gateway.generate_bill(5, Default::default()).await.unwrap();
        gateway.record_payment(refunded.id, cash(dec!(37.77))).await.unwrap();
        gateway.refund_bill(refunded.id).await.unwrap();

        let stats = gateway
            .compute_statistics(StatisticsRange::default())
            .await
            .unwrap();
        assert_eq!(stats.total_bills, 5);
        assert_eq!(
            stats.bills_by_status,
            BillsByStatus {
                draft: 0,
                generated: 1,
                paid: 2,
                cancelled: 1,
                refunded: 1,
            }
        );
        assert_eq!(stats.total_revenue, dec!(75.54));
        assert_eq!(stats.average_bill_amount, dec!(37.77));
        assert_eq!(stats.outstanding_amount, dec!(17.77));
        assert_eq!(stats.revenue_by_method.cash, dec!(37.77));
        assert_eq!(stats.revenue_by_method.card, dec!(37.77));
        assert_eq!(stats.revenue_by_method.digital, Decimal::ZERO);
        assert_eq!(stats.today_bills, 5);
        assert_eq!(stats.today_revenue, dec!(75.54));

        // A past range sees nothing, today's figures stay
        let past = gateway
            .compute_statistics(StatisticsRange {
                date_from: Some("2020-01-01".to_string()),
                date_to: Some("2020-01-31".to_string()),
            })
            .await
            .unwrap();
        assert_eq!(past.total_bills, 0);
        assert_eq!(past.total_revenue, Decimal::ZERO);
        assert_eq!(past.today_bills, 5);
    }

    #[test]
    fn test_summarize_empty() {
        let stats = summarize(&[]);
        assert_eq!(stats.total_bills, 0);
        assert_eq!(stats.average_bill_amount.to_string(), "0.00");
        assert_eq!(stats.outstanding_amount.to_string(), "0.00");
    }
}
