//! Bill Ledger
//!
//! Owns bill records and is the only place money math and status
//! transitions happen.
//!
//! ```text
//! draft --finalize--> generated --payment(partial)--> generated (partially_paid)
//! generated --payment(full)--> paid --refund--> refunded
//! paid --payment--> paid (extra amount reported as change)
//! draft --cancel--> cancelled
//! draft --delete--> [removed]
//! ```
//!
//! Writes to one bill are serialized through [`BillLocks`]; the repository's
//! version check catches writers outside this process.

use std::sync::Arc;

use chrono_tz::Tz;
use rust_decimal::Decimal;
use shared::models::{
    Bill, BillStatus, GenerateBillOptions, OrderSnapshot, OrderStatus, PaymentInstruction,
    PaymentReceipt, PaymentStatus,
};
use shared::money::{normalize_rate, round_money};
use shared::util::{now_millis, snowflake_id};
use tokio::sync::Mutex;

use super::calc::{self, Adjustments};
use super::error::{BillingError, BillingResult};
use super::locks::BillLocks;
use crate::db::repository::{BillRepository, RepoError};
use crate::utils::logger::BILLING_TARGET;
use crate::utils::time;
use crate::utils::validation::{
    MAX_NOTE_LEN, MAX_REFERENCE_LEN, non_empty, validate_non_negative, validate_optional_text,
};

pub struct BillLedger {
    repo: Arc<dyn BillRepository>,
    locks: BillLocks,
    /// Serializes the one-active-bill check and bill numbering
    generation: Mutex<()>,
    default_tax_rate: Decimal,
    timezone: Tz,
}

impl BillLedger {
    pub fn new(repo: Arc<dyn BillRepository>, default_tax_rate: Decimal, timezone: Tz) -> Self {
        Self {
            repo,
            locks: BillLocks::new(),
            generation: Mutex::new(()),
            default_tax_rate,
            timezone,
        }
    }

    pub fn default_tax_rate(&self) -> Decimal {
        self.default_tax_rate
    }

    pub async fn get_bill(&self, bill_id: i64) -> BillingResult<Bill> {
        self.repo
            .find_by_id(bill_id)
            .await?
            .ok_or(BillingError::BillNotFound(bill_id))
    }

    /// Create a bill from an order snapshot.
    ///
    /// All validation happens before anything is written.
    pub async fn generate_bill(
        &self,
        order: &OrderSnapshot,
        options: GenerateBillOptions,
    ) -> BillingResult<Bill> {
        validate_options(&options)?;
        validate_snapshot(order)?;

        let tax_rate = normalize_rate(options.tax_rate.unwrap_or(self.default_tax_rate));
        let service_charge = round_money(options.service_charge.unwrap_or_default());
        let discount = round_money(options.discount_amount.unwrap_or_default());
        let totals = calc::compute_totals(
            &order.items,
            Adjustments {
                tax_rate,
                service_charge,
                discount,
            },
        );
        if totals.total < Decimal::ZERO {
            return Err(BillingError::NegativeTotal {
                total: totals.total,
            });
        }

        let _generation = self.generation.lock().await;

        if let Some(active) = self
            .repo
            .find_by_order(order.order_id)
            .await?
            .into_iter()
            .find(|b| b.status != BillStatus::Cancelled)
        {
            return Err(BillingError::DuplicateBill {
                order_id: order.order_id,
                bill_number: active.bill_number,
            });
        }

        let now = now_millis();
        let bill = Bill {
            id: snowflake_id(),
            bill_number: self.next_bill_number(now).await?,
            order_id: order.order_id,
            customer_name: order.customer_name.clone(),
            table_number: order.table_number.clone(),
            order_type: order.order_type,
            items: totals.items,
            subtotal_amount: totals.subtotal,
            tax_rate,
            tax_amount: totals.tax_amount,
            service_charge,
            discount_amount: discount,
            total_amount: totals.total,
            paid_amount: round_money(Decimal::ZERO),
            change_amount: round_money(Decimal::ZERO),
            status: if options.draft {
                BillStatus::Draft
            } else {
                BillStatus::Generated
            },
            payment_status: PaymentStatus::Pending,
            payment_method: options.payment_method,
            payment_reference: None,
            notes: non_empty(options.notes),
            printed_at: None,
            created_at: now,
            updated_at: now,
            version: 0,
        };

        let saved = self.repo.save(&bill).await.map_err(|e| match e {
            RepoError::Duplicate(_) => BillingError::DuplicateBill {
                order_id: bill.order_id,
                bill_number: bill.bill_number.clone(),
            },
            other => other.into(),
        })?;

        tracing::info!(
            target: BILLING_TARGET,
            event = "bill_generated",
            bill_id = saved.id,
            bill_number = %saved.bill_number,
            order_id = saved.order_id,
            status = %saved.status,
            total = %saved.total_amount,
            "Bill generated"
        );

        Ok(saved)
    }

    /// Apply one payment event. Returns the updated bill and this call's change.
    pub async fn record_payment(
        &self,
        bill_id: i64,
        instruction: PaymentInstruction,
    ) -> BillingResult<PaymentReceipt> {
        if instruction.paid_amount <= Decimal::ZERO {
            return Err(BillingError::InvalidPaymentAmount(instruction.paid_amount));
        }
        validate_optional_text(
            &instruction.payment_reference,
            "payment_reference",
            MAX_REFERENCE_LEN,
        )?;

        let _lock = self.locks.acquire(bill_id).await;
        let mut bill = self.get_bill(bill_id).await?;

        if matches!(bill.status, BillStatus::Cancelled | BillStatus::Refunded) {
            return Err(BillingError::BillNotPayable {
                bill_id,
                status: bill.status,
            });
        }

        let paid_after = round_money(bill.paid_amount + instruction.paid_amount);
        let change = calc::change_due(paid_after, bill.total_amount);

        bill.paid_amount = paid_after;
        bill.change_amount = change;
        bill.payment_status = calc::derive_payment_status(paid_after, bill.total_amount);
        // A partial payment on a draft promotes it to generated
        bill.status = if bill.payment_status == PaymentStatus::Paid {
            BillStatus::Paid
        } else {
            BillStatus::Generated
        };
        bill.payment_method = Some(instruction.payment_method);
        if let Some(reference) = non_empty(instruction.payment_reference) {
            bill.payment_reference = Some(reference);
        }
        bill.updated_at = now_millis();

        let saved = self.persist(bill).await?;

        tracing::info!(
            target: BILLING_TARGET,
            event = "payment_recorded",
            bill_id = saved.id,
            bill_number = %saved.bill_number,
            method = %instruction.payment_method,
            amount = %round_money(instruction.paid_amount),
            paid = %saved.paid_amount,
            total = %saved.total_amount,
            change = %change,
            payment_status = %saved.payment_status,
            "Payment recorded"
        );

        Ok(PaymentReceipt {
            bill: saved,
            change_amount: change,
        })
    }

    /// draft → cancelled
    pub async fn cancel_bill(&self, bill_id: i64) -> BillingResult<Bill> {
        self.transition(bill_id, "cancel", BillStatus::Draft, |bill| {
            bill.status = BillStatus::Cancelled;
        })
        .await
    }

    /// draft → generated
    pub async fn finalize_bill(&self, bill_id: i64) -> BillingResult<Bill> {
        self.transition(bill_id, "finalize", BillStatus::Draft, |bill| {
            bill.status = BillStatus::Generated;
        })
        .await
    }

    /// paid → refunded
    pub async fn refund_bill(&self, bill_id: i64) -> BillingResult<Bill> {
        self.transition(bill_id, "refund", BillStatus::Paid, |bill| {
            bill.status = BillStatus::Refunded;
            bill.payment_status = PaymentStatus::Refunded;
        })
        .await
    }

    /// Record the first print time. Repeated calls leave the bill as is.
    pub async fn mark_printed(&self, bill_id: i64) -> BillingResult<Bill> {
        let _lock = self.locks.acquire(bill_id).await;
        let mut bill = self.get_bill(bill_id).await?;
        if bill.printed_at.is_some() {
            return Ok(bill);
        }

        let now = now_millis();
        bill.printed_at = Some(now);
        bill.updated_at = now;
        let saved = self.persist(bill).await?;

        tracing::info!(
            target: BILLING_TARGET,
            event = "bill_printed",
            bill_id = saved.id,
            bill_number = %saved.bill_number,
            "Bill marked as printed"
        );
        Ok(saved)
    }

    /// Remove a draft bill
    pub async fn delete_bill(&self, bill_id: i64) -> BillingResult<()> {
        let _lock = self.locks.acquire(bill_id).await;
        let bill = self.get_bill(bill_id).await?;
        if bill.status != BillStatus::Draft {
            return Err(BillingError::BillNotDeletable {
                bill_id,
                status: bill.status,
            });
        }

        if !self.repo.delete(bill_id).await? {
            return Err(BillingError::BillNotFound(bill_id));
        }

        tracing::info!(
            target: BILLING_TARGET,
            event = "bill_deleted",
            bill_id,
            bill_number = %bill.bill_number,
            "Draft bill deleted"
        );
        Ok(())
    }

    async fn transition(
        &self,
        bill_id: i64,
        action: &'static str,
        from: BillStatus,
        apply: impl FnOnce(&mut Bill),
    ) -> BillingResult<Bill> {
        let _lock = self.locks.acquire(bill_id).await;
        let mut bill = self.get_bill(bill_id).await?;
        if bill.status != from {
            return Err(BillingError::InvalidStateTransition {
                bill_id,
                from: bill.status,
                action,
            });
        }

        apply(&mut bill);
        bill.updated_at = now_millis();
        let saved = self.persist(bill).await?;

        tracing::info!(
            target: BILLING_TARGET,
            event = action,
            bill_id = saved.id,
            bill_number = %saved.bill_number,
            from = %from,
            to = %saved.status,
            "Bill status changed"
        );
        Ok(saved)
    }

    async fn persist(&self, bill: Bill) -> BillingResult<Bill> {
        let bill_id = bill.id;
        self.repo.save(&bill).await.map_err(|e| match e {
            RepoError::Conflict(_) => BillingError::ConcurrentModification(bill_id),
            RepoError::NotFound(_) => BillingError::BillNotFound(bill_id),
            other => other.into(),
        })
    }

    /// `BILL-YYYYMMDD-NNNN`, sequence per business day
    async fn next_bill_number(&self, now: i64) -> BillingResult<String> {
        let date = time::business_date(now, self.timezone);
        let prefix = format!("BILL-{}-", date.format("%Y%m%d"));
        let next = self
            .repo
            .latest_bill_number(&prefix)
            .await?
            .and_then(|last| last.strip_prefix(&prefix)?.parse::<u32>().ok())
            .map_or(1, |seq| seq + 1);
        Ok(format!("{prefix}{next:04}"))
    }
}

fn validate_options(options: &GenerateBillOptions) -> BillingResult<()> {
    validate_non_negative(options.tax_rate, "tax_rate")?;
    validate_non_negative(options.discount_amount, "discount_amount")?;
    validate_non_negative(options.service_charge, "service_charge")?;
    validate_optional_text(&options.notes, "notes", MAX_NOTE_LEN)?;
    Ok(())
}

fn validate_snapshot(order: &OrderSnapshot) -> BillingResult<()> {
    let invalid = |reason: String| BillingError::InvalidOrder {
        order_id: order.order_id,
        reason,
    };

    if order.status == OrderStatus::Cancelled {
        return Err(invalid("order is cancelled".to_string()));
    }
    if order.items.is_empty() {
        return Err(invalid("order has no items".to_string()));
    }
    for item in &order.items {
        if item.quantity <= 0 {
            return Err(invalid(format!(
                "item '{}' has non-positive quantity {}",
                item.name, item.quantity
            )));
        }
        if item.unit_price < Decimal::ZERO {
            return Err(invalid(format!(
                "item '{}' has negative unit price {}",
                item.name, item.unit_price
            )));
        }
    }
    Ok(())
}
