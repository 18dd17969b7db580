//! Bill money math
//!
//! Pure functions over `Decimal`. Intermediate values are never rounded;
//! each stored amount is rounded to cents once, when it is produced.

use rust_decimal::Decimal;
use shared::models::{BillItem, OrderItemSnapshot, PaymentStatus};
use shared::money::round_money;

const HUNDRED: Decimal = Decimal::ONE_HUNDRED;

/// Amounts computed for a new bill
#[derive(Debug, Clone, PartialEq)]
pub struct BillTotals {
    pub items: Vec<BillItem>,
    pub subtotal: Decimal,
    pub tax_amount: Decimal,
    pub total: Decimal,
}

/// Adjustments applied on top of the item subtotal
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Adjustments {
    /// Percent
    pub tax_rate: Decimal,
    pub service_charge: Decimal,
    pub discount: Decimal,
}

/// subtotal = Σ quantity × unit_price
/// tax = subtotal × tax_rate / 100
/// total = subtotal + tax + service_charge − discount
///
/// The returned total may be negative; the caller decides whether that is
/// acceptable.
pub fn compute_totals(items: &[OrderItemSnapshot], adj: Adjustments) -> BillTotals {
    let items: Vec<BillItem> = items
        .iter()
        .map(|item| BillItem {
            name: item.name.clone(),
            quantity: item.quantity,
            unit_price: round_money(item.unit_price),
            line_total: round_money(Decimal::from(item.quantity) * item.unit_price),
        })
        .collect();

    let subtotal = round_money(items.iter().map(|i| i.line_total).sum());
    let tax_amount = round_money(subtotal * adj.tax_rate / HUNDRED);
    // Components are already at cents, so the sum is exact
    let total = round_money(subtotal + tax_amount + adj.service_charge - adj.discount);

    BillTotals {
        items,
        subtotal,
        tax_amount,
        total,
    }
}

/// pending → partially_paid → paid, from cumulative paid vs total
pub fn derive_payment_status(paid: Decimal, total: Decimal) -> PaymentStatus {
    if paid <= Decimal::ZERO {
        PaymentStatus::Pending
    } else if paid < total {
        PaymentStatus::PartiallyPaid
    } else {
        PaymentStatus::Paid
    }
}

/// max(0, paid − total)
pub fn change_due(paid: Decimal, total: Decimal) -> Decimal {
    round_money((paid - total).max(Decimal::ZERO))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::dec;

    fn item(quantity: i32, price: Decimal) -> OrderItemSnapshot {
        OrderItemSnapshot {
            name: "item".to_string(),
            quantity,
            unit_price: price,
        }
    }

    fn adj(tax_rate: Decimal) -> Adjustments {
        Adjustments {
            tax_rate,
            service_charge: Decimal::ZERO,
            discount: Decimal::ZERO,
        }
    }

    #[test]
    fn test_reference_order() {
        let totals = compute_totals(&[item(2, dec!(12.99)), item(1, dec!(8.99))], adj(dec!(8)));
        assert_eq!(totals.subtotal.to_string(), "34.97");
        assert_eq!(totals.tax_amount.to_string(), "2.80");
        assert_eq!(totals.total.to_string(), "37.77");
        assert_eq!(totals.items[0].line_total.to_string(), "25.98");
    }

    #[test]
    fn test_total_identity_holds_on_stored_values() {
        let totals = compute_totals(
            &[item(3, dec!(4.15)), item(1, dec!(0.99))],
            Adjustments {
                tax_rate: dec!(21),
                service_charge: dec!(1.50),
                discount: dec!(2.00),
            },
        );
        assert_eq!(
            totals.total,
            totals.subtotal + totals.tax_amount + dec!(1.50) - dec!(2.00)
        );
        // 13.44 × 21% = 2.8224
        assert_eq!(totals.tax_amount, dec!(2.82));
        assert_eq!(totals.total, dec!(15.76));
    }

    #[test]
    fn test_discount_can_push_total_negative() {
        let totals = compute_totals(
            &[item(1, dec!(5.00))],
            Adjustments {
                tax_rate: Decimal::ZERO,
                service_charge: Decimal::ZERO,
                discount: dec!(6.00),
            },
        );
        assert_eq!(totals.total, dec!(-1.00));
    }

    #[test]
    fn test_tax_rounds_half_away_from_zero() {
        // 0.50 × 5% = 0.025
        let totals = compute_totals(&[item(1, dec!(0.50))], adj(dec!(5)));
        assert_eq!(totals.tax_amount, dec!(0.03));
    }

    #[test]
    fn test_payment_status() {
        let total = dec!(37.77);
        assert_eq!(derive_payment_status(dec!(0), total), PaymentStatus::Pending);
        assert_eq!(
            derive_payment_status(dec!(20.00), total),
            PaymentStatus::PartiallyPaid
        );
        assert_eq!(derive_payment_status(dec!(37.77), total), PaymentStatus::Paid);
        assert_eq!(derive_payment_status(dec!(50), total), PaymentStatus::Paid);
    }

    #[test]
    fn test_change_never_negative() {
        assert_eq!(change_due(dec!(50.00), dec!(37.77)).to_string(), "12.23");
        assert_eq!(change_due(dec!(20.00), dec!(37.77)).to_string(), "0.00");
        assert_eq!(change_due(dec!(37.77), dec!(37.77)).to_string(), "0.00");
    }
}
