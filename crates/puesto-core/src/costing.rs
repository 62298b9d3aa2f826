//! # Costing Module
//!
//! Pure accounting math for the ledger: weighted-average inventory costing,
//! sale totals, and end-of-day reconciliation arithmetic.
//!
//! ## Weighted-Average Costing
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │  Batch 1: $100.00 / 20 units  →  unit cost $5.00, avg $5.00         │
//! │  Batch 2: $126.00 / 18 units  →  unit cost $7.00                    │
//! │                                                                     │
//! │  new avg = (20 × $5.00 + 18 × $7.00) / 38 = $226.00 / 38 = $5.95    │
//! │                                                                     │
//! │  Sales debit units at the CURRENT average and snapshot it; the      │
//! │  average itself only moves when a batch is registered.              │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every function here is deterministic and I/O-free. The repository layer
//! calls into this module from inside its transactions so the arithmetic and
//! the atomicity concerns stay separate.

use crate::error::{CoreResult, ValidationError};
use crate::money::Money;
use crate::types::{InventoryRecord, ProductionBatch};

// =============================================================================
// Batch Costing
// =============================================================================

/// Computes the per-unit cost of a production batch.
///
/// ## Example
/// ```rust
/// use puesto_core::costing::batch_unit_cost;
/// use puesto_core::money::Money;
///
/// let unit = batch_unit_cost(Money::from_cents(12600), 18).unwrap();
/// assert_eq!(unit.cents(), 700); // $7.00
/// ```
pub fn batch_unit_cost(input_cost: Money, units_produced: i64) -> CoreResult<Money> {
    if units_produced <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "units_produced".to_string(),
        }
        .into());
    }
    if input_cost.is_negative() {
        return Err(ValidationError::MustNotBeNegative {
            field: "input_cost".to_string(),
        }
        .into());
    }

    Ok(input_cost.div_round(units_produced))
}

/// Computes the new weighted-average unit cost after absorbing a batch.
///
/// An absent record, or one debited down to zero units, adopts the batch's
/// unit cost outright; otherwise the existing stock value and the incoming
/// batch value are blended and re-rounded to the cent.
pub fn weighted_average_cost(
    existing: Option<&InventoryRecord>,
    units_added: i64,
    unit_cost: Money,
) -> Money {
    match existing {
        Some(record) if record.quantity > 0 => {
            let existing_value = record.avg_cost().multiply_quantity(record.quantity);
            let added_value = unit_cost.multiply_quantity(units_added);
            (existing_value + added_value).div_round(record.quantity + units_added)
        }
        _ => unit_cost,
    }
}

// =============================================================================
// Sale Totals
// =============================================================================

/// Revenue, cost, and profit for one sale, all computed at sale time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SaleTotals {
    pub revenue: Money,
    pub cost: Money,
    pub profit: Money,
}

/// Computes the money amounts for a sale.
///
/// `unit_cost` must be the weighted-average cost snapshotted by the inventory
/// debit, not a later re-read; profit is informational and never re-derived
/// after the sale is stored.
pub fn sale_totals(quantity: i64, unit_price: Money, unit_cost: Money) -> SaleTotals {
    let revenue = unit_price.multiply_quantity(quantity);
    let cost = unit_cost.multiply_quantity(quantity);
    SaleTotals {
        revenue,
        cost,
        profit: revenue - cost,
    }
}

/// Profit margin as a whole percentage of the sale price.
///
/// Returns 0 for a non-positive price rather than dividing by it.
pub fn margin_percent(unit_cost: Money, unit_price: Money) -> i64 {
    if !unit_price.is_positive() {
        return 0;
    }
    let profit = unit_price - unit_cost;
    ((profit.cents() as f64 / unit_price.cents() as f64) * 100.0).round() as i64
}

// =============================================================================
// Inventory Analytics
// =============================================================================

/// Total value of all stock on hand at current average costs.
pub fn inventory_value(records: &[InventoryRecord]) -> Money {
    records.iter().map(InventoryRecord::stock_value).sum()
}

/// Average units produced per batch, to one decimal place.
pub fn average_yield(batches: &[ProductionBatch]) -> f64 {
    if batches.is_empty() {
        return 0.0;
    }
    let total_units: i64 = batches.iter().map(|b| b.units_produced).sum();
    (total_units as f64 / batches.len() as f64 * 10.0).round() / 10.0
}

// =============================================================================
// Reconciliation Math
// =============================================================================

/// Cash-out variance: counted minus expected. Negative means missing cash.
#[inline]
pub fn cash_variance(counted: Money, expected: Money) -> Money {
    counted - expected
}

/// Cash carried into the next day: counted minus withdrawn, floored at zero.
///
/// The caller validates `withdrawn <= counted` before getting here; the floor
/// only guards the stored float against going negative.
#[inline]
pub fn next_day_float(counted: Money, withdrawn: Money) -> Money {
    (counted - withdrawn).max(Money::zero())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn record(quantity: i64, avg_cost_cents: i64) -> InventoryRecord {
        InventoryRecord {
            flavor_id: "f1".to_string(),
            quantity,
            avg_cost_cents,
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_batch_unit_cost() {
        let unit = batch_unit_cost(Money::from_cents(10000), 20).unwrap();
        assert_eq!(unit.cents(), 500);
    }

    #[test]
    fn test_batch_unit_cost_rounds() {
        // $100.00 / 3 = 3333.3 cents -> 3333
        let unit = batch_unit_cost(Money::from_cents(10000), 3).unwrap();
        assert_eq!(unit.cents(), 3333);
    }

    #[test]
    fn test_batch_unit_cost_rejects_zero_units() {
        assert!(batch_unit_cost(Money::from_cents(10000), 0).is_err());
        assert!(batch_unit_cost(Money::from_cents(10000), -5).is_err());
    }

    #[test]
    fn test_batch_unit_cost_rejects_negative_cost() {
        assert!(batch_unit_cost(Money::from_cents(-100), 10).is_err());
    }

    #[test]
    fn test_weighted_average_first_batch() {
        let avg = weighted_average_cost(None, 20, Money::from_cents(500));
        assert_eq!(avg.cents(), 500);
    }

    #[test]
    fn test_weighted_average_zero_quantity_adopts_batch_cost() {
        // Record exists but was sold down to zero: the stale average is
        // replaced, not blended.
        let empty = record(0, 800);
        let avg = weighted_average_cost(Some(&empty), 10, Money::from_cents(600));
        assert_eq!(avg.cents(), 600);
    }

    /// Scenario: two batches blend to $5.95.
    #[test]
    fn test_weighted_average_blends_batches() {
        // batch 1: $100 / 20 units -> avg $5.00
        let first = record(20, 500);
        // batch 2: 18 units @ $7.00 -> (20*500 + 18*700)/38 = 594.7 -> 595
        let avg = weighted_average_cost(Some(&first), 18, Money::from_cents(700));
        assert_eq!(avg.cents(), 595);
    }

    #[test]
    fn test_sale_totals() {
        let totals = sale_totals(2, Money::from_cents(1000), Money::from_cents(400));
        assert_eq!(totals.revenue.cents(), 2000);
        assert_eq!(totals.cost.cents(), 800);
        assert_eq!(totals.profit.cents(), 1200);
    }

    #[test]
    fn test_margin_percent() {
        assert_eq!(
            margin_percent(Money::from_cents(400), Money::from_cents(1000)),
            60
        );
        assert_eq!(margin_percent(Money::from_cents(400), Money::zero()), 0);
    }

    #[test]
    fn test_inventory_value() {
        let records = vec![record(10, 500), record(4, 700)];
        assert_eq!(inventory_value(&records).cents(), 10 * 500 + 4 * 700);
        assert_eq!(inventory_value(&[]).cents(), 0);
    }

    #[test]
    fn test_average_yield() {
        let batches: Vec<ProductionBatch> = [20, 18, 25]
            .iter()
            .map(|units| ProductionBatch {
                id: "b".to_string(),
                flavor_id: "f1".to_string(),
                input_cost_cents: 10000,
                units_produced: *units,
                unit_cost_cents: 500,
                notes: None,
                produced_at: Utc::now(),
            })
            .collect();
        assert_eq!(average_yield(&batches), 21.0);
        assert_eq!(average_yield(&[]), 0.0);
    }

    #[test]
    fn test_cash_variance() {
        let v = cash_variance(Money::from_cents(48000), Money::from_cents(50000));
        assert_eq!(v.cents(), -2000);
    }

    #[test]
    fn test_next_day_float() {
        let float = next_day_float(Money::from_cents(48000), Money::from_cents(40000));
        assert_eq!(float.cents(), 8000);
        // precision-underflow guard only; validation rejects real overdraws
        let clamped = next_day_float(Money::from_cents(100), Money::from_cents(100));
        assert_eq!(clamped.cents(), 0);
    }
}
