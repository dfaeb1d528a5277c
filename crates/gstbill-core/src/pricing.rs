//! # Pricing Module
//!
//! The per-line and cart-wide billing math shared by the cart engine and
//! the billing engine.
//!
//! ## The Line Computation
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  unit_price × qty                     = subtotal                        │
//! │  round_half_up(subtotal × rate / 2)   = cgst                            │
//! │  cgst                                 = sgst   (equal split)            │
//! │  cgst + sgst                          = total_gst                       │
//! │  subtotal + total_gst                 = total                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The variant price overrides the product price when a cart line carries
//! a variant, but the GST rate always comes from the parent product; the
//! caller resolves both before calling [`LineAmounts::compute`].

use serde::{Deserialize, Serialize};

use crate::money::{GstRate, Money};

// =============================================================================
// Line Amounts
// =============================================================================

/// The five monetary figures of a single billed line.
///
/// Computed lazily for cart display and snapshotted onto invoice lines at
/// billing time; the same function serves both so the cart preview and the
/// final invoice can never disagree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineAmounts {
    pub subtotal: Money,
    pub cgst: Money,
    pub sgst: Money,
    pub total_gst: Money,
    pub total: Money,
}

impl LineAmounts {
    /// Computes all amounts for one line.
    ///
    /// ```rust
    /// use gstbill_core::money::{GstRate, Money};
    /// use gstbill_core::pricing::LineAmounts;
    ///
    /// // 2 × Rs 100.00 at 18%
    /// let line = LineAmounts::compute(Money::from_paise(10_000), 2, GstRate::from_bps(1800));
    /// assert_eq!(line.subtotal.paise(), 20_000); // Rs 200.00
    /// assert_eq!(line.cgst.paise(), 1_800);      // Rs 18.00
    /// assert_eq!(line.sgst.paise(), 1_800);      // Rs 18.00
    /// assert_eq!(line.total.paise(), 23_600);    // Rs 236.00
    /// ```
    pub fn compute(unit_price: Money, quantity: i64, rate: GstRate) -> Self {
        let subtotal = unit_price.multiply_quantity(quantity);
        let cgst = subtotal.gst_half(rate);
        let sgst = cgst;
        let total_gst = cgst + sgst;

        LineAmounts {
            subtotal,
            cgst,
            sgst,
            total_gst,
            total: subtotal + total_gst,
        }
    }

    /// A tax-exempt line: subtotal only, all GST figures zero.
    pub fn exempt(unit_price: Money, quantity: i64) -> Self {
        Self::compute(unit_price, quantity, GstRate::zero())
    }
}

// =============================================================================
// Cart Totals
// =============================================================================

/// Running aggregate over a set of lines.
///
/// Invoice-level figures are the sums of the per-line rounded figures:
/// every persisted line is a fact, and the header must equal the sum of
/// its lines exactly.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct CartTotals {
    pub total_items: i64,
    pub subtotal: Money,
    pub cgst: Money,
    pub sgst: Money,
    pub total_gst: Money,
    pub grand_total: Money,
}

impl CartTotals {
    pub fn new() -> Self {
        Self::default()
    }

    /// Folds one line into the aggregate.
    pub fn add_line(&mut self, quantity: i64, amounts: &LineAmounts) {
        self.total_items += quantity;
        self.subtotal += amounts.subtotal;
        self.cgst += amounts.cgst;
        self.sgst += amounts.sgst;
        self.total_gst += amounts.total_gst;
        self.grand_total += amounts.total;
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reference_scenario() {
        // The canonical case: stock=5, price=Rs 100.00, gst=18%, qty=2
        let line = LineAmounts::compute(Money::from_paise(10_000), 2, GstRate::from_bps(1800));
        assert_eq!(line.subtotal.paise(), 20_000);
        assert_eq!(line.total_gst.paise(), 3_600);
        assert_eq!(line.cgst.paise(), 1_800);
        assert_eq!(line.sgst.paise(), 1_800);
        assert_eq!(line.total.paise(), 23_600);
    }

    #[test]
    fn test_invariants_hold_exactly() {
        for (price, qty, bps) in [
            (9_999, 3, 1800),
            (33, 7, 500),
            (101, 13, 1250),
            (55_555, 2, 2800),
            (1, 1, 1),
        ] {
            let line = LineAmounts::compute(Money::from_paise(price), qty, GstRate::from_bps(bps));
            assert_eq!(line.cgst, line.sgst);
            assert_eq!(line.total_gst, line.cgst + line.sgst);
            assert_eq!(line.total, line.subtotal + line.total_gst);
        }
    }

    #[test]
    fn test_exempt_line() {
        let line = LineAmounts::exempt(Money::from_paise(5_000), 4);
        assert_eq!(line.subtotal.paise(), 20_000);
        assert_eq!(line.total_gst.paise(), 0);
        assert_eq!(line.total.paise(), 20_000);
    }

    #[test]
    fn test_totals_are_sum_of_lines() {
        let a = LineAmounts::compute(Money::from_paise(10_000), 2, GstRate::from_bps(1800));
        let b = LineAmounts::compute(Money::from_paise(333), 3, GstRate::from_bps(500));

        let mut totals = CartTotals::new();
        totals.add_line(2, &a);
        totals.add_line(3, &b);

        assert_eq!(totals.total_items, 5);
        assert_eq!(totals.subtotal, a.subtotal + b.subtotal);
        assert_eq!(totals.total_gst, a.total_gst + b.total_gst);
        assert_eq!(totals.grand_total, a.total + b.total);
        // Header invariants survive aggregation
        assert_eq!(totals.cgst, totals.sgst);
        assert_eq!(totals.total_gst, totals.cgst + totals.sgst);
        assert_eq!(totals.grand_total, totals.subtotal + totals.total_gst);
    }
}
