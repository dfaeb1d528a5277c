//! # Money Module
//!
//! Fixed-point monetary values and GST rates.
//!
//! ## Why Integer Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │  In floating point:                                                     │
//! │    0.1 + 0.2 = 0.30000000000000004  ❌ WRONG!                           │
//! │                                                                         │
//! │  OUR SOLUTION: Integer Paise                                            │
//! │    Rs 10.99 is stored as 1099. The database, the pricing math and       │
//! │    the invoice snapshots all use paise; only display formatting         │
//! │    ever produces a decimal point.                                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## GST split
//! A GST rate applies to a line subtotal and is split into two equal
//! halves, CGST and SGST. [`Money::gst_half`] computes one half with a
//! single half-up rounding so that `cgst == sgst` and
//! `total_gst == cgst + sgst` hold exactly, never "within epsilon".

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, AddAssign, Mul, Sub, SubAssign};

// =============================================================================
// Money
// =============================================================================

/// A monetary value in paise (1/100 rupee).
///
/// ## Design Decisions
/// - **i64 (signed)**: room for every realistic invoice total; signed so
///   arithmetic intermediate values can go negative without surprises
/// - **Single-field tuple struct**: zero-cost abstraction over i64
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from paise.
    ///
    /// ```rust
    /// use gstbill_core::money::Money;
    ///
    /// let price = Money::from_paise(1099); // Rs 10.99
    /// assert_eq!(price.paise(), 1099);
    /// ```
    #[inline]
    pub const fn from_paise(paise: i64) -> Self {
        Money(paise)
    }

    /// Creates a Money value from rupees and paise.
    ///
    /// For negative amounts only the rupee part carries the sign:
    /// `from_rupees(-5, 50)` is -Rs 5.50.
    #[inline]
    pub const fn from_rupees(rupees: i64, paise: i64) -> Self {
        if rupees < 0 {
            Money(rupees * 100 - paise)
        } else {
            Money(rupees * 100 + paise)
        }
    }

    /// Returns the value in paise.
    #[inline]
    pub const fn paise(&self) -> i64 {
        self.0
    }

    /// Returns the whole-rupee portion.
    #[inline]
    pub const fn rupees(&self) -> i64 {
        self.0 / 100
    }

    /// Returns the paise portion (always 0-99).
    #[inline]
    pub const fn paise_part(&self) -> i64 {
        (self.0 % 100).abs()
    }

    /// Zero money value.
    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Multiplies a unit price by a quantity to get a line subtotal.
    ///
    /// ```rust
    /// use gstbill_core::money::Money;
    ///
    /// let unit_price = Money::from_paise(29900);
    /// assert_eq!(unit_price.multiply_quantity(3).paise(), 89700);
    /// ```
    #[inline]
    pub const fn multiply_quantity(&self, qty: i64) -> Self {
        Money(self.0 * qty)
    }

    /// Computes one half of the GST due on this amount (the CGST or,
    /// identically, the SGST share).
    ///
    /// ## Rounding
    /// The exact half is `amount × bps / 20_000`. We compute it in i128
    /// with half-up rounding, and round **once**: the caller sets
    /// `sgst = cgst` and `total_gst = cgst + sgst`, so the two halves are
    /// equal by construction and the total is their exact sum.
    ///
    /// ```rust
    /// use gstbill_core::money::{GstRate, Money};
    ///
    /// let subtotal = Money::from_paise(20_000); // Rs 200.00
    /// let half = subtotal.gst_half(GstRate::from_bps(1800)); // 18%
    /// assert_eq!(half.paise(), 1800); // Rs 18.00 CGST (and SGST)
    /// ```
    pub fn gst_half(&self, rate: GstRate) -> Money {
        // i128 to prevent overflow on large amounts
        let half = (self.0 as i128 * rate.bps() as i128 + 10_000) / 20_000;
        Money::from_paise(half as i64)
    }
}

/// Debug-friendly display. Transport layers format for locale themselves.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(f, "{}Rs {}.{:02}", sign, self.rupees().abs(), self.paise_part())
    }
}

impl Add for Money {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Money(self.0 + other.0)
    }
}

impl AddAssign for Money {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        self.0 += other.0;
    }
}

impl Sub for Money {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Money(self.0 - other.0)
    }
}

impl SubAssign for Money {
    #[inline]
    fn sub_assign(&mut self, other: Self) {
        self.0 -= other.0;
    }
}

impl Mul<i64> for Money {
    type Output = Self;

    #[inline]
    fn mul(self, qty: i64) -> Self {
        Money(self.0 * qty)
    }
}

// =============================================================================
// GstRate
// =============================================================================

/// A GST rate in basis points (1 bps = 0.01%).
///
/// 1800 bps = 18%, the common rate for general goods. Basis points keep
/// fractional percentage rates (e.g. 0.25%) in integer arithmetic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GstRate(u32);

impl GstRate {
    /// The highest representable rate: 100%.
    pub const MAX_BPS: u32 = 10_000;

    /// Creates a rate from basis points.
    #[inline]
    pub const fn from_bps(bps: u32) -> Self {
        GstRate(bps)
    }

    /// Creates a rate from a percentage (display convenience).
    pub fn from_percent(pct: f64) -> Self {
        GstRate((pct * 100.0).round() as u32)
    }

    /// Returns the rate in basis points.
    #[inline]
    pub const fn bps(&self) -> u32 {
        self.0
    }

    /// Returns the rate as a percentage (for display only).
    #[inline]
    pub fn percent(&self) -> f64 {
        self.0 as f64 / 100.0
    }

    /// Zero rate (tax-exempt).
    #[inline]
    pub const fn zero() -> Self {
        GstRate(0)
    }

    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }
}

impl Default for GstRate {
    fn default() -> Self {
        GstRate::zero()
    }
}

impl fmt::Display for GstRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0 % 100 == 0 {
            write!(f, "{}%", self.0 / 100)
        } else {
            write!(f, "{:.2}%", self.percent())
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_paise() {
        let money = Money::from_paise(1099);
        assert_eq!(money.paise(), 1099);
        assert_eq!(money.rupees(), 10);
        assert_eq!(money.paise_part(), 99);
    }

    #[test]
    fn test_from_rupees() {
        assert_eq!(Money::from_rupees(10, 99).paise(), 1099);
        assert_eq!(Money::from_rupees(-5, 50).paise(), -550);
    }

    #[test]
    fn test_display() {
        assert_eq!(format!("{}", Money::from_paise(1099)), "Rs 10.99");
        assert_eq!(format!("{}", Money::from_paise(500)), "Rs 5.00");
        assert_eq!(format!("{}", Money::from_paise(-550)), "-Rs 5.50");
    }

    #[test]
    fn test_arithmetic() {
        let a = Money::from_paise(1000);
        let b = Money::from_paise(500);

        assert_eq!((a + b).paise(), 1500);
        assert_eq!((a - b).paise(), 500);
        assert_eq!((a * 3).paise(), 3000);
        assert_eq!(a.multiply_quantity(4).paise(), 4000);
    }

    #[test]
    fn test_gst_half_exact() {
        // Rs 200.00 at 18% -> total GST Rs 36.00, halves Rs 18.00
        let subtotal = Money::from_paise(20_000);
        let half = subtotal.gst_half(GstRate::from_bps(1800));
        assert_eq!(half.paise(), 1800);
    }

    #[test]
    fn test_gst_half_rounding() {
        // Rs 1.00 at 18% -> raw GST 18 paise, exact half 9 paise
        assert_eq!(Money::from_paise(100).gst_half(GstRate::from_bps(1800)).paise(), 9);

        // Rs 0.99 at 5% -> raw GST 4.95 paise, half 2.475 -> rounds to 2
        assert_eq!(Money::from_paise(99).gst_half(GstRate::from_bps(500)).paise(), 2);

        // Half-up boundary: 100 paise at 1% -> raw 1 paise, half 0.5 -> 1
        assert_eq!(Money::from_paise(100).gst_half(GstRate::from_bps(100)).paise(), 1);
    }

    #[test]
    fn test_gst_halves_always_equal() {
        // The split invariant: both halves come from the same rounding,
        // so cgst == sgst for any amount and rate.
        for paise in [1, 33, 99, 12345, 99999] {
            for bps in [0, 50, 500, 1200, 1800, 2800] {
                let amount = Money::from_paise(paise);
                let rate = GstRate::from_bps(bps);
                assert_eq!(amount.gst_half(rate), amount.gst_half(rate));
            }
        }
    }

    #[test]
    fn test_gst_rate_display() {
        assert_eq!(format!("{}", GstRate::from_bps(1800)), "18%");
        assert_eq!(format!("{}", GstRate::from_bps(25)), "0.25%");
    }

    #[test]
    fn test_gst_rate_from_percent() {
        assert_eq!(GstRate::from_percent(18.0).bps(), 1800);
        assert_eq!(GstRate::from_percent(0.25).bps(), 25);
    }
}
