//! # Invoice Numbering
//!
//! Human-readable invoice numbers with a per-period sequence.
//!
//! ## Format
//! ```text
//! <PREFIX><YY><MM>-<NNNN>
//!
//! INV2608-0001   primary ledger, resets at midnight (daily period)
//! SL2608-0137    SL ledger, resets on the 1st (monthly period)
//! ```
//!
//! The sequence is zero-padded to four digits and **widens** past 9999
//! (`INV2608-10000`); it never wraps. The next value is derived from the
//! highest existing number in the current period; that read and the
//! subsequent insert must share one transaction (see the billing
//! repository), which is why everything here is a pure function over
//! already-fetched data.

use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

/// Number prefix for the primary catalog ledger.
pub const PRIMARY_PREFIX: &str = "INV";

/// Number prefix for the SL ledger.
pub const SL_PREFIX: &str = "SL";

// =============================================================================
// Billing Period
// =============================================================================

/// The window within which an invoice sequence counts up before
/// resetting to 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BillingPeriod {
    /// Resets at midnight (UTC). Used by the primary ledger.
    Daily,
    /// Resets on the first of the month (UTC). Used by the SL ledger.
    Monthly,
}

impl BillingPeriod {
    /// Returns the half-open `[start, end)` bounds of the period
    /// containing `at`.
    pub fn bounds(&self, at: DateTime<Utc>) -> (DateTime<Utc>, DateTime<Utc>) {
        let date = at.date_naive();
        match self {
            BillingPeriod::Daily => {
                let start = Utc.from_utc_datetime(&date.and_time(NaiveTime::MIN));
                (start, start + Duration::days(1))
            }
            BillingPeriod::Monthly => {
                // Day 1 is valid for every month; fall back to `date`
                // only to keep this total.
                let first = date.with_day(1).unwrap_or(date);
                let (next_y, next_m) = if date.month() == 12 {
                    (date.year() + 1, 1)
                } else {
                    (date.year(), date.month() + 1)
                };
                let next_first = NaiveDate::from_ymd_opt(next_y, next_m, 1).unwrap_or(first);
                (
                    Utc.from_utc_datetime(&first.and_time(NaiveTime::MIN)),
                    Utc.from_utc_datetime(&next_first.and_time(NaiveTime::MIN)),
                )
            }
        }
    }
}

// =============================================================================
// Number Formatting / Parsing
// =============================================================================

/// Formats an invoice number: `<PREFIX><YY><MM>-<NNNN>`.
///
/// ```rust
/// use chrono::{TimeZone, Utc};
/// use gstbill_core::numbering::format_invoice_number;
///
/// let at = Utc.with_ymd_and_hms(2026, 8, 25, 10, 0, 0).unwrap();
/// assert_eq!(format_invoice_number("INV", at, 7), "INV2608-0007");
/// assert_eq!(format_invoice_number("SL", at, 12345), "SL2608-12345");
/// ```
pub fn format_invoice_number(prefix: &str, at: DateTime<Utc>, sequence: u32) -> String {
    format!(
        "{}{:02}{:02}-{:04}",
        prefix,
        at.year() % 100,
        at.month(),
        sequence
    )
}

/// Extracts the numeric suffix of an invoice number
/// (`INV2608-0042` -> `42`).
pub fn parse_sequence(number: &str) -> Option<u32> {
    number.split('-').nth(1)?.parse().ok()
}

/// The sequence for the next invoice given the highest number already
/// issued in the current period (1 when the period is empty).
///
/// An unparseable number is treated as absent rather than poisoning the
/// whole ledger.
pub fn next_sequence(last: Option<&str>) -> u32 {
    last.and_then(parse_sequence).map_or(1, |seq| seq + 1)
}

// =============================================================================
// Unit Tests
// =============================================================================
