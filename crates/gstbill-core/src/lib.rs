//! # gstbill-core: Pure Business Logic for the Billing Back Office
//!
//! This crate is the **heart** of the system. It contains all billing
//! arithmetic and domain rules as pure functions with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        gstbill Architecture                             │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                 Transport layer (out of scope)                  │   │
//! │  │        HTTP routing, auth, uploads, email delivery              │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ gstbill-core (THIS CRATE) ★                     │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │   money   │  │  pricing  │  │ numbering │  │   types   │  │   │
//! │  │   │   Money   │  │LineAmounts│  │  periods  │  │ entities  │  │   │
//! │  │   │  GstRate  │  │ cart sums │  │ INV/SL no.│  │  states   │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                  gstbill-db (Database Layer)                    │   │
//! │  │         SQLite queries, migrations, repositories, the          │   │
//! │  │         cart→invoice transaction                               │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Principles
//!
//! 1. **Integer Money**: All monetary values are in paise (i64); GST rates
//!    are basis points (u32). No floating point anywhere in the math.
//! 2. **Explicit Errors**: All failures are typed variants of
//!    [`error::DomainError`], never strings or panics.
//! 3. **Snapshot fields**: invoice lines copy product data at billing time
//!    so historical invoices never change when the catalog does.

pub mod error;
pub mod money;
pub mod numbering;
pub mod pricing;
pub mod types;
pub mod validation;

pub use error::{ApiResponse, DomainError, ErrorKind};
pub use money::{GstRate, Money};
pub use pricing::{CartTotals, LineAmounts};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum quantity of a single cart line.
///
/// Prevents accidental over-ordering (e.g. typing 1000 instead of 10).
pub const MAX_LINE_QUANTITY: i64 = 999;

/// Stock level below which a product appears in the dashboard's
/// low-stock list.
pub const LOW_STOCK_THRESHOLD: i64 = 10;
