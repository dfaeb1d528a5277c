//! # gstbill-db: Database Layer
//!
//! SQLite persistence and the transactional engines for the retail
//! back office: catalog, carts, both billing ledgers, and the
//! dashboard aggregator.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          Data Flow                                      │
//! │                                                                         │
//! │  Caller (API handler, seed binary, tests)                               │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                   gstbill-db (THIS CRATE)                       │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌────────────────┐    ┌──────────────┐  │   │
//! │  │   │   Database    │    │  Repositories  │    │  Migrations  │  │   │
//! │  │   │   (pool.rs)   │◄───│  catalog/cart/ │    │  (embedded)  │  │   │
//! │  │   │               │    │  billing/sl/   │    │              │  │   │
//! │  │   │ SqlitePool    │    │  dashboard     │    │ 001_init.sql │  │   │
//! │  │   └───────────────┘    └────────────────┘    └──────────────┘  │   │
//! │  │                                                                 │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite database file (WAL mode)                                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`repository`] - Repository implementations
//!
//! ## Usage
//!
//! ```rust,ignore
//! use gstbill_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("path/to/gstbill.db")).await?;
//!
//! let cart = db.cart().list("admin-1").await?;
//! let invoice = db.billing().create_invoice("admin-1", &customer, mode).await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};

// Repository re-exports for convenience
pub use repository::billing::BillingRepository;
pub use repository::cart::CartRepository;
pub use repository::catalog::CatalogRepository;
pub use repository::dashboard::DashboardRepository;
pub use repository::product::ProductRepository;
pub use repository::sl::{SlBillingRepository, SlCartRepository};
pub use repository::variant::VariantRepository;
