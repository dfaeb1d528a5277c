//! # Domain Types
//!
//! Entities for the catalog, cart, and both billing ledgers.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Catalog:   Category ─► SubCategory ─► Product ─► ProductVariant        │
//! │                                                                         │
//! │  Primary:   CartLine ──(createInvoice)──► Invoice + InvoiceLine         │
//! │                                           (snapshot fields, daily no.)  │
//! │                                                                         │
//! │  SL:        SlCartLine ─(createInvoice)─► SlInvoice + SlInvoiceLine     │
//! │                                           (free-form, monthly no.)      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Dual-Key Identity Pattern
//! Every entity has:
//! - `id`: UUID v4 string - immutable, used for relations
//! - a business key where one exists (SKU, invoice number) - human-readable
//!
//! Monetary fields are stored as `*_paise: i64` and GST rates as
//! `*_bps: u32`; accessor methods lift them into [`Money`] / [`GstRate`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::DomainError;
use crate::money::{GstRate, Money};

// =============================================================================
// Payment Mode
// =============================================================================

/// How an invoice was settled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "lowercase")]
pub enum PaymentMode {
    Cash,
    Card,
    Upi,
    Netbanking,
    Other,
}

impl PaymentMode {
    pub const ALL: [PaymentMode; 5] = [
        PaymentMode::Cash,
        PaymentMode::Card,
        PaymentMode::Upi,
        PaymentMode::Netbanking,
        PaymentMode::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMode::Cash => "cash",
            PaymentMode::Card => "card",
            PaymentMode::Upi => "upi",
            PaymentMode::Netbanking => "netbanking",
            PaymentMode::Other => "other",
        }
    }
}

impl Default for PaymentMode {
    fn default() -> Self {
        PaymentMode::Cash
    }
}

impl fmt::Display for PaymentMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaymentMode {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "cash" => Ok(PaymentMode::Cash),
            "card" => Ok(PaymentMode::Card),
            "upi" => Ok(PaymentMode::Upi),
            "netbanking" => Ok(PaymentMode::Netbanking),
            "other" => Ok(PaymentMode::Other),
            _ => Err(DomainError::invalid_input(
                "Invalid payment mode. Must be one of: cash, card, upi, netbanking, other",
            )),
        }
    }
}

// =============================================================================
// Invoice Status
// =============================================================================

/// Invoice lifecycle state. An invoice is immutable after creation except
/// for this flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "lowercase")]
pub enum InvoiceStatus {
    Active,
    Disabled,
}

impl InvoiceStatus {
    /// Validates a state change. Transitioning into the current state is
    /// a conflict, not a silent success: disabling an already-disabled
    /// invoice must tell the caller so.
    pub fn transition(self, target: InvoiceStatus) -> Result<InvoiceStatus, DomainError> {
        if self == target {
            let state = match self {
                InvoiceStatus::Active => "enabled",
                InvoiceStatus::Disabled => "disabled",
            };
            return Err(DomainError::conflict(format!("Invoice is already {state}")));
        }
        Ok(target)
    }
}

impl Default for InvoiceStatus {
    fn default() -> Self {
        InvoiceStatus::Active
    }
}

// =============================================================================
// Catalog
// =============================================================================

/// A top-level product grouping. Cannot be deleted while subcategories or
/// products reference it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Category {
    pub id: String,
    /// Unique display name.
    pub name: String,
    pub description: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A grouping within a category; name is unique per category.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct SubCategory {
    pub id: String,
    pub category_id: String,
    pub name: String,
    pub description: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A sellable product.
///
/// Stock is mutated only by the billing engine (decrement) and by
/// catalog restocking, never by the cart engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Product {
    pub id: String,
    pub category_id: String,
    pub sub_category_id: String,
    pub name: String,
    pub description: Option<String>,
    /// Stock Keeping Unit - globally unique business identifier.
    pub sku: String,
    /// HSN tax classification code, when known.
    pub hsn: Option<String>,
    /// Selling price in paise.
    pub price_paise: i64,
    /// Optional list ("actual") price in paise, for strike-through display.
    pub actual_price_paise: Option<i64>,
    /// GST rate in basis points (1800 = 18%).
    pub gst_rate_bps: u32,
    /// Current stock level; never negative.
    pub stock: i64,
    /// Unit of sale ("piece", "kg", ...).
    pub unit: String,
    /// Soft-delete flag.
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    #[inline]
    pub fn price(&self) -> Money {
        Money::from_paise(self.price_paise)
    }

    #[inline]
    pub fn gst_rate(&self) -> GstRate {
        GstRate::from_bps(self.gst_rate_bps)
    }
}

/// A product variant ("Weight: 20g"). Price and stock override the parent
/// product's for cart lines carrying this variant; the GST rate is always
/// inherited from the parent.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct ProductVariant {
    pub id: String,
    pub product_id: String,
    pub attribute_name: String,
    pub attribute_value: String,
    /// Globally unique across variants.
    pub sku: String,
    pub price_paise: i64,
    pub actual_price_paise: Option<i64>,
    pub stock: i64,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ProductVariant {
    #[inline]
    pub fn price(&self) -> Money {
        Money::from_paise(self.price_paise)
    }

    /// Display label, e.g. `Weight: 20g`.
    pub fn label(&self) -> String {
        format!("{}: {}", self.attribute_name, self.attribute_value)
    }
}

// =============================================================================
// Cart
// =============================================================================

/// One mutable cart line. At most one line exists per
/// (actor, product, variant) tuple; re-adding merges quantities.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct CartLine {
    pub id: String,
    pub actor_id: String,
    pub product_id: String,
    pub variant_id: Option<String>,
    pub quantity: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// =============================================================================
// Invoice
// =============================================================================

/// Customer identity captured on an invoice. Name and contact are
/// required; address is optional.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CustomerInfo {
    pub name: String,
    pub address: Option<String>,
    pub contact: String,
}

/// An immutable, sequentially-numbered, tax-computed invoice header.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Invoice {
    pub id: String,
    /// `INV<YY><MM>-<NNNN>`, unique, daily sequence.
    pub invoice_number: String,
    pub customer_name: String,
    pub customer_address: Option<String>,
    pub customer_contact: String,
    pub payment_mode: PaymentMode,
    pub subtotal_paise: i64,
    pub cgst_paise: i64,
    pub sgst_paise: i64,
    pub total_gst_paise: i64,
    pub grand_total_paise: i64,
    pub status: InvoiceStatus,
    /// Actor that created the invoice.
    pub created_by: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Invoice {
    #[inline]
    pub fn grand_total(&self) -> Money {
        Money::from_paise(self.grand_total_paise)
    }
}

/// One invoice line, frozen at billing time.
///
/// The `*_snapshot` fields copy product/variant data so later catalog
/// changes never alter historical invoices. Do not normalize this away.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct InvoiceLine {
    pub id: String,
    pub invoice_id: String,
    pub product_id: String,
    pub variant_id: Option<String>,
    /// Product name at billing time.
    pub name_snapshot: String,
    /// SKU (variant's, when present) at billing time.
    pub sku_snapshot: String,
    /// Unit of sale at billing time.
    pub unit_snapshot: String,
    /// Variant label ("Weight: 20g") at billing time, if any.
    pub variant_snapshot: Option<String>,
    /// Effective unit price (variant overrides product) at billing time.
    pub unit_price_paise: i64,
    /// Always the parent product's rate, even for variant lines.
    pub gst_rate_bps: u32,
    pub quantity: i64,
    pub subtotal_paise: i64,
    pub cgst_paise: i64,
    pub sgst_paise: i64,
    pub total_gst_paise: i64,
    pub total_paise: i64,
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// SL Ledger
// =============================================================================

/// The two business lines of the SL (second) ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "lowercase")]
pub enum SlCategory {
    Swasthik,
    Laxmi,
}

impl fmt::Display for SlCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SlCategory::Swasthik => f.write_str("swasthik"),
            SlCategory::Laxmi => f.write_str("laxmi"),
        }
    }
}

impl FromStr for SlCategory {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "swasthik" => Ok(SlCategory::Swasthik),
            "laxmi" => Ok(SlCategory::Laxmi),
            _ => Err(DomainError::invalid_input(
                "Invalid SL category. Must be swasthik or laxmi",
            )),
        }
    }
}

/// Per-ledger tax policy: which SL business line charges GST.
///
/// An explicit configuration flag, not a string match on the category
/// name, so renaming a business line cannot silently change tax
/// behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlLedgerConfig {
    /// The category that charges GST; the other is always exempt.
    pub taxed: SlCategory,
}

impl SlLedgerConfig {
    pub fn is_taxed(&self, category: SlCategory) -> bool {
        category == self.taxed
    }
}

impl Default for SlLedgerConfig {
    fn default() -> Self {
        SlLedgerConfig { taxed: SlCategory::Swasthik }
    }
}

/// A free-form SL cart line. Unlike the primary cart there is no catalog
/// reference: name, price and rate are entered directly, and the money
/// columns are recomputed and **persisted on every mutation**.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct SlCartLine {
    pub id: String,
    pub actor_id: String,
    pub category: SlCategory,
    pub product_name: String,
    pub unit_price_paise: i64,
    pub quantity: i64,
    /// Forced to 0 for the exempt category.
    pub gst_rate_bps: u32,
    pub subtotal_paise: i64,
    pub gst_amount_paise: i64,
    pub total_paise: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl SlCartLine {
    #[inline]
    pub fn unit_price(&self) -> Money {
        Money::from_paise(self.unit_price_paise)
    }
}

/// One party on an SL invoice (bill-to or ship-to). All fields required.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SlParty {
    pub name: String,
    pub address: String,
    pub mobile: String,
}

/// An SL ledger invoice header. Monthly numbering, `SL` prefix.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct SlInvoice {
    pub id: String,
    pub invoice_number: String,
    pub category: SlCategory,
    pub bill_to_name: String,
    pub bill_to_address: String,
    pub bill_to_mobile: String,
    pub ship_to_name: String,
    pub ship_to_address: String,
    pub ship_to_mobile: String,
    pub payment_mode: PaymentMode,
    pub subtotal_paise: i64,
    pub cgst_paise: i64,
    pub sgst_paise: i64,
    pub total_gst_paise: i64,
    pub grand_total_paise: i64,
    pub status: InvoiceStatus,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// An SL invoice line (snapshot of the free-form cart line).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct SlInvoiceLine {
    pub id: String,
    pub invoice_id: String,
    pub product_name: String,
    pub unit_price_paise: i64,
    pub gst_rate_bps: u32,
    pub quantity: i64,
    pub subtotal_paise: i64,
    pub cgst_paise: i64,
    pub sgst_paise: i64,
    pub total_gst_paise: i64,
    pub total_paise: i64,
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payment_mode_parse() {
        assert_eq!("cash".parse::<PaymentMode>().unwrap(), PaymentMode::Cash);
        assert_eq!(" UPI ".parse::<PaymentMode>().unwrap(), PaymentMode::Upi);
        assert!("cheque".parse::<PaymentMode>().is_err());
    }

    #[test]
    fn test_payment_mode_serde_lowercase() {
        let json = serde_json::to_string(&PaymentMode::Netbanking).unwrap();
        assert_eq!(json, "\"netbanking\"");
    }

    #[test]
    fn test_status_transition() {
        assert_eq!(
            InvoiceStatus::Active.transition(InvoiceStatus::Disabled).unwrap(),
            InvoiceStatus::Disabled
        );
        let err = InvoiceStatus::Active.transition(InvoiceStatus::Active).unwrap_err();
        assert!(err.to_string().contains("already enabled"));
        let err = InvoiceStatus::Disabled.transition(InvoiceStatus::Disabled).unwrap_err();
        assert!(err.to_string().contains("already disabled"));
    }

    #[test]
    fn test_sl_ledger_config_default() {
        let config = SlLedgerConfig::default();
        assert!(config.is_taxed(SlCategory::Swasthik));
        assert!(!config.is_taxed(SlCategory::Laxmi));
    }

    #[test]
    fn test_sl_ledger_config_is_configuration_not_name_match() {
        // Flipping the flag flips the policy without touching any names.
        let config = SlLedgerConfig { taxed: SlCategory::Laxmi };
        assert!(config.is_taxed(SlCategory::Laxmi));
        assert!(!config.is_taxed(SlCategory::Swasthik));
    }

    #[test]
    fn test_variant_label() {
        let variant = ProductVariant {
            id: "v1".to_string(),
            product_id: "p1".to_string(),
            attribute_name: "Weight".to_string(),
            attribute_value: "20g".to_string(),
            sku: "SKU-V1".to_string(),
            price_paise: 500,
            actual_price_paise: None,
            stock: 10,
            is_active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        assert_eq!(variant.label(), "Weight: 20g");
    }
}
