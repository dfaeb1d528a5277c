//! # SL Ledger Repositories
//!
//! The parallel "SL" ledger: free-form cart lines (no catalog, no
//! stock) and monthly-numbered `SL` invoices.
//!
//! ## Differences from the primary ledger
//! ```text
//! ┌───────────────────┬──────────────────────┬───────────────────────────┐
//! │                   │ Primary              │ SL                        │
//! ├───────────────────┼──────────────────────┼───────────────────────────┤
//! │ cart lines        │ product references   │ free-form name/price/rate │
//! │ totals            │ recomputed on read   │ persisted per mutation    │
//! │ exclusivity       │ catalog category     │ business line (category)  │
//! │ tax               │ product GST rate     │ policy: one line taxed,   │
//! │                   │                      │ the other forced to 0     │
//! │ numbering         │ INV…, daily          │ SL…, monthly              │
//! │ parties           │ customer (name+tel)  │ bill-to AND ship-to, all  │
//! │                   │                      │ fields required           │
//! │ stock             │ decremented          │ none                      │
//! └───────────────────┴──────────────────────┴───────────────────────────┘
//! ```

use chrono::Utc;
use serde::{Deserialize, Serialize};
use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use tracing::{info, warn};
use uuid::Uuid;

use gstbill_core::error::DomainError;
use gstbill_core::money::{GstRate, Money};
use gstbill_core::numbering::{BillingPeriod, SL_PREFIX};
use gstbill_core::pricing::{CartTotals, LineAmounts};
use gstbill_core::types::{
    InvoiceStatus, PaymentMode, SlCartLine, SlCategory, SlInvoice, SlInvoiceLine, SlLedgerConfig,
    SlParty,
};
use gstbill_core::validation::{
    validate_gst_rate_bps, validate_name, validate_price_paise, validate_quantity,
    validate_sl_party,
};

use crate::error::{DbError, DbResult};
use crate::repository::billing::next_invoice_number;

// =============================================================================
// Request / View Types
// =============================================================================

/// Input for adding a free-form SL cart line.
#[derive(Debug, Clone, Deserialize)]
pub struct SlAddLineRequest {
    pub category: SlCategory,
    pub product_name: String,
    pub unit_price_paise: i64,
    pub quantity: i64,
    /// Ignored (forced to 0) when `category` is the exempt line.
    pub gst_rate_bps: u32,
}

/// Partial update; `None` fields are left unchanged.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SlLinePatch {
    pub product_name: Option<String>,
    pub unit_price_paise: Option<i64>,
    pub quantity: Option<i64>,
    pub gst_rate_bps: Option<u32>,
}

/// SL cart totals. CGST/SGST are not split until billing; the cart
/// carries one GST figure per line.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct SlCartTotals {
    pub total_items: i64,
    pub subtotal_paise: i64,
    pub gst_paise: i64,
    pub grand_total_paise: i64,
}

/// A full SL cart read.
#[derive(Debug, Clone, Serialize)]
pub struct SlCartView {
    pub count: usize,
    pub category: Option<SlCategory>,
    pub totals: SlCartTotals,
    pub lines: Vec<SlCartLine>,
}

/// An SL invoice with its lines.
#[derive(Debug, Clone, Serialize)]
pub struct SlInvoiceDetail {
    pub invoice: SlInvoice,
    pub lines: Vec<SlInvoiceLine>,
}

/// Aggregate over a *filtered* SL invoice listing, computed from
/// exactly the rows returned, not the whole table.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct SlInvoiceSummary {
    pub count: i64,
    pub subtotal_paise: i64,
    pub cgst_paise: i64,
    pub sgst_paise: i64,
    pub total_gst_paise: i64,
    pub grand_total_paise: i64,
}

impl SlInvoiceSummary {
    fn from_rows(rows: &[SlInvoice]) -> Self {
        let mut summary = SlInvoiceSummary::default();
        for invoice in rows {
            summary.count += 1;
            summary.subtotal_paise += invoice.subtotal_paise;
            summary.cgst_paise += invoice.cgst_paise;
            summary.sgst_paise += invoice.sgst_paise;
            summary.total_gst_paise += invoice.total_gst_paise;
            summary.grand_total_paise += invoice.grand_total_paise;
        }
        summary
    }
}

/// A filtered SL listing plus its summary.
#[derive(Debug, Clone, Serialize)]
pub struct SlInvoiceList {
    pub summary: SlInvoiceSummary,
    pub invoices: Vec<SlInvoice>,
}

/// SL invoice listing filter.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SlInvoiceFilter {
    /// Case-insensitive substring match on invoice number or bill-to name.
    pub search: Option<String>,
    pub category: Option<SlCategory>,
    pub status: Option<InvoiceStatus>,
}

// =============================================================================
// SL Cart Repository
// =============================================================================

/// Repository for the SL cart. Carries the ledger's tax policy so the
/// exempt business line can never accumulate a GST figure.
#[derive(Debug, Clone)]
pub struct SlCartRepository {
    pool: SqlitePool,
    config: SlLedgerConfig,
}

impl SlCartRepository {
    pub fn new(pool: SqlitePool, config: SlLedgerConfig) -> Self {
        SlCartRepository { pool, config }
    }

    /// The GST rate a line is allowed to carry under the tax policy.
    fn effective_rate(&self, category: SlCategory, requested_bps: u32) -> u32 {
        if self.config.is_taxed(category) {
            requested_bps
        } else {
            0
        }
    }

    /// Adds a free-form line. The cart is exclusive to one business
    /// line; mixing is rejected naming both.
    pub async fn add_line(&self, actor_id: &str, req: SlAddLineRequest) -> DbResult<SlCartLine> {
        validate_name("Product name", &req.product_name)?;
        validate_price_paise(req.unit_price_paise)?;
        validate_quantity(req.quantity)?;
        validate_gst_rate_bps(req.gst_rate_bps)?;

        let in_cart: Option<SlCategory> =
            sqlx::query_scalar("SELECT category FROM sl_cart_lines WHERE actor_id = ? LIMIT 1")
                .bind(actor_id)
                .fetch_optional(&self.pool)
                .await?;
        if let Some(existing) = in_cart {
            if existing != req.category {
                return Err(DomainError::CategoryConflict {
                    in_cart: existing.to_string(),
                    attempted: req.category.to_string(),
                }
                .into());
            }
        }

        let rate_bps = self.effective_rate(req.category, req.gst_rate_bps);
        let amounts = LineAmounts::compute(
            Money::from_paise(req.unit_price_paise),
            req.quantity,
            GstRate::from_bps(rate_bps),
        );

        let id = Uuid::new_v4().to_string();
        let now = Utc::now();
        sqlx::query(
            "INSERT INTO sl_cart_lines
                 (id, actor_id, category, product_name, unit_price_paise, quantity,
                  gst_rate_bps, subtotal_paise, gst_amount_paise, total_paise,
                  created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&id)
        .bind(actor_id)
        .bind(req.category)
        .bind(req.product_name.trim())
        .bind(req.unit_price_paise)
        .bind(req.quantity)
        .bind(rate_bps)
        .bind(amounts.subtotal.paise())
        .bind(amounts.total_gst.paise())
        .bind(amounts.total.paise())
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await?;

        self.get_line(actor_id, &id).await
    }

    /// Applies a partial update and re-persists the money figures.
    pub async fn update_line(
        &self,
        actor_id: &str,
        line_id: &str,
        patch: SlLinePatch,
    ) -> DbResult<SlCartLine> {
        let mut line = self.get_line(actor_id, line_id).await?;

        if let Some(product_name) = patch.product_name {
            validate_name("Product name", &product_name)?;
            line.product_name = product_name.trim().to_string();
        }
        if let Some(unit_price_paise) = patch.unit_price_paise {
            validate_price_paise(unit_price_paise)?;
            line.unit_price_paise = unit_price_paise;
        }
        if let Some(quantity) = patch.quantity {
            validate_quantity(quantity)?;
            line.quantity = quantity;
        }
        if let Some(gst_rate_bps) = patch.gst_rate_bps {
            validate_gst_rate_bps(gst_rate_bps)?;
            line.gst_rate_bps = self.effective_rate(line.category, gst_rate_bps);
        }

        // Persisted figures are recomputed on every mutation.
        let amounts = LineAmounts::compute(
            Money::from_paise(line.unit_price_paise),
            line.quantity,
            GstRate::from_bps(line.gst_rate_bps),
        );
        line.subtotal_paise = amounts.subtotal.paise();
        line.gst_amount_paise = amounts.total_gst.paise();
        line.total_paise = amounts.total.paise();
        line.updated_at = Utc::now();

        sqlx::query(
            "UPDATE sl_cart_lines SET
                 product_name = ?, unit_price_paise = ?, quantity = ?, gst_rate_bps = ?,
                 subtotal_paise = ?, gst_amount_paise = ?, total_paise = ?, updated_at = ?
             WHERE id = ?",
        )
        .bind(&line.product_name)
        .bind(line.unit_price_paise)
        .bind(line.quantity)
        .bind(line.gst_rate_bps)
        .bind(line.subtotal_paise)
        .bind(line.gst_amount_paise)
        .bind(line.total_paise)
        .bind(line.updated_at)
        .bind(line_id)
        .execute(&self.pool)
        .await?;

        Ok(line)
    }

    pub async fn remove_line(&self, actor_id: &str, line_id: &str) -> DbResult<()> {
        let result = sqlx::query("DELETE FROM sl_cart_lines WHERE id = ? AND actor_id = ?")
            .bind(line_id)
            .bind(actor_id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(DbError::not_found("SL cart line", line_id));
        }
        Ok(())
    }

    pub async fn clear(&self, actor_id: &str) -> DbResult<()> {
        sqlx::query("DELETE FROM sl_cart_lines WHERE actor_id = ?")
            .bind(actor_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Reads the cart; totals are sums of the persisted line figures.
    pub async fn list(&self, actor_id: &str) -> DbResult<SlCartView> {
        let lines: Vec<SlCartLine> = sqlx::query_as(
            "SELECT * FROM sl_cart_lines WHERE actor_id = ? ORDER BY created_at",
        )
        .bind(actor_id)
        .fetch_all(&self.pool)
        .await?;

        let mut totals = SlCartTotals::default();
        for line in &lines {
            totals.total_items += line.quantity;
            totals.subtotal_paise += line.subtotal_paise;
            totals.gst_paise += line.gst_amount_paise;
            totals.grand_total_paise += line.total_paise;
        }

        Ok(SlCartView {
            count: lines.len(),
            category: lines.first().map(|l| l.category),
            totals,
            lines,
        })
    }

    async fn get_line(&self, actor_id: &str, line_id: &str) -> DbResult<SlCartLine> {
        sqlx::query_as::<_, SlCartLine>(
            "SELECT * FROM sl_cart_lines WHERE id = ? AND actor_id = ?",
        )
        .bind(line_id)
        .bind(actor_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| DbError::not_found("SL cart line", line_id))
    }
}

// =============================================================================
// SL Billing Repository
// =============================================================================

/// Repository for SL ledger invoices.
#[derive(Debug, Clone)]
pub struct SlBillingRepository {
    pool: SqlitePool,
}

impl SlBillingRepository {
    pub fn new(pool: SqlitePool) -> Self {
        SlBillingRepository { pool }
    }

    /// Converts the actor's SL cart into an SL invoice. Monthly `SL`
    /// numbering; both parties fully required; no stock involvement.
    pub async fn create_invoice(
        &self,
        actor_id: &str,
        bill_to: &SlParty,
        ship_to: &SlParty,
        payment_mode: PaymentMode,
    ) -> DbResult<SlInvoiceDetail> {
        validate_sl_party("Bill To", bill_to)?;
        validate_sl_party("Ship To", ship_to)?;

        let mut last_err = DbError::Timeout("invoice number allocation".to_string());
        for attempt in 1..=3 {
            match self.try_create(actor_id, bill_to, ship_to, payment_mode).await {
                Ok(invoice_id) => {
                    let detail = self.get(&invoice_id).await?;
                    info!(
                        actor_id,
                        invoice_number = %detail.invoice.invoice_number,
                        category = %detail.invoice.category,
                        "SL invoice created"
                    );
                    return Ok(detail);
                }
                Err(err) if err.is_unique_violation_on("invoice_number") => {
                    warn!(attempt, "SL invoice number collision, retrying");
                    last_err = err;
                }
                Err(err) => return Err(err),
            }
        }
        Err(last_err)
    }

    async fn try_create(
        &self,
        actor_id: &str,
        bill_to: &SlParty,
        ship_to: &SlParty,
        payment_mode: PaymentMode,
    ) -> DbResult<String> {
        let mut tx = self.pool.begin().await?;

        let lines: Vec<SlCartLine> = sqlx::query_as(
            "SELECT * FROM sl_cart_lines WHERE actor_id = ? ORDER BY created_at",
        )
        .bind(actor_id)
        .fetch_all(&mut *tx)
        .await?;

        if lines.is_empty() {
            return Err(DomainError::invalid_input(
                "SL cart is empty; add lines before creating an invoice",
            )
            .into());
        }
        // Exclusivity makes every line's category the cart's.
        let category = lines[0].category;

        let now = Utc::now();
        let invoice_number =
            next_invoice_number(&mut tx, "sl_invoices", SL_PREFIX, BillingPeriod::Monthly, now)
                .await?;

        // Rates were zeroed at cart time for the exempt line, so the
        // same split math serves both business lines.
        let mut totals = CartTotals::new();
        let computed: Vec<_> = lines
            .iter()
            .map(|line| {
                let amounts = LineAmounts::compute(
                    Money::from_paise(line.unit_price_paise),
                    line.quantity,
                    GstRate::from_bps(line.gst_rate_bps),
                );
                totals.add_line(line.quantity, &amounts);
                (line, amounts)
            })
            .collect();

        let invoice_id = Uuid::new_v4().to_string();
        sqlx::query(
            "INSERT INTO sl_invoices
                 (id, invoice_number, category,
                  bill_to_name, bill_to_address, bill_to_mobile,
                  ship_to_name, ship_to_address, ship_to_mobile,
                  payment_mode, subtotal_paise, cgst_paise, sgst_paise,
                  total_gst_paise, grand_total_paise, status, created_by,
                  created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&invoice_id)
        .bind(&invoice_number)
        .bind(category)
        .bind(bill_to.name.trim())
        .bind(bill_to.address.trim())
        .bind(bill_to.mobile.trim())
        .bind(ship_to.name.trim())
        .bind(ship_to.address.trim())
        .bind(ship_to.mobile.trim())
        .bind(payment_mode)
        .bind(totals.subtotal.paise())
        .bind(totals.cgst.paise())
        .bind(totals.sgst.paise())
        .bind(totals.total_gst.paise())
        .bind(totals.grand_total.paise())
        .bind(InvoiceStatus::Active)
        .bind(actor_id)
        .bind(now)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        for (line, amounts) in &computed {
            sqlx::query(
                "INSERT INTO sl_invoice_lines
                     (id, invoice_id, product_name, unit_price_paise, gst_rate_bps,
                      quantity, subtotal_paise, cgst_paise, sgst_paise,
                      total_gst_paise, total_paise, created_at)
                 VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
            )
            .bind(Uuid::new_v4().to_string())
            .bind(&invoice_id)
            .bind(&line.product_name)
            .bind(line.unit_price_paise)
            .bind(line.gst_rate_bps)
            .bind(line.quantity)
            .bind(amounts.subtotal.paise())
            .bind(amounts.cgst.paise())
            .bind(amounts.sgst.paise())
            .bind(amounts.total_gst.paise())
            .bind(amounts.total.paise())
            .bind(now)
            .execute(&mut *tx)
            .await?;
        }

        sqlx::query("DELETE FROM sl_cart_lines WHERE actor_id = ?")
            .bind(actor_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(invoice_id)
    }

    pub async fn get(&self, id: &str) -> DbResult<SlInvoiceDetail> {
        let invoice: SlInvoice = sqlx::query_as("SELECT * FROM sl_invoices WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DbError::not_found("SL invoice", id))?;

        let lines: Vec<SlInvoiceLine> = sqlx::query_as(
            "SELECT * FROM sl_invoice_lines WHERE invoice_id = ? ORDER BY rowid",
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await?;

        Ok(SlInvoiceDetail { invoice, lines })
    }

    /// Lists SL invoices matching the filter, newest first, with a
    /// summary computed from the filtered rows.
    pub async fn list(&self, filter: &SlInvoiceFilter) -> DbResult<SlInvoiceList> {
        let mut qb: QueryBuilder<Sqlite> =
            QueryBuilder::new("SELECT * FROM sl_invoices WHERE 1 = 1");

        if let Some(search) = filter.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            qb.push(" AND (instr(lower(invoice_number), lower(")
                .push_bind(search.to_string())
                .push(")) > 0 OR instr(lower(bill_to_name), lower(")
                .push_bind(search.to_string())
                .push(")) > 0)");
        }
        if let Some(category) = filter.category {
            qb.push(" AND category = ").push_bind(category);
        }
        if let Some(status) = filter.status {
            qb.push(" AND status = ").push_bind(status);
        }
        qb.push(" ORDER BY created_at DESC");

        let invoices = qb.build_query_as::<SlInvoice>().fetch_all(&self.pool).await?;
        let summary = SlInvoiceSummary::from_rows(&invoices);
        Ok(SlInvoiceList { summary, invoices })
    }

    /// Disables or re-enables an SL invoice; repeating the current
    /// state is a conflict.
    pub async fn set_status(&self, id: &str, target: InvoiceStatus) -> DbResult<SlInvoice> {
        let mut invoice: SlInvoice = sqlx::query_as("SELECT * FROM sl_invoices WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DbError::not_found("SL invoice", id))?;

        invoice.status = invoice.status.transition(target)?;
        invoice.updated_at = Utc::now();

        sqlx::query("UPDATE sl_invoices SET status = ?, updated_at = ? WHERE id = ?")
            .bind(invoice.status)
            .bind(invoice.updated_at)
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(invoice)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::testutil::{test_db, ACTOR};
    use gstbill_core::error::ErrorKind;

    fn party(name: &str) -> SlParty {
        SlParty {
            name: name.to_string(),
            address: "12 Market Rd".to_string(),
            mobile: "9876543210".to_string(),
        }
    }

    fn line(category: SlCategory, bps: u32) -> SlAddLineRequest {
        SlAddLineRequest {
            category,
            product_name: "Agarbatti Pack".to_string(),
            unit_price_paise: 10_000,
            quantity: 2,
            gst_rate_bps: bps,
        }
    }

    #[tokio::test]
    async fn test_taxed_line_carries_gst() {
        let db = test_db().await;
        let added = db
            .sl_cart()
            .add_line(ACTOR, line(SlCategory::Swasthik, 1800))
            .await
            .unwrap();

        assert_eq!(added.gst_rate_bps, 1800);
        assert_eq!(added.subtotal_paise, 20_000);
        assert_eq!(added.gst_amount_paise, 3_600);
        assert_eq!(added.total_paise, 23_600);
    }

    #[tokio::test]
    async fn test_exempt_line_forced_to_zero_rate() {
        let db = test_db().await;
        // Requested 18%, but laxmi is the exempt business line.
        let added = db
            .sl_cart()
            .add_line(ACTOR, line(SlCategory::Laxmi, 1800))
            .await
            .unwrap();

        assert_eq!(added.gst_rate_bps, 0);
        assert_eq!(added.gst_amount_paise, 0);
        assert_eq!(added.total_paise, 20_000);

        // And an update cannot smuggle a rate back in.
        let updated = db
            .sl_cart()
            .update_line(
                ACTOR,
                &added.id,
                SlLinePatch { gst_rate_bps: Some(2800), ..Default::default() },
            )
            .await
            .unwrap();
        assert_eq!(updated.gst_rate_bps, 0);
    }

    #[tokio::test]
    async fn test_business_lines_do_not_mix() {
        let db = test_db().await;
        db.sl_cart().add_line(ACTOR, line(SlCategory::Swasthik, 1800)).await.unwrap();

        let err = db
            .sl_cart()
            .add_line(ACTOR, line(SlCategory::Laxmi, 0))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::CategoryConflict);
        let msg = err.to_string();
        assert!(msg.contains("swasthik"));
        assert!(msg.contains("laxmi"));
    }

    #[tokio::test]
    async fn test_update_recomputes_persisted_figures() {
        let db = test_db().await;
        let added = db
            .sl_cart()
            .add_line(ACTOR, line(SlCategory::Swasthik, 1800))
            .await
            .unwrap();

        let updated = db
            .sl_cart()
            .update_line(
                ACTOR,
                &added.id,
                SlLinePatch { quantity: Some(5), ..Default::default() },
            )
            .await
            .unwrap();
        assert_eq!(updated.subtotal_paise, 50_000);
        assert_eq!(updated.gst_amount_paise, 9_000);
        assert_eq!(updated.total_paise, 59_000);

        // The stored row matches what was returned.
        let view = db.sl_cart().list(ACTOR).await.unwrap();
        assert_eq!(view.totals.grand_total_paise, 59_000);
    }

    #[tokio::test]
    async fn test_sl_invoice_full_cycle() {
        let db = test_db().await;
        db.sl_cart().add_line(ACTOR, line(SlCategory::Swasthik, 1800)).await.unwrap();

        let detail = db
            .sl_billing()
            .create_invoice(ACTOR, &party("Ravi"), &party("Ravi Depot"), PaymentMode::Cash)
            .await
            .unwrap();

        let invoice = &detail.invoice;
        assert!(invoice.invoice_number.starts_with("SL"));
        assert!(invoice.invoice_number.ends_with("-0001"));
        assert_eq!(invoice.category, SlCategory::Swasthik);
        assert_eq!(invoice.subtotal_paise, 20_000);
        assert_eq!(invoice.cgst_paise, 1_800);
        assert_eq!(invoice.sgst_paise, 1_800);
        assert_eq!(invoice.grand_total_paise, 23_600);
        assert_eq!(detail.lines.len(), 1);

        // Cart consumed.
        assert_eq!(db.sl_cart().list(ACTOR).await.unwrap().count, 0);
    }

    #[tokio::test]
    async fn test_sl_invoice_requires_both_parties() {
        let db = test_db().await;
        db.sl_cart().add_line(ACTOR, line(SlCategory::Swasthik, 1800)).await.unwrap();

        let incomplete = SlParty {
            name: "Ravi".to_string(),
            address: String::new(),
            mobile: "9876543210".to_string(),
        };
        let err = db
            .sl_billing()
            .create_invoice(ACTOR, &party("Ravi"), &incomplete, PaymentMode::Cash)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
        assert!(err.to_string().contains("Ship To"));
        // Cart untouched.
        assert_eq!(db.sl_cart().list(ACTOR).await.unwrap().count, 1);
    }

    #[tokio::test]
    async fn test_sl_empty_cart_rejected() {
        let db = test_db().await;
        let err = db
            .sl_billing()
            .create_invoice(ACTOR, &party("A"), &party("B"), PaymentMode::Cash)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
    }

    #[tokio::test]
    async fn test_monthly_sequence_and_category_filter() {
        let db = test_db().await;

        for _ in 0..2 {
            db.sl_cart().add_line(ACTOR, line(SlCategory::Swasthik, 1800)).await.unwrap();
            db.sl_billing()
                .create_invoice(ACTOR, &party("A"), &party("B"), PaymentMode::Upi)
                .await
                .unwrap();
        }
        db.sl_cart().add_line(ACTOR, line(SlCategory::Laxmi, 0)).await.unwrap();
        db.sl_billing()
            .create_invoice(ACTOR, &party("C"), &party("D"), PaymentMode::Cash)
            .await
            .unwrap();

        let all = db.sl_billing().list(&SlInvoiceFilter::default()).await.unwrap();
        assert_eq!(all.invoices.len(), 3);
        assert_eq!(all.summary.count, 3);
        // 2 taxed at 23_600 + 1 exempt at 20_000.
        assert_eq!(all.summary.grand_total_paise, 67_200);
        let mut numbers: Vec<_> =
            all.invoices.iter().map(|i| i.invoice_number.clone()).collect();
        numbers.sort();
        assert!(numbers[0].ends_with("-0001"));
        assert!(numbers[2].ends_with("-0003"));

        let laxmi_only = db
            .sl_billing()
            .list(&SlInvoiceFilter { category: Some(SlCategory::Laxmi), ..Default::default() })
            .await
            .unwrap();
        assert_eq!(laxmi_only.invoices.len(), 1);
        // Exempt line billed with zero GST throughout.
        assert_eq!(laxmi_only.invoices[0].total_gst_paise, 0);
        assert_eq!(laxmi_only.summary.total_gst_paise, 0);
    }

    #[tokio::test]
    async fn test_sl_status_toggle_conflict() {
        let db = test_db().await;
        db.sl_cart().add_line(ACTOR, line(SlCategory::Swasthik, 1800)).await.unwrap();
        let detail = db
            .sl_billing()
            .create_invoice(ACTOR, &party("A"), &party("B"), PaymentMode::Cash)
            .await
            .unwrap();

        let disabled = db
            .sl_billing()
            .set_status(&detail.invoice.id, InvoiceStatus::Disabled)
            .await
            .unwrap();
        assert_eq!(disabled.status, InvoiceStatus::Disabled);

        let err = db
            .sl_billing()
            .set_status(&detail.invoice.id, InvoiceStatus::Disabled)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Conflict);
    }

    #[tokio::test]
    async fn test_remove_and_clear() {
        let db = test_db().await;
        let added = db
            .sl_cart()
            .add_line(ACTOR, line(SlCategory::Swasthik, 1800))
            .await
            .unwrap();

        db.sl_cart().remove_line(ACTOR, &added.id).await.unwrap();
        let err = db.sl_cart().remove_line(ACTOR, &added.id).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
        db.sl_cart().clear(ACTOR).await.unwrap();
    }
}
