//! # Billing Repository
//!
//! The primary ledger billing engine: the atomic cart → invoice
//! transaction, invoice reads, and the status toggle.
//!
//! ## The Billing Transaction
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  BEGIN                                                                  │
//! │    1. re-read the cart (joined with products/variants)                  │
//! │    2. reject: empty cart, inactive product, short stock                 │
//! │    3. allocate the next invoice number for today (read inside tx)       │
//! │    4. insert header + snapshot lines                                    │
//! │    5. guarded stock decrement per line (.. AND stock >= ?)              │
//! │    6. delete the cart lines                                             │
//! │  COMMIT        (any failure above rolls everything back)                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The number allocation reads the highest number already issued today.
//! A unique index over (invoice_number, issuing day) backstops it; on a
//! collision the whole transaction is retried (up to 3 attempts). The
//! index is day-scoped because the sequence resets daily while the
//! number text only encodes year+month, so the same number legitimately
//! recurs on later days of the month.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{QueryBuilder, Sqlite, SqliteConnection, SqlitePool};
use tracing::{info, warn};
use uuid::Uuid;

use gstbill_core::error::DomainError;
use gstbill_core::numbering::{
    format_invoice_number, next_sequence, BillingPeriod, PRIMARY_PREFIX,
};
use gstbill_core::pricing::CartTotals;
use gstbill_core::types::{CustomerInfo, Invoice, InvoiceLine, InvoiceStatus, PaymentMode};
use gstbill_core::validation::validate_customer;

use crate::error::{DbError, DbResult};
use crate::repository::cart::{CartLineDetail, LINE_DETAIL_SELECT};

// =============================================================================
// Read Models
// =============================================================================

/// An invoice header with its snapshot lines.
#[derive(Debug, Clone, Serialize)]
pub struct InvoiceDetail {
    pub invoice: Invoice,
    pub lines: Vec<InvoiceLine>,
}

/// Aggregate over a *filtered* invoice listing, computed from exactly
/// the rows returned, not the whole table.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct InvoiceSummary {
    pub count: i64,
    pub subtotal_paise: i64,
    pub cgst_paise: i64,
    pub sgst_paise: i64,
    pub total_gst_paise: i64,
    pub grand_total_paise: i64,
}

impl InvoiceSummary {
    fn from_rows(rows: &[Invoice]) -> Self {
        let mut summary = InvoiceSummary::default();
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

/// A filtered listing plus its summary.
#[derive(Debug, Clone, Serialize)]
pub struct InvoiceList {
    pub summary: InvoiceSummary,
    pub invoices: Vec<Invoice>,
}

/// Sortable columns for invoice listings. A closed enum, never raw SQL
/// from the caller.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortKey {
    #[default]
    CreatedAt,
    GrandTotal,
    InvoiceNumber,
}

impl SortKey {
    fn column(self) -> &'static str {
        match self {
            SortKey::CreatedAt => "created_at",
            SortKey::GrandTotal => "grand_total_paise",
            SortKey::InvoiceNumber => "invoice_number",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortDir {
    Asc,
    #[default]
    Desc,
}

impl SortDir {
    fn keyword(self) -> &'static str {
        match self {
            SortDir::Asc => "ASC",
            SortDir::Desc => "DESC",
        }
    }
}

/// Invoice listing filter. All criteria combine with AND.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct InvoiceFilter {
    /// Case-insensitive substring match on invoice number, customer
    /// name, or customer contact.
    pub search: Option<String>,
    pub payment_mode: Option<PaymentMode>,
    pub status: Option<InvoiceStatus>,
    #[serde(default)]
    pub sort: SortKey,
    #[serde(default)]
    pub dir: SortDir,
}

// =============================================================================
// Number Allocation
// =============================================================================

/// Highest-number-then-increment, inside the caller's transaction.
///
/// `ORDER BY length(...) DESC` keeps widened numbers (`-10000`) sorting
/// above four-digit ones, which plain text ordering would not.
pub(crate) async fn next_invoice_number(
    tx: &mut SqliteConnection,
    table: &str,
    prefix: &str,
    period: BillingPeriod,
    at: DateTime<Utc>,
) -> DbResult<String> {
    let (start, end) = period.bounds(at);
    let sql = format!(
        "SELECT invoice_number FROM {table}
         WHERE created_at >= ? AND created_at < ?
         ORDER BY length(invoice_number) DESC, invoice_number DESC
         LIMIT 1"
    );
    let last: Option<String> = sqlx::query_scalar(&sql)
        .bind(start)
        .bind(end)
        .fetch_optional(&mut *tx)
        .await?;

    Ok(format_invoice_number(prefix, at, next_sequence(last.as_deref())))
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for primary ledger invoices.
#[derive(Debug, Clone)]
pub struct BillingRepository {
    pool: SqlitePool,
}

impl BillingRepository {
    pub fn new(pool: SqlitePool) -> Self {
        BillingRepository { pool }
    }

    /// Converts the actor's cart into an invoice.
    ///
    /// All-or-nothing: on any failure no invoice exists, no stock moved,
    /// and the cart is untouched. Retried as a whole (up to 3 times)
    /// when two writers race for the same invoice number.
    pub async fn create_invoice(
        &self,
        actor_id: &str,
        customer: &CustomerInfo,
        payment_mode: PaymentMode,
    ) -> DbResult<InvoiceDetail> {
        validate_customer(customer)?;

        let mut last_err = DbError::Timeout("invoice number allocation".to_string());
        for attempt in 1..=3 {
            match self.try_create(actor_id, customer, payment_mode).await {
                Ok(invoice_id) => {
                    let detail = self.get(&invoice_id).await?;
                    info!(
                        actor_id,
                        invoice_number = %detail.invoice.invoice_number,
                        grand_total = %detail.invoice.grand_total(),
                        "invoice created"
                    );
                    return Ok(detail);
                }
                Err(err) if err.is_unique_violation_on("invoice_number") => {
                    warn!(attempt, "invoice number collision, retrying");
                    last_err = err;
                }
                Err(err) => return Err(err),
            }
        }
        Err(last_err)
    }

    /// One attempt at the billing transaction. Returns the new invoice id.
    async fn try_create(
        &self,
        actor_id: &str,
        customer: &CustomerInfo,
        payment_mode: PaymentMode,
    ) -> DbResult<String> {
        let mut tx = self.pool.begin().await?;

        // 1. Re-read the cart inside the transaction.
        let sql = format!("{LINE_DETAIL_SELECT} WHERE cl.actor_id = ? ORDER BY cl.created_at");
        let lines: Vec<CartLineDetail> = sqlx::query_as(&sql)
            .bind(actor_id)
            .fetch_all(&mut *tx)
            .await?;

        if lines.is_empty() {
            return Err(DomainError::invalid_input(
                "Cart is empty; add products before creating an invoice",
            )
            .into());
        }

        // 2. Every line must be billable, and each failure names the line.
        for line in &lines {
            if !line.is_available() {
                return Err(
                    DomainError::unavailable("Product", line.display_name()).into()
                );
            }
            if line.effective_stock() < line.quantity {
                return Err(DomainError::InsufficientStock {
                    name: line.display_name(),
                    available: line.effective_stock(),
                    requested: line.quantity,
                }
                .into());
            }
        }

        // 3. Allocate today's next number; the read shares this
        //    transaction with the insert below.
        let now = Utc::now();
        let invoice_number =
            next_invoice_number(&mut tx, "invoices", PRIMARY_PREFIX, BillingPeriod::Daily, now)
                .await?;

        let mut totals = CartTotals::new();
        let computed: Vec<_> = lines
            .iter()
            .map(|line| {
                let amounts = line.amounts();
                totals.add_line(line.quantity, &amounts);
                (line, amounts)
            })
            .collect();

        // 4. Header, then snapshot lines.
        let invoice_id = Uuid::new_v4().to_string();
        sqlx::query(
            "INSERT INTO invoices
                 (id, invoice_number, customer_name, customer_address, customer_contact,
                  payment_mode, subtotal_paise, cgst_paise, sgst_paise, total_gst_paise,
                  grand_total_paise, status, created_by, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&invoice_id)
        .bind(&invoice_number)
        .bind(customer.name.trim())
        .bind(&customer.address)
        .bind(customer.contact.trim())
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
                "INSERT INTO invoice_lines
                     (id, invoice_id, product_id, variant_id, name_snapshot, sku_snapshot,
                      unit_snapshot, variant_snapshot, unit_price_paise, gst_rate_bps,
                      quantity, subtotal_paise, cgst_paise, sgst_paise, total_gst_paise,
                      total_paise, created_at)
                 VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
            )
            .bind(Uuid::new_v4().to_string())
            .bind(&invoice_id)
            .bind(&line.product_id)
            .bind(&line.variant_id)
            .bind(&line.product_name)
            .bind(line.effective_sku())
            .bind(&line.unit)
            .bind(line.variant_label())
            .bind(line.effective_price_paise())
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

            // 5. Guarded decrement. The `stock >= ?` clause backstops
            //    the check in step 2 against anything that slipped in
            //    between read and write.
            let result = match &line.variant_id {
                Some(variant_id) => {
                    sqlx::query(
                        "UPDATE product_variants
                         SET stock = stock - ?, updated_at = ?
                         WHERE id = ? AND stock >= ?",
                    )
                    .bind(line.quantity)
                    .bind(now)
                    .bind(variant_id)
                    .bind(line.quantity)
                    .execute(&mut *tx)
                    .await?
                }
                None => {
                    sqlx::query(
                        "UPDATE products
                         SET stock = stock - ?, updated_at = ?
                         WHERE id = ? AND stock >= ?",
                    )
                    .bind(line.quantity)
                    .bind(now)
                    .bind(&line.product_id)
                    .bind(line.quantity)
                    .execute(&mut *tx)
                    .await?
                }
            };
            if result.rows_affected() == 0 {
                return Err(DomainError::InsufficientStock {
                    name: line.display_name(),
                    available: line.effective_stock(),
                    requested: line.quantity,
                }
                .into());
            }
        }

        // 6. The cart is consumed by billing.
        sqlx::query("DELETE FROM cart_lines WHERE actor_id = ?")
            .bind(actor_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(invoice_id)
    }

    /// Fetches an invoice with its lines.
    pub async fn get(&self, id: &str) -> DbResult<InvoiceDetail> {
        let invoice: Invoice = sqlx::query_as("SELECT * FROM invoices WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DbError::not_found("Invoice", id))?;

        let lines: Vec<InvoiceLine> = sqlx::query_as(
            "SELECT * FROM invoice_lines WHERE invoice_id = ? ORDER BY rowid",
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await?;

        Ok(InvoiceDetail { invoice, lines })
    }

    /// Looks an invoice up by number. Numbers recur across days, so the
    /// most recently issued match wins.
    pub async fn get_by_number(&self, invoice_number: &str) -> DbResult<InvoiceDetail> {
        let id: Option<String> = sqlx::query_scalar(
            "SELECT id FROM invoices WHERE invoice_number = ?
             ORDER BY created_at DESC LIMIT 1",
        )
        .bind(invoice_number)
        .fetch_optional(&self.pool)
        .await?;
        match id {
            Some(id) => self.get(&id).await,
            None => Err(DbError::not_found("Invoice", invoice_number)),
        }
    }

    /// Lists invoices matching the filter, with a summary computed from
    /// the filtered rows.
    pub async fn list(&self, filter: &InvoiceFilter) -> DbResult<InvoiceList> {
        let mut qb: QueryBuilder<Sqlite> =
            QueryBuilder::new("SELECT * FROM invoices WHERE 1 = 1");

        if let Some(search) = filter.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            qb.push(" AND (instr(lower(invoice_number), lower(")
                .push_bind(search.to_string())
                .push(")) > 0 OR instr(lower(customer_name), lower(")
                .push_bind(search.to_string())
                .push(")) > 0 OR instr(lower(customer_contact), lower(")
                .push_bind(search.to_string())
                .push(")) > 0)");
        }
        if let Some(payment_mode) = filter.payment_mode {
            qb.push(" AND payment_mode = ").push_bind(payment_mode);
        }
        if let Some(status) = filter.status {
            qb.push(" AND status = ").push_bind(status);
        }
        qb.push(" ORDER BY ")
            .push(filter.sort.column())
            .push(" ")
            .push(filter.dir.keyword());

        let invoices = qb.build_query_as::<Invoice>().fetch_all(&self.pool).await?;
        let summary = InvoiceSummary::from_rows(&invoices);
        Ok(InvoiceList { summary, invoices })
    }

    /// Disables or re-enables an invoice. Repeating the current state is
    /// a conflict, not a no-op.
    pub async fn set_status(&self, id: &str, target: InvoiceStatus) -> DbResult<Invoice> {
        let mut invoice: Invoice = sqlx::query_as("SELECT * FROM invoices WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DbError::not_found("Invoice", id))?;

        invoice.status = invoice.status.transition(target)?;
        invoice.updated_at = Utc::now();

        sqlx::query("UPDATE invoices SET status = ?, updated_at = ? WHERE id = ?")
            .bind(invoice.status)
            .bind(invoice.updated_at)
            .bind(id)
            .execute(&self.pool)
            .await?;

        info!(invoice_number = %invoice.invoice_number, status = ?invoice.status, "invoice status changed");
        Ok(invoice)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
