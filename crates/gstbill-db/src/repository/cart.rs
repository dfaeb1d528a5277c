//! # Cart Repository
//!
//! The mutable staging area for the primary ledger.
//!
//! ## Rules
//! - One cart per actor; at most one line per (product, variant):
//!   re-adding merges quantities.
//! - Every line in a cart belongs to the same top-level category;
//!   mixing is rejected with both category names.
//! - Stock is *checked* here but never mutated; only the billing
//!   engine decrements stock.
//! - Totals are never stored. They are recomputed from current product
//!   prices on every read, so a price change between add and read is
//!   reflected immediately.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool};
use tracing::debug;
use uuid::Uuid;

use gstbill_core::error::DomainError;
use gstbill_core::money::{GstRate, Money};
use gstbill_core::pricing::{CartTotals, LineAmounts};
use gstbill_core::types::{CartLine, Product, ProductVariant};
use gstbill_core::validation::validate_quantity;

use crate::error::{DbError, DbResult};

// =============================================================================
// Request / View Types
// =============================================================================

/// Input for adding a product (optionally a specific variant) to a cart.
#[derive(Debug, Clone, Deserialize)]
pub struct AddLineRequest {
    pub product_id: String,
    pub variant_id: Option<String>,
    pub quantity: i64,
}

/// How to change a line's quantity.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuantityChange {
    /// Replace the quantity outright.
    Set(i64),
    /// Add one.
    Increment,
    /// Subtract one. Going below 1 is rejected; lines are removed
    /// explicitly, never as a side effect.
    Decrement,
}

/// One cart line joined with its product, category, and variant.
///
/// Column aliases in [`LINE_DETAIL_SELECT`] must match these field
/// names.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct CartLineDetail {
    pub id: String,
    pub actor_id: String,
    pub product_id: String,
    pub variant_id: Option<String>,
    pub quantity: i64,
    pub product_name: String,
    pub product_sku: String,
    pub unit: String,
    pub product_price_paise: i64,
    pub gst_rate_bps: u32,
    pub product_stock: i64,
    pub product_active: bool,
    pub category_id: String,
    pub category_name: String,
    pub attribute_name: Option<String>,
    pub attribute_value: Option<String>,
    pub variant_sku: Option<String>,
    pub variant_price_paise: Option<i64>,
    pub variant_stock: Option<i64>,
    pub variant_active: Option<bool>,
}

impl CartLineDetail {
    /// Variant price overrides product price.
    pub fn effective_price_paise(&self) -> i64 {
        self.variant_price_paise.unwrap_or(self.product_price_paise)
    }

    /// Variant stock overrides product stock.
    pub fn effective_stock(&self) -> i64 {
        self.variant_stock.unwrap_or(self.product_stock)
    }

    /// Variant SKU when present, else the product's.
    pub fn effective_sku(&self) -> &str {
        self.variant_sku.as_deref().unwrap_or(&self.product_sku)
    }

    /// "Weight: 20g" for variant lines.
    pub fn variant_label(&self) -> Option<String> {
        match (&self.attribute_name, &self.attribute_value) {
            (Some(name), Some(value)) => Some(format!("{name}: {value}")),
            _ => None,
        }
    }

    /// Product name, with the variant label appended for variant lines.
    pub fn display_name(&self) -> String {
        match self.variant_label() {
            Some(label) => format!("{} ({label})", self.product_name),
            None => self.product_name.clone(),
        }
    }

    /// Both the product and (when present) the variant must be active.
    pub fn is_available(&self) -> bool {
        self.product_active && self.variant_active.unwrap_or(true)
    }

    /// Tax-split amounts at current prices. The GST rate is always the
    /// parent product's, even for variant lines.
    pub fn amounts(&self) -> LineAmounts {
        LineAmounts::compute(
            Money::from_paise(self.effective_price_paise()),
            self.quantity,
            GstRate::from_bps(self.gst_rate_bps),
        )
    }
}

/// One line plus its computed amounts, as returned to callers.
#[derive(Debug, Clone, Serialize)]
pub struct CartLineView {
    #[serde(flatten)]
    pub line: CartLineDetail,
    pub amounts: LineAmounts,
}

/// The category every line in a cart shares.
#[derive(Debug, Clone, Serialize)]
pub struct CartCategory {
    pub id: String,
    pub name: String,
}

/// A full cart read: lines, shared category, and lazily computed totals.
#[derive(Debug, Clone, Serialize)]
pub struct CartView {
    pub count: usize,
    pub category: Option<CartCategory>,
    pub totals: CartTotals,
    pub lines: Vec<CartLineView>,
}

// Shared join used by every detail read (and by the billing engine,
// which re-reads the cart inside its transaction). LEFT JOIN keeps
// variant columns NULL for variant-less lines.
pub(crate) const LINE_DETAIL_SELECT: &str = "
    SELECT
        cl.id, cl.actor_id, cl.product_id, cl.variant_id, cl.quantity,
        p.name        AS product_name,
        p.sku         AS product_sku,
        p.unit        AS unit,
        p.price_paise AS product_price_paise,
        p.gst_rate_bps,
        p.stock       AS product_stock,
        p.is_active   AS product_active,
        p.category_id,
        c.name        AS category_name,
        v.attribute_name,
        v.attribute_value,
        v.sku         AS variant_sku,
        v.price_paise AS variant_price_paise,
        v.stock       AS variant_stock,
        v.is_active   AS variant_active
    FROM cart_lines cl
    JOIN products p   ON p.id = cl.product_id
    JOIN categories c ON c.id = p.category_id
    LEFT JOIN product_variants v ON v.id = cl.variant_id";

// =============================================================================
// Repository
// =============================================================================

/// Repository for the primary cart.
#[derive(Debug, Clone)]
pub struct CartRepository {
    pool: SqlitePool,
}

impl CartRepository {
    pub fn new(pool: SqlitePool) -> Self {
        CartRepository { pool }
    }

    /// Adds a product to the actor's cart, merging into an existing line
    /// for the same (product, variant) if one exists.
    ///
    /// Checks, in order: quantity bounds, product and variant existence
    /// and availability, category exclusivity, then stock against the
    /// *merged* quantity.
    pub async fn add_line(&self, actor_id: &str, req: AddLineRequest) -> DbResult<CartLineView> {
        validate_quantity(req.quantity)?;

        let product = self.fetch_product(&req.product_id).await?;
        if !product.is_active {
            return Err(DomainError::unavailable("Product", &product.name).into());
        }

        let variant = match &req.variant_id {
            Some(variant_id) => Some(self.fetch_variant(variant_id, &product).await?),
            None => None,
        };

        self.check_category_exclusivity(actor_id, &product).await?;

        let display_name = match &variant {
            Some(v) => format!("{} ({})", product.name, v.label()),
            None => product.name.clone(),
        };
        let available = variant.as_ref().map(|v| v.stock).unwrap_or(product.stock);

        // Merge with an existing line for the same (product, variant).
        let existing: Option<CartLine> = sqlx::query_as(
            "SELECT * FROM cart_lines
             WHERE actor_id = ? AND product_id = ? AND variant_id IS ?",
        )
        .bind(actor_id)
        .bind(&req.product_id)
        .bind(&req.variant_id)
        .fetch_optional(&self.pool)
        .await?;

        let line_id = match existing {
            Some(line) => {
                let merged = line.quantity + req.quantity;
                validate_quantity(merged)?;
                if available < merged {
                    return Err(DomainError::InsufficientStock {
                        name: display_name,
                        available,
                        requested: merged,
                    }
                    .into());
                }
                sqlx::query("UPDATE cart_lines SET quantity = ?, updated_at = ? WHERE id = ?")
                    .bind(merged)
                    .bind(Utc::now())
                    .bind(&line.id)
                    .execute(&self.pool)
                    .await?;
                line.id
            }
            None => {
                if available < req.quantity {
                    return Err(DomainError::InsufficientStock {
                        name: display_name,
                        available,
                        requested: req.quantity,
                    }
                    .into());
                }
                let id = Uuid::new_v4().to_string();
                let now = Utc::now();
                sqlx::query(
                    "INSERT INTO cart_lines
                         (id, actor_id, product_id, variant_id, quantity, created_at, updated_at)
                     VALUES (?, ?, ?, ?, ?, ?, ?)",
                )
                .bind(&id)
                .bind(actor_id)
                .bind(&req.product_id)
                .bind(&req.variant_id)
                .bind(req.quantity)
                .bind(now)
                .bind(now)
                .execute(&self.pool)
                .await?;
                id
            }
        };

        debug!(actor_id, line_id = %line_id, "cart line added");
        self.get_line(&line_id).await
    }

    /// Changes a line's quantity. Decrementing below 1 is rejected.
    pub async fn update_line(
        &self,
        actor_id: &str,
        line_id: &str,
        change: QuantityChange,
    ) -> DbResult<CartLineView> {
        let line: CartLine = sqlx::query_as(
            "SELECT * FROM cart_lines WHERE id = ? AND actor_id = ?",
        )
        .bind(line_id)
        .bind(actor_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| DbError::not_found("Cart line", line_id))?;

        let new_quantity = match change {
            QuantityChange::Set(quantity) => quantity,
            QuantityChange::Increment => line.quantity + 1,
            QuantityChange::Decrement => line.quantity - 1,
        };
        if new_quantity < 1 {
            return Err(DomainError::invalid_input(
                "Quantity cannot go below 1; remove the line instead",
            )
            .into());
        }
        validate_quantity(new_quantity)?;

        let detail = self.get_line(&line.id).await?.line;
        if !detail.is_available() {
            return Err(DomainError::unavailable("Product", detail.display_name()).into());
        }
        if detail.effective_stock() < new_quantity {
            return Err(DomainError::InsufficientStock {
                name: detail.display_name(),
                available: detail.effective_stock(),
                requested: new_quantity,
            }
            .into());
        }

        sqlx::query("UPDATE cart_lines SET quantity = ?, updated_at = ? WHERE id = ?")
            .bind(new_quantity)
            .bind(Utc::now())
            .bind(&line.id)
            .execute(&self.pool)
            .await?;

        self.get_line(&line.id).await
    }

    /// Removes a single line from the actor's cart.
    pub async fn remove_line(&self, actor_id: &str, line_id: &str) -> DbResult<()> {
        let result = sqlx::query("DELETE FROM cart_lines WHERE id = ? AND actor_id = ?")
            .bind(line_id)
            .bind(actor_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Cart line", line_id));
        }
        Ok(())
    }

    /// Empties the actor's cart.
    pub async fn clear(&self, actor_id: &str) -> DbResult<()> {
        sqlx::query("DELETE FROM cart_lines WHERE actor_id = ?")
            .bind(actor_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Reads the full cart with per-line amounts and totals computed
    /// from current prices.
    pub async fn list(&self, actor_id: &str) -> DbResult<CartView> {
        let sql = format!("{LINE_DETAIL_SELECT} WHERE cl.actor_id = ? ORDER BY cl.created_at");
        let details: Vec<CartLineDetail> = sqlx::query_as(&sql)
            .bind(actor_id)
            .fetch_all(&self.pool)
            .await?;

        let category = details.first().map(|d| CartCategory {
            id: d.category_id.clone(),
            name: d.category_name.clone(),
        });

        let mut totals = CartTotals::default();
        let lines: Vec<CartLineView> = details
            .into_iter()
            .map(|line| {
                let amounts = line.amounts();
                totals.add_line(line.quantity, &amounts);
                CartLineView { line, amounts }
            })
            .collect();

        Ok(CartView { count: lines.len(), category, totals, lines })
    }

    // -------------------------------------------------------------------------
    // Internals
    // -------------------------------------------------------------------------

    async fn get_line(&self, line_id: &str) -> DbResult<CartLineView> {
        let sql = format!("{LINE_DETAIL_SELECT} WHERE cl.id = ?");
        let line: CartLineDetail = sqlx::query_as(&sql)
            .bind(line_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DbError::not_found("Cart line", line_id))?;

        let amounts = line.amounts();
        Ok(CartLineView { line, amounts })
    }

    async fn fetch_product(&self, product_id: &str) -> DbResult<Product> {
        sqlx::query_as::<_, Product>("SELECT * FROM products WHERE id = ?")
            .bind(product_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DbError::not_found("Product", product_id))
    }

    async fn fetch_variant(
        &self,
        variant_id: &str,
        product: &Product,
    ) -> DbResult<ProductVariant> {
        let variant: ProductVariant =
            sqlx::query_as("SELECT * FROM product_variants WHERE id = ?")
                .bind(variant_id)
                .fetch_optional(&self.pool)
                .await?
                .ok_or_else(|| DbError::not_found("Product variant", variant_id))?;

        if variant.product_id != product.id {
            return Err(DomainError::invalid_input(
                "Variant does not belong to the given product",
            )
            .into());
        }
        if !variant.is_active {
            return Err(DomainError::unavailable("Product variant", variant.label()).into());
        }
        Ok(variant)
    }

    /// Rejects the add when the cart already holds a different category,
    /// naming both categories.
    async fn check_category_exclusivity(
        &self,
        actor_id: &str,
        product: &Product,
    ) -> DbResult<()> {
        let in_cart: Option<(String, String)> = sqlx::query_as(
            "SELECT c.id, c.name
             FROM cart_lines cl
             JOIN products p   ON p.id = cl.product_id
             JOIN categories c ON c.id = p.category_id
             WHERE cl.actor_id = ?
             LIMIT 1",
        )
        .bind(actor_id)
        .fetch_optional(&self.pool)
        .await?;

        if let Some((category_id, category_name)) = in_cart {
            if category_id != product.category_id {
                let attempted: String =
                    sqlx::query_scalar("SELECT name FROM categories WHERE id = ?")
                        .bind(&product.category_id)
                        .fetch_one(&self.pool)
                        .await?;
                return Err(DomainError::CategoryConflict {
                    in_cart: category_name,
                    attempted,
                }
                .into());
            }
        }
        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
