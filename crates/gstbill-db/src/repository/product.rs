//! # Product Repository
//!
//! Product CRUD, filtered listing, and restocking. Stock is *decremented*
//! only by the billing engine, inside the invoice transaction; this
//! repository only ever adds stock or sets an absolute level at creation.

use chrono::Utc;
use serde::Deserialize;
use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use tracing::{debug, info};
use uuid::Uuid;

use gstbill_core::error::DomainError;
use gstbill_core::types::Product;
use gstbill_core::validation::{
    validate_gst_rate_bps, validate_name, validate_price_paise, validate_sku, validate_stock,
};
use gstbill_core::LOW_STOCK_THRESHOLD;

use crate::error::{DbError, DbResult};

// =============================================================================
// Request Types
// =============================================================================

/// Input for creating a product.
#[derive(Debug, Clone, Deserialize)]
pub struct NewProduct {
    pub category_id: String,
    pub sub_category_id: String,
    pub name: String,
    pub description: Option<String>,
    pub sku: String,
    pub hsn: Option<String>,
    pub price_paise: i64,
    pub actual_price_paise: Option<i64>,
    pub gst_rate_bps: u32,
    pub stock: i64,
    pub unit: String,
}

/// Partial update; `None` fields are left unchanged. Stock is not
/// patchable here; use [`ProductRepository::restock`].
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProductPatch {
    pub category_id: Option<String>,
    pub sub_category_id: Option<String>,
    pub name: Option<String>,
    pub sku: Option<String>,
    pub description: Option<String>,
    pub hsn: Option<String>,
    pub price_paise: Option<i64>,
    pub actual_price_paise: Option<i64>,
    pub gst_rate_bps: Option<u32>,
    pub unit: Option<String>,
    pub is_active: Option<bool>,
}

/// A product joined with its category and subcategory names.
#[derive(Debug, Clone, serde::Serialize, sqlx::FromRow)]
pub struct ProductDetail {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub product: Product,
    pub category_name: String,
    pub sub_category_name: String,
}

/// Listing filter. All fields optional and combinable.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProductFilter {
    pub category_id: Option<String>,
    pub sub_category_id: Option<String>,
    /// Case-insensitive substring match on name or SKU.
    pub search: Option<String>,
    pub include_inactive: bool,
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for products.
#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
}

impl ProductRepository {
    pub fn new(pool: SqlitePool) -> Self {
        ProductRepository { pool }
    }

    /// Creates a product. The SKU must be globally unique, and the
    /// subcategory must belong to the given category.
    pub async fn create(&self, req: NewProduct) -> DbResult<Product> {
        validate_name("Product name", &req.name)?;
        validate_sku(&req.sku)?;
        validate_price_paise(req.price_paise)?;
        validate_gst_rate_bps(req.gst_rate_bps)?;
        validate_stock(req.stock)?;

        let parent: Option<String> = sqlx::query_scalar(
            "SELECT category_id FROM subcategories WHERE id = ?",
        )
        .bind(&req.sub_category_id)
        .fetch_optional(&self.pool)
        .await?;

        match parent {
            None => return Err(DbError::not_found("Subcategory", &req.sub_category_id)),
            Some(parent) if parent != req.category_id => {
                return Err(DomainError::invalid_input(
                    "Subcategory does not belong to the given category",
                )
                .into());
            }
            Some(_) => {}
        }

        let id = Uuid::new_v4().to_string();
        let sku = req.sku.trim().to_string();
        let now = Utc::now();

        sqlx::query(
            "INSERT INTO products
                 (id, category_id, sub_category_id, name, description, sku, hsn,
                  price_paise, actual_price_paise, gst_rate_bps, stock, unit,
                  is_active, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, 1, ?, ?)",
        )
        .bind(&id)
        .bind(&req.category_id)
        .bind(&req.sub_category_id)
        .bind(req.name.trim())
        .bind(&req.description)
        .bind(&sku)
        .bind(&req.hsn)
        .bind(req.price_paise)
        .bind(req.actual_price_paise)
        .bind(req.gst_rate_bps)
        .bind(req.stock)
        .bind(&req.unit)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(|e| match DbError::from(e) {
            DbError::UniqueViolation { .. } => {
                DomainError::conflict(format!("SKU '{sku}' already exists")).into()
            }
            other => other,
        })?;

        info!(product_id = %id, sku = %sku, "product created");
        self.get(&id).await
    }

    pub async fn get(&self, id: &str) -> DbResult<Product> {
        sqlx::query_as::<_, Product>("SELECT * FROM products WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DbError::not_found("Product", id))
    }

    /// Fetches a product with its category and subcategory names joined.
    pub async fn get_detail(&self, id: &str) -> DbResult<ProductDetail> {
        sqlx::query_as::<_, ProductDetail>(
            "SELECT p.*, c.name AS category_name, s.name AS sub_category_name
             FROM products p
             JOIN categories c    ON c.id = p.category_id
             JOIN subcategories s ON s.id = p.sub_category_id
             WHERE p.id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| DbError::not_found("Product", id))
    }

    pub async fn get_by_sku(&self, sku: &str) -> DbResult<Product> {
        sqlx::query_as::<_, Product>("SELECT * FROM products WHERE sku = ?")
            .bind(sku)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DbError::not_found("Product", sku))
    }

    /// Lists products matching the filter, sorted by name.
    pub async fn list(&self, filter: &ProductFilter) -> DbResult<Vec<Product>> {
        let mut qb: QueryBuilder<Sqlite> =
            QueryBuilder::new("SELECT * FROM products WHERE 1 = 1");

        if !filter.include_inactive {
            qb.push(" AND is_active = 1");
        }
        if let Some(category_id) = &filter.category_id {
            qb.push(" AND category_id = ").push_bind(category_id);
        }
        if let Some(sub_category_id) = &filter.sub_category_id {
            qb.push(" AND sub_category_id = ").push_bind(sub_category_id);
        }
        if let Some(search) = filter.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            qb.push(" AND (instr(lower(name), lower(")
                .push_bind(search.to_string())
                .push(")) > 0 OR instr(lower(sku), lower(")
                .push_bind(search.to_string())
                .push(")) > 0)");
        }
        qb.push(" ORDER BY name");

        let products = qb.build_query_as::<Product>().fetch_all(&self.pool).await?;
        debug!(count = products.len(), "products listed");
        Ok(products)
    }

    /// Applies a partial update.
    pub async fn update(&self, id: &str, patch: ProductPatch) -> DbResult<Product> {
        let mut product = self.get(id).await?;

        let moved = patch.category_id.is_some() || patch.sub_category_id.is_some();
        if let Some(category_id) = patch.category_id {
            product.category_id = category_id;
        }
        if let Some(sub_category_id) = patch.sub_category_id {
            product.sub_category_id = sub_category_id;
        }
        if moved {
            let parent: Option<String> = sqlx::query_scalar(
                "SELECT category_id FROM subcategories WHERE id = ?",
            )
            .bind(&product.sub_category_id)
            .fetch_optional(&self.pool)
            .await?;
            match parent {
                None => {
                    return Err(DbError::not_found("Subcategory", &product.sub_category_id));
                }
                Some(parent) if parent != product.category_id => {
                    return Err(DomainError::invalid_input(
                        "Subcategory does not belong to the given category",
                    )
                    .into());
                }
                Some(_) => {}
            }
        }

        if let Some(name) = patch.name {
            validate_name("Product name", &name)?;
            product.name = name.trim().to_string();
        }
        if let Some(sku) = patch.sku {
            validate_sku(&sku)?;
            product.sku = sku.trim().to_string();
        }
        if let Some(description) = patch.description {
            product.description = Some(description);
        }
        if let Some(hsn) = patch.hsn {
            product.hsn = Some(hsn);
        }
        if let Some(price_paise) = patch.price_paise {
            validate_price_paise(price_paise)?;
            product.price_paise = price_paise;
        }
        if let Some(actual) = patch.actual_price_paise {
            product.actual_price_paise = Some(actual);
        }
        if let Some(bps) = patch.gst_rate_bps {
            validate_gst_rate_bps(bps)?;
            product.gst_rate_bps = bps;
        }
        if let Some(unit) = patch.unit {
            product.unit = unit;
        }
        if let Some(is_active) = patch.is_active {
            product.is_active = is_active;
        }
        product.updated_at = Utc::now();

        sqlx::query(
            "UPDATE products SET
                 category_id = ?, sub_category_id = ?, name = ?, sku = ?,
                 description = ?, hsn = ?, price_paise = ?,
                 actual_price_paise = ?, gst_rate_bps = ?, unit = ?,
                 is_active = ?, updated_at = ?
             WHERE id = ?",
        )
        .bind(&product.category_id)
        .bind(&product.sub_category_id)
        .bind(&product.name)
        .bind(&product.sku)
        .bind(&product.description)
        .bind(&product.hsn)
        .bind(product.price_paise)
        .bind(product.actual_price_paise)
        .bind(product.gst_rate_bps)
        .bind(&product.unit)
        .bind(product.is_active)
        .bind(product.updated_at)
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(|e| match DbError::from(e) {
            DbError::UniqueViolation { .. } => {
                DomainError::conflict(format!("SKU '{}' already exists", product.sku)).into()
            }
            other => other,
        })?;

        Ok(product)
    }

    /// Adjusts stock by a signed delta. A negative adjustment may not
    /// take stock below zero; this is the only path outside billing
    /// that changes a product's stock level.
    pub async fn restock(&self, id: &str, delta: i64) -> DbResult<Product> {
        if delta == 0 {
            return Err(DomainError::invalid_input("Stock adjustment cannot be zero").into());
        }
        self.get(id).await?;

        let result = sqlx::query(
            "UPDATE products SET stock = stock + ?, updated_at = ?
             WHERE id = ? AND stock + ? >= 0",
        )
        .bind(delta)
        .bind(Utc::now())
        .bind(id)
        .bind(delta)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DomainError::invalid_input(
                "Stock adjustment would take stock below zero",
            )
            .into());
        }

        info!(product_id = %id, delta, "product stock adjusted");
        self.get(id).await
    }

    /// Soft-deletes (or reactivates) a product. Rows are never removed
    /// because invoice lines reference them.
    pub async fn set_active(&self, id: &str, is_active: bool) -> DbResult<Product> {
        self.get(id).await?;

        sqlx::query("UPDATE products SET is_active = ?, updated_at = ? WHERE id = ?")
            .bind(is_active)
            .bind(Utc::now())
            .bind(id)
            .execute(&self.pool)
            .await?;

        self.get(id).await
    }

    /// Active products at or below the low-stock threshold.
    pub async fn low_stock(&self) -> DbResult<Vec<Product>> {
        Ok(sqlx::query_as::<_, Product>(
            "SELECT * FROM products WHERE is_active = 1 AND stock < ? ORDER BY stock, name",
        )
        .bind(LOW_STOCK_THRESHOLD)
        .fetch_all(&self.pool)
        .await?)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
