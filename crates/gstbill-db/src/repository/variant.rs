//! # Variant Repository
//!
//! Product variant management. A variant overrides its parent product's
//! price and stock for cart lines that carry it; the GST rate always
//! comes from the parent.

use chrono::Utc;
use serde::Deserialize;
use sqlx::SqlitePool;
use tracing::info;
use uuid::Uuid;

use gstbill_core::error::DomainError;
use gstbill_core::types::ProductVariant;
use gstbill_core::validation::{
    validate_name, validate_price_paise, validate_sku, validate_stock,
};

use crate::error::{DbError, DbResult};

/// Input for creating a variant.
#[derive(Debug, Clone, Deserialize)]
pub struct NewVariant {
    pub product_id: String,
    pub attribute_name: String,
    pub attribute_value: String,
    pub sku: String,
    pub price_paise: i64,
    pub actual_price_paise: Option<i64>,
    pub stock: i64,
}

/// Partial update; `None` fields are left unchanged.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct VariantPatch {
    pub attribute_name: Option<String>,
    pub attribute_value: Option<String>,
    pub price_paise: Option<i64>,
    pub actual_price_paise: Option<i64>,
    pub is_active: Option<bool>,
}

/// Repository for product variants.
#[derive(Debug, Clone)]
pub struct VariantRepository {
    pool: SqlitePool,
}

impl VariantRepository {
    pub fn new(pool: SqlitePool) -> Self {
        VariantRepository { pool }
    }

    /// Creates a variant under an existing product. SKU is unique across
    /// all variants and independent of product SKUs.
    pub async fn create(&self, req: NewVariant) -> DbResult<ProductVariant> {
        validate_name("Attribute name", &req.attribute_name)?;
        validate_name("Attribute value", &req.attribute_value)?;
        validate_sku(&req.sku)?;
        validate_price_paise(req.price_paise)?;
        validate_stock(req.stock)?;

        let product_exists: Option<String> =
            sqlx::query_scalar("SELECT id FROM products WHERE id = ?")
                .bind(&req.product_id)
                .fetch_optional(&self.pool)
                .await?;
        if product_exists.is_none() {
            return Err(DbError::not_found("Product", &req.product_id));
        }

        let id = Uuid::new_v4().to_string();
        let sku = req.sku.trim().to_string();
        let now = Utc::now();

        sqlx::query(
            "INSERT INTO product_variants
                 (id, product_id, attribute_name, attribute_value, sku,
                  price_paise, actual_price_paise, stock, is_active, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, 1, ?, ?)",
        )
        .bind(&id)
        .bind(&req.product_id)
        .bind(req.attribute_name.trim())
        .bind(req.attribute_value.trim())
        .bind(&sku)
        .bind(req.price_paise)
        .bind(req.actual_price_paise)
        .bind(req.stock)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(|e| match DbError::from(e) {
            DbError::UniqueViolation { .. } => {
                DomainError::conflict(format!("Variant SKU '{sku}' already exists")).into()
            }
            other => other,
        })?;

        info!(variant_id = %id, sku = %sku, "variant created");
        self.get(&id).await
    }

    pub async fn get(&self, id: &str) -> DbResult<ProductVariant> {
        sqlx::query_as::<_, ProductVariant>("SELECT * FROM product_variants WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DbError::not_found("Product variant", id))
    }

    /// Lists a product's variants, active only unless `include_inactive`.
    pub async fn list_for_product(
        &self,
        product_id: &str,
        include_inactive: bool,
    ) -> DbResult<Vec<ProductVariant>> {
        let sql = if include_inactive {
            "SELECT * FROM product_variants WHERE product_id = ?
             ORDER BY price_paise, attribute_name, attribute_value"
        } else {
            "SELECT * FROM product_variants WHERE product_id = ? AND is_active = 1
             ORDER BY price_paise, attribute_name, attribute_value"
        };
        Ok(sqlx::query_as::<_, ProductVariant>(sql)
            .bind(product_id)
            .fetch_all(&self.pool)
            .await?)
    }

    /// Applies a partial update.
    pub async fn update(&self, id: &str, patch: VariantPatch) -> DbResult<ProductVariant> {
        let mut variant = self.get(id).await?;

        if let Some(name) = patch.attribute_name {
            validate_name("Attribute name", &name)?;
            variant.attribute_name = name.trim().to_string();
        }
        if let Some(value) = patch.attribute_value {
            validate_name("Attribute value", &value)?;
            variant.attribute_value = value.trim().to_string();
        }
        if let Some(price_paise) = patch.price_paise {
            validate_price_paise(price_paise)?;
            variant.price_paise = price_paise;
        }
        if let Some(actual) = patch.actual_price_paise {
            variant.actual_price_paise = Some(actual);
        }
        if let Some(is_active) = patch.is_active {
            variant.is_active = is_active;
        }
        variant.updated_at = Utc::now();

        sqlx::query(
            "UPDATE product_variants SET
                 attribute_name = ?, attribute_value = ?, price_paise = ?,
                 actual_price_paise = ?, is_active = ?, updated_at = ?
             WHERE id = ?",
        )
        .bind(&variant.attribute_name)
        .bind(&variant.attribute_value)
        .bind(variant.price_paise)
        .bind(variant.actual_price_paise)
        .bind(variant.is_active)
        .bind(variant.updated_at)
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(variant)
    }

    /// Adjusts a variant's stock by a signed delta; never below zero.
    pub async fn restock(&self, id: &str, delta: i64) -> DbResult<ProductVariant> {
        if delta == 0 {
            return Err(DomainError::invalid_input("Stock adjustment cannot be zero").into());
        }
        self.get(id).await?;

        let result = sqlx::query(
            "UPDATE product_variants SET stock = stock + ?, updated_at = ?
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

        self.get(id).await
    }

    /// Deletes a variant. Rejected while cart lines or invoice lines
    /// still reference it (historical invoices keep their snapshots).
    pub async fn delete(&self, id: &str) -> DbResult<()> {
        self.get(id).await?;

        let references: i64 = sqlx::query_scalar(
            "SELECT (SELECT COUNT(*) FROM cart_lines WHERE variant_id = ?)
                  + (SELECT COUNT(*) FROM invoice_lines WHERE variant_id = ?)",
        )
        .bind(id)
        .bind(id)
        .fetch_one(&self.pool)
        .await?;

        if references > 0 {
            return Err(DomainError::conflict(
                "Variant is referenced by carts or invoices; deactivate it instead",
            )
            .into());
        }

        sqlx::query("DELETE FROM product_variants WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::testutil::{seed_product, seed_variant, test_db};
    use gstbill_core::error::ErrorKind;

    #[tokio::test]
    async fn test_variant_crud() {
        let db = test_db().await;
        let product = seed_product(&db, "SKU-P", 10).await;
        let variant = seed_variant(&db, &product, "SKU-V1", 4).await;

        assert_eq!(variant.label(), "Weight: 20g");
        assert_eq!(variant.stock, 4);

        let updated = db
            .variants()
            .update(
                &variant.id,
                VariantPatch { attribute_value: Some("50g".to_string()), ..Default::default() },
            )
            .await
            .unwrap();
        assert_eq!(updated.label(), "Weight: 50g");

        let restocked = db.variants().restock(&variant.id, 6).await.unwrap();
        assert_eq!(restocked.stock, 10);

        let listed = db.variants().list_for_product(&product.id, false).await.unwrap();
        assert_eq!(listed.len(), 1);
    }

    #[tokio::test]
    async fn test_variant_sku_unique() {
        let db = test_db().await;
        let product = seed_product(&db, "SKU-P2", 10).await;
        seed_variant(&db, &product, "SKU-V-DUP", 4).await;

        let err = db
            .variants()
            .create(NewVariant {
                product_id: product.id.clone(),
                attribute_name: "Weight".to_string(),
                attribute_value: "100g".to_string(),
                sku: "SKU-V-DUP".to_string(),
                price_paise: 900,
                actual_price_paise: None,
                stock: 1,
            })
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Conflict);
    }

    #[tokio::test]
    async fn test_variant_requires_existing_product() {
        let db = test_db().await;
        let err = db
            .variants()
            .create(NewVariant {
                product_id: "missing".to_string(),
                attribute_name: "Weight".to_string(),
                attribute_value: "20g".to_string(),
                sku: "SKU-NOPE".to_string(),
                price_paise: 900,
                actual_price_paise: None,
                stock: 1,
            })
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_delete_guard_and_delete() {
        let db = test_db().await;
        let product = seed_product(&db, "SKU-P4", 10).await;
        let variant = seed_variant(&db, &product, "SKU-V4", 4).await;

        // A cart reference blocks deletion.
        db.cart()
            .add_line(
                "admin-1",
                crate::repository::cart::AddLineRequest {
                    product_id: product.id.clone(),
                    variant_id: Some(variant.id.clone()),
                    quantity: 1,
                },
            )
            .await
            .unwrap();
        let err = db.variants().delete(&variant.id).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Conflict);

        // Unreferenced again, deletion goes through.
        let view = db.cart().list("admin-1").await.unwrap();
        db.cart().remove_line("admin-1", &view.lines[0].line.id).await.unwrap();
        db.variants().delete(&variant.id).await.unwrap();
        assert!(db.variants().get(&variant.id).await.is_err());
    }

    #[tokio::test]
    async fn test_inactive_excluded_from_default_listing() {
        let db = test_db().await;
        let product = seed_product(&db, "SKU-P3", 10).await;
        let variant = seed_variant(&db, &product, "SKU-V3", 4).await;

        db.variants()
            .update(&variant.id, VariantPatch { is_active: Some(false), ..Default::default() })
            .await
            .unwrap();

        assert!(db.variants().list_for_product(&product.id, false).await.unwrap().is_empty());
        assert_eq!(db.variants().list_for_product(&product.id, true).await.unwrap().len(), 1);
    }
}
