//! # Catalog Repository
//!
//! Category and subcategory management. The hierarchy is
//! Category ─► SubCategory ─► Product; deletes are guarded so a node
//! with children cannot be removed.

use chrono::Utc;
use serde::Deserialize;
use sqlx::SqlitePool;
use tracing::{debug, info};
use uuid::Uuid;

use gstbill_core::error::DomainError;
use gstbill_core::types::{Category, SubCategory};
use gstbill_core::validation::validate_name;

use crate::error::{DbError, DbResult};

// =============================================================================
// Request Types
// =============================================================================

/// Input for creating a category.
#[derive(Debug, Clone, Deserialize)]
pub struct NewCategory {
    pub name: String,
    pub description: Option<String>,
}

/// Input for creating a subcategory.
#[derive(Debug, Clone, Deserialize)]
pub struct NewSubCategory {
    pub category_id: String,
    pub name: String,
    pub description: Option<String>,
}

/// Partial update; `None` fields are left unchanged.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CatalogPatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub is_active: Option<bool>,
}

/// Partial subcategory update; also allows moving to another parent
/// category, which re-checks the per-category name uniqueness.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SubCategoryPatch {
    pub category_id: Option<String>,
    pub name: Option<String>,
    pub description: Option<String>,
    pub is_active: Option<bool>,
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for the category hierarchy.
#[derive(Debug, Clone)]
pub struct CatalogRepository {
    pool: SqlitePool,
}

impl CatalogRepository {
    pub fn new(pool: SqlitePool) -> Self {
        CatalogRepository { pool }
    }

    // -------------------------------------------------------------------------
    // Categories
    // -------------------------------------------------------------------------

    /// Creates a category. Name must be unique across all categories.
    pub async fn create_category(&self, req: NewCategory) -> DbResult<Category> {
        validate_name("Category name", &req.name)?;

        let id = Uuid::new_v4().to_string();
        let name = req.name.trim().to_string();
        let now = Utc::now();

        sqlx::query(
            "INSERT INTO categories (id, name, description, is_active, created_at, updated_at)
             VALUES (?, ?, ?, 1, ?, ?)",
        )
        .bind(&id)
        .bind(&name)
        .bind(&req.description)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(|e| match DbError::from(e) {
            DbError::UniqueViolation { .. } => {
                DomainError::conflict(format!("Category '{name}' already exists")).into()
            }
            other => other,
        })?;

        info!(category_id = %id, name = %name, "category created");
        self.get_category(&id).await
    }

    /// Lists categories, active only unless `include_inactive`.
    pub async fn list_categories(&self, include_inactive: bool) -> DbResult<Vec<Category>> {
        let sql = if include_inactive {
            "SELECT * FROM categories ORDER BY name"
        } else {
            "SELECT * FROM categories WHERE is_active = 1 ORDER BY name"
        };
        Ok(sqlx::query_as::<_, Category>(sql).fetch_all(&self.pool).await?)
    }

    pub async fn get_category(&self, id: &str) -> DbResult<Category> {
        sqlx::query_as::<_, Category>("SELECT * FROM categories WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DbError::not_found("Category", id))
    }

    /// Applies a partial update to a category.
    pub async fn update_category(&self, id: &str, patch: CatalogPatch) -> DbResult<Category> {
        let mut category = self.get_category(id).await?;

        if let Some(name) = patch.name {
            validate_name("Category name", &name)?;
            category.name = name.trim().to_string();
        }
        if let Some(description) = patch.description {
            category.description = Some(description);
        }
        if let Some(is_active) = patch.is_active {
            category.is_active = is_active;
        }
        category.updated_at = Utc::now();

        sqlx::query(
            "UPDATE categories SET name = ?, description = ?, is_active = ?, updated_at = ?
             WHERE id = ?",
        )
        .bind(&category.name)
        .bind(&category.description)
        .bind(category.is_active)
        .bind(category.updated_at)
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(|e| match DbError::from(e) {
            DbError::UniqueViolation { .. } => {
                DomainError::conflict(format!("Category '{}' already exists", category.name))
                    .into()
            }
            other => other,
        })?;

        Ok(category)
    }

    /// Deletes a category. Fails with a conflict while subcategories or
    /// products still reference it.
    pub async fn delete_category(&self, id: &str) -> DbResult<()> {
        self.get_category(id).await?;

        let children: i64 = sqlx::query_scalar(
            "SELECT (SELECT COUNT(*) FROM subcategories WHERE category_id = ?)
                  + (SELECT COUNT(*) FROM products WHERE category_id = ?)",
        )
        .bind(id)
        .bind(id)
        .fetch_one(&self.pool)
        .await?;

        if children > 0 {
            return Err(DomainError::conflict(
                "Category still has subcategories or products; remove them first",
            )
            .into());
        }

        sqlx::query("DELETE FROM categories WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        debug!(category_id = %id, "category deleted");
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Subcategories
    // -------------------------------------------------------------------------

    /// Creates a subcategory. Name is unique within its parent category.
    pub async fn create_subcategory(&self, req: NewSubCategory) -> DbResult<SubCategory> {
        validate_name("Subcategory name", &req.name)?;
        self.get_category(&req.category_id).await?;

        let id = Uuid::new_v4().to_string();
        let name = req.name.trim().to_string();
        let now = Utc::now();

        sqlx::query(
            "INSERT INTO subcategories
                 (id, category_id, name, description, is_active, created_at, updated_at)
             VALUES (?, ?, ?, ?, 1, ?, ?)",
        )
        .bind(&id)
        .bind(&req.category_id)
        .bind(&name)
        .bind(&req.description)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(|e| match DbError::from(e) {
            DbError::UniqueViolation { .. } => DomainError::conflict(format!(
                "Subcategory '{name}' already exists in this category"
            ))
            .into(),
            other => other,
        })?;

        info!(subcategory_id = %id, name = %name, "subcategory created");
        self.get_subcategory(&id).await
    }

    /// Lists subcategories, optionally filtered to one parent category.
    pub async fn list_subcategories(&self, category_id: Option<&str>) -> DbResult<Vec<SubCategory>> {
        let rows = match category_id {
            Some(category_id) => {
                sqlx::query_as::<_, SubCategory>(
                    "SELECT * FROM subcategories WHERE category_id = ? AND is_active = 1
                     ORDER BY name",
                )
                .bind(category_id)
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx::query_as::<_, SubCategory>(
                    "SELECT * FROM subcategories WHERE is_active = 1 ORDER BY name",
                )
                .fetch_all(&self.pool)
                .await?
            }
        };
        Ok(rows)
    }

    pub async fn get_subcategory(&self, id: &str) -> DbResult<SubCategory> {
        sqlx::query_as::<_, SubCategory>("SELECT * FROM subcategories WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DbError::not_found("Subcategory", id))
    }

    /// Applies a partial update to a subcategory.
    pub async fn update_subcategory(
        &self,
        id: &str,
        patch: SubCategoryPatch,
    ) -> DbResult<SubCategory> {
        let mut sub = self.get_subcategory(id).await?;

        if let Some(category_id) = patch.category_id {
            self.get_category(&category_id).await?;
            sub.category_id = category_id;
        }
        if let Some(name) = patch.name {
            validate_name("Subcategory name", &name)?;
            sub.name = name.trim().to_string();
        }
        if let Some(description) = patch.description {
            sub.description = Some(description);
        }
        if let Some(is_active) = patch.is_active {
            sub.is_active = is_active;
        }
        sub.updated_at = Utc::now();

        sqlx::query(
            "UPDATE subcategories SET category_id = ?, name = ?, description = ?,
                 is_active = ?, updated_at = ?
             WHERE id = ?",
        )
        .bind(&sub.category_id)
        .bind(&sub.name)
        .bind(&sub.description)
        .bind(sub.is_active)
        .bind(sub.updated_at)
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(|e| match DbError::from(e) {
            DbError::UniqueViolation { .. } => DomainError::conflict(format!(
                "Subcategory '{}' already exists in this category",
                sub.name
            ))
            .into(),
            other => other,
        })?;

        Ok(sub)
    }

    /// Deletes a subcategory. Fails while products still reference it.
    pub async fn delete_subcategory(&self, id: &str) -> DbResult<()> {
        self.get_subcategory(id).await?;

        let products: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM products WHERE sub_category_id = ?")
                .bind(id)
                .fetch_one(&self.pool)
                .await?;

        if products > 0 {
            return Err(DomainError::conflict(
                "Subcategory still has products; remove them first",
            )
            .into());
        }

        sqlx::query("DELETE FROM subcategories WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        debug!(subcategory_id = %id, "subcategory deleted");
        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::testutil::{seed_category, seed_product_in, test_db};
    use gstbill_core::error::ErrorKind;

    #[tokio::test]
    async fn test_category_crud() {
        let db = test_db().await;
        let repo = db.catalog();

        let category = repo
            .create_category(NewCategory {
                name: "Stationery".to_string(),
                description: Some("Pens and paper".to_string()),
            })
            .await
            .unwrap();
        assert!(category.is_active);

        let updated = repo
            .update_category(
                &category.id,
                CatalogPatch { name: Some("Office Supplies".to_string()), ..Default::default() },
            )
            .await
            .unwrap();
        assert_eq!(updated.name, "Office Supplies");

        let all = repo.list_categories(false).await.unwrap();
        assert_eq!(all.len(), 1);

        repo.delete_category(&category.id).await.unwrap();
        assert!(repo.get_category(&category.id).await.is_err());
    }

    #[tokio::test]
    async fn test_duplicate_category_name_conflicts() {
        let db = test_db().await;
        let repo = db.catalog();

        repo.create_category(NewCategory { name: "Foods".to_string(), description: None })
            .await
            .unwrap();
        let err = repo
            .create_category(NewCategory { name: "Foods".to_string(), description: None })
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Conflict);
    }

    #[tokio::test]
    async fn test_subcategory_name_unique_per_category_only() {
        let db = test_db().await;
        let repo = db.catalog();

        let a = repo
            .create_category(NewCategory { name: "A".to_string(), description: None })
            .await
            .unwrap();
        let b = repo
            .create_category(NewCategory { name: "B".to_string(), description: None })
            .await
            .unwrap();

        repo.create_subcategory(NewSubCategory {
            category_id: a.id.clone(),
            name: "General".to_string(),
            description: None,
        })
        .await
        .unwrap();

        // Same name in another category is fine.
        repo.create_subcategory(NewSubCategory {
            category_id: b.id.clone(),
            name: "General".to_string(),
            description: None,
        })
        .await
        .unwrap();

        // Same name in the same category conflicts.
        let err = repo
            .create_subcategory(NewSubCategory {
                category_id: a.id,
                name: "General".to_string(),
                description: None,
            })
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Conflict);
    }

    #[tokio::test]
    async fn test_subcategory_move_rechecks_parent_and_uniqueness() {
        let db = test_db().await;
        let repo = db.catalog();

        let a = repo
            .create_category(NewCategory { name: "A".to_string(), description: None })
            .await
            .unwrap();
        let b = repo
            .create_category(NewCategory { name: "B".to_string(), description: None })
            .await
            .unwrap();
        let sub = repo
            .create_subcategory(NewSubCategory {
                category_id: a.id.clone(),
                name: "General".to_string(),
                description: None,
            })
            .await
            .unwrap();

        // Target category must exist.
        let err = repo
            .update_subcategory(
                &sub.id,
                SubCategoryPatch { category_id: Some("missing".to_string()), ..Default::default() },
            )
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);

        // Moving into a category that already has the name conflicts.
        repo.create_subcategory(NewSubCategory {
            category_id: b.id.clone(),
            name: "General".to_string(),
            description: None,
        })
        .await
        .unwrap();
        let err = repo
            .update_subcategory(
                &sub.id,
                SubCategoryPatch { category_id: Some(b.id.clone()), ..Default::default() },
            )
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Conflict);

        // With a rename in the same patch, the move goes through.
        let moved = repo
            .update_subcategory(
                &sub.id,
                SubCategoryPatch {
                    category_id: Some(b.id.clone()),
                    name: Some("Specials".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(moved.category_id, b.id);
        assert_eq!(moved.name, "Specials");
    }

    #[tokio::test]
    async fn test_delete_guards() {
        let db = test_db().await;
        let (category, sub) = seed_category(&db, "Guarded").await;
        seed_product_in(&db, &category.id, &sub.id, "SKU-G1", 5).await;

        let err = db.catalog().delete_category(&category.id).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Conflict);

        let err = db.catalog().delete_subcategory(&sub.id).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Conflict);
    }
}
