//! # Repository Module
//!
//! Database repository implementations.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Caller                                                                 │
//! │    │  db.cart().add_line("admin-1", req)                                │
//! │    ▼                                                                    │
//! │  CartRepository                                                         │
//! │  ├── add_line(&self, actor_id, req)                                     │
//! │  ├── update_line(&self, actor_id, line_id, change)                      │
//! │  ├── remove_line(&self, actor_id, line_id)                              │
//! │  └── list(&self, actor_id)                                              │
//! │    │  SQL                                                               │
//! │    ▼                                                                    │
//! │  SQLite                                                                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`catalog::CatalogRepository`] - Categories and subcategories
//! - [`product::ProductRepository`] - Product CRUD, search, restocking
//! - [`variant::VariantRepository`] - Product variants
//! - [`cart::CartRepository`] - Primary cart
//! - [`billing::BillingRepository`] - Primary ledger billing engine
//! - [`sl::SlCartRepository`] / [`sl::SlBillingRepository`] - SL ledger
//! - [`dashboard::DashboardRepository`] - Aggregated metrics

pub mod billing;
pub mod cart;
pub mod catalog;
pub mod dashboard;
pub mod product;
pub mod sl;
pub mod variant;

#[cfg(test)]
pub(crate) mod testutil {
    //! Shared fixtures for repository tests: an isolated in-memory
    //! database plus a small seeded catalog.

    use crate::pool::{Database, DbConfig};
    use crate::repository::catalog::{NewCategory, NewSubCategory};
    use crate::repository::product::NewProduct;
    use crate::repository::variant::NewVariant;
    use gstbill_core::types::{Category, Product, ProductVariant, SubCategory};

    pub const ACTOR: &str = "admin-1";

    pub async fn test_db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    pub async fn seed_category(db: &Database, name: &str) -> (Category, SubCategory) {
        let category = db
            .catalog()
            .create_category(NewCategory { name: name.to_string(), description: None })
            .await
            .unwrap();
        let sub = db
            .catalog()
            .create_subcategory(NewSubCategory {
                category_id: category.id.clone(),
                name: format!("{name} General"),
                description: None,
            })
            .await
            .unwrap();
        (category, sub)
    }

    /// Inserts a product under a fresh category. 18% GST, Rs 100.00,
    /// stock as given.
    pub async fn seed_product(db: &Database, sku: &str, stock: i64) -> Product {
        let (category, sub) = seed_category(db, &format!("Cat-{sku}")).await;
        seed_product_in(db, &category.id, &sub.id, sku, stock).await
    }

    pub async fn seed_product_in(
        db: &Database,
        category_id: &str,
        sub_category_id: &str,
        sku: &str,
        stock: i64,
    ) -> Product {
        db.products()
            .create(NewProduct {
                category_id: category_id.to_string(),
                sub_category_id: sub_category_id.to_string(),
                name: format!("Product {sku}"),
                description: None,
                sku: sku.to_string(),
                hsn: None,
                price_paise: 10_000,
                actual_price_paise: None,
                gst_rate_bps: 1800,
                stock,
                unit: "piece".to_string(),
            })
            .await
            .unwrap()
    }

    pub async fn seed_variant(db: &Database, product: &Product, sku: &str, stock: i64) -> ProductVariant {
        db.variants()
            .create(NewVariant {
                product_id: product.id.clone(),
                attribute_name: "Weight".to_string(),
                attribute_value: "20g".to_string(),
                sku: sku.to_string(),
                price_paise: 2_000,
                actual_price_paise: None,
                stock,
            })
            .await
            .unwrap()
    }
}
