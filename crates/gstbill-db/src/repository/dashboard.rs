//! # Dashboard Repository
//!
//! Read-only aggregation over the primary ledger for the back-office
//! dashboard. Disabled invoices are excluded from every figure; low
//! stock covers both products and variants.
//!
//! The 7-day trend is computed as one bounded query per day rather than
//! grouping on a SQL date expression, so the bounds logic is the same
//! one the billing engine uses for numbering periods.

use chrono::{Duration, NaiveDate, Utc};
use serde::Serialize;
use sqlx::{FromRow, SqlitePool};

use gstbill_core::numbering::BillingPeriod;
use gstbill_core::types::{InvoiceStatus, PaymentMode};
use gstbill_core::LOW_STOCK_THRESHOLD;

use crate::error::DbResult;

// =============================================================================
// Read Models
// =============================================================================

/// Sales figures over one time window.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct SalesWindow {
    pub invoices: i64,
    pub revenue_paise: i64,
    pub gst_paise: i64,
}

/// Revenue and quantity grouped by category.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct CategorySales {
    pub category_id: String,
    pub category_name: String,
    pub quantity: i64,
    pub revenue_paise: i64,
}

/// Revenue and quantity grouped by subcategory.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct SubCategorySales {
    pub sub_category_id: String,
    pub sub_category_name: String,
    pub category_name: String,
    pub quantity: i64,
    pub revenue_paise: i64,
}

/// One of the five best-selling products, by units sold.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct TopProduct {
    pub product_id: String,
    pub name: String,
    pub quantity: i64,
    pub revenue_paise: i64,
}

/// Invoice count and revenue for one payment mode.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct PaymentModeSlice {
    pub payment_mode: PaymentMode,
    pub invoices: i64,
    pub revenue_paise: i64,
}

/// One day of the 7-day trend; days without sales appear with zeros.
#[derive(Debug, Clone, Serialize)]
pub struct TrendPoint {
    pub date: NaiveDate,
    pub invoices: i64,
    pub revenue_paise: i64,
}

/// A product or variant running low.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct LowStockItem {
    pub product_id: String,
    pub variant_id: Option<String>,
    pub name: String,
    pub sku: String,
    pub stock: i64,
}

/// Everything the dashboard shows, assembled in one call.
#[derive(Debug, Clone, Serialize)]
pub struct DashboardData {
    pub today: SalesWindow,
    pub this_week: SalesWindow,
    pub this_month: SalesWindow,
    pub all_time: SalesWindow,
    pub categories: Vec<CategorySales>,
    pub subcategories: Vec<SubCategorySales>,
    pub top_products: Vec<TopProduct>,
    pub payment_modes: Vec<PaymentModeSlice>,
    pub trend: Vec<TrendPoint>,
    pub low_stock: Vec<LowStockItem>,
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for dashboard aggregation.
#[derive(Debug, Clone)]
pub struct DashboardRepository {
    pool: SqlitePool,
}

impl DashboardRepository {
    pub fn new(pool: SqlitePool) -> Self {
        DashboardRepository { pool }
    }

    /// Assembles the full dashboard.
    pub async fn load(&self) -> DbResult<DashboardData> {
        let now = Utc::now();
        let (today_start, today_end) = BillingPeriod::Daily.bounds(now);
        let (month_start, month_end) = BillingPeriod::Monthly.bounds(now);
        let week_start = today_start - Duration::days(6);

        let today = self.window(Some((today_start, today_end))).await?;
        let this_week = self.window(Some((week_start, today_end))).await?;
        let this_month = self.window(Some((month_start, month_end))).await?;
        let all_time = self.window(None).await?;

        // Oldest day first.
        let mut trend = Vec::with_capacity(7);
        for offset in (0..7).rev() {
            let day_start = today_start - Duration::days(offset);
            let day_end = day_start + Duration::days(1);
            let window = self.window(Some((day_start, day_end))).await?;
            trend.push(TrendPoint {
                date: day_start.date_naive(),
                invoices: window.invoices,
                revenue_paise: window.revenue_paise,
            });
        }

        Ok(DashboardData {
            today,
            this_week,
            this_month,
            all_time,
            categories: self.category_sales().await?,
            subcategories: self.subcategory_sales().await?,
            top_products: self.top_products().await?,
            payment_modes: self.payment_modes().await?,
            trend,
            low_stock: self.low_stock().await?,
        })
    }

    async fn window(
        &self,
        bounds: Option<(chrono::DateTime<Utc>, chrono::DateTime<Utc>)>,
    ) -> DbResult<SalesWindow> {
        let row: (i64, i64, i64) = match bounds {
            Some((start, end)) => {
                sqlx::query_as(
                    "SELECT COUNT(*),
                            COALESCE(SUM(grand_total_paise), 0),
                            COALESCE(SUM(total_gst_paise), 0)
                     FROM invoices
                     WHERE status = ? AND created_at >= ? AND created_at < ?",
                )
                .bind(InvoiceStatus::Active)
                .bind(start)
                .bind(end)
                .fetch_one(&self.pool)
                .await?
            }
            None => {
                sqlx::query_as(
                    "SELECT COUNT(*),
                            COALESCE(SUM(grand_total_paise), 0),
                            COALESCE(SUM(total_gst_paise), 0)
                     FROM invoices
                     WHERE status = ?",
                )
                .bind(InvoiceStatus::Active)
                .fetch_one(&self.pool)
                .await?
            }
        };

        Ok(SalesWindow { invoices: row.0, revenue_paise: row.1, gst_paise: row.2 })
    }

    async fn category_sales(&self) -> DbResult<Vec<CategorySales>> {
        Ok(sqlx::query_as(
            "SELECT p.category_id          AS category_id,
                    c.name                 AS category_name,
                    SUM(il.quantity)       AS quantity,
                    SUM(il.total_paise)    AS revenue_paise
             FROM invoice_lines il
             JOIN invoices i   ON i.id = il.invoice_id
             JOIN products p   ON p.id = il.product_id
             JOIN categories c ON c.id = p.category_id
             WHERE i.status = ?
             GROUP BY p.category_id, c.name
             ORDER BY revenue_paise DESC",
        )
        .bind(InvoiceStatus::Active)
        .fetch_all(&self.pool)
        .await?)
    }

    async fn subcategory_sales(&self) -> DbResult<Vec<SubCategorySales>> {
        Ok(sqlx::query_as(
            "SELECT p.sub_category_id      AS sub_category_id,
                    s.name                 AS sub_category_name,
                    c.name                 AS category_name,
                    SUM(il.quantity)       AS quantity,
                    SUM(il.total_paise)    AS revenue_paise
             FROM invoice_lines il
             JOIN invoices i        ON i.id = il.invoice_id
             JOIN products p        ON p.id = il.product_id
             JOIN subcategories s   ON s.id = p.sub_category_id
             JOIN categories c      ON c.id = p.category_id
             WHERE i.status = ?
             GROUP BY p.sub_category_id, s.name, c.name
             ORDER BY revenue_paise DESC",
        )
        .bind(InvoiceStatus::Active)
        .fetch_all(&self.pool)
        .await?)
    }

    async fn top_products(&self) -> DbResult<Vec<TopProduct>> {
        Ok(sqlx::query_as(
            "SELECT il.product_id          AS product_id,
                    p.name                 AS name,
                    SUM(il.quantity)       AS quantity,
                    SUM(il.total_paise)    AS revenue_paise
             FROM invoice_lines il
             JOIN invoices i ON i.id = il.invoice_id
             JOIN products p ON p.id = il.product_id
             WHERE i.status = ?
             GROUP BY il.product_id, p.name
             ORDER BY quantity DESC, revenue_paise DESC
             LIMIT 5",
        )
        .bind(InvoiceStatus::Active)
        .fetch_all(&self.pool)
        .await?)
    }

    async fn payment_modes(&self) -> DbResult<Vec<PaymentModeSlice>> {
        Ok(sqlx::query_as(
            "SELECT payment_mode,
                    COUNT(*)                          AS invoices,
                    COALESCE(SUM(grand_total_paise), 0) AS revenue_paise
             FROM invoices
             WHERE status = ?
             GROUP BY payment_mode
             ORDER BY revenue_paise DESC",
        )
        .bind(InvoiceStatus::Active)
        .fetch_all(&self.pool)
        .await?)
    }

    /// Active products and variants under the low-stock threshold,
    /// lowest first.
    async fn low_stock(&self) -> DbResult<Vec<LowStockItem>> {
        let mut items: Vec<LowStockItem> = sqlx::query_as(
            "SELECT id AS product_id,
                    NULL AS variant_id,
                    name,
                    sku,
                    stock
             FROM products
             WHERE is_active = 1 AND stock < ?",
        )
        .bind(LOW_STOCK_THRESHOLD)
        .fetch_all(&self.pool)
        .await?;

        let variants: Vec<LowStockItem> = sqlx::query_as(
            "SELECT v.product_id AS product_id,
                    v.id         AS variant_id,
                    p.name || ' (' || v.attribute_name || ': ' || v.attribute_value || ')'
                                 AS name,
                    v.sku        AS sku,
                    v.stock      AS stock
             FROM product_variants v
             JOIN products p ON p.id = v.product_id
             WHERE v.is_active = 1 AND p.is_active = 1 AND v.stock < ?",
        )
        .bind(LOW_STOCK_THRESHOLD)
        .fetch_all(&self.pool)
        .await?;

        items.extend(variants);
        items.sort_by(|a, b| a.stock.cmp(&b.stock).then_with(|| a.name.cmp(&b.name)));
        Ok(items)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::cart::AddLineRequest;
    use crate::repository::testutil::{seed_product, seed_variant, test_db, ACTOR};
    use gstbill_core::types::CustomerInfo;

    fn customer() -> CustomerInfo {
        CustomerInfo {
            name: "Asha".to_string(),
            address: None,
            contact: "9876543210".to_string(),
        }
    }

    async fn bill_one(db: &crate::pool::Database, product_id: &str, mode: PaymentMode) -> String {
        db.cart()
            .add_line(
                ACTOR,
                AddLineRequest {
                    product_id: product_id.to_string(),
                    variant_id: None,
                    quantity: 1,
                },
            )
            .await
            .unwrap();
        db.billing()
            .create_invoice(ACTOR, &customer(), mode)
            .await
            .unwrap()
            .invoice
            .id
    }

    #[tokio::test]
    async fn test_empty_dashboard() {
        let db = test_db().await;
        let data = db.dashboard().load().await.unwrap();

        assert_eq!(data.all_time.invoices, 0);
        assert_eq!(data.all_time.revenue_paise, 0);
        assert!(data.categories.is_empty());
        assert!(data.top_products.is_empty());
        assert_eq!(data.trend.len(), 7);
        assert!(data.trend.iter().all(|p| p.invoices == 0));
    }

    #[tokio::test]
    async fn test_windows_and_breakdowns() {
        let db = test_db().await;
        let product = seed_product(&db, "SKU-D1", 50).await;

        bill_one(&db, &product.id, PaymentMode::Cash).await;
        bill_one(&db, &product.id, PaymentMode::Upi).await;

        let data = db.dashboard().load().await.unwrap();

        // Each invoice: 1 × Rs 100 @ 18% = Rs 118.
        assert_eq!(data.today.invoices, 2);
        assert_eq!(data.today.revenue_paise, 23_600);
        assert_eq!(data.today.gst_paise, 3_600);
        assert_eq!(data.all_time.invoices, 2);
        assert_eq!(data.this_week.invoices, 2);
        assert_eq!(data.this_month.invoices, 2);

        assert_eq!(data.categories.len(), 1);
        assert_eq!(data.categories[0].quantity, 2);
        assert_eq!(data.categories[0].revenue_paise, 23_600);
        assert_eq!(data.subcategories.len(), 1);

        assert_eq!(data.top_products.len(), 1);
        assert_eq!(data.top_products[0].product_id, product.id);

        assert_eq!(data.payment_modes.len(), 2);

        // Today is the last trend point.
        assert_eq!(data.trend.len(), 7);
        assert_eq!(data.trend[6].invoices, 2);
        assert_eq!(data.trend[5].invoices, 0);
    }

    #[tokio::test]
    async fn test_disabled_invoices_excluded() {
        let db = test_db().await;
        let product = seed_product(&db, "SKU-D2", 50).await;

        bill_one(&db, &product.id, PaymentMode::Cash).await;
        let disabled_id = bill_one(&db, &product.id, PaymentMode::Cash).await;
        db.billing()
            .set_status(&disabled_id, InvoiceStatus::Disabled)
            .await
            .unwrap();

        let data = db.dashboard().load().await.unwrap();
        assert_eq!(data.all_time.invoices, 1);
        assert_eq!(data.all_time.revenue_paise, 11_800);
        assert_eq!(data.categories[0].quantity, 1);
        assert_eq!(data.payment_modes[0].invoices, 1);
    }

    #[tokio::test]
    async fn test_top_products_ranked_and_capped() {
        let db = test_db().await;
        // 6 products, product k billed k+1 times.
        let mut ids = Vec::new();
        for k in 0..6 {
            let product = seed_product(&db, &format!("SKU-T{k}"), 50).await;
            for _ in 0..=k {
                bill_one(&db, &product.id, PaymentMode::Cash).await;
            }
            ids.push(product.id);
        }

        let data = db.dashboard().load().await.unwrap();
        assert_eq!(data.top_products.len(), 5);
        // Best seller is the last product (6 units); the 1-unit product
        // falls off the list.
        assert_eq!(data.top_products[0].product_id, ids[5]);
        assert_eq!(data.top_products[0].quantity, 6);
        assert!(data.top_products.iter().all(|p| p.product_id != ids[0]));
    }

    #[tokio::test]
    async fn test_low_stock_includes_variants() {
        let db = test_db().await;
        seed_product(&db, "SKU-LOW", 2).await;
        let ok_product = seed_product(&db, "SKU-OKK", 40).await;
        seed_variant(&db, &ok_product, "SKU-OKK-V", 3).await;

        let data = db.dashboard().load().await.unwrap();
        assert_eq!(data.low_stock.len(), 2);
        // Sorted lowest first.
        assert_eq!(data.low_stock[0].sku, "SKU-LOW");
        assert_eq!(data.low_stock[0].stock, 2);
        assert_eq!(data.low_stock[1].sku, "SKU-OKK-V");
        assert!(data.low_stock[1].variant_id.is_some());
        assert!(data.low_stock[1].name.contains("Weight: 20g"));
    }
}
