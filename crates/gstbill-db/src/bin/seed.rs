//! Seeds a demo database and runs one full billing cycle on it:
//! catalog → cart → invoice → dashboard. Useful as a smoke test and as
//! a worked example of the repository API.
//!
//! ```text
//! cargo run -p gstbill-db --bin seed [path/to/gstbill.db]
//! ```

use tracing::info;
use tracing_subscriber::EnvFilter;

use gstbill_core::error::ApiResponse;
use gstbill_core::types::{CustomerInfo, PaymentMode, SlCategory, SlParty};
use gstbill_db::repository::cart::AddLineRequest;
use gstbill_db::repository::catalog::{NewCategory, NewSubCategory};
use gstbill_db::repository::product::NewProduct;
use gstbill_db::repository::sl::SlAddLineRequest;
use gstbill_db::repository::variant::NewVariant;
use gstbill_db::{Database, DbConfig, DbError};

const ACTOR: &str = "admin-1";

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    if let Err(err) = run().await {
        eprintln!("seed failed: {err}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), DbError> {
    let path = std::env::args().nth(1).unwrap_or_else(|| "gstbill-demo.db".to_string());
    let db = Database::new(DbConfig::new(&path)).await?;
    info!(path, "database ready");

    // Catalog
    let stationery = db
        .catalog()
        .create_category(NewCategory {
            name: "Stationery".to_string(),
            description: Some("Pens, paper, office supplies".to_string()),
        })
        .await?;
    let writing = db
        .catalog()
        .create_subcategory(NewSubCategory {
            category_id: stationery.id.clone(),
            name: "Writing".to_string(),
            description: None,
        })
        .await?;

    let pen = db
        .products()
        .create(NewProduct {
            category_id: stationery.id.clone(),
            sub_category_id: writing.id.clone(),
            name: "Ball Pen".to_string(),
            description: None,
            sku: "PEN-001".to_string(),
            hsn: Some("9608".to_string()),
            price_paise: 10_000,
            actual_price_paise: Some(12_000),
            gst_rate_bps: 1800,
            stock: 5,
            unit: "piece".to_string(),
        })
        .await?;
    db.variants()
        .create(NewVariant {
            product_id: pen.id.clone(),
            attribute_name: "Ink".to_string(),
            attribute_value: "Blue".to_string(),
            sku: "PEN-001-BLU".to_string(),
            price_paise: 11_000,
            actual_price_paise: None,
            stock: 8,
        })
        .await?;
    info!(product = %pen.name, sku = %pen.sku, "catalog seeded");

    // Cart → invoice (the reference scenario: 2 × Rs 100 @ 18%)
    db.cart()
        .add_line(
            ACTOR,
            AddLineRequest { product_id: pen.id.clone(), variant_id: None, quantity: 2 },
        )
        .await?;
    let cart = db.cart().list(ACTOR).await?;
    info!(
        lines = cart.count,
        grand_total = %cart.totals.grand_total,
        "cart ready"
    );

    let customer = CustomerInfo {
        name: "Asha Traders".to_string(),
        address: Some("12 Market Road".to_string()),
        contact: "9876543210".to_string(),
    };
    let invoice = db
        .billing()
        .create_invoice(ACTOR, &customer, PaymentMode::Upi)
        .await?;
    println!(
        "{}",
        serde_json::to_string_pretty(&ApiResponse::ok(&invoice))
            .unwrap_or_else(|_| "<serialization failed>".to_string())
    );

    // SL ledger cycle
    db.sl_cart()
        .add_line(
            ACTOR,
            SlAddLineRequest {
                category: SlCategory::Swasthik,
                product_name: "Agarbatti Pack".to_string(),
                unit_price_paise: 5_000,
                quantity: 3,
                gst_rate_bps: 1800,
            },
        )
        .await?;
    let bill_to = SlParty {
        name: "Ravi Stores".to_string(),
        address: "4 Temple Street".to_string(),
        mobile: "9000000001".to_string(),
    };
    let ship_to = SlParty {
        name: "Ravi Depot".to_string(),
        address: "9 Warehouse Lane".to_string(),
        mobile: "9000000002".to_string(),
    };
    let sl_invoice = db
        .sl_billing()
        .create_invoice(ACTOR, &bill_to, &ship_to, PaymentMode::Cash)
        .await?;
    info!(
        invoice_number = %sl_invoice.invoice.invoice_number,
        grand_total_paise = sl_invoice.invoice.grand_total_paise,
        "SL invoice created"
    );

    // Dashboard
    let dashboard = db.dashboard().load().await?;
    info!(
        invoices_today = dashboard.today.invoices,
        revenue_today_paise = dashboard.today.revenue_paise,
        low_stock_items = dashboard.low_stock.len(),
        "dashboard"
    );

    db.close().await;
    Ok(())
}
