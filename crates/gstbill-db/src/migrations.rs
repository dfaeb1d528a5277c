//! # Schema Migrations
//!
//! Migrations are embedded into the binary at compile time from
//! `migrations/sqlite/` at the workspace root, and applied on every
//! connect. sqlx tracks applied migrations in `_sqlx_migrations`, so
//! reruns are no-ops.

use sqlx::migrate::Migrator;
use sqlx::SqlitePool;
use tracing::info;

use crate::error::DbResult;

/// Migration files compiled into the binary.
pub static MIGRATOR: Migrator = sqlx::migrate!("../../migrations/sqlite");

/// Applies any pending migrations.
pub async fn run_migrations(pool: &SqlitePool) -> DbResult<()> {
    info!("running database migrations");
    MIGRATOR.run(pool).await?;
    info!("database migrations complete");
    Ok(())
}
