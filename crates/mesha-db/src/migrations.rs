//! # Schema Migrations
//!
//! The SQL files under `migrations/sqlite/` are compiled into the binary and
//! applied by [`Database::new`](crate::Database::new) before any repository
//! is handed out.
//!
//! ## Schema
//! ```text
//! ┌──────────────────────┐      ┌──────────────────────┐      ┌──────────────────────┐
//! │ items                │      │ sales                │ 1  n │ sale_lines           │
//! │ id, name             │      │ id, receipt_number   │─────►│ sale_id, position    │
//! │ price, stock (TEXT)  │      │ totals (TEXT)        │      │ item_id (weak ref)   │
//! │ created/updated_at   │      │ payment, timestamp   │      │ name, qty, prices    │
//! └──────────────────────┘      └──────────────────────┘      └──────────────────────┘
//! ```
//!
//! A sale line copies the item's name and price at the time of sale. Its
//! `item_id` has no foreign key because items may be deleted afterwards.
//!
//! New migrations go in the same directory as `NNN_description.sql`. Money
//! and stock columns stay decimal TEXT.

use serde::Serialize;
use sqlx::SqlitePool;
use tracing::{debug, info};

use crate::error::DbResult;

static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("../../migrations/sqlite");

/// Applies every embedded migration not yet recorded in `_sqlx_migrations`.
pub async fn run_migrations(pool: &SqlitePool) -> DbResult<()> {
    debug!(embedded = MIGRATOR.migrations.len(), "Applying schema migrations");
    MIGRATOR.run(pool).await?;
    info!("Schema up to date");
    Ok(())
}

/// How far the database schema is from the binary's.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MigrationStatus {
    /// Migrations compiled into this binary.
    pub embedded: usize,
    /// Migrations recorded as successfully applied.
    pub applied: usize,
}

impl MigrationStatus {
    /// True when every embedded migration has been applied.
    pub fn is_current(&self) -> bool {
        self.applied >= self.embedded
    }
}

/// Counts embedded and applied migrations.
///
/// Fails if the bookkeeping table is missing, which means migrations never
/// ran against this database.
pub async fn migration_status(pool: &SqlitePool) -> DbResult<MigrationStatus> {
    let applied: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM _sqlx_migrations WHERE success = 1")
            .fetch_one(pool)
            .await?;

    Ok(MigrationStatus {
        embedded: MIGRATOR.migrations.len(),
        applied: usize::try_from(applied).unwrap_or(0),
    })
}
