//! # Inventory Repository
//!
//! SQLite storage for inventory items.
//!
//! ## Column Encoding
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  items                                                                  │
//! │  ├── id          TEXT  UUID v4, generated here                          │
//! │  ├── name        TEXT                                                   │
//! │  ├── price       TEXT  exact decimal ("150", "99.5")                    │
//! │  ├── stock       TEXT  exact decimal, fractional allowed ("2.5")        │
//! │  ├── created_at  TEXT  RFC 3339, UTC, microseconds                      │
//! │  └── updated_at  TEXT                                                   │
//! │                                                                         │
//! │  Decimals never pass through REAL, so 0.1 + 0.2 stays 0.3.             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Stock Decrements
//! Stock is TEXT, so SQL cannot subtract from it exactly. A decrement reads
//! the stored text, computes the new level as a `Decimal`, and writes it
//! only if the row still holds the text it read. A lost race re-reads and
//! tries again.

use async_trait::async_trait;
use chrono::Utc;
use mesha_core::{InventoryItem, ItemChanges, NewItem};
use rust_decimal::Decimal;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use tracing::debug;
use uuid::Uuid;

use super::codec::{
    decimal_from_text, decimal_to_text, money_from_text, money_to_text, time_from_text,
    time_to_text,
};
use super::InventoryRepository;
use crate::error::{DbError, DbResult};

/// Compare-and-set attempts per decrement.
const STOCK_WRITE_ATTEMPTS: u32 = 5;

const SELECT_ITEMS: &str = r#"
    SELECT id, name, price, stock, created_at, updated_at
    FROM items
"#;

/// SQLite-backed [`InventoryRepository`].
///
/// ## Usage
/// ```rust,ignore
/// let repo = SqliteInventoryRepository::new(pool);
/// let sugar = repo.create(NewItem { name: "Sugar 1kg".into(), .. }).await?;
/// repo.update(&sugar.id, ItemChanges::stock(dec!(11))).await?;
/// ```
#[derive(Debug, Clone)]
pub struct SqliteInventoryRepository {
    pool: SqlitePool,
}

impl SqliteInventoryRepository {
    /// Creates a new SqliteInventoryRepository.
    pub fn new(pool: SqlitePool) -> Self {
        SqliteInventoryRepository { pool }
    }

    /// Number of stored items.
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM items")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

#[async_trait]
impl InventoryRepository for SqliteInventoryRepository {
    async fn list(&self) -> DbResult<Vec<InventoryItem>> {
        let rows = sqlx::query(&format!("{SELECT_ITEMS} ORDER BY name COLLATE NOCASE, id"))
            .fetch_all(&self.pool)
            .await?;

        debug!(count = rows.len(), "Listed inventory");

        rows.iter().map(item_from_row).collect()
    }

    async fn get(&self, id: &str) -> DbResult<Option<InventoryItem>> {
        let row = sqlx::query(&format!("{SELECT_ITEMS} WHERE id = ?1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(item_from_row).transpose()
    }

    async fn create(&self, item: NewItem) -> DbResult<InventoryItem> {
        let now = Utc::now();
        let item = InventoryItem {
            id: Uuid::new_v4().to_string(),
            name: item.name,
            price: item.price,
            stock: item.stock,
            created_at: now,
            updated_at: now,
        };

        debug!(id = %item.id, name = %item.name, "Creating item");

        sqlx::query(
            r#"
            INSERT INTO items (id, name, price, stock, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
        )
        .bind(&item.id)
        .bind(&item.name)
        .bind(money_to_text(item.price))
        .bind(decimal_to_text(item.stock))
        .bind(time_to_text(item.created_at))
        .bind(time_to_text(item.updated_at))
        .execute(&self.pool)
        .await?;

        Ok(item)
    }

    async fn update(&self, id: &str, changes: ItemChanges) -> DbResult<InventoryItem> {
        debug!(id = %id, ?changes, "Updating item");

        let now = Utc::now();

        // COALESCE keeps the stored value for every field left as None
        let row = sqlx::query(
            r#"
            UPDATE items
            SET
                name = COALESCE(?2, name),
                price = COALESCE(?3, price),
                stock = COALESCE(?4, stock),
                updated_at = ?5
            WHERE id = ?1
            RETURNING id, name, price, stock, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(changes.name)
        .bind(changes.price.map(money_to_text))
        .bind(changes.stock.map(decimal_to_text))
        .bind(time_to_text(now))
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => item_from_row(&row),
            None => Err(DbError::not_found("Item", id)),
        }
    }

    async fn decrement_stock(&self, id: &str, quantity: Decimal) -> DbResult<InventoryItem> {
        for attempt in 1..=STOCK_WRITE_ATTEMPTS {
            let stored: Option<String> = sqlx::query_scalar("SELECT stock FROM items WHERE id = ?1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;
            let stored = stored.ok_or_else(|| DbError::not_found("Item", id))?;
            let available = decimal_from_text("items.stock", &stored)?;

            let remaining = match available.checked_sub(quantity) {
                Some(remaining) if remaining >= Decimal::ZERO => remaining,
                _ => {
                    return Err(DbError::StockShortfall {
                        id: id.to_string(),
                        available,
                        requested: quantity,
                    })
                }
            };

            let row = sqlx::query(
                r#"
                UPDATE items
                SET stock = ?3, updated_at = ?4
                WHERE id = ?1 AND stock = ?2
                RETURNING id, name, price, stock, created_at, updated_at
                "#,
            )
            .bind(id)
            .bind(&stored)
            .bind(decimal_to_text(remaining))
            .bind(time_to_text(Utc::now()))
            .fetch_optional(&self.pool)
            .await?;

            if let Some(row) = row {
                debug!(id = %id, %quantity, stock = %remaining, "Stock decremented");
                return item_from_row(&row);
            }
            debug!(id = %id, attempt, "Stock changed under decrement, retrying");
        }

        Err(DbError::TransactionFailed(format!(
            "stock of item {} kept changing",
            id
        )))
    }

    async fn delete(&self, id: &str) -> DbResult<()> {
        debug!(id = %id, "Deleting item");

        let result = sqlx::query("DELETE FROM items WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Item", id));
        }

        Ok(())
    }
}

fn item_from_row(row: &SqliteRow) -> DbResult<InventoryItem> {
    let price: String = row.try_get("price")?;
    let stock: String = row.try_get("stock")?;
    let created_at: String = row.try_get("created_at")?;
    let updated_at: String = row.try_get("updated_at")?;

    Ok(InventoryItem {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        price: money_from_text("items.price", &price)?,
        stock: decimal_from_text("items.stock", &stock)?,
        created_at: time_from_text("items.created_at", &created_at)?,
        updated_at: time_from_text("items.updated_at", &updated_at)?,
    })
}

// =============================================================================
// Unit Tests
// =============================================================================
