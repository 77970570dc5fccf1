//! # Repository Module
//!
//! The repository interfaces the application services consume, and their
//! SQLite implementations.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Repository Seams                                     │
//! │                                                                         │
//! │  Checkout orchestrator / report service / HTTP handlers                 │
//! │       │                                                                 │
//! │       │  inventory.list(), sales.create(&sale)                         │
//! │       ▼                                                                 │
//! │  trait InventoryRepository          trait SalesRepository               │
//! │  ├── list()                         ├── create(&Sale) -> SaleId         │
//! │  ├── get(id)                        ├── get(id)                         │
//! │  ├── create(NewItem)                └── list()                          │
//! │  ├── update(id, ItemChanges)                                            │
//! │  ├── decrement_stock(id, qty)                                           │
//! │  └── delete(id)                                                         │
//! │       │                                     │                           │
//! │       ▼                                     ▼                           │
//! │  SqliteInventoryRepository          SqliteSalesRepository               │
//! │       │                                     │                           │
//! │       └──────────────► SQLite ◄─────────────┘                           │
//! │                                                                         │
//! │  Writes return the stored record, so callers never re-fetch the        │
//! │  whole list after a mutation.                                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every failure is a [`DbError`]; callers treat it as an opaque repository
//! error and do not retry.

use async_trait::async_trait;
use mesha_core::{InventoryItem, ItemChanges, NewItem, Sale, SaleId};
use rust_decimal::Decimal;

use crate::error::DbResult;

pub mod inventory;
pub mod sale;

/// Inventory item CRUD.
#[async_trait]
pub trait InventoryRepository: Send + Sync {
    /// All items, sorted by name (case-insensitive).
    async fn list(&self) -> DbResult<Vec<InventoryItem>>;

    /// One item, or `None` if the id is unknown.
    async fn get(&self, id: &str) -> DbResult<Option<InventoryItem>>;

    /// Stores a new item with a generated id and returns it.
    async fn create(&self, item: NewItem) -> DbResult<InventoryItem>;

    /// Applies a partial update and returns the updated record.
    ///
    /// Fails with `DbError::NotFound` for an unknown id.
    async fn update(&self, id: &str, changes: ItemChanges) -> DbResult<InventoryItem>;

    /// Subtracts `quantity` from the stock as stored at the time of the
    /// write, so concurrent decrements all land. Returns the updated record.
    ///
    /// Fails with `DbError::NotFound` for an unknown id and
    /// `DbError::StockShortfall` if less than `quantity` is on hand.
    async fn decrement_stock(&self, id: &str, quantity: Decimal) -> DbResult<InventoryItem>;

    /// Deletes an item immediately (no soft delete).
    ///
    /// Fails with `DbError::NotFound` for an unknown id.
    async fn delete(&self, id: &str) -> DbResult<()>;
}

/// Append-only store of completed sales.
#[async_trait]
pub trait SalesRepository: Send + Sync {
    /// Records a sale and its lines atomically. Returns the sale id.
    async fn create(&self, sale: &Sale) -> DbResult<SaleId>;

    /// One sale, or `None` if the id is unknown.
    async fn get(&self, id: &str) -> DbResult<Option<Sale>>;

    /// All sales, newest first.
    async fn list(&self) -> DbResult<Vec<Sale>>;
}

// =============================================================================
// Column Codecs
// =============================================================================

pub(crate) mod codec {
    //! Decimal and timestamp TEXT columns.

    use chrono::{DateTime, SecondsFormat, Utc};
    use mesha_core::Money;
    use rust_decimal::Decimal;
    use std::str::FromStr;

    use crate::error::{DbError, DbResult};

    pub fn decimal_to_text(value: Decimal) -> String {
        value.normalize().to_string()
    }

    pub fn money_to_text(value: Money) -> String {
        decimal_to_text(value.amount())
    }

    pub fn decimal_from_text(column: &str, text: &str) -> DbResult<Decimal> {
        Decimal::from_str(text).map_err(|_| DbError::corrupt(column, text))
    }

    pub fn money_from_text(column: &str, text: &str) -> DbResult<Money> {
        decimal_from_text(column, text).map(Money::new)
    }

    pub fn time_to_text(value: DateTime<Utc>) -> String {
        value.to_rfc3339_opts(SecondsFormat::Micros, true)
    }

    pub fn time_from_text(column: &str, text: &str) -> DbResult<DateTime<Utc>> {
        DateTime::parse_from_rfc3339(text)
            .map(|t| t.with_timezone(&Utc))
            .map_err(|_| DbError::corrupt(column, text))
    }

}
