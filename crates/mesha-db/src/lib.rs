//! # mesha-db: Repository Layer for Mesha POS
//!
//! This crate defines the repository interfaces the checkout and report
//! services depend on, and implements them on SQLite with sqlx.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Mesha POS Data Flow                              │
//! │                                                                         │
//! │  Checkout orchestrator / report service (mesha-server)                  │
//! │       │                                                                 │
//! │       │  Arc<dyn InventoryRepository>, Arc<dyn SalesRepository>         │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     mesha-db (THIS CRATE)                       │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌────────────────────┐  ┌────────────┐  │   │
//! │  │   │   Database    │    │    Repositories    │  │ Migrations │  │   │
//! │  │   │   (pool.rs)   │    │                    │  │ (embedded) │  │   │
//! │  │   │               │    │ SqliteInventory-   │  │            │  │   │
//! │  │   │ SqlitePool    │◄───│   Repository       │  │ 001_init   │  │   │
//! │  │   │ WAL, FKs      │    │ SqliteSales-       │  │            │  │   │
//! │  │   │               │    │   Repository       │  │            │  │   │
//! │  │   └───────────────┘    └────────────────────┘  └────────────┘  │   │
//! │  │                                                                 │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     SQLite Database (mesha.db)                  │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded schema migrations and their status
//! - [`error`] - Database error types
//! - [`repository`] - Repository traits and SQLite implementations
//!
//! ## Usage
//!
//! ```rust,ignore
//! use mesha_db::{Database, DbConfig, InventoryRepository};
//!
//! let db = Database::new(DbConfig::new("mesha.db")).await?;
//!
//! let items = db.inventory().list().await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use migrations::MigrationStatus;
pub use pool::{Database, DbConfig};

pub use repository::inventory::SqliteInventoryRepository;
pub use repository::sale::SqliteSalesRepository;
pub use repository::{InventoryRepository, SalesRepository};
