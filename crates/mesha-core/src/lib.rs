//! # mesha-core: Pure Business Logic for Mesha POS
//!
//! This crate is the **heart** of Mesha POS. It contains the checkout and
//! reporting rules as pure functions with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Mesha POS Architecture                           │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    Web Frontend                                 │   │
//! │  │    Inventory ──► Sales (cart) ──► Receipt ──► Reports          │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │ JSON over HTTP                         │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    mesha-server (axum)                          │   │
//! │  │    handlers, checkout orchestrator, report service              │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ mesha-core (THIS CRATE) ★                       │   │
//! │  │                                                                 │   │
//! │  │   ┌─────────┐ ┌─────────┐ ┌─────────┐ ┌─────────┐ ┌─────────┐  │   │
//! │  │   │  money  │ │  cart   │ │checkout │ │ report  │ │ receipt │  │   │
//! │  │   │  VAT    │ │ Session │ │ plan    │ │ filters │ │ layout  │  │   │
//! │  │   └─────────┘ └─────────┘ └─────────┘ └─────────┘ └─────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    mesha-db (Repository Layer)                  │   │
//! │  │          InventoryRepository, SalesRepository (SQLite)          │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`money`] - `Money` over exact decimals, VAT extraction, change
//! - [`types`] - Inventory items, sales, payment methods
//! - [`cart`] - `CartSession`: stock and price-negotiation rules
//! - [`checkout`] - Tender validation and sale planning
//! - [`report`] - Low-stock, inventory and time-based sales reports
//! - [`receipt`] - Receipt view-model and thermal text layout
//! - [`validation`] - Inventory form validation
//! - [`error`] - Domain error types
//!
//! ## Design Principles
//!
//! 1. **Pure Functions**: the clock is an argument, never read here
//! 2. **No I/O**: Database, network, file system access is FORBIDDEN here
//! 3. **Exact Money**: decimals end to end, rounded only for display
//! 4. **Explicit Errors**: All errors are typed, never strings or panics
//!
//! ## Example Usage
//!
//! ```rust
//! use mesha_core::money::{vat_breakdown, Money, VAT_RATE};
//!
//! let total = Money::from_major(116);
//! let breakdown = vat_breakdown(total, VAT_RATE);
//!
//! assert_eq!(breakdown.net, Money::from_major(100));
//! assert_eq!(breakdown.vat, Money::from_major(16));
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod cart;
pub mod checkout;
pub mod error;
pub mod money;
pub mod receipt;
pub mod report;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use cart::{CartLine, CartSession};
pub use error::{CoreError, CoreResult, ValidationError};
pub use money::Money;
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum distinct lines allowed in a single cart.
///
/// ## Business Reason
/// Prevents runaway carts and keeps receipts printable.
pub const MAX_CART_LINES: usize = 100;

/// Stock level at or below which the reports screen flags an item.
pub const REPORT_LOW_STOCK_THRESHOLD: u32 = 10;

/// Stock level at or below which the dashboard raises a low-stock alert.
///
/// Independent of [`REPORT_LOW_STOCK_THRESHOLD`]; the two surfaces are
/// configured separately.
pub const DASHBOARD_LOW_STOCK_THRESHOLD: u32 = 25;

/// How far below the catalog price a cashier may negotiate.
pub const NEGOTIATION_MAX_DISCOUNT: u32 = 50;

/// How far above the catalog price a cashier may negotiate.
pub const NEGOTIATION_MAX_MARKUP: u32 = 100;

/// Highest catalog price accepted by the inventory forms, in shillings.
///
/// Together with [`MAX_ITEM_STOCK`] and [`MAX_CART_LINES`] this keeps every
/// cart and sale total far inside `Decimal`'s range.
pub const MAX_ITEM_PRICE: i64 = 100_000_000;

/// Highest stock level accepted by the inventory forms.
pub const MAX_ITEM_STOCK: i64 = 10_000_000;
