//! # Error Types
//!
//! Domain-specific error types for mesha-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  mesha-core errors (this file)                                         │
//! │  ├── CoreError        - Cart, checkout and report rule violations      │
//! │  └── ValidationError  - Inventory form / request input failures        │
//! │                                                                         │
//! │  mesha-db errors (separate crate)                                      │
//! │  └── DbError          - Repository failures (opaque to the core)       │
//! │                                                                         │
//! │  mesha-server errors                                                   │
//! │  ├── CheckoutError    - Core or repository failure during checkout     │
//! │  └── ApiError         - What the frontend sees (JSON)                  │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → CheckoutError → ApiError          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Principles
//! 1. Use `thiserror` for derive macros (not manual impl)
//! 2. Include context in error messages (item name, amounts)
//! 3. Errors are enum variants, never String
//! 4. Each error variant maps to a user-facing message

use rust_decimal::Decimal;
use thiserror::Error;

use crate::money::Money;

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
///
/// Every variant is raised before any state is mutated: a failed cart
/// operation leaves the session as it was, a failed checkout plan issues no
/// writes.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CoreError {
    /// Requested quantity exceeds available stock.
    ///
    /// ## When This Occurs
    /// - Adding an item already at `quantity == stock`
    /// - Setting a quantity above the stock snapshot
    /// - Checkout re-validation against live stock
    ///
    /// ## User Workflow
    /// ```text
    /// Add to Cart (Sugar 1kg, already 5 in cart)
    ///      │
    ///      ▼
    /// Check stock snapshot: available=5
    ///      │
    ///      ▼
    /// InsufficientStock { item: "Sugar 1kg", available: 5, requested: 6 }
    ///      │
    ///      ▼
    /// UI shows: "Only 5 Sugar 1kg available in stock"
    /// ```
    #[error("Insufficient stock for {item}: available {available}, requested {requested}")]
    InsufficientStock {
        item: String,
        available: Decimal,
        requested: Decimal,
    },

    /// Negotiated price is outside the accepted band around catalog price.
    #[error("Price must be between {min} and {max} (offered {offered})")]
    PriceOutOfRange {
        min: Money,
        max: Money,
        offered: Money,
    },

    /// A cart quantity below one was requested.
    #[error("Quantity must be at least 1 (got {0})")]
    InvalidQuantity(i64),

    /// The item is not a line of the cart.
    #[error("Item {0} is not in the cart")]
    ItemNotInCart(String),

    /// The inventory item no longer exists.
    ///
    /// ## When This Occurs
    /// - Item deleted from inventory while it sat in an open cart
    #[error("Item not found: {0}")]
    ItemNotFound(String),

    /// Cart has exceeded maximum allowed lines.
    #[error("Cart cannot have more than {max} items")]
    CartTooLarge { max: usize },

    /// Checkout attempted with no lines.
    #[error("Cart is empty")]
    EmptyCart,

    /// Cash tendered does not cover the total.
    #[error("Insufficient cash received: total {total}, received {received}")]
    InsufficientCash { total: Money, received: Money },

    /// M-Pesa payment without a transaction code.
    #[error("M-Pesa transaction code is required")]
    MissingTransactionCode,

    /// A price or total left the range the till can represent.
    ///
    /// ## When This Occurs
    /// - Carting an item stored with a price or stock above the form limits
    /// - A line or cart total that cannot be computed exactly
    #[error("Amount too large: {0}")]
    AmountTooLarge(String),

    /// A time-based report matched no sales.
    #[error("No sales data found for the selected period")]
    NoSalesInPeriod,

    /// Report export failed to serialize.
    #[error("Report export failed: {0}")]
    Export(String),

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These errors occur when user input doesn't meet requirements.
/// Used for early validation before business logic runs.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Value must be strictly positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Value exceeds the accepted maximum.
    #[error("{field} must be at most {max}")]
    TooLarge { field: String, max: i64 },

    /// Value must not be negative.
    #[error("{field} cannot be negative")]
    Negative { field: String },

    /// Invalid format (e.g., unparseable date).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// A date range whose start falls after its end.
    #[error("start date {start} is after end date {end}")]
    InvertedRange { start: String, end: String },
}

impl ValidationError {
    /// Shorthand for [`ValidationError::Required`].
    pub fn required(field: impl Into<String>) -> Self {
        ValidationError::Required {
            field: field.into(),
        }
    }
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================
