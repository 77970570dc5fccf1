//! # Validation Module
//!
//! Input validation for the inventory forms and request parameters.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Web frontend                                                 │
//! │  └── Immediate feedback (required fields)                              │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: HTTP handler (Rust)                                          │
//! │  ├── Type validation (deserialization)                                 │
//! │  └── THIS MODULE: form rules                                           │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                            │
//! │  ├── NOT NULL constraints                                              │
//! │  └── Foreign key constraints                                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Form Rules
//! | Form     | name       | price     | stock     |
//! |----------|------------|-----------|-----------|
//! | Add item | non-empty  | `> 0`     | `> 0`     |
//! | Edit     | non-empty  | `>= 0`    | `>= 0`    |
//!
//! Price is capped at [`MAX_ITEM_PRICE`] and stock at [`MAX_ITEM_STOCK`] on
//! both forms.

use rust_decimal::Decimal;

use crate::error::ValidationError;
use crate::types::{ItemChanges, NewItem};
use crate::{MAX_ITEM_PRICE, MAX_ITEM_STOCK};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Longest accepted item name.
pub const MAX_NAME_LEN: usize = 200;

/// Longest accepted search query.
pub const MAX_QUERY_LEN: usize = 100;

// =============================================================================
// String Validators
// =============================================================================

/// Validates an item name and returns it trimmed.
///
/// ## Example
/// ```rust
/// use mesha_core::validation::validate_item_name;
///
/// assert_eq!(validate_item_name("  Sugar 1kg ").unwrap(), "Sugar 1kg");
/// assert!(validate_item_name("   ").is_err());
/// ```
pub fn validate_item_name(name: &str) -> ValidationResult<String> {
    let name = name.trim();

    if name.is_empty() {
        return Err(ValidationError::required("name"));
    }

    if name.chars().count() > MAX_NAME_LEN {
        return Err(ValidationError::TooLong {
            field: "name".to_string(),
            max: MAX_NAME_LEN,
        });
    }

    Ok(name.to_string())
}

/// Validates a search query.
///
/// Empty is allowed (returns everything). Returns the trimmed query.
pub fn validate_search_query(query: &str) -> ValidationResult<String> {
    let query = query.trim();

    if query.chars().count() > MAX_QUERY_LEN {
        return Err(ValidationError::TooLong {
            field: "query".to_string(),
            max: MAX_QUERY_LEN,
        });
    }

    Ok(query.to_string())
}

/// Validates an M-Pesa transaction code. Blank counts as missing.
pub fn validate_transaction_code(code: Option<&str>) -> Option<String> {
    code.map(str::trim)
        .filter(|c| !c.is_empty())
        .map(str::to_string)
}

// =============================================================================
// Numeric Validators
// =============================================================================

fn positive(field: &str, value: Decimal) -> ValidationResult<()> {
    if value <= Decimal::ZERO {
        return Err(ValidationError::MustBePositive {
            field: field.to_string(),
        });
    }
    Ok(())
}

fn non_negative(field: &str, value: Decimal) -> ValidationResult<()> {
    if value < Decimal::ZERO {
        return Err(ValidationError::Negative {
            field: field.to_string(),
        });
    }
    Ok(())
}

fn at_most(field: &str, value: Decimal, max: i64) -> ValidationResult<()> {
    if value > Decimal::from(max) {
        return Err(ValidationError::TooLarge {
            field: field.to_string(),
            max,
        });
    }
    Ok(())
}

/// Checks a catalog price and stock level against the form limits.
///
/// The cart applies the same check to records read back from storage.
pub fn validate_item_limits(price: Decimal, stock: Decimal) -> ValidationResult<()> {
    at_most("price", price, MAX_ITEM_PRICE)?;
    at_most("stock", stock, MAX_ITEM_STOCK)
}

// =============================================================================
// Form Validators
// =============================================================================

/// Validates the add-item form and returns it normalized (trimmed name).
///
/// ## User Workflow
/// ```text
/// ┌─────────────────────────────────────────────────────────────────────────┐
/// │  Inventory: Add Item                                                    │
/// │                                                                         │
/// │  name="Sugar 1kg", price=150, stock=40                                 │
/// │       │                                                                 │
/// │       ▼                                                                 │
/// │  validate_new_item ← THIS FUNCTION                                      │
/// │       │                                                                 │
/// │       ├── name blank?  → "name is required"                             │
/// │       ├── price <= 0?  → "price must be positive"                       │
/// │       ├── stock <= 0?  → "stock must be positive"                       │
/// │       ├── over limit?  → "price must be at most 100000000"              │
/// │       │                                                                 │
/// │       └── OK → InventoryRepository::create                             │
/// └─────────────────────────────────────────────────────────────────────────┘
/// ```
pub fn validate_new_item(item: NewItem) -> ValidationResult<NewItem> {
    let name = validate_item_name(&item.name)?;
    positive("price", item.price.amount())?;
    positive("stock", item.stock)?;
    validate_item_limits(item.price.amount(), item.stock)?;

    Ok(NewItem { name, ..item })
}

/// Validates an edit-form change set. Absent fields are not checked.
///
/// Zero price and zero stock are accepted on edit.
pub fn validate_item_changes(changes: ItemChanges) -> ValidationResult<ItemChanges> {
    let name = changes
        .name
        .as_deref()
        .map(validate_item_name)
        .transpose()?;

    if let Some(price) = changes.price {
        non_negative("price", price.amount())?;
        at_most("price", price.amount(), MAX_ITEM_PRICE)?;
    }
    if let Some(stock) = changes.stock {
        non_negative("stock", stock)?;
        at_most("stock", stock, MAX_ITEM_STOCK)?;
    }

    Ok(ItemChanges { name, ..changes })
}

// =============================================================================
// UUID Validators
// =============================================================================

/// Validates a UUID string format.
///
/// ## Example
/// ```rust
/// use mesha_core::validation::validate_uuid;
///
/// assert!(validate_uuid("550e8400-e29b-41d4-a716-446655440000").is_ok());
/// assert!(validate_uuid("not-a-uuid").is_err());
/// ```
pub fn validate_uuid(id: &str) -> ValidationResult<()> {
    if id.trim().is_empty() {
        return Err(ValidationError::required("id"));
    }

    uuid::Uuid::parse_str(id).map_err(|_| ValidationError::InvalidFormat {
        field: "id".to_string(),
        reason: "must be a valid UUID".to_string(),
    })?;

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::money::Money;
    use rust_decimal_macros::dec;

    fn form(name: &str, price: Decimal, stock: Decimal) -> NewItem {
        NewItem {
            name: name.to_string(),
            price: Money::new(price),
            stock,
        }
    }

    #[test]
    fn test_validate_new_item() {
        let ok = validate_new_item(form("  Bread ", dec!(60), dec!(12))).unwrap();
        assert_eq!(ok.name, "Bread");

        assert_eq!(
            validate_new_item(form("", dec!(60), dec!(12))),
            Err(ValidationError::required("name"))
        );
        assert!(matches!(
            validate_new_item(form("Bread", dec!(0), dec!(12))),
            Err(ValidationError::MustBePositive { field }) if field == "price"
        ));
        assert!(matches!(
            validate_new_item(form("Bread", dec!(60), dec!(0))),
            Err(ValidationError::MustBePositive { field }) if field == "stock"
        ));
    }

    #[test]
    fn test_validate_item_changes_allows_zero() {
        let changes = ItemChanges {
            name: Some(" Milk ".to_string()),
            price: Some(Money::zero()),
            stock: Some(dec!(0)),
        };
        let ok = validate_item_changes(changes).unwrap();
        assert_eq!(ok.name.as_deref(), Some("Milk"));

        let negative = ItemChanges {
            stock: Some(dec!(-1)),
            ..Default::default()
        };
        assert!(matches!(
            validate_item_changes(negative),
            Err(ValidationError::Negative { .. })
        ));

        let blank = ItemChanges {
            name: Some("  ".to_string()),
            ..Default::default()
        };
        assert!(validate_item_changes(blank).is_err());
    }

    #[test]
    fn test_prices_and_stock_are_capped() {
        let max_price = Decimal::from(MAX_ITEM_PRICE);
        let max_stock = Decimal::from(MAX_ITEM_STOCK);
        assert!(validate_new_item(form("Generator", max_price, max_stock)).is_ok());

        assert_eq!(
            validate_new_item(form("Generator", Decimal::MAX, dec!(5))),
            Err(ValidationError::TooLarge {
                field: "price".to_string(),
                max: MAX_ITEM_PRICE,
            })
        );
        assert!(matches!(
            validate_new_item(form("Matches", dec!(10), max_stock + dec!(1))),
            Err(ValidationError::TooLarge { field, .. }) if field == "stock"
        ));

        let edit = ItemChanges {
            price: Some(Money::new(Decimal::MAX)),
            ..Default::default()
        };
        assert!(matches!(
            validate_item_changes(edit),
            Err(ValidationError::TooLarge { field, .. }) if field == "price"
        ));
    }

    #[test]
    fn test_validate_item_name_length() {
        assert!(validate_item_name(&"A".repeat(MAX_NAME_LEN)).is_ok());
        assert!(validate_item_name(&"A".repeat(MAX_NAME_LEN + 1)).is_err());
    }

    #[test]
    fn test_validate_search_query() {
        assert_eq!(validate_search_query("  sug ").unwrap(), "sug");
        assert_eq!(validate_search_query("").unwrap(), "");
        assert!(validate_search_query(&"q".repeat(101)).is_err());
    }

    #[test]
    fn test_validate_transaction_code() {
        assert_eq!(validate_transaction_code(None), None);
        assert_eq!(validate_transaction_code(Some("   ")), None);
        assert_eq!(
            validate_transaction_code(Some(" QGH7XK2L9P ")).as_deref(),
            Some("QGH7XK2L9P")
        );
    }

    #[test]
    fn test_validate_uuid() {
        assert!(validate_uuid("550e8400-e29b-41d4-a716-446655440000").is_ok());
        assert!(validate_uuid("").is_err());
        assert!(validate_uuid("123").is_err());
    }
}
