//! # Domain Types
//!
//! Core domain entities for Mesha POS.
//!
//! ## Entity Relationship
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Domain Model                                     │
//! │                                                                         │
//! │  ┌─────────────────┐             ┌─────────────────────────────────┐   │
//! │  │ InventoryItem   │  weak ref   │ Sale                            │   │
//! │  │  ─────────────  │◄ ─ ─ ─ ─ ─ ─│  ─────────────────────────────  │   │
//! │  │  id, name       │  (item_id)  │  receipt_number                 │   │
//! │  │  price (incl.)  │             │  items: Vec<SaleLine> (frozen)  │   │
//! │  │  stock (dec.)   │             │  net_amount, vat, total         │   │
//! │  └─────────────────┘             │  payment_method, change         │   │
//! │                                  └─────────────────────────────────┘   │
//! │  ┌─────────────────┐                                                    │
//! │  │ PaymentMethod   │  Cash | Card | Mpesa                               │
//! │  └─────────────────┘                                                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Snapshot Pattern
//! A `SaleLine` keeps its own copy of the item name and unit price. The
//! referenced inventory item may later be renamed, repriced or deleted
//! without changing the recorded sale.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use ts_rs::TS;

use crate::money::Money;

/// Opaque identifier of an inventory item (UUID v4 string).
pub type ItemId = String;

/// Opaque identifier of a recorded sale (UUID v4 string).
pub type SaleId = String;

// =============================================================================
// Inventory Item
// =============================================================================

/// An item in the shop's inventory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct InventoryItem {
    /// Unique identifier (UUID v4).
    pub id: ItemId,

    /// Display name shown to cashier and on receipt.
    /// Unique by convention only.
    pub name: String,

    /// VAT-inclusive unit price.
    pub price: Money,

    /// Units on hand. Fractional units are allowed (sold by weight).
    #[ts(as = "String")]
    pub stock: Decimal,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,

    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl InventoryItem {
    /// Checks if `quantity` more units can be taken from stock.
    #[inline]
    pub fn can_sell(&self, quantity: u32) -> bool {
        self.stock >= Decimal::from(quantity)
    }
}

/// Fields of the add-item form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct NewItem {
    pub name: String,
    pub price: Money,
    #[ts(as = "String")]
    pub stock: Decimal,
}

/// A partial update of an inventory item.
///
/// Used by the edit form (any subset of fields) and by checkout (stock
/// only). `None` leaves the stored value untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ItemChanges {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub price: Option<Money>,
    #[serde(default)]
    #[ts(as = "Option<String>")]
    pub stock: Option<Decimal>,
}

impl ItemChanges {
    /// A stock-only change, as issued by checkout.
    pub fn stock(stock: Decimal) -> Self {
        ItemChanges {
            stock: Some(stock),
            ..Default::default()
        }
    }

    /// True when no field would change.
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.price.is_none() && self.stock.is_none()
    }
}

// =============================================================================
// Payment Method
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    /// Physical cash; change is computed.
    Cash,
    /// Card on an external terminal.
    Card,
    /// M-Pesa mobile money; a transaction code is required.
    Mpesa,
}

impl PaymentMethod {
    /// Wire / storage representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Cash => "cash",
            PaymentMethod::Card => "card",
            PaymentMethod::Mpesa => "mpesa",
        }
    }

    /// Label printed on the receipt tender row.
    pub fn receipt_label(&self) -> &'static str {
        match self {
            PaymentMethod::Cash => "CASH",
            PaymentMethod::Card => "CARD",
            PaymentMethod::Mpesa => "M-PESA",
        }
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for PaymentMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "cash" => Ok(PaymentMethod::Cash),
            "card" => Ok(PaymentMethod::Card),
            "mpesa" => Ok(PaymentMethod::Mpesa),
            other => Err(format!("unknown payment method: {other}")),
        }
    }
}

// =============================================================================
// Sale
// =============================================================================

/// One line of a recorded sale, frozen at time of sale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct SaleLine {
    /// Weak reference to the inventory item.
    pub item_id: ItemId,
    /// Item name at time of sale (frozen).
    pub name: String,
    pub quantity: u32,
    /// Unit price actually charged (possibly negotiated).
    pub unit_price: Money,
    /// `unit_price × quantity`.
    pub line_total: Money,
    /// Set when the item sold below its catalog price.
    pub notification: Option<String>,
}

/// A completed sale. Immutable once recorded.
///
/// ## Invariants
/// - `total == net_amount + vat`
/// - Cash: `change == cash_received - total` and `cash_received >= total`
/// - Card / M-Pesa: `cash_received == change == 0`
/// - `mpesa_code` is empty unless the method is M-Pesa
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Sale {
    pub id: SaleId,
    /// Human-readable receipt number, see [`receipt_number`].
    pub receipt_number: String,
    /// Lines sorted by name, case-insensitive.
    pub items: Vec<SaleLine>,
    pub net_amount: Money,
    pub vat: Money,
    pub total: Money,
    pub payment_method: PaymentMethod,
    pub cash_received: Money,
    pub change: Money,
    pub mpesa_code: String,
    #[ts(as = "String")]
    pub timestamp: DateTime<Utc>,
}

impl Sale {
    /// Total number of units sold across all lines.
    pub fn total_quantity(&self) -> u32 {
        self.items.iter().map(|line| line.quantity).sum()
    }

    /// Lines that sold below catalog price.
    pub fn notifications(&self) -> impl Iterator<Item = &str> {
        self.items
            .iter()
            .filter_map(|line| line.notification.as_deref())
    }
}

/// Builds the receipt number `YYYYMMDD-HHMMSS-XXXX` from the sale time and
/// the first four hex characters of the sale id (upper-cased).
///
/// Not unique: two sales in the same second can share a number. The sale
/// id identifies a sale.
///
/// ```rust
/// use chrono::{TimeZone, Utc};
/// use mesha_core::types::receipt_number;
///
/// let at = Utc.with_ymd_and_hms(2024, 3, 5, 14, 7, 9).unwrap();
/// assert_eq!(
///     receipt_number(at, "a1b2c3d4-0000-4000-8000-000000000000"),
///     "20240305-140709-A1B2"
/// );
/// ```
pub fn receipt_number(timestamp: DateTime<Utc>, sale_id: &str) -> String {
    let suffix: String = sale_id
        .chars()
        .filter(|c| c.is_ascii_hexdigit())
        .take(4)
        .collect::<String>()
        .to_ascii_uppercase();
    format!("{}-{}", timestamp.format("%Y%m%d-%H%M%S"), suffix)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rust_decimal_macros::dec;

    #[test]
    fn test_payment_method_wire_format() {
        assert_eq!(serde_json::to_string(&PaymentMethod::Mpesa).unwrap(), "\"mpesa\"");
        let parsed: PaymentMethod = serde_json::from_str("\"card\"").unwrap();
        assert_eq!(parsed, PaymentMethod::Card);
        assert_eq!("cash".parse::<PaymentMethod>(), Ok(PaymentMethod::Cash));
        assert!("cheque".parse::<PaymentMethod>().is_err());
    }

    #[test]
    fn test_can_sell_fractional_stock() {
        let now = Utc::now();
        let item = InventoryItem {
            id: "i1".to_string(),
            name: "Rice (kg)".to_string(),
            price: Money::from_major(180),
            stock: dec!(2.5),
            created_at: now,
            updated_at: now,
        };
        assert!(item.can_sell(2));
        assert!(!item.can_sell(3));
    }

    #[test]
    fn test_item_changes_stock_only() {
        let changes = ItemChanges::stock(dec!(4));
        assert_eq!(changes.stock, Some(dec!(4)));
        assert!(changes.name.is_none() && changes.price.is_none());
        assert!(ItemChanges::default().is_empty());
    }

    #[test]
    fn test_receipt_number_skips_hyphens() {
        let at = Utc.with_ymd_and_hms(2024, 12, 31, 23, 59, 59).unwrap();
        assert_eq!(receipt_number(at, "ab-cdef"), "20241231-235959-ABCD");
    }
}
