//! # Cart Session
//!
//! The cart of one sale in progress, with the stock and price-negotiation
//! rules a cashier works under.
//!
//! ## Cart Operations Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Cart Session Operations                              │
//! │                                                                         │
//! │  Cashier Action           Operation               Rule                  │
//! │  ──────────────           ─────────               ────                  │
//! │                                                                         │
//! │  Click item ─────────────► add_item() ──────────► qty + 1 <= stock      │
//! │                                                                         │
//! │  Edit quantity ──────────► set_quantity() ──────► 1 <= qty <= stock     │
//! │                                                                         │
//! │  Edit price ─────────────► negotiate_price() ───► catalog - 50          │
//! │                                                  <= price <=            │
//! │                                                  catalog + 100, >= 0    │
//! │                                                                         │
//! │  Click remove ───────────► remove_item() ───────► always                │
//! │                                                                         │
//! │  New sale ───────────────► clear() ─────────────► always                │
//! │                                                                         │
//! │  NOTE: A rejected operation leaves the session exactly as it was.      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Stock Snapshots
//! Each line remembers the item's stock as last seen (`stock_snapshot`).
//! Cart rules check against the snapshot; checkout re-checks against live
//! stock because other tills may have sold the same item meanwhile.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult};
use crate::money::{change_due, vat_breakdown, Money, VatBreakdown, VAT_RATE};
use crate::types::{InventoryItem, ItemId};
use crate::validation::validate_item_limits;
use crate::{MAX_CART_LINES, NEGOTIATION_MAX_DISCOUNT, NEGOTIATION_MAX_MARKUP};

// =============================================================================
// Cart Line
// =============================================================================

/// One line of the cart.
///
/// ## Design Notes
/// - `catalog_price`: the item's price when the line was created. Fixed for
///   the life of the line; negotiation bounds are always relative to it.
/// - `unit_price`: what the customer pays per unit. Starts at the catalog
///   price and changes only through [`CartSession::negotiate_price`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CartLine {
    pub item_id: ItemId,
    pub name: String,
    pub catalog_price: Money,
    pub unit_price: Money,
    pub quantity: u32,
    #[ts(as = "String")]
    pub stock_snapshot: Decimal,
}

impl CartLine {
    fn from_item(item: &InventoryItem) -> Self {
        CartLine {
            item_id: item.id.clone(),
            name: item.name.clone(),
            catalog_price: item.price,
            unit_price: item.price,
            quantity: 1,
            stock_snapshot: item.stock,
        }
    }

    /// `unit_price × quantity`.
    ///
    /// ## Errors
    /// - `AmountTooLarge` if the product overflows
    pub fn line_total(&self) -> CoreResult<Money> {
        self.unit_price
            .checked_mul(self.quantity)
            .ok_or_else(|| CoreError::AmountTooLarge(format!("line total of {}", self.name)))
    }

    /// Closed interval of acceptable negotiated prices.
    ///
    /// ```rust
    /// use mesha_core::cart::CartLine;
    /// use mesha_core::Money;
    /// use rust_decimal::Decimal;
    ///
    /// let line = CartLine {
    ///     item_id: "i1".into(),
    ///     name: "Soap".into(),
    ///     catalog_price: Money::from_major(30),
    ///     unit_price: Money::from_major(30),
    ///     quantity: 1,
    ///     stock_snapshot: Decimal::from(10),
    /// };
    /// // Lower bound is clamped at zero
    /// assert_eq!(line.negotiation_bounds(), (Money::zero(), Money::from_major(130)));
    /// ```
    pub fn negotiation_bounds(&self) -> (Money, Money) {
        let catalog = self.catalog_price.amount();
        let lower = catalog
            .checked_sub(Decimal::from(NEGOTIATION_MAX_DISCOUNT))
            .unwrap_or(Decimal::MIN)
            .max(Decimal::ZERO);
        let upper = catalog
            .checked_add(Decimal::from(NEGOTIATION_MAX_MARKUP))
            .unwrap_or(Decimal::MAX);
        (Money::new(lower), Money::new(upper))
    }

    /// True when the unit price differs from the catalog price.
    pub fn is_negotiated(&self) -> bool {
        self.unit_price != self.catalog_price
    }
}

// =============================================================================
// Cart Session
// =============================================================================

/// The cart of a single sale session.
///
/// ## Invariants
/// - Lines are unique by `item_id` (adding again increments the quantity)
/// - `1 <= quantity <= stock_snapshot` for every line
/// - At most [`MAX_CART_LINES`] lines
/// - Lines keep insertion order (display order)
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CartSession {
    /// Session identifier (UUID v4).
    pub id: String,

    lines: Vec<CartLine>,

    /// When the session was opened or last cleared.
    #[ts(as = "String")]
    pub started_at: DateTime<Utc>,
}

impl CartSession {
    /// Opens an empty session.
    pub fn new(id: impl Into<String>, started_at: DateTime<Utc>) -> Self {
        CartSession {
            id: id.into(),
            lines: Vec::new(),
            started_at,
        }
    }

    /// The cart lines in display order.
    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    /// Looks up the line for an item.
    pub fn line(&self, item_id: &str) -> Option<&CartLine> {
        self.lines.iter().find(|l| l.item_id == item_id)
    }

    fn line_mut(&mut self, item_id: &str) -> Option<&mut CartLine> {
        self.lines.iter_mut().find(|l| l.item_id == item_id)
    }

    // -------------------------------------------------------------------------
    // Mutations
    // -------------------------------------------------------------------------

    /// Adds one unit of `item`.
    ///
    /// ## Behavior
    /// - Already in cart: quantity + 1, refreshing the stock snapshot and name
    /// - Not in cart: new line with quantity 1 at catalog price
    ///
    /// ## Errors
    /// - `AmountTooLarge` if the item's price or stock is above the
    ///   inventory form limits
    /// - `InsufficientStock` if the new quantity exceeds `item.stock`
    /// - `CartTooLarge` if a new line would exceed [`MAX_CART_LINES`]
    pub fn add_item(&mut self, item: &InventoryItem) -> CoreResult<&CartLine> {
        validate_item_limits(item.price.amount(), item.stock)
            .map_err(|e| CoreError::AmountTooLarge(format!("{}: {}", item.name, e)))?;

        if let Some(pos) = self.lines.iter().position(|l| l.item_id == item.id) {
            let requested = self.lines[pos].quantity.saturating_add(1);
            if Decimal::from(requested) > item.stock {
                return Err(CoreError::InsufficientStock {
                    item: item.name.clone(),
                    available: item.stock,
                    requested: Decimal::from(requested),
                });
            }

            let line = &mut self.lines[pos];
            line.quantity = requested;
            line.stock_snapshot = item.stock;
            line.name = item.name.clone();
            return Ok(&self.lines[pos]);
        }

        if self.lines.len() >= MAX_CART_LINES {
            return Err(CoreError::CartTooLarge {
                max: MAX_CART_LINES,
            });
        }

        if item.stock < Decimal::ONE {
            return Err(CoreError::InsufficientStock {
                item: item.name.clone(),
                available: item.stock,
                requested: Decimal::ONE,
            });
        }

        self.lines.push(CartLine::from_item(item));
        let last = self.lines.len() - 1;
        Ok(&self.lines[last])
    }

    /// Sets the quantity of a line.
    ///
    /// ## Errors
    /// - `InvalidQuantity` if `quantity < 1`
    /// - `ItemNotInCart` if the item has no line
    /// - `InsufficientStock` if `quantity` exceeds the stock snapshot
    pub fn set_quantity(&mut self, item_id: &str, quantity: i64) -> CoreResult<&CartLine> {
        if quantity < 1 {
            return Err(CoreError::InvalidQuantity(quantity));
        }

        let line = self
            .line_mut(item_id)
            .ok_or_else(|| CoreError::ItemNotInCart(item_id.to_string()))?;

        let requested = Decimal::from(quantity);
        let qty = match u32::try_from(quantity) {
            Ok(qty) if requested <= line.stock_snapshot => qty,
            _ => {
                return Err(CoreError::InsufficientStock {
                    item: line.name.clone(),
                    available: line.stock_snapshot,
                    requested,
                })
            }
        };

        line.quantity = qty;
        Ok(&*line)
    }

    /// Refreshes a line's stock snapshot from a freshly fetched record.
    ///
    /// Returns false when the item has no line. The quantity is left alone
    /// even if it now exceeds stock; checkout catches that.
    pub fn observe_stock(&mut self, item: &InventoryItem) -> bool {
        match self.line_mut(&item.id) {
            Some(line) => {
                line.stock_snapshot = item.stock;
                true
            }
            None => false,
        }
    }

    /// Overrides the unit price of a line.
    ///
    /// Accepts exactly `[catalog - 50, catalog + 100] ∩ [0, ∞)`, where
    /// `catalog` is the price captured when the line was created, even after
    /// earlier negotiations.
    ///
    /// ## Errors
    /// - `ItemNotInCart` if the item has no line
    /// - `PriceOutOfRange` otherwise; the line is untouched
    pub fn negotiate_price(&mut self, item_id: &str, price: Money) -> CoreResult<&CartLine> {
        let line = self
            .line_mut(item_id)
            .ok_or_else(|| CoreError::ItemNotInCart(item_id.to_string()))?;

        let (min, max) = line.negotiation_bounds();
        if price < min || price > max {
            return Err(CoreError::PriceOutOfRange {
                min,
                max,
                offered: price,
            });
        }

        line.unit_price = price;
        Ok(&*line)
    }

    /// Removes a line. Removing an item that is not in the cart is a no-op.
    ///
    /// Returns the removed line, if any.
    pub fn remove_item(&mut self, item_id: &str) -> Option<CartLine> {
        let pos = self.lines.iter().position(|l| l.item_id == item_id)?;
        Some(self.lines.remove(pos))
    }

    /// Empties the cart for a new sale.
    pub fn clear(&mut self, now: DateTime<Utc>) {
        self.lines.clear();
        self.started_at = now;
    }

    // -------------------------------------------------------------------------
    // Derived values
    // -------------------------------------------------------------------------

    /// VAT-inclusive total, `Σ unit_price × quantity`.
    ///
    /// ## Errors
    /// - `AmountTooLarge` if a line total or the sum overflows
    pub fn total(&self) -> CoreResult<Money> {
        let line_totals = self
            .lines
            .iter()
            .map(CartLine::line_total)
            .collect::<CoreResult<Vec<_>>>()?;
        Money::checked_sum(line_totals)
            .ok_or_else(|| CoreError::AmountTooLarge("cart total".to_string()))
    }

    /// Net / VAT split of the total.
    pub fn vat(&self) -> CoreResult<VatBreakdown> {
        Ok(vat_breakdown(self.total()?, VAT_RATE))
    }

    /// Change owed for a cash tender, `None` if the cash is short.
    pub fn change_for(&self, cash_received: Money) -> CoreResult<Option<Money>> {
        Ok(change_due(cash_received, self.total()?))
    }

    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    /// Units across all lines.
    pub fn total_quantity(&self) -> u32 {
        self.lines.iter().map(|l| l.quantity).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
