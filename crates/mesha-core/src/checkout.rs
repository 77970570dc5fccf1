//! # Checkout Planning
//!
//! The pure half of checkout: tender validation and turning a cart plus
//! live inventory into a sale record and a list of stock writes.
//!
//! ## Checkout Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Checkout                                        │
//! │                                                                         │
//! │  CartSession + Tender                                                   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  validate_tender ──► EmptyCart / InsufficientCash /                     │
//! │       │              MissingTransactionCode                             │
//! │       ▼                                                                 │
//! │  (server) InventoryRepository::list ──► live items                      │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  plan_sale ──► ItemNotFound / InsufficientStock (vs LIVE stock)         │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SalePlan { sale, stock_updates }                                       │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  (server) SalesRepository::create, then InventoryRepository::update     │
//! │                                                                         │
//! │  Nothing in this module performs I/O. Every rejection happens before   │
//! │  the first write.                                                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::cart::{CartLine, CartSession};
use crate::error::{CoreError, CoreResult};
use crate::money::{change_due, vat_breakdown, Money, VAT_RATE};
use crate::types::{receipt_number, InventoryItem, ItemId, PaymentMethod, Sale, SaleLine};
use crate::validation::validate_transaction_code;

// =============================================================================
// Tender
// =============================================================================

/// How the customer pays.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Tender {
    pub method: PaymentMethod,
    /// Cash handed over. Required for cash, ignored otherwise.
    #[serde(default)]
    pub cash_received: Option<Money>,
    /// M-Pesa transaction code. Required for M-Pesa, ignored otherwise.
    #[serde(default)]
    pub mpesa_code: Option<String>,
}

impl Tender {
    pub fn cash(received: Money) -> Self {
        Tender {
            method: PaymentMethod::Cash,
            cash_received: Some(received),
            mpesa_code: None,
        }
    }

    pub fn card() -> Self {
        Tender {
            method: PaymentMethod::Card,
            cash_received: None,
            mpesa_code: None,
        }
    }

    pub fn mpesa(code: impl Into<String>) -> Self {
        Tender {
            method: PaymentMethod::Mpesa,
            cash_received: None,
            mpesa_code: Some(code.into()),
        }
    }
}

/// A tender that passed validation, with the values recorded on the sale.
#[derive(Debug, Clone, PartialEq)]
pub struct SettledTender {
    pub method: PaymentMethod,
    /// Zero for non-cash payments.
    pub cash_received: Money,
    /// Zero for non-cash payments.
    pub change: Money,
    /// Empty unless the method is M-Pesa.
    pub mpesa_code: String,
}

/// Checks the cart and tender before anything is fetched or written.
///
/// ## Errors
/// - `EmptyCart` if the cart has no lines
/// - `InsufficientCash` for cash below the total (a missing amount counts
///   as zero)
/// - `MissingTransactionCode` for M-Pesa with a blank code
pub fn validate_tender(cart: &CartSession, tender: &Tender) -> CoreResult<SettledTender> {
    if cart.is_empty() {
        return Err(CoreError::EmptyCart);
    }

    let total = cart.total()?;
    match tender.method {
        PaymentMethod::Cash => {
            let received = tender.cash_received.unwrap_or_default();
            let change = change_due(received, total).ok_or(CoreError::InsufficientCash {
                total,
                received,
            })?;
            Ok(SettledTender {
                method: PaymentMethod::Cash,
                cash_received: received,
                change,
                mpesa_code: String::new(),
            })
        }
        PaymentMethod::Card => Ok(SettledTender {
            method: PaymentMethod::Card,
            cash_received: Money::zero(),
            change: Money::zero(),
            mpesa_code: String::new(),
        }),
        PaymentMethod::Mpesa => {
            let code = validate_transaction_code(tender.mpesa_code.as_deref())
                .ok_or(CoreError::MissingTransactionCode)?;
            Ok(SettledTender {
                method: PaymentMethod::Mpesa,
                cash_received: Money::zero(),
                change: Money::zero(),
                mpesa_code: code,
            })
        }
    }
}

// =============================================================================
// Sale Plan
// =============================================================================

/// New stock level for one item after the sale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct StockUpdate {
    pub item_id: ItemId,
    /// Units sold.
    #[ts(as = "String")]
    pub quantity: Decimal,
    /// Stock as read from the live record.
    #[ts(as = "String")]
    pub previous_stock: Decimal,
    /// `previous_stock - quantity`, never negative.
    #[ts(as = "String")]
    pub new_stock: Decimal,
}

/// Everything checkout has to write, computed up front.
#[derive(Debug, Clone, PartialEq)]
pub struct SalePlan {
    pub sale: Sale,
    /// One entry per sale line, in sale-line order.
    pub stock_updates: Vec<StockUpdate>,
}

/// Text attached to a line sold below its current catalog price.
///
/// ```rust
/// use mesha_core::checkout::below_price_notification;
/// use mesha_core::Money;
///
/// assert_eq!(
///     below_price_notification("Sugar", Money::from_major(80), Money::from_major(100)),
///     "Item \"Sugar\" was sold for KSH 80.00, lower than the original price of KSH 100.00."
/// );
/// ```
pub fn below_price_notification(name: &str, sold_at: Money, catalog: Money) -> String {
    format!(
        "Item \"{name}\" was sold for {sold_at}, lower than the original price of {catalog}."
    )
}

fn plan_line(line: &CartLine, live: &InventoryItem) -> CoreResult<(SaleLine, StockUpdate)> {
    let requested = Decimal::from(line.quantity);
    let new_stock = live.stock - requested;
    if new_stock < Decimal::ZERO {
        return Err(CoreError::InsufficientStock {
            item: live.name.clone(),
            available: live.stock,
            requested,
        });
    }

    let notification = (line.unit_price < live.price)
        .then(|| below_price_notification(&line.name, line.unit_price, live.price));

    let sale_line = SaleLine {
        item_id: line.item_id.clone(),
        name: line.name.clone(),
        quantity: line.quantity,
        unit_price: line.unit_price,
        line_total: line.line_total()?,
        notification,
    };
    let update = StockUpdate {
        item_id: line.item_id.clone(),
        quantity: requested,
        previous_stock: live.stock,
        new_stock,
    };
    Ok((sale_line, update))
}

/// Builds the sale record and stock writes for a checkout.
///
/// ## Rules
/// - Lines are sorted by name, case-insensitive (receipt order)
/// - A line below the item's *live* catalog price gets a notification
/// - New stock is `live stock - quantity`; negative is rejected
///
/// ## Errors
/// Any tender error from [`validate_tender`], then `ItemNotFound` (item
/// deleted since it was carted) or `InsufficientStock` (live stock too
/// low). On error nothing has been decided and nothing must be written.
pub fn plan_sale(
    cart: &CartSession,
    tender: &Tender,
    live: &[InventoryItem],
    sale_id: impl Into<String>,
    now: DateTime<Utc>,
) -> CoreResult<SalePlan> {
    let settled = validate_tender(cart, tender)?;
    let by_id: HashMap<&str, &InventoryItem> =
        live.iter().map(|item| (item.id.as_str(), item)).collect();

    let mut ordered: Vec<&CartLine> = cart.lines().iter().collect();
    ordered.sort_by_cached_key(|line| line.name.to_lowercase());

    let mut items = Vec::with_capacity(ordered.len());
    let mut stock_updates = Vec::with_capacity(ordered.len());
    for line in ordered {
        let live_item = by_id
            .get(line.item_id.as_str())
            .ok_or_else(|| CoreError::ItemNotFound(line.name.clone()))?;
        let (sale_line, update) = plan_line(line, live_item)?;
        items.push(sale_line);
        stock_updates.push(update);
    }

    let total = cart.total()?;
    let breakdown = vat_breakdown(total, VAT_RATE);
    let id = sale_id.into();

    let sale = Sale {
        receipt_number: receipt_number(now, &id),
        id,
        items,
        net_amount: breakdown.net,
        vat: breakdown.vat,
        total,
        payment_method: settled.method,
        cash_received: settled.cash_received,
        change: settled.change,
        mpesa_code: settled.mpesa_code,
        timestamp: now,
    };

    Ok(SalePlan {
        sale,
        stock_updates,
    })
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rust_decimal_macros::dec;

    fn item(id: &str, name: &str, price: i64, stock: Decimal) -> InventoryItem {
        let at = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        InventoryItem {
            id: id.to_string(),
            name: name.to_string(),
            price: Money::from_major(price),
            stock,
            created_at: at,
            updated_at: at,
        }
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 5, 10, 30, 0).unwrap()
    }

    fn cart_with(items: &[&InventoryItem]) -> CartSession {
        let mut cart = CartSession::new("s1", now());
        for item in items {
            cart.add_item(item).unwrap();
        }
        cart
    }

    #[test]
    fn test_validate_empty_cart() {
        let cart = CartSession::new("s1", now());
        assert_eq!(
            validate_tender(&cart, &Tender::card()),
            Err(CoreError::EmptyCart)
        );
    }

    #[test]
    fn test_validate_insufficient_cash() {
        let rice = item("i1", "Rice", 850, dec!(4));
        let cart = cart_with(&[&rice]);

        let err = validate_tender(&cart, &Tender::cash(Money::from_major(800))).unwrap_err();
        assert_eq!(
            err,
            CoreError::InsufficientCash {
                total: Money::from_major(850),
                received: Money::from_major(800),
            }
        );

        let missing = Tender {
            cash_received: None,
            ..Tender::cash(Money::zero())
        };
        assert!(matches!(
            validate_tender(&cart, &missing),
            Err(CoreError::InsufficientCash { .. })
        ));
    }

    #[test]
    fn test_validate_mpesa_code() {
        let rice = item("i1", "Rice", 850, dec!(4));
        let cart = cart_with(&[&rice]);

        assert_eq!(
            validate_tender(&cart, &Tender::mpesa("  ")),
            Err(CoreError::MissingTransactionCode)
        );
        let settled = validate_tender(&cart, &Tender::mpesa(" QAB12CD34E ")).unwrap();
        assert_eq!(settled.mpesa_code, "QAB12CD34E");
        assert_eq!(settled.cash_received, Money::zero());
    }

    #[test]
    fn test_cash_change() {
        let rice = item("i1", "Rice", 850, dec!(4));
        let cart = cart_with(&[&rice]);

        let plan = plan_sale(
            &cart,
            &Tender::cash(Money::from_major(1000)),
            &[rice.clone()],
            "abcd0000",
            now(),
        )
        .unwrap();

        assert_eq!(plan.sale.change, Money::from_major(150));
        assert_eq!(plan.sale.change.to_string(), "KSH 150.00");
        assert_eq!(plan.sale.cash_received, Money::from_major(1000));
        assert_eq!(plan.sale.net_amount + plan.sale.vat, plan.sale.total);
    }

    #[test]
    fn test_lines_sorted_case_insensitive() {
        let a = item("i1", "banana", 10, dec!(9));
        let b = item("i2", "Apple", 10, dec!(9));
        let c = item("i3", "cherry", 10, dec!(9));
        let cart = cart_with(&[&a, &b, &c]);

        let plan = plan_sale(&cart, &Tender::card(), &[a, b, c], "s", now()).unwrap();
        let names: Vec<&str> = plan.sale.items.iter().map(|l| l.name.as_str()).collect();
        assert_eq!(names, ["Apple", "banana", "cherry"]);

        let ids: Vec<&str> = plan.stock_updates.iter().map(|u| u.item_id.as_str()).collect();
        assert_eq!(ids, ["i2", "i1", "i3"]);
    }

    #[test]
    fn test_notification_against_live_price() {
        let sugar = item("i1", "Sugar", 100, dec!(10));
        let mut cart = cart_with(&[&sugar]);
        cart.negotiate_price("i1", Money::from_major(80)).unwrap();

        let plan = plan_sale(&cart, &Tender::card(), &[sugar.clone()], "s", now()).unwrap();
        assert_eq!(
            plan.sale.items[0].notification.as_deref(),
            Some("Item \"Sugar\" was sold for KSH 80.00, lower than the original price of KSH 100.00.")
        );

        // Catalog price dropped to 80 meanwhile: no longer below price
        let repriced = InventoryItem {
            price: Money::from_major(80),
            ..sugar
        };
        let plan = plan_sale(&cart, &Tender::card(), &[repriced], "s", now()).unwrap();
        assert!(plan.sale.items[0].notification.is_none());
    }

    #[test]
    fn test_stock_checked_against_live_stock() {
        let milk = item("i1", "Milk", 65, dec!(5));
        let mut cart = cart_with(&[&milk]);
        cart.set_quantity("i1", 4).unwrap();

        let sold_elsewhere = InventoryItem {
            stock: dec!(3),
            ..milk.clone()
        };
        let err = plan_sale(&cart, &Tender::card(), &[sold_elsewhere], "s", now()).unwrap_err();
        assert_eq!(
            err,
            CoreError::InsufficientStock {
                item: "Milk".to_string(),
                available: dec!(3),
                requested: dec!(4),
            }
        );

        let plan = plan_sale(&cart, &Tender::card(), &[milk], "s", now()).unwrap();
        assert_eq!(plan.stock_updates[0].new_stock, dec!(1));
        assert_eq!(plan.stock_updates[0].quantity, dec!(2));
    }

    #[test]
    fn test_fractional_stock_decrement() {
        let rice = item("i1", "Rice (kg)", 180, dec!(2.5));
        let mut cart = cart_with(&[&rice]);
        cart.set_quantity("i1", 2).unwrap();

        let plan = plan_sale(&cart, &Tender::card(), &[rice], "s", now()).unwrap();
        assert_eq!(plan.stock_updates[0].new_stock, dec!(0.5));
    }

    #[test]
    fn test_deleted_item() {
        let eggs = item("i1", "Eggs", 15, dec!(30));
        let cart = cart_with(&[&eggs]);

        let err = plan_sale(&cart, &Tender::card(), &[], "s", now()).unwrap_err();
        assert_eq!(err, CoreError::ItemNotFound("Eggs".to_string()));
    }

    #[test]
    fn test_non_cash_sale_fields() {
        let eggs = item("i1", "Eggs", 15, dec!(30));
        let cart = cart_with(&[&eggs]);

        let plan = plan_sale(&cart, &Tender::mpesa("QX1"), &[eggs], "f00dbabe", now()).unwrap();
        let sale = plan.sale;
        assert_eq!(sale.payment_method, PaymentMethod::Mpesa);
        assert_eq!(sale.mpesa_code, "QX1");
        assert_eq!(sale.cash_received, Money::zero());
        assert_eq!(sale.change, Money::zero());
        assert_eq!(sale.receipt_number, "20240305-103000-F00D");
        assert_eq!(sale.timestamp, now());
    }
}
