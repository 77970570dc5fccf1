//! # Checkout Orchestrator
//!
//! Drives a checkout against the repositories.
//!
//! ## Sequence
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Checkout Sequence                                 │
//! │                                                                         │
//! │  1. validate_tender           no repository calls on failure            │
//! │  2. inventory.list()          live stock and prices                     │
//! │  3. plan_sale                 no writes on failure                      │
//! │  4. sales.create(&sale)       ── first write ──                         │
//! │  5. inventory.decrement_stock one per line, in sale-line order          │
//! │  6. cart.clear()                                                        │
//! │                                                                         │
//! │  Failure in 1-4 leaves the cart untouched and nothing recorded.         │
//! │  Failure in 5 returns Incomplete: the sale stands, the cart is          │
//! │  cleared, and the unwritten item ids are logged. There is no rollback. │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Callers hold the session's mutex for the whole call, so a second submit
//! of the same cart waits and then fails with `EmptyCart`.
//!
//! Step 5 subtracts each line's quantity from the stock stored at write
//! time, not the level read in step 2, so checkouts on different tills
//! never overwrite each other's decrements. If another till sold the last
//! units in between, the decrement fails with `StockShortfall` and the
//! checkout ends `Incomplete` rather than driving stock negative.

use chrono::{DateTime, Utc};
use mesha_core::checkout::{plan_sale, validate_tender, Tender};
use mesha_core::{CartSession, CoreError, ItemId, Sale, SaleId};
use mesha_db::{DbError, InventoryRepository, SalesRepository};
use tracing::{error, info, warn};
use uuid::Uuid;

/// Why a checkout did not complete.
#[derive(Debug, thiserror::Error)]
pub enum CheckoutError {
    /// A business rule rejected the checkout. Nothing was written.
    #[error(transparent)]
    Rejected(#[from] CoreError),

    /// A repository call failed before the sale was recorded. Nothing was
    /// written.
    #[error("Checkout failed: {0}")]
    Repository(#[from] DbError),

    /// The sale was recorded but some stock levels were not written.
    #[error("Sale {sale_id} recorded but stock not updated for {pending_items:?}: {source}")]
    Incomplete {
        sale_id: SaleId,
        pending_items: Vec<ItemId>,
        #[source]
        source: DbError,
    },
}

/// Runs a checkout of `cart`.
///
/// ## Returns
/// The recorded sale. The cart is empty afterwards.
///
/// ## Errors
/// See [`CheckoutError`]. On `Rejected` and `Repository` the cart is
/// unchanged so the cashier can correct it and retry.
pub async fn checkout(
    inventory: &dyn InventoryRepository,
    sales: &dyn SalesRepository,
    cart: &mut CartSession,
    tender: &Tender,
    now: DateTime<Utc>,
) -> Result<Sale, CheckoutError> {
    if let Err(e) = validate_tender(cart, tender) {
        warn!(session = %cart.id, method = %tender.method, error = %e, "Checkout rejected");
        return Err(e.into());
    }

    let live = inventory.list().await?;

    let plan = match plan_sale(cart, tender, &live, Uuid::new_v4().to_string(), now) {
        Ok(plan) => plan,
        Err(e) => {
            warn!(session = %cart.id, error = %e, "Checkout rejected against live stock");
            return Err(e.into());
        }
    };

    let sale_id = sales.create(&plan.sale).await?;

    for (done, update) in plan.stock_updates.iter().enumerate() {
        if let Err(source) = inventory
            .decrement_stock(&update.item_id, update.quantity)
            .await
        {
            let pending_items: Vec<ItemId> = plan.stock_updates[done..]
                .iter()
                .map(|u| u.item_id.clone())
                .collect();

            error!(
                sale_id = %sale_id,
                receipt_number = %plan.sale.receipt_number,
                pending_items = ?pending_items,
                error = %source,
                "Sale recorded but stock update failed"
            );

            cart.clear(now);
            return Err(CheckoutError::Incomplete {
                sale_id,
                pending_items,
                source,
            });
        }
    }

    cart.clear(now);

    info!(
        sale_id = %sale_id,
        receipt_number = %plan.sale.receipt_number,
        total = %plan.sale.total,
        method = %plan.sale.payment_method,
        lines = plan.sale.items.len(),
        "Sale recorded"
    );

    for notification in plan.sale.notifications() {
        info!(sale_id = %sale_id, "{}", notification);
    }

    Ok(plan.sale)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::TimeZone;
    use mesha_core::{InventoryItem, ItemChanges, Money, NewItem, PaymentMethod};
    use mesha_db::DbResult;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// In-memory inventory that counts calls and can fail updates.
    #[derive(Default)]
    pub(crate) struct FakeInventory {
        pub items: Mutex<Vec<InventoryItem>>,
        pub lists: AtomicUsize,
        pub writes: AtomicUsize,
        pub fail_update_for: Mutex<Option<String>>,
        /// Units another till sells right after the next `list()`.
        pub sold_elsewhere: Mutex<Option<(String, Decimal)>>,
    }

    impl FakeInventory {
        pub fn with(items: Vec<InventoryItem>) -> Self {
            FakeInventory {
                items: Mutex::new(items),
                ..Default::default()
            }
        }

        pub fn stock_of(&self, id: &str) -> Decimal {
            self.items
                .lock()
                .unwrap()
                .iter()
                .find(|i| i.id == id)
                .map(|i| i.stock)
                .unwrap()
        }
    }

    #[async_trait]
    impl InventoryRepository for FakeInventory {
        async fn list(&self) -> DbResult<Vec<InventoryItem>> {
            self.lists.fetch_add(1, Ordering::SeqCst);
            let mut items = self.items.lock().unwrap();
            let snapshot = mesha_core::report::sorted_by_name(&items);
            if let Some((id, sold)) = self.sold_elsewhere.lock().unwrap().take() {
                let item = items.iter_mut().find(|i| i.id == id).unwrap();
                item.stock -= sold;
            }
            Ok(snapshot)
        }

        async fn get(&self, id: &str) -> DbResult<Option<InventoryItem>> {
            Ok(self.items.lock().unwrap().iter().find(|i| i.id == id).cloned())
        }

        async fn create(&self, item: NewItem) -> DbResult<InventoryItem> {
            self.writes.fetch_add(1, Ordering::SeqCst);
            let now = Utc::now();
            let item = InventoryItem {
                id: Uuid::new_v4().to_string(),
                name: item.name,
                price: item.price,
                stock: item.stock,
                created_at: now,
                updated_at: now,
            };
            self.items.lock().unwrap().push(item.clone());
            Ok(item)
        }

        async fn update(&self, id: &str, changes: ItemChanges) -> DbResult<InventoryItem> {
            if self.fail_update_for.lock().unwrap().as_deref() == Some(id) {
                return Err(DbError::QueryFailed("disk I/O error".to_string()));
            }
            self.writes.fetch_add(1, Ordering::SeqCst);
            let mut items = self.items.lock().unwrap();
            let item = items
                .iter_mut()
                .find(|i| i.id == id)
                .ok_or_else(|| DbError::not_found("Item", id))?;
            if let Some(name) = changes.name {
                item.name = name;
            }
            if let Some(price) = changes.price {
                item.price = price;
            }
            if let Some(stock) = changes.stock {
                item.stock = stock;
            }
            item.updated_at = Utc::now();
            Ok(item.clone())
        }

        async fn decrement_stock(&self, id: &str, quantity: Decimal) -> DbResult<InventoryItem> {
            if self.fail_update_for.lock().unwrap().as_deref() == Some(id) {
                return Err(DbError::QueryFailed("disk I/O error".to_string()));
            }
            let mut items = self.items.lock().unwrap();
            let item = items
                .iter_mut()
                .find(|i| i.id == id)
                .ok_or_else(|| DbError::not_found("Item", id))?;
            if item.stock < quantity {
                return Err(DbError::StockShortfall {
                    id: id.to_string(),
                    available: item.stock,
                    requested: quantity,
                });
            }
            self.writes.fetch_add(1, Ordering::SeqCst);
            item.stock -= quantity;
            item.updated_at = Utc::now();
            Ok(item.clone())
        }

        async fn delete(&self, id: &str) -> DbResult<()> {
            self.writes.fetch_add(1, Ordering::SeqCst);
            let mut items = self.items.lock().unwrap();
            let before = items.len();
            items.retain(|i| i.id != id);
            if items.len() == before {
                return Err(DbError::not_found("Item", id));
            }
            Ok(())
        }
    }

    /// In-memory sales store that counts writes.
    #[derive(Default)]
    pub(crate) struct FakeSales {
        pub sales: Mutex<Vec<Sale>>,
        pub writes: AtomicUsize,
        pub fail: bool,
    }

    #[async_trait]
    impl SalesRepository for FakeSales {
        async fn create(&self, sale: &Sale) -> DbResult<SaleId> {
            if self.fail {
                return Err(DbError::ConnectionFailed("database is locked".to_string()));
            }
            self.writes.fetch_add(1, Ordering::SeqCst);
            self.sales.lock().unwrap().push(sale.clone());
            Ok(sale.id.clone())
        }

        async fn get(&self, id: &str) -> DbResult<Option<Sale>> {
            Ok(self.sales.lock().unwrap().iter().find(|s| s.id == id).cloned())
        }

        async fn list(&self) -> DbResult<Vec<Sale>> {
            let mut sales = self.sales.lock().unwrap().clone();
            sales.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
            Ok(sales)
        }
    }

    pub(crate) fn item(id: &str, name: &str, price: i64, stock: Decimal) -> InventoryItem {
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

    fn shop() -> (FakeInventory, FakeSales) {
        let inventory = FakeInventory::with(vec![
            item("sugar", "Sugar 1kg", 150, dec!(10)),
            item("bread", "bread", 65, dec!(3)),
            item("milk", "Milk 500ml", 60, dec!(2.5)),
        ]);
        (inventory, FakeSales::default())
    }

    fn cart_of(inventory: &FakeInventory, ids: &[&str]) -> CartSession {
        let mut cart = CartSession::new("session-1", now());
        let items = inventory.items.lock().unwrap();
        for id in ids {
            let item = items.iter().find(|i| i.id == *id).unwrap();
            cart.add_item(item).unwrap();
        }
        cart
    }

    #[tokio::test]
    async fn test_cash_checkout_records_sale_and_decrements_stock() {
        let (inventory, sales) = shop();
        let mut cart = cart_of(&inventory, &["sugar", "sugar", "bread", "milk"]);

        let sale = checkout(
            &inventory,
            &sales,
            &mut cart,
            &Tender::cash(Money::from_major(1000)),
            now(),
        )
        .await
        .unwrap();

        assert_eq!(sale.total, Money::from_major(425));
        assert_eq!(sale.change, Money::from_major(575));
        assert_eq!(sale.net_amount + sale.vat, sale.total);
        let names: Vec<_> = sale.items.iter().map(|l| l.name.as_str()).collect();
        assert_eq!(names, vec!["bread", "Milk 500ml", "Sugar 1kg"]);

        assert_eq!(inventory.stock_of("sugar"), dec!(8));
        assert_eq!(inventory.stock_of("bread"), dec!(2));
        assert_eq!(inventory.stock_of("milk"), dec!(1.5));
        assert_eq!(sales.writes.load(Ordering::SeqCst), 1);
        assert!(cart.is_empty());
    }

    #[tokio::test]
    async fn test_insufficient_cash_touches_no_repository() {
        let (inventory, sales) = shop();
        let mut cart = cart_of(&inventory, &["sugar"]);

        let err = checkout(
            &inventory,
            &sales,
            &mut cart,
            &Tender::cash(Money::from_major(100)),
            now(),
        )
        .await
        .unwrap_err();

        assert!(matches!(
            err,
            CheckoutError::Rejected(CoreError::InsufficientCash { .. })
        ));
        assert_eq!(inventory.lists.load(Ordering::SeqCst), 0);
        assert_eq!(inventory.writes.load(Ordering::SeqCst), 0);
        assert_eq!(sales.writes.load(Ordering::SeqCst), 0);
        assert_eq!(cart.line_count(), 1);
    }

    #[tokio::test]
    async fn test_mpesa_without_code_is_rejected() {
        let (inventory, sales) = shop();
        let mut cart = cart_of(&inventory, &["bread"]);

        let tender = Tender {
            method: PaymentMethod::Mpesa,
            cash_received: None,
            mpesa_code: Some("   ".to_string()),
        };
        let err = checkout(&inventory, &sales, &mut cart, &tender, now())
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            CheckoutError::Rejected(CoreError::MissingTransactionCode)
        ));
        assert_eq!(sales.writes.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_live_stock_shortfall_writes_nothing() {
        let (inventory, sales) = shop();
        let mut cart = cart_of(&inventory, &["bread", "bread", "sugar"]);

        // another till sold bread since it was carted
        inventory
            .update("bread", ItemChanges::stock(dec!(1)))
            .await
            .unwrap();
        let writes_before = inventory.writes.load(Ordering::SeqCst);

        let err = checkout(&inventory, &sales, &mut cart, &Tender::card(), now())
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            CheckoutError::Rejected(CoreError::InsufficientStock { .. })
        ));
        assert_eq!(inventory.writes.load(Ordering::SeqCst), writes_before);
        assert_eq!(sales.writes.load(Ordering::SeqCst), 0);
        assert_eq!(inventory.stock_of("sugar"), dec!(10));
        assert_eq!(cart.line_count(), 2);
    }

    #[tokio::test]
    async fn test_deleted_item_is_not_found() {
        let (inventory, sales) = shop();
        let mut cart = cart_of(&inventory, &["milk"]);
        inventory.delete("milk").await.unwrap();

        let err = checkout(&inventory, &sales, &mut cart, &Tender::card(), now())
            .await
            .unwrap_err();

        assert!(matches!(err, CheckoutError::Rejected(CoreError::ItemNotFound(_))));
        assert_eq!(sales.writes.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_sale_write_failure_leaves_cart() {
        let (inventory, _) = shop();
        let sales = FakeSales {
            fail: true,
            ..Default::default()
        };
        let mut cart = cart_of(&inventory, &["sugar"]);

        let err = checkout(&inventory, &sales, &mut cart, &Tender::card(), now())
            .await
            .unwrap_err();

        assert!(matches!(err, CheckoutError::Repository(_)));
        assert_eq!(inventory.stock_of("sugar"), dec!(10));
        assert_eq!(cart.line_count(), 1);
    }

    #[tokio::test]
    async fn test_stock_failure_after_sale_is_incomplete() {
        let (inventory, sales) = shop();
        let mut cart = cart_of(&inventory, &["sugar", "bread", "milk"]);
        *inventory.fail_update_for.lock().unwrap() = Some("milk".to_string());

        let err = checkout(&inventory, &sales, &mut cart, &Tender::card(), now())
            .await
            .unwrap_err();

        match err {
            CheckoutError::Incomplete {
                sale_id,
                pending_items,
                ..
            } => {
                // lines run bread, Milk, Sugar: bread was written first
                assert_eq!(pending_items, vec!["milk".to_string(), "sugar".to_string()]);
                assert!(sales.get(&sale_id).await.unwrap().is_some());
            }
            other => panic!("expected Incomplete, got {other:?}"),
        }
        assert_eq!(inventory.stock_of("bread"), dec!(2));
        assert_eq!(inventory.stock_of("sugar"), dec!(10));
        assert!(cart.is_empty());
    }

    #[tokio::test]
    async fn test_sale_on_another_till_is_not_overwritten() {
        let (inventory, sales) = shop();
        let mut cart = cart_of(&inventory, &["sugar", "sugar"]);
        *inventory.sold_elsewhere.lock().unwrap() = Some(("sugar".to_string(), dec!(3)));

        checkout(&inventory, &sales, &mut cart, &Tender::card(), now())
            .await
            .unwrap();

        // 10 on hand, 3 sold elsewhere, 2 sold here
        assert_eq!(inventory.stock_of("sugar"), dec!(5));
    }

    #[tokio::test]
    async fn test_last_units_sold_elsewhere_is_incomplete() {
        let (inventory, sales) = shop();
        let mut cart = cart_of(&inventory, &["bread", "bread"]);
        *inventory.sold_elsewhere.lock().unwrap() = Some(("bread".to_string(), dec!(2)));

        let err = checkout(&inventory, &sales, &mut cart, &Tender::card(), now())
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            CheckoutError::Incomplete {
                source: DbError::StockShortfall { .. },
                ..
            }
        ));
        assert_eq!(inventory.stock_of("bread"), dec!(1));
        assert_eq!(sales.writes.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_second_checkout_of_same_cart_is_empty() {
        let (inventory, sales) = shop();
        let mut cart = cart_of(&inventory, &["bread"]);

        checkout(&inventory, &sales, &mut cart, &Tender::card(), now())
            .await
            .unwrap();
        let err = checkout(&inventory, &sales, &mut cart, &Tender::card(), now())
            .await
            .unwrap_err();

        assert!(matches!(err, CheckoutError::Rejected(CoreError::EmptyCart)));
        assert_eq!(sales.writes.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_negotiated_below_catalog_is_flagged() {
        let (inventory, sales) = shop();
        let mut cart = cart_of(&inventory, &["sugar"]);
        cart.negotiate_price("sugar", Money::from_major(120)).unwrap();

        let sale = checkout(&inventory, &sales, &mut cart, &Tender::card(), now())
            .await
            .unwrap();

        assert_eq!(
            sale.items[0].notification.as_deref(),
            Some("Item \"Sugar 1kg\" was sold for KSH 120.00, lower than the original price of KSH 150.00.")
        );
    }
}
