//! # Sales Repository
//!
//! Append-only storage for completed sales.
//!
//! ## Write Path
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Recording a Sale                                  │
//! │                                                                         │
//! │  create(&sale)                                                          │
//! │     │                                                                   │
//! │     ├── BEGIN                                                           │
//! │     ├── INSERT INTO sales (header)                                      │
//! │     ├── INSERT INTO sale_lines (one row per line, position 0..n)        │
//! │     └── COMMIT                                                          │
//! │                                                                         │
//! │  Any failure rolls back the transaction when it is dropped, so a sale  │
//! │  is either stored with all its lines or not at all.                     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Sales are never updated or deleted through this repository.

use std::collections::HashMap;

use async_trait::async_trait;
use mesha_core::{PaymentMethod, Sale, SaleId, SaleLine};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use tracing::debug;

use super::codec::{money_from_text, money_to_text, time_from_text, time_to_text};
use super::SalesRepository;
use crate::error::{DbError, DbResult};

const SELECT_SALES: &str = r#"
    SELECT
        id, receipt_number, net_amount, vat, total, payment_method,
        cash_received, change_due, mpesa_code, timestamp
    FROM sales
"#;

const SELECT_LINES: &str = r#"
    SELECT sale_id, item_id, name, quantity, unit_price, line_total, notification
    FROM sale_lines
"#;

/// SQLite-backed [`SalesRepository`].
#[derive(Debug, Clone)]
pub struct SqliteSalesRepository {
    pool: SqlitePool,
}

impl SqliteSalesRepository {
    /// Creates a new SqliteSalesRepository.
    pub fn new(pool: SqlitePool) -> Self {
        SqliteSalesRepository { pool }
    }
}

#[async_trait]
impl SalesRepository for SqliteSalesRepository {
    async fn create(&self, sale: &Sale) -> DbResult<SaleId> {
        debug!(
            id = %sale.id,
            receipt_number = %sale.receipt_number,
            lines = sale.items.len(),
            total = %sale.total,
            "Recording sale"
        );

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        sqlx::query(
            r#"
            INSERT INTO sales (
                id, receipt_number, net_amount, vat, total, payment_method,
                cash_received, change_due, mpesa_code, timestamp
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            "#,
        )
        .bind(&sale.id)
        .bind(&sale.receipt_number)
        .bind(money_to_text(sale.net_amount))
        .bind(money_to_text(sale.vat))
        .bind(money_to_text(sale.total))
        .bind(sale.payment_method.as_str())
        .bind(money_to_text(sale.cash_received))
        .bind(money_to_text(sale.change))
        .bind(&sale.mpesa_code)
        .bind(time_to_text(sale.timestamp))
        .execute(&mut *tx)
        .await?;

        for (position, line) in sale.items.iter().enumerate() {
            sqlx::query(
                r#"
                INSERT INTO sale_lines (
                    sale_id, position, item_id, name, quantity,
                    unit_price, line_total, notification
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
                "#,
            )
            .bind(&sale.id)
            .bind(position as i64)
            .bind(&line.item_id)
            .bind(&line.name)
            .bind(i64::from(line.quantity))
            .bind(money_to_text(line.unit_price))
            .bind(money_to_text(line.line_total))
            .bind(line.notification.as_deref())
            .execute(&mut *tx)
            .await?;
        }

        tx.commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        Ok(sale.id.clone())
    }

    async fn get(&self, id: &str) -> DbResult<Option<Sale>> {
        let Some(row) = sqlx::query(&format!("{SELECT_SALES} WHERE id = ?1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
        else {
            return Ok(None);
        };

        let line_rows = sqlx::query(&format!("{SELECT_LINES} WHERE sale_id = ?1 ORDER BY position"))
            .bind(id)
            .fetch_all(&self.pool)
            .await?;

        let items = line_rows
            .iter()
            .map(line_from_row)
            .map(|line| line.map(|(_, line)| line))
            .collect::<DbResult<Vec<_>>>()?;

        sale_from_row(&row, items).map(Some)
    }

    async fn list(&self) -> DbResult<Vec<Sale>> {
        let rows = sqlx::query(&format!("{SELECT_SALES} ORDER BY timestamp DESC, id"))
            .fetch_all(&self.pool)
            .await?;

        let line_rows = sqlx::query(&format!("{SELECT_LINES} ORDER BY sale_id, position"))
            .fetch_all(&self.pool)
            .await?;

        let mut lines: HashMap<String, Vec<SaleLine>> = HashMap::new();
        for row in &line_rows {
            let (sale_id, line) = line_from_row(row)?;
            lines.entry(sale_id).or_default().push(line);
        }

        debug!(sales = rows.len(), lines = line_rows.len(), "Listed sales");

        rows.iter()
            .map(|row| {
                let id: String = row.try_get("id")?;
                sale_from_row(row, lines.remove(&id).unwrap_or_default())
            })
            .collect()
    }
}

fn sale_from_row(row: &SqliteRow, items: Vec<SaleLine>) -> DbResult<Sale> {
    let text = |column: &str| -> DbResult<String> { Ok(row.try_get::<String, _>(column)?) };

    let method = text("payment_method")?;
    let payment_method = method
        .parse::<PaymentMethod>()
        .map_err(|_| DbError::corrupt("sales.payment_method", &method))?;

    Ok(Sale {
        id: text("id")?,
        receipt_number: text("receipt_number")?,
        items,
        net_amount: money_from_text("sales.net_amount", &text("net_amount")?)?,
        vat: money_from_text("sales.vat", &text("vat")?)?,
        total: money_from_text("sales.total", &text("total")?)?,
        payment_method,
        cash_received: money_from_text("sales.cash_received", &text("cash_received")?)?,
        change: money_from_text("sales.change_due", &text("change_due")?)?,
        mpesa_code: text("mpesa_code")?,
        timestamp: time_from_text("sales.timestamp", &text("timestamp")?)?,
    })
}

fn line_from_row(row: &SqliteRow) -> DbResult<(String, SaleLine)> {
    let quantity: i64 = row.try_get("quantity")?;
    let quantity = u32::try_from(quantity)
        .map_err(|_| DbError::corrupt("sale_lines.quantity", quantity.to_string()))?;
    let unit_price: String = row.try_get("unit_price")?;
    let line_total: String = row.try_get("line_total")?;

    let line = SaleLine {
        item_id: row.try_get("item_id")?,
        name: row.try_get("name")?,
        quantity,
        unit_price: money_from_text("sale_lines.unit_price", &unit_price)?,
        line_total: money_from_text("sale_lines.line_total", &line_total)?,
        notification: row.try_get("notification")?,
    };

    Ok((row.try_get("sale_id")?, line))
}

// =============================================================================
// Unit Tests
// =============================================================================
