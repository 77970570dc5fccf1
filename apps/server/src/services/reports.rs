//! # Report Service
//!
//! Fetches the records a report needs and hands them to the pure builders
//! in `mesha_core::report`. Nothing is cached; every report reads the
//! repositories at request time.

use mesha_core::report::{self, Report, SalesPeriod};
use mesha_core::{CoreError, InventoryItem};
use mesha_db::{DbError, InventoryRepository, SalesRepository};
use serde::Serialize;
use tracing::debug;

/// Report failures.
#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error(transparent)]
    Repository(#[from] DbError),
}

/// Items at or below `threshold`, as a report table.
pub async fn low_stock_report(
    inventory: &dyn InventoryRepository,
    threshold: u32,
) -> Result<Report, ReportError> {
    let items = inventory.list().await?;
    let report = Report::low_stock(&items, threshold);
    debug!(threshold, rows = report.rows.len(), "Built low stock report");
    Ok(report)
}

/// The whole inventory, as a report table.
pub async fn inventory_report(inventory: &dyn InventoryRepository) -> Result<Report, ReportError> {
    let items = inventory.list().await?;
    Ok(Report::inventory(&items))
}

/// Sales in `period`, as a report table.
///
/// ## Errors
/// `Core(NoSalesInPeriod)` when nothing was sold in the period.
pub async fn sales_report(
    sales: &dyn SalesRepository,
    period: &SalesPeriod,
    date_format: &str,
) -> Result<Report, ReportError> {
    let all = sales.list().await?;
    let report = Report::sales(period, &all, date_format)?;
    debug!(kind = ?period.kind(), rows = report.rows.len(), "Built sales report");
    Ok(report)
}

/// Dashboard view: the (optionally filtered) item list plus the items that
/// need restocking.
#[derive(Debug, Clone, Serialize)]
pub struct Dashboard {
    pub items: Vec<InventoryItem>,
    pub low_stock: Vec<InventoryItem>,
    pub low_stock_threshold: u32,
    /// Alert text shown when anything is low, e.g.
    /// `Low stock: Bread 400g, Candles (pack)`.
    pub alert: Option<String>,
}

/// Builds the dashboard. The low-stock alert covers the items on screen, so
/// a search narrows it along with the list.
pub async fn dashboard(
    inventory: &dyn InventoryRepository,
    query: Option<&str>,
    threshold: u32,
) -> Result<Dashboard, ReportError> {
    let all = inventory.list().await?;

    let items = match query {
        Some(q) if !q.is_empty() => report::search_items(&all, q),
        _ => report::sorted_by_name(&all),
    };
    let low_stock = report::low_stock(&items, threshold);
    let alert = (!low_stock.is_empty()).then(|| {
        let names: Vec<&str> = low_stock.iter().map(|i| i.name.as_str()).collect();
        format!("Low stock: {}", names.join(", "))
    });

    Ok(Dashboard {
        items,
        low_stock,
        low_stock_threshold: threshold,
        alert,
    })
}

// =============================================================================
// Unit Tests
// =============================================================================
