//! # Report Aggregator
//!
//! Filters inventory and sales into tabular reports for preview and export.
//!
//! ## Report Types
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Report          Source      Filter                    Columns          │
//! │  ──────          ──────      ──────                    ───────          │
//! │  Low stock       inventory   stock <= threshold        Name, Price,     │
//! │                                                        Stock Remaining  │
//! │  Inventory       inventory   (all)                     Name, Price,     │
//! │                                                        Stock            │
//! │  Daily           sales       UTC date == date          Date, Total,     │
//! │  Monthly /                                             Items            │
//! │  Quarterly /     sales       start <= UTC date <= end                   │
//! │  Yearly                                                                 │
//! │                                                                         │
//! │  Inventory reports are sorted by name (case-insensitive).              │
//! │  Sales reports are sorted by time. An empty sales report is an error.  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The period label does not constrain the range width: a "Monthly" report
//! covers whatever `start..=end` the caller selected.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::money::format_stock;
use crate::types::{InventoryItem, Sale};

// =============================================================================
// Inventory Filters
// =============================================================================

/// Items sorted by name, case-insensitive.
pub fn sorted_by_name(items: &[InventoryItem]) -> Vec<InventoryItem> {
    let mut sorted = items.to_vec();
    sorted.sort_by_cached_key(|item| item.name.to_lowercase());
    sorted
}

/// Items with `stock <= threshold`, sorted by name.
pub fn low_stock(items: &[InventoryItem], threshold: u32) -> Vec<InventoryItem> {
    let limit = Decimal::from(threshold);
    let low: Vec<InventoryItem> = items
        .iter()
        .filter(|item| item.stock <= limit)
        .cloned()
        .collect();
    sorted_by_name(&low)
}

/// Items whose name contains `query` (case-insensitive), sorted by name.
/// An empty query matches everything.
pub fn search_items(items: &[InventoryItem], query: &str) -> Vec<InventoryItem> {
    let needle = query.trim().to_lowercase();
    let matched: Vec<InventoryItem> = items
        .iter()
        .filter(|item| needle.is_empty() || item.name.to_lowercase().contains(&needle))
        .cloned()
        .collect();
    sorted_by_name(&matched)
}

// =============================================================================
// Sales Period
// =============================================================================

/// Report granularity selected on the reports screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum PeriodKind {
    Daily,
    Monthly,
    Quarterly,
    Yearly,
}

impl FromStr for PeriodKind {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "daily" => Ok(PeriodKind::Daily),
            "monthly" => Ok(PeriodKind::Monthly),
            "quarterly" => Ok(PeriodKind::Quarterly),
            "yearly" => Ok(PeriodKind::Yearly),
            other => Err(ValidationError::InvalidFormat {
                field: "period".to_string(),
                reason: format!("unknown period '{other}'"),
            }),
        }
    }
}

/// The time window of a sales report. Dates are UTC calendar dates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SalesPeriod {
    Daily(NaiveDate),
    Monthly { start: NaiveDate, end: NaiveDate },
    Quarterly { start: NaiveDate, end: NaiveDate },
    Yearly { start: NaiveDate, end: NaiveDate },
}

impl SalesPeriod {
    /// Builds a period from the reports form.
    ///
    /// ## Errors
    /// - `Required` when daily lacks `date` or a range lacks `start`/`end`
    /// - `InvertedRange` when `start > end`
    pub fn new(
        kind: PeriodKind,
        date: Option<NaiveDate>,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> Result<Self, ValidationError> {
        if kind == PeriodKind::Daily {
            let date = date.ok_or_else(|| ValidationError::required("date"))?;
            return Ok(SalesPeriod::Daily(date));
        }

        let start = start.ok_or_else(|| ValidationError::required("start"))?;
        let end = end.ok_or_else(|| ValidationError::required("end"))?;
        if start > end {
            return Err(ValidationError::InvertedRange {
                start: start.to_string(),
                end: end.to_string(),
            });
        }

        Ok(match kind {
            PeriodKind::Monthly => SalesPeriod::Monthly { start, end },
            PeriodKind::Quarterly => SalesPeriod::Quarterly { start, end },
            _ => SalesPeriod::Yearly { start, end },
        })
    }

    pub fn kind(&self) -> PeriodKind {
        match self {
            SalesPeriod::Daily(_) => PeriodKind::Daily,
            SalesPeriod::Monthly { .. } => PeriodKind::Monthly,
            SalesPeriod::Quarterly { .. } => PeriodKind::Quarterly,
            SalesPeriod::Yearly { .. } => PeriodKind::Yearly,
        }
    }

    /// Inclusive UTC date bounds.
    pub fn bounds(&self) -> (NaiveDate, NaiveDate) {
        match *self {
            SalesPeriod::Daily(date) => (date, date),
            SalesPeriod::Monthly { start, end }
            | SalesPeriod::Quarterly { start, end }
            | SalesPeriod::Yearly { start, end } => (start, end),
        }
    }

    /// True when the UTC date of `timestamp` falls in the period.
    pub fn contains(&self, timestamp: DateTime<Utc>) -> bool {
        let (start, end) = self.bounds();
        let day = timestamp.date_naive();
        start <= day && day <= end
    }

    /// Report heading, e.g. `Daily Report`.
    pub fn title(&self) -> &'static str {
        match self.kind() {
            PeriodKind::Daily => "Daily Report",
            PeriodKind::Monthly => "Monthly Report",
            PeriodKind::Quarterly => "Quarterly Report",
            PeriodKind::Yearly => "Yearly Report",
        }
    }
}

/// Sales inside `period`, oldest first.
pub fn sales_in_period(sales: &[Sale], period: &SalesPeriod) -> Vec<Sale> {
    let mut matched: Vec<Sale> = sales
        .iter()
        .filter(|sale| period.contains(sale.timestamp))
        .cloned()
        .collect();
    matched.sort_by_key(|sale| sale.timestamp);
    matched
}

/// `"Sugar x2, Milk x1"`.
pub fn items_summary(sale: &Sale) -> String {
    sale.items
        .iter()
        .map(|line| format!("{} x{}", line.name, line.quantity))
        .collect::<Vec<_>>()
        .join(", ")
}

// =============================================================================
// Report
// =============================================================================

/// A rendered report table. Transient; never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Report {
    pub title: String,
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Report {
    fn new(title: &str, columns: &[&str], rows: Vec<Vec<String>>) -> Self {
        Report {
            title: title.to_string(),
            columns: columns.iter().map(|c| c.to_string()).collect(),
            rows,
        }
    }

    /// Low-stock report: items at or below `threshold`.
    ///
    /// An empty result is a valid (empty) report.
    pub fn low_stock(items: &[InventoryItem], threshold: u32) -> Self {
        let rows = low_stock(items, threshold)
            .into_iter()
            .map(|item| {
                vec![
                    item.name,
                    item.price.to_string(),
                    format_stock(item.stock),
                ]
            })
            .collect();
        Report::new("Low Stock Report", &["Name", "Price", "Stock Remaining"], rows)
    }

    /// Full inventory listing.
    pub fn inventory(items: &[InventoryItem]) -> Self {
        let rows = sorted_by_name(items)
            .into_iter()
            .map(|item| {
                vec![
                    item.name,
                    item.price.to_string(),
                    format_stock(item.stock),
                ]
            })
            .collect();
        Report::new("Inventory Report", &["Name", "Price", "Stock"], rows)
    }

    /// Time-based sales report.
    ///
    /// `date_format` is a chrono format string for the Date column.
    ///
    /// ## Errors
    /// `NoSalesInPeriod` when no sale falls in the period; no report is
    /// produced in that case.
    pub fn sales(period: &SalesPeriod, sales: &[Sale], date_format: &str) -> CoreResult<Self> {
        let matched = sales_in_period(sales, period);
        if matched.is_empty() {
            return Err(CoreError::NoSalesInPeriod);
        }

        let rows = matched
            .iter()
            .map(|sale| {
                vec![
                    sale.timestamp.format(date_format).to_string(),
                    sale.total.to_string(),
                    items_summary(sale),
                ]
            })
            .collect();
        Ok(Report::new(period.title(), &["Date", "Total", "Items"], rows))
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Spreadsheet export: header row then one record per row.
    pub fn to_csv(&self) -> CoreResult<String> {
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(Vec::new());

        writer
            .write_record(&self.columns)
            .map_err(|e| CoreError::Export(e.to_string()))?;
        for row in &self.rows {
            writer
                .write_record(row)
                .map_err(|e| CoreError::Export(e.to_string()))?;
        }

        let bytes = writer
            .into_inner()
            .map_err(|e| CoreError::Export(e.to_string()))?;
        String::from_utf8(bytes).map_err(|e| CoreError::Export(e.to_string()))
    }

    /// Download file name, e.g. `daily-report.csv`.
    pub fn file_name(&self) -> String {
        format!("{}.csv", self.title.to_lowercase().replace(' ', "-"))
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.title)?;
        writeln!(f, "{}", self.columns.join(" | "))?;
        for row in &self.rows {
            writeln!(f, "{}", row.join(" | "))?;
        }
        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
