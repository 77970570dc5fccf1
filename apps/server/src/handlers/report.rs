//! # Report Handlers
//!
//! Report previews (JSON tables) and their CSV downloads.
//!
//! ```text
//! GET /api/reports/low-stock            GET /api/reports/low-stock/export
//! GET /api/reports/inventory            GET /api/reports/inventory/export
//! GET /api/reports/sales?period=daily&date=2024-03-05
//! GET /api/reports/sales?period=monthly&start=2024-03-01&end=2024-03-31
//!                                       GET /api/reports/sales/export?...
//! ```

use axum::extract::{Query, State};
use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::NaiveDate;
use mesha_core::report::{PeriodKind, Report, SalesPeriod};
use serde::Deserialize;
use tracing::info;

use crate::error::ApiError;
use crate::services::reports;
use crate::state::AppState;

/// Sales report form.
#[derive(Debug, Deserialize)]
pub struct SalesReportParams {
    /// `daily`, `monthly`, `quarterly` or `yearly`.
    pub period: String,
    /// Day of a daily report (`YYYY-MM-DD`).
    #[serde(default)]
    pub date: Option<NaiveDate>,
    /// First day of a range, inclusive.
    #[serde(default)]
    pub start: Option<NaiveDate>,
    /// Last day of a range, inclusive.
    #[serde(default)]
    pub end: Option<NaiveDate>,
}

impl SalesReportParams {
    fn period(&self) -> Result<SalesPeriod, ApiError> {
        let kind: PeriodKind = self.period.parse()?;
        Ok(SalesPeriod::new(kind, self.date, self.start, self.end)?)
    }
}

async fn low_stock_report(state: &AppState) -> Result<Report, ApiError> {
    Ok(reports::low_stock_report(state.inventory.as_ref(), state.config.report_low_stock_threshold).await?)
}

async fn inventory_report(state: &AppState) -> Result<Report, ApiError> {
    Ok(reports::inventory_report(state.inventory.as_ref()).await?)
}

async fn sales_report(state: &AppState, params: &SalesReportParams) -> Result<Report, ApiError> {
    let period = params.period()?;
    Ok(reports::sales_report(state.sales.as_ref(), &period, &state.config.report_date_format).await?)
}

/// CSV download of a report.
fn csv_download(report: &Report) -> Result<Response, ApiError> {
    let body = report.to_csv()?;
    let disposition = HeaderValue::from_str(&format!(
        "attachment; filename=\"{}\"",
        report.file_name()
    ))
    .map_err(|_| ApiError::internal("Invalid report file name"))?;

    info!(title = %report.title, rows = report.rows.len(), "Report exported");

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, HeaderValue::from_static("text/csv; charset=utf-8")),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        body,
    )
        .into_response())
}

pub async fn low_stock(State(state): State<AppState>) -> Result<Json<Report>, ApiError> {
    Ok(Json(low_stock_report(&state).await?))
}

pub async fn low_stock_export(State(state): State<AppState>) -> Result<Response, ApiError> {
    csv_download(&low_stock_report(&state).await?)
}

pub async fn inventory(State(state): State<AppState>) -> Result<Json<Report>, ApiError> {
    Ok(Json(inventory_report(&state).await?))
}

pub async fn inventory_export(State(state): State<AppState>) -> Result<Response, ApiError> {
    csv_download(&inventory_report(&state).await?)
}

pub async fn sales(
    State(state): State<AppState>,
    Query(params): Query<SalesReportParams>,
) -> Result<Json<Report>, ApiError> {
    Ok(Json(sales_report(&state, &params).await?))
}

pub async fn sales_export(
    State(state): State<AppState>,
    Query(params): Query<SalesReportParams>,
) -> Result<Response, ApiError> {
    csv_download(&sales_report(&state, &params).await?)
}
