//! # Sale Handlers
//!
//! Checkout, sale history and receipts.
//!
//! ## Checkout Workflow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Tender modal: [Cash 1000] [Card] [M-Pesa QK12AB34CD]                  │
//! │                    │                                                    │
//! │                    ▼                                                    │
//! │  POST /api/sessions/:id/checkout  { "method": "cash",                   │
//! │                                     "cash_received": "1000" }           │
//! │                    │                                                    │
//! │                    ▼                                                    │
//! │  session lock ──► services::checkout ──► 201 { sale, receipt, ... }     │
//! │                    │                                                    │
//! │                    ▼                                                    │
//! │  Receipt preview, "Print" uses GET /api/sales/:id/receipt?format=text   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::Utc;
use mesha_core::checkout::Tender;
use mesha_core::receipt::Receipt;
use mesha_core::{Money, Sale};
use serde::{Deserialize, Serialize};

use super::cart::session;
use super::text_response;
use crate::error::ApiError;
use crate::services::checkout::checkout as run_checkout;
use crate::state::AppState;

/// Result of a successful checkout.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckoutResponse {
    pub sale: Sale,
    pub receipt: Receipt,
    /// Change to hand back (zero for card and M-Pesa).
    pub change: Money,
    /// Below-catalog-price notices for the cashier.
    pub notifications: Vec<String>,
}

/// Checks out the session's cart.
///
/// The session lock is held for the whole checkout, so a double submit
/// waits for the first and then fails with `EMPTY_CART`.
pub async fn checkout(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
    Json(tender): Json<Tender>,
) -> Result<(StatusCode, Json<CheckoutResponse>), ApiError> {
    let handle = session(&state, &session_id).await?;
    let mut cart = handle.lock().await;

    let sale = run_checkout(
        state.inventory.as_ref(),
        state.sales.as_ref(),
        &mut cart,
        &tender,
        Utc::now(),
    )
    .await?;

    let receipt = Receipt::from_sale(&sale, &state.config.store);
    let notifications = sale.notifications().map(str::to_string).collect();

    Ok((
        StatusCode::CREATED,
        Json(CheckoutResponse {
            change: sale.change,
            receipt,
            notifications,
            sale,
        }),
    ))
}

/// Sale history, newest first.
pub async fn list_sales(State(state): State<AppState>) -> Result<Json<Vec<Sale>>, ApiError> {
    Ok(Json(state.sales.list().await?))
}

/// One recorded sale.
pub async fn get_sale(
    State(state): State<AppState>,
    Path(sale_id): Path<String>,
) -> Result<Json<Sale>, ApiError> {
    let sale = find_sale(&state, &sale_id).await?;
    Ok(Json(sale))
}

#[derive(Debug, Default, Deserialize)]
pub struct ReceiptParams {
    /// `text` for the printer layout; JSON otherwise.
    #[serde(default)]
    pub format: Option<String>,
}

/// Receipt of a recorded sale, as JSON or printer text.
pub async fn get_receipt(
    State(state): State<AppState>,
    Path(sale_id): Path<String>,
    Query(params): Query<ReceiptParams>,
) -> Result<Response, ApiError> {
    let sale = find_sale(&state, &sale_id).await?;
    let receipt = Receipt::from_sale(&sale, &state.config.store);

    match params.format.as_deref() {
        Some("text") => Ok(text_response(
            receipt.render_text(state.config.receipt_width),
            "text/plain; charset=utf-8",
        )),
        None | Some("json") => Ok(Json(receipt).into_response()),
        Some(other) => Err(ApiError::validation(format!(
            "Unknown receipt format '{}', expected 'json' or 'text'",
            other
        ))),
    }
}

async fn find_sale(state: &AppState, sale_id: &str) -> Result<Sale, ApiError> {
    state
        .sales
        .get(sale_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Sale", sale_id))
}
