//! # Config Handler
//!
//! Read-only store settings the frontend needs for display.

use axum::extract::State;
use axum::Json;
use mesha_core::money::VAT_RATE;
use mesha_core::receipt::StoreProfile;
use mesha_core::{MAX_CART_LINES, NEGOTIATION_MAX_DISCOUNT, NEGOTIATION_MAX_MARKUP};
use serde::{Deserialize, Serialize};

use crate::state::AppState;

/// Public configuration. Host, port and database path are not exposed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublicConfig {
    pub store: StoreProfile,
    /// VAT percentage, e.g. `"16"`.
    pub vat_rate: String,
    pub dashboard_low_stock_threshold: u32,
    pub report_low_stock_threshold: u32,
    pub max_cart_lines: usize,
    pub negotiation_max_discount: u32,
    pub negotiation_max_markup: u32,
    pub receipt_width: usize,
}

pub async fn get_config(State(state): State<AppState>) -> Json<PublicConfig> {
    let config = &state.config;
    Json(PublicConfig {
        store: config.store.clone(),
        vat_rate: VAT_RATE.percentage().normalize().to_string(),
        dashboard_low_stock_threshold: config.dashboard_low_stock_threshold,
        report_low_stock_threshold: config.report_low_stock_threshold,
        max_cart_lines: MAX_CART_LINES,
        negotiation_max_discount: NEGOTIATION_MAX_DISCOUNT,
        negotiation_max_markup: NEGOTIATION_MAX_MARKUP,
        receipt_width: config.receipt_width,
    })
}
