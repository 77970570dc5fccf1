//! # Cart Handlers
//!
//! Cart sessions and their line operations.
//!
//! ## Cart Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Cart Lifecycle                                       │
//! │                                                                         │
//! │  POST /sessions ──► ┌──────────┐     ┌──────────┐     ┌──────────┐      │
//! │                     │  Empty   │────►│ In Cart  │────►│ Checkout │      │
//! │                     │  Cart    │     │          │     │ (sale.rs)│      │
//! │                     └──────────┘     └──────────┘     └──────────┘      │
//! │                          ▲                │                │            │
//! │                          │      add / quantity / price     │            │
//! │                          │      remove                     │            │
//! │                          │                │                │            │
//! │                          └── DELETE /cart ┘◄───────────────┘            │
//! │                              (new sale / cancel)   (cleared on success) │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every operation holds the session's lock for its whole duration. A
//! rejected operation leaves the cart exactly as it was.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;
use mesha_core::validation::validate_uuid;
use mesha_core::{CartLine, CartSession, CoreError, Money};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::ApiError;
use crate::state::{AppState, SessionHandle};

// =============================================================================
// Response Types
// =============================================================================

/// One cart line with its derived values.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CartLineView {
    #[serde(flatten)]
    pub line: CartLine,
    pub line_total: Money,
    /// Lowest accepted negotiated price.
    pub min_price: Money,
    /// Highest accepted negotiated price.
    pub max_price: Money,
    pub negotiated: bool,
}

impl TryFrom<&CartLine> for CartLineView {
    type Error = CoreError;

    fn try_from(line: &CartLine) -> Result<Self, Self::Error> {
        let (min_price, max_price) = line.negotiation_bounds();
        Ok(CartLineView {
            line: line.clone(),
            line_total: line.line_total()?,
            min_price,
            max_price,
            negotiated: line.is_negotiated(),
        })
    }
}

/// Cart contents and totals.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CartResponse {
    pub session_id: String,
    pub lines: Vec<CartLineView>,
    pub line_count: usize,
    pub total_quantity: u32,
    pub net_amount: Money,
    pub vat: Money,
    pub total: Money,
}

impl TryFrom<&CartSession> for CartResponse {
    type Error = CoreError;

    fn try_from(cart: &CartSession) -> Result<Self, Self::Error> {
        let breakdown = cart.vat()?;
        let lines = cart
            .lines()
            .iter()
            .map(CartLineView::try_from)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(CartResponse {
            session_id: cart.id.clone(),
            lines,
            line_count: cart.line_count(),
            total_quantity: cart.total_quantity(),
            net_amount: breakdown.net,
            vat: breakdown.vat,
            total: breakdown.total,
        })
    }
}

/// Renders the cart as a JSON response.
fn cart_json(cart: &CartSession) -> Result<Json<CartResponse>, ApiError> {
    Ok(Json(CartResponse::try_from(cart)?))
}

// =============================================================================
// Request Types
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct AddItemRequest {
    pub item_id: String,
}

#[derive(Debug, Deserialize)]
pub struct SetQuantityRequest {
    pub quantity: i64,
}

#[derive(Debug, Deserialize)]
pub struct NegotiatePriceRequest {
    pub price: Money,
}

/// Resolves a session id to its handle.
pub(crate) async fn session(state: &AppState, id: &str) -> Result<SessionHandle, ApiError> {
    validate_uuid(id)?;
    state
        .sessions
        .get(id, Utc::now())
        .await
        .ok_or_else(|| ApiError::not_found("Session", id))
}

fn rejected(session_id: &str, operation: &str, err: CoreError) -> ApiError {
    warn!(session = %session_id, operation, error = %err, "Cart operation rejected");
    err.into()
}

// =============================================================================
// Session Handlers
// =============================================================================

/// Opens a new, empty cart session.
pub async fn open_session(
    State(state): State<AppState>,
) -> Result<(StatusCode, Json<CartResponse>), ApiError> {
    let id = state.sessions.open(Utc::now()).await?;
    let handle = session(&state, &id).await?;
    let cart = handle.lock().await;
    Ok((StatusCode::CREATED, cart_json(&cart)?))
}

/// Closes a session, discarding its cart.
pub async fn close_session(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    validate_uuid(&session_id)?;
    if state.sessions.close(&session_id).await {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::not_found("Session", &session_id))
    }
}

// =============================================================================
// Cart Handlers
// =============================================================================

/// Current cart contents and totals.
pub async fn get_cart(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<Json<CartResponse>, ApiError> {
    let handle = session(&state, &session_id).await?;
    let cart = handle.lock().await;
    cart_json(&cart)
}

/// Empties the cart (new sale / cancel).
pub async fn clear_cart(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<Json<CartResponse>, ApiError> {
    let handle = session(&state, &session_id).await?;
    let mut cart = handle.lock().await;
    cart.clear(Utc::now());
    debug!(session = %session_id, "Cart cleared");
    cart_json(&cart)
}

/// Adds one unit of an item.
///
/// ## Behavior
/// - Already in cart: quantity + 1 (checked against current stock)
/// - Not in cart: new line at catalog price
pub async fn add_item(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
    Json(body): Json<AddItemRequest>,
) -> Result<Json<CartResponse>, ApiError> {
    let handle = session(&state, &session_id).await?;
    let mut cart = handle.lock().await;

    let item = state
        .inventory
        .get(&body.item_id)
        .await?
        .ok_or_else(|| rejected(&session_id, "add_item", CoreError::ItemNotFound(body.item_id.clone())))?;

    if let Err(e) = cart.add_item(&item) {
        return Err(rejected(&session_id, "add_item", e));
    }

    debug!(session = %session_id, item_id = %item.id, "Item added to cart");
    cart_json(&cart)
}

/// Sets a line's quantity, checked against freshly read stock.
pub async fn set_quantity(
    State(state): State<AppState>,
    Path((session_id, item_id)): Path<(String, String)>,
    Json(body): Json<SetQuantityRequest>,
) -> Result<Json<CartResponse>, ApiError> {
    let handle = session(&state, &session_id).await?;
    let mut cart = handle.lock().await;

    if body.quantity >= 1 && cart.line(&item_id).is_some() {
        let item = state
            .inventory
            .get(&item_id)
            .await?
            .ok_or_else(|| rejected(&session_id, "set_quantity", CoreError::ItemNotFound(item_id.clone())))?;
        cart.observe_stock(&item);
    }

    if let Err(e) = cart.set_quantity(&item_id, body.quantity) {
        return Err(rejected(&session_id, "set_quantity", e));
    }

    cart_json(&cart)
}

/// Overrides a line's unit price within the negotiation bounds.
pub async fn negotiate_price(
    State(state): State<AppState>,
    Path((session_id, item_id)): Path<(String, String)>,
    Json(body): Json<NegotiatePriceRequest>,
) -> Result<Json<CartResponse>, ApiError> {
    let handle = session(&state, &session_id).await?;
    let mut cart = handle.lock().await;

    if let Err(e) = cart.negotiate_price(&item_id, body.price) {
        return Err(rejected(&session_id, "negotiate_price", e));
    }

    debug!(session = %session_id, item_id = %item_id, price = %body.price, "Price negotiated");
    cart_json(&cart)
}

/// Removes a line. Removing an item that is not in the cart is a no-op.
pub async fn remove_item(
    State(state): State<AppState>,
    Path((session_id, item_id)): Path<(String, String)>,
) -> Result<Json<CartResponse>, ApiError> {
    let handle = session(&state, &session_id).await?;
    let mut cart = handle.lock().await;
    cart.remove_item(&item_id);
    cart_json(&cart)
}
