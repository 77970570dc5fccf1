//! # Inventory Handlers
//!
//! Item CRUD for the inventory screen, and the dashboard.
//!
//! ## Inventory Screen
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  GET    /api/inventory?q=sug    ──► name-sorted, filtered list          │
//! │  POST   /api/inventory          ──► add item (price > 0, stock > 0)     │
//! │  PUT    /api/inventory/:id      ──► edit any subset (price, stock >= 0) │
//! │  DELETE /api/inventory/:id      ──► delete immediately                  │
//! │                                                                         │
//! │  Writes answer with the stored record so the screen updates in place.  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use mesha_core::report::{search_items, sorted_by_name};
use mesha_core::validation::{validate_item_changes, validate_new_item, validate_search_query};
use mesha_core::{InventoryItem, ItemChanges, NewItem};
use serde::Deserialize;
use tracing::{debug, info};

use crate::error::ApiError;
use crate::services::reports::{self, Dashboard};
use crate::state::AppState;

/// `?q=` search parameter.
#[derive(Debug, Default, Deserialize)]
pub struct SearchParams {
    #[serde(default)]
    pub q: Option<String>,
}

impl SearchParams {
    /// The trimmed, validated query, or `None` when blank.
    fn query(&self) -> Result<Option<String>, ApiError> {
        match self.q.as_deref() {
            Some(q) => {
                let q = validate_search_query(q)?;
                Ok((!q.is_empty()).then_some(q))
            }
            None => Ok(None),
        }
    }
}

/// Lists items sorted by name, optionally filtered by `q`.
pub async fn list_items(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<Json<Vec<InventoryItem>>, ApiError> {
    let query = params.query()?;
    debug!(query = ?query, "list_items");

    let items = state.inventory.list().await?;
    let items = match query {
        Some(q) => search_items(&items, &q),
        None => sorted_by_name(&items),
    };
    Ok(Json(items))
}

/// Adds an item.
pub async fn create_item(
    State(state): State<AppState>,
    Json(body): Json<NewItem>,
) -> Result<(StatusCode, Json<InventoryItem>), ApiError> {
    let item = validate_new_item(body)?;
    let created = state.inventory.create(item).await?;

    info!(id = %created.id, name = %created.name, price = %created.price, "Item added");
    Ok((StatusCode::CREATED, Json(created)))
}

/// Edits an item. Absent fields keep their stored values.
pub async fn update_item(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<ItemChanges>,
) -> Result<Json<InventoryItem>, ApiError> {
    let changes = validate_item_changes(body)?;
    if changes.is_empty() {
        return Err(ApiError::validation("No changes supplied"));
    }

    let updated = state.inventory.update(&id, changes).await?;
    info!(id = %updated.id, "Item updated");
    Ok(Json(updated))
}

/// Deletes an item. Carts still holding it fail at checkout.
pub async fn delete_item(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    state.inventory.delete(&id).await?;
    info!(id = %id, "Item deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// Dashboard: item list plus low-stock alert.
pub async fn dashboard(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<Json<Dashboard>, ApiError> {
    let query = params.query()?;
    let view = reports::dashboard(
        state.inventory.as_ref(),
        query.as_deref(),
        state.config.dashboard_low_stock_threshold,
    )
    .await?;
    Ok(Json(view))
}
