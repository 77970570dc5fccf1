//! # HTTP Handlers
//!
//! Handlers exposed under `/api`.
//!
//! ## Handler Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  async fn add_item(                                                     │
//! │      State(state): State<AppState>,      ◄── shared state               │
//! │      Path(session_id): Path<String>,     ◄── URL segment                │
//! │      Json(body): Json<AddItemRequest>,   ◄── request body               │
//! │  ) -> Result<Json<CartResponse>, ApiError>                              │
//! │         │                                                               │
//! │         │ Ok  -> 200 + JSON body                                        │
//! │         │ Err -> status from ErrorCode + { code, message }              │
//! │         ▼                                                               │
//! │  Frontend receives CartResponse or ApiError                             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

pub mod cart;
pub mod config;
pub mod health;
pub mod inventory;
pub mod report;
pub mod sale;

use axum::http::{header, HeaderValue};
use axum::response::{IntoResponse, Response};

/// A plain-text body.
pub(crate) fn text_response(body: String, content_type: &'static str) -> Response {
    ([(header::CONTENT_TYPE, HeaderValue::from_static(content_type))], body).into_response()
}
