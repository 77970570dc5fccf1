//! # Mesha Server Library
//!
//! HTTP application server for Mesha POS.
//!
//! ## Module Organization
//! ```text
//! mesha_server/
//! ├── lib.rs          ◄─── You are here (router, tracing, run)
//! ├── config.rs       ◄─── Layered ServerConfig
//! ├── error.rs        ◄─── ApiError + HTTP status mapping
//! ├── state/
//! │   ├── mod.rs      ◄─── AppState (repositories, sessions, config)
//! │   └── session.rs  ◄─── Cart session registry
//! ├── services/
//! │   ├── checkout.rs ◄─── Checkout Orchestrator
//! │   └── reports.rs  ◄─── Report and dashboard assembly
//! └── handlers/
//!     ├── inventory.rs ◄── Item CRUD, dashboard
//!     ├── cart.rs      ◄── Sessions and cart operations
//!     ├── sale.rs      ◄── Checkout, sale history, receipts
//!     ├── report.rs    ◄── Report previews and CSV export
//!     ├── config.rs    ◄── Public store settings
//!     └── health.rs    ◄── Liveness + database check
//! ```

pub mod config;
pub mod error;
pub mod handlers;
pub mod services;
pub mod state;

use std::future::Future;

use anyhow::Context;
use axum::routing::{get, post, put};
use axum::Router;
use mesha_db::{Database, DbConfig};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::config::ServerConfig;
use crate::handlers::{cart, config as config_handler, health, inventory, report, sale};
use crate::state::AppState;

/// Builds the `/api` router over `state`.
pub fn build_router(state: AppState) -> Router {
    let api = Router::new()
        .route("/health", get(health::health))
        .route("/config", get(config_handler::get_config))
        // Inventory
        .route(
            "/inventory",
            get(inventory::list_items).post(inventory::create_item),
        )
        .route(
            "/inventory/:id",
            put(inventory::update_item).delete(inventory::delete_item),
        )
        .route("/dashboard", get(inventory::dashboard))
        // Cart sessions
        .route("/sessions", post(cart::open_session))
        .route("/sessions/:id", axum::routing::delete(cart::close_session))
        .route(
            "/sessions/:id/cart",
            get(cart::get_cart).delete(cart::clear_cart),
        )
        .route("/sessions/:id/cart/items", post(cart::add_item))
        .route(
            "/sessions/:id/cart/items/:item_id",
            axum::routing::delete(cart::remove_item),
        )
        .route(
            "/sessions/:id/cart/items/:item_id/quantity",
            put(cart::set_quantity),
        )
        .route(
            "/sessions/:id/cart/items/:item_id/price",
            put(cart::negotiate_price),
        )
        .route("/sessions/:id/checkout", post(sale::checkout))
        // Sales
        .route("/sales", get(sale::list_sales))
        .route("/sales/:id", get(sale::get_sale))
        .route("/sales/:id/receipt", get(sale::get_receipt))
        // Reports
        .route("/reports/low-stock", get(report::low_stock))
        .route("/reports/low-stock/export", get(report::low_stock_export))
        .route("/reports/inventory", get(report::inventory))
        .route("/reports/inventory/export", get(report::inventory_export))
        .route("/reports/sales", get(report::sales))
        .route("/reports/sales/export", get(report::sales_export));

    Router::new()
        .nest("/api", api)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Initializes the tracing subscriber for structured logging.
///
/// ## Log Levels
/// - `RUST_LOG=debug` - Show debug messages
/// - `RUST_LOG=mesha=trace` - Show trace for mesha crates only
/// - Default: `info,mesha=debug,sqlx=warn`
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,mesha=debug,sqlx=warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();
}

/// Opens the database, binds the listener and serves until `shutdown`
/// resolves.
///
/// ## Startup Sequence
/// ```text
/// ┌─────────────────────────────────────────────────────────────────────────┐
/// │  1. Connect to database (SQLite, WAL) and run pending migrations        │
/// │  2. Build AppState (repositories, empty session registry)               │
/// │  3. Bind host:port                                                      │
/// │  4. Serve; on shutdown, finish in-flight requests then close the pool   │
/// └─────────────────────────────────────────────────────────────────────────┘
/// ```
pub async fn run(
    config: ServerConfig,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> anyhow::Result<()> {
    let addr = config.bind_addr()?;

    let db_config = if config.database_path == ":memory:" {
        DbConfig::in_memory()
    } else {
        DbConfig::new(&config.database_path).max_connections(config.max_connections)
    };
    let db = Database::new(db_config)
        .await
        .with_context(|| format!("opening database {}", config.database_path))?;
    info!(path = %config.database_path, "Database connected and migrations applied");

    let state = AppState::new(db.clone(), config);
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("binding {}", addr))?;
    info!(%addr, "Mesha POS server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
        .context("server error")?;

    db.close().await;
    info!("Server shutdown complete");
    Ok(())
}

// =============================================================================
// Router Tests
// =============================================================================

#[cfg(test)]
mod tests;
