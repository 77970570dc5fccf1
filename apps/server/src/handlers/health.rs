//! # Health Handler

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use mesha_db::MigrationStatus;
use serde::Serialize;
use tracing::warn;

use crate::state::AppState;

#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// `ok` or `degraded`.
    pub status: String,
    /// `true` when the database answered, `None` without a database.
    pub database: Option<bool>,
    /// Embedded and applied migrations, when they could be read.
    pub schema: Option<MigrationStatus>,
    pub open_sessions: usize,
    pub version: String,
}

/// Liveness plus a database round-trip and a schema check.
///
/// Answers 503 when the database does not respond or its schema is behind
/// the binary.
pub async fn health(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let (database, schema) = match &state.database {
        Some(db) => {
            let reachable = db.health_check().await;
            let schema = match db.migration_status().await {
                Ok(status) => Some(status),
                Err(e) => {
                    warn!(error = %e, "Could not read migration status");
                    None
                }
            };
            (Some(reachable), schema)
        }
        None => (None, None),
    };

    let healthy = match (database, schema) {
        (None, _) => true,
        (Some(reachable), Some(schema)) => reachable && schema.is_current(),
        (Some(_), None) => false,
    };

    let body = HealthResponse {
        status: if healthy { "ok" } else { "degraded" }.to_string(),
        database,
        schema,
        open_sessions: state.sessions.len().await,
        version: env!("CARGO_PKG_VERSION").to_string(),
    };

    let status = if healthy {
        StatusCode::OK
    } else {
        warn!(?database, ?schema, "Health check failed");
        StatusCode::SERVICE_UNAVAILABLE
    };
    (status, Json(body))
}
