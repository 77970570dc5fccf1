//! # State Module
//!
//! Shared application state handed to every handler.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    State Architecture                                   │
//! │                                                                         │
//! │  AppState (Clone, cheap: every field is an Arc)                         │
//! │  ├── inventory: Arc<dyn InventoryRepository>                            │
//! │  ├── sales:     Arc<dyn SalesRepository>                                │
//! │  ├── sessions:  SessionStore                                            │
//! │  │      RwLock<HashMap<id, Arc<Mutex<CartSession>>>>                    │
//! │  │      idle sessions dropped on open, capped at max_sessions           │
//! │  ├── config:    Arc<ServerConfig>          read-only after start-up     │
//! │  └── database:  Option<Database>           health checks only           │
//! │                                                                         │
//! │  THREAD SAFETY:                                                        │
//! │  • Repositories: internal connection pool                              │
//! │  • Sessions: the map lock is held only to look a session up; each      │
//! │    cart has its own async mutex, held across a whole operation         │
//! │    (including checkout), so two tills never block each other          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

mod session;

use std::sync::Arc;

use mesha_db::{Database, InventoryRepository, SalesRepository};

use crate::config::ServerConfig;

pub use session::{
    SessionError, SessionHandle, SessionStore, DEFAULT_MAX_SESSIONS, DEFAULT_SESSION_IDLE_MINUTES,
};

/// State shared by all handlers.
#[derive(Clone)]
pub struct AppState {
    pub inventory: Arc<dyn InventoryRepository>,
    pub sales: Arc<dyn SalesRepository>,
    pub sessions: SessionStore,
    pub config: Arc<ServerConfig>,
    /// Present when backed by SQLite; used by the health check.
    pub database: Option<Database>,
}

impl AppState {
    /// State over an open database.
    pub fn new(database: Database, config: ServerConfig) -> Self {
        AppState {
            inventory: Arc::new(database.inventory()),
            sales: Arc::new(database.sales()),
            sessions: sessions_for(&config),
            config: Arc::new(config),
            database: Some(database),
        }
    }

    /// State over arbitrary repository implementations.
    pub fn with_repositories(
        inventory: Arc<dyn InventoryRepository>,
        sales: Arc<dyn SalesRepository>,
        config: ServerConfig,
    ) -> Self {
        AppState {
            inventory,
            sales,
            sessions: sessions_for(&config),
            config: Arc::new(config),
            database: None,
        }
    }
}

fn sessions_for(config: &ServerConfig) -> SessionStore {
    SessionStore::new(config.max_sessions, config.session_idle_timeout())
}
