//! # Cart Sessions
//!
//! One [`CartSession`] per open till, each behind its own async mutex.
//!
//! A `tokio::sync::Mutex` rather than a std one: the lock is held across
//! repository awaits (checkout, stock look-ups).
//!
//! ## Lifetime
//! Every look-up records a last-used time. Opening a session first drops
//! sessions idle for longer than the configured timeout, then refuses to
//! open past the session cap. A session whose lock is held is never
//! dropped.

use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use mesha_core::CartSession;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, warn};
use uuid::Uuid;

/// A shared, lockable cart session.
pub type SessionHandle = Arc<Mutex<CartSession>>;

/// Default cap on open sessions.
pub const DEFAULT_MAX_SESSIONS: usize = 256;

/// Default idle time after which a session may be dropped.
pub const DEFAULT_SESSION_IDLE_MINUTES: u32 = 8 * 60;

/// Session registry errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    #[error("Too many open sessions (limit {max}); close an unused till first")]
    LimitReached { max: usize },
}

struct SessionEntry {
    handle: SessionHandle,
    /// Unix milliseconds of the last open or look-up.
    last_used: AtomicI64,
}

impl SessionEntry {
    fn new(handle: SessionHandle, now: DateTime<Utc>) -> Self {
        SessionEntry {
            handle,
            last_used: AtomicI64::new(now.timestamp_millis()),
        }
    }

    fn touch(&self, now: DateTime<Utc>) {
        self.last_used
            .fetch_max(now.timestamp_millis(), Ordering::Relaxed);
    }

    fn is_stale(&self, cutoff_millis: i64) -> bool {
        self.last_used.load(Ordering::Relaxed) < cutoff_millis && self.handle.try_lock().is_ok()
    }
}

/// Registry of open cart sessions.
#[derive(Clone)]
pub struct SessionStore {
    sessions: Arc<RwLock<HashMap<String, SessionEntry>>>,
    max_sessions: usize,
    idle_timeout: Duration,
}

impl Default for SessionStore {
    fn default() -> Self {
        SessionStore::new(
            DEFAULT_MAX_SESSIONS,
            Duration::minutes(i64::from(DEFAULT_SESSION_IDLE_MINUTES)),
        )
    }
}

impl SessionStore {
    pub fn new(max_sessions: usize, idle_timeout: Duration) -> Self {
        SessionStore {
            sessions: Arc::new(RwLock::new(HashMap::new())),
            max_sessions,
            idle_timeout,
        }
    }

    /// Opens an empty session and returns its id.
    ///
    /// Idle sessions are dropped first. Fails when the cap is still reached
    /// afterwards.
    pub async fn open(&self, now: DateTime<Utc>) -> Result<String, SessionError> {
        let mut sessions = self.sessions.write().await;
        let evicted = Self::evict_locked(&mut sessions, self.cutoff(now));
        if evicted > 0 {
            info!(evicted, "Idle cart sessions dropped");
        }

        if sessions.len() >= self.max_sessions {
            warn!(max = self.max_sessions, "Session limit reached");
            return Err(SessionError::LimitReached {
                max: self.max_sessions,
            });
        }

        let id = Uuid::new_v4().to_string();
        let handle = Arc::new(Mutex::new(CartSession::new(id.clone(), now)));
        sessions.insert(id.clone(), SessionEntry::new(handle, now));
        debug!(session = %id, open = sessions.len(), "Cart session opened");
        Ok(id)
    }

    /// Looks up a session and marks it used at `now`.
    pub async fn get(&self, id: &str, now: DateTime<Utc>) -> Option<SessionHandle> {
        let sessions = self.sessions.read().await;
        let entry = sessions.get(id)?;
        entry.touch(now);
        Some(entry.handle.clone())
    }

    /// Closes a session. Returns false if it was not open.
    ///
    /// A request already holding the session's lock finishes normally.
    pub async fn close(&self, id: &str) -> bool {
        let removed = self.sessions.write().await.remove(id).is_some();
        debug!(session = %id, removed, "Cart session closed");
        removed
    }

    /// Drops sessions unused since `now - idle_timeout`. Returns how many.
    pub async fn evict_idle(&self, now: DateTime<Utc>) -> usize {
        let mut sessions = self.sessions.write().await;
        Self::evict_locked(&mut sessions, self.cutoff(now))
    }

    /// Number of open sessions.
    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    fn cutoff(&self, now: DateTime<Utc>) -> i64 {
        now.timestamp_millis()
            .saturating_sub(self.idle_timeout.num_milliseconds())
    }

    fn evict_locked(sessions: &mut HashMap<String, SessionEntry>, cutoff_millis: i64) -> usize {
        let before = sessions.len();
        sessions.retain(|id, entry| {
            let stale = entry.is_stale(cutoff_millis);
            if stale {
                debug!(session = %id, "Idle cart session dropped");
            }
            !stale
        });
        before - sessions.len()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
