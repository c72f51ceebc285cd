//! Live session registry.
//!
//! Maps each authenticated user to their single active WebSocket session.
//! A user connecting again replaces their previous entry; the superseded
//! transport stays open until it closes on its own, but fan-out can no
//! longer address it.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{mpsc, RwLock};

use crate::websocket::events::ServerEvent;

/// Handle to one live session's outbound queue.
///
/// Cloning the handle clones the sender; everything queued through any
/// clone reaches the client in queue order.
#[derive(Debug, Clone)]
pub struct SessionHandle {
    pub session_id: String,
    pub user_id: String,
    out_tx: mpsc::UnboundedSender<ServerEvent>,
}

impl SessionHandle {
    pub fn new(
        session_id: String,
        user_id: String,
        out_tx: mpsc::UnboundedSender<ServerEvent>,
    ) -> Self {
        Self {
            session_id,
            user_id,
            out_tx,
        }
    }

    /// Queue an event for delivery. Returns false once the transport has
    /// closed and nothing more can be delivered through this session.
    pub fn send(&self, event: ServerEvent) -> bool {
        self.out_tx.send(event).is_ok()
    }
}

#[derive(Default)]
struct RegistryInner {
    by_user: HashMap<String, SessionHandle>,
    user_by_session: HashMap<String, String>,
}

/// Registry of live, authenticated sessions keyed by user ID.
#[derive(Clone, Default)]
pub struct SessionRegistry {
    inner: Arc<RwLock<RegistryInner>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a session as the user's active connection.
    ///
    /// If the user already had one, the newer session wins and the old
    /// handle is forgotten. Returns the superseded session's ID so the
    /// caller can log the replacement.
    pub async fn register(&self, handle: SessionHandle) -> Option<String> {
        let mut inner = self.inner.write().await;
        inner
            .user_by_session
            .insert(handle.session_id.clone(), handle.user_id.clone());
        let previous = inner.by_user.insert(handle.user_id.clone(), handle);
        if let Some(previous) = &previous {
            inner.user_by_session.remove(&previous.session_id);
        }
        previous.map(|p| p.session_id)
    }

    /// Remove a session by its own ID, returning the user it belonged to.
    ///
    /// Calling this for a session that was already replaced is a no-op; a
    /// stale ID never evicts the user's current session.
    pub async fn unregister(&self, session_id: &str) -> Option<String> {
        let mut inner = self.inner.write().await;
        let user_id = inner.user_by_session.remove(session_id)?;
        let is_current = inner
            .by_user
            .get(&user_id)
            .is_some_and(|current| current.session_id == session_id);
        if !is_current {
            return None;
        }
        inner.by_user.remove(&user_id);
        Some(user_id)
    }

    /// Look up the live session for a user, if any.
    pub async fn resolve(&self, user_id: &str) -> Option<SessionHandle> {
        self.inner.read().await.by_user.get(user_id).cloned()
    }

    /// Look up which user owns a session.
    pub async fn resolve_user(&self, session_id: &str) -> Option<String> {
        self.inner
            .read()
            .await
            .user_by_session
            .get(session_id)
            .cloned()
    }

    /// Number of users with a live session.
    pub async fn connected_users(&self) -> usize {
        self.inner.read().await.by_user.len()
    }
}
