//! Session registry for the push channel
//!
//! Tracks live push sessions per user. The registry holds the only strong
//! reference to each session's send handle; sessions refer back to their
//! user by value, so dropping the handle on disconnect is the whole
//! cleanup story.

use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::mpsc;
use uuid::Uuid;

use super::messages::ServerMessage;

/// Handle for sending messages to a single connected session
#[derive(Debug)]
pub struct SessionHandle {
    /// Channel draining into the session's socket
    sender: mpsc::UnboundedSender<ServerMessage>,

    /// When this session connected (Unix timestamp ms)
    pub connected_at: i64,
}

impl SessionHandle {
    pub fn new(sender: mpsc::UnboundedSender<ServerMessage>) -> Self {
        Self {
            sender,
            connected_at: chrono::Utc::now().timestamp_millis(),
        }
    }

    /// Send a message to this session
    #[allow(clippy::result_large_err)]
    pub fn send(&self, msg: ServerMessage) -> Result<(), mpsc::error::SendError<ServerMessage>> {
        self.sender.send(msg)
    }

    /// Check if the session's socket loop is still draining the channel
    pub fn is_alive(&self) -> bool {
        !self.sender.is_closed()
    }
}

/// Manages push sessions for all users
///
/// Thread-safe; uses DashMap sharding so fan-outs to distinct users run in
/// parallel. Wrapped in Arc for cheap cloning.
#[derive(Debug, Clone, Default)]
pub struct SessionRegistry {
    /// Map of external_user_id -> (session_id -> SessionHandle)
    users: Arc<DashMap<String, DashMap<Uuid, SessionHandle>>>,
}

impl SessionRegistry {
    /// Create a new session registry
    pub fn new() -> Self {
        Self {
            users: Arc::new(DashMap::new()),
        }
    }

    /// Register a session for a user
    pub fn add_session(
        &self,
        user_id: &str,
        session_id: Uuid,
        sender: mpsc::UnboundedSender<ServerMessage>,
    ) {
        self.users
            .entry(user_id.to_string())
            .or_default()
            .insert(session_id, SessionHandle::new(sender));

        tracing::debug!(
            user_id = %user_id,
            session_id = %session_id,
            session_count = self.session_count(user_id),
            "Session registered"
        );
    }

    /// Remove a session. Safe to call twice; drops the user entry once its
    /// last session is gone.
    pub fn remove_session(&self, user_id: &str, session_id: Uuid) -> bool {
        let Some(sessions) = self.users.get(user_id) else {
            return false;
        };

        let removed = sessions.remove(&session_id).is_some();
        let is_empty = sessions.is_empty();
        drop(sessions);

        if is_empty {
            self.users
                .remove_if(user_id, |_, sessions| sessions.is_empty());
        }

        if removed {
            tracing::debug!(
                user_id = %user_id,
                session_id = %session_id,
                "Session removed"
            );
        }

        removed
    }

    /// Send a message to every session of a user; returns how many sends
    /// succeeded. A dead session never blocks the others.
    pub fn broadcast_to_user(&self, user_id: &str, msg: ServerMessage) -> usize {
        let Some(sessions) = self.users.get(user_id) else {
            return 0;
        };

        let mut sent = 0;
        for entry in sessions.iter() {
            if entry.value().send(msg.clone()).is_ok() {
                sent += 1;
            } else {
                tracing::debug!(
                    user_id = %user_id,
                    session_id = %entry.key(),
                    "Skipping emit to closed session"
                );
            }
        }

        sent
    }

    /// Whether the user has any registered sessions
    pub fn has_sessions(&self, user_id: &str) -> bool {
        self.users
            .get(user_id)
            .map(|sessions| !sessions.is_empty())
            .unwrap_or(false)
    }

    /// Number of sessions registered for a user
    pub fn session_count(&self, user_id: &str) -> usize {
        self.users
            .get(user_id)
            .map(|sessions| sessions.len())
            .unwrap_or(0)
    }

    /// Total number of sessions across all users
    pub fn total_sessions(&self) -> usize {
        self.users.iter().map(|entry| entry.value().len()).sum()
    }

    /// Number of users with at least one session
    pub fn total_users(&self) -> usize {
        self.users.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_remove_session() {
        let registry = SessionRegistry::new();
        let session_id = Uuid::new_v4();

        let (tx, _rx) = mpsc::unbounded_channel();
        registry.add_session("u1", session_id, tx);

        assert!(registry.has_sessions("u1"));
        assert_eq!(registry.session_count("u1"), 1);

        assert!(registry.remove_session("u1", session_id));

        assert!(!registry.has_sessions("u1"));
        assert_eq!(registry.session_count("u1"), 0);
        assert_eq!(registry.total_users(), 0);
    }

    #[test]
    fn test_remove_session_is_idempotent() {
        let registry = SessionRegistry::new();
        let session_id = Uuid::new_v4();

        let (tx, _rx) = mpsc::unbounded_channel();
        registry.add_session("u1", session_id, tx);

        assert!(registry.remove_session("u1", session_id));
        assert!(!registry.remove_session("u1", session_id));
        assert!(!registry.remove_session("nobody", session_id));
    }

    #[test]
    fn test_broadcast_reaches_all_sessions() {
        let registry = SessionRegistry::new();
        let (tx1, mut rx1) = mpsc::unbounded_channel();
        let (tx2, mut rx2) = mpsc::unbounded_channel();

        registry.add_session("u1", Uuid::new_v4(), tx1);
        registry.add_session("u1", Uuid::new_v4(), tx2);

        let sent = registry.broadcast_to_user("u1", ServerMessage::Pong { server_time: 1 });
        assert_eq!(sent, 2);
        assert!(rx1.try_recv().is_ok());
        assert!(rx2.try_recv().is_ok());
    }

    #[test]
    fn test_broadcast_isolated_per_user() {
        let registry = SessionRegistry::new();
        let (tx1, mut rx1) = mpsc::unbounded_channel();
        let (tx2, mut rx2) = mpsc::unbounded_channel();

        registry.add_session("u1", Uuid::new_v4(), tx1);
        registry.add_session("u2", Uuid::new_v4(), tx2);

        let sent = registry.broadcast_to_user("u1", ServerMessage::Pong { server_time: 1 });
        assert_eq!(sent, 1);
        assert!(rx1.try_recv().is_ok());
        assert!(rx2.try_recv().is_err());
    }

    #[test]
    fn test_removed_session_receives_no_further_emits() {
        let registry = SessionRegistry::new();
        let session_id = Uuid::new_v4();
        let (tx, mut rx) = mpsc::unbounded_channel();

        registry.add_session("u1", session_id, tx);
        registry.remove_session("u1", session_id);

        registry.broadcast_to_user("u1", ServerMessage::Pong { server_time: 1 });
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_dead_session_does_not_block_others() {
        let registry = SessionRegistry::new();
        let (tx1, rx1) = mpsc::unbounded_channel();
        let (tx2, mut rx2) = mpsc::unbounded_channel();

        registry.add_session("u1", Uuid::new_v4(), tx1);
        registry.add_session("u1", Uuid::new_v4(), tx2);
        drop(rx1);

        let sent = registry.broadcast_to_user("u1", ServerMessage::Pong { server_time: 1 });
        assert_eq!(sent, 1);
        assert!(rx2.try_recv().is_ok());
    }
}
