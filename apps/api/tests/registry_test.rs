//! Tests for the push session registry
//!
//! Focus: fan-out reaches every live session of the right user, disconnects
//! never leak, and a dead session cannot block its siblings.

use tokio::sync::mpsc;
use uuid::Uuid;

use cadence_api::websocket::messages::{
    RecommendationsUpdatePayload, RefreshReason, ServerMessage,
};
use cadence_api::websocket::SessionRegistry;

fn update_message() -> ServerMessage {
    ServerMessage::RecommendationsUpdate(RecommendationsUpdatePayload {
        tracks: vec![],
        reason: RefreshReason::SkipDetected,
    })
}

#[tokio::test]
async fn fan_out_reaches_every_session_of_the_user() {
    let registry = SessionRegistry::new();
    let (tx1, mut rx1) = mpsc::unbounded_channel();
    let (tx2, mut rx2) = mpsc::unbounded_channel();
    let (tx3, mut rx3) = mpsc::unbounded_channel();

    registry.add_session("u3", Uuid::new_v4(), tx1);
    registry.add_session("u3", Uuid::new_v4(), tx2);
    registry.add_session("other", Uuid::new_v4(), tx3);

    let sent = registry.broadcast_to_user("u3", update_message());

    assert_eq!(sent, 2);
    assert!(matches!(
        rx1.try_recv().unwrap(),
        ServerMessage::RecommendationsUpdate(_)
    ));
    assert!(rx2.try_recv().is_ok());
    assert!(rx3.try_recv().is_err(), "other user must not receive");
}

#[tokio::test]
async fn disconnected_session_receives_no_further_emits() {
    let registry = SessionRegistry::new();
    let session_id = Uuid::new_v4();
    let (tx, mut rx) = mpsc::unbounded_channel();

    registry.add_session("u1", session_id, tx);
    registry.broadcast_to_user("u1", update_message());
    assert!(rx.try_recv().is_ok());

    registry.remove_session("u1", session_id);
    registry.broadcast_to_user("u1", update_message());
    assert!(rx.try_recv().is_err());
}

#[tokio::test]
async fn double_disconnect_is_safe() {
    let registry = SessionRegistry::new();
    let session_id = Uuid::new_v4();
    let (tx, _rx) = mpsc::unbounded_channel();

    registry.add_session("u1", session_id, tx);
    assert!(registry.remove_session("u1", session_id));
    assert!(!registry.remove_session("u1", session_id));
    assert_eq!(registry.session_count("u1"), 0);
}

#[tokio::test]
async fn empty_user_entries_are_dropped() {
    let registry = SessionRegistry::new();
    let session_id = Uuid::new_v4();
    let (tx, _rx) = mpsc::unbounded_channel();

    registry.add_session("u1", session_id, tx);
    assert_eq!(registry.total_users(), 1);

    registry.remove_session("u1", session_id);
    assert_eq!(registry.total_users(), 0);
    assert_eq!(registry.total_sessions(), 0);
}

#[tokio::test]
async fn dead_session_does_not_block_siblings() {
    let registry = SessionRegistry::new();
    let (tx1, rx1) = mpsc::unbounded_channel();
    let (tx2, mut rx2) = mpsc::unbounded_channel();

    registry.add_session("u1", Uuid::new_v4(), tx1);
    registry.add_session("u1", Uuid::new_v4(), tx2);

    // The first session's socket loop is gone.
    drop(rx1);

    let sent = registry.broadcast_to_user("u1", update_message());
    assert_eq!(sent, 1);
    assert!(rx2.try_recv().is_ok());
}

#[tokio::test]
async fn concurrent_fan_outs_to_distinct_users() {
    let registry = SessionRegistry::new();
    let mut receivers = Vec::new();

    for user in 0..8 {
        let (tx, rx) = mpsc::unbounded_channel();
        registry.add_session(&format!("user-{}", user), Uuid::new_v4(), tx);
        receivers.push(rx);
    }

    let mut handles = Vec::new();
    for user in 0..8 {
        let registry = registry.clone();
        handles.push(tokio::spawn(async move {
            registry.broadcast_to_user(&format!("user-{}", user), ServerMessage::Pong {
                server_time: user as i64,
            })
        }));
    }

    for handle in handles {
        assert_eq!(handle.await.unwrap(), 1);
    }
    for mut rx in receivers {
        assert!(rx.try_recv().is_ok());
    }
}
