//! WebSocket upgrade handler for the push channel
//!
//! The edge verifies identity and puts the external user ID on the
//! handshake query string; a connection without one is rejected after the
//! upgrade with an error frame.

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Extension, Query,
    },
    response::Response,
};
use futures_util::{SinkExt, StreamExt};
use serde::Deserialize;
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::models::profile::MAX_EXTERNAL_USER_ID_LEN;

use super::messages::{ClientMessage, ConnectedPayload, ErrorPayload, RefreshReason, ServerMessage};
use super::push::PushEngine;
use super::registry::SessionRegistry;

/// Query parameters for the push channel handshake
#[derive(Debug, Deserialize)]
pub struct WsQueryParams {
    /// External user ID, already verified by the edge
    #[serde(rename = "userId")]
    user_id: Option<String>,
}

fn validate_user_id(user_id: &str) -> Result<(), &'static str> {
    if user_id.is_empty() {
        return Err("userId cannot be empty");
    }
    if user_id.len() > MAX_EXTERNAL_USER_ID_LEN {
        return Err("userId exceeds 255 characters");
    }
    Ok(())
}

/// WebSocket upgrade handler for /recommendations/ws
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    Query(params): Query<WsQueryParams>,
    Extension(registry): Extension<SessionRegistry>,
    Extension(push): Extension<PushEngine>,
) -> Response {
    let user_id = match params.user_id {
        Some(user_id) if validate_user_id(&user_id).is_ok() => user_id,
        other => {
            tracing::warn!(user_id = ?other, "Push connection rejected");
            return ws.on_upgrade(|mut socket| async move {
                let error_msg = ServerMessage::Error(ErrorPayload::missing_user_id());
                if let Ok(json) = serde_json::to_string(&error_msg) {
                    let _ = socket.send(Message::Text(json)).await;
                }
                let _ = socket.close().await;
            });
        }
    };

    tracing::info!(user_id = %user_id, "Push connection accepted");
    ws.on_upgrade(move |socket| handle_socket(socket, user_id, registry, push))
}

/// Handle an established push connection
async fn handle_socket(
    socket: WebSocket,
    user_id: String,
    registry: SessionRegistry,
    push: PushEngine,
) {
    let session_id = Uuid::new_v4();

    // Channel drained by the send task below; the registry owns the sender.
    let (tx, mut rx) = mpsc::unbounded_channel::<ServerMessage>();
    registry.add_session(&user_id, session_id, tx.clone());

    let (mut ws_sender, mut ws_receiver) = socket.split();

    let connected_msg = ServerMessage::Connected(ConnectedPayload { session_id });
    if let Ok(json) = serde_json::to_string(&connected_msg) {
        if ws_sender.send(Message::Text(json)).await.is_err() {
            tracing::warn!(
                user_id = %user_id,
                session_id = %session_id,
                "Failed to send connected message"
            );
            registry.remove_session(&user_id, session_id);
            return;
        }
    }

    // Forward registry emits to the socket
    let session_id_send = session_id;
    let mut send_task = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            match serde_json::to_string(&msg) {
                Ok(json) => {
                    if ws_sender.send(Message::Text(json)).await.is_err() {
                        tracing::debug!(session_id = %session_id_send, "WebSocket send failed");
                        break;
                    }
                }
                Err(e) => {
                    tracing::error!(error = %e, "Failed to serialize push message");
                }
            }
        }
    });

    // Process client events
    let user_id_recv = user_id.clone();
    let push_recv = push.clone();
    let session_tx = tx;
    let mut recv_task = tokio::spawn(async move {
        while let Some(result) = ws_receiver.next().await {
            match result {
                Ok(Message::Text(text)) => match serde_json::from_str::<ClientMessage>(&text) {
                    Ok(ClientMessage::Ping) => {
                        let _ = session_tx.send(ServerMessage::Pong {
                            server_time: chrono::Utc::now().timestamp_millis(),
                        });
                    }
                    Ok(ClientMessage::RequestRefresh) => {
                        push_recv.spawn_refresh(&user_id_recv, RefreshReason::ManualRefresh);
                    }
                    Err(e) => {
                        tracing::debug!(
                            error = %e,
                            user_id = %user_id_recv,
                            "Failed to parse client message"
                        );
                        let _ = session_tx.send(ServerMessage::Error(
                            ErrorPayload::invalid_message(e.to_string()),
                        ));
                    }
                },
                Ok(Message::Ping(_)) | Ok(Message::Pong(_)) => {
                    // Transport-level frames handled by axum-ws
                }
                Ok(Message::Binary(_)) => {
                    tracing::debug!(
                        user_id = %user_id_recv,
                        "Received unsupported binary message"
                    );
                }
                Ok(Message::Close(_)) => {
                    tracing::debug!(user_id = %user_id_recv, "WebSocket close received");
                    break;
                }
                Err(e) => {
                    tracing::debug!(error = %e, user_id = %user_id_recv, "WebSocket error");
                    break;
                }
            }
        }
    });

    // Wait for either task to complete, then abort the other
    tokio::select! {
        _ = &mut send_task => {
            recv_task.abort();
        }
        _ = &mut recv_task => {
            send_task.abort();
        }
    }

    registry.remove_session(&user_id, session_id);

    tracing::info!(
        user_id = %user_id,
        session_id = %session_id,
        "Push connection closed"
    );
}
