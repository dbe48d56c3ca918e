//! WebSocket message types for the push channel
//!
//! This module defines the message protocol for client-server communication
//! over the /recommendations push channel. Messages are serialized as JSON
//! with a `type` tag and an optional `payload`.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::Track;

/// Why a push refresh ran
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RefreshReason {
    SkipDetected,
    ContextChange,
    ManualRefresh,
}

// =============================================================================
// Client -> Server Messages
// =============================================================================

/// Messages sent from client to server
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload")]
pub enum ClientMessage {
    /// Heartbeat; answered with `pong`
    #[serde(rename = "ping")]
    Ping,

    /// Ask for a fresh recommendation list out of band
    #[serde(rename = "request-refresh")]
    RequestRefresh,
}

// =============================================================================
// Server -> Client Messages
// =============================================================================

/// Messages sent from server to client
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload")]
pub enum ServerMessage {
    /// Connection established successfully
    #[serde(rename = "connected")]
    Connected(ConnectedPayload),

    /// Fresh recommendations for this user
    #[serde(rename = "recommendations:update")]
    RecommendationsUpdate(RecommendationsUpdatePayload),

    /// Heartbeat response
    #[serde(rename = "pong")]
    Pong { server_time: i64 },

    /// Error occurred
    #[serde(rename = "error")]
    Error(ErrorPayload),
}

// =============================================================================
// Payload Types
// =============================================================================

/// Payload for the connected message
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectedPayload {
    pub session_id: Uuid,
}

/// Payload for recommendations:update
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecommendationsUpdatePayload {
    pub tracks: Vec<Track>,
    pub reason: RefreshReason,
}

/// Payload for error messages
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorPayload {
    pub code: String,
    pub message: String,
}

impl ErrorPayload {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }

    pub fn missing_user_id() -> Self {
        Self::new(
            "MISSING_USER_ID",
            "connection handshake did not carry a userId",
        )
    }

    pub fn invalid_message(detail: impl Into<String>) -> Self {
        Self::new("INVALID_MESSAGE", detail)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_refresh_reason_wire_format() {
        assert_eq!(
            serde_json::to_string(&RefreshReason::SkipDetected).unwrap(),
            r#""skip_detected""#
        );
        assert_eq!(
            serde_json::to_string(&RefreshReason::ManualRefresh).unwrap(),
            r#""manual_refresh""#
        );
    }

    #[test]
    fn test_update_event_name() {
        let msg = ServerMessage::RecommendationsUpdate(RecommendationsUpdatePayload {
            tracks: vec![],
            reason: RefreshReason::SkipDetected,
        });
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["type"], "recommendations:update");
        assert_eq!(json["payload"]["reason"], "skip_detected");
    }

    #[test]
    fn test_client_message_parsing() {
        let ping: ClientMessage = serde_json::from_str(r#"{"type":"ping"}"#).unwrap();
        assert!(matches!(ping, ClientMessage::Ping));

        let refresh: ClientMessage =
            serde_json::from_str(r#"{"type":"request-refresh"}"#).unwrap();
        assert!(matches!(refresh, ClientMessage::RequestRefresh));
    }

    #[test]
    fn test_pong_round_trip() {
        let msg = ServerMessage::Pong { server_time: 1234 };
        let json = serde_json::to_string(&msg).unwrap();
        let parsed: ServerMessage = serde_json::from_str(&json).unwrap();
        assert!(matches!(parsed, ServerMessage::Pong { server_time: 1234 }));
    }
}
