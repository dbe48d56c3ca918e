//! Push channel for real-time recommendation refreshes
//!
//! This module provides:
//! - The per-user session registry for live push connections
//! - The push engine that reruns the pipeline and fans out
//!   `recommendations:update` events
//! - The WebSocket upgrade handler for `/recommendations/ws`
//!
//! # Authentication
//!
//! The edge verifies identity before the handshake reaches us; the external
//! user ID arrives as a query parameter:
//! `wss://api.example.com/recommendations/ws?userId=<external-user-id>`
//!
//! # Message Protocol
//!
//! See [`messages`] for the full message type definitions.
//!
//! ## Client → Server
//! - `ping` - Heartbeat, answered with `pong`
//! - `request-refresh` - Ask for a fresh list out of band
//!
//! ## Server → Client
//! - `connected` - Connection established
//! - `recommendations:update` - Fresh ranked list with a refresh reason
//! - `pong` - Heartbeat response
//! - `error` - Error occurred
//!
//! # Ordering
//!
//! Refresh triggers are serialized per user, so each session sees updates
//! in trigger order. Nothing is ordered across users.

pub mod handler;
pub mod messages;
pub mod push;
pub mod registry;

pub use handler::ws_handler;
pub use messages::RefreshReason;
pub use push::PushEngine;
pub use registry::SessionRegistry;
