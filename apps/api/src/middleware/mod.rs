//! Middleware components for the Cadence API

pub mod identity;

pub use identity::Identity;
