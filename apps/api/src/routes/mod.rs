//! HTTP route handlers for the Cadence API
//!
//! Transport adapters only: each handler decodes the request, calls one
//! component method and encodes the response. No business logic lives here.

pub mod health;
pub mod interactions;
pub mod profile;
pub mod recommendations;

pub use health::{health_router, HealthState};
pub use interactions::{interactions_router, InteractionState};
pub use profile::{profile_router, ProfileState};
pub use recommendations::{recommendations_router, RecommendationState};
