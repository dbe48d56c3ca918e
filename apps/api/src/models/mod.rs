//! Data models for Cadence
//!
//! Database-backed records (tracks, user profiles, interactions, interest
//! graphs) and the embedding text codec shared by models and repositories.

pub mod embedding;
pub mod interaction;
pub mod interest_graph;
pub mod profile;
pub mod track;

pub use embedding::{format_pgvector, parse_pgvector, EMBEDDING_DIM};
pub use interaction::{
    Activity, EventType, Interaction, InteractionEvent, InteractionStats,
    InteractionWithTrackMeta, ListeningContext, Mood, TimeBucket,
};
pub use interest_graph::InterestGraph;
pub use profile::UserProfile;
pub use track::{AudioFeatures, Track};
