//! Business logic services for Cadence
//!
//! The recommendation pipeline and its collaborators: the Redis-backed
//! response cache, the interest graph engine, and the profile embedding
//! engine. Services own the degradation policy (what is best-effort and
//! what surfaces) while the repositories stay a thin typed query surface.

pub mod cache;
pub mod interest_graph;
pub mod pipeline;
pub mod profile_embedding;

pub use cache::RecommendationCache;
pub use interest_graph::InterestGraphService;
pub use pipeline::{RecommendationPipeline, RecommendationRequest, RecommendationResponse};
pub use profile_embedding::ProfileEmbeddingService;
