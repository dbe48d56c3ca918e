//! Profile embedding engine
//!
//! Maintains the 256-d user taste vector. The computation itself runs
//! inside the store (see `ProfileRepository::upsert_profile_embedding`);
//! this service is the seam the pipeline degrades through when a recompute
//! fails.

use crate::deadline::Deadline;
use crate::error::ApiResult;
use crate::repositories::ProfileRepository;

/// Profile embedding engine
#[derive(Clone)]
pub struct ProfileEmbeddingService {
    profiles: ProfileRepository,
}

impl ProfileEmbeddingService {
    pub fn new(profiles: ProfileRepository) -> Self {
        Self { profiles }
    }

    /// Recompute the user's taste embedding from recent interactions.
    ///
    /// Idempotent and safe to call concurrently; the store transaction
    /// provides the ordering. A subsequent profile load reflects the new
    /// embedding, or the previous one when the user had no qualifying
    /// interactions.
    pub async fn recompute(&self, user_id: &str, deadline: Deadline) -> ApiResult<()> {
        self.profiles.upsert_profile_embedding(user_id, deadline).await
    }
}
