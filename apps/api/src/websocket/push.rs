//! Push engine
//!
//! Reruns the recommendation pipeline for a user and fans the fresh list
//! out to every live session. Triggers for the same user are serialized by
//! a per-user async mutex; triggers for different users run concurrently.

use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use tokio::sync::Mutex;

use crate::deadline::Deadline;
use crate::services::{RecommendationPipeline, RecommendationRequest};

use super::messages::{RecommendationsUpdatePayload, RefreshReason, ServerMessage};
use super::registry::SessionRegistry;

/// Every push refresh asks the pipeline for this many tracks, with no
/// context, so all sessions see the same baseline list.
const PUSH_REFRESH_LIMIT: usize = 20;

/// Budget for one refresh: invalidation, pipeline rerun and fan-out
const PUSH_REFRESH_BUDGET: Duration = Duration::from_secs(2);

/// Push engine over the session registry and the pipeline
#[derive(Clone)]
pub struct PushEngine {
    registry: SessionRegistry,
    pipeline: RecommendationPipeline,
    /// Per-user serialization of trigger_refresh
    refresh_locks: Arc<DashMap<String, Arc<Mutex<()>>>>,
}

impl PushEngine {
    pub fn new(registry: SessionRegistry, pipeline: RecommendationPipeline) -> Self {
        Self {
            registry,
            pipeline,
            refresh_locks: Arc::new(DashMap::new()),
        }
    }

    /// Invalidate, recompute and fan out fresh recommendations.
    ///
    /// Two near-simultaneous triggers for one user produce two sequential
    /// fan-outs, each with a freshly recomputed list. Never returns an
    /// error: a failed refresh leaves the user's sessions silent until the
    /// next successful trigger.
    pub async fn trigger_refresh(&self, user_id: &str, reason: RefreshReason) {
        let lock = self
            .refresh_locks
            .entry(user_id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        let guard = lock.lock().await;

        self.pipeline.invalidate(user_id).await;

        let deadline = Deadline::after(PUSH_REFRESH_BUDGET);
        let request = RecommendationRequest {
            context: None,
            limit: Some(PUSH_REFRESH_LIMIT),
        };

        match self.pipeline.get_recommendations(user_id, request, deadline).await {
            Ok(response) => {
                let sent = self.registry.broadcast_to_user(
                    user_id,
                    ServerMessage::RecommendationsUpdate(RecommendationsUpdatePayload {
                        tracks: response.tracks,
                        reason,
                    }),
                );
                tracing::info!(
                    user_id = %user_id,
                    reason = ?reason,
                    sessions = sent,
                    "Pushed recommendations update"
                );
            }
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    user_id = %user_id,
                    reason = ?reason,
                    "Push refresh failed; sessions stay silent until the next trigger"
                );
            }
        }

        drop(guard);
        // Drop the lock entry unless another trigger currently holds a clone.
        self.refresh_locks
            .remove_if(user_id, |_, lock| Arc::strong_count(lock) <= 2);
    }

    /// Detached trigger for the interaction write-path: the HTTP response
    /// does not wait for the fan-out.
    pub fn spawn_refresh(&self, user_id: &str, reason: RefreshReason) {
        let engine = self.clone();
        let user_id = user_id.to_string();
        tokio::spawn(async move {
            engine.trigger_refresh(&user_id, reason).await;
        });
    }
}
