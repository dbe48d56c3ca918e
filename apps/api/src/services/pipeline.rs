//! Recommendation pipeline
//!
//! Orchestrates a recommendation request end to end: cache lookup, the
//! cold-start/personalized branch, candidate fetch, avoid filtering,
//! context rerank, artist diversity, cache store. The skip-burst detector
//! also lives here as a side duty of the interaction write-path.
//!
//! Degradation policy: the cache and the taste state (interest graph,
//! profile embedding) are accelerators — their failures are logged and the
//! request continues. Store failures on the candidate path surface.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use cadence_shared_config::RecommendationConfig;

use crate::deadline::Deadline;
use crate::error::ApiResult;
use crate::models::{
    EventType, Interaction, InteractionEvent, ListeningContext, Track, UserProfile,
};
use crate::repositories::{InteractionRepository, ProfileRepository, TrackRepository};

use super::cache::{cache_key, RecommendationCache};
use super::interest_graph::InterestGraphService;
use super::profile_embedding::ProfileEmbeddingService;

/// Requests are clamped into this range
pub const MIN_LIMIT: usize = 1;
pub const MAX_LIMIT: usize = 50;

/// Over-fetch factor for ANN candidates, to survive the avoid filters
const ANN_OVERFETCH: usize = 3;

/// Over-fetch factor for popularity candidates
const POPULAR_OVERFETCH: usize = 2;

/// Window and size of the recent-skip exclusion list
const SKIP_EXCLUSION_HOURS: i32 = 24;
const SKIP_EXCLUSION_LIMIT: i64 = 20;

/// Candidates whose artist or genre carries at least this avoid score are
/// dropped on the personalized path.
const AVOID_SCORE_THRESHOLD: f64 = 0.6;

/// Budget for the detached interest-graph refresh after an interaction
const GRAPH_REFRESH_BUDGET: Duration = Duration::from_secs(2);

/// A recommendation request as decoded by the transport
#[derive(Debug, Clone, Default)]
pub struct RecommendationRequest {
    pub context: Option<ListeningContext>,
    pub limit: Option<usize>,
}

/// A ranked recommendation response
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecommendationResponse {
    pub tracks: Vec<Track>,
    pub context: ListeningContext,
    pub generated_at: DateTime<Utc>,
}

/// The recommendation pipeline and its collaborators
#[derive(Clone)]
pub struct RecommendationPipeline {
    profiles: ProfileRepository,
    tracks: TrackRepository,
    interactions: InteractionRepository,
    interest_graph: InterestGraphService,
    profile_embedding: ProfileEmbeddingService,
    cache: RecommendationCache,
    config: RecommendationConfig,
}

impl RecommendationPipeline {
    pub fn new(
        profiles: ProfileRepository,
        tracks: TrackRepository,
        interactions: InteractionRepository,
        interest_graph: InterestGraphService,
        profile_embedding: ProfileEmbeddingService,
        cache: RecommendationCache,
        config: RecommendationConfig,
    ) -> Self {
        Self {
            profiles,
            tracks,
            interactions,
            interest_graph,
            profile_embedding,
            cache,
            config,
        }
    }

    /// Produce an ordered, diverse, context-adjusted track list.
    pub async fn get_recommendations(
        &self,
        user_id: &str,
        request: RecommendationRequest,
        deadline: Deadline,
    ) -> ApiResult<RecommendationResponse> {
        let limit = request
            .limit
            .unwrap_or(self.config.default_limit)
            .clamp(MIN_LIMIT, MAX_LIMIT);
        let context = request.context.unwrap_or_default();

        let key = cache_key(user_id, &context);
        if let Some(cached) = self.cache.get(&key, deadline).await {
            tracing::debug!(user_id = %user_id, key = %key, "Recommendation cache hit");
            return Ok(cached);
        }

        let profile = self.profiles.find_or_create(user_id, deadline).await?;
        let stats = self.interactions.stats(user_id, deadline).await?;

        let cold_start = stats.total == 0
            || (profile.preferred_genres.is_empty() && !profile.has_embedding());

        let candidates = if cold_start {
            tracing::debug!(user_id = %user_id, "Cold-start recommendation path");
            self.cold_start_candidates(&profile, limit, deadline).await?
        } else {
            self.personalized_candidates(user_id, limit, deadline).await?
        };

        let ranked = if context.is_empty() {
            candidates
        } else {
            rerank_by_context(candidates, &context)
        };
        let mut tracks = enforce_artist_diversity(ranked, self.config.max_same_artist);
        tracks.truncate(limit);

        let response = RecommendationResponse {
            tracks,
            context,
            generated_at: Utc::now(),
        };
        self.cache.put(&key, &response).await;
        Ok(response)
    }

    /// Remove every cached response for the user.
    pub async fn invalidate(&self, user_id: &str) {
        self.cache.invalidate_user(user_id).await;
    }

    /// Persist an interaction and run skip-burst detection.
    ///
    /// Returns the stored interaction and whether a push refresh should be
    /// triggered. The interest-graph refresh is detached: it carries its
    /// own budget and its failure never fails the interaction.
    pub async fn record_interaction(
        &self,
        user_id: &str,
        event: InteractionEvent,
        deadline: Deadline,
    ) -> ApiResult<(Interaction, bool)> {
        // First interaction may precede any profile query.
        self.profiles.find_or_create(user_id, deadline).await?;

        let interaction = self
            .interactions
            .append(
                user_id,
                event.track_id,
                event.event_type,
                event.event_value,
                event.context,
                deadline,
            )
            .await?;

        if self.config.interest_graph_enabled {
            let service = self.interest_graph.clone();
            let owner = user_id.to_string();
            tokio::spawn(async move {
                let deadline = Deadline::after(GRAPH_REFRESH_BUDGET);
                if let Err(e) = service.refresh(&owner, deadline).await {
                    tracing::warn!(
                        error = %e,
                        user_id = %owner,
                        "Interest graph refresh failed after interaction"
                    );
                }
            });
        }

        let mut refresh_triggered = false;
        if interaction.event_type == EventType::Skip {
            let skips = self
                .interactions
                .count_recent_skips(user_id, self.config.skip_window_secs, deadline)
                .await?;
            if skips >= self.config.skip_threshold as i64 {
                tracing::info!(
                    user_id = %user_id,
                    skips = skips,
                    window_secs = self.config.skip_window_secs,
                    "Skip burst detected, invalidating recommendations"
                );
                self.invalidate(user_id).await;
                refresh_triggered = true;
            }
        }

        Ok((interaction, refresh_triggered))
    }

    /// Popularity candidates for users without usable taste signal.
    async fn cold_start_candidates(
        &self,
        profile: &UserProfile,
        limit: usize,
        deadline: Deadline,
    ) -> ApiResult<Vec<Track>> {
        let fetch = (limit * POPULAR_OVERFETCH) as i64;
        if profile.preferred_genres.is_empty() {
            self.tracks.popular_global(fetch, deadline).await
        } else {
            self.tracks
                .popular_by_genre(&profile.preferred_genres, &[], fetch, deadline)
                .await
        }
    }

    /// ANN candidates against the (freshly recomputed) profile embedding,
    /// minus recent skips, disliked genres, and interest-graph avoids.
    async fn personalized_candidates(
        &self,
        user_id: &str,
        limit: usize,
        deadline: Deadline,
    ) -> ApiResult<Vec<Track>> {
        if let Err(e) = self.profile_embedding.recompute(user_id, deadline).await {
            tracing::warn!(
                error = %e,
                user_id = %user_id,
                "Profile embedding recompute failed, using stored embedding"
            );
        }

        let exclusions = self
            .interactions
            .recent_skip_track_ids(user_id, SKIP_EXCLUSION_HOURS, SKIP_EXCLUSION_LIMIT, deadline)
            .await?;

        // Reload to pick up the recomputed embedding.
        let profile = self.profiles.find_or_create(user_id, deadline).await?;

        let Some(embedding) = profile.embedding() else {
            let fetch = (limit * POPULAR_OVERFETCH) as i64;
            return self
                .tracks
                .popular_by_genre(&profile.preferred_genres, &exclusions, fetch, deadline)
                .await;
        };

        let fetch = (limit * ANN_OVERFETCH) as i64;
        let mut candidates = self
            .tracks
            .ann_candidates(&embedding, &exclusions, fetch, deadline)
            .await?;

        candidates.retain(|track| !profile.disliked_genres.contains(&track.genre));

        if self.config.interest_graph_enabled {
            match self.interest_graph.get_or_compute(user_id, deadline).await {
                Ok(Some(graph)) => {
                    candidates.retain(|track| {
                        !graph.is_avoided(&track.artist, &track.genre, AVOID_SCORE_THRESHOLD)
                    });
                }
                Ok(None) => {}
                Err(e) => {
                    tracing::warn!(
                        error = %e,
                        user_id = %user_id,
                        "Interest graph unavailable, continuing without bias"
                    );
                }
            }
        }

        Ok(candidates)
    }
}

/// Score a track against the supplied context.
///
/// Tracks without an audio feature bag score 0; a bag missing a field
/// relevant to the context contributes 0 for that field.
pub fn context_score(track: &Track, context: &ListeningContext) -> f64 {
    let Some(features) = &track.audio_features else {
        return 0.0;
    };

    let mut score = 0.0;

    if let Some(activity) = context.activity {
        use crate::models::Activity::*;
        match activity {
            Exercise => {
                if let Some(energy) = features.energy {
                    score += 10.0 * energy;
                }
            }
            Relax => {
                if let Some(energy) = features.energy {
                    score += 8.0 * (1.0 - energy);
                }
            }
            Party => {
                if let Some(danceability) = features.danceability {
                    score += 10.0 * danceability;
                }
            }
            Work => {}
        }
    }

    if let Some(mood) = context.mood {
        use crate::models::Mood::*;
        match mood {
            Calm => {
                if let Some(energy) = features.energy {
                    score += 10.0 * (1.0 - energy);
                }
            }
            Energetic => {
                if let Some(energy) = features.energy {
                    score += 10.0 * energy;
                }
            }
            Happy => {
                if let Some(valence) = features.valence {
                    score += 10.0 * valence;
                }
            }
            Sad => {
                if let Some(valence) = features.valence {
                    score += 10.0 * (1.0 - valence);
                }
            }
        }
    }

    score
}

/// Stable sort by context score, descending. Ties keep candidate order.
pub fn rerank_by_context(tracks: Vec<Track>, context: &ListeningContext) -> Vec<Track> {
    let mut scored: Vec<(f64, Track)> = tracks
        .into_iter()
        .map(|track| (context_score(&track, context), track))
        .collect();
    scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));
    scored.into_iter().map(|(_, track)| track).collect()
}

/// Drop tracks that would extend a same-artist run past `max_run`.
///
/// Dropped tracks are discarded, not reordered later.
pub fn enforce_artist_diversity(tracks: Vec<Track>, max_run: usize) -> Vec<Track> {
    let mut result: Vec<Track> = Vec::with_capacity(tracks.len());
    for track in tracks {
        let run = result
            .iter()
            .rev()
            .take_while(|kept| kept.artist == track.artist)
            .count();
        if run < max_run {
            result.push(track);
        }
    }
    result
}
