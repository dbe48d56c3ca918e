//! Interaction repository
//!
//! Append-only event log plus the windowed queries the skip-burst detector
//! and the interest graph engine run against it.

use sqlx::types::Json;
use sqlx::PgPool;
use uuid::Uuid;

use crate::deadline::Deadline;
use crate::error::{ApiError, ApiResult};
use crate::models::{
    EventType, Interaction, InteractionStats, InteractionWithTrackMeta, ListeningContext,
};

/// Postgres error code for foreign-key violations
const FOREIGN_KEY_VIOLATION: &str = "23503";

const INTERACTION_COLUMNS: &str =
    "id, external_user_id, track_id, event_type, event_value, context, created_at";

/// Repository for interaction database operations
#[derive(Clone)]
pub struct InteractionRepository {
    pool: PgPool,
}

impl InteractionRepository {
    /// Create a new InteractionRepository instance
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Append an interaction event.
    ///
    /// A foreign-key violation (unknown track) maps to `NotFound`; other
    /// store failures surface as-is. The caller decides whether to retry.
    pub async fn append(
        &self,
        user_id: &str,
        track_id: Uuid,
        event_type: EventType,
        event_value: Option<i32>,
        context: Option<ListeningContext>,
        deadline: Deadline,
    ) -> ApiResult<Interaction> {
        let sql = format!(
            r#"
            INSERT INTO interactions (external_user_id, track_id, event_type, event_value, context)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {}
            "#,
            INTERACTION_COLUMNS
        );
        let result = deadline
            .enforce(
                "interactions.append",
                sqlx::query_as::<_, Interaction>(&sql)
                    .bind(user_id)
                    .bind(track_id)
                    .bind(event_type)
                    .bind(event_value)
                    .bind(context.map(Json))
                    .fetch_one(&self.pool),
            )
            .await;

        match result {
            Err(ApiError::Database(sqlx::Error::Database(db_err)))
                if db_err.code().as_deref() == Some(FOREIGN_KEY_VIOLATION) =>
            {
                Err(ApiError::not_found("track", track_id.to_string()))
            }
            other => other,
        }
    }

    /// Count SKIP events for the user within the trailing window.
    pub async fn count_recent_skips(
        &self,
        user_id: &str,
        window_secs: u64,
        deadline: Deadline,
    ) -> ApiResult<i64> {
        deadline
            .enforce(
                "interactions.count_recent_skips",
                sqlx::query_scalar(
                    r#"
                    SELECT COUNT(*)
                    FROM interactions
                    WHERE external_user_id = $1
                      AND event_type = 'SKIP'
                      AND created_at > NOW() - make_interval(secs => $2)
                    "#,
                )
                .bind(user_id)
                .bind(window_secs as f64)
                .fetch_one(&self.pool),
            )
            .await
    }

    /// Distinct track IDs the user skipped within the window, most recently
    /// skipped first, bounded by `limit`.
    pub async fn recent_skip_track_ids(
        &self,
        user_id: &str,
        hours_back: i32,
        limit: i64,
        deadline: Deadline,
    ) -> ApiResult<Vec<Uuid>> {
        deadline
            .enforce(
                "interactions.recent_skip_track_ids",
                sqlx::query_scalar(
                    r#"
                    SELECT track_id
                    FROM (
                        SELECT track_id, MAX(created_at) AS last_skipped_at
                        FROM interactions
                        WHERE external_user_id = $1
                          AND event_type = 'SKIP'
                          AND created_at > NOW() - make_interval(hours => $2)
                        GROUP BY track_id
                    ) skipped
                    ORDER BY last_skipped_at DESC
                    LIMIT $3
                    "#,
                )
                .bind(user_id)
                .bind(hours_back)
                .bind(limit)
                .fetch_all(&self.pool),
            )
            .await
    }

    /// All-time interaction counts for the user.
    pub async fn stats(&self, user_id: &str, deadline: Deadline) -> ApiResult<InteractionStats> {
        deadline
            .enforce(
                "interactions.stats",
                sqlx::query_as::<_, InteractionStats>(
                    r#"
                    SELECT
                        COUNT(*) AS total,
                        COUNT(*) FILTER (WHERE event_type = 'LIKE') AS like_count,
                        COUNT(*) FILTER (WHERE event_type = 'SKIP') AS skip_count,
                        COUNT(*) FILTER (WHERE event_type = 'PLAY') AS play_count
                    FROM interactions
                    WHERE external_user_id = $1
                    "#,
                )
                .bind(user_id)
                .fetch_one(&self.pool),
            )
            .await
    }

    /// Recent interactions joined to track metadata, newest first.
    pub async fn recent_with_track_meta(
        &self,
        user_id: &str,
        limit: i64,
        window_days: i32,
        kinds: &[EventType],
        deadline: Deadline,
    ) -> ApiResult<Vec<InteractionWithTrackMeta>> {
        deadline
            .enforce(
                "interactions.recent_with_track_meta",
                sqlx::query_as::<_, InteractionWithTrackMeta>(
                    r#"
                    SELECT i.event_type, i.created_at, t.artist, t.genre
                    FROM interactions i
                    JOIN tracks t ON t.id = i.track_id
                    WHERE i.external_user_id = $1
                      AND i.created_at > NOW() - make_interval(days => $2)
                      AND i.event_type = ANY($3)
                    ORDER BY i.created_at DESC
                    LIMIT $4
                    "#,
                )
                .bind(user_id)
                .bind(window_days)
                .bind(kinds)
                .bind(limit)
                .fetch_all(&self.pool),
            )
            .await
    }

    /// Track IDs of the user's most recent matching interactions, in
    /// chronological order (oldest first).
    // Reserved for sequence-aware rerankers.
    #[allow(dead_code)]
    pub async fn recent_track_ids(
        &self,
        user_id: &str,
        limit: i64,
        kinds: &[EventType],
        deadline: Deadline,
    ) -> ApiResult<Vec<Uuid>> {
        deadline
            .enforce(
                "interactions.recent_track_ids",
                sqlx::query_scalar(
                    r#"
                    SELECT track_id
                    FROM (
                        SELECT track_id, created_at
                        FROM interactions
                        WHERE external_user_id = $1
                          AND event_type = ANY($2)
                        ORDER BY created_at DESC
                        LIMIT $3
                    ) recent
                    ORDER BY created_at ASC
                    "#,
                )
                .bind(user_id)
                .bind(kinds)
                .bind(limit)
                .fetch_all(&self.pool),
            )
            .await
    }
}
