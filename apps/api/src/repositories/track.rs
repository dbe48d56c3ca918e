//! Track repository for candidate generation queries
//!
//! Candidate fetches come in two shapes: approximate-nearest-neighbour over
//! the pgvector embedding column (personalized path) and popularity order
//! from the materialized popular_tracks aggregate (cold-start path).

use sqlx::PgPool;
use uuid::Uuid;

use super::utils::{prefixed_track_columns, TRACK_COLUMNS};
use crate::deadline::Deadline;
use crate::error::ApiResult;
use crate::models::{format_pgvector, Track};

/// Repository for track database operations
#[derive(Clone)]
pub struct TrackRepository {
    pool: PgPool,
}

impl TrackRepository {
    /// Create a new TrackRepository instance
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Candidates ordered by ascending cosine distance to `embedding`.
    ///
    /// Only tracks with a non-null embedding are eligible; `exclude_ids`
    /// are filtered out. The bare `embedding <=> $1` ordering keeps the
    /// query eligible for the HNSW index.
    pub async fn ann_candidates(
        &self,
        embedding: &[f32],
        exclude_ids: &[Uuid],
        limit: i64,
        deadline: Deadline,
    ) -> ApiResult<Vec<Track>> {
        let sql = format!(
            r#"
            SELECT {}
            FROM tracks
            WHERE embedding IS NOT NULL
              AND id <> ALL($2)
            ORDER BY embedding <=> $1::vector
            LIMIT $3
            "#,
            TRACK_COLUMNS
        );
        deadline
            .enforce(
                "tracks.ann_candidates",
                sqlx::query_as::<_, Track>(&sql)
                    .bind(format_pgvector(embedding))
                    .bind(exclude_ids)
                    .bind(limit)
                    .fetch_all(&self.pool),
            )
            .await
    }

    /// Most popular tracks within the given genres, popularity descending.
    ///
    /// Popularity is the materialized count of PLAY and LIKE events across
    /// all users, refreshed out-of-band.
    pub async fn popular_by_genre(
        &self,
        genres: &[String],
        exclude_ids: &[Uuid],
        limit: i64,
        deadline: Deadline,
    ) -> ApiResult<Vec<Track>> {
        let sql = format!(
            r#"
            SELECT {}
            FROM tracks t
            JOIN popular_tracks p ON p.track_id = t.id
            WHERE t.genre = ANY($1)
              AND t.id <> ALL($2)
            ORDER BY p.popularity_score DESC
            LIMIT $3
            "#,
            prefixed_track_columns("t")
        );
        deadline
            .enforce(
                "tracks.popular_by_genre",
                sqlx::query_as::<_, Track>(&sql)
                    .bind(genres)
                    .bind(exclude_ids)
                    .bind(limit)
                    .fetch_all(&self.pool),
            )
            .await
    }

    /// Most popular tracks regardless of genre, popularity descending.
    pub async fn popular_global(&self, limit: i64, deadline: Deadline) -> ApiResult<Vec<Track>> {
        let sql = format!(
            r#"
            SELECT {}
            FROM tracks t
            JOIN popular_tracks p ON p.track_id = t.id
            ORDER BY p.popularity_score DESC
            LIMIT $1
            "#,
            prefixed_track_columns("t")
        );
        deadline
            .enforce(
                "tracks.popular_global",
                sqlx::query_as::<_, Track>(&sql)
                    .bind(limit)
                    .fetch_all(&self.pool),
            )
            .await
    }
}
