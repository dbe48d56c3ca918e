//! User profile repository
//!
//! Profiles are created lazily with single-statement upsert semantics so
//! concurrent first access from two requests yields exactly one row. The
//! profile embedding recompute also lives here: it runs entirely inside the
//! store so 50 candidate vectors never cross the wire.

use sqlx::PgPool;

use crate::deadline::Deadline;
use crate::error::ApiResult;
use crate::models::UserProfile;

/// Columns selected for every UserProfile query. The embedding comes back
/// in pgvector text form.
const PROFILE_COLUMNS: &str = "external_user_id, preferred_genres, disliked_genres, \
     profile_embedding::text AS profile_embedding, last_active_at, created_at, updated_at";

/// Repository for user profile database operations
#[derive(Clone)]
pub struct ProfileRepository {
    pool: PgPool,
}

impl ProfileRepository {
    /// Create a new ProfileRepository instance
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Fetch the profile for `user_id`, creating it on first observation.
    ///
    /// The upsert is a single statement, so two concurrent first-time calls
    /// both land on the same row. Existing profiles get their last-active
    /// timestamp bumped.
    pub async fn find_or_create(&self, user_id: &str, deadline: Deadline) -> ApiResult<UserProfile> {
        let sql = format!(
            r#"
            INSERT INTO user_profiles (external_user_id)
            VALUES ($1)
            ON CONFLICT (external_user_id)
            DO UPDATE SET last_active_at = NOW()
            RETURNING {}
            "#,
            PROFILE_COLUMNS
        );
        deadline
            .enforce(
                "profiles.find_or_create",
                sqlx::query_as::<_, UserProfile>(&sql)
                    .bind(user_id)
                    .fetch_one(&self.pool),
            )
            .await
    }

    /// Replace the user's preferred genres.
    pub async fn update_preferences(
        &self,
        user_id: &str,
        preferred_genres: &[String],
        deadline: Deadline,
    ) -> ApiResult<UserProfile> {
        let sql = format!(
            r#"
            INSERT INTO user_profiles (external_user_id, preferred_genres)
            VALUES ($1, $2)
            ON CONFLICT (external_user_id)
            DO UPDATE SET preferred_genres = EXCLUDED.preferred_genres, updated_at = NOW()
            RETURNING {}
            "#,
            PROFILE_COLUMNS
        );
        deadline
            .enforce(
                "profiles.update_preferences",
                sqlx::query_as::<_, UserProfile>(&sql)
                    .bind(user_id)
                    .bind(preferred_genres)
                    .fetch_one(&self.pool),
            )
            .await
    }

    /// Recompute the user's taste embedding inside the store.
    ///
    /// The embedding is the plain average of weight-scaled track embeddings
    /// over the user's last 50 qualifying interactions within 90 days
    /// (LIKE +2.0, PLAY +1.0, SKIP -0.5); interactions on tracks without an
    /// embedding are excluded. A single statement, so concurrent recomputes
    /// are ordered by the store; a no-op when nothing qualifies.
    pub async fn upsert_profile_embedding(
        &self,
        user_id: &str,
        deadline: Deadline,
    ) -> ApiResult<()> {
        deadline
            .enforce(
                "profiles.upsert_profile_embedding",
                sqlx::query(
                    r#"
                    UPDATE user_profiles p
                    SET profile_embedding = derived.embedding,
                        updated_at = NOW()
                    FROM (
                        SELECT AVG(
                            t.embedding * array_fill(
                                CASE i.event_type::text
                                    WHEN 'LIKE' THEN 2.0
                                    WHEN 'PLAY' THEN 1.0
                                    WHEN 'SKIP' THEN -0.5
                                    ELSE 0.0
                                END::real,
                                ARRAY[256]
                            )::vector
                        ) AS embedding
                        FROM (
                            SELECT track_id, event_type
                            FROM interactions
                            WHERE external_user_id = $1
                              AND event_type = ANY(ARRAY['LIKE','PLAY','SKIP']::event_type[])
                              AND created_at > NOW() - INTERVAL '90 days'
                            ORDER BY created_at DESC
                            LIMIT 50
                        ) i
                        JOIN tracks t ON t.id = i.track_id
                        WHERE t.embedding IS NOT NULL
                    ) derived
                    WHERE p.external_user_id = $1
                      AND derived.embedding IS NOT NULL
                    "#,
                )
                .bind(user_id)
                .execute(&self.pool),
            )
            .await?;
        Ok(())
    }
}
