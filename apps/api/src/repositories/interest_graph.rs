//! Interest graph repository
//!
//! One JSONB document per user, replaced wholesale on refresh. The row
//! carries a monotonic version counter incremented inside the store, so
//! concurrent refreshes are last-writer-wins on content but never corrupt
//! the counter.

use sqlx::types::Json;
use sqlx::PgPool;

use crate::deadline::Deadline;
use crate::error::ApiResult;
use crate::models::InterestGraph;

/// Repository for interest graph persistence
#[derive(Clone)]
pub struct InterestGraphRepository {
    pool: PgPool,
}

impl InterestGraphRepository {
    /// Create a new InterestGraphRepository instance
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Load the stored document for `user_id`, if any.
    pub async fn find(
        &self,
        user_id: &str,
        deadline: Deadline,
    ) -> ApiResult<Option<InterestGraph>> {
        let row: Option<Json<InterestGraph>> = deadline
            .enforce(
                "interest_graph.find",
                sqlx::query_scalar(
                    "SELECT graph FROM user_interest_graph WHERE external_user_id = $1",
                )
                .bind(user_id)
                .fetch_optional(&self.pool),
            )
            .await?;
        Ok(row.map(|json| json.0))
    }

    /// Replace the user's document and bump its version, atomically.
    pub async fn upsert(
        &self,
        user_id: &str,
        graph: &InterestGraph,
        deadline: Deadline,
    ) -> ApiResult<()> {
        deadline
            .enforce(
                "interest_graph.upsert",
                sqlx::query(
                    r#"
                    INSERT INTO user_interest_graph (external_user_id, graph, version, updated_at)
                    VALUES ($1, $2, 1, NOW())
                    ON CONFLICT (external_user_id)
                    DO UPDATE SET
                        graph = EXCLUDED.graph,
                        version = user_interest_graph.version + 1,
                        updated_at = NOW()
                    "#,
                )
                .bind(user_id)
                .bind(Json(graph))
                .execute(&self.pool),
            )
            .await?;
        Ok(())
    }
}
