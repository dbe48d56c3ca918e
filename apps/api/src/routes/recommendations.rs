//! Recommendation HTTP route handler
//!
//! `GET /recommendations?mood=&activity=&timeBucket=&limit=` runs the
//! pipeline for the caller. Context values are validated here so unknown
//! enum values become a 400 rather than silently biasing the result.

use std::time::Duration;

use axum::{extract::Query, extract::State, routing::get, Json, Router};
use serde::Deserialize;

use crate::deadline::Deadline;
use crate::error::ApiResult;
use crate::middleware::Identity;
use crate::models::{Activity, ListeningContext, Mood, TimeBucket};
use crate::services::{RecommendationPipeline, RecommendationRequest, RecommendationResponse};

/// Shared state for recommendation handlers
#[derive(Clone)]
pub struct RecommendationState {
    pub pipeline: RecommendationPipeline,
    pub request_timeout: Duration,
}

impl RecommendationState {
    pub fn new(pipeline: RecommendationPipeline, request_timeout: Duration) -> Self {
        Self {
            pipeline,
            request_timeout,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecommendationQuery {
    pub mood: Option<String>,
    pub activity: Option<String>,
    pub time_bucket: Option<String>,
    pub limit: Option<usize>,
}

impl RecommendationQuery {
    /// Decode into a pipeline request, rejecting unknown enum values.
    /// Out-of-range limits are not an error; the pipeline clamps them.
    fn into_request(self) -> ApiResult<RecommendationRequest> {
        let context = ListeningContext {
            mood: self.mood.as_deref().map(Mood::parse).transpose()?,
            activity: self.activity.as_deref().map(Activity::parse).transpose()?,
            time_bucket: self
                .time_bucket
                .as_deref()
                .map(TimeBucket::parse)
                .transpose()?,
        };

        Ok(RecommendationRequest {
            context: if context.is_empty() {
                None
            } else {
                Some(context)
            },
            limit: self.limit,
        })
    }
}

/// Create recommendations router
pub fn recommendations_router(state: RecommendationState) -> Router {
    Router::new()
        .route("/recommendations", get(get_recommendations))
        .with_state(state)
}

/// Run the pipeline for the caller
async fn get_recommendations(
    State(state): State<RecommendationState>,
    Identity(user_id): Identity,
    Query(query): Query<RecommendationQuery>,
) -> ApiResult<Json<RecommendationResponse>> {
    let request = query.into_request()?;
    let deadline = Deadline::after(state.request_timeout);
    let response = state
        .pipeline
        .get_recommendations(&user_id, request, deadline)
        .await?;
    Ok(Json(response))
}
