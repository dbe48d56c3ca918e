//! Interaction HTTP route handler
//!
//! `POST /interactions` appends an event. When the event completes a skip
//! burst, the push refresh runs detached: the response reports
//! `refreshTriggered` without waiting for the fan-out.

use std::time::Duration;

use axum::{extract::State, routing::post, Json, Router};
use serde::Serialize;

use crate::deadline::Deadline;
use crate::error::ApiResult;
use crate::middleware::Identity;
use crate::models::{Interaction, InteractionEvent};
use crate::services::RecommendationPipeline;
use crate::websocket::{PushEngine, RefreshReason};

/// Shared state for interaction handlers
#[derive(Clone)]
pub struct InteractionState {
    pub pipeline: RecommendationPipeline,
    pub push: PushEngine,
    pub request_timeout: Duration,
}

impl InteractionState {
    pub fn new(
        pipeline: RecommendationPipeline,
        push: PushEngine,
        request_timeout: Duration,
    ) -> Self {
        Self {
            pipeline,
            push,
            request_timeout,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InteractionResponse {
    pub success: bool,
    pub interaction: Interaction,
    pub refresh_triggered: bool,
}

/// Create interactions router
pub fn interactions_router(state: InteractionState) -> Router {
    Router::new()
        .route("/interactions", post(post_interaction))
        .with_state(state)
}

/// Record an interaction event for the caller
async fn post_interaction(
    State(state): State<InteractionState>,
    Identity(user_id): Identity,
    Json(event): Json<InteractionEvent>,
) -> ApiResult<Json<InteractionResponse>> {
    let deadline = Deadline::after(state.request_timeout);
    let (interaction, refresh_triggered) = state
        .pipeline
        .record_interaction(&user_id, event, deadline)
        .await?;

    if refresh_triggered {
        state.push.spawn_refresh(&user_id, RefreshReason::SkipDetected);
    }

    Ok(Json(InteractionResponse {
        success: true,
        interaction,
        refresh_triggered,
    }))
}
