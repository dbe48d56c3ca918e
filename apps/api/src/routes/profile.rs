//! User profile HTTP route handlers
//!
//! - `GET /me` - fetch-or-create the caller's profile
//! - `PUT /me/preferences` - replace preferred genres

use std::time::Duration;

use axum::{
    extract::State,
    routing::{get, put},
    Json, Router,
};
use serde::Deserialize;

use crate::deadline::Deadline;
use crate::error::{ApiError, ApiResult};
use crate::middleware::Identity;
use crate::models::UserProfile;
use crate::repositories::ProfileRepository;

/// Bounds for PUT /me/preferences
const MIN_PREFERRED_GENRES: usize = 1;
const MAX_PREFERRED_GENRES: usize = 10;

/// Shared state for profile handlers
#[derive(Clone)]
pub struct ProfileState {
    pub profiles: ProfileRepository,
    pub request_timeout: Duration,
}

impl ProfileState {
    pub fn new(profiles: ProfileRepository, request_timeout: Duration) -> Self {
        Self {
            profiles,
            request_timeout,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePreferencesRequest {
    pub preferred_genres: Vec<String>,
}

/// Create profile router
pub fn profile_router(state: ProfileState) -> Router {
    Router::new()
        .route("/me", get(get_me))
        .route("/me/preferences", put(put_preferences))
        .with_state(state)
}

/// Fetch the caller's profile, creating it on first access
async fn get_me(
    State(state): State<ProfileState>,
    Identity(user_id): Identity,
) -> ApiResult<Json<UserProfile>> {
    let deadline = Deadline::after(state.request_timeout);
    let profile = state.profiles.find_or_create(&user_id, deadline).await?;
    Ok(Json(profile))
}

/// Replace the caller's preferred genres
async fn put_preferences(
    State(state): State<ProfileState>,
    Identity(user_id): Identity,
    Json(payload): Json<UpdatePreferencesRequest>,
) -> ApiResult<Json<UserProfile>> {
    validate_preferred_genres(&payload.preferred_genres)?;

    let deadline = Deadline::after(state.request_timeout);
    let profile = state
        .profiles
        .update_preferences(&user_id, &payload.preferred_genres, deadline)
        .await?;
    Ok(Json(profile))
}

fn validate_preferred_genres(genres: &[String]) -> ApiResult<()> {
    if genres.len() < MIN_PREFERRED_GENRES || genres.len() > MAX_PREFERRED_GENRES {
        return Err(ApiError::validation(format!(
            "preferredGenres must contain between {} and {} entries",
            MIN_PREFERRED_GENRES, MAX_PREFERRED_GENRES
        )));
    }
    if genres.iter().any(|genre| genre.trim().is_empty()) {
        return Err(ApiError::validation("genres cannot be blank"));
    }
    Ok(())
}
