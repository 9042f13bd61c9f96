//! Profile and onboarding API routes

use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::state::AppState;
use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use nutrilens_shared::models::UserProfileData;
use nutrilens_shared::types::{CreateProfileRequest, OnboardingRequest};

/// Create profile routes
pub fn profile_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(get_profile).post(create_profile))
        .route("/onboarding", post(complete_onboarding))
}

/// GET /api/v1/profile - The authenticated user's profile
async fn get_profile(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<UserProfileData>, ApiError> {
    let profile = state.onboarding().get_profile(&auth.uid).await?;
    Ok(Json(profile))
}

/// POST /api/v1/profile - Create the identity portion of a profile
async fn create_profile(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(req): Json<CreateProfileRequest>,
) -> Result<Json<UserProfileData>, ApiError> {
    let profile = state.onboarding().create_profile(&auth.uid, req).await?;
    Ok(Json(profile))
}

/// POST /api/v1/profile/onboarding - Calculate and store the calorie plan
async fn complete_onboarding(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(req): Json<OnboardingRequest>,
) -> Result<Json<UserProfileData>, ApiError> {
    let profile = state
        .onboarding()
        .complete_onboarding(&auth.uid, req)
        .await?;
    Ok(Json(profile))
}
