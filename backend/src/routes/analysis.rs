//! Meal analysis API routes
//!
//! Analysis is stateless: nothing is persisted until the user reviews the
//! result and saves it through the logs routes.

use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::state::AppState;
use axum::{extract::State, routing::post, Json, Router};
use metrics::counter;
use nutrilens_shared::types::{AnalysisResult, AnalyzeImageRequest, AnalyzeTextRequest};
use nutrilens_shared::validation::validate_dish_name;
use validator::Validate;

/// Create analysis routes
pub fn analysis_routes() -> Router<AppState> {
    Router::new()
        .route("/image", post(analyze_image))
        .route("/text", post(analyze_text))
}

/// POST /api/v1/analyze/image - Identify dishes and macros in a meal photo
async fn analyze_image(
    State(state): State<AppState>,
    _auth: AuthUser,
    Json(req): Json<AnalyzeImageRequest>,
) -> Result<Json<AnalysisResult>, ApiError> {
    req.validate()?;
    let result = state
        .gateway
        .analyze_image(&req.image_base64, &req.mime_type)
        .await?;
    counter!("nutrilens_analyses_total", "kind" => "image").increment(1);
    Ok(Json(result))
}

/// POST /api/v1/analyze/text - Estimate macros for a retyped dish name
async fn analyze_text(
    State(state): State<AppState>,
    _auth: AuthUser,
    Json(req): Json<AnalyzeTextRequest>,
) -> Result<Json<AnalysisResult>, ApiError> {
    req.validate()?;
    validate_dish_name(&req.name)?;
    let result = state.gateway.analyze_text(&req.name).await?;
    counter!("nutrilens_analyses_total", "kind" => "text").increment(1);
    Ok(Json(result))
}
