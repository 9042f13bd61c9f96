//! Daily-ledger API routes

use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::state::AppState;
use axum::{
    extract::{Path, Query, State},
    routing::{get, post},
    Json, Router,
};
use nutrilens_shared::models::DailyLog;
use nutrilens_shared::types::{
    AddWaterRequest, AppendEntryRequest, DailyFeedbackResponse, HistoryQuery, InitTodayRequest,
    MonthlySummaryResponse,
};

/// Create log routes
pub fn log_routes() -> Router<AppState> {
    Router::new()
        .route("/today", get(get_today))
        .route("/today/init", post(init_today))
        .route("/entries", post(append_entry))
        .route("/water", post(add_water))
        .route("/history", get(get_history))
        .route("/month/:year/:month", get(get_monthly_summary))
        .route("/:date", get(get_day))
        .route("/:date/feedback", post(ensure_daily_feedback))
}

/// GET /api/v1/logs/today - Today's log, empty view if nothing logged yet
async fn get_today(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<DailyLog>, ApiError> {
    let log = state.ledger().get_today(&auth.uid).await?;
    Ok(Json(log))
}

/// POST /api/v1/logs/today/init - Create today's log if absent
async fn init_today(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(req): Json<InitTodayRequest>,
) -> Result<Json<DailyLog>, ApiError> {
    let log = state.ledger().init_today(&auth.uid, req).await?;
    Ok(Json(log))
}

/// POST /api/v1/logs/entries - Save a reviewed meal to today's log
async fn append_entry(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(req): Json<AppendEntryRequest>,
) -> Result<Json<DailyLog>, ApiError> {
    let log = state.ledger().append_entry(&auth.uid, req).await?;
    Ok(Json(log))
}

/// POST /api/v1/logs/water - Log water intake on today's log
async fn add_water(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(req): Json<AddWaterRequest>,
) -> Result<Json<DailyLog>, ApiError> {
    let log = state.ledger().add_water(&auth.uid, req).await?;
    Ok(Json(log))
}

/// GET /api/v1/logs/history?start=..&end=.. - Logged days in a date range
async fn get_history(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<Vec<DailyLog>>, ApiError> {
    let logs = state.ledger().history(&auth.uid, query).await?;
    Ok(Json(logs))
}

/// GET /api/v1/logs/month/:year/:month - One month of logs with aggregates
async fn get_monthly_summary(
    State(state): State<AppState>,
    auth: AuthUser,
    Path((year, month)): Path<(i32, u32)>,
) -> Result<Json<MonthlySummaryResponse>, ApiError> {
    let summary = state.ledger().monthly_summary(&auth.uid, year, month).await?;
    Ok(Json(summary))
}

/// GET /api/v1/logs/:date - One day's log
async fn get_day(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(date): Path<String>,
) -> Result<Json<DailyLog>, ApiError> {
    let log = state.ledger().get_day(&auth.uid, &date).await?;
    Ok(Json(log))
}

/// POST /api/v1/logs/:date/feedback - Derive day-level feedback if eligible
async fn ensure_daily_feedback(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(date): Path<String>,
) -> Result<Json<DailyFeedbackResponse>, ApiError> {
    let result = state.ledger().ensure_daily_feedback(&auth.uid, &date).await?;
    Ok(Json(result))
}
