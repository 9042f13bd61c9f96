//! API request and response types

use crate::models::{DailyLog, FoodItem, Goal, NutritionInfo, Sex, TrackedMetric};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// API error response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
}

/// Error detail
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
}

/// Create today's log if it does not exist yet
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct InitTodayRequest {
    /// Weight snapshot for the new day, kg
    #[validate(range(min = 0.0))]
    #[serde(default)]
    pub current_weight: f64,
}

/// Save a reviewed meal as one log entry
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct AppendEntryRequest {
    #[validate(length(min = 1, message = "At least one dish is required"))]
    pub items: Vec<FoodItem>,
}

/// Log water intake
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct AddWaterRequest {
    #[validate(range(min = 1, message = "Water amount must be greater than 0 ml"))]
    pub amount_ml: i64,
}

/// Inclusive date-key range for history queries
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryQuery {
    pub start: String,
    pub end: String,
}

/// One month of logs plus the simple aggregates the dashboard shows
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlySummaryResponse {
    pub year: i32,
    pub month: u32,
    pub days_logged: usize,
    pub total_calories: i64,
    pub avg_calories_per_logged_day: f64,
    pub total_water_ml: i64,
    pub logs: Vec<DailyLog>,
}

/// Create the identity portion of a profile at account creation
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateProfileRequest {
    #[validate(email)]
    pub email: Option<String>,
    #[validate(length(min = 1, message = "Display name is required"))]
    pub display_name: String,
    /// `YYYY-MM-DD`, optional; a manual age can be supplied at onboarding
    pub date_of_birth: Option<String>,
}

/// Biometric inputs collected by the onboarding flow
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct OnboardingRequest {
    pub sex: Sex,
    /// cm
    #[validate(range(min = 1.0, message = "Height must be positive"))]
    pub height: f64,
    /// kg
    #[validate(range(min = 1.0, message = "Weight must be positive"))]
    pub current_weight: f64,
    /// Manual age entry, used only when the profile has no date of birth
    pub age: Option<i32>,
    /// TDEE activity multiplier (one of the five fixed tiers)
    pub activity_level: f64,
    pub goal: Goal,
    pub target_weight: Option<f64>,
    /// kg/week, required when goal is `lose`
    pub goal_pace: Option<f64>,
    pub additional_metrics: Option<Vec<TrackedMetric>>,
}

/// Image analysis input: base64 payload plus its mime type
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeImageRequest {
    #[validate(length(min = 1, message = "Image payload is required"))]
    pub image_base64: String,
    #[validate(length(min = 1, message = "Mime type is required"))]
    pub mime_type: String,
}

/// Text analysis input, used when a user retypes a dish name
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeTextRequest {
    #[validate(length(min = 1, message = "Dish name is required"))]
    pub name: String,
}

/// Analysis output: the dishes plus their componentwise total
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub items: Vec<FoodItem>,
    pub total: NutritionInfo,
}

/// Result of a daily-feedback derivation attempt
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyFeedbackResponse {
    /// Whether this call wrote new feedback (false when gated or skipped)
    pub applied: bool,
    pub daily_feedback: Option<String>,
}
