//! Profile and onboarding service
//!
//! Account creation writes the identity fields once; onboarding resolves
//! the user's age, runs the calorie-budget calculation and stores the
//! inputs and results together in a single patch.

use crate::error::{ApiError, ApiResult};
use crate::repositories::ProfileRepository;
use chrono::{Local, Utc};
use metrics::counter;
use nutrilens_shared::budget::{self, ActivityLevel, BudgetInputs};
use nutrilens_shared::models::{Goal, UserProfileData};
use nutrilens_shared::types::{CreateProfileRequest, OnboardingRequest};
use serde_json::{Map, Value};
use tracing::info;
use validator::Validate;

#[derive(Clone)]
pub struct OnboardingService {
    profiles: ProfileRepository,
}

impl OnboardingService {
    pub fn new(profiles: ProfileRepository) -> Self {
        Self { profiles }
    }

    /// Create the identity portion of a profile. Re-creating an existing
    /// profile returns the stored one unchanged.
    pub async fn create_profile(
        &self,
        uid: &str,
        request: CreateProfileRequest,
    ) -> ApiResult<UserProfileData> {
        request.validate()?;
        if let Some(dob) = request.date_of_birth.as_deref().filter(|s| !s.is_empty()) {
            nutrilens_shared::validation::parse_date_key(dob)?;
        }

        let profile = UserProfileData {
            uid: uid.to_string(),
            email: request.email,
            display_name: request.display_name,
            date_of_birth: request.date_of_birth,
            created_at: Utc::now(),
            sex: None,
            height: None,
            current_weight: None,
            activity_level: None,
            goal: None,
            target_weight: None,
            goal_pace: None,
            bmr: None,
            tdee: None,
            daily_budget: None,
            additional_metrics: None,
        };

        let stored = self.profiles.create_if_absent(&profile).await?;
        info!("Created profile");
        Ok(stored)
    }

    pub async fn get_profile(&self, uid: &str) -> ApiResult<UserProfileData> {
        self.profiles
            .get(uid)
            .await?
            .ok_or_else(|| ApiError::NotFound("Profile not found".to_string()))
    }

    /// Run onboarding: resolve age, calculate the plan and persist inputs
    /// and results in one write so they never diverge.
    pub async fn complete_onboarding(
        &self,
        uid: &str,
        request: OnboardingRequest,
    ) -> ApiResult<UserProfileData> {
        request.validate()?;

        let profile = self.get_profile(uid).await?;

        let age = budget::resolve_age(
            profile.date_of_birth.as_deref(),
            request.age,
            Local::now().date_naive(),
        )?;

        let activity_level = ActivityLevel::from_multiplier(request.activity_level)
            .ok_or_else(|| {
                ApiError::Validation(format!(
                    "Unknown activity level: {}",
                    request.activity_level
                ))
            })?;

        let plan = budget::calculate(&BudgetInputs {
            sex: request.sex,
            height_cm: request.height,
            weight_kg: request.current_weight,
            age_years: age,
            activity_level,
            goal: request.goal,
            goal_pace_kg_per_week: request.goal_pace.unwrap_or(0.0),
        })?;

        // Without an explicit target the current weight stands in for it
        let target_weight = request.target_weight.unwrap_or(request.current_weight);

        let mut fields = Map::new();
        fields.insert("sex".to_string(), to_value(&request.sex)?);
        fields.insert("height".to_string(), Value::from(request.height));
        fields.insert(
            "currentWeight".to_string(),
            Value::from(request.current_weight),
        );
        fields.insert(
            "activityLevel".to_string(),
            Value::from(activity_level.multiplier()),
        );
        fields.insert("goal".to_string(), to_value(&request.goal)?);
        fields.insert("targetWeight".to_string(), Value::from(target_weight));
        if request.goal == Goal::Lose {
            if let Some(pace) = request.goal_pace {
                fields.insert("goalPace".to_string(), Value::from(pace));
            }
        }
        if let Some(metrics) = &request.additional_metrics {
            fields.insert("additionalMetrics".to_string(), to_value(metrics)?);
        }
        fields.insert("bmr".to_string(), Value::from(plan.bmr));
        fields.insert("tdee".to_string(), Value::from(plan.tdee));
        fields.insert("dailyBudget".to_string(), Value::from(plan.daily_budget));

        let updated = self.profiles.apply_plan(uid, fields).await?;

        counter!("nutrilens_onboardings_total").increment(1);
        info!(
            bmr = plan.bmr,
            tdee = plan.tdee,
            daily_budget = plan.daily_budget,
            "Completed onboarding"
        );
        Ok(updated)
    }
}

fn to_value<T: serde::Serialize>(value: &T) -> Result<Value, ApiError> {
    serde_json::to_value(value).map_err(|e| ApiError::Internal(e.into()))
}
