//! Calorie-budget calculation from biometric inputs
//!
//! BMR uses the Mifflin-St Jeor equation:
//!
//! Men:   BMR = 10 × weight(kg) + 6.25 × height(cm) - 5 × age(y) + 5
//! Women: BMR = 10 × weight(kg) + 6.25 × height(cm) - 5 × age(y) - 161
//!
//! TDEE = BMR × activity multiplier. The daily budget applies the goal:
//! maintain keeps TDEE, losing subtracts a daily deficit derived from the
//! chosen pace (7700 kcal per kg of body fat, spread over a week), gaining
//! adds a fixed 300 kcal surplus. All three outputs are rounded once, at
//! the end.

use crate::errors::DomainError;
use crate::models::{Goal, Sex};
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

/// Energy cost of one kilogram of body fat, in kcal
const KCAL_PER_KG: f64 = 7700.0;

/// Fixed daily surplus applied when the goal is to gain weight
const GAIN_SURPLUS_KCAL: f64 = 300.0;

/// Activity level for TDEE calculation.
///
/// The last tier is representable but not surfaced in the onboarding UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ActivityLevel {
    /// Little or no exercise
    #[default]
    Sedentary,
    /// Light exercise 1-3 days/week
    LightlyActive,
    /// Moderate exercise 3-5 days/week
    ModeratelyActive,
    /// Hard exercise 6-7 days/week
    VeryActive,
    /// Very hard exercise or physical job
    ExtraActive,
}

impl ActivityLevel {
    /// TDEE multiplier for this level
    pub fn multiplier(&self) -> f64 {
        match self {
            ActivityLevel::Sedentary => 1.2,
            ActivityLevel::LightlyActive => 1.375,
            ActivityLevel::ModeratelyActive => 1.55,
            ActivityLevel::VeryActive => 1.725,
            ActivityLevel::ExtraActive => 1.9,
        }
    }

    /// Map a stored multiplier back to a level
    pub fn from_multiplier(value: f64) -> Option<ActivityLevel> {
        [
            ActivityLevel::Sedentary,
            ActivityLevel::LightlyActive,
            ActivityLevel::ModeratelyActive,
            ActivityLevel::VeryActive,
            ActivityLevel::ExtraActive,
        ]
        .into_iter()
        .find(|level| (level.multiplier() - value).abs() < 1e-9)
    }
}

/// Resolved inputs for the budget calculation.
///
/// Age must already be resolved via [`resolve_age`]; the calculator never
/// guesses a default.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BudgetInputs {
    pub sex: Sex,
    pub height_cm: f64,
    pub weight_kg: f64,
    pub age_years: i32,
    pub activity_level: ActivityLevel,
    pub goal: Goal,
    /// kg/week; only consulted when goal is `Lose`
    pub goal_pace_kg_per_week: f64,
}

/// Calculated plan, rounded to whole kcal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalorieBudget {
    pub bmr: i64,
    pub tdee: i64,
    pub daily_budget: i64,
}

/// Resolve the user's age in whole years.
///
/// A stored date of birth takes priority over a manually entered age; if
/// neither is available this is a validation failure; there is no silent
/// default.
pub fn resolve_age(
    date_of_birth: Option<&str>,
    manual_age: Option<i32>,
    today: NaiveDate,
) -> Result<i32, DomainError> {
    if let Some(dob) = date_of_birth.filter(|s| !s.is_empty()) {
        let birth = NaiveDate::parse_from_str(dob, "%Y-%m-%d")
            .map_err(|_| DomainError::validation(format!("Invalid date of birth: {dob}")))?;
        let mut age = today.year() - birth.year();
        // Not yet had this year's birthday
        if (today.month(), today.day()) < (birth.month(), birth.day()) {
            age -= 1;
        }
        if age < 0 {
            return Err(DomainError::validation("Date of birth is in the future"));
        }
        return Ok(age);
    }
    manual_age.ok_or(DomainError::MissingField("age"))
}

/// Calculate BMR, TDEE and the daily calorie budget.
///
/// Fails on non-positive height/weight or a non-positive pace for a losing
/// goal. Rounding happens only after the budget is derived, never at
/// intermediate steps.
pub fn calculate(inputs: &BudgetInputs) -> Result<CalorieBudget, DomainError> {
    if inputs.height_cm <= 0.0 {
        return Err(DomainError::validation("Height must be positive"));
    }
    if inputs.weight_kg <= 0.0 {
        return Err(DomainError::validation("Weight must be positive"));
    }
    if inputs.age_years <= 0 {
        return Err(DomainError::validation("Age must be positive"));
    }
    if inputs.goal == Goal::Lose && inputs.goal_pace_kg_per_week <= 0.0 {
        return Err(DomainError::validation(
            "Goal pace must be positive when losing weight",
        ));
    }

    let base = 10.0 * inputs.weight_kg + 6.25 * inputs.height_cm - 5.0 * f64::from(inputs.age_years);
    let bmr = match inputs.sex {
        Sex::Male => base + 5.0,
        Sex::Female => base - 161.0,
    };

    let tdee = bmr * inputs.activity_level.multiplier();

    let daily_budget = match inputs.goal {
        Goal::Maintain => tdee,
        Goal::Lose => tdee - inputs.goal_pace_kg_per_week * KCAL_PER_KG / 7.0,
        Goal::Gain => tdee + GAIN_SURPLUS_KCAL,
    };

    Ok(CalorieBudget {
        bmr: bmr.round() as i64,
        tdee: tdee.round() as i64,
        daily_budget: daily_budget.round() as i64,
    })
}
