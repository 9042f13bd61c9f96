//! Persisted document shapes
//!
//! These structs serialize to the exact camelCase layout stored in the
//! document database. `DailyLog` and `UserProfileData` are top-level
//! documents; `LogEntry` and `FoodItem` are embedded in the day that owns
//! them and are never shared between parents.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::ops::Add;

/// Macronutrient quantities for a single dish or an aggregate.
///
/// All fields are non-negative. Addition is componentwise with an all-zero
/// identity, which makes summation order-independent, a property the
/// concurrent-append path relies on.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct NutritionInfo {
    pub calories: f64,
    pub protein: f64,
    pub carbs: f64,
    pub fat: f64,
}

impl NutritionInfo {
    pub const ZERO: NutritionInfo = NutritionInfo {
        calories: 0.0,
        protein: 0.0,
        carbs: 0.0,
        fat: 0.0,
    };

    /// True when every component is >= 0
    pub fn is_valid(&self) -> bool {
        self.calories >= 0.0 && self.protein >= 0.0 && self.carbs >= 0.0 && self.fat >= 0.0
    }
}

impl Add for NutritionInfo {
    type Output = NutritionInfo;

    fn add(self, rhs: NutritionInfo) -> NutritionInfo {
        NutritionInfo {
            calories: self.calories + rhs.calories,
            protein: self.protein + rhs.protein,
            carbs: self.carbs + rhs.carbs,
            fat: self.fat + rhs.fat,
        }
    }
}

impl std::iter::Sum for NutritionInfo {
    fn sum<I: Iterator<Item = NutritionInfo>>(iter: I) -> NutritionInfo {
        iter.fold(NutritionInfo::ZERO, Add::add)
    }
}

/// One analyzed dish.
///
/// Produced whole by the analysis gateway and replaced whole when the user
/// edits a dish name; the model determines all derived fields together, so
/// there is no field-by-field patching.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FoodItem {
    pub name: String,
    pub portion_size: String,
    pub description: String,
    pub calories: f64,
    pub protein: f64,
    pub carbs: f64,
    pub fat: f64,
}

impl FoodItem {
    /// The macro portion of this item
    pub fn nutrition(&self) -> NutritionInfo {
        NutritionInfo {
            calories: self.calories,
            protein: self.protein,
            carbs: self.carbs,
            fat: self.fat,
        }
    }
}

/// One saved meal-logging event.
///
/// Created once at save time and never mutated; identity is `id`.
/// `total_calories` is the sum of the items' calories, stored redundantly so
/// aggregation never re-walks item lists.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogEntry {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    pub title: String,
    pub items: Vec<FoodItem>,
    pub total_calories: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entry_feedback: Option<String>,
}

/// The per-day ledger document, keyed by `(uid, date)`.
///
/// `entries` is append-only in insertion order; `total_calories` and
/// `water_intake` are running sums maintained by atomic increments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyLog {
    /// Calendar date key, `YYYY-MM-DD` in the writer's local time
    pub date: String,
    pub total_calories: i64,
    /// Running water intake in ml
    pub water_intake: i64,
    /// Weight snapshot taken when the day was first created
    pub current_weight: f64,
    pub entries: Vec<LogEntry>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub daily_feedback: Option<String>,
}

impl DailyLog {
    /// An empty day, created lazily on the first write
    pub fn empty(date: impl Into<String>, current_weight: f64) -> Self {
        DailyLog {
            date: date.into(),
            total_calories: 0,
            water_intake: 0,
            current_weight,
            entries: Vec::new(),
            daily_feedback: None,
        }
    }
}

/// Biological sex, used for physiological calculations only
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sex {
    Male,
    Female,
}

/// Weight goal selected during onboarding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Goal {
    Lose,
    Maintain,
    Gain,
}

/// Extra metrics the user chose to track on the dashboard
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrackedMetric {
    Fat,
    Protein,
    Water,
    Carbs,
}

/// The per-user profile document, keyed by uid.
///
/// Identity fields are set once at account creation. The plan fields are
/// optional and written together by onboarding; a profile counts as
/// onboarded iff `daily_budget` is present.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfileData {
    pub uid: String,
    pub email: Option<String>,
    pub display_name: String,
    /// `YYYY-MM-DD`; may be empty when the account was created without one
    #[serde(default)]
    pub date_of_birth: Option<String>,
    pub created_at: DateTime<Utc>,

    // Onboarding inputs
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sex: Option<Sex>,
    /// Height in cm
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<f64>,
    /// Current weight in kg
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_weight: Option<f64>,
    /// TDEE activity multiplier
    #[serde(skip_serializing_if = "Option::is_none")]
    pub activity_level: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub goal: Option<Goal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_weight: Option<f64>,
    /// kg per week; meaningful only when goal is `Lose`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub goal_pace: Option<f64>,

    // Calculated results
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bmr: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tdee: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub daily_budget: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub additional_metrics: Option<Vec<TrackedMetric>>,
}

impl UserProfileData {
    /// A profile is onboarded once the calculated budget has been written
    pub fn is_onboarded(&self) -> bool {
        self.daily_budget.is_some()
    }
}
