//! Daily-ledger service
//!
//! Owns the append-only meal ledger: day creation, entry saves, water
//! logging, day-level feedback, history and monthly summaries. Every
//! mutation goes through the repository's atomic merge operations, so two
//! devices logging at once both land.

use crate::error::{ApiError, ApiResult};
use crate::gateway::FoodAnalysisGateway;
use crate::repositories::{DailyLogRepository, DailyLogWatch, ProfileRepository};
use metrics::counter;
use nutrilens_shared::ledger;
use nutrilens_shared::models::{DailyLog, Goal, LogEntry, UserProfileData};
use nutrilens_shared::nutrition;
use nutrilens_shared::types::{
    AddWaterRequest, AppendEntryRequest, DailyFeedbackResponse, HistoryQuery, InitTodayRequest,
    MonthlySummaryResponse,
};
use nutrilens_shared::validation::{
    month_window, parse_date_key, today_local_key, validate_food_item, validate_water_amount,
};
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;
use validator::Validate;

#[derive(Clone)]
pub struct LedgerService {
    logs: DailyLogRepository,
    profiles: ProfileRepository,
    gateway: Arc<FoodAnalysisGateway>,
}

impl LedgerService {
    pub fn new(
        logs: DailyLogRepository,
        profiles: ProfileRepository,
        gateway: Arc<FoodAnalysisGateway>,
    ) -> Self {
        Self {
            logs,
            profiles,
            gateway,
        }
    }

    /// Weight snapshot for a freshly created day, taken from the profile
    async fn weight_snapshot(&self, uid: &str) -> ApiResult<f64> {
        let profile = self.profiles.get(uid).await?;
        Ok(profile.and_then(|p| p.current_weight).unwrap_or(0.0))
    }

    /// Create today's log if it does not exist yet; the stored day wins.
    ///
    /// An explicit weight in the request overrides the profile snapshot for
    /// a new day and is ignored for an existing one.
    pub async fn init_today(&self, uid: &str, request: InitTodayRequest) -> ApiResult<DailyLog> {
        request.validate()?;
        let date = today_local_key();
        let weight = if request.current_weight > 0.0 {
            request.current_weight
        } else {
            self.weight_snapshot(uid).await?
        };
        let log = self.logs.create_if_absent(uid, &date, weight).await?;
        info!(date = %date, "Initialized today's log");
        Ok(log)
    }

    /// Today's log, or an empty unpersisted view when nothing was logged
    /// yet. Reading never creates the day.
    pub async fn get_today(&self, uid: &str) -> ApiResult<DailyLog> {
        let date = today_local_key();
        match self.logs.get(uid, &date).await? {
            Some(log) => Ok(log),
            None => {
                let weight = self.weight_snapshot(uid).await?;
                Ok(DailyLog::empty(date, weight))
            }
        }
    }

    pub async fn get_day(&self, uid: &str, date: &str) -> ApiResult<DailyLog> {
        parse_date_key(date)?;
        self.logs
            .get(uid, date)
            .await?
            .ok_or_else(|| ApiError::NotFound(format!("No log for {date}")))
    }

    /// Save a reviewed meal as one immutable entry on today's log.
    ///
    /// The entry title and per-entry feedback come from the summarizer and
    /// degrade to fixed fallbacks; the save itself never fails on that
    /// path.
    pub async fn append_entry(
        &self,
        uid: &str,
        request: AppendEntryRequest,
    ) -> ApiResult<DailyLog> {
        request.validate()?;
        let mut items = request.items;
        for item in &items {
            validate_food_item(item)?;
        }
        // Whole-kcal items keep the day's running total exactly equal to
        // the sum over its entries
        nutrition::normalize_calories(&mut items);

        let total_calories = nutrition::total_calories(&items);
        let (title, feedback) = self.gateway.summarize_entry(&items).await;

        let entry = LogEntry {
            id: Uuid::new_v4().to_string(),
            timestamp: chrono::Utc::now(),
            title,
            items,
            total_calories,
            entry_feedback: Some(feedback),
        };

        let date = today_local_key();
        let weight = self.weight_snapshot(uid).await?;
        let log = self.logs.append_entry(uid, &date, weight, &entry).await?;

        counter!("nutrilens_entries_saved_total").increment(1);
        info!(date = %date, calories = total_calories, "Saved log entry");
        Ok(log)
    }

    /// Add to today's water counter. Validation happens before any store
    /// call; a rejected amount changes nothing.
    pub async fn add_water(&self, uid: &str, request: AddWaterRequest) -> ApiResult<DailyLog> {
        request.validate()?;
        validate_water_amount(request.amount_ml)?;

        let date = today_local_key();
        let weight = self.weight_snapshot(uid).await?;
        let log = self
            .logs
            .add_water(uid, &date, weight, request.amount_ml)
            .await?;

        counter!("nutrilens_water_logs_total").increment(1);
        Ok(log)
    }

    /// Derive and store day-level feedback if the day is eligible.
    ///
    /// The gate is once-per-day: at least one entry, no feedback yet. A
    /// summarizer failure is skipped silently and leaves the day eligible
    /// for a later attempt.
    pub async fn ensure_daily_feedback(
        &self,
        uid: &str,
        date: &str,
    ) -> ApiResult<DailyFeedbackResponse> {
        parse_date_key(date)?;
        let log = self
            .logs
            .get(uid, date)
            .await?
            .ok_or_else(|| ApiError::NotFound(format!("No log for {date}")))?;

        if !ledger::wants_daily_feedback(&log) {
            return Ok(DailyFeedbackResponse {
                applied: false,
                daily_feedback: log.daily_feedback,
            });
        }

        let profile = self.profiles.get(uid).await?;
        let goal = goal_description(profile.as_ref());

        match self
            .gateway
            .summarize_day(&log.entries, goal.as_deref())
            .await
        {
            Ok(text) => {
                let updated = self.logs.set_daily_feedback(uid, date, &text).await?;
                counter!("nutrilens_daily_feedback_total").increment(1);
                Ok(DailyFeedbackResponse {
                    applied: true,
                    daily_feedback: updated.daily_feedback,
                })
            }
            Err(e) => {
                warn!(date = %date, "Daily feedback derivation failed, skipping: {e}");
                Ok(DailyFeedbackResponse {
                    applied: false,
                    daily_feedback: None,
                })
            }
        }
    }

    /// Logged days in the inclusive key range, ascending by date
    pub async fn history(&self, uid: &str, query: HistoryQuery) -> ApiResult<Vec<DailyLog>> {
        parse_date_key(&query.start)?;
        parse_date_key(&query.end)?;
        if query.start > query.end {
            return Err(ApiError::Validation(
                "Range start must not be after its end".to_string(),
            ));
        }
        Ok(self.logs.fetch_range(uid, &query.start, &query.end).await?)
    }

    /// One calendar month of logs plus the dashboard aggregates
    pub async fn monthly_summary(
        &self,
        uid: &str,
        year: i32,
        month: u32,
    ) -> ApiResult<MonthlySummaryResponse> {
        let (start, end) = month_window(year, month)?;
        let logs = self.logs.fetch_range(uid, &start, &end).await?;

        let days_logged = logs.len();
        let total_calories: i64 = logs.iter().map(|l| l.total_calories).sum();
        let total_water_ml: i64 = logs.iter().map(|l| l.water_intake).sum();
        let avg_calories_per_logged_day = if days_logged == 0 {
            0.0
        } else {
            total_calories as f64 / days_logged as f64
        };

        Ok(MonthlySummaryResponse {
            year,
            month,
            days_logged,
            total_calories,
            avg_calories_per_logged_day,
            total_water_ml,
            logs,
        })
    }

    /// Live view of one day's log
    pub async fn subscribe(&self, uid: &str, date: &str) -> ApiResult<DailyLogWatch> {
        parse_date_key(date)?;
        Ok(self.logs.subscribe(uid, date).await?)
    }
}

/// One-line description of the user's plan, handed to the day summarizer
fn goal_description(profile: Option<&UserProfileData>) -> Option<String> {
    let profile = profile?;
    let goal = profile.goal.map(|g| match g {
        Goal::Lose => "lose weight",
        Goal::Maintain => "maintain weight",
        Goal::Gain => "gain weight",
    });
    match (goal, profile.daily_budget) {
        (Some(goal), Some(budget)) => Some(format!("{goal} on a {budget} kcal daily budget")),
        (Some(goal), None) => Some(goal.to_string()),
        (None, Some(budget)) => Some(format!("stay within a {budget} kcal daily budget")),
        (None, None) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use nutrilens_shared::models::FoodItem;
    use secrecy::SecretString;

    fn service() -> LedgerService {
        let store: Arc<dyn crate::store::DocumentStore> = Arc::new(MemoryStore::new());
        // Unreachable gateway; summarization falls back
        let gateway = Arc::new(FoodAnalysisGateway::new(
            "http://127.0.0.1:1".to_string(),
            SecretString::new("test".to_string()),
            "gemini-2.0-flash-exp".to_string(),
        ));
        LedgerService::new(
            DailyLogRepository::new(Arc::clone(&store)),
            ProfileRepository::new(store),
            gateway,
        )
    }

    fn items() -> Vec<FoodItem> {
        vec![FoodItem {
            name: "Poha".to_string(),
            portion_size: "1 bowl".to_string(),
            description: "Flattened rice".to_string(),
            calories: 270.0,
            protein: 6.0,
            carbs: 48.0,
            fat: 6.0,
        }]
    }

    #[tokio::test]
    async fn test_watch_observes_entry_save() {
        let service = service();
        let date = today_local_key();
        let mut watch = service.subscribe("u1", &date).await.unwrap();

        // Nothing logged yet
        assert!(watch.next().await.unwrap().is_none());

        service
            .append_entry("u1", AppendEntryRequest { items: items() })
            .await
            .unwrap();

        let log = watch.next().await.unwrap().unwrap();
        assert_eq!(log.total_calories, 270);
        assert_eq!(log.entries[0].title, "Meal");
    }

    #[tokio::test]
    async fn test_subscribe_rejects_malformed_date() {
        let service = service();
        assert!(matches!(
            service.subscribe("u1", "06-01-2025").await,
            Err(ApiError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_fractional_calories_rounded_at_save() {
        let service = service();
        let mut half_kcal = items();
        half_kcal[0].calories = 100.5;

        for _ in 0..2 {
            service
                .append_entry("u1", AppendEntryRequest { items: half_kcal.clone() })
                .await
                .unwrap();
        }

        let date = today_local_key();
        let log = service.get_day("u1", &date).await.unwrap();
        assert_eq!(log.entries.len(), 2);
        assert_eq!(log.entries[0].items[0].calories, 101.0);
        assert_eq!(log.total_calories, 202);
        assert_eq!(ledger::derive_totals(&log).calories.round() as i64, 202);
    }

    fn bare_profile() -> UserProfileData {
        UserProfileData {
            uid: "u1".to_string(),
            email: Some("u@example.com".to_string()),
            display_name: "U".to_string(),
            date_of_birth: None,
            created_at: chrono::Utc::now(),
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
        }
    }

    #[test]
    fn test_goal_description_combines_goal_and_budget() {
        let mut profile = bare_profile();
        assert_eq!(goal_description(None), None);
        assert_eq!(goal_description(Some(&profile)), None);

        profile.daily_budget = Some(2006);
        assert_eq!(
            goal_description(Some(&profile)).unwrap(),
            "stay within a 2006 kcal daily budget"
        );

        profile.goal = Some(Goal::Lose);
        assert_eq!(
            goal_description(Some(&profile)).unwrap(),
            "lose weight on a 2006 kcal daily budget"
        );

        profile.daily_budget = None;
        assert_eq!(goal_description(Some(&profile)).unwrap(), "lose weight");
    }

    #[tokio::test]
    async fn test_feedback_on_empty_day_is_gated() {
        let service = service();
        let date = today_local_key();
        service
            .init_today("u1", InitTodayRequest { current_weight: 70.0 })
            .await
            .unwrap();

        let result = service.ensure_daily_feedback("u1", &date).await.unwrap();
        assert!(!result.applied);
        assert!(result.daily_feedback.is_none());
    }
}
