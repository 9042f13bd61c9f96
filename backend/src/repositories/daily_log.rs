//! Daily ledger persistence
//!
//! One document per `(uid, date)` under `users/{uid}/daily_logs`, keyed by
//! the `YYYY-MM-DD` date string. Entry appends and counter bumps go through
//! the store's atomic merge so concurrent saves compose.

use crate::store::{DocKey, DocumentStore, DocumentWatch, MergeUpdate, StoreError};
use nutrilens_shared::models::{DailyLog, LogEntry};
use serde_json::{Map, Value};
use std::sync::Arc;

// Stored field names. These are the only strings ever spliced into store
// update expressions.
const F_TOTAL_CALORIES: &str = "totalCalories";
const F_WATER_INTAKE: &str = "waterIntake";
const F_ENTRIES: &str = "entries";
const F_DAILY_FEEDBACK: &str = "dailyFeedback";

fn collection(uid: &str) -> String {
    format!("users/{uid}/daily_logs")
}

fn key(uid: &str, date: &str) -> DocKey {
    DocKey::new(collection(uid), date)
}

fn decode(doc: Value) -> Result<DailyLog, StoreError> {
    Ok(serde_json::from_value(doc)?)
}

/// Live view of one day's log
pub struct DailyLogWatch {
    inner: DocumentWatch,
}

impl DailyLogWatch {
    /// Next observed state; `None` while the day has not been created
    pub async fn next(&mut self) -> Result<Option<DailyLog>, StoreError> {
        match self.inner.next().await? {
            Some(doc) => Ok(Some(decode(doc)?)),
            None => Ok(None),
        }
    }
}

#[derive(Clone)]
pub struct DailyLogRepository {
    store: Arc<dyn DocumentStore>,
}

impl DailyLogRepository {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    pub async fn get(&self, uid: &str, date: &str) -> Result<Option<DailyLog>, StoreError> {
        match self.store.get(&key(uid, date)).await? {
            Some(doc) => Ok(Some(decode(doc)?)),
            None => Ok(None),
        }
    }

    /// Create the day with zeroed counters and a weight snapshot, unless a
    /// concurrent writer already did. The stored day wins.
    pub async fn create_if_absent(
        &self,
        uid: &str,
        date: &str,
        current_weight: f64,
    ) -> Result<DailyLog, StoreError> {
        let seed = serde_json::to_value(DailyLog::empty(date, current_weight))?;
        decode(self.store.create_if_absent(&key(uid, date), seed).await?)
    }

    /// Append one entry and bump the calorie total atomically.
    ///
    /// When the day does not exist yet the seed is a fresh day already
    /// containing exactly this entry, so either path leaves the entry
    /// stored once.
    pub async fn append_entry(
        &self,
        uid: &str,
        date: &str,
        current_weight: f64,
        entry: &LogEntry,
    ) -> Result<DailyLog, StoreError> {
        let mut seeded = DailyLog::empty(date, current_weight);
        seeded.total_calories = entry.total_calories;
        seeded.entries.push(entry.clone());
        let seed = serde_json::to_value(seeded)?;

        let update = MergeUpdate::new()
            .increment(F_TOTAL_CALORIES, entry.total_calories)
            .append(F_ENTRIES, serde_json::to_value(entry)?);

        decode(self.store.upsert_merge(&key(uid, date), seed, update).await?)
    }

    /// Atomically add to the day's water counter
    pub async fn add_water(
        &self,
        uid: &str,
        date: &str,
        current_weight: f64,
        amount_ml: i64,
    ) -> Result<DailyLog, StoreError> {
        let mut seeded = DailyLog::empty(date, current_weight);
        seeded.water_intake = amount_ml;
        let seed = serde_json::to_value(seeded)?;

        let update = MergeUpdate::new().increment(F_WATER_INTAKE, amount_ml);
        decode(self.store.upsert_merge(&key(uid, date), seed, update).await?)
    }

    /// Write the day-level feedback text. The day must already exist.
    pub async fn set_daily_feedback(
        &self,
        uid: &str,
        date: &str,
        feedback: &str,
    ) -> Result<DailyLog, StoreError> {
        let mut fields = Map::new();
        fields.insert(F_DAILY_FEEDBACK.to_string(), Value::from(feedback));
        decode(self.store.patch(&key(uid, date), fields).await?)
    }

    pub async fn subscribe(&self, uid: &str, date: &str) -> Result<DailyLogWatch, StoreError> {
        let inner = self.store.subscribe(&key(uid, date)).await?;
        Ok(DailyLogWatch { inner })
    }

    /// All days with keys in `[start, end]`, sorted ascending by date
    pub async fn fetch_range(
        &self,
        uid: &str,
        start: &str,
        end: &str,
    ) -> Result<Vec<DailyLog>, StoreError> {
        let docs = self
            .store
            .list_range(&collection(uid), start, end)
            .await?;
        let mut logs = docs
            .into_iter()
            .map(decode)
            .collect::<Result<Vec<_>, _>>()?;
        logs.sort_by(|a, b| a.date.cmp(&b.date));
        Ok(logs)
    }
}
