//! Food analysis gateway
//!
//! Wraps the generative model's `generateContent` REST endpoint. Structured
//! analysis calls pin a response schema so the model returns dish lists we
//! can deserialize directly; free-text calls (entry and day summaries) take
//! whatever text comes back.
//!
//! The base URL is injectable so tests can point the gateway at a local
//! mock server.

use nutrilens_shared::models::{FoodItem, LogEntry};
use nutrilens_shared::nutrition;
use nutrilens_shared::types::AnalysisResult;
use nutrilens_shared::validation::validate_food_item;
use reqwest::StatusCode;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::time::Duration;
use thiserror::Error;
use tracing::warn;

/// Fallback entry title when summarization fails
const FALLBACK_ENTRY_TITLE: &str = "Meal";
/// Fallback per-entry feedback when summarization fails
const FALLBACK_ENTRY_FEEDBACK: &str = "Good job logging!";

#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("upstream returned {0}")]
    Upstream(StatusCode),

    #[error("model returned no candidates")]
    Empty,

    #[error("model output did not match the expected shape: {0}")]
    InvalidOutput(String),
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<Value>,
}

#[derive(Debug, Serialize)]
struct Content {
    parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
enum Part {
    #[serde(rename = "text")]
    Text(String),
    #[serde(rename = "inlineData", rename_all = "camelCase")]
    InlineData { mime_type: String, data: String },
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: CandidateContent,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    #[serde(default)]
    text: String,
}

/// Response schema forced onto structured analysis calls. Every field is
/// required so a malformed item fails deserialization instead of producing
/// partial nutrition data.
fn food_items_schema() -> Value {
    let item = json!({
        "type": "OBJECT",
        "properties": {
            "name": {"type": "STRING"},
            "portionSize": {"type": "STRING"},
            "description": {"type": "STRING"},
            "calories": {"type": "NUMBER"},
            "protein": {"type": "NUMBER"},
            "carbs": {"type": "NUMBER"},
            "fat": {"type": "NUMBER"}
        },
        "required": ["name", "portionSize", "description", "calories", "protein", "carbs", "fat"]
    });
    json!({"type": "ARRAY", "items": item})
}

pub struct FoodAnalysisGateway {
    client: reqwest::Client,
    base_url: String,
    api_key: SecretString,
    model: String,
}

impl FoodAnalysisGateway {
    pub fn new(base_url: String, api_key: SecretString, model: String) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .unwrap_or_default();
        Self {
            client,
            base_url,
            api_key,
            model,
        }
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url.trim_end_matches('/'),
            self.model
        )
    }

    async fn generate(&self, request: &GenerateContentRequest) -> Result<String, AnalysisError> {
        let response = self
            .client
            .post(self.endpoint())
            .query(&[("key", self.api_key.expose_secret())])
            .json(request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(AnalysisError::Upstream(status));
        }

        let body: GenerateContentResponse = response.json().await?;
        let text: String = body
            .candidates
            .into_iter()
            .next()
            .ok_or(AnalysisError::Empty)?
            .content
            .parts
            .into_iter()
            .map(|p| p.text)
            .collect();
        if text.is_empty() {
            return Err(AnalysisError::Empty);
        }
        Ok(text)
    }

    async fn generate_items(&self, parts: Vec<Part>) -> Result<AnalysisResult, AnalysisError> {
        let request = GenerateContentRequest {
            contents: vec![Content { parts }],
            generation_config: Some(json!({
                "responseMimeType": "application/json",
                "responseSchema": food_items_schema(),
            })),
        };
        let text = self.generate(&request).await?;
        let mut items: Vec<FoodItem> = serde_json::from_str(&text)
            .map_err(|e| AnalysisError::InvalidOutput(e.to_string()))?;

        if items.is_empty() {
            return Err(AnalysisError::InvalidOutput(
                "no dishes recognized".to_string(),
            ));
        }
        for item in &items {
            validate_food_item(item)
                .map_err(|e| AnalysisError::InvalidOutput(e.to_string()))?;
        }
        nutrition::normalize_calories(&mut items);

        let total = nutrition::sum(&items);
        Ok(AnalysisResult { items, total })
    }

    /// Identify the dishes in a meal photo and estimate their macros
    pub async fn analyze_image(
        &self,
        image_base64: &str,
        mime_type: &str,
    ) -> Result<AnalysisResult, AnalysisError> {
        let prompt = "Analyze this meal photo. Identify each distinct dish and estimate \
                      its portion size, calories, protein, carbs and fat. Give a short \
                      description of each dish.";
        self.generate_items(vec![
            Part::InlineData {
                mime_type: mime_type.to_string(),
                data: image_base64.to_string(),
            },
            Part::Text(prompt.to_string()),
        ])
        .await
    }

    /// Estimate nutrition for a dish named in text, used when the user
    /// corrects a recognized dish name.
    ///
    /// The result is always exactly one dish: the caller replaces a single
    /// recognized item wholesale, so any extra dishes the model volunteers
    /// are discarded.
    pub async fn analyze_text(&self, name: &str) -> Result<AnalysisResult, AnalysisError> {
        let prompt = format!(
            "Estimate the nutrition of one typical serving of \"{name}\". Return it as a \
             single dish with portion size, calories, protein, carbs, fat and a short \
             description."
        );
        let mut result = self.generate_items(vec![Part::Text(prompt)]).await?;
        result.items.truncate(1);
        result.total = nutrition::sum(&result.items);
        Ok(result)
    }

    /// Produce a short title and an encouraging one-liner for a saved entry.
    ///
    /// Failures degrade to fixed fallbacks; entry saving never blocks on
    /// this call succeeding.
    pub async fn summarize_entry(&self, items: &[FoodItem]) -> (String, String) {
        let names: Vec<&str> = items.iter().map(|i| i.name.as_str()).collect();
        let prompt = format!(
            "A user just logged a meal containing: {}. Reply with exactly two lines. \
             Line 1: a title for the meal of at most four words. \
             Line 2: one short encouraging sentence about the meal.",
            names.join(", ")
        );
        let request = GenerateContentRequest {
            contents: vec![Content {
                parts: vec![Part::Text(prompt)],
            }],
            generation_config: None,
        };

        match self.generate(&request).await {
            Ok(text) => {
                let mut lines = text.lines().map(str::trim).filter(|l| !l.is_empty());
                let title = lines
                    .next()
                    .map(str::to_string)
                    .unwrap_or_else(|| FALLBACK_ENTRY_TITLE.to_string());
                let feedback = lines
                    .next()
                    .map(str::to_string)
                    .unwrap_or_else(|| FALLBACK_ENTRY_FEEDBACK.to_string());
                (title, feedback)
            }
            Err(e) => {
                warn!("Entry summarization failed, using fallbacks: {e}");
                (
                    FALLBACK_ENTRY_TITLE.to_string(),
                    FALLBACK_ENTRY_FEEDBACK.to_string(),
                )
            }
        }
    }

    /// Produce a whole-day feedback paragraph from the day's entries.
    ///
    /// Unlike entry summaries this propagates failure; the caller decides
    /// whether to skip silently.
    pub async fn summarize_day(
        &self,
        entries: &[LogEntry],
        goal_description: Option<&str>,
    ) -> Result<String, AnalysisError> {
        let meals: Vec<String> = entries
            .iter()
            .map(|e| format!("{} ({} kcal)", e.title, e.total_calories))
            .collect();
        let total: i64 = entries.iter().map(|e| e.total_calories).sum();
        let goal_line = match goal_description {
            Some(goal) => format!("Their goal: {goal}."),
            None => "They have not set a goal.".to_string(),
        };
        let prompt = format!(
            "A user logged these meals today: {}. Total: {total} kcal. {goal_line} \
             Write two or three encouraging sentences of feedback on their day of eating.",
            meals.join("; ")
        );
        let request = GenerateContentRequest {
            contents: vec![Content {
                parts: vec![Part::Text(prompt)],
            }],
            generation_config: None,
        };
        self.generate(&request).await
    }
}
