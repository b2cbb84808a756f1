//! Wire types for the HTTP API. Field names are camelCase on the wire.

use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

use crate::models::{DailyStats, LogStats, MealLogEntry, MealResult};
use crate::pipeline::MIN_DESCRIPTION_LEN;

/// `POST /api/logMeal` body.
#[derive(Debug, Clone, Deserialize, Validate, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LogMealRequest {
    /// Free-text meal description, e.g. "2 eggs and toast".
    #[validate(custom(function = "meaningful_description"), length(max = 2000))]
    pub description: String,
    /// Replace the entry `mealId` instead of appending a new one.
    #[serde(default)]
    pub is_edit: bool,
    #[serde(default)]
    pub meal_id: Option<String>,
    /// Answer to a clarification question. Appended to `description` before
    /// the meal is estimated again from scratch.
    #[serde(default)]
    #[validate(length(max = 1_000))]
    pub clarification: Option<String>,
}

fn meaningful_description(description: &str) -> Result<(), ValidationError> {
    if description.trim().chars().count() < MIN_DESCRIPTION_LEN {
        let error = ValidationError::new("too_short");
        return Err(error.with_message("Please describe your meal".into()));
    }
    Ok(())
}

#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LogMealResponse {
    /// Either `{clarificationNeeded: true, question}` or
    /// `{clarificationNeeded: false, foods, totalCalories}`.
    #[schema(value_type = Object)]
    pub meal: MealResult,
    /// Id of the stored entry; absent when clarification is needed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meal_id: Option<String>,
    /// Whole log in append order.
    #[schema(value_type = Vec<Object>)]
    pub meal_log: Vec<MealLogEntry>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub daily_stats: Option<DailyStats>,
}

/// `GET /api/history` query string.
#[derive(Debug, Clone, Default, Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct HistoryQuery {
    /// UTC day, `YYYY-MM-DD`. All days when absent.
    pub date: Option<String>,
    /// Maximum number of entries returned.
    pub limit: Option<usize>,
}

#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct HistoryResponse {
    /// Newest first.
    #[schema(value_type = Vec<Object>)]
    pub meal_log: Vec<MealLogEntry>,
    /// Computed over every matching entry, before `limit` applies.
    pub stats: LogStats,
}

#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DeleteMealResponse {
    /// False when no entry had the id; the request still succeeds.
    pub deleted: bool,
    #[schema(value_type = Vec<Object>)]
    pub meal_log: Vec<MealLogEntry>,
}

/// Body of every non-2xx response.
#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
pub struct ErrorResponse {
    pub error: String,
    pub code: u16,
}
