use axum::extract::{Path, State};
use axum::Json;
use validator::Validate;

use crate::api::dto::{DeleteMealResponse, ErrorResponse, LogMealRequest, LogMealResponse};
use crate::api::extractors::AppJson;
use crate::api::AppState;
use crate::error::{PlatelogError, Result};
use crate::models::MealLogEntry;
use crate::pipeline::merge_clarification;

/// `POST /api/logMeal`
#[utoipa::path(
    post,
    path = "/api/logMeal",
    tag = "meals",
    operation_id = "meals.log",
    request_body = LogMealRequest,
    responses(
        (status = 200, description = "Meal estimated, or a clarification question", body = LogMealResponse),
        (status = 400, description = "Missing or blank description", body = ErrorResponse),
        (status = 404, description = "Edited meal not found", body = ErrorResponse),
        (status = 500, description = "Unrecoverable processing error", body = ErrorResponse),
    )
)]
pub async fn log_meal(
    State(state): State<AppState>,
    AppJson(req): AppJson<LogMealRequest>,
) -> Result<Json<LogMealResponse>> {
    req.validate()?;

    let description = match req.clarification.as_deref() {
        Some(answer) if !answer.trim().is_empty() => merge_clarification(&req.description, answer),
        _ => req.description.trim().to_string(),
    };

    let edit_id = if req.is_edit {
        let id = req
            .meal_id
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .ok_or_else(|| {
                PlatelogError::Validation("mealId is required when isEdit is true".to_string())
            })?;
        if !state.meal_log.contains(id).await {
            return Err(meal_not_found(id));
        }
        Some(id)
    } else {
        None
    };

    let meal = state.pipeline.process_meal(&description).await?;

    let Some(breakdown) = meal.breakdown().cloned() else {
        return Ok(Json(LogMealResponse {
            meal,
            meal_id: None,
            meal_log: state.meal_log.entries().await,
            daily_stats: None,
        }));
    };

    let (entry, meal_log) = match edit_id {
        Some(id) => state
            .meal_log
            .replace(id, &description, breakdown)
            .await
            .ok_or_else(|| meal_not_found(id))?,
        None => {
            let entry = MealLogEntry::new(description.as_str(), breakdown);
            let meal_log = state.meal_log.append(entry.clone()).await;
            (entry, meal_log)
        }
    };

    tracing::info!(
        meal_id = %entry.id,
        edited = edit_id.is_some(),
        total_calories = entry.total_calories(),
        "Meal logged"
    );

    let daily_stats = state.meal_log.daily_stats(entry.date()).await;

    Ok(Json(LogMealResponse {
        meal,
        meal_id: Some(entry.id),
        meal_log,
        daily_stats: Some(daily_stats),
    }))
}

/// `DELETE /api/meal/{id}`
#[utoipa::path(
    delete,
    path = "/api/meal/{id}",
    tag = "meals",
    operation_id = "meals.delete",
    params(("id" = String, Path, description = "Meal ID")),
    responses(
        (status = 200, description = "Meal removed, or already absent", body = DeleteMealResponse),
    )
)]
pub async fn delete_meal(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Json<DeleteMealResponse> {
    let (deleted, meal_log) = state.meal_log.remove(&id).await;
    if deleted {
        tracing::info!(meal_id = %id, "Meal deleted");
    } else {
        tracing::debug!(meal_id = %id, "Delete of unknown meal ignored");
    }

    Json(DeleteMealResponse { deleted, meal_log })
}

fn meal_not_found(id: &str) -> PlatelogError {
    PlatelogError::NotFound(format!("Meal {id} not found"))
}
