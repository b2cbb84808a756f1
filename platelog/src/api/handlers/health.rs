use axum::extract::State;
use axum::Json;
use serde::Serialize;

use crate::api::AppState;

#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct HealthData {
    pub status: String,
    pub version: String,
    /// `staged` or `single_shot`.
    pub pipeline_mode: String,
    pub llm: LlmStatus,
    pub nutrition: NutritionStatus,
    pub meal_count: usize,
}

#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
pub struct LlmStatus {
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
}

#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
pub struct NutritionStatus {
    /// `configured` (own API key), `demo` (shared demo key) or `disabled`.
    pub status: String,
}

/// `GET /api/health`
#[utoipa::path(
    get,
    path = "/api/health",
    tag = "health",
    responses(
        (status = 200, description = "Service configuration status", body = HealthData),
    )
)]
pub async fn health_check(State(state): State<AppState>) -> Json<HealthData> {
    let llm = if state.llm.is_available() {
        LlmStatus {
            status: "available".to_string(),
            provider: Some(state.llm.backend().name().to_string()),
            model: state.llm.config().map(|c| c.model.clone()),
        }
    } else {
        LlmStatus {
            status: "unavailable".to_string(),
            provider: None,
            model: None,
        }
    };

    let nutrition = &state.config.nutrition;
    let nutrition_status = if !nutrition.enabled {
        "disabled"
    } else if nutrition.is_demo_key() {
        "demo"
    } else {
        "configured"
    };

    Json(HealthData {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        pipeline_mode: state.pipeline.mode().to_string(),
        llm,
        nutrition: NutritionStatus {
            status: nutrition_status.to_string(),
        },
        meal_count: state.meal_log.len().await,
    })
}
