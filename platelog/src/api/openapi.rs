use axum::Json;
use utoipa::OpenApi;
use utoipa_redoc::{Redoc, Servable};

use super::dto;
use super::handlers;
use crate::models;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Platelog API",
        version = "0.1.0",
        description = "Turns free-text meal descriptions into per-ingredient calorie estimates and keeps a meal log.",
    ),
    paths(
        handlers::meals::log_meal,
        handlers::meals::delete_meal,
        handlers::history::get_history,
        handlers::health::health_check,
    ),
    components(schemas(
        dto::LogMealRequest,
        dto::LogMealResponse,
        dto::HistoryResponse,
        dto::DeleteMealResponse,
        dto::ErrorResponse,
        models::FoodEstimate,
        models::EstimateSource,
        models::LogStats,
        models::DailyStats,
        handlers::health::HealthData,
        handlers::health::LlmStatus,
        handlers::health::NutritionStatus,
    )),
    tags(
        (name = "meals", description = "Estimate, log, edit and delete meals"),
        (name = "history", description = "Meal log queries and totals"),
        (name = "health", description = "Health check"),
    ),
)]
pub struct ApiDoc;

pub async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

pub fn redoc_router<S: Clone + Send + Sync + 'static>() -> axum::Router<S> {
    Redoc::with_url("/docs", ApiDoc::openapi()).into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_lists_every_route() {
        let doc = ApiDoc::openapi();
        for path in ["/api/logMeal", "/api/meal/{id}", "/api/history", "/api/health"] {
            assert!(doc.paths.paths.contains_key(path), "missing {path}");
        }
    }
}
