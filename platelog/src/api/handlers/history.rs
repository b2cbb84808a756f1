use axum::extract::State;
use axum::Json;
use axum_extra::extract::Query;
use chrono::NaiveDate;

use crate::api::dto::{ErrorResponse, HistoryQuery, HistoryResponse};
use crate::api::AppState;
use crate::error::{PlatelogError, Result};

/// `GET /api/history`
#[utoipa::path(
    get,
    path = "/api/history",
    tag = "history",
    operation_id = "history.list",
    params(HistoryQuery),
    responses(
        (status = 200, description = "Matching meals, newest first", body = HistoryResponse),
        (status = 400, description = "Unparsable date", body = ErrorResponse),
    )
)]
pub async fn get_history(
    State(state): State<AppState>,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<HistoryResponse>> {
    let date = query.date.as_deref().map(parse_date).transpose()?;
    let limit = query.limit.unwrap_or(state.config.history.default_limit);

    let page = state.meal_log.query(date, limit).await;

    Ok(Json(HistoryResponse {
        meal_log: page.entries,
        stats: page.stats,
    }))
}

fn parse_date(raw: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").map_err(|_| {
        PlatelogError::Validation(format!("Invalid date '{raw}', expected YYYY-MM-DD"))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_iso_dates() {
        assert_eq!(
            parse_date("2024-05-02").unwrap(),
            NaiveDate::from_ymd_opt(2024, 5, 2).unwrap()
        );
        assert!(matches!(
            parse_date("02/05/2024"),
            Err(PlatelogError::Validation(_))
        ));
    }
}
