use actix_web::{web, HttpResponse};
use chrono::Utc;

use crate::db::repository;
use crate::error::{ApiError, ApiResult};
use crate::models::WeatherQuery;
use crate::state::AppState;

pub async fn list(
    state: web::Data<AppState>,
    query: web::Query<WeatherQuery>,
) -> ApiResult<HttpResponse> {
    let severity = query.severity()?;
    let active_at = query
        .active
        .unwrap_or(false)
        .then(|| Utc::now().naive_utc());

    let alerts = state
        .run(move |conn| {
            Ok(repository::list_weather_alerts(
                conn,
                active_at,
                severity.map(|s| s.as_str()),
            )?)
        })
        .await?;
    Ok(HttpResponse::Ok().json(alerts))
}

pub async fn get_one(state: web::Data<AppState>, path: web::Path<i32>) -> ApiResult<HttpResponse> {
    let id = path.into_inner();
    let alert = state
        .run(move |conn| {
            repository::get_weather_alert(conn, id).map_err(|e| match ApiError::from(e) {
                ApiError::NotFound(_) => ApiError::NotFound("Weather alert not found".to_string()),
                other => other,
            })
        })
        .await?;
    Ok(HttpResponse::Ok().json(alert))
}
