pub mod loans;
pub mod orders;
pub mod products;
pub mod weather;

use actix_web::HttpResponse;
use serde_json::json;

use crate::error::{ApiError, ApiResult};

pub async fn health() -> HttpResponse {
    HttpResponse::Ok().json(json!({ "status": "ok" }))
}

/// Parses a raw `{id}` segment on role-guarded routes, where the role check
/// has to run first. An id that cannot name a row is reported as missing.
pub(crate) fn record_id(raw: &str, not_found: &str) -> ApiResult<i32> {
    raw.parse::<i32>()
        .map_err(|_| ApiError::NotFound(not_found.to_string()))
}
