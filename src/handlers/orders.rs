use actix_web::{web, HttpResponse};
use serde_json::json;
use tracing::info;

use crate::auth::{require_role, AuthUser};
use crate::db::repository;
use crate::handlers::record_id;
use crate::error::{ApiError, ApiResult};
use crate::models::{CreateOrderRequest, OrderStatus, Role, StatusUpdateRequest};
use crate::state::AppState;

pub async fn list_own(state: web::Data<AppState>, user: AuthUser) -> ApiResult<HttpResponse> {
    let orders = state
        .run(move |conn| Ok(repository::list_orders_for_user(conn, user.id)?))
        .await?;
    Ok(HttpResponse::Ok().json(orders))
}

pub async fn list_all(state: web::Data<AppState>, user: AuthUser) -> ApiResult<HttpResponse> {
    require_role(&user, Role::Admin)?;
    let orders = state
        .run(|conn| Ok(repository::list_all_orders(conn)?))
        .await?;
    Ok(HttpResponse::Ok().json(orders))
}

pub async fn place(
    state: web::Data<AppState>,
    user: AuthUser,
    body: web::Json<CreateOrderRequest>,
) -> ApiResult<HttpResponse> {
    let req = body.into_inner();
    req.validate()?;

    let user_id = user.id;
    let placed = state
        .run(move |conn| repository::place_order(conn, user_id, &req.items))
        .await?;

    info!(order_id = placed.id, user_id, total = placed.total_amount, "order placed");
    Ok(HttpResponse::Created().json(placed))
}

pub async fn update_status(
    state: web::Data<AppState>,
    user: AuthUser,
    path: web::Path<String>,
    body: Result<web::Json<StatusUpdateRequest>, actix_web::Error>,
) -> ApiResult<HttpResponse> {
    require_role(&user, Role::Admin)?;
    let req = body.map_err(ApiError::from_extractor)?.into_inner();
    let status = req.parse_within(OrderStatus::ALL)?;

    let id = record_id(&path, "Order not found")?;
    let updated = state
        .run(move |conn| Ok(repository::update_order_status(conn, id, status.as_str())?))
        .await?;
    if updated == 0 {
        return Err(ApiError::NotFound("Order not found".to_string()));
    }

    info!(order_id = id, %status, admin_id = user.id, "order status updated");
    Ok(HttpResponse::Ok().json(json!({ "message": "Order status updated successfully" })))
}
