use actix_web::{web, HttpResponse};
use serde_json::json;
use tracing::info;

use crate::auth::{require_role, AuthUser};
use crate::db::models::NewLoan;
use crate::db::repository;
use crate::handlers::record_id;
use crate::error::{ApiError, ApiResult};
use crate::models::{CreateLoanRequest, LoanStatus, Role, StatusUpdateRequest};
use crate::state::AppState;

/// The caller's own applications, newest first.
pub async fn list_own(state: web::Data<AppState>, user: AuthUser) -> ApiResult<HttpResponse> {
    let loans = state
        .run(move |conn| Ok(repository::list_loans_for_user(conn, user.id)?))
        .await?;
    Ok(HttpResponse::Ok().json(loans))
}

pub async fn list_all(state: web::Data<AppState>, user: AuthUser) -> ApiResult<HttpResponse> {
    require_role(&user, Role::Admin)?;
    let loans = state
        .run(|conn| Ok(repository::list_all_loans(conn)?))
        .await?;
    Ok(HttpResponse::Ok().json(loans))
}

pub async fn apply(
    state: web::Data<AppState>,
    user: AuthUser,
    body: web::Json<CreateLoanRequest>,
) -> ApiResult<HttpResponse> {
    let req = body.into_inner();
    req.validate()?;

    let new_loan = NewLoan {
        user_id: user.id,
        amount: req.amount,
        interest_rate: req.interest_rate,
        term_months: req.term_months,
        loan_type: req.loan_type.trim().to_string(),
        status: LoanStatus::Pending.as_str().to_string(),
    };
    let id = state
        .run(move |conn| Ok(repository::insert_loan(conn, &new_loan)?))
        .await?;

    info!(loan_id = id, user_id = user.id, amount = req.amount, "loan application received");
    Ok(HttpResponse::Created().json(json!({ "id": id })))
}

/// Admin decision on a loan. The role check runs before the id and body are looked at.
pub async fn update_status(
    state: web::Data<AppState>,
    user: AuthUser,
    path: web::Path<String>,
    body: Result<web::Json<StatusUpdateRequest>, actix_web::Error>,
) -> ApiResult<HttpResponse> {
    require_role(&user, Role::Admin)?;
    let req = body.map_err(ApiError::from_extractor)?.into_inner();
    let status = req.parse_within(LoanStatus::DECISIONS)?;

    let id = record_id(&path, "Loan not found")?;
    let updated = state
        .run(move |conn| Ok(repository::update_loan_status(conn, id, status.as_str())?))
        .await?;
    if updated == 0 {
        return Err(ApiError::NotFound("Loan not found".to_string()));
    }

    info!(loan_id = id, %status, admin_id = user.id, "loan status updated");
    Ok(HttpResponse::Ok().json(json!({ "message": "Loan status updated successfully" })))
}
