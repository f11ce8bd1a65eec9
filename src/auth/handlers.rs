use actix_web::{web, HttpResponse};
use serde_json::json;
use tracing::{info, warn};

use crate::auth::{password, AuthUser};
use crate::db::models::{NewUser, PublicUser};
use crate::db::repository;
use crate::error::{ApiError, ApiResult};
use crate::models::{LoginRequest, LoginResponse, RegisterRequest, Role};
use crate::state::AppState;

pub async fn register(
    state: web::Data<AppState>,
    body: web::Json<RegisterRequest>,
) -> ApiResult<HttpResponse> {
    let req = body.into_inner();
    req.validate()?;

    let plain = req.password;
    let hashed = web::block(move || password::hash_password(&plain)).await??;

    let new_user = NewUser {
        username: req.username.trim().to_string(),
        email: req.email.trim().to_string(),
        password: hashed,
        role: Role::Farmer.as_str().to_string(),
    };
    let id = state
        .run(move |conn| Ok(repository::insert_user(conn, &new_user)?))
        .await?;

    info!(user_id = id, "registered farmer account");
    Ok(HttpResponse::Created().json(json!({ "id": id })))
}

pub async fn login(
    state: web::Data<AppState>,
    body: web::Json<LoginRequest>,
) -> ApiResult<HttpResponse> {
    let req = body.into_inner();
    let role = req.validate()?;

    let username = req.username.clone();
    let found = state
        .run(move |conn| Ok(repository::find_user_for_login(conn, &username, role.as_str())?))
        .await?;

    let user = match found {
        Some(user) => {
            let plain = req.password;
            let hashed = user.password.clone();
            if web::block(move || password::verify_password(&plain, &hashed)).await? {
                user
            } else {
                warn!(username = %req.username, %role, "login rejected: wrong password");
                return Err(ApiError::invalid_credentials());
            }
        }
        None => {
            warn!(username = %req.username, %role, "login rejected: unknown account");
            return Err(ApiError::invalid_credentials());
        }
    };

    let token = state.tokens.issue(user.id, &user.username, role)?;
    info!(user_id = user.id, %role, "login succeeded");
    Ok(HttpResponse::Ok().json(LoginResponse {
        token,
        user: PublicUser::from(user),
    }))
}

pub async fn me(state: web::Data<AppState>, user: AuthUser) -> ApiResult<HttpResponse> {
    let id = user.id;
    let account = state
        .run(move |conn| Ok(repository::find_user(conn, id)?))
        .await?
        .ok_or_else(|| ApiError::NotFound("Account not found".to_string()))?;
    Ok(HttpResponse::Ok().json(PublicUser::from(account)))
}
