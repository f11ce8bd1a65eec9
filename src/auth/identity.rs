use actix_web::{dev::Payload, http::header, web, FromRequest, HttpRequest};
use futures::future::{ready, Ready};

use crate::auth::token::Claims;
use crate::error::{ApiError, ApiResult};
use crate::models::Role;
use crate::state::AppState;

/// Identity decoded from the bearer token of the current request.
#[derive(Debug, Clone, PartialEq)]
pub struct AuthUser {
    pub id: i32,
    pub username: String,
    pub role: Role,
}

impl From<Claims> for AuthUser {
    fn from(claims: Claims) -> Self {
        AuthUser {
            id: claims.id,
            username: claims.username,
            role: claims.role,
        }
    }
}

impl FromRequest for AuthUser {
    type Error = ApiError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        ready(authenticate(req))
    }
}

fn authenticate(req: &HttpRequest) -> ApiResult<AuthUser> {
    let state = req
        .app_data::<web::Data<AppState>>()
        .ok_or_else(|| ApiError::Internal("application state is not registered".to_string()))?;

    let token = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .ok_or(ApiError::Auth("Authentication required"))?;

    state.tokens.verify(token).map(AuthUser::from)
}

/// Allows the caller only when their role is `required`.
pub fn require_role(user: &AuthUser, required: Role) -> ApiResult<()> {
    if user.role == required {
        Ok(())
    } else {
        tracing::info!(user_id = user.id, role = %user.role, required = %required, "role check denied");
        Err(ApiError::Forbidden)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(role: Role) -> AuthUser {
        AuthUser {
            id: 3,
            username: "someone".into(),
            role,
        }
    }

    #[test]
    fn matching_role_is_allowed() {
        assert!(require_role(&user(Role::Admin), Role::Admin).is_ok());
        assert!(require_role(&user(Role::Farmer), Role::Farmer).is_ok());
    }

    #[test]
    fn other_roles_are_forbidden() {
        assert_eq!(
            require_role(&user(Role::Farmer), Role::Admin),
            Err(ApiError::Forbidden)
        );
        assert_eq!(
            require_role(&user(Role::Admin), Role::Farmer),
            Err(ApiError::Forbidden)
        );
    }
}
