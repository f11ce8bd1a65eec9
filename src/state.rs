use actix_web::web;
use diesel::pg::PgConnection;

use crate::auth::TokenKeys;
use crate::db::PgPool;
use crate::error::ApiResult;
use crate::settings::AuthSettings;

/// Shared per-process state handed to every handler through `web::Data`.
#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub tokens: TokenKeys,
}

impl AppState {
    pub fn new(pool: PgPool, auth: &AuthSettings) -> Self {
        AppState {
            pool,
            tokens: TokenKeys::new(&auth.jwt_secret, auth.token_ttl_hours),
        }
    }

    /// Runs `f` with a pooled connection on the blocking thread pool.
    pub async fn run<F, T>(&self, f: F) -> ApiResult<T>
    where
        F: FnOnce(&mut PgConnection) -> ApiResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let pool = self.pool.clone();
        web::block(move || {
            let mut conn = pool.get()?;
            f(&mut conn)
        })
        .await?
    }
}
