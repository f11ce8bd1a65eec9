use std::time::Duration;

use diesel::pg::PgConnection;
use diesel::r2d2::{ConnectionManager, Pool, PooledConnection};

use crate::settings::DatabaseSettings;

pub type PgPool = Pool<ConnectionManager<PgConnection>>;
pub type PgPooledConnection = PooledConnection<ConnectionManager<PgConnection>>;

/// Builds the shared pool and opens its first connections, so a wrong URL
/// fails at startup rather than on the first request.
pub fn build_pool(settings: &DatabaseSettings) -> Result<PgPool, r2d2::Error> {
    let manager = ConnectionManager::<PgConnection>::new(settings.connection_url());
    Pool::builder()
        .max_size(settings.pool_size)
        .connection_timeout(Duration::from_secs(settings.timeout_seconds))
        .build(manager)
}

/// A pool that connects on first use. Requests that never reach the
/// database (auth and validation failures) work without a server behind it.
pub fn lazy_pool(database_url: &str) -> PgPool {
    let manager = ConnectionManager::<PgConnection>::new(database_url);
    Pool::builder()
        .max_size(1)
        .min_idle(Some(0))
        .connection_timeout(Duration::from_secs(1))
        .build_unchecked(manager)
}
