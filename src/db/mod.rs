pub mod connection;
pub mod migrations;
pub mod models;
pub mod repository;
pub mod schema;

pub use connection::{build_pool, lazy_pool, PgPool};
