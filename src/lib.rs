pub mod auth;
pub mod console;
pub mod db;
pub mod error;
pub mod handlers;
pub mod logging;
pub mod models;
pub mod routes;
pub mod settings;
pub mod state;

pub use error::{ApiError, ApiResult};
pub use settings::Settings;
pub use state::AppState;
