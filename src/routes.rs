use actix_web::web;

use crate::auth::handlers as auth;
use crate::error::ApiError;
use crate::handlers::{self, loans, orders, products, weather};

const MAX_JSON_BYTES: usize = 64 * 1024;

/// Mounts the whole `/api` surface. Callers register `web::Data<AppState>`.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(
        web::JsonConfig::default()
            .limit(MAX_JSON_BYTES)
            .error_handler(|err, _req| ApiError::malformed_body(err).into()),
    )
    .app_data(
        web::QueryConfig::default()
            .error_handler(|err, _req| ApiError::malformed_body(err).into()),
    )
    .app_data(
        web::PathConfig::default()
            .error_handler(|err, _req| ApiError::invalid_field("id", &err.to_string()).into()),
    )
    .service(
        web::scope("/api")
            .route("/health", web::get().to(handlers::health))
            .service(
                web::scope("/auth")
                    .route("/register", web::post().to(auth::register))
                    .route("/login", web::post().to(auth::login))
                    .route("/me", web::get().to(auth::me)),
            )
            .service(
                web::scope("/products")
                    .route("", web::get().to(products::list))
                    .route("", web::post().to(products::create))
                    .route("/{id}", web::get().to(products::get_one))
                    .route("/{id}", web::put().to(products::update)),
            )
            .service(
                web::scope("/loans")
                    .route("", web::get().to(loans::list_own))
                    .route("", web::post().to(loans::apply))
                    .route("/admin", web::get().to(loans::list_all))
                    .route("/admin/{id}", web::put().to(loans::update_status)),
            )
            .service(
                web::scope("/orders")
                    .route("", web::get().to(orders::list_own))
                    .route("", web::post().to(orders::place))
                    .route("/admin", web::get().to(orders::list_all))
                    .route("/admin/{id}", web::put().to(orders::update_status)),
            )
            .service(
                web::scope("/weather")
                    .route("", web::get().to(weather::list))
                    .route("/{id}", web::get().to(weather::get_one)),
            ),
    );
}
