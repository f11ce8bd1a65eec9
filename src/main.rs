use actix_cors::Cors;
use actix_web::middleware::Logger;
use actix_web::{web, App, HttpServer};
use tracing::{info, warn};

use agromanage::db::{self, migrations};
use agromanage::error::StartupError;
use agromanage::{logging, routes, AppState, Settings};

#[actix_web::main]
async fn main() -> Result<(), StartupError> {
    dotenv::dotenv().ok();
    logging::init();

    let settings = Settings::load()?;
    if settings.auth.uses_default_secret() {
        warn!("JWT_SECRET is not set; using the development default");
    }

    let pool = db::build_pool(&settings.database)?;
    {
        let mut conn = pool.get()?;
        if settings.database.reset_on_start {
            migrations::reset_database(&mut conn)?;
        } else {
            migrations::run_migrations(&mut conn)?;
        }
        migrations::seed(&mut conn)?;
    }

    let state = web::Data::new(AppState::new(pool, &settings.auth));
    let bind = (settings.server.host.clone(), settings.server.port);
    info!(host = %bind.0, port = bind.1, "starting HTTP server");

    HttpServer::new(move || {
        let cors = Cors::default()
            .allow_any_origin()
            .allow_any_method()
            .allow_any_header()
            .max_age(3600);

        App::new()
            .wrap(Logger::default())
            .wrap(cors)
            .app_data(state.clone())
            .configure(routes::configure)
    })
    .bind(bind)?
    .run()
    .await?;

    Ok(())
}
