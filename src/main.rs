mod auth;
mod clients;
mod config;
mod database;
mod errors;
mod handlers;
mod models;
mod pricing;

use actix_cors::Cors;
use actix_web::{http::header, middleware::Logger, web, App, HttpServer};

use crate::auth::AuthVerifier;
use crate::config::AppConfig;
use crate::database::Database;

fn build_cors(allowed_origins: &[String]) -> Cors {
    let cors = Cors::default()
        .allow_any_method()
        .allowed_headers(vec![
            header::AUTHORIZATION,
            header::ACCEPT,
            header::CONTENT_TYPE,
            header::HeaderName::from_static("apikey"),
            header::HeaderName::from_static("x-client-info"),
        ])
        .max_age(3600);

    if allowed_origins.is_empty() {
        return cors.allow_any_origin();
    }

    allowed_origins
        .iter()
        .fold(cors, |cors, origin| cors.allowed_origin(origin))
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenvy::dotenv().ok();
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let config = AppConfig::from_env().map_err(|err| {
        log::error!("Invalid configuration: {err}");
        std::io::Error::new(std::io::ErrorKind::InvalidInput, err.to_string())
    })?;

    let db = Database::connect(&config.database_url).await.map_err(|err| {
        log::error!("Failed to initialize database: {err:?}");
        std::io::Error::new(std::io::ErrorKind::Other, err)
    })?;
    log::info!("Database ready, migrations applied");

    let verifier = AuthVerifier::from_settings(&config.auth);
    let bind_address = config.bind_address();

    log::info!(
        "Starting InstaServe API on {} (commission {} bps)",
        bind_address,
        config.commission_rate.bps()
    );

    let db_data = web::Data::new(db);
    let verifier_data = web::Data::new(verifier);
    let config_data = web::Data::new(config);

    HttpServer::new(move || {
        App::new()
            .app_data(db_data.clone())
            .app_data(verifier_data.clone())
            .app_data(config_data.clone())
            .wrap(build_cors(&config_data.cors_allowed_origins))
            .wrap(Logger::default())
            .service(web::scope("/api/v1").configure(handlers::configure))
    })
    .bind(&bind_address)?
    .run()
    .await
}
