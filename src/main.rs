mod api;
mod config;
mod database;
mod models;
mod utils;

use actix_cors::Cors;
use actix_web::{middleware::Logger, web, App, HttpServer};
use dotenv::dotenv;
use std::sync::Arc;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use config::Config;
use database::{DocumentStore, MongoDB, UnavailableStore};

/// Connects once; on failure the server still starts and every store-backed
/// route answers with its 500.
async fn connect_store(config: &Config) -> Arc<dyn DocumentStore> {
    let uri = match config.database_uri() {
        Ok(uri) => uri,
        Err(e) => {
            log::error!("❌ Error connecting to MongoDB: {}", e);
            return Arc::new(UnavailableStore::new(e.to_string()));
        }
    };

    log::info!("📊 Database: {}", config::redact_uri(uri));

    match MongoDB::new(uri, &config.database_name).await {
        Ok(db) => {
            log::info!("✅ Connected to MongoDB ({})", config.database_name);
            Arc::new(db)
        }
        Err(e) => {
            log::error!("❌ Error connecting to MongoDB: {}", e);
            Arc::new(UnavailableStore::new(e.to_string()))
        }
    }
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Load environment variables
    dotenv().ok();

    // Initialize logger
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let config = Config::from_env();

    log::info!("🚀 Starting SmartCare gateway...");

    let store = web::Data::from(connect_store(&config).await);

    let (host, port) = config.bind_address();
    log::info!("🌐 Server listening on {}:{}", host, port);
    log::info!("📚 Swagger UI available at: http://{}:{}/swagger-ui/", host, port);

    HttpServer::new(move || {
        let openapi = api::swagger::ApiDoc::openapi();

        App::new()
            .app_data(store.clone())
            .wrap(Cors::permissive())
            .wrap(Logger::default())
            .service(
                SwaggerUi::new("/swagger-ui/{_:.*}")
                    .url("/api-docs/openapi.json", openapi)
            )
            .configure(api::configure)
    })
    .bind((host, port))?
    .run()
    .await
}
