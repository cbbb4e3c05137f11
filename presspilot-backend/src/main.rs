use actix_cors::Cors;
use actix_web::{middleware::Logger, web, App, HttpServer};
use dotenv::dotenv;
use std::sync::Arc;

mod commerce;
mod config;
mod controllers;
mod conversation;
mod db;
mod models;
mod site;
mod tools;

use commerce::SqliteCommerce;
use config::Config;
use conversation::SqliteConversation;
use db::Database;
use site::host::{CommandHost, LocalCommandHost};
use site::SqliteSite;
use tools::validation::{CommandValidator, HttpValidator, RuleValidator};
use tools::{ToolPipeline, ToolRegistry};

pub struct AppState {
    pub db: Arc<Database>,
    pub config: Config,
    pub registry: Arc<ToolRegistry>,
    pub pipeline: Arc<ToolPipeline>,
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv().ok();
    env_logger::init();

    let mut config = Config::from_env();
    let port = config.port;

    log::info!("Initializing database at {}", config.database_url);
    let db = Database::new(&config.database_url).expect("Failed to initialize database");
    let db = Arc::new(db);
    config.apply_stored_settings(&db);

    let site: Arc<dyn site::SiteAdapter> = Arc::new(SqliteSite::new(db.clone()));
    let commerce = Arc::new(SqliteCommerce::new(db.clone(), config.commerce_enabled));

    let host: Option<Arc<dyn CommandHost>> = if config.site_cli_enabled {
        LocalCommandHost::detect().map(|h| Arc::new(h) as Arc<dyn CommandHost>)
    } else {
        log::info!("site CLI disabled by configuration");
        None
    };

    log::info!("Initializing tool registry");
    let registry = Arc::new(tools::builtin::register_defaults(
        &config,
        db.clone(),
        site,
        host,
        commerce,
    ));

    let validator: Arc<dyn CommandValidator> = match config.validator_url.clone() {
        Some(url) => {
            log::info!("external command validator configured");
            Arc::new(HttpValidator::new(url))
        }
        None => Arc::new(RuleValidator),
    };

    let pipeline = Arc::new(ToolPipeline::new(
        registry.clone(),
        Arc::new(SqliteConversation::new(db.clone())),
        Some(validator),
        db.clone(),
    ));

    log::info!("Starting PressPilot backend on port {}", port);

    HttpServer::new(move || {
        let cors = Cors::default()
            .allow_any_origin()
            .allow_any_method()
            .allow_any_header()
            .max_age(3600);

        App::new()
            .app_data(web::Data::new(AppState {
                db: Arc::clone(&db),
                config: config.clone(),
                registry: Arc::clone(&registry),
                pipeline: Arc::clone(&pipeline),
            }))
            .wrap(Logger::default())
            .wrap(cors)
            .configure(controllers::health::config_routes)
            .configure(controllers::tools::config_routes)
    })
    .bind(("0.0.0.0", port))?
    .run()
    .await
}
