// src/main.rs
use actix_cors::Cors;
use actix_web::{middleware, web, App, HttpServer};
use signup_relay::api::{configure_routes, AppState};
use signup_relay::banner;
use signup_relay::config::AppConfig;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    if let Err(e) = dotenvy::dotenv() {
        eprintln!("⚠️  Warning: Could not load .env file: {}", e);
        eprintln!("   Make sure REMOTE_API_BASE is set in your environment");
    }

    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let app_config = AppConfig::load().map_err(|e| {
        log::error!("Failed to load configuration: {}", e);
        std::io::Error::other(e)
    })?;

    banner::print_banner(&app_config);

    let bind = (app_config.server.host.clone(), app_config.server.port);
    let state = AppState::new(app_config).map_err(std::io::Error::other)?;

    log::info!("🚀 Listening on http://{}:{}", bind.0, bind.1);

    HttpServer::new(move || {
        let cors = Cors::permissive();

        App::new()
            .app_data(web::Data::new(state.clone()))
            .wrap(cors)
            .wrap(middleware::Logger::default())
            .configure(configure_routes)
    })
    .bind(bind)?
    .run()
    .await
}
