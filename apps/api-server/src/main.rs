//! # Yatube API Server
//!
//! The main entry point for the Actix-web HTTP server.

use std::sync::Arc;

use actix_web::{App, HttpServer};
use tracing_actix_web::TracingLogger;

use api_server::config::AppConfig;
use api_server::configure_app;
use api_server::observability::RequestIdMiddleware;
use api_server::state::AppState;
use api_server::telemetry::{TelemetryConfig, init_telemetry};
use yatube_core::ports::{PasswordService, TokenService};
use yatube_infra::{Argon2PasswordService, JwtTokenService};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    init_telemetry(&TelemetryConfig::from_env());

    let config = AppConfig::from_env();

    tracing::info!("Starting Yatube server on {}:{}", config.host, config.port);

    let state = AppState::new(&config)
        .await
        .map_err(std::io::Error::other)?;
    let tokens: Arc<dyn TokenService> = Arc::new(JwtTokenService::from_env());
    let passwords: Arc<dyn PasswordService> = Arc::new(Argon2PasswordService::new());

    HttpServer::new(move || {
        App::new()
            .wrap(TracingLogger::default())
            .wrap(RequestIdMiddleware)
            .configure(configure_app(
                state.clone(),
                tokens.clone(),
                passwords.clone(),
            ))
    })
    .bind((config.host.as_str(), config.port))?
    .run()
    .await
}
