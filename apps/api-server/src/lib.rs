//! # Yatube API Server
//!
//! Routes, handlers and wiring of the blog on top of `yatube-core` services.

pub mod config;
pub mod handlers;
pub mod middleware;
pub mod observability;
pub mod page_cache;
pub mod state;
pub mod telemetry;

use std::sync::Arc;

use actix_web::web;

use yatube_core::ports::{PasswordService, TokenService};

use crate::state::AppState;

/// Register shared state, credential services and all routes on an app.
pub fn configure_app(
    state: AppState,
    tokens: Arc<dyn TokenService>,
    passwords: Arc<dyn PasswordService>,
) -> impl FnOnce(&mut web::ServiceConfig) {
    move |cfg| {
        cfg.app_data(web::Data::new(state))
            .app_data(web::Data::new(tokens))
            .app_data(web::Data::new(passwords))
            .configure(handlers::configure_routes);
    }
}
