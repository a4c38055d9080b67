pub mod client;
pub mod config;
pub mod db;
pub mod errors;
pub mod handlers;
pub mod models;
pub mod services;
pub mod state;

use std::sync::Arc;

use axum::http::{HeaderValue, Method};
use axum::routing::{get, post, put};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::state::AppState;

pub fn build_router(state: Arc<AppState>) -> Router {
    let cors = cors_layer(state.config.cors_origin.as_deref());

    Router::new()
        .route("/health", get(handlers::health::health))
        .route(
            "/api/salons/:salon_id/catalog",
            get(handlers::catalog::get_catalog),
        )
        .route(
            "/api/salons/:salon_id/slots",
            get(handlers::catalog::get_slots),
        )
        .route("/api/packages/:id", get(handlers::catalog::get_package))
        .route("/api/bookings", post(handlers::bookings::create_booking))
        .route("/api/admin/salons", post(handlers::admin::create_salon))
        .route(
            "/api/admin/salons/:salon_id/services",
            post(handlers::admin::create_service),
        )
        .route("/api/admin/packages", post(handlers::admin::create_package))
        .route(
            "/api/admin/packages/:id",
            put(handlers::admin::update_package),
        )
        .route("/api/admin/bookings", get(handlers::admin::get_bookings))
        .route(
            "/api/admin/bookings/:id/cancel",
            post(handlers::admin::cancel_booking),
        )
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

fn cors_layer(origin: Option<&str>) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PUT])
        .allow_headers(Any);

    match origin.map(HeaderValue::from_str) {
        Some(Ok(origin)) => layer.allow_origin(origin),
        Some(Err(_)) => {
            tracing::warn!("CORS_ORIGIN is not a valid header value, allowing any origin");
            layer.allow_origin(Any)
        }
        None => layer.allow_origin(Any),
    }
}
