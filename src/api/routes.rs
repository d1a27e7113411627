use axum::{
    http::{header, HeaderValue, Method},
    routing::{any, get},
    Router,
};
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::set_header::SetResponseHeaderLayer;
use tracing::warn;

use crate::config::{Config, CorsConfig, Variant};
use crate::source::ReportSource;

use super::handlers::{function_analytics, get_analytics, health_check, AppState};

/// Build the router for whichever variant the config selects
pub fn create_router(config: &Config, source: Arc<dyn ReportSource>) -> Router {
    let state = Arc::new(AppState::for_variant(config, config.variant, source));
    match config.variant {
        Variant::Server => create_server_router(state, &config.cors),
        Variant::Function => create_function_router(state),
    }
}

pub fn create_server_router(state: Arc<AppState>, cors: &CorsConfig) -> Router {
    let origins: Vec<HeaderValue> = cors
        .allowed_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                warn!("Ignoring invalid CORS origin '{origin}'");
                None
            }
        })
        .collect();

    let cors_layer = CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET]);

    Router::new()
        .route("/api/analytics", get(get_analytics))
        .route("/health", get(health_check))
        .layer(cors_layer)
        .with_state(state)
}

/// Function-style router
///
/// CORS headers are fixed on every response, and no preflight handling runs,
/// so OPTIONS reaches the handler and gets a 405 like any other non-GET.
pub fn create_function_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/analytics", any(function_analytics))
        .layer(SetResponseHeaderLayer::overriding(
            header::ACCESS_CONTROL_ALLOW_ORIGIN,
            HeaderValue::from_static("*"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::ACCESS_CONTROL_ALLOW_METHODS,
            HeaderValue::from_static("GET"),
        ))
        .with_state(state)
}
