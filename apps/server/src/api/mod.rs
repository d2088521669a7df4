//! HTTP API layer

pub mod extract;
pub mod handlers;
pub mod middleware;
pub mod routes;

use crate::state::AppState;
use axum::{
    extract::DefaultBodyLimit,
    http::{header, HeaderValue, Method},
    middleware::from_fn,
    routing::get,
    Router,
};
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::TraceLayer,
};

/// Build the application router with all routes and middleware.
pub fn create_router(state: AppState) -> Router {
    let max_body = state.config.server.max_request_body_size;
    let cors = cors_layer(&state.config.server.cors_origins);

    let router = Router::new()
        .route("/health", get(handlers::health::health))
        .merge(routes::studies::study_routes())
        .layer(DefaultBodyLimit::max(max_body))
        .layer(from_fn(middleware::security::security_headers_middleware))
        .layer(from_fn(middleware::request_id::request_id_middleware));

    let router = match cors {
        Some(cors) => router.layer(cors),
        None => router,
    };

    router.layer(TraceLayer::new_for_http()).with_state(state)
}

/// CORS is closed unless origins are configured.
fn cors_layer(origins: &[String]) -> Option<CorsLayer> {
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    if origins.is_empty() {
        return None;
    }

    Some(
        CorsLayer::new()
            .allow_origin(AllowOrigin::list(origins))
            .allow_methods([Method::GET, Method::PATCH])
            .allow_headers([header::CONTENT_TYPE, extract::USER_ID_HEADER_NAME])
            .expose_headers([middleware::request_id::REQUEST_ID_HEADER]),
    )
}
