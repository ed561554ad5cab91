use crate::api::{handlers, AppState};
use axum::{
    routing::{get, post, put},
    Router,
};
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};

/// Build the main API router
pub fn build_router(state: AppState) -> Router {
    Router::new()
        // Health endpoints
        .route("/", get(handlers::welcome))
        .route("/healthcheck", get(handlers::health_check))
        // Search
        .route("/v1/query", post(handlers::search))
        .route("/v1/categories", get(handlers::categories))
        .route("/v1/schema", get(handlers::schema))
        // Runtime controls
        .route("/log-level", put(handlers::update_log_level))
        // Add state
        .with_state(state)
        // Add middleware
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().include_headers(true))
                .on_response(DefaultOnResponse::new().include_headers(true)),
        )
        .layer(CorsLayer::permissive())
}
