use axum::{
    Router,
    routing::{get, post},
};
use tower_http::trace::TraceLayer;

pub mod config;
pub mod error;
pub mod routes;
pub mod state;
pub mod templates;

use routes::{analyze, api, health, pages};
use state::AppState;

pub fn create_app(state: AppState) -> Router {
    Router::new()
        .route("/", get(pages::index))
        .route("/analyze", post(analyze::analyze))
        .route("/status", get(api::get_status))
        .route("/health", get(health::health))
        .route("/api/quotes", get(api::get_quotes))
        .route("/api/news/{symbol}", get(api::get_news))
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &axum::http::Request<_>| {
                tracing::info_span!(
                    "http_request",
                    method = %request.method(),
                    path = %request.uri().path(),
                )
            }),
        )
        .with_state(state)
}
