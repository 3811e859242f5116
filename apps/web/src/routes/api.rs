use axum::{
    Json,
    extract::{Path, State},
};
use chrono::{DateTime, Utc};
use market::{NewsSnapshot, Quote, symbols};
use serde::Serialize;

use crate::{
    error::{AppError, AppResult},
    state::AppState,
};

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub api_healthy: bool,
    pub failed_symbols: Vec<String>,
    pub cached_quotes: usize,
    pub cached_news: usize,
    pub watchlist: Vec<String>,
    pub quote_sources: Vec<&'static str>,
    pub news_sources: Vec<&'static str>,
    pub last_update: Option<DateTime<Utc>>,
    pub uptime_secs: u64,
    pub version: String,
}

/// `GET /api/quotes`
pub async fn get_quotes(State(state): State<AppState>) -> Json<Vec<Quote>> {
    Json(state.cache.quotes().await)
}

/// `GET /api/news/{symbol}`
pub async fn get_news(
    State(state): State<AppState>,
    Path(symbol): Path<String>,
) -> AppResult<Json<NewsSnapshot>> {
    let symbol = symbols::normalize(&symbol);

    state
        .cache
        .news(&symbol)
        .await
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("no news cached for {symbol}")))
}

/// `GET /status`
pub async fn get_status(State(state): State<AppState>) -> Json<StatusResponse> {
    let health = state.cache.health().await;

    Json(StatusResponse {
        api_healthy: health.api_healthy,
        failed_symbols: health.failed_symbols,
        cached_quotes: health.cached_quotes,
        cached_news: health.cached_news,
        watchlist: state.watchlist.to_vec(),
        quote_sources: state.quote_sources.clone(),
        news_sources: state.news_sources.clone(),
        last_update: health.last_update,
        uptime_secs: state.uptime_secs(),
        version: state.version.clone(),
    })
}
