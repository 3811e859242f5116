use axum::{Json, extract::State};
use chrono::Utc;
use market::analysis::{self, Analysis};
use serde::Deserialize;
use tracing::{debug, info};

use crate::{
    error::{AppError, AppResult},
    state::AppState,
};

#[derive(Debug, Deserialize)]
pub struct AnalyzeRequest {
    #[serde(default)]
    pub question: String,
}

/// `POST /analyze`
///
/// Answers "Why is TSLA moving today?" from whatever the pollers last cached.
pub async fn analyze(
    State(state): State<AppState>,
    Json(req): Json<AnalyzeRequest>,
) -> AppResult<Json<Analysis>> {
    let question = req.question.trim();
    if question.is_empty() {
        return Err(AppError::BadRequest("question must not be empty".into()));
    }

    let Some(symbol) = analysis::detect_symbol(question, &state.watchlist) else {
        debug!(question, "no symbol detected");
        return Err(AppError::NoSymbol {
            watchlist: state.watchlist.to_vec(),
        });
    };

    let quote = state.cache.quote(&symbol).await;
    let news = state.cache.news(&symbol).await;
    let healthy = state.cache.is_api_healthy().await;

    let result = analysis::analyze(
        &symbol,
        question,
        quote.as_ref(),
        news.as_ref(),
        healthy,
        Utc::now(),
    );

    info!(
        symbol = %symbol,
        has_quote = quote.is_some(),
        news = result.news_items.len(),
        status = ?result.api_status,
        "answered question"
    );

    Ok(Json(result))
}
