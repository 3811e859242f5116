use std::{sync::Arc, time::Instant};

use market::MarketCache;

/// Shared by every handler. Pollers write to `cache`; handlers only read it.
#[derive(Clone)]
pub struct AppState {
    pub cache: Arc<MarketCache>,
    pub watchlist: Arc<Vec<String>>,
    pub quote_sources: Vec<&'static str>,
    pub news_sources: Vec<&'static str>,
    pub version: String,
    started_at: Instant,
}

impl AppState {
    pub fn new(
        cache: Arc<MarketCache>,
        watchlist: Vec<String>,
        quote_sources: Vec<&'static str>,
        news_sources: Vec<&'static str>,
        version: String,
    ) -> Self {
        Self {
            cache,
            watchlist: Arc::new(watchlist),
            quote_sources,
            news_sources,
            version,
            started_at: Instant::now(),
        }
    }

    pub fn uptime_secs(&self) -> u64 {
        self.started_at.elapsed().as_secs()
    }
}
