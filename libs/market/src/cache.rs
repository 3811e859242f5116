use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::RwLock;

use crate::{NewsItem, Quote};

#[derive(Debug, Clone, Serialize)]
pub struct NewsSnapshot {
    pub symbol: String,
    /// Upstream that answered first in priority order.
    pub provider: &'static str,
    pub items: Vec<NewsItem>,
    pub fetched_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Health {
    pub api_healthy: bool,
    pub failed_symbols: Vec<String>,
    pub cached_quotes: usize,
    pub cached_news: usize,
    pub last_update: Option<DateTime<Utc>>,
}

#[derive(Default)]
struct Inner {
    quotes: HashMap<String, Quote>,
    news: HashMap<String, NewsSnapshot>,
    failures: HashMap<String, String>,
    api_healthy: bool,
    last_update: Option<DateTime<Utc>>,
}

/// Latest quote and news per symbol. Entries are replaced wholesale on every
/// successful poll and live only as long as the process.
pub struct MarketCache {
    inner: RwLock<Inner>,
}

impl Default for MarketCache {
    fn default() -> Self {
        Self::new()
    }
}

impl MarketCache {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(Inner {
                api_healthy: true,
                ..Default::default()
            }),
        }
    }

    pub async fn put_quote(&self, quote: Quote) {
        let mut inner = self.inner.write().await;
        inner.failures.remove(&quote.symbol);
        inner.last_update = Some(Utc::now());
        inner.quotes.insert(quote.symbol.clone(), quote);
    }

    pub async fn put_news(&self, snapshot: NewsSnapshot) {
        let mut inner = self.inner.write().await;
        inner.last_update = Some(Utc::now());
        inner.news.insert(snapshot.symbol.clone(), snapshot);
    }

    /// Remember why the last price fetch for `symbol` failed. The cached quote, if any, is kept.
    pub async fn record_failure(&self, symbol: &str, reason: String) {
        self.inner
            .write()
            .await
            .failures
            .insert(symbol.to_string(), reason);
    }

    /// Set after each price round: healthy only when every symbol was fetched.
    pub async fn set_api_healthy(&self, healthy: bool) {
        self.inner.write().await.api_healthy = healthy;
    }

    pub async fn quote(&self, symbol: &str) -> Option<Quote> {
        self.inner.read().await.quotes.get(symbol).cloned()
    }

    /// All cached quotes, ordered by symbol.
    pub async fn quotes(&self) -> Vec<Quote> {
        let inner = self.inner.read().await;
        let mut quotes: Vec<Quote> = inner.quotes.values().cloned().collect();
        quotes.sort_by(|a, b| a.symbol.cmp(&b.symbol));
        quotes
    }

    pub async fn news(&self, symbol: &str) -> Option<NewsSnapshot> {
        self.inner.read().await.news.get(symbol).cloned()
    }

    pub async fn is_api_healthy(&self) -> bool {
        self.inner.read().await.api_healthy
    }

    pub async fn health(&self) -> Health {
        let inner = self.inner.read().await;
        let mut failed_symbols: Vec<String> = inner.failures.keys().cloned().collect();
        failed_symbols.sort();

        Health {
            api_healthy: inner.api_healthy,
            failed_symbols,
            cached_quotes: inner.quotes.len(),
            cached_news: inner.news.len(),
            last_update: inner.last_update,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quote(symbol: &str, price: f64) -> Quote {
        Quote::from_previous_close(symbol, price, 100.0, 1_000, Utc::now(), "test")
    }

    #[tokio::test]
    async fn new_quote_replaces_old_one() {
        let cache = MarketCache::new();
        cache.put_quote(quote("TSLA", 101.0)).await;
        cache.put_quote(quote("TSLA", 105.0)).await;

        assert_eq!(cache.quote("TSLA").await.unwrap().price, 105.0);
        assert_eq!(cache.quotes().await.len(), 1);
    }

    #[tokio::test]
    async fn quotes_are_sorted_by_symbol() {
        let cache = MarketCache::new();
        cache.put_quote(quote("TSLA", 1.0)).await;
        cache.put_quote(quote("AAPL", 1.0)).await;

        let symbols: Vec<String> = cache.quotes().await.into_iter().map(|q| q.symbol).collect();
        assert_eq!(symbols, vec!["AAPL", "TSLA"]);
    }

    #[tokio::test]
    async fn failure_is_cleared_by_next_quote() {
        let cache = MarketCache::new();
        cache.record_failure("NVDA", "timeout".into()).await;
        cache.set_api_healthy(false).await;

        let health = cache.health().await;
        assert!(!health.api_healthy);
        assert_eq!(health.failed_symbols, vec!["NVDA"]);
        assert!(health.last_update.is_none());

        cache.put_quote(quote("NVDA", 120.0)).await;
        cache.set_api_healthy(true).await;

        let health = cache.health().await;
        assert!(health.api_healthy);
        assert!(health.failed_symbols.is_empty());
        assert_eq!(health.cached_quotes, 1);
        assert!(health.last_update.is_some());
    }

    #[tokio::test]
    async fn stores_news_snapshot() {
        let cache = MarketCache::new();
        cache
            .put_news(NewsSnapshot {
                symbol: "AAPL".into(),
                provider: "yahoo_finance",
                items: vec![],
                fetched_at: Utc::now(),
            })
            .await;

        assert_eq!(cache.news("AAPL").await.unwrap().provider, "yahoo_finance");
        assert!(cache.news("TSLA").await.is_none());
        assert_eq!(cache.health().await.cached_news, 1);
    }
}
