use std::{future::Future, sync::Arc, time::Duration};

use chrono::Utc;
use futures::{StreamExt, stream};
use tokio::{
    sync::watch,
    task::JoinHandle,
    time::MissedTickBehavior,
};
use tracing::{debug, info, instrument, warn};
use tracing_futures::Instrument;

use crate::{FallbackChain, MarketCache, NewsItem, NewsSnapshot, Payload, Quote};

const CONCURRENCY: usize = 4;

#[derive(Debug, Clone, Copy)]
pub struct PollIntervals {
    pub prices: Duration,
    pub news: Duration,
}

impl Default for PollIntervals {
    fn default() -> Self {
        Self {
            prices: Duration::from_secs(10),
            news: Duration::from_secs(30),
        }
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RoundStats {
    pub processed: usize,
    pub failures: usize,
}

/// Refreshes the cache for every watched symbol on two independent timers.
pub struct Poller {
    symbols: Vec<String>,
    quotes: Arc<FallbackChain<Quote>>,
    news: Arc<FallbackChain<Vec<NewsItem>>>,
    cache: Arc<MarketCache>,
}

impl Poller {
    pub fn new(
        symbols: Vec<String>,
        quotes: Arc<FallbackChain<Quote>>,
        news: Arc<FallbackChain<Vec<NewsItem>>>,
        cache: Arc<MarketCache>,
    ) -> Self {
        Self {
            symbols,
            quotes,
            news,
            cache,
        }
    }

    #[instrument(name = "price_round", skip(self), fields(symbols = self.symbols.len()))]
    pub async fn poll_prices(&self) -> RoundStats {
        let mut tasks = stream::iter(self.symbols.iter().cloned())
            .map(|symbol| {
                let chain = Arc::clone(&self.quotes);
                let span = tracing::info_span!("quote", symbol = %symbol);

                async move {
                    let res = chain.fetch(&symbol).await;
                    (symbol, res)
                }
                .instrument(span)
            })
            .buffer_unordered(CONCURRENCY);

        let mut stats = RoundStats::default();

        while let Some((symbol, res)) = tasks.next().await {
            stats.processed += 1;

            match res {
                Ok(fetched) if !fetched.payload.has_content() => {
                    // A zero price is no data; keep the last good quote.
                    stats.failures += 1;
                    warn!(symbol = %symbol, source = fetched.source, "quote without a price");
                    self.cache
                        .record_failure(&symbol, format!("{} returned no price", fetched.source))
                        .await;
                }
                Ok(fetched) => {
                    let q = fetched.payload;
                    debug!(
                        symbol = %symbol,
                        source = fetched.source,
                        price = q.price,
                        change_percent = q.change_percent,
                        "updated quote"
                    );
                    self.cache.put_quote(q).await;
                }
                Err(e) => {
                    stats.failures += 1;
                    warn!(symbol = %symbol, error = %e, "no quote from any source");
                    self.cache.record_failure(&symbol, e.to_string()).await;
                }
            }
        }

        self.cache.set_api_healthy(stats.failures == 0).await;
        info!(processed = stats.processed, failures = stats.failures, "completed price round");

        stats
    }

    #[instrument(name = "news_round", skip(self), fields(symbols = self.symbols.len()))]
    pub async fn poll_news(&self) -> RoundStats {
        let mut tasks = stream::iter(self.symbols.iter().cloned())
            .map(|symbol| {
                let chain = Arc::clone(&self.news);
                let span = tracing::info_span!("news", symbol = %symbol);

                async move {
                    let res = chain.fetch(&symbol).await;
                    (symbol, res)
                }
                .instrument(span)
            })
            .buffer_unordered(CONCURRENCY);

        let mut stats = RoundStats::default();

        while let Some((symbol, res)) = tasks.next().await {
            stats.processed += 1;

            match res {
                Ok(fetched) => {
                    debug!(
                        symbol = %symbol,
                        source = fetched.source,
                        articles = fetched.payload.len(),
                        "updated news"
                    );
                    self.cache
                        .put_news(NewsSnapshot {
                            symbol,
                            provider: fetched.source,
                            items: fetched.payload,
                            fetched_at: Utc::now(),
                        })
                        .await;
                }
                Err(e) => {
                    // Keep showing the previous snapshot rather than blanking the panel.
                    stats.failures += 1;
                    warn!(symbol = %symbol, error = %e, "no news from any source");
                }
            }
        }

        info!(processed = stats.processed, failures = stats.failures, "completed news round");

        stats
    }

    /// Start both timers. They stop once `shutdown` turns true or its sender is dropped.
    pub fn spawn(
        self: Arc<Self>,
        intervals: PollIntervals,
        shutdown: watch::Receiver<bool>,
    ) -> Vec<JoinHandle<()>> {
        info!(
            symbols = ?self.symbols,
            price_secs = intervals.prices.as_secs(),
            news_secs = intervals.news.as_secs(),
            "starting pollers"
        );

        let prices = {
            let poller = Arc::clone(&self);
            tokio::spawn(run_every(intervals.prices, shutdown.clone(), move || {
                let poller = Arc::clone(&poller);
                async move {
                    poller.poll_prices().await;
                }
            }))
        };

        let news = {
            let poller = Arc::clone(&self);
            tokio::spawn(run_every(intervals.news, shutdown, move || {
                let poller = Arc::clone(&poller);
                async move {
                    poller.poll_news().await;
                }
            }))
        };

        vec![prices, news]
    }
}

/// Ticks that fire while a round is still running are dropped, so rounds never overlap.
async fn run_every<F, Fut>(every: Duration, mut shutdown: watch::Receiver<bool>, mut round: F)
where
    F: FnMut() -> Fut,
    Fut: Future<Output = ()>,
{
    let mut tick = tokio::time::interval(every);
    tick.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            _ = tick.tick() => round().await,
            changed = shutdown.changed() => {
                if changed.is_err() || *shutdown.borrow() {
                    break;
                }
            }
        }
    }

    debug!("poller stopped");
}
