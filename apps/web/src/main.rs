use std::sync::Arc;

use anyhow::Result;
use market::{FallbackChain, MarketCache, Poller, providers};
use tokio::sync::watch;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use web::{config::Config, create_app, state::AppState};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,market=info,web=info")),
        )
        .init();

    let config = Config::from_env()?;

    let client = providers::http_client()?;
    let quotes = Arc::new(FallbackChain::new(providers::quote_sources(
        &client,
        &config.keys,
    )));
    let news = Arc::new(FallbackChain::new(providers::news_sources(
        &client,
        &config.keys,
        config.news_limit,
    )));

    info!(
        quote_sources = ?quotes.enabled_sources(),
        news_sources = ?news.enabled_sources(),
        watchlist = ?config.watchlist,
        "upstream sources configured"
    );

    let cache = Arc::new(MarketCache::new());
    let state = AppState::new(
        Arc::clone(&cache),
        config.watchlist.clone(),
        quotes.enabled_sources(),
        news.enabled_sources(),
        config.version.clone(),
    );

    let poller = Arc::new(Poller::new(
        config.watchlist.clone(),
        quotes,
        news,
        cache,
    ));
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let pollers = poller.spawn(config.intervals, shutdown_rx);

    let addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Trading Buddy listening on http://{addr}");

    axum::serve(listener, create_app(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    let _ = shutdown_tx.send(true);
    for handle in pollers {
        if let Err(e) = handle.await {
            warn!(error = ?e, "poller task ended abnormally");
        }
    }

    info!("Shutdown complete.");
    Ok(())
}

async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::{
            select,
            signal::unix::{SignalKind, signal},
        };
        let mut sigterm =
            signal(SignalKind::terminate()).expect("failed to install SIGTERM handler");
        let mut sigint = signal(SignalKind::interrupt()).expect("failed to install SIGINT handler");
        select! {
            _ = sigterm.recv() => {},
            _ = sigint.recv()  => {},
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}
