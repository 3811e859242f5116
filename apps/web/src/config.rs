use std::{env::var, time::Duration};

use anyhow::{Context, Result};
use market::{PollIntervals, providers::ApiKeys, symbols};

#[derive(Clone, Debug)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub keys: ApiKeys,
    pub watchlist: Vec<String>,
    pub intervals: PollIntervals,
    pub news_limit: usize,
    pub version: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let key = |name: &str| lookup(name).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let watchlist = match key("WATCHLIST") {
            Some(raw) => symbols::parse_watchlist(&raw),
            None => symbols::DEFAULT_WATCHLIST
                .iter()
                .map(|s| s.to_string())
                .collect(),
        };
        anyhow::ensure!(!watchlist.is_empty(), "WATCHLIST has no symbols");

        Ok(Self {
            host: key("HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            port: parse_or(key("PORT"), "PORT", 5000)?,
            keys: ApiKeys {
                newsapi: key("NEWSAPI_KEY"),
                finnhub: key("FINNHUB_KEY"),
                alpha_vantage: key("ALPHA_VANTAGE_KEY"),
            },
            watchlist,
            intervals: PollIntervals {
                prices: Duration::from_secs(positive_or(key("PRICE_POLL_SECS"), "PRICE_POLL_SECS", 10)?),
                news: Duration::from_secs(positive_or(key("NEWS_POLL_SECS"), "NEWS_POLL_SECS", 30)?),
            },
            news_limit: positive_or(key("NEWS_LIMIT"), "NEWS_LIMIT", 5)?,
            version: key("APP_VERSION").unwrap_or_else(|| "Unknown".to_string()),
        })
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_or<T>(raw: Option<String>, name: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match raw {
        Some(v) => v
            .parse()
            .with_context(|| format!("{name} must be a number, got {v:?}")),
        None => Ok(default),
    }
}

/// Like `parse_or`, but zero is rejected.
fn positive_or<T>(raw: Option<String>, name: &str, default: T) -> Result<T>
where
    T: std::str::FromStr + PartialEq + Default,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    let value = parse_or(raw, name, default)?;
    anyhow::ensure!(value != T::default(), "{name} must be greater than zero");
    Ok(value)
}
