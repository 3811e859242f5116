use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{Duration, NaiveDateTime, Utc};
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;

use super::{Source, fetch_body, require_key};
use crate::{NewsItem, Quote, SourceError, news::is_usable_headline};

const BASE_API: &str = "https://www.alphavantage.co";
const NAME: &str = "alpha_vantage";
const NEWS_LOOKBACK_DAYS: i64 = 7;

/// Alpha Vantage quotes and news. The free tier allows only 25 requests a day,
/// which is why it sits last in both chains.
#[derive(Clone)]
pub struct AlphaVantageClient {
    client: Client,
    base_api: String,
    key: Option<String>,
    news_limit: usize,
}

impl AlphaVantageClient {
    pub fn new(client: Client, key: Option<String>) -> Self {
        Self {
            client,
            base_api: BASE_API.to_string(),
            key,
            news_limit: 5,
        }
    }

    pub fn with_base_api(mut self, base_api: impl Into<String>) -> Self {
        self.base_api = base_api.into();
        self
    }

    pub fn with_news_limit(mut self, limit: usize) -> Self {
        self.news_limit = limit;
        self
    }

    async fn query(&self, params: &[(&str, &str)]) -> Result<String, SourceError> {
        let key = require_key(&self.key)?;
        let req = self
            .client
            .get(format!("{}/query", self.base_api.trim_end_matches('/')))
            .query(params)
            .query(&[("apikey", key)]);

        fetch_body(req).await
    }
}

#[async_trait]
impl Source<Quote> for AlphaVantageClient {
    fn name(&self) -> &'static str {
        NAME
    }

    fn is_enabled(&self) -> bool {
        require_key(&self.key).is_ok()
    }

    async fn fetch(&self, symbol: &str) -> Result<Quote, SourceError> {
        let body = self
            .query(&[("function", "GLOBAL_QUOTE"), ("symbol", symbol)])
            .await?;

        parse_global_quote(symbol, &body)
    }
}

#[async_trait]
impl Source<Vec<NewsItem>> for AlphaVantageClient {
    fn name(&self) -> &'static str {
        NAME
    }

    fn is_enabled(&self) -> bool {
        require_key(&self.key).is_ok()
    }

    async fn fetch(&self, symbol: &str) -> Result<Vec<NewsItem>, SourceError> {
        let time_from = (Utc::now() - Duration::days(NEWS_LOOKBACK_DAYS))
            .format("%Y%m%dT%H%M")
            .to_string();
        let limit = self.news_limit.to_string();

        let body = self
            .query(&[
                ("function", "NEWS_SENTIMENT"),
                ("tickers", symbol),
                ("limit", limit.as_str()),
                ("time_from", time_from.as_str()),
            ])
            .await?;

        let mut items = parse_news_sentiment(symbol, &body)?;
        items.truncate(self.news_limit);
        Ok(items)
    }
}

/// Alpha Vantage reports throttling and bad input inside a 200 response.
fn check_notice(value: &Value) -> Result<(), SourceError> {
    if let Some(note) = value.get("Note").and_then(Value::as_str) {
        tracing::debug!(note, "alpha vantage throttle note");
        return Err(SourceError::RateLimited { retry_after: None });
    }
    if let Some(info) = value.get("Information").and_then(Value::as_str) {
        let lower = info.to_ascii_lowercase();
        return Err(
            if lower.contains("rate limit") || lower.contains("requests per") {
                SourceError::RateLimited { retry_after: None }
            } else {
                SourceError::Unavailable(info.to_string())
            },
        );
    }
    if let Some(msg) = value.get("Error Message").and_then(Value::as_str) {
        return Err(SourceError::Unavailable(msg.to_string()));
    }
    Ok(())
}

fn number(fields: &HashMap<String, String>, key: &str) -> Result<f64, SourceError> {
    let raw = fields
        .get(key)
        .ok_or_else(|| SourceError::InvalidResponse(format!("missing {key}")))?;

    raw.trim()
        .trim_end_matches('%')
        .parse()
        .map_err(|_| SourceError::InvalidResponse(format!("{key}: {raw:?} is not a number")))
}

pub(crate) fn parse_global_quote(symbol: &str, body: &str) -> Result<Quote, SourceError> {
    let value: Value = serde_json::from_str(body)?;
    check_notice(&value)?;

    let res: GlobalQuoteResponse = serde_json::from_value(value)?;
    if res.global_quote.is_empty() {
        return Err(SourceError::NotFound);
    }

    let fields = &res.global_quote;
    let volume = number(fields, "06. volume")?;

    Ok(Quote {
        symbol: symbol.to_uppercase(),
        price: number(fields, "05. price")?,
        change: number(fields, "09. change")?,
        change_percent: number(fields, "10. change percent")?,
        volume: volume.max(0.0) as u64,
        timestamp: Utc::now(),
        source: NAME,
    })
}

pub(crate) fn parse_news_sentiment(symbol: &str, body: &str) -> Result<Vec<NewsItem>, SourceError> {
    let value: Value = serde_json::from_str(body)?;
    check_notice(&value)?;

    let res: NewsSentimentResponse = serde_json::from_value(value)?;

    Ok(res
        .feed
        .into_iter()
        .filter(|a| is_usable_headline(&a.title))
        .map(|a| {
            let published = NaiveDateTime::parse_from_str(&a.time_published, "%Y%m%dT%H%M%S")
                .map(|t| t.and_utc())
                .unwrap_or_else(|_| Utc::now());

            let ticker = a
                .ticker_sentiment
                .iter()
                .find(|t| t.ticker.eq_ignore_ascii_case(symbol));

            let (label, score) = match ticker {
                Some(t) => (
                    Some(t.ticker_sentiment_label.as_str()),
                    t.ticker_sentiment_score.trim().parse::<f64>().ok(),
                ),
                None => (
                    a.overall_sentiment_label.as_deref(),
                    a.overall_sentiment_score,
                ),
            };

            NewsItem::scored(
                &a.title,
                &a.summary,
                &a.url,
                if a.source.is_empty() {
                    "Alpha Vantage"
                } else {
                    a.source.as_str()
                },
                NAME,
                published,
            )
            .with_upstream_sentiment(label, score)
        })
        .collect())
}

//
// Match Alpha Vantage JSON
// https://www.alphavantage.co/documentation/
//
#[derive(Debug, Deserialize)]
struct GlobalQuoteResponse {
    #[serde(rename = "Global Quote", default)]
    global_quote: HashMap<String, String>,
}

#[derive(Debug, Deserialize)]
struct NewsSentimentResponse {
    #[serde(default)]
    feed: Vec<FeedArticle>,
}

#[derive(Debug, Deserialize)]
struct FeedArticle {
    #[serde(default)]
    title: String,
    #[serde(default)]
    url: String,
    #[serde(default)]
    time_published: String,
    #[serde(default)]
    summary: String,
    #[serde(default)]
    source: String,
    overall_sentiment_score: Option<f64>,
    overall_sentiment_label: Option<String>,
    #[serde(default)]
    ticker_sentiment: Vec<TickerSentiment>,
}

#[derive(Debug, Deserialize)]
struct TickerSentiment {
    ticker: String,
    #[serde(default)]
    ticker_sentiment_score: String,
    #[serde(default)]
    ticker_sentiment_label: String,
}
