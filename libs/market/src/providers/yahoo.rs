use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Deserialize;

use super::{Source, fetch_body};
use crate::{NewsItem, Quote, SourceError, news::is_usable_headline};

const BASE_API: &str = "https://query1.finance.yahoo.com";
const NAME: &str = "yahoo_finance";

/// Yahoo Finance needs no key, so it is always enabled and sits first in both chains.
#[derive(Clone)]
pub struct YahooClient {
    client: Client,
    base_api: String,
    news_limit: usize,
}

impl YahooClient {
    pub fn new(client: Client) -> Self {
        Self {
            client,
            base_api: BASE_API.to_string(),
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

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_api.trim_end_matches('/'), path)
    }
}

#[async_trait]
impl Source<Quote> for YahooClient {
    fn name(&self) -> &'static str {
        NAME
    }

    async fn fetch(&self, symbol: &str) -> Result<Quote, SourceError> {
        let req = self
            .client
            .get(self.url(&format!("/v8/finance/chart/{symbol}")))
            .query(&[("range", "1d"), ("interval", "5m")]);

        parse_chart(symbol, &fetch_body(req).await?)
    }
}

#[async_trait]
impl Source<Vec<NewsItem>> for YahooClient {
    fn name(&self) -> &'static str {
        NAME
    }

    async fn fetch(&self, symbol: &str) -> Result<Vec<NewsItem>, SourceError> {
        let count = self.news_limit.to_string();
        let req = self.client.get(self.url("/v1/finance/search")).query(&[
            ("q", symbol),
            ("quotesCount", "0"),
            ("newsCount", count.as_str()),
        ]);

        let mut items = parse_search_news(&fetch_body(req).await?)?;
        items.truncate(self.news_limit);
        Ok(items)
    }
}

pub(crate) fn parse_chart(symbol: &str, body: &str) -> Result<Quote, SourceError> {
    let res: ChartResponse = serde_json::from_str(body)?;

    if let Some(err) = res.chart.error {
        return Err(if err.code.eq_ignore_ascii_case("not found") {
            SourceError::NotFound
        } else {
            SourceError::Unavailable(format!("{}: {}", err.code, err.description))
        });
    }

    let meta = res
        .chart
        .result
        .and_then(|r| r.into_iter().next())
        .map(|r| r.meta)
        .ok_or(SourceError::NotFound)?;

    let price = meta
        .regular_market_price
        .ok_or_else(|| SourceError::InvalidResponse("missing regularMarketPrice".into()))?;
    let previous_close = meta
        .chart_previous_close
        .or(meta.previous_close)
        .unwrap_or(price);
    let timestamp = meta
        .regular_market_time
        .and_then(|t| DateTime::from_timestamp(t, 0))
        .unwrap_or_else(Utc::now);

    Ok(Quote::from_previous_close(
        symbol,
        price,
        previous_close,
        meta.regular_market_volume.unwrap_or(0),
        timestamp,
        NAME,
    ))
}

pub(crate) fn parse_search_news(body: &str) -> Result<Vec<NewsItem>, SourceError> {
    let res: SearchResponse = serde_json::from_str(body)?;

    Ok(res
        .news
        .into_iter()
        .filter(|a| is_usable_headline(&a.title))
        .map(|a| {
            let published = DateTime::from_timestamp(a.provider_publish_time, 0)
                .unwrap_or_else(Utc::now);
            NewsItem::scored(
                &a.title,
                a.summary.as_deref().unwrap_or(""),
                &a.link,
                a.publisher.as_deref().unwrap_or("Yahoo Finance"),
                NAME,
                published,
            )
        })
        .collect())
}

//
// Match Yahoo Finance JSON
// https://query1.finance.yahoo.com/v8/finance/chart/{symbol}
//
#[derive(Debug, Deserialize)]
struct ChartResponse {
    chart: Chart,
}

#[derive(Debug, Deserialize)]
struct Chart {
    result: Option<Vec<ChartResult>>,
    error: Option<ChartError>,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    meta: ChartMeta,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChartMeta {
    regular_market_price: Option<f64>,
    chart_previous_close: Option<f64>,
    previous_close: Option<f64>,
    regular_market_volume: Option<u64>,
    regular_market_time: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct ChartError {
    code: String,
    #[serde(default)]
    description: String,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    news: Vec<SearchArticle>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchArticle {
    #[serde(default)]
    title: String,
    publisher: Option<String>,
    #[serde(default)]
    link: String,
    summary: Option<String>,
    #[serde(default)]
    provider_publish_time: i64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Sentiment;

    #[test]
    fn parses_chart_meta() {
        let body = r#"{"chart":{"result":[{"meta":{"currency":"USD","symbol":"TSLA",
            "regularMarketPrice":250.0,"chartPreviousClose":200.0,
            "regularMarketVolume":98765432,"regularMarketTime":1700000000}}],"error":null}}"#;

        let q = parse_chart("tsla", body).unwrap();

        assert_eq!(q.symbol, "TSLA");
        assert_eq!(q.price, 250.0);
        assert_eq!(q.change, 50.0);
        assert_eq!(q.change_percent, 25.0);
        assert_eq!(q.volume, 98_765_432);
        assert_eq!(q.timestamp.timestamp(), 1_700_000_000);
        assert_eq!(q.source, "yahoo_finance");
    }

    #[test]
    fn chart_error_not_found() {
        let body = r#"{"chart":{"result":null,"error":{"code":"Not Found",
            "description":"No data found, symbol may be delisted"}}}"#;

        assert!(matches!(
            parse_chart("ZZZZ", body),
            Err(SourceError::NotFound)
        ));
    }

    #[test]
    fn chart_without_price_is_invalid() {
        let body = r#"{"chart":{"result":[{"meta":{"symbol":"TSLA"}}],"error":null}}"#;
        assert!(matches!(
            parse_chart("TSLA", body),
            Err(SourceError::InvalidResponse(_))
        ));
    }

    #[test]
    fn parses_search_news() {
        let body = r#"{"quotes":[],"news":[
            {"uuid":"a","title":"Tesla stock soars on record deliveries","publisher":"Reuters",
             "link":"https://example.com/a","providerPublishTime":1700000000,"type":"STORY"},
            {"uuid":"b","title":"","publisher":"Reuters","link":"","providerPublishTime":1700000001}
        ]}"#;

        let items = parse_search_news(body).unwrap();

        assert_eq!(items.len(), 1);
        assert_eq!(items[0].source, "Reuters");
        assert_eq!(items[0].provider, "yahoo_finance");
        assert_eq!(items[0].sentiment, Sentiment::Positive);
        assert_eq!(items[0].published_at.timestamp(), 1_700_000_000);
    }

    #[test]
    fn base_api_trailing_slash_is_ignored() {
        let client = YahooClient::new(Client::new()).with_base_api("http://127.0.0.1:9/");
        assert_eq!(
            client.url("/v8/finance/chart/TSLA"),
            "http://127.0.0.1:9/v8/finance/chart/TSLA"
        );
    }

    #[test]
    fn search_without_news_is_empty() {
        assert!(parse_search_news(r#"{"quotes":[]}"#).unwrap().is_empty());
    }
}
