use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use reqwest::Client;
use serde::Deserialize;

use super::{Source, fetch_body, require_key};
use crate::{NewsItem, SourceError, news::is_usable_headline};

const BASE_API: &str = "https://finnhub.io";
const NAME: &str = "finnhub";
const LOOKBACK_DAYS: i64 = 7;

/// Finnhub company news. Free tier allows 60 calls a minute.
#[derive(Clone)]
pub struct FinnhubClient {
    client: Client,
    base_api: String,
    key: Option<String>,
    limit: usize,
}

impl FinnhubClient {
    pub fn new(client: Client, key: Option<String>) -> Self {
        Self {
            client,
            base_api: BASE_API.to_string(),
            key,
            limit: 5,
        }
    }

    pub fn with_base_api(mut self, base_api: impl Into<String>) -> Self {
        self.base_api = base_api.into();
        self
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }
}

#[async_trait]
impl Source<Vec<NewsItem>> for FinnhubClient {
    fn name(&self) -> &'static str {
        NAME
    }

    fn is_enabled(&self) -> bool {
        require_key(&self.key).is_ok()
    }

    async fn fetch(&self, symbol: &str) -> Result<Vec<NewsItem>, SourceError> {
        let key = require_key(&self.key)?;
        let to = Utc::now().date_naive();
        let from = to - Duration::days(LOOKBACK_DAYS);
        let (from, to) = (from.to_string(), to.to_string());

        let req = self
            .client
            .get(format!(
                "{}/api/v1/company-news",
                self.base_api.trim_end_matches('/')
            ))
            .query(&[
                ("symbol", symbol),
                ("from", from.as_str()),
                ("to", to.as_str()),
                ("token", key),
            ]);

        let mut items = parse_company_news(&fetch_body(req).await?)?;
        items.truncate(self.limit);
        Ok(items)
    }
}

pub(crate) fn parse_company_news(body: &str) -> Result<Vec<NewsItem>, SourceError> {
    // Finnhub answers with an object instead of an array when it refuses the call.
    if let Ok(err) = serde_json::from_str::<ErrorBody>(body) {
        return Err(if err.error.to_ascii_lowercase().contains("limit") {
            SourceError::RateLimited { retry_after: None }
        } else {
            SourceError::Unavailable(err.error)
        });
    }

    let articles: Vec<Article> = serde_json::from_str(body)?;

    Ok(articles
        .into_iter()
        .filter(|a| is_usable_headline(&a.headline))
        .map(|a| {
            NewsItem::scored(
                &a.headline,
                &a.summary,
                &a.url,
                if a.source.is_empty() {
                    "Finnhub"
                } else {
                    a.source.as_str()
                },
                NAME,
                DateTime::from_timestamp(a.datetime, 0).unwrap_or_else(Utc::now),
            )
        })
        .collect())
}

//
// Match Finnhub JSON
// https://finnhub.io/docs/api/company-news
//
#[derive(Debug, Deserialize)]
struct Article {
    #[serde(default)]
    datetime: i64,
    #[serde(default)]
    headline: String,
    #[serde(default)]
    source: String,
    #[serde(default)]
    summary: String,
    #[serde(default)]
    url: String,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Sentiment;

    #[test]
    fn parses_company_news() {
        let body = r#"[
            {"category":"company","datetime":1700000000,"headline":"Microsoft wins cloud deal",
             "id":1,"image":"","related":"MSFT","source":"CNBC",
             "summary":"Microsoft wins a record cloud contract, boosting growth outlook.",
             "url":"https://example.com/msft"},
            {"category":"company","datetime":1700000100,"headline":"Microsoft to hold event",
             "id":2,"image":"","related":"MSFT","source":"",
             "summary":"","url":"https://example.com/event"}
        ]"#;

        let items = parse_company_news(body).unwrap();

        assert_eq!(items.len(), 2);
        assert_eq!(items[0].source, "CNBC");
        assert_eq!(items[0].sentiment, Sentiment::Positive);
        assert_eq!(items[1].source, "Finnhub");
        assert_eq!(items[1].summary, "Microsoft to hold event");
        assert_eq!(items[1].sentiment, Sentiment::Neutral);
    }

    #[test]
    fn limit_error_body_is_rate_limited() {
        let body = r#"{"error":"API limit reached. Please try again later."}"#;
        assert!(parse_company_news(body).unwrap_err().is_rate_limited());
    }

    #[test]
    fn other_error_body_is_unavailable() {
        let body = r#"{"error":"Invalid API key"}"#;
        assert!(matches!(
            parse_company_news(body),
            Err(SourceError::Unavailable(_))
        ));
    }

    #[test]
    fn garbage_is_invalid() {
        assert!(matches!(
            parse_company_news("<html>"),
            Err(SourceError::InvalidResponse(_))
        ));
    }
}
