use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Deserialize;

use super::{Source, fetch_body, require_key};
use crate::{NewsItem, SourceError, news::is_usable_headline, symbols};

const BASE_API: &str = "https://newsapi.org";
const NAME: &str = "newsapi";

/// NewsAPI `/v2/everything`. Free tier allows 500 requests a day.
#[derive(Clone)]
pub struct NewsApiClient {
    client: Client,
    base_api: String,
    key: Option<String>,
    limit: usize,
}

impl NewsApiClient {
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
impl Source<Vec<NewsItem>> for NewsApiClient {
    fn name(&self) -> &'static str {
        NAME
    }

    fn is_enabled(&self) -> bool {
        require_key(&self.key).is_ok()
    }

    async fn fetch(&self, symbol: &str) -> Result<Vec<NewsItem>, SourceError> {
        let key = require_key(&self.key)?;
        let page_size = self.limit.to_string();
        let query = search_query(symbol);

        let req = self
            .client
            .get(format!(
                "{}/v2/everything",
                self.base_api.trim_end_matches('/')
            ))
            .header("X-Api-Key", key)
            .query(&[
                ("q", query.as_str()),
                ("sortBy", "publishedAt"),
                ("language", "en"),
                ("pageSize", page_size.as_str()),
            ]);

        let mut items = parse_everything(&fetch_body(req).await?)?;
        items.truncate(self.limit);
        Ok(items)
    }
}

fn search_query(symbol: &str) -> String {
    match symbols::company_name(symbol) {
        Some(name) => format!("{symbol} OR {name}"),
        None => symbol.to_string(),
    }
}

pub(crate) fn parse_everything(body: &str) -> Result<Vec<NewsItem>, SourceError> {
    let res: EverythingResponse = serde_json::from_str(body)?;

    if res.status == "error" {
        return Err(match res.code.as_deref() {
            Some("rateLimited") => SourceError::RateLimited { retry_after: None },
            _ => SourceError::Unavailable(res.message.unwrap_or_else(|| "error".into())),
        });
    }

    Ok(res
        .articles
        .into_iter()
        .filter(|a| a.title.as_deref().is_some_and(is_usable_headline))
        .map(|a| {
            let published = a
                .published_at
                .as_deref()
                .and_then(|t| DateTime::parse_from_rfc3339(t).ok())
                .map(|t| t.with_timezone(&Utc))
                .unwrap_or_else(Utc::now);

            NewsItem::scored(
                a.title.as_deref().unwrap_or_default(),
                a.description.as_deref().unwrap_or_default(),
                a.url.as_deref().unwrap_or_default(),
                a.source.name.as_deref().unwrap_or("NewsAPI"),
                NAME,
                published,
            )
        })
        .collect())
}

//
// Match NewsAPI JSON
// https://newsapi.org/docs/endpoints/everything
//
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EverythingResponse {
    status: String,
    code: Option<String>,
    message: Option<String>,
    #[serde(default)]
    articles: Vec<Article>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Article {
    #[serde(default)]
    source: ArticleSource,
    title: Option<String>,
    description: Option<String>,
    url: Option<String>,
    published_at: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct ArticleSource {
    name: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Sentiment;

    #[test]
    fn query_includes_company_name() {
        assert_eq!(search_query("TSLA"), "TSLA OR Tesla");
        assert_eq!(search_query("XYZ"), "XYZ");
    }

    #[test]
    fn parses_articles_and_drops_removed() {
        let body = r#"{"status":"ok","totalResults":2,"articles":[
            {"source":{"id":"reuters","name":"Reuters"},"author":null,
             "title":"Apple shares slump after weak iPhone sales",
             "description":"Apple reported weak sales and issued a warning.",
             "url":"https://example.com/apple","publishedAt":"2024-03-01T14:30:00Z"},
            {"source":{"id":null,"name":"[Removed]"},"title":"[Removed]","description":null,
             "url":"https://removed.com","publishedAt":"1970-01-01T00:00:00Z"}
        ]}"#;

        let items = parse_everything(body).unwrap();

        assert_eq!(items.len(), 1);
        assert_eq!(items[0].source, "Reuters");
        assert_eq!(items[0].sentiment, Sentiment::Negative);
        assert_eq!(
            items[0].published_at.to_rfc3339(),
            "2024-03-01T14:30:00+00:00"
        );
    }

    #[test]
    fn rate_limited_body() {
        let body = r#"{"status":"error","code":"rateLimited",
            "message":"You have made too many requests recently."}"#;

        assert!(parse_everything(body).unwrap_err().is_rate_limited());
    }

    #[test]
    fn other_errors_are_unavailable() {
        let body = r#"{"status":"error","code":"apiKeyInvalid","message":"Your API key is invalid."}"#;

        assert!(matches!(
            parse_everything(body),
            Err(SourceError::Unavailable(msg)) if msg.contains("invalid")
        ));
    }
}
