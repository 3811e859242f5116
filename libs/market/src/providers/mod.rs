mod alpha_vantage;
mod finnhub;
mod newsapi;
mod yahoo;

use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use reqwest::{
    Client, RequestBuilder,
    header::{ACCEPT, HeaderMap, HeaderValue, RETRY_AFTER, USER_AGENT},
};

use crate::{NewsItem, Quote, SourceError};

pub use alpha_vantage::AlphaVantageClient;
pub use finnhub::FinnhubClient;
pub use newsapi::NewsApiClient;
pub use yahoo::YahooClient;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// One upstream API that can answer for a symbol.
#[async_trait]
pub trait Source<T>: Send + Sync {
    fn name(&self) -> &'static str;

    /// False when the source needs a key that was not configured.
    fn is_enabled(&self) -> bool {
        true
    }

    async fn fetch(&self, symbol: &str) -> Result<T, SourceError>;
}

pub type QuoteSource = dyn Source<Quote>;
pub type NewsSource = dyn Source<Vec<NewsItem>>;

/// Optional keys for the premium sources. A missing key disables that source.
#[derive(Debug, Clone, Default)]
pub struct ApiKeys {
    pub newsapi: Option<String>,
    pub finnhub: Option<String>,
    pub alpha_vantage: Option<String>,
}

pub fn http_client() -> Result<Client> {
    let mut headers = HeaderMap::new();
    headers.insert(
        USER_AGENT,
        HeaderValue::from_static(
            "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0 Safari/537.36",
        ),
    );
    headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

    let client = Client::builder()
        .default_headers(headers)
        .timeout(REQUEST_TIMEOUT)
        .build()?;

    Ok(client)
}

/// Quote sources in fallback order: Yahoo Finance, then Alpha Vantage.
pub fn quote_sources(client: &Client, keys: &ApiKeys) -> Vec<Box<QuoteSource>> {
    vec![
        Box::new(YahooClient::new(client.clone())),
        Box::new(AlphaVantageClient::new(
            client.clone(),
            keys.alpha_vantage.clone(),
        )),
    ]
}

/// News sources in fallback order: Yahoo Finance, NewsAPI, Finnhub, Alpha Vantage.
pub fn news_sources(client: &Client, keys: &ApiKeys, limit: usize) -> Vec<Box<NewsSource>> {
    vec![
        Box::new(YahooClient::new(client.clone()).with_news_limit(limit)),
        Box::new(NewsApiClient::new(client.clone(), keys.newsapi.clone()).with_limit(limit)),
        Box::new(FinnhubClient::new(client.clone(), keys.finnhub.clone()).with_limit(limit)),
        Box::new(
            AlphaVantageClient::new(client.clone(), keys.alpha_vantage.clone())
                .with_news_limit(limit),
        ),
    ]
}

/// Send the request and hand back the body of a successful response.
pub(crate) async fn fetch_body(req: RequestBuilder) -> Result<String, SourceError> {
    let res = req.send().await?;
    let status = res.status();

    if !status.is_success() {
        let retry_after = res
            .headers()
            .get(RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse::<u64>().ok())
            .map(Duration::from_secs);
        return Err(SourceError::from_status(status, retry_after));
    }

    Ok(res.text().await?)
}

fn require_key(key: &Option<String>) -> Result<&str, SourceError> {
    key.as_deref()
        .filter(|k| !k.is_empty())
        .ok_or(SourceError::Disabled)
}

#[cfg(test)]
mod tests {
    use std::{
        collections::HashMap,
        sync::{
            Arc,
            atomic::{AtomicUsize, Ordering},
        },
    };

    use axum::{
        Json, Router,
        extract::Query,
        http::StatusCode,
        response::{IntoResponse, Response},
        routing::get,
    };
    use serde_json::json;
    use tokio::net::TcpListener;

    use super::*;
    use crate::FallbackChain;

    type Params = Query<HashMap<String, String>>;

    async fn serve(app: Router) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{addr}")
    }

    fn param<'a>(q: &'a HashMap<String, String>, name: &str) -> &'a str {
        q.get(name).map(String::as_str).unwrap_or_default()
    }

    async fn everything(headers: HeaderMap, Query(q): Params) -> Response {
        let key = headers.get("x-api-key").and_then(|v| v.to_str().ok());
        if key != Some("news-key") || param(&q, "q") != "TSLA OR Tesla" || param(&q, "pageSize") != "2" {
            return (StatusCode::UNAUTHORIZED, "bad request").into_response();
        }

        Json(json!({
            "status": "ok",
            "articles": [{
                "source": {"name": "Reuters"},
                "title": "Tesla deliveries beat estimates",
                "description": "Strong quarter for Tesla.",
                "url": "https://example.com/t",
                "publishedAt": "2024-03-01T14:30:00Z"
            }]
        }))
        .into_response()
    }

    async fn alpha_query(Query(q): Params) -> Response {
        if param(&q, "apikey") != "av-key" {
            return (StatusCode::UNAUTHORIZED, "no key").into_response();
        }

        match param(&q, "function") {
            "GLOBAL_QUOTE" => (StatusCode::SERVICE_UNAVAILABLE, "maintenance").into_response(),
            "NEWS_SENTIMENT" if param(&q, "time_from").len() == 13 && param(&q, "tickers") == "NVDA" => {
                Json(json!({
                    "feed": [{
                        "title": "Nvidia tops forecasts",
                        "url": "https://example.com/n",
                        "time_published": "20240105T143000",
                        "summary": "",
                        "source": "Benzinga",
                        "ticker_sentiment": [{
                            "ticker": "NVDA",
                            "ticker_sentiment_score": "0.41",
                            "ticker_sentiment_label": "Bullish"
                        }]
                    }]
                }))
                .into_response()
            }
            _ => (StatusCode::BAD_REQUEST, "unexpected query").into_response(),
        }
    }

    #[test]
    fn missing_keys_disable_premium_sources() {
        let client = Client::new();
        let keys = ApiKeys {
            finnhub: Some("abc".into()),
            ..Default::default()
        };

        let enabled: Vec<&str> = news_sources(&client, &keys, 5)
            .iter()
            .filter(|s| s.is_enabled())
            .map(|s| s.name())
            .collect();

        assert_eq!(enabled, vec!["yahoo_finance", "finnhub"]);
    }

    #[test]
    fn news_sources_keep_priority_order() {
        let client = Client::new();
        let names: Vec<&str> = news_sources(&client, &ApiKeys::default(), 5)
            .iter()
            .map(|s| s.name())
            .collect();

        assert_eq!(
            names,
            vec!["yahoo_finance", "newsapi", "finnhub", "alpha_vantage"]
        );
    }

    #[test]
    fn empty_key_counts_as_missing() {
        assert!(matches!(
            require_key(&Some(String::new())),
            Err(SourceError::Disabled)
        ));
        assert_eq!(require_key(&Some("k".into())).ok(), Some("k"));
    }

    #[tokio::test]
    async fn newsapi_sends_key_header() {
        let base = serve(Router::new().route("/v2/everything", get(everything))).await;

        let items = NewsApiClient::new(http_client().unwrap(), Some("news-key".into()))
            .with_base_api(&base)
            .with_limit(2)
            .fetch("TSLA")
            .await
            .unwrap();

        assert_eq!(items.len(), 1);
        assert_eq!(items[0].source, "Reuters");

        let err = NewsApiClient::new(http_client().unwrap(), Some("wrong".into()))
            .with_base_api(&base)
            .with_limit(2)
            .fetch("TSLA")
            .await
            .unwrap_err();
        assert!(matches!(err, SourceError::Unavailable(msg) if msg.contains("401")));
    }

    #[tokio::test]
    async fn too_many_requests_honours_retry_after() {
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&hits);
        let app = Router::new()
            .route(
                "/api/v1/company-news",
                get(move |Query(q): Params| {
                    let counter = Arc::clone(&counter);
                    async move {
                        counter.fetch_add(1, Ordering::SeqCst);
                        if param(&q, "token") != "fin-key" || param(&q, "from").is_empty() {
                            return (StatusCode::UNAUTHORIZED, "no token").into_response();
                        }
                        (StatusCode::TOO_MANY_REQUESTS, [(RETRY_AFTER, "30")], "slow down")
                            .into_response()
                    }
                }),
            )
            .route("/v2/everything", get(everything));
        let base = serve(app).await;
        let client = http_client().unwrap();

        let finnhub = FinnhubClient::new(client.clone(), Some("fin-key".into())).with_base_api(&base);
        let err = finnhub.fetch("TSLA").await.unwrap_err();
        assert!(matches!(
            err,
            SourceError::RateLimited { retry_after: Some(d) } if d == Duration::from_secs(30)
        ));
        assert_eq!(hits.load(Ordering::SeqCst), 1);

        let sources: Vec<Box<NewsSource>> = vec![
            Box::new(finnhub),
            Box::new(
                NewsApiClient::new(client, Some("news-key".into()))
                    .with_base_api(&base)
                    .with_limit(2),
            ),
        ];
        let chain = FallbackChain::new(sources);

        assert_eq!(chain.fetch("TSLA").await.unwrap().source, "newsapi");
        assert_eq!(hits.load(Ordering::SeqCst), 2);

        // Finnhub is cooling down now and is not called again.
        assert_eq!(chain.fetch("TSLA").await.unwrap().source, "newsapi");
        assert_eq!(hits.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn server_errors_are_unavailable() {
        let base = serve(Router::new().route("/query", get(alpha_query))).await;
        let av = AlphaVantageClient::new(http_client().unwrap(), Some("av-key".into()))
            .with_base_api(&base);

        let err = Source::<Quote>::fetch(&av, "NVDA").await.unwrap_err();
        assert!(matches!(err, SourceError::Unavailable(msg) if msg.contains("503")));
    }

    #[tokio::test]
    async fn alpha_vantage_news_sends_key_and_window() {
        let base = serve(Router::new().route("/query", get(alpha_query))).await;
        let av = AlphaVantageClient::new(http_client().unwrap(), Some("av-key".into()))
            .with_base_api(&base);

        let items = Source::<Vec<NewsItem>>::fetch(&av, "NVDA").await.unwrap();

        assert_eq!(items.len(), 1);
        assert_eq!(items[0].score, 0.41);
        assert_eq!(items[0].source, "Benzinga");
    }

    #[tokio::test]
    async fn connection_refused_is_unavailable() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let yahoo = YahooClient::new(http_client().unwrap()).with_base_api(format!("http://{addr}"));
        let err = Source::<Quote>::fetch(&yahoo, "TSLA").await.unwrap_err();

        assert!(matches!(err, SourceError::Unavailable(_)));
    }
}
