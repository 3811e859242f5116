//! Turns a cached quote and news snapshot into the answer shown for a question
//! like "Why is TSLA moving today?".

use chrono::{DateTime, Utc};
use chrono_tz::America::New_York;
use serde::Serialize;

use crate::{NewsItem, NewsSnapshot, Quote, symbols};

const SHOWN_NEWS: usize = 3;
const HIGH_VOLUME: u64 = 1_000_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ApiStatus {
    Healthy,
    Degraded,
    /// No live quote is available for the symbol.
    Limited,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewsView {
    pub title: String,
    pub summary: String,
    pub sentiment: &'static str,
    pub url: String,
    pub source: String,
}

impl From<&NewsItem> for NewsView {
    fn from(item: &NewsItem) -> Self {
        Self {
            title: item.headline.clone(),
            summary: item.summary.clone(),
            sentiment: item.sentiment.as_str(),
            url: item.url.clone(),
            source: item.source.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Analysis {
    pub symbol: String,
    pub question: String,
    pub current_price: String,
    pub change: String,
    pub change_percent: String,
    pub volume: String,
    pub timestamp: String,
    pub movement: Option<&'static str>,
    pub analysis: String,
    pub news_items: Vec<NewsView>,
    pub news_provider: Option<&'static str>,
    pub api_status: ApiStatus,
}

/// Find the first watched ticker, or a known company name for one, in free text.
pub fn detect_symbol(question: &str, watchlist: &[String]) -> Option<String> {
    let words: Vec<&str> = question
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .collect();

    let watched = |sym: &str| watchlist.iter().any(|w| w == sym);

    words
        .iter()
        .map(|w| w.to_uppercase())
        .find(|w| watched(w.as_str()))
        .or_else(|| {
            words
                .iter()
                .filter_map(|w| symbols::ticker_for_alias(w))
                .find(|t| watched(*t))
                .map(str::to_string)
        })
}

pub fn movement(change_percent: f64) -> &'static str {
    if change_percent.abs() < 1.0 {
        "relatively stable"
    } else if change_percent > 3.0 {
        "surging significantly"
    } else if change_percent > 1.0 {
        "rising"
    } else if change_percent < -3.0 {
        "dropping significantly"
    } else if change_percent < -1.0 {
        "declining"
    } else {
        "moving"
    }
}

pub fn average_sentiment(items: &[NewsItem]) -> f64 {
    if items.is_empty() {
        return 0.0;
    }
    items.iter().map(|i| i.score).sum::<f64>() / items.len() as f64
}

/// 1234567 -> "1,234,567"
pub fn group_thousands(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);

    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

fn market_time(ts: DateTime<Utc>) -> String {
    ts.with_timezone(&New_York)
        .format("%Y-%m-%d %H:%M:%S %Z")
        .to_string()
}

pub fn analyze(
    symbol: &str,
    question: &str,
    quote: Option<&Quote>,
    news: Option<&NewsSnapshot>,
    api_healthy: bool,
    now: DateTime<Utc>,
) -> Analysis {
    let items: &[NewsItem] = news.map(|n| n.items.as_slice()).unwrap_or_default();
    let news_items: Vec<NewsView> = items.iter().take(SHOWN_NEWS).map(NewsView::from).collect();
    let news_provider = news.map(|n| n.provider);

    let Some(q) = quote else {
        return Analysis {
            symbol: symbol.to_string(),
            question: question.to_string(),
            current_price: "Unavailable".into(),
            change: "N/A".into(),
            change_percent: "N/A".into(),
            volume: "N/A".into(),
            timestamp: market_time(now),
            movement: None,
            analysis: fallback_narrative(symbol),
            news_items,
            news_provider,
            api_status: ApiStatus::Limited,
        };
    };

    Analysis {
        symbol: symbol.to_string(),
        question: question.to_string(),
        current_price: format!("${:.2}", q.price),
        change: format!("{}${:.2}", if q.change < 0.0 { "-" } else { "+" }, q.change.abs()),
        change_percent: format!("{:+.2}%", q.change_percent),
        volume: group_thousands(q.volume),
        timestamp: market_time(q.timestamp),
        movement: Some(movement(q.change_percent)),
        analysis: narrative(q, items),
        news_items,
        news_provider,
        api_status: if api_healthy {
            ApiStatus::Healthy
        } else {
            ApiStatus::Degraded
        },
    }
}

fn narrative(q: &Quote, items: &[NewsItem]) -> String {
    let avg = average_sentiment(items);
    let pct = q.change_percent;

    let tone = if items.is_empty() {
        "no recent news"
    } else if avg > 0.2 {
        "positive news sentiment"
    } else if avg < -0.2 {
        "negative news sentiment"
    } else {
        "mixed news sentiment"
    };
    let effect = if avg > 0.0 {
        "supporting"
    } else if avg < 0.0 {
        "pressuring"
    } else {
        "having mixed effects on"
    };
    let outlook = if avg > 0.3 {
        "bullish"
    } else if avg < -0.3 {
        "bearish"
    } else {
        "neutral"
    };
    let volume_level = if q.volume > HIGH_VOLUME { "above" } else { "below" };
    let strength = if pct.abs() > 2.0 { "Strong" } else { "Moderate" };
    let interest = if pct.abs() > 3.0 {
        "significant market interest"
    } else {
        "normal trading activity"
    };
    let near_term = if pct.abs() > 2.0 {
        "continued momentum"
    } else {
        "stabilization"
    };

    let news_line = if items.is_empty() {
        "News Impact: No recent headlines were found, so the move is likely driven by broader market flows.".to_string()
    } else {
        format!(
            "News Impact: Current {tone} is {effect} the stock price. Recent headlines suggest {outlook} market sentiment."
        )
    };

    [
        format!(
            "As of {}, {} is {} at ${:.2} ({:+.2}%).",
            market_time(q.timestamp),
            q.symbol,
            movement(pct),
            q.price,
            pct
        ),
        format!(
            "Price Action: The stock has moved {:+.2}% with {} shares traded, {} the 1,000,000 share mark.",
            pct,
            group_thousands(q.volume),
            volume_level
        ),
        news_line,
        format!("Market Context: {strength} price movement indicates {interest}."),
        format!(
            "Outlook: The data suggests {near_term} in the near term, though market conditions can change rapidly."
        ),
    ]
    .join("\n\n")
}

fn fallback_narrative(symbol: &str) -> String {
    let context = symbols::company_context(symbol)
        .map(str::to_string)
        .unwrap_or_else(|| {
            format!("{symbol} is an actively traded stock that responds to market sentiment and company-specific news.")
        });

    [
        "Live price data is currently unavailable for this symbol.".to_string(),
        format!("About {symbol}: {context}"),
        "What to watch: earnings reports and guidance updates, industry and regulatory news, broader market sentiment, and analyst rating changes.".to_string(),
        "Prices refresh every few seconds; check back shortly for live data.".to_string(),
    ]
    .join("\n\n")
}
