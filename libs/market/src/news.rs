use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::sentiment;

const SUMMARY_CHARS: usize = 200;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Sentiment {
    Positive,
    Neutral,
    Negative,
}

impl Sentiment {
    pub fn from_score(score: f64) -> Self {
        if score > 0.2 {
            Sentiment::Positive
        } else if score < -0.2 {
            Sentiment::Negative
        } else {
            Sentiment::Neutral
        }
    }

    /// Map an upstream label such as Alpha Vantage's `Somewhat-Bullish`.
    pub fn from_label(label: &str) -> Option<Self> {
        let label = label.to_ascii_lowercase();
        if label.contains("bullish") || label == "positive" {
            Some(Sentiment::Positive)
        } else if label.contains("bearish") || label == "negative" {
            Some(Sentiment::Negative)
        } else if label == "neutral" {
            Some(Sentiment::Neutral)
        } else {
            None
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Sentiment::Positive => "Positive",
            Sentiment::Neutral => "Neutral",
            Sentiment::Negative => "Negative",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewsItem {
    pub headline: String,
    pub summary: String,
    pub url: String,
    /// Publisher, e.g. "Reuters".
    pub source: String,
    /// Upstream API the item came through.
    pub provider: &'static str,
    pub sentiment: Sentiment,
    pub score: f64,
    pub published_at: DateTime<Utc>,
}

impl NewsItem {
    /// Item scored with the keyword heuristic over `summary`, or the headline when there is none.
    pub fn scored(
        headline: &str,
        summary: &str,
        url: &str,
        source: &str,
        provider: &'static str,
        published_at: DateTime<Utc>,
    ) -> Self {
        let text = if summary.trim().is_empty() {
            headline
        } else {
            summary
        };
        let score = sentiment::score(text);

        Self {
            headline: headline.trim().to_string(),
            summary: summarize(text),
            url: url.to_string(),
            source: source.to_string(),
            provider,
            sentiment: Sentiment::from_score(score),
            score,
            published_at,
        }
    }

    /// Replace the heuristic result with one supplied by the upstream.
    pub fn with_upstream_sentiment(mut self, label: Option<&str>, score: Option<f64>) -> Self {
        if let Some(score) = score {
            self.score = score;
            self.sentiment = Sentiment::from_score(score);
        }
        if let Some(sentiment) = label.and_then(Sentiment::from_label) {
            self.sentiment = sentiment;
        }
        self
    }
}

/// Headlines NewsAPI blanks out for removed articles are not worth showing.
pub fn is_usable_headline(headline: &str) -> bool {
    let h = headline.trim();
    !h.is_empty() && h != "[Removed]"
}

pub fn summarize(text: &str) -> String {
    let text = text.trim();
    match text.char_indices().nth(SUMMARY_CHARS) {
        Some((idx, _)) => format!("{}...", text[..idx].trim_end()),
        None => text.to_string(),
    }
}
