use std::time::Duration;

use reqwest::StatusCode;

/// Why a single upstream call produced nothing usable.
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("no API key configured")]
    Disabled,

    #[error("rate limited{}", retry_hint(.retry_after))]
    RateLimited { retry_after: Option<Duration> },

    #[error("symbol not found")]
    NotFound,

    #[error("unavailable: {0}")]
    Unavailable(String),

    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

fn retry_hint(retry_after: &Option<Duration>) -> String {
    match retry_after {
        Some(d) => format!(" (retry after {}s)", d.as_secs()),
        None => String::new(),
    }
}

impl SourceError {
    /// Classify a non-success HTTP status.
    pub fn from_status(status: StatusCode, retry_after: Option<Duration>) -> Self {
        match status {
            StatusCode::TOO_MANY_REQUESTS => SourceError::RateLimited { retry_after },
            StatusCode::NOT_FOUND => SourceError::NotFound,
            other => SourceError::Unavailable(format!("HTTP {other}")),
        }
    }

    pub fn is_rate_limited(&self) -> bool {
        matches!(self, SourceError::RateLimited { .. })
    }
}

impl From<reqwest::Error> for SourceError {
    fn from(err: reqwest::Error) -> Self {
        if let Some(status) = err.status() {
            return SourceError::from_status(status, None);
        }
        if err.is_decode() {
            SourceError::InvalidResponse(err.to_string())
        } else {
            SourceError::Unavailable(err.to_string())
        }
    }
}

impl From<serde_json::Error> for SourceError {
    fn from(err: serde_json::Error) -> Self {
        SourceError::InvalidResponse(err.to_string())
    }
}

/// Every source in a fallback chain came back empty-handed.
#[derive(Debug, thiserror::Error)]
pub enum ChainError {
    #[error("no sources enabled")]
    NoSources,

    #[error("all sources failed: {}", describe(.0))]
    Exhausted(Vec<(&'static str, SourceError)>),
}

fn describe(attempts: &[(&'static str, SourceError)]) -> String {
    attempts
        .iter()
        .map(|(source, err)| format!("{source}: {err}"))
        .collect::<Vec<_>>()
        .join("; ")
}
