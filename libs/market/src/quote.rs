use chrono::{DateTime, Utc};
use serde::Serialize;

/// Latest traded price for one symbol, as reported by whichever quote source answered.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Quote {
    pub symbol: String,
    pub price: f64,
    pub change: f64,
    pub change_percent: f64,
    pub volume: u64,
    pub timestamp: DateTime<Utc>,
    pub source: &'static str,
}

impl Quote {
    /// Build a quote when the upstream only reports the previous close.
    pub fn from_previous_close(
        symbol: &str,
        price: f64,
        previous_close: f64,
        volume: u64,
        timestamp: DateTime<Utc>,
        source: &'static str,
    ) -> Self {
        let change = price - previous_close;

        Self {
            symbol: symbol.to_uppercase(),
            price,
            change,
            change_percent: percent_change(change, previous_close),
            volume,
            timestamp,
            source,
        }
    }
}

/// `change` as a percentage of `base`; zero when there is no usable base.
pub fn percent_change(change: f64, base: f64) -> f64 {
    if base > 0.0 {
        change / base * 100.0
    } else {
        0.0
    }
}
