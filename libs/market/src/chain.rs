use std::{collections::HashMap, sync::Mutex, time::Duration};

use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::{ChainError, NewsItem, Quote, SourceError, providers::Source};

const DEFAULT_COOLDOWN: Duration = Duration::from_secs(60);

/// Whether a successful answer actually carries anything worth showing.
pub trait Payload {
    fn has_content(&self) -> bool;
}

impl Payload for Quote {
    fn has_content(&self) -> bool {
        self.price > 0.0
    }
}

impl Payload for Vec<NewsItem> {
    fn has_content(&self) -> bool {
        !self.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Fetched<T> {
    pub source: &'static str,
    pub payload: T,
}

/// Sources in fixed priority order. A source that reports rate limiting is
/// skipped until its cooldown runs out.
pub struct FallbackChain<T> {
    sources: Vec<Box<dyn Source<T>>>,
    cooldowns: Mutex<HashMap<&'static str, Instant>>,
}

impl<T: Payload + Send> FallbackChain<T> {
    pub fn new(sources: Vec<Box<dyn Source<T>>>) -> Self {
        Self {
            sources,
            cooldowns: Mutex::new(HashMap::new()),
        }
    }

    /// Names of the sources that have what they need to be called.
    pub fn enabled_sources(&self) -> Vec<&'static str> {
        self.sources
            .iter()
            .filter(|s| s.is_enabled())
            .map(|s| s.name())
            .collect()
    }

    pub async fn fetch(&self, symbol: &str) -> Result<Fetched<T>, ChainError> {
        let mut attempts: Vec<(&'static str, SourceError)> = Vec::new();
        let mut empty: Option<Fetched<T>> = None;

        for source in &self.sources {
            let name = source.name();

            if !source.is_enabled() {
                continue;
            }

            if let Some(remaining) = self.cooldown_remaining(name) {
                debug!(
                    source = name,
                    remaining_secs = remaining.as_secs(),
                    "skipping source on cooldown"
                );
                attempts.push((
                    name,
                    SourceError::RateLimited {
                        retry_after: Some(remaining),
                    },
                ));
                continue;
            }

            match source.fetch(symbol).await {
                Ok(payload) if payload.has_content() => {
                    debug!(source = name, "source answered");
                    return Ok(Fetched {
                        source: name,
                        payload,
                    });
                }
                Ok(payload) => {
                    debug!(source = name, "source answered with nothing");
                    empty = Some(Fetched {
                        source: name,
                        payload,
                    });
                }
                Err(SourceError::Disabled) => {}
                Err(err) => {
                    if let SourceError::RateLimited { retry_after } = &err {
                        let wait = retry_after.unwrap_or(DEFAULT_COOLDOWN);
                        info!(
                            source = name,
                            wait_secs = wait.as_secs(),
                            "source rate limited, cooling down"
                        );
                        self.cool_down(name, wait);
                    } else {
                        warn!(source = name, error = %err, "source failed, falling back");
                    }
                    attempts.push((name, err));
                }
            }
        }

        if let Some(fetched) = empty {
            return Ok(fetched);
        }

        if attempts.is_empty() {
            Err(ChainError::NoSources)
        } else {
            Err(ChainError::Exhausted(attempts))
        }
    }

    fn cooldown_remaining(&self, name: &'static str) -> Option<Duration> {
        let mut cooldowns = self.cooldowns.lock().unwrap_or_else(|e| e.into_inner());
        let until = *cooldowns.get(name)?;
        let now = Instant::now();

        if until > now {
            Some(until - now)
        } else {
            cooldowns.remove(name);
            None
        }
    }

    fn cool_down(&self, name: &'static str, wait: Duration) {
        let mut cooldowns = self.cooldowns.lock().unwrap_or_else(|e| e.into_inner());
        cooldowns.insert(name, Instant::now() + wait);
    }
}
