mod cache;
mod chain;
mod error;
mod news;
mod poller;
mod quote;

pub mod analysis;
pub mod providers;
pub mod sentiment;
pub mod symbols;

pub use cache::{Health, MarketCache, NewsSnapshot};
pub use chain::{FallbackChain, Fetched, Payload};
pub use error::{ChainError, SourceError};
pub use news::{NewsItem, Sentiment};
pub use poller::{PollIntervals, Poller, RoundStats};
pub use quote::Quote;
