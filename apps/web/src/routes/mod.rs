//! Route handlers.
//!
//! - [`pages`]: the HTML front page
//! - [`analyze`]: free-text questions about a symbol
//! - [`api`]: cached quotes, news and upstream status as JSON
//! - [`health`]: liveness probe

pub mod analyze;
pub mod api;
pub mod health;
pub mod pages;
