//! feedwatch — concurrent feed and repository aggregation.
//!
//! ## Architecture overview
//!
//! ```text
//!  ┌────────────┐ fetch(cap) ┌──────────────┐  store   ┌──────────────┐
//!  │ source/    │ ◄───────── │ aggregator   │ ───────► │  Snapshot    │
//!  │ (per feed) │            │ (fan-out /   │ (atomic) │ (immutable)  │
//!  └────────────┘            │   fan-in)    │          └──────┬───────┘
//!  ┌────────────┐  fetch()   │              │                 │ rank / search
//!  │ repo/      │ ◄───────── │              │          ┌──────▼───────┐
//!  └────────────┘            └──────────────┘          │  search      │
//!                                                      └──────────────┘
//! ```
//!
//! * **`source/`** — the `FeedClient` trait and the RSS/Atom HTTP client.
//! * **`repo/`** — the `RepositoryClient` trait and the GitHub listing client.
//! * **`aggregator`** — drives one refresh cycle with per-fetch timeouts and
//!   per-source failure isolation, then publishes a new snapshot.
//! * **`search`** — ranking and case-insensitive name search over a snapshot.
//! * **`config`** — layered configuration (file, env) and validation.
//! * **`error`** — typed failures for each component.

pub mod aggregator;
pub mod config;
pub mod error;
pub mod repo;
pub mod search;
pub mod source;

pub use aggregator::{AggregatedFeedResult, Aggregator, FeedWarning, RefreshReport, Snapshot};
pub use self::config::{AggregatorConfig, AppConfig};
pub use error::{ConfigError, FeedError, RepositoryError};
pub use repo::{GitHubRepos, Repository, RepositoryClient};
pub use search::SearchQuery;
pub use source::{FeedClient, FeedItem, FeedSource, RssSource};

/// `User-Agent` sent with every request.
pub const USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

/// Shared HTTP client for all sources.
///
/// Carries no timeout of its own; the aggregator bounds each fetch.
pub fn http_client() -> Result<reqwest::Client, reqwest::Error> {
    reqwest::Client::builder().user_agent(USER_AGENT).build()
}
