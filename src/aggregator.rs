//! Fan-out/fan-in refresh cycle and the published snapshot.
//!
//! One [`Aggregator::refresh`] call issues every feed fetch and the
//! repository fetch concurrently, waits for all of them (each bounded by the
//! configured timeout), merges the outcomes and publishes a new immutable
//! [`Snapshot`] with a single atomic swap.  Readers never lock and never see
//! a half-built snapshot.
//!
//! Overlapping refreshes are independent; whichever finishes last publishes
//! last.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use arc_swap::ArcSwap;
use chrono::{DateTime, Utc};
use futures::future::join_all;
use serde::ser::{Serialize, SerializeMap, Serializer};

use crate::config::AggregatorConfig;
use crate::error::{FeedError, RepositoryError};
use crate::repo::{GitHubRepos, Repository, RepositoryClient};
use crate::search::{self, SearchQuery};
use crate::source::{FeedClient, FeedItem, RssSource};

/// Per-source item lists keyed by source name.
///
/// Every configured source has exactly one entry, in configuration order.
/// A source whose fetch failed has an empty list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AggregatedFeedResult {
    sections: Vec<(String, Vec<FeedItem>)>,
}

impl AggregatedFeedResult {
    /// Items for `source`, or `None` if no such source is configured.
    pub fn get(&self, source: &str) -> Option<&[FeedItem]> {
        self.sections
            .iter()
            .find(|(name, _)| name == source)
            .map(|(_, items)| items.as_slice())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[FeedItem])> {
        self.sections
            .iter()
            .map(|(name, items)| (name.as_str(), items.as_slice()))
    }

    pub fn source_names(&self) -> impl Iterator<Item = &str> {
        self.sections.iter().map(|(name, _)| name.as_str())
    }

    pub fn len(&self) -> usize {
        self.sections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }
}

impl Serialize for AggregatedFeedResult {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.sections.len()))?;
        for (name, items) in &self.sections {
            map.serialize_entry(name, items)?;
        }
        map.end()
    }
}

/// The read model published after each refresh.
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub feeds: Arc<AggregatedFeedResult>,
    /// Listing in fetch order.
    pub repositories: Arc<[Repository]>,
    /// `None` until the first refresh completes.
    pub refreshed_at: Option<DateTime<Utc>>,
}

impl Snapshot {
    fn empty(sources: &[String]) -> Self {
        Self {
            feeds: Arc::new(AggregatedFeedResult {
                sections: sources.iter().map(|name| (name.clone(), Vec::new())).collect(),
            }),
            repositories: Arc::from(Vec::new()),
            refreshed_at: None,
        }
    }
}

/// A feed source that failed this cycle.
///
/// Its section is still present, just empty.
#[derive(Debug)]
pub struct FeedWarning {
    pub source: String,
    pub error: FeedError,
}

/// Outcome of one refresh cycle.
#[derive(Debug)]
pub struct RefreshReport {
    /// One entry per failed feed source, in configuration order.
    pub warnings: Vec<FeedWarning>,
    /// Number of repositories published, or why the listing was not replaced.
    pub repositories: Result<usize, RepositoryError>,
}

/// Owns the clients and the current snapshot.
pub struct Aggregator {
    feeds: Vec<Arc<dyn FeedClient>>,
    repos: Arc<dyn RepositoryClient>,
    item_cap: usize,
    timeout: Duration,
    current: ArcSwap<Snapshot>,
}

impl Aggregator {
    /// Build HTTP clients for every configured source.
    pub fn from_config(config: &AggregatorConfig, http: reqwest::Client) -> Self {
        let feeds = config
            .sources
            .iter()
            .map(|source| {
                Arc::new(RssSource::new(source.clone(), http.clone())) as Arc<dyn FeedClient>
            })
            .collect();
        let repos = GitHubRepos::new(config.repository_endpoint.clone(), http)
            .with_token(config.repository_token.clone());

        Self::with_clients(feeds, Arc::new(repos), config.item_cap, config.timeout)
    }

    /// Assemble an aggregator from arbitrary clients.
    ///
    /// Feed sections are keyed by [`FeedClient::name`] in the order given.
    pub fn with_clients(
        feeds: Vec<Arc<dyn FeedClient>>,
        repos: Arc<dyn RepositoryClient>,
        item_cap: usize,
        timeout: Duration,
    ) -> Self {
        let names: Vec<String> = feeds.iter().map(|f| f.name().to_string()).collect();
        Self {
            feeds,
            repos,
            item_cap,
            timeout,
            current: ArcSwap::from_pointee(Snapshot::empty(&names)),
        }
    }

    /// Run one aggregation cycle and publish its snapshot.
    ///
    /// Feed failures are folded into empty sections plus warnings.  A
    /// repository failure keeps the previously published listing and is
    /// returned in [`RefreshReport::repositories`].
    pub async fn refresh(&self) -> RefreshReport {
        let feed_fetches = join_all(self.feeds.iter().map(|client| async move {
            let outcome = bounded(self.timeout, client.fetch(self.item_cap))
                .await
                .unwrap_or_else(|| Err(FeedError::Timeout(self.timeout)));
            (client.name(), outcome)
        }));
        let repo_fetch = async {
            bounded(self.timeout, self.repos.fetch())
                .await
                .unwrap_or_else(|| Err(RepositoryError::Timeout(self.timeout)))
        };

        let (feed_outcomes, repo_outcome) = tokio::join!(feed_fetches, repo_fetch);

        let mut sections = Vec::with_capacity(feed_outcomes.len());
        let mut warnings = Vec::new();
        for (name, outcome) in feed_outcomes {
            match outcome {
                Ok(items) => {
                    if items.is_empty() {
                        tracing::debug!(source = %name, "feed fetched but had no valid items");
                    }
                    sections.push((name.to_string(), items));
                }
                Err(error) => {
                    tracing::warn!(source = %name, %error, "feed fetch failed");
                    sections.push((name.to_string(), Vec::new()));
                    warnings.push(FeedWarning {
                        source: name.to_string(),
                        error,
                    });
                }
            }
        }

        let (repositories, repo_result) = match repo_outcome {
            Ok(repos) => {
                let count = repos.len();
                (Arc::from(repos), Ok(count))
            }
            Err(error) => {
                tracing::warn!(%error, "repository fetch failed; keeping previous listing");
                (Arc::clone(&self.current.load().repositories), Err(error))
            }
        };

        let snapshot = Snapshot {
            feeds: Arc::new(AggregatedFeedResult { sections }),
            repositories,
            refreshed_at: Some(Utc::now()),
        };
        tracing::info!(
            sources = snapshot.feeds.len(),
            failed = warnings.len(),
            repositories = snapshot.repositories.len(),
            "published snapshot"
        );
        self.current.store(Arc::new(snapshot));

        RefreshReport {
            warnings,
            repositories: repo_result,
        }
    }

    /// The whole current read model.
    pub fn snapshot(&self) -> Arc<Snapshot> {
        self.current.load_full()
    }

    /// Current per-source feed items.
    pub fn feed_snapshot(&self) -> Arc<AggregatedFeedResult> {
        Arc::clone(&self.current.load().feeds)
    }

    /// Current repositories, most popular first.
    pub fn repository_snapshot(&self) -> Vec<Repository> {
        search::rank(&self.current.load().repositories)
    }

    /// Repositories whose name contains `text`, ignoring case, most popular
    /// first.  Never fetches.
    pub fn search(&self, text: &str) -> Vec<Repository> {
        search::search(&self.current.load().repositories, &SearchQuery::new(text))
    }

    /// Drop the published repository listing, e.g. after a failed refresh
    /// when stale data should not be shown.
    pub fn clear_repositories(&self) {
        self.current.rcu(|current| Snapshot {
            repositories: Arc::from(Vec::new()),
            ..Snapshot::clone(current)
        });
    }
}

/// `None` if `fut` does not finish within `limit`.
async fn bounded<F: Future>(limit: Duration, fut: F) -> Option<F::Output> {
    tokio::time::timeout(limit, fut).await.ok()
}
