//! Repository listing: the record type, the client trait and the
//! all-or-nothing decoding of a listing body.

mod github;

pub use github::GitHubRepos;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::RepositoryError;

/// One externally hosted repository.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Repository {
    /// Externally assigned identifier.
    pub id: u64,
    pub name: String,
    /// Star count or equivalent; the ranking key.
    pub popularity: u64,
    /// Canonical, human-facing URL.
    pub url: String,
}

impl Repository {
    pub fn new(id: u64, name: impl Into<String>, popularity: u64, url: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            popularity,
            url: url.into(),
        }
    }
}

/// Source of the repository listing.
///
/// Implementations return records in the order the endpoint provides them;
/// ranking is the search index's job.
#[async_trait]
pub trait RepositoryClient: Send + Sync {
    async fn fetch(&self) -> Result<Vec<Repository>, RepositoryError>;
}

/// Wire shape of one listing entry.
///
/// GitHub's field names are primary; the generic `popularity` name is
/// accepted too, and `url` is only consulted when `html_url` is absent since
/// GitHub uses it for the API URL.
#[derive(Debug, Deserialize)]
struct RawRepository {
    id: Option<u64>,
    name: Option<String>,
    stargazers_count: Option<u64>,
    popularity: Option<u64>,
    html_url: Option<String>,
    url: Option<String>,
}

/// Decode a JSON listing, rejecting the whole batch if any record is
/// incomplete.
pub fn decode_listing(body: &[u8]) -> Result<Vec<Repository>, RepositoryError> {
    let raw: Vec<RawRepository> =
        serde_json::from_slice(body).map_err(|e| RepositoryError::Decode(e.to_string()))?;

    raw.into_iter()
        .enumerate()
        .map(|(index, r)| {
            let missing = |field| RepositoryError::Incomplete { index, field };
            let non_empty = |s: Option<String>| s.filter(|s| !s.trim().is_empty());

            Ok(Repository {
                id: r.id.ok_or_else(|| missing("id"))?,
                name: non_empty(r.name).ok_or_else(|| missing("name"))?,
                popularity: r
                    .stargazers_count
                    .or(r.popularity)
                    .ok_or_else(|| missing("popularity"))?,
                url: non_empty(r.html_url)
                    .or_else(|| non_empty(r.url))
                    .ok_or_else(|| missing("url"))?,
            })
        })
        .collect()
}
