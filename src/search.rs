//! Ranking and substring search over a repository snapshot.
//!
//! Nothing here is cached: every call filters and sorts the slice it is
//! given.  Listings are small, and recomputing keeps the read path free of
//! invalidation logic.

use crate::repo::Repository;

/// Text to match against repository names.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchQuery {
    pub text: String,
}

impl SearchQuery {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

/// Order repositories by descending popularity, keeping fetch order on ties.
pub fn rank(repos: &[Repository]) -> Vec<Repository> {
    let mut ranked = repos.to_vec();
    // `sort_by` is stable.
    ranked.sort_by(|a, b| b.popularity.cmp(&a.popularity));
    ranked
}

/// Repositories whose name contains `query.text`, ignoring case, ranked.
///
/// An empty query matches everything.
pub fn search(repos: &[Repository], query: &SearchQuery) -> Vec<Repository> {
    if query.text.is_empty() {
        return rank(repos);
    }

    let needle = query.text.to_lowercase();
    let matching: Vec<Repository> = repos
        .iter()
        .filter(|r| r.name.to_lowercase().contains(&needle))
        .cloned()
        .collect();
    rank(&matching)
}
