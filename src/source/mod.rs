//! Feed source abstraction layer.
//!
//! This module defines the [`FeedClient`] trait, the configured
//! [`FeedSource`] identity and the common [`FeedItem`] type.  The concrete
//! HTTP client lives in [`rss`] and understands both RSS 2.0 and Atom.
//!
//! ## For contributors — adding a new source kind
//!
//! 1. Create a new file in this directory (e.g. `json_feed.rs`).
//! 2. Define a struct and implement [`FeedClient`] for it.
//! 3. Add `mod json_feed;` below and re-export your struct.
//! 4. Construct it wherever the aggregator's clients are built.
//!
//! The aggregator, truncation and failure isolation are all source-agnostic.

mod atom;
mod feed_item;
mod rss;

pub use feed_item::FeedItem;
pub use self::rss::RssSource;

use async_trait::async_trait;
use serde::Deserialize;

use crate::error::FeedError;

/// One configured feed endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct FeedSource {
    /// Unique display label; also the key of the source's section.
    pub name: String,
    /// URI of the feed document.
    pub endpoint: String,
}

impl FeedSource {
    pub fn new(name: impl Into<String>, endpoint: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            endpoint: endpoint.into(),
        }
    }
}

/// Trait that every feed client must implement.
///
/// The aggregator calls [`fetch()`](FeedClient::fetch) once per refresh
/// cycle, concurrently with every other client, so implementations must be
/// [`Send`] + [`Sync`].
///
/// ## Implementing a new client
///
/// ```ignore
/// pub struct MySource { /* config fields */ }
///
/// #[async_trait]
/// impl FeedClient for MySource {
///     fn name(&self) -> &str { "my-source" }
///
///     async fn fetch(&self, cap: usize) -> Result<Vec<FeedItem>, FeedError> {
///         // Perform HTTP / IO, keep the first `cap` valid entries.
///         todo!()
///     }
/// }
/// ```
#[async_trait]
pub trait FeedClient: Send + Sync {
    /// Name of the [`FeedSource`] this client reads.
    fn name(&self) -> &str;

    /// Fetch the document and return at most `cap` valid items in document
    /// order.
    ///
    /// All-or-nothing: any failure yields `Err` and never a partial list.
    async fn fetch(&self, cap: usize) -> Result<Vec<FeedItem>, FeedError>;
}
