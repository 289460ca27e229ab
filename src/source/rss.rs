//! HTTP feed client for RSS 2.0 and Atom documents.
//!
//! The document is fetched with a shared [`reqwest::Client`] and handed to
//! [`RssSource::parse_document`], which tries RSS first and falls back to
//! Atom when the root element is not `<rss>`.
//!
//! ## For contributors
//!
//! Parsing is a pure function so that tests can exercise normalization
//! without hitting the network.  Network behaviour (status codes, bodies)
//! is covered by `tests/http_sources.rs`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::{atom, FeedClient, FeedItem, FeedSource};
use crate::error::{status_parts, FeedError};

/// A feed source read over HTTP(S).
pub struct RssSource {
    source: FeedSource,
    client: reqwest::Client,
}

impl RssSource {
    /// Create a client for `source` that issues requests through `client`.
    ///
    /// The per-fetch timeout is enforced by the aggregator, not here.
    pub fn new(source: FeedSource, client: reqwest::Client) -> Self {
        Self { source, client }
    }

    /// Parse a feed document into at most `cap` valid [`FeedItem`]s.
    ///
    /// Entries missing a title or link are skipped and do not count toward
    /// `cap`.
    pub fn parse_document(body: &[u8], cap: usize) -> Result<Vec<FeedItem>, FeedError> {
        match ::rss::Channel::read_from(body) {
            Ok(channel) => Ok(Self::parse_channel(&channel, cap)),
            Err(::rss::Error::InvalidStartTag) => atom::parse_feed(body, cap),
            Err(e) => Err(FeedError::Parse(e.to_string())),
        }
    }

    /// Normalize an already-parsed [`rss::Channel`](::rss::Channel).
    pub fn parse_channel(channel: &::rss::Channel, cap: usize) -> Vec<FeedItem> {
        channel
            .items()
            .iter()
            .filter_map(|item| {
                // RFC-2822 date; gracefully degrade to None on failure.
                let published = item
                    .pub_date()
                    .and_then(|d| DateTime::parse_from_rfc2822(d.trim()).ok())
                    .map(|dt| dt.with_timezone(&Utc));

                let parsed = FeedItem::from_parts(item.title(), item.link(), published);
                if parsed.is_none() {
                    tracing::trace!(title = ?item.title(), "dropping entry without title or link");
                }
                parsed
            })
            .take(cap)
            .collect()
    }
}

#[async_trait]
impl FeedClient for RssSource {
    fn name(&self) -> &str {
        &self.source.name
    }

    async fn fetch(&self, cap: usize) -> Result<Vec<FeedItem>, FeedError> {
        tracing::debug!(source = %self.source.name, url = %self.source.endpoint, "fetching feed");

        let response = self.client.get(&self.source.endpoint).send().await?;
        let status = response.status();
        if !status.is_success() {
            let (status, reason) = status_parts(status);
            return Err(FeedError::Status { status, reason });
        }

        let body = response.bytes().await?;
        let items = Self::parse_document(&body, cap)?;

        tracing::debug!(source = %self.source.name, count = items.len(), "parsed feed");
        Ok(items)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
