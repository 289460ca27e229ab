//! The normalized entry type shared by every feed format.
//!
//! RSS and Atom parsers both convert their native entries into [`FeedItem`]
//! through [`FeedItem::from_parts`], which is the single place the validity
//! rule lives: an entry needs a non-empty title and a non-empty link.

use chrono::{DateTime, Utc};
use serde::Serialize;

/// A single feed entry that passed validation.
///
/// Items carry no identity of their own; they only exist inside one source's
/// section of an [`AggregatedFeedResult`](crate::aggregator::AggregatedFeedResult)
/// and keep the order the feed document listed them in.
#[derive(Debug, Clone, Eq, PartialEq, Serialize)]
pub struct FeedItem {
    /// Human-readable headline, trimmed.
    pub title: String,

    /// URL to the full content, trimmed.
    pub link: String,

    /// Publication timestamp when the document provides a parseable one.
    ///
    /// Informational only; section order is always document order.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub published: Option<DateTime<Utc>>,
}

impl FeedItem {
    /// Build an item from raw parsed fields, or `None` if the entry is invalid.
    ///
    /// Whitespace-only values count as absent.
    pub fn from_parts(
        title: Option<&str>,
        link: Option<&str>,
        published: Option<DateTime<Utc>>,
    ) -> Option<Self> {
        let title = title.map(str::trim).filter(|t| !t.is_empty())?;
        let link = link.map(str::trim).filter(|l| !l.is_empty())?;
        Some(Self {
            title: title.to_string(),
            link: link.to_string(),
            published,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn accepts_complete_entry_and_trims() {
        let ts = Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap();
        let item = FeedItem::from_parts(Some("  Headline "), Some("https://x.test/a\n"), Some(ts))
            .expect("valid entry");
        assert_eq!(item.title, "Headline");
        assert_eq!(item.link, "https://x.test/a");
        assert_eq!(item.published, Some(ts));
    }

    #[test]
    fn rejects_missing_title() {
        assert!(FeedItem::from_parts(None, Some("https://x.test"), None).is_none());
    }

    #[test]
    fn rejects_missing_link() {
        assert!(FeedItem::from_parts(Some("Title"), None, None).is_none());
    }

    #[test]
    fn rejects_whitespace_only_fields() {
        assert!(FeedItem::from_parts(Some("   "), Some("https://x.test"), None).is_none());
        assert!(FeedItem::from_parts(Some("Title"), Some(" \t"), None).is_none());
    }

    #[test]
    fn published_is_omitted_from_json_when_absent() {
        let item = FeedItem::from_parts(Some("T"), Some("L"), None).unwrap();
        let json = serde_json::to_value(&item).unwrap();
        assert_eq!(json, serde_json::json!({ "title": "T", "link": "L" }));
    }
}
