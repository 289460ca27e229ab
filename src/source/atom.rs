//! Minimal Atom (RFC 4287) reader.
//!
//! Only the fields the aggregator needs are extracted: the entry title, its
//! alternate link and an optional timestamp.  Everything else is skipped.

use chrono::{DateTime, Utc};
use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;

use super::FeedItem;
use crate::error::FeedError;

/// Depth of `<entry>` elements: direct children of the root.
const ENTRY_DEPTH: usize = 2;

/// Parse an Atom `<feed>` document into at most `cap` valid items.
///
/// The whole document is read even after `cap` items are collected, so a
/// document that is malformed or truncated anywhere fails as a whole.
pub(super) fn parse_feed(xml: &[u8], cap: usize) -> Result<Vec<FeedItem>, FeedError> {
    let mut reader = Reader::from_reader(xml);
    reader.config_mut().trim_text(true);

    let mut items = Vec::new();
    let mut buf = Vec::new();

    // Number of currently open elements; 1 inside `<feed>`.
    let mut depth = 0usize;
    let mut seen_root = false;
    let mut root_closed = false;
    let mut current_entry: Option<EntryBuilder> = None;
    let mut current_field = Field::None;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => {
                if depth == 0 {
                    check_root(&e, seen_root)?;
                    seen_root = true;
                } else if depth == ENTRY_DEPTH - 1 && e.local_name().as_ref() == b"entry" {
                    current_entry = Some(EntryBuilder::default());
                } else if depth == ENTRY_DEPTH {
                    if let Some(entry) = current_entry.as_mut() {
                        match e.local_name().as_ref() {
                            b"title" => current_field = Field::Title,
                            b"published" => current_field = Field::Published,
                            b"updated" => current_field = Field::Updated,
                            b"link" => entry.offer_link(&e)?,
                            _ => {}
                        }
                    }
                }
                depth += 1;
            }
            Ok(Event::Empty(e)) => {
                if depth == 0 {
                    // `<feed/>`: a valid feed without entries.
                    check_root(&e, seen_root)?;
                    seen_root = true;
                    root_closed = true;
                } else if depth == ENTRY_DEPTH && e.local_name().as_ref() == b"link" {
                    if let Some(entry) = current_entry.as_mut() {
                        entry.offer_link(&e)?;
                    }
                }
            }
            Ok(Event::End(_)) => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    root_closed = true;
                } else if depth == ENTRY_DEPTH - 1 {
                    if let Some(item) = current_entry.take().and_then(EntryBuilder::build) {
                        if items.len() < cap {
                            items.push(item);
                        }
                    }
                } else if depth == ENTRY_DEPTH {
                    current_field = Field::None;
                }
            }
            Ok(Event::Text(e)) => {
                if let Some(entry) = current_entry.as_mut() {
                    let text = e
                        .unescape()
                        .map_err(|e| FeedError::Parse(format!("XML parse error: {e}")))?;
                    entry.push_text(current_field, &text);
                }
            }
            Ok(Event::CData(e)) => {
                if let Some(entry) = current_entry.as_mut() {
                    let inner = e.into_inner();
                    entry.push_text(current_field, &String::from_utf8_lossy(&inner));
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(FeedError::Parse(format!("XML parse error: {e}"))),
            _ => {}
        }
        buf.clear();
    }

    if !seen_root {
        return Err(FeedError::Parse("document has no root element".to_string()));
    }
    if !root_closed {
        return Err(FeedError::Parse("reached end of input before </feed>".to_string()));
    }
    Ok(items)
}

/// Only a single `<feed>` root is accepted.
fn check_root(e: &BytesStart<'_>, seen_root: bool) -> Result<(), FeedError> {
    if seen_root {
        return Err(FeedError::Parse("content after </feed>".to_string()));
    }
    let name = e.local_name();
    if name.as_ref() != b"feed" {
        return Err(FeedError::Parse(format!(
            "unrecognized root element <{}>",
            String::from_utf8_lossy(name.as_ref())
        )));
    }
    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    None,
    Title,
    Published,
    Updated,
}

#[derive(Default)]
struct EntryBuilder {
    title: Option<String>,
    link: Option<String>,
    published: Option<String>,
    updated: Option<String>,
}

impl EntryBuilder {
    fn push_text(&mut self, field: Field, text: &str) {
        let slot = match field {
            Field::Title => &mut self.title,
            Field::Published => &mut self.published,
            Field::Updated => &mut self.updated,
            Field::None => return,
        };
        slot.get_or_insert_with(String::new).push_str(text);
    }

    /// Keep the first `<link>` whose `rel` is absent or `alternate`.
    fn offer_link(&mut self, e: &BytesStart<'_>) -> Result<(), FeedError> {
        if self.link.is_some() {
            return Ok(());
        }

        let mut href = None;
        let mut rel = None;
        for attr in e.attributes() {
            let attr = attr.map_err(|e| FeedError::Parse(format!("bad attribute: {e}")))?;
            let value = attr
                .unescape_value()
                .map_err(|e| FeedError::Parse(format!("bad attribute: {e}")))?
                .into_owned();
            match attr.key.local_name().as_ref() {
                b"href" => href = Some(value),
                b"rel" => rel = Some(value),
                _ => {}
            }
        }

        if matches!(rel.as_deref(), None | Some("alternate")) {
            self.link = href;
        }
        Ok(())
    }

    fn build(self) -> Option<FeedItem> {
        let published = self
            .published
            .or(self.updated)
            .and_then(|d| DateTime::parse_from_rfc3339(d.trim()).ok())
            .map(|dt| dt.with_timezone(&Utc));

        let item = FeedItem::from_parts(self.title.as_deref(), self.link.as_deref(), published);
        if item.is_none() {
            tracing::trace!(title = ?self.title, "dropping entry without title or link");
        }
        item
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FEED: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<feed xmlns="http://www.w3.org/2005/Atom">
  <title>Example</title>
  <link href="https://example.com/"/>
  <entry>
    <title>First &amp; foremost</title>
    <link rel="self" href="https://example.com/self/1"/>
    <link rel="alternate" href="https://example.com/1"/>
    <updated>2025-03-01T10:00:00Z</updated>
  </entry>
  <entry>
    <title>No link here</title>
  </entry>
  <entry>
    <title type="html"><![CDATA[Second <b>post</b>]]></title>
    <link href="https://example.com/2"></link>
    <published>2025-02-01T08:30:00+02:00</published>
    <updated>2025-02-02T00:00:00Z</updated>
  </entry>
  <entry>
    <title>Third</title>
    <link href="https://example.com/3"/>
  </entry>
</feed>"#;

    #[test]
    fn extracts_valid_entries_in_order() {
        let items = parse_feed(FEED.as_bytes(), 10).unwrap();
        let titles: Vec<_> = items.iter().map(|i| i.title.as_str()).collect();
        assert_eq!(titles, ["First & foremost", "Second <b>post</b>", "Third"]);
    }

    #[test]
    fn prefers_alternate_link_over_self() {
        let items = parse_feed(FEED.as_bytes(), 10).unwrap();
        assert_eq!(items[0].link, "https://example.com/1");
    }

    #[test]
    fn published_wins_over_updated() {
        let items = parse_feed(FEED.as_bytes(), 10).unwrap();
        let expected = DateTime::parse_from_rfc3339("2025-02-01T06:30:00Z")
            .unwrap()
            .with_timezone(&Utc);
        assert_eq!(items[1].published, Some(expected));
        assert!(items[0].published.is_some(), "falls back to <updated>");
    }

    #[test]
    fn truncates_to_cap() {
        let items = parse_feed(FEED.as_bytes(), 2).unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[1].link, "https://example.com/2");
    }

    #[test]
    fn rejects_non_feed_root() {
        let err = parse_feed(b"<html><body/></html>", 3).unwrap_err();
        assert!(matches!(err, FeedError::Parse(_)));
    }

    #[test]
    fn truncated_document_is_a_parse_failure() {
        let xml = br#"<feed xmlns="http://www.w3.org/2005/Atom"><entry><title>A</title><link href="https://x/a"/></entry><entry><title>B</title><link href="https://x/b"/>"#;
        assert!(matches!(parse_feed(xml, 3), Err(FeedError::Parse(_))));
    }

    #[test]
    fn malformed_tail_fails_even_when_cap_is_reached() {
        let xml = br#"<feed xmlns="http://www.w3.org/2005/Atom"><entry><title>A</title><link href="https://x/a"/></entry><entry><title>B</title></oops></feed>"#;
        assert!(matches!(parse_feed(xml, 1), Err(FeedError::Parse(_))));
    }

    #[test]
    fn self_closing_feed_has_no_items() {
        let xml = br#"<?xml version="1.0"?><feed xmlns="http://www.w3.org/2005/Atom"/>"#;
        assert!(parse_feed(xml, 3).unwrap().is_empty());
    }

    #[test]
    fn nested_source_title_is_ignored() {
        let xml = br#"<feed xmlns="http://www.w3.org/2005/Atom">
  <entry>
    <title>A</title>
    <source><title>Origin</title><link href="https://origin.example/"/></source>
    <link href="https://x/a"/>
  </entry>
</feed>"#;
        let items = parse_feed(xml, 3).unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].title, "A");
        assert_eq!(items[0].link, "https://x/a");
    }

    #[test]
    fn rejects_empty_document() {
        assert!(parse_feed(b"", 3).is_err());
    }
}
