use feed_rs::model::Entry;

use crate::models::{FeedEntry, ParsedFeed};
use crate::FeedError;

/// Parse a raw syndication payload (RSS or Atom) into a [`ParsedFeed`].
///
/// Entries without a link are dropped: the link is the dedup key and an
/// entry that lacks one cannot be stored.
pub fn parse_feed(bytes: &[u8]) -> Result<ParsedFeed, FeedError> {
    let parsed = feed_rs::parser::parse(bytes).map_err(|e| FeedError::Parse(e.to_string()))?;

    let title = parsed.title.map(|t| t.content);
    let entries = parsed.entries.into_iter().filter_map(convert_entry).collect();

    Ok(ParsedFeed { title, entries })
}

fn convert_entry(entry: Entry) -> Option<FeedEntry> {
    let link = entry.links.first().map(|l| l.href.clone())?;

    Some(FeedEntry {
        title: entry.title.map(|t| t.content).unwrap_or_default(),
        link,
        summary: entry.summary.map(|t| t.content).unwrap_or_default(),
        published: entry.published,
    })
}
