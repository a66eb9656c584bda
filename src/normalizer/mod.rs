use chrono::{SubsecRound, Utc};
use feed_rs::model;
use feed_rs::parser;
use html_escape::decode_html_entities;

use crate::app::{EstuaryError, Result};
use crate::domain::{FeedMeta, RawItem};

const ITUNES_NS: &str = "http://www.itunes.com/dtds/podcast-1.0.dtd";

/// A feed document broken down into descriptive metadata and raw items.
#[derive(Debug, Clone, Default)]
pub struct ParsedFeed {
    pub meta: FeedMeta,
    pub items: Vec<RawItem>,
}

#[derive(Clone)]
pub struct Normalizer;

impl Default for Normalizer {
    fn default() -> Self {
        Self::new()
    }
}

impl Normalizer {
    pub fn new() -> Self {
        Self
    }

    pub fn parse(&self, body: &[u8]) -> Result<ParsedFeed> {
        let feed = parser::parse(body).map_err(|e| EstuaryError::FeedParse(e.to_string()))?;

        let meta = FeedMeta {
            title: feed.title.map(|t| decode_html_entities(&t.content).to_string()),
            description: feed.description.map(|d| d.content),
            language: feed.language,
            image: feed.logo.or(feed.icon).map(|i| i.uri),
            home: feed
                .links
                .iter()
                .find(|l| l.rel.as_deref() != Some("self"))
                .map(|l| l.href.clone()),
            author: feed.authors.first().map(|a| a.name.clone()),
        };

        let mut subtitles = itunes_subtitles(body);
        if subtitles.len() != feed.entries.len() {
            subtitles = vec![None; feed.entries.len()];
        }

        let items = feed
            .entries
            .into_iter()
            .zip(subtitles)
            .map(|(entry, subtitle)| raw_item(entry, subtitle))
            .collect();

        Ok(ParsedFeed { meta, items })
    }
}

/// feed-rs keeps `<itunes:title>` and `<itunes:summary>` but drops
/// `<itunes:subtitle>`, so it is read from the document directly, one slot
/// per `<item>` in document order. Empty when the body is not plain XML.
fn itunes_subtitles(body: &[u8]) -> Vec<Option<String>> {
    let Ok(text) = std::str::from_utf8(body) else {
        return Vec::new();
    };
    let text = text.trim_start_matches('\u{feff}').trim_start();
    let doc = match roxmltree::Document::parse(text) {
        Ok(d) => d,
        Err(_) => return Vec::new(),
    };

    doc.descendants()
        .filter(|node| node.is_element() && node.tag_name().name() == "item")
        .map(|item| {
            item.children()
                .find(|child| {
                    child.tag_name().name() == "subtitle"
                        && child
                            .tag_name()
                            .namespace()
                            .is_some_and(|ns| ns.eq_ignore_ascii_case(ITUNES_NS))
                })
                .and_then(|child| child.text())
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .map(String::from)
        })
        .collect()
}

fn raw_item(entry: model::Entry, alt_subtitle: Option<String>) -> RawItem {
    let enclosures = entry
        .media
        .iter()
        .flat_map(|m| m.content.iter())
        .filter_map(|c| c.url.as_ref().map(|u| u.to_string()))
        .collect();

    // feed-rs appends the iTunes media object after any <media:group>.
    let alt_summary = entry
        .media
        .iter()
        .rev()
        .find_map(|m| m.description.as_ref())
        .map(|d| d.content.clone());

    RawItem {
        title: entry
            .title
            .map(|t| decode_html_entities(&t.content).to_string())
            .unwrap_or_default(),
        link: entry.links.first().map(|l| l.href.clone()),
        enclosures,
        published: entry
            .published
            .or(entry.updated)
            // Watermarks are stored in milliseconds.
            .map(|dt| dt.with_timezone(&Utc).trunc_subsecs(3)),
        summary: entry.summary.map(|s| s.content),
        content: entry.content.and_then(|c| c.body),
        alt_subtitle,
        alt_summary,
    }
}
