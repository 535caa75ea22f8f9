//! # Feed publishing
//! Renders the catalog, or an ad-hoc merge of raw external feeds, as RSS 2.0.
//!
//! Both renderers only read their inputs. Items are emitted oldest first.

use anyhow::{Context, Result};
use chrono::{DateTime, FixedOffset, Utc};
use serde::Serialize;

use crate::catalog::{truncate_chars, Entry, MAX_DESCRIPTION_CHARS};
use crate::ingest::types::FeedReader;

pub const RSS_CONTENT_TYPE: &str = "application/rss+xml";
const ENCLOSURE_TYPE: &str = "video/mp4";
const GENERATOR: &str = concat!("feed-harvester ", env!("CARGO_PKG_VERSION"));

const CATALOG_TITLE: &str = "YouTube Video Downloader RSS Feed";
const CATALOG_DESCRIPTION: &str = "RSS feed for downloaded YouTube videos.";
const MIXED_TITLE: &str = "Combined RSS Feed";
const MIXED_DESCRIPTION: &str = "A combined RSS feed of multiple sources.";

#[derive(Serialize)]
struct Rss<'a> {
    #[serde(rename = "@version")]
    version: &'static str,
    #[serde(rename = "@xmlns:atom")]
    xmlns_atom: &'static str,
    channel: Channel<'a>,
}

#[derive(Serialize)]
struct Channel<'a> {
    title: &'a str,
    link: &'a str,
    description: &'a str,
    #[serde(rename = "atom:link")]
    atom_link: AtomLink<'a>,
    generator: &'static str,
    #[serde(rename = "item")]
    items: Vec<Item>,
}

#[derive(Serialize)]
struct AtomLink<'a> {
    #[serde(rename = "@href")]
    href: &'a str,
    #[serde(rename = "@rel")]
    rel: &'static str,
    #[serde(rename = "@type")]
    kind: &'static str,
}

#[derive(Serialize)]
struct Item {
    title: String,
    link: String,
    description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    enclosure: Option<Enclosure>,
    #[serde(rename = "pubDate")]
    pub_date: String,
}

#[derive(Serialize)]
struct Enclosure {
    #[serde(rename = "@url")]
    url: String,
    #[serde(rename = "@length")]
    length: u64,
    #[serde(rename = "@type")]
    kind: &'static str,
}

/// One item of the mixed feed after flattening.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AggregateItem {
    pub title: String,
    pub link: String,
    pub description: String,
    pub published_at: DateTime<FixedOffset>,
}

/// Public URL a catalog entry's media is served at.
pub fn media_url(base_url: &str, local_path: &str) -> String {
    let encoded: Vec<String> = local_path
        .split('/')
        .map(|seg| urlencoding::encode(seg).into_owned())
        .collect();
    format!("{}/videos/{}", base_url.trim_end_matches('/'), encoded.join("/"))
}

fn rfc2822_utc(at: &DateTime<FixedOffset>) -> String {
    at.with_timezone(&Utc).to_rfc2822()
}

/// The catalog as RSS, with an mp4 enclosure per entry.
pub fn publish_catalog(entries: &[Entry], base_url: &str) -> Result<String> {
    let mut sorted: Vec<&Entry> = entries.iter().collect();
    sorted.sort_by_key(|e| e.published_at);

    let items = sorted
        .into_iter()
        .map(|e| Item {
            title: e.title.clone(),
            link: e.original_link.clone(),
            description: truncate_chars(&e.description, MAX_DESCRIPTION_CHARS),
            enclosure: Some(Enclosure {
                url: media_url(base_url, &e.local_path),
                length: 0,
                kind: ENCLOSURE_TYPE,
            }),
            pub_date: rfc2822_utc(&e.published_at),
        })
        .collect();

    let self_link = format!("{}/rss", base_url.trim_end_matches('/'));
    render(CATALOG_TITLE, &self_link, CATALOG_DESCRIPTION, items)
}

/// Fetch every URL, flatten, and order by publish time. Failing feeds and
/// undated items are left out.
pub async fn collect_aggregate(reader: &dyn FeedReader, feed_urls: &[String]) -> Vec<AggregateItem> {
    let mut all = Vec::new();
    for url in feed_urls {
        match reader.read(url).await {
            Ok(items) => {
                for it in items {
                    let Some(published_at) = it.published_at else {
                        tracing::debug!(feed = %url, link = %it.link, "undated item skipped");
                        continue;
                    };
                    all.push(AggregateItem {
                        title: it.title,
                        link: it.link,
                        description: truncate_chars(&it.description, MAX_DESCRIPTION_CHARS),
                        published_at,
                    });
                }
            }
            Err(e) => tracing::warn!(error = %e, feed = %url, "feed skipped"),
        }
    }
    all.sort_by_key(|it| it.published_at);
    all
}

/// The mixed feed: raw external feeds merged into one document, no enclosures.
pub async fn publish_aggregate(
    reader: &dyn FeedReader,
    feed_urls: &[String],
    base_url: &str,
) -> Result<String> {
    let items = collect_aggregate(reader, feed_urls)
        .await
        .into_iter()
        .map(|it| Item {
            pub_date: rfc2822_utc(&it.published_at),
            title: it.title,
            link: it.link,
            description: it.description,
            enclosure: None,
        })
        .collect();

    let self_link = format!("{}/mixed-rss", base_url.trim_end_matches('/'));
    render(MIXED_TITLE, &self_link, MIXED_DESCRIPTION, items)
}

fn render(title: &str, self_link: &str, description: &str, items: Vec<Item>) -> Result<String> {
    let doc = Rss {
        version: "2.0",
        xmlns_atom: "http://www.w3.org/2005/Atom",
        channel: Channel {
            title,
            link: self_link,
            description,
            atom_link: AtomLink {
                href: self_link,
                rel: "self",
                kind: RSS_CONTENT_TYPE,
            },
            generator: GENERATOR,
            items,
        },
    };

    let mut body = String::new();
    let mut ser = quick_xml::se::Serializer::with_root(&mut body, Some("rss"))
        .context("creating rss serializer")?;
    ser.indent(' ', 2);
    doc.serialize(ser).context("serializing rss document")?;

    Ok(format!("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n{body}\n"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn media_url_encodes_each_segment() {
        assert_eq!(
            media_url("http://h:8000/", "Chan_UC1/2024/2024-06-01_My Video.mp4"),
            "http://h:8000/videos/Chan_UC1/2024/2024-06-01_My%20Video.mp4"
        );
    }

    #[test]
    fn empty_catalog_renders_channel_only() {
        let xml = publish_catalog(&[], "http://h").unwrap();
        assert!(xml.starts_with("<?xml"));
        assert!(xml.contains("<title>YouTube Video Downloader RSS Feed</title>"));
        assert!(xml.contains("rel=\"self\""));
        assert!(!xml.contains("<item>"));
    }

    #[test]
    fn text_is_escaped() {
        let at = DateTime::parse_from_rfc3339("2024-06-01T10:00:00+02:00").unwrap();
        let e = Entry::new("c", "id", "t", "a < b & c", at, "https://v/1?a=1&b=2");
        let xml = publish_catalog(&[e], "http://h").unwrap();
        assert!(xml.contains("a &lt; b &amp; c"));
        assert!(xml.contains("https://v/1?a=1&amp;b=2"));
        assert!(xml.contains("+0000"));
    }
}
