// src/ingest/providers/xml_feed.rs
use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use metrics::{counter, histogram};

use crate::ingest::types::{FeedReader, FetchError, RemoteItem, NO_DESCRIPTION};

const TOTAL_TIMEOUT_SECS: u64 = 30;
const USER_AGENT: &str = concat!("feed-harvester/", env!("CARGO_PKG_VERSION"));

/// Reads RSS 2.0 and Atom documents, either over HTTP or from in-memory fixtures.
pub struct XmlFeedReader {
    mode: Mode,
}

enum Mode {
    /// url -> document body
    Fixture(HashMap<String, String>),
    Http { client: reqwest::Client },
}

impl XmlFeedReader {
    pub fn http() -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(TOTAL_TIMEOUT_SECS))
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| FetchError::Resolve(format!("failed to create HTTP client: {e}")))?;
        Ok(Self {
            mode: Mode::Http { client },
        })
    }

    /// Serve documents from memory; unknown URLs fail like a dead host would.
    pub fn from_fixtures<I, K, V>(docs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            mode: Mode::Fixture(
                docs.into_iter()
                    .map(|(k, v)| (k.into(), v.into()))
                    .collect(),
            ),
        }
    }

    async fn body(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        match &self.mode {
            Mode::Fixture(docs) => docs
                .get(url)
                .map(|s| s.as_bytes().to_vec())
                .ok_or_else(|| FetchError::Resolve(format!("no fixture for {url}"))),
            Mode::Http { client } => {
                let resp = client
                    .get(url)
                    .send()
                    .await
                    .map_err(|e| FetchError::Resolve(format!("GET {url}: {e}")))?;
                if !resp.status().is_success() {
                    return Err(FetchError::Resolve(format!(
                        "GET {url}: HTTP {}",
                        resp.status()
                    )));
                }
                let bytes = resp
                    .bytes()
                    .await
                    .map_err(|e| FetchError::Resolve(format!("reading {url}: {e}")))?;
                Ok(bytes.to_vec())
            }
        }
    }
}

#[async_trait]
impl FeedReader for XmlFeedReader {
    async fn read(&self, url: &str) -> Result<Vec<RemoteItem>, FetchError> {
        let body = self.body(url).await?;
        parse_feed(&body)
    }
}

/// Parse an RSS or Atom document into items.
///
/// The description falls back from summary to Media RSS description to content
/// body; the publish time falls back to the updated time.
pub fn parse_feed(bytes: &[u8]) -> Result<Vec<RemoteItem>, FetchError> {
    let t0 = std::time::Instant::now();
    let feed = feed_rs::parser::parse(bytes)
        .map_err(|e| FetchError::Resolve(format!("failed to parse feed: {e}")))?;

    let feed_author = feed.authors.first().map(|a| a.name.clone());
    let items: Vec<RemoteItem> = feed
        .entries
        .into_iter()
        .map(|entry| {
            let description = entry
                .summary
                .map(|t| t.content)
                .or_else(|| {
                    entry
                        .media
                        .iter()
                        .find_map(|m| m.description.as_ref().map(|t| t.content.clone()))
                })
                .or_else(|| entry.content.and_then(|c| c.body))
                .unwrap_or_else(|| NO_DESCRIPTION.to_string());

            RemoteItem {
                title: entry.title.map(|t| t.content).unwrap_or_default(),
                link: entry
                    .links
                    .first()
                    .map(|l| l.href.clone())
                    .unwrap_or_default(),
                description,
                published_at: entry.published.or(entry.updated).map(|d| d.fixed_offset()),
                author: entry
                    .authors
                    .first()
                    .map(|a| a.name.clone())
                    .or_else(|| feed_author.clone()),
            }
        })
        .collect();

    histogram!("feed_parse_ms").record(t0.elapsed().as_secs_f64() * 1_000.0);
    counter!("feed_items_total").increment(items.len() as u64);
    Ok(items)
}

#[cfg(test)]
mod tests {
    use super::*;

    const RSS: &str = r#"<?xml version="1.0"?>
<rss version="2.0"><channel><title>t</title><link>https://ex.test</link><description>d</description>
<item><title>First</title><link>https://ex.test/1</link><description>one</description>
<pubDate>Mon, 01 Jan 2024 10:00:00 +0000</pubDate></item>
<item><title>No date</title><link>https://ex.test/2</link></item>
</channel></rss>"#;

    #[test]
    fn rss_items_keep_order_and_defaults() {
        let items = parse_feed(RSS.as_bytes()).unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].title, "First");
        assert_eq!(items[0].link, "https://ex.test/1");
        assert_eq!(items[0].description, "one");
        assert_eq!(
            items[0].published_at.unwrap().to_rfc3339(),
            "2024-01-01T10:00:00+00:00"
        );
        assert!(items[1].published_at.is_none());
        assert_eq!(items[1].description, NO_DESCRIPTION);
    }

    #[test]
    fn garbage_is_a_resolve_error() {
        let err = parse_feed(b"not a feed").unwrap_err();
        assert!(matches!(err, FetchError::Resolve(_)));
    }

    #[tokio::test]
    async fn unknown_fixture_url_fails() {
        let reader = XmlFeedReader::from_fixtures([("https://a.test/feed", RSS)]);
        assert_eq!(reader.read("https://a.test/feed").await.unwrap().len(), 2);
        assert!(reader.read("https://b.test/feed").await.is_err());
    }
}
