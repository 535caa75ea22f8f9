// src/ingest/providers/channel.rs
use std::sync::Arc;

use async_trait::async_trait;

use crate::ingest::types::{EntrySource, FeedReader, FetchError, RemoteItem};

/// A source id resolves to `<feed_base><id>`, e.g. a YouTube channel's Atom feed.
pub struct ChannelFeedSource {
    reader: Arc<dyn FeedReader>,
    feed_base: String,
}

impl ChannelFeedSource {
    pub fn new(reader: Arc<dyn FeedReader>, feed_base: impl Into<String>) -> Self {
        Self {
            reader,
            feed_base: feed_base.into(),
        }
    }

    pub fn feed_url(&self, source_id: &str) -> String {
        format!("{}{}", self.feed_base, urlencoding::encode(source_id))
    }
}

#[async_trait]
impl EntrySource for ChannelFeedSource {
    async fn entries(&self, source_id: &str) -> Result<Vec<RemoteItem>, FetchError> {
        if source_id.trim().is_empty() {
            return Err(FetchError::Resolve("empty source id".to_string()));
        }
        let url = self.feed_url(source_id);
        self.reader.read(&url).await
    }
}
