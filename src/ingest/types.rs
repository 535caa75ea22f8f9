// src/ingest/types.rs
use std::path::Path;

use chrono::{DateTime, FixedOffset};
use thiserror::Error;

/// Fallback used when a feed item carries no summary at all.
pub const NO_DESCRIPTION: &str = "No description available";

/// One item as a remote feed describes it, before anything touches the disk.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize, PartialEq, Eq)]
pub struct RemoteItem {
    pub title: String,
    pub link: String,
    pub description: String,
    pub published_at: Option<DateTime<FixedOffset>>,
    pub author: Option<String>,
}

/// Where a harvest can go wrong. Every variant is contained at the level it
/// belongs to (per source or per item) and never aborts a pass.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("source resolution failed: {0}")]
    Resolve(String),
    #[error("no eligible combined mp4 stream offered")]
    NoStream,
    #[error("media transfer failed: {0}")]
    Transfer(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Reads one raw feed URL into its items.
#[async_trait::async_trait]
pub trait FeedReader: Send + Sync {
    async fn read(&self, url: &str) -> Result<Vec<RemoteItem>, FetchError>;
}

/// Resolves a source identifier into the list of items it currently offers.
#[async_trait::async_trait]
pub trait EntrySource: Send + Sync {
    async fn entries(&self, source_id: &str) -> Result<Vec<RemoteItem>, FetchError>;
}

/// Downloads the media behind an item link into `dest`.
///
/// Implementations must pick the best combined audio+video mp4 stream and
/// report `FetchError::NoStream` when none is offered.
#[async_trait::async_trait]
pub trait MediaFetcher: Send + Sync {
    async fn fetch(&self, link: &str, dest: &Path) -> Result<(), FetchError>;
}
