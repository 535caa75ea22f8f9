// src/ingest/materialize.rs
//! Turns one source's remote items into catalog entries, downloading media that
//! is not on disk yet.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use metrics::counter;
use tracing::{debug, info, warn};

use crate::catalog::Entry;
use crate::ingest::types::{EntrySource, FetchError, MediaFetcher, RemoteItem};

/// What happened to one item's media during a pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemOutcome {
    Fetched,
    AlreadyPresent,
    NoStream,
    Failed,
}

impl ItemOutcome {
    pub fn as_str(self) -> &'static str {
        match self {
            ItemOutcome::Fetched => "fetched",
            ItemOutcome::AlreadyPresent => "already_present",
            ItemOutcome::NoStream => "no_stream",
            ItemOutcome::Failed => "failed",
        }
    }
}

pub struct Materializer {
    source: Arc<dyn EntrySource>,
    fetcher: Arc<dyn MediaFetcher>,
    media_root: PathBuf,
}

impl Materializer {
    pub fn new(
        source: Arc<dyn EntrySource>,
        fetcher: Arc<dyn MediaFetcher>,
        media_root: impl Into<PathBuf>,
    ) -> Self {
        Self {
            source,
            fetcher,
            media_root: media_root.into(),
        }
    }

    pub fn media_root(&self) -> &Path {
        &self.media_root
    }

    /// Resolve `source_id` and make sure every item's media is on disk.
    ///
    /// `Err` only when the source itself cannot be resolved. Per-item problems
    /// are logged and the item is still returned, with or without its file.
    pub async fn materialize(&self, source_id: &str) -> Result<Vec<Entry>, FetchError> {
        let items = self.source.entries(source_id).await?;
        let mut out = Vec::with_capacity(items.len());

        for item in items {
            let Some(published_at) = item.published_at else {
                debug!(source = %source_id, link = %item.link, "item without publish time dropped");
                continue;
            };
            let source_name = item.author.as_deref().unwrap_or(source_id);
            let entry = Entry::new(
                source_name,
                source_id,
                &item.title,
                &item.description,
                published_at,
                &item.link,
            );

            let outcome = self.ensure_media(&entry, &item).await;
            counter!("media_fetch_total", "outcome" => outcome.as_str()).increment(1);
            out.push(entry);
        }

        Ok(out)
    }

    async fn ensure_media(&self, entry: &Entry, item: &RemoteItem) -> ItemOutcome {
        let dest = self.media_root.join(&entry.local_path);
        match self.try_fetch(entry, &dest).await {
            Ok(outcome) => outcome,
            Err(FetchError::NoStream) => {
                warn!(title = %entry.title, link = %item.link, "no suitable stream found");
                ItemOutcome::NoStream
            }
            Err(e) => {
                warn!(error = %e, title = %entry.title, link = %item.link, "error downloading media");
                ItemOutcome::Failed
            }
        }
    }

    async fn try_fetch(&self, entry: &Entry, dest: &Path) -> Result<ItemOutcome, FetchError> {
        if let Some(dir) = dest.parent() {
            tokio::fs::create_dir_all(dir).await?;
        }
        if tokio::fs::try_exists(dest).await? {
            return Ok(ItemOutcome::AlreadyPresent);
        }

        self.fetcher.fetch(&entry.original_link, dest).await?;
        info!(path = %entry.local_path, "media downloaded");

        let sidecar = self.media_root.join(entry.sidecar_path());
        if let Err(e) = tokio::fs::write(&sidecar, sidecar_text(entry)).await {
            warn!(error = %e, path = %sidecar.display(), "sidecar write failed");
        }
        Ok(ItemOutcome::Fetched)
    }
}

fn sidecar_text(entry: &Entry) -> String {
    format!(
        "Title: {}\nSource: {} ({})\nPublished: {}\nLink: {}\n\n{}\n",
        entry.title,
        entry.source_name,
        entry.source_id,
        entry.published_at.to_rfc3339(),
        entry.original_link,
        entry.description
    )
}
