//! catalog.rs: in-memory collection of every materialized entry.
//!
//! The catalog is copy-on-write: readers grab an `Arc` snapshot and never see a
//! half-applied harvest or sweep, writers swap the whole list under a short
//! write lock.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use chrono::{DateTime, Datelike, FixedOffset};
use serde::Serialize;

/// Descriptions are cut to this many characters everywhere they are stored or published.
pub const MAX_DESCRIPTION_CHARS: usize = 1300;

/// One materialized item: metadata plus (maybe) a media file at `local_path`.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Entry {
    pub source_name: String,
    pub source_id: String,
    pub title: String,
    pub description: String,
    pub published_at: DateTime<FixedOffset>,
    pub original_link: String,
    /// Relative to the media root, always `/`-separated.
    pub local_path: String,
}

impl Entry {
    /// Build an entry from raw feed fields, sanitizing and truncating on the way in.
    pub fn new(
        source_name: &str,
        source_id: &str,
        title: &str,
        description: &str,
        published_at: DateTime<FixedOffset>,
        original_link: &str,
    ) -> Self {
        let source_name = sanitize_filename(source_name);
        let source_id = sanitize_filename(source_id);
        let title = sanitize_filename(title);
        let local_path = local_path_for(&source_name, &source_id, &published_at, &title);
        Self {
            source_name,
            source_id,
            title,
            description: truncate_chars(description, MAX_DESCRIPTION_CHARS),
            published_at,
            original_link: original_link.to_string(),
            local_path,
        }
    }

    /// Path of the sidecar metadata file that sits next to the media file.
    pub fn sidecar_path(&self) -> String {
        sidecar_for(&self.local_path)
    }
}

/// Keep alphanumerics, space, hyphen and underscore; drop trailing whitespace.
pub fn sanitize_filename(s: &str) -> String {
    let kept: String = s
        .chars()
        .filter(|c| c.is_alphanumeric() || matches!(c, ' ' | '-' | '_'))
        .collect();
    kept.trim_end().to_string()
}

pub fn truncate_chars(s: &str, max: usize) -> String {
    match s.char_indices().nth(max) {
        Some((idx, _)) => s[..idx].to_string(),
        None => s.to_string(),
    }
}

/// `<name>_<id>/<year>/<YYYY-MM-DD>_<title>.mp4` for already-sanitized parts.
pub fn local_path_for(
    source_name: &str,
    source_id: &str,
    published_at: &DateTime<FixedOffset>,
    title: &str,
) -> String {
    format!(
        "{}_{}/{}/{}_{}.mp4",
        source_name,
        source_id,
        published_at.year(),
        published_at.format("%Y-%m-%d"),
        title
    )
}

pub fn sidecar_for(local_path: &str) -> String {
    match local_path.strip_suffix(".mp4") {
        Some(stem) => format!("{stem}.txt"),
        None => format!("{local_path}.txt"),
    }
}

/// Shared handle to the catalog. Cloning is cheap; all clones see the same list.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    inner: Arc<RwLock<Arc<Vec<Entry>>>>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current contents. The returned list never changes underneath the caller.
    pub fn snapshot(&self) -> Arc<Vec<Entry>> {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn len(&self) -> usize {
        self.snapshot().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Merge one harvest batch in a single swap.
    ///
    /// Entries are keyed by `(source_id, original_link)`: a known key is
    /// refreshed in place, an unknown key is appended in batch order.
    /// Returns how many entries were new.
    pub fn commit_batch(&self, batch: Vec<Entry>) -> usize {
        let mut guard = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        let mut next: Vec<Entry> = guard.as_ref().clone();

        let mut index: HashMap<(String, String), usize> = next
            .iter()
            .enumerate()
            .map(|(i, e)| ((e.source_id.clone(), e.original_link.clone()), i))
            .collect();

        let mut added = 0usize;
        for entry in batch {
            let key = (entry.source_id.clone(), entry.original_link.clone());
            match index.get(&key).copied() {
                Some(i) => next[i] = entry,
                None => {
                    index.insert(key, next.len());
                    next.push(entry);
                    added += 1;
                }
            }
        }

        *guard = Arc::new(next);
        added
    }

    /// Split the catalog by `keep`, install the kept part and hand back the rest.
    pub fn retain_split<F>(&self, mut keep: F) -> Vec<Entry>
    where
        F: FnMut(&Entry) -> bool,
    {
        let mut guard = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        let (kept, evicted): (Vec<Entry>, Vec<Entry>) =
            guard.iter().cloned().partition(|e| keep(e));
        *guard = Arc::new(kept);
        evicted
    }
}
