//! # Retention
//! Age-based eviction of catalog entries and their files.
//!
//! The catalog is swapped to the keep set first, so readers go straight from
//! the pre-sweep list to the post-sweep list. Files are removed afterwards.

use std::io::ErrorKind;
use std::path::Path;

use chrono::{DateTime, Duration, Utc};
use metrics::{counter, gauge};

use crate::catalog::{Catalog, Entry};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepReport {
    pub kept: usize,
    pub evicted: usize,
    pub files_deleted: usize,
}

/// Evict every entry published before `now - horizon`.
pub async fn sweep(
    catalog: &Catalog,
    media_root: &Path,
    now: DateTime<Utc>,
    horizon: Duration,
) -> SweepReport {
    crate::ingest::ensure_metrics_described();
    let cutoff = now - horizon;

    let evicted = catalog.retain_split(|e| e.published_at.with_timezone(&Utc) >= cutoff);
    let kept = catalog.len();

    let mut files_deleted = 0usize;
    for entry in &evicted {
        files_deleted += remove_files(media_root, entry).await;
    }

    counter!("retention_evicted_total").increment(evicted.len() as u64);
    gauge!("catalog_entries").set(kept as f64);
    gauge!("retention_last_run_ts").set(now.timestamp() as f64);
    tracing::info!(
        target: "retention",
        %cutoff,
        kept,
        evicted = evicted.len(),
        files_deleted,
        "retention sweep finished"
    );

    SweepReport {
        kept,
        evicted: evicted.len(),
        files_deleted,
    }
}

/// Media file plus sidecar; a file that is already gone is fine.
async fn remove_files(media_root: &Path, entry: &Entry) -> usize {
    let mut removed = 0usize;
    for rel in [entry.local_path.clone(), entry.sidecar_path()] {
        let path = media_root.join(&rel);
        match tokio::fs::remove_file(&path).await {
            Ok(()) => removed += 1,
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => tracing::warn!(error = %e, path = %path.display(), "could not delete evicted file"),
        }
    }
    removed
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn boundary_entry_is_kept() {
        let dir = tempfile::tempdir().unwrap();
        let cat = Catalog::new();
        let now = DateTime::parse_from_rfc3339("2024-06-08T00:00:00Z")
            .unwrap()
            .with_timezone(&Utc);
        let exactly = DateTime::parse_from_rfc3339("2024-06-01T00:00:00+00:00").unwrap();
        let just_before = DateTime::parse_from_rfc3339("2024-06-01T01:59:59+02:00").unwrap();
        cat.commit_batch(vec![
            Entry::new("c", "id", "edge", "d", exactly, "https://v/edge"),
            Entry::new("c", "id", "old", "d", just_before, "https://v/old"),
        ]);

        let report = sweep(&cat, dir.path(), now, Duration::days(7)).await;
        assert_eq!(report.kept, 1);
        assert_eq!(report.evicted, 1);
        assert_eq!(report.files_deleted, 0);
        assert_eq!(cat.snapshot()[0].title, "edge");
    }
}
