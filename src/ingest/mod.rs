// src/ingest/mod.rs
pub mod materialize;
pub mod providers;
pub mod scheduler;
pub mod types;

use std::path::PathBuf;

use anyhow::Result;
use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram};
use once_cell::sync::OnceCell;
use tokio::sync::Mutex;

use crate::catalog::Catalog;
use crate::ingest::materialize::Materializer;

/// One-time metrics registration (so series show up on /metrics).
pub(crate) fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("harvest_passes_total", "Completed harvest passes.");
        describe_counter!(
            "harvest_source_errors_total",
            "Sources skipped because they could not be resolved."
        );
        describe_histogram!("harvest_pass_ms", "Harvest pass duration in milliseconds.");
        describe_counter!(
            "media_fetch_total",
            "Per-item media outcomes (fetched, already_present, no_stream, failed)."
        );
        describe_gauge!("catalog_entries", "Entries currently held in the catalog.");
        describe_counter!("retention_evicted_total", "Entries evicted by retention.");
        describe_gauge!(
            "retention_last_run_ts",
            "Unix ts when the retention sweep last ran."
        );
        describe_counter!("feed_items_total", "Items parsed from remote feeds.");
        describe_histogram!("feed_parse_ms", "Feed parse time in milliseconds.");
    });
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HarvestReport {
    pub sources: usize,
    pub failed_sources: usize,
    pub entries: usize,
    pub added: usize,
}

/// Materialize every source in order and commit the combined batch in one swap.
/// A source that fails to resolve is logged and skipped.
pub async fn run_once(
    materializer: &Materializer,
    source_ids: &[String],
    catalog: &Catalog,
) -> HarvestReport {
    ensure_metrics_described();
    let t0 = std::time::Instant::now();

    let mut batch = Vec::new();
    let mut failed = 0usize;
    for id in source_ids {
        match materializer.materialize(id).await {
            Ok(mut entries) => {
                tracing::debug!(source = %id, items = entries.len(), "source harvested");
                batch.append(&mut entries);
            }
            Err(e) => {
                tracing::warn!(error = %e, source = %id, "source skipped");
                counter!("harvest_source_errors_total").increment(1);
                failed += 1;
            }
        }
    }

    let entries = batch.len();
    let added = catalog.commit_batch(batch);

    counter!("harvest_passes_total").increment(1);
    gauge!("catalog_entries").set(catalog.len() as f64);
    histogram!("harvest_pass_ms").record(t0.elapsed().as_secs_f64() * 1_000.0);

    HarvestReport {
        sources: source_ids.len(),
        failed_sources: failed,
        entries,
        added,
    }
}

/// Everything a harvest pass needs, plus the lock that keeps passes from overlapping.
pub struct Harvester {
    materializer: Materializer,
    registry: PathBuf,
    catalog: Catalog,
    running: Mutex<()>,
}

impl Harvester {
    pub fn new(materializer: Materializer, registry: impl Into<PathBuf>, catalog: Catalog) -> Self {
        Self {
            materializer,
            registry: registry.into(),
            catalog,
            running: Mutex::new(()),
        }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Re-read the registry and run one pass. Waits for a pass already in flight.
    pub async fn pass(&self) -> Result<HarvestReport> {
        let _guard = self.running.lock().await;
        let ids = crate::registry::load_lines(&self.registry).await?;
        let report = run_once(&self.materializer, &ids, &self.catalog).await;
        tracing::info!(
            target: "ingest",
            sources = report.sources,
            failed = report.failed_sources,
            entries = report.entries,
            added = report.added,
            "harvest pass finished"
        );
        Ok(report)
    }
}
