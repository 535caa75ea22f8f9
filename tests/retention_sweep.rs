// tests/retention_sweep.rs
use chrono::{DateTime, Duration, Utc};

use feed_harvester::retention::{sweep, SweepReport};
use feed_harvester::{Catalog, Entry};

fn at(s: &str) -> DateTime<chrono::FixedOffset> {
    DateTime::parse_from_rfc3339(s).expect("rfc3339")
}

fn touch(root: &std::path::Path, rel: &str) {
    let path = root.join(rel);
    std::fs::create_dir_all(path.parent().expect("parent")).expect("mkdir");
    std::fs::write(path, b"x").expect("write");
}

#[tokio::test]
async fn old_entries_and_their_files_are_removed() {
    let dir = tempfile::tempdir().expect("tempdir");
    let old = Entry::new("Chan", "UC1", "Old", "d", at("2024-01-01T12:00:00+00:00"), "https://v/old");
    let fresh = Entry::new("Chan", "UC1", "Fresh", "d", at("2024-06-01T12:00:00+00:00"), "https://v/new");
    for e in [&old, &fresh] {
        touch(dir.path(), &e.local_path);
        touch(dir.path(), &e.sidecar_path());
    }

    let catalog = Catalog::new();
    catalog.commit_batch(vec![old.clone(), fresh.clone()]);
    let before = catalog.snapshot();

    let now = at("2024-06-08T00:00:00+00:00").with_timezone(&Utc);
    let report = sweep(&catalog, dir.path(), now, Duration::days(7)).await;

    assert_eq!(report.evicted, 1);
    assert_eq!(report.kept, 1);
    assert_eq!(report.files_deleted, 2);
    assert_eq!(catalog.snapshot().as_ref(), &vec![fresh.clone()]);
    assert_eq!(before.len(), 2, "earlier snapshot is untouched");

    assert!(!dir.path().join(&old.local_path).exists());
    assert!(!dir.path().join(old.sidecar_path()).exists());
    assert!(dir.path().join(&fresh.local_path).exists());
    assert!(dir.path().join(fresh.sidecar_path()).exists());
}

#[tokio::test]
async fn missing_files_do_not_stop_the_sweep() {
    let dir = tempfile::tempdir().expect("tempdir");
    let catalog = Catalog::new();
    catalog.commit_batch(vec![
        Entry::new("Chan", "UC1", "Gone", "d", at("2024-01-01T12:00:00+00:00"), "https://v/1"),
        Entry::new("Chan", "UC1", "Also gone", "d", at("2024-01-02T12:00:00+00:00"), "https://v/2"),
    ]);

    let now = at("2024-06-08T00:00:00+00:00").with_timezone(&Utc);
    let report = sweep(&catalog, dir.path(), now, Duration::days(7)).await;
    assert_eq!(report.evicted, 2);
    assert_eq!(report.files_deleted, 0);
    assert!(catalog.is_empty());
}

#[tokio::test]
async fn empty_catalog_is_a_no_op() {
    let dir = tempfile::tempdir().expect("tempdir");
    let catalog = Catalog::new();
    let report = sweep(&catalog, dir.path(), Utc::now(), Duration::days(7)).await;
    assert_eq!(report, SweepReport::default());
}
