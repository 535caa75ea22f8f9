// src/ingest/scheduler.rs
use std::future::Future;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use chrono::{DateTime, NaiveTime, TimeZone, Utc};
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};

use crate::catalog::Catalog;
use crate::ingest::Harvester;
use crate::stats::{HostNetworkSampler, NetworkStatsHandle};

/// Run one job body on its own task so that an error or a panic ends up in
/// the log instead of taking the calling loop down.
pub async fn run_guarded<F>(job: &'static str, body: F)
where
    F: Future<Output = anyhow::Result<()>> + Send + 'static,
{
    match tokio::spawn(body).await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => tracing::warn!(job, error = ?e, "scheduled job failed"),
        Err(e) => tracing::error!(job, error = %e, "scheduled job panicked"),
    }
}

/// Hourly harvest: one pass right away, then one per `every`.
///
/// A pass that overruns its slot makes the next one start late; passes
/// never overlap because `Harvester::pass` holds a lock for the duration.
pub fn spawn_harvest_scheduler(harvester: Arc<Harvester>, every: Duration) -> JoinHandle<()> {
    let initial = harvester.clone();
    tokio::spawn(run_guarded("harvest", async move {
        initial.pass().await.map(|_| ())
    }));

    tokio::spawn(async move {
        tracing::info!(every_secs = every.as_secs(), "harvest scheduler started");
        let mut ticker = interval_at(Instant::now() + every, every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            let h = harvester.clone();
            run_guarded("harvest", async move { h.pass().await.map(|_| ()) }).await;
        }
    })
}

/// Next occurrence of the wall-clock time `at` (UTC) strictly after `now`.
pub fn next_daily_run(now: DateTime<Utc>, at: NaiveTime) -> DateTime<Utc> {
    let today = Utc.from_utc_datetime(&now.date_naive().and_time(at));
    if today > now {
        today
    } else {
        today + chrono::Duration::days(1)
    }
}

/// Daily retention sweep at `at` UTC.
pub fn spawn_retention_scheduler(
    catalog: Catalog,
    media_root: PathBuf,
    at: NaiveTime,
    horizon: chrono::Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        tracing::info!(%at, horizon_days = horizon.num_days(), "retention scheduler started");
        loop {
            let now = Utc::now();
            let next = next_daily_run(now, at);
            let wait = (next - now).to_std().unwrap_or(Duration::ZERO);
            tokio::time::sleep(wait).await;

            let catalog = catalog.clone();
            let root = media_root.clone();
            run_guarded("retention", async move {
                crate::retention::sweep(&catalog, &root, Utc::now(), horizon).await;
                anyhow::Ok(())
            })
            .await;
        }
    })
}

/// Samples host network counters every `every` into `stats`.
pub fn spawn_stats_sampler(stats: NetworkStatsHandle, every: Duration) -> JoinHandle<()> {
    let sampler = Arc::new(Mutex::new(HostNetworkSampler::new()));
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        loop {
            ticker.tick().await;
            let sampler = sampler.clone();
            let stats = stats.clone();
            run_guarded("stats", async move {
                let bytes = tokio::task::spawn_blocking(move || {
                    sampler
                        .lock()
                        .unwrap_or_else(PoisonError::into_inner)
                        .total_bytes()
                })
                .await?;
                stats.record(bytes, Utc::now());
                anyhow::Ok(())
            })
            .await;
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn utc(s: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(s).unwrap().with_timezone(&Utc)
    }

    #[test]
    fn next_run_is_later_today_or_tomorrow() {
        let midnight = NaiveTime::from_hms_opt(0, 0, 0).unwrap();
        assert_eq!(
            next_daily_run(utc("2024-06-07T13:45:00Z"), midnight),
            utc("2024-06-08T00:00:00Z")
        );
        // exactly on the mark schedules the following day
        assert_eq!(
            next_daily_run(utc("2024-06-08T00:00:00Z"), midnight),
            utc("2024-06-09T00:00:00Z")
        );
        let half_past_three = NaiveTime::from_hms_opt(3, 30, 0).unwrap();
        assert_eq!(
            next_daily_run(utc("2024-06-08T01:00:00Z"), half_past_three),
            utc("2024-06-08T03:30:00Z")
        );
    }

    fn explode() -> anyhow::Result<()> {
        panic!("kaboom")
    }

    #[tokio::test]
    async fn guarded_job_survives_error_and_panic() {
        run_guarded("failing", async { Err::<(), _>(anyhow::anyhow!("boom")) }).await;
        run_guarded("panicking", async { explode() }).await;
        // still here: the caller's loop would go on to the next tick
        run_guarded("ok", async { anyhow::Ok(()) }).await;
    }
}
