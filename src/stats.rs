//! Host resource statistics shown on the browsing page: network usage
//! accumulated by a background sampler, and disk usage of the media root.

use std::path::Path;
use std::sync::{Arc, Mutex, PoisonError};

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use sysinfo::{Disks, Networks};

const MIB: f64 = 1024.0 * 1024.0;
const GIB: f64 = 1024.0 * 1024.0 * 1024.0;

/// Network counters rolled up per UTC day.
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct NetworkStats {
    /// Latest reading of bytes sent + received, in MiB.
    pub current_mb: f64,
    /// One reading per finished day, in GiB.
    pub past_usage_gb: Vec<f64>,
    /// Sum of `past_usage_gb`, kept once more than one day is recorded.
    pub total_gb: f64,
    #[serde(skip)]
    last_day: Option<NaiveDate>,
    #[serde(skip)]
    last_bytes: u64,
}

impl NetworkStats {
    /// Fold one host reading (cumulative bytes) taken at `now` into the stats.
    /// The first reading of a new day closes the previous one.
    pub fn record_sample(&mut self, total_bytes: u64, now: DateTime<Utc>) {
        let today = now.date_naive();
        if let Some(day) = self.last_day {
            if day != today {
                self.past_usage_gb.push(self.last_bytes as f64 / GIB);
                if self.past_usage_gb.len() > 1 {
                    self.total_gb = self.past_usage_gb.iter().sum();
                }
            }
        }
        self.last_day = Some(today);
        self.last_bytes = total_bytes;
        self.current_mb = total_bytes as f64 / MIB;
    }

    /// Average daily usage in GiB, 0 before the first day closes.
    pub fn average_gb(&self) -> f64 {
        if self.past_usage_gb.is_empty() {
            0.0
        } else {
            self.total_gb / self.past_usage_gb.len() as f64
        }
    }
}

/// Shared accumulator written by the sampler and read by the page.
#[derive(Debug, Clone, Default)]
pub struct NetworkStatsHandle {
    inner: Arc<Mutex<NetworkStats>>,
}

impl NetworkStatsHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> NetworkStats {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn record(&self, total_bytes: u64, now: DateTime<Utc>) {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .record_sample(total_bytes, now);
    }
}

/// Reads cumulative host network counters.
pub struct HostNetworkSampler {
    networks: Networks,
}

impl HostNetworkSampler {
    pub fn new() -> Self {
        Self {
            networks: Networks::new_with_refreshed_list(),
        }
    }

    /// Bytes sent + received across all interfaces since boot.
    pub fn total_bytes(&mut self) -> u64 {
        self.networks.refresh(true);
        self.networks
            .list()
            .values()
            .map(|data| data.total_received() + data.total_transmitted())
            .sum()
    }
}

impl Default for HostNetworkSampler {
    fn default() -> Self {
        Self::new()
    }
}

/// Disk usage in whole GiB.
#[derive(Debug, Clone, Copy, Default, Serialize, PartialEq, Eq)]
pub struct DiskUsage {
    pub total: u64,
    pub used: u64,
    pub free: u64,
}

impl DiskUsage {
    pub fn from_bytes(total: u64, available: u64) -> Self {
        let gib = 1u64 << 30;
        Self {
            total: total / gib,
            used: total.saturating_sub(available) / gib,
            free: available / gib,
        }
    }
}

/// Usage of the filesystem that holds `path`: the disk whose mount point is the
/// longest prefix of the canonical path.
pub fn disk_usage(path: &Path) -> Option<DiskUsage> {
    let canonical = std::fs::canonicalize(path).ok()?;
    let disks = Disks::new_with_refreshed_list();
    disks
        .list()
        .iter()
        .filter(|d| canonical.starts_with(d.mount_point()))
        .max_by_key(|d| d.mount_point().as_os_str().len())
        .map(|d| DiskUsage::from_bytes(d.total_space(), d.available_space()))
}
