// src/config/app.rs
use anyhow::{anyhow, bail, Context, Result};
use chrono::NaiveTime;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

pub const ENV_CONFIG_PATH: &str = "HARVESTER_CONFIG";
pub const ENV_BIND: &str = "HARVESTER_BIND";
pub const ENV_MEDIA_ROOT: &str = "HARVESTER_MEDIA_ROOT";

const DEFAULT_TOML_PATH: &str = "config/harvester.toml";
const DEFAULT_JSON_PATH: &str = "config/harvester.json";

fn default_media_root() -> PathBuf {
    PathBuf::from("youtube_videos")
}
fn default_sources_file() -> PathBuf {
    PathBuf::from("channel_ids.txt")
}
fn default_feeds_file() -> PathBuf {
    PathBuf::from("rss_feeds.txt")
}
fn default_bind_addr() -> String {
    "127.0.0.1:8000".to_string()
}
fn default_public_base_url() -> String {
    "http://localhost:8000".to_string()
}
fn default_channel_feed_base() -> String {
    "https://www.youtube.com/feeds/videos.xml?channel_id=".to_string()
}
fn default_downloader() -> String {
    "yt-dlp".to_string()
}
fn default_harvest_interval_secs() -> u64 {
    3600
}
fn default_retention_days() -> i64 {
    7
}
fn default_retention_at() -> String {
    "00:00".to_string()
}
fn default_stats_interval_secs() -> u64 {
    60
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Directory the media layout lives under; also served at `/videos`.
    #[serde(default = "default_media_root")]
    pub media_root: PathBuf,
    #[serde(default = "default_sources_file")]
    pub sources_file: PathBuf,
    #[serde(default = "default_feeds_file")]
    pub feeds_file: PathBuf,
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,
    /// Absolute base used for self links and enclosure URLs in published feeds.
    #[serde(default = "default_public_base_url")]
    pub public_base_url: String,
    /// A source id is appended to this to get its feed URL.
    #[serde(default = "default_channel_feed_base")]
    pub channel_feed_base: String,
    #[serde(default = "default_downloader")]
    pub downloader: String,
    #[serde(default = "default_harvest_interval_secs")]
    pub harvest_interval_secs: u64,
    #[serde(default = "default_retention_days")]
    pub retention_days: i64,
    /// Daily sweep time, `HH:MM` in UTC.
    #[serde(default = "default_retention_at")]
    pub retention_at: String,
    #[serde(default = "default_stats_interval_secs")]
    pub stats_interval_secs: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            media_root: default_media_root(),
            sources_file: default_sources_file(),
            feeds_file: default_feeds_file(),
            bind_addr: default_bind_addr(),
            public_base_url: default_public_base_url(),
            channel_feed_base: default_channel_feed_base(),
            downloader: default_downloader(),
            harvest_interval_secs: default_harvest_interval_secs(),
            retention_days: default_retention_days(),
            retention_at: default_retention_at(),
            stats_interval_secs: default_stats_interval_secs(),
        }
    }
}

impl AppConfig {
    /// Load from an explicit path. Supports TOML or JSON formats.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("reading config from {}", path.display()))?;
        let ext = path
            .extension()
            .and_then(|s| s.to_str())
            .unwrap_or_default()
            .to_ascii_lowercase();
        let cfg = parse_config(&content, ext.as_str())?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Load using env var + fallbacks, then apply env overrides:
    /// 1) $HARVESTER_CONFIG
    /// 2) config/harvester.toml
    /// 3) config/harvester.json
    /// 4) built-in defaults
    pub fn load_default() -> Result<Self> {
        let mut cfg = if let Ok(p) = std::env::var(ENV_CONFIG_PATH) {
            let pb = PathBuf::from(p);
            if !pb.exists() {
                return Err(anyhow!("HARVESTER_CONFIG points to non-existent path"));
            }
            Self::load_from_file(&pb)?
        } else if Path::new(DEFAULT_TOML_PATH).exists() {
            Self::load_from_file(Path::new(DEFAULT_TOML_PATH))?
        } else if Path::new(DEFAULT_JSON_PATH).exists() {
            Self::load_from_file(Path::new(DEFAULT_JSON_PATH))?
        } else {
            Self::default()
        };

        if let Ok(bind) = std::env::var(ENV_BIND) {
            if !bind.trim().is_empty() {
                cfg.bind_addr = bind.trim().to_string();
            }
        }
        if let Ok(root) = std::env::var(ENV_MEDIA_ROOT) {
            if !root.trim().is_empty() {
                cfg.media_root = PathBuf::from(root.trim());
            }
        }
        Ok(cfg)
    }

    pub fn harvest_interval(&self) -> Duration {
        Duration::from_secs(self.harvest_interval_secs.max(1))
    }

    pub fn stats_interval(&self) -> Duration {
        Duration::from_secs(self.stats_interval_secs.max(1))
    }

    pub fn retention_horizon(&self) -> chrono::Duration {
        chrono::Duration::days(self.retention_days)
    }

    /// `retention_at` as a wall-clock time.
    pub fn retention_time(&self) -> Result<NaiveTime> {
        NaiveTime::parse_from_str(self.retention_at.trim(), "%H:%M")
            .with_context(|| format!("retention_at '{}' is not HH:MM", self.retention_at))
    }

    /// Base URL without a trailing slash.
    pub fn base_url(&self) -> &str {
        self.public_base_url.trim_end_matches('/')
    }

    fn validate(&self) -> Result<()> {
        if self.retention_days <= 0 {
            bail!("retention_days must be positive, got {}", self.retention_days);
        }
        self.retention_time()?;
        Ok(())
    }
}

fn parse_config(s: &str, hint_ext: &str) -> Result<AppConfig> {
    // JSON when hinted or when the content looks like an object.
    let try_json = hint_ext == "json" || s.trim_start().starts_with('{');
    if try_json {
        return serde_json::from_str(s).context("parsing JSON config");
    }
    toml::from_str(s).context("parsing TOML config")
}
