// src/ingest/providers/ytdlp.rs
use std::path::Path;
use std::process::Stdio;

use async_trait::async_trait;
use tokio::process::Command;

use crate::ingest::types::{FetchError, MediaFetcher};

/// Best single file that already carries both audio and video, mp4 container.
pub const COMBINED_MP4_FORMAT: &str = "best[ext=mp4][acodec!=none][vcodec!=none]";

const NO_FORMAT_MARKER: &str = "requested format is not available";

/// Shells out to a yt-dlp compatible downloader.
#[derive(Debug, Clone)]
pub struct CommandFetcher {
    program: String,
}

impl CommandFetcher {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    pub fn args(link: &str, dest: &Path) -> Vec<String> {
        vec![
            "--no-playlist".to_string(),
            "--quiet".to_string(),
            "-f".to_string(),
            COMBINED_MP4_FORMAT.to_string(),
            "-o".to_string(),
            dest.to_string_lossy().into_owned(),
            link.to_string(),
        ]
    }
}

/// Map a failed run's stderr onto the error taxonomy.
pub fn classify_failure(stderr: &str) -> FetchError {
    if stderr.to_ascii_lowercase().contains(NO_FORMAT_MARKER) {
        return FetchError::NoStream;
    }
    let last = stderr
        .lines()
        .rev()
        .find(|l| !l.trim().is_empty())
        .unwrap_or("downloader exited with an error");
    FetchError::Transfer(last.trim().to_string())
}

#[async_trait]
impl MediaFetcher for CommandFetcher {
    async fn fetch(&self, link: &str, dest: &Path) -> Result<(), FetchError> {
        let out = Command::new(&self.program)
            .args(Self::args(link, dest))
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|e| FetchError::Transfer(format!("spawning {}: {e}", self.program)))?;

        if out.status.success() {
            return Ok(());
        }
        Err(classify_failure(&String::from_utf8_lossy(&out.stderr)))
    }
}
