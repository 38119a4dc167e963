use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use std::time::Duration;
use tracing::debug;

use crate::config::PeriscopeConfig;
use crate::discovery::VideoFile;
use crate::error::Result;
use super::{SubtitleFetcher, ToolCommand};

static DOWNLOADED: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)Downloaded ([0-9]+) subtitles").unwrap());

/// Number of subtitles periscope reports on its diagnostic stream.
///
/// No recognizable report counts as nothing downloaded. Counts too large
/// for `usize` saturate instead of reading as zero.
pub fn subtitle_count(diagnostics: &str) -> usize {
    let Some(caps) = DOWNLOADED.captures(diagnostics) else {
        return 0;
    };
    let digits = &caps[1];
    digits.parse().unwrap_or_else(|_| {
        if digits.bytes().any(|b| b != b'0') {
            usize::MAX
        } else {
            0
        }
    })
}

/// periscope-backed subtitle fetcher
pub struct Periscope {
    config: PeriscopeConfig,
}

impl Periscope {
    pub fn new(config: PeriscopeConfig) -> Self {
        Self { config }
    }

    pub fn command(&self, video: &VideoFile, language: &str) -> ToolCommand {
        ToolCommand::new(&self.config.binary_path, "Subtitle download")
            .path(video.path())
            .arg("-l")
            .arg(language)
            .arg("--force")
    }
}

#[async_trait]
impl SubtitleFetcher for Periscope {
    async fn fetch(&self, video: &VideoFile, language: &str) -> Result<usize> {
        let output = self
            .command(video, language)
            .run_captured(Duration::from_secs(self.config.timeout_secs))
            .await?;

        // periscope's exit status is unreliable; only its report is trusted
        if !output.stderr.trim().is_empty() {
            debug!("{}", output.stderr.trim_end());
        }
        debug!("periscope exited with: {}", output.exit_code_text());

        Ok(subtitle_count(&output.stderr))
    }
}
