// External tool adapters
//
// Both collaborators are only observable through their text output, so the
// scraping lives here behind two narrow traits:
// - SubtitleFetcher: periscope, reports how many subtitles were downloaded
// - Muxer: mkvmerge, reports whether the merge finished cleanly

pub mod commands;
pub mod mkvmerge;
pub mod periscope;

use async_trait::async_trait;

pub use commands::*;
pub use mkvmerge::{MkvMerge, is_progress_line, mux_succeeded};
pub use periscope::{Periscope, subtitle_count};

use crate::config::{MkvMergeConfig, PeriscopeConfig};
use crate::discovery::VideoFile;
use crate::error::Result;

/// Result of a merge that ran to completion
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeReport {
    /// Description of the exit status, "OK" on success
    pub exit_code_text: String,
    pub success: bool,
    /// Everything the muxer wrote to stdout
    pub output: String,
    /// Everything the muxer wrote to stderr
    pub diagnostics: String,
}

/// Downloads subtitles next to a video file
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SubtitleFetcher: Send + Sync {
    /// Number of subtitle files downloaded for `video`
    async fn fetch(&self, video: &VideoFile, language: &str) -> Result<usize>;
}

/// Merges a video and its subtitle into a new container
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Muxer: Send + Sync {
    async fn merge(&self, video: &VideoFile, language: &str) -> Result<MergeReport>;
}

/// Factory for the default tool implementations
pub struct ToolFactory;

impl ToolFactory {
    pub fn create_fetcher(config: PeriscopeConfig) -> Box<dyn SubtitleFetcher> {
        Box::new(Periscope::new(config))
    }

    pub fn create_muxer(config: MkvMergeConfig) -> Box<dyn Muxer> {
        Box::new(MkvMerge::new(config))
    }
}
