use std::fmt;
use tracing::{debug, error, info, warn};

use crate::cleanup::{is_file, remove_originals, should_remove_originals};
use crate::config::Config;
use crate::discovery::{VideoFile, discover_videos};
use crate::error::Result;
use crate::tools::{MergeReport, Muxer, SubtitleFetcher, ToolFactory};

/// What happened to a single video file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileOutcome {
    pub subtitles: usize,
    /// Present when a merge ran to completion
    pub merge: Option<MergeReport>,
    pub originals_removed: bool,
}

/// Totals for a whole run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub discovered: usize,
    pub with_subtitles: usize,
    pub merged: usize,
    pub merge_failed: usize,
    pub errored: usize,
    pub cleaned: usize,
}

impl RunSummary {
    fn record(&mut self, outcome: &FileOutcome) {
        if outcome.subtitles > 0 {
            self.with_subtitles += 1;
        }
        match &outcome.merge {
            Some(report) if report.success => self.merged += 1,
            Some(_) => self.merge_failed += 1,
            None => {}
        }
        if outcome.originals_removed {
            self.cleaned += 1;
        }
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} file(s) processed, {} with subtitles, {} merged, {} merge error(s), {} failed, {} cleaned up",
            self.discovered,
            self.with_subtitles,
            self.merged,
            self.merge_failed,
            self.errored,
            self.cleaned
        )
    }
}

pub struct Workflow {
    config: Config,
    fetcher: Box<dyn SubtitleFetcher>,
    muxer: Box<dyn Muxer>,
}

impl Workflow {
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;

        let fetcher = ToolFactory::create_fetcher(config.periscope.clone());
        let muxer = ToolFactory::create_muxer(config.mkvmerge.clone());

        Ok(Self::with_tools(config, fetcher, muxer))
    }

    pub fn with_tools(
        config: Config,
        fetcher: Box<dyn SubtitleFetcher>,
        muxer: Box<dyn Muxer>,
    ) -> Self {
        Self {
            config,
            fetcher,
            muxer,
        }
    }

    /// Process every video file below the configured directory, one at a time
    pub async fn run(&self) -> Result<RunSummary> {
        info!("Searching for video files in {}", self.config.dir.display());
        debug!("Cleanup policy: {}", self.config.cleanup);
        let videos = discover_videos(&self.config.dir)?;
        info!("Found {} video file(s)", videos.len());

        let mut summary = RunSummary {
            discovered: videos.len(),
            ..RunSummary::default()
        };

        for video in &videos {
            match self.process_file(video).await {
                Ok(outcome) => summary.record(&outcome),
                Err(e) => {
                    error!("Failed to process {}: {}", video.path().display(), e);
                    summary.errored += 1;
                }
            }
        }

        info!("{}", summary);
        Ok(summary)
    }

    /// Download subtitles for one file, merge them in and clean up per policy
    pub async fn process_file(&self, video: &VideoFile) -> Result<FileOutcome> {
        let language = &self.config.language;
        info!("Processing {}", video.path().display());

        let subtitles = self.fetcher.fetch(video, language).await?;
        info!("{} subtitle file(s) found", subtitles);

        if subtitles == 0 {
            return Ok(FileOutcome {
                subtitles,
                merge: None,
                originals_removed: false,
            });
        }

        let report = self.muxer.merge(video, language).await?;
        if report.success {
            info!("Merge complete for {}", video.path().display());
        } else {
            if !report.output.trim().is_empty() {
                info!("{}", report.output.trim_end());
            }
            if !report.diagnostics.trim().is_empty() {
                error!("{}", report.diagnostics.trim_end());
            }
            error!(
                "Merge error for {}: {}",
                video.path().display(),
                report.exit_code_text
            );
        }

        let merged_file_exists = is_file(&video.merged_path()).await;
        if !merged_file_exists && report.success {
            warn!(
                "Merge reported success but {} is missing",
                video.merged_path().display()
            );
        }

        let originals_removed =
            should_remove_originals(self.config.cleanup, &report, merged_file_exists);
        if originals_removed {
            info!("Cleaning up original files");
            remove_originals(video).await?;
        }

        Ok(FileOutcome {
            subtitles,
            merge: Some(report),
            originals_removed,
        })
    }
}
