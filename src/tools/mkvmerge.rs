use async_trait::async_trait;
use std::time::Duration;
use tracing::{debug, info};

use crate::config::MkvMergeConfig;
use crate::discovery::VideoFile;
use crate::error::Result;
use super::{MergeReport, Muxer, ToolCommand, ToolOutput};

/// A merge only counts as successful when mkvmerge exits cleanly.
/// Exit code 1 means mkvmerge finished with warnings.
pub fn mux_succeeded(exit_code_text: &str) -> bool {
    exit_code_text == "OK"
}

/// Progress lines are shown at normal verbosity, everything else only when verbose
pub fn is_progress_line(line: &str) -> bool {
    line.get(..8)
        .is_some_and(|prefix| prefix.eq_ignore_ascii_case("progress"))
}

/// mkvmerge-backed muxer
pub struct MkvMerge {
    config: MkvMergeConfig,
}

impl MkvMerge {
    pub fn new(config: MkvMergeConfig) -> Self {
        Self { config }
    }

    pub fn command(&self, video: &VideoFile, language: &str) -> ToolCommand {
        ToolCommand::new(&self.config.binary_path, "Subtitle merge")
            .arg("-o")
            .path(video.merged_path())
            .args(["--default-track", "0"])
            .arg("--language")
            .arg(format!("0:{}", language))
            .path(video.subtitle_path())
            .path(video.path())
    }
}

#[async_trait]
impl Muxer for MkvMerge {
    async fn merge(&self, video: &VideoFile, language: &str) -> Result<MergeReport> {
        info!("Merging subtitles into MKV file");

        let output = self
            .command(video, language)
            .run_streaming(Duration::from_secs(self.config.timeout_secs), |_, line| {
                if is_progress_line(line) {
                    info!("{}", line);
                } else {
                    debug!("{}", line);
                }
            })
            .await?;

        Ok(merge_report(output))
    }
}

fn merge_report(output: ToolOutput) -> MergeReport {
    let exit_code_text = output.exit_code_text();
    MergeReport {
        exit_code_text: exit_code_text.to_string(),
        success: mux_succeeded(exit_code_text),
        output: output.stdout,
        diagnostics: output.stderr,
    }
}
