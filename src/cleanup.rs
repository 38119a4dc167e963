use std::io::ErrorKind;
use std::path::Path;
use tokio::fs;
use tracing::{debug, warn};

use crate::config::CleanupPolicy;
use crate::discovery::VideoFile;
use crate::error::Result;
use crate::tools::MergeReport;

/// Whether the originals of a finished merge should be deleted
pub fn should_remove_originals(
    policy: CleanupPolicy,
    report: &MergeReport,
    merged_file_exists: bool,
) -> bool {
    match policy {
        CleanupPolicy::None => false,
        CleanupPolicy::MergeComplete => merged_file_exists,
        CleanupPolicy::MergeSuccess => report.success,
    }
}

/// Delete the downloaded subtitle and the original video. The merged file is kept.
pub async fn remove_originals(video: &VideoFile) -> Result<()> {
    let subtitle_path = video.subtitle_path();
    match fs::remove_file(&subtitle_path).await {
        Ok(()) => debug!("Removed {}", subtitle_path.display()),
        Err(e) if e.kind() == ErrorKind::NotFound => {
            warn!("Subtitle file {} not found", subtitle_path.display());
        }
        Err(e) => return Err(e.into()),
    }

    fs::remove_file(video.path()).await?;
    debug!("Removed {}", video.path().display());
    Ok(())
}

pub async fn is_file(path: &Path) -> bool {
    fs::metadata(path)
        .await
        .map(|metadata| metadata.is_file())
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report(success: bool) -> MergeReport {
        MergeReport {
            exit_code_text: if success { "OK" } else { "General error" }.to_string(),
            success,
            output: String::new(),
            diagnostics: String::new(),
        }
    }

    #[test]
    fn test_none_never_removes() {
        for success in [true, false] {
            for exists in [true, false] {
                assert!(!should_remove_originals(
                    CleanupPolicy::None,
                    &report(success),
                    exists
                ));
            }
        }
    }

    #[test]
    fn test_merge_complete_follows_output_file() {
        assert!(should_remove_originals(CleanupPolicy::MergeComplete, &report(false), true));
        assert!(should_remove_originals(CleanupPolicy::MergeComplete, &report(true), true));
        assert!(!should_remove_originals(CleanupPolicy::MergeComplete, &report(true), false));
    }

    #[test]
    fn test_merge_success_follows_exit_text() {
        assert!(should_remove_originals(CleanupPolicy::MergeSuccess, &report(true), false));
        assert!(!should_remove_originals(CleanupPolicy::MergeSuccess, &report(false), true));
    }

    #[tokio::test]
    async fn test_remove_originals_keeps_merged_file() {
        let dir = tempfile::tempdir().unwrap();
        let video_path = dir.path().join("movie.mkv");
        std::fs::write(&video_path, b"video").unwrap();
        std::fs::write(dir.path().join("movie.srt"), b"1\n").unwrap();
        std::fs::write(dir.path().join("movie.subs.mkv"), b"merged").unwrap();

        let video = VideoFile::new(&video_path).unwrap();
        remove_originals(&video).await.unwrap();

        assert!(!video_path.exists());
        assert!(!dir.path().join("movie.srt").exists());
        assert!(dir.path().join("movie.subs.mkv").exists());
    }

    #[tokio::test]
    async fn test_remove_originals_tolerates_missing_subtitle() {
        let dir = tempfile::tempdir().unwrap();
        let video_path = dir.path().join("clip.avi");
        std::fs::write(&video_path, b"video").unwrap();

        let video = VideoFile::new(&video_path).unwrap();
        remove_originals(&video).await.unwrap();
        assert!(!video_path.exists());
    }

    #[tokio::test]
    async fn test_is_file() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("movie.subs.mkv");
        assert!(!is_file(&file).await);
        std::fs::write(&file, b"merged").unwrap();
        assert!(is_file(&file).await);
        assert!(!is_file(dir.path()).await);
    }
}
