use once_cell::sync::Lazy;
use regex::Regex;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::error::{Result, SubmergeError};

/// Suffix of files produced by a merge; these are never picked up again
pub const MERGED_SUFFIX: &str = ".subs.mkv";

static VIDEO_NAME: Lazy<Regex> = Lazy::new(|| Regex::new(r"\.(avi|mkv)$").unwrap());

/// A video file found during discovery, with the sibling paths derived from it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoFile {
    path: PathBuf,
    base_name: String,
}

impl VideoFile {
    pub fn new<P: Into<PathBuf>>(path: P) -> Result<Self> {
        let path = path.into();
        let file_name = path
            .file_name()
            .and_then(|name| name.to_str())
            .ok_or_else(|| SubmergeError::InvalidFileName(path.display().to_string()))?;

        let base_name = match file_name.rfind('.') {
            Some(index) => &file_name[..index],
            None => file_name,
        };

        Ok(Self {
            base_name: base_name.to_string(),
            path,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// File name without its last extension
    pub fn base_name(&self) -> &str {
        &self.base_name
    }

    pub fn dir(&self) -> &Path {
        self.path.parent().unwrap_or_else(|| Path::new(""))
    }

    /// Where periscope deposits the downloaded subtitle
    pub fn subtitle_path(&self) -> PathBuf {
        self.dir().join(format!("{}.srt", self.base_name))
    }

    /// Where the merged container is written
    pub fn merged_path(&self) -> PathBuf {
        self.dir().join(format!("{}{}", self.base_name, MERGED_SUFFIX))
    }
}

fn is_candidate(file_name: &str) -> bool {
    VIDEO_NAME.is_match(file_name) && !file_name.ends_with(MERGED_SUFFIX)
}

/// Find all unmerged .avi and .mkv files below `dir`, sorted by path
pub fn discover_videos<P: AsRef<Path>>(dir: P) -> Result<Vec<VideoFile>> {
    let dir = dir.as_ref();
    let root = dir.canonicalize().map_err(|e| {
        std::io::Error::new(e.kind(), format!("{}: {}", dir.display(), e))
    })?;
    if !root.is_dir() {
        return Err(SubmergeError::Io(std::io::Error::new(
            std::io::ErrorKind::NotADirectory,
            format!("{} is not a directory", dir.display()),
        )));
    }

    let mut videos = Vec::new();
    // Dot files and dot directories (.git, .Trash-1000, ._movie.mkv) are skipped
    let walker = WalkDir::new(&root)
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || !e.file_name().to_string_lossy().starts_with('.'));

    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            // The base directory itself must be readable
            Err(e) if e.depth() == 0 => return Err(e.into()),
            Err(e) => {
                warn!("Skipping unreadable entry: {}", e);
                continue;
            }
        };

        if !entry.file_type().is_file() {
            continue;
        }

        let Some(file_name) = entry.file_name().to_str() else {
            warn!("Skipping non UTF-8 file name: {}", entry.path().display());
            continue;
        };

        if is_candidate(file_name) {
            debug!("Found video file: {}", entry.path().display());
            videos.push(VideoFile::new(entry.into_path())?);
        }
    }

    // Plain byte order of the whole path, so "a-b.mkv" sorts before "a/b.mkv"
    videos.sort_by(|a, b| {
        a.path
            .as_os_str()
            .as_encoded_bytes()
            .cmp(b.path.as_os_str().as_encoded_bytes())
    });
    Ok(videos)
}
