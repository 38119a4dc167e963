use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::cli::Args;
use crate::error::{Result, SubmergeError};

/// Default timeout of the subtitle download step, in seconds
pub const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 60;

/// Default timeout of the merge step, in seconds
pub const DEFAULT_MERGE_TIMEOUT_SECS: u64 = 600;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Base directory searched for video files
    pub dir: PathBuf,
    /// Language to retrieve subtitles in, also used to tag the merged track
    pub language: String,
    /// Strategy for deleting original files after a merge
    pub cleanup: CleanupPolicy,
    /// Optional directory for a daily-rolling log file
    pub log_dir: Option<PathBuf>,
    pub periscope: PeriscopeConfig,
    pub mkvmerge: MkvMergeConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PeriscopeConfig {
    /// Path to periscope executable
    pub binary_path: String,
    /// Seconds before a subtitle download is abandoned
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MkvMergeConfig {
    /// Path to mkvmerge executable
    pub binary_path: String,
    /// Seconds before a merge is killed
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CleanupPolicy {
    /// Never delete original files
    #[default]
    None,
    /// Delete if the merge process leaves an MKV file
    MergeComplete,
    /// Delete if the merge process completed without errors or warnings
    MergeSuccess,
}

impl CleanupPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            CleanupPolicy::None => "none",
            CleanupPolicy::MergeComplete => "merge-complete",
            CleanupPolicy::MergeSuccess => "merge-success",
        }
    }
}

impl fmt::Display for CleanupPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CleanupPolicy {
    type Err = SubmergeError;

    fn from_str(policy: &str) -> Result<Self> {
        match policy.to_lowercase().as_str() {
            "none" => Ok(CleanupPolicy::None),
            "merge-complete" => Ok(CleanupPolicy::MergeComplete),
            "merge-success" => Ok(CleanupPolicy::MergeSuccess),
            _ => Err(SubmergeError::Config(format!(
                "Invalid cleanup policy '{}'. Valid policies: none, merge-complete, merge-success",
                policy
            ))),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            dir: std::env::current_dir().unwrap_or_default(),
            language: "en".to_string(),
            cleanup: CleanupPolicy::None,
            log_dir: None,
            periscope: PeriscopeConfig::default(),
            mkvmerge: MkvMergeConfig::default(),
        }
    }
}

impl Default for PeriscopeConfig {
    fn default() -> Self {
        Self {
            binary_path: "periscope".to_string(),
            timeout_secs: DEFAULT_FETCH_TIMEOUT_SECS,
        }
    }
}

impl Default for MkvMergeConfig {
    fn default() -> Self {
        Self {
            binary_path: "mkvmerge".to_string(),
            timeout_secs: DEFAULT_MERGE_TIMEOUT_SECS,
        }
    }
}

impl Config {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| SubmergeError::Config(format!("Failed to read config file: {}", e)))?;

        Ok(toml::from_str(&content)?)
    }

    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| SubmergeError::Config(format!("Failed to serialize config: {}", e)))?;

        std::fs::write(path, content)
            .map_err(|e| SubmergeError::Config(format!("Failed to write config file: {}", e)))?;

        Ok(())
    }

    /// Layer command line flags over the loaded configuration
    pub fn apply_args(&mut self, args: &Args) -> Result<()> {
        if let Some(dir) = &args.dir {
            self.dir = dir.clone();
        }
        if let Some(mkvmerge) = &args.mkvmerge {
            self.mkvmerge.binary_path = mkvmerge.clone();
        }
        if let Some(periscope) = &args.periscope {
            self.periscope.binary_path = periscope.clone();
        }
        if let Some(lang) = &args.lang {
            self.language = lang.clone();
        }
        if let Some(cleanup) = &args.cleanup {
            self.cleanup = cleanup.parse()?;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.language.is_empty()
            || !self
                .language
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        {
            return Err(SubmergeError::Config(format!(
                "Invalid language code '{}'",
                self.language
            )));
        }
        if self.periscope.binary_path.is_empty() {
            return Err(SubmergeError::Config("periscope path is empty".to_string()));
        }
        if self.mkvmerge.binary_path.is_empty() {
            return Err(SubmergeError::Config("mkvmerge path is empty".to_string()));
        }
        if self.periscope.timeout_secs == 0 || self.mkvmerge.timeout_secs == 0 {
            return Err(SubmergeError::Config(
                "Timeouts must be at least one second".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.language, "en");
        assert_eq!(config.cleanup, CleanupPolicy::None);
        assert_eq!(config.periscope.binary_path, "periscope");
        assert_eq!(config.mkvmerge.binary_path, "mkvmerge");
        assert_eq!(config.mkvmerge.timeout_secs, 600);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_cleanup_policy() {
        assert_eq!("none".parse::<CleanupPolicy>().unwrap(), CleanupPolicy::None);
        assert_eq!(
            "merge-complete".parse::<CleanupPolicy>().unwrap(),
            CleanupPolicy::MergeComplete
        );
        assert_eq!(
            "Merge-Success".parse::<CleanupPolicy>().unwrap(),
            CleanupPolicy::MergeSuccess
        );
        assert!(matches!(
            "always".parse::<CleanupPolicy>(),
            Err(SubmergeError::Config(_))
        ));
    }

    #[test]
    fn test_partial_config_file_keeps_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mkv-submerge.toml");
        std::fs::write(
            &path,
            "language = \"nl\"\ncleanup = \"merge-success\"\n\n[mkvmerge]\nbinary_path = \"/opt/mkvtoolnix/mkvmerge\"\n",
        )
        .unwrap();

        let config = Config::from_file(&path).unwrap();
        assert_eq!(config.language, "nl");
        assert_eq!(config.cleanup, CleanupPolicy::MergeSuccess);
        assert_eq!(config.mkvmerge.binary_path, "/opt/mkvtoolnix/mkvmerge");
        assert_eq!(config.mkvmerge.timeout_secs, DEFAULT_MERGE_TIMEOUT_SECS);
        assert_eq!(config.periscope.binary_path, "periscope");
    }

    #[test]
    fn test_timeout_only_table() {
        let config: Config = toml::from_str("[periscope]\ntimeout_secs = 120\n").unwrap();
        assert_eq!(config.periscope.timeout_secs, 120);
        assert_eq!(config.periscope.binary_path, "periscope");
    }

    #[test]
    fn test_unknown_cleanup_in_file_is_rejected() {
        assert!(toml::from_str::<Config>("cleanup = \"always\"\n").is_err());
    }

    #[test]
    fn test_malformed_config_file_is_a_toml_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.toml");
        std::fs::write(&path, "language = \"en\"\n[mkvmerge\n").unwrap();
        assert!(matches!(Config::from_file(&path), Err(SubmergeError::Toml(_))));
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("saved.toml");
        let mut config = Config::default();
        config.cleanup = CleanupPolicy::MergeComplete;
        config.save_to_file(&path).unwrap();

        let loaded = Config::from_file(&path).unwrap();
        assert_eq!(loaded.cleanup, CleanupPolicy::MergeComplete);
        assert_eq!(loaded.language, config.language);
    }

    #[test]
    fn test_args_override_file_values() {
        let mut config = Config::default();
        config.language = "fr".to_string();
        config.cleanup = CleanupPolicy::MergeComplete;

        let args = Args::parse_from([
            "mkv-submerge",
            "--lang",
            "de",
            "--periscope",
            "/usr/local/bin/periscope",
        ]);
        config.apply_args(&args).unwrap();

        assert_eq!(config.language, "de");
        assert_eq!(config.periscope.binary_path, "/usr/local/bin/periscope");
        // untouched by the command line
        assert_eq!(config.cleanup, CleanupPolicy::MergeComplete);
    }

    #[test]
    fn test_saved_config_includes_command_line_flags() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mkv-submerge.toml");
        let args = Args::parse_from([
            "mkv-submerge",
            "--cleanup",
            "merge-complete",
            "--mkvmerge",
            "/opt/mkvtoolnix/mkvmerge",
            "--save-config",
            "unused.toml",
        ]);

        let mut config = Config::default();
        config.apply_args(&args).unwrap();
        config.save_to_file(&path).unwrap();

        let loaded = Config::from_file(&path).unwrap();
        assert_eq!(loaded.cleanup, CleanupPolicy::MergeComplete);
        assert_eq!(loaded.mkvmerge.binary_path, "/opt/mkvtoolnix/mkvmerge");
        assert_eq!(loaded.periscope.timeout_secs, DEFAULT_FETCH_TIMEOUT_SECS);
    }

    #[test]
    fn test_invalid_cleanup_flag_is_rejected() {
        let mut config = Config::default();
        let args = Args::parse_from(["mkv-submerge", "--cleanup", "sometimes"]);
        assert!(config.apply_args(&args).is_err());
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = Config::default();
        config.language = "en; rm -rf".to_string();
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.mkvmerge.timeout_secs = 0;
        assert!(config.validate().is_err());
    }
}
