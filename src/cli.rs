use clap::Parser;
use std::path::PathBuf;

/// Find and merge subtitles into MKV video files
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,

    /// Configuration file path
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Base directory when searching for video files [default: current directory]
    #[arg(long)]
    pub dir: Option<PathBuf>,

    /// Path to mkvmerge executable [default: mkvmerge]
    #[arg(long)]
    pub mkvmerge: Option<String>,

    /// Path to periscope executable [default: periscope]
    #[arg(long)]
    pub periscope: Option<String>,

    /// Language to retrieve subtitles in [default: en]
    #[arg(long)]
    pub lang: Option<String>,

    /// Strategy for deleting original files [default: none]
    ///
    /// - none: never delete original files
    /// - merge-complete: delete if the merge process leaves an MKV file
    /// - merge-success: delete if the merge process completed without errors or warnings
    #[arg(long, value_name = "POLICY")]
    pub cleanup: Option<String>,

    /// Write the effective configuration to a TOML file and exit
    #[arg(long, value_name = "PATH")]
    pub save_config: Option<PathBuf>,
}
