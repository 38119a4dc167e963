//! mkv-submerge - Find and merge subtitles into MKV video files
//!
//! Walks a directory for video files, downloads subtitles for each one with
//! periscope and merges them into a new Matroska file with mkvmerge,
//! optionally deleting the originals afterwards.

pub mod cleanup;
pub mod cli;
pub mod config;
pub mod discovery;
pub mod error;
pub mod tools;
pub mod workflow;
