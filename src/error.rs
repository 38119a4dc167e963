use thiserror::Error;

#[derive(Error, Debug)]
pub enum SubmergeError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Directory walk error: {0}")]
    Walk(#[from] walkdir::Error),

    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Failed to launch {tool}: {source}")]
    Launch {
        tool: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{0} timed out after {1} seconds")]
    Timeout(String, u64),

    #[error("Invalid video file name: {0}")]
    InvalidFileName(String),
}

pub type Result<T> = std::result::Result<T, SubmergeError>;
