//! YouTube Audio Extractor - A Rust CLI tool for pulling MP3 audio tracks out of video URLs
//!
//! The heavy lifting is delegated to external tools: `yt-dlp` downloads the best audio
//! stream, `ffprobe` measures it and `ffmpeg` transcodes it to MP3. This library wires
//! those processes together, renders their progress and keeps temporary files in check.

pub mod cli;
pub mod config;
pub mod extract;
pub mod extractors;
pub mod options;
pub mod output;
pub mod utils;

pub use cli::Cli;
pub use config::Config;
pub use extract::{BatchSummary, ExtractionPipeline, OverwritePrompt, StdinPrompt};
pub use extractors::{ExternalTools, MediaToolkit};
pub use options::{Quality, RunOptions};
pub use output::{Console, RunLog};

/// Result type used throughout the library
pub type Result<T, E = ExtractError> = std::result::Result<T, E>;

/// Error types specific to the extractor
#[derive(thiserror::Error, Debug)]
pub enum ExtractError {
    #[error("{0}")]
    Configuration(String),

    #[error("Command '{tool}' not found. Please ensure it is installed and in your system's PATH.")]
    MissingTool { tool: String },

    #[error("{0}")]
    Metadata(String),

    #[error("Download failed: {0}")]
    Download(String),

    #[error("Conversion failed: {0}")]
    Conversion(String),

    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
}

impl ExtractError {
    /// Fatal errors end the whole batch; the rest only abandon the current job.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            ExtractError::Configuration(_)
                | ExtractError::MissingTool { .. }
                | ExtractError::Unexpected(_)
        )
    }
}
