use clap::{ArgAction, Parser};
use std::ffi::OsString;
use std::path::PathBuf;

/// Log file used when `--log` is given without a value
pub const DEFAULT_LOG_FILE: &str = "yt-dlp.log";

/// Single-dash spellings accepted for backwards compatibility
const LEGACY_FLAGS: &[(&str, &str)] = &[
    ("-dst", "--dst"),
    ("-mp3fast", "--mp3fast"),
    ("-mp3128", "--mp3128"),
];

#[derive(Parser, Debug)]
#[command(
    name = "yt-audio",
    about = "YouTube Audio Extractor - Download audio tracks and save them as MP3 using yt-dlp and ffmpeg",
    version,
    disable_help_flag = true,
    long_about = "A tool for extracting audio tracks from YouTube videos and saving them as MP3 files. \
                  Downloads are handled by yt-dlp, conversion by ffmpeg. Supports batch processing, \
                  two audio quality presets and browser cookies to avoid throttling.\n\n\
                  Always enclose URLs in double quotes, especially when they contain '&'.",
    after_help = "Example usage:\n  yt-audio --cookies chrome -r 2M \"<YOUTUBE_URL>\""
)]
pub struct Cli {
    /// One or more video URLs (ignored if --list is used)
    #[arg(value_name = "URLS")]
    pub urls: Vec<String>,

    /// Show a short help message and exit
    #[arg(short = 'h', long = "short-help", action = ArgAction::HelpShort)]
    pub short_help: Option<bool>,

    /// Show the extensive help message and exit
    #[arg(long = "help", action = ArgAction::HelpLong)]
    pub help: Option<bool>,

    /// Output filename (only for a single URL)
    #[arg(short, long, value_name = "FILENAME")]
    pub output: Option<String>,

    /// Text file with URLs, one per line
    #[arg(long, value_name = "FILE")]
    pub list: Option<PathBuf>,

    /// Destination directory for the MP3 files (defaults to the current directory)
    #[arg(long = "dst", value_name = "DIRECTORY")]
    pub dst: Option<PathBuf>,

    /// Overwrite existing files without asking
    #[arg(long)]
    pub overwrite: bool,

    /// Extract audio to MP3 using a high-quality VBR (default)
    #[arg(long = "mp3fast", conflicts_with = "mp3128")]
    pub mp3fast: bool,

    /// Convert audio to a constant 128kbps MP3 for a smaller file size
    #[arg(long = "mp3128")]
    pub mp3128: bool,

    /// Use cookies from a browser to bypass throttling
    #[arg(
        long,
        value_name = "BROWSER[:PROFILE]",
        long_help = "Use cookies from a browser (chrome, firefox, edge, brave, ...).\n\
                     yt-dlp sends the same cookies as your logged-in browser, which helps with \
                     throttling, age restrictions and members-only videos.\n\
                     A profile can follow a colon, e.g. firefox:default-release or chrome:\"Profile 1\"."
    )]
    pub cookies: Option<String>,

    /// Limit download speed (e.g. 500K, 2M)
    #[arg(short = 'r', long = "limit-rate", value_name = "RATE")]
    pub limit_rate: Option<String>,

    /// Colorful status messages
    #[arg(long)]
    pub color: bool,

    /// Detailed yt-dlp progress (size, speed, ETA)
    #[arg(long = "pb")]
    pub progress: bool,

    /// Append executed commands and tool output to a log file
    #[arg(
        long,
        value_name = "FILENAME",
        num_args = 0..=1,
        default_missing_value = DEFAULT_LOG_FILE
    )]
    pub log: Option<PathBuf>,

    /// Show all raw output from yt-dlp and ffmpeg
    #[arg(long)]
    pub debug: bool,

    /// Configuration file (YAML)
    #[arg(long, value_name = "FILE", env = "YT_AUDIO_CONFIG")]
    pub config: Option<PathBuf>,

    /// Print the resolved configuration and exit
    #[arg(long)]
    pub show_config: bool,
}

/// Rewrite the legacy single-dash flags (`-dst`, `-mp3fast`, `-mp3128`) to their
/// double-dash forms so clap can parse them. Stops at a bare `--`.
pub fn normalize_legacy_flags<I, T>(args: I) -> Vec<OsString>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString>,
{
    let mut passthrough = false;

    args.into_iter()
        .map(Into::into)
        .map(|arg| {
            if passthrough {
                return arg;
            }
            let Some(text) = arg.to_str() else {
                return arg;
            };
            if text == "--" {
                passthrough = true;
                return arg;
            }
            for (legacy, modern) in LEGACY_FLAGS {
                if text == *legacy {
                    return OsString::from(*modern);
                }
                if let Some(value) = text.strip_prefix(legacy).and_then(|rest| rest.strip_prefix('=')) {
                    return OsString::from(format!("{}={}", modern, value));
                }
            }
            arg
        })
        .collect()
}
