use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::cli::Cli;
use crate::config::Config;
use crate::{ExtractError, Result};

/// Query parameters that show up as separate arguments when an unquoted URL is split on `&`
pub const SPLIT_URL_PREFIXES: &[&str] = &["list=", "pp=", "t=", "si="];

/// MP3 encoding preset
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Quality {
    /// High-quality variable bitrate (`-q:a 2`)
    #[default]
    #[serde(rename = "mp3fast")]
    Vbr,

    /// Constant 128 kbps (`-b:a 128k`)
    #[serde(rename = "mp3128")]
    Cbr128,
}

impl Quality {
    /// ffmpeg audio encoder arguments for this preset
    pub fn encoder_args(&self) -> [&'static str; 2] {
        match self {
            Quality::Vbr => ["-q:a", "2"],
            Quality::Cbr128 => ["-b:a", "128k"],
        }
    }
}

impl std::fmt::Display for Quality {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Quality::Vbr => write!(f, "mp3fast"),
            Quality::Cbr128 => write!(f, "mp3128"),
        }
    }
}

/// Fully resolved settings for one invocation
#[derive(Debug, Clone)]
pub struct RunOptions {
    pub urls: Vec<String>,
    pub destination: PathBuf,
    pub overwrite: bool,
    pub quality: Quality,
    pub output_name: Option<String>,
    pub cookies: Option<String>,
    pub limit_rate: Option<String>,
    pub color: bool,
    pub progress: bool,
    pub debug: bool,
}

impl RunOptions {
    /// Merge command-line arguments over configuration defaults and validate the result.
    ///
    /// Nothing here spawns a process; every configuration error surfaces before the
    /// first external tool runs.
    pub fn resolve(cli: &Cli, config: &Config) -> Result<Self> {
        let urls = match &cli.list {
            Some(list) => read_url_list(list)?,
            None => cli.urls.clone(),
        };

        check_split_urls(&urls)?;

        if urls.is_empty() {
            return Err(ExtractError::Configuration(
                "No URLs provided. Use arguments or --list option.".to_string(),
            ));
        }

        if cli.output.is_some() && urls.len() > 1 {
            return Err(ExtractError::Configuration(
                "The -o/--output option can only be used when processing a single URL.".to_string(),
            ));
        }

        let quality = if cli.mp3128 {
            Quality::Cbr128
        } else if cli.mp3fast {
            Quality::Vbr
        } else {
            config.defaults.quality
        };

        let destination = match cli.dst.as_ref().or(config.defaults.destination.as_ref()) {
            Some(dir) => dir.clone(),
            None => std::env::current_dir().map_err(|e| {
                ExtractError::Configuration(format!("Cannot determine the current directory: {}", e))
            })?,
        };

        Ok(Self {
            urls,
            destination,
            overwrite: cli.overwrite || config.defaults.overwrite,
            quality,
            output_name: cli.output.clone(),
            cookies: cli.cookies.clone().or_else(|| config.defaults.cookies.clone()),
            limit_rate: cli.limit_rate.clone().or_else(|| config.defaults.limit_rate.clone()),
            color: cli.color || config.defaults.color,
            progress: cli.progress || config.defaults.progress,
            debug: cli.debug,
        })
    }

    /// Create the destination directory if needed
    pub fn prepare_destination(&self) -> Result<()> {
        fs_err::create_dir_all(&self.destination).map_err(|e| {
            ExtractError::Configuration(format!("Cannot create destination directory: {}", e))
        })
    }

    /// Final MP3 filename for a video title
    pub fn output_filename(&self, title: &str) -> String {
        match &self.output_name {
            Some(name) => crate::utils::with_mp3_extension(name),
            None => format!("{}.mp3", crate::utils::sanitize_filename(title)),
        }
    }

    pub fn is_batch(&self) -> bool {
        self.urls.len() > 1
    }
}

/// Read a newline-delimited URL list, skipping blank lines
pub fn read_url_list(path: &Path) -> Result<Vec<String>> {
    let content = fs_err::read_to_string(path).map_err(|_| {
        ExtractError::Configuration(format!("The file '{}' was not found.", path.display()))
    })?;

    Ok(content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect())
}

/// Reject arguments that look like a URL fragment produced by an unquoted `&`
pub fn check_split_urls(urls: &[String]) -> Result<()> {
    let fragment = urls
        .iter()
        .find(|arg| SPLIT_URL_PREFIXES.iter().any(|prefix| arg.starts_with(prefix)));

    match fragment {
        Some(arg) => Err(ExtractError::Configuration(format!(
            "Detected an argument that looks like part of a URL ('{}').\n\
             You probably forgot to put the whole link in quotation marks.\n\
             Example of correct usage:\n  \
             yt-audio \"https://www.youtube.com/watch?v=...&list=...\"",
            arg
        ))),
        None => Ok(()),
    }
}
