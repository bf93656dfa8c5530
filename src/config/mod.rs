use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::options::Quality;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// External executables
    pub tools: ToolsConfig,

    /// Defaults for command-line options
    pub defaults: DefaultsConfig,

    /// File this configuration was read from, if any
    #[serde(skip)]
    pub source: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolsConfig {
    /// Downloader executable (yt-dlp)
    pub downloader: String,

    /// Transcoder executable (ffmpeg)
    pub transcoder: String,

    /// Media probe executable (ffprobe)
    pub probe: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DefaultsConfig {
    /// Destination directory when `-dst` is not given
    pub destination: Option<PathBuf>,

    /// Quality preset when neither `-mp3fast` nor `-mp3128` is given
    pub quality: Quality,

    /// Browser to take cookies from
    pub cookies: Option<String>,

    /// Download rate limit
    pub limit_rate: Option<String>,

    pub color: bool,
    pub progress: bool,
    pub overwrite: bool,
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            downloader: "yt-dlp".to_string(),
            transcoder: "ffmpeg".to_string(),
            probe: "ffprobe".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from an explicit file, the user config directory, or defaults
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let path = match explicit {
            Some(path) => {
                if !path.exists() {
                    anyhow::bail!("Configuration file '{}' was not found", path.display());
                }
                Some(path.to_path_buf())
            }
            None => Self::default_path().filter(|path| path.exists()),
        };

        match path {
            Some(path) => {
                tracing::debug!("Loading configuration from {}", path.display());
                Self::from_file(&path)
            }
            None => Ok(Self::default()),
        }
    }

    fn from_file(path: &Path) -> Result<Self> {
        let content = fs_err::read_to_string(path).context("Failed to read config file")?;
        let mut config = Self::from_yaml(&content)?;
        config.source = Some(path.to_path_buf());
        Ok(config)
    }

    /// Parse and validate a YAML document
    pub fn from_yaml(content: &str) -> Result<Self> {
        // An empty document deserializes to unit, not to an empty map
        if content.trim().is_empty() {
            return Ok(Self::default());
        }

        let config: Config = serde_yaml::from_str(content).context("Failed to parse config file")?;
        config.validate()?;
        Ok(config)
    }

    /// Get the per-user configuration file path
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("yt-audio-extractor").join("config.yaml"))
    }

    fn validate(&self) -> Result<()> {
        let tools = [
            ("downloader", &self.tools.downloader),
            ("transcoder", &self.tools.transcoder),
            ("probe", &self.tools.probe),
        ];
        for (name, value) in tools {
            if value.trim().is_empty() {
                anyhow::bail!("tools.{} must not be empty", name);
            }
        }

        Ok(())
    }

    /// Display current configuration
    pub fn display(&self) {
        print!("{}", self.describe());
    }

    fn describe(&self) -> String {
        let mut lines = vec!["Current Configuration:".to_string()];
        match &self.source {
            Some(path) => lines.push(format!("  Config File: {}", path.display())),
            None => lines.push("  Config File: (none, using built-in defaults)".to_string()),
        }
        lines.push(format!("  Downloader: {}", self.tools.downloader));
        lines.push(format!("  Transcoder: {}", self.tools.transcoder));
        lines.push(format!("  Probe: {}", self.tools.probe));
        match &self.defaults.destination {
            Some(dir) => lines.push(format!("  Destination: {}", dir.display())),
            None => lines.push("  Destination: (current directory)".to_string()),
        }
        lines.push(format!("  Quality: {}", self.defaults.quality));
        if let Some(cookies) = &self.defaults.cookies {
            lines.push(format!("  Cookies: {}", cookies));
        }
        if let Some(rate) = &self.defaults.limit_rate {
            lines.push(format!("  Rate Limit: {}", rate));
        }
        lines.push(format!("  Color: {}", self.defaults.color));
        lines.push(format!("  Progress: {}", self.defaults.progress));
        lines.push(format!("  Overwrite: {}", self.defaults.overwrite));

        lines.iter().map(|line| format!("{}\n", line)).collect()
    }
}
