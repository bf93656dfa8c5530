use std::path::{Path, PathBuf};
use std::time::Duration;
use tempfile::TempPath;

use crate::{ExtractError, Result};

/// Where a job currently is in its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobStage {
    Start,
    TitleResolved,
    FilenameDecided,
    Skipped,
    TempResolved,
    Downloaded,
    DurationProbed,
    Converted,
    Cleaned,
    Failed,
}

impl std::fmt::Display for JobStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            JobStage::Start => "start",
            JobStage::TitleResolved => "title resolved",
            JobStage::FilenameDecided => "filename decided",
            JobStage::Skipped => "skipped",
            JobStage::TempResolved => "temporary file resolved",
            JobStage::Downloaded => "downloaded",
            JobStage::DurationProbed => "duration probed",
            JobStage::Converted => "converted",
            JobStage::Cleaned => "cleaned",
            JobStage::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// One URL being processed
#[derive(Debug, Clone)]
pub struct Job {
    /// 1-based position in the batch
    pub index: usize,
    pub url: String,
    pub title: Option<String>,
    pub final_path: Option<PathBuf>,
    stage: JobStage,
}

impl Job {
    pub fn new(index: usize, url: impl Into<String>) -> Self {
        Self {
            index,
            url: url.into(),
            title: None,
            final_path: None,
            stage: JobStage::Start,
        }
    }

    pub fn stage(&self) -> JobStage {
        self.stage
    }

    pub fn advance(&mut self, stage: JobStage) {
        tracing::debug!("Job {} ({}): {} -> {}", self.index, self.url, self.stage, stage);
        self.stage = stage;
    }

    /// Downloader output template for this job's temporary file
    pub fn temp_template(&self, dir: &Path, pid: u32) -> PathBuf {
        dir.join(format!("temp_{}_{}.%(ext)s", pid, self.index))
    }
}

/// Downloader artifacts left next to an interrupted download
const LEFTOVER_SUFFIXES: [&str; 2] = [".part", ".ytdl"];

/// Owns the temporary download; dropping it deletes the file and any downloader leftovers
#[derive(Debug)]
pub struct TempAudio {
    audio: TempPath,
    _leftovers: Vec<TempPath>,
}

impl TempAudio {
    pub fn claim(path: PathBuf) -> Result<Self> {
        let audio = TempPath::try_from_path(path).map_err(unusable_path)?;

        let mut leftovers = Vec::with_capacity(LEFTOVER_SUFFIXES.len());
        if let Some(name) = audio.file_name() {
            for suffix in LEFTOVER_SUFFIXES {
                let mut leftover = name.to_os_string();
                leftover.push(suffix);
                leftovers.push(
                    TempPath::try_from_path(audio.with_file_name(leftover)).map_err(unusable_path)?,
                );
            }
        }

        tracing::debug!("Claimed temporary file {}", audio.display());
        Ok(Self {
            audio,
            _leftovers: leftovers,
        })
    }

    pub fn path(&self) -> &Path {
        &self.audio
    }
}

fn unusable_path(err: std::io::Error) -> ExtractError {
    ExtractError::Metadata(format!("Could not determine temporary filename: {}", err))
}

/// How long each phase of a converted job took
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct JobTimings {
    pub download: Duration,
    pub conversion: Duration,
}

impl JobTimings {
    pub fn total(&self) -> Duration {
        self.download + self.conversion
    }
}
