use async_trait::async_trait;
use futures_util::stream::{self, Stream, StreamExt};
use std::io;
use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Stdio};
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::{Child, Command};

pub mod ffmpeg;
pub mod youtube;

use crate::config::ToolsConfig;
use crate::options::{Quality, RunOptions};
use crate::output::{Console, RunLog, Tone};
use crate::utils::{check_command_available, display_command};
use crate::{ExtractError, Result};

use ffmpeg::Ffmpeg;
use youtube::YtDlp;

/// Callback receiving every output line of a streaming tool run
pub type LineHandler<'a> = &'a mut (dyn FnMut(&str) + Send);

/// The external processes one job needs, in the order the pipeline calls them
#[async_trait]
pub trait MediaToolkit: Send + Sync {
    /// Resolve the canonical video title
    async fn fetch_title(&self, url: &str) -> Result<String>;

    /// Ask the downloader which file it would write for `template`
    async fn resolve_temp_path(&self, url: &str, template: &Path) -> Result<PathBuf>;

    /// Download the best audio stream to `template`
    async fn download(&self, url: &str, template: &Path, on_line: LineHandler<'_>) -> Result<()>;

    /// Duration of a media file in seconds
    async fn probe_duration(&self, media: &Path) -> Result<f64>;

    /// Transcode `input` to an MP3 at `output`
    async fn transcode(
        &self,
        input: &Path,
        output: &Path,
        quality: Quality,
        on_line: LineHandler<'_>,
    ) -> Result<()>;
}

/// [`MediaToolkit`] backed by yt-dlp, ffprobe and ffmpeg subprocesses
pub struct ExternalTools {
    downloader: YtDlp,
    ffmpeg: Ffmpeg,
    console: Console,
    log: RunLog,
}

/// Captured result of a non-streaming tool run
struct Captured {
    status: ExitStatus,
    stdout: String,
    stderr: String,
}

impl ExternalTools {
    pub fn new(tools: &ToolsConfig, options: &RunOptions, console: &Console, log: RunLog) -> Self {
        Self {
            downloader: YtDlp::new(tools.downloader.clone(), options),
            ffmpeg: Ffmpeg::new(tools.transcoder.clone(), tools.probe.clone()),
            console: console.clone(),
            log,
        }
    }

    /// Make sure the downloader and transcoder can be started at all.
    /// A missing probe only degrades progress reporting, so it is a warning.
    pub async fn ensure_available(&self) -> Result<()> {
        let required = [
            (self.downloader.program(), "--version"),
            (self.ffmpeg.transcoder(), "-version"),
        ];
        for (program, flag) in required {
            check_command_available(program, flag)
                .await
                .map_err(|e| spawn_error(program, e))?;
        }

        if let Err(e) = check_command_available(self.ffmpeg.probe(), "-version").await {
            tracing::warn!("{} is not available: {}", self.ffmpeg.probe(), e);
            self.console.say(
                Tone::Warning,
                &format!(
                    "Warning: '{}' was not found; conversion progress will not be shown.",
                    self.ffmpeg.probe()
                ),
            );
        }

        Ok(())
    }

    fn duration_error(&self, detail: &str) -> ExtractError {
        ExtractError::Metadata(format!(
            "Could not get audio duration using {}. Error: {}",
            self.ffmpeg.probe(),
            detail
        ))
    }

    fn announce(&self, program: &str, args: &[String]) {
        let command = display_command(program, args);
        tracing::debug!("Executing: {}", command);
        if self.console.debug() {
            self.console.say(Tone::Info, &format!("Executing command: {}", command));
        }
        self.log.record(format!("Executing: {}", command));
    }

    /// Run a tool to completion and collect its output
    async fn capture(&self, program: &str, args: &[String]) -> Result<Captured> {
        self.announce(program, args);

        let output = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|e| spawn_error(program, e))?;

        Ok(Captured {
            status: output.status,
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }

    /// Run a tool, feeding its merged stdout/stderr to `on_line` as lines arrive
    async fn stream(&self, program: &str, args: &[String], on_line: LineHandler<'_>) -> Result<ExitStatus> {
        self.announce(program, args);

        let mut child = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| spawn_error(program, e))?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| ExtractError::Unexpected(format!("No stdout from {}", program)))?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| ExtractError::Unexpected(format!("No stderr from {}", program)))?;

        let merged = stream::select(line_stream(stdout), line_stream(stderr));
        futures_util::pin_mut!(merged);

        while let Some(line) = merged.next().await {
            let line = match line {
                Ok(line) => line,
                Err(e) => {
                    reap(&mut child).await;
                    return Err(ExtractError::Unexpected(format!(
                        "Failed to read output of {}: {}",
                        program, e
                    )));
                }
            };
            let trimmed = line.trim();
            if !trimmed.is_empty() {
                self.log.record(trimmed);
            }
            on_line(&line);
        }

        child
            .wait()
            .await
            .map_err(|e| ExtractError::Unexpected(format!("Failed to wait for {}: {}", program, e)))
    }
}

#[async_trait]
impl MediaToolkit for ExternalTools {
    async fn fetch_title(&self, url: &str) -> Result<String> {
        let args = self.downloader.title_args(url);
        let captured = self.capture(self.downloader.program(), &args).await?;

        if !captured.status.success() {
            return Err(metadata_error(url, &failure_detail(&captured)));
        }

        youtube::last_line(&captured.stdout)
            .map(str::to_string)
            .ok_or_else(|| metadata_error(url, "no title returned"))
    }

    async fn resolve_temp_path(&self, url: &str, template: &Path) -> Result<PathBuf> {
        let args = self.downloader.filename_args(url, template);
        let captured = self.capture(self.downloader.program(), &args).await?;

        if !captured.status.success() {
            return Err(ExtractError::Metadata(format!(
                "Could not determine temporary filename: {}",
                failure_detail(&captured)
            )));
        }

        youtube::last_line(&captured.stdout)
            .map(PathBuf::from)
            .ok_or_else(|| {
                ExtractError::Metadata("Could not determine temporary filename: no filename returned".to_string())
            })
    }

    async fn download(&self, url: &str, template: &Path, on_line: LineHandler<'_>) -> Result<()> {
        let args = self.downloader.download_args(url, template);
        let status = self.stream(self.downloader.program(), &args, on_line).await?;

        if status.success() {
            Ok(())
        } else {
            Err(ExtractError::Download(format!(
                "{} exited with {}",
                self.downloader.program(),
                status
            )))
        }
    }

    async fn probe_duration(&self, media: &Path) -> Result<f64> {
        let args = self.ffmpeg.probe_args(media);
        let captured = match self.capture(self.ffmpeg.probe(), &args).await {
            Ok(captured) => captured,
            // Only a degraded progress display depends on the probe
            Err(ExtractError::MissingTool { tool }) => {
                return Err(self.duration_error(&format!("{} not found", tool)))
            }
            Err(e) => return Err(e),
        };

        if !captured.status.success() {
            return Err(self.duration_error(&failure_detail(&captured)));
        }

        ffmpeg::parse_duration(&captured.stdout).ok_or_else(|| {
            self.duration_error(&format!(
                "unexpected duration output '{}'",
                captured.stdout.trim()
            ))
        })
    }

    async fn transcode(
        &self,
        input: &Path,
        output: &Path,
        quality: Quality,
        on_line: LineHandler<'_>,
    ) -> Result<()> {
        let args = self.ffmpeg.transcode_args(input, output, quality);
        let status = self.stream(self.ffmpeg.transcoder(), &args, on_line).await?;

        if status.success() {
            Ok(())
        } else {
            Err(ExtractError::Conversion(format!(
                "{} exited with {}",
                self.ffmpeg.transcoder(),
                status
            )))
        }
    }
}

/// Stop a child whose output can no longer be read and wait for it to exit
async fn reap(child: &mut Child) {
    if let Err(e) = child.start_kill() {
        tracing::debug!("Could not kill child process: {}", e);
    }
    if let Err(e) = child.wait().await {
        tracing::warn!("Failed to wait for child process: {}", e);
    }
}

fn spawn_error(program: &str, err: io::Error) -> ExtractError {
    if err.kind() == io::ErrorKind::NotFound {
        ExtractError::MissingTool {
            tool: program.to_string(),
        }
    } else {
        ExtractError::Unexpected(format!("Failed to start {}: {}", program, err))
    }
}

fn metadata_error(url: &str, detail: &str) -> ExtractError {
    ExtractError::Metadata(format!(
        "Could not get video metadata for URL {}. Error: {}",
        url, detail
    ))
}

fn failure_detail(captured: &Captured) -> String {
    let stderr = captured.stderr.trim();
    if stderr.is_empty() {
        format!("exited with {}", captured.status)
    } else {
        stderr.to_string()
    }
}

/// Lines of a pipe, decoded lossily so a stray byte never ends the read loop
fn line_stream<R>(reader: R) -> impl Stream<Item = io::Result<String>>
where
    R: AsyncRead + Unpin,
{
    stream::unfold(Some(BufReader::new(reader)), |state| async move {
        let Some(mut reader) = state else {
            return None;
        };
        let mut buf = Vec::new();
        match reader.read_until(b'\n', &mut buf).await {
            Ok(0) => None,
            Ok(_) => {
                let line = String::from_utf8_lossy(&buf)
                    .trim_end_matches(['\r', '\n'])
                    .to_string();
                Some((Ok(line), Some(reader)))
            }
            Err(e) => Some((Err(e), None)),
        }
    })
}
