use std::path::Path;
use std::time::{Duration, Instant};

pub mod job;
pub mod prompt;

pub use job::{Job, JobStage, JobTimings, TempAudio};
pub use prompt::{OverwritePrompt, StdinPrompt};

use crate::extractors::MediaToolkit;
use crate::options::RunOptions;
use crate::output::{Console, ConversionView, DownloadView, RunLog, Tone};
use crate::utils::{format_duration, format_seconds};
use crate::{ExtractError, Result};

/// What happened to a job that did not fail
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum JobOutcome {
    Converted(JobTimings),
    Skipped,
}

/// Counts and elapsed time for a whole batch
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatchSummary {
    pub converted: usize,
    pub skipped: usize,
    pub failed: usize,
    pub elapsed: Duration,
}

/// Sequential batch loop: one URL at a time, each fully finished (or abandoned)
/// before the next starts. Per-job failures are reported and skipped; fatal
/// errors end the batch.
pub struct ExtractionPipeline<'a> {
    options: &'a RunOptions,
    tools: &'a dyn MediaToolkit,
    prompt: &'a dyn OverwritePrompt,
    console: &'a Console,
    log: RunLog,
    pid: u32,
}

impl<'a> ExtractionPipeline<'a> {
    pub fn new(
        options: &'a RunOptions,
        tools: &'a dyn MediaToolkit,
        prompt: &'a dyn OverwritePrompt,
        console: &'a Console,
        log: RunLog,
    ) -> Self {
        Self {
            options,
            tools,
            prompt,
            console,
            log,
            pid: std::process::id(),
        }
    }

    /// Process every URL in order
    pub async fn run(&self) -> Result<BatchSummary> {
        let total = self.options.urls.len();
        self.console
            .say(Tone::Header, &format!("Found {} file(s) to process.", total));
        self.log.record(format!("Starting processing of {} URLs.", total));

        let started = Instant::now();
        let mut summary = BatchSummary::default();

        for (position, url) in self.options.urls.iter().enumerate() {
            let mut job = Job::new(position + 1, url.as_str());

            if self.options.is_batch() {
                self.console.say_spaced(
                    Tone::Emphasis,
                    &format!("--- Processing file {}/{}: {} ---", job.index, total, url),
                );
                self.log
                    .record(format!("--- Processing {}/{}: {} ---", job.index, total, url));
            }

            match self.process(&mut job).await {
                Ok(JobOutcome::Converted(_)) => summary.converted += 1,
                Ok(JobOutcome::Skipped) => summary.skipped += 1,
                Err(err) if err.is_fatal() => {
                    self.log.record(format!("CRITICAL: {}", err));
                    return Err(err);
                }
                Err(err) => {
                    self.report_failure(&mut job, &err);
                    summary.failed += 1;
                }
            }
        }

        summary.elapsed = started.elapsed();
        if self.options.is_batch() {
            self.console.say_spaced(
                Tone::Success,
                &self.console.paint(
                    Tone::Emphasis,
                    &format!(
                        "All tasks completed. Total script time: {}",
                        format_seconds(summary.elapsed)
                    ),
                ),
            );
        } else {
            self.console.say_spaced(Tone::Success, "All tasks completed.");
        }

        Ok(summary)
    }

    async fn process(&self, job: &mut Job) -> Result<JobOutcome> {
        let title = self.tools.fetch_title(&job.url).await?;
        job.title = Some(title.clone());
        job.advance(JobStage::TitleResolved);

        let filename = self.options.output_filename(&title);
        let final_path = self.options.destination.join(&filename);
        job.final_path = Some(final_path.clone());
        job.advance(JobStage::FilenameDecided);

        if final_path.exists() && !self.options.overwrite {
            self.console
                .say(Tone::Warning, &format!("File '{}' already exists.", filename));
            if !self.prompt.confirm_overwrite(&final_path)? {
                self.console.say(Tone::Accent, "Skipping file.");
                self.log.record(format!(
                    "Skipped file (already exists): {}",
                    final_path.display()
                ));
                job.advance(JobStage::Skipped);
                return Ok(JobOutcome::Skipped);
            }
        }

        let download_started = Instant::now();
        self.console
            .say(Tone::Accent, "Step 1: Downloading audio track...");

        let template = job.temp_template(&self.options.destination, self.pid);
        let temp = TempAudio::claim(self.tools.resolve_temp_path(&job.url, &template).await?)?;
        job.advance(JobStage::TempResolved);

        let mut view = DownloadView::new(self.console);
        let downloaded = self
            .tools
            .download(&job.url, &template, &mut |line: &str| view.handle_line(line))
            .await;
        view.finish();
        downloaded?;
        let download_time = download_started.elapsed();
        job.advance(JobStage::Downloaded);

        self.console.say_spaced(
            Tone::Accent,
            &format!("Step 2: Converting to MP3 -> ({})...", filename),
        );
        let conversion_started = Instant::now();

        let duration = match self.tools.probe_duration(temp.path()).await {
            Ok(seconds) => {
                tracing::debug!("Audio duration of {}: {}", temp.path().display(), format_duration(seconds));
                Some(seconds)
            }
            Err(err) if err.is_fatal() => return Err(err),
            Err(err) => {
                self.console.say(Tone::Warning, &err.to_string());
                self.log.record(format!("WARNING: {}", err));
                None
            }
        };
        job.advance(JobStage::DurationProbed);

        let mut view = ConversionView::new(self.console, duration);
        let converted = self
            .tools
            .transcode(
                temp.path(),
                &final_path,
                self.options.quality,
                &mut |line: &str| view.handle_line(line),
            )
            .await;
        view.finish();
        converted?;

        let timings = JobTimings {
            download: download_time,
            conversion: conversion_started.elapsed(),
        };
        job.advance(JobStage::Converted);

        drop(temp);
        job.advance(JobStage::Cleaned);

        self.report_success(&final_path, &timings);
        Ok(JobOutcome::Converted(timings))
    }

    fn report_success(&self, final_path: &Path, timings: &JobTimings) {
        self.console.say_spaced(
            Tone::Success,
            &format!("Successfully created: {}", final_path.display()),
        );
        self.console.say(
            Tone::Success,
            &format!("Download time:   {}", format_seconds(timings.download)),
        );
        self.console.say(
            Tone::Success,
            &format!("Conversion time: {}", format_seconds(timings.conversion)),
        );
        self.console.say(Tone::Success, "--------------------");
        self.console.say(
            Tone::Success,
            &self.console.paint(
                Tone::Emphasis,
                &format!("Total time:      {}", format_seconds(timings.total())),
            ),
        );

        self.log.record(format!(
            "Created {} (download {}, conversion {})",
            final_path.display(),
            format_seconds(timings.download),
            format_seconds(timings.conversion)
        ));
    }

    fn report_failure(&self, job: &mut Job, err: &ExtractError) {
        let stage = job.stage();
        job.advance(JobStage::Failed);

        let message = match err {
            ExtractError::Download(detail) => format!("Download failed for {}: {}", job.url, detail),
            ExtractError::Conversion(_) => format!("{} ({})", err, job.url),
            _ => err.to_string(),
        };

        tracing::debug!("Job {} abandoned after stage '{}': {}", job.index, stage, err);
        self.console.say(Tone::Failure, &message);
        self.log.record(format!("ERROR: {}", message));
    }
}

#[cfg(test)]
mod tests {
    use super::prompt::MockOverwritePrompt;
    use super::*;
    use crate::extractors::LineHandler;
    use crate::options::Quality;
    use async_trait::async_trait;
    use std::path::PathBuf;
    use std::sync::Mutex;
    use tokio_test::{assert_err, assert_ok};

    #[derive(Debug, Clone, Copy, PartialEq)]
    enum Failure {
        Title,
        TempPath,
        Download,
        Probe,
        Transcode,
        Crash,
    }

    /// Stand-in toolkit writing real files so cleanup can be observed
    #[derive(Default)]
    struct FakeTools {
        failures: Vec<(&'static str, Failure)>,
        current_url: Mutex<String>,
        calls: Mutex<Vec<String>>,
    }

    impl FakeTools {
        fn failing(failures: Vec<(&'static str, Failure)>) -> Self {
            Self {
                failures,
                ..Self::default()
            }
        }

        fn record(&self, call: &str) {
            let url = self.current_url.lock().unwrap().clone();
            self.calls.lock().unwrap().push(format!("{} {}", call, url));
        }

        fn fails(&self, failure: Failure) -> bool {
            let url = self.current_url.lock().unwrap();
            self.failures
                .iter()
                .any(|(fragment, kind)| *kind == failure && url.contains(fragment))
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }

        fn resolved(template: &Path) -> PathBuf {
            PathBuf::from(template.to_string_lossy().replace("%(ext)s", "webm"))
        }
    }

    #[async_trait]
    impl MediaToolkit for FakeTools {
        async fn fetch_title(&self, url: &str) -> Result<String> {
            *self.current_url.lock().unwrap() = url.to_string();
            self.record("title");
            if self.fails(Failure::Title) {
                return Err(ExtractError::Metadata(format!(
                    "Could not get video metadata for URL {}. Error: Video unavailable",
                    url
                )));
            }
            Ok(url.rsplit('/').next().unwrap_or("untitled").to_string())
        }

        async fn resolve_temp_path(&self, _url: &str, template: &Path) -> Result<PathBuf> {
            self.record("temp");
            if self.fails(Failure::TempPath) {
                return Err(ExtractError::Metadata(
                    "Could not determine temporary filename: no formats".into(),
                ));
            }
            Ok(Self::resolved(template))
        }

        async fn download(&self, _url: &str, template: &Path, on_line: LineHandler<'_>) -> Result<()> {
            self.record("download");
            on_line("[youtube] abc: Downloading webpage");
            on_line("[download]  50.0% of 1.00MiB");
            fs_err::write(Self::resolved(template), b"raw audio").unwrap();
            fs_err::write(format!("{}.part", Self::resolved(template).display()), b"part").unwrap();

            if self.fails(Failure::Crash) {
                return Err(ExtractError::Unexpected("pipe closed".into()));
            }
            if self.fails(Failure::Download) {
                return Err(ExtractError::Download("exit status: 1".into()));
            }
            Ok(())
        }

        async fn probe_duration(&self, media: &Path) -> Result<f64> {
            self.record("probe");
            assert!(media.exists());
            if self.fails(Failure::Probe) {
                return Err(ExtractError::Metadata(
                    "Could not get audio duration using ffprobe. Error: N/A".into(),
                ));
            }
            Ok(100.0)
        }

        async fn transcode(
            &self,
            input: &Path,
            output: &Path,
            _quality: Quality,
            on_line: LineHandler<'_>,
        ) -> Result<()> {
            self.record("transcode");
            assert!(input.exists());
            on_line("out_time_us=50000000");
            if self.fails(Failure::Transcode) {
                return Err(ExtractError::Conversion("exit status: 1".into()));
            }
            fs_err::write(output, b"mp3").unwrap();
            Ok(())
        }
    }

    fn options(dir: &Path, urls: &[&str]) -> RunOptions {
        RunOptions {
            urls: urls.iter().map(|url| url.to_string()).collect(),
            destination: dir.to_path_buf(),
            overwrite: false,
            quality: Quality::Vbr,
            output_name: None,
            cookies: None,
            limit_rate: None,
            color: false,
            progress: false,
            debug: false,
        }
    }

    fn leftover_temp_files(dir: &Path) -> Vec<String> {
        fs_err::read_dir(dir)
            .unwrap()
            .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
            .filter(|name| name.starts_with("temp_"))
            .collect()
    }

    fn never_asked() -> MockOverwritePrompt {
        let mut prompt = MockOverwritePrompt::new();
        prompt.expect_confirm_overwrite().times(0);
        prompt
    }

    #[tokio::test]
    async fn converts_a_single_url() {
        let dir = tempfile::tempdir().unwrap();
        let options = options(dir.path(), &["https://youtu.be/first"]);
        let tools = FakeTools::default();
        let prompt = never_asked();
        let console = Console::new(false, false);

        let pipeline = ExtractionPipeline::new(&options, &tools, &prompt, &console, RunLog::disabled());
        let summary = assert_ok!(pipeline.run().await);

        assert_eq!((summary.converted, summary.skipped, summary.failed), (1, 0, 0));
        assert_eq!(fs_err::read(dir.path().join("first.mp3")).unwrap(), b"mp3");
        assert!(leftover_temp_files(dir.path()).is_empty());
        assert_eq!(
            tools.calls(),
            [
                "title https://youtu.be/first",
                "temp https://youtu.be/first",
                "download https://youtu.be/first",
                "probe https://youtu.be/first",
                "transcode https://youtu.be/first",
            ]
        );
    }

    #[tokio::test]
    async fn output_override_names_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let mut options = options(dir.path(), &["https://youtu.be/first"]);
        options.output_name = Some("my mix".to_string());
        let tools = FakeTools::default();
        let prompt = never_asked();
        let console = Console::new(false, false);

        let pipeline = ExtractionPipeline::new(&options, &tools, &prompt, &console, RunLog::disabled());
        assert_ok!(pipeline.run().await);

        assert!(dir.path().join("my mix.mp3").exists());
        assert!(!dir.path().join("first.mp3").exists());
    }

    #[tokio::test]
    async fn declined_overwrite_leaves_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let existing = dir.path().join("first.mp3");
        fs_err::write(&existing, b"original").unwrap();

        let options = options(dir.path(), &["https://youtu.be/first"]);
        let tools = FakeTools::default();
        let mut prompt = MockOverwritePrompt::new();
        prompt
            .expect_confirm_overwrite()
            .times(1)
            .returning(|_| Ok(false));
        let console = Console::new(false, false);

        let pipeline = ExtractionPipeline::new(&options, &tools, &prompt, &console, RunLog::disabled());
        let summary = assert_ok!(pipeline.run().await);

        assert_eq!(summary.skipped, 1);
        assert_eq!(fs_err::read(&existing).unwrap(), b"original");
        assert!(leftover_temp_files(dir.path()).is_empty());
        assert_eq!(tools.calls(), ["title https://youtu.be/first"]);
    }

    #[tokio::test]
    async fn accepted_overwrite_replaces_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let existing = dir.path().join("first.mp3");
        fs_err::write(&existing, b"original").unwrap();

        let options = options(dir.path(), &["https://youtu.be/first"]);
        let tools = FakeTools::default();
        let mut prompt = MockOverwritePrompt::new();
        prompt
            .expect_confirm_overwrite()
            .withf(|path| path.ends_with("first.mp3"))
            .times(1)
            .returning(|_| Ok(true));
        let console = Console::new(false, false);

        let pipeline = ExtractionPipeline::new(&options, &tools, &prompt, &console, RunLog::disabled());
        let summary = assert_ok!(pipeline.run().await);

        assert_eq!(summary.converted, 1);
        assert_eq!(fs_err::read(&existing).unwrap(), b"mp3");
    }

    #[tokio::test]
    async fn overwrite_flag_skips_the_prompt() {
        let dir = tempfile::tempdir().unwrap();
        let existing = dir.path().join("first.mp3");
        fs_err::write(&existing, b"original").unwrap();

        let mut options = options(dir.path(), &["https://youtu.be/first"]);
        options.overwrite = true;
        let tools = FakeTools::default();
        let prompt = never_asked();
        let console = Console::new(false, false);

        let pipeline = ExtractionPipeline::new(&options, &tools, &prompt, &console, RunLog::disabled());
        assert_ok!(pipeline.run().await);

        assert_eq!(fs_err::read(&existing).unwrap(), b"mp3");
    }

    #[tokio::test]
    async fn per_job_failures_do_not_stop_the_batch() {
        let dir = tempfile::tempdir().unwrap();
        let options = options(
            dir.path(),
            &[
                "https://youtu.be/private",
                "https://youtu.be/noformats",
                "https://youtu.be/broken",
                "https://youtu.be/corrupt",
                "https://youtu.be/fine",
            ],
        );
        let tools = FakeTools::failing(vec![
            ("private", Failure::Title),
            ("noformats", Failure::TempPath),
            ("broken", Failure::Download),
            ("corrupt", Failure::Transcode),
        ]);
        let prompt = never_asked();
        let console = Console::new(false, false);

        let pipeline = ExtractionPipeline::new(&options, &tools, &prompt, &console, RunLog::disabled());
        let summary = assert_ok!(pipeline.run().await);

        assert_eq!((summary.converted, summary.skipped, summary.failed), (1, 0, 4));
        assert!(leftover_temp_files(dir.path()).is_empty());
        assert!(dir.path().join("fine.mp3").exists());
        assert!(!dir.path().join("broken.mp3").exists());
        assert!(!dir.path().join("corrupt.mp3").exists());
        assert!(!tools.calls().contains(&"temp https://youtu.be/private".to_string()));
        assert!(!tools.calls().contains(&"download https://youtu.be/noformats".to_string()));
    }

    #[tokio::test]
    async fn unknown_duration_still_converts() {
        let dir = tempfile::tempdir().unwrap();
        let options = options(dir.path(), &["https://youtu.be/first"]);
        let tools = FakeTools::failing(vec![("first", Failure::Probe)]);
        let prompt = never_asked();
        let console = Console::new(false, false);

        let pipeline = ExtractionPipeline::new(&options, &tools, &prompt, &console, RunLog::disabled());
        let summary = assert_ok!(pipeline.run().await);

        assert_eq!(summary.converted, 1);
        assert!(leftover_temp_files(dir.path()).is_empty());
    }

    #[tokio::test]
    async fn unexpected_errors_end_the_batch() {
        let dir = tempfile::tempdir().unwrap();
        let options = options(dir.path(), &["https://youtu.be/first", "https://youtu.be/second"]);
        let tools = FakeTools::failing(vec![("first", Failure::Crash)]);
        let prompt = never_asked();
        let console = Console::new(false, false);

        let pipeline = ExtractionPipeline::new(&options, &tools, &prompt, &console, RunLog::disabled());
        let err = assert_err!(pipeline.run().await);

        assert!(matches!(err, ExtractError::Unexpected(_)));
        assert!(leftover_temp_files(dir.path()).is_empty());
        assert!(tools.calls().iter().all(|call| !call.ends_with("second")));
    }

    #[tokio::test]
    async fn failures_are_written_to_the_run_log() {
        let dir = tempfile::tempdir().unwrap();
        let log_path = dir.path().join("run.log");
        let log = RunLog::append_to(&log_path).unwrap();
        let options = options(dir.path(), &["https://youtu.be/broken"]);
        let tools = FakeTools::failing(vec![("broken", Failure::Download)]);
        let prompt = never_asked();
        let console = Console::new(false, false);

        let pipeline = ExtractionPipeline::new(&options, &tools, &prompt, &console, log);
        let summary = assert_ok!(pipeline.run().await);
        assert_eq!(summary.failed, 1);

        let content = fs_err::read_to_string(&log_path).unwrap();
        assert!(content.contains("Starting processing of 1 URLs."));
        assert!(content.contains("ERROR: Download failed for https://youtu.be/broken: exit status: 1"));
    }

    #[tokio::test]
    async fn metadata_failures_keep_their_own_wording() {
        let dir = tempfile::tempdir().unwrap();
        let log_path = dir.path().join("run.log");
        let log = RunLog::append_to(&log_path).unwrap();
        let options = options(
            dir.path(),
            &[
                "https://youtu.be/private",
                "https://youtu.be/noformats",
                "https://youtu.be/unprobed",
            ],
        );
        let tools = FakeTools::failing(vec![
            ("private", Failure::Title),
            ("noformats", Failure::TempPath),
            ("unprobed", Failure::Probe),
        ]);
        let prompt = never_asked();
        let console = Console::new(false, false);

        let pipeline = ExtractionPipeline::new(&options, &tools, &prompt, &console, log);
        let summary = assert_ok!(pipeline.run().await);
        assert_eq!((summary.converted, summary.failed), (1, 2));

        let content = fs_err::read_to_string(&log_path).unwrap();
        assert!(content.contains(
            "ERROR: Could not get video metadata for URL https://youtu.be/private. Error: Video unavailable\n"
        ));
        assert!(content.contains("ERROR: Could not determine temporary filename: no formats\n"));
        assert!(content.contains("WARNING: Could not get audio duration using ffprobe. Error: N/A\n"));
        assert_eq!(content.matches("video metadata").count(), 1);
    }
}
