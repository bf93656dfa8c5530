use std::path::Path;

use crate::options::Quality;

/// Command-line builders for ffmpeg and ffprobe
#[derive(Debug, Clone)]
pub struct Ffmpeg {
    transcoder: String,
    probe: String,
}

impl Ffmpeg {
    pub fn new(transcoder: impl Into<String>, probe: impl Into<String>) -> Self {
        Self {
            transcoder: transcoder.into(),
            probe: probe.into(),
        }
    }

    pub fn transcoder(&self) -> &str {
        &self.transcoder
    }

    pub fn probe(&self) -> &str {
        &self.probe
    }

    /// ffprobe query printing only the container duration in seconds
    pub fn probe_args(&self, media: &Path) -> Vec<String> {
        vec![
            "-v".to_string(),
            "error".to_string(),
            "-show_entries".to_string(),
            "format=duration".to_string(),
            "-of".to_string(),
            "default=noprint_wrappers=1:nokey=1".to_string(),
            media.to_string_lossy().into_owned(),
        ]
    }

    /// Strip video, encode MP3 and report machine-readable progress on stdout.
    /// The output is always overwritten; the caller has already decided it may be.
    pub fn transcode_args(&self, input: &Path, output: &Path, quality: Quality) -> Vec<String> {
        let mut args = vec![
            "-i".to_string(),
            input.to_string_lossy().into_owned(),
            "-vn".to_string(),
        ];
        args.extend(quality.encoder_args().iter().map(|arg| arg.to_string()));
        args.extend([
            "-progress".to_string(),
            "pipe:1".to_string(),
            "-y".to_string(),
            output.to_string_lossy().into_owned(),
        ]);
        args
    }
}

/// Parse the single number ffprobe prints for `format=duration`
pub fn parse_duration(stdout: &str) -> Option<f64> {
    stdout
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|secs| secs.is_finite() && *secs >= 0.0)
}
