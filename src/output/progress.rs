use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};

use super::events::{parse_download_line, parse_transcode_line, LineEvent};
use super::{Console, Tone};

/// A single status line on stdout that is redrawn in place.
///
/// Hidden automatically when stdout is not a terminal; lines printed through
/// [`InPlaceLine::println`] go above it and are never clobbered.
struct InPlaceLine {
    bar: ProgressBar,
    drawn: bool,
}

impl InPlaceLine {
    fn new() -> Self {
        let bar = ProgressBar::with_draw_target(None, ProgressDrawTarget::stdout());
        bar.set_style(ProgressStyle::with_template("{msg}").unwrap_or_else(|_| ProgressStyle::default_spinner()));
        Self { bar, drawn: false }
    }

    fn redraw(&mut self, text: String) {
        self.bar.set_message(text);
        self.drawn = true;
    }

    fn println(&self, text: &str) {
        self.bar.suspend(|| println!("{}", text));
    }

    /// Leave the last redraw on screen
    fn finish(&self) {
        if self.drawn {
            self.bar.finish();
        } else {
            self.bar.finish_and_clear();
        }
    }
}

/// Raw tool output as echoed in debug mode; blank lines are dropped
fn debug_echo(raw: &str) -> Option<&str> {
    let text = raw.trim_end();
    if text.trim().is_empty() {
        None
    } else {
        Some(text)
    }
}

/// Renders yt-dlp output during the download phase
pub struct DownloadView {
    console: Console,
    line: InPlaceLine,
}

impl DownloadView {
    pub fn new(console: &Console) -> Self {
        Self {
            console: console.clone(),
            line: InPlaceLine::new(),
        }
    }

    pub fn handle_line(&mut self, raw: &str) {
        if self.console.debug() {
            if let Some(text) = debug_echo(raw) {
                self.line.println(text);
            }
            return;
        }

        match parse_download_line(raw) {
            LineEvent::ProgressPercent { detail, .. } => self.line.redraw(detail),
            LineEvent::EssentialInfo(text) => self.line.println(&text),
            LineEvent::Raw(_) | LineEvent::None => {}
        }
    }

    pub fn finish(self) {
        self.line.finish();
    }
}

/// Renders `ffmpeg -progress` output as a percentage of the probed duration
pub struct ConversionView {
    console: Console,
    total_seconds: Option<f64>,
    line: InPlaceLine,
}

impl ConversionView {
    pub fn new(console: &Console, total_seconds: Option<f64>) -> Self {
        let total_seconds = total_seconds.filter(|secs| *secs > 0.0);
        if total_seconds.is_none() {
            console.say(Tone::Plain, "Cannot show progress because audio duration is unknown.");
        }

        Self {
            console: console.clone(),
            total_seconds,
            line: InPlaceLine::new(),
        }
    }

    pub fn handle_line(&mut self, raw: &str) {
        if self.console.debug() {
            if let Some(text) = debug_echo(raw) {
                self.line.println(text);
            }
            return;
        }

        let Some(total) = self.total_seconds else {
            return;
        };
        if let LineEvent::ProgressPercent { detail, .. } = parse_transcode_line(raw, total) {
            self.line.redraw(self.console.paint(Tone::Accent, &detail));
        }
    }

    pub fn finish(self) {
        self.line.finish();
    }
}
