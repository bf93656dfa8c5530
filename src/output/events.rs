/// Markers of yt-dlp lines worth keeping on screen when not in debug mode
pub const ESSENTIAL_MARKERS: &[&str] = &["[youtube]", "[info]", "ERROR:"];

const DOWNLOAD_MARKER: &str = "[download]";
const OUT_TIME_KEY: &str = "out_time_us=";

/// What a single line of tool output means for the display
#[derive(Debug, Clone, PartialEq)]
pub enum LineEvent {
    /// Nothing to show
    None,
    /// A progress update; `detail` is the text to redraw in place
    ProgressPercent { percent: f64, detail: String },
    /// A line to print on its own
    EssentialInfo(String),
    /// Anything else, only shown in debug mode
    Raw(String),
}

/// Classify one line of yt-dlp output
pub fn parse_download_line(line: &str) -> LineEvent {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return LineEvent::None;
    }

    let plain = console::strip_ansi_codes(trimmed);

    if plain.contains(DOWNLOAD_MARKER) && plain.contains('%') {
        if let Some(percent) = percent_before_sign(&plain) {
            return LineEvent::ProgressPercent {
                percent,
                detail: trimmed.to_string(),
            };
        }
    }

    if ESSENTIAL_MARKERS.iter().any(|marker| plain.contains(marker)) {
        return LineEvent::EssentialInfo(trimmed.to_string());
    }

    LineEvent::Raw(trimmed.to_string())
}

/// Classify one line of `ffmpeg -progress` output against the probed total duration
pub fn parse_transcode_line(line: &str, total_seconds: f64) -> LineEvent {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return LineEvent::None;
    }

    let percent = trimmed
        .strip_prefix(OUT_TIME_KEY)
        .and_then(|value| value.parse::<u64>().ok())
        .and_then(|micros| conversion_percent(micros, total_seconds));

    match percent {
        Some(percent) => LineEvent::ProgressPercent {
            percent,
            detail: format!("Converting to mp3: {:.1}%", percent.clamp(0.0, 100.0)),
        },
        None => LineEvent::Raw(trimmed.to_string()),
    }
}

/// Percentage of `total_seconds` covered by `out_time_us`, if the total is known
pub fn conversion_percent(out_time_us: u64, total_seconds: f64) -> Option<f64> {
    if total_seconds > 0.0 && total_seconds.is_finite() {
        Some(out_time_us as f64 / (total_seconds * 1_000_000.0) * 100.0)
    } else {
        None
    }
}

/// The number immediately preceding the first `%` sign, e.g. `45.2` in `[download]  45.2% of 3MiB`
fn percent_before_sign(text: &str) -> Option<f64> {
    let sign = text.find('%')?;
    let head = &text[..sign];
    let start = head
        .rfind(|c: char| !(c.is_ascii_digit() || c == '.'))
        .map_or(0, |idx| idx + 1);

    head[start..].parse::<f64>().ok()
}
