use std::io;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;

/// Format an elapsed time the way the timing report prints it
pub fn format_seconds(elapsed: Duration) -> String {
    format!("{:.2}s", elapsed.as_secs_f64())
}

/// Format duration in human-readable format
pub fn format_duration(seconds: f64) -> String {
    let total_seconds = seconds.max(0.0) as u64;
    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let secs = total_seconds % 60;

    if hours > 0 {
        format!("{}h {}m {}s", hours, minutes, secs)
    } else if minutes > 0 {
        format!("{}m {}s", minutes, secs)
    } else {
        format!("{}s", secs)
    }
}

/// Replace path separators and control characters so a video title is a single file name
pub fn sanitize_filename(filename: &str) -> String {
    filename
        .chars()
        .map(|c| match c {
            '/' | '\\' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect::<String>()
        .trim()
        .to_string()
}

/// Append `.mp3` unless the name already ends with it (case-insensitive)
pub fn with_mp3_extension(name: &str) -> String {
    if name.to_lowercase().ends_with(".mp3") {
        name.to_string()
    } else {
        format!("{}.mp3", name)
    }
}

/// Render a command line for logs and debug output
pub fn display_command(program: &str, args: &[String]) -> String {
    std::iter::once(program)
        .chain(args.iter().map(String::as_str))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Check that a command can be spawned; only a failed spawn is an error, not the exit status
pub async fn check_command_available(command: &str, version_flag: &str) -> io::Result<()> {
    Command::new(command)
        .arg(version_flag)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .await
        .map(|_| ())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_seconds() {
        assert_eq!(format_seconds(Duration::from_millis(1234)), "1.23s");
        assert_eq!(format_seconds(Duration::ZERO), "0.00s");
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(30.0), "30s");
        assert_eq!(format_duration(90.0), "1m 30s");
        assert_eq!(format_duration(3661.0), "1h 1m 1s");
    }

    #[test]
    fn test_sanitize_filename() {
        assert_eq!(sanitize_filename("AC/DC - Thunderstruck"), "AC_DC - Thunderstruck");
        assert_eq!(sanitize_filename("  spaced  "), "spaced");
        assert_eq!(sanitize_filename("Zażółć gęślą jaźń"), "Zażółć gęślą jaźń");
    }

    #[test]
    fn test_with_mp3_extension() {
        assert_eq!(with_mp3_extension("song"), "song.mp3");
        assert_eq!(with_mp3_extension("song.mp3"), "song.mp3");
        assert_eq!(with_mp3_extension("SONG.Mp3"), "SONG.Mp3");
        assert_eq!(with_mp3_extension("song.m4a"), "song.m4a.mp3");
    }

    #[test]
    fn test_display_command() {
        let args = vec!["-f".to_string(), "bestaudio".to_string()];
        assert_eq!(display_command("yt-dlp", &args), "yt-dlp -f bestaudio");
    }

    #[tokio::test]
    async fn test_missing_command() {
        let err = check_command_available("definitely-not-a-real-tool-4821", "--version")
            .await
            .unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }
}
