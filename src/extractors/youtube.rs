use std::path::Path;

use crate::options::RunOptions;

/// Format selector shared by the filename query and the real download
pub const AUDIO_FORMAT: &str = "bestaudio";

/// Output template that makes `--get-filename` print the video title
pub const TITLE_TEMPLATE: &str = "%(title)s";

/// Command-line builder for yt-dlp
#[derive(Debug, Clone)]
pub struct YtDlp {
    program: String,
    cookies: Option<String>,
    limit_rate: Option<String>,
    color: bool,
    progress: bool,
    verbose: bool,
}

impl YtDlp {
    pub fn new(program: impl Into<String>, options: &RunOptions) -> Self {
        Self {
            program: program.into(),
            cookies: options.cookies.clone(),
            limit_rate: options.limit_rate.clone(),
            color: options.color,
            progress: options.progress,
            verbose: options.debug,
        }
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    /// Metadata-only query printing the canonical title
    pub fn title_args(&self, url: &str) -> Vec<String> {
        let mut args = strings(["--encoding", "utf-8", "--get-filename", "-o", TITLE_TEMPLATE]);
        self.push_cookies(&mut args);
        args.push(url.to_string());
        args
    }

    /// Dry run printing the file name the download would produce for `template`
    pub fn filename_args(&self, url: &str, template: &Path) -> Vec<String> {
        let mut args = strings(["--encoding", "utf-8", "--get-filename", "-f", AUDIO_FORMAT, "-o"]);
        args.push(template.to_string_lossy().into_owned());
        self.push_cookies(&mut args);
        args.push(url.to_string());
        args
    }

    /// The real download of the best audio stream to `template`
    pub fn download_args(&self, url: &str, template: &Path) -> Vec<String> {
        let mut args = strings(["-f", AUDIO_FORMAT, "--no-mtime", "--newline", "-o"]);
        args.push(template.to_string_lossy().into_owned());

        if self.color {
            args.extend(strings(["--color", "always"]));
        }
        if self.progress {
            args.push("--progress".to_string());
        }
        if self.verbose {
            args.push("--verbose".to_string());
        }
        self.push_cookies(&mut args);
        if let Some(rate) = &self.limit_rate {
            args.push("--limit-rate".to_string());
            args.push(rate.clone());
        }

        args.push(url.to_string());
        args
    }

    fn push_cookies(&self, args: &mut Vec<String>) {
        if let Some(browser) = &self.cookies {
            args.push("--cookies-from-browser".to_string());
            args.push(browser.clone());
        }
    }
}

/// The last non-empty line of a `--get-filename` answer
pub fn last_line(stdout: &str) -> Option<&str> {
    stdout.lines().map(str::trim).filter(|line| !line.is_empty()).last()
}

fn strings<const N: usize>(items: [&str; N]) -> Vec<String> {
    items.iter().map(|item| item.to_string()).collect()
}
