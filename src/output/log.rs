use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

/// Append-only text log of executed commands and tool output.
///
/// The handle is cheap to clone and is passed explicitly to whoever needs to write;
/// a disabled handle accepts and drops every record.
#[derive(Debug, Clone, Default)]
pub struct RunLog {
    sink: Option<Arc<LogSink>>,
}

#[derive(Debug)]
struct LogSink {
    path: PathBuf,
    file: Mutex<fs_err::File>,
}

impl RunLog {
    pub fn disabled() -> Self {
        Self::default()
    }

    /// Open (or create) the log file in append mode
    pub fn append_to(path: &Path) -> std::io::Result<Self> {
        let file = fs_err::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)?;

        Ok(Self {
            sink: Some(Arc::new(LogSink {
                path: path.to_path_buf(),
                file: Mutex::new(file),
            })),
        })
    }

    /// Append one timestamped line
    pub fn record(&self, message: impl AsRef<str>) {
        let Some(sink) = &self.sink else {
            return;
        };

        let line = format!(
            "{} - {}\n",
            chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
            message.as_ref().trim_end()
        );

        let Ok(mut file) = sink.file.lock() else {
            return;
        };
        if let Err(e) = file.write_all(line.as_bytes()) {
            tracing::warn!("Failed to write to log file {}: {}", sink.path.display(), e);
        }
    }
}
