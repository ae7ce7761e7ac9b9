//! Destination for the formatted traffic log lines.

use std::{
    fs::{File, OpenOptions},
    io::Write,
    path::Path,
    sync::Mutex,
};

use chrono::{SecondsFormat, Utc};
use eyre::{Context, Result};
use tracing::warn;

/// Receives fully formatted traffic lines and writes them to the console
/// and/or an append-mode file, each prefixed with an RFC 3339 timestamp.
///
/// Writing is fire-and-forget: a failing file write is logged as a warning
/// and never surfaces to the proxying path.
pub struct LogSink {
    console: bool,
    file: Option<Mutex<File>>,
}

impl LogSink {
    /// A sink that only prints to the console.
    pub fn console() -> Self {
        Self { console: true, file: None }
    }

    /// A sink that appends to `path`, optionally echoing to the console.
    ///
    /// With `clear` set the file is truncated instead of appended to.
    pub fn with_file(path: impl AsRef<Path>, console: bool, clear: bool) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .wrap_err_with(|| format!("failed to create {}", parent.display()))?;
            }
        }

        let file = if clear {
            OpenOptions::new().create(true).write(true).truncate(true).open(path)
        } else {
            OpenOptions::new().create(true).append(true).open(path)
        }
        .wrap_err_with(|| format!("failed to open log file {}", path.display()))?;

        Ok(Self { console, file: Some(Mutex::new(file)) })
    }

    /// Writes one timestamped line.
    pub fn write(&self, message: &str) {
        let line =
            format!("[{}] {message}", Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true));

        if self.console {
            println!("{line}");
        }

        if let Some(file) = &self.file {
            if let Ok(mut file) = file.lock() {
                if let Err(e) = writeln!(file, "{line}") {
                    warn!("Failed to write traffic log line: {e}");
                }
            }
        }
    }
}
