//! Append-only chat log interface.
//!
//! The engine only needs three operations: open a log in append mode, append a
//! line, close it. [`FileChatLog`] is the plain-file backend; anything else
//! (rotation, remote sinks) can be plugged in through [`ChatLogBackend`].
//!
//! Every appended line is stamped with the local wall-clock time:
//!
//! ```text
//! [14:02:11] Connected at Mon Oct 19 14:02:11 2026
//! [14:02:12] Joined #rust on irc.example.org
//! ```

use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::Path;

use chrono::Local;
use tracing::debug;

use crate::error::{ChatLogError, ChatLogResult};

/// Opens chat log writers.
pub trait ChatLogBackend: Send + Sync {
    /// Opens (or creates) the log at `path` in append mode.
    fn open(&self, path: &Path) -> ChatLogResult<Box<dyn ChatLogWriter>>;
}

/// A single open chat log.
///
/// Writers are never shared: the owner serializes access.
pub trait ChatLogWriter: Send {
    /// Appends one entry.
    fn append(&mut self, text: &str) -> ChatLogResult<()>;

    /// Flushes and closes the log.
    fn close(self: Box<Self>) -> ChatLogResult<()>;
}

/// Human-readable timestamp used in lifecycle entries, e.g.
/// `Mon Oct 19 14:02:11 2026`.
pub fn timestamp() -> String {
    Local::now().format("%a %b %e %H:%M:%S %Y").to_string()
}

/// Chat log backend writing plain text files.
#[derive(Debug, Clone, Copy, Default)]
pub struct FileChatLog;

impl ChatLogBackend for FileChatLog {
    fn open(&self, path: &Path) -> ChatLogResult<Box<dyn ChatLogWriter>> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|source| ChatLogError::Open {
                path: path.display().to_string(),
                source,
            })?;
        debug!(path = %path.display(), "Opened chat log");
        Ok(Box::new(FileChatLogWriter {
            out: BufWriter::new(file),
        }))
    }
}

struct FileChatLogWriter {
    out: BufWriter<File>,
}

impl ChatLogWriter for FileChatLogWriter {
    fn append(&mut self, text: &str) -> ChatLogResult<()> {
        let stamp = Local::now().format("%H:%M:%S");
        writeln!(self.out, "[{stamp}] {text}")?;
        self.out.flush()?;
        Ok(())
    }

    fn close(mut self: Box<Self>) -> ChatLogResult<()> {
        self.out.flush()?;
        Ok(())
    }
}
