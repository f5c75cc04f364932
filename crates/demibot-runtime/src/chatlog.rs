//! The session's lifecycle logger.
//!
//! Wraps a [`ChatLogBackend`] writer with the enabled flag that the `logs`
//! built-in toggles. All writes and toggles go through one mutex, so entries
//! never interleave and a toggle never races an append.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, warn};

use demibot_core::{ChatLogBackend, ChatLogResult, ChatLogWriter};

struct State {
    writer: Option<Box<dyn ChatLogWriter>>,
    enabled: bool,
}

/// An append-only chat log that can be switched off and on.
pub struct ChatLog {
    backend: Arc<dyn ChatLogBackend>,
    path: PathBuf,
    state: Mutex<State>,
}

impl ChatLog {
    /// Opens the log at `path` in append mode, enabled.
    pub fn open(backend: Arc<dyn ChatLogBackend>, path: impl Into<PathBuf>) -> ChatLogResult<Self> {
        let path = path.into();
        let writer = backend.open(&path)?;
        debug!(path = %path.display(), "Chat log opened");
        Ok(Self {
            backend,
            path,
            state: Mutex::new(State {
                writer: Some(writer),
                enabled: true,
            }),
        })
    }

    /// A log that starts disabled; [`enable`](Self::enable) opens it.
    pub fn disabled(backend: Arc<dyn ChatLogBackend>, path: impl Into<PathBuf>) -> Self {
        Self {
            backend,
            path: path.into(),
            state: Mutex::new(State {
                writer: None,
                enabled: false,
            }),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_enabled(&self) -> bool {
        self.state.lock().enabled
    }

    /// Appends an entry if logging is enabled. Write failures are logged.
    pub fn record(&self, text: &str) {
        let mut state = self.state.lock();
        if !state.enabled {
            return;
        }
        if let Some(writer) = state.writer.as_mut()
            && let Err(e) = writer.append(text)
        {
            warn!(path = %self.path.display(), error = %e, "Failed to write chat log entry");
        }
    }

    /// Closes the log and disables logging.
    ///
    /// Returns `false` without touching anything if logging was already off.
    pub fn disable(&self) -> ChatLogResult<bool> {
        let mut state = self.state.lock();
        if !state.enabled {
            return Ok(false);
        }
        state.enabled = false;
        if let Some(writer) = state.writer.take() {
            writer.close()?;
        }
        debug!(path = %self.path.display(), "Chat log disabled");
        Ok(true)
    }

    /// Reopens the log in append mode and enables logging.
    ///
    /// Returns `false` without touching anything if logging was already on.
    pub fn enable(&self) -> ChatLogResult<bool> {
        let mut state = self.state.lock();
        if state.enabled {
            return Ok(false);
        }
        state.writer = Some(self.backend.open(&self.path)?);
        state.enabled = true;
        debug!(path = %self.path.display(), "Chat log enabled");
        Ok(true)
    }

    /// Writes a final entry (if enabled) and closes the log for good.
    pub fn finish(&self, text: &str) {
        let mut state = self.state.lock();
        if !state.enabled {
            return;
        }
        state.enabled = false;
        if let Some(mut writer) = state.writer.take() {
            let result = writer.append(text).and_then(|()| writer.close());
            if let Err(e) = result {
                warn!(path = %self.path.display(), error = %e, "Failed to close chat log");
            }
        }
    }
}

impl std::fmt::Debug for ChatLog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatLog")
            .field("path", &self.path)
            .field("enabled", &self.is_enabled())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use demibot_core::FileChatLog;

    fn lines(path: &Path) -> Vec<String> {
        std::fs::read_to_string(path)
            .unwrap()
            .lines()
            .map(|l| l.split_once("] ").unwrap().1.to_string())
            .collect()
    }

    #[test]
    fn test_off_twice_is_noop_and_on_appends() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("chat.log");
        let log = ChatLog::open(Arc::new(FileChatLog), &path).unwrap();

        log.record("first");
        assert!(log.disable().unwrap());
        assert!(!log.disable().unwrap());
        log.record("dropped while disabled");

        assert!(log.enable().unwrap());
        assert!(!log.enable().unwrap());
        log.record("second");
        log.finish("last");

        assert_eq!(lines(&path), vec!["first", "second", "last"]);
        assert!(!log.is_enabled());
    }

    #[test]
    fn test_disabled_log_opens_on_enable() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("chat.log");
        let log = ChatLog::disabled(Arc::new(FileChatLog), &path);

        log.record("nothing");
        assert!(!path.exists());
        assert!(log.enable().unwrap());
        log.record("now");
        log.finish("bye");

        assert_eq!(lines(&path), vec!["now", "bye"]);
    }
}
