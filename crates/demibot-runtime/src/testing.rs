//! In-memory transport and chat log for tests.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;

use demibot_core::{
    ChatLogBackend, ChatLogResult, ChatLogWriter, Identity, Transport, TransportResult,
};

/// Records every outbound call.
#[derive(Debug, Default)]
pub(crate) struct MockTransport {
    pub connects: Mutex<Vec<Identity>>,
    pub sent: Mutex<Vec<(String, String)>>,
    pub joins: Mutex<Vec<String>>,
    pub nicks: Mutex<Vec<String>>,
}

impl MockTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Lines sent so far, as `(target, text)`.
    pub fn sent(&self) -> Vec<(String, String)> {
        self.sent.lock().clone()
    }

    /// Texts sent so far, targets dropped.
    pub fn texts(&self) -> Vec<String> {
        self.sent.lock().iter().map(|(_, text)| text.clone()).collect()
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn connect(&self, identity: &Identity) -> TransportResult<()> {
        self.connects.lock().push(identity.clone());
        Ok(())
    }

    async fn join(&self, channel: &str) -> TransportResult<()> {
        self.joins.lock().push(channel.to_string());
        Ok(())
    }

    async fn send(&self, target: &str, text: &str) -> TransportResult<()> {
        self.sent.lock().push((target.to_string(), text.to_string()));
        Ok(())
    }

    async fn set_nick(&self, nickname: &str) -> TransportResult<()> {
        self.nicks.lock().push(nickname.to_string());
        Ok(())
    }
}

/// A chat log backend keeping every line in memory.
#[derive(Debug, Clone, Default)]
pub(crate) struct MemoryChatLog {
    lines: Arc<Mutex<Vec<String>>>,
}

impl MemoryChatLog {
    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().clone()
    }

    /// Whether some line ends with `text`.
    pub fn contains(&self, text: &str) -> bool {
        self.lines.lock().iter().any(|line| line.ends_with(text))
    }
}

struct MemoryWriter {
    lines: Arc<Mutex<Vec<String>>>,
}

impl ChatLogBackend for MemoryChatLog {
    fn open(&self, _path: &Path) -> ChatLogResult<Box<dyn ChatLogWriter>> {
        Ok(Box::new(MemoryWriter {
            lines: Arc::clone(&self.lines),
        }))
    }
}

impl ChatLogWriter for MemoryWriter {
    fn append(&mut self, line: &str) -> ChatLogResult<()> {
        self.lines.lock().push(line.to_string());
        Ok(())
    }

    fn close(self: Box<Self>) -> ChatLogResult<()> {
        Ok(())
    }
}
