//! Reply wrapping.
//!
//! Protocol lines are length-limited, so a reply is split into an ordered
//! sequence of chunks before it is sent:
//!
//! - words are kept whole where possible, whitespace runs collapse to one space;
//! - a word that alone exceeds the available width is force-broken;
//! - every chunk after the first starts with the continuation marker, and the
//!   marker counts toward the width, so no chunk is ever wider than the limit.
//!
//! Widths are measured in characters.

use demibot_core::{Transport, TransportResult, nick_of};
use tracing::trace;

/// Default maximum chunk width.
pub const DEFAULT_WRAP_WIDTH: usize = 400;

/// Default continuation marker.
pub const DEFAULT_CONTINUATION: &str = "...";

/// Splits replies into protocol-safe chunks and sends them in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplyFormatter {
    width: usize,
    continuation: String,
}

impl Default for ReplyFormatter {
    fn default() -> Self {
        Self::new(DEFAULT_WRAP_WIDTH, DEFAULT_CONTINUATION)
    }
}

impl ReplyFormatter {
    /// Creates a formatter. A zero width is treated as one.
    pub fn new(width: usize, continuation: impl Into<String>) -> Self {
        Self {
            width: width.max(1),
            continuation: continuation.into(),
        }
    }

    /// Maximum chunk width.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Marker prefixed to every chunk after the first.
    pub fn continuation(&self) -> &str {
        &self.continuation
    }

    /// Wraps `text` into chunks no wider than [`width`](Self::width).
    ///
    /// Whitespace-only text yields no chunks.
    pub fn wrap(&self, text: &str) -> Vec<String> {
        let marker_len = self.continuation.chars().count();
        // Continuation lines lose room to the marker, but always keep one column.
        let rest_width = self.width.saturating_sub(marker_len).max(1);

        let mut lines: Vec<String> = Vec::new();
        let mut current = String::new();
        let mut current_len = 0usize;

        for word in text.split_whitespace() {
            let mut word = word;
            loop {
                let limit = if lines.is_empty() { self.width } else { rest_width };
                let word_len = word.chars().count();
                let needed = if current_len == 0 {
                    word_len
                } else {
                    current_len + 1 + word_len
                };

                if needed <= limit {
                    if current_len > 0 {
                        current.push(' ');
                        current_len += 1;
                    }
                    current.push_str(word);
                    current_len += word_len;
                    break;
                }

                if current_len > 0 {
                    lines.push(std::mem::take(&mut current));
                    current_len = 0;
                    continue;
                }

                // The word alone does not fit: break it at the limit.
                let split = word
                    .char_indices()
                    .nth(limit)
                    .map(|(i, _)| i)
                    .unwrap_or(word.len());
                lines.push(word[..split].to_string());
                word = &word[split..];
                if word.is_empty() {
                    break;
                }
            }
        }

        if current_len > 0 {
            lines.push(current);
        }

        lines
            .into_iter()
            .enumerate()
            .map(|(i, line)| {
                if i == 0 {
                    line
                } else {
                    format!("{}{}", self.continuation, line)
                }
            })
            .collect()
    }

    /// Wraps `text` and sends every chunk to `target`, strictly in order.
    ///
    /// A `nick!user@host` target is reduced to the nickname first. Returns the
    /// number of chunks sent; stops at the first transport error.
    pub async fn send(
        &self,
        transport: &dyn Transport,
        target: &str,
        text: &str,
    ) -> TransportResult<usize> {
        let target = nick_of(target);
        let chunks = self.wrap(text);
        for chunk in &chunks {
            trace!(target = %target, len = chunk.len(), "Sending reply chunk");
            transport.send(target, chunk).await?;
        }
        Ok(chunks.len())
    }
}
