//! Memoised rendering for append-only text.

use crate::block::BlockParser;
use crate::DocumentNode;

/// Renders a growing text buffer without re-parsing completed lines.
///
/// Lines terminated by `\n` are fed into a settled parser once; only the
/// trailing partial line is parsed again on each [`document`](Self::document)
/// call. The output always equals [`render`](crate::render) over the full text.
#[derive(Debug, Clone, Default)]
pub struct IncrementalRenderer {
    settled: BlockParser,
    settled_len: usize,
    pending: String,
}

impl IncrementalRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a chunk. Empty chunks are no-ops.
    pub fn push(&mut self, chunk: &str) {
        if chunk.is_empty() {
            return;
        }
        self.pending.push_str(chunk);

        let Some(last_newline) = self.pending.rfind('\n') else {
            return;
        };
        let tail = self.pending.split_off(last_newline + 1);
        let complete = std::mem::replace(&mut self.pending, tail);

        for line in complete.lines() {
            self.settled.feed(line);
        }
        self.settled_len += complete.len();
    }

    /// Current document for everything pushed so far.
    pub fn document(&self) -> Vec<DocumentNode> {
        let mut parser = self.settled.clone();
        for line in self.pending.lines() {
            parser.feed(line);
        }
        parser.finish()
    }

    /// Bytes of text pushed so far.
    pub fn len(&self) -> usize {
        self.settled_len + self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
