//! Reassembles a `text/event-stream` completion into one string.
//!
//! The body arrives as arbitrary byte chunks. Complete lines are handled as
//! soon as their newline shows up; the incomplete tail is kept until the next
//! chunk. Only `data:` lines matter. Each carries one JSON chunk whose
//! `choices[0].delta.content` is appended in arrival order, and
//! `data: [DONE]` ends the stream. Fragments that are not valid JSON are
//! skipped so one bad chunk cannot sink an otherwise good answer.

use tracing::trace;

use crate::parse::response::{ChatCompletionChunk, Completion};

const DONE_SENTINEL: &str = "[DONE]";

#[derive(Debug, Default)]
pub struct CompletionStream {
    pending: Vec<u8>,
    completion: Completion,
    finished: bool,
    skipped: usize,
}

impl CompletionStream {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed the next body chunk. Bytes after the sentinel are ignored.
    pub fn feed(&mut self, chunk: &[u8]) {
        if self.finished {
            return;
        }
        self.pending.extend_from_slice(chunk);

        while let Some(pos) = self.pending.iter().position(|b| *b == b'\n') {
            let line: Vec<u8> = self.pending.drain(..=pos).collect();
            let line = String::from_utf8_lossy(&line);
            self.handle_line(line.trim_end_matches(['\n', '\r']));
            if self.finished {
                self.pending.clear();
                return;
            }
        }
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Number of `data:` fragments that failed to parse.
    pub fn skipped(&self) -> usize {
        self.skipped
    }

    /// End of body. A final line that never got its newline is still used.
    pub fn finish(mut self) -> Completion {
        if !self.finished && !self.pending.is_empty() {
            let tail = std::mem::take(&mut self.pending);
            let tail = String::from_utf8_lossy(&tail);
            self.handle_line(tail.trim_end_matches('\r'));
        }
        self.completion
    }

    fn handle_line(&mut self, line: &str) {
        let Some(data) = line.strip_prefix("data:") else {
            return;
        };
        let data = data.strip_prefix(' ').unwrap_or(data);

        if data.trim() == DONE_SENTINEL {
            self.finished = true;
            return;
        }

        match serde_json::from_str::<ChatCompletionChunk>(data) {
            Ok(chunk) => {
                if let Some(text) = chunk.delta_content() {
                    self.completion.content.push_str(text);
                }
                if self.completion.model.is_none() {
                    self.completion.model = chunk.model;
                }
                if chunk.usage.is_some() {
                    self.completion.usage = chunk.usage;
                }
            }
            Err(err) => {
                self.skipped += 1;
                trace!(error = %err, "skipping malformed stream fragment");
            }
        }
    }
}
