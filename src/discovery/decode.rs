//! Newline-delimited JSON framing for the watch body.
//!
//! # Responsibilities
//! - Reassemble records split across network reads
//! - Decode complete lines into `ChangeEvent`s
//!
//! # Design Decisions
//! - Splits raw bytes, not text, so a UTF-8 sequence cut by a read boundary survives
//! - A partial trailing line stays buffered until its newline arrives
//! - Decoding is per line: one bad record never poisons its neighbours
//! - Each byte is scanned once; buffered bytes are never rescanned
//! - A record longer than the cap is dropped up to its newline and counted

use crate::discovery::types::ChangeEvent;

/// Largest single record kept in memory while waiting for its newline.
pub const MAX_LINE_BYTES: usize = 4 * 1024 * 1024;

/// Accumulates body chunks and yields complete lines.
#[derive(Debug)]
pub struct LineBuffer {
    pending: Vec<u8>,
    max_line: usize,
    /// Inside an oversized record; skip until the next newline.
    discarding: bool,
    oversized: usize,
}

impl Default for LineBuffer {
    fn default() -> Self {
        Self::with_max_line(MAX_LINE_BYTES)
    }
}

impl LineBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_line(max_line: usize) -> Self {
        Self {
            pending: Vec::new(),
            max_line,
            discarding: false,
            oversized: 0,
        }
    }

    /// Append a chunk and drain every line it completes.
    ///
    /// Returned lines exclude the terminating `\n`.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<Vec<u8>> {
        let mut lines = Vec::new();
        let mut rest = chunk;

        while let Some(pos) = rest.iter().position(|b| *b == b'\n') {
            let head = &rest[..pos];
            rest = &rest[pos + 1..];

            if self.discarding {
                self.discarding = false;
            } else if self.pending.len() + head.len() > self.max_line {
                self.pending.clear();
                self.oversized += 1;
            } else {
                self.pending.extend_from_slice(head);
                lines.push(std::mem::take(&mut self.pending));
            }
        }

        if self.discarding {
            return lines;
        }
        if self.pending.len() + rest.len() > self.max_line {
            self.pending.clear();
            self.discarding = true;
            self.oversized += 1;
        } else {
            self.pending.extend_from_slice(rest);
        }
        lines
    }

    /// Number of records dropped for exceeding the cap since the last call.
    pub fn take_oversized(&mut self) -> usize {
        std::mem::take(&mut self.oversized)
    }

    /// Bytes held back waiting for a newline.
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Forget any partial line, e.g. when the stream is reopened.
    pub fn clear(&mut self) {
        self.pending.clear();
        self.discarding = false;
    }
}

/// Decode one line. Blank lines yield `Ok(None)`.
pub fn decode_line(line: &[u8]) -> Result<Option<ChangeEvent>, serde_json::Error> {
    let trimmed = line.trim_ascii();
    if trimmed.is_empty() {
        return Ok(None);
    }
    serde_json::from_slice(trimmed).map(Some)
}
