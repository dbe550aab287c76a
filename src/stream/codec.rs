//! Line reassembly codec for server stdio streams.
//!
//! Splits a raw byte stream *after* each `\n`, so every emitted item is a
//! complete line that still carries its trailing newline and the emitted
//! lines concatenate back to the original byte stream. Bytes after the last
//! newline stay buffered in the `BytesMut` until the next read completes
//! them.
//!
//! Two deliberate departures from [`tokio_util::codec::LinesCodec`]:
//!
//! - no maximum line length — a single line is bounded only by memory;
//! - an unterminated fragment at EOF is discarded rather than flushed,
//!   matching how the supervised server's console output has always been
//!   consumed. The caller loses at most one partial line when the process
//!   is killed mid-write.

use bytes::BytesMut;
use tokio_util::codec::Decoder;

use crate::{AppError, Result};

/// Split-after line codec. Each decoded item includes its trailing `\n`;
/// consumers strip line terminators themselves.
#[derive(Debug, Default)]
pub struct LineCodec;

impl LineCodec {
    /// Create a new `LineCodec`.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Decoder for LineCodec {
    type Item = String;
    type Error = AppError;

    /// Emit the next complete line from `src`, trailing `\n` included.
    ///
    /// Returns `Ok(None)` while `src` holds no newline yet; the partial
    /// bytes remain buffered for the next read.
    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>> {
        let Some(pos) = src.iter().position(|&b| b == b'\n') else {
            return Ok(None);
        };

        let line = src.split_to(pos + 1);
        Ok(Some(String::from_utf8_lossy(&line).into_owned()))
    }

    /// Drain remaining complete lines at EOF, then drop any unterminated
    /// trailing fragment.
    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>> {
        if let Some(line) = self.decode(src)? {
            return Ok(Some(line));
        }

        // Unterminated tail at EOF is discarded, not flushed.
        src.clear();
        Ok(None)
    }
}
