//! Line codec for serial and TCP command channels
//!
//! Requests are framed as:
//! ```text
//! [ JSON CommandMessage ][ '\n' | '\r' ]
//! ```
//! A line is also flushed when it reaches [`LINE_BUFFER_SIZE`] bytes without a
//! terminator. Responses are a serialized Envelope with no terminator, so the
//! host side decodes them by JSON document boundaries instead of lines.

use bytes::{Buf, Bytes, BytesMut};
use thiserror::Error;

use crate::limits::LINE_BUFFER_SIZE;
use crate::message::CommandMessage;
use crate::result::Envelope;

/// Errors that can occur during encoding/decoding
#[derive(Error, Debug)]
pub enum CodecError {
    #[error("Request too large: {0} bytes (max: {LINE_BUFFER_SIZE})")]
    RequestTooLarge(usize),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

fn is_terminator(byte: u8) -> bool {
    byte == b'\n' || byte == b'\r'
}

/// Encode a command as one terminated request line
pub fn encode_request(message: &CommandMessage) -> Result<Bytes, CodecError> {
    let mut line = message.to_vec()?;

    // The device flushes at the buffer bound, so a longer request would be split
    if line.len() + 1 > LINE_BUFFER_SIZE {
        return Err(CodecError::RequestTooLarge(line.len() + 1));
    }

    line.push(b'\n');
    Ok(Bytes::from(line))
}

/// Try to decode one response Envelope from a buffer
///
/// Bytes before the first `{` are discarded (devices interleave log output on
/// the same channel).
///
/// Returns:
/// - `Ok(Some(envelope))` if a complete document was decoded
/// - `Ok(None)` if more data is needed
/// - `Err(...)` if the document is invalid
pub fn decode_envelope(buf: &mut BytesMut) -> Result<Option<Envelope>, CodecError> {
    match buf.iter().position(|&b| b == b'{') {
        Some(start) => buf.advance(start),
        None => {
            buf.clear();
            return Ok(None);
        }
    }

    let (next, consumed) = {
        let mut stream = serde_json::Deserializer::from_slice(&buf[..]).into_iter::<Envelope>();
        let next = stream.next();
        (next, stream.byte_offset())
    };

    match next {
        Some(Ok(envelope)) => {
            buf.advance(consumed);
            Ok(Some(envelope))
        }
        Some(Err(e)) if e.is_eof() => Ok(None),
        Some(Err(e)) => Err(e.into()),
        None => Ok(None),
    }
}

/// Decoder state machine for streaming line decoding
#[derive(Debug)]
pub struct LineDecoder {
    /// Partial line being accumulated
    buffer: BytesMut,
    /// Lines waiting to be taken
    ready: std::collections::VecDeque<Bytes>,
}

impl Default for LineDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl LineDecoder {
    /// Create a new line decoder
    pub fn new() -> Self {
        Self {
            buffer: BytesMut::with_capacity(LINE_BUFFER_SIZE),
            ready: std::collections::VecDeque::new(),
        }
    }

    /// Add data to the decoder
    pub fn extend(&mut self, data: &[u8]) {
        for &byte in data {
            if is_terminator(byte) {
                self.flush();
                continue;
            }

            self.buffer.extend_from_slice(&[byte]);
            if self.buffer.len() >= LINE_BUFFER_SIZE {
                self.flush();
            }
        }
    }

    fn flush(&mut self) {
        let line = self.buffer.split().freeze();
        // "\r\n" and stray terminators produce blank lines, which carry no command
        if !line.iter().all(u8::is_ascii_whitespace) {
            self.ready.push_back(line);
        }
    }

    /// Take the next complete line, without its terminator
    ///
    /// Call this repeatedly until it returns `None` to drain all complete lines
    pub fn decode_next(&mut self) -> Option<Bytes> {
        self.ready.pop_front()
    }

    /// Get the current partial line length (for debugging)
    pub fn buffer_len(&self) -> usize {
        self.buffer.len()
    }
}
