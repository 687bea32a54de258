//! Decoding of `/api/generate` response bodies.
//!
//! Ollama streams newline-delimited JSON (`application/x-ndjson`) unless the
//! request disables streaming, in which case a single JSON object is returned.
//! Either way the generated text lives in the `response` field.

use bytes::Bytes;
use futures::{Stream, StreamExt};
use serde::Deserialize;
use tracing::error;

/// Body framing announced by the `Content-Type` header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Framing {
    Ndjson,
    Json,
}

impl Framing {
    /// Classify a content type, ignoring parameters such as `charset`.
    pub fn from_content_type(content_type: &str) -> Option<Self> {
        let mime = content_type.split(';').next().unwrap_or_default().trim();
        if mime.eq_ignore_ascii_case("application/x-ndjson") {
            Some(Framing::Ndjson)
        } else if mime.eq_ignore_ascii_case("application/json") {
            Some(Framing::Json)
        } else {
            None
        }
    }
}

/// One fragment of a generation; fields other than the token are ignored.
#[derive(Debug, Deserialize)]
struct Fragment {
    #[serde(default)]
    response: String,
}

/// Incremental NDJSON decoder.
///
/// Bytes are buffered until a newline completes a line, so fragments split
/// across network chunks decode correctly. Every decoded line contributes its
/// token plus a trailing `\n`; undecodable lines are logged and dropped.
#[derive(Debug, Default)]
pub struct NdjsonAccumulator {
    pending: Vec<u8>,
    text: String,
    skipped: usize,
}

impl NdjsonAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed the next chunk of the body.
    pub fn push(&mut self, chunk: &[u8]) {
        self.pending.extend_from_slice(chunk);
        while let Some(pos) = self.pending.iter().position(|&b| b == b'\n') {
            let line: Vec<u8> = self.pending.drain(..=pos).collect();
            self.decode_line(&line[..pos]);
        }
    }

    /// Number of lines dropped as malformed so far.
    pub fn skipped(&self) -> usize {
        self.skipped
    }

    /// Flush any unterminated final line and return the accumulated text.
    pub fn finish(mut self) -> String {
        let rest = std::mem::take(&mut self.pending);
        self.decode_line(&rest);
        self.text
    }

    fn decode_line(&mut self, line: &[u8]) {
        let line = line.trim_ascii();
        if line.is_empty() {
            return;
        }
        match serde_json::from_slice::<Fragment>(line) {
            Ok(fragment) => {
                self.text.push_str(&fragment.response);
                self.text.push('\n');
            }
            Err(e) => {
                self.skipped += 1;
                error!("JSON decoding error in line: {}", e);
            }
        }
    }
}

/// Decode a complete NDJSON body held in memory.
pub fn parse_ndjson(body: &[u8]) -> String {
    let mut accumulator = NdjsonAccumulator::new();
    accumulator.push(body);
    accumulator.finish()
}

/// Decode a single-object (non-streaming) body.
pub fn parse_json(body: &[u8]) -> Result<String, serde_json::Error> {
    let fragment: Fragment = serde_json::from_slice(body)?;
    Ok(format!("{}\n", fragment.response))
}

/// Drain a byte stream through an [`NdjsonAccumulator`].
///
/// Transport errors abort the read; malformed lines do not.
pub async fn collect_ndjson<S, E>(stream: S) -> Result<String, E>
where
    S: Stream<Item = Result<Bytes, E>>,
{
    let mut stream = std::pin::pin!(stream);
    let mut accumulator = NdjsonAccumulator::new();
    while let Some(chunk) = stream.next().await {
        accumulator.push(&chunk?);
    }
    Ok(accumulator.finish())
}
