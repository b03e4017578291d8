//! Server-sent event decoding for the streaming endpoint
//!
//! The service frames each response chunk as one SSE event whose `data:`
//! lines hold a JSON document. Network reads can split an event (or a line,
//! or a UTF-8 sequence) at any byte, so the decoder buffers raw bytes and
//! only interprets complete lines.

use crate::generation::response::ResponseChunk;
use crate::generation::{ChunkStream, GenerationError};
use futures::stream::{self, BoxStream, StreamExt};
use std::collections::VecDeque;
use tracing::debug;

/// Incremental SSE decoder yielding the data payload of each event
#[derive(Debug, Default)]
pub struct SseDecoder {
    buffer: Vec<u8>,

    /// Bytes of `buffer` already known to hold no newline
    scanned: usize,

    data: Vec<String>,
}

impl SseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed bytes, returning payloads of every event completed by them
    pub fn push(&mut self, bytes: &[u8]) -> Vec<String> {
        self.buffer.extend_from_slice(bytes);

        let mut events = Vec::new();
        let mut line_start = 0;
        let mut search_from = self.scanned;
        while let Some(offset) = self.buffer[search_from..].iter().position(|b| *b == b'\n') {
            let end = search_from + offset;
            let mut line = &self.buffer[line_start..end];
            if line.last() == Some(&b'\r') {
                line = &line[..line.len() - 1];
            }
            let line = String::from_utf8_lossy(line).into_owned();
            if let Some(payload) = self.process_line(&line) {
                events.push(payload);
            }
            line_start = end + 1;
            search_from = line_start;
        }

        self.buffer.drain(..line_start);
        self.scanned = self.buffer.len();
        events
    }

    /// Flush whatever is left once the byte stream has ended
    pub fn finish(&mut self) -> Option<String> {
        self.scanned = 0;
        if !self.buffer.is_empty() {
            let line = String::from_utf8_lossy(&std::mem::take(&mut self.buffer)).into_owned();
            let line = line.trim_end_matches('\r').to_string();
            if let Some(payload) = self.process_line(&line) {
                return Some(payload);
            }
        }
        self.dispatch()
    }

    fn process_line(&mut self, line: &str) -> Option<String> {
        if line.is_empty() {
            return self.dispatch();
        }
        if line.starts_with(':') {
            return None;
        }

        let (field, value) = match line.split_once(':') {
            Some((field, value)) => (field, value.strip_prefix(' ').unwrap_or(value)),
            None => (line, ""),
        };
        if field == "data" {
            self.data.push(value.to_string());
        }
        None
    }

    fn dispatch(&mut self) -> Option<String> {
        if self.data.is_empty() {
            return None;
        }
        let payload = self.data.join("\n");
        self.data.clear();
        Some(payload)
    }
}

/// Parse one event payload into a chunk
///
/// An error object in the payload fails the stream with the service's
/// message.
pub fn parse_chunk(payload: &str) -> Result<ResponseChunk, GenerationError> {
    let chunk: ResponseChunk = serde_json::from_str(payload)
        .map_err(|e| GenerationError::MalformedResponse(format!("{}: {}", e, truncate(payload))))?;

    match &chunk.error {
        Some(error) => Err(GenerationError::Api(error.describe())),
        None => Ok(chunk),
    }
}

fn truncate(payload: &str) -> String {
    const LIMIT: usize = 200;
    match payload.char_indices().nth(LIMIT) {
        Some((idx, _)) => format!("{}...", &payload[..idx]),
        None => payload.to_string(),
    }
}

struct DecodeState {
    body: BoxStream<'static, Result<Vec<u8>, GenerationError>>,
    decoder: SseDecoder,
    pending: VecDeque<Result<ResponseChunk, GenerationError>>,
    done: bool,
}

/// Turn a raw byte stream into a lazy stream of chunks
///
/// The output ends after the first error.
pub fn decode_chunks(body: BoxStream<'static, Result<Vec<u8>, GenerationError>>) -> ChunkStream {
    let state = DecodeState {
        body,
        decoder: SseDecoder::new(),
        pending: VecDeque::new(),
        done: false,
    };

    stream::unfold(state, |mut state| async move {
        loop {
            if let Some(item) = state.pending.pop_front() {
                if item.is_err() {
                    state.done = true;
                    state.pending.clear();
                }
                return Some((item, state));
            }
            if state.done {
                return None;
            }

            match state.body.next().await {
                Some(Ok(bytes)) => {
                    for payload in state.decoder.push(&bytes) {
                        enqueue(&mut state.pending, &payload);
                    }
                }
                Some(Err(e)) => {
                    state.done = true;
                    state.pending.push_back(Err(e));
                }
                None => {
                    state.done = true;
                    if let Some(payload) = state.decoder.finish() {
                        enqueue(&mut state.pending, &payload);
                    }
                }
            }
        }
    })
    .boxed()
}

fn enqueue(pending: &mut VecDeque<Result<ResponseChunk, GenerationError>>, payload: &str) {
    let payload = payload.trim();
    if payload.is_empty() || payload == "[DONE]" {
        return;
    }
    debug!("Received event payload of {} bytes", payload.len());
    pending.push_back(parse_chunk(payload));
}
