//! Streaming SSE decoder (Bytes -> StreamFrame)
//!
//! Frames are split on blank lines, `data:` fields are joined, comment lines are
//! skipped and `[DONE]` ends the stream.

use crate::error::TransportError;
use crate::types::{ChatCompletionChunk, StreamFrame, DONE_SENTINEL};
use crate::{BoxStream, Error};
use bytes::Bytes;
use futures::{stream, StreamExt};
use serde_json::Value;
use tracing::{debug, warn};

/// Joined `data:` payload of one SSE event, or `None` when the event has no data field.
///
/// Both `data: value` and `data:value` forms are accepted; an empty `data:` field yields
/// an empty string.
pub fn event_data(frame: &str) -> Option<String> {
    let mut data: Option<String> = None;
    for line in frame.lines() {
        let trimmed = line.trim();
        if trimmed.starts_with(':') {
            continue;
        }
        if let Some(part) = trimmed.strip_prefix("data:") {
            let part = part.strip_prefix(' ').unwrap_or(part);
            match data.as_mut() {
                Some(existing) => {
                    existing.push('\n');
                    existing.push_str(part);
                }
                None => data = Some(part.to_string()),
            }
        }
    }
    data
}

/// Interpret one event payload as a stream frame.
///
/// Returns `Ok(None)` for payloads that are not chunk JSON (skipped, as upstreams
/// interleave keep-alives), and `Err` for an in-band `{"error": ...}` object.
pub fn frame_from_data(data: &str) -> Result<Option<StreamFrame>, TransportError> {
    let trimmed = data.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    if trimmed == DONE_SENTINEL {
        return Ok(Some(StreamFrame::Done));
    }
    let value: Value = match serde_json::from_str(trimmed) {
        Ok(v) => v,
        Err(e) => {
            warn!(error = %e, "skipping non-JSON SSE event");
            return Ok(None);
        }
    };
    if let Some(err) = value.get("error").filter(|e| !e.is_null()) {
        let message = err
            .get("message")
            .and_then(|m| m.as_str())
            .map(String::from)
            .unwrap_or_else(|| err.to_string());
        return Err(TransportError::Stream(message));
    }
    match serde_json::from_value::<ChatCompletionChunk>(value) {
        Ok(chunk) => Ok(Some(StreamFrame::Chunk(chunk))),
        Err(e) => Err(TransportError::Decode(e.to_string())),
    }
}

/// Incremental decoder for OpenAI-style chat completion streams.
#[derive(Debug, Clone, Default)]
pub struct SseDecoder;

impl SseDecoder {
    pub fn new() -> Self {
        Self
    }

    /// Decode a byte stream into frames. The output ends right after `[DONE]`, or when
    /// the input ends (in which case no `Done` frame is emitted).
    pub fn decode_stream(
        &self,
        input: BoxStream<'static, Bytes>,
    ) -> BoxStream<'static, StreamFrame> {
        // state: (input, pending bytes, finished)
        let stream = stream::unfold(
            (input, Vec::<u8>::new(), false),
            |(mut input, mut buf, finished)| async move {
                if finished {
                    return None;
                }
                loop {
                    if let Some(idx) = find_delimiter(&buf) {
                        let frame_bytes: Vec<u8> = buf.drain(..idx + 2).collect();
                        let frame = String::from_utf8_lossy(&frame_bytes[..idx]).into_owned();
                        let Some(data) = event_data(&frame) else {
                            continue;
                        };
                        match frame_from_data(&data) {
                            Ok(Some(StreamFrame::Done)) => {
                                debug!("sse stream reached terminal sentinel");
                                return Some((Ok(StreamFrame::Done), (input, buf, true)));
                            }
                            Ok(Some(frame)) => return Some((Ok(frame), (input, buf, false))),
                            Ok(None) => continue,
                            Err(e) => {
                                return Some((Err(Error::Transport(e)), (input, buf, true)))
                            }
                        }
                    }

                    match input.next().await {
                        Some(Ok(bytes)) => {
                            buf.extend(bytes.iter().copied().filter(|b| *b != b'\r'));
                        }
                        Some(Err(e)) => return Some((Err(e), (input, buf, true))),
                        None => {
                            // EOF: try the trailing event once
                            let rest = String::from_utf8_lossy(&buf).into_owned();
                            buf.clear();
                            let frame = event_data(&rest).map(|d| frame_from_data(&d));
                            return match frame {
                                Some(Ok(Some(frame))) => Some((Ok(frame), (input, buf, true))),
                                Some(Err(e)) => {
                                    Some((Err(Error::Transport(e)), (input, buf, true)))
                                }
                                _ => None,
                            };
                        }
                    }
                }
            },
        );
        Box::pin(stream)
    }
}

fn find_delimiter(buf: &[u8]) -> Option<usize> {
    buf.windows(2).position(|w| w == b"\n\n")
}
