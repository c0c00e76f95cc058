//! Splitting of fully captured SSE bodies (as stored in the traffic log).

use crate::error::SseParseError;
use crate::stream::{event_data, frame_from_data};
use crate::types::StreamFrame;
use tracing::{debug, instrument};

/// Split a raw SSE body into the `data` payload of each event.
///
/// An empty `data:` field still dispatches an (empty) event, and a trailing event that
/// is not followed by a blank line is kept. A body with no `data:` field at all is
/// rejected.
#[instrument(skip_all)]
pub fn parse_sse_data(body: &str) -> Result<Vec<String>, SseParseError> {
    let mut events = Vec::new();
    let mut current = String::new();

    for line in body.lines() {
        if line.trim().is_empty() {
            if let Some(data) = event_data(&current) {
                events.push(data);
            }
            current.clear();
        } else {
            current.push_str(line);
            current.push('\n');
        }
    }
    if let Some(data) = event_data(&current) {
        events.push(data);
    }

    if events.is_empty() {
        return Err(SseParseError::InvalidFormat);
    }
    Ok(events)
}

/// Parse a captured chat stream body into frames. Events that are not chunk JSON,
/// including in-band error objects, are dropped; the sentinel is kept as `Done`.
#[instrument(skip_all)]
pub fn parse_chat_stream(body: &str) -> Result<Vec<StreamFrame>, SseParseError> {
    let events = parse_sse_data(body)?;
    let total = events.len();
    let frames: Vec<StreamFrame> = events
        .iter()
        .filter_map(|data| frame_from_data(data).ok().flatten())
        .collect();
    debug!(events = total, frames = frames.len(), "parsed captured chat stream");
    Ok(frames)
}
