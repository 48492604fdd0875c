//! Server-Sent Events (SSE) parsing for streaming responses.
//!
//! The Generative Language API streams replies as SSE when called with
//! `alt=sse`. Framing is line-based: `event:`/`data:` fields accumulate
//! until a blank line terminates the event.

use futures_util::StreamExt;
use tokio::io::AsyncBufReadExt;
use tokio_util::io::StreamReader;

use crate::ProviderError;

/// A single event parsed from the stream.
#[derive(Debug, Clone)]
pub struct SseEvent {
    /// The event type, if the server sent one.
    pub event: Option<String>,
    /// The event payload (for this API, a JSON document).
    pub data: String,
}

/// Accumulates lines into events. Unknown fields (`id:`, `retry:`,
/// comments) are ignored per the SSE spec.
#[derive(Default)]
struct EventFramer {
    event: Option<String>,
    data: String,
}

impl EventFramer {
    /// Feed one line; returns a completed event on a blank line.
    fn feed(&mut self, line: &str) -> Option<SseEvent> {
        if line.is_empty() {
            return self.flush();
        }

        if let Some(event_type) = line.strip_prefix("event: ") {
            self.event = Some(event_type.to_string());
        } else if let Some(data) = line.strip_prefix("data: ") {
            if !self.data.is_empty() {
                self.data.push('\n');
            }
            self.data.push_str(data);
        }
        None
    }

    /// Emit whatever has accumulated, if anything.
    fn flush(&mut self) -> Option<SseEvent> {
        if self.data.is_empty() {
            self.event = None;
            return None;
        }
        Some(SseEvent {
            event: self.event.take(),
            data: std::mem::take(&mut self.data),
        })
    }
}

/// Read an SSE stream from a reqwest response, calling `on_event` for each
/// completed event in arrival order.
pub async fn read_sse_events(
    response: reqwest::Response,
    mut on_event: impl FnMut(SseEvent),
) -> Result<(), ProviderError> {
    let byte_stream = response
        .bytes_stream()
        .map(|result| result.map_err(std::io::Error::other));
    let reader = tokio::io::BufReader::new(StreamReader::new(byte_stream));
    let mut lines = reader.lines();

    let mut framer = EventFramer::default();
    while let Some(line) = lines
        .next_line()
        .await
        .map_err(|e| ProviderError::Network(e.to_string()))?
    {
        if let Some(event) = framer.feed(&line) {
            on_event(event);
        }
    }

    // The final event may not be followed by a blank line.
    if let Some(event) = framer.flush() {
        on_event(event);
    }

    Ok(())
}
