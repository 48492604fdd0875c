//! Transition events published by the conversation session.
//!
//! The session announces every observable state change here so a rendering
//! layer can subscribe without the core depending on a UI runtime.

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use crate::types::Phase;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum SessionEvent {
    /// A message was appended to the transcript at `index`.
    MessageAppended { index: usize },
    /// A streamed chunk was applied to the in-flight reply.
    StreamDelta { text: String },
    PhaseChanged(Phase),
    /// The pending-input text or attachment list changed.
    DraftChanged,
    TranscriptCleared,
}

pub struct EventBus {
    sender: broadcast::Sender<SessionEvent>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.sender.subscribe()
    }

    /// Publish an event, returning the number of subscribers that saw it.
    /// Zero subscribers is not an error.
    pub fn publish(&self, event: SessionEvent) -> usize {
        self.sender.send(event).unwrap_or(0)
    }
}
