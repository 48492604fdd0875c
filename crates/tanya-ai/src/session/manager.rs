//! Session struct and state transitions.

use tracing::{debug, warn};

use tanya_common::{Attachment, EventBus, Message, Phase, SessionEvent};

use crate::{Prompt, Turn};

use super::types::{HistoryMode, Outbound, RequestId};

const DEFAULT_EVENT_CAPACITY: usize = 64;

/// A conversation session: transcript, pending-input draft, and the
/// in-flight stream buffer.
///
/// There is exactly one mutator at a time; concurrency is handled by
/// stale-request fencing, not locks. Every `Outbound` carries a
/// `RequestId`, and chunk/complete/fail calls bearing a superseded id
/// are discarded.
pub struct Session {
    transcript: Vec<Message>,
    draft_text: String,
    draft_attachments: Vec<Attachment>,
    stream_buf: String,
    phase: Phase,
    current: RequestId,
    history_mode: HistoryMode,
    events: EventBus,
}

impl Session {
    pub fn new() -> Self {
        Self {
            transcript: Vec::new(),
            draft_text: String::new(),
            draft_attachments: Vec::new(),
            stream_buf: String::new(),
            phase: Phase::Idle,
            current: RequestId(0),
            history_mode: HistoryMode::default(),
            events: EventBus::new(DEFAULT_EVENT_CAPACITY),
        }
    }

    pub fn with_history_mode(mut self, mode: HistoryMode) -> Self {
        self.history_mode = mode;
        self
    }

    /// Subscribe to transition events. Any rendering layer can listen;
    /// the session never depends on one.
    pub fn subscribe(&self) -> tokio::sync::broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    /// Commit a send. Valid only in `Idle` with non-empty trimmed text;
    /// otherwise nothing changes and `None` is returned.
    ///
    /// On success the user message is in the transcript, the draft is
    /// cleared, the phase is `Sending`, and the returned `Outbound` holds
    /// the fencing token plus the provider payload.
    pub fn submit(
        &mut self,
        text: impl AsRef<str>,
        attachments: Vec<Attachment>,
    ) -> Option<Outbound> {
        let trimmed = text.as_ref().trim();
        if trimmed.is_empty() {
            debug!("ignoring empty submit");
            return None;
        }
        if self.phase != Phase::Idle {
            debug!(phase = ?self.phase, "submit rejected while a request is in flight");
            return None;
        }

        let history = self.history_snapshot();
        let prompt = Prompt {
            text: trimmed.to_string(),
            attachments: attachments.clone(),
        };

        self.push_message(Message::user(trimmed, attachments));
        self.clear_draft();
        self.set_phase(Phase::Sending);
        self.current = RequestId(self.current.0 + 1);

        Some(Outbound {
            id: self.current,
            history,
            prompt,
        })
    }

    /// Commit the pending-input draft as a send.
    pub fn submit_draft(&mut self) -> Option<Outbound> {
        if !self.can_submit() {
            return None;
        }
        let text = std::mem::take(&mut self.draft_text);
        let attachments = std::mem::take(&mut self.draft_attachments);
        self.submit(text, attachments)
    }

    /// Apply a streamed chunk, in arrival order. Returns false when the
    /// chunk belongs to a superseded request and was discarded.
    pub fn apply_chunk(&mut self, id: RequestId, text: &str) -> bool {
        if !self.is_current(id) {
            warn!(%id, "discarding stale chunk");
            return false;
        }
        self.stream_buf.push_str(text);
        self.set_phase(Phase::Streaming);
        self.events.publish(SessionEvent::StreamDelta {
            text: text.to_string(),
        });
        true
    }

    /// Finish the in-flight request with the provider's final resolved
    /// text. The stream buffer is discarded; `final_text` may legitimately
    /// differ from the chunk concatenation.
    pub fn complete(&mut self, id: RequestId, final_text: impl Into<String>) -> bool {
        if !self.is_current(id) {
            warn!(%id, "discarding stale completion");
            return false;
        }
        self.stream_buf.clear();
        self.push_message(Message::assistant(final_text));
        self.set_phase(Phase::Idle);
        true
    }

    /// Fail the in-flight request. Appends exactly one error message and
    /// drops any partial stream-buffer content; nothing is retried.
    pub fn fail(&mut self, id: RequestId, error: impl std::fmt::Display) -> bool {
        if !self.is_current(id) {
            warn!(%id, "discarding stale error");
            return false;
        }
        self.stream_buf.clear();
        self.push_message(Message::error(format!("Error: {error}")));
        self.set_phase(Phase::Idle);
        true
    }

    /// Clear everything and invalidate any in-flight request, so late
    /// callbacks land on a stale fence instead of the fresh state.
    pub fn reset(&mut self) {
        self.current = RequestId(self.current.0 + 1);
        self.transcript.clear();
        self.draft_text.clear();
        self.draft_attachments.clear();
        self.stream_buf.clear();
        self.set_phase(Phase::Idle);
        self.events.publish(SessionEvent::TranscriptCleared);
    }

    /// Add a blob to the draft. MIME types are not validated here; the
    /// blob is opaque to the session.
    pub fn attach(&mut self, blob: Attachment) {
        self.draft_attachments.push(blob);
        self.events.publish(SessionEvent::DraftChanged);
    }

    /// Remove the draft attachment at `index`; no-op past end-of-sequence.
    pub fn detach(&mut self, index: usize) {
        if index < self.draft_attachments.len() {
            self.draft_attachments.remove(index);
            self.events.publish(SessionEvent::DraftChanged);
        }
    }

    pub fn set_draft_text(&mut self, text: impl Into<String>) {
        self.draft_text = text.into();
        self.events.publish(SessionEvent::DraftChanged);
    }

    /// Whether a submit would currently be accepted. Mirrors the send
    /// button's enabled state.
    pub fn can_submit(&self) -> bool {
        self.phase == Phase::Idle && !self.draft_text.trim().is_empty()
    }

    pub fn transcript(&self) -> &[Message] {
        &self.transcript
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// The in-flight reply accumulated so far. Empty outside a stream.
    pub fn stream_buffer(&self) -> &str {
        &self.stream_buf
    }

    pub fn draft_text(&self) -> &str {
        &self.draft_text
    }

    pub fn draft_attachments(&self) -> &[Attachment] {
        &self.draft_attachments
    }

    pub fn message_count(&self) -> usize {
        self.transcript.len()
    }

    fn is_current(&self, id: RequestId) -> bool {
        id == self.current && self.phase != Phase::Idle
    }

    fn history_snapshot(&self) -> Vec<Turn> {
        match self.history_mode {
            HistoryMode::Full => self
                .transcript
                .iter()
                .map(|m| Turn {
                    role: m.role,
                    content: m.content.clone(),
                })
                .collect(),
            HistoryMode::LatestOnly => Vec::new(),
        }
    }

    fn push_message(&mut self, message: Message) {
        self.transcript.push(message);
        self.events.publish(SessionEvent::MessageAppended {
            index: self.transcript.len() - 1,
        });
    }

    fn clear_draft(&mut self) {
        if !self.draft_text.is_empty() || !self.draft_attachments.is_empty() {
            self.draft_text.clear();
            self.draft_attachments.clear();
            self.events.publish(SessionEvent::DraftChanged);
        }
    }

    fn set_phase(&mut self, phase: Phase) {
        if self.phase != phase {
            self.phase = phase;
            self.events.publish(SessionEvent::PhaseChanged(phase));
        }
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}
