//! Session types and the stale-request fence.

use crate::{Prompt, Turn};

/// Fencing token tied to one generation request.
///
/// `submit` mints a new token and `reset` invalidates the current one, so
/// chunk/complete/fail callbacks that resume after a reset carry a stale
/// token and are discarded instead of mutating the new state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RequestId(pub(super) u64);

impl RequestId {
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "req-{}", self.0)
    }
}

/// What `submit` hands back: everything needed to issue the provider call.
#[derive(Debug, Clone)]
pub struct Outbound {
    pub id: RequestId,
    pub history: Vec<Turn>,
    pub prompt: Prompt,
}

/// How much prior transcript accompanies each request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HistoryMode {
    /// Send the full prior transcript with every request.
    #[default]
    Full,
    /// Send only the new prompt.
    LatestOnly,
}

/// Result of one full send round.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendOutcome {
    /// The submit was invalid (empty text or a request already in flight);
    /// nothing was sent and nothing changed.
    Rejected,
    /// The provider resolved a final text, now in the transcript.
    Completed,
    /// The provider failed; an error message is in the transcript.
    Failed,
}
