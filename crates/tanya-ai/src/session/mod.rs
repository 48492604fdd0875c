//! Conversation session management.
//!
//! A `Session` holds the transcript, the pending-input draft, and the
//! in-flight stream buffer, and drives the Idle → Sending → Streaming
//! lifecycle. Late callbacks from a superseded request are fenced out by
//! a generation counter rather than a lock.

mod chat;
mod manager;
mod types;

pub use manager::Session;
pub use types::{HistoryMode, Outbound, RequestId, SendOutcome};
