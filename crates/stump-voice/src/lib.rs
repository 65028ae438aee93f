//! Realtime voice-session engine for Stump.
//!
//! Manages a bidirectional audio+data link to a realtime conversational
//! endpoint with:
//! - Streaming conversation history bounded to a turn window
//! - Transparent transport restarts once the window fills, with a
//!   model-generated rolling summary preserving continuity
//! - Dispatch of remote tool-call requests to locally registered handlers
//! - A session actor owning all mutable state, driven by one event queue

pub mod conversation;
pub mod dispatcher;
pub mod protocol;
pub mod session;
pub mod summary;
pub mod transport;
pub mod turn_window;

pub use conversation::{ConversationStore, Turn};
pub use dispatcher::{ToolCall, ToolDefinition, ToolDispatcher, ToolHandler, ToolResult};
pub use session::{SessionHandle, SessionOptions, VoiceSession};
pub use summary::{RollingSummary, SummaryCell};
pub use transport::{Transport, TransportFactory};
pub use turn_window::TurnWindow;

use std::time::Duration;

#[derive(Debug, thiserror::Error)]
pub enum VoiceError {
    /// Capture device denied or unavailable. The session never reaches
    /// `Active`.
    #[error("audio capture unavailable: {0}")]
    Acquisition(String),

    /// Credential or connection handshake failed. The transport is torn
    /// down.
    #[error("negotiation failed: {0}")]
    Negotiation(String),

    /// The data channel did not open in time. Fatal for the in-flight
    /// send or restart.
    #[error("data channel did not open within {0:?}")]
    ChannelTimeout(Duration),

    #[error("transport error: {0}")]
    Transport(String),

    /// The session actor is gone (stopped or crashed).
    #[error("session stopped")]
    Stopped,
}
