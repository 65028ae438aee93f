//! Cloneable handle exposing session intents and observations.

use tokio::sync::{mpsc, oneshot, watch};

use stump_common::SessionState;

use crate::conversation::Turn;
use crate::dispatcher::{ToolDefinition, ToolHandler};
use crate::VoiceError;

pub(crate) enum Command {
    SendText {
        text: String,
        reply: oneshot::Sender<Result<(), VoiceError>>,
    },
    RegisterTool {
        definition: ToolDefinition,
        handler: ToolHandler,
    },
    Window {
        n: usize,
        reply: oneshot::Sender<Vec<Turn>>,
    },
    Restart {
        reply: oneshot::Sender<Result<(), VoiceError>>,
    },
    Stop {
        reply: oneshot::Sender<()>,
    },
}

/// Handle to a running [`VoiceSession`](super::VoiceSession).
///
/// All methods go through the actor's command queue, so callers never
/// race the protocol. Dropping every handle stops the session.
#[derive(Clone)]
pub struct SessionHandle {
    pub(crate) commands: mpsc::Sender<Command>,
    pub(crate) state: watch::Receiver<SessionState>,
}

impl SessionHandle {
    /// Send a user text message, restarting first if the turn window is
    /// full. Resolves once the message is on the wire.
    pub async fn send_text(&self, text: impl Into<String>) -> Result<(), VoiceError> {
        let (reply, rx) = oneshot::channel();
        self.commands
            .send(Command::SendText {
                text: text.into(),
                reply,
            })
            .await
            .map_err(|_| VoiceError::Stopped)?;
        rx.await.map_err(|_| VoiceError::Stopped)?
    }

    /// Register (or hot-swap) a tool handler by name.
    pub async fn register_tool(
        &self,
        definition: ToolDefinition,
        handler: ToolHandler,
    ) -> Result<(), VoiceError> {
        self.commands
            .send(Command::RegisterTool {
                definition,
                handler,
            })
            .await
            .map_err(|_| VoiceError::Stopped)
    }

    /// Snapshot of the last `n` turns in chronological order.
    pub async fn window(&self, n: usize) -> Result<Vec<Turn>, VoiceError> {
        let (reply, rx) = oneshot::channel();
        self.commands
            .send(Command::Window { n, reply })
            .await
            .map_err(|_| VoiceError::Stopped)?;
        rx.await.map_err(|_| VoiceError::Stopped)
    }

    /// Request an explicit context compaction.
    pub async fn restart(&self) -> Result<(), VoiceError> {
        let (reply, rx) = oneshot::channel();
        self.commands
            .send(Command::Restart { reply })
            .await
            .map_err(|_| VoiceError::Stopped)?;
        rx.await.map_err(|_| VoiceError::Stopped)?
    }

    /// Stop the session and release every resource. Safe to call from any
    /// state, any number of times.
    pub async fn stop(&self) {
        let (reply, rx) = oneshot::channel();
        if self
            .commands
            .send(Command::Stop { reply })
            .await
            .is_err()
        {
            // Actor already gone; nothing left to release.
            return;
        }
        let _ = rx.await;
    }

    pub fn state(&self) -> SessionState {
        *self.state.borrow()
    }

    /// Watch receiver for state transitions.
    pub fn state_changes(&self) -> watch::Receiver<SessionState> {
        self.state.clone()
    }
}
