//! Turn-window and restart tuning.

use serde::{Deserialize, Serialize};

/// Bounds on the remote context window and the restart protocol waits.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionTuning {
    /// Remote turn budget before the session is compacted via restart.
    /// Counts user sends and assistant replies individually.
    pub max_turns: u32,
    /// How long to wait for the model to submit a rolling summary before
    /// restarting without one (milliseconds).
    pub summary_wait_ms: u64,
    /// How long to wait for the data channel to open (milliseconds).
    pub channel_open_ms: u64,
}

impl Default for SessionTuning {
    fn default() -> Self {
        Self {
            max_turns: 16,
            summary_wait_ms: 1800,
            channel_open_ms: 4000,
        }
    }
}

impl SessionTuning {
    /// Number of turns replayed onto a fresh transport after restart.
    pub fn replay_turns(&self) -> u32 {
        self.max_turns.saturating_sub(1)
    }
}
