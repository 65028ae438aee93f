//! Remote turn budget tracking.
//!
//! Mirrors the remote side's turn count, which is distinct from the local
//! display history: local history is cosmetic and may be re-sliced, while
//! this counter decides when the remote context must be compacted.

/// Counts turns against the configured maximum and raises the restart
/// signal.
///
/// Every user send and every first delta of a new assistant message costs
/// one count, so a user/assistant round costs two. The counter saturates
/// at `max_turns`.
#[derive(Debug)]
pub struct TurnWindow {
    max_turns: u32,
    count: u32,
    should_restart: bool,
}

impl TurnWindow {
    pub fn new(max_turns: u32) -> Self {
        Self {
            max_turns,
            count: 0,
            should_restart: false,
        }
    }

    /// Account for a user message about to be sent.
    pub fn note_user_turn(&mut self) {
        self.bump();
    }

    /// Account for the first delta of a new assistant message.
    pub fn note_assistant_turn(&mut self) {
        self.bump();
    }

    /// Whether the window is full and a restart is pending.
    ///
    /// The caller decides the moment: synchronously before the next user
    /// send, or deferred to the end of assistant audio playback.
    pub fn should_restart(&self) -> bool {
        self.should_restart
    }

    /// Reset after a successful restart to the number of turns replayed.
    pub fn reset_to(&mut self, replayed: u32) {
        self.count = replayed.min(self.max_turns);
        self.should_restart = false;
    }

    pub fn count(&self) -> u32 {
        self.count
    }

    fn bump(&mut self) {
        if self.count < self.max_turns {
            self.count += 1;
        }
        if self.count >= self.max_turns {
            self.should_restart = true;
        }
    }
}
