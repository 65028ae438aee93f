//! Bounded, ordered turn history with streaming accumulation.

use std::collections::VecDeque;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use stump_common::{new_id, Role};

/// One message in the dialogue history.
///
/// Created on the first token of a message; `text` grows by append while
/// `is_final` is false, then the turn is immutable.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Turn {
    pub id: String,
    pub role: Role,
    pub text: String,
    pub is_final: bool,
    pub timestamp: DateTime<Utc>,
}

impl Turn {
    fn new(role: Role, text: String, is_final: bool) -> Self {
        Self {
            id: new_id(),
            role,
            text,
            is_final,
            timestamp: Utc::now(),
        }
    }
}

/// Ordered turn history capped at `max_turns`.
///
/// Insertion beyond the cap evicts from the front, so `len() <= max_turns`
/// holds after every mutation. Owned exclusively by the session actor;
/// collaborators only see `window(n)` snapshots.
pub struct ConversationStore {
    turns: VecDeque<Turn>,
    max_turns: usize,
}

impl ConversationStore {
    pub fn new(max_turns: usize) -> Self {
        Self {
            turns: VecDeque::with_capacity(max_turns.min(64)),
            max_turns,
        }
    }

    /// Append a user turn. User text arrives whole, so the turn is final
    /// immediately.
    pub fn append_user_turn(&mut self, text: impl Into<String>) {
        self.push(Turn::new(Role::User, text.into(), true));
    }

    /// Append a streamed piece of assistant text.
    ///
    /// Continues the most recent turn when it is a non-final assistant
    /// turn; otherwise starts a new one. Returns true when a new turn was
    /// started (the first delta of a message).
    pub fn append_assistant_delta(&mut self, piece: &str) -> bool {
        if let Some(last) = self.turns.back_mut() {
            if last.role == Role::Assistant && !last.is_final {
                last.text.push_str(piece);
                return false;
            }
        }
        self.push(Turn::new(Role::Assistant, piece.to_string(), false));
        true
    }

    /// Mark the most recent turn final. No-op on an empty store.
    /// Returns the turn only when it was newly finalized, so observers
    /// are not notified twice.
    pub fn finalize_last_turn(&mut self) -> Option<Turn> {
        let last = self.turns.back_mut()?;
        if last.is_final {
            return None;
        }
        last.is_final = true;
        Some(last.clone())
    }

    /// The last `n` turns in chronological order.
    pub fn window(&self, n: usize) -> Vec<Turn> {
        let skip = self.turns.len().saturating_sub(n);
        self.turns.iter().skip(skip).cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    fn push(&mut self, turn: Turn) {
        self.turns.push_back(turn);
        while self.turns.len() > self.max_turns {
            self.turns.pop_front();
        }
    }
}
