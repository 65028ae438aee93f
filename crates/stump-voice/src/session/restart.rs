//! The compaction protocol: capture a rolling summary, rebuild the
//! transport, and rehydrate the remote context from the local window.

use tracing::{info, warn};

use stump_common::SessionState;

use super::actor::SessionActor;
use crate::protocol::{ClientEvent, ConversationItem, ResponsePayload, ServerEvent};
use crate::VoiceError;

/// Hidden instruction asking the model to submit a summary through the
/// internal tool. Sent as a response request, never shown to the user.
const SUMMARY_INSTRUCTIONS: &str = "Call the record_conversation_summary tool with a one or two \
     sentence summary of the conversation so far. Do not reply with audio or text.";

impl SessionActor {
    /// Execute the restart protocol once. Re-entry is a no-op; the session
    /// only reports `Active` again after the new transport is open and
    /// rehydrated. A failure leaves the session `Stopped`, never half
    /// restarted.
    pub(crate) async fn run_restart(&mut self) -> Result<(), VoiceError> {
        if self.restarting {
            return Ok(());
        }
        self.restarting = true;
        let result = self.restart_inner().await;
        self.restarting = false;
        result
    }

    async fn restart_inner(&mut self) -> Result<(), VoiceError> {
        info!(turns = self.window.count(), "turn window full, restarting transport");
        self.set_state(SessionState::Restarting);

        let summary = self.capture_summary().await;

        // Teardown, then a fresh transport.
        self.transport.stop().await;
        let mut next = self.factory.create();
        let events = match next.start().await {
            Ok(events) => events,
            Err(e) => {
                next.stop().await;
                self.set_state(SessionState::Stopped);
                return Err(e);
            }
        };
        if let Err(e) = next.wait_open(self.options.channel_open).await {
            next.stop().await;
            self.set_state(SessionState::Stopped);
            return Err(e);
        }
        self.transport = next;
        self.events = events;

        if let Err(e) = self.rehydrate(summary.as_deref()).await {
            self.transport.stop().await;
            self.set_state(SessionState::Stopped);
            return Err(e);
        }

        self.set_state(SessionState::Active);
        Ok(())
    }

    /// Ask the model for a rolling summary and wait, bounded, for the
    /// version to advance. Inbound events keep flowing while we wait so
    /// the internal tool call can land. Timing out is a degraded path,
    /// not an error.
    async fn capture_summary(&mut self) -> Option<String> {
        if !self.transport.is_open() {
            return None;
        }

        let mut rx = self.summary.subscribe();
        let recorded = rx.borrow().version;

        let request = ClientEvent::ResponseCreate {
            response: Some(ResponsePayload {
                instructions: Some(SUMMARY_INSTRUCTIONS.to_string()),
            }),
        };
        if let Err(e) = self.transport.send(request).await {
            warn!(error = %e, "could not request summary, restarting without one");
            return None;
        }

        let deadline = tokio::time::sleep(self.options.summary_wait);
        tokio::pin!(deadline);
        loop {
            tokio::select! {
                _ = &mut deadline => {
                    warn!(
                        wait_ms = self.options.summary_wait.as_millis() as u64,
                        "summary capture timed out, restarting without one"
                    );
                    return None;
                }
                changed = rx.changed() => {
                    if changed.is_err() {
                        return None;
                    }
                    let current = rx.borrow().clone();
                    if current.version > recorded {
                        info!(version = current.version, "rolling summary captured");
                        return Some(current.text);
                    }
                }
                event = self.events.recv() => match event {
                    Some(event) => self.absorb_restart_event(event).await,
                    None => {
                        warn!("transport closed during summary capture");
                        return None;
                    }
                },
            }
        }
    }

    /// Route events that arrive mid-restart. Tool calls (including the
    /// summary submission) are answered; restart triggers are ignored
    /// since one is already running.
    async fn absorb_restart_event(&mut self, event: ServerEvent) {
        match event {
            ServerEvent::FunctionCallArgumentsDone {
                name,
                arguments,
                call_id,
            } => {
                self.answer_tool_call(&name, &arguments, call_id).await;
            }
            ServerEvent::TextDelta { delta } | ServerEvent::AudioTranscriptDelta { delta } => {
                self.note_assistant_delta(&delta);
            }
            ServerEvent::ResponseDone => {
                self.finalize_assistant_turn();
            }
            _ => {}
        }
    }

    /// Send the session declaration (summary embedded when captured) and
    /// replay the last `max_turns - 1` turns in role and chronological
    /// order, then reset the counter to what was replayed.
    async fn rehydrate(&mut self, summary: Option<&str>) -> Result<(), VoiceError> {
        self.push_session_config(summary).await?;

        let replay = self
            .store
            .window(self.options.max_turns.saturating_sub(1) as usize);
        for turn in &replay {
            self.transport
                .send(ClientEvent::ConversationItemCreate {
                    item: ConversationItem::message(turn.role, turn.text.clone()),
                })
                .await?;
        }
        info!(replayed = replay.len(), "context rehydrated");

        self.window.reset_to(replay.len() as u32);
        Ok(())
    }
}
