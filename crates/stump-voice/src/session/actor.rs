//! Session actor construction and event routing.

use std::sync::Arc;
use std::time::Duration;

use futures_util::FutureExt;
use serde_json::{json, Value};
use tokio::sync::{mpsc, watch};
use tracing::{debug, error, warn};

use stump_common::{CallId, Event, EventBus, Role, SessionState};

use super::handle::{Command, SessionHandle};
use crate::conversation::ConversationStore;
use crate::dispatcher::{ToolDefinition, ToolDispatcher};
use crate::protocol::{
    ClientEvent, ConversationItem, ServerEvent, SessionPayload, TranscriptionPayload,
};
use crate::summary::SummaryCell;
use crate::transport::{Transport, TransportFactory};
use crate::turn_window::TurnWindow;
use crate::VoiceError;

/// Dedicated, internal-only tool the model uses to submit rolling
/// summaries. Never listed in the public catalog.
pub(crate) const SUMMARY_TOOL: &str = "record_conversation_summary";

/// Tunables and session-level declarations for the remote endpoint.
#[derive(Debug, Clone)]
pub struct SessionOptions {
    /// Remote turn budget; user sends and assistant replies each count one.
    pub max_turns: u32,
    /// Bounded wait for the rolling summary during restart.
    pub summary_wait: Duration,
    /// Bounded wait for the data channel to open.
    pub channel_open: Duration,
    pub voice: String,
    pub transcription_model: String,
    /// Base instructions sent with every `session.update`.
    pub instructions: Option<String>,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            max_turns: 16,
            summary_wait: Duration::from_millis(1800),
            channel_open: Duration::from_millis(4000),
            voice: "verse".into(),
            transcription_model: "whisper-1".into(),
            instructions: None,
        }
    }
}

/// Entry point for running a voice session.
pub struct VoiceSession;

impl VoiceSession {
    /// Build the first transport, negotiate it, declare the session to the
    /// remote endpoint, and spawn the actor.
    ///
    /// Acquisition and negotiation failures surface here; the session
    /// never reaches `Active` and every resource is released.
    pub async fn start(
        options: SessionOptions,
        factory: Box<dyn TransportFactory>,
        bus: Arc<EventBus>,
    ) -> Result<SessionHandle, VoiceError> {
        let (command_tx, command_rx) = mpsc::channel(64);
        let (state_tx, state_rx) = watch::channel(SessionState::Idle);

        let mut transport = factory.create();
        state_tx.send_replace(SessionState::Connecting);
        bus.publish(Event::StateChanged(SessionState::Connecting));

        let events = match transport.start().await {
            Ok(events) => events,
            Err(e) => {
                transport.stop().await;
                state_tx.send_replace(SessionState::Idle);
                return Err(e);
            }
        };
        if let Err(e) = transport.wait_open(options.channel_open).await {
            transport.stop().await;
            state_tx.send_replace(SessionState::Idle);
            return Err(e);
        }

        let summary = SummaryCell::new();
        let mut dispatcher = ToolDispatcher::new();
        register_summary_tool(&mut dispatcher, summary.clone());

        let store = ConversationStore::new(options.max_turns as usize);
        let window = TurnWindow::new(options.max_turns);
        let mut actor = SessionActor {
            options,
            factory,
            transport,
            events,
            commands: command_rx,
            store,
            window,
            dispatcher,
            summary,
            bus,
            state: state_tx,
            restarting: false,
        };

        if let Err(e) = actor.push_session_config(None).await {
            actor.transport.stop().await;
            actor.state.send_replace(SessionState::Idle);
            return Err(e);
        }
        actor.set_state(SessionState::Active);

        tokio::spawn(actor.run());

        Ok(SessionHandle {
            commands: command_tx,
            state: state_rx,
        })
    }
}

fn register_summary_tool(dispatcher: &mut ToolDispatcher, cell: SummaryCell) {
    let definition = ToolDefinition {
        name: SUMMARY_TOOL.to_string(),
        description: "Record a one or two sentence summary of the recent conversation.".into(),
        parameters: json!({
            "type": "object",
            "properties": {
                "summary": {
                    "type": "string",
                    "description": "A 1-2 sentence summary of the dialogue so far"
                }
            },
            "required": ["summary"]
        }),
    };
    dispatcher.register_internal(
        definition,
        Box::new(move |args: Value| {
            let cell = cell.clone();
            async move {
                let text = args
                    .get("summary")
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .trim()
                    .to_string();
                if text.is_empty() {
                    return Err("summary text missing".to_string());
                }
                cell.record(text);
                Ok(json!({ "recorded": true }))
            }
            .boxed()
        }),
    );
}

pub(crate) struct SessionActor {
    pub(crate) options: SessionOptions,
    pub(crate) factory: Box<dyn TransportFactory>,
    pub(crate) transport: Box<dyn Transport>,
    pub(crate) events: mpsc::Receiver<ServerEvent>,
    pub(crate) commands: mpsc::Receiver<Command>,
    pub(crate) store: ConversationStore,
    pub(crate) window: TurnWindow,
    pub(crate) dispatcher: ToolDispatcher,
    pub(crate) summary: SummaryCell,
    pub(crate) bus: Arc<EventBus>,
    pub(crate) state: watch::Sender<SessionState>,
    pub(crate) restarting: bool,
}

impl SessionActor {
    /// The single logical event queue: commands from handles, protocol
    /// events from the transport. Nothing re-enters concurrently.
    pub(crate) async fn run(mut self) {
        loop {
            tokio::select! {
                command = self.commands.recv() => match command {
                    Some(command) => {
                        if !self.handle_command(command).await {
                            break;
                        }
                    }
                    None => {
                        // Every handle dropped
                        self.shutdown().await;
                        break;
                    }
                },
                event = self.events.recv() => match event {
                    Some(event) => {
                        if !self.handle_event(event).await {
                            break;
                        }
                    }
                    None => {
                        warn!("transport event stream ended");
                        self.bus
                            .publish(Event::Notification("voice transport lost".into()));
                        self.shutdown().await;
                        break;
                    }
                },
            }
        }
    }

    async fn handle_command(&mut self, command: Command) -> bool {
        match command {
            Command::SendText { text, reply } => {
                // A send that would exceed the window restarts first,
                // synchronously.
                if self.window.should_restart() {
                    if let Err(e) = self.run_restart().await {
                        error!(error = %e, "restart failed, stopping session");
                        let _ = reply.send(Err(e));
                        self.shutdown().await;
                        return false;
                    }
                }
                let result = self.send_user_text(text).await;
                let _ = reply.send(result);
                true
            }
            Command::RegisterTool {
                definition,
                handler,
            } => {
                self.dispatcher.register(definition, handler);
                // Push the updated catalog so the remote endpoint sees the
                // swap immediately.
                if self.transport.is_open() {
                    if let Err(e) = self.push_session_config(None).await {
                        warn!(error = %e, "failed to push updated tool catalog");
                    }
                }
                true
            }
            Command::Window { n, reply } => {
                let _ = reply.send(self.store.window(n));
                true
            }
            Command::Restart { reply } => {
                if self.restarting {
                    let _ = reply.send(Ok(()));
                    return true;
                }
                match self.run_restart().await {
                    Ok(()) => {
                        let _ = reply.send(Ok(()));
                        true
                    }
                    Err(e) => {
                        error!(error = %e, "restart failed, stopping session");
                        let _ = reply.send(Err(e));
                        self.shutdown().await;
                        false
                    }
                }
            }
            Command::Stop { reply } => {
                self.shutdown().await;
                let _ = reply.send(());
                false
            }
        }
    }

    async fn handle_event(&mut self, event: ServerEvent) -> bool {
        match event {
            ServerEvent::TextDelta { delta } | ServerEvent::AudioTranscriptDelta { delta } => {
                self.note_assistant_delta(&delta);
                true
            }
            ServerEvent::ResponseDone => {
                self.finalize_assistant_turn();
                true
            }
            ServerEvent::OutputAudioStopped => {
                // The deferred-restart trigger: the window filled while the
                // assistant was speaking, and playback just finished.
                if self.window.should_restart() && !self.restarting {
                    if let Err(e) = self.run_restart().await {
                        error!(error = %e, "deferred restart failed, stopping session");
                        self.bus
                            .publish(Event::Notification(format!("voice session error: {e}")));
                        self.shutdown().await;
                        return false;
                    }
                }
                true
            }
            ServerEvent::FunctionCallArgumentsDone {
                name,
                arguments,
                call_id,
            } => {
                self.answer_tool_call(&name, &arguments, call_id).await;
                true
            }
            ServerEvent::Error { error } => {
                warn!(error = %error, "remote endpoint reported an error");
                true
            }
            ServerEvent::SessionCreated => {
                debug!("remote session created");
                true
            }
            ServerEvent::Unknown => true,
        }
    }

    pub(crate) fn note_assistant_delta(&mut self, delta: &str) {
        if self.store.append_assistant_delta(delta) {
            // First delta of a new assistant message counts a turn.
            self.window.note_assistant_turn();
        }
        self.bus.publish(Event::AssistantDelta(delta.to_string()));
    }

    pub(crate) fn finalize_assistant_turn(&mut self) {
        if let Some(turn) = self.store.finalize_last_turn() {
            self.bus.publish(Event::TurnFinalized {
                role: turn.role,
                text: turn.text,
            });
        }
    }

    async fn send_user_text(&mut self, text: String) -> Result<(), VoiceError> {
        self.transport.wait_open(self.options.channel_open).await?;
        self.store.append_user_turn(text.clone());
        self.window.note_user_turn();
        self.transport
            .send(ClientEvent::ConversationItemCreate {
                item: ConversationItem::message(Role::User, text.clone()),
            })
            .await?;
        self.transport
            .send(ClientEvent::ResponseCreate { response: None })
            .await?;
        self.bus.publish(Event::TurnFinalized {
            role: Role::User,
            text,
        });
        Ok(())
    }

    /// Answer one tool call: exactly one result, then a continuation
    /// request, in that order. Dispatch failures become error payloads,
    /// never unanswered calls.
    pub(crate) async fn answer_tool_call(&mut self, name: &str, arguments: &str, call_id: String) {
        let result = self
            .dispatcher
            .dispatch_raw(name, arguments, CallId::from(call_id))
            .await;
        let output = result.output();
        if let Err(e) = self
            .transport
            .send(ClientEvent::ConversationItemCreate {
                item: ConversationItem::FunctionCallOutput {
                    call_id: result.call_id.as_str().to_string(),
                    output,
                },
            })
            .await
        {
            warn!(tool = %name, error = %e, "failed to send tool result");
            return;
        }
        if let Err(e) = self
            .transport
            .send(ClientEvent::ResponseCreate { response: None })
            .await
        {
            warn!(tool = %name, error = %e, "failed to request continuation");
        }
    }

    /// Declare modalities, transcription, the public tool catalog, and
    /// instructions (with the rolling summary embedded when present).
    pub(crate) async fn push_session_config(
        &mut self,
        summary: Option<&str>,
    ) -> Result<(), VoiceError> {
        let instructions = match (self.options.instructions.as_deref(), summary) {
            (Some(base), Some(s)) => Some(format!(
                "{base}\n\nSummary of the conversation so far: {s}"
            )),
            (None, Some(s)) => Some(format!("Summary of the conversation so far: {s}")),
            (Some(base), None) => Some(base.to_string()),
            (None, None) => None,
        };
        self.transport
            .send(ClientEvent::SessionUpdate {
                session: SessionPayload {
                    modalities: vec!["audio".into(), "text".into()],
                    instructions,
                    voice: self.options.voice.clone(),
                    input_audio_transcription: TranscriptionPayload {
                        model: self.options.transcription_model.clone(),
                    },
                    tools: self.dispatcher.catalog(),
                },
            })
            .await
    }

    pub(crate) fn set_state(&mut self, state: SessionState) {
        self.state.send_replace(state);
        self.bus.publish(Event::StateChanged(state));
    }

    pub(crate) async fn shutdown(&mut self) {
        self.transport.stop().await;
        self.set_state(SessionState::Stopped);
        self.bus.publish(Event::Shutdown);
    }
}
