//! Wire protocol for the realtime data channel.
//!
//! JSON messages tagged by `type`, matching the realtime endpoint's event
//! names. Unknown inbound kinds decode to `Unknown` and are ignored by the
//! session router, so new server events never break the client.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use stump_common::Role;

/// Messages sent to the remote endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ClientEvent {
    /// Declare modalities, transcription model, tool catalog, and optional
    /// instructions for the current transport.
    #[serde(rename = "session.update")]
    SessionUpdate { session: SessionPayload },

    /// Inject a message or a tool result into the remote conversation.
    #[serde(rename = "conversation.item.create")]
    ConversationItemCreate { item: ConversationItem },

    /// Ask the remote endpoint to continue generating.
    #[serde(rename = "response.create")]
    ResponseCreate {
        #[serde(skip_serializing_if = "Option::is_none")]
        response: Option<ResponsePayload>,
    },

    /// Outbound microphone audio, base64 PCM16.
    #[serde(rename = "input_audio_buffer.append")]
    InputAudioBufferAppend { audio: String },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionPayload {
    pub modalities: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instructions: Option<String>,
    pub voice: String,
    pub input_audio_transcription: TranscriptionPayload,
    pub tools: Vec<Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscriptionPayload {
    pub model: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ResponsePayload {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instructions: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ConversationItem {
    #[serde(rename = "message")]
    Message {
        role: Role,
        content: Vec<ContentPart>,
    },

    /// Tool result keyed by the remote call id.
    #[serde(rename = "function_call_output")]
    FunctionCallOutput { call_id: String, output: String },
}

impl ConversationItem {
    /// Build a message item with the content kind the endpoint expects for
    /// each role (user text is `input_text`, assistant text is `text`).
    pub fn message(role: Role, text: impl Into<String>) -> Self {
        let text = text.into();
        let part = match role {
            Role::User => ContentPart::InputText { text },
            Role::Assistant => ContentPart::Text { text },
        };
        ConversationItem::Message {
            role,
            content: vec![part],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ContentPart {
    #[serde(rename = "input_text")]
    InputText { text: String },
    #[serde(rename = "text")]
    Text { text: String },
}

/// Messages received from the remote endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ServerEvent {
    #[serde(rename = "session.created")]
    SessionCreated,

    /// Streamed assistant text.
    #[serde(rename = "response.text.delta")]
    TextDelta { delta: String },

    /// Streamed transcript of assistant audio.
    #[serde(rename = "response.audio_transcript.delta")]
    AudioTranscriptDelta { delta: String },

    #[serde(rename = "response.done")]
    ResponseDone,

    /// Audio playback finished on the remote side. Deferred restarts
    /// trigger here so in-flight speech is never truncated.
    #[serde(rename = "output_audio_buffer.stopped")]
    OutputAudioStopped,

    /// A tool-call request. `arguments` is the raw JSON string.
    #[serde(rename = "response.function_call_arguments.done")]
    FunctionCallArgumentsDone {
        name: String,
        arguments: String,
        call_id: String,
    },

    #[serde(rename = "error")]
    Error { error: Value },

    #[serde(other)]
    Unknown,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_update_tag() {
        let event = ClientEvent::SessionUpdate {
            session: SessionPayload {
                modalities: vec!["audio".into(), "text".into()],
                instructions: None,
                voice: "verse".into(),
                input_audio_transcription: TranscriptionPayload {
                    model: "whisper-1".into(),
                },
                tools: vec![],
            },
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "session.update");
        assert_eq!(json["session"]["voice"], "verse");
        // No instructions key when none are set
        assert!(json["session"].get("instructions").is_none());
    }

    #[test]
    fn user_message_uses_input_text() {
        let item = ConversationItem::message(Role::User, "hello");
        let json = serde_json::to_value(&item).unwrap();
        assert_eq!(json["type"], "message");
        assert_eq!(json["role"], "user");
        assert_eq!(json["content"][0]["type"], "input_text");
        assert_eq!(json["content"][0]["text"], "hello");
    }

    #[test]
    fn assistant_message_uses_text() {
        let item = ConversationItem::message(Role::Assistant, "hi there");
        let json = serde_json::to_value(&item).unwrap();
        assert_eq!(json["content"][0]["type"], "text");
    }

    #[test]
    fn function_call_output_tag() {
        let item = ConversationItem::FunctionCallOutput {
            call_id: "call_1".into(),
            output: "{\"ok\":true}".into(),
        };
        let json = serde_json::to_value(&item).unwrap();
        assert_eq!(json["type"], "function_call_output");
        assert_eq!(json["call_id"], "call_1");
    }

    #[test]
    fn response_create_omits_empty_payload() {
        let event = ClientEvent::ResponseCreate { response: None };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "response.create");
        assert!(json.get("response").is_none());
    }

    #[test]
    fn server_delta_round_trip() {
        let event: ServerEvent =
            serde_json::from_str(r#"{"type":"response.text.delta","delta":"wor"}"#).unwrap();
        assert!(matches!(event, ServerEvent::TextDelta { delta } if delta == "wor"));
    }

    #[test]
    fn server_tool_call_parses() {
        let raw = r#"{
            "type": "response.function_call_arguments.done",
            "name": "set_campaign_field",
            "arguments": "{\"field\":\"budget\",\"value\":500}",
            "call_id": "call_42"
        }"#;
        let event: ServerEvent = serde_json::from_str(raw).unwrap();
        match event {
            ServerEvent::FunctionCallArgumentsDone {
                name,
                arguments,
                call_id,
            } => {
                assert_eq!(name, "set_campaign_field");
                assert!(arguments.contains("budget"));
                assert_eq!(call_id, "call_42");
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[test]
    fn audio_stopped_parses() {
        let event: ServerEvent =
            serde_json::from_str(r#"{"type":"output_audio_buffer.stopped"}"#).unwrap();
        assert!(matches!(event, ServerEvent::OutputAudioStopped));
    }

    #[test]
    fn unknown_server_event_is_tolerated() {
        let event: ServerEvent =
            serde_json::from_str(r#"{"type":"rate_limits.updated","rate_limits":[]}"#).unwrap();
        assert!(matches!(event, ServerEvent::Unknown));
    }

    #[test]
    fn extra_fields_are_ignored() {
        let event: ServerEvent = serde_json::from_str(
            r#"{"type":"response.done","event_id":"ev_9","response":{"id":"r_1"}}"#,
        )
        .unwrap();
        assert!(matches!(event, ServerEvent::ResponseDone));
    }
}
