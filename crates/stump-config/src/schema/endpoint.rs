//! Remote endpoint and credential broker configuration.

use serde::{Deserialize, Serialize};

/// Where the session connects and which models it asks for.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EndpointConfig {
    /// Trusted broker that issues short-lived session credentials.
    /// The broker holds the real API key; clients never see it.
    pub broker_url: String,
    /// Realtime endpoint the data channel connects to.
    pub realtime_url: String,
    pub model: String,
    /// Model used for input audio transcription.
    pub transcription_model: String,
    pub voice: String,
}

impl Default for EndpointConfig {
    fn default() -> Self {
        Self {
            broker_url: "http://127.0.0.1:8787/session".into(),
            realtime_url: "wss://api.openai.com/v1/realtime".into(),
            model: "gpt-4o-realtime-preview".into(),
            transcription_model: "whisper-1".into(),
            voice: "verse".into(),
        }
    }
}
