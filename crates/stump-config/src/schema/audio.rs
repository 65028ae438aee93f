//! Audio capture configuration.

use serde::{Deserialize, Serialize};

/// Local capture settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioConfig {
    pub input_device: String,
    /// Capture sample rate expected by the realtime endpoint (mono PCM16).
    pub sample_rate: u32,
    /// Frame length handed to the level meter and the outbound buffer.
    pub frame_ms: u32,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            input_device: "default".into(),
            sample_rate: 24000,
            frame_ms: 20,
        }
    }
}
