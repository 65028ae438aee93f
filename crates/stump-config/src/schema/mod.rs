//! Configuration schema for the Stump voice engine.
//!
//! All structs use `serde(default)` so partial configs work correctly.
//! Missing fields are filled with defaults matching current behavior.

mod audio;
mod endpoint;
mod logging;
mod session;

pub use audio::*;
pub use endpoint::*;
pub use logging::*;
pub use session::*;

use serde::{Deserialize, Serialize};

/// Current config schema version.
pub const CONFIG_SCHEMA_VERSION: u32 = 1;

/// Root configuration for the voice engine.
///
/// Only override what you want to change; every section has defaults.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct StumpConfig {
    pub session: SessionTuning,
    pub audio: AudioConfig,
    pub endpoint: EndpointConfig,
    pub logging: LoggingConfig,
}
