//! Stump configuration system.
//!
//! TOML-based configuration for the voice-session engine. All sections use
//! `serde(default)` so partial configs work out of the box.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use stump_config::load_config;
//!
//! let config = load_config().expect("failed to load config");
//! println!("max_turns = {}", config.session.max_turns);
//! ```

pub mod schema;
pub mod validation;

pub use schema::{StumpConfig, CONFIG_SCHEMA_VERSION};

use std::path::{Path, PathBuf};

use stump_common::ConfigError;

/// Platform default config path (`<os config dir>/stump/config.toml`).
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("stump").join("config.toml"))
}

/// Load config from the platform default path.
///
/// A missing file yields the defaults; a present but malformed or invalid
/// file is an error, never silently ignored.
pub fn load_config() -> Result<StumpConfig, ConfigError> {
    match default_config_path() {
        Some(path) if path.exists() => load_config_from_path(&path),
        _ => {
            tracing::debug!("no config file found, using defaults");
            Ok(StumpConfig::default())
        }
    }
}

/// Load and validate config from an explicit path.
pub fn load_config_from_path(path: &Path) -> Result<StumpConfig, ConfigError> {
    let contents = std::fs::read_to_string(path)
        .map_err(|_| ConfigError::FileNotFound(path.to_path_buf()))?;
    let config: StumpConfig =
        toml::from_str(&contents).map_err(|e| ConfigError::ParseError(e.to_string()))?;
    validation::validate(&config)?;
    Ok(config)
}

/// Serialize a config to a pretty-printed JSON string.
pub fn config_to_json(config: &StumpConfig) -> String {
    serde_json::to_string_pretty(config)
        .unwrap_or_else(|e| format!("{{\"error\": \"failed to serialize config: {e}\"}}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn config_to_json_contains_all_sections() {
        let config = StumpConfig::default();
        let json = config_to_json(&config);
        assert!(json.contains("\"session\""));
        assert!(json.contains("\"audio\""));
        assert!(json.contains("\"endpoint\""));
        assert!(json.contains("\"logging\""));
    }

    #[test]
    fn default_config_round_trips_through_json() {
        let config = StumpConfig::default();
        let json = config_to_json(&config);
        let parsed: StumpConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.session.max_turns, 16);
        assert_eq!(parsed.audio.sample_rate, 24000);
        assert_eq!(parsed.endpoint.voice, "verse");
    }

    #[test]
    fn partial_toml_fills_defaults() {
        let config: StumpConfig = toml::from_str(
            r#"
            [session]
            max_turns = 4
            "#,
        )
        .unwrap();
        assert_eq!(config.session.max_turns, 4);
        assert_eq!(config.session.summary_wait_ms, 1800);
        assert_eq!(config.session.channel_open_ms, 4000);
        assert_eq!(config.audio.input_device, "default");
        assert_eq!(config.logging.directive, "stump=info");
    }

    #[test]
    fn replay_turns_is_one_less_than_max() {
        let tuning = schema::SessionTuning {
            max_turns: 8,
            ..Default::default()
        };
        assert_eq!(tuning.replay_turns(), 7);
    }

    #[test]
    fn load_config_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[endpoint]\nmodel = \"gpt-4o-realtime-preview\"").unwrap();
        let config = load_config_from_path(file.path()).unwrap();
        assert_eq!(config.endpoint.model, "gpt-4o-realtime-preview");
        assert_eq!(config.session.max_turns, 16);
    }

    #[test]
    fn load_config_missing_file_errors() {
        let err = load_config_from_path(Path::new("/nonexistent/config.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::FileNotFound(_)));
    }

    #[test]
    fn load_config_bad_toml_errors() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "not valid toml [[[").unwrap();
        let err = load_config_from_path(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::ParseError(_)));
    }

    #[test]
    fn config_schema_version_is_1() {
        assert_eq!(CONFIG_SCHEMA_VERSION, 1);
    }
}
