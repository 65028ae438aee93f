//! Configuration validation.
//!
//! Validates numeric ranges and endpoint URLs, collecting all errors.

use crate::schema::StumpConfig;
use stump_common::ConfigError;

/// Run all validations on a config, collecting all errors.
pub fn validate(config: &StumpConfig) -> Result<(), ConfigError> {
    let mut errors: Vec<String> = Vec::new();

    // A window of 1 cannot hold a user/assistant round at all.
    validate_range(&mut errors, "session.max_turns", config.session.max_turns, 2, 256);
    validate_range(
        &mut errors,
        "session.summary_wait_ms",
        config.session.summary_wait_ms,
        100,
        30_000,
    );
    validate_range(
        &mut errors,
        "session.channel_open_ms",
        config.session.channel_open_ms,
        500,
        60_000,
    );

    validate_range(&mut errors, "audio.sample_rate", config.audio.sample_rate, 8_000, 48_000);
    validate_range(&mut errors, "audio.frame_ms", config.audio.frame_ms, 5, 200);

    if !config.endpoint.broker_url.starts_with("http://")
        && !config.endpoint.broker_url.starts_with("https://")
    {
        errors.push(format!(
            "endpoint.broker_url must be http(s), got '{}'",
            config.endpoint.broker_url
        ));
    }
    if !config.endpoint.realtime_url.starts_with("ws://")
        && !config.endpoint.realtime_url.starts_with("wss://")
    {
        errors.push(format!(
            "endpoint.realtime_url must be ws(s), got '{}'",
            config.endpoint.realtime_url
        ));
    }
    if config.endpoint.model.is_empty() {
        errors.push("endpoint.model must not be empty".into());
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(ConfigError::ValidationError(errors.join("; ")))
    }
}

fn validate_range<T: PartialOrd + std::fmt::Display>(
    errors: &mut Vec<String>,
    name: &str,
    value: T,
    min: T,
    max: T,
) {
    if value < min || value > max {
        errors.push(format!("{name} must be between {min} and {max}, got {value}"));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(validate(&StumpConfig::default()).is_ok());
    }

    #[test]
    fn max_turns_of_zero_fails() {
        let mut config = StumpConfig::default();
        config.session.max_turns = 0;
        let err = validate(&config).unwrap_err();
        assert!(err.to_string().contains("session.max_turns"));
    }

    #[test]
    fn bad_broker_url_fails() {
        let mut config = StumpConfig::default();
        config.endpoint.broker_url = "ftp://example.com".into();
        let err = validate(&config).unwrap_err();
        assert!(err.to_string().contains("broker_url"));
    }

    #[test]
    fn bad_realtime_url_fails() {
        let mut config = StumpConfig::default();
        config.endpoint.realtime_url = "https://not-a-websocket".into();
        let err = validate(&config).unwrap_err();
        assert!(err.to_string().contains("realtime_url"));
    }

    #[test]
    fn multiple_errors_are_collected() {
        let mut config = StumpConfig::default();
        config.session.max_turns = 1;
        config.endpoint.model = String::new();
        let err = validate(&config).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("max_turns"));
        assert!(msg.contains("model"));
    }
}
