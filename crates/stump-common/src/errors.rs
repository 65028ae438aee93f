use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("config file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("config parse error: {0}")]
    ParseError(String),

    #[error("config validation error: {0}")]
    ValidationError(String),
}

#[derive(Debug, thiserror::Error)]
pub enum StumpError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("voice session error: {0}")]
    Voice(String),

    #[error("network error: {0}")]
    Network(String),

    #[error("{0}")]
    Other(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_error_display() {
        let err = ConfigError::FileNotFound(PathBuf::from("/tmp/missing.toml"));
        assert_eq!(err.to_string(), "config file not found: /tmp/missing.toml");

        let err = ConfigError::ParseError("unexpected token".into());
        assert_eq!(err.to_string(), "config parse error: unexpected token");

        let err = ConfigError::ValidationError("max_turns must be >= 2".into());
        assert_eq!(
            err.to_string(),
            "config validation error: max_turns must be >= 2"
        );
    }

    #[test]
    fn stump_error_from_config() {
        let config_err = ConfigError::ParseError("bad toml".into());
        let err: StumpError = config_err.into();
        assert!(matches!(err, StumpError::Config(_)));
        assert!(err.to_string().contains("bad toml"));
    }

    #[test]
    fn stump_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file missing");
        let err: StumpError = io_err.into();
        assert!(matches!(err, StumpError::Io(_)));
        assert!(err.to_string().contains("file missing"));
    }

    #[test]
    fn stump_error_other_variants() {
        let err = StumpError::Voice("channel closed".into());
        assert_eq!(err.to_string(), "voice session error: channel closed");

        let err = StumpError::Network("timeout".into());
        assert_eq!(err.to_string(), "network error: timeout");

        let err = StumpError::Other("something went wrong".into());
        assert_eq!(err.to_string(), "something went wrong");
    }
}
