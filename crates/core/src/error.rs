#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Invalid {field} pattern {pattern:?}: {reason}")]
    InvalidPattern {
        field: &'static str,
        pattern: String,
        reason: String,
    },

    #[error("Unknown pattern syntax {0:?} (expected regex, glob or exact)")]
    UnknownPatternSyntax(String),

    #[error("Unsupported webhook event {0:?}")]
    UnsupportedEvent(String),

    #[error("Unsupported webhook kind {0:?}")]
    UnsupportedKind(String),

    #[error("Invalid webhook endpoint: {0}")]
    InvalidEndpoint(String),

    #[error("Missing configuration: {0}")]
    MissingConfig(&'static str),

    #[error("Invalid configuration value for {key}: {reason}")]
    InvalidConfig { key: &'static str, reason: String },

    #[error("Failed to read webhook config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse webhook config: {0}")]
    Parse(#[from] serde_json::Error),
}
