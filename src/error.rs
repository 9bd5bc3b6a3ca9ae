//! Error types for bargain

use thiserror::Error;

/// Main error type for bargain
#[derive(Error, Debug)]
pub enum BargainError {
    // Network errors
    #[error("Network connection error: {0}")]
    NetworkConnection(String),

    #[error("Peer timeout: {0}")]
    PeerTimeout(String),

    #[error("Counterparty disconnected: {0}")]
    CounterpartyDisconnected(String),

    // Message errors
    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Protocol violation: {0}")]
    ProtocolViolation(String),

    // External reasoning errors
    #[error("Reasoning adapter failed: {0}")]
    AdapterFailure(String),

    #[error("Reasoning adapter timed out after {0}ms")]
    AdapterTimeout(u64),

    // Configuration errors
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Invalid configuration value: {0}")]
    InvalidConfig(String),

    // General errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl BargainError {
    /// Errors a session recovers from by discarding the offending message.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            BargainError::Parse(_) | BargainError::ProtocolViolation(_)
        )
    }

    /// Errors that end a session as a disconnect.
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            BargainError::NetworkConnection(_)
                | BargainError::PeerTimeout(_)
                | BargainError::CounterpartyDisconnected(_)
                | BargainError::Io(_)
        )
    }
}

/// Result type alias for bargain operations
pub type Result<T> = std::result::Result<T, BargainError>;
