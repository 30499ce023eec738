//! Error types for the jack-bridge library

use crate::ffi::JackStatus;
use thiserror::Error;

/// Main error type for jack-bridge operations
#[derive(Error, Debug)]
pub enum Error {
    /// The JACK client library could not be loaded
    #[error("Failed to load JACK library: {0}")]
    LibraryLoadFailed(String),

    /// A required symbol is missing from the loaded library
    #[error("Symbol `{symbol}` not found in JACK library: {reason}")]
    SymbolNotFound {
        /// Name of the missing symbol
        symbol: String,
        /// Loader error message
        reason: String,
    },

    /// Client or port name that cannot cross the C boundary
    #[error("Invalid name {0:?}: contains an interior NUL byte")]
    InvalidName(String),

    /// The server returned a null client
    #[error("Failed to open JACK client '{name}' (status: {status})")]
    ClientOpenFailed {
        /// Requested client name
        name: String,
        /// Status bits reported by the server
        status: JackStatus,
    },

    /// `jack_set_process_callback` returned a non-zero code
    #[error("Failed to register process callback (code {0})")]
    CallbackRegistrationFailed(i32),

    /// `jack_port_register` returned a null port
    #[error("Failed to register port '{0}'")]
    PortRegistrationFailed(String),

    /// `jack_activate` returned a non-zero code
    #[error("Failed to activate client (code {0})")]
    ActivationFailed(i32),

    /// `jack_deactivate` returned a non-zero code
    #[error("Failed to deactivate client (code {0})")]
    DeactivationFailed(i32),

    /// The client handle was already released
    #[error("JACK client already closed")]
    ClientClosed,

    /// `jack_client_close` returned a non-zero code
    #[error("Failed to close client (code {0})")]
    CloseFailed(i32),

    /// Invalid configuration
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// IO error
    #[error(transparent)]
    IoError(#[from] std::io::Error),

    /// JSON (de)serialization error
    #[error(transparent)]
    JsonError(#[from] serde_json::Error),
}

/// Convenient Result type alias
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_failure_message_includes_status() {
        let err = Error::ClientOpenFailed {
            name: "test-client".to_string(),
            status: JackStatus::FAILURE | JackStatus::SERVER_FAILED,
        };
        assert_eq!(
            err.to_string(),
            "Failed to open JACK client 'test-client' (status: Failure | ServerFailed)"
        );
    }

    #[test]
    fn test_registration_failure_message() {
        let err = Error::CallbackRegistrationFailed(-1);
        assert_eq!(err.to_string(), "Failed to register process callback (code -1)");
    }

    #[test]
    fn test_closed_client_is_not_a_config_error() {
        let err = Error::ClientClosed;
        assert_eq!(err.to_string(), "JACK client already closed");
        assert!(!matches!(err, Error::ConfigError(_)));
    }
}
