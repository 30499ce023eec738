use thiserror::Error;

#[derive(Debug, Error)]
pub enum PassthruError {
    #[error(transparent)]
    Bridge(#[from] jack_bridge::Error),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Invalid settings: {0}")]
    InvalidSettings(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Settings file error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, PassthruError>;
