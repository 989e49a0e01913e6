use thiserror::Error;

/// Result type alias for bridge operations
pub type Result<T, E = BridgeError> = std::result::Result<T, E>;

/// Errors that can occur while serving bridge traffic
#[derive(Error, Debug)]
pub enum BridgeError {
    #[error("metadata store error: {0}")]
    Store(#[from] metadata::store::StoreError),

    #[error("response serialization error: {0}")]
    ResponseSerialization(#[from] serde_json::Error),

    #[error("internal error: {0}")]
    Internal(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
