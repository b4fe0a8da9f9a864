use thiserror::Error;

/// Errors surfaced by host bridge implementations.
///
/// Transport failures are split so that callers can tell retryable
/// conditions (`Timeout`, `ConnectionLost`, `MalformedResponse`) from
/// permanent ones without inspecting message strings.
#[derive(Error, Debug)]
pub enum BridgeError {
    #[error("Bridge capability not available: {0}")]
    NotAvailable(String),

    #[error("Bridge operation failed: {0}")]
    OperationFailed(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Connection lost: {0}")]
    ConnectionLost(String),

    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl BridgeError {
    /// Whether the failure is worth retrying with the same request.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            BridgeError::Timeout(_) | BridgeError::ConnectionLost(_) | BridgeError::MalformedResponse(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, BridgeError>;
