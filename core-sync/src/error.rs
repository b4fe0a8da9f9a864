use bridge_traits::BridgeError;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Failures produced while fetching, probing or persisting a remote list.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SyncError {
    /// Transport failure. Only `transient` failures are retried.
    #[error("Network error: {message}")]
    Network { message: String, transient: bool },

    #[error("HTTP status {status}")]
    HttpStatus { status: u16 },

    #[error("Failed to decode response: {0}")]
    Decode(String),

    /// The API answered with an error payload instead of data.
    #[error("API error: {message}")]
    Api { code: Option<i64>, message: String },

    #[error("No items found")]
    NoItems,

    #[error("No playable items available")]
    NoPlayableItems,

    #[error("Item {item_id} is unavailable: {reason}")]
    ItemUnavailable { item_id: String, reason: String },

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Operation cancelled")]
    Cancelled,
}

impl SyncError {
    pub fn network(message: impl Into<String>) -> Self {
        SyncError::Network {
            message: message.into(),
            transient: true,
        }
    }

    /// Whether retrying the same request may succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, SyncError::Network { transient: true, .. })
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            SyncError::Network { .. } => ErrorKind::Network,
            SyncError::HttpStatus { .. } => ErrorKind::HttpStatus,
            SyncError::Decode(_) => ErrorKind::Decode,
            SyncError::Api { .. } => ErrorKind::Api,
            SyncError::NoItems => ErrorKind::NoItems,
            SyncError::NoPlayableItems => ErrorKind::NoPlayableItems,
            SyncError::ItemUnavailable { .. } => ErrorKind::ItemUnavailable,
            SyncError::Storage(_) => ErrorKind::Storage,
            SyncError::Cancelled => ErrorKind::Cancelled,
        }
    }
}

impl From<BridgeError> for SyncError {
    fn from(err: BridgeError) -> Self {
        match err {
            BridgeError::Storage(message) => SyncError::Storage(message),
            other => SyncError::Network {
                transient: other.is_transient(),
                message: other.to_string(),
            },
        }
    }
}

/// Consumer-facing error category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    Network,
    HttpStatus,
    Decode,
    Api,
    NoItems,
    NoPlayableItems,
    ItemUnavailable,
    Storage,
    Cancelled,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorKind::Network => "network",
            ErrorKind::HttpStatus => "http_status",
            ErrorKind::Decode => "decode",
            ErrorKind::Api => "api",
            ErrorKind::NoItems => "no_items",
            ErrorKind::NoPlayableItems => "no_playable_items",
            ErrorKind::ItemUnavailable => "item_unavailable",
            ErrorKind::Storage => "storage",
            ErrorKind::Cancelled => "cancelled",
        };
        f.write_str(name)
    }
}

pub type Result<T> = std::result::Result<T, SyncError>;
