//! Error types for the YouTube provider

use bridge_traits::error::BridgeError;
use core_sync::SyncError;
use thiserror::Error;

/// YouTube provider errors
#[derive(Error, Debug)]
pub enum YouTubeError {
    /// Non-200 status from the Data API
    #[error("YouTube API returned status {status}")]
    HttpStatus { status: u16 },

    /// The API answered with an error payload
    #[error("YouTube API error (code {code:?}): {message}")]
    Api { code: Option<i64>, message: String },

    /// Failed to parse API response
    #[error("Failed to parse API response: {0}")]
    ParseError(String),

    /// Transport failure from the HTTP bridge
    #[error(transparent)]
    Transport(#[from] BridgeError),
}

/// Result type for YouTube operations
pub type Result<T> = std::result::Result<T, YouTubeError>;

impl From<YouTubeError> for SyncError {
    fn from(error: YouTubeError) -> Self {
        match error {
            YouTubeError::HttpStatus { status } => SyncError::HttpStatus { status },
            YouTubeError::Api { code, message } => SyncError::Api { code, message },
            YouTubeError::ParseError(msg) => SyncError::Decode(msg),
            YouTubeError::Transport(e) => e.into(),
        }
    }
}
