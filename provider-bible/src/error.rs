use bridge_traits::error::BridgeError;
use core_sync::SyncError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BibleError {
    #[error("Invalid reference '{input}': {message}")]
    InvalidReference { input: String, message: String },

    #[error("Passage not found: {0}")]
    NotFound(String),

    #[error("Scripture API returned HTTP {status}")]
    HttpStatus { status: u16 },

    #[error("Failed to decode passage: {0}")]
    Decode(String),

    #[error("Transport error: {0}")]
    Transport(#[from] BridgeError),
}

impl BibleError {
    pub(crate) fn invalid(input: &str, message: impl Into<String>) -> Self {
        BibleError::InvalidReference {
            input: input.to_string(),
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, BibleError>;

impl From<BibleError> for SyncError {
    fn from(error: BibleError) -> Self {
        match error {
            BibleError::InvalidReference { input, message } => SyncError::Api {
                code: None,
                message: format!("{input}: {message}"),
            },
            BibleError::NotFound(message) => SyncError::Api {
                code: Some(404),
                message,
            },
            BibleError::HttpStatus { status } => SyncError::HttpStatus { status },
            BibleError::Decode(msg) => SyncError::Decode(msg),
            BibleError::Transport(e) => e.into(),
        }
    }
}
