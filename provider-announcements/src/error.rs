use bridge_traits::error::BridgeError;
use core_sync::SyncError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AnnouncementsError {
    #[error("Announcements feed returned HTTP {status}")]
    HttpStatus { status: u16 },

    #[error("Failed to decode announcements feed: {0}")]
    Decode(String),

    #[error("Transport error: {0}")]
    Transport(#[from] BridgeError),
}

pub type Result<T> = std::result::Result<T, AnnouncementsError>;

impl From<AnnouncementsError> for SyncError {
    fn from(error: AnnouncementsError) -> Self {
        match error {
            AnnouncementsError::HttpStatus { status } => SyncError::HttpStatus { status },
            AnnouncementsError::Decode(msg) => SyncError::Decode(msg),
            AnnouncementsError::Transport(e) => e.into(),
        }
    }
}
