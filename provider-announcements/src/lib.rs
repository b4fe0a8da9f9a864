//! # Announcements Provider
//!
//! Church announcements for the remote list synchronizer. Announcements have
//! no thumbnails and no probe step, so pair this source with
//! `StaticFilter::permissive()`.

pub mod error;
pub mod feed;

pub use error::{AnnouncementsError, Result};
pub use feed::{
    default_announcements, order_by_priority, Announcement, AnnouncementsSource, META_PRIORITY,
    META_TIME_INFO,
};
