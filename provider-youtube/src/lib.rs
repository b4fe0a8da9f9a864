//! # YouTube Provider
//!
//! Worship video playlist for the remote list synchronizer.
//!
//! ## Overview
//!
//! This module provides:
//! - `YouTubePlaylistSource`: playlist items as a `CollectionSource`, with
//!   page-token pagination and API error payload detection
//! - `YouTubeStatusProber`: a stateless `ItemProber` backed by the video
//!   status endpoint
//! - `watch_url`: links for opening a video outside the app

pub mod error;
pub mod playlist;
pub mod prober;
pub mod types;

pub use error::{Result, YouTubeError};
pub use playlist::{watch_url, YouTubePlaylistSource};
pub use prober::YouTubeStatusProber;
