//! # Bible Provider
//!
//! Scripture lookup against a bible-api.com compatible service.
//!
//! - `Reference`: parse and format passage references
//! - `BibleClient`: fetch a chapter's verses
//! - `PassageSource`: the open passage as a `CollectionSource`
//! - `verse_of_the_day`: daily rotating verse

pub mod client;
pub mod error;
pub mod passage;
pub mod reference;
pub mod scripture;
pub mod types;

pub use client::BibleClient;
pub use error::{BibleError, Result};
pub use passage::{verse_item, PassageSource, META_LABEL, META_VERSE};
pub use reference::{normalize_book, Reference};
pub use scripture::{verse_of_the_day, DAILY_SCRIPTURES};
pub use types::{ChapterResponse, Verse};
