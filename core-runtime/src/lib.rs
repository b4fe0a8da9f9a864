//! # Core Runtime Module
//!
//! Foundational runtime infrastructure for the congregation app core:
//! - Logging and tracing setup
//! - Configuration (`CoreConfig` builder and feature tuning)
//! - Event bus for content and library notifications
//!
//! Every other core crate depends on this one for its logging conventions
//! and for the shared event vocabulary.

pub mod config;
pub mod error;
pub mod events;
pub mod logging;

pub use error::{Error, Result};
