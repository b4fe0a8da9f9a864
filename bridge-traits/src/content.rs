//! Content surface bridge.
//!
//! The content surface is the host's single embedded player (a web view on
//! mobile, a media widget on desktop). The core uses it for two things:
//! presenting the selected item, and, when no stateless status endpoint is
//! available, probing items one at a time to see whether they load.
//!
//! There is exactly one surface per process. It is constructed by the host
//! and injected at the composition root; callers must not assume loads can
//! overlap.

use async_trait::async_trait;
use std::fmt;

use crate::error::Result;

/// Why the surface is being asked to load an item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadMode {
    /// Cue the item without presenting it, to confirm it is playable.
    Probe,
    /// Present the item to the user.
    Present,
}

/// A single load instruction for the surface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadRequest {
    pub item_id: String,
    /// Opaque reference understood by the surface (e.g. a video id).
    pub payload: String,
    pub mode: LoadMode,
}

impl LoadRequest {
    pub fn probe(item_id: impl Into<String>, payload: impl Into<String>) -> Self {
        Self {
            item_id: item_id.into(),
            payload: payload.into(),
            mode: LoadMode::Probe,
        }
    }

    pub fn present(item_id: impl Into<String>, payload: impl Into<String>) -> Self {
        Self {
            item_id: item_id.into(),
            payload: payload.into(),
            mode: LoadMode::Present,
        }
    }
}

/// Result reported by the surface once a load settles.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadOutcome {
    /// The item loaded and is ready to present.
    Ready,
    /// The surface reported a load error for the item.
    Failed { reason: String },
}

impl LoadOutcome {
    pub fn is_ready(&self) -> bool {
        matches!(self, LoadOutcome::Ready)
    }
}

impl fmt::Display for LoadOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoadOutcome::Ready => write!(f, "ready"),
            LoadOutcome::Failed { reason } => write!(f, "failed: {}", reason),
        }
    }
}

/// Host content surface.
///
/// `load` resolves when the host reports ready or error for the request.
/// It may never resolve if the host never answers; callers bound it with a
/// timeout and drop the future to abandon a load.
///
/// # Example
///
/// ```ignore
/// use bridge_traits::content::{ContentSurface, LoadRequest};
///
/// async fn show(surface: &dyn ContentSurface) -> Result<()> {
///     let outcome = surface.load(LoadRequest::present("abc", "dQw4w9WgXcQ")).await?;
///     if !outcome.is_ready() {
///         // fall back to the next item
///     }
///     Ok(())
/// }
/// ```
#[async_trait]
pub trait ContentSurface: Send + Sync {
    /// Load an item and wait for the host to report the outcome.
    async fn load(&self, request: LoadRequest) -> Result<LoadOutcome>;

    /// Stop whatever the surface is showing.
    async fn stop(&self) -> Result<()> {
        Ok(())
    }
}
