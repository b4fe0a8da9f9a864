//! # Remote List Synchronization
//!
//! Keeps a locally displayed list consistent with a remote collection whose
//! items may be deleted, made private or otherwise become unloadable.
//!
//! ## Components
//!
//! - **Items** (`item`): `RemoteItem` and per-pass validation states
//! - **Sources** (`source`): `CollectionSource`, an endpoint plus decoder
//! - **Filter** (`filter`): static deny-list and shape checks
//! - **Probing** (`probe`): `ItemProber`, the shared content surface and the
//!   probe runner
//! - **Retry** (`retry`): fixed-delay retry for transient fetch failures
//! - **Cache** (`cache`): persisted item list and probe results
//! - **State** (`state`): the watch-channel snapshot consumers observe
//! - **Synchronizer** (`synchronizer`): `RemoteListSynchronizer`, which ties
//!   the above together

pub mod cache;
pub mod error;
pub mod filter;
pub mod item;
pub mod probe;
pub mod retry;
pub mod selection;
pub mod source;
pub mod state;
pub mod synchronizer;

pub use cache::{CacheRecord, CacheRepository};
pub use core_runtime::config::ProbeSchedule;
pub use error::{ErrorKind, Result, SyncError};
pub use filter::{FilterOutcome, RejectReason, StaticFilter, DEFAULT_DENY_MARKERS};
pub use item::{RemoteItem, ValidationLedger, ValidationState};
pub use probe::{
    ItemProber, ProbeOutcome, ProbeReport, ProbeRunner, SharedSurface, SurfaceProber, SurfaceSlot,
};
pub use retry::RetryPolicy;
pub use selection::{SelectionTicket, SelectionTracker};
pub use source::CollectionSource;
pub use state::{StateError, SyncState};
pub use synchronizer::{
    FetchOutcome, RefreshOutcome, RemoteListSynchronizer, SelectOutcome, SynchronizerBuilder,
    ValidationOutcome,
};
