//! Async runtime facade for the congregation app core.
//!
//! Core and provider crates depend on this crate instead of reaching for
//! tokio directly, so the executor stays an implementation detail of the
//! composition root.
//!
//! # Modules
//!
//! - `task`: Task spawning
//! - `time`: Sleep, timeouts and wall-clock helpers
//! - `sync`: Locks, channels and cancellation tokens
//! - `runtime`: Runtime handles and `block_on`
//!
//! # Examples
//!
//! ```rust
//! use core_async::task;
//! use core_async::time::{sleep, Duration};
//!
//! async fn example() {
//!     let handle = task::spawn(async {
//!         sleep(Duration::from_millis(10)).await;
//!         42
//!     });
//!     assert_eq!(handle.await.unwrap(), 42);
//! }
//! ```

pub mod runtime;
pub mod sync;
pub mod task;
pub mod time;

/// Wait on several futures and run the branch of the first to complete.
pub use tokio::select;

pub use task::spawn;
pub use time::{sleep, Duration, Instant};
