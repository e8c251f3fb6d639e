//! Nested Timing
//!
//! This crate tracks the stopwatches of a monitored call chain:
//! - [`Watch`] with an explicit `Created -> Running <-> Paused -> Stopped` lifecycle
//! - [`ExecutionStack`] holding the active watches of one thread in nesting order
//! - Thread-confined default stack behind the functions in [`stack`]
//! - RAII helpers: [`WatchGuard`] times a scope, [`PauseGuard`] excludes a
//!   scope (e.g. a remote call) from every enclosing measurement
//!
//! # Example
//!
//! ```rust
//! use timing::{stack, WatchHandle, WatchState};
//!
//! let outer = WatchHandle::new("outer");
//! stack::push(outer.clone());
//! outer.start();
//!
//! let inner = WatchHandle::new("inner");
//! stack::push(inner.clone());
//! inner.start();
//!
//! stack::pause_all();
//! assert_eq!(outer.state(), WatchState::Paused);
//! stack::resume_all();
//!
//! inner.stop();
//! outer.stop();
//! assert!(stack::is_finished());
//!
//! // The thread's stack is reused by the next operation.
//! stack::clear();
//! ```

mod guard;
pub mod stack;
mod watch;

pub use guard::{PauseGuard, WatchGuard};
pub use stack::ExecutionStack;
pub use watch::{Watch, WatchHandle, WatchSnapshot, WatchState};

/// Re-export for convenience
pub use std::time::Duration;
