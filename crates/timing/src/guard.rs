//! Scope guards over the current thread's execution stack

use crate::stack;
use crate::watch::WatchHandle;

/// A watch pushed on the current thread's stack for the lifetime of a scope.
///
/// The watch starts when the guard is created and stops when it is dropped.
/// The stack keeps the stopped watch until [`stack::clear`] is called.
///
/// # Example
///
/// ```rust
/// use timing::{stack, WatchGuard};
///
/// fn handle_request() {
///     let _outer = WatchGuard::enter("request");
///     {
///         let _inner = WatchGuard::enter("query");
///         // ... query ...
///     }
/// }
///
/// handle_request();
/// assert!(stack::is_finished());
/// assert_eq!(stack::current().len(), 2);
/// stack::clear();
/// ```
#[must_use = "the watch stops as soon as the guard is dropped"]
pub struct WatchGuard {
    watch: WatchHandle,
}

impl WatchGuard {
    /// Create, push and start a watch.
    pub fn enter(label: impl Into<String>) -> Self {
        let watch = WatchHandle::new(label);
        stack::push(watch.clone());
        watch.start();
        Self { watch }
    }

    /// The guarded watch.
    pub fn watch(&self) -> &WatchHandle {
        &self.watch
    }
}

impl Drop for WatchGuard {
    fn drop(&mut self) {
        if self.watch.stop() {
            tracing::trace!(
                target: "timing",
                label = %self.watch.label(),
                elapsed_ms = self.watch.elapsed().as_secs_f64() * 1000.0,
                "watch stopped"
            );
        }
    }
}

/// Pauses the whole current call chain while alive.
///
/// Wrap a call to an external service so its waiting time is excluded from
/// every enclosing measurement.
///
/// ```rust
/// use timing::{PauseGuard, WatchGuard, WatchState};
///
/// let outer = WatchGuard::enter("checkout");
/// {
///     let _paused = PauseGuard::new();
///     assert_eq!(outer.watch().state(), WatchState::Paused);
///     // ... remote call ...
/// }
/// assert_eq!(outer.watch().state(), WatchState::Running);
/// # drop(outer);
/// # timing::stack::clear();
/// ```
#[must_use = "the stack resumes as soon as the guard is dropped"]
pub struct PauseGuard {
    _private: (),
}

impl PauseGuard {
    pub fn new() -> Self {
        stack::pause_all();
        Self { _private: () }
    }
}

impl Default for PauseGuard {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for PauseGuard {
    fn drop(&mut self) {
        stack::resume_all();
    }
}

/// Time the rest of the enclosing scope under the given label.
///
/// ```rust
/// use timing::watch_scope;
///
/// fn render() {
///     watch_scope!("render");
///     // ... work ...
/// }
/// # render();
/// # timing::stack::clear();
/// ```
#[macro_export]
macro_rules! watch_scope {
    ($label:expr) => {
        let _watch_guard = $crate::WatchGuard::enter($label);
    };
}
