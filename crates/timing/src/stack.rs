//! Execution stack of the watches active in a call chain
//!
//! Comparing the elapsed time of a high-level operation with the fine-grained
//! operations it calls helps locate bottlenecks. The stack records every watch
//! pushed during an operation, in nesting order, so the whole chain can be
//! inspected afterwards or paused around a call whose waiting time should not
//! be measured.
//!
//! Each thread owns one stack. It is reused by the next operation run on the
//! same thread, so the owner must call [`clear`] once the top-level operation
//! has finished.

use crate::watch::{WatchHandle, WatchSnapshot};
use std::cell::RefCell;

/// Ordered watches of one execution unit.
///
/// Holds [`WatchHandle`]s and is therefore `!Send`; an explicit stack can be
/// passed down a call chain but never handed to another thread.
#[derive(Debug, Default)]
pub struct ExecutionStack {
    watches: Vec<WatchHandle>,
}

impl ExecutionStack {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a watch; push order is nesting order.
    pub fn push(&mut self, watch: WatchHandle) {
        self.watches.push(watch);
    }

    /// Pause every watch, outermost first. Watches that are not running are
    /// left as they are.
    pub fn pause_all(&self) {
        for watch in &self.watches {
            watch.pause();
        }
    }

    /// Resume every watch, outermost first. Watches that are not paused are
    /// left as they are.
    pub fn resume_all(&self) {
        for watch in &self.watches {
            watch.resume();
        }
    }

    /// Returns `true` if every watch is stopped. An empty stack is finished.
    pub fn is_finished(&self) -> bool {
        self.watches.iter().all(WatchHandle::is_stopped)
    }

    /// The watches in push order.
    pub fn current(&self) -> &[WatchHandle] {
        &self.watches
    }

    /// Plain-data copy of every watch in push order.
    pub fn snapshot(&self) -> Vec<WatchSnapshot> {
        self.watches.iter().map(WatchHandle::snapshot).collect()
    }

    pub fn len(&self) -> usize {
        self.watches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.watches.is_empty()
    }

    /// Remove every watch.
    pub fn clear(&mut self) {
        self.watches.clear();
    }
}

thread_local! {
    static CURRENT: RefCell<ExecutionStack> = RefCell::new(ExecutionStack::new());
}

/// Run `f` against the current thread's stack.
///
/// Watch methods never call back into the stack, so the borrow cannot be
/// re-entered from inside the bulk operations below.
fn with_current<R>(f: impl FnOnce(&mut ExecutionStack) -> R) -> R {
    CURRENT.with(|stack| f(&mut stack.borrow_mut()))
}

/// Push a watch on the current thread's stack.
pub fn push(watch: WatchHandle) {
    with_current(|stack| stack.push(watch));
}

/// Pause every watch on the current thread's stack.
pub fn pause_all() {
    with_current(|stack| stack.pause_all());
}

/// Resume every watch on the current thread's stack.
pub fn resume_all() {
    with_current(|stack| stack.resume_all());
}

/// Returns `true` if every watch on the current thread's stack is stopped.
pub fn is_finished() -> bool {
    with_current(|stack| stack.is_finished())
}

/// Handles to the watches on the current thread's stack, in push order.
pub fn current() -> Vec<WatchHandle> {
    with_current(|stack| stack.current().to_vec())
}

/// Snapshots of the watches on the current thread's stack, in push order.
pub fn snapshot() -> Vec<WatchSnapshot> {
    with_current(|stack| stack.snapshot())
}

/// Empty the current thread's stack.
pub fn clear() {
    with_current(|stack| stack.clear());
}
