//! Stopwatch with an explicit running/paused/stopped lifecycle

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;
use std::time::{Duration, Instant};
use uuid::Uuid;

/// Lifecycle state of a [`Watch`].
///
/// ```text
/// Created --start--> Running --pause--> Paused
///                      ^  |               |
///                      |  +----stop----+  |
///                      +----resume-----|--+
///                                      v
///                                   Stopped
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WatchState {
    /// Not started yet; elapsed time is zero
    Created,
    /// Accumulating elapsed time
    Running,
    /// Elapsed time frozen, may resume
    Paused,
    /// Terminal; elapsed time is final
    Stopped,
}

impl fmt::Display for WatchState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            WatchState::Created => "created",
            WatchState::Running => "running",
            WatchState::Paused => "paused",
            WatchState::Stopped => "stopped",
        };
        f.write_str(name)
    }
}

/// A single measured interval.
///
/// Transitions that are not legal from the current state are ignored and
/// reported by a `false` return, so pausing an already paused watch (or
/// stopping a stopped one) is harmless.
#[derive(Debug, Clone)]
pub struct Watch {
    id: Uuid,
    label: String,
    created_at: DateTime<Utc>,
    state: WatchState,
    accumulated: Duration,
    running_since: Option<Instant>,
}

impl Watch {
    /// Create a watch in the `Created` state.
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            label: label.into(),
            created_at: Utc::now(),
            state: WatchState::Created,
            accumulated: Duration::ZERO,
            running_since: None,
        }
    }

    /// Create a watch that is already running.
    pub fn started(label: impl Into<String>) -> Self {
        let mut watch = Self::new(label);
        watch.start();
        watch
    }

    /// `Created -> Running`.
    pub fn start(&mut self) -> bool {
        if self.state != WatchState::Created {
            return false;
        }
        self.state = WatchState::Running;
        self.running_since = Some(Instant::now());
        true
    }

    /// `Running -> Paused`, freezing elapsed time.
    pub fn pause(&mut self) -> bool {
        if self.state != WatchState::Running {
            return false;
        }
        self.freeze();
        self.state = WatchState::Paused;
        true
    }

    /// `Paused -> Running`.
    pub fn resume(&mut self) -> bool {
        if self.state != WatchState::Paused {
            return false;
        }
        self.state = WatchState::Running;
        self.running_since = Some(Instant::now());
        true
    }

    /// `Running | Paused -> Stopped`, finalizing elapsed time.
    pub fn stop(&mut self) -> bool {
        match self.state {
            WatchState::Running => self.freeze(),
            WatchState::Paused => {}
            WatchState::Created | WatchState::Stopped => return false,
        }
        self.state = WatchState::Stopped;
        true
    }

    fn freeze(&mut self) {
        if let Some(since) = self.running_since.take() {
            self.accumulated += since.elapsed();
        }
    }

    /// Current state.
    #[inline]
    pub fn state(&self) -> WatchState {
        self.state
    }

    #[inline]
    pub fn is_running(&self) -> bool {
        self.state == WatchState::Running
    }

    #[inline]
    pub fn is_paused(&self) -> bool {
        self.state == WatchState::Paused
    }

    #[inline]
    pub fn is_stopped(&self) -> bool {
        self.state == WatchState::Stopped
    }

    /// Total time spent running, including the current running segment.
    pub fn elapsed(&self) -> Duration {
        match self.running_since {
            Some(since) => self.accumulated + since.elapsed(),
            None => self.accumulated,
        }
    }

    /// Elapsed running time in milliseconds.
    #[inline]
    pub fn elapsed_ms(&self) -> f64 {
        self.elapsed().as_secs_f64() * 1000.0
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Copy the watch into plain data.
    pub fn snapshot(&self) -> WatchSnapshot {
        WatchSnapshot {
            id: self.id,
            label: self.label.clone(),
            created_at: self.created_at,
            state: self.state,
            elapsed: self.elapsed(),
        }
    }
}

/// Shared reference to a [`Watch`].
///
/// The creator keeps one handle to stop its watch while the execution stack
/// holds another. Handles are deliberately `!Send`: a watch never leaves the
/// thread that created it.
#[derive(Clone)]
pub struct WatchHandle(Rc<RefCell<Watch>>);

impl WatchHandle {
    /// Wrap a new watch in the `Created` state.
    pub fn new(label: impl Into<String>) -> Self {
        Self::from(Watch::new(label))
    }

    pub fn start(&self) -> bool {
        self.0.borrow_mut().start()
    }

    pub fn pause(&self) -> bool {
        self.0.borrow_mut().pause()
    }

    pub fn resume(&self) -> bool {
        self.0.borrow_mut().resume()
    }

    pub fn stop(&self) -> bool {
        self.0.borrow_mut().stop()
    }

    pub fn state(&self) -> WatchState {
        self.0.borrow().state()
    }

    pub fn is_stopped(&self) -> bool {
        self.0.borrow().is_stopped()
    }

    pub fn elapsed(&self) -> Duration {
        self.0.borrow().elapsed()
    }

    pub fn label(&self) -> String {
        self.0.borrow().label().to_string()
    }

    pub fn snapshot(&self) -> WatchSnapshot {
        self.0.borrow().snapshot()
    }

    /// Run `f` with shared access to the watch.
    pub fn with<R>(&self, f: impl FnOnce(&Watch) -> R) -> R {
        f(&self.0.borrow())
    }

    /// Returns `true` if both handles refer to the same watch.
    pub fn ptr_eq(&self, other: &WatchHandle) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl From<Watch> for WatchHandle {
    fn from(watch: Watch) -> Self {
        Self(Rc::new(RefCell::new(watch)))
    }
}

impl fmt::Debug for WatchHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("WatchHandle").field(&self.0.borrow()).finish()
    }
}

/// Point-in-time copy of a watch, for reporting code.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WatchSnapshot {
    pub id: Uuid,
    pub label: String,
    pub created_at: DateTime<Utc>,
    pub state: WatchState,
    /// Running time at the moment of the snapshot
    #[serde(with = "duration_nanos")]
    pub elapsed: Duration,
}

mod duration_nanos {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        (duration.as_nanos() as u64).serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(Duration::from_nanos(u64::deserialize(deserializer)?))
    }
}
