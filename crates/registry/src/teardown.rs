//! Teardown of components with a pre-destroy hook
//!
//! Every component exposing [`Destroyable`] is recorded by the
//! [`ShutdownCoordinator`] as it is resolved. A single teardown pass runs
//! each hook once, in registration order, and then forgets the entries. The
//! pass is triggered explicitly with [`ShutdownCoordinator::shutdown`] or by
//! the process-exit hook armed on the first registration.

use crate::component::Destroyable;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Mutex, MutexGuard, Once, PoisonError};

/// Process-lifecycle facility that runs a coordinator's teardown pass when
/// the process ends.
pub trait ExitHook: Send + Sync {
    /// Arrange for `coordinator.shutdown()` to run at process exit.
    fn install(&self, coordinator: Arc<ShutdownCoordinator>);
}

/// Runs teardown from a `libc::atexit` handler, i.e. on `std::process::exit`
/// or when `main` returns.
///
/// Installed coordinators are kept alive until the process exits.
#[derive(Debug, Default, Clone, Copy)]
pub struct ProcessExitHook;

static EXIT_TARGETS: Mutex<Vec<Arc<ShutdownCoordinator>>> = Mutex::new(Vec::new());
static EXIT_HANDLER: Once = Once::new();

impl ExitHook for ProcessExitHook {
    fn install(&self, coordinator: Arc<ShutdownCoordinator>) {
        EXIT_TARGETS
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(coordinator);

        EXIT_HANDLER.call_once(|| {
            // SAFETY: `run_exit_targets` takes no arguments, never unwinds and
            // only touches 'static data.
            let rc = unsafe { libc::atexit(run_exit_targets) };
            if rc != 0 {
                tracing::warn!(rc, "Failed to register process exit handler");
            }
        });
    }
}

extern "C" fn run_exit_targets() {
    let targets = std::mem::take(&mut *EXIT_TARGETS.lock().unwrap_or_else(PoisonError::into_inner));
    for coordinator in targets {
        coordinator.shutdown();
    }
}

/// A registered `(hook, instance)` pair awaiting teardown.
pub struct DestroyableEntry {
    name: String,
    target: Arc<dyn Destroyable>,
}

impl DestroyableEntry {
    /// Implementation name of the instance.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Run the hook, swallowing errors and panics.
    fn destroy(&self) {
        match panic::catch_unwind(AssertUnwindSafe(|| self.target.destroy())) {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                tracing::warn!(component = %self.name, error = %e, "Destroy hook failed");
            }
            Err(_) => {
                tracing::warn!(component = %self.name, "Destroy hook panicked");
            }
        }
    }
}

impl std::fmt::Debug for DestroyableEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DestroyableEntry")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Default)]
struct CoordinatorState {
    entries: Vec<DestroyableEntry>,
    armed: bool,
}

/// Ordered collection of teardown entries plus the lazily armed exit hook.
pub struct ShutdownCoordinator {
    state: Mutex<CoordinatorState>,
    exit_hook: Box<dyn ExitHook>,
}

impl ShutdownCoordinator {
    /// Create a coordinator that arms `exit_hook` on demand.
    pub fn new(exit_hook: impl ExitHook + 'static) -> Arc<Self> {
        Arc::new(Self {
            state: Mutex::new(CoordinatorState::default()),
            exit_hook: Box::new(exit_hook),
        })
    }

    fn state(&self) -> MutexGuard<'_, CoordinatorState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Record a teardown entry.
    ///
    /// When `install_hook` is set and the exit hook is not armed yet, it is
    /// armed first. With `install_hook` unset the entry is still recorded and
    /// only an explicit [`shutdown`](Self::shutdown) runs it.
    pub fn register(
        self: &Arc<Self>,
        name: impl Into<String>,
        target: Arc<dyn Destroyable>,
        install_hook: bool,
    ) {
        let name = name.into();
        let arm = {
            let mut state = self.state();
            let arm = install_hook && !state.armed;
            state.armed |= arm;
            state.entries.push(DestroyableEntry {
                name: name.clone(),
                target,
            });
            arm
        };

        if arm {
            self.exit_hook.install(Arc::clone(self));
            tracing::info!(component = %name, "Armed process exit teardown");
        }
    }

    /// Run every registered hook once, in registration order, then clear the
    /// entries. Failing hooks are logged and skipped. Returns the number of
    /// entries processed.
    pub fn shutdown(&self) -> usize {
        let entries = std::mem::take(&mut self.state().entries);
        for entry in &entries {
            entry.destroy();
        }
        tracing::debug!(destroyed = entries.len(), "Teardown pass complete");
        entries.len()
    }

    /// Returns `true` once the exit hook has been armed.
    pub fn is_armed(&self) -> bool {
        self.state().armed
    }

    /// Number of entries awaiting teardown.
    pub fn pending(&self) -> usize {
        self.state().entries.len()
    }

    /// Implementation names awaiting teardown, in registration order.
    pub fn pending_names(&self) -> Vec<String> {
        self.state()
            .entries
            .iter()
            .map(|entry| entry.name().to_string())
            .collect()
    }
}

impl std::fmt::Debug for ShutdownCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShutdownCoordinator")
            .field("state", &*self.state())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct CountingHook {
        installs: AtomicUsize,
    }

    impl ExitHook for Arc<CountingHook> {
        fn install(&self, _coordinator: Arc<ShutdownCoordinator>) {
            self.installs.fetch_add(1, Ordering::SeqCst);
        }
    }

    struct Recorder {
        id: usize,
        log: Arc<Mutex<Vec<usize>>>,
        fail: bool,
    }

    impl Destroyable for Recorder {
        fn destroy(&self) -> anyhow::Result<()> {
            self.log.lock().unwrap().push(self.id);
            if self.fail {
                anyhow::bail!("recorder {} failed", self.id);
            }
            Ok(())
        }
    }

    struct Panicking;

    impl Destroyable for Panicking {
        fn destroy(&self) -> anyhow::Result<()> {
            panic!("destroy hook panicked");
        }
    }

    fn recorder(id: usize, log: &Arc<Mutex<Vec<usize>>>, fail: bool) -> Arc<dyn Destroyable> {
        Arc::new(Recorder {
            id,
            log: Arc::clone(log),
            fail,
        })
    }

    #[test]
    fn test_arms_once() {
        let hook = Arc::new(CountingHook::default());
        let coordinator = ShutdownCoordinator::new(Arc::clone(&hook));
        let log = Arc::new(Mutex::new(Vec::new()));

        assert!(!coordinator.is_armed());
        coordinator.register("a", recorder(1, &log, false), true);
        coordinator.register("b", recorder(2, &log, false), true);

        assert!(coordinator.is_armed());
        assert_eq!(hook.installs.load(Ordering::SeqCst), 1);
        assert_eq!(coordinator.pending_names(), vec!["a", "b"]);
    }

    #[test]
    fn test_disabled_policy_registers_without_arming() {
        let hook = Arc::new(CountingHook::default());
        let coordinator = ShutdownCoordinator::new(Arc::clone(&hook));
        let log = Arc::new(Mutex::new(Vec::new()));

        coordinator.register("a", recorder(1, &log, false), false);
        assert!(!coordinator.is_armed());
        assert_eq!(hook.installs.load(Ordering::SeqCst), 0);
        assert_eq!(coordinator.pending(), 1);

        assert_eq!(coordinator.shutdown(), 1);
        assert_eq!(*log.lock().unwrap(), vec![1]);
    }

    #[test]
    fn test_shutdown_runs_in_order_despite_failures() {
        let coordinator = ShutdownCoordinator::new(Arc::new(CountingHook::default()));
        let log = Arc::new(Mutex::new(Vec::new()));

        coordinator.register("first", recorder(1, &log, true), false);
        coordinator.register("panics", Arc::new(Panicking), false);
        coordinator.register("third", recorder(3, &log, false), false);

        assert_eq!(coordinator.shutdown(), 3);
        assert_eq!(*log.lock().unwrap(), vec![1, 3]);
        assert_eq!(coordinator.pending(), 0);
    }

    #[test]
    fn test_second_shutdown_is_empty() {
        let coordinator = ShutdownCoordinator::new(Arc::new(CountingHook::default()));
        let log = Arc::new(Mutex::new(Vec::new()));
        coordinator.register("once", recorder(1, &log, false), false);

        coordinator.shutdown();
        assert_eq!(coordinator.shutdown(), 0);
        assert_eq!(*log.lock().unwrap(), vec![1]);
    }
}
