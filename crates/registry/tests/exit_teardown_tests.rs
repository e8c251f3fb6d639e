//! Process-exit teardown
//!
//! Re-runs this test binary as a child process that resolves a component
//! with a pre-destroy hook through the process-wide registry and then exits
//! normally. The hook must run exactly once, from the exit handler.

use registry::{Capability, Component, Destroyable};
use std::fs::OpenOptions;
use std::io::Write;
use std::process::Command;
use std::sync::Arc;

const MARKER_ENV: &str = "REGISTRY_EXIT_MARKER";
const CHILD_TEST: &str = "test_child_resolves_and_exits";

/// Concrete capability that provides itself and appends to the marker file
/// when torn down.
struct Spool {
    marker: String,
}

impl Capability for Spool {
    const NAME: &'static str = "monitoring.test.Spool";
    type Target = Spool;
}

impl Component for Spool {
    type Config = ();

    fn build(_: ()) -> anyhow::Result<Self> {
        Ok(Spool {
            marker: std::env::var(MARKER_ENV)?,
        })
    }

    fn into_destroyable(self: Arc<Self>) -> Option<Arc<dyn Destroyable>> {
        Some(self)
    }
}

impl Destroyable for Spool {
    fn destroy(&self) -> anyhow::Result<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.marker)?;
        writeln!(file, "destroyed")?;
        Ok(())
    }
}

/// Only does work when launched by [`test_teardown_runs_once_at_process_exit`].
#[test]
fn test_child_resolves_and_exits() {
    if std::env::var_os(MARKER_ENV).is_none() {
        return;
    }

    registry::global().provide::<Spool, Spool, _>(Spool::NAME, |s| s);
    let spool = registry::resolve::<Spool>().unwrap();
    assert!(!spool.marker.is_empty());
    assert!(registry::global().teardown().is_armed());
    assert_eq!(registry::global().teardown().pending(), 1);
}

#[test]
fn test_teardown_runs_once_at_process_exit() {
    let marker = tempfile::NamedTempFile::new().unwrap();

    let output = Command::new(std::env::current_exe().unwrap())
        .args([CHILD_TEST, "--exact", "--nocapture", "--test-threads", "1"])
        .env(MARKER_ENV, marker.path())
        .output()
        .unwrap();
    assert!(
        output.status.success(),
        "child failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let contents = std::fs::read_to_string(marker.path()).unwrap();
    assert_eq!(contents, "destroyed\n");
}
