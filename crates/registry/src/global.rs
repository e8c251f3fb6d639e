//! Process-wide default registry
//!
//! Built on first use from [`PropertySource::load`], with teardown armed
//! through [`ProcessExitHook`](crate::ProcessExitHook).

use crate::component::Capability;
use crate::error::Result;
use crate::registry::ComponentRegistry;
use properties::PropertySource;
use std::sync::{Arc, OnceLock};

static GLOBAL_REGISTRY: OnceLock<ComponentRegistry> = OnceLock::new();

/// Get the process-wide registry.
pub fn global() -> &'static ComponentRegistry {
    GLOBAL_REGISTRY.get_or_init(|| ComponentRegistry::new(PropertySource::load()))
}

/// Resolve `C` against the process-wide registry.
pub fn resolve<C: Capability>() -> Result<Arc<C::Target>> {
    global().resolve::<C>()
}

/// Resolve every implementation bound to `C` against the process-wide registry.
pub fn resolve_all<C: Capability>() -> Result<Vec<Arc<C::Target>>> {
    global().resolve_all::<C>()
}

/// Run the process-wide teardown pass now, for hosts that do not rely on the
/// process-exit hook.
pub fn shutdown() -> usize {
    global().shutdown()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::Component;

    struct Heartbeat {
        beats: i32,
    }

    impl Capability for Heartbeat {
        const NAME: &'static str = "monitoring.test.Heartbeat";
        type Target = Heartbeat;
    }

    impl Component for Heartbeat {
        type Config = ();

        fn build(_: ()) -> anyhow::Result<Self> {
            Ok(Heartbeat { beats: 1 })
        }
    }

    #[test]
    fn test_global_registry_is_shared() {
        assert!(std::ptr::eq(global(), global()));

        global().provide::<Heartbeat, Heartbeat, _>(Heartbeat::NAME, |h| h);
        let heartbeat = resolve::<Heartbeat>().unwrap();
        assert_eq!(heartbeat.beats, 1);
        assert!(resolve_all::<Heartbeat>().unwrap().is_empty());
        assert_eq!(shutdown(), 0);
    }
}
