//! Capabilities, components and their lifecycle hooks

use crate::configure::Configure;
use std::sync::Arc;

/// An abstract role that callers resolve components by.
///
/// `NAME` is the qualified capability name. It is also the property key
/// whose value names the implementation(s) to build, and the name under
/// which a concrete capability provides itself.
///
/// ```rust
/// use registry::Capability;
///
/// pub trait Gauge: Send + Sync {
///     fn value(&self) -> f64;
/// }
///
/// pub struct GaugeCapability;
///
/// impl Capability for GaugeCapability {
///     const NAME: &'static str = "acme.monitoring.Gauge";
///     type Target = dyn Gauge;
/// }
/// ```
pub trait Capability: 'static {
    /// Qualified capability name
    const NAME: &'static str;

    /// Type handed out by the registry, usually a trait object
    type Target: ?Sized + Send + Sync + 'static;
}

/// A concrete type the registry can build.
///
/// The registry populates [`Component::Config`] from properties, calls
/// [`Component::build`], then runs the lifecycle hooks the component exposes.
pub trait Component: Sized + Send + Sync + 'static {
    /// Settings read from `<implementation>.<field>` properties
    type Config: Configure;

    /// Construct the component from its configuration.
    fn build(config: Self::Config) -> anyhow::Result<Self>;

    /// Post-construct hook, if the component has one.
    fn initializable(&mut self) -> Option<&mut dyn Initializable> {
        None
    }

    /// Pre-destroy hook, if the component has one.
    fn into_destroyable(self: Arc<Self>) -> Option<Arc<dyn Destroyable>> {
        None
    }
}

/// Post-construct hook, run once before the component is handed out.
pub trait Initializable {
    fn initialize(&mut self) -> anyhow::Result<()>;
}

/// Pre-destroy hook, run once by the teardown pass.
pub trait Destroyable: Send + Sync {
    fn destroy(&self) -> anyhow::Result<()>;
}
