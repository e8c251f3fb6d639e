//! Component Registry
//!
//! This crate wires monitoring components from configuration instead of code:
//! - Capabilities are resolved to the implementation named by the property
//!   `<capability name>`, or to every name in a comma-separated list
//! - Components are built from a configuration struct filled from
//!   `<implementation name>.<field>` properties
//! - Post-construct hooks run before a component is handed out
//! - Pre-destroy hooks run exactly once, in registration order, either from
//!   an explicit [`shutdown`] or from a process-exit hook armed on demand
//!
//! # Reserved keys
//!
//! - `monitoring.shutdown.hook` (default `true`): whether the process-exit
//!   teardown hook may be armed. Teardown entries are recorded either way.
//!
//! # Example
//!
//! ```rust
//! use properties::PropertySource;
//! use registry::{Capability, Component, ComponentRegistry, Configure, Destroyable, FieldBinder};
//! use std::sync::Arc;
//!
//! pub trait Gauge: Send + Sync {
//!     fn value(&self) -> f64;
//! }
//!
//! pub struct GaugeCapability;
//! impl Capability for GaugeCapability {
//!     const NAME: &'static str = "acme.Gauge";
//!     type Target = dyn Gauge;
//! }
//!
//! #[derive(Default)]
//! pub struct ConstantConfig {
//!     value: i32,
//! }
//! impl Configure for ConstantConfig {
//!     fn configure(&mut self, binder: &FieldBinder<'_>) -> registry::Result<()> {
//!         binder.bind("value", &mut self.value)?;
//!         Ok(())
//!     }
//! }
//!
//! pub struct Constant(f64);
//! impl Component for Constant {
//!     type Config = ConstantConfig;
//!     fn build(config: ConstantConfig) -> anyhow::Result<Self> {
//!         Ok(Constant(config.value as f64))
//!     }
//!     fn into_destroyable(self: Arc<Self>) -> Option<Arc<dyn Destroyable>> {
//!         Some(self)
//!     }
//! }
//! impl Destroyable for Constant {
//!     fn destroy(&self) -> anyhow::Result<()> {
//!         Ok(())
//!     }
//! }
//! impl Gauge for Constant {
//!     fn value(&self) -> f64 {
//!         self.0
//!     }
//! }
//!
//! let props = PropertySource::from_pairs([
//!     ("acme.Gauge", "acme.Constant"),
//!     ("acme.Constant.value", "42"),
//!     ("monitoring.shutdown.hook", "false"),
//! ]);
//! let registry = ComponentRegistry::new(props);
//! registry.provide::<GaugeCapability, Constant, _>("acme.Constant", |c| c as Arc<dyn Gauge>);
//!
//! let gauge = registry.resolve::<GaugeCapability>().unwrap();
//! assert_eq!(gauge.value(), 42.0);
//! assert_eq!(registry.shutdown(), 1);
//! ```

mod component;
mod configure;
mod error;
mod global;
mod registry;
mod teardown;

pub use component::{Capability, Component, Destroyable, Initializable};
pub use configure::{Configure, FieldBinder};
pub use error::{RegistryError, Result};
pub use global::{global, resolve, resolve_all, shutdown};
pub use registry::{ComponentRegistry, SHUTDOWN_HOOK_KEY};
pub use teardown::{DestroyableEntry, ExitHook, ProcessExitHook, ShutdownCoordinator};
