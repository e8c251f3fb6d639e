//! Component registry
//!
//! Maps capabilities to the implementations provided for them and builds
//! instances on request. Which implementation is built is decided by the
//! property named after the capability, so wiring changes with configuration
//! rather than with code.

use crate::component::{Capability, Component, Destroyable, Initializable};
use crate::configure::{Configure, FieldBinder};
use crate::error::{RegistryError, Result};
use crate::teardown::{ExitHook, ProcessExitHook, ShutdownCoordinator};
use properties::PropertySource;
use std::any::{Any, TypeId};
use std::cell::RefCell;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};

/// Policy key: whether a process-exit teardown hook may be armed.
pub const SHUTDOWN_HOOK_KEY: &str = "monitoring.shutdown.hook";

/// Output of a factory: the instance and its teardown view, if any.
struct Built<T: ?Sized> {
    instance: Arc<T>,
    destroyable: Option<Arc<dyn Destroyable>>,
}

type Factory<T> = Arc<dyn Fn(&PropertySource, &str) -> Result<Built<T>> + Send + Sync>;

/// Resolves capabilities to configured component instances.
///
/// # Example
///
/// ```rust
/// use properties::PropertySource;
/// use registry::{Capability, Component, ComponentRegistry};
/// use std::sync::Arc;
///
/// pub trait Greeter: Send + Sync {
///     fn greet(&self) -> String;
/// }
///
/// struct GreeterCapability;
/// impl Capability for GreeterCapability {
///     const NAME: &'static str = "demo.Greeter";
///     type Target = dyn Greeter;
/// }
///
/// #[derive(Default)]
/// struct Loud;
/// impl Component for Loud {
///     type Config = ();
///     fn build(_: ()) -> anyhow::Result<Self> {
///         Ok(Loud)
///     }
/// }
/// impl Greeter for Loud {
///     fn greet(&self) -> String {
///         "HELLO".to_string()
///     }
/// }
///
/// let properties = PropertySource::from_pairs([("demo.Greeter", "demo.Loud")]);
/// let registry = ComponentRegistry::new(properties);
/// registry.provide::<GreeterCapability, Loud, _>("demo.Loud", |g| g as Arc<dyn Greeter>);
///
/// let greeter = registry.resolve::<GreeterCapability>().unwrap();
/// assert_eq!(greeter.greet(), "HELLO");
/// ```
pub struct ComponentRegistry {
    properties: PropertySource,
    /// Factories keyed by capability and implementation name
    implementations: RwLock<HashMap<(TypeId, String), Box<dyn Any + Send + Sync>>>,
    /// Implementation used when a capability has no binding
    defaults: RwLock<HashMap<TypeId, String>>,
    /// Serializes construction, hooks and teardown registration
    construction: Mutex<()>,
    teardown: Arc<ShutdownCoordinator>,
}

impl ComponentRegistry {
    /// Create a registry that arms a process-exit teardown hook on demand.
    ///
    /// Meant for long-lived registries: once armed, the teardown state stays
    /// referenced until the process exits. Use
    /// [`with_exit_hook`](Self::with_exit_hook) for short-lived ones.
    pub fn new(properties: PropertySource) -> Self {
        Self::with_exit_hook(properties, ProcessExitHook)
    }

    /// Create a registry with a custom process-lifecycle facility.
    pub fn with_exit_hook(properties: PropertySource, exit_hook: impl ExitHook + 'static) -> Self {
        Self {
            properties,
            implementations: RwLock::new(HashMap::new()),
            defaults: RwLock::new(HashMap::new()),
            construction: Mutex::new(()),
            teardown: ShutdownCoordinator::new(exit_hook),
        }
    }

    /// The properties this registry resolves against.
    pub fn properties(&self) -> &PropertySource {
        &self.properties
    }

    /// The teardown coordinator of this registry.
    pub fn teardown(&self) -> &Arc<ShutdownCoordinator> {
        &self.teardown
    }

    /// Provide component `T` as implementation `name` of capability `C`.
    ///
    /// `cast` converts the built component into the capability's target
    /// type, typically an unsizing `|c| c as Arc<dyn Trait>`. Providing the
    /// same name twice replaces the earlier factory.
    pub fn provide<C, T, F>(&self, name: impl Into<String>, cast: F)
    where
        C: Capability,
        T: Component,
        F: Fn(Arc<T>) -> Arc<C::Target> + Send + Sync + 'static,
    {
        let factory: Factory<C::Target> = Arc::new(
            move |properties: &PropertySource, name: &str| -> Result<Built<C::Target>> {
                let mut config = T::Config::default();
                config.configure(&FieldBinder::new(properties, name))?;

                let mut component = T::build(config).map_err(|source| RegistryError::Construction {
                    name: name.to_string(),
                    source,
                })?;
                if let Some(hook) = component.initializable() {
                    initialize(hook, name)?;
                }

                let component = Arc::new(component);
                let destroyable = Arc::clone(&component).into_destroyable();
                Ok(Built {
                    instance: cast(component),
                    destroyable,
                })
            },
        );

        self.implementations
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert((TypeId::of::<C>(), name.into()), Box::new(factory));
    }

    /// Provide `T` as implementation `name` of `C` and make it the one built
    /// when no binding for `C` is configured.
    pub fn provide_default<C, T, F>(&self, name: impl Into<String>, cast: F)
    where
        C: Capability,
        T: Component,
        F: Fn(Arc<T>) -> Arc<C::Target> + Send + Sync + 'static,
    {
        let name = name.into();
        self.provide::<C, T, F>(name.clone(), cast);
        self.defaults
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(TypeId::of::<C>(), name);
    }

    /// Returns `true` if implementation `name` is provided for `C`.
    pub fn is_provided<C: Capability>(&self, name: &str) -> bool {
        self.factory::<C>(name).is_some()
    }

    /// Build the implementation bound to `C`.
    ///
    /// The binding is the property named `C::NAME`; without one the default
    /// implementation is used, and without a default the capability's own
    /// name. A bound name that is not provided falls back to the capability
    /// itself.
    pub fn resolve<C: Capability>(&self) -> Result<Arc<C::Target>> {
        let name = match self.properties.get_opt(C::NAME) {
            Some(name) => name.trim().to_string(),
            None => self
                .defaults
                .read()
                .unwrap_or_else(PoisonError::into_inner)
                .get(&TypeId::of::<C>())
                .cloned()
                .unwrap_or_else(|| C::NAME.to_string()),
        };
        self.construct::<C>(&name)
    }

    /// Build every implementation in the comma-separated binding of `C`.
    ///
    /// Returns an empty list when `C` has no binding; there is no default.
    pub fn resolve_all<C: Capability>(&self) -> Result<Vec<Arc<C::Target>>> {
        let Some(names) = self.properties.get_opt(C::NAME) else {
            return Ok(Vec::new());
        };

        names
            .split(',')
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(|name| self.construct::<C>(name))
            .collect()
    }

    /// Run the teardown pass now. Returns the number of hooks run.
    pub fn shutdown(&self) -> usize {
        self.teardown.shutdown()
    }

    /// Take the construction lock unless this thread already holds it, so a
    /// component may resolve other components while being built.
    fn lock_construction(&self) -> ConstructionLock<'_> {
        let key = self as *const Self as usize;
        if HELD_LOCKS.with(|held| held.borrow().contains(&key)) {
            return ConstructionLock { guard: None, key };
        }

        let guard = self
            .construction
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        HELD_LOCKS.with(|held| held.borrow_mut().push(key));
        ConstructionLock {
            guard: Some(guard),
            key,
        }
    }

    fn factory<C: Capability>(&self, name: &str) -> Option<Factory<C::Target>> {
        self.implementations
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&(TypeId::of::<C>(), name.to_string()))
            .and_then(|factory| factory.downcast_ref::<Factory<C::Target>>())
            .cloned()
    }

    fn construct<C: Capability>(&self, name: &str) -> Result<Arc<C::Target>> {
        let _construction = self.lock_construction();

        let (factory, built_name) = match self.factory::<C>(name) {
            Some(factory) => (factory, name),
            None => {
                let factory = self
                    .factory::<C>(C::NAME)
                    .ok_or_else(|| RegistryError::not_found(C::NAME, name))?;
                tracing::debug!(
                    capability = C::NAME,
                    implementation = name,
                    "Implementation not provided, building the capability itself"
                );
                (factory, C::NAME)
            }
        };

        // The policy must be valid before anything is built.
        let install_hook = self.properties.get_bool(SHUTDOWN_HOOK_KEY, true)?;
        let built = factory(&self.properties, built_name)?;
        if let Some(destroyable) = built.destroyable {
            self.teardown.register(built_name, destroyable, install_hook);
        }

        tracing::debug!(capability = C::NAME, implementation = built_name, "Resolved component");
        Ok(built.instance)
    }
}

thread_local! {
    /// Registries whose construction lock is held by the current thread.
    static HELD_LOCKS: RefCell<Vec<usize>> = const { RefCell::new(Vec::new()) };
}

struct ConstructionLock<'a> {
    guard: Option<MutexGuard<'a, ()>>,
    key: usize,
}

impl Drop for ConstructionLock<'_> {
    fn drop(&mut self) {
        if self.guard.is_some() {
            HELD_LOCKS.with(|held| held.borrow_mut().retain(|key| *key != self.key));
        }
    }
}

fn initialize(hook: &mut dyn Initializable, name: &str) -> Result<()> {
    hook.initialize()
        .map_err(|source| RegistryError::Initialization {
            name: name.to_string(),
            source,
        })
}

impl std::fmt::Debug for ComponentRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let implementations = self
            .implementations
            .read()
            .map(|map| map.len())
            .unwrap_or_default();
        f.debug_struct("ComponentRegistry")
            .field("implementations", &implementations)
            .field("teardown", &self.teardown)
            .finish_non_exhaustive()
    }
}
