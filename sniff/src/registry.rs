//! Process-wide tables used by inference
//!
//! Runtime integrators register a [`Resolver`] for the module that declares
//! their finalizer hook, or a [`Probe`] for a family of loops. Registration
//! only affects hooks that haven't been resolved yet, so it should happen
//! before the runtime installs its hook.

use crate::{
    cache::Cache,
    hook::{Hook, COOPERATIVE_MODULE},
    library::Library,
    overrides,
    probe::{Probe, ThreadLoopProbe},
};
use alloc::{borrow::Cow, sync::Arc};
use core::fmt;
use std::{
    collections::HashMap,
    sync::{OnceLock, RwLock},
};

/// The module declaring the finalizer hook of the asyncio base event loop
pub const ASYNCIO_MODULE: &str = "asyncio::base_events";

/// The module declaring the curio finalizer hook
pub const CURIO_MODULE: &str = "curio::meta";

/// How a hook maps to a [`Library`]
#[derive(Clone)]
pub enum Resolver {
    /// Always resolves to the given library
    Fixed(Library),
    /// Defers to the task and thread overrides
    Delegate,
    /// Calls the function each time the hook is seen
    Custom(Arc<dyn Fn(&Hook) -> Option<Library> + Send + Sync>),
}

impl Resolver {
    pub fn custom<F>(f: F) -> Self
    where
        F: 'static + Fn(&Hook) -> Option<Library> + Send + Sync,
    {
        Self::Custom(Arc::new(f))
    }

    pub fn fixed(&self) -> Option<&Library> {
        match self {
            Self::Fixed(library) => Some(library),
            _ => None,
        }
    }

    pub(crate) fn resolve(&self, hook: &Hook) -> Option<Library> {
        match self {
            Self::Fixed(library) => Some(library.clone()),
            Self::Delegate => overrides::lookup(),
            Self::Custom(f) => f(hook),
        }
    }
}

impl fmt::Debug for Resolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fixed(library) => f.debug_tuple("Fixed").field(library).finish(),
            Self::Delegate => f.write_str("Delegate"),
            Self::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

pub struct Registry {
    modules: RwLock<HashMap<Cow<'static, str>, Resolver>>,
    probes: RwLock<Vec<Arc<dyn Probe>>>,
    cache: Cache,
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("modules", &*self.modules.read().unwrap())
            .field("probes", &self.probes.read().unwrap().len())
            .field("cache", &self.cache)
            .finish()
    }
}

impl Registry {
    /// Creates a registry that knows about the well-known runtimes
    pub fn new() -> Self {
        let registry = Self::empty();
        registry.register(ASYNCIO_MODULE, Resolver::Fixed(Library::ASYNCIO));
        registry.register(CURIO_MODULE, Resolver::Fixed(Library::CURIO));
        registry.register(COOPERATIVE_MODULE, Resolver::Delegate);
        registry.register_probe(ThreadLoopProbe);
        registry
    }

    /// Creates a registry without any modules or probes
    pub fn empty() -> Self {
        Self {
            modules: Default::default(),
            probes: Default::default(),
            cache: Cache::new(),
        }
    }

    /// Returns the registry used by [`current_async_library`](crate::current_async_library)
    pub fn global() -> &'static Arc<Registry> {
        static GLOBAL: OnceLock<Arc<Registry>> = OnceLock::new();
        GLOBAL.get_or_init(|| Arc::new(Registry::new()))
    }

    /// Registers the resolver for hooks declared by `module`
    ///
    /// Returns the resolver that was previously registered, if any.
    pub fn register<M: Into<Cow<'static, str>>>(
        &self,
        module: M,
        resolver: Resolver,
    ) -> Option<Resolver> {
        self.modules
            .write()
            .unwrap()
            .insert(module.into(), resolver)
    }

    pub(crate) fn register_if_absent(&self, module: &str, resolver: Resolver) {
        self.modules
            .write()
            .unwrap()
            .entry(Cow::Owned(module.to_owned()))
            .or_insert(resolver);
    }

    pub fn register_probe<P: Probe>(&self, probe: P) {
        self.probes.write().unwrap().push(Arc::new(probe));
    }

    pub fn module(&self, module: &str) -> Option<Resolver> {
        self.modules.read().unwrap().get(module).cloned()
    }

    pub(crate) fn probes(&self) -> Vec<Arc<dyn Probe>> {
        self.probes.read().unwrap().clone()
    }

    pub fn cache(&self) -> &Cache {
        &self.cache
    }
}

/// Registers a resolver with the global registry
pub fn register<M: Into<Cow<'static, str>>>(module: M, resolver: Resolver) -> Option<Resolver> {
    Registry::global().register(module, resolver)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seeded_modules() {
        let registry = Registry::new();
        assert_eq!(
            registry.module(ASYNCIO_MODULE).unwrap().fixed(),
            Some(&Library::ASYNCIO)
        );
        assert_eq!(
            registry.module(CURIO_MODULE).unwrap().fixed(),
            Some(&Library::CURIO)
        );
        assert!(matches!(
            registry.module(COOPERATIVE_MODULE),
            Some(Resolver::Delegate)
        ));
        assert_eq!(registry.probes().len(), 1);

        let empty = Registry::empty();
        assert!(empty.module(ASYNCIO_MODULE).is_none());
        assert!(empty.probes().is_empty());
    }

    #[test]
    fn register_replaces_and_if_absent_keeps() {
        let registry = Registry::empty();
        assert!(registry
            .register("someio::hooks", Resolver::Fixed("someio".into()))
            .is_none());

        registry.register_if_absent("someio::hooks", Resolver::Fixed("other".into()));
        assert_eq!(
            registry.module("someio::hooks").unwrap().fixed(),
            Some(&Library::from("someio"))
        );

        let previous = registry.register("someio::hooks", Resolver::Fixed("renamed".into()));
        assert_eq!(previous.unwrap().fixed(), Some(&Library::from("someio")));
    }

    #[test]
    fn custom_resolver_sees_hook() {
        let resolver = Resolver::custom(|hook| {
            hook.module()
                .ends_with("guest")
                .then_some(Library::from("guestio"))
        });
        assert_eq!(
            resolver.resolve(&Hook::new("guestio::guest")).as_deref(),
            Some("guestio")
        );
        assert_eq!(resolver.resolve(&Hook::new("guestio::host")), None);
    }
}
