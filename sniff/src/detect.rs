use crate::{
    error::NotFound,
    hook::{Hook, HookSource, InstalledHook},
    library::Library,
    overrides,
    registry::{Registry, Resolver},
    tracing::{debug, debug_span, trace},
};
use alloc::sync::Arc;

/// Determines the current async library from a hook source and a registry
///
/// The lookup order is the task override, then the thread override, then the
/// installed hook. How a hook resolves is cached by its identity.
#[derive(Clone, Debug)]
pub struct Detector<S = InstalledHook> {
    source: S,
    registry: Arc<Registry>,
}

impl Default for Detector<InstalledHook> {
    fn default() -> Self {
        Self::new(InstalledHook)
    }
}

impl<S: HookSource> Detector<S> {
    /// Creates a detector backed by the global registry
    pub fn new(source: S) -> Self {
        Self::with_registry(source, Registry::global().clone())
    }

    pub fn with_registry(source: S, registry: Arc<Registry>) -> Self {
        Self { source, registry }
    }

    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }

    pub fn current(&self) -> Result<Library, NotFound> {
        detect(&self.source, &self.registry)
    }
}

pub(crate) fn detect<S: HookSource + ?Sized>(
    source: &S,
    registry: &Registry,
) -> Result<Library, NotFound> {
    if let Some(library) = overrides::task_override() {
        return Ok(library);
    }

    if let Some(library) = overrides::thread_override() {
        return Ok(library);
    }

    let hook = source.installed_hook().ok_or_else(NotFound::new)?;

    let cache = registry.cache();
    let resolver = if let Some(resolver) = cache.resolve(hook.id()) {
        trace!(hook = %hook.id(), ?resolver, "cache hit");
        resolver
    } else {
        let resolver = infer(&hook, registry).ok_or_else(NotFound::new)?;
        cache.record(&hook, resolver)
    };

    resolver.resolve(&hook).ok_or_else(NotFound::new)
}

fn infer(hook: &Hook, registry: &Registry) -> Option<Resolver> {
    let span = debug_span!("infer", hook = %hook.id(), module = hook.module());
    span.in_scope(|| {
        crate::count!("sniff.infer");

        if let Some(resolver) = registry.module(hook.module()) {
            debug!(?resolver, "registered module");
            return Some(resolver);
        }

        for probe in registry.probes() {
            let running = match probe.running_loop() {
                Ok(running) => running,
                Err(_err) => {
                    trace!(err = %_err, "probe");
                    continue;
                }
            };

            if running.hook().id() != hook.id() {
                continue;
            }

            let resolver = Resolver::Fixed(running.family().clone());
            debug!(?resolver, "matched running loop");
            // other hooks declared by this module belong to the same family
            registry.register_if_absent(hook.module(), resolver.clone());
            return Some(resolver);
        }

        let root = root_module(hook.module())?;
        let resolver = Resolver::Fixed(Library::from(root.to_owned()));
        debug!(?resolver, "root module");
        Some(resolver)
    })
}

/// Returns the first segment of a module path
///
/// Both `::` and `.` separated paths are accepted.
fn root_module(module: &str) -> Option<&str> {
    module
        .split(|c: char| c == ':' || c == '.')
        .next()
        .map(str::trim)
        .filter(|root| !root.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        hook::COOPERATIVE_MODULE,
        probe::RunningLoop,
        registry::{ASYNCIO_MODULE, CURIO_MODULE},
    };
    use core::cell::RefCell;

    fn detector(hook: &RefCell<Option<Hook>>) -> Detector<impl Fn() -> Option<Hook> + '_> {
        crate::testing::init_tracing();
        Detector::with_registry(move || hook.borrow().clone(), Arc::new(Registry::new()))
    }

    #[test]
    fn root_module_test() {
        assert_eq!(root_module("someio::_core::run"), Some("someio"));
        assert_eq!(root_module("someio._core._run"), Some("someio"));
        assert_eq!(root_module("someio"), Some("someio"));
        assert_eq!(root_module(""), None);
        assert_eq!(root_module("::someio"), None);
    }

    #[test]
    fn no_hook_is_not_found() {
        let hook = RefCell::new(None);
        let detector = detector(&hook);
        assert_eq!(detector.current(), Err(NotFound::new()));
        // nothing was inferred so nothing was cached
        assert!(detector.registry().cache().is_empty());
    }

    #[test]
    fn well_known_modules() {
        let hook = RefCell::new(Some(Hook::new(ASYNCIO_MODULE)));
        let detector = detector(&hook);
        assert_eq!(detector.current().unwrap(), Library::ASYNCIO);

        *hook.borrow_mut() = Some(Hook::new(CURIO_MODULE));
        assert_eq!(detector.current().unwrap(), Library::CURIO);
    }

    #[test]
    fn second_call_hits_cache() {
        let hook = RefCell::new(Some(Hook::new("someio::_core::run")));
        let detector = detector(&hook);

        assert_eq!(detector.current().unwrap(), "someio");
        assert_eq!(detector.current().unwrap(), "someio");

        let stats = detector.registry().cache().stats();
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.entries, 1);
    }

    #[test]
    fn overrides_win() {
        let hook = RefCell::new(Some(Hook::new(ASYNCIO_MODULE)));
        let detector = detector(&hook);

        overrides::set_thread_override("thread-lib");
        assert_eq!(detector.current().unwrap(), "thread-lib");

        overrides::with_task_override("task-lib", || {
            assert_eq!(detector.current().unwrap(), "task-lib");
        });

        overrides::clear_thread_override();
        assert_eq!(detector.current().unwrap(), Library::ASYNCIO);
    }

    #[test]
    fn cooperative_hook_delegates() {
        let hook = RefCell::new(Some(Hook::cooperative()));
        let detector = detector(&hook);

        assert_eq!(detector.current(), Err(NotFound::new()));

        overrides::with_task_override("trio", || {
            assert_eq!(detector.current().unwrap(), Library::TRIO);
        });

        // the delegate stays cached rather than the override it returned
        assert!(matches!(
            detector.registry().cache().resolve(hook.borrow().as_ref().unwrap().id()),
            Some(Resolver::Delegate)
        ));
        assert_eq!(detector.current(), Err(NotFound::new()));
        assert_eq!(hook.borrow().as_ref().unwrap().module(), COOPERATIVE_MODULE);
    }

    #[test]
    fn custom_resolver_is_called_each_time() {
        use core::sync::atomic::{AtomicBool, Ordering};

        let hook = RefCell::new(Some(Hook::new("bridged::hooks")));
        let detector = detector(&hook);

        let guest_mode = Arc::new(AtomicBool::new(false));
        let mode = guest_mode.clone();
        detector.registry().register(
            "bridged::hooks",
            Resolver::custom(move |_| {
                if mode.load(Ordering::Relaxed) {
                    Some(Library::ASYNCIO)
                } else {
                    Some(Library::TRIO)
                }
            }),
        );

        assert_eq!(detector.current().unwrap(), Library::TRIO);
        guest_mode.store(true, Ordering::Relaxed);
        assert_eq!(detector.current().unwrap(), Library::ASYNCIO);
        guest_mode.store(false, Ordering::Relaxed);
        assert_eq!(detector.current().unwrap(), Library::TRIO);
    }

    #[test]
    fn running_loop_probe_matches_hook() {
        let uvloop = Hook::new("uvloop::loop");
        let hook = RefCell::new(Some(uvloop.clone()));
        let detector = detector(&hook);

        let running = RunningLoop::new(Library::ASYNCIO, uvloop.clone());
        running.enter(|| {
            assert_eq!(detector.current().unwrap(), Library::ASYNCIO);
        });

        // the module is remembered for other loops of the same implementation
        assert_eq!(
            detector.registry().module("uvloop::loop").unwrap().fixed(),
            Some(&Library::ASYNCIO)
        );
        *hook.borrow_mut() = Some(Hook::new("uvloop::loop"));
        assert_eq!(detector.current().unwrap(), Library::ASYNCIO);
    }

    #[test]
    fn finished_loops_leave_no_entries() {
        let hook = RefCell::new(None);
        let detector = detector(&hook);

        for _ in 0..1000 {
            *hook.borrow_mut() = Some(Hook::new(ASYNCIO_MODULE));
            assert_eq!(detector.current().unwrap(), Library::ASYNCIO);
        }

        let stats = detector.registry().cache().stats();
        assert_eq!(stats.misses, 1000);
        assert_eq!(stats.entries, 1);

        *hook.borrow_mut() = None;
        assert!(detector.registry().cache().is_empty());
    }

    #[test]
    fn resolution_before_running_loop_is_kept() {
        let early = Hook::new("lateloop::loop");
        let hook = RefCell::new(Some(early.clone()));
        let detector = detector(&hook);

        // queried before the loop reports itself as running
        assert_eq!(detector.current().unwrap(), "lateloop");
        RunningLoop::new(Library::ASYNCIO, early.clone()).enter(|| {
            assert_eq!(detector.current().unwrap(), "lateloop");
        });

        // a loop that is running before its hook is queried is matched
        let ordered = Hook::new("lateloop::loop");
        *hook.borrow_mut() = Some(ordered.clone());
        RunningLoop::new(Library::ASYNCIO, ordered).enter(|| {
            assert_eq!(detector.current().unwrap(), Library::ASYNCIO);
        });
    }

    #[test]
    fn mismatched_running_loop_falls_back() {
        let hook = RefCell::new(Some(Hook::new("someio::hooks")));
        let detector = detector(&hook);

        let running = RunningLoop::new(Library::ASYNCIO, Hook::new("uvloop::loop"));
        running.enter(|| {
            assert_eq!(detector.current().unwrap(), "someio");
        });
    }

    #[test]
    fn empty_module_is_not_found() {
        let hook = RefCell::new(Some(Hook::new("")));
        let detector = detector(&hook);
        assert_eq!(detector.current(), Err(NotFound::new()));
    }
}
