use crate::{run, testing::Loop};
use sniff::{
    current_async_library,
    hook::Hook,
    probe::{NoRunningLoop, RunningLoop},
    register, Detector, Library, Registry, Resolver,
};
use std::sync::{
    atomic::{AtomicBool, AtomicUsize, Ordering},
    Arc,
};

#[test]
fn registered_module_resolves_before_hook_install() {
    run(|| {
        let previous = register(
            "twisted::internet::asyncioreactor",
            Resolver::Fixed(Library::TWISTED),
        );
        assert!(previous.is_none());

        let res = Loop::new("twisted::internet::asyncioreactor")
            .run(async { current_async_library().unwrap() });
        assert_eq!(res, Library::TWISTED);
    })
}

#[test]
fn custom_resolver_layers_mode_detection() {
    static GUEST: AtomicBool = AtomicBool::new(false);

    run(|| {
        register(
            "bridgeio::hooks",
            Resolver::custom(|_| {
                if GUEST.load(Ordering::Relaxed) {
                    Some(Library::ASYNCIO)
                } else {
                    Some(Library::from("bridgeio"))
                }
            }),
        );

        let res = Loop::new("bridgeio::hooks").run(async {
            let native = current_async_library().unwrap();
            GUEST.store(true, Ordering::Relaxed);
            let guest = current_async_library().unwrap();
            GUEST.store(false, Ordering::Relaxed);
            (native, guest)
        });
        assert_eq!(res, (Library::from("bridgeio"), Library::ASYNCIO));
    })
}

#[test]
fn injected_hook_source() {
    run(|| {
        let hook = Hook::new("mockio::hooks");
        let detector = Detector::with_registry(
            {
                let hook = hook.clone();
                move || Some(hook.clone())
            },
            Arc::new(Registry::empty()),
        );

        assert_eq!(detector.current().unwrap(), "mockio");
        assert_eq!(detector.current().unwrap(), "mockio");

        let stats = detector.registry().cache().stats();
        assert_eq!((stats.hits, stats.misses, stats.entries), (1, 1, 1));

        // the hook is only visible through the injected source
        assert!(current_async_library().is_err());
    })
}

#[test]
fn probe_is_asked_once_per_hook() {
    run(|| {
        let calls = Arc::new(AtomicUsize::new(0));
        let hook = Hook::new("probedio::loop");

        let registry = Arc::new(Registry::empty());
        registry.register_probe({
            let calls = calls.clone();
            let hook = hook.clone();
            move || -> Result<RunningLoop, NoRunningLoop> {
                calls.fetch_add(1, Ordering::Relaxed);
                Ok(RunningLoop::new("probed", hook.clone()))
            }
        });

        let detector = Detector::with_registry(
            {
                let hook = hook.clone();
                move || Some(hook.clone())
            },
            registry,
        );

        for _ in 0..10 {
            assert_eq!(detector.current().unwrap(), "probed");
        }
        assert_eq!(calls.load(Ordering::Relaxed), 1);
    })
}

#[test]
fn failing_probe_falls_through() {
    run(|| {
        let registry = Arc::new(Registry::empty());
        registry.register_probe(|| -> Result<RunningLoop, NoRunningLoop> {
            Err(NoRunningLoop::new())
        });

        let detector = Detector::with_registry(|| Some(Hook::new("lateio::run")), registry);
        assert_eq!(detector.current().unwrap(), "lateio");
    })
}
