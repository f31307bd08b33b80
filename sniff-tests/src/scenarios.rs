use crate::{
    run,
    testing::{yield_now, Loop},
};
use sniff::{
    current_async_library, ext::*, overrides::task_scope, set_task_override, Library, Registry,
};

fn not_found() {
    let err = current_async_library().unwrap_err();
    assert_eq!(
        err.to_string(),
        "unknown async library, or not in async context"
    );
}

#[test]
fn nothing_running() {
    run(|| {
        not_found();
        assert_eq!(sniff::try_current(), None);
        assert!(!sniff::is_active());
    })
}

#[test]
fn active_inside_loop() {
    run(|| {
        let res = Loop::asyncio().run(async { (sniff::is_active(), sniff::try_current()) });
        assert_eq!(res, (true, Some(Library::ASYNCIO)));
    })
}

#[test]
fn asyncio() {
    run(|| {
        not_found();

        let res = Loop::asyncio().run(async {
            let first = current_async_library().unwrap();
            // call it a second time to go through the cache
            let second = current_async_library().unwrap();
            (first, second)
        });
        assert_eq!(res, (Library::ASYNCIO, Library::ASYNCIO));

        not_found();
    })
}

#[test]
fn curio() {
    run(|| {
        not_found();

        let res = Loop::curio().run(async {
            yield_now().await;
            let first = current_async_library().unwrap();
            yield_now().await;
            let second = current_async_library().unwrap();
            (first, second)
        });
        assert_eq!(res, (Library::CURIO, Library::CURIO));

        not_found();
    })
}

#[test]
fn generic_lib_override() {
    run(|| {
        not_found();

        task_scope(|| {
            let token = set_task_override("generic-lib");
            assert_eq!(current_async_library().unwrap(), "generic-lib");
            token.revert();

            not_found();
        });

        not_found();
    })
}

#[test]
fn cached_after_first_call() {
    run(|| {
        let rt = Loop::new("cachedio::runtime");
        let hook = rt.hook().id();
        let cache = Registry::global().cache();

        rt.run(async {
            assert!(cache.resolve(hook).is_none());
            assert_eq!(current_async_library().unwrap(), "cachedio");
            assert!(cache.resolve(hook).is_some());
            assert_eq!(current_async_library().unwrap(), "cachedio");
        });
    })
}

#[test]
fn finished_loops_are_evicted() {
    run(|| {
        let cache = Registry::global().cache();

        for _ in 0..1000 {
            let res = Loop::asyncio().run(async { current_async_library().unwrap() });
            assert_eq!(res, Library::ASYNCIO);
        }

        // only loops still running on other test threads remain
        assert!(cache.len() < 100, "{:?}", cache.stats());
    })
}

#[test]
fn asyncio_in_curio() {
    run(|| {
        let res = Loop::curio().run(async {
            let outer = current_async_library().unwrap();
            let inner = Loop::asyncio().run(async { current_async_library().unwrap() });
            let after = current_async_library().unwrap();
            (outer, inner, after)
        });
        assert_eq!(res, (Library::CURIO, Library::ASYNCIO, Library::CURIO));
    })
}

#[test]
fn curio_in_asyncio() {
    run(|| {
        let res = Loop::asyncio().run(async {
            let outer = current_async_library().unwrap();
            yield_now().await;
            let inner = Loop::curio().run(async {
                yield_now().await;
                current_async_library().unwrap()
            });
            yield_now().await;
            let after = current_async_library().unwrap();
            (outer, inner, after)
        });
        assert_eq!(res, (Library::ASYNCIO, Library::CURIO, Library::ASYNCIO));
    })
}

#[test]
fn curio_in_asyncio_worker_thread() {
    run(|| {
        let res = Loop::asyncio().run(async {
            let outer = current_async_library().unwrap();
            let inner = std::thread::spawn(|| Loop::curio().run(async { current_async_library() }))
                .join()
                .unwrap()
                .unwrap();
            (outer, inner)
        });
        assert_eq!(res, (Library::ASYNCIO, Library::CURIO));
    })
}

#[test]
fn asyncio_compatible_loop() {
    run(|| {
        not_found();

        // the hook lives in a third-party module but the loop is an asyncio loop
        let res = Loop::new("fastloop::loop")
            .running_as(Library::ASYNCIO)
            .run(async {
                let first = current_async_library().unwrap();
                let second = current_async_library().unwrap();
                (first, second)
            });
        assert_eq!(res, (Library::ASYNCIO, Library::ASYNCIO));

        // later loops from the same module are recognized from the module alone
        let res = Loop::new("fastloop::loop").run(async { current_async_library().unwrap() });
        assert_eq!(res, Library::ASYNCIO);

        not_found();
    })
}

#[test]
fn unknown_runtime_uses_root_module() {
    run(|| {
        let res = Loop::new("someio::_core::run").run(async { current_async_library().unwrap() });
        assert_eq!(res, "someio");
    })
}

#[test]
fn cooperative_runtime() {
    run(|| {
        let res = Loop::cooperative(Library::TRIO).run(async {
            let in_task = current_async_library().unwrap();
            let nested = async { current_async_library().unwrap() }
                .with_library(Library::TWISTED)
                .await;
            let after = current_async_library().unwrap();
            (in_task, nested, after)
        });
        assert_eq!(res, (Library::TRIO, Library::TWISTED, Library::TRIO));
    })
}

#[test]
fn cooperative_hook_without_override() {
    run(|| {
        // a cooperative hook alone doesn't identify anything
        let res = Loop::new(sniff::hook::COOPERATIVE_MODULE).run(async { current_async_library() });
        assert!(res.is_err());
    })
}

#[test]
fn nested_runtimes_prefer_innermost_override() {
    run(|| {
        let res = Loop::cooperative(Library::TRIO).run(async {
            let inner = Loop::cooperative("guestio").run(async { current_async_library().unwrap() });
            let after = current_async_library().unwrap();
            (inner, after)
        });
        assert_eq!(res, (Library::from("guestio"), Library::TRIO));
    })
}
