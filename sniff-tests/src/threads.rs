use crate::{run, testing::Loop};
use sniff::{
    clear_thread_override, current_async_library,
    overrides::{task_override, task_scope, thread_override},
    set_task_override, set_thread_override, with_task_override, Library,
};
use std::sync::{Arc, Barrier};

#[test]
fn thread_override_round_trip() {
    run(|| {
        assert!(current_async_library().is_err());

        assert_eq!(set_thread_override("generic-lib"), None);
        assert_eq!(current_async_library().unwrap(), "generic-lib");
        assert_eq!(clear_thread_override().as_deref(), Some("generic-lib"));

        assert!(current_async_library().is_err());
    })
}

#[test]
fn thread_override_is_invisible_to_other_threads() {
    run(|| {
        let barrier = Arc::new(Barrier::new(2));

        let setter = {
            let barrier = barrier.clone();
            std::thread::spawn(move || {
                set_thread_override("t1-lib");
                barrier.wait();
                // wait for the other thread to query
                barrier.wait();
                current_async_library().unwrap()
            })
        };

        let observer = std::thread::spawn(move || {
            barrier.wait();
            let seen = current_async_library();
            barrier.wait();
            seen
        });

        assert_eq!(setter.join().unwrap(), "t1-lib");
        assert!(observer.join().unwrap().is_err());
    })
}

#[test]
fn new_threads_start_empty() {
    run(|| {
        set_thread_override("parent-lib");

        let (thread, task) = with_task_override("parent-task", || {
            std::thread::spawn(|| (thread_override(), task_override()))
                .join()
                .unwrap()
        });

        assert_eq!(thread, None);
        assert_eq!(task, None);
        clear_thread_override();
    })
}

#[test]
fn task_override_beats_thread_override() {
    run(|| {
        set_thread_override("thread-lib");

        task_scope(|| {
            let token = set_task_override("task-lib");
            assert_eq!(current_async_library().unwrap(), "task-lib");
            drop(token);
            assert_eq!(current_async_library().unwrap(), "thread-lib");
        });

        assert_eq!(current_async_library().unwrap(), "thread-lib");
        clear_thread_override();
    })
}

#[test]
fn thread_override_beats_runtime_hook() {
    run(|| {
        let res = Loop::asyncio().run(async {
            set_thread_override(Library::TWISTED);
            let with_override = current_async_library().unwrap();
            clear_thread_override();
            (with_override, current_async_library().unwrap())
        });
        assert_eq!(res, (Library::TWISTED, Library::ASYNCIO));
    })
}

#[test]
fn concurrent_loops_on_many_threads() {
    run(|| {
        let handles: Vec<_> = (0..8)
            .map(|i| {
                std::thread::spawn(move || {
                    let rt = if i % 2 == 0 {
                        Loop::asyncio()
                    } else {
                        Loop::curio()
                    };
                    let res = rt.run(async {
                        (0..100)
                            .map(|_| current_async_library().unwrap())
                            .collect::<Vec<_>>()
                    });
                    (i, res)
                })
            })
            .collect();

        for handle in handles {
            let (i, res) = handle.join().unwrap();
            let expected = if i % 2 == 0 {
                Library::ASYNCIO
            } else {
                Library::CURIO
            };
            assert!(res.iter().all(|lib| *lib == expected), "{i}: {res:?}");
        }
    })
}
