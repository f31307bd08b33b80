use crate::{run, testing::Loop};
use sniff::{
    current_async_library,
    ext::*,
    overrides::{in_task_scope, task_override, task_scope},
    revert_override, set_task_override, with_task_override, Library,
};

#[test]
fn any_name_round_trips() {
    bolero::check!().with_type::<String>().for_each(|name| {
        assert!(current_async_library().is_err());

        task_scope(|| {
            let token = set_task_override(name.clone());
            assert_eq!(current_async_library().unwrap(), name.as_str());
            revert_override(token);

            assert!(current_async_library().is_err());
        });

        assert_eq!(
            with_task_override(name.clone(), current_async_library).unwrap(),
            name.as_str()
        );
    });
}

#[test]
fn any_name_round_trips_inside_runtime() {
    bolero::check!().with_type::<String>().for_each(|name| {
        Loop::asyncio().run(async {
            let token = set_task_override(name.clone());
            assert_eq!(current_async_library().unwrap(), name.as_str());
            revert_override(token);

            // the runtime is visible again once the override is gone
            assert_eq!(current_async_library().unwrap(), Library::ASYNCIO);
        });
    });
}

#[test]
fn nested_overrides() {
    run(|| {
        task_scope(|| {
            let a = set_task_override("a");
            assert_eq!(current_async_library().unwrap(), "a");

            let b = set_task_override("b");
            assert_eq!(current_async_library().unwrap(), "b");

            b.revert();
            assert_eq!(current_async_library().unwrap(), "a");

            a.revert();
            assert!(current_async_library().is_err());
        })
    })
}

#[test]
fn override_reverts_on_early_return() {
    fn scoped(fail: bool) -> Result<Library, &'static str> {
        let _token = set_task_override("scoped");
        if fail {
            return Err("failed");
        }
        Ok(current_async_library().unwrap())
    }

    run(|| {
        task_scope(|| {
            assert_eq!(scoped(false).unwrap(), "scoped");
            assert!(task_override().is_none());
            assert!(scoped(true).is_err());
            assert!(task_override().is_none());
        })
    })
}

#[test]
fn override_inside_task_is_scoped_to_the_task() {
    run(|| {
        let res = Loop::asyncio().run(async {
            let inner = async {
                let _token = set_task_override("inner");
                crate::testing::yield_now().await;
                current_async_library().unwrap()
            }
            .inherit_library()
            .await;

            (inner, current_async_library().unwrap())
        });

        assert_eq!(res, (Library::from("inner"), Library::ASYNCIO));
    })
}

#[test]
fn unscoped_set_is_rejected() {
    run(|| {
        assert!(!in_task_scope());
        let res = std::panic::catch_unwind(|| set_task_override("unscoped"));
        assert!(res.is_err());
        assert!(current_async_library().is_err());
    })
}
