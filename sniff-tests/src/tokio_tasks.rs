use crate::testing::init_tracing;
use sniff::{current_async_library, ext::*, set_task_override, Library};
use tokio::task::yield_now;

#[tokio::test]
async fn sibling_tasks_are_isolated() {
    init_tracing();

    let tasks: Vec<_> = ["a", "b", "c"]
        .into_iter()
        .map(|name| {
            tokio::spawn(
                async move {
                    for _ in 0..10 {
                        assert_eq!(current_async_library().unwrap(), name);
                        yield_now().await;
                    }
                }
                .with_library(name),
            )
        })
        .collect();

    let untagged = tokio::spawn(async {
        for _ in 0..10 {
            assert!(current_async_library().is_err());
            yield_now().await;
        }
    });

    for task in tasks {
        task.await.unwrap();
    }
    untagged.await.unwrap();
}

#[tokio::test]
async fn children_inherit_at_spawn() {
    init_tracing();

    async {
        let inherited = tokio::spawn(
            async {
                yield_now().await;
                current_async_library().unwrap()
            }
            .inherit_library(),
        );

        let detached = tokio::spawn(async {
            yield_now().await;
            current_async_library().is_err()
        });

        // changing the parent after spawning doesn't affect the child
        let token = set_task_override("changed");
        assert_eq!(current_async_library().unwrap(), "changed");
        token.revert();

        assert_eq!(inherited.await.unwrap(), "parent");
        assert!(detached.await.unwrap());
        assert_eq!(current_async_library().unwrap(), "parent");
    }
    .with_library("parent")
    .await;

    assert!(current_async_library().is_err());
}

#[tokio::test]
async fn nested_scopes_in_one_task() {
    init_tracing();

    let outer = async {
        let inner = async {
            yield_now().await;
            current_async_library().unwrap()
        }
        .with_library(Library::CURIO)
        .await;

        (inner, current_async_library().unwrap())
    }
    .with_library(Library::ASYNCIO)
    .await;

    assert_eq!(outer, (Library::CURIO, Library::ASYNCIO));
}

#[tokio::test]
async fn local_siblings_are_isolated() {
    init_tracing();

    let local = tokio::task::LocalSet::new();
    local
        .run_until(async {
            let holder = tokio::task::spawn_local(
                async {
                    let _token = set_task_override("held");
                    yield_now().await;
                    yield_now().await;
                    current_async_library().unwrap()
                }
                .inherit_library(),
            );

            let sibling = tokio::task::spawn_local(async {
                yield_now().await;
                current_async_library()
            });

            let scoped_sibling = tokio::task::spawn_local(
                async {
                    yield_now().await;
                    current_async_library()
                }
                .inherit_library(),
            );

            assert_eq!(holder.await.unwrap(), "held");
            assert!(sibling.await.unwrap().is_err());
            assert!(scoped_sibling.await.unwrap().is_err());
        })
        .await;
}
