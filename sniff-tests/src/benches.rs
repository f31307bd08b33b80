use crate::testing::Loop;
use criterion::Criterion;
use sniff::{current_async_library, set_thread_override, with_task_override, Library};
use std::hint::black_box;

pub fn run(c: &mut Criterion) {
    detect(c);
}

fn detect(c: &mut Criterion) {
    let mut group = c.benchmark_group("detect");

    group.bench_function("task_override", |b| {
        with_task_override("bench", || b.iter(|| black_box(current_async_library())))
    });

    group.bench_function("thread_override", |b| {
        set_thread_override("bench");
        b.iter(|| black_box(current_async_library()));
        sniff::clear_thread_override();
    });

    group.bench_function("cached_hook", |b| {
        Loop::asyncio().run(async {
            assert_eq!(current_async_library().unwrap(), Library::ASYNCIO);
            b.iter(|| black_box(current_async_library()))
        })
    });

    group.bench_function("not_found", |b| {
        b.iter(|| black_box(current_async_library()))
    });
}
