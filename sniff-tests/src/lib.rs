macro_rules! tests {
    ($($(#[cfg($($tt:tt)*)])? $name:ident),* $(,)?) => {
        $(
            $(#[cfg($($tt)*)])?
            #[cfg(test)]
            mod $name;
        )*
    };
}

tests!(overrides, registry, scenarios, threads, tokio_tasks);

pub mod benches;
pub mod testing;

/// Runs `f` with tracing initialized
pub fn run<F: FnOnce() -> R, R>(f: F) -> R {
    crate::testing::init_tracing();
    f()
}
