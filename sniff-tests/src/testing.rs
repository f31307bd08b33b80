use core::{
    future::Future,
    pin::pin,
    sync::atomic::{AtomicBool, Ordering},
    task::{Context, Poll},
};
use sniff::{
    hook::Hook,
    overrides::WithLibrary,
    probe::RunningLoop,
    registry::{ASYNCIO_MODULE, CURIO_MODULE},
    Library,
};
use std::{
    sync::Arc,
    task::{Wake, Waker},
};

pub fn init_tracing() {
    use std::sync::Once;

    static TRACING: Once = Once::new();

    // make sure this only gets initialized once
    TRACING.call_once(|| {
        let format = tracing_subscriber::fmt::format()
            .with_level(false) // don't include levels in formatted output
            .with_thread_names(true)
            .without_time()
            .with_ansi(false)
            .compact(); // Use a less verbose output format.

        let env_filter = tracing_subscriber::EnvFilter::builder()
            .with_default_directive(tracing::Level::DEBUG.into())
            .with_env_var("SNIFF_LOG")
            .from_env()
            .unwrap();

        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .event_format(format)
            .with_test_writer()
            .init();
    });
}

/// A single-threaded loop that identifies itself the way a runtime would
///
/// Every loop gets a fresh hook, just like every event loop instance exposes
/// its own finalizer.
#[derive(Debug)]
pub struct Loop {
    hook: Hook,
    running: Option<Library>,
    task: Option<Library>,
}

impl Loop {
    /// A loop whose finalizer hook is declared in `module`
    pub fn new(module: &'static str) -> Self {
        Self {
            hook: Hook::new(module),
            running: None,
            task: None,
        }
    }

    pub fn asyncio() -> Self {
        Self::new(ASYNCIO_MODULE)
    }

    pub fn curio() -> Self {
        Self::new(CURIO_MODULE)
    }

    /// A loop that installs the cooperative hook and tags its tasks
    pub fn cooperative<L: Into<Library>>(library: L) -> Self {
        Self {
            hook: Hook::cooperative(),
            running: None,
            task: Some(library.into()),
        }
    }

    /// Also reports the loop as the running loop of `family`
    pub fn running_as<L: Into<Library>>(mut self, family: L) -> Self {
        self.running = Some(family.into());
        self
    }

    pub fn hook(&self) -> &Hook {
        &self.hook
    }

    /// Drives `future` to completion on the current thread
    ///
    /// The future is polled in its own task scope, tagged with the loop's
    /// library if it has one. The loop is marked as running before its hook
    /// is installed.
    pub fn run<F: Future>(&self, future: F) -> F::Output {
        let future = WithLibrary::new(future, self.task.clone());
        let run = || self.hook.enter(|| block_on(future));

        match &self.running {
            Some(family) => RunningLoop::new(family.clone(), self.hook.clone()).enter(run),
            None => run(),
        }
    }
}

#[derive(Default)]
struct Flag(AtomicBool);

impl Wake for Flag {
    fn wake(self: Arc<Self>) {
        self.wake_by_ref();
    }

    fn wake_by_ref(self: &Arc<Self>) {
        self.0.store(true, Ordering::Release);
    }
}

fn block_on<F: Future>(future: F) -> F::Output {
    let flag = Arc::new(Flag::default());
    let waker = Waker::from(flag.clone());
    let mut cx = Context::from_waker(&waker);
    let mut future = pin!(future);

    loop {
        if let Poll::Ready(value) = future.as_mut().poll(&mut cx) {
            return value;
        }

        assert!(
            flag.0.swap(false, Ordering::AcqRel),
            "the loop stalled without a wakeup"
        );
    }
}

/// Yields to the loop once
pub async fn yield_now() {
    let mut pending = true;
    core::future::poll_fn(|cx| {
        if core::mem::take(&mut pending) {
            cx.waker().wake_by_ref();
            return Poll::Pending;
        }
        Poll::Ready(())
    })
    .await
}
