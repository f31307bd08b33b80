//! Introspection of the loop that is currently running
//!
//! Some runtime families allow several loop implementations, each declaring
//! its finalizer hook in a different module. A [`Probe`] asks the family
//! which loop is running so an unknown hook can be matched against it.

use crate::{hook::Hook, library::Library};
use core::fmt;

crate::scope::define!(scope, RunningLoop);

/// Returned by a [`Probe`] when the family has no loop running
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct NoRunningLoop(());

impl NoRunningLoop {
    pub fn new() -> Self {
        NoRunningLoop(())
    }
}

impl Default for NoRunningLoop {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for NoRunningLoop {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt.write_str("no running event loop")
    }
}

impl std::error::Error for NoRunningLoop {}

/// A running loop along with the hook it exposes
#[derive(Clone, Debug)]
pub struct RunningLoop {
    family: Library,
    hook: Hook,
}

impl RunningLoop {
    pub fn new<L: Into<Library>>(family: L, hook: Hook) -> Self {
        Self {
            family: family.into(),
            hook,
        }
    }

    pub fn family(&self) -> &Library {
        &self.family
    }

    pub fn hook(&self) -> &Hook {
        &self.hook
    }

    /// Returns the loop entered on the current thread
    pub fn current() -> Result<Self, NoRunningLoop> {
        scope::try_borrow_with(|running| running.clone()).ok_or_else(NoRunningLoop::new)
    }

    /// Marks the loop as running on the current thread for the duration of `f`
    pub fn enter<F: FnOnce() -> R, R>(&self, f: F) -> R {
        let (_, res) = scope::with(self.clone(), f);
        res
    }
}

pub trait Probe: 'static + Send + Sync {
    fn running_loop(&self) -> Result<RunningLoop, NoRunningLoop>;
}

impl<F> Probe for F
where
    F: 'static + Send + Sync + Fn() -> Result<RunningLoop, NoRunningLoop>,
{
    fn running_loop(&self) -> Result<RunningLoop, NoRunningLoop> {
        self()
    }
}

/// Reports the loop entered on the current thread with [`RunningLoop::enter`]
#[derive(Clone, Copy, Debug, Default)]
pub struct ThreadLoopProbe;

impl Probe for ThreadLoopProbe {
    fn running_loop(&self) -> Result<RunningLoop, NoRunningLoop> {
        RunningLoop::current()
    }
}
