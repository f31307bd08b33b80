//! Finalizer hooks installed by running event loops
//!
//! A runtime that wants to be detected without setting an override installs a
//! [`Hook`] for as long as its loop is running. The hook is never called by
//! this crate. Only its identity and the module that declared it are
//! inspected.

use alloc::{
    borrow::Cow,
    sync::{Arc, Weak},
};
use core::{
    fmt,
    marker::PhantomData,
    num::NonZeroU64,
    sync::atomic::{AtomicU64, Ordering},
};

/// The module of the hook used by runtimes that report themselves through
/// overrides
pub const COOPERATIVE_MODULE: &str = module_path!();

crate::scope::define!(slot, Hook);

static IDS: AtomicU64 = AtomicU64::new(1);

/// A process-unique identity for a [`Hook`]
///
/// Identities are never reused, even after the hook is dropped.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct HookId(NonZeroU64);

impl HookId {
    fn next() -> Self {
        let id = IDS.fetch_add(1, Ordering::Relaxed);
        // the counter starts at 1 and would take centuries to wrap
        Self(NonZeroU64::new(id).unwrap_or(NonZeroU64::MAX))
    }

    pub fn get(&self) -> u64 {
        self.0.get()
    }
}

impl fmt::Display for HookId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

#[derive(Clone)]
pub struct Hook(Arc<Inner>);

struct Inner {
    id: HookId,
    module: Cow<'static, str>,
}

impl Hook {
    /// Creates a hook declared by `module`, e.g. `module_path!()`
    pub fn new<M: Into<Cow<'static, str>>>(module: M) -> Self {
        Self(Arc::new(Inner {
            id: HookId::next(),
            module: module.into(),
        }))
    }

    /// Creates a hook that defers to the task and thread overrides
    pub fn cooperative() -> Self {
        Self::new(COOPERATIVE_MODULE)
    }

    pub fn id(&self) -> HookId {
        self.0.id
    }

    pub fn module(&self) -> &str {
        &self.0.module
    }

    /// Returns the hook installed on the current thread
    pub fn installed() -> Option<Hook> {
        slot::try_borrow_with(|hook| hook.clone())
    }

    pub(crate) fn downgrade(&self) -> WeakHook {
        WeakHook(Arc::downgrade(&self.0))
    }

    /// Installs the hook until the returned guard is dropped
    ///
    /// The previously installed hook, if any, is restored afterwards.
    ///
    /// A loop that also reports itself through a [`Probe`](crate::probe::Probe)
    /// must be running before its hook is installed. A hook resolved while the
    /// probe can't see its loop keeps that resolution for as long as it lives.
    pub fn install(&self) -> InstallGuard {
        let previous = slot::replace(Some(self.clone()));
        InstallGuard {
            previous: Some(previous),
            _not_send: PhantomData,
        }
    }

    /// Installs the hook for the duration of `f`
    pub fn enter<F: FnOnce() -> R, R>(&self, f: F) -> R {
        let (_, res) = slot::with(self.clone(), f);
        res
    }
}

impl PartialEq for Hook {
    fn eq(&self, other: &Self) -> bool {
        self.id() == other.id()
    }
}

impl Eq for Hook {}

impl fmt::Debug for Hook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Hook")
            .field("id", &self.id())
            .field("module", &self.module())
            .finish()
    }
}

/// A reference to a [`Hook`] that doesn't keep it alive
#[derive(Clone)]
pub(crate) struct WeakHook(Weak<Inner>);

impl WeakHook {
    pub(crate) fn is_alive(&self) -> bool {
        self.0.strong_count() > 0
    }
}

impl fmt::Debug for WeakHook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("WeakHook").field(&self.is_alive()).finish()
    }
}

#[must_use = "the hook is uninstalled as soon as the guard is dropped"]
pub struct InstallGuard {
    previous: Option<Option<Hook>>,
    _not_send: PhantomData<*const ()>,
}

impl fmt::Debug for InstallGuard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InstallGuard").finish_non_exhaustive()
    }
}

impl Drop for InstallGuard {
    fn drop(&mut self) {
        if let Some(previous) = self.previous.take() {
            let _ = slot::replace(previous);
        }
    }
}

/// Reads the finalizer hook that is currently installed
pub trait HookSource {
    fn installed_hook(&self) -> Option<Hook>;
}

/// The hook installed on the current thread with [`Hook::install`] or
/// [`Hook::enter`]
#[derive(Clone, Copy, Debug, Default)]
pub struct InstalledHook;

impl HookSource for InstalledHook {
    fn installed_hook(&self) -> Option<Hook> {
        Hook::installed()
    }
}

impl<F> HookSource for F
where
    F: Fn() -> Option<Hook>,
{
    fn installed_hook(&self) -> Option<Hook> {
        self()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identities_are_unique() {
        let a = Hook::new("someio::run");
        let b = Hook::new("someio::run");
        assert_ne!(a.id(), b.id());
        assert_eq!(a.clone(), a);
        assert_eq!(a.module(), b.module());
    }

    #[test]
    fn install_restores_outer_hook() {
        assert_eq!(Hook::installed(), None);

        let outer = Hook::new("outer::hooks");
        let inner = Hook::new("inner::hooks");

        let outer_guard = outer.install();
        assert_eq!(InstalledHook.installed_hook(), Some(outer.clone()));

        inner.enter(|| {
            assert_eq!(Hook::installed(), Some(inner.clone()));
        });
        assert_eq!(Hook::installed(), Some(outer.clone()));

        {
            let _inner_guard = inner.install();
            assert_eq!(Hook::installed(), Some(inner.clone()));
        }
        assert_eq!(Hook::installed(), Some(outer.clone()));

        drop(outer_guard);
        assert_eq!(Hook::installed(), None);
    }

    #[test]
    fn weak_hook_tracks_liveness() {
        let hook = Hook::new("someio::run");
        let weak = hook.downgrade();
        let installed = hook.install();
        drop(hook);
        // the installed slot still holds a reference
        assert!(weak.is_alive());
        drop(installed);
        assert!(!weak.is_alive());
    }

    #[test]
    fn hooks_are_per_thread() {
        let hook = Hook::new("someio::run");
        let _guard = hook.install();
        let other = std::thread::spawn(Hook::installed).join().unwrap();
        assert_eq!(other, None);
    }

    #[test]
    fn closure_source() {
        let hook = Hook::cooperative();
        let source = || Some(hook.clone());
        assert_eq!(source.installed_hook().map(|h| h.id()), Some(hook.id()));
        assert_eq!(hook.module(), COOPERATIVE_MODULE);
    }
}
