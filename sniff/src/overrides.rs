//! Explicit overrides that take precedence over hook inference
//!
//! There are two kinds of override:
//!
//! * A task override belongs to a task scope. A scope is entered around each
//!   poll of a [`WithLibrary`] future, or for the duration of a closure with
//!   [`with_task_override`] and [`task_scope`]. Outside of a poll the value is
//!   parked in the future, so sibling tasks polled on the same thread never
//!   observe each other's value.
//! * A thread override sticks to the OS thread until it is cleared. It's
//!   meant for callback-style code that isn't running inside any task.

use crate::{library::Library, tracing::trace};
use core::{
    cell::RefCell,
    future::Future,
    marker::PhantomData,
    pin::Pin,
    task::{Context, Poll},
};
use pin_project_lite::pin_project;

crate::scope::define!(scope, Frame);

thread_local! {
    static THREAD: RefCell<Option<Library>> = const { RefCell::new(None) };
}

mod frame {
    use crate::library::Library;
    use core::sync::atomic::{AtomicU64, Ordering};

    static IDS: AtomicU64 = AtomicU64::new(0);

    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub struct FrameId(u64);

    impl FrameId {
        pub fn next() -> Self {
            Self(IDS.fetch_add(1, Ordering::Relaxed))
        }
    }

    /// The task override of a single task scope
    #[derive(Clone, Debug)]
    pub struct Frame {
        pub id: FrameId,
        pub library: Option<Library>,
    }

    impl Frame {
        pub fn new(library: Option<Library>) -> Self {
            Self {
                id: FrameId::next(),
                library,
            }
        }
    }
}

use frame::{Frame, FrameId};

/// Returns the task override visible to the caller
pub fn task_override() -> Option<Library> {
    scope::try_borrow_with(|frame| frame.as_ref()?.library.clone())
}

/// Returns `true` if the caller is inside a task scope
pub fn in_task_scope() -> bool {
    scope::is_entered()
}

/// Runs `f` in a new task scope with `library` as the task override
pub fn with_task_override<L, F, R>(library: L, f: F) -> R
where
    L: Into<Library>,
    F: FnOnce() -> R,
{
    let (_, res) = scope::with(Frame::new(Some(library.into())), f);
    res
}

/// Runs `f` in a new task scope that starts with the caller's task override
///
/// Overrides set inside `f` are discarded when it returns.
pub fn task_scope<F: FnOnce() -> R, R>(f: F) -> R {
    let (_, res) = scope::with(Frame::new(task_override()), f);
    res
}

/// Sets the task override until the returned guard is reverted or dropped
///
/// Guards restore exactly the value that was visible when they were created,
/// so nested overrides unwind in order:
///
/// ```
/// sniff::overrides::task_scope(|| {
///     let outer = sniff::set_task_override("a");
///     let inner = sniff::set_task_override("b");
///     assert_eq!(sniff::current_async_library().unwrap(), "b");
///     inner.revert();
///     assert_eq!(sniff::current_async_library().unwrap(), "a");
///     outer.revert();
/// });
/// ```
///
/// # Panics
///
/// Panics when called outside of a task scope. A guard held across an
/// `.await` in a task without a scope would otherwise be visible to every
/// other task polled on the thread.
pub fn set_task_override<L: Into<Library>>(library: L) -> Override {
    let library = library.into();
    trace!(%library, "set task override");
    scope::borrow_mut_with(|frame| {
        let previous = frame.library.replace(library);
        Override {
            frame: frame.id,
            previous: Some(previous),
            _not_send: PhantomData,
        }
    })
}

/// Restores the task override captured by `token`
pub fn revert_override(token: Override) {
    token.revert()
}

/// A revert token for [`set_task_override`]
///
/// The guard is bound to the task scope that created it. Reverting it after
/// that scope has been left has no effect.
#[must_use = "the override is reverted as soon as the guard is dropped"]
pub struct Override {
    frame: FrameId,
    previous: Option<Option<Library>>,
    _not_send: PhantomData<*const ()>,
}

impl Override {
    pub fn revert(mut self) {
        self.restore();
    }

    fn restore(&mut self) {
        let Some(previous) = self.previous.take() else {
            return;
        };

        scope::try_borrow_mut_with(|frame| match frame {
            Some(frame) if frame.id == self.frame => {
                trace!(previous = ?previous, "revert task override");
                frame.library = previous;
            }
            _ => {
                trace!(frame = ?self.frame, "task scope already left");
            }
        })
    }
}

impl core::fmt::Debug for Override {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Override")
            .field("frame", &self.frame)
            .field("previous", &self.previous.as_ref().and_then(|v| v.as_ref()))
            .finish()
    }
}

impl Drop for Override {
    fn drop(&mut self) {
        self.restore();
    }
}

/// Returns the override for the current thread
pub fn thread_override() -> Option<Library> {
    THREAD.with(|library| library.borrow().clone())
}

/// Sets the override for the current thread, returning the previous value
pub fn set_thread_override<L: Into<Library>>(library: L) -> Option<Library> {
    let library = library.into();
    trace!(%library, "set thread override");
    THREAD.with(|slot| slot.replace(Some(library)))
}

/// Clears the override for the current thread, returning the previous value
pub fn clear_thread_override() -> Option<Library> {
    THREAD.with(|slot| slot.take())
}

/// Returns the first override that is set, task before thread
pub(crate) fn lookup() -> Option<Library> {
    task_override().or_else(thread_override)
}

pin_project! {
    /// A future that is polled in its own task scope
    ///
    /// Overrides set by the inner future during a poll are carried over to
    /// its next poll.
    #[must_use = "futures do nothing unless polled"]
    pub struct WithLibrary<Inner> {
        #[pin]
        inner: Inner,
        frame: FrameId,
        library: Option<Library>,
    }
}

impl<Inner> WithLibrary<Inner> {
    pub fn new(inner: Inner, library: Option<Library>) -> Self {
        Self {
            inner,
            frame: FrameId::next(),
            library,
        }
    }

    /// Captures the caller's task override
    pub fn inherit(inner: Inner) -> Self {
        Self::new(inner, task_override())
    }

    pub fn library(&self) -> Option<&Library> {
        self.library.as_ref()
    }
}

impl<Inner> Future for WithLibrary<Inner>
where
    Inner: Future,
{
    type Output = Inner::Output;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.project();
        let inner = this.inner;
        let frame = Frame {
            id: *this.frame,
            library: this.library.take(),
        };
        let (frame, res) = scope::with(frame, || Future::poll(inner, cx));
        *this.library = frame.library;
        res
    }
}
