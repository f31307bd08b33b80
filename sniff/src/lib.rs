//! Detect which async library is driving the current code path
//!
//! [`current_async_library`] returns a name like `"asyncio"` or `"trio"` so
//! generic code can pick runtime-specific primitives without being told
//! which runtime it targets.
//!
//! ```
//! use sniff::{ext::*, Library};
//!
//! fn sleep_impl() -> &'static str {
//!     match sniff::current_async_library() {
//!         Ok(library) if library == Library::TRIO => "trio::sleep",
//!         Ok(library) if library == Library::ASYNCIO => "asyncio::sleep",
//!         Ok(_) => "unsupported library",
//!         Err(_) => "not in async context",
//!     }
//! }
//!
//! assert_eq!(sleep_impl(), "not in async context");
//!
//! let task = async { sleep_impl() }.with_library(Library::TRIO);
//! # let _ = task;
//! ```
//!
//! The library is determined in this order:
//!
//! 1. The task override, attached to a future with
//!    [`LibraryExt`](ext::LibraryExt), or set for a closure with
//!    [`with_task_override`]. Inside either scope it can be changed with
//!    [`set_task_override`].
//! 2. The thread override, set with [`set_thread_override`].
//! 3. The finalizer [`Hook`](hook::Hook) installed by the running loop. The
//!    resolution for each hook is cached.
//!
//! When several libraries run on the same thread, e.g. one loop driving
//! another to completion from inside a task, the innermost one wins.

extern crate alloc;

pub mod cache;
mod detect;
mod error;
pub mod ext;
pub mod hook;
mod library;
#[doc(hidden)]
pub mod metrics;
pub mod overrides;
pub mod probe;
pub mod registry;
pub mod scope;
#[cfg(test)]
mod testing;
#[doc(hidden)]
pub mod tracing;

pub use detect::Detector;
pub use error::NotFound;
pub use library::Library;
pub use overrides::{
    clear_thread_override, revert_override, set_task_override, set_thread_override,
    with_task_override, Override,
};
pub use registry::{register, Registry, Resolver};

/// Returns the async library that is currently running
///
/// # Errors
///
/// Returns [`NotFound`] when called from synchronous code, or when the
/// running library doesn't identify itself.
pub fn current_async_library() -> Result<Library, NotFound> {
    detect::detect(&hook::InstalledHook, Registry::global())
}

/// Returns the async library that is currently running, if any
pub fn try_current() -> Option<Library> {
    current_async_library().ok()
}

/// Returns `true` if the caller is running inside a recognized async library
pub fn is_active() -> bool {
    try_current().is_some()
}
