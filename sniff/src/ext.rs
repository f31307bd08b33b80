use crate::{library::Library, overrides::WithLibrary};

pub trait LibraryExt: Sized {
    /// Polls the future with `library` as its task override
    fn with_library<L: Into<Library>>(self, library: L) -> WithLibrary<Self>;

    /// Polls the future with the task override of the caller
    ///
    /// The value is captured when this is called so the future can be
    /// spawned onto another task without losing it.
    fn inherit_library(self) -> WithLibrary<Self>;
}

impl<F> LibraryExt for F
where
    F: core::future::Future,
{
    fn with_library<L: Into<Library>>(self, library: L) -> WithLibrary<Self> {
        WithLibrary::new(self, Some(library.into()))
    }

    fn inherit_library(self) -> WithLibrary<Self> {
        WithLibrary::inherit(self)
    }
}
