#[cfg(feature = "tracing")]
pub use tracing::*;

#[cfg(not(feature = "tracing"))]
#[allow(unused_imports)]
mod shim {
    #[derive(Clone, Copy, Debug)]
    pub struct Span(());

    impl Span {
        pub fn disabled() -> Self {
            Self(())
        }

        pub fn in_scope<F: FnOnce() -> R, R>(&self, f: F) -> R {
            f()
        }
    }

    #[doc(hidden)]
    #[macro_export]
    macro_rules! debug_span_ {
        ($($tt:tt)*) => {
            $crate::tracing::Span::disabled()
        };
    }

    pub use crate::debug_span_ as debug_span;

    #[doc(hidden)]
    #[macro_export]
    macro_rules! debug_ {
        ($($tt:tt)*) => {};
    }

    pub use crate::debug_ as debug;

    #[doc(hidden)]
    #[macro_export]
    macro_rules! trace_ {
        ($($tt:tt)*) => {};
    }

    pub use crate::trace_ as trace;
}

#[cfg(not(feature = "tracing"))]
pub use shim::*;
