#[cfg(feature = "metrics")]
#[doc(hidden)]
pub mod macro_support {
    pub use ::metrics::*;
    pub use ::tracing::trace;
}

#[cfg(feature = "metrics")]
#[doc(hidden)]
#[macro_export]
macro_rules! count {
    ($name:literal $(, $key:literal = $v:expr)* $(,)?) => {
        $crate::count!($name, 1 $(, $key = $v)*);
    };
    ($name:literal, $value:expr $(, $key:literal = $v:expr)* $(,)?) => {
        $crate::metrics::macro_support::trace!(count = %$name, value = %$value $(, $key = %$v)*);
        $crate::metrics::macro_support::counter!($name $(, $key => $v)*).increment($value);
    };
}

#[cfg(not(feature = "metrics"))]
#[doc(hidden)]
#[macro_export]
macro_rules! count {
    ($($tt:tt)*) => {};
}
