//! Thread-local slots that are only populated while a value is entered
//!
//! Each slot created with [`define!`](crate::define) lives in its own module
//! and is restored to its previous state when the entered closure returns,
//! including when it unwinds.

#[macro_export]
macro_rules! define {
    ($vis:vis $name:ident, $ty:ty) => {
        #[allow(dead_code)]
        $vis mod $name {
            #[allow(unused_imports)]
            use super::*;
            use ::core::cell::RefCell;

            ::std::thread_local! {
                static SCOPE: RefCell<Option<$ty>> = const { RefCell::new(None) };
            }

            struct Restore(Option<Option<$ty>>);

            impl Restore {
                fn finish(mut self) -> Option<$ty> {
                    replace(self.0.take().flatten())
                }
            }

            impl Drop for Restore {
                fn drop(&mut self) {
                    if let Some(prev) = self.0.take() {
                        let _ = replace(prev);
                    }
                }
            }

            /// Sets `value` for the duration of `f`
            ///
            /// Returns the value as it was left by `f`, along with the result.
            pub fn with<F: FnOnce() -> R, R>(value: $ty, f: F) -> ($ty, R) {
                let (value, res) = enter(Some(value), f);
                let value = value.expect(concat!(
                    "the `",
                    stringify!($name),
                    "` scope was cleared while entered"
                ));
                (value, res)
            }

            /// Sets or clears the slot for the duration of `f`
            pub fn enter<F: FnOnce() -> R, R>(value: Option<$ty>, f: F) -> (Option<$ty>, R) {
                let restore = Restore(Some(replace(value)));
                let res = f();
                (restore.finish(), res)
            }

            /// Replaces the current value, returning the previous one
            pub fn replace(value: Option<$ty>) -> Option<$ty> {
                SCOPE
                    .try_with(move |scope| scope.replace(value))
                    .ok()
                    .flatten()
            }

            pub fn borrow_with<F: FnOnce(&$ty) -> R, R>(f: F) -> R {
                try_borrow_with(|value| {
                    let value = value.as_ref().expect(concat!(
                        "the `",
                        stringify!($name),
                        "` scope is not entered"
                    ));
                    f(value)
                })
            }

            pub fn borrow_mut_with<F: FnOnce(&mut $ty) -> R, R>(f: F) -> R {
                try_borrow_mut_with(|value| {
                    let value = value.as_mut().expect(concat!(
                        "the `",
                        stringify!($name),
                        "` scope is not entered"
                    ));
                    f(value)
                })
            }

            pub fn try_borrow_with<F: FnOnce(&Option<$ty>) -> R, R>(f: F) -> R {
                SCOPE.with(|scope| f(&scope.borrow()))
            }

            pub fn try_borrow_mut_with<F: FnOnce(&mut Option<$ty>) -> R, R>(f: F) -> R {
                SCOPE.with(|scope| f(&mut scope.borrow_mut()))
            }

            pub fn is_entered() -> bool {
                try_borrow_with(|value| value.is_some())
            }
        }
    };
}

pub use crate::define;
