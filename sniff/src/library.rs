use alloc::sync::Arc;
use core::{borrow::Borrow, fmt, hash, ops::Deref};

/// The name of an async library, e.g. `"asyncio"` or `"trio"`
///
/// Any string is a valid name so runtimes unknown to this crate can identify
/// themselves. Cloning is cheap.
#[derive(Clone)]
pub struct Library(Repr);

#[derive(Clone)]
enum Repr {
    Static(&'static str),
    Shared(Arc<str>),
}

impl Library {
    pub const ASYNCIO: Self = Self::from_static("asyncio");
    pub const CURIO: Self = Self::from_static("curio");
    pub const TRIO: Self = Self::from_static("trio");
    pub const TWISTED: Self = Self::from_static("twisted");

    pub const fn from_static(name: &'static str) -> Self {
        Self(Repr::Static(name))
    }

    pub fn as_str(&self) -> &str {
        match &self.0 {
            Repr::Static(name) => name,
            Repr::Shared(name) => name,
        }
    }
}

impl Deref for Library {
    type Target = str;

    fn deref(&self) -> &str {
        self.as_str()
    }
}

impl AsRef<str> for Library {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl Borrow<str> for Library {
    fn borrow(&self) -> &str {
        self.as_str()
    }
}

impl From<&'static str> for Library {
    fn from(name: &'static str) -> Self {
        Self::from_static(name)
    }
}

impl From<String> for Library {
    fn from(name: String) -> Self {
        Self(Repr::Shared(name.into()))
    }
}

impl From<Arc<str>> for Library {
    fn from(name: Arc<str>) -> Self {
        Self(Repr::Shared(name))
    }
}

impl PartialEq for Library {
    fn eq(&self, other: &Self) -> bool {
        self.as_str() == other.as_str()
    }
}

impl Eq for Library {}

impl PartialEq<str> for Library {
    fn eq(&self, other: &str) -> bool {
        self.as_str() == other
    }
}

impl PartialEq<&str> for Library {
    fn eq(&self, other: &&str) -> bool {
        self.as_str() == *other
    }
}

impl PartialEq<Library> for &str {
    fn eq(&self, other: &Library) -> bool {
        *self == other.as_str()
    }
}

impl hash::Hash for Library {
    fn hash<H: hash::Hasher>(&self, state: &mut H) {
        hash::Hash::hash(self.as_str(), state)
    }
}

impl fmt::Debug for Library {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self.as_str(), f)
    }
}

impl fmt::Display for Library {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self.as_str(), f)
    }
}
