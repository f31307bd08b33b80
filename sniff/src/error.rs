use core::fmt;

/// Returned when the current async library could not be determined
///
/// This happens when called from synchronous code, or from a runtime that
/// neither installs a recognizable hook nor sets an override.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct NotFound(());

impl NotFound {
    pub(crate) fn new() -> Self {
        NotFound(())
    }
}

impl fmt::Display for NotFound {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt.write_str("unknown async library, or not in async context")
    }
}

impl std::error::Error for NotFound {}

impl From<NotFound> for std::io::Error {
    fn from(err: NotFound) -> std::io::Error {
        std::io::Error::new(std::io::ErrorKind::NotFound, err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn io_conversion() {
        let err: std::io::Error = NotFound::new().into();
        assert_eq!(err.kind(), std::io::ErrorKind::NotFound);
        assert_eq!(
            err.to_string(),
            "unknown async library, or not in async context"
        );
    }
}
