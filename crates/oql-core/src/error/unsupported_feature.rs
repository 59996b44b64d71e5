use super::Error;

/// Error when the backend does not support a feature the query needs.
///
/// This occurs when:
/// - The backend cannot evaluate an aggregate over a correlated subquery and
///   no fallback strategy was configured
/// - The configured fallback strategy cannot evaluate the query's shape
///
/// These errors are raised at compile time, before the backend is contacted.
#[derive(Debug)]
pub(super) struct UnsupportedFeature {
    message: Box<str>,
}

impl std::error::Error for UnsupportedFeature {}

impl core::fmt::Display for UnsupportedFeature {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        write!(f, "unsupported feature: {}", self.message)
    }
}

impl Error {
    /// Creates an unsupported feature error.
    pub fn unsupported_feature(message: impl Into<String>) -> Error {
        Error::from(super::ErrorKind::UnsupportedFeature(UnsupportedFeature {
            message: message.into().into(),
        }))
    }

    /// Returns `true` if this error, or a cause of it, is an unsupported feature error.
    pub fn is_unsupported_feature(&self) -> bool {
        self.find_kind(|kind| {
            matches!(kind, super::ErrorKind::UnsupportedFeature(_)).then_some(())
        })
        .is_some()
    }
}
