use super::Error;

/// Error when a subquery cannot be tied to its enclosing query.
///
/// This occurs when:
/// - A subquery references an identifier no enclosing query declares
/// - A correlated path crosses a collection outside the subquery's FROM clause
/// - A reference points into a sibling or nested scope instead of an
///   enclosing one
#[derive(Debug)]
pub(super) struct Correlation {
    message: Box<str>,
}

impl std::error::Error for Correlation {}

impl core::fmt::Display for Correlation {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        write!(f, "correlation error: {}", self.message)
    }
}

impl Error {
    /// Creates a correlation error.
    pub fn correlation(message: impl Into<String>) -> Error {
        Error::from(super::ErrorKind::Correlation(Correlation {
            message: message.into().into(),
        }))
    }

    /// Returns `true` if this error, or a cause of it, is a correlation error.
    pub fn is_correlation(&self) -> bool {
        self.find_kind(|kind| matches!(kind, super::ErrorKind::Correlation(_)).then_some(()))
            .is_some()
    }
}
