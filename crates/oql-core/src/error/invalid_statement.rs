use super::Error;

/// Error when a statement parses and resolves but is not meaningful.
///
/// This occurs when:
/// - A scalar subquery selects more than one item
/// - An aggregate is nested directly inside another aggregate
/// - A named parameter has no bound value at execution time
#[derive(Debug)]
pub(super) struct InvalidStatement {
    message: Box<str>,
}

impl std::error::Error for InvalidStatement {}

impl core::fmt::Display for InvalidStatement {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        write!(f, "invalid statement: {}", self.message)
    }
}

impl Error {
    /// Creates an invalid statement error.
    pub fn invalid_statement(message: impl Into<String>) -> Error {
        Error::from(super::ErrorKind::InvalidStatement(InvalidStatement {
            message: message.into().into(),
        }))
    }

    /// Returns `true` if this error, or a cause of it, is an invalid statement error.
    pub fn is_invalid_statement(&self) -> bool {
        self.find_kind(|kind| matches!(kind, super::ErrorKind::InvalidStatement(_)).then_some(()))
            .is_some()
    }
}
