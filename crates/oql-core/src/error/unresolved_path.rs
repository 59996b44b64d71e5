use super::Error;

/// Error when a property path or alias does not correspond to the mapping.
///
/// This occurs when:
/// - A FROM clause names an entity that is not mapped
/// - A path segment names a property or collection role the entity lacks
/// - A path dereferences a scalar value
/// - An identifier is not bound to any alias of the query
#[derive(Debug)]
pub(super) struct UnresolvedPath {
    path: Box<str>,
    reason: Box<str>,
}

impl std::error::Error for UnresolvedPath {}

impl core::fmt::Display for UnresolvedPath {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        write!(f, "unresolved path `{}`: {}", self.path, self.reason)
    }
}

impl Error {
    /// Creates an unresolved path error for `path`.
    pub fn unresolved_path(path: impl Into<String>, reason: impl Into<String>) -> Error {
        Error::from(super::ErrorKind::UnresolvedPath(UnresolvedPath {
            path: path.into().into(),
            reason: reason.into().into(),
        }))
    }

    /// Returns `true` if this error, or a cause of it, is an unresolved path error.
    pub fn is_unresolved_path(&self) -> bool {
        self.find_kind(|kind| matches!(kind, super::ErrorKind::UnresolvedPath(_)).then_some(()))
            .is_some()
    }
}
