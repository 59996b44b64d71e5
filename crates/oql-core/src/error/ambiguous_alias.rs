use super::Error;

/// Error when the same alias is declared twice within one statement.
#[derive(Debug)]
pub(super) struct AmbiguousAlias {
    alias: Box<str>,
}

impl std::error::Error for AmbiguousAlias {}

impl core::fmt::Display for AmbiguousAlias {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        write!(f, "alias `{}` is declared more than once", self.alias)
    }
}

impl Error {
    /// Creates an ambiguous alias error.
    pub fn ambiguous_alias(alias: impl Into<String>) -> Error {
        Error::from(super::ErrorKind::AmbiguousAlias(AmbiguousAlias {
            alias: alias.into().into(),
        }))
    }

    /// Returns `true` if this error, or a cause of it, is an ambiguous alias error.
    pub fn is_ambiguous_alias(&self) -> bool {
        self.find_kind(|kind| matches!(kind, super::ErrorKind::AmbiguousAlias(_)).then_some(()))
            .is_some()
    }
}
