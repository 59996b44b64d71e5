mod adhoc;
mod ambiguous_alias;
mod correlation;
mod driver_operation_failed;
mod invalid_connection_url;
mod invalid_schema;
mod invalid_statement;
mod syntax;
mod type_conversion;
mod unresolved_path;
mod unsupported_feature;

use adhoc::AdhocError;
use ambiguous_alias::AmbiguousAlias;
use correlation::Correlation;
use driver_operation_failed::DriverOperationFailed;
use invalid_connection_url::InvalidConnectionUrl;
use invalid_schema::InvalidSchema;
use invalid_statement::InvalidStatement;
use std::sync::Arc;
use syntax::SyntaxError;
use type_conversion::TypeConversionError;
use unresolved_path::UnresolvedPath;
use unsupported_feature::UnsupportedFeature;

/// Returns early with an ad-hoc error built from format arguments.
#[macro_export]
macro_rules! bail {
    ($($arg:tt)*) => {
        return Err($crate::Error::from_args(format_args!($($arg)*)))
    };
}

/// Builds an ad-hoc error from format arguments.
#[macro_export]
macro_rules! err {
    ($($arg:tt)*) => {
        $crate::Error::from_args(format_args!($($arg)*))
    };
}

/// An error that can occur while compiling or executing a query.
///
/// The error is a single pointer wide. Errors can be chained with
/// [`Error::context`]; the chain is displayed outermost first.
#[derive(Clone)]
pub struct Error {
    inner: Option<Arc<ErrorInner>>,
}

#[derive(Debug)]
struct ErrorInner {
    kind: ErrorKind,
    cause: Option<Error>,
}

impl Error {
    /// Adds context to this error.
    ///
    /// Context is displayed in reverse order: the most recently added context
    /// is shown first, followed by earlier context, ending with the root cause.
    #[inline(always)]
    pub fn context(self, consequent: impl IntoError) -> Error {
        self.context_impl(consequent.into_error())
    }

    #[inline(never)]
    #[cold]
    fn context_impl(self, consequent: Error) -> Error {
        let kind = match consequent.inner {
            Some(inner) => match Arc::try_unwrap(inner) {
                Ok(inner) => {
                    assert!(
                        inner.cause.is_none(),
                        "consequent error must not already have a cause"
                    );
                    inner.kind
                }
                Err(shared) => ErrorKind::Adhoc(AdhocError::new(shared.kind.to_string())),
            },
            None => ErrorKind::Unknown,
        };

        Error {
            inner: Some(Arc::new(ErrorInner {
                kind,
                cause: Some(self),
            })),
        }
    }

    /// Creates an ad-hoc error from format arguments. Prefer [`err!`].
    pub fn from_args(args: core::fmt::Arguments<'_>) -> Error {
        Error::from(ErrorKind::Adhoc(AdhocError::new(args.to_string())))
    }

    fn chain(&self) -> impl Iterator<Item = &Error> {
        let mut err = self;
        core::iter::once(err).chain(core::iter::from_fn(move || {
            err = err.inner.as_ref().and_then(|inner| inner.cause.as_ref())?;
            Some(err)
        }))
    }

    fn kind(&self) -> &ErrorKind {
        self.inner
            .as_ref()
            .map(|inner| &inner.kind)
            .unwrap_or(&ErrorKind::Unknown)
    }

    /// Finds the first error in the chain for which `f` returns `Some`.
    fn find_kind<'a, T>(&'a self, f: impl Fn(&'a ErrorKind) -> Option<T>) -> Option<T> {
        self.chain().find_map(|err| f(err.kind()))
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self.kind() {
            ErrorKind::DriverOperationFailed(err) => Some(err),
            ErrorKind::Anyhow(err) => Some(err.as_ref()),
            _ => None,
        }
    }
}

impl core::fmt::Display for Error {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        let mut it = self.chain().peekable();
        while let Some(err) = it.next() {
            core::fmt::Display::fmt(err.kind(), f)?;
            if it.peek().is_some() {
                f.write_str(": ")?;
            }
        }
        Ok(())
    }
}

impl core::fmt::Debug for Error {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        if !f.alternate() {
            core::fmt::Display::fmt(self, f)
        } else {
            let Some(ref inner) = self.inner else {
                return f.debug_struct("Error").field("kind", &"None").finish();
            };
            f.debug_struct("Error")
                .field("kind", &inner.kind)
                .field("cause", &inner.cause)
                .finish()
        }
    }
}

#[derive(Debug)]
enum ErrorKind {
    Anyhow(anyhow::Error),
    Adhoc(AdhocError),
    Syntax(SyntaxError),
    UnresolvedPath(UnresolvedPath),
    AmbiguousAlias(AmbiguousAlias),
    Correlation(Correlation),
    UnsupportedFeature(UnsupportedFeature),
    InvalidStatement(InvalidStatement),
    InvalidSchema(InvalidSchema),
    InvalidConnectionUrl(InvalidConnectionUrl),
    DriverOperationFailed(DriverOperationFailed),
    TypeConversion(TypeConversionError),
    Unknown,
}

impl core::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        use self::ErrorKind::*;

        match self {
            Anyhow(err) => core::fmt::Display::fmt(err, f),
            Adhoc(err) => core::fmt::Display::fmt(err, f),
            Syntax(err) => core::fmt::Display::fmt(err, f),
            UnresolvedPath(err) => core::fmt::Display::fmt(err, f),
            AmbiguousAlias(err) => core::fmt::Display::fmt(err, f),
            Correlation(err) => core::fmt::Display::fmt(err, f),
            UnsupportedFeature(err) => core::fmt::Display::fmt(err, f),
            InvalidStatement(err) => core::fmt::Display::fmt(err, f),
            InvalidSchema(err) => core::fmt::Display::fmt(err, f),
            InvalidConnectionUrl(err) => core::fmt::Display::fmt(err, f),
            DriverOperationFailed(err) => core::fmt::Display::fmt(err, f),
            TypeConversion(err) => core::fmt::Display::fmt(err, f),
            Unknown => f.write_str("unknown oql error"),
        }
    }
}

impl From<ErrorKind> for Error {
    fn from(kind: ErrorKind) -> Error {
        Error {
            inner: Some(Arc::new(ErrorInner { kind, cause: None })),
        }
    }
}

impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Error {
        Error::from(ErrorKind::Anyhow(err))
    }
}

impl From<std::num::ParseIntError> for Error {
    fn from(err: std::num::ParseIntError) -> Error {
        Error::from(anyhow::Error::from(err))
    }
}

impl From<std::num::ParseFloatError> for Error {
    fn from(err: std::num::ParseFloatError) -> Error {
        Error::from(anyhow::Error::from(err))
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Error {
        Error::from(anyhow::Error::from(err))
    }
}

/// Trait for types that can be converted into an Error.
pub trait IntoError {
    /// Converts this type into an Error.
    fn into_error(self) -> Error;
}

impl IntoError for Error {
    #[inline(always)]
    fn into_error(self) -> Error {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_size() {
        // Error stays one pointer wide
        let expected_size = core::mem::size_of::<usize>();
        assert_eq!(expected_size, core::mem::size_of::<Error>());
    }

    #[test]
    fn error_from_args() {
        let err = Error::from_args(format_args!("test error: {}", 42));
        assert_eq!(err.to_string(), "test error: 42");
    }

    #[test]
    fn error_chain_display() {
        let root = err!("root cause");
        let chained = root.context(err!("middle context")).context(err!("top context"));
        assert_eq!(
            chained.to_string(),
            "top context: middle context: root cause"
        );
    }

    #[test]
    fn anyhow_bridge() {
        let anyhow_err = anyhow::anyhow!("something failed");
        let our_err: Error = anyhow_err.into();
        assert_eq!(our_err.to_string(), "something failed");
    }

    #[test]
    fn syntax_error_carries_offset() {
        let err = Error::syntax(17, "expected `)`");
        assert!(err.is_syntax());
        assert_eq!(err.syntax_offset(), Some(17));
        assert_eq!(err.to_string(), "syntax error at offset 17: expected `)`");
    }

    #[test]
    fn syntax_offset_found_through_context() {
        let err = Error::syntax(3, "unexpected token").context(err!("compiling query"));
        assert!(err.is_syntax());
        assert_eq!(err.syntax_offset(), Some(3));
    }

    #[test]
    fn unresolved_path_display() {
        let err = Error::unresolved_path("d.Contactz", "Document has no property `Contactz`");
        assert!(err.is_unresolved_path());
        assert_eq!(
            err.to_string(),
            "unresolved path `d.Contactz`: Document has no property `Contactz`"
        );
    }

    #[test]
    fn ambiguous_alias_display() {
        let err = Error::ambiguous_alias("c");
        assert!(err.is_ambiguous_alias());
        assert_eq!(err.to_string(), "alias `c` is declared more than once");
    }

    #[test]
    fn correlation_display() {
        let err = Error::correlation("`x` is not bound by any enclosing query");
        assert!(err.is_correlation());
        assert_eq!(
            err.to_string(),
            "correlation error: `x` is not bound by any enclosing query"
        );
    }

    #[test]
    fn unsupported_feature_display() {
        let err = Error::unsupported_feature("aggregate over a correlated subquery");
        assert!(err.is_unsupported_feature());
        assert_eq!(
            err.to_string(),
            "unsupported feature: aggregate over a correlated subquery"
        );
    }

    #[test]
    fn driver_failure_found_through_context() {
        let io = std::io::Error::new(std::io::ErrorKind::BrokenPipe, "connection closed");
        let err = Error::driver_operation_failed(io);
        assert!(err.is_driver_operation_failed());
        assert_eq!(err.to_string(), "connection closed");

        let err = err.context(err!("failed to execute `SELECT 1`"));
        assert!(err.is_driver_operation_failed());
        assert!(!err.is_syntax());
        assert_eq!(err.to_string(), "failed to execute `SELECT 1`: connection closed");
    }

    #[test]
    fn type_conversion_error() {
        let err = Error::type_conversion(crate::stmt::Value::I64(i64::MAX), "I32");
        assert!(err.is_type_conversion());
        assert_eq!(err.to_string(), "cannot convert I64 to I32");
    }
}
