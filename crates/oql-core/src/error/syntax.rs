use super::Error;

/// Error when query text cannot be parsed.
///
/// This occurs when:
/// - The text contains a character or literal the lexer does not recognize
/// - A clause is malformed or out of order
/// - Parentheses are unbalanced
/// - A keyword appears where an identifier is expected
///
/// The offset is the byte position in the query text where parsing failed.
#[derive(Debug)]
pub(super) struct SyntaxError {
    offset: usize,
    message: Box<str>,
}

impl std::error::Error for SyntaxError {}

impl core::fmt::Display for SyntaxError {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        write!(f, "syntax error at offset {}: {}", self.offset, self.message)
    }
}

impl Error {
    /// Creates a syntax error at the given byte offset of the query text.
    pub fn syntax(offset: usize, message: impl Into<String>) -> Error {
        Error::from(super::ErrorKind::Syntax(SyntaxError {
            offset,
            message: message.into().into(),
        }))
    }

    /// Returns `true` if this error, or a cause of it, is a syntax error.
    pub fn is_syntax(&self) -> bool {
        self.syntax_offset().is_some()
    }

    /// The offset at which parsing failed, when this is a syntax error.
    pub fn syntax_offset(&self) -> Option<usize> {
        self.find_kind(|kind| match kind {
            super::ErrorKind::Syntax(err) => Some(err.offset),
            _ => None,
        })
    }
}
