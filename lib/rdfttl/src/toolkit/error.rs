use std::ops::Range;
use std::{fmt, io};

/// A place in a document.
///
/// `line` and `column` start from 0, the column counting code points.
/// `offset` is the number of bytes since the start of the document.
#[derive(Eq, PartialEq, Debug, Copy, Clone, Default)]
pub struct TextPosition {
    pub line: u64,
    pub column: u64,
    pub offset: u64,
}

impl fmt::Display for TextPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {} column {}", self.line + 1, self.column + 1)
    }
}

/// A Turtle family document that does not follow its grammar.
#[derive(Debug, thiserror::Error)]
pub struct TurtleSyntaxError {
    location: Range<TextPosition>,
    message: String,
    unknown_prefix: Option<String>,
}

impl TurtleSyntaxError {
    pub(crate) fn new(location: Range<TextPosition>, message: impl Into<String>) -> Self {
        Self {
            location,
            message: message.into(),
            unknown_prefix: None,
        }
    }

    pub(crate) fn with_unknown_prefix(self, unknown_prefix: Option<String>) -> Self {
        Self {
            unknown_prefix,
            ..self
        }
    }

    /// The span of the document the error is about.
    pub fn location(&self) -> Range<TextPosition> {
        self.location.clone()
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// Set when a prefixed name uses a prefix that has not been declared before.
    pub fn unknown_prefix(&self) -> Option<&str> {
        self.unknown_prefix.as_deref()
    }
}

impl fmt::Display for TurtleSyntaxError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Range { start, end } = &self.location;
        if end.offset <= start.offset + 1 {
            write!(f, "Syntax error at {start}: {}", self.message)
        } else if start.line == end.line {
            write!(
                f,
                "Syntax error at line {} from column {} to {}: {}",
                start.line + 1,
                start.column + 1,
                end.column + 1,
                self.message
            )
        } else {
            write!(f, "Syntax error from {start} to {end}: {}", self.message)
        }
    }
}

impl From<TurtleSyntaxError> for io::Error {
    fn from(error: TurtleSyntaxError) -> Self {
        Self::new(io::ErrorKind::InvalidData, error)
    }
}

/// Error returned when reading a Turtle family document from a [`Read`](std::io::Read) implementation.
#[derive(Debug, thiserror::Error)]
pub enum TurtleParseError {
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Syntax(#[from] TurtleSyntaxError),
}

impl From<TurtleParseError> for io::Error {
    fn from(error: TurtleParseError) -> Self {
        match error {
            TurtleParseError::Io(error) => error,
            TurtleParseError::Syntax(error) => error.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn position(line: u64, column: u64, offset: u64) -> TextPosition {
        TextPosition {
            line,
            column,
            offset,
        }
    }

    #[test]
    fn test_display() {
        let error = TurtleSyntaxError::new(position(4, 0, 80)..position(4, 1, 81), "oops");
        assert_eq!(error.to_string(), "Syntax error at line 5 column 1: oops");
        let error = TurtleSyntaxError::new(position(4, 2, 82)..position(4, 6, 86), "oops");
        assert_eq!(
            error.to_string(),
            "Syntax error at line 5 from column 3 to 7: oops"
        );
        let error = TurtleSyntaxError::new(position(1, 2, 20)..position(3, 0, 40), "oops");
        assert_eq!(
            error.to_string(),
            "Syntax error from line 2 column 3 to line 4 column 1: oops"
        );
    }
}
