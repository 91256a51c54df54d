use quick_xml::encoding::EncodingError;
use rdfterm::InvalidTermError;
use std::io;
use std::sync::Arc;

/// Error returned during RDFa parsing.
#[derive(Debug, thiserror::Error)]
pub enum RdfaParseError {
    /// I/O error during parsing (file not found...).
    #[error(transparent)]
    Io(#[from] io::Error),
    /// An error in the file syntax.
    #[error(transparent)]
    Syntax(#[from] RdfaSyntaxError),
}

impl RdfaParseError {
    pub(crate) fn with_position(self, position: u64) -> Self {
        match self {
            Self::Syntax(error) => Self::Syntax(error.with_position(position)),
            Self::Io(error) => Self::Io(error),
        }
    }
}

impl From<RdfaParseError> for io::Error {
    #[inline]
    fn from(error: RdfaParseError) -> Self {
        match error {
            RdfaParseError::Io(error) => error,
            RdfaParseError::Syntax(error) => error.into(),
        }
    }
}

#[doc(hidden)]
impl From<quick_xml::Error> for RdfaParseError {
    #[inline]
    fn from(error: quick_xml::Error) -> Self {
        match error {
            quick_xml::Error::Io(error) => {
                Self::Io(Arc::try_unwrap(error).unwrap_or_else(|e| io::Error::new(e.kind(), e)))
            }
            _ => Self::Syntax(RdfaSyntaxError::new(SyntaxErrorKind::Xml(error))),
        }
    }
}

#[doc(hidden)]
impl From<EncodingError> for RdfaParseError {
    #[inline]
    fn from(error: EncodingError) -> Self {
        quick_xml::Error::from(error).into()
    }
}

/// An error in the markup of the parsed document.
///
/// The HTML tokenizer is tolerant: unclosed tags, void elements and unknown entities are accepted.
/// Only markup that cannot be tokenized at all, like an attribute list cut by the end of the file, is reported,
/// together with literals whose datatype can't be used without a language tag.
#[derive(Debug, thiserror::Error)]
#[error("{}{kind}", .position.map(|p| format!("Parser error at byte {p}: ")).unwrap_or_default())]
pub struct RdfaSyntaxError {
    #[source]
    kind: SyntaxErrorKind,
    position: Option<u64>,
}

#[derive(Debug, thiserror::Error)]
enum SyntaxErrorKind {
    #[error(transparent)]
    Xml(quick_xml::Error),
    #[error(transparent)]
    Term(InvalidTermError),
}

impl RdfaSyntaxError {
    fn new(kind: SyntaxErrorKind) -> Self {
        Self {
            kind,
            position: None,
        }
    }

    fn with_position(mut self, position: u64) -> Self {
        self.position.get_or_insert(position);
        self
    }

    /// The byte offset in the input where the error was detected, if known.
    #[inline]
    pub fn position(&self) -> Option<u64> {
        self.position
    }
}

impl From<InvalidTermError> for RdfaSyntaxError {
    #[inline]
    fn from(error: InvalidTermError) -> Self {
        Self::new(SyntaxErrorKind::Term(error))
    }
}

impl From<RdfaSyntaxError> for io::Error {
    #[inline]
    fn from(error: RdfaSyntaxError) -> Self {
        Self::new(io::ErrorKind::InvalidData, error)
    }
}
