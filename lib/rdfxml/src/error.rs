use oxilangtag::LanguageTagParseError;
use oxiri::IriParseError;
use quick_xml::encoding::EncodingError;
use quick_xml::escape::EscapeError;
use quick_xml::events::attributes::AttrError;
use std::io;
use std::sync::Arc;

/// Error returned during RDF/XML parsing.
#[derive(Debug, thiserror::Error)]
pub enum RdfXmlParseError {
    /// I/O error during parsing (file not found...).
    #[error(transparent)]
    Io(#[from] io::Error),
    /// An error in the file syntax.
    #[error(transparent)]
    Syntax(#[from] RdfXmlSyntaxError),
}

impl RdfXmlParseError {
    pub(crate) fn with_position(self, position: u64) -> Self {
        match self {
            Self::Syntax(error) => Self::Syntax(error.with_position(position)),
            Self::Io(error) => Self::Io(error),
        }
    }
}

impl From<RdfXmlParseError> for io::Error {
    #[inline]
    fn from(error: RdfXmlParseError) -> Self {
        match error {
            RdfXmlParseError::Io(error) => error,
            RdfXmlParseError::Syntax(error) => error.into(),
        }
    }
}

#[doc(hidden)]
impl From<quick_xml::Error> for RdfXmlParseError {
    #[inline]
    fn from(error: quick_xml::Error) -> Self {
        match error {
            quick_xml::Error::Io(error) => {
                Self::Io(Arc::try_unwrap(error).unwrap_or_else(|e| io::Error::new(e.kind(), e)))
            }
            _ => Self::Syntax(RdfXmlSyntaxError::new(SyntaxErrorKind::Xml(error))),
        }
    }
}

#[doc(hidden)]
impl From<EscapeError> for RdfXmlParseError {
    #[inline]
    fn from(error: EscapeError) -> Self {
        quick_xml::Error::from(error).into()
    }
}

#[doc(hidden)]
impl From<EncodingError> for RdfXmlParseError {
    #[inline]
    fn from(error: EncodingError) -> Self {
        quick_xml::Error::from(error).into()
    }
}

#[doc(hidden)]
impl From<AttrError> for RdfXmlParseError {
    #[inline]
    fn from(error: AttrError) -> Self {
        quick_xml::Error::InvalidAttr(error).into()
    }
}

/// An error in the syntax of the parsed file.
///
/// The byte offset of the XML event that triggered it is available with [`position`](Self::position).
#[derive(Debug, thiserror::Error)]
#[error("{}{kind}", .position.map(|p| format!("Parser error at byte {p}: ")).unwrap_or_default())]
pub struct RdfXmlSyntaxError {
    #[source]
    kind: SyntaxErrorKind,
    position: Option<u64>,
}

#[derive(Debug, thiserror::Error)]
enum SyntaxErrorKind {
    #[error(transparent)]
    Xml(quick_xml::Error),
    #[error("error while parsing IRI '{iri}': {error}")]
    InvalidIri {
        iri: String,
        #[source]
        error: IriParseError,
    },
    #[error("error while parsing language tag '{tag}': {error}")]
    InvalidLanguageTag {
        tag: String,
        #[source]
        error: LanguageTagParseError,
    },
    #[error("Unknown namespace prefix {0}:")]
    UnknownPrefix(String),
    #[error("{0}")]
    Msg(String),
}

impl RdfXmlSyntaxError {
    fn new(kind: SyntaxErrorKind) -> Self {
        Self {
            kind,
            position: None,
        }
    }

    /// Builds an error from a printable error message.
    #[inline]
    pub(crate) fn msg(msg: impl Into<String>) -> Self {
        Self::new(SyntaxErrorKind::Msg(msg.into()))
    }

    pub(crate) fn invalid_iri(iri: String, error: IriParseError) -> Self {
        Self::new(SyntaxErrorKind::InvalidIri { iri, error })
    }

    pub(crate) fn invalid_language_tag(tag: String, error: LanguageTagParseError) -> Self {
        Self::new(SyntaxErrorKind::InvalidLanguageTag { tag, error })
    }

    pub(crate) fn unknown_prefix_declaration(prefix: String) -> Self {
        Self::new(SyntaxErrorKind::UnknownPrefix(prefix))
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

    /// The prefix if this error is caused by an element or attribute name using an undeclared prefix.
    #[inline]
    pub fn unknown_prefix(&self) -> Option<&str> {
        match &self.kind {
            SyntaxErrorKind::UnknownPrefix(prefix) => Some(prefix),
            _ => None,
        }
    }
}

impl From<RdfXmlSyntaxError> for io::Error {
    #[inline]
    fn from(error: RdfXmlSyntaxError) -> Self {
        Self::new(io::ErrorKind::InvalidData, error)
    }
}
