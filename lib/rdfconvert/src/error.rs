use rdfa::{RdfaParseError, RdfaSyntaxError};
use rdfjsonld::{JsonLdParseError, JsonLdSyntaxError};
use rdfterm::{InvalidTermError, IriParseError};
use rdfttl::{TextPosition, TurtleParseError, TurtleSyntaxError};
use rdfxml::{RdfXmlParseError, RdfXmlSyntaxError};
use std::io;
use std::ops::Range;

/// A media type the registry can't handle in the requested direction.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UnsupportedFormatError {
    /// No format is registered for this media type.
    #[error("Unsupported mimetype {0}")]
    Unknown(String),
    /// The format can be read but never written.
    #[error("{media_type} ({name}) is not supported as an output format")]
    ParseOnly {
        media_type: &'static str,
        name: &'static str,
    },
}

impl UnsupportedFormatError {
    pub(crate) fn unknown(media_type: &str) -> Self {
        Self::Unknown(media_type.into())
    }
}

/// Error returned during RDF format parsing.
#[derive(Debug, thiserror::Error)]
pub enum RdfParseError {
    /// I/O error during parsing (file not found...).
    #[error(transparent)]
    Io(#[from] io::Error),
    /// An error in the file syntax.
    #[error(transparent)]
    Syntax(#[from] RdfSyntaxError),
}

impl From<TurtleParseError> for RdfParseError {
    #[inline]
    fn from(error: TurtleParseError) -> Self {
        match error {
            TurtleParseError::Syntax(e) => Self::Syntax(e.into()),
            TurtleParseError::Io(e) => Self::Io(e),
        }
    }
}

impl From<RdfXmlParseError> for RdfParseError {
    #[inline]
    fn from(error: RdfXmlParseError) -> Self {
        match error {
            RdfXmlParseError::Syntax(e) => Self::Syntax(e.into()),
            RdfXmlParseError::Io(e) => Self::Io(e),
        }
    }
}

impl From<JsonLdParseError> for RdfParseError {
    #[inline]
    fn from(error: JsonLdParseError) -> Self {
        match error {
            JsonLdParseError::Syntax(e) => Self::Syntax(e.into()),
            JsonLdParseError::Io(e) => Self::Io(e),
        }
    }
}

impl From<RdfaParseError> for RdfParseError {
    #[inline]
    fn from(error: RdfaParseError) -> Self {
        match error {
            RdfaParseError::Syntax(e) => Self::Syntax(e.into()),
            RdfaParseError::Io(e) => Self::Io(e),
        }
    }
}

impl From<RdfParseError> for io::Error {
    #[inline]
    fn from(error: RdfParseError) -> Self {
        match error {
            RdfParseError::Io(error) => error,
            RdfParseError::Syntax(error) => error.into(),
        }
    }
}

/// An error in the syntax of the parsed file, whatever its format.
#[derive(Debug, thiserror::Error)]
#[error(transparent)]
pub struct RdfSyntaxError(#[from] SyntaxErrorKind);

#[derive(Debug, thiserror::Error)]
enum SyntaxErrorKind {
    #[error(transparent)]
    Turtle(#[from] TurtleSyntaxError),
    #[error(transparent)]
    RdfXml(#[from] RdfXmlSyntaxError),
    #[error(transparent)]
    JsonLd(#[from] JsonLdSyntaxError),
    #[error(transparent)]
    Rdfa(#[from] RdfaSyntaxError),
}

impl RdfSyntaxError {
    /// The location of the error inside of the file, for the line-based formats.
    #[inline]
    pub fn location(&self) -> Option<Range<TextPosition>> {
        match &self.0 {
            SyntaxErrorKind::Turtle(e) => Some(e.location()),
            SyntaxErrorKind::RdfXml(_) | SyntaxErrorKind::JsonLd(_) | SyntaxErrorKind::Rdfa(_) => {
                None
            }
        }
    }

    /// The byte offset of the error, if known.
    #[inline]
    pub fn position(&self) -> Option<u64> {
        match &self.0 {
            SyntaxErrorKind::Turtle(e) => Some(e.location().start.offset),
            SyntaxErrorKind::RdfXml(e) => e.position(),
            SyntaxErrorKind::Rdfa(e) => e.position(),
            SyntaxErrorKind::JsonLd(_) => None,
        }
    }

    /// The prefix name if this error is caused by a prefixed name using an undeclared prefix.
    #[inline]
    pub fn unknown_prefix(&self) -> Option<&str> {
        match &self.0 {
            SyntaxErrorKind::Turtle(e) => e.unknown_prefix(),
            SyntaxErrorKind::RdfXml(e) => e.unknown_prefix(),
            SyntaxErrorKind::JsonLd(_) | SyntaxErrorKind::Rdfa(_) => None,
        }
    }
}

impl From<TurtleSyntaxError> for RdfSyntaxError {
    #[inline]
    fn from(error: TurtleSyntaxError) -> Self {
        Self(error.into())
    }
}

impl From<RdfXmlSyntaxError> for RdfSyntaxError {
    #[inline]
    fn from(error: RdfXmlSyntaxError) -> Self {
        Self(error.into())
    }
}

impl From<JsonLdSyntaxError> for RdfSyntaxError {
    #[inline]
    fn from(error: JsonLdSyntaxError) -> Self {
        Self(error.into())
    }
}

impl From<RdfaSyntaxError> for RdfSyntaxError {
    #[inline]
    fn from(error: RdfaSyntaxError) -> Self {
        Self(error.into())
    }
}

impl From<RdfSyntaxError> for io::Error {
    #[inline]
    fn from(error: RdfSyntaxError) -> Self {
        match error.0 {
            SyntaxErrorKind::Turtle(error) => error.into(),
            SyntaxErrorKind::RdfXml(error) => error.into(),
            SyntaxErrorKind::JsonLd(error) => error.into(),
            SyntaxErrorKind::Rdfa(error) => error.into(),
        }
    }
}

/// The reason a conversion did not complete.
#[derive(Debug, thiserror::Error)]
pub enum ConvertError {
    /// The input or output media type is not usable. Reported before any I/O.
    #[error(transparent)]
    UnsupportedFormat(#[from] UnsupportedFormatError),
    /// A term can't be built or can't be written in the output format.
    #[error(transparent)]
    InvalidTerm(#[from] InvalidTermError),
    /// The input is malformed.
    #[error(transparent)]
    Parse(RdfSyntaxError),
    /// The input uses a prefixed name whose prefix has not been declared.
    #[error(transparent)]
    UnknownPrefix(RdfSyntaxError),
    /// Reading the input or writing the output failed.
    #[error(transparent)]
    Io(io::Error),
    /// The conversion was stopped before its end.
    #[error("the conversion has been cancelled")]
    Cancelled,
}

impl ConvertError {
    pub(crate) fn invalid_iri(iri: &str, error: IriParseError) -> Self {
        Self::InvalidTerm(InvalidTermError::msg(format!(
            "Invalid IRI '{iri}': {error}"
        )))
    }

    /// Maps an error raised while writing.
    ///
    /// Serializers report unwritable terms as [`io::ErrorKind::InvalidInput`] errors
    /// wrapping an [`InvalidTermError`] and a closed sink shows up as a broken pipe.
    pub(crate) fn from_output(error: io::Error) -> Self {
        match error.kind() {
            io::ErrorKind::BrokenPipe => Self::Cancelled,
            io::ErrorKind::InvalidInput
                if error
                    .get_ref()
                    .is_some_and(|inner| inner.is::<InvalidTermError>()) =>
            {
                match error.into_inner().map(|inner| inner.downcast::<InvalidTermError>()) {
                    Some(Ok(inner)) => Self::InvalidTerm(*inner),
                    Some(Err(inner)) => Self::Io(io::Error::new(io::ErrorKind::InvalidInput, inner)),
                    None => Self::Io(io::ErrorKind::InvalidInput.into()),
                }
            }
            _ => Self::Io(error),
        }
    }
}

impl From<RdfParseError> for ConvertError {
    #[inline]
    fn from(error: RdfParseError) -> Self {
        match error {
            RdfParseError::Io(error) => Self::Io(error),
            RdfParseError::Syntax(error) => {
                if error.unknown_prefix().is_some() {
                    Self::UnknownPrefix(error)
                } else {
                    Self::Parse(error)
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::panic_in_result_fn)]

    use super::*;

    #[test]
    fn test_parse_only_message() {
        let error = UnsupportedFormatError::ParseOnly {
            media_type: "text/html",
            name: "RDFa",
        };
        assert_eq!(
            error.to_string(),
            "text/html (RDFa) is not supported as an output format"
        );
    }

    #[test]
    fn test_output_errors() {
        assert!(matches!(
            ConvertError::from_output(io::ErrorKind::BrokenPipe.into()),
            ConvertError::Cancelled
        ));
        assert!(matches!(
            ConvertError::from_output(io::Error::new(
                io::ErrorKind::InvalidInput,
                InvalidTermError::msg("no named graph in Turtle")
            )),
            ConvertError::InvalidTerm(_)
        ));
        assert!(matches!(
            ConvertError::from_output(io::Error::new(io::ErrorKind::InvalidInput, "other")),
            ConvertError::Io(_)
        ));
        assert!(matches!(
            ConvertError::from_output(io::ErrorKind::StorageFull.into()),
            ConvertError::Io(_)
        ));
    }

    #[test]
    fn test_unknown_prefix_is_told_apart() -> Result<(), io::Error> {
        let error = rdfttl::TurtleParser::new()
            .for_slice("foo:s <http://example.com/p> <http://example.com/o> .")
            .find_map(Result::err)
            .ok_or_else(|| io::Error::other("an error was expected"))?;
        let error = ConvertError::from(RdfParseError::Syntax(error.into()));
        let ConvertError::UnknownPrefix(error) = error else {
            panic!("unexpected error {error:?}")
        };
        assert_eq!(error.unknown_prefix(), Some("foo"));
        assert_eq!(error.location().map(|l| l.start.line), Some(0));
        Ok(())
    }

    #[test]
    fn test_undeclared_xml_prefix_is_an_unknown_prefix() -> Result<(), io::Error> {
        let error = rdfxml::RdfXmlParser::new()
            .for_slice(r#"<rdf:RDF xmlns:rdf="http://www.w3.org/1999/02/22-rdf-syntax-ns#"><foo:Thing/></rdf:RDF>"#)
            .find_map(Result::err)
            .ok_or_else(|| io::Error::other("an error was expected"))?;
        let error = ConvertError::from(RdfParseError::Syntax(error.into()));
        let ConvertError::UnknownPrefix(error) = error else {
            panic!("unexpected error {error:?}")
        };
        assert_eq!(error.unknown_prefix(), Some("foo"));
        Ok(())
    }
}
