use json_event_parser::{JsonParseError, JsonSyntaxError};
use oxilangtag::LanguageTagParseError;
use oxiri::IriParseError;
use rdfterm::InvalidTermError;
use std::io;

/// Error returned by [`JsonLdParser`](crate::JsonLdParser).
#[derive(Debug, thiserror::Error)]
pub enum JsonLdParseError {
    /// The underlying reader failed.
    #[error(transparent)]
    Io(#[from] io::Error),
    /// The document is not valid JSON or is not valid JSON-LD.
    #[error(transparent)]
    Syntax(#[from] JsonLdSyntaxError),
}

impl From<JsonParseError> for JsonLdParseError {
    fn from(error: JsonParseError) -> Self {
        match error {
            JsonParseError::Syntax(error) => Self::Syntax(JsonLdSyntaxError(Kind::Json(error))),
            JsonParseError::Io(error) => Self::Io(error),
        }
    }
}

impl From<JsonLdParseError> for io::Error {
    fn from(error: JsonLdParseError) -> Self {
        match error {
            JsonLdParseError::Syntax(error) => error.into(),
            JsonLdParseError::Io(error) => error,
        }
    }
}

/// A JSON-LD document the parser refuses.
///
/// JSON-LD errors carry no position: the JSON tokenizer does not expose the offsets
/// of the values the expansion works on.
#[derive(Debug, thiserror::Error)]
#[error(transparent)]
pub struct JsonLdSyntaxError(Kind);

#[derive(Debug, thiserror::Error)]
enum Kind {
    #[error(transparent)]
    Json(JsonSyntaxError),
    #[error("invalid IRI <{iri}>: {error}")]
    Iri {
        iri: String,
        #[source]
        error: IriParseError,
    },
    #[error("invalid language tag '{tag}': {error}")]
    LanguageTag {
        tag: String,
        #[source]
        error: LanguageTagParseError,
    },
    #[error(transparent)]
    Term(InvalidTermError),
    #[error("unsupported JSON-LD feature: {0}")]
    Unsupported(String),
    #[error("{0}")]
    Invalid(String),
}

impl JsonLdSyntaxError {
    pub(crate) fn msg(message: impl Into<String>) -> Self {
        Self(Kind::Invalid(message.into()))
    }

    pub(crate) fn unsupported(feature: impl Into<String>) -> Self {
        Self(Kind::Unsupported(feature.into()))
    }

    pub(crate) fn invalid_iri(iri: String, error: IriParseError) -> Self {
        Self(Kind::Iri { iri, error })
    }

    pub(crate) fn invalid_language_tag(tag: String, error: LanguageTagParseError) -> Self {
        Self(Kind::LanguageTag { tag, error })
    }

    /// The document is valid JSON-LD but uses a feature this parser does not implement,
    /// like remote contexts or `@json` literals.
    pub fn is_unsupported_feature(&self) -> bool {
        matches!(self.0, Kind::Unsupported(_))
    }
}

impl From<JsonSyntaxError> for JsonLdSyntaxError {
    fn from(error: JsonSyntaxError) -> Self {
        Self(Kind::Json(error))
    }
}

impl From<InvalidTermError> for JsonLdSyntaxError {
    fn from(error: InvalidTermError) -> Self {
        Self(Kind::Term(error))
    }
}

impl From<JsonLdSyntaxError> for io::Error {
    fn from(error: JsonLdSyntaxError) -> Self {
        Self::new(io::ErrorKind::InvalidData, error)
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::panic_in_result_fn)]

    use super::*;
    use crate::JsonLdParser;

    fn syntax_error(document: &str) -> JsonLdSyntaxError {
        for result in JsonLdParser::new().for_slice(document.as_bytes()) {
            if let Err(error) = result {
                return error;
            }
        }
        panic!("{document} should be rejected")
    }

    #[test]
    fn test_unsupported_features() {
        let error = syntax_error(r#"{"@context": "http://schema.org/", "name": "foo"}"#);
        assert!(error.is_unsupported_feature());
        assert_eq!(
            error.to_string(),
            "unsupported JSON-LD feature: remote context http://schema.org/"
        );
        let error = syntax_error(
            r#"{"@id": "http://example.com/s", "http://example.com/p": {"@value": {}, "@type": "@json"}}"#,
        );
        assert!(error.is_unsupported_feature());
    }

    #[test]
    fn test_invalid_documents() {
        let error = syntax_error(r#"{"@id": "http://example.com/s", "http://example.com/p": "#);
        assert!(!error.is_unsupported_feature());
        let error = syntax_error(
            r#"{"@id": "http://example.com/s", "http://example.com/p": {"@value": "a", "@language": "not a tag"}}"#,
        );
        assert!(error.to_string().starts_with("invalid language tag 'not a tag'"));
    }
}
