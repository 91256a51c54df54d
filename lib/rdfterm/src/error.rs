use crate::vocab::rdf;
use oxilangtag::LanguageTagParseError;
use oxiri::IriParseError;

/// An error raised when a term or a statement would violate a construction rule.
///
/// It is returned by the validating constructors ([`NamedNode::new`](crate::NamedNode::new),
/// [`Literal::new`](crate::Literal::new)...) and by serializers that are given a term
/// their grammar cannot express.
#[derive(Debug, thiserror::Error)]
#[error(transparent)]
pub struct InvalidTermError(InvalidTermErrorKind);

#[derive(Debug, thiserror::Error)]
enum InvalidTermErrorKind {
    #[error("IRIs must not be empty")]
    EmptyIri,
    #[error("Invalid IRI '{iri}': {error}")]
    Iri {
        iri: String,
        #[source]
        error: IriParseError,
    },
    #[error("The blank node identifier '{0}' is invalid")]
    BlankNodeId(String),
    #[error("The variable name '{0}' is invalid")]
    VariableName(String),
    #[error("Invalid language tag '{tag}': {error}")]
    LanguageTag {
        tag: String,
        #[source]
        error: LanguageTagParseError,
    },
    #[error("A language tag is only allowed on {} literals, not on <{datatype}> ones", rdf::LANG_STRING)]
    LanguageOnNonLangString { datatype: String },
    #[error("The datatype of a literal without a language tag must not be {}", rdf::LANG_STRING)]
    LangStringWithoutLanguage,
    #[error("{0}")]
    Msg(String),
}

impl InvalidTermError {
    /// Builds an error from a printable error message.
    #[inline]
    pub fn msg(msg: impl Into<String>) -> Self {
        Self(InvalidTermErrorKind::Msg(msg.into()))
    }

    pub(crate) fn empty_iri() -> Self {
        Self(InvalidTermErrorKind::EmptyIri)
    }

    pub(crate) fn invalid_iri(iri: String, error: IriParseError) -> Self {
        Self(InvalidTermErrorKind::Iri { iri, error })
    }

    pub(crate) fn invalid_blank_node_id(id: String) -> Self {
        Self(InvalidTermErrorKind::BlankNodeId(id))
    }

    pub(crate) fn invalid_variable_name(name: String) -> Self {
        Self(InvalidTermErrorKind::VariableName(name))
    }

    pub(crate) fn invalid_language_tag(tag: String, error: LanguageTagParseError) -> Self {
        Self(InvalidTermErrorKind::LanguageTag { tag, error })
    }

    pub(crate) fn language_on_non_lang_string(datatype: String) -> Self {
        Self(InvalidTermErrorKind::LanguageOnNonLangString { datatype })
    }

    pub(crate) fn lang_string_without_language() -> Self {
        Self(InvalidTermErrorKind::LangStringWithoutLanguage)
    }
}

/// An error raised when a prefixed name uses a prefix that is not in the [`PrefixTable`](crate::PrefixTable).
#[derive(Debug, Clone, thiserror::Error)]
#[error("The prefix {prefix}: has not been declared")]
pub struct UnknownPrefixError {
    prefix: String,
}

impl UnknownPrefixError {
    #[inline]
    pub(crate) fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    /// The prefix that was not found.
    #[inline]
    pub fn prefix(&self) -> &str {
        &self.prefix
    }
}
