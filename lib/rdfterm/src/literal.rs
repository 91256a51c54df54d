use crate::error::InvalidTermError;
use crate::named_node::{NamedNode, NamedNodeRef};
use crate::vocab::{rdf, xsd};
use oxilangtag::LanguageTag;
use std::fmt::{self, Write};

/// An RDF [literal](https://www.w3.org/TR/rdf11-concepts/#dfn-literal).
///
/// It is displayed the N-Triples way:
/// ```
/// use rdfterm::Literal;
/// use rdfterm::vocab::xsd;
///
/// assert_eq!(Literal::new_simple_literal("a\nb").to_string(), r#""a\nb""#);
/// assert_eq!(
///     Literal::new_typed_literal("1", xsd::INTEGER).to_string(),
///     r#""1"^^<http://www.w3.org/2001/XMLSchema#integer>"#
/// );
/// assert_eq!(
///     Literal::new_language_tagged_literal("chat", "FR")?.to_string(),
///     r#""chat"@fr""#
/// );
/// # Result::<(), rdfterm::InvalidTermError>::Ok(())
/// ```
#[derive(Eq, PartialEq, Ord, PartialOrd, Debug, Clone, Hash)]
pub struct Literal {
    value: String,
    annotation: Annotation,
}

/// What follows the lexical form.
///
/// `xsd:string` is never stored as `Typed`, so that equality stays structural.
#[derive(Eq, PartialEq, Ord, PartialOrd, Debug, Clone, Hash)]
enum Annotation {
    None,
    Language(String),
    Typed(NamedNode),
}

impl Literal {
    /// Builds a literal from a lexical form, a datatype and an optional language tag.
    ///
    /// A language tag requires the `rdf:langString` datatype and the reverse.
    ///
    /// ```
    /// use rdfterm::Literal;
    /// use rdfterm::vocab::{rdf, xsd};
    ///
    /// assert_eq!(
    ///     Literal::new("foo", rdf::LANG_STRING.into_owned(), Some("EN".into()))?,
    ///     Literal::new_language_tagged_literal("foo", "en")?
    /// );
    /// assert!(Literal::new("foo", xsd::STRING.into_owned(), Some("en".into())).is_err());
    /// # Result::<(), rdfterm::InvalidTermError>::Ok(())
    /// ```
    pub fn new(
        lexical: impl Into<String>,
        datatype: NamedNode,
        language: Option<String>,
    ) -> Result<Self, InvalidTermError> {
        let is_lang_string = datatype == rdf::LANG_STRING;
        match (language, is_lang_string) {
            (Some(language), true) => Self::new_language_tagged_literal(lexical, language),
            (Some(_), false) => Err(InvalidTermError::language_on_non_lang_string(
                datatype.into_string(),
            )),
            (None, true) => Err(InvalidTermError::lang_string_without_language()),
            (None, false) => Ok(Self::new_typed_literal(lexical, datatype)),
        }
    }

    #[inline]
    pub fn new_simple_literal(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            annotation: Annotation::None,
        }
    }

    /// A literal typed `xsd:string` is a simple literal.
    ///
    /// The datatype is not checked: parsers reading a datatype from their input go through
    /// [`Literal::new`] or [`Literal::new_checked_typed_literal`] so that `rdf:langString`
    /// without a language tag is refused.
    #[inline]
    pub fn new_typed_literal(value: impl Into<String>, datatype: impl Into<NamedNode>) -> Self {
        let datatype = datatype.into();
        Self {
            value: value.into(),
            annotation: if datatype == xsd::STRING {
                Annotation::None
            } else {
                Annotation::Typed(datatype)
            },
        }
    }

    /// Same as [`Literal::new_typed_literal`] but fails on `rdf:langString`, which requires a language tag.
    ///
    /// ```
    /// use rdfterm::Literal;
    /// use rdfterm::vocab::{rdf, xsd};
    ///
    /// assert!(Literal::new_checked_typed_literal("1", xsd::INTEGER).is_ok());
    /// assert!(Literal::new_checked_typed_literal("x", rdf::LANG_STRING).is_err());
    /// ```
    #[inline]
    pub fn new_checked_typed_literal(
        value: impl Into<String>,
        datatype: impl Into<NamedNode>,
    ) -> Result<Self, InvalidTermError> {
        let datatype = datatype.into();
        if datatype == rdf::LANG_STRING {
            return Err(InvalidTermError::lang_string_without_language());
        }
        Ok(Self::new_typed_literal(value, datatype))
    }

    /// Validates the tag against BCP47 and stores it lowercased.
    #[inline]
    pub fn new_language_tagged_literal(
        value: impl Into<String>,
        language: impl Into<String>,
    ) -> Result<Self, InvalidTermError> {
        let language = language.into().to_ascii_lowercase();
        match LanguageTag::parse(language.as_str()) {
            Ok(_) => Ok(Self::new_language_tagged_literal_unchecked(value, language)),
            Err(error) => Err(InvalidTermError::invalid_language_tag(language, error)),
        }
    }

    /// The caller ensures `language` is a lowercase BCP47 tag.
    #[inline]
    pub fn new_language_tagged_literal_unchecked(
        value: impl Into<String>,
        language: impl Into<String>,
    ) -> Self {
        Self {
            value: value.into(),
            annotation: Annotation::Language(language.into()),
        }
    }

    /// The [lexical form](https://www.w3.org/TR/rdf11-concepts/#dfn-lexical-form).
    #[inline]
    pub fn value(&self) -> &str {
        &self.value
    }

    #[inline]
    pub fn language(&self) -> Option<&str> {
        match &self.annotation {
            Annotation::Language(language) => Some(language),
            _ => None,
        }
    }

    /// `rdf:langString` for language-tagged strings and `xsd:string` for simple literals.
    #[inline]
    pub fn datatype(&self) -> NamedNodeRef<'_> {
        match &self.annotation {
            Annotation::None => xsd::STRING,
            Annotation::Language(_) => rdf::LANG_STRING,
            Annotation::Typed(datatype) => datatype.as_ref(),
        }
    }

    /// Simple literals and language-tagged strings, the ones written without `^^`.
    #[inline]
    pub fn is_plain(&self) -> bool {
        !matches!(self.annotation, Annotation::Typed(_))
    }

    /// Splits this literal into its value, its explicit datatype and its language tag.
    #[inline]
    pub fn destruct(self) -> (String, Option<NamedNode>, Option<String>) {
        match self.annotation {
            Annotation::None => (self.value, None, None),
            Annotation::Language(language) => (self.value, None, Some(language)),
            Annotation::Typed(datatype) => (self.value, Some(datatype), None),
        }
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        print_quoted_str(&self.value, f)?;
        match &self.annotation {
            Annotation::None => Ok(()),
            Annotation::Language(language) => write!(f, "@{language}"),
            Annotation::Typed(datatype) => write!(f, "^^{datatype}"),
        }
    }
}

impl From<&str> for Literal {
    #[inline]
    fn from(value: &str) -> Self {
        Self::new_simple_literal(value)
    }
}

impl From<String> for Literal {
    #[inline]
    fn from(value: String) -> Self {
        Self::new_simple_literal(value)
    }
}

impl From<bool> for Literal {
    #[inline]
    fn from(value: bool) -> Self {
        Self::new_typed_literal(value.to_string(), xsd::BOOLEAN)
    }
}

impl From<i64> for Literal {
    #[inline]
    fn from(value: i64) -> Self {
        Self::new_typed_literal(value.to_string(), xsd::INTEGER)
    }
}

/// Writes `string` between double quotes, escaped as an N-Triples `STRING_LITERAL_QUOTE`.
pub fn print_quoted_str(string: &str, f: &mut impl Write) -> fmt::Result {
    f.write_char('"')?;
    for c in string.chars() {
        let escape = match c {
            '"' => "\\\"",
            '\\' => "\\\\",
            '\n' => "\\n",
            '\r' => "\\r",
            '\t' => "\\t",
            '\u{08}' => "\\b",
            '\u{0c}' => "\\f",
            '\0'..='\u{1f}' | '\u{7f}' => {
                write!(f, "\\u{:04X}", u32::from(c))?;
                continue;
            }
            _ => {
                f.write_char(c)?;
                continue;
            }
        };
        f.write_str(escape)?;
    }
    f.write_char('"')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_xsd_string_is_simple() {
        assert_eq!(
            Literal::new_simple_literal("foo"),
            Literal::new_typed_literal("foo", xsd::STRING)
        );
        assert_ne!(
            Literal::new_simple_literal("foo"),
            Literal::new_typed_literal("foo", xsd::TOKEN)
        );
        assert!(Literal::new_typed_literal("foo", xsd::STRING).is_plain());
    }

    #[test]
    fn test_language_tag_rules() -> Result<(), InvalidTermError> {
        let literal = Literal::new_language_tagged_literal("foo", "en-US")?;
        assert_eq!(literal.language(), Some("en-us"));
        assert_eq!(literal.datatype(), rdf::LANG_STRING);
        Literal::new_language_tagged_literal("foo", "not a tag").unwrap_err();
        Literal::new("foo", xsd::INTEGER.into_owned(), Some("en".into())).unwrap_err();
        Literal::new("foo", rdf::LANG_STRING.into_owned(), None).unwrap_err();
        Literal::new_checked_typed_literal("foo", rdf::LANG_STRING).unwrap_err();
        Ok(())
    }

    #[test]
    fn test_display_escaping() {
        assert_eq!(
            Literal::new_simple_literal("a\"b\\c\u{1}").to_string(),
            "\"a\\\"b\\\\c\\u0001\""
        );
    }

    #[test]
    fn test_destruct() {
        let (value, datatype, language) = Literal::from(12_i64).destruct();
        assert_eq!(value, "12");
        assert_eq!(datatype.as_ref().map(NamedNode::as_ref), Some(xsd::INTEGER));
        assert_eq!(language, None);
    }
}
