use crate::error::InvalidTermError;
use oxiri::IriRef;
use std::fmt;

/// An RDF [IRI](https://www.w3.org/TR/rdf11-concepts/#dfn-iri).
///
/// Documents read without a base IRI may leave relative references here.
/// ```
/// use rdfterm::NamedNode;
///
/// let node = NamedNode::new("http://example.com/foo")?;
/// assert_eq!(node.to_string(), "<http://example.com/foo>");
/// assert_eq!(node, "http://example.com/foo");
/// # Result::<_,rdfterm::InvalidTermError>::Ok(())
/// ```
#[derive(Eq, PartialEq, Ord, PartialOrd, Debug, Clone, Hash)]
pub struct NamedNode(String);

impl NamedNode {
    /// Checks that `iri` is a non empty IRI reference.
    pub fn new(iri: impl Into<String>) -> Result<Self, InvalidTermError> {
        let iri = iri.into();
        if iri.is_empty() {
            Err(InvalidTermError::empty_iri())
        } else if let Err(error) = IriRef::parse(iri.as_str()) {
            Err(InvalidTermError::invalid_iri(iri, error))
        } else {
            Ok(Self(iri))
        }
    }

    #[inline]
    pub fn new_unchecked(iri: impl Into<String>) -> Self {
        Self(iri.into())
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    #[inline]
    pub fn into_string(self) -> String {
        self.0
    }

    #[inline]
    pub fn as_ref(&self) -> NamedNodeRef<'_> {
        NamedNodeRef(&self.0)
    }
}

impl fmt::Display for NamedNode {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.as_ref().fmt(f)
    }
}

impl PartialEq<str> for NamedNode {
    #[inline]
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for NamedNode {
    #[inline]
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

/// A borrowed IRI, the type of the [`vocab`](crate::vocab) constants.
#[derive(Eq, PartialEq, Ord, PartialOrd, Debug, Clone, Copy, Hash)]
pub struct NamedNodeRef<'a>(&'a str);

impl<'a> NamedNodeRef<'a> {
    #[inline]
    pub const fn new_unchecked(iri: &'a str) -> Self {
        Self(iri)
    }

    #[inline]
    pub const fn as_str(self) -> &'a str {
        self.0
    }

    #[inline]
    pub fn into_owned(self) -> NamedNode {
        NamedNode(self.0.to_owned())
    }
}

impl fmt::Display for NamedNodeRef<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{}>", self.0)
    }
}

impl From<NamedNodeRef<'_>> for NamedNode {
    #[inline]
    fn from(node: NamedNodeRef<'_>) -> Self {
        node.into_owned()
    }
}

impl<'a> From<&'a NamedNode> for NamedNodeRef<'a> {
    #[inline]
    fn from(node: &'a NamedNode) -> Self {
        node.as_ref()
    }
}

impl PartialEq<NamedNode> for NamedNodeRef<'_> {
    #[inline]
    fn eq(&self, other: &NamedNode) -> bool {
        self.0 == other.0
    }
}

impl PartialEq<NamedNodeRef<'_>> for NamedNode {
    #[inline]
    fn eq(&self, other: &NamedNodeRef<'_>) -> bool {
        self.0 == other.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation() {
        NamedNode::new("http://example.com/foo").unwrap();
        NamedNode::new("a:s").unwrap();
        NamedNode::new("relative/path#frag").unwrap();
        NamedNode::new("").unwrap_err();
        NamedNode::new("http://example.com/foo bar").unwrap_err();
        NamedNode::new("<http://example.com/>").unwrap_err();
    }

    #[test]
    fn test_structural_equality() {
        assert_eq!(
            NamedNode::new_unchecked("http://example.com/"),
            NamedNode::new_unchecked(String::from("http://example.com/"))
        );
        assert_ne!(
            NamedNode::new_unchecked("http://example.com/"),
            NamedNode::new_unchecked("http://example.com")
        );
        assert_eq!(
            NamedNodeRef::new_unchecked("http://example.com/"),
            NamedNode::new_unchecked("http://example.com/")
        );
    }
}
