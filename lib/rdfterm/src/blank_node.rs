use crate::error::InvalidTermError;
use rand::random;
use std::fmt;

/// An RDF [blank node](https://www.w3.org/TR/rdf11-concepts/#dfn-blank-node).
///
/// [`BlankNode::default()`] draws a fresh random identifier. Parsers keep the labels of the
/// documents they read, so two nodes are equal when their identifiers are:
/// ```
/// use rdfterm::BlankNode;
///
/// assert_eq!(BlankNode::new("b0")?.to_string(), "_:b0");
/// assert_ne!(BlankNode::default(), BlankNode::default());
/// # Result::<_,rdfterm::InvalidTermError>::Ok(())
/// ```
#[derive(Eq, PartialEq, Ord, PartialOrd, Debug, Clone, Hash)]
pub struct BlankNode {
    id: String,
}

impl BlankNode {
    /// Fails if `id` is not a Turtle `BLANK_NODE_LABEL` without its `_:` prefix.
    pub fn new(id: impl Into<String>) -> Result<Self, InvalidTermError> {
        let id = id.into();
        if is_valid_blank_node_identifier(&id) {
            Ok(Self::new_unchecked(id))
        } else {
            Err(InvalidTermError::invalid_blank_node_id(id))
        }
    }

    #[inline]
    pub fn new_unchecked(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }

    /// The identifier, without `_:`.
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.id
    }

    #[inline]
    pub fn into_string(self) -> String {
        self.id
    }
}

impl fmt::Display for BlankNode {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("_:")?;
        f.write_str(&self.id)
    }
}

impl Default for BlankNode {
    /// A random 128 bits identifier in hexadecimal.
    fn default() -> Self {
        // identifiers starting with a letter are also XML names, usable as rdf:nodeID
        let id = random::<u128>() | (0xa_u128 << 124);
        Self::new_unchecked(format!("{id:x}"))
    }
}

fn is_valid_blank_node_identifier(id: &str) -> bool {
    let mut chars = id.chars();
    chars
        .next()
        .is_some_and(|front| front == '_' || front.is_ascii_digit() || is_pn_chars_base(front))
        && chars.all(|c| c == '.' || is_pn_chars(c))
        && !id.ends_with('.')
}

pub(crate) fn is_pn_chars_base(c: char) -> bool {
    matches!(c,
        'A'..='Z'
        | 'a'..='z'
        | '\u{00C0}'..='\u{00D6}'
        | '\u{00D8}'..='\u{00F6}'
        | '\u{00F8}'..='\u{02FF}'
        | '\u{0370}'..='\u{037D}'
        | '\u{037F}'..='\u{1FFF}'
        | '\u{200C}'..='\u{200D}'
        | '\u{2070}'..='\u{218F}'
        | '\u{2C00}'..='\u{2FEF}'
        | '\u{3001}'..='\u{D7FF}'
        | '\u{F900}'..='\u{FDCF}'
        | '\u{FDF0}'..='\u{FFFD}'
        | '\u{10000}'..='\u{EFFFF}')
}

pub(crate) fn is_pn_chars(c: char) -> bool {
    is_pn_chars_base(c)
        || matches!(c,
            '-' | '_' | '0'..='9' | '\u{00B7}' | '\u{0300}'..='\u{036F}' | '\u{203F}'..='\u{2040}')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation() {
        BlankNode::new("b1").unwrap();
        BlankNode::new("1b").unwrap();
        BlankNode::new("a.b").unwrap();
        BlankNode::new("").unwrap_err();
        BlankNode::new("a.").unwrap_err();
        BlankNode::new("a b").unwrap_err();
        BlankNode::new("-a").unwrap_err();
    }

    #[test]
    fn test_default_is_xml_name() {
        for _ in 0..32 {
            let node = BlankNode::default();
            assert!(matches!(node.as_str().as_bytes()[0], b'a'..=b'f'));
            BlankNode::new(node.as_str()).unwrap();
        }
    }
}
