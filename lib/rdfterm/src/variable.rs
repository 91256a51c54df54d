use crate::blank_node::{is_pn_chars, is_pn_chars_base};
use crate::error::InvalidTermError;
use std::fmt;

/// An [N3](https://w3c.github.io/N3/spec/) quantified variable.
///
/// Variables only appear in statements read from or written to N3 documents.
///
/// The default string formatter is returning an N3 and SPARQL compatible representation:
/// ```
/// use rdfterm::Variable;
///
/// assert_eq!("?foo", Variable::new("foo")?.to_string());
/// # Result::<_,rdfterm::InvalidTermError>::Ok(())
/// ```
#[derive(Eq, PartialEq, Ord, PartialOrd, Debug, Clone, Hash)]
pub struct Variable {
    name: String,
}

impl Variable {
    /// Creates a variable from its name.
    ///
    /// The name must be valid according to the SPARQL `VARNAME` rule.
    pub fn new(name: impl Into<String>) -> Result<Self, InvalidTermError> {
        let name = name.into();
        if !is_valid_variable_name(&name) {
            return Err(InvalidTermError::invalid_variable_name(name));
        }
        Ok(Self::new_unchecked(name))
    }

    /// Creates a variable without validating its name.
    ///
    /// [`Variable::new()`] is a safe version of this constructor and should be used for untrusted data.
    #[inline]
    pub fn new_unchecked(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn into_string(self) -> String {
        self.name
    }
}

impl fmt::Display for Variable {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "?{}", self.name)
    }
}

fn is_valid_variable_name(name: &str) -> bool {
    let mut chars = name.chars();
    let Some(front) = chars.next() else {
        return false;
    };
    (front == '_' || front.is_ascii_digit() || is_pn_chars_base(front))
        && chars.all(|c| c != '-' && is_pn_chars(c))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation() {
        Variable::new("x").unwrap();
        Variable::new("_1").unwrap();
        Variable::new("").unwrap_err();
        Variable::new("a-b").unwrap_err();
        Variable::new("?a").unwrap_err();
    }
}
