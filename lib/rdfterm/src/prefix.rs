use crate::error::UnknownPrefixError;
use crate::named_node::NamedNode;
use std::collections::HashMap;

/// An ordered mapping from prefix names to IRI namespaces.
///
/// The empty prefix name stands for the default namespace.
/// Inserting an already known prefix name replaces its namespace and keeps its position.
///
/// ```
/// use rdfterm::PrefixTable;
///
/// let mut prefixes = PrefixTable::new();
/// prefixes.insert("ex", "http://example.com/");
/// prefixes.insert("exv", "http://example.com/vocab#");
///
/// let iri = prefixes.resolve("exv", "name")?;
/// assert_eq!(iri.as_str(), "http://example.com/vocab#name");
/// assert_eq!(
///     prefixes.compact(iri.as_str(), |local| !local.is_empty()),
///     Some(("exv", "name"))
/// );
/// # Result::<_, Box<dyn std::error::Error>>::Ok(())
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PrefixTable {
    entries: Vec<(String, String)>,
    positions: HashMap<String, usize>,
}

impl PrefixTable {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces a prefix. Returns the previous namespace of this prefix if any.
    pub fn insert(
        &mut self,
        prefix: impl Into<String>,
        namespace: impl Into<String>,
    ) -> Option<String> {
        let prefix = prefix.into();
        let namespace = namespace.into();
        if let Some(position) = self.positions.get(&prefix) {
            return Some(std::mem::replace(
                &mut self.entries[*position].1,
                namespace,
            ));
        }
        self.positions.insert(prefix.clone(), self.entries.len());
        self.entries.push((prefix, namespace));
        None
    }

    /// The namespace associated with `prefix`.
    #[inline]
    pub fn get(&self, prefix: &str) -> Option<&str> {
        let position = self.positions.get(prefix)?;
        Some(self.entries[*position].1.as_str())
    }

    /// Iterates over the (prefix name, namespace) pairs in insertion order.
    #[inline]
    pub fn iter(&self) -> impl ExactSizeIterator<Item = (&str, &str)> {
        self.entries
            .iter()
            .map(|(prefix, namespace)| (prefix.as_str(), namespace.as_str()))
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Expands a prefixed name by concatenating the prefix namespace and the local name.
    pub fn resolve(&self, prefix: &str, local: &str) -> Result<NamedNode, UnknownPrefixError> {
        let namespace = self
            .get(prefix)
            .ok_or_else(|| UnknownPrefixError::new(prefix))?;
        Ok(NamedNode::new_unchecked(format!("{namespace}{local}")))
    }

    /// Splits `iri` into a (prefix name, local name) pair.
    ///
    /// The longest namespace that is a prefix of `iri` is selected.
    /// Returns `None` if no namespace matches or if `is_valid_local` rejects the remaining local name.
    pub fn compact<'a>(
        &'a self,
        iri: &'a str,
        is_valid_local: impl FnOnce(&str) -> bool,
    ) -> Option<(&'a str, &'a str)> {
        let (prefix, namespace) = self
            .entries
            .iter()
            .filter(|(_, namespace)| !namespace.is_empty() && iri.starts_with(namespace.as_str()))
            .max_by_key(|(_, namespace)| namespace.len())?;
        let local = &iri[namespace.len()..];
        is_valid_local(local).then_some((prefix.as_str(), local))
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for PrefixTable {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut table = Self::new();
        table.extend(iter);
        table
    }
}

impl<K: Into<String>, V: Into<String>> Extend<(K, V)> for PrefixTable {
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (prefix, namespace) in iter {
            self.insert(prefix, namespace);
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::panic_in_result_fn)]

    use super::*;

    #[test]
    fn test_insertion_order_and_replacement() {
        let mut table = PrefixTable::new();
        assert_eq!(table.insert("b", "http://example.com/b#"), None);
        assert_eq!(table.insert("a", "http://example.com/a#"), None);
        assert_eq!(
            table.insert("b", "http://example.com/b2#"),
            Some("http://example.com/b#".into())
        );
        assert_eq!(
            table.iter().collect::<Vec<_>>(),
            [("b", "http://example.com/b2#"), ("a", "http://example.com/a#")]
        );
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn test_resolve_unknown_prefix() {
        let table = PrefixTable::from_iter([("ex", "http://example.com/")]);
        let error = table.resolve("foo", "bar").unwrap_err();
        assert_eq!(error.prefix(), "foo");
        assert_eq!(error.to_string(), "The prefix foo: has not been declared");
    }

    #[test]
    fn test_compact_uses_longest_namespace() {
        let table = PrefixTable::from_iter([
            ("ex", "http://example.com/"),
            ("exv", "http://example.com/vocab/"),
            ("", "http://example.org/"),
        ]);
        assert_eq!(
            table.compact("http://example.com/vocab/name", |_| true),
            Some(("exv", "name"))
        );
        assert_eq!(
            table.compact("http://example.com/other", |_| true),
            Some(("ex", "other"))
        );
        assert_eq!(
            table.compact("http://example.org/x", |_| true),
            Some(("", "x"))
        );
        assert_eq!(table.compact("http://example.net/x", |_| true), None);
    }

    #[test]
    fn test_compact_rejects_invalid_local_name() {
        let table = PrefixTable::from_iter([
            ("ex", "http://example.com/"),
            ("exv", "http://example.com/vocab/"),
        ]);
        // The longest namespace wins even if a shorter one would give a valid local name
        assert_eq!(
            table.compact("http://example.com/vocab/a/b", |local| !local.contains('/')),
            None
        );
    }

    #[test]
    fn test_compact_then_resolve_is_identity() -> Result<(), UnknownPrefixError> {
        let table = PrefixTable::from_iter([
            ("schema", "http://schema.org/"),
            ("ex", "http://example.com/ns#"),
        ]);
        for iri in [
            "http://schema.org/name",
            "http://example.com/ns#Person",
            "http://example.com/ns#",
        ] {
            let (prefix, local) = table.compact(iri, |_| true).unwrap();
            assert_eq!(table.resolve(prefix, local)?.as_str(), iri);
        }
        Ok(())
    }
}
