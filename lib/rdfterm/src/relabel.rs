use crate::blank_node::BlankNode;
use std::collections::HashMap;
use std::fmt::Write;

/// Mints the blank node labels of one serialization session.
///
/// Labels are `b0`, `b1`... given in first-seen order, so that the output of a session
/// does not depend on the (usually random) labels minted by the parser.
///
/// At most [`capacity`](Self::with_capacity) labels are remembered, so that the memory of a
/// streaming session does not grow with its input. Once that many blank nodes have been seen,
/// the next ones are labelled `b_` followed by the hexadecimal encoding of their own label:
/// the labels stay distinct and stable within the session without being stored.
///
/// ```
/// use rdfterm::{BlankNode, BlankNodeRelabeler};
///
/// let mut relabeler = BlankNodeRelabeler::new();
/// let first = BlankNode::default();
/// assert_eq!(relabeler.label(&first), "b0");
/// assert_eq!(relabeler.label(&BlankNode::default()), "b1");
/// assert_eq!(relabeler.label(&first), "b0");
/// ```
#[derive(Debug, Clone)]
pub struct BlankNodeRelabeler {
    labels: HashMap<BlankNode, String>,
    capacity: usize,
    /// Label of a node past the capacity
    overflow: String,
}

impl BlankNodeRelabeler {
    pub const DEFAULT_CAPACITY: usize = 1 << 16;

    #[inline]
    pub fn new() -> Self {
        Self::with_capacity(Self::DEFAULT_CAPACITY)
    }

    /// A relabeler remembering the first `capacity` blank nodes it sees.
    #[inline]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            labels: HashMap::new(),
            capacity,
            overflow: String::new(),
        }
    }

    /// The label of `node` in this session.
    pub fn label(&mut self, node: &BlankNode) -> &str {
        if self.labels.len() >= self.capacity && !self.labels.contains_key(node) {
            self.overflow.clear();
            self.overflow.push_str("b_");
            for byte in node.as_str().bytes() {
                let _ = write!(self.overflow, "{byte:02x}");
            }
            return &self.overflow;
        }
        let next = self.labels.len();
        self.labels
            .entry(node.clone())
            .or_insert_with(|| format!("b{next}"))
    }

    /// Returns `node` with its session label.
    pub fn relabel(&mut self, node: &BlankNode) -> BlankNode {
        BlankNode::new_unchecked(self.label(node))
    }

    /// The number of labels remembered, never more than the capacity.
    #[inline]
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}

impl Default for BlankNodeRelabeler {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_is_bounded() {
        let mut relabeler = BlankNodeRelabeler::with_capacity(2);
        let nodes = (0..100).map(|_| BlankNode::default()).collect::<Vec<_>>();
        let labels = nodes
            .iter()
            .map(|node| relabeler.label(node).to_owned())
            .collect::<Vec<_>>();
        assert_eq!(relabeler.len(), 2);
        assert_eq!(labels[..2], ["b0", "b1"]);
        let mut distinct = labels.clone();
        distinct.sort();
        distinct.dedup();
        assert_eq!(distinct.len(), nodes.len());
        for (node, label) in nodes.iter().zip(&labels) {
            assert_eq!(relabeler.label(node), label);
            assert!(BlankNode::new(label).is_ok(), "{label}");
        }
        assert_eq!(relabeler.len(), 2);
    }

    #[test]
    fn test_overflow_labels_are_hex_encoded() -> Result<(), crate::InvalidTermError> {
        let mut relabeler = BlankNodeRelabeler::with_capacity(0);
        assert_eq!(relabeler.label(&BlankNode::new("a.1")?), "b_612e31");
        assert!(relabeler.is_empty());
        Ok(())
    }
}
