use crate::blank_node::BlankNode;
use crate::literal::Literal;
use crate::named_node::{NamedNode, NamedNodeRef};
use crate::variable::Variable;
use std::fmt;

/// Implements `Display` and the `From` conversions of a term union.
///
/// Each variant wraps the type of the same name. `NamedNodeRef` converts into the unions with a
/// `NamedNode` variant, and `$from` lists the smaller unions whose variants are a subset of `$union`.
macro_rules! term_union {
    ($union:ident { $($variant:ident),+ } $(named: $named:ident)? $(from: $($from:ident { $($sub:ident),+ })+)?) => {
        impl fmt::Display for $union {
            #[inline]
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                match self {
                    $(Self::$variant(inner) => inner.fmt(f),)+
                }
            }
        }

        $(
            impl From<$variant> for $union {
                #[inline]
                fn from(inner: $variant) -> Self {
                    Self::$variant(inner)
                }
            }
        )+

        $(
            impl From<NamedNodeRef<'_>> for $union {
                #[inline]
                fn from(node: NamedNodeRef<'_>) -> Self {
                    Self::$named(node.into_owned())
                }
            }
        )?

        $($(
            impl From<$from> for $union {
                #[inline]
                fn from(inner: $from) -> Self {
                    match inner {
                        $($from::$sub(inner) => Self::$sub(inner),)+
                    }
                }
            }
        )+)?
    };
}

/// An IRI or a blank node: the resources the XML based syntaxes may describe.
#[derive(Eq, PartialEq, Ord, PartialOrd, Debug, Clone, Hash)]
pub enum NamedOrBlankNode {
    NamedNode(NamedNode),
    BlankNode(BlankNode),
}

term_union!(NamedOrBlankNode { NamedNode, BlankNode } named: NamedNode);

/// The terms allowed in subject position.
///
/// [`Variable`]s are only produced by the N3 parser.
#[derive(Eq, PartialEq, Ord, PartialOrd, Debug, Clone, Hash)]
pub enum Subject {
    NamedNode(NamedNode),
    BlankNode(BlankNode),
    Variable(Variable),
}

term_union!(
    Subject { NamedNode, BlankNode, Variable }
    named: NamedNode
    from: NamedOrBlankNode { NamedNode, BlankNode }
);

impl Subject {
    #[inline]
    pub fn is_named_node(&self) -> bool {
        matches!(self, Self::NamedNode(_))
    }

    #[inline]
    pub fn is_blank_node(&self) -> bool {
        matches!(self, Self::BlankNode(_))
    }

    #[inline]
    pub fn is_variable(&self) -> bool {
        matches!(self, Self::Variable(_))
    }
}

impl TryFrom<Term> for Subject {
    type Error = Literal;

    /// Gives the literal back if the term is one.
    #[inline]
    fn try_from(term: Term) -> Result<Self, Literal> {
        Ok(match term {
            Term::Literal(literal) => return Err(literal),
            Term::NamedNode(node) => node.into(),
            Term::BlankNode(node) => node.into(),
            Term::Variable(variable) => variable.into(),
        })
    }
}

/// The terms allowed in predicate position.
#[derive(Eq, PartialEq, Ord, PartialOrd, Debug, Clone, Hash)]
pub enum Predicate {
    NamedNode(NamedNode),
    Variable(Variable),
}

term_union!(Predicate { NamedNode, Variable } named: NamedNode);

impl PartialEq<NamedNodeRef<'_>> for Predicate {
    #[inline]
    fn eq(&self, other: &NamedNodeRef<'_>) -> bool {
        matches!(self, Self::NamedNode(node) if node == other)
    }
}

/// An RDF [term](https://www.w3.org/TR/rdf11-concepts/#dfn-rdf-term), or an N3 variable.
///
/// Two terms are equal if they are of the same kind with equal components: no literal value is normalized.
#[derive(Eq, PartialEq, Ord, PartialOrd, Debug, Clone, Hash)]
pub enum Term {
    NamedNode(NamedNode),
    BlankNode(BlankNode),
    Literal(Literal),
    Variable(Variable),
}

term_union!(
    Term { NamedNode, BlankNode, Literal, Variable }
    named: NamedNode
    from: NamedOrBlankNode { NamedNode, BlankNode }
        Subject { NamedNode, BlankNode, Variable }
        Predicate { NamedNode, Variable }
);

impl Term {
    #[inline]
    pub fn is_blank_node(&self) -> bool {
        matches!(self, Self::BlankNode(_))
    }

    #[inline]
    pub fn is_literal(&self) -> bool {
        matches!(self, Self::Literal(_))
    }

    #[inline]
    pub fn is_variable(&self) -> bool {
        matches!(self, Self::Variable(_))
    }
}

impl PartialEq<NamedNodeRef<'_>> for Term {
    #[inline]
    fn eq(&self, other: &NamedNodeRef<'_>) -> bool {
        matches!(self, Self::NamedNode(node) if node == other)
    }
}

/// The graph a statement belongs to.
///
/// N3 formulas are read as graphs named by a blank node.
#[derive(Eq, PartialEq, Ord, PartialOrd, Debug, Clone, Hash, Default)]
pub enum GraphName {
    NamedNode(NamedNode),
    BlankNode(BlankNode),
    #[default]
    DefaultGraph,
}

impl GraphName {
    #[inline]
    pub fn is_named_node(&self) -> bool {
        matches!(self, Self::NamedNode(_))
    }

    #[inline]
    pub fn is_blank_node(&self) -> bool {
        matches!(self, Self::BlankNode(_))
    }

    #[inline]
    pub fn is_default_graph(&self) -> bool {
        matches!(self, Self::DefaultGraph)
    }
}

impl fmt::Display for GraphName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NamedNode(node) => node.fmt(f),
            Self::BlankNode(node) => node.fmt(f),
            Self::DefaultGraph => f.write_str("DEFAULT"),
        }
    }
}

impl From<NamedNode> for GraphName {
    #[inline]
    fn from(node: NamedNode) -> Self {
        Self::NamedNode(node)
    }
}

impl From<NamedNodeRef<'_>> for GraphName {
    #[inline]
    fn from(node: NamedNodeRef<'_>) -> Self {
        node.into_owned().into()
    }
}

impl From<BlankNode> for GraphName {
    #[inline]
    fn from(node: BlankNode) -> Self {
        Self::BlankNode(node)
    }
}

impl From<NamedOrBlankNode> for GraphName {
    #[inline]
    fn from(node: NamedOrBlankNode) -> Self {
        match node {
            NamedOrBlankNode::NamedNode(node) => node.into(),
            NamedOrBlankNode::BlankNode(node) => node.into(),
        }
    }
}

/// A statement of the default graph.
///
/// It is displayed the N-Triples way, without the final dot:
/// ```
/// use rdfterm::{NamedNode, Triple};
///
/// let triple = Triple::new(
///     NamedNode::new("http://example.com/s")?,
///     NamedNode::new("http://example.com/p")?,
///     NamedNode::new("http://example.com/o")?,
/// );
/// assert_eq!(
///     triple.to_string(),
///     "<http://example.com/s> <http://example.com/p> <http://example.com/o>"
/// );
/// # Result::<_,rdfterm::InvalidTermError>::Ok(())
/// ```
#[derive(Eq, PartialEq, Ord, PartialOrd, Debug, Clone, Hash)]
pub struct Triple {
    pub subject: Subject,
    pub predicate: Predicate,
    pub object: Term,
}

impl Triple {
    #[inline]
    pub fn new(
        subject: impl Into<Subject>,
        predicate: impl Into<Predicate>,
        object: impl Into<Term>,
    ) -> Self {
        Self {
            subject: subject.into(),
            predicate: predicate.into(),
            object: object.into(),
        }
    }

    /// Moves this triple into the graph `graph_name`.
    #[inline]
    pub fn in_graph(self, graph_name: impl Into<GraphName>) -> Quad {
        let Self {
            subject,
            predicate,
            object,
        } = self;
        Quad::new(subject, predicate, object, graph_name)
    }
}

impl fmt::Display for Triple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.subject, self.predicate, self.object)
    }
}

/// A triple together with the graph it belongs to.
///
/// It is displayed the N-Quads way, the default graph being omitted:
/// ```
/// use rdfterm::{NamedNode, Quad};
///
/// let quad = Quad::new(
///     NamedNode::new("http://example.com/s")?,
///     NamedNode::new("http://example.com/p")?,
///     NamedNode::new("http://example.com/o")?,
///     NamedNode::new("http://example.com/g")?,
/// );
/// assert_eq!(
///     quad.to_string(),
///     "<http://example.com/s> <http://example.com/p> <http://example.com/o> <http://example.com/g>"
/// );
/// # Result::<_,rdfterm::InvalidTermError>::Ok(())
/// ```
#[derive(Eq, PartialEq, Ord, PartialOrd, Debug, Clone, Hash)]
pub struct Quad {
    pub subject: Subject,
    pub predicate: Predicate,
    pub object: Term,
    pub graph_name: GraphName,
}

impl Quad {
    #[inline]
    pub fn new(
        subject: impl Into<Subject>,
        predicate: impl Into<Predicate>,
        object: impl Into<Term>,
        graph_name: impl Into<GraphName>,
    ) -> Self {
        Self {
            subject: subject.into(),
            predicate: predicate.into(),
            object: object.into(),
            graph_name: graph_name.into(),
        }
    }
}

impl fmt::Display for Quad {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.subject, self.predicate, self.object)?;
        if !self.graph_name.is_default_graph() {
            write!(f, " {}", self.graph_name)?;
        }
        Ok(())
    }
}

impl From<Quad> for Triple {
    /// Drops the graph name.
    #[inline]
    fn from(quad: Quad) -> Self {
        Self::new(quad.subject, quad.predicate, quad.object)
    }
}

impl From<Triple> for Quad {
    #[inline]
    fn from(triple: Triple) -> Self {
        triple.in_graph(GraphName::DefaultGraph)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vocab::rdf;

    #[test]
    fn test_subject_from_literal_term() {
        let literal = Literal::new_simple_literal("foo");
        assert_eq!(
            Subject::try_from(Term::from(literal.clone())),
            Err(literal)
        );
        assert!(Subject::try_from(Term::from(BlankNode::default()))
            .is_ok_and(|s| s.is_blank_node()));
    }

    #[test]
    fn test_term_conversions() {
        let subject = Subject::from(NamedOrBlankNode::from(rdf::NIL));
        assert_eq!(Term::from(subject), rdf::NIL);
        assert_eq!(Term::from(Predicate::from(rdf::TYPE)), rdf::TYPE);
    }

    #[test]
    fn test_quad_display() {
        let quad = Quad::new(rdf::NIL, rdf::TYPE, rdf::NIL, GraphName::DefaultGraph);
        assert_eq!(Triple::from(quad.clone()).in_graph(GraphName::DefaultGraph), quad);
        assert!(!quad.to_string().contains("DEFAULT"));
    }
}
