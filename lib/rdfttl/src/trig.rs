//! A [TriG](https://www.w3.org/TR/trig/) streaming parser implemented by [`TriGParser`]
//! and a serializer implemented by [`TriGSerializer`].

use crate::terse::TerseGrammar;
use crate::terse_writer::{TerseDialect, TerseWriter};
use crate::toolkit::{ReaderDriver, SliceDriver, TurtleParseError, TurtleSyntaxError};
use oxiri::{Iri, IriParseError};
use rdfterm::{PrefixTable, Quad, Triple};
use std::io::{self, Read, Write};

/// A [TriG](https://www.w3.org/TR/trig/) streaming parser.
///
/// ```
/// use rdfttl::TriGParser;
///
/// let file = br#"@prefix ex: <http://example.com/> .
/// ex:g1 { ex:s ex:p ex:o1 }
/// GRAPH ex:g2 { ex:s ex:p ex:o2 . ex:s ex:p ex:o3 }
/// ex:s ex:p ex:o4 ."#;
///
/// let mut in_named_graph = 0;
/// for quad in TriGParser::new().for_reader(file.as_ref()) {
///     if !quad?.graph_name.is_default_graph() {
///         in_named_graph += 1;
///     }
/// }
/// assert_eq!(3, in_named_graph);
/// # Result::<_,Box<dyn std::error::Error>>::Ok(())
/// ```
#[derive(Default, Clone)]
#[must_use]
pub struct TriGParser {
    base: Option<Iri<String>>,
    prefixes: PrefixTable,
}

impl TriGParser {
    /// Builds a new [`TriGParser`].
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn with_base_iri(mut self, base_iri: impl Into<String>) -> Result<Self, IriParseError> {
        self.base = Some(Iri::parse(base_iri.into())?);
        Ok(self)
    }

    /// Declares a prefix before the start of the file, as a `@prefix` directive would do.
    #[inline]
    pub fn with_prefix(
        mut self,
        prefix_name: impl Into<String>,
        prefix_iri: impl Into<String>,
    ) -> Result<Self, IriParseError> {
        self.prefixes
            .insert(prefix_name, Iri::parse(prefix_iri.into())?.into_inner());
        Ok(self)
    }

    /// Parses a TriG file from a [`Read`] implementation.
    pub fn for_reader<R: Read>(self, reader: R) -> ReaderTriGParser<R> {
        ReaderTriGParser {
            inner: TerseGrammar::new_parser(Vec::new(), false, true, self.base, self.prefixes)
                .for_reader(reader),
        }
    }

    /// Parses a TriG file from a byte slice.
    pub fn for_slice(self, slice: &(impl AsRef<[u8]> + ?Sized)) -> SliceTriGParser<'_> {
        SliceTriGParser {
            inner: TerseGrammar::new_parser(slice.as_ref(), true, true, self.base, self.prefixes)
                .into_iter(),
        }
    }
}

/// Parses a TriG file from a [`Read`] implementation.
///
/// Can be built using [`TriGParser::for_reader`].
#[must_use]
pub struct ReaderTriGParser<R: Read> {
    inner: ReaderDriver<R, TerseGrammar>,
}

impl<R: Read> ReaderTriGParser<R> {
    /// The list of IRI prefixes considered at the current step of the parsing.
    pub fn prefixes(&self) -> &PrefixTable {
        self.inner.parser.context.prefixes()
    }

    /// The base IRI considered at the current step of the parsing.
    pub fn base_iri(&self) -> Option<&str> {
        self.inner
            .parser
            .context
            .tokenizer_options
            .base_iri
            .as_ref()
            .map(Iri::as_str)
    }
}

impl<R: Read> Iterator for ReaderTriGParser<R> {
    type Item = Result<Quad, TurtleParseError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next()
    }
}

/// Parses a TriG file from a byte slice.
///
/// Can be built using [`TriGParser::for_slice`].
#[must_use]
pub struct SliceTriGParser<'a> {
    inner: SliceDriver<'a, TerseGrammar>,
}

impl SliceTriGParser<'_> {
    /// The list of IRI prefixes considered at the current step of the parsing.
    pub fn prefixes(&self) -> &PrefixTable {
        self.inner.parser.context.prefixes()
    }

    /// The base IRI considered at the current step of the parsing.
    pub fn base_iri(&self) -> Option<&str> {
        self.inner
            .parser
            .context
            .tokenizer_options
            .base_iri
            .as_ref()
            .map(Iri::as_str)
    }
}

impl Iterator for SliceTriGParser<'_> {
    type Item = Result<Quad, TurtleSyntaxError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next()
    }
}

/// A [TriG](https://www.w3.org/TR/trig/) serializer.
///
/// ```
/// use rdfterm::{NamedNode, Quad};
/// use rdfttl::TriGSerializer;
///
/// let mut serializer = TriGSerializer::new()
///     .with_prefix("schema", "http://schema.org/")?
///     .for_writer(Vec::new());
/// serializer.serialize_quad(&Quad::new(
///     NamedNode::new("http://example.com#me")?,
///     NamedNode::new("http://www.w3.org/1999/02/22-rdf-syntax-ns#type")?,
///     NamedNode::new("http://schema.org/Person")?,
///     NamedNode::new("http://example.com")?,
/// ))?;
/// assert_eq!(
///     "@prefix schema: <http://schema.org/> .\n<http://example.com> {\n\t<http://example.com#me> <http://www.w3.org/1999/02/22-rdf-syntax-ns#type> schema:Person .\n}\n",
///     String::from_utf8(serializer.finish()?)?
/// );
/// # Result::<_,Box<dyn std::error::Error>>::Ok(())
/// ```
#[derive(Default, Clone)]
#[must_use]
pub struct TriGSerializer {
    prefixes: PrefixTable,
    pretty: bool,
}

impl TriGSerializer {
    /// Builds a new [`TriGSerializer`].
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn with_prefix(
        mut self,
        prefix_name: impl Into<String>,
        prefix_iri: impl Into<String>,
    ) -> Result<Self, IriParseError> {
        self.prefixes
            .insert(prefix_name, Iri::parse(prefix_iri.into())?.into_inner());
        Ok(self)
    }

    /// Groups the statements by graph and subject and indents them.
    #[inline]
    pub fn pretty(mut self) -> Self {
        self.pretty = true;
        self
    }

    /// Writes a TriG file to a [`Write`] implementation.
    pub fn for_writer<W: Write>(self, writer: W) -> WriterTriGSerializer<W> {
        WriterTriGSerializer {
            writer,
            low: TerseWriter::new(TerseDialect::TriG, self.prefixes, self.pretty),
        }
    }
}

/// Writes a TriG file to a [`Write`] implementation.
///
/// Can be built using [`TriGSerializer::for_writer`].
#[must_use]
pub struct WriterTriGSerializer<W: Write> {
    writer: W,
    low: TerseWriter,
}

impl<W: Write> WriterTriGSerializer<W> {
    /// Writes an extra quad.
    pub fn serialize_quad(&mut self, quad: &Quad) -> io::Result<()> {
        self.low.serialize_quad(quad, &mut self.writer)
    }

    /// Writes an extra triple in the default graph.
    pub fn serialize_triple(&mut self, triple: &Triple) -> io::Result<()> {
        self.low
            .serialize_quad(&Quad::from(triple.clone()), &mut self.writer)
    }

    /// Ends the write process, closing the last graph block, and returns the underlying [`Write`].
    pub fn finish(mut self) -> io::Result<W> {
        self.low.finish(&mut self.writer)?;
        Ok(self.writer)
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::panic_in_result_fn)]

    use super::*;
    use rdfterm::{BlankNode, GraphName, Literal, NamedNode, Term};

    fn ex(name: &str) -> NamedNode {
        NamedNode::new_unchecked(format!("http://example.com/{name}"))
    }

    #[test]
    fn test_graph_blocks() -> Result<(), TurtleSyntaxError> {
        let quads = TriGParser::new()
            .for_slice(
                "@prefix ex: <http://example.com/> .\nex:g { ex:s ex:p ex:o . ex:s ex:q [ ex:r 1 ] }\n_:b { ex:s ex:p ex:o }\nex:s ex:p ex:o .",
            )
            .collect::<Result<Vec<_>, _>>()?;
        assert_eq!(quads.len(), 5);
        assert_eq!(
            quads
                .iter()
                .filter(|q| q.graph_name == GraphName::from(ex("g")))
                .count(),
            3
        );
        assert!(quads[3].graph_name.is_blank_node());
        assert!(quads[4].graph_name.is_default_graph());
        Ok(())
    }

    #[test]
    fn test_turtle_rejects_graph_blocks() {
        assert!(
            crate::TurtleParser::new()
                .for_slice("<http://example.com/g> { <http://example.com/s> <http://example.com/p> <http://example.com/o> }")
                .any(|r| r.is_err())
        );
    }

    #[test]
    fn test_two_graphs_give_two_blocks() -> io::Result<()> {
        let mut serializer = TriGSerializer::new()
            .with_prefix("ex", "http://example.com/")
            .map_err(io::Error::other)?
            .for_writer(Vec::new());
        serializer.serialize_quad(&Quad::new(ex("s"), ex("p"), ex("o"), ex("g1")))?;
        serializer.serialize_quad(&Quad::new(ex("s"), ex("p"), ex("o"), ex("g2")))?;
        assert_eq!(
            String::from_utf8(serializer.finish()?).unwrap(),
            "@prefix ex: <http://example.com/> .\nex:g1 {\n\tex:s ex:p ex:o .\n}\nex:g2 {\n\tex:s ex:p ex:o .\n}\n"
        );
        Ok(())
    }

    #[test]
    fn test_pretty_write() -> io::Result<()> {
        let mut serializer = TriGSerializer::new().pretty().for_writer(Vec::new());
        let node = BlankNode::default();
        serializer.serialize_quad(&Quad::new(
            ex("s"),
            ex("p"),
            Literal::new_simple_literal("a"),
            ex("g"),
        ))?;
        serializer.serialize_quad(&Quad::new(
            ex("s"),
            rdfterm::vocab::rdf::TYPE,
            ex("C"),
            ex("g"),
        ))?;
        serializer.serialize_quad(&Quad::new(
            node,
            ex("p"),
            Term::from(ex("o")),
            GraphName::DefaultGraph,
        ))?;
        assert_eq!(
            String::from_utf8(serializer.finish()?).unwrap(),
            "<http://example.com/g> {\n\t<http://example.com/s> a <http://example.com/C> ;\n\t\t<http://example.com/p> \"a\" .\n}\n_:b0 <http://example.com/p> <http://example.com/o> .\n"
        );
        Ok(())
    }

    #[test]
    fn test_empty_document() -> io::Result<()> {
        let serializer = TriGSerializer::new().for_writer(Vec::new());
        assert!(serializer.finish()?.is_empty());
        Ok(())
    }
}
