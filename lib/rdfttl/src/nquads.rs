//! A [N-Quads](https://www.w3.org/TR/n-quads/) streaming parser implemented by [`NQuadsParser`]
//! and a serializer implemented by [`NQuadsSerializer`].

use crate::line_formats::{LineFormatWriter, LineGrammar};
use crate::toolkit::{ReaderDriver, SliceDriver, TurtleParseError, TurtleSyntaxError};
use rdfterm::{Quad, Triple};
use std::io::{self, Read, Write};

/// A [N-Quads](https://www.w3.org/TR/n-quads/) streaming parser.
///
/// ```
/// use rdfttl::NQuadsParser;
///
/// let file = br#"<http://example.com/foo> <http://schema.org/name> "Foo" <http://example.com/g> .
/// <http://example.com/bar> <http://schema.org/name> "Bar" ."#;
///
/// let mut in_named_graph = 0;
/// for quad in NQuadsParser::new().for_reader(file.as_ref()) {
///     if quad?.graph_name.is_named_node() {
///         in_named_graph += 1;
///     }
/// }
/// assert_eq!(1, in_named_graph);
/// # Result::<_,Box<dyn std::error::Error>>::Ok(())
/// ```
#[derive(Default, Clone)]
#[must_use]
pub struct NQuadsParser;

impl NQuadsParser {
    /// Builds a new [`NQuadsParser`].
    #[inline]
    pub fn new() -> Self {
        Self
    }

    /// Parses a N-Quads file from a [`Read`] implementation.
    pub fn for_reader<R: Read>(self, reader: R) -> ReaderNQuadsParser<R> {
        ReaderNQuadsParser {
            inner: LineGrammar::new_parser(Vec::new(), false, true).for_reader(reader),
        }
    }

    /// Parses a N-Quads file from a byte slice.
    pub fn for_slice(self, slice: &(impl AsRef<[u8]> + ?Sized)) -> SliceNQuadsParser<'_> {
        SliceNQuadsParser {
            inner: LineGrammar::new_parser(slice.as_ref(), true, true).into_iter(),
        }
    }
}

/// Parses a N-Quads file from a [`Read`] implementation.
///
/// Can be built using [`NQuadsParser::for_reader`].
#[must_use]
pub struct ReaderNQuadsParser<R: Read> {
    inner: ReaderDriver<R, LineGrammar>,
}

impl<R: Read> Iterator for ReaderNQuadsParser<R> {
    type Item = Result<Quad, TurtleParseError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next()
    }
}

/// Parses a N-Quads file from a byte slice.
///
/// Can be built using [`NQuadsParser::for_slice`].
#[must_use]
pub struct SliceNQuadsParser<'a> {
    inner: SliceDriver<'a, LineGrammar>,
}

impl Iterator for SliceNQuadsParser<'_> {
    type Item = Result<Quad, TurtleSyntaxError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next()
    }
}

/// A [canonical](https://www.w3.org/TR/n-triples/#canonical-ntriples) [N-Quads](https://www.w3.org/TR/n-quads/) serializer.
///
/// ```
/// use rdfterm::{NamedNode, Quad};
/// use rdfttl::NQuadsSerializer;
///
/// let mut serializer = NQuadsSerializer::new().for_writer(Vec::new());
/// serializer.serialize_quad(&Quad::new(
///     NamedNode::new("http://example.com#me")?,
///     NamedNode::new("http://www.w3.org/1999/02/22-rdf-syntax-ns#type")?,
///     NamedNode::new("http://schema.org/Person")?,
///     NamedNode::new("http://example.com")?,
/// ))?;
/// assert_eq!(
///     b"<http://example.com#me> <http://www.w3.org/1999/02/22-rdf-syntax-ns#type> <http://schema.org/Person> <http://example.com> .\n",
///     serializer.finish()?.as_slice()
/// );
/// # Result::<_,Box<dyn std::error::Error>>::Ok(())
/// ```
#[derive(Default, Clone)]
#[must_use]
pub struct NQuadsSerializer;

impl NQuadsSerializer {
    /// Builds a new [`NQuadsSerializer`].
    #[inline]
    pub fn new() -> Self {
        Self
    }

    /// Writes a N-Quads file to a [`Write`] implementation.
    pub fn for_writer<W: Write>(self, writer: W) -> WriterNQuadsSerializer<W> {
        WriterNQuadsSerializer {
            writer,
            low: LineFormatWriter::new(true),
        }
    }
}

/// Writes a N-Quads file to a [`Write`] implementation.
///
/// Can be built using [`NQuadsSerializer::for_writer`].
#[must_use]
pub struct WriterNQuadsSerializer<W: Write> {
    writer: W,
    low: LineFormatWriter,
}

impl<W: Write> WriterNQuadsSerializer<W> {
    /// Writes an extra quad.
    pub fn serialize_quad(&mut self, quad: &Quad) -> io::Result<()> {
        self.low.serialize_quad(quad, &mut self.writer)
    }

    /// Writes an extra triple in the default graph.
    pub fn serialize_triple(&mut self, triple: &Triple) -> io::Result<()> {
        self.low
            .serialize_quad(&Quad::from(triple.clone()), &mut self.writer)
    }

    /// Ends the write process and returns the underlying [`Write`].
    pub fn finish(mut self) -> io::Result<W> {
        self.writer.flush()?;
        Ok(self.writer)
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::panic_in_result_fn)]

    use super::*;
    use rdfterm::{GraphName, Literal, NamedNode, Term};

    #[test]
    fn test_lang_tags_are_lowercased() -> Result<(), TurtleSyntaxError> {
        let quads = NQuadsParser::new()
            .for_slice("<http://example.com/s> <http://example.com/p> \"hello\"@EN-gb _:g .\n")
            .collect::<Result<Vec<_>, _>>()?;
        assert_eq!(quads.len(), 1);
        assert_eq!(
            quads[0].object,
            Term::from(Literal::new_language_tagged_literal_unchecked(
                "hello", "en-gb"
            ))
        );
        assert!(quads[0].graph_name.is_blank_node());
        Ok(())
    }

    #[test]
    fn test_only_one_statement_per_line() {
        let results = NQuadsParser::new()
            .for_slice("<http://example.com/s> <http://example.com/p> <http://example.com/o> . <http://example.com/s> <http://example.com/p> <http://example.com/o> .")
            .collect::<Vec<_>>();
        assert!(results.iter().any(Result::is_err));
    }

    #[test]
    fn test_comments_and_empty_lines() -> Result<(), TurtleSyntaxError> {
        let quads = NQuadsParser::new()
            .for_slice("# comment\n\n<http://example.com/s> <http://example.com/p> <http://example.com/o> . # trailing\r\n")
            .collect::<Result<Vec<_>, _>>()?;
        assert_eq!(quads.len(), 1);
        assert_eq!(quads[0].graph_name, GraphName::DefaultGraph);
        Ok(())
    }

    #[test]
    fn test_serialize_blank_node_graph() -> io::Result<()> {
        let mut serializer = NQuadsSerializer::new().for_writer(Vec::new());
        serializer.serialize_quad(&Quad::new(
            NamedNode::new_unchecked("http://example.com/s"),
            NamedNode::new_unchecked("http://example.com/p"),
            Literal::new_typed_literal("1", rdfterm::vocab::xsd::INTEGER),
            rdfterm::BlankNode::new_unchecked("graph"),
        ))?;
        assert_eq!(
            String::from_utf8(serializer.finish()?).unwrap(),
            "<http://example.com/s> <http://example.com/p> \"1\"^^<http://www.w3.org/2001/XMLSchema#integer> _:b0 .\n"
        );
        Ok(())
    }
}
