//! A [N-Triples](https://www.w3.org/TR/n-triples/) streaming parser implemented by [`NTriplesParser`]
//! and a serializer implemented by [`NTriplesSerializer`].

use crate::line_formats::{LineFormatWriter, LineGrammar};
use crate::toolkit::{ReaderDriver, SliceDriver, TurtleParseError, TurtleSyntaxError};
use rdfterm::{Quad, Triple};
use std::io::{self, Read, Write};

/// A [N-Triples](https://www.w3.org/TR/n-triples/) streaming parser.
///
/// Count the number of people:
/// ```
/// use rdfterm::vocab::rdf;
/// use rdfterm::{NamedNode, Term};
/// use rdfttl::NTriplesParser;
///
/// let file = br#"<http://example.com/foo> <http://www.w3.org/1999/02/22-rdf-syntax-ns#type> <http://schema.org/Person> .
/// <http://example.com/foo> <http://schema.org/name> "Foo" .
/// <http://example.com/bar> <http://www.w3.org/1999/02/22-rdf-syntax-ns#type> <http://schema.org/Person> .
/// <http://example.com/bar> <http://schema.org/name> "Bar" ."#;
///
/// let schema_person = Term::from(NamedNode::new("http://schema.org/Person")?);
/// let mut count = 0;
/// for triple in NTriplesParser::new().for_reader(file.as_ref()) {
///     let triple = triple?;
///     if triple.predicate == rdf::TYPE && triple.object == schema_person {
///         count += 1;
///     }
/// }
/// assert_eq!(2, count);
/// # Result::<_,Box<dyn std::error::Error>>::Ok(())
/// ```
#[derive(Default, Clone)]
#[must_use]
pub struct NTriplesParser;

impl NTriplesParser {
    /// Builds a new [`NTriplesParser`].
    #[inline]
    pub fn new() -> Self {
        Self
    }

    /// Parses a N-Triples file from a [`Read`] implementation.
    pub fn for_reader<R: Read>(self, reader: R) -> ReaderNTriplesParser<R> {
        ReaderNTriplesParser {
            inner: LineGrammar::new_parser(Vec::new(), false, false).for_reader(reader),
        }
    }

    /// Parses a N-Triples file from a byte slice.
    pub fn for_slice(self, slice: &(impl AsRef<[u8]> + ?Sized)) -> SliceNTriplesParser<'_> {
        SliceNTriplesParser {
            inner: LineGrammar::new_parser(slice.as_ref(), true, false).into_iter(),
        }
    }
}

/// Parses a N-Triples file from a [`Read`] implementation.
///
/// Can be built using [`NTriplesParser::for_reader`].
#[must_use]
pub struct ReaderNTriplesParser<R: Read> {
    inner: ReaderDriver<R, LineGrammar>,
}

impl<R: Read> Iterator for ReaderNTriplesParser<R> {
    type Item = Result<Triple, TurtleParseError>;

    fn next(&mut self) -> Option<Self::Item> {
        Some(self.inner.next()?.map(Into::into))
    }
}

/// Parses a N-Triples file from a byte slice.
///
/// Can be built using [`NTriplesParser::for_slice`].
#[must_use]
pub struct SliceNTriplesParser<'a> {
    inner: SliceDriver<'a, LineGrammar>,
}

impl Iterator for SliceNTriplesParser<'_> {
    type Item = Result<Triple, TurtleSyntaxError>;

    fn next(&mut self) -> Option<Self::Item> {
        Some(self.inner.next()?.map(Into::into))
    }
}

/// A [canonical](https://www.w3.org/TR/n-triples/#canonical-ntriples) [N-Triples](https://www.w3.org/TR/n-triples/) serializer.
///
/// ```
/// use rdfterm::{NamedNode, Triple};
/// use rdfttl::NTriplesSerializer;
///
/// let mut serializer = NTriplesSerializer::new().for_writer(Vec::new());
/// serializer.serialize_triple(&Triple::new(
///     NamedNode::new("http://example.com#me")?,
///     NamedNode::new("http://www.w3.org/1999/02/22-rdf-syntax-ns#type")?,
///     NamedNode::new("http://schema.org/Person")?,
/// ))?;
/// assert_eq!(
///     b"<http://example.com#me> <http://www.w3.org/1999/02/22-rdf-syntax-ns#type> <http://schema.org/Person> .\n",
///     serializer.finish()?.as_slice()
/// );
/// # Result::<_,Box<dyn std::error::Error>>::Ok(())
/// ```
#[derive(Default, Clone)]
#[must_use]
pub struct NTriplesSerializer;

impl NTriplesSerializer {
    /// Builds a new [`NTriplesSerializer`].
    #[inline]
    pub fn new() -> Self {
        Self
    }

    /// Writes a N-Triples file to a [`Write`] implementation.
    pub fn for_writer<W: Write>(self, writer: W) -> WriterNTriplesSerializer<W> {
        WriterNTriplesSerializer {
            writer,
            low: LineFormatWriter::new(false),
        }
    }
}

/// Writes a N-Triples file to a [`Write`] implementation.
///
/// Can be built using [`NTriplesSerializer::for_writer`].
#[must_use]
pub struct WriterNTriplesSerializer<W: Write> {
    writer: W,
    low: LineFormatWriter,
}

impl<W: Write> WriterNTriplesSerializer<W> {
    /// Writes an extra triple.
    pub fn serialize_triple(&mut self, triple: &Triple) -> io::Result<()> {
        self.low
            .serialize_quad(&Quad::from(triple.clone()), &mut self.writer)
    }

    /// Writes an extra statement. It must be in the default graph.
    pub fn serialize_quad(&mut self, quad: &Quad) -> io::Result<()> {
        self.low.serialize_quad(quad, &mut self.writer)
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
    use rdfterm::{BlankNode, Literal, NamedNode};

    #[test]
    fn test_unicode_escapes() -> Result<(), TurtleSyntaxError> {
        let triples = NTriplesParser::new()
            .for_slice(r#"<http://example.com/s> <http://example.com/p> "é\U0001F600" ."#)
            .collect::<Result<Vec<_>, _>>()?;
        assert_eq!(
            triples,
            [Triple::new(
                NamedNode::new_unchecked("http://example.com/s"),
                NamedNode::new_unchecked("http://example.com/p"),
                Literal::new_simple_literal("é😀"),
            )]
        );
        Ok(())
    }

    #[test]
    fn test_error_line() {
        let error = NTriplesParser::new()
            .for_slice("<http://example.com/s> <http://example.com/p> <http://example.com/o> .\n<http://example.com/s> <http://example.com/p> .\n")
            .find_map(Result::err)
            .unwrap();
        assert_eq!(error.location().start.line, 1);
    }

    #[test]
    fn test_graph_name_is_rejected() {
        assert!(
            NTriplesParser::new()
                .for_slice("<http://example.com/s> <http://example.com/p> <http://example.com/o> <http://example.com/g> .")
                .any(|r| r.is_err())
        );
    }

    #[test]
    fn test_serialize_escapes_and_relabels() -> io::Result<()> {
        let mut serializer = NTriplesSerializer::new().for_writer(Vec::new());
        let node = BlankNode::default();
        serializer.serialize_triple(&Triple::new(
            node.clone(),
            NamedNode::new_unchecked("http://example.com/p"),
            Literal::new_simple_literal("a\nb\"c\u{7}"),
        ))?;
        serializer.serialize_triple(&Triple::new(
            NamedNode::new_unchecked("http://example.com/s"),
            NamedNode::new_unchecked("http://example.com/p"),
            node,
        ))?;
        assert_eq!(
            String::from_utf8(serializer.finish()?).unwrap(),
            "_:b0 <http://example.com/p> \"a\\nb\\\"c\\u0007\" .\n<http://example.com/s> <http://example.com/p> _:b0 .\n"
        );
        Ok(())
    }
}
