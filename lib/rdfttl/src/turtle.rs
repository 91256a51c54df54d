//! A [Turtle](https://www.w3.org/TR/turtle/) streaming parser implemented by [`TurtleParser`]
//! and a serializer implemented by [`TurtleSerializer`].

use crate::terse::TerseGrammar;
use crate::terse_writer::{TerseDialect, TerseWriter};
use crate::toolkit::{ReaderDriver, SliceDriver, TurtleParseError, TurtleSyntaxError};
use oxiri::{Iri, IriParseError};
use rdfterm::{PrefixTable, Quad, Triple};
use std::io::{self, Read, Write};

/// A [Turtle](https://www.w3.org/TR/turtle/) streaming parser.
///
/// Count the number of people:
/// ```
/// use rdfterm::vocab::rdf;
/// use rdfterm::{NamedNode, Term};
/// use rdfttl::TurtleParser;
///
/// let file = br#"@base <http://example.com/> .
/// @prefix schema: <http://schema.org/> .
/// <foo> a schema:Person ;
///     schema:name "Foo" .
/// <bar> a schema:Person ;
///     schema:name "Bar" ."#;
///
/// let schema_person = Term::from(NamedNode::new("http://schema.org/Person")?);
/// let mut count = 0;
/// for triple in TurtleParser::new().for_reader(file.as_ref()) {
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
pub struct TurtleParser {
    base: Option<Iri<String>>,
    prefixes: PrefixTable,
}

impl TurtleParser {
    /// Builds a new [`TurtleParser`].
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

    /// Parses a Turtle file from a [`Read`] implementation.
    pub fn for_reader<R: Read>(self, reader: R) -> ReaderTurtleParser<R> {
        ReaderTurtleParser {
            inner: TerseGrammar::new_parser(Vec::new(), false, false, self.base, self.prefixes)
                .for_reader(reader),
        }
    }

    /// Parses a Turtle file from a byte slice.
    ///
    /// ```
    /// use rdfttl::TurtleParser;
    ///
    /// let file = "@prefix ex: <http://example.com/> . ex:s ex:p ( 1 2 ) .";
    /// let triples = TurtleParser::new().for_slice(file).collect::<Result<Vec<_>, _>>()?;
    /// assert_eq!(triples.len(), 5);
    /// # Result::<_,Box<dyn std::error::Error>>::Ok(())
    /// ```
    pub fn for_slice(self, slice: &(impl AsRef<[u8]> + ?Sized)) -> SliceTurtleParser<'_> {
        SliceTurtleParser {
            inner: TerseGrammar::new_parser(slice.as_ref(), true, false, self.base, self.prefixes)
                .into_iter(),
        }
    }
}

/// Parses a Turtle file from a [`Read`] implementation.
///
/// Can be built using [`TurtleParser::for_reader`].
#[must_use]
pub struct ReaderTurtleParser<R: Read> {
    inner: ReaderDriver<R, TerseGrammar>,
}

impl<R: Read> ReaderTurtleParser<R> {
    /// The list of IRI prefixes considered at the current step of the parsing.
    ///
    /// This method returns the prefixes given to the parser and the ones declared in the file so far.
    ///
    /// ```
    /// use rdfttl::TurtleParser;
    ///
    /// let file = br#"@prefix schema: <http://schema.org/> .
    /// <http://example.com/foo> a schema:Person ."#;
    ///
    /// let mut parser = TurtleParser::new().for_reader(file.as_ref());
    /// assert!(parser.prefixes().is_empty()); // No prefix at the beginning
    ///
    /// parser.next().unwrap()?; // We read the first triple
    /// assert_eq!(parser.prefixes().get("schema"), Some("http://schema.org/"));
    /// # Result::<_,Box<dyn std::error::Error>>::Ok(())
    /// ```
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

impl<R: Read> Iterator for ReaderTurtleParser<R> {
    type Item = Result<Triple, TurtleParseError>;

    fn next(&mut self) -> Option<Self::Item> {
        Some(self.inner.next()?.map(Into::into))
    }
}

/// Parses a Turtle file from a byte slice.
///
/// Can be built using [`TurtleParser::for_slice`].
#[must_use]
pub struct SliceTurtleParser<'a> {
    inner: SliceDriver<'a, TerseGrammar>,
}

impl SliceTurtleParser<'_> {
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

impl Iterator for SliceTurtleParser<'_> {
    type Item = Result<Triple, TurtleSyntaxError>;

    fn next(&mut self) -> Option<Self::Item> {
        Some(self.inner.next()?.map(Into::into))
    }
}

/// A [Turtle](https://www.w3.org/TR/turtle/) serializer.
///
/// ```
/// use rdfterm::{NamedNode, Triple};
/// use rdfttl::TurtleSerializer;
///
/// let mut serializer = TurtleSerializer::new()
///     .with_prefix("schema", "http://schema.org/")?
///     .pretty()
///     .for_writer(Vec::new());
/// serializer.serialize_triple(&Triple::new(
///     NamedNode::new("http://example.com#me")?,
///     NamedNode::new("http://www.w3.org/1999/02/22-rdf-syntax-ns#type")?,
///     NamedNode::new("http://schema.org/Person")?,
/// ))?;
/// serializer.serialize_triple(&Triple::new(
///     NamedNode::new("http://example.com#me")?,
///     NamedNode::new("http://schema.org/name")?,
///     NamedNode::new("http://example.com#name")?,
/// ))?;
/// assert_eq!(
///     "@prefix schema: <http://schema.org/> .\n<http://example.com#me> a schema:Person ;\n\tschema:name <http://example.com#name> .\n",
///     String::from_utf8(serializer.finish()?)?
/// );
/// # Result::<_,Box<dyn std::error::Error>>::Ok(())
/// ```
#[derive(Default, Clone)]
#[must_use]
pub struct TurtleSerializer {
    prefixes: PrefixTable,
    pretty: bool,
}

impl TurtleSerializer {
    /// Builds a new [`TurtleSerializer`].
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

    /// Groups the triples by subject and indents them.
    #[inline]
    pub fn pretty(mut self) -> Self {
        self.pretty = true;
        self
    }

    /// Writes a Turtle file to a [`Write`] implementation.
    pub fn for_writer<W: Write>(self, writer: W) -> WriterTurtleSerializer<W> {
        WriterTurtleSerializer {
            writer,
            low: TerseWriter::new(TerseDialect::Turtle, self.prefixes, self.pretty),
        }
    }
}

/// Writes a Turtle file to a [`Write`] implementation.
///
/// Can be built using [`TurtleSerializer::for_writer`].
#[must_use]
pub struct WriterTurtleSerializer<W: Write> {
    writer: W,
    low: TerseWriter,
}

impl<W: Write> WriterTurtleSerializer<W> {
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
        self.low.finish(&mut self.writer)?;
        Ok(self.writer)
    }
}
