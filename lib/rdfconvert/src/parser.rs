//! Utilities to read RDF graphs and datasets in any registered format.

use crate::error::RdfParseError;
use crate::format::RdfFormat;
use rdfa::{RdfaParser, ReaderRdfaParser};
use rdfjsonld::{JsonLdParser, ReaderJsonLdParser};
use rdfterm::{GraphName, IriParseError, PrefixTable, Quad};
use rdfttl::n3::ReaderN3Parser;
use rdfttl::nquads::ReaderNQuadsParser;
use rdfttl::ntriples::ReaderNTriplesParser;
use rdfttl::trig::ReaderTriGParser;
use rdfttl::turtle::ReaderTurtleParser;
use rdfttl::{N3Parser, NQuadsParser, NTriplesParser, TriGParser, TurtleParser};
use rdfxml::{RdfXmlParser, ReaderRdfXmlParser};
use std::io::Read;

/// Parsers for every format of [`RdfFormat`].
///
/// Triples of graph formats are returned as quads in the default graph.
///
/// ```
/// use rdfconvert::{RdfFormat, RdfParser};
///
/// let file = "<http://example.com/s> <http://example.com/p> <http://example.com/o> .";
///
/// let quads = RdfParser::from_format(RdfFormat::NTriples)
///     .for_reader(file.as_bytes())
///     .collect::<Result<Vec<_>, _>>()?;
///
/// assert_eq!(quads.len(), 1);
/// assert_eq!(quads[0].subject.to_string(), "<http://example.com/s>");
/// # std::io::Result::Ok(())
/// ```
#[must_use]
pub struct RdfParser {
    inner: RdfParserKind,
}

enum RdfParserKind {
    Html(RdfaParser),
    JsonLd(JsonLdParser),
    N3(N3Parser),
    NQuads(NQuadsParser),
    NTriples(NTriplesParser),
    RdfXml(RdfXmlParser),
    TriG(TriGParser),
    Turtle(TurtleParser),
}

impl RdfParser {
    /// Builds a parser for the given format.
    #[inline]
    pub fn from_format(format: RdfFormat) -> Self {
        Self {
            inner: match format {
                RdfFormat::Html => RdfParserKind::Html(RdfaParser::new()),
                RdfFormat::JsonLd => RdfParserKind::JsonLd(JsonLdParser::new()),
                RdfFormat::N3 => RdfParserKind::N3(N3Parser::new()),
                RdfFormat::NQuads => RdfParserKind::NQuads(NQuadsParser::new()),
                RdfFormat::NTriples => RdfParserKind::NTriples(NTriplesParser::new()),
                RdfFormat::RdfXml => RdfParserKind::RdfXml(RdfXmlParser::new()),
                RdfFormat::TriG => RdfParserKind::TriG(TriGParser::new()),
                RdfFormat::Turtle => RdfParserKind::Turtle(TurtleParser::new()),
            },
        }
    }

    /// The format the parser reads.
    #[inline]
    pub fn format(&self) -> RdfFormat {
        match &self.inner {
            RdfParserKind::Html(_) => RdfFormat::Html,
            RdfParserKind::JsonLd(_) => RdfFormat::JsonLd,
            RdfParserKind::N3(_) => RdfFormat::N3,
            RdfParserKind::NQuads(_) => RdfFormat::NQuads,
            RdfParserKind::NTriples(_) => RdfFormat::NTriples,
            RdfParserKind::RdfXml(_) => RdfFormat::RdfXml,
            RdfParserKind::TriG(_) => RdfFormat::TriG,
            RdfParserKind::Turtle(_) => RdfFormat::Turtle,
        }
    }

    /// Provides an IRI that could be used to resolve the file relative IRIs.
    ///
    /// N-Triples and N-Quads only allow absolute IRIs so the base is ignored for them.
    ///
    /// ```
    /// use rdfconvert::{RdfFormat, RdfParser};
    ///
    /// let file = "</s> </p> </o> .";
    ///
    /// let quads = RdfParser::from_format(RdfFormat::Turtle)
    ///     .with_base_iri("http://example.com")?
    ///     .for_reader(file.as_bytes())
    ///     .collect::<Result<Vec<_>, _>>()?;
    ///
    /// assert_eq!(quads[0].subject.to_string(), "<http://example.com/s>");
    /// # Result::<_, Box<dyn std::error::Error>>::Ok(())
    /// ```
    #[inline]
    pub fn with_base_iri(self, base_iri: impl Into<String>) -> Result<Self, IriParseError> {
        Ok(Self {
            inner: match self.inner {
                RdfParserKind::Html(p) => RdfParserKind::Html(p.with_base_iri(base_iri)?),
                RdfParserKind::JsonLd(p) => RdfParserKind::JsonLd(p.with_base_iri(base_iri)?),
                RdfParserKind::N3(p) => RdfParserKind::N3(p.with_base_iri(base_iri)?),
                RdfParserKind::RdfXml(p) => RdfParserKind::RdfXml(p.with_base_iri(base_iri)?),
                RdfParserKind::TriG(p) => RdfParserKind::TriG(p.with_base_iri(base_iri)?),
                RdfParserKind::Turtle(p) => RdfParserKind::Turtle(p.with_base_iri(base_iri)?),
                inner @ (RdfParserKind::NQuads(_) | RdfParserKind::NTriples(_)) => inner,
            },
        })
    }

    /// Provides a prefix the document may use without declaring it.
    ///
    /// Only the Turtle family and HTML+RDFa have prefixed names, the other formats ignore it.
    #[inline]
    pub fn with_prefix(
        self,
        prefix_name: impl Into<String>,
        prefix_iri: impl Into<String>,
    ) -> Result<Self, IriParseError> {
        Ok(Self {
            inner: match self.inner {
                RdfParserKind::Html(p) => {
                    RdfParserKind::Html(p.with_prefix(prefix_name, prefix_iri)?)
                }
                RdfParserKind::N3(p) => RdfParserKind::N3(p.with_prefix(prefix_name, prefix_iri)?),
                RdfParserKind::TriG(p) => {
                    RdfParserKind::TriG(p.with_prefix(prefix_name, prefix_iri)?)
                }
                RdfParserKind::Turtle(p) => {
                    RdfParserKind::Turtle(p.with_prefix(prefix_name, prefix_iri)?)
                }
                inner @ (RdfParserKind::JsonLd(_)
                | RdfParserKind::NQuads(_)
                | RdfParserKind::NTriples(_)
                | RdfParserKind::RdfXml(_)) => inner,
            },
        })
    }

    /// Parses from a [`Read`] implementation and returns an iterator of quads.
    ///
    /// Reads are buffered.
    pub fn for_reader<R: Read>(self, reader: R) -> ReaderQuadParser<R> {
        ReaderQuadParser {
            inner: match self.inner {
                RdfParserKind::Html(p) => ReaderQuadParserKind::Html(p.for_reader(reader)),
                RdfParserKind::JsonLd(p) => ReaderQuadParserKind::JsonLd(p.for_reader(reader)),
                RdfParserKind::N3(p) => ReaderQuadParserKind::N3(p.for_reader(reader)),
                RdfParserKind::NQuads(p) => ReaderQuadParserKind::NQuads(p.for_reader(reader)),
                RdfParserKind::NTriples(p) => {
                    ReaderQuadParserKind::NTriples(p.for_reader(reader))
                }
                RdfParserKind::RdfXml(p) => ReaderQuadParserKind::RdfXml(p.for_reader(reader)),
                RdfParserKind::TriG(p) => ReaderQuadParserKind::TriG(p.for_reader(reader)),
                RdfParserKind::Turtle(p) => ReaderQuadParserKind::Turtle(p.for_reader(reader)),
            },
        }
    }
}

impl From<RdfFormat> for RdfParser {
    fn from(format: RdfFormat) -> Self {
        Self::from_format(format)
    }
}

/// Parses a RDF file from a [`Read`] implementation.
///
/// Can be built using [`RdfParser::for_reader`].
#[must_use]
pub struct ReaderQuadParser<R: Read> {
    inner: ReaderQuadParserKind<R>,
}

enum ReaderQuadParserKind<R: Read> {
    Html(ReaderRdfaParser<R>),
    JsonLd(ReaderJsonLdParser<R>),
    N3(ReaderN3Parser<R>),
    NQuads(ReaderNQuadsParser<R>),
    NTriples(ReaderNTriplesParser<R>),
    RdfXml(ReaderRdfXmlParser<R>),
    TriG(ReaderTriGParser<R>),
    Turtle(ReaderTurtleParser<R>),
}

impl<R: Read> Iterator for ReaderQuadParser<R> {
    type Item = Result<Quad, RdfParseError>;

    fn next(&mut self) -> Option<Self::Item> {
        Some(match &mut self.inner {
            ReaderQuadParserKind::Html(parser) => match parser.next()? {
                Ok(triple) => Ok(triple.in_graph(GraphName::DefaultGraph)),
                Err(e) => Err(e.into()),
            },
            ReaderQuadParserKind::JsonLd(parser) => parser.next()?.map_err(RdfParseError::from),
            ReaderQuadParserKind::N3(parser) => parser.next()?.map_err(RdfParseError::from),
            ReaderQuadParserKind::NQuads(parser) => parser.next()?.map_err(RdfParseError::from),
            ReaderQuadParserKind::NTriples(parser) => match parser.next()? {
                Ok(triple) => Ok(triple.in_graph(GraphName::DefaultGraph)),
                Err(e) => Err(e.into()),
            },
            ReaderQuadParserKind::RdfXml(parser) => match parser.next()? {
                Ok(triple) => Ok(triple.in_graph(GraphName::DefaultGraph)),
                Err(e) => Err(e.into()),
            },
            ReaderQuadParserKind::TriG(parser) => parser.next()?.map_err(RdfParseError::from),
            ReaderQuadParserKind::Turtle(parser) => match parser.next()? {
                Ok(triple) => Ok(triple.in_graph(GraphName::DefaultGraph)),
                Err(e) => Err(e.into()),
            },
        })
    }
}

impl<R: Read> ReaderQuadParser<R> {
    /// The prefixes declared in the document so far.
    ///
    /// Formats without prefix declarations always return an empty table.
    ///
    /// ```
    /// use rdfconvert::{RdfFormat, RdfParser};
    ///
    /// let file = "@prefix schema: <http://schema.org/> .
    /// <http://example.com/foo> a schema:Person .";
    ///
    /// let mut parser = RdfParser::from_format(RdfFormat::Turtle).for_reader(file.as_bytes());
    /// assert!(parser.prefixes().is_empty());
    ///
    /// parser.next().transpose()?;
    /// assert_eq!(parser.prefixes().get("schema"), Some("http://schema.org/"));
    /// # Result::<_, Box<dyn std::error::Error>>::Ok(())
    /// ```
    pub fn prefixes(&self) -> PrefixTable {
        match &self.inner {
            ReaderQuadParserKind::Html(p) => p.prefixes(),
            ReaderQuadParserKind::JsonLd(p) => p.prefixes(),
            ReaderQuadParserKind::N3(p) => p.prefixes().clone(),
            ReaderQuadParserKind::RdfXml(p) => p.prefixes(),
            ReaderQuadParserKind::TriG(p) => p.prefixes().clone(),
            ReaderQuadParserKind::Turtle(p) => p.prefixes().clone(),
            ReaderQuadParserKind::NQuads(_) | ReaderQuadParserKind::NTriples(_) => {
                PrefixTable::new()
            }
        }
    }

    /// The base IRI considered at the current step of the parsing.
    pub fn base_iri(&self) -> Option<&str> {
        match &self.inner {
            ReaderQuadParserKind::Html(p) => Some(p.base_iri()),
            ReaderQuadParserKind::JsonLd(p) => p.base_iri(),
            ReaderQuadParserKind::N3(p) => p.base_iri(),
            ReaderQuadParserKind::RdfXml(p) => p.base_iri(),
            ReaderQuadParserKind::TriG(p) => p.base_iri(),
            ReaderQuadParserKind::Turtle(p) => p.base_iri(),
            ReaderQuadParserKind::NQuads(_) | ReaderQuadParserKind::NTriples(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::panic_in_result_fn)]

    use super::*;
    use rdfterm::{Literal, NamedNode};

    fn parse(format: RdfFormat, data: &str) -> Result<Vec<Quad>, RdfParseError> {
        RdfParser::from_format(format)
            .for_reader(data.as_bytes())
            .collect()
    }

    #[test]
    fn test_every_format_reads_the_same_statement() -> Result<(), RdfParseError> {
        let expected = Quad::new(
            NamedNode::new_unchecked("http://example.com/s"),
            NamedNode::new_unchecked("http://example.com/p"),
            Literal::new_simple_literal("o"),
            GraphName::DefaultGraph,
        );
        for (format, data) in [
            (
                RdfFormat::NTriples,
                "<http://example.com/s> <http://example.com/p> \"o\" .\n",
            ),
            (
                RdfFormat::NQuads,
                "<http://example.com/s> <http://example.com/p> \"o\" .\n",
            ),
            (
                RdfFormat::Turtle,
                "@prefix ex: <http://example.com/> . ex:s ex:p \"o\" .",
            ),
            (RdfFormat::TriG, "{ <http://example.com/s> <http://example.com/p> \"o\" }"),
            (
                RdfFormat::N3,
                "<http://example.com/s> <http://example.com/p> \"o\" .",
            ),
            (
                RdfFormat::RdfXml,
                r#"<rdf:RDF xmlns:rdf="http://www.w3.org/1999/02/22-rdf-syntax-ns#" xmlns:ex="http://example.com/"><rdf:Description rdf:about="http://example.com/s"><ex:p>o</ex:p></rdf:Description></rdf:RDF>"#,
            ),
            (
                RdfFormat::JsonLd,
                r#"{"@id": "http://example.com/s", "http://example.com/p": "o"}"#,
            ),
            (
                RdfFormat::Html,
                r#"<html><body about="http://example.com/s"><span property="http://example.com/p">o</span></body></html>"#,
            ),
        ] {
            assert_eq!(parse(format, data)?, [expected.clone()], "{format}");
        }
        Ok(())
    }

    #[test]
    fn test_base_iri_is_ignored_by_line_formats() -> Result<(), IriParseError> {
        for format in [RdfFormat::NTriples, RdfFormat::NQuads] {
            let parser = RdfParser::from_format(format).with_base_iri("http://example.com/")?;
            assert_eq!(parser.format(), format);
        }
        assert!(
            RdfParser::from_format(RdfFormat::Turtle)
                .with_base_iri("not an iri")
                .is_err()
        );
        Ok(())
    }

    #[test]
    fn test_caller_prefixes() -> Result<(), Box<dyn std::error::Error>> {
        let quads = RdfParser::from_format(RdfFormat::Turtle)
            .with_prefix("ex", "http://example.com/")?
            .for_reader(b"ex:s ex:p ex:o .".as_slice())
            .collect::<Result<Vec<_>, _>>()?;
        assert_eq!(quads.len(), 1);
        Ok(())
    }

    #[test]
    fn test_syntax_errors_are_unified() {
        let error = parse(RdfFormat::RdfXml, "<rdf:RDF").unwrap_err();
        assert!(matches!(error, RdfParseError::Syntax(_)));
        let error = parse(RdfFormat::JsonLd, "{\"@id\": ").unwrap_err();
        assert!(matches!(error, RdfParseError::Syntax(_)));
    }
}
