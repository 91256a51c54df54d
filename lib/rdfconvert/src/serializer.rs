//! Utilities to write RDF graphs and datasets in any writable format.

use crate::error::UnsupportedFormatError;
use crate::format::RdfFormat;
use rdfjsonld::{JsonLdSerializer, JsonLdShape, WriterJsonLdSerializer};
use rdfterm::{IriParseError, Quad};
use rdfttl::n3::WriterN3Serializer;
use rdfttl::nquads::WriterNQuadsSerializer;
use rdfttl::ntriples::WriterNTriplesSerializer;
use rdfttl::trig::WriterTriGSerializer;
use rdfttl::turtle::WriterTurtleSerializer;
use rdfttl::{N3Serializer, NQuadsSerializer, NTriplesSerializer, TriGSerializer, TurtleSerializer};
use rdfxml::{RdfXmlSerializer, WriterRdfXmlSerializer};
use std::io::{self, Write};

/// A serializer for the writable formats of [`RdfFormat`].
///
/// Quads in a named graph can only be written by formats supporting datasets,
/// the others fail with an [`io::ErrorKind::InvalidInput`] error.
///
/// ```
/// use rdfconvert::{RdfFormat, RdfSerializer};
/// use rdfterm::{NamedNode, Quad};
///
/// let mut writer = RdfSerializer::from_format(RdfFormat::NQuads)?.for_writer(Vec::new());
/// writer.serialize_quad(&Quad::new(
///     NamedNode::new("http://example.com/s")?,
///     NamedNode::new("http://example.com/p")?,
///     NamedNode::new("http://example.com/o")?,
///     NamedNode::new("http://example.com/g")?,
/// ))?;
/// assert_eq!(
///     writer.finish()?,
///     b"<http://example.com/s> <http://example.com/p> <http://example.com/o> <http://example.com/g> .\n"
/// );
/// # Result::<_, Box<dyn std::error::Error>>::Ok(())
/// ```
#[must_use]
pub struct RdfSerializer {
    inner: RdfSerializerKind,
}

enum RdfSerializerKind {
    JsonLd(JsonLdSerializer),
    N3(N3Serializer),
    NQuads(NQuadsSerializer),
    NTriples(NTriplesSerializer),
    RdfXml(RdfXmlSerializer),
    TriG(TriGSerializer),
    Turtle(TurtleSerializer),
}

impl RdfSerializer {
    /// Builds a serializer for the given format.
    ///
    /// Fails if the format can only be parsed.
    #[inline]
    pub fn from_format(format: RdfFormat) -> Result<Self, UnsupportedFormatError> {
        Ok(Self {
            inner: match format {
                RdfFormat::Html => {
                    return Err(UnsupportedFormatError::ParseOnly {
                        media_type: format.media_type(),
                        name: format.name(),
                    });
                }
                RdfFormat::JsonLd => RdfSerializerKind::JsonLd(JsonLdSerializer::new()),
                RdfFormat::N3 => RdfSerializerKind::N3(N3Serializer::new()),
                RdfFormat::NQuads => RdfSerializerKind::NQuads(NQuadsSerializer::new()),
                RdfFormat::NTriples => RdfSerializerKind::NTriples(NTriplesSerializer::new()),
                RdfFormat::RdfXml => RdfSerializerKind::RdfXml(RdfXmlSerializer::new()),
                RdfFormat::TriG => RdfSerializerKind::TriG(TriGSerializer::new()),
                RdfFormat::Turtle => RdfSerializerKind::Turtle(TurtleSerializer::new()),
            },
        })
    }

    /// The format the serializer writes.
    #[inline]
    pub fn format(&self) -> RdfFormat {
        match &self.inner {
            RdfSerializerKind::JsonLd(_) => RdfFormat::JsonLd,
            RdfSerializerKind::N3(_) => RdfFormat::N3,
            RdfSerializerKind::NQuads(_) => RdfFormat::NQuads,
            RdfSerializerKind::NTriples(_) => RdfFormat::NTriples,
            RdfSerializerKind::RdfXml(_) => RdfFormat::RdfXml,
            RdfSerializerKind::TriG(_) => RdfFormat::TriG,
            RdfSerializerKind::Turtle(_) => RdfFormat::Turtle,
        }
    }

    /// Adds a prefix the serializer may use to shorten IRIs.
    ///
    /// N-Triples and N-Quads have no prefixed names and ignore it.
    ///
    /// ```
    /// use rdfconvert::{RdfFormat, RdfSerializer};
    /// use rdfterm::{GraphName, NamedNode, Quad};
    ///
    /// let mut writer = RdfSerializer::from_format(RdfFormat::Turtle)?
    ///     .with_prefix("schema", "http://schema.org/")?
    ///     .for_writer(Vec::new());
    /// writer.serialize_quad(&Quad::new(
    ///     NamedNode::new("http://example.com/s")?,
    ///     NamedNode::new("http://schema.org/name")?,
    ///     NamedNode::new("http://example.com/o")?,
    ///     GraphName::DefaultGraph,
    /// ))?;
    /// assert_eq!(
    ///     writer.finish()?,
    ///     b"@prefix schema: <http://schema.org/> .\n<http://example.com/s> schema:name <http://example.com/o> .\n"
    /// );
    /// # Result::<_, Box<dyn std::error::Error>>::Ok(())
    /// ```
    #[inline]
    pub fn with_prefix(
        self,
        prefix_name: impl Into<String>,
        prefix_iri: impl Into<String>,
    ) -> Result<Self, IriParseError> {
        Ok(Self {
            inner: match self.inner {
                RdfSerializerKind::JsonLd(s) => {
                    RdfSerializerKind::JsonLd(s.with_prefix(prefix_name, prefix_iri)?)
                }
                RdfSerializerKind::N3(s) => {
                    RdfSerializerKind::N3(s.with_prefix(prefix_name, prefix_iri)?)
                }
                RdfSerializerKind::RdfXml(s) => {
                    RdfSerializerKind::RdfXml(s.with_prefix(prefix_name, prefix_iri)?)
                }
                RdfSerializerKind::TriG(s) => {
                    RdfSerializerKind::TriG(s.with_prefix(prefix_name, prefix_iri)?)
                }
                RdfSerializerKind::Turtle(s) => {
                    RdfSerializerKind::Turtle(s.with_prefix(prefix_name, prefix_iri)?)
                }
                inner @ (RdfSerializerKind::NQuads(_) | RdfSerializerKind::NTriples(_)) => inner,
            },
        })
    }

    /// Groups statements by subject and indents them.
    ///
    /// N-Triples and N-Quads always write one statement per line and ignore it.
    #[inline]
    pub fn pretty(self) -> Self {
        Self {
            inner: match self.inner {
                RdfSerializerKind::JsonLd(s) => RdfSerializerKind::JsonLd(s.pretty()),
                RdfSerializerKind::N3(s) => RdfSerializerKind::N3(s.pretty()),
                RdfSerializerKind::RdfXml(s) => RdfSerializerKind::RdfXml(s.pretty()),
                RdfSerializerKind::TriG(s) => RdfSerializerKind::TriG(s.pretty()),
                RdfSerializerKind::Turtle(s) => RdfSerializerKind::Turtle(s.pretty()),
                inner @ (RdfSerializerKind::NQuads(_) | RdfSerializerKind::NTriples(_)) => inner,
            },
        }
    }

    /// Sets the document shape used if the output is JSON-LD.
    #[inline]
    pub fn with_jsonld_shape(self, shape: JsonLdShape) -> Self {
        Self {
            inner: match self.inner {
                RdfSerializerKind::JsonLd(s) => RdfSerializerKind::JsonLd(s.with_shape(shape)),
                inner => inner,
            },
        }
    }

    /// Writes to a [`Write`] implementation.
    ///
    /// <div class="warning">
    ///
    /// Do not forget to run the [`finish`](WriterQuadSerializer::finish()) method to properly write the last bytes of the file.</div>
    ///
    /// <div class="warning">
    ///
    /// This writer does unbuffered writes. You might want to use [`BufWriter`](io::BufWriter) to avoid that.</div>
    pub fn for_writer<W: Write>(self, writer: W) -> WriterQuadSerializer<W> {
        WriterQuadSerializer {
            inner: match self.inner {
                RdfSerializerKind::JsonLd(s) => WriterQuadSerializerKind::JsonLd(s.for_writer(writer)),
                RdfSerializerKind::N3(s) => WriterQuadSerializerKind::N3(s.for_writer(writer)),
                RdfSerializerKind::NQuads(s) => WriterQuadSerializerKind::NQuads(s.for_writer(writer)),
                RdfSerializerKind::NTriples(s) => {
                    WriterQuadSerializerKind::NTriples(s.for_writer(writer))
                }
                RdfSerializerKind::RdfXml(s) => WriterQuadSerializerKind::RdfXml(s.for_writer(writer)),
                RdfSerializerKind::TriG(s) => WriterQuadSerializerKind::TriG(s.for_writer(writer)),
                RdfSerializerKind::Turtle(s) => WriterQuadSerializerKind::Turtle(s.for_writer(writer)),
            },
        }
    }
}

/// Writes quads to a [`Write`] implementation.
///
/// Can be built using [`RdfSerializer::for_writer`].
#[must_use]
pub struct WriterQuadSerializer<W: Write> {
    inner: WriterQuadSerializerKind<W>,
}

enum WriterQuadSerializerKind<W: Write> {
    JsonLd(WriterJsonLdSerializer<W>),
    N3(WriterN3Serializer<W>),
    NQuads(WriterNQuadsSerializer<W>),
    NTriples(WriterNTriplesSerializer<W>),
    RdfXml(WriterRdfXmlSerializer<W>),
    TriG(WriterTriGSerializer<W>),
    Turtle(WriterTurtleSerializer<W>),
}

impl<W: Write> WriterQuadSerializer<W> {
    /// Writes a quad.
    pub fn serialize_quad(&mut self, quad: &Quad) -> io::Result<()> {
        match &mut self.inner {
            WriterQuadSerializerKind::JsonLd(writer) => writer.serialize_quad(quad),
            WriterQuadSerializerKind::N3(writer) => writer.serialize_quad(quad),
            WriterQuadSerializerKind::NQuads(writer) => writer.serialize_quad(quad),
            WriterQuadSerializerKind::NTriples(writer) => writer.serialize_quad(quad),
            WriterQuadSerializerKind::RdfXml(writer) => writer.serialize_quad(quad),
            WriterQuadSerializerKind::TriG(writer) => writer.serialize_quad(quad),
            WriterQuadSerializerKind::Turtle(writer) => writer.serialize_quad(quad),
        }
    }

    /// Writes the last bytes of the file.
    ///
    /// Note that this function does not flush the writer. You need to do that if you are using a [`BufWriter`](io::BufWriter).
    pub fn finish(self) -> io::Result<W> {
        match self.inner {
            WriterQuadSerializerKind::JsonLd(writer) => writer.finish(),
            WriterQuadSerializerKind::N3(writer) => writer.finish(),
            WriterQuadSerializerKind::NQuads(writer) => writer.finish(),
            WriterQuadSerializerKind::NTriples(writer) => writer.finish(),
            WriterQuadSerializerKind::RdfXml(writer) => writer.finish(),
            WriterQuadSerializerKind::TriG(writer) => writer.finish(),
            WriterQuadSerializerKind::Turtle(writer) => writer.finish(),
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::panic_in_result_fn)]

    use super::*;
    use rdfterm::{GraphName, Literal, NamedNode};

    fn ex(name: &str) -> NamedNode {
        NamedNode::new_unchecked(format!("http://example.com/{name}"))
    }

    #[test]
    fn test_html_is_not_writable() {
        let Err(error) = RdfSerializer::from_format(RdfFormat::Html) else {
            panic!("RDFa can't be written")
        };
        assert_eq!(
            error.to_string(),
            "text/html (RDFa) is not supported as an output format"
        );
    }

    #[test]
    fn test_line_formats_ignore_prefixes_and_pretty() -> Result<(), Box<dyn std::error::Error>> {
        for format in [RdfFormat::NTriples, RdfFormat::NQuads] {
            let mut writer = RdfSerializer::from_format(format)?
                .with_prefix("ex", "http://example.com/")?
                .pretty()
                .for_writer(Vec::new());
            writer.serialize_quad(&Quad::new(
                ex("s"),
                ex("p"),
                Literal::new_simple_literal("o"),
                GraphName::DefaultGraph,
            ))?;
            assert_eq!(
                String::from_utf8(writer.finish()?)?,
                "<http://example.com/s> <http://example.com/p> \"o\" .\n"
            );
        }
        Ok(())
    }

    #[test]
    fn test_named_graphs_need_datasets() -> Result<(), UnsupportedFormatError> {
        let quad = Quad::new(ex("s"), ex("p"), ex("o"), ex("g"));
        for format in [
            RdfFormat::JsonLd,
            RdfFormat::NQuads,
            RdfFormat::NTriples,
            RdfFormat::RdfXml,
            RdfFormat::TriG,
            RdfFormat::Turtle,
        ] {
            let result = RdfSerializer::from_format(format)?
                .for_writer(Vec::new())
                .serialize_quad(&quad);
            assert_eq!(result.is_ok(), format.supports_datasets(), "{format}");
        }
        Ok(())
    }

    #[test]
    fn test_shape_only_applies_to_json_ld() -> Result<(), UnsupportedFormatError> {
        let serializer = RdfSerializer::from_format(RdfFormat::Turtle)?
            .with_jsonld_shape(JsonLdShape::Framed);
        assert_eq!(serializer.format(), RdfFormat::Turtle);
        Ok(())
    }
}
