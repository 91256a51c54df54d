use crate::error::UnsupportedFormatError;
use crate::parser::RdfParser;
use crate::serializer::RdfSerializer;
use std::fmt;

/// RDF serialization formats known to the converter.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash)]
pub enum RdfFormat {
    /// [HTML+RDFa](https://www.w3.org/TR/html-rdfa/), only readable.
    Html,
    /// [JSON-LD](https://www.w3.org/TR/json-ld/)
    JsonLd,
    /// [N3](https://w3c.github.io/N3/spec/)
    N3,
    /// [N-Quads](https://www.w3.org/TR/n-quads/)
    NQuads,
    /// [N-Triples](https://www.w3.org/TR/n-triples/)
    NTriples,
    /// [RDF/XML](https://www.w3.org/TR/rdf-syntax-grammar/)
    RdfXml,
    /// [TriG](https://www.w3.org/TR/trig/)
    TriG,
    /// [Turtle](https://www.w3.org/TR/turtle/)
    Turtle,
}

impl RdfFormat {
    /// The format canonical IRI according to the [Unique URIs for file formats registry](https://www.w3.org/ns/formats/).
    ///
    /// ```
    /// use rdfconvert::RdfFormat;
    ///
    /// assert_eq!(
    ///     RdfFormat::NTriples.iri(),
    ///     "http://www.w3.org/ns/formats/N-Triples"
    /// )
    /// ```
    #[inline]
    pub const fn iri(self) -> &'static str {
        match self {
            Self::Html => "http://www.w3.org/ns/formats/RDFa",
            Self::JsonLd => "http://www.w3.org/ns/formats/JSON-LD",
            Self::N3 => "http://www.w3.org/ns/formats/N3",
            Self::NQuads => "http://www.w3.org/ns/formats/N-Quads",
            Self::NTriples => "http://www.w3.org/ns/formats/N-Triples",
            Self::RdfXml => "http://www.w3.org/ns/formats/RDF_XML",
            Self::TriG => "http://www.w3.org/ns/formats/TriG",
            Self::Turtle => "http://www.w3.org/ns/formats/Turtle",
        }
    }

    /// The format [IANA media type](https://tools.ietf.org/html/rfc2046).
    ///
    /// ```
    /// use rdfconvert::RdfFormat;
    ///
    /// assert_eq!(RdfFormat::NTriples.media_type(), "application/n-triples")
    /// ```
    #[inline]
    pub const fn media_type(self) -> &'static str {
        match self {
            Self::Html => "text/html",
            Self::JsonLd => "application/ld+json",
            Self::N3 => "text/n3",
            Self::NQuads => "application/n-quads",
            Self::NTriples => "application/n-triples",
            Self::RdfXml => "application/rdf+xml",
            Self::TriG => "application/trig",
            Self::Turtle => "text/turtle",
        }
    }

    /// The format [IANA-registered](https://tools.ietf.org/html/rfc2046) file extension.
    #[inline]
    pub const fn file_extension(self) -> &'static str {
        match self {
            Self::Html => "html",
            Self::JsonLd => "jsonld",
            Self::N3 => "n3",
            Self::NQuads => "nq",
            Self::NTriples => "nt",
            Self::RdfXml => "rdf",
            Self::TriG => "trig",
            Self::Turtle => "ttl",
        }
    }

    /// The format name.
    ///
    /// ```
    /// use rdfconvert::RdfFormat;
    ///
    /// assert_eq!(RdfFormat::NTriples.name(), "N-Triples")
    /// ```
    #[inline]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Html => "RDFa",
            Self::JsonLd => "JSON-LD",
            Self::N3 => "N3",
            Self::NQuads => "N-Quads",
            Self::NTriples => "N-Triples",
            Self::RdfXml => "RDF/XML",
            Self::TriG => "TriG",
            Self::Turtle => "Turtle",
        }
    }

    /// Checks if the formats supports [RDF datasets](https://www.w3.org/TR/rdf11-concepts/#dfn-rdf-dataset) and not only [RDF graphs](https://www.w3.org/TR/rdf11-concepts/#dfn-rdf-graph).
    ///
    /// ```
    /// use rdfconvert::RdfFormat;
    ///
    /// assert_eq!(RdfFormat::NTriples.supports_datasets(), false);
    /// assert_eq!(RdfFormat::NQuads.supports_datasets(), true);
    /// ```
    #[inline]
    pub const fn supports_datasets(self) -> bool {
        matches!(self, Self::JsonLd | Self::NQuads | Self::TriG)
    }

    /// Checks if documents in this format can be written.
    ///
    /// RDFa is only ever extracted from HTML pages.
    #[inline]
    pub const fn supports_serialization(self) -> bool {
        !matches!(self, Self::Html)
    }

    /// Looks for a known format from a media type.
    ///
    /// Parameters like `charset` are ignored and some aliases are supported.
    /// For example, "application/xml" is going to return `RdfFormat::RdfXml` even if it is not its canonical media type.
    ///
    /// ```
    /// use rdfconvert::RdfFormat;
    ///
    /// assert_eq!(
    ///     RdfFormat::from_media_type("text/turtle; charset=utf-8"),
    ///     Some(RdfFormat::Turtle)
    /// );
    /// assert_eq!(RdfFormat::from_media_type("text/csv"), None);
    /// ```
    #[inline]
    pub fn from_media_type(media_type: &str) -> Option<Self> {
        const MEDIA_SUBTYPES: [(&str, RdfFormat); 16] = [
            ("activity+json", RdfFormat::JsonLd),
            ("html", RdfFormat::Html),
            ("json", RdfFormat::JsonLd),
            ("ld+json", RdfFormat::JsonLd),
            ("jsonld", RdfFormat::JsonLd),
            ("n-quads", RdfFormat::NQuads),
            ("n-triples", RdfFormat::NTriples),
            ("n3", RdfFormat::N3),
            ("nquads", RdfFormat::NQuads),
            ("ntriples", RdfFormat::NTriples),
            ("plain", RdfFormat::NTriples),
            ("rdf+xml", RdfFormat::RdfXml),
            ("trig", RdfFormat::TriG),
            ("turtle", RdfFormat::Turtle),
            ("xhtml+xml", RdfFormat::Html),
            ("xml", RdfFormat::RdfXml),
        ];

        let type_subtype = media_type
            .split_once(';')
            .map_or(media_type, |(type_subtype, _)| type_subtype);
        let (r#type, subtype) = type_subtype.split_once('/')?;
        let r#type = r#type.trim();
        if !r#type.eq_ignore_ascii_case("application") && !r#type.eq_ignore_ascii_case("text") {
            return None;
        }
        let subtype = subtype.trim();
        let subtype = subtype.strip_prefix("x-").unwrap_or(subtype);
        MEDIA_SUBTYPES
            .into_iter()
            .find(|(candidate, _)| candidate.eq_ignore_ascii_case(subtype))
            .map(|(_, format)| format)
    }

    /// Looks for a known format from a file extension, without the leading dot.
    ///
    /// ```
    /// use rdfconvert::RdfFormat;
    ///
    /// assert_eq!(RdfFormat::from_extension("nt"), Some(RdfFormat::NTriples));
    /// assert_eq!(RdfFormat::from_extension("OWL"), Some(RdfFormat::RdfXml));
    /// ```
    #[inline]
    pub fn from_extension(extension: &str) -> Option<Self> {
        EXTENSIONS
            .iter()
            .find(|(candidate, _)| candidate.eq_ignore_ascii_case(extension))
            .map(|(_, format)| *format)
    }
}

impl fmt::Display for RdfFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Extensions in the order they are listed to users.
const EXTENSIONS: [(&str, RdfFormat); 14] = [
    ("json-ld", RdfFormat::JsonLd),
    ("jsonld", RdfFormat::JsonLd),
    ("json", RdfFormat::JsonLd),
    ("nt", RdfFormat::NTriples),
    ("nq", RdfFormat::NQuads),
    ("n3", RdfFormat::N3),
    ("owl", RdfFormat::RdfXml),
    ("rdf", RdfFormat::RdfXml),
    ("xml", RdfFormat::RdfXml),
    ("trig", RdfFormat::TriG),
    ("turtle", RdfFormat::Turtle),
    ("ttl", RdfFormat::Turtle),
    ("html", RdfFormat::Html),
    ("htm", RdfFormat::Html),
];

/// What the registry knows about a format.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash)]
pub struct FormatDescriptor {
    pub format: RdfFormat,
    /// The canonical media type, even if the format was looked up with an alias.
    pub media_type: &'static str,
    pub can_parse: bool,
    pub can_serialize: bool,
}

impl From<RdfFormat> for FormatDescriptor {
    #[inline]
    fn from(format: RdfFormat) -> Self {
        Self {
            format,
            media_type: format.media_type(),
            can_parse: true,
            can_serialize: format.supports_serialization(),
        }
    }
}

/// The table mapping media types and file extensions to parsers and serializers.
///
/// It is immutable and shared by every conversion of the process:
/// ```
/// use rdfconvert::{FormatRegistry, RdfFormat};
///
/// let registry = FormatRegistry::global();
/// assert_eq!(registry.lookup("text/turtle")?.format, RdfFormat::Turtle);
/// assert!(registry.serializer_for("text/html").is_err());
/// assert_eq!(registry.guess_format("data.JSONLD"), Some(RdfFormat::JsonLd));
/// # Result::<_, Box<dyn std::error::Error>>::Ok(())
/// ```
#[derive(Debug)]
pub struct FormatRegistry {
    formats: &'static [RdfFormat],
    extensions: &'static [(&'static str, RdfFormat)],
}

static REGISTRY: FormatRegistry = FormatRegistry {
    formats: &[
        RdfFormat::JsonLd,
        RdfFormat::NTriples,
        RdfFormat::NQuads,
        RdfFormat::N3,
        RdfFormat::RdfXml,
        RdfFormat::TriG,
        RdfFormat::Turtle,
        RdfFormat::Html,
    ],
    extensions: &EXTENSIONS,
};

impl FormatRegistry {
    /// The process-wide registry.
    #[inline]
    pub fn global() -> &'static Self {
        &REGISTRY
    }

    /// All the registered formats.
    pub fn formats(&self) -> impl Iterator<Item = FormatDescriptor> + '_ {
        self.formats.iter().copied().map(FormatDescriptor::from)
    }

    /// Finds the format registered for a media type.
    pub fn lookup(&self, media_type: &str) -> Result<FormatDescriptor, UnsupportedFormatError> {
        RdfFormat::from_media_type(media_type)
            .filter(|format| self.formats.contains(format))
            .map(FormatDescriptor::from)
            .ok_or_else(|| UnsupportedFormatError::unknown(media_type))
    }

    /// Builds a parser for the given media type.
    pub fn parser_for(&self, media_type: &str) -> Result<RdfParser, UnsupportedFormatError> {
        Ok(RdfParser::from_format(self.lookup(media_type)?.format))
    }

    /// Builds a serializer for the given media type.
    ///
    /// Fails for formats that can only be read, like HTML+RDFa.
    pub fn serializer_for(&self, media_type: &str) -> Result<RdfSerializer, UnsupportedFormatError> {
        RdfSerializer::from_format(self.lookup(media_type)?.format)
    }

    /// The `(extension, format)` pairs, in display order.
    pub fn extensions(&self) -> impl Iterator<Item = (&'static str, RdfFormat)> + '_ {
        self.extensions.iter().copied()
    }

    /// Guesses the format of a file from the text following its last `.`.
    ///
    /// The content is never looked at.
    pub fn guess_format(&self, file_name: &str) -> Option<RdfFormat> {
        let (_, extension) = file_name.rsplit_once('.')?;
        self.extensions
            .iter()
            .find(|(candidate, _)| candidate.eq_ignore_ascii_case(extension))
            .map(|(_, format)| *format)
    }
}

/// Lists the `(extension, media type)` pairs known to the converter, for usage messages.
///
/// ```
/// let formats = rdfconvert::list_supported_formats();
/// assert_eq!(formats[0], ("json-ld", "application/ld+json"));
/// assert_eq!(formats.last(), Some(&("htm", "text/html")));
/// ```
pub fn list_supported_formats() -> Vec<(&'static str, &'static str)> {
    FormatRegistry::global()
        .extensions()
        .map(|(extension, format)| (extension, format.media_type()))
        .collect()
}

/// Guesses the media type of a file from its extension.
///
/// ```
/// assert_eq!(rdfconvert::guess_format("foo.ttl"), Some("text/turtle"));
/// assert_eq!(rdfconvert::guess_format("foo.tar.gz"), None);
/// ```
pub fn guess_format(file_name: &str) -> Option<&'static str> {
    Some(FormatRegistry::global().guess_format(file_name)?.media_type())
}
