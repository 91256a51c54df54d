use crate::error::{RdfXmlParseError, RdfXmlSyntaxError};
use crate::utils::is_nc_name;
use oxilangtag::LanguageTag;
use oxiri::{Iri, IriParseError};
use quick_xml::escape::{resolve_xml_entity, unescape_with};
use quick_xml::events::attributes::Attribute;
use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};
use quick_xml::name::{LocalName, PrefixDeclaration, ResolveResult};
use quick_xml::{NsReader, Writer};
use rdfterm::vocab::rdf;
use rdfterm::{BlankNode, Literal, NamedNode, NamedOrBlankNode, PrefixTable, Term, Triple};
use std::collections::{HashMap, HashSet, VecDeque};
use std::io::{BufReader, Read};

/// A streaming [RDF/XML](https://www.w3.org/TR/rdf-syntax-grammar/) parser.
///
/// Only the stack of the currently open XML elements is kept in memory,
/// together with the `rdf:ID` values already seen in the document.
/// Triples are returned in the order of the elements that define them.
///
/// Listing the people of a document:
/// ```
/// use rdfterm::vocab::rdf;
/// use rdfterm::{NamedNode, Term};
/// use rdfxml::RdfXmlParser;
///
/// let file = r#"<?xml version="1.0"?>
/// <rdf:RDF xmlns:rdf="http://www.w3.org/1999/02/22-rdf-syntax-ns#" xmlns:schema="http://schema.org/">
///  <rdf:Description rdf:about="http://example.com/foo">
///    <rdf:type rdf:resource="http://schema.org/Person" />
///    <schema:name>Foo</schema:name>
///  </rdf:Description>
///  <schema:Person rdf:about="http://example.com/bar" schema:name="Bar" />
/// </rdf:RDF>"#;
///
/// let person = Term::from(NamedNode::new("http://schema.org/Person")?);
/// let mut people = Vec::new();
/// for triple in RdfXmlParser::new().for_reader(file.as_bytes()) {
///     let triple = triple?;
///     if triple.predicate == rdf::TYPE && triple.object == person {
///         people.push(triple.subject.to_string());
///     }
/// }
/// assert_eq!(people, ["<http://example.com/foo>", "<http://example.com/bar>"]);
/// # Result::<_, Box<dyn std::error::Error>>::Ok(())
/// ```
#[derive(Default, Clone)]
#[must_use]
pub struct RdfXmlParser {
    base: Option<Iri<String>>,
}

impl RdfXmlParser {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the document base IRI, used until a `xml:base` attribute overrides it.
    #[inline]
    pub fn with_base_iri(mut self, base_iri: impl Into<String>) -> Result<Self, IriParseError> {
        self.base = Some(Iri::parse(base_iri.into())?);
        Ok(self)
    }

    /// Parses a document from a [`Read`] implementation.
    ///
    /// The reader is wrapped into a [`BufReader`].
    pub fn for_reader<R: Read>(self, reader: R) -> ReaderRdfXmlParser<R> {
        ReaderRdfXmlParser {
            machine: self.machine(BufReader::new(reader)),
            buffer: Vec::new(),
        }
    }

    /// Parses a document already in memory.
    ///
    /// ```
    /// use rdfxml::RdfXmlParser;
    ///
    /// let file = r#"<rdf:RDF xmlns:rdf="http://www.w3.org/1999/02/22-rdf-syntax-ns#" xmlns:ex="http://example.com/">
    ///  <rdf:Description rdf:about="http://example.com/s">
    ///    <ex:list rdf:parseType="Collection">
    ///      <rdf:Description rdf:about="http://example.com/a"/>
    ///      <rdf:Description rdf:about="http://example.com/b"/>
    ///    </ex:list>
    ///  </rdf:Description>
    /// </rdf:RDF>"#;
    ///
    /// let triples = RdfXmlParser::new().for_slice(file).collect::<Result<Vec<_>, _>>()?;
    /// assert_eq!(triples.len(), 5);
    /// # Result::<_, Box<dyn std::error::Error>>::Ok(())
    /// ```
    pub fn for_slice(self, slice: &(impl AsRef<[u8]> + ?Sized)) -> SliceRdfXmlParser<'_> {
        SliceRdfXmlParser {
            machine: self.machine(slice.as_ref()),
        }
    }

    fn machine<T>(self, input: T) -> Machine<T> {
        let mut reader = NsReader::from_reader(input);
        reader.config_mut().expand_empty_elements = true;
        Machine {
            reader,
            stack: vec![Frame {
                base: self.base,
                language: None,
                kind: FrameKind::Document,
            }],
            entities: HashMap::new(),
            literal_depth: 0,
            seen_ids: HashSet::new(),
            pending: VecDeque::new(),
            is_done: false,
        }
    }
}

/// Parses RDF/XML from a [`Read`] implementation.
///
/// Built with [`RdfXmlParser::for_reader`].
#[must_use]
pub struct ReaderRdfXmlParser<R: Read> {
    machine: Machine<BufReader<R>>,
    buffer: Vec<u8>,
}

impl<R: Read> Iterator for ReaderRdfXmlParser<R> {
    type Item = Result<Triple, RdfXmlParseError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(triple) = self.machine.pending.pop_front() {
                return Some(Ok(triple));
            }
            if self.machine.is_done {
                return None;
            }
            self.buffer.clear();
            let step = match self.machine.reader.read_event_into(&mut self.buffer) {
                Ok(event) => self.machine.on_event(event),
                Err(error) => Err(error.into()),
            };
            if let Err(error) = step {
                return Some(Err(self.machine.fail(error)));
            }
        }
    }
}

impl<R: Read> ReaderRdfXmlParser<R> {
    /// The namespaces declared on the currently open elements.
    ///
    /// ```
    /// use rdfxml::RdfXmlParser;
    ///
    /// let file = r#"<?xml version="1.0"?>
    /// <rdf:RDF xmlns:rdf="http://www.w3.org/1999/02/22-rdf-syntax-ns#" xmlns:schema="http://schema.org/">
    ///  <rdf:Description rdf:about="http://example.com/foo">
    ///    <rdf:type rdf:resource="http://schema.org/Person" />
    ///  </rdf:Description>
    /// </rdf:RDF>"#;
    ///
    /// let mut parser = RdfXmlParser::new().for_reader(file.as_bytes());
    /// assert!(parser.prefixes().is_empty());
    ///
    /// parser.next().unwrap()?;
    /// assert_eq!(parser.prefixes().get("schema"), Some("http://schema.org/"));
    /// # Result::<_, Box<dyn std::error::Error>>::Ok(())
    /// ```
    pub fn prefixes(&self) -> PrefixTable {
        self.machine.prefixes()
    }

    /// The base IRI in scope at the current position.
    pub fn base_iri(&self) -> Option<&str> {
        Some(self.machine.current_base()?.as_str())
    }

    /// The number of bytes read so far.
    pub fn buffer_position(&self) -> u64 {
        self.machine.reader.buffer_position()
    }
}

/// Parses RDF/XML from a byte slice.
///
/// Built with [`RdfXmlParser::for_slice`].
#[must_use]
pub struct SliceRdfXmlParser<'a> {
    machine: Machine<&'a [u8]>,
}

impl Iterator for SliceRdfXmlParser<'_> {
    type Item = Result<Triple, RdfXmlSyntaxError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(triple) = self.machine.pending.pop_front() {
                return Some(Ok(triple));
            }
            if self.machine.is_done {
                return None;
            }
            let step = match self.machine.reader.read_event() {
                Ok(event) => self.machine.on_event(event),
                Err(error) => Err(error.into()),
            };
            if let Err(error) = step {
                return match self.machine.fail(error) {
                    RdfXmlParseError::Syntax(error) => Some(Err(error)),
                    // slices do no I/O
                    RdfXmlParseError::Io(_) => None,
                };
            }
        }
    }
}

impl SliceRdfXmlParser<'_> {
    /// The namespaces declared on the currently open elements.
    pub fn prefixes(&self) -> PrefixTable {
        self.machine.prefixes()
    }

    /// The base IRI in scope at the current position.
    ///
    /// ```
    /// use rdfxml::RdfXmlParser;
    ///
    /// let file = r#"<?xml version="1.0"?>
    /// <rdf:RDF xmlns:rdf="http://www.w3.org/1999/02/22-rdf-syntax-ns#" xml:base="http://example.com/">
    ///  <rdf:Description rdf:about="foo">
    ///    <rdf:type rdf:resource="http://schema.org/Person" />
    ///  </rdf:Description>
    /// </rdf:RDF>"#;
    ///
    /// let mut parser = RdfXmlParser::new().for_slice(file);
    /// assert!(parser.base_iri().is_none());
    ///
    /// parser.next().unwrap()?;
    /// assert_eq!(parser.base_iri(), Some("http://example.com/"));
    /// # Result::<_, Box<dyn std::error::Error>>::Ok(())
    /// ```
    pub fn base_iri(&self) -> Option<&str> {
        Some(self.machine.current_base()?.as_str())
    }
}

const RDF_ABOUT: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#about";
const RDF_ABOUT_EACH: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#aboutEach";
const RDF_ABOUT_EACH_PREFIX: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#aboutEachPrefix";
const RDF_BAG_ID: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#bagID";
const RDF_DATATYPE: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#datatype";
const RDF_DESCRIPTION: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#Description";
const RDF_ID: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#ID";
const RDF_LI: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#li";
const RDF_NODE_ID: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#nodeID";
const RDF_PARSE_TYPE: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#parseType";
const RDF_RDF: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#RDF";
const RDF_RESOURCE: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#resource";
const RDF_TYPE: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#type";

/// Names that can't be node elements (`rdf:Description` excepted, the other syntax names are all here).
const NOT_NODE_ELEMENTS: [&str; 11] = [
    RDF_ABOUT,
    RDF_ABOUT_EACH,
    RDF_ABOUT_EACH_PREFIX,
    RDF_BAG_ID,
    RDF_DATATYPE,
    RDF_ID,
    RDF_LI,
    RDF_NODE_ID,
    RDF_PARSE_TYPE,
    RDF_RDF,
    RDF_RESOURCE,
];
const NOT_PROPERTY_ATTRIBUTES: [&str; 5] = [
    RDF_ABOUT_EACH,
    RDF_ABOUT_EACH_PREFIX,
    RDF_LI,
    RDF_RDF,
    RDF_RESOURCE,
];

/// Labels `encoding="..."` may use for UTF-8.
const UTF8_LABELS: [&[u8]; 6] = [
    b"unicode-1-1-utf-8",
    b"unicode11utf8",
    b"unicode20utf8",
    b"utf-8",
    b"utf8",
    b"x-unicode20utf8",
];

enum PropertyValue {
    Node(NamedOrBlankNode),
    Text(String),
}

impl PropertyValue {
    /// Whitespace text does not count: it is the indentation before a nested node element.
    fn is_set(value: Option<&Self>) -> bool {
        match value {
            Some(Self::Node(_)) => true,
            Some(Self::Text(text)) => !text.bytes().all(is_xml_space),
            None => false,
        }
    }
}

#[derive(Clone, Copy, Default, PartialEq, Eq)]
enum ParseType {
    #[default]
    Normal,
    Collection,
    Literal,
    Resource,
    /// Unknown values are parsed like `Literal` but their content is dropped.
    Unknown,
}

#[derive(Default)]
struct ElementAttributes {
    base: Option<Iri<String>>,
    language: Option<String>,
    id: Option<NamedNode>,
    node_id: Option<BlankNode>,
    about: Option<NamedNode>,
    resource: Option<NamedNode>,
    datatype: Option<NamedNode>,
    types: Option<NamedNode>,
    parse_type: ParseType,
    properties: Vec<(NamedNode, String)>,
}

/// An open XML element.
struct Frame {
    /// Set when the element has a `xml:base` attribute
    base: Option<Iri<String>>,
    /// Set when the element has a `xml:lang` attribute
    language: Option<String>,
    kind: FrameKind,
}

enum FrameKind {
    Document,
    Root,
    Node {
        subject: NamedOrBlankNode,
        li: u64,
    },
    Property {
        predicate: NamedNode,
        subject: NamedOrBlankNode,
        value: Option<PropertyValue>,
        reified_as: Option<NamedNode>,
        datatype: Option<NamedNode>,
    },
    Collection {
        predicate: NamedNode,
        subject: NamedOrBlankNode,
        items: Vec<NamedOrBlankNode>,
        reified_as: Option<NamedNode>,
    },
    XmlLiteral {
        predicate: NamedNode,
        subject: NamedOrBlankNode,
        writer: Writer<Vec<u8>>,
        reified_as: Option<NamedNode>,
        keep: bool,
    },
}

struct Machine<R> {
    reader: NsReader<R>,
    stack: Vec<Frame>,
    /// `<!ENTITY>` declarations of the DOCTYPE
    entities: HashMap<String, String>,
    /// Depth inside the content of a `rdf:parseType="Literal"` element
    literal_depth: usize,
    seen_ids: HashSet<String>,
    pending: VecDeque<Triple>,
    is_done: bool,
}

impl<R> Machine<R> {
    /// Stops the parsing: a broken document is never resumed.
    fn fail(&mut self, error: RdfXmlParseError) -> RdfXmlParseError {
        self.is_done = true;
        self.pending.clear();
        error.with_position(self.reader.buffer_position())
    }

    fn on_event(&mut self, event: Event<'_>) -> Result<(), RdfXmlParseError> {
        match event {
            Event::Start(start) => self.on_start(&start),
            Event::End(end) => self.on_end(&end),
            Event::Empty(_) => {
                Err(invalid("empty elements should have been expanded by the reader").into())
            }
            Event::Text(text) => self.on_text(&text),
            Event::CData(data) => self.on_text(&data.escape()?),
            Event::Decl(declaration) => {
                let encoding = declaration.encoding().transpose()?;
                if encoding.is_some_and(|encoding| {
                    !UTF8_LABELS.iter().any(|label| encoding.eq_ignore_ascii_case(label))
                }) {
                    return Err(invalid("Only UTF-8 RDF/XML documents are supported").into());
                }
                Ok(())
            }
            Event::DocType(doctype) => self.read_doctype(&doctype),
            Event::Comment(_) | Event::PI(_) => Ok(()),
            Event::Eof => {
                if self.stack.len() > 1 {
                    return Err(invalid("Unexpected end of file").into());
                }
                self.is_done = true;
                Ok(())
            }
        }
    }

    fn prefixes(&self) -> PrefixTable {
        let decoder = self.reader.decoder();
        self.reader
            .prefixes()
            .filter_map(|(prefix, namespace)| {
                let prefix = match prefix {
                    PrefixDeclaration::Default => String::new(),
                    PrefixDeclaration::Named(prefix) => {
                        let prefix = decoder.decode(prefix).ok()?;
                        let prefix = unescape_with(&prefix, |_| None).ok()?.into_owned();
                        if !is_nc_name(&prefix) {
                            return None;
                        }
                        prefix
                    }
                };
                let namespace = decoder.decode(namespace.into_inner()).ok()?;
                let namespace = unescape_with(&namespace, |_| None).ok()?.into_owned();
                let namespace = Iri::parse(namespace).ok()?.into_inner();
                Some((prefix, namespace))
            })
            .collect()
    }

    /// Reads the `<!ENTITY name "value">` declarations, the rest of the DOCTYPE is ignored.
    fn read_doctype(&mut self, doctype: &BytesText<'_>) -> Result<(), RdfXmlParseError> {
        let doctype = self.reader.decoder().decode(doctype.as_ref())?;
        for declaration in doctype.split("<!ENTITY").skip(1) {
            let declaration = declaration.trim_start();
            let declaration = declaration
                .strip_prefix('%')
                .map_or(declaration, str::trim_start);
            let (name, rest) = declaration
                .split_once(|c: char| c.is_ascii_whitespace())
                .ok_or_else(|| invalid("<!ENTITY declarations need a name and a value"))?;
            let (value, rest) = rest
                .trim_start()
                .strip_prefix('"')
                .and_then(|rest| rest.split_once('"'))
                .ok_or_else(|| invalid("<!ENTITY values must be written between double quotes"))?;
            if !rest.trim_start().starts_with('>') {
                return Err(invalid("<!ENTITY declarations must end with '>'").into());
            }
            let value = unescape_with(value, |entity| self.resolve_entity(entity))?.into_owned();
            self.entities.insert(name.to_owned(), value);
        }
        Ok(())
    }

    fn on_start(&mut self, start: &BytesStart<'_>) -> Result<(), RdfXmlParseError> {
        if let Some(Frame {
            kind: FrameKind::XmlLiteral { writer, .. },
            ..
        }) = self.stack.last_mut()
        {
            let qname = start.name();
            let name = self.reader.decoder().decode(qname.as_ref())?;
            let mut copy = BytesStart::new(name.into_owned());
            let mut declared = Vec::new();
            for attribute in start.attributes() {
                let attribute = attribute?;
                declared.push(attribute.key.as_ref().to_vec());
                copy.push_attribute(attribute);
            }
            if self.literal_depth == 0 {
                // the copied root carries the namespaces in scope it does not declare itself
                for (prefix, namespace) in self.reader.prefixes() {
                    let key = match prefix {
                        PrefixDeclaration::Default => b"xmlns".to_vec(),
                        PrefixDeclaration::Named(prefix) => [b"xmlns:".as_slice(), prefix].concat(),
                    };
                    if !declared.contains(&key) {
                        copy.push_attribute((key.as_slice(), namespace.into_inner()));
                        declared.push(key);
                    }
                }
            }
            writer.write_event(Event::Start(copy))?;
            self.literal_depth += 1;
            return Ok(());
        }

        let name = self.expanded_name(self.reader.resolve_element(start.name()))?;
        let attributes = self.read_attributes(start)?;
        let frame = match self.stack.last() {
            Some(Frame {
                kind: FrameKind::Document,
                ..
            }) if name == RDF_RDF => Frame {
                base: attributes.base,
                language: attributes.language,
                kind: FrameKind::Root,
            },
            Some(Frame {
                kind:
                    FrameKind::Document
                    | FrameKind::Root
                    | FrameKind::Property { .. }
                    | FrameKind::Collection { .. },
                ..
            }) => {
                if NOT_NODE_ELEMENTS.contains(&name.as_str()) {
                    return Err(invalid(format!("{name} is not allowed as a node element")).into());
                }
                self.node_element(parse_iri(name)?, attributes)?
            }
            Some(Frame {
                kind: FrameKind::Node { subject, .. },
                ..
            }) => {
                let subject = subject.clone();
                let predicate = if name == RDF_LI {
                    self.next_li()
                } else if NOT_NODE_ELEMENTS.contains(&name.as_str()) || name == RDF_DESCRIPTION {
                    return Err(
                        invalid(format!("{name} is not allowed as a property element")).into(),
                    );
                } else {
                    parse_iri(name)?
                };
                self.property_element(predicate, subject, attributes)?
            }
            Some(Frame {
                kind: FrameKind::XmlLiteral { .. },
                ..
            })
            | None => return Err(invalid("Unbalanced XML elements").into()),
        };
        self.stack.push(frame);
        Ok(())
    }

    /// The next `rdf:_n` predicate of the innermost node element.
    fn next_li(&mut self) -> NamedNode {
        let index = match self.stack.last_mut() {
            Some(Frame {
                kind: FrameKind::Node { li, .. },
                ..
            }) => {
                *li += 1;
                *li
            }
            _ => 1,
        };
        NamedNode::new_unchecked(format!("{}_{index}", rdf::NAMESPACE))
    }

    fn node_element(
        &mut self,
        name: NamedNode,
        attributes: ElementAttributes,
    ) -> Result<Frame, RdfXmlSyntaxError> {
        let subject = match (attributes.id, attributes.node_id, attributes.about) {
            (None, None, None) => NamedOrBlankNode::from(BlankNode::default()),
            (Some(id), None, None) => id.into(),
            (None, Some(node_id), None) => node_id.into(),
            (None, None, Some(about)) => about.into(),
            _ => {
                return Err(invalid(
                    "A node element can only have one of rdf:ID, rdf:nodeID and rdf:about",
                ));
            }
        };
        if name.as_str() != RDF_DESCRIPTION {
            self.pending
                .push_back(Triple::new(subject.clone(), rdf::TYPE, name));
        }
        if let Some(class) = attributes.types {
            self.pending
                .push_back(Triple::new(subject.clone(), rdf::TYPE, class));
        }
        self.push_attribute_properties(
            &subject,
            attributes.properties,
            attributes.language.as_deref(),
        );
        Ok(Frame {
            base: attributes.base,
            language: attributes.language,
            kind: FrameKind::Node { subject, li: 0 },
        })
    }

    fn property_element(
        &mut self,
        predicate: NamedNode,
        subject: NamedOrBlankNode,
        attributes: ElementAttributes,
    ) -> Result<Frame, RdfXmlSyntaxError> {
        let ElementAttributes {
            base,
            language,
            id: reified_as,
            node_id,
            resource,
            datatype,
            types,
            parse_type,
            properties,
            ..
        } = attributes;
        let kind = match parse_type {
            ParseType::Normal => {
                let is_empty_element = resource.is_none()
                    && node_id.is_none()
                    && types.is_none()
                    && properties.is_empty();
                let value = if is_empty_element {
                    None
                } else {
                    // the value is described by the attributes, the element must stay empty
                    let object = match (resource, node_id) {
                        (None, None) => NamedOrBlankNode::from(BlankNode::default()),
                        (Some(resource), None) => resource.into(),
                        (None, Some(node_id)) => node_id.into(),
                        (Some(_), Some(_)) => {
                            return Err(invalid(
                                "rdf:resource and rdf:nodeID can't be used on the same element",
                            ));
                        }
                    };
                    if let Some(class) = types {
                        self.pending
                            .push_back(Triple::new(object.clone(), rdf::TYPE, class));
                    }
                    self.push_attribute_properties(&object, properties, language.as_deref());
                    Some(PropertyValue::Node(object))
                };
                FrameKind::Property {
                    predicate,
                    subject,
                    value,
                    reified_as,
                    datatype,
                }
            }
            ParseType::Literal | ParseType::Unknown => FrameKind::XmlLiteral {
                predicate,
                subject,
                writer: Writer::new(Vec::new()),
                reified_as,
                keep: parse_type == ParseType::Literal,
            },
            ParseType::Resource => {
                let object = BlankNode::default();
                self.push_statement(
                    Triple::new(subject, predicate, object.clone()),
                    reified_as,
                );
                FrameKind::Node {
                    subject: object.into(),
                    li: 0,
                }
            }
            ParseType::Collection => FrameKind::Collection {
                predicate,
                subject,
                items: Vec::new(),
                reified_as,
            },
        };
        Ok(Frame {
            base,
            language,
            kind,
        })
    }

    fn on_end(&mut self, end: &BytesEnd<'_>) -> Result<(), RdfXmlParseError> {
        if self.literal_depth > 0 {
            if let Some(Frame {
                kind: FrameKind::XmlLiteral { writer, .. },
                ..
            }) = self.stack.last_mut()
            {
                let qname = end.name();
                let name = self.reader.decoder().decode(qname.as_ref())?;
                writer.write_event(Event::End(BytesEnd::new(name)))?;
                self.literal_depth -= 1;
                return Ok(());
            }
        }
        let Some(frame) = self.stack.pop() else {
            return Ok(());
        };
        self.close(frame)?;
        Ok(())
    }

    fn close(&mut self, frame: Frame) -> Result<(), RdfXmlSyntaxError> {
        match frame.kind {
            FrameKind::Document | FrameKind::Root => (),
            FrameKind::Node { subject, .. } => match self.stack.last_mut().map(|f| &mut f.kind) {
                Some(FrameKind::Property { value, .. }) => {
                    if PropertyValue::is_set(value.as_ref()) {
                        return Err(invalid(
                            "A property element can only contain a single node element",
                        ));
                    }
                    *value = Some(PropertyValue::Node(subject));
                }
                Some(FrameKind::Collection { items, .. }) => items.push(subject),
                _ => (),
            },
            FrameKind::Property {
                predicate,
                subject,
                value,
                reified_as,
                datatype,
            } => {
                let object = match value {
                    Some(PropertyValue::Node(node)) => Term::from(node),
                    Some(PropertyValue::Text(text)) => {
                        self.literal(text, frame.language, datatype)?.into()
                    }
                    None => self.literal(String::new(), frame.language, datatype)?.into(),
                };
                self.push_statement(Triple::new(subject, predicate, object), reified_as);
            }
            FrameKind::Collection {
                predicate,
                subject,
                items,
                reified_as,
            } => {
                let cells = items
                    .iter()
                    .map(|_| BlankNode::default())
                    .collect::<Vec<_>>();
                let head = cells
                    .first()
                    .map_or_else(|| Term::from(rdf::NIL), |cell| cell.clone().into());
                self.push_statement(Triple::new(subject, predicate, head), reified_as);
                for (i, (cell, item)) in cells.iter().zip(items).enumerate() {
                    let rest = cells
                        .get(i + 1)
                        .map_or_else(|| Term::from(rdf::NIL), |next| next.clone().into());
                    self.pending
                        .push_back(Triple::new(cell.clone(), rdf::FIRST, item));
                    self.pending
                        .push_back(Triple::new(cell.clone(), rdf::REST, rest));
                }
            }
            FrameKind::XmlLiteral {
                predicate,
                subject,
                writer,
                reified_as,
                keep,
            } => {
                if keep {
                    let value = String::from_utf8(writer.into_inner())
                        .map_err(|_| invalid("XML literals must be valid UTF-8"))?;
                    let object = Literal::new_typed_literal(value, rdf::XML_LITERAL);
                    self.push_statement(Triple::new(subject, predicate, object), reified_as);
                }
            }
        }
        Ok(())
    }

    fn on_text(&mut self, text: &BytesText<'_>) -> Result<(), RdfXmlParseError> {
        let text = text
            .unescape_with(|entity| self.resolve_entity(entity))?
            .into_owned();
        match self.stack.last_mut().map(|f| &mut f.kind) {
            Some(FrameKind::Property { value, .. }) if !PropertyValue::is_set(value.as_ref()) => {
                *value = Some(PropertyValue::Text(text));
                Ok(())
            }
            Some(FrameKind::XmlLiteral { writer, .. }) => {
                writer.write_event(Event::Text(BytesText::new(&text)))?;
                Ok(())
            }
            _ if text.bytes().all(is_xml_space) => Ok(()),
            _ => Err(invalid(format!("Unexpected text '{text}'")).into()),
        }
    }

    fn read_attributes(
        &mut self,
        start: &BytesStart<'_>,
    ) -> Result<ElementAttributes, RdfXmlParseError> {
        let mut attributes = ElementAttributes::default();
        let mut id = None;
        let mut about = None;
        let mut resource = None;
        let mut datatype = None;
        let mut types = None;
        for attribute in start.attributes() {
            let attribute = attribute?;
            match attribute.key.as_ref() {
                b"xml:lang" => {
                    let tag = self.attribute_value(&attribute)?.to_ascii_lowercase();
                    let tag = LanguageTag::parse(tag.clone())
                        .map_err(|error| RdfXmlSyntaxError::invalid_language_tag(tag, error))?;
                    attributes.language = Some(tag.into_inner());
                    continue;
                }
                b"xml:base" => {
                    // relative to the base in scope
                    let reference = self.attribute_value(&attribute)?;
                    let base = match self.current_base() {
                        Some(base) => base.resolve(&reference),
                        None => Iri::parse(reference.clone()),
                    }
                    .map_err(|error| RdfXmlSyntaxError::invalid_iri(reference, error))?;
                    attributes.base = Some(base);
                    continue;
                }
                // namespace declarations and other reserved names
                key if key.starts_with(b"xml") => continue,
                _ => (),
            }
            let name = self.expanded_name(self.reader.resolve_attribute(attribute.key))?;
            match name.as_str() {
                RDF_ID => id = Some(nc_name(self.attribute_value(&attribute)?, "rdf:ID")?),
                RDF_BAG_ID => {
                    nc_name(self.attribute_value(&attribute)?, "rdf:bagID")?;
                }
                RDF_NODE_ID => {
                    let node_id = nc_name(self.attribute_value(&attribute)?, "rdf:nodeID")?;
                    attributes.node_id = Some(BlankNode::new_unchecked(node_id));
                }
                RDF_ABOUT => about = Some(self.attribute_value(&attribute)?),
                RDF_RESOURCE => resource = Some(self.attribute_value(&attribute)?),
                RDF_DATATYPE => datatype = Some(self.attribute_value(&attribute)?),
                RDF_TYPE => types = Some(self.attribute_value(&attribute)?),
                RDF_PARSE_TYPE => {
                    attributes.parse_type = match attribute.value.as_ref() {
                        b"Collection" => ParseType::Collection,
                        b"Literal" => ParseType::Literal,
                        b"Resource" => ParseType::Resource,
                        _ => ParseType::Unknown,
                    };
                }
                name if NOT_PROPERTY_ATTRIBUTES.contains(&name) => {
                    return Err(invalid(format!("{name} can't be used as an attribute")).into());
                }
                _ => {
                    let value = self.attribute_value(&attribute)?;
                    attributes.properties.push((parse_iri(name)?, value));
                }
            }
        }

        let base = attributes.base.as_ref();
        if let Some(id) = id {
            let id = self.resolve_iri(base, format!("#{id}"))?;
            if self.seen_ids.contains(id.as_str()) {
                return Err(invalid(format!("{id} is used twice as rdf:ID")).into());
            }
            self.seen_ids.insert(id.as_str().to_owned());
            attributes.id = Some(id);
        }
        attributes.about = about
            .map(|iri| self.resolve_iri(base, iri))
            .transpose()?;
        attributes.resource = resource
            .map(|iri| self.resolve_iri(base, iri))
            .transpose()?;
        attributes.datatype = datatype
            .map(|iri| self.resolve_iri(base, iri))
            .transpose()?;
        attributes.types = types.map(|iri| self.resolve_iri(base, iri)).transpose()?;
        Ok(attributes)
    }

    fn push_attribute_properties(
        &mut self,
        subject: &NamedOrBlankNode,
        properties: Vec<(NamedNode, String)>,
        language: Option<&str>,
    ) {
        let language = language
            .or_else(|| self.current_language())
            .map(ToOwned::to_owned);
        for (predicate, value) in properties {
            let object = match &language {
                Some(language) => {
                    Literal::new_language_tagged_literal_unchecked(value, language.clone())
                }
                None => Literal::new_simple_literal(value),
            };
            self.pending
                .push_back(Triple::new(subject.clone(), predicate, object));
        }
    }

    /// Pushes the triple, followed by its reification if the element had a `rdf:ID`.
    fn push_statement(&mut self, triple: Triple, reified_as: Option<NamedNode>) {
        let reification = reified_as.map(|statement| {
            [
                Triple::new(statement.clone(), rdf::TYPE, rdf::STATEMENT),
                Triple::new(statement.clone(), rdf::SUBJECT, triple.subject.clone()),
                Triple::new(statement.clone(), rdf::PREDICATE, triple.predicate.clone()),
                Triple::new(statement, rdf::OBJECT, triple.object.clone()),
            ]
        });
        self.pending.push_back(triple);
        self.pending.extend(reification.into_iter().flatten());
    }

    fn literal(
        &self,
        value: String,
        language: Option<String>,
        datatype: Option<NamedNode>,
    ) -> Result<Literal, RdfXmlSyntaxError> {
        if let Some(datatype) = datatype {
            return Literal::new_checked_typed_literal(value, datatype)
                .map_err(|e| invalid(e.to_string()));
        }
        Ok(
            match language.or_else(|| self.current_language().map(ToOwned::to_owned)) {
                Some(language) => Literal::new_language_tagged_literal_unchecked(value, language),
                None => Literal::new_simple_literal(value),
            },
        )
    }

    /// The namespace IRI followed by the local name.
    fn expanded_name(
        &self,
        (namespace, local_name): (ResolveResult<'_>, LocalName<'_>),
    ) -> Result<String, RdfXmlParseError> {
        let decoder = self.reader.decoder();
        match namespace {
            ResolveResult::Bound(namespace) => {
                let name = [namespace.into_inner(), local_name.into_inner()].concat();
                let name = decoder.decode(&name)?;
                Ok(unescape_with(&name, |entity| self.resolve_entity(entity))?.into_owned())
            }
            ResolveResult::Unbound => {
                Err(invalid("RDF/XML only accepts elements and attributes in a namespace").into())
            }
            ResolveResult::Unknown(prefix) => Err(RdfXmlSyntaxError::unknown_prefix_declaration(
                decoder.decode(&prefix)?.into_owned(),
            )
            .into()),
        }
    }

    fn attribute_value(&self, attribute: &Attribute<'_>) -> Result<String, RdfXmlParseError> {
        let value = attribute
            .decode_and_unescape_value_with(self.reader.decoder(), |entity| {
                self.resolve_entity(entity)
            })?;
        Ok(value.into_owned())
    }

    /// Without base IRI in scope, references are kept as they are.
    fn resolve_iri(
        &self,
        base: Option<&Iri<String>>,
        reference: String,
    ) -> Result<NamedNode, RdfXmlSyntaxError> {
        match base.or_else(|| self.current_base()) {
            Some(base) => match base.resolve(&reference) {
                Ok(iri) => Ok(NamedNode::new_unchecked(iri.into_inner())),
                Err(error) => Err(RdfXmlSyntaxError::invalid_iri(reference, error)),
            },
            None if reference.is_empty() => {
                Err(invalid("An empty IRI reference requires a base IRI"))
            }
            None => Ok(NamedNode::new_unchecked(reference)),
        }
    }

    fn current_base(&self) -> Option<&Iri<String>> {
        self.stack.iter().rev().find_map(|frame| frame.base.as_ref())
    }

    fn current_language(&self) -> Option<&str> {
        self.stack
            .iter()
            .rev()
            .find_map(|frame| frame.language.as_deref())
    }

    fn resolve_entity(&self, entity: &str) -> Option<&str> {
        resolve_xml_entity(entity).or_else(|| self.entities.get(entity).map(String::as_str))
    }
}

fn invalid(message: impl Into<String>) -> RdfXmlSyntaxError {
    RdfXmlSyntaxError::msg(message)
}

fn parse_iri(iri: String) -> Result<NamedNode, RdfXmlSyntaxError> {
    match Iri::parse(iri.as_str()) {
        Ok(_) => Ok(NamedNode::new_unchecked(iri)),
        Err(error) => Err(RdfXmlSyntaxError::invalid_iri(iri, error)),
    }
}

fn nc_name(value: String, attribute: &str) -> Result<String, RdfXmlSyntaxError> {
    if is_nc_name(&value) {
        Ok(value)
    } else {
        Err(invalid(format!("'{value}' is not a valid {attribute} value")))
    }
}

fn is_xml_space(c: u8) -> bool {
    matches!(c, b' ' | b'\t' | b'\n' | b'\r')
}

#[cfg(test)]
mod tests {
    #![allow(clippy::panic_in_result_fn)]

    use super::*;
    use rdfterm::Subject;

    const NAMESPACES: &str = r#"xmlns:rdf="http://www.w3.org/1999/02/22-rdf-syntax-ns#" xmlns:ex="http://example.com/""#;

    fn parse(content: &str) -> Result<Vec<Triple>, RdfXmlSyntaxError> {
        RdfXmlParser::new()
            .for_slice(&format!("<rdf:RDF {NAMESPACES}>{content}</rdf:RDF>"))
            .collect()
    }

    fn ex(name: &str) -> NamedNode {
        NamedNode::new_unchecked(format!("http://example.com/{name}"))
    }

    #[test]
    fn test_striped_syntax() -> Result<(), RdfXmlSyntaxError> {
        let triples = parse(
            r#"<rdf:Description rdf:about="http://example.com/a">
                <ex:knows>
                    <ex:Person rdf:about="http://example.com/b" ex:name="B"/>
                </ex:knows>
            </rdf:Description>"#,
        )?;
        assert_eq!(
            triples,
            [
                Triple::new(ex("b"), rdf::TYPE, ex("Person")),
                Triple::new(ex("b"), ex("name"), Literal::new_simple_literal("B")),
                Triple::new(ex("a"), ex("knows"), ex("b")),
            ]
        );
        Ok(())
    }

    #[test]
    fn test_rdf_id_reification() -> Result<(), RdfXmlSyntaxError> {
        let triples = RdfXmlParser::new()
            .with_base_iri("http://example.com/doc")
            .map_err(|e| RdfXmlSyntaxError::msg(e.to_string()))?
            .for_slice(&format!(
                r#"<rdf:RDF {NAMESPACES}><rdf:Description rdf:about="s"><ex:p rdf:ID="t">v</ex:p></rdf:Description></rdf:RDF>"#
            ))
            .collect::<Result<Vec<_>, _>>()?;
        assert_eq!(triples.len(), 5);
        assert_eq!(
            triples[0],
            Triple::new(ex("s"), ex("p"), Literal::new_simple_literal("v"))
        );
        assert!(triples.contains(&Triple::new(ex("doc#t"), rdf::TYPE, rdf::STATEMENT)));
        assert!(triples.contains(&Triple::new(ex("doc#t"), rdf::SUBJECT, ex("s"))));
        Ok(())
    }

    #[test]
    fn test_duplicated_rdf_id() {
        let error =
            parse(r#"<rdf:Description rdf:ID="a"/><rdf:Description rdf:ID="a"/>"#).unwrap_err();
        assert!(error.to_string().contains("used twice"));
    }

    #[test]
    fn test_li_and_lang() -> Result<(), RdfXmlSyntaxError> {
        let triples = parse(
            r#"<rdf:Seq rdf:about="http://example.com/seq" xml:lang="EN"><rdf:li>a</rdf:li><rdf:li>b</rdf:li></rdf:Seq>"#,
        )?;
        assert_eq!(
            triples,
            [
                Triple::new(ex("seq"), rdf::TYPE, NamedNode::new_unchecked(format!("{}Seq", rdf::NAMESPACE))),
                Triple::new(
                    ex("seq"),
                    NamedNode::new_unchecked(format!("{}_1", rdf::NAMESPACE)),
                    Literal::new_language_tagged_literal_unchecked("a", "en"),
                ),
                Triple::new(
                    ex("seq"),
                    NamedNode::new_unchecked(format!("{}_2", rdf::NAMESPACE)),
                    Literal::new_language_tagged_literal_unchecked("b", "en"),
                ),
            ]
        );
        Ok(())
    }

    #[test]
    fn test_collection() -> Result<(), RdfXmlSyntaxError> {
        let triples = parse(
            r#"<rdf:Description rdf:about="http://example.com/s">
                <ex:list rdf:parseType="Collection"><rdf:Description rdf:about="http://example.com/a"/></ex:list>
                <ex:empty rdf:parseType="Collection"></ex:empty>
            </rdf:Description>"#,
        )?;
        assert_eq!(triples.len(), 4);
        let Term::BlankNode(cell) = &triples[0].object else {
            panic!("the list should start with a blank node")
        };
        assert_eq!(triples[1], Triple::new(cell.clone(), rdf::FIRST, ex("a")));
        assert_eq!(triples[2], Triple::new(cell.clone(), rdf::REST, rdf::NIL));
        assert_eq!(triples[3], Triple::new(ex("s"), ex("empty"), rdf::NIL));
        Ok(())
    }

    #[test]
    fn test_parse_type_resource_and_literal() -> Result<(), RdfXmlSyntaxError> {
        let triples = parse(
            r#"<rdf:Description rdf:about="http://example.com/a">
                <ex:address rdf:parseType="Resource"><ex:city>Paris</ex:city></ex:address>
                <ex:note rdf:parseType="Literal"><b>bold</b></ex:note>
                <ex:ignored rdf:parseType="Other"><b>dropped</b></ex:ignored>
            </rdf:Description>"#,
        )?;
        assert_eq!(triples.len(), 3);
        let Term::Literal(note) = &triples[2].object else {
            panic!("XML literal expected")
        };
        assert_eq!(note.datatype(), rdf::XML_LITERAL);
        assert!(note.value().contains("<b"));
        Ok(())
    }

    #[test]
    fn test_xml_literal_keeps_own_namespace_declarations() -> Result<(), RdfXmlSyntaxError> {
        let triples = parse(
            r#"<rdf:Description rdf:about="http://example.com/a">
                <ex:note rdf:parseType="Literal"><b xmlns="http://www.w3.org/1999/xhtml">bold</b></ex:note>
            </rdf:Description>"#,
        )?;
        let Term::Literal(note) = &triples[0].object else {
            panic!("XML literal expected")
        };
        assert_eq!(note.value().matches("xmlns=").count(), 1, "{}", note.value());
        assert_eq!(note.value().matches("xmlns:ex=").count(), 1, "{}", note.value());
        assert!(note.value().ends_with(">bold</b>"));
        Ok(())
    }

    #[test]
    fn test_lang_string_datatype_is_rejected() {
        let error = parse(&format!(
            r#"<rdf:Description rdf:about="http://example.com/a"><ex:p rdf:datatype="{}">x</ex:p></rdf:Description>"#,
            rdf::LANG_STRING.as_str()
        ))
        .unwrap_err();
        assert!(error.to_string().contains("without a language tag"), "{error}");
    }

    #[test]
    fn test_undeclared_prefix() {
        let error = parse("<foo:Thing/>").unwrap_err();
        assert_eq!(error.unknown_prefix(), Some("foo"));
    }

    #[test]
    fn test_property_attributes_on_empty_property() -> Result<(), RdfXmlSyntaxError> {
        let triples = parse(
            r#"<rdf:Description rdf:about="http://example.com/a"><ex:knows ex:name="B" rdf:type="http://example.com/Person"/></rdf:Description>"#,
        )?;
        assert_eq!(triples.len(), 3);
        let Term::BlankNode(b) = &triples[2].object else {
            panic!("a blank node should hold the attributes")
        };
        assert_eq!(triples[0], Triple::new(b.clone(), rdf::TYPE, ex("Person")));
        Ok(())
    }

    #[test]
    fn test_entities() -> Result<(), RdfXmlSyntaxError> {
        let triples = RdfXmlParser::new()
            .for_slice(&format!(
                r#"<!DOCTYPE rdf:RDF [<!ENTITY ex "http://example.com/">]>
                <rdf:RDF {NAMESPACES}><rdf:Description rdf:about="&ex;s" ex:p="o"/></rdf:RDF>"#
            ))
            .collect::<Result<Vec<_>, _>>()?;
        assert_eq!(triples[0].subject, Subject::from(ex("s")));
        Ok(())
    }

    #[test]
    fn test_non_utf8_declaration() {
        let error = RdfXmlParser::new()
            .for_slice(&format!(
                r#"<?xml version="1.0" encoding="ISO-8859-1"?><rdf:RDF {NAMESPACES}/>"#
            ))
            .find_map(Result::err)
            .unwrap();
        assert!(error.to_string().contains("UTF-8"));
    }

    #[test]
    fn test_empty_reference_without_base() {
        assert!(parse(r#"<rdf:Description rdf:about=""/>"#).is_err());
    }

    #[test]
    fn test_unclosed_document() {
        let error = RdfXmlParser::new()
            .for_slice(&format!(
                r#"<rdf:RDF {NAMESPACES}><rdf:Description rdf:about="http://example.com/s">"#
            ))
            .find_map(Result::err)
            .unwrap();
        assert!(error.position().is_some());
    }

    #[test]
    fn test_empty_document() -> Result<(), RdfXmlSyntaxError> {
        assert!(parse("")?.is_empty());
        Ok(())
    }
}
