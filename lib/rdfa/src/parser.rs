use crate::error::{RdfaParseError, RdfaSyntaxError};
use crate::html::{
    closes_open_sibling, decode_character_references, is_raw_text_element, is_void_element,
    skip_raw_text,
};
use crate::initial_context::{INITIAL_PREFIXES, INITIAL_TERMS, USES_VOCABULARY, XHV_NAMESPACE};
use oxilangtag::LanguageTag;
use oxiri::{Iri, IriParseError};
use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use rdfterm::vocab::{rdf, xsd};
use rdfterm::{
    BlankNode, Literal, NamedNode, NamedNodeRef, NamedOrBlankNode, PrefixTable, Term, Triple,
};
use std::collections::HashMap;
use std::io::{BufReader, Read};
use std::iter::once;
use std::ops::Range;
use std::sync::Arc;

const DEFAULT_BASE_IRI: &str = "http://example.com";

/// A streaming parser for [RDFa 1.1](https://www.w3.org/TR/rdfa-core/) annotations in HTML documents.
///
/// The HTML markup is read in a tolerant way: element names are case-insensitive,
/// void elements like `<br>` or `<meta>` do not need to be closed, a few end tags may be omitted
/// and unknown character references are kept verbatim.
/// The content of `<script>` and `<style>` elements is skipped.
///
/// Relative IRIs are resolved against `http://example.com` unless [`with_base_iri`](Self::with_base_iri)
/// or a `<base href>` element provides another base IRI.
///
/// ```
/// use rdfa::RdfaParser;
/// use rdfterm::vocab::rdf;
/// use rdfterm::{NamedNode, Term};
///
/// let file = r#"<!DOCTYPE html>
/// <html>
///   <body vocab="http://schema.org/">
///     <div typeof="Person" resource="/alice"><span property="name">Alice</span><br></div>
///     <div typeof="Person" resource="/bob"><span property="name">Bob</span></div>
///   </body>
/// </html>"#;
///
/// let schema_person = Term::from(NamedNode::new("http://schema.org/Person")?);
/// let mut count = 0;
/// for triple in RdfaParser::new().for_reader(file.as_bytes()) {
///     let triple = triple?;
///     if triple.predicate == rdf::TYPE && triple.object == schema_person {
///         count += 1;
///     }
/// }
/// assert_eq!(2, count);
/// # Result::<_, Box<dyn std::error::Error>>::Ok(())
/// ```
#[derive(Default, Clone)]
#[must_use]
pub struct RdfaParser {
    base: Option<Iri<String>>,
    prefixes: Vec<(String, String)>,
}

impl RdfaParser {
    /// Builds a new [`RdfaParser`].
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the document base IRI, used until a `<base href>` element overrides it.
    #[inline]
    pub fn with_base_iri(mut self, base_iri: impl Into<String>) -> Result<Self, IriParseError> {
        self.base = Some(Iri::parse(base_iri.into())?);
        Ok(self)
    }

    /// Adds a prefix mapping available to CURIEs in the whole document,
    /// on top of the ones of the RDFa initial context.
    ///
    /// ```
    /// use rdfa::RdfaParser;
    ///
    /// let file = r#"<p about="http://example.com/s" property="ex:name">S</p>"#;
    ///
    /// let triples = RdfaParser::new()
    ///     .with_prefix("ex", "http://example.org/ns#")?
    ///     .for_slice(file)
    ///     .collect::<Result<Vec<_>, _>>()?;
    /// assert_eq!(
    ///     triples[0].to_string(),
    ///     "<http://example.com/s> <http://example.org/ns#name> \"S\""
    /// );
    /// # Result::<_, Box<dyn std::error::Error>>::Ok(())
    /// ```
    #[inline]
    pub fn with_prefix(
        mut self,
        prefix_name: impl Into<String>,
        prefix_iri: impl Into<String>,
    ) -> Result<Self, IriParseError> {
        let mut prefix_name = prefix_name.into();
        prefix_name.make_ascii_lowercase();
        self.prefixes
            .push((prefix_name, Iri::parse(prefix_iri.into())?.into_inner()));
        Ok(self)
    }

    /// Parses a HTML document from a [`Read`] implementation.
    pub fn for_reader<R: Read>(self, reader: R) -> ReaderRdfaParser<R> {
        ReaderRdfaParser {
            results: Vec::new(),
            parser: self.into_internal(BufReader::new(reader)),
            reader_buffer: Vec::default(),
        }
    }

    /// Parses a HTML document from a byte slice.
    ///
    /// ```
    /// use rdfa::RdfaParser;
    ///
    /// let file = r##"<html prefix="foaf: http://xmlns.com/foaf/0.1/">
    ///   <body about="#me" rel="foaf:knows">
    ///     <p resource="#alice" typeof="foaf:Person">Alice</p>
    ///   </body>
    /// </html>"##;
    ///
    /// let triples = RdfaParser::new()
    ///     .with_base_iri("http://example.com/page")?
    ///     .for_slice(file)
    ///     .collect::<Result<Vec<_>, _>>()?;
    /// assert_eq!(triples.len(), 2);
    /// # Result::<_, Box<dyn std::error::Error>>::Ok(())
    /// ```
    pub fn for_slice(self, slice: &(impl AsRef<[u8]> + ?Sized)) -> SliceRdfaParser<'_> {
        SliceRdfaParser {
            results: Vec::new(),
            parser: self.into_internal(slice.as_ref()),
        }
    }

    fn into_internal<T>(self, reader: T) -> InternalRdfaParser<T> {
        let mut reader = Reader::from_reader(reader);
        let config = reader.config_mut();
        config.check_end_names = false;
        config.allow_unmatched_ends = true;
        let base = self
            .base
            .unwrap_or_else(|| Iri::parse_unchecked(DEFAULT_BASE_IRI.to_owned()));
        let mut prefixes = INITIAL_PREFIXES
            .iter()
            .map(|(name, namespace)| ((*name).to_owned(), (*namespace).to_owned()))
            .collect::<HashMap<_, _>>();
        let mut document_prefixes = PrefixTable::new();
        for (name, namespace) in self.prefixes {
            document_prefixes.insert(name.clone(), namespace.clone());
            prefixes.insert(name, namespace);
        }
        InternalRdfaParser {
            reader,
            root: EvaluationContext {
                parent_subject: NamedNode::new_unchecked(base.as_str()).into(),
                parent_object: None,
                incomplete_triples: Vec::new(),
                language: None,
                prefixes: Arc::new(prefixes),
                vocabulary: None,
            },
            base,
            stack: Vec::new(),
            blank_nodes: HashMap::new(),
            document_prefixes,
            skip_raw_text_of: None,
            is_end: false,
        }
    }
}

/// Parses a HTML document from a [`Read`] implementation.
///
/// Can be built using [`RdfaParser::for_reader`].
#[must_use]
pub struct ReaderRdfaParser<R: Read> {
    results: Vec<Triple>,
    parser: InternalRdfaParser<BufReader<R>>,
    reader_buffer: Vec<u8>,
}

impl<R: Read> Iterator for ReaderRdfaParser<R> {
    type Item = Result<Triple, RdfaParseError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(triple) = self.results.pop() {
                return Some(Ok(triple));
            } else if self.parser.is_end {
                return None;
            }
            if let Err(e) = self.parse_step() {
                self.parser.is_end = true;
                self.results.clear();
                return Some(Err(e.with_position(self.parser.reader.buffer_position())));
            }
        }
    }
}

impl<R: Read> ReaderRdfaParser<R> {
    /// The prefixes declared by `prefix` and `xmlns:*` attributes read so far,
    /// plus the ones given to [`RdfaParser::with_prefix`].
    ///
    /// ```
    /// use rdfa::RdfaParser;
    ///
    /// let file = r#"<div prefix="ex: http://example.com/ns#" about="/s" property="ex:p">o</div>"#;
    ///
    /// let mut parser = RdfaParser::new().for_reader(file.as_bytes());
    /// assert!(parser.prefixes().is_empty());
    ///
    /// parser.next().unwrap()?;
    /// assert_eq!(parser.prefixes().get("ex"), Some("http://example.com/ns#"));
    /// # Result::<_, Box<dyn std::error::Error>>::Ok(())
    /// ```
    pub fn prefixes(&self) -> PrefixTable {
        self.parser.document_prefixes.clone()
    }

    /// The base IRI considered at the current step of the parsing.
    pub fn base_iri(&self) -> &str {
        self.parser.base.as_str()
    }

    /// The current byte position in the input data.
    pub fn buffer_position(&self) -> u64 {
        self.parser.reader.buffer_position()
    }

    fn parse_step(&mut self) -> Result<(), RdfaParseError> {
        self.reader_buffer.clear();
        let event = self
            .parser
            .reader
            .read_event_into(&mut self.reader_buffer)?;
        self.parser.parse_event(event, &mut self.results)?;
        if let Some(name) = self.parser.skip_raw_text_of.take() {
            skip_raw_text(self.parser.reader.get_mut(), &name)?;
            self.parser.close_top(&mut self.results)?;
        }
        self.results.reverse();
        Ok(())
    }
}

/// Parses a HTML document from a byte slice.
///
/// Can be built using [`RdfaParser::for_slice`].
#[must_use]
pub struct SliceRdfaParser<'a> {
    results: Vec<Triple>,
    parser: InternalRdfaParser<&'a [u8]>,
}

impl Iterator for SliceRdfaParser<'_> {
    type Item = Result<Triple, RdfaParseError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(triple) = self.results.pop() {
                return Some(Ok(triple));
            } else if self.parser.is_end {
                return None;
            }
            if let Err(e) = self.parse_step() {
                self.parser.is_end = true;
                self.results.clear();
                return Some(Err(e.with_position(self.parser.reader.buffer_position())));
            }
        }
    }
}

impl SliceRdfaParser<'_> {
    /// The prefixes declared by `prefix` and `xmlns:*` attributes read so far,
    /// plus the ones given to [`RdfaParser::with_prefix`].
    pub fn prefixes(&self) -> PrefixTable {
        self.parser.document_prefixes.clone()
    }

    /// The base IRI considered at the current step of the parsing.
    ///
    /// ```
    /// use rdfa::RdfaParser;
    ///
    /// let file = r#"<html><head><base href="http://example.org/dir/"></head>
    /// <body><p about="page" property="http://purl.org/dc/terms/title">Page</p></body></html>"#;
    ///
    /// let mut parser = RdfaParser::new().for_slice(file);
    /// assert_eq!(parser.base_iri(), "http://example.com");
    ///
    /// let triple = parser.next().unwrap()?;
    /// assert_eq!(parser.base_iri(), "http://example.org/dir/");
    /// assert_eq!(triple.subject.to_string(), "<http://example.org/dir/page>");
    /// # Result::<_, Box<dyn std::error::Error>>::Ok(())
    /// ```
    pub fn base_iri(&self) -> &str {
        self.parser.base.as_str()
    }

    fn parse_step(&mut self) -> Result<(), RdfaParseError> {
        let event = self.parser.reader.read_event()?;
        self.parser.parse_event(event, &mut self.results)?;
        if let Some(name) = self.parser.skip_raw_text_of.take() {
            skip_raw_text(self.parser.reader.get_mut(), &name)?;
            self.parser.close_top(&mut self.results)?;
        }
        self.results.reverse();
        Ok(())
    }
}

/// The RDFa evaluation context that an element hands to its children.
#[derive(Clone)]
struct EvaluationContext {
    parent_subject: NamedOrBlankNode,
    parent_object: Option<NamedOrBlankNode>,
    incomplete_triples: Vec<IncompleteTriple>,
    language: Option<String>,
    prefixes: Arc<HashMap<String, String>>,
    vocabulary: Option<String>,
}

/// A `rel` or `rev` relation waiting for the subject of a descendant element to be its object.
#[derive(Clone)]
struct IncompleteTriple {
    predicate: NamedNode,
    reverse: bool,
}

/// A literal whose value is the text content of the element, only known at its end tag.
struct PendingLiteral {
    subject: NamedOrBlankNode,
    predicates: Vec<NamedNode>,
    datatype: Option<NamedNode>,
    language: Option<String>,
    infer_datatype: bool,
    text: String,
}

struct ElementState {
    name: String,
    context: EvaluationContext,
    literal: Option<PendingLiteral>,
}

#[derive(Default)]
struct RdfaAttributes {
    about: Option<String>,
    content: Option<String>,
    datatype: Option<String>,
    datetime: Option<String>,
    href: Option<String>,
    lang: Option<String>,
    xml_lang: Option<String>,
    prefix: Option<String>,
    property: Option<String>,
    rel: Option<String>,
    resource: Option<String>,
    rev: Option<String>,
    src: Option<String>,
    type_of: Option<String>,
    vocab: Option<String>,
    xmlns: Vec<(String, String)>,
}

/// The object of the `property` attribute.
enum PropertyValue {
    Resource(NamedOrBlankNode),
    Literal {
        content: Option<String>,
        datatype: Option<NamedNode>,
        infer_datatype: bool,
    },
}

struct InternalRdfaParser<R> {
    reader: Reader<R>,
    base: Iri<String>,
    root: EvaluationContext,
    stack: Vec<ElementState>,
    blank_nodes: HashMap<String, BlankNode>,
    document_prefixes: PrefixTable,
    skip_raw_text_of: Option<String>,
    is_end: bool,
}

impl<R> InternalRdfaParser<R> {
    fn parse_event(
        &mut self,
        event: Event<'_>,
        results: &mut Vec<Triple>,
    ) -> Result<(), RdfaParseError> {
        match event {
            Event::Start(event) => {
                let name = self.open_element(&event, results)?;
                if is_void_element(&name) {
                    self.close_top(results)?;
                } else if is_raw_text_element(&name) {
                    self.skip_raw_text_of = Some(name);
                }
                Ok(())
            }
            Event::Empty(event) => {
                self.open_element(&event, results)?;
                self.close_top(results)?;
                Ok(())
            }
            Event::End(event) => {
                let name = self
                    .reader
                    .decoder()
                    .decode(event.name().as_ref())?
                    .to_ascii_lowercase();
                if let Some(position) = self.stack.iter().rposition(|e| e.name == name) {
                    while self.stack.len() > position {
                        self.close_top(results)?;
                    }
                }
                Ok(())
            }
            Event::Text(event) => {
                let text = self.reader.decoder().decode(&event)?;
                self.push_text(&decode_character_references(&text));
                Ok(())
            }
            Event::CData(event) => {
                let text = self.reader.decoder().decode(&event)?;
                self.push_text(&text);
                Ok(())
            }
            Event::Comment(_) | Event::PI(_) | Event::Decl(_) | Event::DocType(_) => Ok(()),
            Event::Eof => {
                while !self.stack.is_empty() {
                    self.close_top(results)?;
                }
                self.is_end = true;
                Ok(())
            }
        }
    }

    /// Processes a start tag and returns the lowercase element name.
    fn open_element(
        &mut self,
        event: &BytesStart<'_>,
        results: &mut Vec<Triple>,
    ) -> Result<String, RdfaParseError> {
        let name = self
            .reader
            .decoder()
            .decode(event.name().as_ref())?
            .to_ascii_lowercase();
        if self
            .stack
            .last()
            .is_some_and(|open| closes_open_sibling(&name, &open.name))
        {
            self.close_top(results)?;
        }
        let attributes = self.parse_attributes(event)?;
        if name == "base" {
            if let Some(href) = &attributes.href {
                self.set_base(href);
            }
        }
        let state = self.process_element(name.clone(), &attributes, results)?;
        self.stack.push(state);
        Ok(name)
    }

    fn parse_attributes(&self, event: &BytesStart<'_>) -> Result<RdfaAttributes, RdfaParseError> {
        let decoder = self.reader.decoder();
        let mut result = RdfaAttributes::default();
        let mut attributes = event.html_attributes();
        attributes.with_checks(false);
        for attribute in attributes {
            // The tokenizer can't resynchronize after a broken attribute
            let Ok(attribute) = attribute else {
                break;
            };
            let key = decoder.decode(attribute.key.as_ref())?.to_ascii_lowercase();
            let value = decoder.decode(&attribute.value)?;
            let value = decode_character_references(&value).into_owned();
            match key.as_str() {
                "about" => result.about = Some(value),
                "content" => result.content = Some(value),
                "datatype" => result.datatype = Some(value),
                "datetime" => result.datetime = Some(value),
                "href" => result.href = Some(value),
                "lang" => result.lang = Some(value),
                "xml:lang" => result.xml_lang = Some(value),
                "prefix" => result.prefix = Some(value),
                "property" => result.property = Some(value),
                "rel" => result.rel = Some(value),
                "resource" => result.resource = Some(value),
                "rev" => result.rev = Some(value),
                "src" => result.src = Some(value),
                "typeof" => result.type_of = Some(value),
                "vocab" => result.vocab = Some(value),
                _ => {
                    if let Some(prefix) = key.strip_prefix("xmlns:") {
                        result.xmlns.push((prefix.to_owned(), value));
                    }
                }
            }
        }
        Ok(result)
    }

    /// The evaluation of one element, steps 1 to 13 of the RDFa Core processing sequence.
    fn process_element(
        &mut self,
        name: String,
        attributes: &RdfaAttributes,
        results: &mut Vec<Triple>,
    ) -> Result<ElementState, RdfaParseError> {
        let is_root = self.stack.is_empty();
        let parent = self
            .stack
            .last()
            .map_or(&self.root, |element| &element.context)
            .clone();
        let mut local = parent.clone();

        // Vocabulary, prefix mappings and language
        if let Some(vocab) = &attributes.vocab {
            let vocab = vocab.trim();
            if vocab.is_empty() {
                local.vocabulary = None;
            } else if let Ok(vocab) = self.base.resolve(vocab) {
                results.push(Triple::new(
                    NamedNode::new_unchecked(self.base.as_str()),
                    NamedNode::new_unchecked(USES_VOCABULARY),
                    NamedNode::new_unchecked(vocab.as_str()),
                ));
                local.vocabulary = Some(vocab.into_inner());
            }
        }
        let declarations = attributes
            .xmlns
            .iter()
            .map(|(name, namespace)| (name.as_str(), namespace.as_str()))
            .chain(attributes.prefix.as_deref().map_or_else(Vec::new, parse_prefix_attribute))
            .filter(|(name, namespace)| *name != "_" && Iri::parse(*namespace).is_ok())
            .collect::<Vec<_>>();
        if !declarations.is_empty() {
            let prefixes = Arc::make_mut(&mut local.prefixes);
            for (name, namespace) in declarations {
                let name = name.to_ascii_lowercase();
                self.document_prefixes
                    .insert(name.clone(), namespace.to_owned());
                prefixes.insert(name, namespace.to_owned());
            }
        }
        if let Some(language) = attributes.xml_lang.as_ref().or(attributes.lang.as_ref()) {
            local.language = if language.is_empty() {
                None
            } else {
                // Invalid tags are ignored, keeping the inherited language
                LanguageTag::parse(language.to_ascii_lowercase())
                    .ok()
                    .map(LanguageTag::into_inner)
                    .or(local.language)
            };
        }

        let mut resolver = TermResolver {
            base: &self.base,
            context: &local,
            blank_nodes: &mut self.blank_nodes,
        };
        let has_property = attributes.property.is_some();
        let rel = resolver.predicates(attributes.rel.as_deref());
        let rev = resolver.predicates(attributes.rev.as_deref());
        // In HTML, `rel` and `rev` values that are not RDFa terms are ignored next to `property`
        let has_rel = attributes.rel.is_some() && !(has_property && rel.is_empty());
        let has_rev = attributes.rev.is_some() && !(has_property && rev.is_empty());
        let about = attributes.about.as_deref().and_then(|v| resolver.resource(v));
        let resource = attributes
            .resource
            .as_deref()
            .and_then(|v| resolver.resource(v))
            .or_else(|| {
                attributes
                    .href
                    .as_deref()
                    .or(attributes.src.as_deref())
                    .and_then(|v| resolver.iri(v))
                    .map(Into::into)
            });
        let is_head_or_body = matches!(name.as_str(), "head" | "body");

        // Subject and object selection
        let mut skip_element = false;
        let mut new_subject;
        let mut current_object = None;
        let mut typed_resource = None;
        if !has_rel && !has_rev {
            if has_property && attributes.content.is_none() && attributes.datatype.is_none() {
                new_subject = about.clone().or_else(|| {
                    if is_root {
                        Some(parent.parent_subject.clone())
                    } else {
                        parent.parent_object.clone()
                    }
                });
                if attributes.type_of.is_some() {
                    typed_resource = if about.is_some() {
                        new_subject.clone()
                    } else {
                        Some(resource.clone().unwrap_or_else(|| BlankNode::default().into()))
                    };
                    current_object.clone_from(&typed_resource);
                }
            } else {
                new_subject = about.clone().or_else(|| resource.clone());
                if new_subject.is_none() {
                    if is_root {
                        new_subject = Some(parent.parent_subject.clone());
                    } else if attributes.type_of.is_some() {
                        new_subject = Some(if is_head_or_body {
                            parent
                                .parent_object
                                .clone()
                                .unwrap_or_else(|| parent.parent_subject.clone())
                        } else {
                            BlankNode::default().into()
                        });
                    } else if let Some(parent_object) = &parent.parent_object {
                        new_subject = Some(parent_object.clone());
                        skip_element = !has_property;
                    }
                }
                if attributes.type_of.is_some() {
                    typed_resource.clone_from(&new_subject);
                }
            }
        } else {
            new_subject = about.clone();
            if attributes.type_of.is_some() {
                typed_resource.clone_from(&new_subject);
            }
            if new_subject.is_none() {
                new_subject = if is_root {
                    Some(parent.parent_subject.clone())
                } else {
                    parent.parent_object.clone()
                };
            }
            current_object = resource.clone();
            if current_object.is_none() && attributes.type_of.is_some() && about.is_none() {
                current_object = Some(BlankNode::default().into());
            }
            if attributes.type_of.is_some() && about.is_none() {
                typed_resource.clone_from(&current_object);
            }
        }

        // Types
        if let Some(typed_resource) = &typed_resource {
            for class in resolver.predicates(attributes.type_of.as_deref()) {
                results.push(Triple::new(typed_resource.clone(), rdf::TYPE, class));
            }
        }

        // Relations
        let mut incomplete_triples = Vec::new();
        if let Some(subject) = &new_subject {
            if let Some(object) = &current_object {
                for predicate in &rel {
                    results.push(Triple::new(subject.clone(), predicate.clone(), object.clone()));
                }
                for predicate in &rev {
                    results.push(Triple::new(object.clone(), predicate.clone(), subject.clone()));
                }
            } else if has_rel || has_rev {
                current_object = Some(BlankNode::default().into());
                incomplete_triples.extend(rel.iter().map(|predicate| IncompleteTriple {
                    predicate: predicate.clone(),
                    reverse: false,
                }));
                incomplete_triples.extend(rev.iter().map(|predicate| IncompleteTriple {
                    predicate: predicate.clone(),
                    reverse: true,
                }));
            }
        }

        // Properties
        let mut literal = None;
        let properties = resolver.predicates(attributes.property.as_deref());
        if let (Some(subject), false) = (&new_subject, properties.is_empty()) {
            let value = if let Some(datatype) = &attributes.datatype {
                let datatype = datatype.trim();
                PropertyValue::Literal {
                    content: attributes.content.clone().or_else(|| {
                        (name == "time").then(|| attributes.datetime.clone()).flatten()
                    }),
                    datatype: if datatype.is_empty() {
                        None
                    } else {
                        resolver.predicate(datatype)
                    },
                    infer_datatype: false,
                }
            } else if let Some(content) = &attributes.content {
                PropertyValue::Literal {
                    content: Some(content.clone()),
                    datatype: None,
                    infer_datatype: false,
                }
            } else if let (false, false, Some(resource)) = (has_rel, has_rev, &resource) {
                PropertyValue::Resource(resource.clone())
            } else if let (Some(typed_resource), None) = (&typed_resource, &about) {
                PropertyValue::Resource(typed_resource.clone())
            } else if name == "time" {
                PropertyValue::Literal {
                    content: attributes.datetime.clone(),
                    datatype: None,
                    infer_datatype: true,
                }
            } else {
                PropertyValue::Literal {
                    content: None,
                    datatype: None,
                    infer_datatype: false,
                }
            };
            match value {
                PropertyValue::Resource(object) => {
                    for predicate in properties {
                        results.push(Triple::new(subject.clone(), predicate, object.clone()));
                    }
                }
                PropertyValue::Literal {
                    content: Some(content),
                    datatype,
                    infer_datatype,
                } => {
                    let object = build_literal(
                        content,
                        datatype,
                        local.language.as_deref(),
                        infer_datatype,
                    )?;
                    for predicate in properties {
                        results.push(Triple::new(subject.clone(), predicate, object.clone()));
                    }
                }
                PropertyValue::Literal {
                    content: None,
                    datatype,
                    infer_datatype,
                } => {
                    literal = Some(PendingLiteral {
                        subject: subject.clone(),
                        predicates: properties,
                        datatype,
                        language: local.language.clone(),
                        infer_datatype,
                        text: String::new(),
                    });
                }
            }
        }

        // Completion of the relations started by the ancestors
        if let (false, Some(subject)) = (skip_element, &new_subject) {
            for incomplete in &parent.incomplete_triples {
                results.push(if incomplete.reverse {
                    Triple::new(
                        subject.clone(),
                        incomplete.predicate.clone(),
                        parent.parent_subject.clone(),
                    )
                } else {
                    Triple::new(
                        parent.parent_subject.clone(),
                        incomplete.predicate.clone(),
                        subject.clone(),
                    )
                });
            }
        }

        let context = if skip_element {
            local
        } else {
            let parent_subject = new_subject
                .clone()
                .unwrap_or_else(|| parent.parent_subject.clone());
            EvaluationContext {
                parent_object: Some(
                    current_object
                        .or(new_subject)
                        .unwrap_or_else(|| parent_subject.clone()),
                ),
                parent_subject,
                incomplete_triples,
                ..local
            }
        };
        Ok(ElementState {
            name,
            context,
            literal,
        })
    }

    fn close_top(&mut self, results: &mut Vec<Triple>) -> Result<(), RdfaParseError> {
        let Some(element) = self.stack.pop() else {
            return Ok(());
        };
        if let Some(literal) = element.literal {
            let object = build_literal(
                literal.text,
                literal.datatype,
                literal.language.as_deref(),
                literal.infer_datatype,
            )?;
            for predicate in literal.predicates {
                results.push(Triple::new(literal.subject.clone(), predicate, object.clone()));
            }
        }
        Ok(())
    }

    fn push_text(&mut self, text: &str) {
        for element in &mut self.stack {
            if let Some(literal) = &mut element.literal {
                literal.text.push_str(text);
            }
        }
    }

    /// Applies a `<base href>` element, also to the document subject already handed to open elements.
    fn set_base(&mut self, href: &str) {
        let Ok(base) = self.base.resolve(href) else {
            return;
        };
        let old = NamedOrBlankNode::from(NamedNode::new_unchecked(self.base.as_str()));
        let new = NamedOrBlankNode::from(NamedNode::new_unchecked(base.as_str()));
        for context in once(&mut self.root).chain(self.stack.iter_mut().map(|e| &mut e.context)) {
            if context.parent_subject == old {
                context.parent_subject = new.clone();
            }
            if context.parent_object.as_ref() == Some(&old) {
                context.parent_object = Some(new.clone());
            }
        }
        self.base = base;
    }
}

/// Resolution of attribute values into RDF terms.
struct TermResolver<'a> {
    base: &'a Iri<String>,
    context: &'a EvaluationContext,
    blank_nodes: &'a mut HashMap<String, BlankNode>,
}

impl TermResolver<'_> {
    fn iri(&self, value: &str) -> Option<NamedNode> {
        Some(NamedNode::new_unchecked(
            self.base.resolve(value.trim()).ok()?.into_inner(),
        ))
    }

    fn curie(&mut self, value: &str) -> Option<NamedOrBlankNode> {
        let (prefix, reference) = value.split_once(':')?;
        if prefix == "_" {
            return Some(
                self.blank_nodes
                    .entry(reference.to_owned())
                    .or_default()
                    .clone()
                    .into(),
            );
        }
        if reference.starts_with("//") {
            return None;
        }
        let namespace = if prefix.is_empty() {
            XHV_NAMESPACE
        } else {
            self.context.prefixes.get(&prefix.to_ascii_lowercase())?
        };
        NamedNode::new(format!("{namespace}{reference}"))
            .ok()
            .map(Into::into)
    }

    /// Resolves a `SafeCURIEorCURIEorIRI` value like the ones of `about` and `resource`.
    fn resource(&mut self, value: &str) -> Option<NamedOrBlankNode> {
        let value = value.trim();
        if let Some(safe_curie) = value.strip_prefix('[').and_then(|v| v.strip_suffix(']')) {
            return self.curie(safe_curie);
        }
        self.curie(value)
            .or_else(|| self.iri(value).map(Into::into))
    }

    /// Resolves a `TERMorCURIEorAbsIRI` value.
    fn predicate(&mut self, value: &str) -> Option<NamedNode> {
        if value.contains(':') {
            match self.curie(value) {
                Some(NamedOrBlankNode::NamedNode(iri)) => Some(iri),
                Some(NamedOrBlankNode::BlankNode(_)) => None,
                None => Iri::parse(value)
                    .ok()
                    .map(|_| NamedNode::new_unchecked(value)),
            }
        } else if let Some(vocabulary) = &self.context.vocabulary {
            NamedNode::new(format!("{vocabulary}{value}")).ok()
        } else {
            INITIAL_TERMS
                .iter()
                .find(|(term, _)| term.eq_ignore_ascii_case(value))
                .map(|(_, iri)| NamedNode::new_unchecked(*iri))
        }
    }

    fn predicates(&mut self, value: Option<&str>) -> Vec<NamedNode> {
        value
            .into_iter()
            .flat_map(str::split_ascii_whitespace)
            .filter_map(|v| self.predicate(v))
            .collect()
    }
}

/// Parses the `prefix` attribute syntax: `name: iri name2: iri2`.
fn parse_prefix_attribute(value: &str) -> Vec<(&str, &str)> {
    let mut declarations = Vec::new();
    let mut tokens = value.split_ascii_whitespace();
    while let Some(token) = tokens.next() {
        let Some(name) = token.strip_suffix(':') else {
            continue;
        };
        let Some(namespace) = tokens.next() else {
            break;
        };
        declarations.push((name, namespace));
    }
    declarations
}

fn build_literal(
    value: String,
    datatype: Option<NamedNode>,
    language: Option<&str>,
    infer_datatype: bool,
) -> Result<Term, RdfaSyntaxError> {
    let datatype = datatype.or_else(|| {
        infer_datatype
            .then(|| datetime_datatype(&value))
            .flatten()
            .map(NamedNodeRef::into_owned)
    });
    Ok(match (datatype, language) {
        (Some(datatype), _) => Literal::new_checked_typed_literal(value, datatype)?,
        (None, Some(language)) => Literal::new_language_tagged_literal_unchecked(value, language),
        (None, None) => Literal::new_simple_literal(value),
    }
    .into())
}

/// The XSD datatype of a HTML `<time>` value.
fn datetime_datatype(value: &str) -> Option<NamedNodeRef<'static>> {
    let bytes = value.trim().as_bytes();
    let digits = |range: Range<usize>| {
        bytes
            .get(range)
            .is_some_and(|b| b.iter().all(u8::is_ascii_digit))
    };
    if bytes.starts_with(b"P") || bytes.starts_with(b"-P") {
        Some(xsd::DURATION)
    } else if digits(0..4) && bytes.get(4) == Some(&b'-') && digits(5..7) {
        if bytes.len() == 7 {
            Some(xsd::G_YEAR_MONTH)
        } else if bytes.get(7) == Some(&b'-') && digits(8..10) {
            if bytes.get(10) == Some(&b'T') {
                Some(xsd::DATE_TIME)
            } else {
                Some(xsd::DATE)
            }
        } else {
            None
        }
    } else if bytes.len() == 4 && digits(0..4) {
        Some(xsd::G_YEAR)
    } else if digits(0..2) && bytes.get(2) == Some(&b':') && digits(3..5) {
        Some(xsd::TIME)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::panic_in_result_fn)]

    use super::*;

    fn parse(html: &str) -> Vec<String> {
        RdfaParser::new()
            .for_slice(html)
            .map(|t| t.unwrap().to_string())
            .collect()
    }

    #[test]
    fn test_property_with_text_content() {
        assert_eq!(
            parse(r#"<html><body><p about="/s" property="dc:title">Hello <b>world</b></p></body></html>"#),
            ["<http://example.com/s> <http://purl.org/dc/terms/title> \"Hello world\""]
        );
    }

    #[test]
    fn test_root_element_is_the_document() {
        assert_eq!(
            parse(r#"<html lang="en"><head><title property="dc:title">Doc</title></head></html>"#),
            ["<http://example.com> <http://purl.org/dc/terms/title> \"Doc\"@en"]
        );
    }

    #[test]
    fn test_chaining_with_incomplete_triples() {
        assert_eq!(
            parse(
                r#"<div about="/alice" rel="foaf:knows"><span about="/bob"></span><span about="/carol"></span></div>"#
            ),
            [
                "<http://example.com/alice> <http://xmlns.com/foaf/0.1/knows> <http://example.com/bob>",
                "<http://example.com/alice> <http://xmlns.com/foaf/0.1/knows> <http://example.com/carol>",
            ]
        );
    }

    #[test]
    fn test_rev_and_href() {
        assert_eq!(
            parse(r#"<p about="/a" rev="dc:creator" href="/b">x</p>"#),
            ["<http://example.com/b> <http://purl.org/dc/terms/creator> <http://example.com/a>"]
        );
    }

    #[test]
    fn test_typed_and_plain_literals() {
        assert_eq!(
            parse(
                r#"<div about="/s" xml:lang="fr"><span property="xsd:x" datatype="xsd:integer" content="42">quarante</span><span property="dc:p" datatype="">brut</span></div>"#
            ),
            [
                "<http://example.com/s> <http://www.w3.org/2001/XMLSchema#x> \"42\"^^<http://www.w3.org/2001/XMLSchema#integer>",
                "<http://example.com/s> <http://purl.org/dc/terms/p> \"brut\"@fr",
            ]
        );
    }

    #[test]
    fn test_time_element() {
        assert_eq!(
            parse(r#"<p about="/e"><time property="dc:date" datetime="2024-05-01">May 1st</time></p>"#),
            ["<http://example.com/e> <http://purl.org/dc/terms/date> \"2024-05-01\"^^<http://www.w3.org/2001/XMLSchema#date>"]
        );
        assert_eq!(datetime_datatype("2024-05-01T10:00:00Z"), Some(xsd::DATE_TIME));
        assert_eq!(datetime_datatype("2024-05"), Some(xsd::G_YEAR_MONTH));
        assert_eq!(datetime_datatype("2024"), Some(xsd::G_YEAR));
        assert_eq!(datetime_datatype("10:30"), Some(xsd::TIME));
        assert_eq!(datetime_datatype("PT2H"), Some(xsd::DURATION));
        assert_eq!(datetime_datatype("tomorrow"), None);
    }

    #[test]
    fn test_html_rel_values_are_ignored_next_to_property() {
        assert_eq!(
            parse(r#"<link rel="stylesheet" property="dc:source" href="/style.css">"#),
            ["<http://example.com> <http://purl.org/dc/terms/source> <http://example.com/style.css>"]
        );
    }

    #[test]
    fn test_blank_node_curies_are_shared() -> Result<(), RdfaParseError> {
        let triples = RdfaParser::new()
            .for_slice(
                r#"<p about="_:a" property="dc:p">x</p><p about="[_:a]" property="dc:q">y</p>"#,
            )
            .collect::<Result<Vec<_>, _>>()?;
        assert_eq!(triples.len(), 2);
        assert_eq!(triples[0].subject, triples[1].subject);
        Ok(())
    }

    #[test]
    fn test_script_content_is_skipped() {
        assert_eq!(
            parse(
                r#"<div about="/s"><script>if (a < b) { x = "<p property='dc:p'>"; }</script><p property="dc:q">v</p></div>"#
            ),
            ["<http://example.com/s> <http://purl.org/dc/terms/q> \"v\""]
        );
    }

    #[test]
    fn test_vocab_and_uses_vocabulary() {
        assert_eq!(
            parse(r#"<div vocab="http://schema.org/" resource="/x" typeof="Thing"></div>"#),
            [
                "<http://example.com> <http://www.w3.org/ns/rdfa#usesVocabulary> <http://schema.org/>",
                "<http://example.com/x> <http://www.w3.org/1999/02/22-rdf-syntax-ns#type> <http://schema.org/Thing>",
            ]
        );
    }

    #[test]
    fn test_parse_prefix_attribute() {
        assert_eq!(
            parse_prefix_attribute("ex: http://example.com/  foo:\nhttp://foo.org/# dangling:"),
            [("ex", "http://example.com/"), ("foo", "http://foo.org/#")]
        );
    }
}
