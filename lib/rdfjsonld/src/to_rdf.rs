use crate::context::{
    JsonLdContainer, JsonLdContext, JsonLdTermDefinition, JsonNode, JsonNodeBuilder,
    has_keyword_form, object_get,
};
use crate::error::{JsonLdParseError, JsonLdSyntaxError};
use json_event_parser::{JsonEvent, ReaderJsonParser, SliceJsonParser};
use oxilangtag::LanguageTag;
use oxiri::{Iri, IriParseError};
use rdfterm::vocab::{rdf, xsd};
use rdfterm::{BlankNode, GraphName, Literal, NamedNode, NamedOrBlankNode, PrefixTable, Quad, Term};
use std::borrow::Cow;
use std::collections::HashMap;
use std::fmt::Write;
use std::io::{self, Chain, Cursor, Read};
use std::mem;

/// A [JSON-LD](https://www.w3.org/TR/json-ld/) parser.
///
/// Only local contexts are supported: a `@context` given as an IRI is an error.
///
/// The document is processed in streaming when possible: the elements of a root array,
/// and the elements of a root `@graph` that follows the `@context` key,
/// are converted one by one.
/// Other top-level objects are buffered until their end.
///
/// Count the number of people:
/// ```
/// use rdfjsonld::JsonLdParser;
/// use rdfterm::vocab::rdf;
/// use rdfterm::{NamedNode, Term};
///
/// let file = r#"{
///     "@context": {"schema": "http://schema.org/"},
///     "@graph": [
///         {
///             "@type": "schema:Person",
///             "@id": "http://example.com/foo",
///             "schema:name": "Foo"
///         },
///         {
///             "@type": "schema:Person",
///             "schema:name": "Bar"
///         }
///     ]
/// }"#;
///
/// let schema_person = Term::from(NamedNode::new("http://schema.org/Person")?);
/// let mut count = 0;
/// for quad in JsonLdParser::new().for_reader(file.as_bytes()) {
///     let quad = quad?;
///     if quad.predicate == rdf::TYPE && quad.object == schema_person {
///         count += 1;
///     }
/// }
/// assert_eq!(2, count);
/// # Result::<_, Box<dyn std::error::Error>>::Ok(())
/// ```
#[derive(Default, Clone)]
#[must_use]
pub struct JsonLdParser {
    base: Option<Iri<String>>,
}

impl JsonLdParser {
    /// Builds a new [`JsonLdParser`].
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Base IRI used to resolve relative IRIs until a `@base` key of a context overrides it.
    #[inline]
    pub fn with_base_iri(mut self, base_iri: impl Into<String>) -> Result<Self, IriParseError> {
        self.base = Some(Iri::parse(base_iri.into())?);
        Ok(self)
    }

    /// Parses a JSON-LD file from a [`Read`] implementation.
    pub fn for_reader<R: Read>(self, reader: R) -> ReaderJsonLdParser<R> {
        ReaderJsonLdParser {
            results: Vec::new(),
            inner: self.into_internal(),
            reader: Some(reader),
            json_parser: None,
        }
    }

    /// Parses a JSON-LD file from a byte slice.
    ///
    /// ```
    /// use rdfjsonld::JsonLdParser;
    ///
    /// let file = r#"[
    ///     {"@id": "http://example.com/s", "http://example.com/p": {"@list": [1, 2.5]}}
    /// ]"#;
    ///
    /// let quads = JsonLdParser::new().for_slice(file).collect::<Result<Vec<_>, _>>()?;
    /// assert_eq!(quads.len(), 5);
    /// # Result::<_, Box<dyn std::error::Error>>::Ok(())
    /// ```
    pub fn for_slice(self, slice: &(impl AsRef<[u8]> + ?Sized)) -> SliceJsonLdParser<'_> {
        let slice = slice.as_ref();
        let mut inner = self.into_internal();
        if slice.iter().all(|b| is_json_whitespace(*b)) {
            inner.state = RootState::End;
        }
        SliceJsonLdParser {
            results: Vec::new(),
            inner,
            json_parser: SliceJsonParser::new(slice),
        }
    }

    fn into_internal(self) -> InternalJsonLdParser {
        InternalJsonLdParser {
            state: RootState::Start,
            context: JsonLdContext::new_empty(self.base),
            context_seen: false,
            streamed_graph: false,
            buffered: Vec::new(),
            converter: JsonLdToRdfConverter::default(),
        }
    }
}

/// Parses a JSON-LD file from a [`Read`] implementation.
///
/// Can be built using [`JsonLdParser::for_reader`].
#[must_use]
pub struct ReaderJsonLdParser<R: Read> {
    results: Vec<Quad>,
    inner: InternalJsonLdParser,
    /// Not read yet, the JSON parser is only built once some content is found.
    reader: Option<R>,
    json_parser: Option<ReaderJsonParser<Chain<Cursor<Vec<u8>>, R>>>,
}

impl<R: Read> Iterator for ReaderJsonLdParser<R> {
    type Item = Result<Quad, JsonLdParseError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(quad) = self.results.pop() {
                return Some(Ok(quad));
            } else if self.inner.is_end() {
                return None;
            }
            if let Err(e) = self.parse_step() {
                self.inner.state = RootState::End;
                self.results.clear();
                return Some(Err(e));
            }
            // Quads are popped from the end
            self.results.reverse();
        }
    }
}

impl<R: Read> ReaderJsonLdParser<R> {
    /// The prefixes defined by the top-level `@context` seen so far.
    ///
    /// Terms mapped to an IRI ending with a delimiter are returned sorted by name.
    /// The `@vocab` mapping is returned as the empty prefix.
    ///
    /// ```
    /// use rdfjsonld::JsonLdParser;
    ///
    /// let file = r#"{
    ///     "@context": {"schema": "http://schema.org/", "@base": "http://example.com/"},
    ///     "@type": "schema:Person",
    ///     "@id": "foo",
    ///     "schema:name": "Foo"
    /// }"#;
    ///
    /// let mut parser = JsonLdParser::new().for_reader(file.as_bytes());
    /// assert!(parser.prefixes().is_empty());
    ///
    /// parser.next().unwrap()?;
    /// assert_eq!(parser.prefixes().get("schema"), Some("http://schema.org/"));
    /// assert_eq!(parser.base_iri(), Some("http://example.com/"));
    /// # Result::<_, Box<dyn std::error::Error>>::Ok(())
    /// ```
    pub fn prefixes(&self) -> PrefixTable {
        self.inner.prefixes()
    }

    /// The base IRI of the top-level `@context` seen so far.
    pub fn base_iri(&self) -> Option<&str> {
        self.inner.base_iri()
    }

    fn parse_step(&mut self) -> Result<(), JsonLdParseError> {
        if let Some(reader) = self.reader.take() {
            self.json_parser = skip_leading_whitespace(reader)?.map(ReaderJsonParser::new);
        }
        let Some(json_parser) = &mut self.json_parser else {
            // Blank documents have no statement
            self.inner.state = RootState::End;
            return Ok(());
        };
        let event = json_parser.parse_next()?;
        self.inner.parse_event(event, &mut self.results)?;
        Ok(())
    }
}

/// Parses a JSON-LD file from a byte slice.
///
/// Can be built using [`JsonLdParser::for_slice`].
#[must_use]
pub struct SliceJsonLdParser<'a> {
    results: Vec<Quad>,
    inner: InternalJsonLdParser,
    json_parser: SliceJsonParser<'a>,
}

impl Iterator for SliceJsonLdParser<'_> {
    type Item = Result<Quad, JsonLdSyntaxError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(quad) = self.results.pop() {
                return Some(Ok(quad));
            } else if self.inner.is_end() {
                return None;
            }
            if let Err(e) = self.parse_step() {
                self.inner.state = RootState::End;
                self.results.clear();
                return Some(Err(e));
            }
            self.results.reverse();
        }
    }
}

impl SliceJsonLdParser<'_> {
    /// The prefixes defined by the top-level `@context` seen so far.
    pub fn prefixes(&self) -> PrefixTable {
        self.inner.prefixes()
    }

    /// The base IRI of the top-level `@context` seen so far.
    pub fn base_iri(&self) -> Option<&str> {
        self.inner.base_iri()
    }

    fn parse_step(&mut self) -> Result<(), JsonLdSyntaxError> {
        let event = self.json_parser.parse_next()?;
        self.inner.parse_event(event, &mut self.results)
    }
}

/// Reads until the first non-whitespace byte.
///
/// Returns `None` if the reader only contains whitespaces.
fn skip_leading_whitespace<R: Read>(mut reader: R) -> io::Result<Option<Chain<Cursor<Vec<u8>>, R>>> {
    let mut buffer = vec![0; 1024];
    loop {
        let read = match reader.read(&mut buffer) {
            Ok(0) => return Ok(None),
            Ok(read) => read,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        };
        if let Some(start) = buffer[..read].iter().position(|b| !is_json_whitespace(*b)) {
            buffer.truncate(read);
            buffer.drain(..start);
            return Ok(Some(Cursor::new(buffer).chain(reader)));
        }
    }
}

fn is_json_whitespace(byte: u8) -> bool {
    matches!(byte, b' ' | b'\t' | b'\n' | b'\r')
}

enum RootState {
    Start,
    InArray(JsonNodeBuilder),
    InObject,
    InObjectValue { key: String, builder: JsonNodeBuilder },
    GraphStart,
    InGraph(JsonNodeBuilder),
    AfterRoot,
    End,
}

struct InternalJsonLdParser {
    state: RootState,
    context: JsonLdContext,
    context_seen: bool,
    streamed_graph: bool,
    // Top-level keys that are not @context, converted when the root object ends
    buffered: Vec<(String, JsonNode)>,
    converter: JsonLdToRdfConverter,
}

impl InternalJsonLdParser {
    fn parse_event(
        &mut self,
        event: JsonEvent<'_>,
        results: &mut Vec<Quad>,
    ) -> Result<(), JsonLdSyntaxError> {
        match &mut self.state {
            RootState::Start => match event {
                JsonEvent::StartArray => self.state = RootState::InArray(JsonNodeBuilder::default()),
                JsonEvent::StartObject => self.state = RootState::InObject,
                _ => {
                    return Err(JsonLdSyntaxError::msg(
                        "The root of a JSON-LD document must be an object or an array",
                    ));
                }
            },
            RootState::InArray(builder) => {
                if builder.depth() == 0 && matches!(event, JsonEvent::EndArray) {
                    self.state = RootState::AfterRoot;
                } else if let Some(element) = builder.push(event)? {
                    self.converter
                        .convert_top_level(&element, &self.context, results)?;
                }
            }
            RootState::InGraph(builder) => {
                if builder.depth() == 0 && matches!(event, JsonEvent::EndArray) {
                    self.streamed_graph = true;
                    self.state = RootState::InObject;
                } else if let Some(element) = builder.push(event)? {
                    self.converter
                        .convert_top_level(&element, &self.context, results)?;
                }
            }
            RootState::InObject => match event {
                JsonEvent::ObjectKey(key) => {
                    if self.streamed_graph {
                        return Err(JsonLdSyntaxError::msg(format!(
                            "The key {key} is not allowed after a top-level @graph"
                        )));
                    }
                    if self.context_seen
                        && self.buffered.is_empty()
                        && self.context.expand_iri(&key, false, true).as_deref() == Some("@graph")
                    {
                        self.state = RootState::GraphStart;
                    } else {
                        self.state = RootState::InObjectValue {
                            key: key.into(),
                            builder: JsonNodeBuilder::default(),
                        };
                    }
                }
                JsonEvent::EndObject => {
                    if !self.buffered.is_empty() {
                        let root = JsonNode::Object(mem::take(&mut self.buffered));
                        self.converter
                            .convert_top_level(&root, &self.context, results)?;
                    }
                    self.state = RootState::AfterRoot;
                }
                _ => return Err(JsonLdSyntaxError::msg("Unexpected JSON event in an object")),
            },
            RootState::InObjectValue { key, builder } => {
                if let Some(value) = builder.push(event)? {
                    let key = mem::take(key);
                    if key == "@context" {
                        if self.context_seen {
                            return Err(JsonLdSyntaxError::msg(
                                "The root object has multiple @context keys",
                            ));
                        }
                        self.context = self.context.process(&value)?;
                        self.context_seen = true;
                    } else {
                        self.buffered.push((key, value));
                    }
                    self.state = RootState::InObject;
                }
            }
            RootState::GraphStart => {
                if matches!(event, JsonEvent::StartArray) {
                    self.state = RootState::InGraph(JsonNodeBuilder::default());
                } else {
                    // A single graph element is buffered like any other key
                    let mut builder = JsonNodeBuilder::default();
                    if let Some(value) = builder.push(event)? {
                        self.buffered.push(("@graph".into(), value));
                        self.state = RootState::InObject;
                    } else {
                        self.state = RootState::InObjectValue {
                            key: "@graph".into(),
                            builder,
                        };
                    }
                }
            }
            RootState::AfterRoot => {
                if matches!(event, JsonEvent::Eof) {
                    self.state = RootState::End;
                } else {
                    return Err(JsonLdSyntaxError::msg(
                        "Unexpected content after the end of the JSON-LD document",
                    ));
                }
            }
            RootState::End => (),
        }
        Ok(())
    }

    fn is_end(&self) -> bool {
        matches!(self.state, RootState::End)
    }

    fn prefixes(&self) -> PrefixTable {
        let mut prefixes = self
            .context
            .term_definitions
            .iter()
            .filter(|(_, definition)| definition.prefix_flag)
            .filter_map(|(name, definition)| {
                Some((name.as_str(), definition.iri_mapping.as_deref()?))
            })
            .collect::<Vec<_>>();
        prefixes.sort_unstable();
        let mut table = PrefixTable::new();
        if let Some(vocab) = &self.context.vocabulary_mapping {
            table.insert("", vocab.as_str());
        }
        table.extend(prefixes);
        table
    }

    fn base_iri(&self) -> Option<&str> {
        self.context.base_iri.as_ref().map(Iri::as_str)
    }
}

/// Converts expanded JSON values into quads.
///
/// It follows the [Deserialize JSON-LD to RDF](https://www.w3.org/TR/json-ld-api/#deserialize-json-ld-to-rdf-algorithm)
/// algorithm but works directly on the compacted document.
#[derive(Default)]
struct JsonLdToRdfConverter {
    blank_nodes: HashMap<String, BlankNode>,
}

impl JsonLdToRdfConverter {
    fn convert_top_level(
        &mut self,
        element: &JsonNode,
        context: &JsonLdContext,
        results: &mut Vec<Quad>,
    ) -> Result<(), JsonLdSyntaxError> {
        match element {
            JsonNode::Array(items) => {
                for item in items {
                    self.convert_top_level(item, context, results)?;
                }
            }
            JsonNode::Object(entries) => {
                let local_context = with_local_context(context, entries)?;
                if let Some(graph) = graph_wrapper_content(entries, &local_context) {
                    for item in graph.as_items() {
                        self.convert_top_level(item, &local_context, results)?;
                    }
                } else {
                    self.convert_graph_item(element, context, &GraphName::DefaultGraph, results)?;
                }
            }
            // Free-floating values
            _ => (),
        }
        Ok(())
    }

    fn convert_graph_item(
        &mut self,
        item: &JsonNode,
        context: &JsonLdContext,
        graph: &GraphName,
        results: &mut Vec<Quad>,
    ) -> Result<(), JsonLdSyntaxError> {
        match item {
            JsonNode::Array(items) => {
                for item in items {
                    self.convert_graph_item(item, context, graph, results)?;
                }
            }
            JsonNode::Object(entries) => {
                let context = with_local_context(context, entries)?;
                if !is_value_or_list_object(entries, &context) {
                    self.convert_node(entries, &context, graph, results)?;
                }
            }
            _ => (),
        }
        Ok(())
    }

    /// Emits the statements of a node object and returns its identifier.
    ///
    /// `context` must already include the `@context` of the node.
    fn convert_node(
        &mut self,
        entries: &[(String, JsonNode)],
        context: &JsonLdContext,
        graph: &GraphName,
        results: &mut Vec<Quad>,
    ) -> Result<NamedOrBlankNode, JsonLdSyntaxError> {
        let mut subject = None;
        for (key, value) in entries {
            if expand_key(context, key).as_deref() == Some("@id") {
                let JsonNode::String(id) = value else {
                    return Err(JsonLdSyntaxError::msg("@id value must be a string"));
                };
                subject = Some(self.node_id(id, context, false)?);
            }
        }
        let subject = subject.unwrap_or_else(|| BlankNode::default().into());

        for (key, value) in entries {
            if key == "@context" {
                continue;
            }
            let Some(expanded) = expand_key(context, key) else {
                continue;
            };
            match expanded.as_str() {
                "@type" => {
                    for r#type in value.as_items() {
                        let JsonNode::String(r#type) = r#type else {
                            return Err(JsonLdSyntaxError::msg(
                                "@type value must be a string or an array of strings",
                            ));
                        };
                        let r#type = self.node_id(r#type, context, true)?;
                        results.push(Quad::new(
                            subject.clone(),
                            rdf::TYPE,
                            r#type,
                            graph.clone(),
                        ));
                    }
                }
                "@graph" => {
                    let graph_name = GraphName::from(subject.clone());
                    self.convert_graph_item(value, context, &graph_name, results)?;
                }
                "@included" => self.convert_graph_item(value, context, graph, results)?,
                "@reverse" => {
                    let JsonNode::Object(reverse) = value else {
                        return Err(JsonLdSyntaxError::msg("@reverse value must be an object"));
                    };
                    for (reverse_key, reverse_value) in reverse {
                        let Some(predicate) = property_iri(reverse_key, context)? else {
                            continue;
                        };
                        let definition = context.term_definitions.get(reverse_key.as_str());
                        for object in self.property_values(
                            reverse_value,
                            definition,
                            container_of(definition),
                            context,
                            graph,
                            results,
                        )? {
                            results.push(Quad::new(
                                reverse_subject(object)?,
                                predicate.clone(),
                                subject.clone(),
                                graph.clone(),
                            ));
                        }
                    }
                }
                "@value" | "@list" | "@set" => {
                    return Err(JsonLdSyntaxError::msg(format!(
                        "{expanded} is not allowed in a node object"
                    )));
                }
                _ if has_keyword_form(&expanded) => (),
                _ => {
                    let Some(predicate) = property_iri(key, context)? else {
                        continue;
                    };
                    let definition = context.term_definitions.get(key.as_str());
                    let objects = self.property_values(
                        value,
                        definition,
                        container_of(definition),
                        context,
                        graph,
                        results,
                    )?;
                    let reverse = definition.is_some_and(|d| d.reverse_property);
                    for object in objects {
                        results.push(if reverse {
                            Quad::new(
                                reverse_subject(object)?,
                                predicate.clone(),
                                subject.clone(),
                                graph.clone(),
                            )
                        } else {
                            Quad::new(subject.clone(), predicate.clone(), object, graph.clone())
                        });
                    }
                }
            }
        }
        Ok(subject)
    }

    fn property_values(
        &mut self,
        value: &JsonNode,
        definition: Option<&JsonLdTermDefinition>,
        container: JsonLdContainer,
        context: &JsonLdContext,
        graph: &GraphName,
        results: &mut Vec<Quad>,
    ) -> Result<Vec<Term>, JsonLdSyntaxError> {
        let mut objects = Vec::new();
        match (container, value) {
            (JsonLdContainer::Language, JsonNode::Object(entries)) => {
                for (language, values) in entries {
                    for value in values.as_items() {
                        match value {
                            JsonNode::Null => (),
                            JsonNode::String(value) => objects.push(
                                if expand_key(context, language).as_deref() == Some("@none") {
                                    Literal::new_simple_literal(value.as_str())
                                } else {
                                    language_literal(value, language)?
                                }
                                .into(),
                            ),
                            _ => {
                                return Err(JsonLdSyntaxError::msg(
                                    "Language map values must be strings",
                                ));
                            }
                        }
                    }
                }
            }
            (JsonLdContainer::Index, JsonNode::Object(entries))
                if !is_value_or_list_object(entries, context) =>
            {
                for (_, values) in entries {
                    objects.extend(self.property_values(
                        values,
                        definition,
                        JsonLdContainer::None,
                        context,
                        graph,
                        results,
                    )?);
                }
            }
            (JsonLdContainer::List, value) if !is_list_object(value, context) => {
                objects.push(self.list(value.as_items(), definition, context, graph, results)?);
            }
            (_, JsonNode::Array(items)) => {
                for item in items {
                    objects.extend(self.property_values(
                        item,
                        definition,
                        JsonLdContainer::None,
                        context,
                        graph,
                        results,
                    )?);
                }
            }
            (_, JsonNode::Object(entries)) if key_value(entries, context, "@set").is_some() => {
                if let Some(set) = key_value(entries, context, "@set") {
                    objects.extend(self.property_values(
                        set,
                        definition,
                        JsonLdContainer::None,
                        context,
                        graph,
                        results,
                    )?);
                }
            }
            (_, item) => {
                if let Some(object) = self.item_to_term(item, definition, context, graph, results)?
                {
                    objects.push(object);
                }
            }
        }
        Ok(objects)
    }

    fn item_to_term(
        &mut self,
        item: &JsonNode,
        definition: Option<&JsonLdTermDefinition>,
        context: &JsonLdContext,
        graph: &GraphName,
        results: &mut Vec<Quad>,
    ) -> Result<Option<Term>, JsonLdSyntaxError> {
        let type_mapping = definition.and_then(|d| d.type_mapping.as_deref());
        Ok(Some(match item {
            JsonNode::Null => return Ok(None),
            JsonNode::String(value) => match type_mapping {
                Some("@id") => self.node_id(value, context, false)?.into(),
                Some("@vocab") => self.node_id(value, context, true)?.into(),
                Some("@json") => {
                    return Err(JsonLdSyntaxError::unsupported("@json literals"));
                }
                Some(datatype) => Literal::new_checked_typed_literal(
                    value.as_str(),
                    NamedNode::new_unchecked(datatype),
                )?
                .into(),
                None => {
                    let language = match definition.and_then(|d| d.language_mapping.as_ref()) {
                        Some(language) => language.as_deref(),
                        None => context.default_language.as_deref(),
                    };
                    if let Some(language) = language {
                        language_literal(value, language)?.into()
                    } else {
                        Literal::new_simple_literal(value.as_str()).into()
                    }
                }
            },
            JsonNode::Number(value) => number_literal(value, scalar_datatype(type_mapping))?.into(),
            JsonNode::Boolean(value) => boolean_literal(*value, scalar_datatype(type_mapping)).into(),
            JsonNode::Array(items) => self.list(items, definition, context, graph, results)?,
            JsonNode::Object(entries) => {
                let context = with_local_context(context, entries)?;
                if key_value(entries, &context, "@value").is_some() {
                    return value_object(entries, &context);
                } else if let Some(list) = key_value(entries, &context, "@list") {
                    self.list(list.as_items(), definition, &context, graph, results)?
                } else if key_value(entries, &context, "@set").is_some() {
                    return Err(JsonLdSyntaxError::msg("@set objects are not allowed in lists"));
                } else {
                    self.convert_node(entries, &context, graph, results)?.into()
                }
            }
        }))
    }

    fn list(
        &mut self,
        items: &[JsonNode],
        definition: Option<&JsonLdTermDefinition>,
        context: &JsonLdContext,
        graph: &GraphName,
        results: &mut Vec<Quad>,
    ) -> Result<Term, JsonLdSyntaxError> {
        let mut elements = Vec::with_capacity(items.len());
        for item in items {
            if let Some(element) = self.item_to_term(item, definition, context, graph, results)? {
                elements.push(element);
            }
        }
        let mut tail = Term::from(rdf::NIL);
        for element in elements.into_iter().rev() {
            let node = BlankNode::default();
            results.push(Quad::new(node.clone(), rdf::FIRST, element, graph.clone()));
            results.push(Quad::new(node.clone(), rdf::REST, tail, graph.clone()));
            tail = node.into();
        }
        Ok(tail)
    }

    fn node_id(
        &mut self,
        value: &str,
        context: &JsonLdContext,
        vocab: bool,
    ) -> Result<NamedOrBlankNode, JsonLdSyntaxError> {
        let iri = context
            .expand_iri(value, true, vocab)
            .filter(|iri| !has_keyword_form(iri))
            .ok_or_else(|| {
                JsonLdSyntaxError::msg(format!("'{value}' can't be used as a node identifier"))
            })?;
        if let Some(label) = iri.strip_prefix("_:") {
            return Ok(self
                .blank_nodes
                .entry(label.into())
                .or_default()
                .clone()
                .into());
        }
        Ok(named_node(iri)?.into())
    }
}

fn value_object(
    entries: &[(String, JsonNode)],
    context: &JsonLdContext,
) -> Result<Option<Term>, JsonLdSyntaxError> {
    let mut value = None;
    let mut datatype = None;
    let mut language = None;
    for (key, entry) in entries {
        match expand_key(context, key).as_deref() {
            Some("@value") => value = Some(entry),
            Some("@type") => {
                let JsonNode::String(r#type) = entry else {
                    return Err(JsonLdSyntaxError::msg(
                        "@type value must be a string in a value object",
                    ));
                };
                let r#type = context.expand_iri(r#type, true, true).unwrap_or_default();
                if r#type == "@json" {
                    return Err(JsonLdSyntaxError::unsupported("@json literals"));
                }
                if has_keyword_form(&r#type) || r#type.starts_with("_:") {
                    return Err(JsonLdSyntaxError::msg(format!(
                        "The value object @type must be an IRI, found {type}"
                    )));
                }
                datatype = Some(named_node(r#type)?);
            }
            Some("@language") => {
                let JsonNode::String(tag) = entry else {
                    return Err(JsonLdSyntaxError::msg("@language value must be a string"));
                };
                language = Some(tag.as_str());
            }
            Some("@index" | "@direction") => (),
            _ if key == "@context" => (),
            _ => {
                return Err(JsonLdSyntaxError::msg(format!(
                    "Unexpected key {key} in a value object"
                )));
            }
        }
    }
    if datatype.is_some() && language.is_some() {
        return Err(JsonLdSyntaxError::msg(
            "A value object can't have both @type and @language",
        ));
    }
    Ok(Some(match value {
        None | Some(JsonNode::Null) => return Ok(None),
        Some(JsonNode::String(value)) => {
            if let Some(language) = language {
                language_literal(value, language)?
            } else if let Some(datatype) = datatype {
                Literal::new_checked_typed_literal(value.as_str(), datatype)?
            } else {
                Literal::new_simple_literal(value.as_str())
            }
        }
        Some(JsonNode::Number(value)) if language.is_none() => {
            number_literal(value, datatype.as_ref().map(NamedNode::as_str))?
        }
        Some(JsonNode::Boolean(value)) if language.is_none() => {
            boolean_literal(*value, datatype.as_ref().map(NamedNode::as_str))
        }
        Some(_) => {
            return Err(JsonLdSyntaxError::msg(
                "@value must be a string, or a number or a boolean without @language",
            ));
        }
    }
    .into()))
}

/// The predicate of a key, `None` if it does not expand to an absolute IRI.
fn property_iri(
    key: &str,
    context: &JsonLdContext,
) -> Result<Option<NamedNode>, JsonLdSyntaxError> {
    let Some(iri) = expand_key(context, key) else {
        return Ok(None);
    };
    if has_keyword_form(&iri) || iri.starts_with("_:") || !iri.contains(':') {
        return Ok(None);
    }
    named_node(iri).map(Some)
}

fn with_local_context<'a>(
    context: &'a JsonLdContext,
    entries: &[(String, JsonNode)],
) -> Result<Cow<'a, JsonLdContext>, JsonLdSyntaxError> {
    Ok(if let Some(local_context) = object_get(entries, "@context") {
        Cow::Owned(context.process(local_context)?)
    } else {
        Cow::Borrowed(context)
    })
}

fn expand_key(context: &JsonLdContext, key: &str) -> Option<String> {
    context.expand_iri(key, false, true)
}

fn key_value<'a>(
    entries: &'a [(String, JsonNode)],
    context: &JsonLdContext,
    keyword: &str,
) -> Option<&'a JsonNode> {
    entries
        .iter()
        .find_map(|(k, v)| (expand_key(context, k).as_deref() == Some(keyword)).then_some(v))
}

fn is_value_or_list_object(entries: &[(String, JsonNode)], context: &JsonLdContext) -> bool {
    entries.iter().any(|(k, _)| {
        matches!(
            expand_key(context, k).as_deref(),
            Some("@value" | "@list" | "@set")
        )
    })
}

fn is_list_object(value: &JsonNode, context: &JsonLdContext) -> bool {
    matches!(value, JsonNode::Object(entries) if key_value(entries, context, "@list").is_some())
}

/// The `@graph` value of an object that has no other key than `@context` and `@graph`.
fn graph_wrapper_content<'a>(
    entries: &'a [(String, JsonNode)],
    context: &JsonLdContext,
) -> Option<&'a JsonNode> {
    let mut graph = None;
    for (key, value) in entries {
        if key == "@context" {
            continue;
        }
        if expand_key(context, key).as_deref() != Some("@graph") {
            return None;
        }
        graph = Some(value);
    }
    graph
}

fn container_of(definition: Option<&JsonLdTermDefinition>) -> JsonLdContainer {
    definition.map_or(JsonLdContainer::None, |d| d.container_mapping)
}

fn reverse_subject(object: Term) -> Result<NamedOrBlankNode, JsonLdSyntaxError> {
    match object {
        Term::NamedNode(node) => Ok(node.into()),
        Term::BlankNode(node) => Ok(node.into()),
        Term::Literal(_) | Term::Variable(_) => Err(JsonLdSyntaxError::msg(
            "The values of reverse properties must be node objects",
        )),
    }
}

/// Relative IRIs are kept as is when there is no base to resolve them.
fn named_node(iri: String) -> Result<NamedNode, JsonLdSyntaxError> {
    if iri.contains(':') {
        if let Err(error) = Iri::parse(iri.as_str()) {
            return Err(JsonLdSyntaxError::invalid_iri(iri, error));
        }
    }
    Ok(NamedNode::new_unchecked(iri))
}

fn language_literal(value: &str, language: &str) -> Result<Literal, JsonLdSyntaxError> {
    if let Err(error) = LanguageTag::parse(language) {
        return Err(JsonLdSyntaxError::invalid_language_tag(
            language.into(),
            error,
        ));
    }
    Ok(Literal::new_language_tagged_literal_unchecked(
        value,
        language.to_ascii_lowercase(),
    ))
}

fn scalar_datatype(type_mapping: Option<&str>) -> Option<&str> {
    type_mapping.filter(|t| !has_keyword_form(t))
}

fn boolean_literal(value: bool, datatype: Option<&str>) -> Literal {
    Literal::new_typed_literal(
        if value { "true" } else { "false" },
        datatype.map_or_else(|| xsd::BOOLEAN.into_owned(), NamedNode::new_unchecked),
    )
}

fn number_literal(value: &str, datatype: Option<&str>) -> Result<Literal, JsonLdSyntaxError> {
    let always_double = datatype.is_some_and(|d| d != xsd::INTEGER.as_str());
    let number = canonicalize_xsd_number(value, always_double)
        .ok_or_else(|| JsonLdSyntaxError::msg(format!("Invalid JSON number {value}")))?;
    Ok(match number {
        CanonicalNumber::Integer(value) => Literal::new_typed_literal(
            value,
            datatype.map_or_else(|| xsd::INTEGER.into_owned(), NamedNode::new_unchecked),
        ),
        CanonicalNumber::Double(value) => Literal::new_typed_literal(
            value,
            datatype.map_or_else(|| xsd::DOUBLE.into_owned(), NamedNode::new_unchecked),
        ),
    })
}

enum CanonicalNumber {
    Integer(String),
    Double(String),
}

/// Integers below 10^21 stay integers, other numbers use the `xsd:double` canonical form.
fn canonicalize_xsd_number(value: &str, always_double: bool) -> Option<CanonicalNumber> {
    let (value, is_negative) = if let Some(value) = value.strip_prefix('-') {
        (value, true)
    } else {
        (value.strip_prefix('+').unwrap_or(value), false)
    };
    let (value, exp) = value.split_once(['e', 'E']).unwrap_or((value, "0"));
    let (mut integer_part, mut decimal_part) = value.split_once('.').unwrap_or((value, ""));
    let mut exp = exp.parse::<i64>().ok()?;

    integer_part = integer_part.trim_start_matches('0');
    decimal_part = decimal_part.trim_end_matches('0');
    if decimal_part.is_empty() {
        while let Some(c) = integer_part.strip_suffix('0') {
            integer_part = c;
            exp = exp.checked_add(1)?;
        }
    }
    if integer_part.is_empty() {
        while let Some(c) = decimal_part.strip_prefix('0') {
            decimal_part = c;
            exp = exp.checked_sub(1)?;
        }
    }

    // 0.DIGITS x 10^exp form
    exp = exp.checked_add(i64::try_from(integer_part.len()).ok()?)?;
    if integer_part.is_empty() && decimal_part.is_empty() {
        integer_part = "0";
        exp = 1;
    }

    let mut buffer = String::with_capacity(value.len() + 4);
    if is_negative && !(decimal_part.is_empty() && integer_part == "0") {
        buffer.push('-');
    }
    let digits_count = i64::try_from(integer_part.len() + decimal_part.len()).ok()?;
    Some(if !always_double && exp >= digits_count && exp < 21 {
        buffer.push_str(integer_part);
        buffer.push_str(decimal_part);
        buffer.extend((0..(exp - digits_count)).map(|_| '0'));
        CanonicalNumber::Integer(buffer)
    } else {
        let mut all_digits = integer_part.chars().chain(decimal_part.chars());
        buffer.push(all_digits.next()?);
        buffer.push('.');
        if digits_count == 1 {
            buffer.push('0');
        } else {
            buffer.extend(all_digits);
        }
        write!(&mut buffer, "E{}", exp.checked_sub(1)?).ok()?;
        CanonicalNumber::Double(buffer)
    })
}

#[cfg(test)]
mod tests {
    #![allow(clippy::panic_in_result_fn)]

    use super::*;

    fn parse(data: &str) -> Result<Vec<Quad>, JsonLdSyntaxError> {
        JsonLdParser::new().for_slice(data).collect()
    }

    fn literal(value: &str, datatype: &str) -> Term {
        Literal::new_typed_literal(value, NamedNode::new_unchecked(datatype)).into()
    }

    #[test]
    fn test_number_canonicalization() {
        let canonical = |value: &str| match canonicalize_xsd_number(value, false) {
            Some(CanonicalNumber::Integer(v)) => format!("integer {v}"),
            Some(CanonicalNumber::Double(v)) => format!("double {v}"),
            None => "invalid".into(),
        };
        assert_eq!(canonical("12"), "integer 12");
        assert_eq!(canonical("-0"), "integer 0");
        assert_eq!(canonical("1.5"), "double 1.5E0");
        assert_eq!(canonical("1.0"), "integer 1");
        assert_eq!(canonical("0.025"), "double 2.5E-2");
        assert_eq!(canonical("1e21"), "double 1.0E21");
    }

    #[test]
    fn test_native_values() -> Result<(), JsonLdSyntaxError> {
        let quads = parse(
            r#"{"@id": "http://example.com/s", "http://example.com/p": [true, 42, 4.2, "foo"]}"#,
        )?;
        let objects = quads.into_iter().map(|q| q.object).collect::<Vec<_>>();
        assert_eq!(
            objects,
            [
                literal("true", xsd::BOOLEAN.as_str()),
                literal("42", xsd::INTEGER.as_str()),
                literal("4.2E0", xsd::DOUBLE.as_str()),
                Term::from(Literal::new_simple_literal("foo")),
            ]
        );
        Ok(())
    }

    #[test]
    fn test_type_coercion_and_language() -> Result<(), JsonLdSyntaxError> {
        let quads = parse(
            r#"{
                "@context": {
                    "ex": "http://example.com/",
                    "@language": "EN",
                    "knows": {"@id": "ex:knows", "@type": "@id"},
                    "born": {"@id": "ex:born", "@type": "http://www.w3.org/2001/XMLSchema#date"},
                    "code": {"@id": "ex:code", "@language": null}
                },
                "@id": "ex:alice",
                "knows": "ex:bob",
                "born": "2000-01-01",
                "code": "x1",
                "ex:name": "Alice"
            }"#,
        )?;
        assert_eq!(quads.len(), 4);
        assert_eq!(
            quads[0].object,
            Term::from(NamedNode::new_unchecked("http://example.com/bob"))
        );
        assert_eq!(quads[1].object, literal("2000-01-01", xsd::DATE.as_str()));
        assert_eq!(
            quads[2].object,
            Term::from(Literal::new_simple_literal("x1"))
        );
        assert_eq!(
            quads[3].object,
            Term::from(Literal::new_language_tagged_literal_unchecked("Alice", "en"))
        );
        Ok(())
    }

    #[test]
    fn test_named_graphs() -> Result<(), JsonLdSyntaxError> {
        let quads = parse(
            r#"{"@context": {"ex": "http://example.com/"}, "@graph": [
                {"@id": "ex:g", "@graph": {"@id": "ex:s", "ex:p": "o"}},
                {"@id": "ex:s2", "ex:p": "o2"}
            ]}"#,
        )?;
        assert_eq!(quads.len(), 2);
        assert_eq!(
            quads[0].graph_name,
            GraphName::NamedNode(NamedNode::new_unchecked("http://example.com/g"))
        );
        assert!(quads[1].graph_name.is_default_graph());
        Ok(())
    }

    #[test]
    fn test_blank_node_labels_are_shared() -> Result<(), JsonLdSyntaxError> {
        let quads = parse(
            r#"[
                {"@id": "_:a", "http://example.com/p": {"@id": "_:b"}},
                {"@id": "_:b", "http://example.com/p": "o"}
            ]"#,
        )?;
        assert_eq!(quads.len(), 2);
        assert_eq!(Term::from(quads[1].subject.clone()), quads[0].object);
        Ok(())
    }

    #[test]
    fn test_reverse_and_language_map() -> Result<(), JsonLdSyntaxError> {
        let quads = parse(
            r#"{
                "@context": {
                    "ex": "http://example.com/",
                    "parent": {"@reverse": "ex:child"},
                    "label": {"@id": "ex:label", "@container": "@language"}
                },
                "@id": "ex:bob",
                "parent": {"@id": "ex:alice"},
                "label": {"en": "Bob", "fr": ["Robert"]}
            }"#,
        )?;
        assert_eq!(quads.len(), 3);
        assert_eq!(
            Term::from(quads[0].subject.clone()),
            Term::from(NamedNode::new_unchecked("http://example.com/alice"))
        );
        assert_eq!(
            quads[2].object,
            Term::from(Literal::new_language_tagged_literal_unchecked("Robert", "fr"))
        );
        Ok(())
    }

    #[test]
    fn test_relative_iris() -> Result<(), JsonLdSyntaxError> {
        let quads = JsonLdParser::new()
            .with_base_iri("http://example.com/dir/")
            .map_err(|e| JsonLdSyntaxError::invalid_iri("http://example.com/dir/".into(), e))?
            .for_slice(r#"{"@id": "../s", "relative": "dropped", "http://example.com/p": {"@id": "o"}}"#)
            .collect::<Result<Vec<_>, _>>()?;
        assert_eq!(quads.len(), 1);
        assert_eq!(
            quads[0].object,
            Term::from(NamedNode::new_unchecked("http://example.com/dir/o"))
        );
        Ok(())
    }

    #[test]
    fn test_errors() {
        assert!(parse(r#"{"@context": "http://example.com/context"}"#).is_err());
        assert!(parse(r#"{"@id": 1}"#).is_err());
        assert!(parse(r#"{"http://example.com/p": {"@value": "a", "@language": "not a tag"}}"#).is_err());
        assert!(parse(r#""just a string""#).is_err());
        assert!(parse(r#"{"@context": {}, "@graph": [], "@id": "http://example.com/g"}"#).is_err());
    }

    #[test]
    fn test_lang_string_without_language_is_rejected() {
        let error = parse(
            r#"{"@id": "http://example.com/s", "http://example.com/p": {"@value": "x", "@type": "http://www.w3.org/1999/02/22-rdf-syntax-ns#langString"}}"#,
        )
        .unwrap_err();
        assert!(error.to_string().contains("without a language tag"), "{error}");
        parse(
            r#"{"@context": {"p": {"@id": "http://example.com/p", "@type": "http://www.w3.org/1999/02/22-rdf-syntax-ns#langString"}}, "@id": "http://example.com/s", "p": "x"}"#,
        )
        .unwrap_err();
    }

    #[test]
    fn test_blank_document() -> Result<(), JsonLdParseError> {
        for document in ["", " \n\t "] {
            assert!(parse(document)?.is_empty());
            assert!(
                JsonLdParser::new()
                    .for_reader(document.as_bytes())
                    .collect::<Result<Vec<_>, _>>()?
                    .is_empty()
            );
        }
        let quads = JsonLdParser::new()
            .for_reader(b"\n\n  {\"@id\": \"http://example.com/s\", \"http://example.com/p\": \"o\"}".as_slice())
            .collect::<Result<Vec<_>, _>>()?;
        assert_eq!(quads.len(), 1);
        Ok(())
    }

    #[test]
    fn test_error_ends_parsing() {
        let results = JsonLdParser::new()
            .for_slice(r#"[{"@id": "http://example.com/s", "http://example.com/p": "o"}, {"@id": 1}]"#)
            .collect::<Vec<_>>();
        assert_eq!(results.len(), 2);
        assert!(results[0].is_ok());
        assert!(results[1].is_err());
    }
}
