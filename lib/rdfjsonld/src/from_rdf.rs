use crate::context::has_keyword_form;
use oxiri::{Iri, IriParseError};
use rdfterm::vocab::{rdf, xsd};
use rdfterm::{
    BlankNode, BlankNodeRelabeler, GraphName, InvalidTermError, Literal, NamedNode, PrefixTable,
    Predicate, Quad, Subject, Term, Triple,
};
use serde_json::{Map, Value};
use std::collections::{HashMap, HashSet};
use std::io::{self, Write};
use std::mem;

/// Blank nodes nested deeper than this are written as references.
const MAX_EMBEDDING_DEPTH: usize = 64;

/// The layout of the written JSON-LD document.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JsonLdShape {
    /// An array of node objects written as the statements come,
    /// adjacent statements with the same subject are merged into one node object.
    #[default]
    Default,
    /// One node object per subject for the whole document, in a `@context`/`@graph` envelope.
    Flattened,
    /// Like [`Flattened`](Self::Flattened), but blank nodes referenced exactly once
    /// are embedded into the node object referencing them.
    Framed,
}

/// A [JSON-LD](https://www.w3.org/TR/json-ld/) serializer.
///
/// ```
/// use rdfjsonld::JsonLdSerializer;
/// use rdfterm::vocab::rdf;
/// use rdfterm::{Literal, NamedNode, Quad};
///
/// let mut serializer = JsonLdSerializer::new()
///     .with_prefix("schema", "http://schema.org/")?
///     .for_writer(Vec::new());
/// serializer.serialize_quad(&Quad::new(
///     NamedNode::new("http://example.com#me")?,
///     rdf::TYPE,
///     NamedNode::new("http://schema.org/Person")?,
///     NamedNode::new("http://example.com")?,
/// ))?;
/// serializer.serialize_quad(&Quad::new(
///     NamedNode::new("http://example.com#me")?,
///     NamedNode::new("http://schema.org/name")?,
///     Literal::new_language_tagged_literal_unchecked("Foo Bar", "en"),
///     NamedNode::new("http://example.com")?,
/// ))?;
/// assert_eq!(
///     r#"{"@context":{"schema":"http://schema.org/"},"@graph":[{"@id":"http://example.com","@graph":[{"@id":"http://example.com#me","@type":"schema:Person","schema:name":{"@value":"Foo Bar","@language":"en"}}]}]}"#,
///     String::from_utf8(serializer.finish()?)?
/// );
/// # Result::<_, Box<dyn std::error::Error>>::Ok(())
/// ```
#[derive(Default, Clone)]
#[must_use]
pub struct JsonLdSerializer {
    prefixes: PrefixTable,
    shape: JsonLdShape,
    pretty: bool,
}

impl JsonLdSerializer {
    /// Builds a new [`JsonLdSerializer`].
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a prefix to the written `@context`.
    ///
    /// The empty prefix becomes the `@vocab` of the context.
    /// Prefixes whose namespace does not end with an IRI delimiter
    /// (one of `:/?#[]@`) can't be used by JSON-LD processors and are ignored.
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

    /// Sets the document shape, [`JsonLdShape::Default`] if not called.
    #[inline]
    pub fn with_shape(mut self, shape: JsonLdShape) -> Self {
        self.shape = shape;
        self
    }

    /// Indents the output with two spaces.
    ///
    /// ```
    /// use rdfjsonld::{JsonLdSerializer, JsonLdShape};
    /// use rdfterm::{BlankNode, NamedNode, Triple};
    ///
    /// let mut serializer = JsonLdSerializer::new()
    ///     .with_prefix("", "http://example.com/")?
    ///     .with_shape(JsonLdShape::Framed)
    ///     .pretty()
    ///     .for_writer(Vec::new());
    /// let address = BlankNode::default();
    /// serializer.serialize_triple(&Triple::new(
    ///     NamedNode::new("http://example.com/me")?,
    ///     NamedNode::new("http://example.com/address")?,
    ///     address.clone(),
    /// ))?;
    /// serializer.serialize_triple(&Triple::new(
    ///     address,
    ///     NamedNode::new("http://example.com/city")?,
    ///     NamedNode::new("http://example.com/Paris")?,
    /// ))?;
    /// assert_eq!(
    ///     "{\n  \"@context\": {\n    \"@vocab\": \"http://example.com/\"\n  },\n  \"@graph\": [\n    {\n      \"@id\": \"http://example.com/me\",\n      \"address\": {\n        \"city\": {\n          \"@id\": \"http://example.com/Paris\"\n        }\n      }\n    }\n  ]\n}\n",
    ///     String::from_utf8(serializer.finish()?)?
    /// );
    /// # Result::<_, Box<dyn std::error::Error>>::Ok(())
    /// ```
    #[inline]
    pub fn pretty(mut self) -> Self {
        self.pretty = true;
        self
    }

    /// Writes a JSON-LD file to a [`Write`] implementation.
    ///
    /// This writer does unbuffered writes.
    pub fn for_writer<W: Write>(self, writer: W) -> WriterJsonLdSerializer<W> {
        WriterJsonLdSerializer {
            writer,
            inner: self.into_inner(),
        }
    }

    fn into_inner(self) -> InnerJsonLdWriter {
        let mut context = Map::new();
        let mut prefixes = PrefixTable::new();
        let mut vocab = None;
        for (name, namespace) in self.prefixes.iter() {
            if !namespace.ends_with([':', '/', '?', '#', '[', ']', '@']) {
                continue;
            }
            if name.is_empty() {
                vocab = Some(namespace.to_owned());
                context.insert("@vocab".into(), namespace.into());
            } else if !name.contains([':', '/']) && !has_keyword_form(name) && name != "_" {
                prefixes.insert(name, namespace);
                context.insert(name.into(), namespace.into());
            }
        }
        let context = (self.shape != JsonLdShape::Default || !context.is_empty())
            .then_some(Value::Object(context));
        InnerJsonLdWriter {
            shape: self.shape,
            pretty: self.pretty,
            compactor: IriCompactor { prefixes, vocab },
            relabeler: BlankNodeRelabeler::new(),
            context,
            started: false,
            element_count: 0,
            current_graph: GraphName::DefaultGraph,
            current_node: None,
            current_graph_nodes: Vec::new(),
            dataset: Dataset::default(),
        }
    }
}

/// Writes a JSON-LD file to a [`Write`] implementation.
///
/// Can be built using [`JsonLdSerializer::for_writer`].
#[must_use]
pub struct WriterJsonLdSerializer<W: Write> {
    writer: W,
    inner: InnerJsonLdWriter,
}

impl<W: Write> WriterJsonLdSerializer<W> {
    /// Writes an extra triple in the default graph.
    pub fn serialize_triple(&mut self, triple: &Triple) -> io::Result<()> {
        self.inner.serialize(
            &triple.subject,
            &triple.predicate,
            &triple.object,
            &GraphName::DefaultGraph,
            &mut self.writer,
        )
    }

    /// Writes an extra quad.
    pub fn serialize_quad(&mut self, quad: &Quad) -> io::Result<()> {
        self.inner.serialize(
            &quad.subject,
            &quad.predicate,
            &quad.object,
            &quad.graph_name,
            &mut self.writer,
        )
    }

    /// Ends the write process and returns the underlying [`Write`].
    pub fn finish(mut self) -> io::Result<W> {
        self.inner.finish(&mut self.writer)?;
        self.writer.flush()?;
        Ok(self.writer)
    }
}

struct InnerJsonLdWriter {
    shape: JsonLdShape,
    pretty: bool,
    compactor: IriCompactor,
    relabeler: BlankNodeRelabeler,
    // None if the document is a bare array
    context: Option<Value>,
    started: bool,
    element_count: usize,
    current_graph: GraphName,
    current_node: Option<(Subject, NodeData)>,
    current_graph_nodes: Vec<Value>,
    dataset: Dataset,
}

impl InnerJsonLdWriter {
    fn serialize(
        &mut self,
        subject: &Subject,
        predicate: &Predicate,
        object: &Term,
        graph_name: &GraphName,
        output: &mut impl Write,
    ) -> io::Result<()> {
        if matches!(subject, Subject::Variable(_)) || matches!(object, Term::Variable(_)) {
            return Err(invalid_term(
                "JSON-LD does not support variables".to_owned(),
            ));
        }
        let Predicate::NamedNode(predicate) = predicate else {
            return Err(invalid_term(format!(
                "JSON-LD does not support variables, {predicate} can't be written"
            )));
        };
        if self.shape != JsonLdShape::Default {
            self.dataset
                .graph_mut(graph_name)
                .node_mut(subject)
                .add(predicate.clone(), object.clone());
            return Ok(());
        }

        if *graph_name != self.current_graph {
            self.flush_node(output)?;
            self.flush_graph(output)?;
            self.current_graph = graph_name.clone();
        }
        if self
            .current_node
            .as_ref()
            .is_some_and(|(current, _)| current != subject)
        {
            self.flush_node(output)?;
        }
        self.current_node
            .get_or_insert_with(|| (subject.clone(), NodeData::default()))
            .1
            .add(predicate.clone(), object.clone());
        Ok(())
    }

    fn flush_node(&mut self, output: &mut impl Write) -> io::Result<()> {
        let Some((subject, data)) = self.current_node.take() else {
            return Ok(());
        };
        let node = self.node_value(&subject, &data, None, true, 0)?;
        if self.current_graph.is_default_graph() {
            self.write_element(output, &node)
        } else {
            self.current_graph_nodes.push(node);
            Ok(())
        }
    }

    fn flush_graph(&mut self, output: &mut impl Write) -> io::Result<()> {
        if self.current_graph_nodes.is_empty() {
            return Ok(());
        }
        let nodes = mem::take(&mut self.current_graph_nodes);
        let mut graph = Map::new();
        graph.insert("@id".into(), self.graph_id(&self.current_graph.clone()).into());
        graph.insert("@graph".into(), Value::Array(nodes));
        self.write_element(output, &Value::Object(graph))
    }

    fn finish(&mut self, output: &mut impl Write) -> io::Result<()> {
        if self.shape == JsonLdShape::Default {
            self.flush_node(output)?;
            self.flush_graph(output)?;
        } else {
            self.write_dataset(output)?;
        }
        self.start(output)?;
        let envelope = self.context.is_some();
        if self.pretty && self.element_count > 0 {
            output.write_all(if envelope { b"\n  ]" } else { b"\n]" })?;
        } else {
            output.write_all(b"]")?;
        }
        if envelope {
            output.write_all(if self.pretty { b"\n}" } else { b"}" })?;
        }
        if self.pretty {
            output.write_all(b"\n")?;
        }
        Ok(())
    }

    /// Writes the buffered statements of the flattened and framed shapes.
    fn write_dataset(&mut self, output: &mut impl Write) -> io::Result<()> {
        let dataset = mem::take(&mut self.dataset);
        let framed = self.shape == JsonLdShape::Framed;
        let graph_names = dataset
            .graphs
            .iter()
            .filter_map(|(name, _)| match name {
                GraphName::BlankNode(node) => Some(node.clone()),
                GraphName::NamedNode(_) | GraphName::DefaultGraph => None,
            })
            .collect::<HashSet<_>>();
        let mut written_graphs = HashSet::new();
        if let Some(default_graph) = dataset.graph(&GraphName::DefaultGraph) {
            for (subject, node) in self.graph_values(default_graph, framed, &graph_names)? {
                let mut node = node;
                let graph_name = match subject {
                    Subject::NamedNode(node) => GraphName::NamedNode(node),
                    Subject::BlankNode(node) => GraphName::BlankNode(node),
                    Subject::Variable(_) => GraphName::DefaultGraph,
                };
                if let Some(graph) = dataset.graph(&graph_name).filter(|_| !graph_name.is_default_graph()) {
                    let values = self
                        .graph_values(graph, framed, &graph_names)?
                        .into_iter()
                        .map(|(_, value)| value)
                        .collect();
                    if let Value::Object(node) = &mut node {
                        node.insert("@graph".into(), Value::Array(values));
                    }
                    written_graphs.insert(graph_name);
                }
                self.write_element(output, &node)?;
            }
        }
        for (graph_name, graph) in &dataset.graphs {
            if graph_name.is_default_graph() || written_graphs.contains(graph_name) {
                continue;
            }
            let values = self
                .graph_values(graph, framed, &graph_names)?
                .into_iter()
                .map(|(_, value)| value)
                .collect();
            let mut element = Map::new();
            element.insert("@id".into(), self.graph_id(graph_name).into());
            element.insert("@graph".into(), Value::Array(values));
            self.write_element(output, &Value::Object(element))?;
        }
        Ok(())
    }

    /// The top-level node objects of a graph.
    fn graph_values(
        &mut self,
        graph: &GraphNodes,
        framed: bool,
        graph_names: &HashSet<BlankNode>,
    ) -> io::Result<Vec<(Subject, Value)>> {
        let mut framing = framed.then(|| Framing::new(graph, graph_names));
        let mut values = Vec::with_capacity(graph.nodes.len());
        for (subject, data) in &graph.nodes {
            if let Some(framing) = &mut framing {
                if framing.is_embeddable(subject) || !framing.emitted.insert(subject.clone()) {
                    continue;
                }
            }
            values.push((
                subject.clone(),
                self.node_value(subject, data, framing.as_mut(), true, 0)?,
            ));
        }
        if let Some(framing) = &mut framing {
            // Blank nodes in reference cycles are never embedded
            for (subject, data) in &graph.nodes {
                if framing.emitted.insert(subject.clone()) {
                    values.push((
                        subject.clone(),
                        self.node_value(subject, data, Some(framing), true, 0)?,
                    ));
                }
            }
        }
        Ok(values)
    }

    fn node_value(
        &mut self,
        subject: &Subject,
        data: &NodeData,
        mut framing: Option<&mut Framing<'_>>,
        with_id: bool,
        depth: usize,
    ) -> io::Result<Value> {
        let mut node = Map::new();
        if with_id {
            node.insert("@id".into(), self.subject_id(subject).into());
        }
        let mut types = Vec::new();
        for (predicate, objects) in &data.properties {
            if *predicate != rdf::TYPE {
                continue;
            }
            for object in objects {
                match object {
                    Term::NamedNode(node) => {
                        types.push(Value::from(self.compactor.compact_vocab(node.as_str())))
                    }
                    Term::BlankNode(node) => {
                        types.push(Value::from(format!("_:{}", self.relabeler.label(node))))
                    }
                    Term::Literal(_) | Term::Variable(_) => (),
                }
            }
        }
        if !types.is_empty() {
            node.insert("@type".into(), single_or_array(types));
        }
        for (predicate, objects) in &data.properties {
            let mut values = Vec::with_capacity(objects.len());
            for object in objects {
                if *predicate == rdf::TYPE && matches!(object, Term::NamedNode(_) | Term::BlankNode(_))
                {
                    continue;
                }
                values.push(self.object_value(object, framing.as_deref_mut(), depth)?);
            }
            if !values.is_empty() {
                node.insert(
                    self.compactor.compact_vocab(predicate.as_str()),
                    single_or_array(values),
                );
            }
        }
        Ok(Value::Object(node))
    }

    fn object_value(
        &mut self,
        object: &Term,
        framing: Option<&mut Framing<'_>>,
        depth: usize,
    ) -> io::Result<Value> {
        Ok(match object {
            Term::NamedNode(node) => id_object(self.compactor.compact_id(node.as_str())),
            Term::BlankNode(node) => {
                if let Some(framing) = framing {
                    let subject = Subject::BlankNode(node.clone());
                    let graph = framing.graph;
                    if depth < MAX_EMBEDDING_DEPTH
                        && framing.embeddable.contains(node)
                        && !framing.emitted.contains(&subject)
                    {
                        if let Some(data) = graph.node(&subject) {
                            framing.emitted.insert(subject.clone());
                            return self.node_value(&subject, data, Some(framing), false, depth + 1);
                        }
                    }
                }
                id_object(format!("_:{}", self.relabeler.label(node)))
            }
            Term::Literal(literal) => self.literal_value(literal),
            Term::Variable(variable) => {
                return Err(invalid_term(format!(
                    "JSON-LD does not support variables, {variable} can't be written"
                )));
            }
        })
    }

    fn literal_value(&self, literal: &Literal) -> Value {
        let value = literal.value();
        let mut object = Map::new();
        object.insert("@value".into(), value.into());
        if let Some(language) = literal.language() {
            object.insert("@language".into(), language.into());
        } else if literal.datatype() == xsd::STRING {
            return value.into();
        } else if literal.datatype() == xsd::BOOLEAN && matches!(value, "true" | "false") {
            return Value::Bool(value == "true");
        } else if literal.datatype() == xsd::INTEGER {
            if let Some(integer) = value
                .parse::<i64>()
                .ok()
                .filter(|integer| integer.to_string() == value)
            {
                return integer.into();
            }
            object.insert("@type".into(), self.compactor.compact_vocab(xsd::INTEGER.as_str()).into());
        } else {
            object.insert(
                "@type".into(),
                self.compactor.compact_vocab(literal.datatype().as_str()).into(),
            );
        }
        Value::Object(object)
    }

    fn subject_id(&mut self, subject: &Subject) -> String {
        match subject {
            Subject::NamedNode(node) => self.compactor.compact_id(node.as_str()),
            Subject::BlankNode(node) => format!("_:{}", self.relabeler.label(node)),
            Subject::Variable(variable) => variable.to_string(),
        }
    }

    fn graph_id(&mut self, graph_name: &GraphName) -> String {
        match graph_name {
            GraphName::NamedNode(node) => self.compactor.compact_id(node.as_str()),
            GraphName::BlankNode(node) => format!("_:{}", self.relabeler.label(node)),
            GraphName::DefaultGraph => "@default".into(),
        }
    }

    fn start(&mut self, output: &mut impl Write) -> io::Result<()> {
        if self.started {
            return Ok(());
        }
        self.started = true;
        if let Some(context) = &self.context {
            if self.pretty {
                write!(
                    output,
                    "{{\n  \"@context\": {},\n  \"@graph\": [",
                    reindent(&serde_json::to_string_pretty(context)?, "  ")
                )?;
            } else {
                write!(
                    output,
                    "{{\"@context\":{},\"@graph\":[",
                    serde_json::to_string(context)?
                )?;
            }
        } else {
            output.write_all(b"[")?;
        }
        Ok(())
    }

    fn write_element(&mut self, output: &mut impl Write, element: &Value) -> io::Result<()> {
        self.start(output)?;
        if self.element_count > 0 {
            output.write_all(b",")?;
        }
        if self.pretty {
            let indent = if self.context.is_some() { "    " } else { "  " };
            write!(
                output,
                "\n{indent}{}",
                reindent(&serde_json::to_string_pretty(element)?, indent)
            )?;
        } else {
            serde_json::to_writer(&mut *output, element)?;
        }
        self.element_count += 1;
        Ok(())
    }
}

/// Compacts IRIs with the prefixes of the written context.
struct IriCompactor {
    prefixes: PrefixTable,
    vocab: Option<String>,
}

impl IriCompactor {
    /// For `@id` values, that are never resolved against `@vocab`.
    fn compact_id(&self, iri: &str) -> String {
        if let Some((prefix, local)) = self
            .prefixes
            .compact(iri, |local| !local.starts_with("//"))
        {
            format!("{prefix}:{local}")
        } else {
            iri.into()
        }
    }

    /// For keys and `@type` values.
    fn compact_vocab(&self, iri: &str) -> String {
        if let Some(local) = self
            .vocab
            .as_deref()
            .and_then(|vocab| iri.strip_prefix(vocab))
        {
            if !local.is_empty()
                && !local.contains(':')
                && !local.starts_with('@')
                && self.prefixes.get(local).is_none()
            {
                return local.into();
            }
        }
        self.compact_id(iri)
    }
}

#[derive(Default)]
struct NodeData {
    properties: Vec<(NamedNode, Vec<Term>)>,
}

impl NodeData {
    fn add(&mut self, predicate: NamedNode, object: Term) {
        if let Some((_, objects)) = self.properties.iter_mut().find(|(p, _)| *p == predicate) {
            objects.push(object);
        } else {
            self.properties.push((predicate, vec![object]));
        }
    }
}

#[derive(Default)]
struct GraphNodes {
    nodes: Vec<(Subject, NodeData)>,
    positions: HashMap<Subject, usize>,
}

impl GraphNodes {
    fn node(&self, subject: &Subject) -> Option<&NodeData> {
        Some(&self.nodes[*self.positions.get(subject)?].1)
    }

    fn node_mut(&mut self, subject: &Subject) -> &mut NodeData {
        let position = *self.positions.entry(subject.clone()).or_insert_with(|| {
            self.nodes.push((subject.clone(), NodeData::default()));
            self.nodes.len() - 1
        });
        &mut self.nodes[position].1
    }
}

#[derive(Default)]
struct Dataset {
    graphs: Vec<(GraphName, GraphNodes)>,
    positions: HashMap<GraphName, usize>,
}

impl Dataset {
    fn graph(&self, graph_name: &GraphName) -> Option<&GraphNodes> {
        Some(&self.graphs[*self.positions.get(graph_name)?].1)
    }

    fn graph_mut(&mut self, graph_name: &GraphName) -> &mut GraphNodes {
        let position = *self.positions.entry(graph_name.clone()).or_insert_with(|| {
            self.graphs.push((graph_name.clone(), GraphNodes::default()));
            self.graphs.len() - 1
        });
        &mut self.graphs[position].1
    }
}

/// Embedding state of the framed shape inside of one graph.
struct Framing<'a> {
    graph: &'a GraphNodes,
    embeddable: HashSet<BlankNode>,
    emitted: HashSet<Subject>,
}

impl<'a> Framing<'a> {
    fn new(graph: &'a GraphNodes, graph_names: &HashSet<BlankNode>) -> Self {
        let mut reference_counts = HashMap::<&BlankNode, usize>::new();
        for (_, data) in &graph.nodes {
            for (_, objects) in &data.properties {
                for object in objects {
                    if let Term::BlankNode(node) = object {
                        *reference_counts.entry(node).or_default() += 1;
                    }
                }
            }
        }
        let embeddable = reference_counts
            .into_iter()
            .filter(|(node, count)| {
                *count == 1
                    && !graph_names.contains(*node)
                    && graph
                        .positions
                        .contains_key(&Subject::BlankNode((*node).clone()))
            })
            .map(|(node, _)| node.clone())
            .collect();
        Self {
            graph,
            embeddable,
            emitted: HashSet::new(),
        }
    }

    fn is_embeddable(&self, subject: &Subject) -> bool {
        matches!(subject, Subject::BlankNode(node) if self.embeddable.contains(node))
    }
}

fn id_object(id: String) -> Value {
    let mut object = Map::new();
    object.insert("@id".into(), id.into());
    Value::Object(object)
}

fn single_or_array(mut values: Vec<Value>) -> Value {
    if values.len() == 1 {
        values.remove(0)
    } else {
        Value::Array(values)
    }
}

fn reindent(json: &str, indent: &str) -> String {
    json.replace('\n', &format!("\n{indent}"))
}

fn invalid_term(msg: String) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidInput, InvalidTermError::msg(msg))
}
