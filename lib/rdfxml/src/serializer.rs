use crate::utils::{is_nc_name, split_iri};
use oxiri::{Iri, IriParseError};
use quick_xml::Writer;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use rdfterm::vocab::rdf;
use rdfterm::{
    BlankNodeRelabeler, GraphName, InvalidTermError, PrefixTable, Predicate, Quad, Subject, Term,
    Triple,
};
use std::io::{self, Write};

/// A [RDF/XML](https://www.w3.org/TR/rdf-syntax-grammar/) serializer.
///
/// ```
/// use rdfterm::{Literal, NamedNode, Triple};
/// use rdfterm::vocab::rdf;
/// use rdfxml::RdfXmlSerializer;
///
/// let mut serializer = RdfXmlSerializer::new()
///     .with_prefix("schema", "http://schema.org/")?
///     .pretty()
///     .for_writer(Vec::new());
/// serializer.serialize_triple(&Triple::new(
///     NamedNode::new("http://example.com#me")?,
///     rdf::TYPE,
///     NamedNode::new("http://schema.org/Person")?,
/// ))?;
/// serializer.serialize_triple(&Triple::new(
///     NamedNode::new("http://example.com#me")?,
///     NamedNode::new("http://schema.org/name")?,
///     Literal::new_simple_literal("Foo"),
/// ))?;
/// assert_eq!(
///     "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<rdf:RDF xmlns:rdf=\"http://www.w3.org/1999/02/22-rdf-syntax-ns#\" xmlns:schema=\"http://schema.org/\">\n\t<schema:Person rdf:about=\"http://example.com#me\">\n\t\t<schema:name>Foo</schema:name>\n\t</schema:Person>\n</rdf:RDF>",
///     String::from_utf8(serializer.finish()?)?
/// );
/// # Result::<_,Box<dyn std::error::Error>>::Ok(())
/// ```
#[derive(Default, Clone)]
#[must_use]
pub struct RdfXmlSerializer {
    prefixes: PrefixTable,
    pretty: bool,
}

impl RdfXmlSerializer {
    /// Builds a new [`RdfXmlSerializer`].
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Declares a namespace on the root `rdf:RDF` element.
    ///
    /// Prefix names that are not valid XML namespace prefixes are ignored at write time.
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

    /// Indents the output and writes typed node elements.
    #[inline]
    pub fn pretty(mut self) -> Self {
        self.pretty = true;
        self
    }

    /// Writes a RDF/XML file to a [`Write`] implementation.
    ///
    /// This writer does unbuffered writes.
    pub fn for_writer<W: Write>(self, writer: W) -> WriterRdfXmlSerializer<W> {
        WriterRdfXmlSerializer {
            writer: if self.pretty {
                Writer::new_with_indent(writer, b'\t', 1)
            } else {
                Writer::new(writer)
            },
            inner: InnerRdfXmlWriter::new(self.prefixes, self.pretty),
        }
    }
}

/// Writes a RDF/XML file to a [`Write`] implementation.
///
/// Can be built using [`RdfXmlSerializer::for_writer`].
#[must_use]
pub struct WriterRdfXmlSerializer<W: Write> {
    writer: Writer<W>,
    inner: InnerRdfXmlWriter,
}

impl<W: Write> WriterRdfXmlSerializer<W> {
    /// Writes an extra triple.
    pub fn serialize_triple(&mut self, triple: &Triple) -> io::Result<()> {
        let mut buffer = Vec::new();
        self.inner.serialize_triple(triple, &mut buffer)?;
        self.flush_buffer(&mut buffer)
    }

    /// Writes an extra quad.
    ///
    /// RDF/XML has no named graphs: quads outside of the default graph are rejected.
    pub fn serialize_quad(&mut self, quad: &Quad) -> io::Result<()> {
        if quad.graph_name != GraphName::DefaultGraph {
            return Err(invalid_term(format!(
                "RDF/XML does not support named graphs, {} can't be written",
                quad.graph_name
            )));
        }
        self.serialize_triple(&Triple::from(quad.clone()))
    }

    /// Ends the write process and returns the underlying [`Write`].
    pub fn finish(mut self) -> io::Result<W> {
        let mut buffer = Vec::new();
        self.inner.finish(&mut buffer)?;
        self.flush_buffer(&mut buffer)?;
        let mut writer = self.writer.into_inner();
        writer.flush()?;
        Ok(writer)
    }

    fn flush_buffer(&mut self, buffer: &mut Vec<Event<'static>>) -> io::Result<()> {
        for event in buffer.drain(..) {
            self.writer.write_event(event)?;
        }
        Ok(())
    }
}

struct InnerRdfXmlWriter {
    prefixes: PrefixTable,
    pretty: bool,
    is_started: bool,
    // Compact mode: the subject of the open rdf:Description element
    current_subject: Option<Subject>,
    // Pretty mode: the statements of the current subject, not written yet
    group: Vec<Triple>,
    blank_nodes: BlankNodeRelabeler,
}

impl InnerRdfXmlWriter {
    fn new(caller_prefixes: PrefixTable, pretty: bool) -> Self {
        let mut prefixes = PrefixTable::new();
        prefixes.insert("rdf", rdf::NAMESPACE);
        for (name, namespace) in caller_prefixes.iter() {
            // "xml" prefixed names are reserved and "rdf" is always bound
            if namespace.is_empty()
                || name == "rdf"
                || name.to_ascii_lowercase().starts_with("xml")
                || !(name.is_empty() || is_nc_name(name))
            {
                continue;
            }
            prefixes.insert(name, namespace);
        }
        Self {
            prefixes,
            pretty,
            is_started: false,
            current_subject: None,
            group: Vec::new(),
            blank_nodes: BlankNodeRelabeler::new(),
        }
    }

    fn serialize_triple(
        &mut self,
        triple: &Triple,
        output: &mut Vec<Event<'static>>,
    ) -> io::Result<()> {
        validate(triple)?;
        if !self.is_started {
            self.write_start(output);
        }
        if self.pretty {
            if self
                .group
                .first()
                .is_some_and(|first| first.subject != triple.subject)
            {
                self.flush_group(output)?;
            }
            self.group.push(triple.clone());
            return Ok(());
        }

        // We open a new rdf:Description if useful
        if self.current_subject.as_ref() != Some(&triple.subject) {
            if self.current_subject.is_some() {
                output.push(Event::End(BytesEnd::new("rdf:Description")));
            }
            output.push(Event::Start(
                self.node_element("rdf:Description".into(), &triple.subject),
            ));
            self.current_subject = Some(triple.subject.clone());
        }
        self.write_property(&triple.predicate, &triple.object, output)
    }

    fn finish(&mut self, output: &mut Vec<Event<'static>>) -> io::Result<()> {
        if !self.is_started {
            self.write_start(output);
        }
        if self.current_subject.take().is_some() {
            output.push(Event::End(BytesEnd::new("rdf:Description")));
        }
        self.flush_group(output)?;
        output.push(Event::End(BytesEnd::new("rdf:RDF")));
        Ok(())
    }

    fn write_start(&mut self, output: &mut Vec<Event<'static>>) {
        output.push(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)));
        let mut rdf_open = BytesStart::new("rdf:RDF");
        for (name, namespace) in self.prefixes.iter() {
            if name.is_empty() {
                rdf_open.push_attribute(("xmlns", namespace));
            } else {
                rdf_open.push_attribute((format!("xmlns:{name}").as_str(), namespace));
            }
        }
        output.push(Event::Start(rdf_open));
        self.is_started = true;
    }

    /// Writes the buffered subject group, as a typed node element if it has a type with a QName.
    fn flush_group(&mut self, output: &mut Vec<Event<'static>>) -> io::Result<()> {
        let mut group = std::mem::take(&mut self.group);
        let Some(subject) = group.first().map(|t| t.subject.clone()) else {
            return Ok(());
        };
        let typed_element = group.iter().enumerate().find_map(|(i, t)| {
            if t.predicate != rdf::TYPE {
                return None;
            }
            let Term::NamedNode(class) = &t.object else {
                return None;
            };
            Some((i, self.qname(class.as_str())?))
        });
        let element_name = if let Some((i, name)) = typed_element {
            group.remove(i);
            name
        } else {
            "rdf:Description".into()
        };
        // rdf:type statements first, the others in arrival order
        group.sort_by_key(|t| t.predicate != rdf::TYPE);

        let node_open = self.node_element(element_name.clone(), &subject);
        if group.is_empty() {
            output.push(Event::Empty(node_open));
        } else {
            output.push(Event::Start(node_open));
            for triple in &group {
                self.write_property(&triple.predicate, &triple.object, output)?;
            }
            output.push(Event::End(BytesEnd::new(element_name)));
        }
        Ok(())
    }

    fn node_element(&mut self, name: String, subject: &Subject) -> BytesStart<'static> {
        let mut node_open = BytesStart::new(name);
        match subject {
            Subject::NamedNode(node) => node_open.push_attribute(("rdf:about", node.as_str())),
            Subject::BlankNode(node) => {
                node_open.push_attribute(("rdf:nodeID", self.blank_nodes.label(node)))
            }
            // Rejected by validate
            Subject::Variable(_) => (),
        }
        node_open
    }

    fn write_property(
        &mut self,
        predicate: &Predicate,
        object: &Term,
        output: &mut Vec<Event<'static>>,
    ) -> io::Result<()> {
        let Predicate::NamedNode(predicate) = predicate else {
            return Err(invalid_term(format!(
                "RDF/XML does not support variables, {predicate} can't be written"
            )));
        };
        let (element_name, local_namespace) = if let Some(qname) = self.qname(predicate.as_str())
        {
            (qname, None)
        } else {
            let (namespace, local) = split_iri(predicate.as_str());
            if local.is_empty() {
                return Err(invalid_term(format!(
                    "The predicate {predicate} can't be written as an XML element name"
                )));
            }
            (local.to_owned(), Some(namespace))
        };
        let mut property_open = BytesStart::new(element_name.clone());
        if let Some(namespace) = local_namespace {
            property_open.push_attribute(("xmlns", namespace));
        }
        match object {
            Term::NamedNode(node) => {
                property_open.push_attribute(("rdf:resource", node.as_str()));
                output.push(Event::Empty(property_open));
            }
            Term::BlankNode(node) => {
                property_open.push_attribute(("rdf:nodeID", self.blank_nodes.label(node)));
                output.push(Event::Empty(property_open));
            }
            Term::Literal(literal) => {
                if let Some(language) = literal.language() {
                    property_open.push_attribute(("xml:lang", language));
                } else if !literal.is_plain() {
                    property_open.push_attribute(("rdf:datatype", literal.datatype().as_str()));
                }
                output.push(Event::Start(property_open));
                output.push(Event::Text(BytesText::new(literal.value()).into_owned()));
                output.push(Event::End(BytesEnd::new(element_name)));
            }
            Term::Variable(_) => {
                return Err(invalid_term(format!(
                    "RDF/XML does not support variables, {object} can't be written"
                )));
            }
        }
        Ok(())
    }

    /// The `prefix:local` (or bare `local` for the default namespace) name of `iri`.
    fn qname(&self, iri: &str) -> Option<String> {
        let (prefix, local) = self.prefixes.compact(iri, is_nc_name)?;
        Some(if prefix.is_empty() {
            local.to_owned()
        } else {
            format!("{prefix}:{local}")
        })
    }
}

fn validate(triple: &Triple) -> io::Result<()> {
    if let Subject::Variable(variable) = &triple.subject {
        return Err(invalid_term(format!(
            "RDF/XML does not support variables, {variable} can't be written"
        )));
    }
    Ok(())
}

fn invalid_term(msg: String) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidInput, InvalidTermError::msg(msg))
}

#[cfg(test)]
mod tests {
    #![allow(clippy::panic_in_result_fn)]

    use super::*;
    use crate::RdfXmlParser;
    use rdfterm::{BlankNode, Literal, NamedNode, Variable};

    fn ex(name: &str) -> NamedNode {
        NamedNode::new_unchecked(format!("http://example.com/{name}"))
    }

    fn write(serializer: RdfXmlSerializer, triples: &[Triple]) -> io::Result<String> {
        let mut writer = serializer.for_writer(Vec::new());
        for triple in triples {
            writer.serialize_triple(triple)?;
        }
        String::from_utf8(writer.finish()?).map_err(io::Error::other)
    }

    #[test]
    fn test_compact_write() -> io::Result<()> {
        let output = write(
            RdfXmlSerializer::new(),
            &[
                Triple::new(ex("s"), ex("p"), ex("o")),
                Triple::new(
                    ex("s"),
                    ex("q"),
                    Literal::new_language_tagged_literal_unchecked("a < b", "en"),
                ),
            ],
        )?;
        assert_eq!(
            output,
            "<?xml version=\"1.0\" encoding=\"UTF-8\"?><rdf:RDF xmlns:rdf=\"http://www.w3.org/1999/02/22-rdf-syntax-ns#\"><rdf:Description rdf:about=\"http://example.com/s\"><p xmlns=\"http://example.com/\" rdf:resource=\"http://example.com/o\"/><q xmlns=\"http://example.com/\" xml:lang=\"en\">a &lt; b</q></rdf:Description></rdf:RDF>"
        );
        Ok(())
    }

    #[test]
    fn test_prefixed_property_and_blank_nodes() -> io::Result<()> {
        let node = BlankNode::default();
        let output = write(
            RdfXmlSerializer::new()
                .with_prefix("ex", "http://example.com/")
                .map_err(io::Error::other)?,
            &[
                Triple::new(ex("s"), ex("p"), node.clone()),
                Triple::new(
                    node,
                    ex("p"),
                    Literal::new_typed_literal("1", rdfterm::vocab::xsd::INTEGER),
                ),
            ],
        )?;
        assert!(output.contains("xmlns:ex=\"http://example.com/\""));
        assert!(output.contains("<ex:p rdf:nodeID=\"b0\"/>"));
        assert!(output.contains("<rdf:Description rdf:nodeID=\"b0\">"));
        assert!(output.contains(
            "<ex:p rdf:datatype=\"http://www.w3.org/2001/XMLSchema#integer\">1</ex:p>"
        ));
        Ok(())
    }

    #[test]
    fn test_pretty_groups_subjects() -> Result<(), Box<dyn std::error::Error>> {
        let triples = [
            Triple::new(ex("s"), ex("p"), Literal::new_simple_literal("a")),
            Triple::new(ex("s"), rdf::TYPE, ex("C")),
            Triple::new(ex("s"), rdf::TYPE, ex("D")),
            Triple::new(ex("t"), ex("p"), ex("s")),
        ];
        let output = write(
            RdfXmlSerializer::new()
                .with_prefix("ex", "http://example.com/")?
                .pretty(),
            &triples,
        )?;
        assert_eq!(
            output,
            "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<rdf:RDF xmlns:rdf=\"http://www.w3.org/1999/02/22-rdf-syntax-ns#\" xmlns:ex=\"http://example.com/\">\n\t<ex:C rdf:about=\"http://example.com/s\">\n\t\t<rdf:type rdf:resource=\"http://example.com/D\"/>\n\t\t<ex:p>a</ex:p>\n\t</ex:C>\n\t<rdf:Description rdf:about=\"http://example.com/t\">\n\t\t<ex:p rdf:resource=\"http://example.com/s\"/>\n\t</rdf:Description>\n</rdf:RDF>"
        );

        // The output is read back to the same graph
        let mut parsed = RdfXmlParser::new()
            .for_slice(&output)
            .collect::<Result<Vec<_>, _>>()?;
        parsed.sort_by_key(ToString::to_string);
        let mut expected = triples.to_vec();
        expected.sort_by_key(ToString::to_string);
        assert_eq!(parsed, expected);
        Ok(())
    }

    #[test]
    fn test_unusable_prefixes_are_ignored() -> io::Result<()> {
        let output = write(
            RdfXmlSerializer::new()
                .with_prefix("xmlfoo", "http://example.com/a/")
                .map_err(io::Error::other)?
                .with_prefix("rdf", "http://example.com/b/")
                .map_err(io::Error::other)?,
            &[],
        )?;
        assert_eq!(
            output,
            "<?xml version=\"1.0\" encoding=\"UTF-8\"?><rdf:RDF xmlns:rdf=\"http://www.w3.org/1999/02/22-rdf-syntax-ns#\"></rdf:RDF>"
        );
        Ok(())
    }

    #[test]
    fn test_unwritable_statements() {
        let mut writer = RdfXmlSerializer::new().for_writer(Vec::new());
        let error = writer
            .serialize_quad(&Quad::new(ex("s"), ex("p"), ex("o"), ex("g")))
            .unwrap_err();
        assert_eq!(error.kind(), io::ErrorKind::InvalidInput);
        let error = writer
            .serialize_triple(&Triple::new(ex("s"), ex("p"), Variable::new_unchecked("v")))
            .unwrap_err();
        assert_eq!(error.kind(), io::ErrorKind::InvalidInput);
        let error = writer
            .serialize_triple(&Triple::new(
                ex("s"),
                NamedNode::new_unchecked("http://example.com/1"),
                ex("o"),
            ))
            .unwrap_err();
        assert_eq!(error.kind(), io::ErrorKind::InvalidInput);
    }
}
