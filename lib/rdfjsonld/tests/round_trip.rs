//! Datasets written in every shape and read back.

use rdfjsonld::{JsonLdParser, JsonLdSerializer, JsonLdShape};
use rdfterm::vocab::{rdf, xsd};
use rdfterm::{BlankNode, GraphName, Literal, NamedNode, Quad, Subject, Term};

fn ex(name: &str) -> NamedNode {
    NamedNode::new_unchecked(format!("http://example.com/{name}"))
}

fn dataset() -> Vec<Quad> {
    vec![
        Quad::new(ex("alice"), rdf::TYPE, ex("Person"), GraphName::DefaultGraph),
        Quad::new(
            ex("alice"),
            ex("name"),
            Literal::new_language_tagged_literal_unchecked("Alice", "en"),
            GraphName::DefaultGraph,
        ),
        Quad::new(
            ex("alice"),
            ex("age"),
            Literal::new_typed_literal("42", xsd::INTEGER),
            GraphName::DefaultGraph,
        ),
        Quad::new(
            ex("alice"),
            ex("height"),
            Literal::new_typed_literal("1.70", xsd::DECIMAL),
            GraphName::DefaultGraph,
        ),
        Quad::new(
            ex("alice"),
            ex("member"),
            Literal::new_typed_literal("true", xsd::BOOLEAN),
            GraphName::DefaultGraph,
        ),
        Quad::new(ex("bob"), ex("knows"), ex("alice"), ex("graph")),
        Quad::new(
            ex("bob"),
            ex("note"),
            Literal::new_simple_literal("line\n\"quoted\""),
            ex("graph"),
        ),
    ]
}

fn sorted(mut quads: Vec<Quad>) -> Vec<Quad> {
    quads.sort_by_key(ToString::to_string);
    quads
}

fn write(serializer: JsonLdSerializer, quads: &[Quad]) -> Vec<u8> {
    let mut writer = serializer.for_writer(Vec::new());
    for quad in quads {
        writer.serialize_quad(quad).unwrap();
    }
    writer.finish().unwrap()
}

fn read(data: &[u8]) -> Vec<Quad> {
    JsonLdParser::new()
        .for_reader(data)
        .collect::<Result<Vec<_>, _>>()
        .unwrap()
}

#[test]
fn test_every_shape_round_trips() {
    for shape in [JsonLdShape::Default, JsonLdShape::Flattened, JsonLdShape::Framed] {
        for pretty in [false, true] {
            let mut serializer = JsonLdSerializer::new()
                .with_prefix("ex", "http://example.com/")
                .unwrap()
                .with_prefix("xsd", "http://www.w3.org/2001/XMLSchema#")
                .unwrap()
                .with_shape(shape);
            if pretty {
                serializer = serializer.pretty();
            }
            let output = write(serializer, &dataset());
            assert_eq!(
                sorted(read(&output)),
                sorted(dataset()),
                "{shape:?} {}",
                String::from_utf8_lossy(&output)
            );
        }
    }
}

#[test]
fn test_vocab_round_trips() {
    let output = write(
        JsonLdSerializer::new().with_prefix("", "http://example.com/").unwrap(),
        &dataset(),
    );
    assert_eq!(sorted(read(&output)), sorted(dataset()));
}

#[test]
fn test_framed_blank_nodes_keep_their_structure() {
    let address = BlankNode::default();
    let shared = BlankNode::default();
    let quads = [
        Quad::new(ex("alice"), ex("address"), address.clone(), GraphName::DefaultGraph),
        Quad::new(address, ex("city"), ex("Paris"), GraphName::DefaultGraph),
        Quad::new(ex("alice"), ex("likes"), shared.clone(), GraphName::DefaultGraph),
        Quad::new(ex("bob"), ex("likes"), shared.clone(), GraphName::DefaultGraph),
        Quad::new(shared, ex("name"), Literal::new_simple_literal("Tea"), GraphName::DefaultGraph),
    ];
    let output = write(
        JsonLdSerializer::new().with_shape(JsonLdShape::Framed),
        &quads,
    );
    let parsed = read(&output);
    assert_eq!(parsed.len(), quads.len());

    let object_of = |subject: &Subject, predicate: &NamedNode| {
        parsed
            .iter()
            .find(|q| q.subject == *subject && q.predicate == predicate.as_ref())
            .map(|q| q.object.clone())
            .unwrap()
    };
    let Term::BlankNode(address) = object_of(&ex("alice").into(), &ex("address")) else {
        panic!("the address must be a blank node")
    };
    assert_eq!(
        object_of(&address.into(), &ex("city")),
        Term::from(ex("Paris"))
    );
    assert_eq!(
        object_of(&ex("alice").into(), &ex("likes")),
        object_of(&ex("bob").into(), &ex("likes"))
    );
}

#[test]
fn test_empty_dataset() {
    for shape in [JsonLdShape::Default, JsonLdShape::Flattened, JsonLdShape::Framed] {
        let output = write(JsonLdSerializer::new().with_shape(shape), &[]);
        assert!(read(&output).is_empty());
    }
}
