//! Whole documents read by the parser and written back by the serializer.

use rdfterm::vocab::rdf;
use rdfterm::{Literal, NamedNode, Subject, Term, Triple};
use rdfxml::{RdfXmlParser, RdfXmlSerializer};

fn ex(name: &str) -> NamedNode {
    NamedNode::new_unchecked(format!("http://example.com/{name}"))
}

fn sorted(mut triples: Vec<Triple>) -> Vec<Triple> {
    triples.sort_by_key(ToString::to_string);
    triples
}

#[test]
fn test_collection() {
    let file = r#"<rdf:RDF xmlns:rdf="http://www.w3.org/1999/02/22-rdf-syntax-ns#" xmlns:ex="http://example.com/">
        <rdf:Description rdf:about="http://example.com/s">
            <ex:list rdf:parseType="Collection">
                <rdf:Description rdf:about="http://example.com/a"/>
                <rdf:Description rdf:about="http://example.com/b"/>
            </ex:list>
        </rdf:Description>
    </rdf:RDF>"#;
    let triples = RdfXmlParser::new()
        .for_slice(file)
        .collect::<Result<Vec<_>, _>>()
        .unwrap();
    let head = triples
        .iter()
        .find(|t| t.predicate == ex("list").as_ref())
        .unwrap();
    let Term::BlankNode(head) = &head.object else {
        panic!("the list head must be a blank node")
    };
    let first = triples
        .iter()
        .find(|t| t.subject == Subject::from(head.clone()) && t.predicate == rdf::FIRST)
        .unwrap();
    assert_eq!(first.object, Term::from(ex("a")));
    assert_eq!(
        triples
            .iter()
            .filter(|t| t.object == rdf::NIL)
            .count(),
        1
    );
}

#[test]
fn test_nested_xml_base() {
    let file = r#"<rdf:RDF xmlns:rdf="http://www.w3.org/1999/02/22-rdf-syntax-ns#" xmlns:ex="http://example.com/" xml:base="http://example.com/dir/">
        <rdf:Description rdf:about="a">
            <ex:p rdf:resource="../b"/>
        </rdf:Description>
        <rdf:Description rdf:about="c" xml:base="sub/">
            <ex:p rdf:resource="d"/>
        </rdf:Description>
    </rdf:RDF>"#;
    let triples = RdfXmlParser::new()
        .for_slice(file)
        .collect::<Result<Vec<_>, _>>()
        .unwrap();
    assert_eq!(
        triples,
        [
            Triple::new(
                NamedNode::new_unchecked("http://example.com/dir/a"),
                ex("p"),
                ex("b")
            ),
            Triple::new(
                NamedNode::new_unchecked("http://example.com/dir/sub/c"),
                ex("p"),
                NamedNode::new_unchecked("http://example.com/dir/sub/d"),
            ),
        ]
    );
}

#[test]
fn test_base_iri_given_to_the_parser() {
    let file = r#"<rdf:RDF xmlns:rdf="http://www.w3.org/1999/02/22-rdf-syntax-ns#" xmlns:ex="http://example.com/">
        <rdf:Description rdf:about="s"><ex:p>o</ex:p></rdf:Description>
    </rdf:RDF>"#;
    let triples = RdfXmlParser::new()
        .with_base_iri("http://example.org/")
        .unwrap()
        .for_reader(file.as_bytes())
        .collect::<Result<Vec<_>, _>>()
        .unwrap();
    assert_eq!(
        triples[0].subject,
        Subject::from(NamedNode::new_unchecked("http://example.org/s"))
    );
}

#[test]
fn test_escaped_literals_round_trip() {
    let triples = vec![
        Triple::new(
            ex("s"),
            ex("text"),
            Literal::new_simple_literal("<tag> & \"quotes\" 'apostrophes'"),
        ),
        Triple::new(
            ex("s"),
            ex("label"),
            Literal::new_language_tagged_literal_unchecked("été", "fr"),
        ),
        Triple::new(
            ex("s"),
            ex("when"),
            Literal::new_typed_literal("2024-01-01", rdfterm::vocab::xsd::DATE),
        ),
    ];
    for serializer in [RdfXmlSerializer::new(), RdfXmlSerializer::new().pretty()] {
        let mut writer = serializer
            .with_prefix("ex", "http://example.com/")
            .unwrap()
            .for_writer(Vec::new());
        for triple in &triples {
            writer.serialize_triple(triple).unwrap();
        }
        let output = writer.finish().unwrap();
        let parsed = RdfXmlParser::new()
            .for_slice(&output)
            .collect::<Result<Vec<_>, _>>()
            .unwrap();
        assert_eq!(sorted(parsed), sorted(triples.clone()));
    }
}

#[test]
fn test_invalid_documents() {
    for file in [
        // Text where a node element is expected
        r#"<rdf:RDF xmlns:rdf="http://www.w3.org/1999/02/22-rdf-syntax-ns#">foo</rdf:RDF>"#,
        // Unknown namespace prefix
        r#"<rdf:RDF xmlns:rdf="http://www.w3.org/1999/02/22-rdf-syntax-ns#"><ex:s/></rdf:RDF>"#,
        // Both rdf:about and rdf:nodeID
        r#"<rdf:RDF xmlns:rdf="http://www.w3.org/1999/02/22-rdf-syntax-ns#"><rdf:Description rdf:about="http://example.com/s" rdf:nodeID="n"/></rdf:RDF>"#,
        // Unclosed root element
        r#"<rdf:RDF xmlns:rdf="http://www.w3.org/1999/02/22-rdf-syntax-ns#">"#,
    ] {
        assert!(
            RdfXmlParser::new().for_slice(file).any(|r| r.is_err()),
            "{file} should be rejected"
        );
    }
}
