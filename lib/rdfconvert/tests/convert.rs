//! End to end conversions through the public pipeline.

use rdfconvert::{
    ConvertError, ConvertOptions, FormatRegistry, InputSource, JsonLdShape, OutputSink, RdfFormat,
    RdfParser, convert,
};
use rdfterm::{BlankNodeRelabeler, PrefixTable, Quad, Subject, Term};
use std::collections::HashSet;
use std::fs;
use std::io::Cursor;

const GRAPH: &str = r#"<http://example.com/s> <http://example.com/p> "hello"@en .
<http://example.com/s> <http://www.w3.org/1999/02/22-rdf-syntax-ns#type> <http://example.com/Person> .
<http://example.com/s> <http://example.com/age> "42"^^<http://www.w3.org/2001/XMLSchema#integer> .
<http://example.com/s> <http://example.com/note> "line\nbreak & <tag>" .
<http://example.com/s> <http://example.com/knows> _:friend .
_:friend <http://example.com/name> "Bob" .
"#;

fn convert_to_string(
    input: &str,
    input_format: RdfFormat,
    output_format: RdfFormat,
    options: &ConvertOptions,
) -> Result<String, ConvertError> {
    let file = tempfile::NamedTempFile::new().map_err(ConvertError::Io)?;
    convert(
        InputSource::Reader(Box::new(Cursor::new(input.to_owned()))),
        input_format.media_type(),
        OutputSink::File(file.path().into()),
        output_format.media_type(),
        options,
    )?;
    fs::read_to_string(file.path()).map_err(ConvertError::Io)
}

/// Statements with blank node labels erased, sorted.
///
/// The test data has at most one blank node so this is a faithful comparison.
fn normalized(format: RdfFormat, data: &str) -> Vec<String> {
    let mut statements = RdfParser::from_format(format)
        .for_reader(data.as_bytes())
        .map(|quad| {
            let quad = quad.unwrap();
            let subject = match &quad.subject {
                Subject::BlankNode(_) => "_:x".to_owned(),
                subject => subject.to_string(),
            };
            let object = match &quad.object {
                Term::BlankNode(_) => "_:x".to_owned(),
                object => object.to_string(),
            };
            format!("{subject} {} {object} {}", quad.predicate, quad.graph_name)
        })
        .collect::<Vec<_>>();
    statements.sort();
    statements
}

fn writable_formats() -> Vec<RdfFormat> {
    FormatRegistry::global()
        .formats()
        .filter(|descriptor| descriptor.can_serialize)
        .map(|descriptor| descriptor.format)
        .collect()
}

#[test]
fn test_every_format_pair_round_trips() -> Result<(), ConvertError> {
    let expected = normalized(RdfFormat::NTriples, GRAPH);
    let prefixes = [
        ("ex", "http://example.com/"),
        ("xsd", "http://www.w3.org/2001/XMLSchema#"),
    ]
    .into_iter()
    .collect::<PrefixTable>();
    for pretty in [false, true] {
        let mut options = ConvertOptions::new().with_prefixes(prefixes.clone());
        if pretty {
            options = options.pretty();
        }
        for first in writable_formats() {
            let a = convert_to_string(GRAPH, RdfFormat::NTriples, first, &options)?;
            for second in writable_formats() {
                let b = convert_to_string(&a, first, second, &options)?;
                assert_eq!(
                    normalized(second, &b),
                    expected,
                    "{first} -> {second} (pretty: {pretty})\n{a}\n{b}"
                );
            }
        }
    }
    Ok(())
}

#[test]
fn test_json_ld_shapes_round_trip() -> Result<(), ConvertError> {
    let expected = normalized(RdfFormat::NTriples, GRAPH);
    for shape in [JsonLdShape::Default, JsonLdShape::Flattened, JsonLdShape::Framed] {
        let options = ConvertOptions::new().with_jsonld_shape(shape);
        let json = convert_to_string(GRAPH, RdfFormat::NTriples, RdfFormat::JsonLd, &options)?;
        assert_eq!(normalized(RdfFormat::JsonLd, &json), expected, "{json}");
    }
    Ok(())
}

#[test]
fn test_language_tagged_literal_through_json_ld() -> Result<(), ConvertError> {
    let input = "<a:s> <a:p> \"hello\"@en .";
    let options = ConvertOptions::new();
    let json = convert_to_string(input, RdfFormat::Turtle, RdfFormat::JsonLd, &options)?;
    let turtle = convert_to_string(&json, RdfFormat::JsonLd, RdfFormat::Turtle, &options)?;
    assert_eq!(
        normalized(RdfFormat::Turtle, &turtle),
        normalized(RdfFormat::Turtle, input)
    );
    Ok(())
}

#[test]
fn test_empty_input_gives_empty_document() -> Result<(), ConvertError> {
    let registry = FormatRegistry::global();
    for input in registry.formats() {
        for output in writable_formats() {
            let document = convert_to_string("", input.format, output, &ConvertOptions::new())?;
            assert!(
                normalized(output, &document).is_empty(),
                "{} -> {output}: {document}",
                input.format
            );
        }
    }
    Ok(())
}

#[test]
fn test_named_graphs_become_trig_blocks() -> Result<(), ConvertError> {
    let input = "<http://example.com/s1> <http://example.com/p> \"a\" <http://example.com/g1> .\n\
                 <http://example.com/s2> <http://example.com/p> \"b\" <http://example.com/g1> .\n\
                 <http://example.com/s1> <http://example.com/p> \"c\" <http://example.com/g2> .\n";
    for options in [ConvertOptions::new(), ConvertOptions::new().pretty()] {
        let trig = convert_to_string(input, RdfFormat::NQuads, RdfFormat::TriG, &options)?;
        assert_eq!(trig.matches("<http://example.com/g1> {").count(), 1, "{trig}");
        assert_eq!(trig.matches("<http://example.com/g2> {").count(), 1, "{trig}");
        assert_eq!(
            normalized(RdfFormat::TriG, &trig),
            normalized(RdfFormat::NQuads, input)
        );
    }
    Ok(())
}

#[test]
fn test_turtle_error_reports_its_line() {
    let input = "@prefix ex: <http://example.com/> .\n\
                 ex:a ex:p ex:b .\n\
                 ex:b ex:p ex:c .\n\
                 ex:c ex:p ex:d .\n\
                 ex:d ex:p ex:e\n\
                 ex:e ex:p ex:f .\n";
    let Err(ConvertError::Parse(error)) = convert_to_string(
        input,
        RdfFormat::Turtle,
        RdfFormat::NTriples,
        &ConvertOptions::new(),
    ) else {
        panic!("a syntax error is expected")
    };
    assert_eq!(error.location().map(|l| l.start.line), Some(4));
    assert!(error.to_string().contains("line 5"), "{error}");
}

#[test]
fn test_undeclared_prefix() {
    let result = convert_to_string(
        "foaf:me foaf:name \"Me\" .",
        RdfFormat::Turtle,
        RdfFormat::NTriples,
        &ConvertOptions::new(),
    );
    let Err(ConvertError::UnknownPrefix(error)) = result else {
        panic!("an unknown prefix error is expected, got {result:?}")
    };
    assert_eq!(error.unknown_prefix(), Some("foaf"));
}

#[test]
fn test_output_prefixes_are_not_taken_from_the_input() -> Result<(), ConvertError> {
    let input = "@prefix foo: <http://example.com/> . foo:s foo:p foo:o .";
    let output = convert_to_string(
        input,
        RdfFormat::Turtle,
        RdfFormat::Turtle,
        &ConvertOptions::new(),
    )?;
    assert_eq!(
        output,
        "<http://example.com/s> <http://example.com/p> <http://example.com/o> .\n"
    );
    let output = convert_to_string(
        input,
        RdfFormat::Turtle,
        RdfFormat::Turtle,
        &ConvertOptions::new().with_prefixes([("ex", "http://example.com/")].into_iter().collect()),
    )?;
    assert_eq!(output, "@prefix ex: <http://example.com/> .\nex:s ex:p ex:o .\n");
    Ok(())
}

#[test]
fn test_html_input() -> Result<(), ConvertError> {
    let html = r#"<!DOCTYPE html>
<html prefix="og: http://ogp.me/ns#">
<head><title>The Rock</title><meta property="og:title" content="The Rock"></head>
<body><p>Some text<br>with a void element</body>
</html>"#;
    let output = convert_to_string(
        html,
        RdfFormat::Html,
        RdfFormat::NTriples,
        &ConvertOptions::new().with_base_iri("http://www.imdb.com/title/tt0117500/"),
    )?;
    assert_eq!(
        output,
        "<http://www.imdb.com/title/tt0117500/> <http://ogp.me/ns#title> \"The Rock\" .\n"
    );
    Ok(())
}

#[test]
fn test_file_to_file() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    let input = dir.path().join("input.nq");
    let output = dir.path().join("output.jsonld");
    fs::write(&input, GRAPH)?;
    let report = convert(
        InputSource::File(input.clone()),
        rdfconvert::guess_format("input.nq").ok_or("unknown extension")?,
        OutputSink::File(output.clone()),
        rdfconvert::guess_format("output.jsonld").ok_or("unknown extension")?,
        &ConvertOptions::new().pretty(),
    )?;
    assert_eq!(report.statements, 6);
    assert_eq!(
        normalized(RdfFormat::JsonLd, &fs::read_to_string(output)?),
        normalized(RdfFormat::NQuads, GRAPH)
    );
    Ok(())
}

#[test]
fn test_large_input_is_streamed() -> Result<(), ConvertError> {
    let mut input = String::new();
    for i in 0..20_000 {
        input.push_str(&format!(
            "<http://example.com/s{i}> <http://example.com/p> \"{i}\" .\n"
        ));
    }
    let output = convert_to_string(
        &input,
        RdfFormat::NTriples,
        RdfFormat::Turtle,
        &ConvertOptions::new().pretty(),
    )?;
    assert_eq!(output.matches(" .\n").count(), 20_000);
    Ok(())
}

#[test]
fn test_many_blank_nodes_keep_distinct_labels() -> Result<(), ConvertError> {
    let count = BlankNodeRelabeler::DEFAULT_CAPACITY + 1_000;
    let mut input = String::new();
    for i in 0..count {
        input.push_str(&format!("_:n{i} <http://example.com/p> _:n{i} .\n"));
    }
    let output =
        convert_to_string(&input, RdfFormat::NTriples, RdfFormat::NTriples, &ConvertOptions::new())?;
    let labels = output
        .lines()
        .map(|line| {
            let (subject, rest) = line.split_once(' ').unwrap_or_default();
            assert!(rest.ends_with(&format!(" {subject} .")), "{line}");
            subject
        })
        .collect::<HashSet<_>>();
    assert_eq!(labels.len(), count);
    assert!(labels.contains("_:b0"));
    assert_eq!(labels.iter().filter(|l| l.starts_with("_:b_")).count(), 1_000);
    Ok(())
}

#[test]
fn test_lang_string_without_language_is_a_parse_error() {
    let inputs = [
        (
            RdfFormat::JsonLd,
            r#"{"@id": "http://example.com/s", "http://example.com/p": {"@value": "x", "@type": "http://www.w3.org/1999/02/22-rdf-syntax-ns#langString"}}"#,
        ),
        (
            RdfFormat::RdfXml,
            r#"<rdf:RDF xmlns:rdf="http://www.w3.org/1999/02/22-rdf-syntax-ns#"><rdf:Description rdf:about="http://example.com/s"><p xmlns="http://example.com/" rdf:datatype="http://www.w3.org/1999/02/22-rdf-syntax-ns#langString">x</p></rdf:Description></rdf:RDF>"#,
        ),
        (
            RdfFormat::Html,
            r#"<p about="http://example.com/s" property="http://example.com/p" datatype="rdf:langString">x</p>"#,
        ),
        (
            RdfFormat::NTriples,
            "<http://example.com/s> <http://example.com/p> \"x\"^^<http://www.w3.org/1999/02/22-rdf-syntax-ns#langString> .\n",
        ),
    ];
    for (format, input) in inputs {
        let result = convert_to_string(input, format, RdfFormat::NTriples, &ConvertOptions::new());
        assert!(
            matches!(result, Err(ConvertError::Parse(_))),
            "{format}: {result:?}"
        );
    }
}

#[test]
fn test_statements_keep_their_order() -> Result<(), ConvertError> {
    let input = "<http://example.com/b> <http://example.com/p> \"1\" .\n\
                 <http://example.com/a> <http://example.com/p> \"2\" .\n\
                 <http://example.com/c> <http://example.com/p> \"3\" .\n";
    let output =
        convert_to_string(input, RdfFormat::NTriples, RdfFormat::NQuads, &ConvertOptions::new())?;
    assert_eq!(output, input);
    let parsed = RdfParser::from_format(RdfFormat::NQuads)
        .for_reader(output.as_bytes())
        .collect::<Result<Vec<Quad>, _>>()
        .map_err(ConvertError::from)?;
    assert_eq!(parsed.len(), 3);
    Ok(())
}
