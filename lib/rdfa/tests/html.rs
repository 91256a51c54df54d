//! Parsing of complete HTML pages.

use rdfa::{RdfaParseError, RdfaParser};
use rdfterm::Triple;

fn parse(html: &str) -> Result<Vec<String>, RdfaParseError> {
    RdfaParser::new()
        .with_base_iri("http://example.com/page")
        .unwrap()
        .for_reader(html.as_bytes())
        .map(|t| t.map(|t: Triple| t.to_string()))
        .collect()
}

#[test]
fn test_open_graph_page() -> Result<(), RdfaParseError> {
    let page = r#"<!DOCTYPE html>
<HTML prefix="og: http://ogp.me/ns#">
<head>
  <meta charset="utf-8">
  <title>The Rock</title>
  <meta property="og:title" content="The Rock &amp; friends">
  <meta property="og:type" content="video.movie" />
  <link rel="stylesheet" href="style.css">
  <script>var x = 1 < 2;</script>
</head>
<body>
  <p>Unclosed paragraph
  <p>Another one
</body>
</html>"#;
    assert_eq!(
        parse(page)?,
        [
            "<http://example.com/page> <http://ogp.me/ns#title> \"The Rock & friends\"",
            "<http://example.com/page> <http://ogp.me/ns#type> \"video.movie\"",
        ]
    );
    Ok(())
}

#[test]
fn test_nested_resources() -> Result<(), RdfaParseError> {
    let page = r##"<html><body vocab="http://schema.org/">
<div resource="#book" typeof="Book">
  <h1 property="name">Dune</h1>
  <div property="author" typeof="Person">
    <span property="name" lang="fr">Frank Herbert</span>
  </div>
  <a rel="sameAs" href="https://en.wikipedia.org/wiki/Dune_(novel)">Wikipedia</a>
</div>
</body></html>"##;
    let triples = parse(page)?;
    assert_eq!(triples.len(), 7, "{triples:#?}");
    assert_eq!(
        triples[0],
        "<http://example.com/page> <http://www.w3.org/ns/rdfa#usesVocabulary> <http://schema.org/>"
    );
    assert!(triples.contains(
        &"<http://example.com/page#book> <http://www.w3.org/1999/02/22-rdf-syntax-ns#type> <http://schema.org/Book>"
            .to_owned()
    ));
    assert!(triples.contains(
        &"<http://example.com/page#book> <http://schema.org/name> \"Dune\"".to_owned()
    ));
    assert!(triples.contains(
        &"<http://example.com/page#book> <http://schema.org/sameAs> <https://en.wikipedia.org/wiki/Dune_(novel)>"
            .to_owned()
    ));
    let author = triples
        .iter()
        .find(|t| t.starts_with("<http://example.com/page#book> <http://schema.org/author> "))
        .and_then(|t| t.rsplit(' ').next())
        .unwrap();
    assert!(author.starts_with("_:"));
    assert!(triples.contains(&format!(
        "{author} <http://www.w3.org/1999/02/22-rdf-syntax-ns#type> <http://schema.org/Person>"
    )));
    assert!(triples.contains(&format!(
        "{author} <http://schema.org/name> \"Frank Herbert\"@fr"
    )));
    Ok(())
}

#[test]
fn test_base_element_changes_the_document_subject() -> Result<(), RdfaParseError> {
    let page = r#"<html><head><base href="http://example.org/"><title property="dc:title">T</title></head></html>"#;
    assert_eq!(
        parse(page)?,
        ["<http://example.org/> <http://purl.org/dc/terms/title> \"T\""]
    );
    Ok(())
}

#[test]
fn test_default_base_iri() -> Result<(), RdfaParseError> {
    let triples = RdfaParser::new()
        .for_slice(r#"<div about="/a" property="dc:title" content="A"></div>"#)
        .collect::<Result<Vec<_>, _>>()?;
    assert_eq!(
        triples[0].to_string(),
        "<http://example.com/a> <http://purl.org/dc/terms/title> \"A\""
    );
    Ok(())
}

#[test]
fn test_truncated_markup_is_an_error() {
    let mut parser = RdfaParser::new().for_slice(r#"<div about="/a" property="dc:title">A</div><p about="/b"#);
    assert!(parser.next().is_some_and(|r| r.is_ok()));
    assert!(matches!(parser.next(), Some(Err(RdfaParseError::Syntax(_)))));
    assert!(parser.next().is_none());
}

#[test]
fn test_no_annotation() -> Result<(), RdfaParseError> {
    assert!(parse("<html><body><p>Hello</p></body></html>")?.is_empty());
    assert!(parse("")?.is_empty());
    Ok(())
}

#[test]
fn test_lang_string_datatype_is_an_error() {
    for html in [
        r#"<p about="/a" property="dc:title" datatype="rdf:langString" content="x"></p>"#,
        r#"<p about="/a" property="dc:title" datatype="rdf:langString">x</p>"#,
    ] {
        let error = parse(html).unwrap_err();
        assert!(matches!(error, RdfaParseError::Syntax(_)));
        assert!(error.to_string().contains("without a language tag"), "{error}");
    }
}
