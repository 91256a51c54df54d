//! Syntax errors must point to the faulty place of the document.

use rdfttl::{N3Parser, NQuadsParser, NTriplesParser, TriGParser, TurtleParser};

#[test]
fn test_missing_dot_reports_its_line() {
    let turtle = "@prefix ex: <http://example.com/> .\n\
                  ex:a ex:p ex:b .\n\
                  ex:b ex:p ex:c .\n\
                  ex:c ex:p ex:d .\n\
                  ex:d ex:p ex:e ex:e ex:p ex:f .\n";
    let error = TurtleParser::new()
        .for_slice(turtle)
        .find_map(Result::err)
        .unwrap();
    // Lines are zero-based in positions and one-based when displayed
    assert_eq!(error.location().start.line, 4);
    assert!(
        error.to_string().starts_with("Syntax error at line 5"),
        "{error}"
    );
}

const UNTERMINATED_LINE_5: &str = "@prefix ex: <http://example.com/> .\n\
                                   ex:a ex:p ex:b .\n\
                                   ex:b ex:p ex:c .\n\
                                   ex:c ex:p ex:d .\n\
                                   ex:a ex:b ex:f\n";

#[test]
fn test_missing_dot_before_next_line_reports_unterminated_line() {
    let turtle = format!("{UNTERMINATED_LINE_5}ex:g ex:h ex:i .\n");
    let errors = [
        TurtleParser::new().for_slice(&turtle).find_map(Result::err),
        TriGParser::new().for_slice(&turtle).find_map(Result::err),
        N3Parser::new().for_slice(&turtle).find_map(Result::err),
    ];
    for error in errors {
        let error = error.unwrap();
        assert_eq!(error.location().start.line, 4, "{error}");
        assert_eq!(error.location().start.column, 14, "{error}");
        assert!(
            error.to_string().starts_with("Syntax error at line 5 column 15"),
            "{error}"
        );
    }
}

#[test]
fn test_missing_dot_before_end_of_file_reports_unterminated_line() {
    let errors = [
        TurtleParser::new()
            .for_slice(UNTERMINATED_LINE_5)
            .find_map(Result::err),
        TriGParser::new()
            .for_slice(UNTERMINATED_LINE_5)
            .find_map(Result::err),
        N3Parser::new()
            .for_slice(UNTERMINATED_LINE_5)
            .find_map(Result::err),
        TurtleParser::new()
            .for_reader(UNTERMINATED_LINE_5.as_bytes())
            .find_map(Result::err)
            .map(|e| match e {
                rdfttl::TurtleParseError::Syntax(e) => e,
                rdfttl::TurtleParseError::Io(e) => panic!("{e}"),
            }),
    ];
    for error in errors {
        let error = error.unwrap();
        assert_eq!(error.location().start.line, 4, "{error}");
        assert!(error.to_string().starts_with("Syntax error at line 5"), "{error}");
    }
}

#[test]
fn test_ntriples_missing_dot_reports_its_line() {
    let ntriples = "<http://example.com/a> <http://example.com/p> <http://example.com/b> .\n\
                    <http://example.com/b> <http://example.com/p> <http://example.com/c>\n\
                    <http://example.com/c> <http://example.com/p> <http://example.com/d> .\n";
    let error = NTriplesParser::new()
        .for_slice(ntriples)
        .find_map(Result::err)
        .unwrap();
    assert_eq!(error.location().start.line, 1, "{error}");
}

#[test]
fn test_missing_final_dot_reports_last_line() {
    let turtle = "<http://example.com/a> <http://example.com/p> <http://example.com/b> .\n\
                  <http://example.com/b> <http://example.com/p> <http://example.com/c> .\n\
                  <http://example.com/c> <http://example.com/p> <http://example.com/d> .\n\
                  <http://example.com/d> <http://example.com/p> <http://example.com/e> .\n\
                  <http://example.com/e> <http://example.com/p> <http://example.com/f>";
    let results = TurtleParser::new().for_slice(turtle).collect::<Vec<_>>();
    let error = results.iter().find_map(|r| r.as_ref().err()).unwrap();
    assert_eq!(error.location().start.line, 4);
}

#[test]
fn test_nquads_error_column() {
    let error = NQuadsParser::new()
        .for_slice("<http://example.com/s> <http://example.com/p> \"o\"^^\"bad\" .\n")
        .find_map(Result::err)
        .unwrap();
    assert_eq!(error.location().start.line, 0);
    assert!(error.location().start.column > 0);
}

#[test]
fn test_unclosed_graph_block() {
    let error = TriGParser::new()
        .for_slice("<http://example.com/g> { <http://example.com/s> <http://example.com/p> <http://example.com/o> .")
        .find_map(Result::err)
        .unwrap();
    assert!(!error.message().is_empty());
}
