//! Resource bounds of the Turtle family parsers.
//!
//! Maliciously nested documents must be rejected with an error instead of exhausting the stack
//! or the memory.

use rdfttl::{N3Parser, TriGParser, TurtleParser};
use std::io::Cursor;

fn nested_collections(depth: usize) -> String {
    let mut turtle = String::from("@prefix : <http://example.org/> .\n:s :p ");
    for _ in 0..depth {
        turtle.push_str("( ");
    }
    turtle.push_str(":value ");
    for _ in 0..depth {
        turtle.push_str(") ");
    }
    turtle.push('.');
    turtle
}

fn nested_blank_nodes(depth: usize) -> String {
    let mut turtle = String::from("@prefix : <http://example.org/> .\n:s :p ");
    for _ in 0..depth {
        turtle.push_str("[ :p ");
    }
    turtle.push_str(":value ");
    for _ in 0..depth {
        turtle.push_str("] ");
    }
    turtle.push('.');
    turtle
}

fn nested_formulas(depth: usize) -> String {
    let mut n3 = String::from("@prefix : <http://example.org/> .\n:s :p ");
    for _ in 0..depth {
        n3.push_str("{ :s :p ");
    }
    n3.push_str(":value ");
    for _ in 0..depth {
        n3.push_str("} ");
    }
    n3.push('.');
    n3
}

#[test]
fn test_deeply_nested_collections_are_rejected() {
    let error = TurtleParser::new()
        .for_slice(&nested_collections(10_000))
        .find_map(Result::err)
        .unwrap();
    assert!(
        error.message().contains("nesting depth"),
        "Expected nesting depth error, got: {error}"
    );
}

#[test]
fn test_deeply_nested_blank_nodes_are_rejected() {
    let error = TriGParser::new()
        .for_slice(&nested_blank_nodes(10_000))
        .find_map(Result::err)
        .unwrap();
    assert!(
        error.message().contains("nesting depth"),
        "Expected nesting depth error, got: {error}"
    );
}

#[test]
fn test_deeply_nested_formulas_are_rejected() {
    let error = N3Parser::new()
        .for_slice(&nested_formulas(10_000))
        .find_map(Result::err)
        .unwrap();
    assert!(
        error.message().contains("nesting depth"),
        "Expected nesting depth error, got: {error}"
    );
}

#[test]
fn test_moderate_nesting_is_allowed() {
    let count = TurtleParser::new()
        .for_slice(&nested_collections(50))
        .collect::<Result<Vec<_>, _>>()
        .unwrap()
        .len();
    // Every level has a rdf:first and a rdf:rest statement
    assert_eq!(count, 1 + 50 * 2);
}

#[test]
fn test_reader_input_is_streamed() {
    // A document far bigger than the parser buffer
    let mut turtle = String::from("@prefix : <http://example.org/> .\n");
    for i in 0..20_000 {
        turtle.push_str(&format!(":s{i} :p \"{i}\" .\n"));
    }
    let mut parser = TurtleParser::new().for_reader(Cursor::new(turtle.into_bytes()));
    let first = parser.next().unwrap().unwrap();
    assert_eq!(first.subject.to_string(), "<http://example.org/s0>");
    assert_eq!(parser.count(), 19_999);
}
