#![doc = include_str!("../README.md")]
#![doc(test(attr(deny(warnings))))]
#![cfg_attr(docsrs, feature(doc_auto_cfg))]

mod lexer;
mod line_formats;
pub mod n3;
pub mod nquads;
pub mod ntriples;
mod syntax;
mod terse;
mod terse_writer;
mod toolkit;
pub mod trig;
pub mod turtle;

pub use crate::n3::{N3Parser, N3Serializer};
pub use crate::nquads::{NQuadsParser, NQuadsSerializer};
pub use crate::ntriples::{NTriplesParser, NTriplesSerializer};
pub use crate::terse_writer::is_turtle_local_name;
pub use crate::toolkit::{TextPosition, TurtleParseError, TurtleSyntaxError};
use crate::toolkit::LexerConfig;
pub use crate::trig::{TriGParser, TriGSerializer};
pub use crate::turtle::{TurtleParser, TurtleSerializer};

/// Turtle, TriG and N3 lexing: line jumps are plain whitespace.
pub(crate) const TERSE_LEXER: LexerConfig = LexerConfig {
    min_buffer_size: 4096,
    max_buffer_size: 4096 * 4096,
    significant_line_jumps: false,
    line_comment_start: Some(b"#"),
};
/// N-Triples and N-Quads lexing: each statement ends with a line jump.
pub(crate) const LINE_LEXER: LexerConfig = LexerConfig {
    significant_line_jumps: true,
    ..TERSE_LEXER
};
/// Maximal number of nested blank node property lists, collections and formulas.
pub(crate) const MAX_NESTING_DEPTH: usize = 100;
