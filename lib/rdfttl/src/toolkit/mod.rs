//! Incremental tokenizer and grammar driver shared by the Turtle family parsers.
//!
//! The grammars are fed one lexeme at a time so that documents can be read chunk by chunk.

mod error;
mod lexer;
mod parser;

pub use self::error::{TextPosition, TurtleParseError, TurtleSyntaxError};
pub use self::lexer::{Lexeme, Lexer, LexerConfig, Tokenizer, TokenizerError};
pub use self::parser::{Grammar, GrammarError, GrammarParser, ReaderDriver, SliceDriver};
