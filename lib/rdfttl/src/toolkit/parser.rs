use crate::toolkit::error::{TurtleParseError, TurtleSyntaxError};
use crate::toolkit::lexer::{Lexeme, Lexer, Tokenizer};
use rdfterm::UnknownPrefixError;
use std::io::Read;
use std::ops::Deref;

/// A push-down grammar consuming lexemes one at a time.
///
/// The grammar is moved in and out on each lexeme so that states can be plain enums.
pub trait Grammar: Sized {
    type Tokenizer: Tokenizer;
    type Output;
    type Context;

    /// The state to continue from after a tokenizer error.
    fn recover(self) -> Self;

    fn on_token(
        self,
        token: Lexeme<<Self::Tokenizer as Tokenizer>::Token<'_>>,
        context: &mut Self::Context,
        results: &mut Vec<Self::Output>,
        errors: &mut Vec<GrammarError>,
    ) -> Self;

    fn on_end(
        self,
        context: &mut Self::Context,
        results: &mut Vec<Self::Output>,
        errors: &mut Vec<GrammarError>,
    );

    fn tokenizer_options(context: &Self::Context) -> &<Self::Tokenizer as Tokenizer>::Options;
}

/// An error raised by a [`Grammar`].
///
/// `TOKEN` in the message is substituted with the text of the current token.
pub struct GrammarError {
    pub message: String,
    pub unknown_prefix: Option<String>,
    /// Located at the end of the token before the current one instead of at the current one.
    pub after_previous_token: bool,
}

impl GrammarError {
    /// A statement that is not closed by its terminator.
    ///
    /// It is only noticed on the token after the statement or at the end of the file,
    /// so it is located at the end of the last token of the statement.
    pub fn missing_terminator(message: impl Into<String>) -> Self {
        let message: String = message.into();
        Self {
            after_previous_token: true,
            ..message.into()
        }
    }
}

impl From<String> for GrammarError {
    fn from(message: String) -> Self {
        Self {
            message,
            unknown_prefix: None,
            after_previous_token: false,
        }
    }
}

impl From<&str> for GrammarError {
    fn from(message: &str) -> Self {
        message.to_owned().into()
    }
}

impl From<UnknownPrefixError> for GrammarError {
    fn from(error: UnknownPrefixError) -> Self {
        Self {
            unknown_prefix: Some(error.prefix().to_owned()),
            ..error.to_string().into()
        }
    }
}

/// Feeds a [`Grammar`] with the lexemes of a [`Lexer`].
///
/// Outputs and errors are buffered by the grammar then handed out one by one, errors first.
#[expect(clippy::partial_pub_fields)]
pub struct GrammarParser<B, G: Grammar> {
    lexer: Lexer<B, G::Tokenizer>,
    /// `None` once the end of the input has been handled
    grammar: Option<G>,
    pub context: G::Context,
    outputs: Vec<G::Output>,
    errors: Vec<GrammarError>,
}

impl<B, G: Grammar> GrammarParser<B, G> {
    pub fn new(lexer: Lexer<B, G::Tokenizer>, grammar: G, context: G::Context) -> Self {
        Self {
            lexer,
            grammar: Some(grammar),
            context,
            outputs: Vec::new(),
            errors: Vec::new(),
        }
    }
}

impl<B: Deref<Target = [u8]>, G: Grammar> GrammarParser<B, G> {
    fn is_done(&self) -> bool {
        self.grammar.is_none() && self.outputs.is_empty() && self.errors.is_empty()
    }

    /// Returns `None` if more input is needed or if the parsing is done.
    pub fn parse_next(&mut self) -> Option<Result<G::Output, TurtleSyntaxError>> {
        loop {
            if let Some(error) = self.errors.pop() {
                let message = error.message.replace("TOKEN", &self.lexer.token_source());
                let location = if error.after_previous_token {
                    // once the input is over, there is no current token to look behind
                    let end = if self.grammar.is_some() {
                        self.lexer.previous_token_end()
                    } else {
                        self.lexer.last_token_end()
                    };
                    end..end
                } else {
                    self.lexer.token_location()
                };
                return Some(Err(TurtleSyntaxError::new(location, message)
                    .with_unknown_prefix(error.unknown_prefix)));
            }
            if let Some(output) = self.outputs.pop() {
                return Some(Ok(output));
            }
            if let Some(lexeme) = self.lexer.next_lexeme(G::tokenizer_options(&self.context)) {
                match lexeme {
                    Ok(lexeme) => {
                        let grammar = self.grammar.take()?;
                        self.grammar = Some(grammar.on_token(
                            lexeme,
                            &mut self.context,
                            &mut self.outputs,
                            &mut self.errors,
                        ));
                        continue;
                    }
                    Err(error) => {
                        self.grammar = self.grammar.take().map(G::recover);
                        return Some(Err(error));
                    }
                }
            }
            if !self.lexer.is_finished() {
                return None;
            }
            self.grammar
                .take()?
                .on_end(&mut self.context, &mut self.outputs, &mut self.errors);
        }
    }
}

impl<G: Grammar> GrammarParser<Vec<u8>, G> {
    pub fn for_reader<R: Read>(self, reader: R) -> ReaderDriver<R, G> {
        ReaderDriver {
            reader,
            parser: self,
        }
    }
}

impl<'a, G: Grammar> IntoIterator for GrammarParser<&'a [u8], G> {
    type Item = Result<G::Output, TurtleSyntaxError>;
    type IntoIter = SliceDriver<'a, G>;

    fn into_iter(self) -> SliceDriver<'a, G> {
        SliceDriver { parser: self }
    }
}

/// Pulls data from a [`Read`] implementation whenever the parser needs more.
#[expect(clippy::partial_pub_fields)]
pub struct ReaderDriver<R: Read, G: Grammar> {
    reader: R,
    pub parser: GrammarParser<Vec<u8>, G>,
}

impl<R: Read, G: Grammar> Iterator for ReaderDriver<R, G> {
    type Item = Result<G::Output, TurtleParseError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if self.parser.is_done() {
                return None;
            }
            if let Some(result) = self.parser.parse_next() {
                return Some(result.map_err(Into::into));
            }
            if let Err(error) = self.parser.lexer.read_more(&mut self.reader) {
                return Some(Err(error.into()));
            }
        }
    }
}

pub struct SliceDriver<'a, G: Grammar> {
    pub parser: GrammarParser<&'a [u8], G>,
}

impl<G: Grammar> Iterator for SliceDriver<'_, G> {
    type Item = Result<G::Output, TurtleSyntaxError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.parser.parse_next()
    }
}
