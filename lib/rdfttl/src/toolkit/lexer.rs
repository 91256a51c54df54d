use crate::toolkit::error::{TextPosition, TurtleSyntaxError};
use memchr::memchr2;
use std::borrow::Cow;
use std::cmp::min;
use std::io::{self, Read};
use std::ops::{Deref, Range, RangeInclusive};

/// Splits the beginning of a byte buffer into a token.
pub trait Tokenizer {
    type Token<'a>
    where
        Self: 'a;
    type Options: Default;

    /// Returns the number of consumed bytes with the token or the error.
    ///
    /// Returns `None` if more data is needed to decide, which is only allowed when `is_ending` is false.
    fn next_token<'a>(
        &mut self,
        data: &'a [u8],
        is_ending: bool,
        options: &Self::Options,
    ) -> Option<(usize, Result<Self::Token<'a>, TokenizerError>)>;
}

/// An invalid token. `location` is relative to the start of the token.
pub struct TokenizerError {
    pub location: Range<usize>,
    pub message: String,
}

impl<S: Into<String>> From<(Range<usize>, S)> for TokenizerError {
    fn from((location, message): (Range<usize>, S)) -> Self {
        Self {
            location,
            message: message.into(),
        }
    }
}

impl<S: Into<String>> From<(RangeInclusive<usize>, S)> for TokenizerError {
    fn from((location, message): (RangeInclusive<usize>, S)) -> Self {
        let (start, end) = location.into_inner();
        (start..end.saturating_add(1), message).into()
    }
}

impl<S: Into<String>> From<(usize, S)> for TokenizerError {
    fn from((location, message): (usize, S)) -> Self {
        (location..=location, message).into()
    }
}

/// What the [`Lexer`] hands to the grammar.
pub enum Lexeme<T> {
    Token(T),
    /// Only emitted by lexers with [`LexerConfig::significant_line_jumps`] set.
    LineJump,
}

#[derive(Clone, Copy)]
pub struct LexerConfig {
    pub min_buffer_size: usize,
    pub max_buffer_size: usize,
    pub significant_line_jumps: bool,
    pub line_comment_start: Option<&'static [u8]>,
}

#[derive(Clone, Copy, Default)]
struct Cursor {
    /// Index in the lexer buffer
    index: usize,
    offset: u64,
    line: u64,
    column: u64,
}

impl Cursor {
    /// Moves forward by `len` bytes of `data`, keeping track of lines and columns.
    fn advance(&mut self, data: &[u8], len: usize) {
        let end = min(self.index + len, data.len());
        for (i, byte) in data.iter().enumerate().take(end).skip(self.index) {
            match byte {
                b'\n' => {
                    self.line += 1;
                    self.column = 0;
                }
                b'\r' if data.get(i + 1) != Some(&b'\n') => {
                    self.line += 1;
                    self.column = 0;
                }
                b'\r' => (),
                // UTF-8 continuation byte
                c if c & 0xC0 == 0x80 => (),
                _ => self.column += 1,
            }
        }
        self.offset += u64::try_from(end - self.index).unwrap_or(u64::MAX);
        self.index = end;
    }

    fn advanced(mut self, data: &[u8], len: usize) -> Self {
        self.advance(data, len);
        self
    }
}

impl From<Cursor> for TextPosition {
    fn from(cursor: Cursor) -> Self {
        Self {
            line: cursor.line,
            column: cursor.column,
            offset: cursor.offset,
        }
    }
}

/// Runs a [`Tokenizer`] on a buffer that is either a complete slice or a growable `Vec` filled from a reader.
pub struct Lexer<B, T: Tokenizer> {
    tokenizer: T,
    data: B,
    cursor: Cursor,
    token_start: Cursor,
    /// End of the last token, line jumps excluded
    last_token_end: Cursor,
    /// End of the last token before the current lexeme
    previous_token_end: Cursor,
    is_ending: bool,
    config: LexerConfig,
}

impl<B, T: Tokenizer> Lexer<B, T> {
    pub fn new(tokenizer: T, data: B, is_ending: bool, config: LexerConfig) -> Self {
        Self {
            tokenizer,
            data,
            cursor: Cursor::default(),
            token_start: Cursor::default(),
            last_token_end: Cursor::default(),
            previous_token_end: Cursor::default(),
            is_ending,
            config,
        }
    }
}

impl<T: Tokenizer> Lexer<Vec<u8>, T> {
    /// Reads the next chunk of the input, dropping the already tokenized bytes first.
    pub fn read_more(&mut self, reader: &mut impl Read) -> io::Result<()> {
        self.drop_consumed();
        let max_size = self.config.max_buffer_size;
        if self.data.len() >= max_size {
            return Err(io::Error::new(
                io::ErrorKind::OutOfMemory,
                format!("A single token does not fit in the {max_size} bytes of the buffer"),
            ));
        }
        let start = self.data.len();
        let target = min(start + self.config.min_buffer_size, max_size);
        self.data.resize(target.max(self.data.capacity().min(max_size)), 0);
        let read = reader.read(&mut self.data[start..])?;
        self.data.truncate(start + read);
        self.is_ending = read == 0;
        Ok(())
    }

    fn drop_consumed(&mut self) {
        let consumed = self.token_start.index;
        if consumed == 0 {
            return;
        }
        self.data.drain(..consumed);
        self.cursor.index -= consumed;
        self.token_start.index = 0;
    }
}

impl<B: Deref<Target = [u8]>, T: Tokenizer> Lexer<B, T> {
    /// Returns `None` when more data is needed or the input is over.
    pub fn next_lexeme(
        &mut self,
        options: &T::Options,
    ) -> Option<Result<Lexeme<T::Token<'_>>, TurtleSyntaxError>> {
        if self.skip_blanks()? {
            self.token_start = self.cursor;
            let len = match self.data[self.cursor.index..] {
                [b'\r', b'\n', ..] => 2,
                [b'\r'] if !self.is_ending => return None,
                _ => 1,
            };
            self.cursor.advance(&self.data, len);
            self.previous_token_end = self.last_token_end;
            return Some(Ok(Lexeme::LineJump));
        }
        self.token_start = self.cursor;
        let rest = &self.data[self.cursor.index..];
        let Some((consumed, result)) = self.tokenizer.next_token(rest, self.is_ending, options)
        else {
            if !self.is_ending || rest.is_empty() {
                return None;
            }
            self.cursor.advance(&self.data, rest.len());
            return Some(Err(TurtleSyntaxError::new(
                self.token_location(),
                "Unexpected end of file",
            )));
        };
        debug_assert!(consumed > 0, "tokens can't be empty");
        debug_assert!(
            consumed <= rest.len(),
            "{consumed} bytes consumed out of {}",
            rest.len()
        );
        let start = self.cursor;
        self.cursor.advance(&self.data, consumed);
        self.previous_token_end = self.last_token_end;
        self.last_token_end = self.cursor;
        Some(result.map(Lexeme::Token).map_err(|e| {
            TurtleSyntaxError::new(
                start.advanced(&self.data, e.location.start).into()
                    ..start.advanced(&self.data, e.location.end).into(),
                e.message,
            )
        }))
    }

    /// The location of the last returned lexeme.
    pub fn token_location(&self) -> Range<TextPosition> {
        self.token_start.into()..self.cursor.into()
    }

    pub fn last_token_end(&self) -> TextPosition {
        self.last_token_end.into()
    }

    pub fn previous_token_end(&self) -> TextPosition {
        self.previous_token_end.into()
    }

    pub fn token_source(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.data[self.token_start.index..self.cursor.index])
    }

    pub fn is_finished(&self) -> bool {
        self.is_ending && self.cursor.index == self.data.len()
    }

    /// Skips spaces, tabs, comments and non significant line jumps.
    ///
    /// Returns `Some(true)` if it stopped on a significant line jump and `None` if more data is needed.
    fn skip_blanks(&mut self) -> Option<bool> {
        loop {
            let mut len = 0;
            for byte in &self.data[self.cursor.index..] {
                match byte {
                    b' ' | b'\t' => len += 1,
                    b'\r' | b'\n' if !self.config.significant_line_jumps => len += 1,
                    b'\r' | b'\n' => {
                        self.cursor.advance(&self.data, len);
                        return Some(true);
                    }
                    _ => break,
                }
            }
            self.cursor.advance(&self.data, len);

            let Some(comment_start) = self.config.line_comment_start else {
                return Some(false);
            };
            let rest = &self.data[self.cursor.index..];
            if !rest.starts_with(comment_start) {
                return Some(false);
            }
            if let Some(end) = memchr2(b'\r', b'\n', &rest[comment_start.len()..]) {
                let len = comment_start.len() + end;
                self.cursor.advance(&self.data, len);
            } else if self.is_ending {
                let len = rest.len();
                self.cursor.advance(&self.data, len);
                return Some(false);
            } else {
                return None;
            }
        }
    }
}
