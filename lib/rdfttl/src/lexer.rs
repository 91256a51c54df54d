use crate::toolkit::{GrammarError, Tokenizer, TokenizerError};
use memchr::{memchr, memchr2};
use oxilangtag::LanguageTag;
use oxiri::{Iri, IriRef};
use rdfterm::{NamedNode, PrefixTable, UnknownPrefixError};
use std::borrow::Cow;
use std::cmp::min;
use std::ops::Range;
use std::str;

#[derive(Debug, PartialEq, Eq)]
pub enum TerseToken<'a> {
    IriRef(String),
    PrefixedName {
        prefix: &'a str,
        local: Cow<'a, str>,
        might_be_invalid_iri: bool,
    },
    Variable(Cow<'a, str>),
    BlankNodeLabel(&'a str),
    String(String),
    LongString(String),
    Integer(&'a str),
    Decimal(&'a str),
    Double(&'a str),
    LangTag(&'a str),
    Punctuation(&'a str),
    PlainKeyword(&'a str),
}

#[derive(Eq, PartialEq, Clone, Copy)]
pub enum LexerMode {
    NTriples,
    Turtle,
    N3,
}

#[derive(Default)]
pub struct LexerOptions {
    pub base_iri: Option<Iri<String>>,
}

pub struct TerseLexer {
    mode: LexerMode,
}

impl Tokenizer for TerseLexer {
    type Token<'a> = TerseToken<'a>;
    type Options = LexerOptions;

    fn next_token<'a>(
        &mut self,
        data: &'a [u8],
        is_ending: bool,
        options: &LexerOptions,
    ) -> Option<(usize, Result<TerseToken<'a>, TokenizerError>)> {
        match *data.first()? {
            b'<' => match data.get(1) {
                Some(b'=' | b'-') if self.mode == LexerMode::N3 => {
                    // Either an IRI starting with '=' or '-' or the N3 '<=' and '<-' operators
                    let operator = if data[1] == b'=' { "<=" } else { "<-" };
                    match Self::lex_iri(data, options) {
                        Some((consumed, Ok(iri))) => Some((consumed, Ok(iri))),
                        Some((_, Err(_))) => Some((2, Ok(TerseToken::Punctuation(operator)))),
                        None if is_ending => Some((2, Ok(TerseToken::Punctuation(operator)))),
                        None => None,
                    }
                }
                Some(_) => Self::lex_iri(data, options),
                None if is_ending => Some((1, Err((0, "Unexpected end of IRI").into()))),
                None => None,
            },
            b'_' => match data.get(1)? {
                b':' => Self::lex_blank_node_label(data, is_ending),
                c => Some((
                    1,
                    Err((0, format!("Unexpected character '{}'", char::from(*c))).into()),
                )),
            },
            b'"' => {
                if self.mode != LexerMode::NTriples
                    && *data.get(1)? == b'"'
                    && *data.get(2)? == b'"'
                {
                    Self::lex_long_string(data, b'"')
                } else {
                    Self::lex_string(data, b'"')
                }
            }
            b'\'' if self.mode != LexerMode::NTriples => {
                if *data.get(1)? == b'\'' && *data.get(2)? == b'\'' {
                    Self::lex_long_string(data, b'\'')
                } else {
                    Self::lex_string(data, b'\'')
                }
            }
            b'@' => Self::lex_lang_tag(data, is_ending),
            b'.' => match data.get(1) {
                Some(b'0'..=b'9') => Self::lex_number(data, is_ending),
                Some(_) => Some((1, Ok(TerseToken::Punctuation(".")))),
                None => is_ending.then_some((1, Ok(TerseToken::Punctuation(".")))),
            },
            b'^' => {
                if *data.get(1)? == b'^' {
                    Some((2, Ok(TerseToken::Punctuation("^^"))))
                } else {
                    Some((1, Ok(TerseToken::Punctuation("^"))))
                }
            }
            b'=' => {
                if *data.get(1)? == b'>' {
                    Some((2, Ok(TerseToken::Punctuation("=>"))))
                } else {
                    Some((1, Ok(TerseToken::Punctuation("="))))
                }
            }
            c @ (b'(' | b')' | b'[' | b']' | b'{' | b'}' | b',' | b';' | b'!') => {
                Some((1, Ok(TerseToken::Punctuation(punctuation(c)))))
            }
            b'0'..=b'9' | b'+' | b'-' => Self::lex_number(data, is_ending),
            b'?' => Self::lex_variable(data, is_ending),
            _ => Self::lex_pname_or_keyword(data, is_ending),
        }
    }
}

fn punctuation(c: u8) -> &'static str {
    match c {
        b'(' => "(",
        b')' => ")",
        b'[' => "[",
        b']' => "]",
        b'{' => "{",
        b'}' => "}",
        b',' => ",",
        b';' => ";",
        _ => "!",
    }
}

impl TerseLexer {
    pub fn new(mode: LexerMode) -> Self {
        Self { mode }
    }

    fn lex_iri(
        data: &[u8],
        options: &LexerOptions,
    ) -> Option<(usize, Result<TerseToken<'static>, TokenizerError>)> {
        // [18] IRIREF  ::=  '<' ([^#x00-#x20<>"{}|^`\] | UCHAR)* '>'
        let mut string = Vec::new();
        let mut i = 1;
        loop {
            let end = memchr2(b'>', b'\\', &data[i..])?;
            string.extend_from_slice(&data[i..i + end]);
            i += end;
            if data[i] == b'>' {
                return Some((i + 1, Self::parse_iri(string, 0..i + 1, options)));
            }
            let (additional, c) = Self::lex_escape(&data[i..], i, false)?;
            i += additional + 1;
            match c {
                Ok(c) => {
                    let mut buf = [0; 4];
                    string.extend_from_slice(c.encode_utf8(&mut buf).as_bytes());
                }
                Err(e) => return Some((i, Err(e))),
            }
        }
    }

    fn parse_iri(
        iri: Vec<u8>,
        position: Range<usize>,
        options: &LexerOptions,
    ) -> Result<TerseToken<'static>, TokenizerError> {
        let iri = string_from_utf8(iri, position.clone())?;
        if iri.bytes().any(|c| matches!(c, b'\0'..=b' ' | b'<' | b'"' | b'{' | b'}' | b'|' | b'^' | b'`')) {
            return Err((position, format!("The IRI <{iri}> contains a forbidden character")).into());
        }
        Ok(TerseToken::IriRef(if let Some(base_iri) = &options.base_iri {
            base_iri
                .resolve(&iri)
                .map_err(|e| (position, e.to_string()))?
                .into_inner()
        } else {
            // Without a base IRI, relative references are kept as they are
            IriRef::parse(iri)
                .map_err(|e| (position, e.to_string()))?
                .into_inner()
        }))
    }

    fn lex_pname_or_keyword(
        data: &[u8],
        is_ending: bool,
    ) -> Option<(usize, Result<TerseToken<'_>, TokenizerError>)> {
        // [139s]  PNAME_NS   ::=  PN_PREFIX? ':'
        // [140s]  PNAME_LN   ::=  PNAME_NS PN_LOCAL
        // [167s]  PN_PREFIX  ::=  PN_CHARS_BASE ((PN_CHARS | '.')* PN_CHARS)?
        let mut i = 0;
        loop {
            let Some(r) = lex_unicode_char(&data[i..], i) else {
                if !is_ending {
                    return None;
                }
                while data[..i].ends_with(b".") {
                    i -= 1;
                }
                return Some(if i == 0 {
                    (
                        1,
                        Err((0..1, format!("Unexpected byte {}", data[0])).into()),
                    )
                } else {
                    (
                        i,
                        str_from_utf8(&data[..i], 0..i).map(TerseToken::PlainKeyword),
                    )
                });
            };
            match r {
                Ok((':', consumed)) => {
                    i += consumed;
                    break;
                }
                Ok((c, consumed)) if i == 0 => {
                    if !is_possible_pn_chars_base(c) {
                        return Some((
                            consumed,
                            Err((
                                0..consumed,
                                format!("'{c}' is not allowed at the beginning of a prefix name"),
                            )
                                .into()),
                        ));
                    }
                    i += consumed;
                }
                Ok((c, consumed)) if is_possible_pn_chars(c) || c == '.' => i += consumed,
                Ok(_) => {
                    while data[..i].ends_with(b".") {
                        i -= 1;
                    }
                    return Some((
                        i,
                        str_from_utf8(&data[..i], 0..i).map(TerseToken::PlainKeyword),
                    ));
                }
                Err(e) => return Some((e.location.end, Err(e))),
            }
        }
        let pn_prefix = match str_from_utf8(&data[..i - 1], 0..i - 1) {
            Ok(pn_prefix) => pn_prefix,
            Err(e) => return Some((i, Err(e))),
        };
        if pn_prefix.ends_with('.') {
            return Some((
                i,
                Err((
                    0..i,
                    format!(
                        "'{pn_prefix}' is not a valid prefix: prefixes are not allowed to end with '.'"
                    ),
                )
                    .into()),
            ));
        }

        let (consumed, pn_local_result) = Self::lex_optional_pn_local(&data[i..], is_ending)?;
        Some((
            consumed + i,
            pn_local_result.map(|(local, might_be_invalid_iri)| TerseToken::PrefixedName {
                prefix: pn_prefix,
                local,
                might_be_invalid_iri,
            }),
        ))
    }

    fn lex_variable(
        data: &[u8],
        is_ending: bool,
    ) -> Option<(usize, Result<TerseToken<'_>, TokenizerError>)> {
        // [36]  QUICK_VAR_NAME  ::=  "?" PN_LOCAL
        let (consumed, result) = Self::lex_optional_pn_local(&data[1..], is_ending)?;
        Some((
            consumed + 1,
            result.and_then(|(name, _)| {
                if name.is_empty() {
                    Err((0..consumed + 1, "A variable name is not allowed to be empty").into())
                } else {
                    Ok(TerseToken::Variable(name))
                }
            }),
        ))
    }

    fn lex_optional_pn_local(
        data: &[u8],
        is_ending: bool,
    ) -> Option<(usize, Result<(Cow<'_, str>, bool), TokenizerError>)> {
        // [168s]  PN_LOCAL  ::=  (PN_CHARS_U | ':' | [0-9] | PLX) ((PN_CHARS | '.' | ':' | PLX)* (PN_CHARS | ':' | PLX))?
        let mut i = 0;
        // Only allocated when there are escaped characters
        let mut buffer: Option<String> = None;
        let mut already_in_buffer = 0;
        let mut might_be_invalid_iri = false;
        let mut trailing_dots = 0;
        loop {
            let Some(r) = lex_unicode_char(&data[i..], i) else {
                if !is_ending {
                    return None;
                }
                break;
            };
            let (c, consumed) = match r {
                Ok(r) => r,
                Err(e) => return Some((e.location.end, Err(e))),
            };
            if c == '%' {
                let a = char::from(*data.get(i + 1)?);
                let b = char::from(*data.get(i + 2)?);
                if !a.is_ascii_hexdigit() || !b.is_ascii_hexdigit() {
                    return Some((
                        i + 3,
                        Err((
                            i..i + 3,
                            format!(
                                "escapes in IRIs should be % followed by two hexadecimal characters, found '%{a}{b}'"
                            ),
                        )
                            .into()),
                    ));
                }
                i += 3;
                trailing_dots = 0;
            } else if c == '\\' {
                let a = char::from(*data.get(i + 1)?);
                if matches!(a, '/' | '?' | '#' | '@' | '%') {
                    might_be_invalid_iri = true;
                } else if !matches!(
                    a,
                    '_' | '~'
                        | '.'
                        | '-'
                        | '!'
                        | '$'
                        | '&'
                        | '\''
                        | '('
                        | ')'
                        | '*'
                        | '+'
                        | ','
                        | ';'
                        | '='
                ) {
                    return Some((
                        i + 2,
                        Err((
                            i + 1,
                            format!(
                                "The character that are allowed to be escaped in IRIs are _~.-!$&'()*+,;=/?#@%, found '{a}'"
                            ),
                        )
                            .into()),
                    ));
                }
                let buffer = buffer.get_or_insert_with(String::new);
                match str_from_utf8(&data[already_in_buffer..i], already_in_buffer..i) {
                    Ok(s) => buffer.push_str(s),
                    Err(e) => return Some((i, Err(e))),
                }
                buffer.push(a);
                i += 2;
                already_in_buffer = i;
                trailing_dots = 0;
            } else if i == 0 {
                if !(is_possible_pn_chars_u(c) || c == ':' || c.is_ascii_digit()) {
                    return Some((0, Ok((Cow::Borrowed(""), false))));
                }
                might_be_invalid_iri |= c == ':';
                i += consumed;
            } else if is_possible_pn_chars(c) || c == ':' {
                might_be_invalid_iri |= c == ':';
                i += consumed;
                trailing_dots = 0;
            } else if c == '.' {
                i += consumed;
                trailing_dots += 1;
            } else {
                break;
            }
        }
        // The trailing dots are not part of the local name
        i -= trailing_dots;
        let local = match buffer {
            Some(mut buffer) => {
                match str_from_utf8(&data[already_in_buffer..i], already_in_buffer..i) {
                    Ok(s) => buffer.push_str(s),
                    Err(e) => return Some((i, Err(e))),
                }
                Cow::Owned(buffer)
            }
            None => match str_from_utf8(&data[..i], 0..i) {
                Ok(s) => Cow::Borrowed(s),
                Err(e) => return Some((i, Err(e))),
            },
        };
        Some((i, Ok((local, might_be_invalid_iri))))
    }

    fn lex_blank_node_label(
        data: &[u8],
        is_ending: bool,
    ) -> Option<(usize, Result<TerseToken<'_>, TokenizerError>)> {
        // [141s]  BLANK_NODE_LABEL  ::=  '_:' (PN_CHARS_U | [0-9]) ((PN_CHARS | '.')* PN_CHARS)?
        let mut i = 2;
        loop {
            let Some(r) = lex_unicode_char(&data[i..], i) else {
                if !is_ending {
                    return None;
                }
                break;
            };
            match r {
                Ok((c, consumed)) => {
                    if i == 2 {
                        if !(is_possible_pn_chars_u(c) || c.is_ascii_digit()) {
                            return Some((i, Err((0..i, "A blank node ID cannot be empty").into())));
                        }
                    } else if !(is_possible_pn_chars(c) || c == '.') {
                        break;
                    }
                    i += consumed;
                }
                Err(e) => return Some((e.location.end, Err(e))),
            }
        }
        while data[..i].ends_with(b".") {
            i -= 1;
        }
        Some((
            i,
            if i > 2 {
                str_from_utf8(&data[2..i], 2..i).map(TerseToken::BlankNodeLabel)
            } else {
                Err((0..i, "A blank node ID cannot be empty").into())
            },
        ))
    }

    fn lex_lang_tag(
        data: &[u8],
        is_ending: bool,
    ) -> Option<(usize, Result<TerseToken<'_>, TokenizerError>)> {
        // [144s]  LANGTAG  ::=  '@' [a-zA-Z]+ ('-' [a-zA-Z0-9]+)*
        let mut end = 1;
        while let Some(c) = data.get(end) {
            if c.is_ascii_alphanumeric() || *c == b'-' {
                end += 1;
            } else {
                break;
            }
        }
        if end == data.len() && !is_ending {
            return None;
        }
        while data[..end].ends_with(b"-") {
            end -= 1;
        }
        if end == 1 || !data[1].is_ascii_alphabetic() {
            return Some((
                end,
                Err((1..2, "A language code should always start with a letter").into()),
            ));
        }
        let tag = match str_from_utf8(&data[1..end], 1..end) {
            Ok(tag) => tag,
            Err(e) => return Some((end, Err(e))),
        };
        if matches!(tag, "prefix" | "base" | "forAll" | "forSome" | "keywords") {
            return Some((end, Ok(TerseToken::LangTag(tag))));
        }
        Some((
            end,
            LanguageTag::parse(tag)
                .map(|tag| TerseToken::LangTag(tag.into_inner()))
                .map_err(|e| (1..end, e.to_string()).into()),
        ))
    }

    fn lex_string(
        data: &[u8],
        delimiter: u8,
    ) -> Option<(usize, Result<TerseToken<'static>, TokenizerError>)> {
        // [22]  STRING_LITERAL_QUOTE         ::=  '"' ([^#x22#x5C#xA#xD] | ECHAR | UCHAR)* '"'
        // [23]  STRING_LITERAL_SINGLE_QUOTE  ::=  "'" ([^#x27#x5C#xA#xD] | ECHAR | UCHAR)* "'"
        let mut string = String::new();
        let mut i = 1;
        loop {
            let mut end = memchr2(delimiter, b'\\', &data[i..])?;
            if let Some(line_jump_end) = memchr2(b'\n', b'\r', &data[i..i + end]) {
                end = line_jump_end;
            }
            match str_from_utf8(&data[i..i + end], i..i + end) {
                Ok(s) => string.push_str(s),
                Err(e) => return Some((i + end, Err(e))),
            }
            i += end;
            match data[i] {
                c if c == delimiter => return Some((i + 1, Ok(TerseToken::String(string)))),
                b'\\' => {
                    let (additional, c) = Self::lex_escape(&data[i..], i, true)?;
                    i += additional + 1;
                    match c {
                        Ok(c) => string.push(c),
                        Err(e) => {
                            // We read until the end of string char
                            let end = memchr(delimiter, &data[i..])?;
                            return Some((i + end + 1, Err(e)));
                        }
                    }
                }
                _ => {
                    // Line jump
                    let end = memchr(delimiter, &data[i..])?;
                    return Some((
                        i + end + 1,
                        Err((
                            i,
                            "Line jumps are not allowed in string literals, use \\n",
                        )
                            .into()),
                    ));
                }
            }
        }
    }

    fn lex_long_string(
        data: &[u8],
        delimiter: u8,
    ) -> Option<(usize, Result<TerseToken<'static>, TokenizerError>)> {
        // [24]  STRING_LITERAL_LONG_SINGLE_QUOTE  ::=  "'''" (("'" | "''")? ([^'\] | ECHAR | UCHAR))* "'''"
        // [25]  STRING_LITERAL_LONG_QUOTE         ::=  '"""' (('"' | '""')? ([^"\] | ECHAR | UCHAR))* '"""'
        let mut string = String::new();
        let mut i = 3;
        loop {
            let end = memchr2(delimiter, b'\\', &data[i..])?;
            match str_from_utf8(&data[i..i + end], i..i + end) {
                Ok(s) => string.push_str(s),
                Err(e) => return Some((i + end, Err(e))),
            }
            i += end;
            if data[i] == delimiter {
                if *data.get(i + 1)? == delimiter && *data.get(i + 2)? == delimiter {
                    // More than three quotes: the first ones are part of the string
                    let mut closing = i + 3;
                    while closing < data.len() && data[closing] == delimiter {
                        closing += 1;
                    }
                    if closing == data.len() {
                        return None;
                    }
                    for _ in i + 3..closing {
                        string.push(char::from(delimiter));
                    }
                    return Some((closing, Ok(TerseToken::LongString(string))));
                }
                i += 1;
                string.push(char::from(delimiter));
            } else {
                let (additional, c) = Self::lex_escape(&data[i..], i, true)?;
                i += additional + 1;
                match c {
                    Ok(c) => string.push(c),
                    Err(e) => return Some((i, Err(e))),
                }
            }
        }
    }

    fn lex_number(
        data: &[u8],
        is_ending: bool,
    ) -> Option<(usize, Result<TerseToken<'_>, TokenizerError>)> {
        // [19]  INTEGER    ::=  [+-]? [0-9]+
        // [20]  DECIMAL    ::=  [+-]? [0-9]* '.' [0-9]+
        // [21]  DOUBLE     ::=  [+-]? ([0-9]+ '.' [0-9]* EXPONENT | '.' [0-9]+ EXPONENT | [0-9]+ EXPONENT)
        // [154s] EXPONENT  ::=  [eE] [+-]? [0-9]+
        let mut i = 0;
        if matches!(data.first()?, b'+' | b'-') {
            i += 1;
        }
        let count_before = lex_digits(&data[i..], is_ending)?;
        i += count_before;

        let mut count_after = None;
        match data.get(i) {
            Some(b'.') => {
                let after = lex_digits(&data[i + 1..], is_ending)?;
                if after > 0 || matches!(data.get(i + 1), Some(b'e' | b'E')) {
                    i += 1 + after;
                    count_after = Some(after);
                }
                // Otherwise the '.' is the end of the statement
            }
            Some(_) => (),
            None if is_ending => (),
            None => return None,
        }

        match data.get(i) {
            Some(b'e' | b'E') => {
                i += 1;
                match data.get(i) {
                    Some(b'+' | b'-') => i += 1,
                    Some(_) => (),
                    None if is_ending => (),
                    None => return None,
                }
                let count_exp = lex_digits(&data[i..], is_ending)?;
                i += count_exp;
                Some((
                    i,
                    if count_exp == 0 {
                        Err((0..i, "A double exponent cannot be empty").into())
                    } else if count_before == 0 && count_after.unwrap_or(0) == 0 {
                        Err((0..i, "A double should not be empty").into())
                    } else {
                        str_from_utf8(&data[..i], 0..i).map(TerseToken::Double)
                    },
                ))
            }
            None if !is_ending => None,
            _ => Some((
                i,
                match count_after {
                    Some(_) => str_from_utf8(&data[..i], 0..i).map(TerseToken::Decimal),
                    None if count_before == 0 => {
                        Err((0..i.max(1), "An integer should not be empty").into())
                    }
                    None => str_from_utf8(&data[..i], 0..i).map(TerseToken::Integer),
                },
            )),
        }
    }

    fn lex_escape(
        data: &[u8],
        position: usize,
        with_echar: bool,
    ) -> Option<(usize, Result<char, TokenizerError>)> {
        // [26]   UCHAR  ::=  '\u' HEX HEX HEX HEX | '\U' HEX HEX HEX HEX HEX HEX HEX HEX
        // [159s] ECHAR  ::=  '\' [tbnrf"'\]
        let c = match *data.get(1)? {
            b'u' => return Some((5, lex_hex_char(&data[2..], 4, 'u', position)?)),
            b'U' => return Some((9, lex_hex_char(&data[2..], 8, 'U', position)?)),
            b't' if with_echar => '\t',
            b'b' if with_echar => '\x08',
            b'n' if with_echar => '\n',
            b'r' if with_echar => '\r',
            b'f' if with_echar => '\x0C',
            b'"' if with_echar => '"',
            b'\'' if with_echar => '\'',
            b'\\' if with_echar => '\\',
            c => {
                return Some((
                    1,
                    Err((
                        position..position + 2,
                        format!("Unexpected escape character '\\{}'", char::from(c)),
                    )
                        .into()),
                ));
            }
        };
        Some((1, Ok(c)))
    }
}

fn lex_digits(data: &[u8], is_ending: bool) -> Option<usize> {
    match data.iter().position(|c| !c.is_ascii_digit()) {
        Some(count) => Some(count),
        None => is_ending.then_some(data.len()),
    }
}

fn lex_hex_char(
    data: &[u8],
    len: usize,
    escape_char: char,
    position: usize,
) -> Option<Result<char, TokenizerError>> {
    let digits = data.get(..len)?;
    let Some(codepoint) = str::from_utf8(digits)
        .ok()
        .filter(|d| d.bytes().all(|c| c.is_ascii_hexdigit()))
        .and_then(|d| u32::from_str_radix(d, 16).ok())
    else {
        return Some(Err((
            position..position + len + 2,
            format!(
                "The escape sequence '\\{escape_char}{}' is not a valid hexadecimal string",
                String::from_utf8_lossy(digits)
            ),
        )
            .into()));
    };
    Some(char::from_u32(codepoint).ok_or_else(|| {
        (
            position..position + len + 2,
            format!(
                "The escape sequence '\\{escape_char}{}' is encoding {codepoint:X} that is not a valid unicode character",
                String::from_utf8_lossy(digits)
            ),
        )
            .into()
    }))
}

fn lex_unicode_char(
    data: &[u8],
    position: usize,
) -> Option<Result<(char, usize), TokenizerError>> {
    let byte = *data.first()?;
    let len = match byte {
        0x00..=0x7F => return Some(Ok((char::from(byte), 1))),
        0xC2..=0xDF => 2,
        0xE0..=0xEF => 3,
        0xF0..=0xF4 => 4,
        _ => {
            return Some(Err(
                (position, "Invalid UTF-8 character encoding").into()
            ));
        }
    };
    let bytes = data.get(..len)?;
    match str::from_utf8(bytes).ok().and_then(|s| s.chars().next()) {
        Some(c) => Some(Ok((c, len))),
        None => Some(Err((
            position..position + len,
            "Invalid UTF-8 character encoding",
        )
            .into())),
    }
}

// [157s]  PN_CHARS_BASE  ::=  [A-Z] | [a-z] | [#x00C0-#x00D6] | [#x00D8-#x00F6] | [#x00F8-#x02FF] | [#x0370-#x037D] | [#x037F-#x1FFF] | [#x200C-#x200D] | [#x2070-#x218F] | [#x2C00-#x2FEF] | [#x3001-#xD7FF] | [#xF900-#xFDCF] | [#xFDF0-#xFFFD] | [#x10000-#xEFFFF]
pub(crate) fn is_possible_pn_chars_base(c: char) -> bool {
    matches!(c,
    'A'..='Z'
    | 'a'..='z'
    | '\u{00C0}'..='\u{00D6}'
    | '\u{00D8}'..='\u{00F6}'
    | '\u{00F8}'..='\u{02FF}'
    | '\u{0370}'..='\u{037D}'
    | '\u{037F}'..='\u{1FFF}'
    | '\u{200C}'..='\u{200D}'
    | '\u{2070}'..='\u{218F}'
    | '\u{2C00}'..='\u{2FEF}'
    | '\u{3001}'..='\u{D7FF}'
    | '\u{F900}'..='\u{FDCF}'
    | '\u{FDF0}'..='\u{FFFD}'
    | '\u{10000}'..='\u{EFFFF}')
}

// [158s]  PN_CHARS_U  ::=  PN_CHARS_BASE | '_'
pub(crate) fn is_possible_pn_chars_u(c: char) -> bool {
    is_possible_pn_chars_base(c) || c == '_'
}

// [160s]  PN_CHARS  ::=  PN_CHARS_U | '-' | [0-9] | #x00B7 | [#x0300-#x036F] | [#x203F-#x2040]
pub(crate) fn is_possible_pn_chars(c: char) -> bool {
    is_possible_pn_chars_u(c)
        || matches!(c,
        '-' | '0'..='9' | '\u{00B7}' | '\u{0300}'..='\u{036F}' | '\u{203F}'..='\u{2040}')
}

/// Builds the IRI of a prefixed name, validating it again if the local name contains characters that might break the IRI syntax.
pub fn resolve_local_name(
    prefix: &str,
    local: &str,
    might_be_invalid_iri: bool,
    prefixes: &PrefixTable,
) -> Result<NamedNode, ResolveLocalNameError> {
    let iri = prefixes.resolve(prefix, local)?;
    if might_be_invalid_iri {
        if let Err(e) = IriRef::parse(iri.as_str()) {
            return Err(ResolveLocalNameError::InvalidIri(format!(
                "The prefixed name {prefix}:{local} builds IRI {iri} that is invalid: {e}"
            )));
        }
    }
    Ok(iri)
}

pub enum ResolveLocalNameError {
    UnknownPrefix(UnknownPrefixError),
    InvalidIri(String),
}

impl From<UnknownPrefixError> for ResolveLocalNameError {
    fn from(error: UnknownPrefixError) -> Self {
        Self::UnknownPrefix(error)
    }
}

fn str_from_utf8(data: &[u8], range: Range<usize>) -> Result<&str, TokenizerError> {
    str::from_utf8(data).map_err(|e| {
        (
            range.start + e.valid_up_to()..min(range.end, range.start + e.valid_up_to() + 4),
            format!("Invalid UTF-8: {e}"),
        )
            .into()
    })
}

fn string_from_utf8(data: Vec<u8>, range: Range<usize>) -> Result<String, TokenizerError> {
    String::from_utf8(data).map_err(|e| {
        (
            range.start + e.utf8_error().valid_up_to()
                ..min(range.end, range.start + e.utf8_error().valid_up_to() + 4),
            format!("Invalid UTF-8: {e}"),
        )
            .into()
    })
}

impl From<ResolveLocalNameError> for GrammarError {
    fn from(error: ResolveLocalNameError) -> Self {
        match error {
            ResolveLocalNameError::UnknownPrefix(e) => e.into(),
            ResolveLocalNameError::InvalidIri(message) => message.into(),
        }
    }
}

/// Converts an IRI or prefixed name token into an IRI, giving back any other token.
pub fn iri_from_token<'a>(
    token: TerseToken<'a>,
    prefixes: &PrefixTable,
) -> Result<Result<NamedNode, GrammarError>, TerseToken<'a>> {
    match token {
        TerseToken::IriRef(iri) => Ok(Ok(NamedNode::new_unchecked(iri))),
        TerseToken::PrefixedName {
            prefix,
            local,
            might_be_invalid_iri,
        } => Ok(resolve_local_name(prefix, &local, might_be_invalid_iri, prefixes)
            .map_err(Into::into)),
        token => Err(token),
    }
}
