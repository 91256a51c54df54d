//! Tolerance rules applied on top of the XML tokenizer to read real-world HTML.

use std::borrow::Cow;
use std::io::{self, BufRead};

/// Elements that never have content nor an end tag.
pub fn is_void_element(name: &str) -> bool {
    matches!(
        name,
        "area"
            | "base"
            | "br"
            | "col"
            | "embed"
            | "hr"
            | "img"
            | "input"
            | "link"
            | "meta"
            | "param"
            | "source"
            | "track"
            | "wbr"
    )
}

/// Elements whose content is not markup and is skipped.
pub fn is_raw_text_element(name: &str) -> bool {
    matches!(name, "script" | "style")
}

/// Consumes the input up to and including the end tag of the raw text element `name`.
///
/// The markup tokenizer can't be used there: `<` is not escaped in scripts.
pub fn skip_raw_text(reader: &mut impl BufRead, name: &str) -> io::Result<()> {
    let end_tag = format!("</{name}");
    let end_tag = end_tag.as_bytes();
    let mut matched = 0;
    loop {
        let (consumed, done) = {
            let buffer = reader.fill_buf()?;
            if buffer.is_empty() {
                return Ok(());
            }
            let mut position = None;
            for (i, b) in buffer.iter().enumerate() {
                if matched == end_tag.len() {
                    if *b == b'>' {
                        position = Some(i + 1);
                        break;
                    }
                } else if b.to_ascii_lowercase() == end_tag[matched] {
                    matched += 1;
                } else {
                    matched = usize::from(*b == b'<');
                }
            }
            position.map_or((buffer.len(), false), |p| (p, true))
        };
        reader.consume(consumed);
        if done {
            return Ok(());
        }
    }
}

/// If opening `name` implicitly closes an `open` element with an omitted end tag.
pub fn closes_open_sibling(name: &str, open: &str) -> bool {
    match name {
        "li" | "p" | "option" | "tr" => open == name,
        "dt" | "dd" => matches!(open, "dt" | "dd"),
        "td" | "th" => matches!(open, "td" | "th"),
        _ => false,
    }
}

/// Replaces character references.
///
/// XML entities, numeric references and a set of common HTML named entities are decoded.
/// Anything else, like a lone `&`, is kept as it is.
pub fn decode_character_references(text: &str) -> Cow<'_, str> {
    if !text.contains('&') {
        return text.into();
    }
    let mut output = String::with_capacity(text.len());
    let mut remaining = text;
    while let Some(start) = remaining.find('&') {
        output.push_str(&remaining[..start]);
        remaining = &remaining[start..];
        let decoded = remaining[1..]
            .find(';')
            .filter(|end| *end <= MAX_REFERENCE_LEN)
            .and_then(|end| Some((decode_reference(&remaining[1..=end])?, end)));
        if let Some((c, end)) = decoded {
            output.push(c);
            remaining = &remaining[end + 2..];
        } else {
            output.push('&');
            remaining = &remaining[1..];
        }
    }
    output.push_str(remaining);
    output.into()
}

const MAX_REFERENCE_LEN: usize = 10;

fn decode_reference(name: &str) -> Option<char> {
    if let Some(number) = name.strip_prefix('#') {
        let code = if let Some(hex) = number.strip_prefix(['x', 'X']) {
            u32::from_str_radix(hex, 16).ok()?
        } else {
            number.parse().ok()?
        };
        return char::from_u32(code).filter(|c| *c != '\0');
    }
    Some(match name {
        "amp" => '&',
        "lt" => '<',
        "gt" => '>',
        "quot" => '"',
        "apos" => '\'',
        "nbsp" => '\u{a0}',
        "copy" => '©',
        "reg" => '®',
        "trade" => '™',
        "hellip" => '…',
        "mdash" => '\u{2014}',
        "ndash" => '\u{2013}',
        "lsquo" => '‘',
        "rsquo" => '’',
        "ldquo" => '“',
        "rdquo" => '”',
        "laquo" => '«',
        "raquo" => '»',
        "middot" => '·',
        "euro" => '€',
        "eacute" => 'é',
        "egrave" => 'è',
        "agrave" => 'à',
        "ccedil" => 'ç',
        "uuml" => 'ü',
        "ouml" => 'ö',
        "auml" => 'ä',
        "szlig" => 'ß',
        _ => return None,
    })
}
