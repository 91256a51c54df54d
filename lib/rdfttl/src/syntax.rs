//! Grammar pieces shared by the Turtle, TriG and N3 parsers.

use crate::lexer::{LexerOptions, TerseToken};
use crate::toolkit::GrammarError;
use oxiri::Iri;
use rdfterm::vocab::xsd;
use rdfterm::{Literal, PrefixTable};

pub enum Directive {
    Base,
    Prefix,
    /// N3 `@forAll`
    ForAll,
    /// N3 `@forSome`
    ForSome,
}

/// The directive `token` opens, if any, and whether it must be closed by a dot.
///
/// `@base` and `@prefix` need a dot, their SPARQL style `BASE` and `PREFIX` counterparts do not.
pub fn directive_start(token: &TerseToken<'_>) -> Option<(Directive, bool)> {
    match token {
        TerseToken::PlainKeyword(keyword) if keyword.eq_ignore_ascii_case("base") => {
            Some((Directive::Base, false))
        }
        TerseToken::PlainKeyword(keyword) if keyword.eq_ignore_ascii_case("prefix") => {
            Some((Directive::Prefix, false))
        }
        TerseToken::LangTag("base") => Some((Directive::Base, true)),
        TerseToken::LangTag("prefix") => Some((Directive::Prefix, true)),
        TerseToken::LangTag("forAll") => Some((Directive::ForAll, true)),
        TerseToken::LangTag("forSome") => Some((Directive::ForSome, true)),
        _ => None,
    }
}

pub fn set_base_iri(token: TerseToken<'_>, options: &mut LexerOptions) -> Result<(), GrammarError> {
    let TerseToken::IriRef(iri) = token else {
        return Err("The BASE keyword should be followed by an IRI".into());
    };
    let iri = Iri::parse(iri).map_err(|e| format!("The base IRI is invalid: {e}"))?;
    options.base_iri = Some(iri);
    Ok(())
}

pub fn prefix_name(token: TerseToken<'_>) -> Result<String, GrammarError> {
    match token {
        TerseToken::PrefixedName { prefix, local, .. } if local.is_empty() => Ok(prefix.to_owned()),
        _ => Err("The PREFIX keyword should be followed by a prefix like 'ex:'".into()),
    }
}

pub fn declare_prefix(
    token: TerseToken<'_>,
    name: String,
    prefixes: &mut PrefixTable,
) -> Result<(), GrammarError> {
    let TerseToken::IriRef(iri) = token else {
        return Err(
            "The PREFIX declaration should be followed by a prefix and its value as an IRI".into(),
        );
    };
    prefixes.insert(name, iri);
    Ok(())
}

/// Numbers and booleans. Other tokens are given back.
pub fn keyword_literal(token: TerseToken<'_>) -> Result<Literal, TerseToken<'_>> {
    Ok(match token {
        TerseToken::Integer(value) => Literal::new_typed_literal(value, xsd::INTEGER),
        TerseToken::Decimal(value) => Literal::new_typed_literal(value, xsd::DECIMAL),
        TerseToken::Double(value) => Literal::new_typed_literal(value, xsd::DOUBLE),
        TerseToken::PlainKeyword(value @ ("true" | "false")) => {
            Literal::new_typed_literal(value, xsd::BOOLEAN)
        }
        token => return Err(token),
    })
}

/// Language tags are stored lowercased.
pub fn language_tagged_literal(value: String, language: &str) -> Literal {
    Literal::new_language_tagged_literal_unchecked(value, language.to_ascii_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_directive_start() {
        assert!(matches!(
            directive_start(&TerseToken::PlainKeyword("PREFIX")),
            Some((Directive::Prefix, false))
        ));
        assert!(matches!(
            directive_start(&TerseToken::LangTag("base")),
            Some((Directive::Base, true))
        ));
        assert!(directive_start(&TerseToken::LangTag("en")).is_none());
    }

    #[test]
    fn test_keyword_literal() {
        let literal = keyword_literal(TerseToken::PlainKeyword("true")).ok();
        assert_eq!(literal.as_ref().map(Literal::datatype), Some(xsd::BOOLEAN));
        assert!(keyword_literal(TerseToken::PlainKeyword("maybe")).is_err());
    }
}
