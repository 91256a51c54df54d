//! A [N3](https://w3c.github.io/N3/spec/) streaming parser implemented by [`N3Parser`]
//! and a serializer implemented by [`N3Serializer`].
//!
//! Formulas are mapped to fresh blank nodes: the statements written inside `{ }`
//! are emitted with this blank node as graph name.

use crate::lexer::{LexerMode, LexerOptions, TerseLexer, TerseToken, iri_from_token};
use crate::syntax::{
    Directive, declare_prefix, directive_start, keyword_literal, language_tagged_literal,
    prefix_name, set_base_iri,
};
use crate::terse_writer::{TerseDialect, TerseWriter};
use crate::toolkit::{
    Grammar, GrammarError, GrammarParser, Lexeme, Lexer, ReaderDriver, SliceDriver,
    TurtleParseError, TurtleSyntaxError,
};
use crate::{MAX_NESTING_DEPTH, TERSE_LEXER};
use oxiri::{Iri, IriParseError};
use rdfterm::vocab::{log, owl, rdf};
use rdfterm::{
    BlankNode, GraphName, Literal, NamedNode, PrefixTable, Quad, Subject, Term, Triple, Variable,
};
use std::collections::HashMap;
use std::io::{self, Read, Write};

/// A [N3](https://w3c.github.io/N3/spec/) streaming parser.
///
/// Count the number of people:
/// ```
/// use rdfterm::vocab::rdf;
/// use rdfterm::{NamedNode, Term};
/// use rdfttl::N3Parser;
///
/// let file = br#"@base <http://example.com/> .
/// @prefix schema: <http://schema.org/> .
/// <foo> a schema:Person ;
///     schema:name "Foo" .
/// <bar> a schema:Person ;
///     schema:name "Bar" ."#;
///
/// let schema_person = NamedNode::new("http://schema.org/Person")?;
/// let mut count = 0;
/// for quad in N3Parser::new().for_reader(file.as_ref()) {
///     let quad = quad?;
///     if quad.predicate == rdf::TYPE && quad.object == Term::from(schema_person.clone()) {
///         count += 1;
///     }
/// }
/// assert_eq!(2, count);
/// # Result::<_, Box<dyn std::error::Error>>::Ok(())
/// ```
#[derive(Default, Clone)]
#[must_use]
pub struct N3Parser {
    base: Option<Iri<String>>,
    prefixes: PrefixTable,
}

impl N3Parser {
    /// Builds a new [`N3Parser`].
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn with_base_iri(mut self, base_iri: impl Into<String>) -> Result<Self, IriParseError> {
        self.base = Some(Iri::parse(base_iri.into())?);
        Ok(self)
    }

    #[inline]
    pub fn with_prefix(
        mut self,
        prefix_name: impl Into<String>,
        prefix_iri: impl Into<String>,
    ) -> Result<Self, IriParseError> {
        self.prefixes
            .insert(prefix_name, Iri::parse(prefix_iri.into())?.into_inner());
        Ok(self)
    }

    /// Parses a N3 file from a [`Read`] implementation.
    pub fn for_reader<R: Read>(self, reader: R) -> ReaderN3Parser<R> {
        ReaderN3Parser {
            inner: N3Grammar::new_parser(Vec::new(), false, self.base, self.prefixes)
                .for_reader(reader),
        }
    }

    /// Parses a N3 file from a byte slice.
    ///
    /// ```
    /// use rdfttl::N3Parser;
    ///
    /// let file = "{ ?x a <http://example.com/Man> } => { ?x a <http://example.com/Mortal> } .";
    /// let quads = N3Parser::new().for_slice(file).collect::<Result<Vec<_>, _>>()?;
    /// // Two statements in two formulas and the implication between them
    /// assert_eq!(quads.len(), 3);
    /// assert!(quads.iter().filter(|q| q.graph_name.is_blank_node()).count() == 2);
    /// # Result::<_, Box<dyn std::error::Error>>::Ok(())
    /// ```
    pub fn for_slice(self, slice: &(impl AsRef<[u8]> + ?Sized)) -> SliceN3Parser<'_> {
        SliceN3Parser {
            inner: N3Grammar::new_parser(slice.as_ref(), true, self.base, self.prefixes)
                .into_iter(),
        }
    }
}

/// Parses a N3 file from a [`Read`] implementation.
///
/// Can be built using [`N3Parser::for_reader`].
#[must_use]
pub struct ReaderN3Parser<R: Read> {
    inner: ReaderDriver<R, N3Grammar>,
}

impl<R: Read> ReaderN3Parser<R> {
    /// The list of IRI prefixes considered at the current step of the parsing.
    ///
    /// This method returns the prefixes given to the parser and the ones declared in the file so far.
    pub fn prefixes(&self) -> &PrefixTable {
        &self.inner.parser.context.prefixes
    }

    /// The base IRI considered at the current step of the parsing.
    pub fn base_iri(&self) -> Option<&str> {
        self.inner
            .parser
            .context
            .tokenizer_options
            .base_iri
            .as_ref()
            .map(Iri::as_str)
    }
}

impl<R: Read> Iterator for ReaderN3Parser<R> {
    type Item = Result<Quad, TurtleParseError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next()
    }
}

/// Parses a N3 file from a byte slice.
///
/// Can be built using [`N3Parser::for_slice`].
#[must_use]
pub struct SliceN3Parser<'a> {
    inner: SliceDriver<'a, N3Grammar>,
}

impl SliceN3Parser<'_> {
    /// The list of IRI prefixes considered at the current step of the parsing.
    pub fn prefixes(&self) -> &PrefixTable {
        &self.inner.parser.context.prefixes
    }

    /// The base IRI considered at the current step of the parsing.
    pub fn base_iri(&self) -> Option<&str> {
        self.inner
            .parser
            .context
            .tokenizer_options
            .base_iri
            .as_ref()
            .map(Iri::as_str)
    }
}

impl Iterator for SliceN3Parser<'_> {
    type Item = Result<Quad, TurtleSyntaxError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next()
    }
}

#[derive(Clone)]
enum N3Predicate {
    Forward(Term),
    /// `is p of`, `<- p` and `<=`: the subject and the object are swapped
    Backward(Term),
}

pub struct N3Grammar {
    stack: Vec<N3State>,
    terms: Vec<Term>,
    predicates: Vec<N3Predicate>,
    /// The blank nodes naming the formulas currently open
    formulas: Vec<BlankNode>,
}

pub struct N3Context {
    tokenizer_options: LexerOptions,
    prefixes: PrefixTable,
    /// `@forAll` IRIs are replaced by variables, `@forSome` IRIs by blank nodes
    quantified: HashMap<NamedNode, Term>,
}

impl N3Context {
    fn term_from_iri(&self, iri: NamedNode) -> Term {
        self.quantified
            .get(&iri)
            .cloned()
            .unwrap_or_else(|| iri.into())
    }
}

impl Grammar for N3Grammar {
    type Tokenizer = TerseLexer;
    type Output = Quad;
    type Context = N3Context;

    fn recover(mut self) -> Self {
        self.stack.clear();
        self.terms.clear();
        self.predicates.clear();
        self.formulas.clear();
        self
    }

    fn on_token(
        mut self,
        lexeme: Lexeme<TerseToken<'_>>,
        context: &mut N3Context,
        results: &mut Vec<Quad>,
        errors: &mut Vec<GrammarError>,
    ) -> Self {
        let Lexeme::Token(token) = lexeme else {
            return self;
        };
        // States either consume the token and return, or leave it to the next state of the stack
        while let Some(state) = self.stack.pop() {
            match state {
                N3State::Document => {
                    self.stack.push(N3State::Document);
                    if let Some((directive, needs_dot)) = directive_start(&token) {
                        if needs_dot {
                            self.stack.push(N3State::StatementEnd);
                        }
                        self.stack.push(N3State::directive(directive));
                        return self;
                    }
                    self.stack
                        .extend([N3State::StatementEnd, N3State::Triples]);
                }
                N3State::StatementEnd => {
                    if token == TerseToken::Punctuation(".") {
                        return self;
                    }
                    return self.error(
                        errors,
                        GrammarError::missing_terminator(
                            "A dot is expected at the end of N3 statements",
                        ),
                    );
                }
                N3State::BaseIri => {
                    return match set_base_iri(token, &mut context.tokenizer_options) {
                        Ok(()) => self,
                        Err(e) => self.error(errors, e),
                    };
                }
                N3State::PrefixName => {
                    return match prefix_name(token) {
                        Ok(name) => {
                            self.stack.push(N3State::PrefixIri { name });
                            self
                        }
                        Err(e) => self.error(errors, e),
                    };
                }
                N3State::PrefixIri { name } => {
                    return match declare_prefix(token, name, &mut context.prefixes) {
                        Ok(()) => self,
                        Err(e) => self.error(errors, e),
                    };
                }
                N3State::QuantifiedIri { universal } => {
                    return match iri_from_token(token, &context.prefixes) {
                        Ok(Ok(iri)) => {
                            let term: Term = if universal {
                                variable_for_iri(&iri, context.quantified.len()).into()
                            } else {
                                BlankNode::default().into()
                            };
                            context.quantified.insert(iri, term);
                            self.stack.push(N3State::QuantifiedIriNext { universal });
                            self
                        }
                        Ok(Err(e)) => self.error(errors, e),
                        Err(_) => self.error(
                            errors,
                            "@forAll and @forSome should be followed by a list of IRIs",
                        ),
                    };
                }
                N3State::QuantifiedIriNext { universal } => {
                    if token == TerseToken::Punctuation(",") {
                        self.stack.push(N3State::QuantifiedIri { universal });
                        return self;
                    }
                }
                // a subject alone is a valid statement
                N3State::Triples => {
                    self.stack
                        .extend([N3State::TriplesPredicates, N3State::Path]);
                }
                N3State::TriplesPredicates => {
                    if !matches!(token, TerseToken::Punctuation("." | "]" | "}" | ")")) {
                        self.stack
                            .extend([N3State::TriplesEnd, N3State::PredicateObjects]);
                    }
                }
                N3State::TriplesEnd => {
                    self.terms.pop();
                }
                N3State::PredicateObjects => {
                    self.stack.extend([
                        N3State::PredicateObjectsEnd,
                        N3State::Objects,
                        N3State::Verb,
                    ]);
                }
                N3State::PredicateObjectsEnd => {
                    self.predicates.pop();
                    if token == TerseToken::Punctuation(";") {
                        self.stack.push(N3State::PredicateObjectsContinuation);
                        return self;
                    }
                }
                N3State::PredicateObjectsContinuation => {
                    if token == TerseToken::Punctuation(";") {
                        self.stack.push(N3State::PredicateObjectsContinuation);
                        return self;
                    }
                    if !matches!(token, TerseToken::Punctuation("." | "}" | "]" | ")")) {
                        self.stack.push(N3State::PredicateObjects);
                    }
                }
                N3State::Objects => {
                    self.stack.extend([N3State::ObjectsEnd, N3State::Path]);
                }
                N3State::ObjectsEnd => {
                    let (Some(object), Some(subject), Some(predicate)) = (
                        self.terms.pop(),
                        self.terms.last().cloned(),
                        self.predicates.last().cloned(),
                    ) else {
                        return self.error(errors, "Unexpected TOKEN");
                    };
                    let emitted = match predicate {
                        N3Predicate::Forward(predicate) => {
                            self.emit(subject, predicate, object, results)
                        }
                        N3Predicate::Backward(predicate) => {
                            self.emit(object, predicate, subject, results)
                        }
                    };
                    if let Err(e) = emitted {
                        return self.error(errors, e);
                    }
                    if token == TerseToken::Punctuation(",") {
                        self.stack.extend([N3State::ObjectsEnd, N3State::Path]);
                        return self;
                    }
                }
                N3State::Verb => {
                    if let Some(predicate) = fixed_verb(&token) {
                        self.predicates.push(predicate);
                        return self;
                    }
                    match token {
                        TerseToken::PlainKeyword("has") => {
                            self.stack.extend([N3State::ForwardVerb, N3State::Path]);
                            return self;
                        }
                        TerseToken::PlainKeyword("is") => {
                            self.stack.extend([N3State::IsOf, N3State::Path]);
                            return self;
                        }
                        TerseToken::Punctuation("<-") => {
                            self.stack.extend([N3State::BackwardVerb, N3State::Path]);
                            return self;
                        }
                        _ => self.stack.extend([N3State::ForwardVerb, N3State::Path]),
                    }
                }
                N3State::ForwardVerb | N3State::BackwardVerb => {
                    let Some(predicate) = self.terms.pop() else {
                        return self.error(errors, "Unexpected TOKEN");
                    };
                    self.predicates.push(if matches!(state, N3State::ForwardVerb) {
                        N3Predicate::Forward(predicate)
                    } else {
                        N3Predicate::Backward(predicate)
                    });
                }
                N3State::IsOf => {
                    return match (token, self.terms.pop()) {
                        (TerseToken::PlainKeyword("of"), Some(predicate)) => {
                            self.predicates.push(N3Predicate::Backward(predicate));
                            self
                        }
                        _ => self.error(
                            errors,
                            "The keyword 'is' should be followed by a predicate then by the keyword 'of'",
                        ),
                    };
                }
                N3State::Path => {
                    self.stack.extend([N3State::PathNext, N3State::PathItem]);
                }
                N3State::PathNext => {
                    let inverse = match token {
                        TerseToken::Punctuation("!") => false,
                        TerseToken::Punctuation("^") => true,
                        _ => continue,
                    };
                    self.stack
                        .extend([N3State::PathStep { inverse }, N3State::PathItem]);
                    return self;
                }
                // `a!p` is the `x` of `a p x`, `a^p` the `x` of `x p a`
                N3State::PathStep { inverse } => {
                    let (Some(predicate), Some(previous)) = (self.terms.pop(), self.terms.pop())
                    else {
                        return self.error(errors, "Unexpected TOKEN");
                    };
                    let step = BlankNode::default();
                    let emitted = if inverse {
                        self.emit(step.clone().into(), predicate, previous, results)
                    } else {
                        self.emit(previous, predicate, step.clone().into(), results)
                    };
                    if let Err(e) = emitted {
                        return self.error(errors, e);
                    }
                    self.terms.push(step.into());
                    self.stack.push(N3State::PathNext);
                }
                N3State::PathItem => {
                    let token = match iri_from_token(token, &context.prefixes) {
                        Ok(Ok(iri)) => {
                            self.terms.push(context.term_from_iri(iri));
                            return self;
                        }
                        Ok(Err(e)) => return self.error(errors, e),
                        Err(token) => token,
                    };
                    let token = match keyword_literal(token) {
                        Ok(literal) => {
                            self.terms.push(literal.into());
                            return self;
                        }
                        Err(token) => token,
                    };
                    return match token {
                        TerseToken::BlankNodeLabel(label) => {
                            self.terms.push(BlankNode::new_unchecked(label).into());
                            self
                        }
                        TerseToken::Variable(name) => {
                            self.terms.push(Variable::new_unchecked(name).into());
                            self
                        }
                        TerseToken::Punctuation(open @ ("[" | "(" | "{")) => {
                            if self.terms.len() + self.formulas.len() >= MAX_NESTING_DEPTH {
                                return self.nesting_error(errors);
                            }
                            match open {
                                "[" => self.stack.push(N3State::PropertyList),
                                "(" => self.stack.push(N3State::Collection),
                                _ => {
                                    self.formulas.push(BlankNode::default());
                                    self.stack.push(N3State::Formula);
                                }
                            }
                            self
                        }
                        TerseToken::String(value) | TerseToken::LongString(value) => {
                            self.stack.push(N3State::LiteralSuffix { value });
                            self
                        }
                        _ => self.error(errors, "TOKEN is not a valid RDF value"),
                    };
                }
                N3State::PropertyList => match token {
                    TerseToken::Punctuation("]") => {
                        self.terms.push(BlankNode::default().into());
                        return self;
                    }
                    TerseToken::PlainKeyword("id") => {
                        self.stack.push(N3State::IdPropertyList);
                        return self;
                    }
                    _ => {
                        self.terms.push(BlankNode::default().into());
                        self.stack
                            .extend([N3State::PropertyListEnd, N3State::PredicateObjects]);
                    }
                },
                N3State::PropertyListEnd => {
                    if token == TerseToken::Punctuation("]") {
                        return self;
                    }
                    return self.error(errors, "blank node property lists should end with a ']'");
                }
                // `[ id <iri> ... ]` describes an existing node
                N3State::IdPropertyList => {
                    return match iri_from_token(token, &context.prefixes) {
                        Ok(Ok(id)) => {
                            self.terms.push(context.term_from_iri(id));
                            self.stack
                                .extend([N3State::PropertyListEnd, N3State::PredicateObjects]);
                            self
                        }
                        Ok(Err(e)) => self.error(errors, e),
                        Err(_) => {
                            self.error(errors, "The '[ id' construction should be followed by an IRI")
                        }
                    };
                }
                N3State::Collection => {
                    if token == TerseToken::Punctuation(")") {
                        self.terms.push(rdf::NIL.into());
                        return self;
                    }
                    let head = BlankNode::default();
                    self.terms.push(head.clone().into());
                    self.terms.push(head.into());
                    self.stack
                        .extend([N3State::CollectionNext, N3State::Path]);
                }
                // below the item on the term stack is the current cell, below it the list head
                N3State::CollectionNext => {
                    let (Some(item), Some(cell)) = (self.terms.pop(), self.terms.pop()) else {
                        return self.error(errors, "Unexpected TOKEN");
                    };
                    if let Err(e) = self.emit(cell.clone(), rdf::FIRST.into(), item, results) {
                        return self.error(errors, e);
                    }
                    let end = token == TerseToken::Punctuation(")");
                    let rest: Term = if end {
                        rdf::NIL.into()
                    } else {
                        BlankNode::default().into()
                    };
                    if let Err(e) = self.emit(cell, rdf::REST.into(), rest.clone(), results) {
                        return self.error(errors, e);
                    }
                    if end {
                        return self;
                    }
                    self.terms.push(rest);
                    self.stack
                        .extend([N3State::CollectionNext, N3State::Path]);
                }
                N3State::LiteralSuffix { value } => match token {
                    TerseToken::LangTag(language) => {
                        self.terms
                            .push(language_tagged_literal(value, language).into());
                        return self;
                    }
                    TerseToken::Punctuation("^^") => {
                        self.stack.push(N3State::LiteralDatatype { value });
                        return self;
                    }
                    _ => self.terms.push(Literal::new_simple_literal(value).into()),
                },
                N3State::LiteralDatatype { value } => {
                    return match iri_from_token(token, &context.prefixes) {
                        Ok(Ok(datatype)) => match Literal::new_checked_typed_literal(value, datatype) {
                            Ok(literal) => {
                                self.terms.push(literal.into());
                                self
                            }
                            Err(e) => self.error(errors, e.to_string()),
                        },
                        Ok(Err(e)) => self.error(errors, e),
                        Err(_) => self.error(errors, "Expecting a datatype IRI after ^^, found TOKEN"),
                    };
                }
                N3State::Formula => {
                    if token == TerseToken::Punctuation("}") {
                        return self.close_formula(errors);
                    }
                    if let Some((directive, needs_dot)) = directive_start(&token) {
                        self.stack.push(if needs_dot {
                            N3State::FormulaStatementEnd
                        } else {
                            N3State::Formula
                        });
                        self.stack.push(N3State::directive(directive));
                        return self;
                    }
                    self.stack
                        .extend([N3State::FormulaStatementEnd, N3State::Triples]);
                }
                N3State::FormulaStatementEnd => {
                    return match token {
                        TerseToken::Punctuation("}") => self.close_formula(errors),
                        TerseToken::Punctuation(".") => {
                            self.stack.push(N3State::Formula);
                            self
                        }
                        _ => self.error(
                            errors,
                            GrammarError::missing_terminator(
                                "A dot is expected at the end of N3 statements",
                            ),
                        ),
                    };
                }
            }
        }
        // after an error, tokens are skipped until the end of the broken statement
        if token == TerseToken::Punctuation(".") {
            self.stack.push(N3State::Document);
        }
        self
    }

    fn on_end(
        self,
        context: &mut N3Context,
        results: &mut Vec<Quad>,
        errors: &mut Vec<GrammarError>,
    ) {
        let is_missing_dot = match &*self.stack {
            [] | [N3State::Document] => return,
            [N3State::Document, N3State::StatementEnd, rest @ ..] => {
                rest.iter().all(N3State::is_statement_end)
            }
            _ => false,
        };
        if is_missing_dot {
            // the statement is complete, it is emitted before the error
            drop(self.on_token(
                Lexeme::Token(TerseToken::Punctuation(".")),
                context,
                results,
                errors,
            ));
            errors.push(GrammarError::missing_terminator(
                "N3 statements should be followed by a dot",
            ));
        } else {
            errors.push("Unexpected end of file".into());
        }
    }

    fn tokenizer_options(context: &N3Context) -> &LexerOptions {
        &context.tokenizer_options
    }
}

impl N3Grammar {
    pub fn new_parser<B>(
        data: B,
        is_ending: bool,
        base_iri: Option<Iri<String>>,
        prefixes: PrefixTable,
    ) -> GrammarParser<B, Self> {
        let lexer = Lexer::new(TerseLexer::new(LexerMode::N3), data, is_ending, TERSE_LEXER);
        let grammar = Self {
            stack: vec![N3State::Document],
            terms: Vec::new(),
            predicates: Vec::new(),
            formulas: Vec::new(),
        };
        let context = N3Context {
            tokenizer_options: LexerOptions { base_iri },
            prefixes,
            quantified: HashMap::new(),
        };
        GrammarParser::new(lexer, grammar, context)
    }

    #[must_use]
    fn error(self, errors: &mut Vec<GrammarError>, error: impl Into<GrammarError>) -> Self {
        errors.push(error.into());
        self.recover()
    }

    #[must_use]
    fn nesting_error(self, errors: &mut Vec<GrammarError>) -> Self {
        let message = format!("The maximal nesting depth of {MAX_NESTING_DEPTH} has been exceeded");
        self.error(errors, message)
    }

    /// Pushes the term standing for the formula that `}` closes.
    #[must_use]
    fn close_formula(mut self, errors: &mut Vec<GrammarError>) -> Self {
        match self.formulas.pop() {
            Some(formula) => {
                self.terms.push(formula.into());
                self
            }
            None => self.error(errors, "Unexpected TOKEN"),
        }
    }

    /// Emits a statement in the innermost open formula, or in the default graph.
    fn emit(
        &self,
        subject: Term,
        predicate: Term,
        object: Term,
        results: &mut Vec<Quad>,
    ) -> Result<(), String> {
        let subject = Subject::try_from(subject)
            .map_err(|e| format!("Literals are not allowed in subject position: {e}"))?;
        let predicate = match predicate {
            Term::NamedNode(p) => rdfterm::Predicate::from(p),
            Term::Variable(p) => p.into(),
            Term::BlankNode(_) | Term::Literal(_) => {
                return Err(format!(
                    "Only IRIs and variables are allowed in predicate position, found {predicate}"
                ));
            }
        };
        let graph_name = self
            .formulas
            .last()
            .map_or(GraphName::DefaultGraph, |formula| formula.clone().into());
        results.push(Quad::new(subject, predicate, object, graph_name));
        Ok(())
    }
}

/// `a`, `=`, `=>` and `<=` stand for fixed predicates.
fn fixed_verb(token: &TerseToken<'_>) -> Option<N3Predicate> {
    Some(match token {
        TerseToken::PlainKeyword("a") => N3Predicate::Forward(rdf::TYPE.into()),
        TerseToken::Punctuation("=") => N3Predicate::Forward(owl::SAME_AS.into()),
        TerseToken::Punctuation("=>") => N3Predicate::Forward(log::IMPLIES.into()),
        TerseToken::Punctuation("<=") => N3Predicate::Backward(log::IMPLIES.into()),
        _ => return None,
    })
}

/// The variable replacing a `@forAll` IRI: its local name if it is a valid variable name.
fn variable_for_iri(iri: &NamedNode, position: usize) -> Variable {
    let local = iri
        .as_str()
        .rsplit(['#', '/', ':'])
        .next()
        .unwrap_or_default();
    Variable::new(local).unwrap_or_else(|_| Variable::new_unchecked(format!("v{position}")))
}

#[derive(Debug)]
enum N3State {
    Document,
    StatementEnd,
    BaseIri,
    PrefixName,
    PrefixIri { name: String },
    QuantifiedIri { universal: bool },
    QuantifiedIriNext { universal: bool },
    Triples,
    TriplesPredicates,
    TriplesEnd,
    PredicateObjects,
    PredicateObjectsEnd,
    PredicateObjectsContinuation,
    Objects,
    ObjectsEnd,
    Verb,
    ForwardVerb,
    BackwardVerb,
    IsOf,
    Path,
    PathNext,
    PathStep { inverse: bool },
    PathItem,
    PropertyList,
    PropertyListEnd,
    IdPropertyList,
    Collection,
    CollectionNext,
    LiteralSuffix { value: String },
    LiteralDatatype { value: String },
    Formula,
    FormulaStatementEnd,
}

impl N3State {
    fn directive(directive: Directive) -> Self {
        match directive {
            Directive::Base => Self::BaseIri,
            Directive::Prefix => Self::PrefixName,
            Directive::ForAll => Self::QuantifiedIri { universal: true },
            Directive::ForSome => Self::QuantifiedIri { universal: false },
        }
    }

    /// The states a complete statement may be left in while waiting for its dot.
    fn is_statement_end(&self) -> bool {
        matches!(
            self,
            Self::TriplesPredicates
                | Self::TriplesEnd
                | Self::PredicateObjectsEnd
                | Self::PredicateObjectsContinuation
                | Self::ObjectsEnd
                | Self::PathNext
                | Self::LiteralSuffix { .. }
        )
    }
}

/// A [N3](https://w3c.github.io/N3/spec/) serializer.
///
/// Statements in a graph named by a blank node are written as a `{ }` formula
/// where this blank node is used.
///
/// ```
/// use rdfterm::{BlankNode, NamedNode, Quad, GraphName, Variable};
/// use rdfttl::N3Serializer;
///
/// let formula = BlankNode::default();
/// let mut serializer = N3Serializer::new()
///     .with_prefix("ex", "http://example.com/")?
///     .for_writer(Vec::new());
/// serializer.serialize_quad(&Quad::new(
///     Variable::new("x")?,
///     NamedNode::new("http://example.com/p")?,
///     NamedNode::new("http://example.com/o")?,
///     formula.clone(),
/// ))?;
/// serializer.serialize_quad(&Quad::new(
///     formula,
///     NamedNode::new("http://www.w3.org/2000/10/swap/log#implies")?,
///     NamedNode::new("http://example.com/c")?,
///     GraphName::DefaultGraph,
/// ))?;
/// assert_eq!(
///     "@prefix ex: <http://example.com/> .\n{ ?x ex:p ex:o } <http://www.w3.org/2000/10/swap/log#implies> ex:c .\n",
///     String::from_utf8(serializer.finish()?)?
/// );
/// # Result::<_,Box<dyn std::error::Error>>::Ok(())
/// ```
#[derive(Default, Clone)]
#[must_use]
pub struct N3Serializer {
    prefixes: PrefixTable,
    pretty: bool,
}

impl N3Serializer {
    /// Builds a new [`N3Serializer`].
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn with_prefix(
        mut self,
        prefix_name: impl Into<String>,
        prefix_iri: impl Into<String>,
    ) -> Result<Self, IriParseError> {
        self.prefixes
            .insert(prefix_name, Iri::parse(prefix_iri.into())?.into_inner());
        Ok(self)
    }

    /// Groups the statements by subject and indents them.
    #[inline]
    pub fn pretty(mut self) -> Self {
        self.pretty = true;
        self
    }

    /// Writes a N3 file to a [`Write`] implementation.
    pub fn for_writer<W: Write>(self, writer: W) -> WriterN3Serializer<W> {
        WriterN3Serializer {
            writer,
            low: TerseWriter::new(TerseDialect::N3, self.prefixes, self.pretty),
        }
    }
}

/// Writes a N3 file to a [`Write`] implementation.
///
/// Can be built using [`N3Serializer::for_writer`].
#[must_use]
pub struct WriterN3Serializer<W: Write> {
    writer: W,
    low: TerseWriter,
}

impl<W: Write> WriterN3Serializer<W> {
    /// Writes an extra statement.
    pub fn serialize_quad(&mut self, quad: &Quad) -> io::Result<()> {
        self.low.serialize_quad(quad, &mut self.writer)
    }

    /// Writes an extra statement in the default graph.
    pub fn serialize_triple(&mut self, triple: &Triple) -> io::Result<()> {
        self.low
            .serialize_quad(&triple.clone().in_graph(GraphName::DefaultGraph), &mut self.writer)
    }

    /// Ends the write process and returns the underlying [`Write`].
    pub fn finish(mut self) -> io::Result<W> {
        self.low.finish(&mut self.writer)?;
        Ok(self.writer)
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::panic_in_result_fn)]

    use super::*;

    fn parse(data: &str) -> Result<Vec<Quad>, TurtleSyntaxError> {
        N3Parser::new().for_slice(data).collect()
    }

    #[test]
    fn test_formula_is_graph_of_blank_node() -> Result<(), TurtleSyntaxError> {
        let quads = parse("{ <http://example.com/s> <http://example.com/p> 1 } => { <http://example.com/s> a <http://example.com/C> } .")?;
        assert_eq!(quads.len(), 3);
        let implies = quads
            .iter()
            .find(|q| q.graph_name.is_default_graph())
            .unwrap();
        assert_eq!(implies.predicate, log::IMPLIES);
        let (Subject::BlankNode(premise), Term::BlankNode(conclusion)) =
            (&implies.subject, &implies.object)
        else {
            panic!("formulas should be blank nodes");
        };
        assert!(
            quads
                .iter()
                .any(|q| q.graph_name == GraphName::from(premise.clone()))
        );
        assert!(
            quads
                .iter()
                .any(|q| q.graph_name == GraphName::from(conclusion.clone()))
        );
        Ok(())
    }

    #[test]
    fn test_reversed_predicates() -> Result<(), TurtleSyntaxError> {
        let quads = parse(
            "@prefix : <http://example.com/> .\n:a is :p of :b .\n:c <- :q :d .\n:e <= :f .",
        )?;
        let expected = [
            ("http://example.com/b", "http://example.com/p", "http://example.com/a"),
            ("http://example.com/d", "http://example.com/q", "http://example.com/c"),
            (
                "http://example.com/f",
                "http://www.w3.org/2000/10/swap/log#implies",
                "http://example.com/e",
            ),
        ];
        assert_eq!(quads.len(), expected.len());
        for (quad, (s, p, o)) in quads.iter().zip(expected) {
            assert_eq!(quad.subject, Subject::from(NamedNode::new_unchecked(s)));
            assert_eq!(quad.predicate, rdfterm::Predicate::from(NamedNode::new_unchecked(p)));
            assert_eq!(quad.object, Term::from(NamedNode::new_unchecked(o)));
        }
        Ok(())
    }

    #[test]
    fn test_universal_declaration() -> Result<(), TurtleSyntaxError> {
        let quads = parse(
            "@prefix : <http://example.com/> .\n@forAll :x .\n:x = :y .",
        )?;
        assert_eq!(quads.len(), 1);
        assert!(quads[0].subject.is_variable());
        assert_eq!(quads[0].predicate, owl::SAME_AS);
        Ok(())
    }

    #[test]
    fn test_path() -> Result<(), TurtleSyntaxError> {
        let quads = parse("@prefix : <http://example.com/> .\n:joe!:mother a :Woman .")?;
        assert_eq!(quads.len(), 2);
        Ok(())
    }

    #[test]
    fn test_literal_subject_is_an_error() {
        assert!(parse("\"foo\" <http://example.com/p> <http://example.com/o> .").is_err());
    }

    #[test]
    fn test_missing_dot() {
        let error = parse("<http://example.com/s> <http://example.com/p> <http://example.com/o>")
            .unwrap_err();
        assert!(error.message().contains("dot"), "{error}");
    }

    #[test]
    fn test_round_trip_formula() -> io::Result<()> {
        let input = "{ ?x <http://example.com/p> ?y } => { ?y <http://example.com/p> ?x } .";
        let quads = parse(input)?;
        let mut serializer = N3Serializer::new().for_writer(Vec::new());
        for quad in &quads {
            serializer.serialize_quad(quad)?;
        }
        let output = String::from_utf8(serializer.finish()?).map_err(io::Error::other)?;
        assert_eq!(
            output,
            "{ ?x <http://example.com/p> ?y } <http://www.w3.org/2000/10/swap/log#implies> { ?y <http://example.com/p> ?x } .\n"
        );
        assert_eq!(parse(&output)?.len(), quads.len());
        Ok(())
    }

    #[test]
    fn test_named_graph_rejected() {
        let mut serializer = N3Serializer::new().for_writer(Vec::new());
        assert!(
            serializer
                .serialize_quad(&Quad::new(
                    NamedNode::new_unchecked("http://example.com/s"),
                    NamedNode::new_unchecked("http://example.com/p"),
                    NamedNode::new_unchecked("http://example.com/o"),
                    NamedNode::new_unchecked("http://example.com/g"),
                ))
                .is_err()
        );
    }
}
