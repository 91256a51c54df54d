//! The Turtle and TriG grammar. Turtle is TriG without graph blocks.

use crate::lexer::{LexerMode, LexerOptions, TerseLexer, TerseToken, iri_from_token};
use crate::syntax::{
    Directive, declare_prefix, directive_start, keyword_literal, language_tagged_literal,
    prefix_name, set_base_iri,
};
use crate::toolkit::{Grammar, GrammarError, GrammarParser, Lexeme, Lexer};
use crate::{MAX_NESTING_DEPTH, TERSE_LEXER};
use oxiri::Iri;
use rdfterm::vocab::rdf;
use rdfterm::{BlankNode, GraphName, Literal, NamedNode, PrefixTable, Quad, Subject, Term};

pub struct TerseGrammar {
    stack: Vec<TerseState>,
    subjects: Vec<Subject>,
    predicates: Vec<NamedNode>,
    /// Only used to balance `ObjectsEnd` and `CollectionNext`
    objects: Vec<Term>,
    graph: GraphName,
}

#[expect(clippy::partial_pub_fields)]
pub struct TerseContext {
    pub tokenizer_options: LexerOptions,
    /// `false` for Turtle
    pub with_graph_name: bool,
    prefixes: PrefixTable,
}

impl TerseContext {
    pub fn prefixes(&self) -> &PrefixTable {
        &self.prefixes
    }
}

impl Grammar for TerseGrammar {
    type Tokenizer = TerseLexer;
    type Output = Quad;
    type Context = TerseContext;

    fn recover(mut self) -> Self {
        self.stack.clear();
        self.subjects.clear();
        self.predicates.clear();
        self.objects.clear();
        self.graph = GraphName::DefaultGraph;
        self
    }

    fn on_token(
        mut self,
        lexeme: Lexeme<TerseToken<'_>>,
        context: &mut TerseContext,
        results: &mut Vec<Quad>,
        errors: &mut Vec<GrammarError>,
    ) -> Self {
        let Lexeme::Token(token) = lexeme else {
            return self;
        };
        let Some(state) = self.stack.pop() else {
            // after an error, everything is skipped until the end of the statement or of the block
            if matches!(token, TerseToken::Punctuation("." | "}")) {
                self.stack.push(TerseState::Document);
            }
            return self;
        };
        match state {
            TerseState::Document => {
                self.graph = GraphName::DefaultGraph;
                self.stack.push(TerseState::Document);
                match directive_start(&token) {
                    Some((Directive::Base, needs_dot)) => {
                        self.directive(TerseState::BaseIri, needs_dot)
                    }
                    Some((Directive::Prefix, needs_dot)) => {
                        self.directive(TerseState::PrefixName, needs_dot)
                    }
                    _ => match token {
                        TerseToken::PlainKeyword(keyword)
                            if context.with_graph_name && keyword.eq_ignore_ascii_case("graph") =>
                        {
                            self.stack
                                .extend([TerseState::GraphBlock, TerseState::GraphLabel]);
                            self
                        }
                        TerseToken::Punctuation("{") if context.with_graph_name => {
                            self.stack.push(TerseState::GraphBlock);
                            self.again(token, context, results, errors)
                        }
                        _ => {
                            self.stack.push(TerseState::SubjectOrGraph);
                            self.again(token, context, results, errors)
                        }
                    },
                }
            }
            TerseState::StatementEnd => {
                self.subjects.pop();
                if token == TerseToken::Punctuation(".") {
                    return self;
                }
                errors.push(GrammarError::missing_terminator("A dot is expected at the end of statements"));
                self.again(token, context, results, errors)
            }
            TerseState::BaseIri => {
                let result = set_base_iri(token, &mut context.tokenizer_options);
                self.or_error(result, errors)
            }
            TerseState::PrefixName => match prefix_name(token) {
                Ok(name) => {
                    self.stack.push(TerseState::PrefixIri { name });
                    self
                }
                Err(e) => self.error(errors, e),
            },
            TerseState::PrefixIri { name } => {
                let result = declare_prefix(token, name, &mut context.prefixes);
                self.or_error(result, errors)
            }
            // TriG statements may start with a graph name, the next token decides
            TerseState::SubjectOrGraph => match iri_from_token(token, &context.prefixes) {
                Ok(Ok(iri)) => {
                    self.stack
                        .push(TerseState::GraphOrPredicates { label: iri.into() });
                    self
                }
                Ok(Err(e)) => self.error(errors, e),
                Err(TerseToken::BlankNodeLabel(label)) => {
                    self.stack.push(TerseState::GraphOrPredicates {
                        label: BlankNode::new_unchecked(label).into(),
                    });
                    self
                }
                Err(TerseToken::Punctuation("[")) => {
                    self.stack.push(TerseState::AnonSubjectOrGraph);
                    self
                }
                Err(TerseToken::Punctuation("(")) => {
                    self.stack.extend([
                        TerseState::StatementEnd,
                        TerseState::PredicateObjects,
                        TerseState::SubjectCollection,
                    ]);
                    self
                }
                Err(_) => self.error(errors, "TOKEN is not a valid subject or graph name"),
            },
            TerseState::GraphOrPredicates { label } => {
                if context.with_graph_name && token == TerseToken::Punctuation("{") {
                    self.graph = match label {
                        Subject::NamedNode(node) => node.into(),
                        Subject::BlankNode(node) => node.into(),
                        Subject::Variable(_) => {
                            return self.error(errors, "Variables are not allowed as graph names");
                        }
                    };
                    self.stack.push(TerseState::GraphBlock);
                } else {
                    self.subjects.push(label);
                    self.stack
                        .extend([TerseState::StatementEnd, TerseState::PredicateObjects]);
                }
                self.again(token, context, results, errors)
            }
            TerseState::AnonSubjectOrGraph => {
                if token == TerseToken::Punctuation("]") {
                    self.stack.push(TerseState::GraphOrPredicates {
                        label: BlankNode::default().into(),
                    });
                    return self;
                }
                self.subjects.push(BlankNode::default().into());
                self.stack.extend([
                    TerseState::StatementEnd,
                    TerseState::SubjectPropertyListEnd,
                    TerseState::PredicateObjects,
                ]);
                self.again(token, context, results, errors)
            }
            TerseState::SubjectPropertyListEnd => {
                self.stack.push(TerseState::SubjectPropertyListAfter);
                if token == TerseToken::Punctuation("]") {
                    return self;
                }
                errors.push("blank node property lists should end with a ']'".into());
                self.again(token, context, results, errors)
            }
            TerseState::SubjectPropertyListAfter => {
                // `[ :p :o ] .` is a complete statement
                if !matches!(token, TerseToken::Punctuation("." | "}")) {
                    self.stack.push(TerseState::PredicateObjects);
                }
                self.again(token, context, results, errors)
            }
            TerseState::SubjectCollection => {
                if token == TerseToken::Punctuation(")") {
                    self.subjects.push(rdf::NIL.into());
                    return self;
                }
                let head = BlankNode::default();
                self.subjects.push(head.clone().into());
                self.subjects.push(head.into());
                self.predicates.push(rdf::FIRST.into());
                self.stack
                    .extend([TerseState::CollectionNext, TerseState::Object]);
                self.again(token, context, results, errors)
            }
            TerseState::GraphBlock => {
                if token != TerseToken::Punctuation("{") {
                    return self.error(
                        errors,
                        "The GRAPH keyword should be followed by a graph name and a value in '{'",
                    );
                }
                self.stack
                    .extend([TerseState::GraphBlockEnd, TerseState::Triples]);
                self
            }
            TerseState::GraphBlockEnd => {
                self.subjects.pop();
                match token {
                    TerseToken::Punctuation("}") => self,
                    TerseToken::Punctuation(".") => {
                        self.stack
                            .extend([TerseState::GraphBlockEnd, TerseState::Triples]);
                        self
                    }
                    _ => {
                        errors.push(GrammarError::missing_terminator(
                            "A '}' or a '.' is expected at the end of a graph block",
                        ));
                        self.again(token, context, results, errors)
                    }
                }
            }
            TerseState::Triples => match iri_from_token(token, &context.prefixes) {
                Ok(Ok(iri)) => {
                    self.subjects.push(iri.into());
                    self.stack.push(TerseState::PredicateObjects);
                    self
                }
                Ok(Err(e)) => self.error(errors, e),
                // empty block or dot before the closing brace
                Err(token @ TerseToken::Punctuation("}")) => {
                    self.again(token, context, results, errors)
                }
                Err(TerseToken::BlankNodeLabel(label)) => {
                    self.subjects.push(BlankNode::new_unchecked(label).into());
                    self.stack.push(TerseState::PredicateObjects);
                    self
                }
                Err(TerseToken::Punctuation("[")) => {
                    self.subjects.push(BlankNode::default().into());
                    self.stack.push(TerseState::AnonSubject);
                    self
                }
                Err(TerseToken::Punctuation("(")) => {
                    self.stack
                        .extend([TerseState::PredicateObjects, TerseState::SubjectCollection]);
                    self
                }
                Err(_) => self.error(errors, "TOKEN is not a valid RDF subject"),
            },
            TerseState::AnonSubject => {
                if token == TerseToken::Punctuation("]") {
                    self.stack.push(TerseState::PredicateObjects);
                    return self;
                }
                self.stack.extend([
                    TerseState::SubjectPropertyListEnd,
                    TerseState::PredicateObjects,
                ]);
                self.again(token, context, results, errors)
            }
            TerseState::GraphLabel => match iri_from_token(token, &context.prefixes) {
                Ok(Ok(iri)) => {
                    self.graph = iri.into();
                    self
                }
                Ok(Err(e)) => self.error(errors, e),
                Err(TerseToken::BlankNodeLabel(label)) => {
                    self.graph = BlankNode::new_unchecked(label).into();
                    self
                }
                Err(TerseToken::Punctuation("[")) => {
                    self.stack.push(TerseState::AnonGraphLabelEnd);
                    self
                }
                Err(_) => self.error(errors, "TOKEN is not a valid graph name"),
            },
            TerseState::AnonGraphLabelEnd => {
                if token != TerseToken::Punctuation("]") {
                    return self.error(
                        errors,
                        "Anonymous blank node with a property list are not allowed as graph name",
                    );
                }
                self.graph = BlankNode::default().into();
                self
            }
            TerseState::PredicateObjects => {
                self.stack.extend([
                    TerseState::PredicateObjectsEnd,
                    TerseState::Objects,
                    TerseState::Verb,
                ]);
                self.again(token, context, results, errors)
            }
            TerseState::PredicateObjectsEnd => {
                self.predicates.pop();
                if token == TerseToken::Punctuation(";") {
                    self.stack.push(TerseState::PredicateObjectsContinuation);
                    return self;
                }
                self.again(token, context, results, errors)
            }
            TerseState::PredicateObjectsContinuation => {
                // `;` may be repeated and may end the list
                if token == TerseToken::Punctuation(";") {
                    self.stack.push(TerseState::PredicateObjectsContinuation);
                    return self;
                }
                if !matches!(token, TerseToken::Punctuation("." | "}" | "]")) {
                    self.stack.push(TerseState::PredicateObjects);
                }
                self.again(token, context, results, errors)
            }
            TerseState::Objects => {
                self.stack
                    .extend([TerseState::ObjectsEnd, TerseState::Object]);
                self.again(token, context, results, errors)
            }
            TerseState::ObjectsEnd => {
                self.objects.pop();
                if token == TerseToken::Punctuation(",") {
                    self.stack
                        .extend([TerseState::ObjectsEnd, TerseState::Object]);
                    return self;
                }
                self.again(token, context, results, errors)
            }
            TerseState::Verb => match iri_from_token(token, &context.prefixes) {
                Ok(Ok(iri)) => {
                    self.predicates.push(iri);
                    self
                }
                Ok(Err(e)) => self.error(errors, e),
                Err(TerseToken::PlainKeyword("a")) => {
                    self.predicates.push(rdf::TYPE.into());
                    self
                }
                Err(_) => self.error(errors, "TOKEN is not a valid predicate"),
            },
            TerseState::Object => match iri_from_token(token, &context.prefixes) {
                Ok(Ok(iri)) => self.emit_object(iri, results),
                Ok(Err(e)) => self.error(errors, e),
                Err(token) => match keyword_literal(token) {
                    Ok(literal) => self.emit_object(literal, results),
                    Err(TerseToken::BlankNodeLabel(label)) => {
                        self.emit_object(BlankNode::new_unchecked(label), results)
                    }
                    Err(TerseToken::String(value) | TerseToken::LongString(value)) => {
                        self.stack.push(TerseState::LiteralSuffix { value });
                        self
                    }
                    Err(TerseToken::Punctuation(open @ ("[" | "("))) => {
                        if self.subjects.len() >= MAX_NESTING_DEPTH {
                            return self.nesting_error(errors);
                        }
                        self.stack.push(if open == "[" {
                            TerseState::AnonObject
                        } else {
                            TerseState::ObjectCollection
                        });
                        self
                    }
                    Err(_) => self.error(errors, "TOKEN is not a valid RDF object"),
                },
            },
            TerseState::AnonObject => {
                if token == TerseToken::Punctuation("]") {
                    return self.emit_object(BlankNode::default(), results);
                }
                self.subjects.push(BlankNode::default().into());
                self.stack
                    .extend([TerseState::AnonObjectEnd, TerseState::PredicateObjects]);
                self.again(token, context, results, errors)
            }
            TerseState::AnonObjectEnd => {
                if token != TerseToken::Punctuation("]") {
                    return self.error(errors, "blank node property lists should end with a ']'");
                }
                match self.subjects.pop() {
                    Some(node) => self.emit_object(node, results),
                    None => self.error(errors, "Unexpected ']'"),
                }
            }
            TerseState::ObjectCollection => {
                if token == TerseToken::Punctuation(")") {
                    return self.emit_object(rdf::NIL, results);
                }
                let head = BlankNode::default();
                self = self.emit_object(head.clone(), results);
                self.subjects.push(head.into());
                self.predicates.push(rdf::FIRST.into());
                self.stack
                    .extend([TerseState::CollectionNext, TerseState::Object]);
                self.again(token, context, results, errors)
            }
            // the subject on top of the stack is the current cell of the list
            TerseState::CollectionNext => {
                self.objects.pop();
                let Some(cell) = self.subjects.pop() else {
                    return self.error(errors, "Unexpected collection end");
                };
                if token == TerseToken::Punctuation(")") {
                    self.predicates.pop();
                    results.push(Quad::new(cell, rdf::REST, rdf::NIL, self.graph.clone()));
                    return self;
                }
                let next = BlankNode::default();
                results.push(Quad::new(cell, rdf::REST, next.clone(), self.graph.clone()));
                self.subjects.push(next.into());
                self.stack
                    .extend([TerseState::CollectionNext, TerseState::Object]);
                self.again(token, context, results, errors)
            }
            TerseState::LiteralSuffix { value } => match token {
                TerseToken::LangTag(language) => {
                    self.emit_object(language_tagged_literal(value, language), results)
                }
                TerseToken::Punctuation("^^") => {
                    self.stack.push(TerseState::LiteralDatatype { value });
                    self
                }
                _ => {
                    self = self.emit_object(Literal::new_simple_literal(value), results);
                    self.again(token, context, results, errors)
                }
            },
            TerseState::LiteralDatatype { value } => {
                match iri_from_token(token, &context.prefixes) {
                    Ok(Ok(datatype)) => match Literal::new_checked_typed_literal(value, datatype) {
                        Ok(literal) => self.emit_object(literal, results),
                        Err(e) => self.error(errors, e.to_string()),
                    },
                    Ok(Err(e)) => self.error(errors, e),
                    Err(token) => self
                        .error(errors, "Expecting a datatype IRI after ^^, found TOKEN")
                        .again(token, context, results, errors),
                }
            }
        }
    }

    fn on_end(
        mut self,
        _context: &mut TerseContext,
        results: &mut Vec<Self::Output>,
        errors: &mut Vec<GrammarError>,
    ) {
        let is_missing_dot = match self.stack.pop() {
            None | Some(TerseState::Document) => return,
            Some(TerseState::LiteralSuffix { value }) => {
                drop(self.emit_object(Literal::new_simple_literal(value), results));
                true
            }
            Some(TerseState::StatementEnd) => true,
            Some(TerseState::ObjectsEnd) => matches!(
                &*self.stack,
                [.., TerseState::StatementEnd, TerseState::PredicateObjectsEnd]
            ),
            Some(_) => false,
        };
        errors.push(if is_missing_dot {
            GrammarError::missing_terminator("Triples should be followed by a dot")
        } else {
            "Unexpected end of file".into()
        });
    }

    fn tokenizer_options(context: &TerseContext) -> &LexerOptions {
        &context.tokenizer_options
    }
}

impl TerseGrammar {
    pub fn new_parser<B>(
        data: B,
        is_ending: bool,
        with_graph_name: bool,
        base_iri: Option<Iri<String>>,
        prefixes: PrefixTable,
    ) -> GrammarParser<B, Self> {
        let lexer = Lexer::new(
            TerseLexer::new(LexerMode::Turtle),
            data,
            is_ending,
            TERSE_LEXER,
        );
        let grammar = Self {
            stack: vec![TerseState::Document],
            subjects: Vec::new(),
            predicates: Vec::new(),
            objects: Vec::new(),
            graph: GraphName::DefaultGraph,
        };
        let context = TerseContext {
            tokenizer_options: LexerOptions { base_iri },
            with_graph_name,
            prefixes,
        };
        GrammarParser::new(lexer, grammar, context)
    }

    /// Feeds `token` again, to the state now on top of the stack.
    #[must_use]
    fn again(
        self,
        token: TerseToken<'_>,
        context: &mut TerseContext,
        results: &mut Vec<Quad>,
        errors: &mut Vec<GrammarError>,
    ) -> Self {
        self.on_token(Lexeme::Token(token), context, results, errors)
    }

    #[must_use]
    fn directive(mut self, state: TerseState, needs_dot: bool) -> Self {
        if needs_dot {
            self.stack.push(TerseState::StatementEnd);
        }
        self.stack.push(state);
        self
    }

    #[must_use]
    fn error(self, errors: &mut Vec<GrammarError>, error: impl Into<GrammarError>) -> Self {
        errors.push(error.into());
        self.recover()
    }

    #[must_use]
    fn or_error(self, result: Result<(), GrammarError>, errors: &mut Vec<GrammarError>) -> Self {
        match result {
            Ok(()) => self,
            Err(e) => self.error(errors, e),
        }
    }

    #[must_use]
    fn nesting_error(self, errors: &mut Vec<GrammarError>) -> Self {
        let message = format!("The maximal nesting depth of {MAX_NESTING_DEPTH} has been exceeded");
        self.error(errors, message)
    }

    /// Records `object` and emits the statement it completes, if there is one.
    #[must_use]
    fn emit_object(mut self, object: impl Into<Term>, results: &mut Vec<Quad>) -> Self {
        let object = object.into();
        if let Some((subject, predicate)) = self.subjects.last().zip(self.predicates.last()) {
            results.push(Quad::new(
                subject.clone(),
                predicate.clone(),
                object.clone(),
                self.graph.clone(),
            ));
        }
        self.objects.push(object);
        self
    }
}

#[derive(Debug)]
enum TerseState {
    Document,
    StatementEnd,
    BaseIri,
    PrefixName,
    PrefixIri { name: String },
    SubjectOrGraph,
    GraphOrPredicates { label: Subject },
    AnonSubjectOrGraph,
    SubjectPropertyListEnd,
    SubjectPropertyListAfter,
    SubjectCollection,
    GraphBlock,
    GraphBlockEnd,
    GraphLabel,
    AnonGraphLabelEnd,
    Triples,
    AnonSubject,
    PredicateObjects,
    PredicateObjectsEnd,
    PredicateObjectsContinuation,
    Objects,
    ObjectsEnd,
    Verb,
    Object,
    AnonObject,
    AnonObjectEnd,
    ObjectCollection,
    CollectionNext,
    LiteralSuffix { value: String },
    LiteralDatatype { value: String },
}
