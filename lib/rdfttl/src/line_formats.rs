//! Shared parser and serializer implementation for N-Triples and N-Quads.

use crate::LINE_LEXER;
use crate::lexer::{LexerMode, LexerOptions, TerseLexer, TerseToken};
use crate::toolkit::{Grammar, GrammarError, GrammarParser, Lexeme, Lexer};
use rdfterm::vocab::rdf;
use rdfterm::{
    BlankNode, BlankNodeRelabeler, GraphName, InvalidTermError, Literal, NamedNode, Predicate,
    Quad, Subject, Term,
};
use std::io::{self, Write};

pub struct LineGrammar {
    state: NQuadsState,
}

pub struct LineContext {
    with_graph_name: bool,
    tokenizer_options: LexerOptions,
}

enum NQuadsState {
    ExpectSubject,
    ExpectPredicate {
        subject: Subject,
    },
    ExpectObject {
        subject: Subject,
        predicate: NamedNode,
    },
    ExpectLiteralAnnotationOrGraphNameOrDot {
        subject: Subject,
        predicate: NamedNode,
        value: String,
    },
    ExpectLiteralDatatype {
        subject: Subject,
        predicate: NamedNode,
        value: String,
    },
    ExpectGraphNameOrDot {
        subject: Subject,
        predicate: NamedNode,
        object: Term,
    },
    ExpectDot,
    ExpectLineJump,
    RecoverToLineJump,
}

impl Grammar for LineGrammar {
    type Tokenizer = TerseLexer;
    type Output = Quad;
    type Context = LineContext;

    fn recover(mut self) -> Self {
        self.state = NQuadsState::RecoverToLineJump;
        self
    }

    fn on_token(
        mut self,
        token: Lexeme<TerseToken<'_>>,
        context: &mut LineContext,
        results: &mut Vec<Quad>,
        errors: &mut Vec<GrammarError>,
    ) -> Self {
        let state = std::mem::replace(&mut self.state, NQuadsState::ExpectSubject);
        let token = match (state, token) {
            (NQuadsState::RecoverToLineJump, Lexeme::LineJump) => return self,
            (NQuadsState::RecoverToLineJump, Lexeme::Token(_)) => {
                self.state = NQuadsState::RecoverToLineJump;
                return self;
            }
            (NQuadsState::ExpectSubject | NQuadsState::ExpectLineJump, Lexeme::LineJump) => {
                return self;
            }
            (NQuadsState::ExpectLineJump, Lexeme::Token(token)) => {
                errors.push(
                    format!("Only a single triple or quad can be written in a line, found {token:?}")
                        .into(),
                );
                return self.on_token(Lexeme::Token(token), context, results, errors);
            }
            (NQuadsState::ExpectDot, Lexeme::LineJump) => {
                errors.push(GrammarError::missing_terminator("Quads must be followed by a dot"));
                return self;
            }
            (
                NQuadsState::ExpectLiteralAnnotationOrGraphNameOrDot {
                    subject,
                    predicate,
                    value,
                },
                token,
            ) => {
                return match token {
                    Lexeme::Token(TerseToken::LangTag(language)) => {
                        self.state = NQuadsState::ExpectGraphNameOrDot {
                            subject,
                            predicate,
                            object: Literal::new_language_tagged_literal_unchecked(
                                value,
                                language.to_ascii_lowercase(),
                            )
                            .into(),
                        };
                        self
                    }
                    Lexeme::Token(TerseToken::Punctuation("^^")) => {
                        self.state = NQuadsState::ExpectLiteralDatatype {
                            subject,
                            predicate,
                            value,
                        };
                        self
                    }
                    token => {
                        self.state = NQuadsState::ExpectGraphNameOrDot {
                            subject,
                            predicate,
                            object: Literal::new_simple_literal(value).into(),
                        };
                        self.on_token(token, context, results, errors)
                    }
                };
            }
            (
                NQuadsState::ExpectGraphNameOrDot {
                    subject,
                    predicate,
                    object,
                },
                token,
            ) => {
                let graph_name: Option<GraphName> = match &token {
                    Lexeme::Token(TerseToken::IriRef(g)) if context.with_graph_name => {
                        Some(NamedNode::new_unchecked(g.clone()).into())
                    }
                    Lexeme::Token(TerseToken::BlankNodeLabel(g))
                        if context.with_graph_name =>
                    {
                        Some(BlankNode::new_unchecked(*g).into())
                    }
                    _ => None,
                };
                self.state = NQuadsState::ExpectDot;
                return if let Some(graph_name) = graph_name {
                    results.push(Quad::new(subject, predicate, object, graph_name));
                    self
                } else {
                    results.push(Quad::new(subject, predicate, object, GraphName::DefaultGraph));
                    self.on_token(token, context, results, errors)
                };
            }
            (_, Lexeme::LineJump) => {
                // The line jump ends the broken statement, the next line is parsed normally
                errors.push("line jumps are not allowed in the middle of triples".into());
                return self;
            }
            (state, Lexeme::Token(token)) => (state, token),
        };
        match token {
            (NQuadsState::ExpectSubject, TerseToken::IriRef(s)) => {
                self.state = NQuadsState::ExpectPredicate {
                    subject: NamedNode::new_unchecked(s).into(),
                };
                self
            }
            (NQuadsState::ExpectSubject, TerseToken::BlankNodeLabel(s)) => {
                self.state = NQuadsState::ExpectPredicate {
                    subject: BlankNode::new_unchecked(s).into(),
                };
                self
            }
            (NQuadsState::ExpectSubject, _) => self.error(
                context,
                results,
                errors,
                "The subject of a triple must be an IRI or a blank node",
            ),
            (NQuadsState::ExpectPredicate { subject }, TerseToken::IriRef(p)) => {
                self.state = NQuadsState::ExpectObject {
                    subject,
                    predicate: NamedNode::new_unchecked(p),
                };
                self
            }
            (NQuadsState::ExpectPredicate { .. }, _) => self.error(
                context,
                results,
                errors,
                "The predicate of a triple must be an IRI",
            ),
            (NQuadsState::ExpectObject { subject, predicate }, TerseToken::IriRef(o)) => {
                self.state = NQuadsState::ExpectGraphNameOrDot {
                    subject,
                    predicate,
                    object: NamedNode::new_unchecked(o).into(),
                };
                self
            }
            (NQuadsState::ExpectObject { subject, predicate }, TerseToken::BlankNodeLabel(o)) => {
                self.state = NQuadsState::ExpectGraphNameOrDot {
                    subject,
                    predicate,
                    object: BlankNode::new_unchecked(o).into(),
                };
                self
            }
            (NQuadsState::ExpectObject { subject, predicate }, TerseToken::String(value)) => {
                self.state = NQuadsState::ExpectLiteralAnnotationOrGraphNameOrDot {
                    subject,
                    predicate,
                    value,
                };
                self
            }
            (NQuadsState::ExpectObject { .. }, _) => self.error(
                context,
                results,
                errors,
                "The object of a triple must be an IRI, a blank node or a literal",
            ),
            (
                NQuadsState::ExpectLiteralDatatype {
                    subject,
                    predicate,
                    value,
                },
                TerseToken::IriRef(d),
            ) => {
                if d == rdf::LANG_STRING.as_str() {
                    errors.push("The datatype of a literal without a language tag must not be rdf:langString".into());
                }
                self.state = NQuadsState::ExpectGraphNameOrDot {
                    subject,
                    predicate,
                    object: Literal::new_typed_literal(value, NamedNode::new_unchecked(d)).into(),
                };
                self
            }
            (NQuadsState::ExpectLiteralDatatype { .. }, _) => {
                self.error(context, results, errors, "A literal datatype must be an IRI")
            }
            (NQuadsState::ExpectDot, TerseToken::Punctuation(".")) => {
                self.state = NQuadsState::ExpectLineJump;
                self
            }
            (NQuadsState::ExpectDot, _) => {
                self.error(context, results, errors, "Quads must be followed by a dot")
            }
            (
                NQuadsState::ExpectLiteralAnnotationOrGraphNameOrDot { .. }
                | NQuadsState::ExpectGraphNameOrDot { .. }
                | NQuadsState::ExpectLineJump
                | NQuadsState::RecoverToLineJump,
                _,
            ) => unreachable!("already handled"),
        }
    }

    fn on_end(
        self,
        _context: &mut LineContext,
        results: &mut Vec<Quad>,
        errors: &mut Vec<GrammarError>,
    ) {
        match self.state {
            NQuadsState::ExpectSubject
            | NQuadsState::ExpectLineJump
            | NQuadsState::RecoverToLineJump => (),
            NQuadsState::ExpectGraphNameOrDot {
                subject,
                predicate,
                object,
            } => {
                results.push(Quad::new(subject, predicate, object, GraphName::DefaultGraph));
                errors.push(GrammarError::missing_terminator("Triples must be followed by a dot"));
            }
            NQuadsState::ExpectLiteralAnnotationOrGraphNameOrDot {
                subject,
                predicate,
                value,
            } => {
                results.push(Quad::new(
                    subject,
                    predicate,
                    Literal::new_simple_literal(value),
                    GraphName::DefaultGraph,
                ));
                errors.push(GrammarError::missing_terminator("Triples must be followed by a dot"));
            }
            NQuadsState::ExpectDot => {
                errors.push(GrammarError::missing_terminator("Triples must be followed by a dot"));
            }
            NQuadsState::ExpectPredicate { .. }
            | NQuadsState::ExpectObject { .. }
            | NQuadsState::ExpectLiteralDatatype { .. } => {
                errors.push("Unexpected end of file in the middle of a triple".into())
            }
        }
    }

    fn tokenizer_options(context: &LineContext) -> &LexerOptions {
        &context.tokenizer_options
    }
}

impl LineGrammar {
    pub fn new_parser<B>(data: B, is_ending: bool, with_graph_name: bool) -> GrammarParser<B, Self> {
        GrammarParser::new(
            Lexer::new(
                TerseLexer::new(LexerMode::NTriples),
                data,
                is_ending,
                LINE_LEXER,
            ),
            Self {
                state: NQuadsState::ExpectSubject,
            },
            LineContext {
                with_graph_name,
                tokenizer_options: LexerOptions::default(),
            },
        )
    }

    #[must_use]
    fn error(
        self,
        _context: &mut LineContext,
        _results: &mut Vec<Quad>,
        errors: &mut Vec<GrammarError>,
        msg: impl Into<GrammarError>,
    ) -> Self {
        errors.push(msg.into());
        self.recover()
    }
}

/// Writes one statement per line, relabelling the blank nodes.
pub struct LineFormatWriter {
    with_graph_name: bool,
    blank_nodes: BlankNodeRelabeler,
}

impl LineFormatWriter {
    pub fn new(with_graph_name: bool) -> Self {
        Self {
            with_graph_name,
            blank_nodes: BlankNodeRelabeler::new(),
        }
    }

    pub fn serialize_quad(&mut self, quad: &Quad, mut write: impl Write) -> io::Result<()> {
        let format = if self.with_graph_name {
            "N-Quads"
        } else {
            "N-Triples"
        };
        let invalid = |msg: String| {
            io::Error::new(io::ErrorKind::InvalidInput, InvalidTermError::msg(msg))
        };
        if quad.subject.is_variable()
            || matches!(quad.predicate, Predicate::Variable(_))
            || quad.object.is_variable()
        {
            return Err(invalid(format!(
                "{format} does not support variables, found statement {quad}"
            )));
        }
        if !self.with_graph_name && !quad.graph_name.is_default_graph() {
            return Err(invalid(format!(
                "{format} does not support named graphs, found graph {}",
                quad.graph_name
            )));
        }
        let subject: Subject = match &quad.subject {
            Subject::BlankNode(node) => self.blank_nodes.relabel(node).into(),
            subject => subject.clone(),
        };
        let object: Term = match &quad.object {
            Term::BlankNode(node) => self.blank_nodes.relabel(node).into(),
            object => object.clone(),
        };
        match &quad.graph_name {
            GraphName::DefaultGraph => {
                writeln!(write, "{subject} {} {object} .", quad.predicate)
            }
            GraphName::NamedNode(graph_name) => {
                writeln!(write, "{subject} {} {object} {graph_name} .", quad.predicate)
            }
            GraphName::BlankNode(graph_name) => writeln!(
                write,
                "{subject} {} {object} {} .",
                quad.predicate,
                self.blank_nodes.relabel(graph_name)
            ),
        }
    }
}
