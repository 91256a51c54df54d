//! Shared serializer implementation for Turtle, TriG and N3.

use crate::lexer::{is_possible_pn_chars, is_possible_pn_chars_u};
use rdfterm::vocab::{rdf, xsd};
use rdfterm::{
    BlankNode, BlankNodeRelabeler, GraphName, InvalidTermError, Literal, NamedNode, PrefixTable,
    Predicate, Quad, Subject, Term, print_quoted_str,
};
use std::collections::HashMap;
use std::fmt;
use std::io::{self, Write};

#[derive(Clone, Copy, Eq, PartialEq)]
pub enum TerseDialect {
    Turtle,
    TriG,
    N3,
}

impl TerseDialect {
    fn name(self) -> &'static str {
        match self {
            Self::Turtle => "Turtle",
            Self::TriG => "TriG",
            Self::N3 => "N3",
        }
    }
}

/// The statements of a single subject, kept until the subject changes.
struct SubjectGroup {
    graph_name: GraphName,
    subject: Subject,
    predicates: Vec<(Predicate, Vec<Term>)>,
}

pub struct TerseWriter {
    dialect: TerseDialect,
    pretty: bool,
    prefixes: PrefixTable,
    blank_nodes: BlankNodeRelabeler,
    is_header_written: bool,
    current_graph: GraphName,
    group: Option<SubjectGroup>,
    /// N3 formulas content, indexed by the blank node naming them.
    formulas: HashMap<BlankNode, Vec<Quad>>,
    formula_order: Vec<BlankNode>,
}

impl TerseWriter {
    pub fn new(dialect: TerseDialect, prefixes: PrefixTable, pretty: bool) -> Self {
        Self {
            dialect,
            pretty,
            prefixes,
            blank_nodes: BlankNodeRelabeler::new(),
            is_header_written: false,
            current_graph: GraphName::DefaultGraph,
            group: None,
            formulas: HashMap::new(),
            formula_order: Vec::new(),
        }
    }

    pub fn serialize_quad(&mut self, quad: &Quad, mut write: impl Write) -> io::Result<()> {
        self.validate(quad)?;
        self.write_header(&mut write)?;
        if self.dialect == TerseDialect::N3 {
            if let GraphName::BlankNode(formula) = &quad.graph_name {
                if !self.formulas.contains_key(formula) {
                    self.formula_order.push(formula.clone());
                }
                self.formulas
                    .entry(formula.clone())
                    .or_default()
                    .push(quad.clone());
                return Ok(());
            }
        }
        if self.pretty {
            if let Some(group) = &mut self.group {
                if group.graph_name == quad.graph_name && group.subject == quad.subject {
                    if let Some((_, objects)) = group
                        .predicates
                        .iter_mut()
                        .find(|(p, _)| *p == quad.predicate)
                    {
                        objects.push(quad.object.clone());
                    } else {
                        group
                            .predicates
                            .push((quad.predicate.clone(), vec![quad.object.clone()]));
                    }
                    return Ok(());
                }
            }
            self.flush_group(&mut write)?;
            self.open_graph(&quad.graph_name, &mut write)?;
            self.group = Some(SubjectGroup {
                graph_name: quad.graph_name.clone(),
                subject: quad.subject.clone(),
                predicates: vec![(quad.predicate.clone(), vec![quad.object.clone()])],
            });
            Ok(())
        } else {
            self.open_graph(&quad.graph_name, &mut write)?;
            let mut line = String::new();
            if !self.current_graph.is_default_graph() {
                line.push('\t');
            }
            self.push_subject(&quad.subject, &mut line);
            line.push(' ');
            self.push_predicate(&quad.predicate, &mut line);
            line.push(' ');
            self.push_term(&quad.object, &mut line);
            line.push_str(" .\n");
            write.write_all(line.as_bytes())
        }
    }

    pub fn finish(&mut self, mut write: impl Write) -> io::Result<()> {
        self.write_header(&mut write)?;
        self.flush_group(&mut write)?;
        self.open_graph(&GraphName::DefaultGraph, &mut write)?;
        // Formulas that are never used as a term are written as standalone statements
        for formula in std::mem::take(&mut self.formula_order) {
            if self.formulas.contains_key(&formula) {
                let mut line = String::new();
                self.push_term(&Term::from(formula), &mut line);
                line.push_str(" .\n");
                write.write_all(line.as_bytes())?;
            }
        }
        write.flush()
    }

    fn validate(&self, quad: &Quad) -> io::Result<()> {
        let invalid = |msg: String| {
            io::Error::new(io::ErrorKind::InvalidInput, InvalidTermError::msg(msg))
        };
        match (&quad.graph_name, self.dialect) {
            (GraphName::DefaultGraph, _)
            | (_, TerseDialect::TriG)
            | (GraphName::BlankNode(_), TerseDialect::N3) => (),
            (graph_name, dialect) => {
                return Err(invalid(format!(
                    "{} does not support named graphs, found graph {graph_name}",
                    dialect.name()
                )));
            }
        }
        if self.dialect != TerseDialect::N3
            && (quad.subject.is_variable()
                || matches!(quad.predicate, Predicate::Variable(_))
                || quad.object.is_variable())
        {
            return Err(invalid(format!(
                "{} does not support variables, found statement {quad}",
                self.dialect.name()
            )));
        }
        Ok(())
    }

    fn write_header(&mut self, write: &mut impl Write) -> io::Result<()> {
        if self.is_header_written {
            return Ok(());
        }
        self.is_header_written = true;
        for (prefix, namespace) in self.prefixes.iter() {
            writeln!(write, "@prefix {prefix}: <{namespace}> .")?;
        }
        Ok(())
    }

    /// Closes the current graph block and opens the one of `graph_name` if they differ.
    fn open_graph(&mut self, graph_name: &GraphName, write: &mut impl Write) -> io::Result<()> {
        if *graph_name == self.current_graph {
            return Ok(());
        }
        if !self.current_graph.is_default_graph() {
            writeln!(write, "}}")?;
        }
        self.current_graph = graph_name.clone();
        let mut line = String::new();
        match graph_name {
            GraphName::NamedNode(node) => self.push_named_node(node, &mut line),
            GraphName::BlankNode(node) => self.push_blank_node(node, &mut line),
            GraphName::DefaultGraph => return Ok(()),
        }
        line.push_str(" {\n");
        write.write_all(line.as_bytes())
    }

    fn flush_group(&mut self, write: &mut impl Write) -> io::Result<()> {
        let Some(mut group) = self.group.take() else {
            return Ok(());
        };
        // rdf:type first, the other predicates in first-seen order
        group
            .predicates
            .sort_by_key(|(predicate, _)| *predicate != rdf::TYPE);
        let indent = if group.graph_name.is_default_graph() {
            ""
        } else {
            "\t"
        };
        let mut buffer = String::from(indent);
        self.push_subject(&group.subject, &mut buffer);
        for (i, (predicate, objects)) in group.predicates.iter().enumerate() {
            if i == 0 {
                buffer.push(' ');
            } else {
                buffer.push_str(" ;\n");
                buffer.push_str(indent);
                buffer.push('\t');
            }
            if *predicate == rdf::TYPE {
                buffer.push('a');
            } else {
                self.push_predicate(predicate, &mut buffer);
            }
            for (j, object) in objects.iter().enumerate() {
                buffer.push_str(if j == 0 { " " } else { " , " });
                self.push_term(object, &mut buffer);
            }
        }
        buffer.push_str(" .\n");
        write.write_all(buffer.as_bytes())
    }

    fn push_subject(&mut self, subject: &Subject, buffer: &mut String) {
        match subject {
            Subject::NamedNode(node) => self.push_named_node(node, buffer),
            Subject::BlankNode(node) => self.push_blank_node(node, buffer),
            Subject::Variable(variable) => buffer.push_str(&variable.to_string()),
        }
    }

    fn push_predicate(&mut self, predicate: &Predicate, buffer: &mut String) {
        match predicate {
            Predicate::NamedNode(node) => self.push_named_node(node, buffer),
            Predicate::Variable(variable) => buffer.push_str(&variable.to_string()),
        }
    }

    fn push_term(&mut self, term: &Term, buffer: &mut String) {
        match term {
            Term::NamedNode(node) => self.push_named_node(node, buffer),
            Term::BlankNode(node) => self.push_blank_node(node, buffer),
            Term::Literal(literal) => self.push_literal(literal, buffer),
            Term::Variable(variable) => buffer.push_str(&variable.to_string()),
        }
    }

    fn push_named_node(&self, node: &NamedNode, buffer: &mut String) {
        if let Some((prefix, local)) = self.prefixes.compact(node.as_str(), is_turtle_local_name)
        {
            buffer.push_str(prefix);
            buffer.push(':');
            buffer.push_str(local);
        } else {
            buffer.push_str(&node.to_string());
        }
    }

    fn push_blank_node(&mut self, node: &BlankNode, buffer: &mut String) {
        if let Some(content) = self.formulas.remove(node) {
            buffer.push('{');
            for (i, quad) in content.iter().enumerate() {
                buffer.push_str(if i == 0 { " " } else { " . " });
                self.push_subject(&quad.subject, buffer);
                buffer.push(' ');
                self.push_predicate(&quad.predicate, buffer);
                buffer.push(' ');
                self.push_term(&quad.object, buffer);
            }
            buffer.push_str(" }");
        } else {
            buffer.push_str("_:");
            buffer.push_str(self.blank_nodes.label(node));
        }
    }

    fn push_literal(&self, literal: &Literal, buffer: &mut String) {
        let value = literal.value();
        let datatype = literal.datatype();
        let is_inline = if datatype == xsd::BOOLEAN {
            is_turtle_boolean(value)
        } else if datatype == xsd::INTEGER {
            is_turtle_integer(value)
        } else if datatype == xsd::DECIMAL {
            is_turtle_decimal(value)
        } else if datatype == xsd::DOUBLE {
            is_turtle_double(value)
        } else {
            false
        };
        if is_inline {
            buffer.push_str(value);
            return;
        }
        buffer.push_str(&QuotedStr(value).to_string());
        if let Some(language) = literal.language() {
            buffer.push('@');
            buffer.push_str(language);
        } else if !literal.is_plain() {
            buffer.push_str("^^");
            self.push_named_node(&datatype.into_owned(), buffer);
        }
    }
}

struct QuotedStr<'a>(&'a str);

impl fmt::Display for QuotedStr<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        print_quoted_str(self.0, f)
    }
}

/// Checks that `local` can be written as the local part of a prefixed name without escapes.
pub fn is_turtle_local_name(local: &str) -> bool {
    // [168s] PN_LOCAL ::= (PN_CHARS_U | ':' | [0-9] | PLX) ((PN_CHARS | '.' | ':' | PLX)* (PN_CHARS | ':' | PLX))?
    let mut chars = local.chars();
    let Some(first) = chars.next() else {
        return true;
    };
    if !(is_possible_pn_chars_u(first) || first == ':' || first.is_ascii_digit()) {
        return false;
    }
    let mut last = first;
    for c in chars {
        if !(is_possible_pn_chars(c) || c == '.' || c == ':') {
            return false;
        }
        last = c;
    }
    last != '.'
}

fn is_turtle_boolean(value: &str) -> bool {
    matches!(value, "true" | "false")
}

fn is_turtle_integer(value: &str) -> bool {
    // [19]  INTEGER  ::=  [+-]? [0-9]+
    let value = value.strip_prefix(['+', '-']).unwrap_or(value).as_bytes();
    !value.is_empty() && value.iter().all(u8::is_ascii_digit)
}

fn is_turtle_decimal(value: &str) -> bool {
    // [20]  DECIMAL  ::=  [+-]? [0-9]* '.' [0-9]+
    let value = value.strip_prefix(['+', '-']).unwrap_or(value);
    let Some((before, after)) = value.split_once('.') else {
        return false;
    };
    before.bytes().all(|c| c.is_ascii_digit())
        && !after.is_empty()
        && after.bytes().all(|c| c.is_ascii_digit())
}

fn is_turtle_double(value: &str) -> bool {
    // [21]     DOUBLE    ::=  [+-]? ([0-9]+ '.' [0-9]* EXPONENT | '.' [0-9]+ EXPONENT | [0-9]+ EXPONENT)
    // [154s]   EXPONENT  ::=  [eE] [+-]? [0-9]+
    let value = value.strip_prefix(['+', '-']).unwrap_or(value);
    let Some((mantissa, exponent)) = value.split_once(['e', 'E']) else {
        return false;
    };
    let (before, after) = mantissa.split_once('.').unwrap_or((mantissa, ""));
    let exponent = exponent.strip_prefix(['+', '-']).unwrap_or(exponent);
    (!before.is_empty() || !after.is_empty())
        && before.bytes().all(|c| c.is_ascii_digit())
        && after.bytes().all(|c| c.is_ascii_digit())
        && !exponent.is_empty()
        && exponent.bytes().all(|c| c.is_ascii_digit())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_local_names() {
        assert!(is_turtle_local_name(""));
        assert!(is_turtle_local_name("foo.bar"));
        assert!(is_turtle_local_name("123"));
        assert!(!is_turtle_local_name("foo."));
        assert!(!is_turtle_local_name("foo/bar"));
        assert!(!is_turtle_local_name("-foo"));
    }

    #[test]
    fn test_numbers() {
        assert!(is_turtle_integer("-12"));
        assert!(!is_turtle_integer("+"));
        assert!(is_turtle_decimal(".5"));
        assert!(!is_turtle_decimal("5."));
        assert!(is_turtle_double("1.e3"));
        assert!(is_turtle_double("-.5E-2"));
        assert!(!is_turtle_double(".e3"));
        assert!(!is_turtle_double("1.5"));
    }
}
