#![doc = include_str!("../README.md")]
#![doc(test(attr(deny(warnings))))]
#![cfg_attr(docsrs, feature(doc_auto_cfg))]

mod blank_node;
mod error;
mod literal;
mod named_node;
mod prefix;
mod relabel;
mod triple;
mod variable;
pub mod vocab;

pub use crate::blank_node::BlankNode;
pub use crate::error::{InvalidTermError, UnknownPrefixError};
pub use crate::literal::{Literal, print_quoted_str};
pub use crate::named_node::{NamedNode, NamedNodeRef};
pub use crate::prefix::PrefixTable;
pub use crate::relabel::BlankNodeRelabeler;
pub use crate::triple::{GraphName, NamedOrBlankNode, Predicate, Quad, Subject, Term, Triple};
pub use crate::variable::Variable;
pub use oxilangtag::LanguageTagParseError;
pub use oxiri::IriParseError;
