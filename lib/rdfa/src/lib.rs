#![doc = include_str!("../README.md")]
#![doc(test(attr(deny(warnings))))]
#![cfg_attr(docsrs, feature(doc_auto_cfg))]

mod error;
mod html;
mod initial_context;
mod parser;

pub use crate::error::{RdfaParseError, RdfaSyntaxError};
pub use crate::parser::{RdfaParser, ReaderRdfaParser, SliceRdfaParser};
