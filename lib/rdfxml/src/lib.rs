#![doc = include_str!("../README.md")]
#![doc(test(attr(deny(warnings))))]
#![cfg_attr(docsrs, feature(doc_auto_cfg))]

mod error;
mod parser;
mod serializer;
mod utils;

pub use crate::error::{RdfXmlParseError, RdfXmlSyntaxError};
pub use crate::parser::{ReaderRdfXmlParser, RdfXmlParser, SliceRdfXmlParser};
pub use crate::serializer::{RdfXmlSerializer, WriterRdfXmlSerializer};
