#![doc = include_str!("../README.md")]
#![doc(test(attr(deny(warnings))))]
#![cfg_attr(docsrs, feature(doc_auto_cfg))]

mod context;
mod error;
mod from_rdf;
mod to_rdf;

pub use crate::error::{JsonLdParseError, JsonLdSyntaxError};
pub use crate::from_rdf::{JsonLdSerializer, JsonLdShape, WriterJsonLdSerializer};
pub use crate::to_rdf::{JsonLdParser, ReaderJsonLdParser, SliceJsonLdParser};

/// Maximal nesting of JSON arrays and objects.
pub(crate) const MAX_NESTING_DEPTH: usize = 128;
