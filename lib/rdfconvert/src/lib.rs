#![doc = include_str!("../README.md")]
#![doc(test(attr(deny(warnings))))]
#![cfg_attr(docsrs, feature(doc_auto_cfg))]

mod error;
mod format;
mod parser;
mod pipeline;
mod serializer;

pub use crate::error::{ConvertError, RdfParseError, RdfSyntaxError, UnsupportedFormatError};
pub use crate::format::{
    FormatDescriptor, FormatRegistry, RdfFormat, guess_format, list_supported_formats,
};
pub use crate::parser::{RdfParser, ReaderQuadParser};
pub use crate::pipeline::{
    CancellationToken, ConversionReport, ConvertOptions, InputSource, OutputSink, convert,
};
pub use crate::serializer::{RdfSerializer, WriterQuadSerializer};
pub use rdfjsonld::JsonLdShape;
pub use rdfttl::TextPosition;
