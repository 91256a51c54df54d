use clap::{Parser, ValueEnum, ValueHint};
use std::path::PathBuf;

#[derive(Parser)]
#[command(about, version, name = "rdf-formatter")]
/// Convert RDF documents from one serialization format to another
pub struct Args {
    /// File to convert from, `-` to read the standard input
    #[arg(value_hint = ValueHint::FilePath)]
    pub input_file: PathBuf,
    /// File to convert to, `-` to write to the standard output
    #[arg(value_hint = ValueHint::FilePath)]
    pub output_file: PathBuf,
    /// Media type of the input like "text/turtle"
    ///
    /// A file extension like "ttl" is also accepted.
    /// By default, the format is guessed from the input file extension.
    #[arg(short, long, value_name = "MIMETYPE")]
    pub input_type: Option<String>,
    /// Media type of the output like "application/ld+json"
    ///
    /// A file extension like "jsonld" is also accepted.
    /// By default, the format is guessed from the output file extension.
    #[arg(short, long, value_name = "MIMETYPE")]
    pub output_type: Option<String>,
    /// JSON file mapping prefix names to namespaces, used to shorten the output IRIs
    ///
    /// For example: {"schema": "http://schema.org/"}
    #[arg(long, value_name = "JSON_FILE", value_hint = ValueHint::FilePath)]
    pub prefixes: Option<PathBuf>,
    /// Prefix used to shorten the output IRIs, overriding the ones of --prefixes
    ///
    /// The text before the first "=" is the prefix name, the rest is the namespace IRI.
    #[arg(long = "ns", value_name = "PREFIX=IRI", value_parser = parse_namespace)]
    pub namespaces: Vec<(String, String)>,
    /// Group statements by subject and indent them
    #[arg(long)]
    pub pretty: bool,
    /// Shape of the JSON-LD output
    #[arg(long, value_enum, default_value_t = JsonLdShapeArg::Default)]
    pub jsonld_shape: JsonLdShapeArg,
    /// Base IRI used to resolve the relative IRIs of the input
    #[arg(long, value_name = "IRI", value_hint = ValueHint::Url)]
    pub base: Option<String>,
    /// Format of the log messages written to the standard error
    ///
    /// The verbosity is set with the RUST_LOG environment variable.
    #[arg(long, value_enum, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum JsonLdShapeArg {
    /// An array of node objects, one per run of statements sharing a subject
    Default,
    /// One node object per subject
    Flattened,
    /// Flattened, with the blank nodes used once embedded where they are used
    Framed,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum LogFormat {
    Text,
    Json,
}

fn parse_namespace(value: &str) -> Result<(String, String), String> {
    let Some((prefix, iri)) = value.split_once('=') else {
        return Err(format!("'{value}' is not of the form PREFIX=IRI"));
    };
    if iri.is_empty() {
        return Err(format!("the prefix '{prefix}' has an empty IRI"));
    }
    Ok((prefix.into(), iri.into()))
}
