use crate::cli::{Args, JsonLdShapeArg, LogFormat};
use anyhow::{Context, bail};
use clap::{CommandFactory, FromArgMatches};
use rdfconvert::{
    ConvertError, ConvertOptions, InputSource, JsonLdShape, OutputSink, RdfFormat, convert,
    guess_format, list_supported_formats,
};
use rdfterm::PrefixTable;
use serde_json::{Map, Value};
use std::ffi::OsStr;
use std::fs::File;
use std::io::{self, BufReader};
use std::path::Path;
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;

mod cli;

pub fn main() -> anyhow::Result<()> {
    let matches = Args::command()
        .after_help(supported_formats_help())
        .get_matches();
    let args = Args::from_arg_matches(&matches).unwrap_or_else(|e| e.exit());
    init_tracing(args.log_format);

    let input_type = media_type(args.input_type.as_deref(), &args.input_file)
        .context("Unable to determine mimetype of input file based on extension")?;
    let output_type = media_type(args.output_type.as_deref(), &args.output_file)
        .context("Unable to determine mimetype of output file based on extension")?;
    debug!(input_type, output_type, "resolved media types");

    let mut prefixes = if let Some(path) = &args.prefixes {
        load_prefixes(path)
            .with_context(|| format!("Invalid prefix file {}", path.display()))?
    } else {
        PrefixTable::new()
    };
    prefixes.extend(args.namespaces);

    let mut options = ConvertOptions::new()
        .with_prefixes(prefixes)
        .with_jsonld_shape(match args.jsonld_shape {
            JsonLdShapeArg::Default => JsonLdShape::Default,
            JsonLdShapeArg::Flattened => JsonLdShape::Flattened,
            JsonLdShapeArg::Framed => JsonLdShape::Framed,
        });
    if args.pretty {
        options = options.pretty();
    }
    if let Some(base) = args.base {
        options = options.with_base_iri(base);
    }

    let input = if is_standard_stream(&args.input_file) {
        InputSource::Stdin
    } else {
        InputSource::File(args.input_file.clone())
    };
    let output = if is_standard_stream(&args.output_file) {
        OutputSink::Stdout
    } else {
        OutputSink::File(args.output_file.clone())
    };
    match convert(input, &input_type, output, &output_type, &options) {
        Ok(_) => Ok(()),
        // broken pipe on the standard output
        Err(ConvertError::Cancelled) if is_standard_stream(&args.output_file) => {
            warn!("the output has been closed before the end of the conversion");
            Ok(())
        }
        Err(e) => Err(e).with_context(|| {
            format!(
                "Failed to convert {} ({input_type}) into {} ({output_type})",
                args.input_file.display(),
                args.output_file.display()
            )
        }),
    }
}

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr);
    match format {
        LogFormat::Text => subscriber.init(),
        LogFormat::Json => subscriber.json().init(),
    }
}

fn supported_formats_help() -> String {
    let mut help = String::from("Supported formats:\nExtension\tMimetype\n");
    for (extension, media_type) in list_supported_formats() {
        let separator = if extension.len() < 7 { "\t\t" } else { "\t" };
        help.extend([".", extension, separator, media_type, "\n"]);
    }
    help
}

fn is_standard_stream(path: &Path) -> bool {
    path.as_os_str() == "-"
}

/// The media type given on the command line, or the one of the file extension.
///
/// An explicit value may be a media type or a file extension like "ttl".
fn media_type(explicit: Option<&str>, path: &Path) -> anyhow::Result<String> {
    if let Some(name) = explicit {
        return Ok(RdfFormat::from_extension(name)
            .map_or_else(|| name.to_owned(), |format| format.media_type().to_owned()));
    }
    if is_standard_stream(path) {
        bail!("The type must be set explicitly when using the standard streams");
    }
    let Some(file_name) = path.file_name().and_then(OsStr::to_str) else {
        bail!("The path {} has no file name", path.display())
    };
    guess_format(file_name)
        .map(str::to_owned)
        .with_context(|| format!("The extension of '{file_name}' is unknown"))
}

fn load_prefixes(path: &Path) -> anyhow::Result<PrefixTable> {
    let file = File::open(path)?;
    let entries: Map<String, Value> = serde_json::from_reader(BufReader::new(file))
        .context("The prefix file must contain a JSON object")?;
    entries
        .into_iter()
        .map(|(prefix, namespace)| match namespace {
            Value::String(namespace) => Ok((prefix, namespace)),
            _ => bail!("The namespace of the prefix '{prefix}' must be a string"),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    #![allow(clippy::panic_in_result_fn)]

    use super::*;
    use assert_fs::NamedTempFile;
    use assert_fs::prelude::*;

    #[test]
    fn test_explicit_media_type() -> anyhow::Result<()> {
        let path = Path::new("-");
        assert_eq!(media_type(Some("ttl"), path)?, "text/turtle");
        assert_eq!(media_type(Some("text/turtle"), path)?, "text/turtle");
        assert_eq!(media_type(Some("foo/bar"), path)?, "foo/bar");
        assert!(media_type(None, path).is_err());
        Ok(())
    }

    #[test]
    fn test_guessed_media_type() -> anyhow::Result<()> {
        assert_eq!(
            media_type(None, Path::new("dir.d/data.JSONLD"))?,
            "application/ld+json"
        );
        assert!(media_type(None, Path::new("data.txt")).is_err());
        assert!(media_type(None, Path::new("data")).is_err());
        Ok(())
    }

    #[test]
    fn test_help_lists_extensions() {
        let help = supported_formats_help();
        assert!(help.contains(".ttl\t\ttext/turtle\n"), "{help}");
        assert!(help.contains(".jsonld\t\tapplication/ld+json\n"), "{help}");
        assert!(help.contains(".json-ld\tapplication/ld+json\n"), "{help}");
    }

    #[test]
    fn test_load_prefixes() -> anyhow::Result<()> {
        let file = NamedTempFile::new("prefixes.json")?;
        file.write_str(r#"{"schema": "http://schema.org/", "ex": "http://example.com/"}"#)?;
        let prefixes = load_prefixes(file.path())?;
        assert_eq!(
            prefixes.iter().collect::<Vec<_>>(),
            [("schema", "http://schema.org/"), ("ex", "http://example.com/")]
        );

        let file = NamedTempFile::new("prefixes.json")?;
        file.write_str(r#"{"schema": 1}"#)?;
        assert!(load_prefixes(file.path()).is_err());
        Ok(())
    }
}
