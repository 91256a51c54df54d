use crate::error::ConvertError;
use crate::format::FormatRegistry;
use crate::parser::ReaderQuadParser;
use crate::serializer::RdfSerializer;
use rdfjsonld::JsonLdShape;
use rdfterm::PrefixTable;
use std::fs::File;
use std::io::{self, BufReader, BufWriter, Read, Stdout, Write, stdin, stdout};
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, info, warn};

/// Where the statements are read from.
pub enum InputSource {
    /// The process standard input.
    Stdin,
    /// An already opened stream.
    Reader(Box<dyn Read>),
    /// A file, opened when the conversion starts.
    File(PathBuf),
}

/// Where the converted document is written to.
pub enum OutputSink {
    /// The process standard output.
    Stdout,
    /// An already opened stream.
    Writer(Box<dyn Write>),
    /// A file, created or truncated when the conversion starts.
    File(PathBuf),
}

/// A flag shared between a running conversion and the code that may want to stop it.
///
/// ```
/// use rdfconvert::CancellationToken;
///
/// let token = CancellationToken::new();
/// let handle = token.clone();
/// assert!(!token.is_cancelled());
/// handle.cancel();
/// assert!(token.is_cancelled());
/// ```
#[derive(Debug, Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Asks the conversions using this token to stop before their next statement.
    #[inline]
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    #[inline]
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Settings of a conversion.
#[derive(Debug, Clone, Default)]
#[must_use]
pub struct ConvertOptions {
    /// Prefixes the serializer may use. The prefixes declared in the input are not copied.
    pub prefixes: PrefixTable,
    pub pretty: bool,
    pub jsonld_shape: JsonLdShape,
    /// IRI used to resolve the relative IRIs of the input.
    pub base_iri: Option<String>,
    pub cancellation: Option<CancellationToken>,
}

impl ConvertOptions {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn with_prefixes(mut self, prefixes: PrefixTable) -> Self {
        self.prefixes = prefixes;
        self
    }

    #[inline]
    pub fn pretty(mut self) -> Self {
        self.pretty = true;
        self
    }

    #[inline]
    pub fn with_jsonld_shape(mut self, shape: JsonLdShape) -> Self {
        self.jsonld_shape = shape;
        self
    }

    #[inline]
    pub fn with_base_iri(mut self, base_iri: impl Into<String>) -> Self {
        self.base_iri = Some(base_iri.into());
        self
    }

    #[inline]
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = Some(token);
        self
    }
}

/// What a successful conversion did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConversionReport {
    /// Number of statements written.
    pub statements: u64,
}

/// Converts a document from a format to another one, statement by statement.
///
/// Both media types are checked before any I/O is done.
/// The output is flushed whatever the result and output files are synced to disk on success.
/// If the conversion fails, what has already been written is left as is.
///
/// ```
/// use rdfconvert::{ConvertOptions, InputSource, OutputSink, convert};
/// use std::io::Cursor;
///
/// let input = r#"<http://example.com/s> <http://example.com/p> "hello"@en ."#;
/// let report = convert(
///     InputSource::Reader(Box::new(Cursor::new(input))),
///     "application/n-triples",
///     OutputSink::Writer(Box::new(std::io::sink())),
///     "application/ld+json",
///     &ConvertOptions::new(),
/// )?;
/// assert_eq!(report.statements, 1);
/// # Result::<_, rdfconvert::ConvertError>::Ok(())
/// ```
pub fn convert(
    input: InputSource,
    input_format: &str,
    output: OutputSink,
    output_format: &str,
    options: &ConvertOptions,
) -> Result<ConversionReport, ConvertError> {
    let registry = FormatRegistry::global();
    let mut parser = registry.parser_for(input_format)?;
    let mut serializer = registry.serializer_for(output_format)?;
    if let Some(base_iri) = &options.base_iri {
        parser = parser
            .with_base_iri(base_iri.as_str())
            .map_err(|e| ConvertError::invalid_iri(base_iri, e))?;
    }
    for (prefix_name, prefix_iri) in options.prefixes.iter() {
        serializer = serializer
            .with_prefix(prefix_name, prefix_iri)
            .map_err(|e| ConvertError::invalid_iri(prefix_iri, e))?;
    }
    if options.pretty {
        serializer = serializer.pretty();
    }
    serializer = serializer.with_jsonld_shape(options.jsonld_shape);
    debug!(
        input = %parser.format(),
        output = %serializer.format(),
        pretty = options.pretty,
        prefixes = options.prefixes.len(),
        "starting conversion"
    );

    let reader = open_input(input).map_err(ConvertError::Io)?;
    let mut output = open_output(output).map_err(ConvertError::Io)?;
    let result = transfer(
        parser.for_reader(reader),
        serializer,
        &mut output,
        options.cancellation.as_ref(),
    );
    let closed = output.close(result.is_ok());
    let statements = result?;
    closed.map_err(ConvertError::from_output)?;
    info!(statements, "conversion done");
    Ok(ConversionReport { statements })
}

fn transfer<R: Read>(
    parser: ReaderQuadParser<R>,
    serializer: RdfSerializer,
    output: impl Write,
    cancellation: Option<&CancellationToken>,
) -> Result<u64, ConvertError> {
    let mut writer = serializer.for_writer(output);
    let mut statements = 0;
    for quad in parser {
        if cancellation.is_some_and(CancellationToken::is_cancelled) {
            warn!(statements, "conversion cancelled");
            return Err(ConvertError::Cancelled);
        }
        let quad = quad?;
        writer
            .serialize_quad(&quad)
            .map_err(ConvertError::from_output)?;
        statements += 1;
    }
    if cancellation.is_some_and(CancellationToken::is_cancelled) {
        warn!(statements, "conversion cancelled");
        return Err(ConvertError::Cancelled);
    }
    writer.finish().map_err(ConvertError::from_output)?;
    Ok(statements)
}

fn open_input(input: InputSource) -> io::Result<BufReader<Box<dyn Read>>> {
    Ok(BufReader::new(match input {
        InputSource::Stdin => Box::new(stdin().lock()),
        InputSource::Reader(reader) => reader,
        InputSource::File(path) => Box::new(File::open(path)?),
    }))
}

fn open_output(output: OutputSink) -> io::Result<Output> {
    Ok(match output {
        OutputSink::Stdout => Output::Stdout(BufWriter::new(stdout())),
        OutputSink::Writer(writer) => Output::Writer(BufWriter::new(writer)),
        OutputSink::File(path) => Output::File(BufWriter::new(File::create(path)?)),
    })
}

enum Output {
    Stdout(BufWriter<Stdout>),
    Writer(BufWriter<Box<dyn Write>>),
    File(BufWriter<File>),
}

impl Output {
    /// Flushes everything already written and syncs files if `sync` is set.
    fn close(self, sync: bool) -> io::Result<()> {
        match self {
            Self::Stdout(mut writer) => writer.flush(),
            Self::Writer(mut writer) => writer.flush(),
            Self::File(writer) => {
                let mut file = writer.into_inner().map_err(io::IntoInnerError::into_error)?;
                file.flush()?;
                if sync {
                    file.sync_all()?;
                }
                Ok(())
            }
        }
    }
}

impl Write for Output {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            Self::Stdout(writer) => writer.write(buf),
            Self::Writer(writer) => writer.write(buf),
            Self::File(writer) => writer.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            Self::Stdout(writer) => writer.flush(),
            Self::Writer(writer) => writer.flush(),
            Self::File(writer) => writer.flush(),
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::panic_in_result_fn)]

    use super::*;
    use std::cell::RefCell;
    use std::io::Cursor;
    use std::rc::Rc;

    /// A writer whose content stays readable after it has been given to the pipeline.
    #[derive(Clone, Default)]
    struct SharedBuffer(Rc<RefCell<Vec<u8>>>);

    impl SharedBuffer {
        fn content(&self) -> String {
            String::from_utf8_lossy(&self.0.borrow()).into_owned()
        }
    }

    impl Write for SharedBuffer {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.borrow_mut().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    struct ClosedPipe;

    impl Write for ClosedPipe {
        fn write(&mut self, _: &[u8]) -> io::Result<usize> {
            Err(io::ErrorKind::BrokenPipe.into())
        }

        fn flush(&mut self) -> io::Result<()> {
            Err(io::ErrorKind::BrokenPipe.into())
        }
    }

    fn run(
        input: &str,
        input_format: &str,
        output_format: &str,
        options: &ConvertOptions,
    ) -> (Result<ConversionReport, ConvertError>, String) {
        let buffer = SharedBuffer::default();
        let result = convert(
            InputSource::Reader(Box::new(Cursor::new(input.to_owned()))),
            input_format,
            OutputSink::Writer(Box::new(buffer.clone())),
            output_format,
            options,
        );
        (result, buffer.content())
    }

    #[test]
    fn test_formats_are_checked_first() {
        let (result, output) = run("", "text/csv", "text/turtle", &ConvertOptions::new());
        assert!(matches!(result, Err(ConvertError::UnsupportedFormat(_))));
        assert!(output.is_empty());

        let (result, _) = run("", "text/turtle", "text/html", &ConvertOptions::new());
        let Err(ConvertError::UnsupportedFormat(error)) = result else {
            panic!("HTML is not writable")
        };
        assert_eq!(
            error.to_string(),
            "text/html (RDFa) is not supported as an output format"
        );
    }

    #[test]
    fn test_input_file_not_found_is_an_io_error() {
        let result = convert(
            InputSource::File("/this/file/does/not/exist.ttl".into()),
            "text/turtle",
            OutputSink::Writer(Box::new(io::sink())),
            "application/n-triples",
            &ConvertOptions::new(),
        );
        assert!(matches!(result, Err(ConvertError::Io(_))));
    }

    #[test]
    fn test_parse_error_keeps_written_output() {
        let (result, output) = run(
            "<http://example.com/s> <http://example.com/p> <http://example.com/o> .\n<http://example.com/s> <http://example.com/p> .\n",
            "application/n-triples",
            "application/n-triples",
            &ConvertOptions::new(),
        );
        assert!(matches!(result, Err(ConvertError::Parse(_))));
        assert_eq!(
            output,
            "<http://example.com/s> <http://example.com/p> <http://example.com/o> .\n"
        );
    }

    #[test]
    fn test_named_graph_to_turtle_is_an_invalid_term() {
        let (result, _) = run(
            "<http://example.com/s> <http://example.com/p> <http://example.com/o> <http://example.com/g> .\n",
            "application/n-quads",
            "text/turtle",
            &ConvertOptions::new(),
        );
        assert!(matches!(result, Err(ConvertError::InvalidTerm(_))));
    }

    #[test]
    fn test_invalid_options() {
        let (result, _) = run(
            "",
            "text/turtle",
            "text/turtle",
            &ConvertOptions::new().with_base_iri("not an absolute IRI"),
        );
        assert!(matches!(result, Err(ConvertError::InvalidTerm(_))));

        let (result, _) = run(
            "",
            "text/turtle",
            "text/turtle",
            &ConvertOptions::new().with_prefixes([("ex", "not an IRI")].into_iter().collect()),
        );
        assert!(matches!(result, Err(ConvertError::InvalidTerm(_))));
    }

    #[test]
    fn test_cancelled_before_start() {
        let token = CancellationToken::new();
        token.cancel();
        let (result, output) = run(
            "<http://example.com/s> <http://example.com/p> <http://example.com/o> .\n",
            "application/n-triples",
            "application/n-triples",
            &ConvertOptions::new().with_cancellation(token),
        );
        assert!(matches!(result, Err(ConvertError::Cancelled)));
        assert!(output.is_empty());
    }

    #[test]
    fn test_broken_pipe_is_a_cancellation() {
        let mut input = String::new();
        for i in 0..10_000 {
            input.push_str(&format!(
                "<http://example.com/s{i}> <http://example.com/p> \"{i}\" .\n"
            ));
        }
        let result = convert(
            InputSource::Reader(Box::new(Cursor::new(input))),
            "application/n-triples",
            OutputSink::Writer(Box::new(ClosedPipe)),
            "application/n-triples",
            &ConvertOptions::new(),
        );
        assert!(matches!(result, Err(ConvertError::Cancelled)));
    }

    #[test]
    fn test_statement_count() -> Result<(), ConvertError> {
        let (result, output) = run(
            "@prefix ex: <http://example.com/> .\nex:s ex:p ex:o1, ex:o2 ; a ex:C .",
            "text/turtle",
            "application/n-triples",
            &ConvertOptions::new(),
        );
        assert_eq!(result?.statements, 3);
        assert_eq!(output.lines().count(), 3);
        Ok(())
    }
}
