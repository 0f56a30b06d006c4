//! Purpose: `rdfstore` CLI entry point and command dispatch.
//! Role: Binary crate root; parses args, runs commands, emits JSON on stdout.
//! Invariants: Non-interactive errors are emitted as JSON on stderr.
//! Invariants: Process exit code is derived from `api::to_exit_code`.
//! Invariants: Storage access goes through `api::Storage` on an explicit registry.
use std::error::Error as StdError;
use std::fs::File;
use std::io::{self, BufRead, BufReader, IsTerminal};
use std::path::{Path, PathBuf};

use clap::{
    CommandFactory, Parser, Subcommand, ValueEnum, ValueHint,
    error::ErrorKind as ClapErrorKind,
};
use clap_complete::aot::Shell;
use serde::Deserialize;
use serde_json::{Map, Value, json};
use tracing_subscriber::EnvFilter;

mod command_dispatch;

use rdfstore::api::{
    Axis, Error, ErrorKind, Node, Registry, Statement, Storage, register_builtin, to_exit_code,
};

#[derive(Copy, Clone, Debug)]
struct RunOutcome {
    exit_code: i32,
}

impl RunOutcome {
    fn ok() -> Self {
        Self { exit_code: 0 }
    }

    fn with_code(exit_code: i32) -> Self {
        Self { exit_code }
    }
}

fn main() {
    init_tracing();
    let exit_code = match run() {
        Ok(outcome) => outcome.exit_code,
        Err(err) => {
            emit_error(&err);
            to_exit_code(err.kind())
        }
    };
    std::process::exit(exit_code);
}

fn run() -> Result<RunOutcome, Error> {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => match err.kind() {
            ClapErrorKind::DisplayHelp
            | ClapErrorKind::DisplayVersion
            | ClapErrorKind::DisplayHelpOnMissingArgumentOrSubcommand => {
                err.print().map_err(|io_err| {
                    Error::new(ErrorKind::Io)
                        .with_message("failed to write help")
                        .with_source(io_err)
                })?;
                let exit_code = if matches!(
                    err.kind(),
                    ClapErrorKind::DisplayHelpOnMissingArgumentOrSubcommand
                ) {
                    2
                } else {
                    0
                };
                return Ok(RunOutcome::with_code(exit_code));
            }
            _ => {
                return Err(Error::new(ErrorKind::Usage)
                    .with_message(clap_error_summary(&err))
                    .with_hint("Try `rdfstore --help`."));
            }
        },
    };

    let mut registry = Registry::new();
    register_builtin(&mut registry);
    let target = StorageTarget {
        backend: cli.backend,
        options: cli.options,
        name: cli.name,
    };

    let result = command_dispatch::dispatch_command(cli.command, &target, &registry);
    registry.teardown();
    result.map_err(add_internal_hint)
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(io::stderr)
        .with_target(false)
        .try_init();
}

#[derive(Parser)]
#[command(
    name = "rdfstore",
    version,
    about = "Inspect pluggable RDF triple storage backends",
    long_about = r#"Create storages on the bundled backends, load JSON-lines datasets,
match triple patterns and run projections. Output is JSON on stdout."#,
    after_help = r#"EXAMPLES
  $ rdfstore backends
  $ rdfstore --backend hashes smoke
  $ rdfstore find --data triples.jsonl --subject '<http://example.org/alice>'
  $ rdfstore project --data triples.jsonl --axis targets '<http://example.org/alice>' '<http://xmlns.com/foaf/0.1/name>'
  $ rdfstore classify 'ASK { ?s ?p ?o }'

NOTES
  - Terms are written <iri>, _:blank, or as plain literal text
  - Set RUST_LOG=debug to trace storage lifecycle events on stderr"#,
    arg_required_else_help = true
)]
struct Cli {
    #[arg(long, global = true, help = "Storage backend name (default: first registered)")]
    backend: Option<String>,
    #[arg(
        long,
        global = true,
        help = "Backend options, e.g. \"max-size='1000', contexts='yes'\""
    )]
    options: Option<String>,
    #[arg(long, global = true, default_value = "rdfstore", help = "Storage identifier")]
    name: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    #[command(about = "List registered storage backends and their capabilities")]
    Backends,
    #[command(about = "Create, open, close and destroy one storage")]
    Smoke,
    #[command(
        arg_required_else_help = true,
        about = "Print dataset statements matching a triple pattern"
    )]
    Find {
        #[arg(long, help = "JSON-lines dataset file", value_hint = ValueHint::FilePath)]
        data: PathBuf,
        #[arg(long, help = "Bound subject term")]
        subject: Option<String>,
        #[arg(long, help = "Bound predicate term")]
        predicate: Option<String>,
        #[arg(long, help = "Bound object term")]
        object: Option<String>,
    },
    #[command(
        arg_required_else_help = true,
        about = "Print the nodes completing two known terms"
    )]
    Project {
        #[arg(long, help = "JSON-lines dataset file", value_hint = ValueHint::FilePath)]
        data: PathBuf,
        #[arg(long, value_enum, help = "Unknown triple position: sources|arcs|targets")]
        axis: AxisArg,
        #[arg(help = "First known term in subject, predicate, object order")]
        first: String,
        #[arg(help = "Second known term in subject, predicate, object order")]
        second: String,
    },
    #[command(arg_required_else_help = true, about = "Print the result shape of a query text")]
    Classify {
        #[arg(help = "Query text")]
        text: String,
    },
    #[command(arg_required_else_help = true, about = "Generate shell completion scripts")]
    Completion {
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum AxisArg {
    Sources,
    Arcs,
    Targets,
}

impl From<AxisArg> for Axis {
    fn from(value: AxisArg) -> Self {
        match value {
            AxisArg::Sources => Axis::Sources,
            AxisArg::Arcs => Axis::Arcs,
            AxisArg::Targets => Axis::Targets,
        }
    }
}

struct StorageTarget {
    backend: Option<String>,
    options: Option<String>,
    name: String,
}

impl StorageTarget {
    fn create<'r>(&self, registry: &'r Registry) -> Result<Storage<'r>, Error> {
        Storage::new(
            registry,
            self.backend.as_deref(),
            &self.name,
            self.options.as_deref(),
        )
    }
}

/// One dataset line: each term is either a results-format term object or
/// command-line term text.
#[derive(Deserialize)]
struct DatasetRecord {
    subject: TermRecord,
    predicate: TermRecord,
    object: TermRecord,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum TermRecord {
    Node(Node),
    Text(String),
}

impl TermRecord {
    fn into_node(self) -> Node {
        match self {
            TermRecord::Node(node) => node,
            TermRecord::Text(text) => parse_term(&text),
        }
    }
}

fn parse_term(text: &str) -> Node {
    if let Some(iri) = text.strip_prefix('<').and_then(|rest| rest.strip_suffix('>')) {
        return Node::uri(iri);
    }
    if let Some(id) = text.strip_prefix("_:") {
        return Node::blank(id);
    }
    Node::literal(text)
}

fn load_dataset(storage: &mut Storage<'_>, path: &Path) -> Result<usize, Error> {
    let file = File::open(path).map_err(|err| {
        Error::new(ErrorKind::Io)
            .with_message(format!("failed to open dataset {}", path.display()))
            .with_source(err)
    })?;
    let mut loaded = 0;
    for (index, line) in BufReader::new(file).lines().enumerate() {
        let line = line.map_err(|err| {
            Error::new(ErrorKind::Io)
                .with_message(format!("failed to read dataset {}", path.display()))
                .with_source(err)
        })?;
        if line.trim().is_empty() {
            continue;
        }
        let record: DatasetRecord = serde_json::from_str(&line).map_err(|err| {
            Error::new(ErrorKind::Usage)
                .with_message(format!("invalid dataset line {}", index + 1))
                .with_hint("Each line needs subject, predicate and object terms.")
                .with_source(err)
        })?;
        storage.add(Statement::new(
            record.subject.into_node(),
            record.predicate.into_node(),
            record.object.into_node(),
        ))?;
        loaded += 1;
    }
    Ok(loaded)
}

fn node_json(node: &Node) -> Value {
    serde_json::to_value(node).unwrap_or(Value::Null)
}

fn statement_json(statement: &Statement) -> Value {
    let term = |node: Option<&Node>| node.map(node_json).unwrap_or(Value::Null);
    json!({
        "subject": term(statement.subject()),
        "predicate": term(statement.predicate()),
        "object": term(statement.object()),
    })
}

fn emit_json(value: Value) {
    let encoded = if io::stdout().is_terminal() {
        serde_json::to_string_pretty(&value)
    } else {
        serde_json::to_string(&value)
    };
    let json = encoded.unwrap_or_else(|_| "{\"error\":\"json encode failed\"}".to_string());
    println!("{json}");
}

fn emit_error(err: &Error) {
    if io::stderr().is_terminal() {
        eprintln!("{}", error_text(err));
        return;
    }
    let value = error_json(err);
    let json = serde_json::to_string(&value).unwrap_or_else(|_| {
        "{\"error\":{\"kind\":\"Internal\",\"message\":\"json encode failed\"}}".to_string()
    });
    eprintln!("{json}");
}

fn error_message(err: &Error) -> String {
    if let Some(message) = err.message() {
        return message.to_string();
    }
    match err.kind() {
        ErrorKind::Internal => "internal error".to_string(),
        ErrorKind::Usage => "usage error".to_string(),
        ErrorKind::NotFound => "not found".to_string(),
        ErrorKind::AlreadyExists => "already exists".to_string(),
        ErrorKind::Unsupported => "operation not supported by backend".to_string(),
        ErrorKind::Connection => "connection failure".to_string(),
        ErrorKind::Decode => "value could not be decoded".to_string(),
        ErrorKind::Protocol => "unexpected result layout".to_string(),
        ErrorKind::Io => "i/o error".to_string(),
    }
}

fn error_causes(err: &Error) -> Vec<String> {
    let mut causes = Vec::new();
    let mut cur = err.source();
    while let Some(source) = cur {
        causes.push(source.to_string());
        cur = source.source();
    }
    causes
}

fn error_json(err: &Error) -> Value {
    let mut inner = Map::new();
    inner.insert("kind".to_string(), json!(format!("{:?}", err.kind())));
    inner.insert("message".to_string(), json!(error_message(err)));
    if let Some(hint) = err.hint() {
        inner.insert("hint".to_string(), json!(hint));
    }
    if let Some(backend) = err.backend() {
        inner.insert("backend".to_string(), json!(backend));
    }
    let causes = error_causes(err);
    if !causes.is_empty() {
        inner.insert("causes".to_string(), json!(causes));
    }

    let mut outer = Map::new();
    outer.insert("error".to_string(), Value::Object(inner));
    Value::Object(outer)
}

fn error_text(err: &Error) -> String {
    let mut lines = vec![format!("error: {}", error_message(err))];
    if let Some(hint) = err.hint() {
        lines.push(format!("hint: {hint}"));
    }
    if let Some(backend) = err.backend() {
        lines.push(format!("backend: {backend}"));
    }
    if let Some(cause) = error_causes(err).first() {
        lines.push(format!("caused by: {cause}"));
    }
    lines.join("\n")
}

fn clap_error_summary(err: &clap::Error) -> String {
    for line in err.to_string().lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        if let Some(rest) = trimmed.strip_prefix("error:") {
            return rest.trim().to_string();
        }
        return trimmed.to_string();
    }
    "invalid arguments".to_string()
}

fn add_internal_hint(err: Error) -> Error {
    if err.kind() != ErrorKind::Internal || err.hint().is_some() {
        return err;
    }
    err.with_hint(
        "Unexpected internal failure. Retry with RUST_LOG=debug and share command/context if it persists.",
    )
}

#[cfg(test)]
mod tests {
    use super::{Cli, TermRecord, error_json, parse_term};
    use clap::CommandFactory;
    use rdfstore::api::{Error, ErrorKind, Node};

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn terms_parse_by_delimiters() {
        assert_eq!(parse_term("<http://ex/a>"), Node::uri("http://ex/a"));
        assert_eq!(parse_term("_:b0"), Node::blank("b0"));
        assert_eq!(parse_term("plain text"), Node::literal("plain text"));
        assert_eq!(parse_term("<unterminated"), Node::literal("<unterminated"));
    }

    #[test]
    fn dataset_terms_accept_objects_and_text() {
        let text = r#"{"type":"literal","value":"42","datatype":"http://www.w3.org/2001/XMLSchema#integer"}"#;
        let node: TermRecord = serde_json::from_str(text).expect("term object");
        assert_eq!(
            node.into_node(),
            Node::typed_literal("42", "http://www.w3.org/2001/XMLSchema#integer")
        );
        let text: TermRecord = serde_json::from_str(r#""<http://ex/a>""#).expect("term text");
        assert_eq!(text.into_node(), Node::uri("http://ex/a"));
    }

    #[test]
    fn error_json_carries_kind_hint_and_backend() {
        let err = Error::new(ErrorKind::NotFound)
            .with_message("storage backend not found")
            .with_hint("Run `rdfstore backends`.")
            .with_backend("bdb");
        let value = error_json(&err);
        assert_eq!(value["error"]["kind"], "NotFound");
        assert_eq!(value["error"]["backend"], "bdb");
        assert_eq!(value["error"]["hint"], "Run `rdfstore backends`.");
    }
}
