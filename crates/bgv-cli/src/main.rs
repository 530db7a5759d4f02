//! Binary graph dump (BGV) inspection CLI.
//!
//! Provides the `bgv` binary with subcommands for decoding BGV streams:
//! `summary` and `dump` read a file, `listen` accepts producer connections
//! on a TCP port and decodes each one as it arrives.
//!
//! `listen` reads its defaults from environment variables:
//! - `BGV_PORT`: listen port (default: "4445")
//! - `BGV_BIND`: bind address (default: "127.0.0.1")

use std::fs::File;
use std::io::{self, BufReader, Read};
use std::net::TcpListener;
use std::path::{Path, PathBuf};
use std::process;

use clap::{Parser, Subcommand};
use serde_json::{json, Value};
use tracing::{error, info, Level};

use bgv_model::{Document, Folder, FolderElement, Graph};
use bgv_parser::{BinaryParser, ParseError, ParserOptions};

const DEFAULT_PORT: u16 = 4445;
const DEFAULT_BIND: &str = "127.0.0.1";

/// Binary graph dump tools.
#[derive(Parser)]
#[command(name = "bgv", about = "Decode and inspect binary graph dumps")]
struct Cli {
    /// Increase log verbosity (-v debug, -vv trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Read buffer size in bytes.
    #[arg(long, global = true)]
    buffer_size: Option<usize>,

    #[command(subcommand)]
    command: Commands,
}

/// Available subcommands.
#[derive(Subcommand)]
enum Commands {
    /// Print the folder tree with per-graph counts as JSON.
    Summary {
        /// Path to the dump file.
        file: PathBuf,
    },

    /// Print every graph in full as JSON.
    Dump {
        /// Path to the dump file.
        file: PathBuf,

        /// Only print graphs with this title.
        #[arg(short, long)]
        graph: Option<String>,
    },

    /// Accept producer connections and summarize each stream.
    Listen {
        /// Port to listen on (default: $BGV_PORT or 4445).
        #[arg(short, long)]
        port: Option<u16>,

        /// Address to bind (default: $BGV_BIND or 127.0.0.1).
        #[arg(short, long)]
        bind: Option<String>,
    },
}

fn main() {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => Level::WARN,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(io::stderr)
        .init();

    let mut options = ParserOptions::default();
    if let Some(size) = cli.buffer_size {
        options = options.buffer_capacity(size);
    }

    let exit_code = match cli.command {
        Commands::Summary { file } => run_summary(&file, options),
        Commands::Dump { file, graph } => run_dump(&file, graph.as_deref(), options),
        Commands::Listen { port, bind } => run_listen(port, bind, options),
    };
    process::exit(exit_code);
}

/// Execute the summary subcommand.
///
/// Returns exit code: 0 = success, 1 = parse error, 3 = I/O error.
fn run_summary(path: &Path, options: ParserOptions) -> i32 {
    match parse_file(path, options) {
        Ok(document) => {
            print_json(&summarize(&document));
            0
        }
        Err(code) => code,
    }
}

/// Execute the dump subcommand. Exit codes as for `summary`.
fn run_dump(path: &Path, title: Option<&str>, options: ParserOptions) -> i32 {
    let document = match parse_file(path, options) {
        Ok(document) => document,
        Err(code) => return code,
    };
    let graphs: Vec<Value> = document
        .all_graphs()
        .into_iter()
        .filter(|g| title.map_or(true, |t| g.title == t))
        .map(dump_graph)
        .collect();
    print_json(&Value::Array(graphs));
    0
}

/// Execute the listen subcommand. Runs until the listener fails.
fn run_listen(port: Option<u16>, bind: Option<String>, options: ParserOptions) -> i32 {
    let port = port.unwrap_or_else(|| {
        std::env::var("BGV_PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(DEFAULT_PORT)
    });
    let bind = bind.unwrap_or_else(|| std::env::var("BGV_BIND").unwrap_or_else(|_| DEFAULT_BIND.to_string()));
    let addr = format!("{}:{}", bind, port);

    let listener = match TcpListener::bind(&addr) {
        Ok(listener) => listener,
        Err(e) => {
            eprintln!("Error: failed to bind {}: {}", addr, e);
            return 3;
        }
    };
    info!("bgv listening on {}", addr);

    for stream in listener.incoming() {
        let stream = match stream {
            Ok(stream) => stream,
            Err(e) => {
                error!(error = %e, "failed to accept connection");
                continue;
            }
        };
        let peer = stream
            .peer_addr()
            .map(|a| a.to_string())
            .unwrap_or_else(|_| "unknown peer".to_string());
        info!(peer = %peer, "producer connected");

        match parse_channel(stream, options) {
            Ok(document) => print_json(&summarize(&document)),
            Err(e) => error!(peer = %peer, error = %e, "stream rejected"),
        }
    }
    0
}

fn parse_channel<R: Read>(channel: R, options: ParserOptions) -> Result<Document, ParseError> {
    BinaryParser::new(channel, Document::new())
        .with_options(options)
        .parse()
}

/// Parses `path`, reporting failures on stderr and mapping them to exit codes.
fn parse_file(path: &Path, options: ParserOptions) -> Result<Document, i32> {
    let file = File::open(path).map_err(|e| {
        eprintln!("Error: failed to open '{}': {}", path.display(), e);
        3
    })?;
    parse_channel(BufReader::new(file), options).map_err(|e| match e {
        ParseError::Io(e) => {
            eprintln!("I/O error: {}", e);
            3
        }
        e => {
            eprintln!("Parse error in '{}': {}", path.display(), e);
            1
        }
    })
}

fn print_json(value: &Value) {
    let json = serde_json::to_string_pretty(value)
        .unwrap_or_else(|e| format!("{{\"error\": \"failed to serialize output: {}\"}}", e));
    println!("{}", json);
}

// ---------------------------------------------------------------------------
// JSON rendering
// ---------------------------------------------------------------------------

fn summarize(document: &Document) -> Value {
    json!({
        "graphs": document.all_graphs().len(),
        "elements": document.elements().iter().map(summarize_element).collect::<Vec<_>>(),
    })
}

fn summarize_element(element: &FolderElement) -> Value {
    match element {
        FolderElement::Group(group) => json!({
            "group": group.name,
            "short_name": group.short_name,
            "method": group.method.as_ref().map(|m| &m.name),
            "elements": group.elements().iter().map(summarize_element).collect::<Vec<_>>(),
        }),
        FolderElement::Graph(graph) => json!({
            "graph": graph.title,
            "nodes": graph.node_count(),
            "edges": graph.edge_count(),
            "blocks": graph.block_count(),
            "duplicate": graph.is_duplicate(),
        }),
    }
}

fn dump_graph(graph: &Graph) -> Value {
    let nodes: Vec<Value> = graph
        .nodes()
        .map(|node| {
            json!({
                "id": node.id.0,
                "name": node.name,
                "class": node.class_name,
                "properties": node.properties,
                "subgraphs": node.subgraphs.iter().map(dump_graph).collect::<Vec<_>>(),
            })
        })
        .collect();
    let edges: Vec<Value> = graph
        .edges()
        .map(|edge| {
            json!({
                "from": edge.from.0,
                "to": edge.to.0,
                "from_index": edge.from_index,
                "to_index": edge.to_index,
                "label": edge.label,
                "type": edge.type_name,
                "kind": edge.kind,
            })
        })
        .collect();
    let blocks: Vec<Value> = graph
        .blocks()
        .map(|block| {
            json!({
                "name": block.name,
                "nodes": block.nodes.iter().map(|id| id.0).collect::<Vec<_>>(),
                "successors": block.successors,
            })
        })
        .collect();
    json!({
        "title": graph.title,
        "properties": graph.properties,
        "duplicate": graph.is_duplicate(),
        "nodes": nodes,
        "edges": edges,
        "blocks": blocks,
    })
}
