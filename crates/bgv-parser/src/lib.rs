//! Streaming decoder for binary graph dumps (BGV).
//!
//! Compilers emit BGV streams to describe their intermediate representation:
//! a tree of groups (one per compiled method) holding graph snapshots, each
//! a set of typed nodes, edges and blocks. This crate decodes such a stream
//! incrementally from any [`std::io::Read`] into a
//! [`bgv_model::Document`].
//!
//! # Architecture
//!
//! Data flows one way:
//!
//! - [`reader`]: fixed-capacity buffer over the byte channel with big-endian
//!   decoders and the running blake3 digest
//! - [`pool`]: the constant pool of interned strings, classes, methods,
//!   fields, signatures, enum values and node-class descriptors
//! - [`parser`]: the record decoder state machine
//! - [`builder`]: graph assembly, edge resolution and block policy
//! - [`naming`]: node display names from name templates
//! - [`digest`]: duplicate-snapshot detection per folder level
//! - [`sink`]: where finished elements go (synchronous or deferred)
//!
//! # Example
//!
//! ```no_run
//! use std::fs::File;
//!
//! let file = File::open("dump.bgv")?;
//! let document = bgv_parser::parse_document(file)?;
//! for graph in document.all_graphs() {
//!     println!("{} ({} nodes)", graph.title, graph.node_count());
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod builder;
pub mod digest;
pub mod error;
pub mod format;
pub mod naming;
pub mod options;
pub mod parser;
pub mod pool;
pub mod reader;
pub mod sink;
pub mod value;

use std::io::Read;

use bgv_model::Document;

// Re-export key types for ergonomic use.
pub use error::{ParseError, Result, TagContext};
pub use options::ParserOptions;
pub use parser::{BinaryParser, ParserState};
pub use pool::{ConstantPool, Length, PoolEntry, PoolKind};
pub use reader::ChunkedReader;
pub use sink::{DeferredSink, DocumentSink, Executor, ImmediateExecutor, NoopMonitor, ParseMonitor, Task};

/// Decodes a complete stream into a new document.
pub fn parse_document<R: Read>(channel: R) -> Result<Document> {
    BinaryParser::new(channel, Document::new()).parse()
}
