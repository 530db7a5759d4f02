//! Error types for bgv-model.
//!
//! Uses `thiserror` for structured, matchable variants covering the ways a
//! mutation of the document model can be rejected.

use thiserror::Error;

use crate::id::{FolderPath, NodeId};

/// Errors produced by document model mutations.
#[derive(Debug, Error)]
pub enum ModelError {
    /// No element exists at the given folder path.
    #[error("folder not found: {path}")]
    FolderNotFound { path: FolderPath },

    /// The element at the given path is a graph, which cannot own children.
    #[error("element at {path} is not a folder")]
    NotAFolder { path: FolderPath },

    /// A node id was not present in the graph.
    #[error("node not found: {id}")]
    NodeNotFound { id: NodeId },

    /// A block name was not present in the graph.
    #[error("block not found: '{name}'")]
    BlockNotFound { name: String },
}
