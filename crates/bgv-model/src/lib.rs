//! Document model for binary graph dumps.
//!
//! A [`Document`] is a folder tree of [`Group`]s (one per compiled method)
//! and [`Graph`]s (one per compilation snapshot). Graphs hold [`Node`]s,
//! [`Edge`]s and [`Block`]s. The model is filled by `bgv-parser` and is
//! otherwise independent of the wire format.

pub mod block;
pub mod edge;
pub mod error;
pub mod folder;
pub mod graph;
pub mod id;
pub mod node;
pub mod properties;

// Re-export commonly used types
pub use block::{Block, NO_BLOCK};
pub use edge::{Edge, EdgeKind};
pub use error::ModelError;
pub use folder::{Document, Folder, FolderElement, Group, GroupMethod};
pub use graph::Graph;
pub use id::{FolderPath, NodeId};
pub use node::Node;
pub use properties::Properties;
