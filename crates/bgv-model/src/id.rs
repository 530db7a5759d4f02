//! Identifier newtypes for graph entities.
//!
//! Node ids are assigned by the producing compiler, so they are neither
//! dense nor guaranteed to start at zero. [`NodeId`] wraps the raw `i32`
//! from the stream; [`FolderPath`] addresses an element of the folder tree.

use std::fmt;

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

/// Producer-assigned node identifier, unique within one graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct NodeId(pub i32);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i32> for NodeId {
    fn from(raw: i32) -> Self {
        NodeId(raw)
    }
}

/// Location of a folder element, as child indices walked from the document
/// root. The empty path is the document itself.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FolderPath(SmallVec<[usize; 4]>);

impl FolderPath {
    /// The document root.
    pub fn root() -> Self {
        FolderPath(SmallVec::new())
    }

    /// Path of the `index`-th child of this folder.
    pub fn child(&self, index: usize) -> Self {
        let mut path = self.0.clone();
        path.push(index);
        FolderPath(path)
    }

    /// The first `len` levels of this path.
    pub fn prefix(&self, len: usize) -> Self {
        FolderPath(self.0.iter().copied().take(len).collect())
    }

    /// Number of folder levels below the document.
    pub fn depth(&self) -> usize {
        self.0.len()
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    pub fn indices(&self) -> &[usize] {
        &self.0
    }
}

impl fmt::Display for FolderPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("/")?;
        for (i, idx) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str("/")?;
            }
            write!(f, "{}", idx)?;
        }
        Ok(())
    }
}
