//! Edge types for compilation graphs.
//!
//! Every [`Edge`] is directed and carries the slot numbers it occupies on
//! both endpoints. Input edges point from the producing node into one of
//! the consumer's input slots; successor edges are control edges from a
//! node's successor slot into the target's predecessor slot (slot 0).

use serde::{Deserialize, Serialize};

use crate::id::NodeId;

/// Distinguishes data/predecessor input edges from control successor edges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EdgeKind {
    /// Value or predecessor input, declared by the consumer's input ports.
    Input,
    /// Control successor, declared by the source's successor ports.
    Successor,
}

/// A directed edge between two nodes of the same graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Edge {
    pub from: NodeId,
    pub to: NodeId,
    /// Fan-out slot on the source node (successor ports only; 0 for inputs).
    pub from_index: u16,
    /// Fan-in slot on the target node.
    pub to_index: u16,
    /// Port name, suffixed with `[j]` for list ports.
    pub label: String,
    /// Input element type, or `"Successor"` for control edges.
    pub type_name: String,
    pub kind: EdgeKind,
}

impl Edge {
    /// Builds an input edge from `from` into slot `to_index` of `to`.
    pub fn input(
        from: NodeId,
        to: NodeId,
        to_index: u16,
        label: impl Into<String>,
        type_name: impl Into<String>,
    ) -> Self {
        Edge {
            from,
            to,
            from_index: 0,
            to_index,
            label: label.into(),
            type_name: type_name.into(),
            kind: EdgeKind::Input,
        }
    }

    /// Builds a successor edge leaving slot `from_index` of `from`.
    pub fn successor(from: NodeId, to: NodeId, from_index: u16, label: impl Into<String>) -> Self {
        Edge {
            from,
            to,
            from_index,
            to_index: 0,
            label: label.into(),
            type_name: "Successor".to_string(),
            kind: EdgeKind::Successor,
        }
    }

    pub fn is_input(&self) -> bool {
        self.kind == EdgeKind::Input
    }

    pub fn is_successor(&self) -> bool {
        self.kind == EdgeKind::Successor
    }

    /// Returns `true` if the label names port `name`, either exactly or as
    /// one element `name[j]` of a list port.
    pub fn label_matches_port(&self, name: &str) -> bool {
        match self.label.strip_prefix(name) {
            Some(rest) => rest.is_empty() || rest.starts_with('['),
            None => false,
        }
    }
}
