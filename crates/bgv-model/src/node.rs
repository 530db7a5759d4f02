//! Graph nodes.

use serde::{Deserialize, Serialize};

use crate::graph::Graph;
use crate::id::NodeId;
use crate::properties::Properties;

/// One IR node of a compilation graph.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Node {
    pub id: NodeId,
    /// Display name derived from the node class's name template.
    pub name: String,
    pub class_name: String,
    /// Number of predecessor slots reserved ahead of the input slots.
    pub predecessors: u8,
    pub properties: Properties,
    /// Nested snapshots carried by this node, in declaration order.
    pub subgraphs: Vec<Graph>,
}

impl Node {
    pub fn new(id: NodeId) -> Self {
        Node {
            id,
            name: String::new(),
            class_name: String::new(),
            predecessors: 0,
            properties: Properties::new(),
            subgraphs: Vec::new(),
        }
    }

    /// Name of the block this node was scheduled into, if any. Holds every
    /// declaring block's name when the producer listed the node more than once.
    pub fn block(&self) -> Option<&str> {
        self.properties.get("block")
    }
}
