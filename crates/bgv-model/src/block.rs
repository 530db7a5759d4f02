//! Blocks: named groupings of nodes inside one graph.

use serde::{Deserialize, Serialize};

use crate::id::NodeId;

/// Name of the synthetic block that collects unscheduled nodes.
pub const NO_BLOCK: &str = "(no block)";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    pub name: String,
    pub nodes: Vec<NodeId>,
    /// Names of successor blocks, in link order.
    pub successors: Vec<String>,
}

impl Block {
    pub fn new(name: impl Into<String>) -> Self {
        Block {
            name: name.into(),
            nodes: Vec::new(),
            successors: Vec::new(),
        }
    }

    /// Display name for a producer block id; negative ids mean "no block".
    pub fn name_for_id(id: i32) -> String {
        if id >= 0 {
            id.to_string()
        } else {
            NO_BLOCK.to_string()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn block_names_from_ids() {
        assert_eq!(Block::name_for_id(0), "0");
        assert_eq!(Block::name_for_id(17), "17");
        assert_eq!(Block::name_for_id(-1), NO_BLOCK);
    }
}
