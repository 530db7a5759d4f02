//! Graph: one compilation snapshot of nodes, edges and blocks.
//!
//! [`Graph`] stores its topology in a petgraph `StableGraph` and keeps an
//! `IndexMap` from producer-assigned [`NodeId`]s to petgraph indices, so
//! nodes iterate in the order the producer declared them. All mutations go
//! through `Graph` methods, which keep the id map and the topology in sync.
//!
//! # Blocks
//!
//! Blocks are a second, coarser grouping layered over the nodes. A node is a
//! member of at most one block; [`Graph::ensure_nodes_in_blocks`] sweeps
//! unscheduled nodes into the synthetic [`NO_BLOCK`] block.

use std::collections::HashSet;

use indexmap::IndexMap;
use petgraph::graph::NodeIndex;
use petgraph::stable_graph::StableGraph;
use petgraph::visit::EdgeRef;
use petgraph::{Directed, Direction};
use serde::{Deserialize, Serialize};

use crate::block::{Block, NO_BLOCK};
use crate::edge::{Edge, EdgeKind};
use crate::error::ModelError;
use crate::id::NodeId;
use crate::node::Node;
use crate::properties::Properties;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Graph {
    pub title: String,
    pub properties: Properties,
    topology: StableGraph<Node, Edge, Directed, u32>,
    /// Producer id -> topology index, in declaration order.
    index: IndexMap<NodeId, NodeIndex<u32>>,
    /// Blocks by name, in declaration order.
    blocks: IndexMap<String, Block>,
}

impl Graph {
    pub fn new(title: impl Into<String>) -> Self {
        Graph {
            title: title.into(),
            ..Graph::default()
        }
    }

    pub fn is_duplicate(&self) -> bool {
        self.properties.get("_isDuplicate") == Some("true")
    }

    // -----------------------------------------------------------------------
    // Nodes
    // -----------------------------------------------------------------------

    /// Adds a node, replacing the payload of an existing node with the same
    /// id. Returns the replaced node, if any; its edges are kept.
    pub fn add_node(&mut self, node: Node) -> Option<Node> {
        match self.index.get(&node.id) {
            Some(&idx) => self
                .topology
                .node_weight_mut(idx)
                .map(|slot| std::mem::replace(slot, node)),
            None => {
                let id = node.id;
                let idx = self.topology.add_node(node);
                self.index.insert(id, idx);
                None
            }
        }
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.index
            .get(&id)
            .and_then(|&idx| self.topology.node_weight(idx))
    }

    pub fn node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        match self.index.get(&id) {
            Some(&idx) => self.topology.node_weight_mut(idx),
            None => None,
        }
    }

    pub fn contains_node(&self, id: NodeId) -> bool {
        self.index.contains_key(&id)
    }

    pub fn node_count(&self) -> usize {
        self.index.len()
    }

    /// Iterates nodes in declaration order.
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.index
            .values()
            .filter_map(|&idx| self.topology.node_weight(idx))
    }

    // -----------------------------------------------------------------------
    // Edges
    // -----------------------------------------------------------------------

    /// Adds an edge. Both endpoints must already be nodes of this graph.
    pub fn add_edge(&mut self, edge: Edge) -> Result<(), ModelError> {
        let from = *self
            .index
            .get(&edge.from)
            .ok_or(ModelError::NodeNotFound { id: edge.from })?;
        let to = *self
            .index
            .get(&edge.to)
            .ok_or(ModelError::NodeNotFound { id: edge.to })?;
        self.topology.add_edge(from, to, edge);
        Ok(())
    }

    pub fn edges(&self) -> impl Iterator<Item = &Edge> {
        self.topology.edge_weights()
    }

    pub fn edge_count(&self) -> usize {
        self.topology.edge_count()
    }

    /// Edges arriving at `id`, sorted by target slot.
    pub fn incoming_edges(&self, id: NodeId) -> Vec<&Edge> {
        let Some(&idx) = self.index.get(&id) else {
            return Vec::new();
        };
        let mut edges: Vec<&Edge> = self
            .topology
            .edges_directed(idx, Direction::Incoming)
            .map(|e| e.weight())
            .collect();
        edges.sort_by_key(|e| e.to_index);
        edges
    }

    /// Edges leaving `id`, sorted by source slot.
    pub fn outgoing_edges(&self, id: NodeId) -> Vec<&Edge> {
        let Some(&idx) = self.index.get(&id) else {
            return Vec::new();
        };
        let mut edges: Vec<&Edge> = self
            .topology
            .edges_directed(idx, Direction::Outgoing)
            .map(|e| e.weight())
            .collect();
        edges.sort_by_key(|e| e.from_index);
        edges
    }

    /// Classifies input slot `slot` of node `id`: the leading predecessor
    /// slots receive successor edges, the rest are ordinary inputs.
    pub fn input_slot_kind(&self, id: NodeId, slot: u16) -> Option<EdgeKind> {
        let node = self.node(id)?;
        if u16::from(node.predecessors) > slot {
            Some(EdgeKind::Successor)
        } else {
            Some(EdgeKind::Input)
        }
    }

    // -----------------------------------------------------------------------
    // Blocks
    // -----------------------------------------------------------------------

    /// Returns the block named `name`, creating an empty one if needed.
    pub fn add_block(&mut self, name: impl Into<String>) -> &mut Block {
        let name = name.into();
        self.blocks
            .entry(name.clone())
            .or_insert_with(|| Block::new(name))
    }

    pub fn block(&self, name: &str) -> Option<&Block> {
        self.blocks.get(name)
    }

    pub fn blocks(&self) -> impl Iterator<Item = &Block> {
        self.blocks.values()
    }

    pub fn block_count(&self) -> usize {
        self.blocks.len()
    }

    /// Links block `from` to successor block `to`. Both must exist.
    pub fn add_block_edge(&mut self, from: &str, to: &str) -> Result<(), ModelError> {
        if !self.blocks.contains_key(to) {
            return Err(ModelError::BlockNotFound {
                name: to.to_string(),
            });
        }
        let block = self
            .blocks
            .get_mut(from)
            .ok_or_else(|| ModelError::BlockNotFound {
                name: from.to_string(),
            })?;
        block.successors.push(to.to_string());
        Ok(())
    }

    /// The block `id` is a member of.
    pub fn block_of(&self, id: NodeId) -> Option<&Block> {
        self.blocks.values().find(|b| b.nodes.contains(&id))
    }

    /// Returns `true` if at least one block has a member node.
    pub fn has_scheduled_nodes(&self) -> bool {
        self.blocks.values().any(|b| !b.is_empty())
    }

    /// Places every node that no block contains into the [`NO_BLOCK`]
    /// block, creating it on first use.
    pub fn ensure_nodes_in_blocks(&mut self) {
        let scheduled: HashSet<NodeId> = self
            .blocks
            .values()
            .flat_map(|b| b.nodes.iter().copied())
            .collect();
        let unscheduled: Vec<NodeId> = self
            .index
            .keys()
            .copied()
            .filter(|id| !scheduled.contains(id))
            .collect();
        if unscheduled.is_empty() {
            return;
        }

        self.add_block(NO_BLOCK).nodes.extend(unscheduled.iter().copied());
        for id in unscheduled {
            if let Some(node) = self.node_mut(id) {
                if !node.properties.contains("block") {
                    node.properties.set("block", NO_BLOCK);
                }
            }
        }
    }

    /// Drops all blocks and block links.
    pub fn clear_blocks(&mut self) {
        self.blocks.clear();
    }
}
