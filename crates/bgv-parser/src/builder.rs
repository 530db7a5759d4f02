//! Assembly of decoded nodes, edges and blocks into a [`Graph`].
//!
//! Edges and block links can name nodes and blocks that appear later in
//! the stream (or never), so [`GraphBuilder`] buffers them and resolves
//! everything in [`GraphBuilder::finish`]:
//!
//! 1. Edges whose endpoints both exist are added; the rest are dropped.
//! 2. Block links between existing blocks are connected.
//! 3. Block policy: if any block has a member node, unscheduled nodes are
//!    swept into the `(no block)` block; if no block has members, the
//!    producer left scheduling to the consumer and all blocks are dropped.

use std::collections::HashSet;

use tracing::{trace, warn};

use bgv_model::{Block, Edge, Graph, Node, NodeId};

pub struct GraphBuilder {
    graph: Graph,
    edges: Vec<Edge>,
    block_links: Vec<(i32, i32)>,
    /// Nodes that already belong to a block.
    scheduled: HashSet<NodeId>,
}

impl GraphBuilder {
    pub fn new(title: impl Into<String>) -> Self {
        GraphBuilder {
            graph: Graph::new(title),
            edges: Vec::new(),
            block_links: Vec::new(),
            scheduled: HashSet::new(),
        }
    }

    pub fn add_node(&mut self, node: Node) {
        let id = node.id;
        if self.graph.add_node(node).is_some() {
            warn!(node = %id, graph = %self.graph.title, "node id declared twice, keeping the later node");
        }
    }

    pub fn add_edges(&mut self, edges: impl IntoIterator<Item = Edge>) {
        self.edges.extend(edges);
    }

    /// Creates (or reopens) the block for producer id `id` and returns its name.
    pub fn begin_block(&mut self, id: i32) -> String {
        let name = Block::name_for_id(id);
        self.graph.add_block(name.clone());
        name
    }

    /// Records that block `block` lists node `node`.
    ///
    /// A node is grouped under the first block that lists it; every listing
    /// block's name is appended to its `block` property.
    pub fn add_block_member(&mut self, block: &str, node: i32) {
        let id = NodeId(node);
        if node < 0 || !self.graph.contains_node(id) {
            trace!(node, block, "skipping unknown block member");
            return;
        }
        let first_membership = self.scheduled.insert(id);
        if let Some(n) = self.graph.node_mut(id) {
            let listed = if first_membership {
                block.to_string()
            } else {
                match n.properties.get("block") {
                    Some(previous) => format!("{}, {}", previous, block),
                    None => block.to_string(),
                }
            };
            n.properties.set("block", listed);
        }
        if first_membership {
            self.graph.add_block(block).nodes.push(id);
        }
    }

    /// Buffers a successor link between producer block ids.
    pub fn add_block_link(&mut self, from: i32, to: i32) {
        self.block_links.push((from, to));
    }

    pub fn finish(self) -> Graph {
        let GraphBuilder {
            mut graph,
            edges,
            block_links,
            ..
        } = self;

        let mut dangling = 0usize;
        for edge in edges {
            if graph.add_edge(edge).is_err() {
                dangling += 1;
            }
        }
        if dangling > 0 {
            warn!(graph = %graph.title, dangling, "dropped edges with unknown endpoints");
        }

        for (from, to) in block_links {
            let from = Block::name_for_id(from);
            let to = Block::name_for_id(to);
            if graph.add_block_edge(&from, &to).is_err() {
                trace!(from = %from, to = %to, "dropped link to unknown block");
            }
        }

        if graph.has_scheduled_nodes() {
            graph.ensure_nodes_in_blocks();
        } else if graph.block_count() > 0 {
            trace!(graph = %graph.title, "no block has members, discarding blocks");
            graph.clear_blocks();
        }
        graph
    }
}

#[cfg(test)]
mod tests {
    use bgv_model::NO_BLOCK;

    use super::*;

    fn builder_with_nodes(ids: &[i32]) -> GraphBuilder {
        let mut builder = GraphBuilder::new("g");
        for &id in ids {
            builder.add_node(Node::new(NodeId(id)));
        }
        builder
    }

    #[test]
    fn dangling_edges_are_dropped() {
        let mut builder = builder_with_nodes(&[1, 2]);
        builder.add_edges([
            Edge::input(NodeId(1), NodeId(2), 0, "x", ""),
            Edge::input(NodeId(99), NodeId(2), 1, "y", ""),
        ]);
        let graph = builder.finish();
        assert_eq!(graph.edge_count(), 1);
    }

    #[test]
    fn empty_blocks_are_discarded() {
        let mut builder = builder_with_nodes(&[1, 2]);
        builder.begin_block(0);
        builder.begin_block(1);
        builder.add_block_link(0, 1);
        let graph = builder.finish();
        assert_eq!(graph.block_count(), 0);
        assert!(graph.node(NodeId(1)).unwrap().block().is_none());
    }

    #[test]
    fn unscheduled_nodes_join_no_block() {
        let mut builder = builder_with_nodes(&[1, 2, 3]);
        let name = builder.begin_block(0);
        builder.add_block_member(&name, 1);
        let graph = builder.finish();

        assert_eq!(graph.block_count(), 2);
        assert_eq!(graph.block("0").unwrap().nodes, vec![NodeId(1)]);
        assert_eq!(graph.block(NO_BLOCK).unwrap().nodes, vec![NodeId(2), NodeId(3)]);
        for node in graph.nodes() {
            assert_eq!(
                graph.blocks().filter(|b| b.nodes.contains(&node.id)).count(),
                1,
                "node {} must be in exactly one block",
                node.id
            );
        }
    }

    #[test]
    fn first_block_wins_but_all_names_are_listed() {
        let mut builder = builder_with_nodes(&[1]);
        let b0 = builder.begin_block(0);
        builder.add_block_member(&b0, 1);
        let b1 = builder.begin_block(1);
        builder.add_block_member(&b1, 1);
        let graph = builder.finish();

        assert_eq!(graph.block("0").unwrap().nodes, vec![NodeId(1)]);
        assert!(graph.block("1").unwrap().nodes.is_empty());
        assert_eq!(graph.node(NodeId(1)).unwrap().block(), Some("0, 1"));
    }

    #[test]
    fn block_links_resolve_after_all_blocks_exist() {
        let mut builder = builder_with_nodes(&[1, 2]);
        let b0 = builder.begin_block(0);
        builder.add_block_member(&b0, 1);
        builder.add_block_link(0, 1);
        builder.add_block_link(0, 7);
        let b1 = builder.begin_block(1);
        builder.add_block_member(&b1, 2);
        let graph = builder.finish();

        assert_eq!(graph.block("0").unwrap().successors, vec!["1".to_string()]);
    }

    #[test]
    fn unknown_block_members_are_skipped() {
        let mut builder = builder_with_nodes(&[1]);
        let b0 = builder.begin_block(0);
        builder.add_block_member(&b0, -1);
        builder.add_block_member(&b0, 42);
        builder.add_block_member(&b0, 1);
        let graph = builder.finish();
        assert_eq!(graph.block("0").unwrap().nodes, vec![NodeId(1)]);
    }
}
