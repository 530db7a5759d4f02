//! The record decoder.
//!
//! [`BinaryParser`] walks the top-level records of a stream (begin-group,
//! begin-graph, close-group) and the graph bodies nested inside them,
//! resolving pool references as it goes and handing every finished group
//! and graph to a [`DocumentSink`].
//!
//! The parser owns all of its working state: the read buffer, the constant
//! pool, the open-folder stack and the per-level digests. Folders are
//! addressed by [`FolderPath`]; the parser counts the children it has
//! emitted into each open folder, so it never needs to read the document
//! back and works the same with deferred sinks.

use std::io::Read;
use std::mem;
use std::sync::Arc;

use tracing::{debug, warn};

use bgv_model::{Edge, FolderElement, FolderPath, Graph, Group, GroupMethod, Node, NodeId, Properties};

use crate::builder::GraphBuilder;
use crate::digest::DigestTracker;
use crate::error::{ParseError, Result, TagContext};
use crate::format::*;
use crate::naming::expand_template;
use crate::options::ParserOptions;
use crate::pool::{ConstantPool, Length, Method, NodeClass, PoolKind};
use crate::reader::ChunkedReader;
use crate::sink::{DocumentSink, NoopMonitor, ParseMonitor};
use crate::value::{find_property, render_double, PropertyValue};

/// Where the decoder is in the record structure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParserState {
    /// No group is open.
    Root,
    /// Inside `depth` nested groups.
    InGroup { depth: usize },
    /// Decoding a graph body inside `depth` nested groups.
    InGraph { depth: usize },
}

/// An open folder and the number of children emitted into it so far.
#[derive(Debug)]
struct OpenFolder {
    path: FolderPath,
    children: usize,
}

impl OpenFolder {
    fn new(path: FolderPath) -> Self {
        OpenFolder { path, children: 0 }
    }
}

type PropertyList = Vec<(String, PropertyValue)>;

pub struct BinaryParser<R, S, M = NoopMonitor> {
    reader: ChunkedReader<R>,
    pool: ConstantPool,
    digests: DigestTracker,
    current: OpenFolder,
    parents: Vec<OpenFolder>,
    sink: S,
    monitor: M,
    graphs: usize,
    in_graph: bool,
}

impl<R: Read, S: DocumentSink> BinaryParser<R, S, NoopMonitor> {
    pub fn new(channel: R, sink: S) -> Self {
        BinaryParser {
            reader: ChunkedReader::new(channel),
            pool: ConstantPool::new(),
            digests: DigestTracker::new(),
            current: OpenFolder::new(FolderPath::root()),
            parents: Vec::new(),
            sink,
            monitor: NoopMonitor,
            graphs: 0,
            in_graph: false,
        }
    }
}

impl<R: Read, S: DocumentSink, M: ParseMonitor> BinaryParser<R, S, M> {
    /// Replaces the progress monitor.
    pub fn with_monitor<M2: ParseMonitor>(self, monitor: M2) -> BinaryParser<R, S, M2> {
        BinaryParser {
            reader: self.reader,
            pool: self.pool,
            digests: self.digests,
            current: self.current,
            parents: self.parents,
            sink: self.sink,
            monitor,
            graphs: self.graphs,
            in_graph: self.in_graph,
        }
    }

    /// Applies `options`. Must be called before [`parse`](Self::parse).
    pub fn with_options(mut self, options: ParserOptions) -> Self {
        let channel = self.reader.into_inner();
        self.reader = ChunkedReader::with_capacity(channel, options.buffer_capacity);
        self
    }

    pub fn state(&self) -> ParserState {
        match (self.parents.len(), self.in_graph) {
            (depth, true) => ParserState::InGraph { depth },
            (0, false) => ParserState::Root,
            (depth, false) => ParserState::InGroup { depth },
        }
    }

    fn set_in_graph(&mut self, in_graph: bool) {
        self.in_graph = in_graph;
        let state = self.state();
        self.monitor.state_changed(state);
    }

    /// Decodes records until the channel closes at a record boundary or the
    /// monitor cancels, and returns the sink.
    pub fn parse(mut self) -> Result<S> {
        loop {
            if self.monitor.is_cancelled() {
                debug!(graphs = self.graphs, "parse cancelled");
                break;
            }
            let tag = match self.reader.read_u8() {
                Ok(tag) => tag,
                Err(ParseError::EndOfStream { available: 0, .. }) => {
                    if !self.parents.is_empty() {
                        warn!(open = self.parents.len(), "stream ended with groups still open");
                    }
                    break;
                }
                Err(e) => return Err(e),
            };
            match tag {
                BEGIN_GROUP => self.begin_group()?,
                BEGIN_GRAPH => self.begin_graph()?,
                CLOSE_GROUP => self.close_group()?,
                tag => {
                    return Err(ParseError::UnknownTag {
                        context: TagContext::TopLevel,
                        tag,
                    })
                }
            }
        }
        debug!(
            graphs = self.graphs,
            bytes = self.reader.stream_offset(),
            refills = self.reader.refill_count(),
            "parse finished"
        );
        Ok(self.sink)
    }

    // -----------------------------------------------------------------------
    // Top-level records
    // -----------------------------------------------------------------------

    fn begin_group(&mut self) -> Result<()> {
        let name = self.pool.resolve_string(&mut self.reader)?.unwrap_or_default();
        let short_name = self.pool.resolve_string(&mut self.reader)?.unwrap_or_default();
        self.monitor.set_state(&short_name);
        let method = self.pool.resolve_method(&mut self.reader)?;
        let bci = self.reader.read_i32()?;
        let props = self.read_properties(&name)?;

        let mut group = Group::new(name.clone());
        group.short_name = short_name;
        group.method = method.as_deref().map(group_method);
        group.bci = bci;
        group.properties.set("name", name.clone());
        for (key, value) in props {
            group.properties.set(key, value.render(Length::Long));
        }

        let path = self.attach(FolderElement::Group(group))?;
        debug!(group = %name, path = %path, "group opened");
        let parent = mem::replace(&mut self.current, OpenFolder::new(path));
        self.parents.push(parent);
        self.digests.push_level();
        let state = self.state();
        self.monitor.state_changed(state);
        Ok(())
    }

    fn begin_graph(&mut self) -> Result<()> {
        let title = self.pool.resolve_string(&mut self.reader)?.unwrap_or_default();
        self.monitor.set_state(&title);
        self.set_in_graph(true);
        self.reader.begin_digest();
        let mut graph = self.read_graph_body(&title)?;

        let duplicate = match self.reader.finish_digest() {
            Some(digest) => self.digests.observe(digest),
            None => false,
        };
        graph.properties.set("name", title);
        if duplicate {
            graph.properties.set("_isDuplicate", "true");
        }
        debug!(
            graph = %graph.title,
            nodes = graph.node_count(),
            edges = graph.edge_count(),
            blocks = graph.block_count(),
            duplicate,
            "graph decoded"
        );

        self.set_in_graph(false);
        self.attach(FolderElement::Graph(graph))?;
        self.graphs += 1;
        self.monitor.graph_parsed(self.graphs);
        Ok(())
    }

    fn close_group(&mut self) -> Result<()> {
        let parent = self.parents.pop().ok_or(ParseError::UnbalancedGroups)?;
        let closed = mem::replace(&mut self.current, parent);
        self.digests.pop_level();
        debug!(path = %closed.path, children = closed.children, "group closed");
        let state = self.state();
        self.monitor.state_changed(state);
        Ok(())
    }

    /// Emits `element` into the current folder and returns its path.
    fn attach(&mut self, element: FolderElement) -> Result<FolderPath> {
        self.sink.add_element(&self.current.path, element)?;
        let path = self.current.path.child(self.current.children);
        self.current.children += 1;
        Ok(path)
    }

    // -----------------------------------------------------------------------
    // Graph bodies
    // -----------------------------------------------------------------------

    fn read_graph_body(&mut self, title: &str) -> Result<Graph> {
        let mut builder = GraphBuilder::new(title);
        let node_count = self.reader.read_i32()?;
        for _ in 0..node_count {
            self.read_node(&mut builder)?;
        }
        self.read_blocks(&mut builder)?;
        Ok(builder.finish())
    }

    fn read_node(&mut self, builder: &mut GraphBuilder) -> Result<()> {
        let id = NodeId(self.reader.read_i32()?);
        let class = self
            .pool
            .resolve_node_class(&mut self.reader)?
            .ok_or(ParseError::MissingNodeClass { node: id })?;
        let predecessors = self.reader.read_u8()?;
        let props = self.read_properties(&format!("Node {}", id))?;
        let edges = self.read_edges(id, predecessors, &class)?;

        let mut node = Node::new(id);
        node.name = expand_template(&class.name_template, &edges, |key, length| {
            find_property(&props, key).map(|value| value.render(length))
        });
        node.class_name = class.class_name.clone();
        node.predecessors = predecessors;
        let mut properties = Properties::new();
        for (key, value) in props {
            match value {
                PropertyValue::Subgraph(graph) => node.subgraphs.push(*graph),
                value => properties.set(key, value.render(Length::Long)),
            }
        }
        node.properties = properties;

        builder.add_node(node);
        builder.add_edges(edges);
        Ok(())
    }

    /// Reads the input and successor endpoints of node `id`.
    ///
    /// Slot numbers advance for every endpoint, including skipped ones, so
    /// an absent input still occupies its slot.
    fn read_edges(&mut self, id: NodeId, predecessors: u8, class: &Arc<NodeClass>) -> Result<Vec<Edge>> {
        let mut edges = Vec::new();

        let mut slot: u16 = 0;
        for port in &class.inputs {
            let type_name = port
                .element_type
                .as_ref()
                .map(|t| t.name())
                .unwrap_or_default();
            let count = if port.is_list { self.reader.read_u16()? } else { 1 };
            for j in 0..count {
                let from = self.reader.read_i32()?;
                if from >= 0 {
                    let label = port_label(&port.name, port.is_list, j);
                    let to_index = u16::from(predecessors).wrapping_add(slot);
                    edges.push(Edge::input(NodeId(from), id, to_index, label, type_name.clone()));
                }
                slot = slot.wrapping_add(1);
            }
        }

        let mut slot: u16 = 0;
        for port in &class.successors {
            let count = if port.is_list { self.reader.read_u16()? } else { 1 };
            for j in 0..count {
                let to = self.reader.read_i32()?;
                if to >= 0 {
                    let label = port_label(&port.name, port.is_list, j);
                    edges.push(Edge::successor(id, NodeId(to), slot, label));
                }
                slot = slot.wrapping_add(1);
            }
        }

        Ok(edges)
    }

    fn read_blocks(&mut self, builder: &mut GraphBuilder) -> Result<()> {
        let block_count = self.reader.read_i32()?;
        for _ in 0..block_count {
            let id = self.reader.read_i32()?;
            let name = builder.begin_block(id);
            let node_count = self.reader.read_i32()?;
            for _ in 0..node_count {
                let node = self.reader.read_i32()?;
                builder.add_block_member(&name, node);
            }
            let successor_count = self.reader.read_i32()?;
            for _ in 0..successor_count {
                let to = self.reader.read_i32()?;
                builder.add_block_link(id, to);
            }
        }
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Properties
    // -----------------------------------------------------------------------

    /// Reads a property block. `owner` titles any nested subgraph values.
    fn read_properties(&mut self, owner: &str) -> Result<PropertyList> {
        let count = self.reader.read_u16()?;
        let mut props = Vec::with_capacity(count as usize);
        for _ in 0..count {
            let key = self
                .pool
                .resolve_string(&mut self.reader)?
                .unwrap_or_else(|| "null".to_string());
            let value = self.read_property_value(owner, &key)?;
            props.push((key, value));
        }
        Ok(props)
    }

    fn read_property_value(&mut self, owner: &str, key: &str) -> Result<PropertyValue> {
        let value = match self.reader.read_u8()? {
            PROPERTY_POOL => PropertyValue::Pool(self.pool.resolve(&mut self.reader, PoolKind::Any)?),
            PROPERTY_INT => PropertyValue::Int(self.reader.read_i32()?),
            PROPERTY_LONG => PropertyValue::Long(self.reader.read_i64()?),
            PROPERTY_DOUBLE => PropertyValue::Double(self.reader.read_f64()?),
            PROPERTY_FLOAT => PropertyValue::Float(self.reader.read_f32()?),
            PROPERTY_TRUE => PropertyValue::Bool(true),
            PROPERTY_FALSE => PropertyValue::Bool(false),
            PROPERTY_ARRAY => PropertyValue::Array(self.read_array()?),
            PROPERTY_SUBGRAPH => {
                let title = format!("{} {}", owner, key);
                let mut graph = self.read_graph_body(&title)?;
                graph.properties.set("name", title);
                PropertyValue::Subgraph(Box::new(graph))
            }
            tag => {
                return Err(ParseError::UnknownTag {
                    context: TagContext::PropertyValue,
                    tag,
                })
            }
        };
        Ok(value)
    }

    /// Reads an array value and renders it as `[a, b, c]`.
    fn read_array(&mut self) -> Result<String> {
        let kind = self.reader.read_u8()?;
        if !matches!(kind, PROPERTY_POOL | PROPERTY_INT | PROPERTY_DOUBLE) {
            return Err(ParseError::UnknownTag {
                context: TagContext::ArrayElement,
                tag: kind,
            });
        }
        let count = self.reader.read_i32()?;
        if count < 0 {
            return Ok("null".to_string());
        }
        let mut items = Vec::new();
        for _ in 0..count {
            let item = match kind {
                PROPERTY_INT => self.reader.read_i32()?.to_string(),
                PROPERTY_DOUBLE => render_double(self.reader.read_f64()?),
                _ => match self.pool.resolve(&mut self.reader, PoolKind::Any)? {
                    Some(entry) => entry.render(Length::Long),
                    None => "null".to_string(),
                },
            };
            items.push(item);
        }
        Ok(format!("[{}]", items.join(", ")))
    }
}

fn port_label(name: &str, is_list: bool, index: u16) -> String {
    if is_list {
        format!("{}[{}]", name, index)
    } else {
        name.to_string()
    }
}

fn group_method(method: &Method) -> GroupMethod {
    GroupMethod {
        holder: method.holder.clone(),
        name: method.name.clone(),
        signature: method
            .signature
            .as_ref()
            .map(|s| s.to_string())
            .unwrap_or_default(),
        access_flags: method.access_flags,
        bytecodes: method.bytecodes.clone(),
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use bgv_model::Document;

    use super::*;

    fn parse(bytes: Vec<u8>) -> Result<Document> {
        BinaryParser::new(Cursor::new(bytes), Document::new()).parse()
    }

    fn string(index: u16, s: &str) -> Vec<u8> {
        let mut out = vec![POOL_NEW];
        out.extend(index.to_be_bytes());
        out.push(POOL_STRING);
        out.extend((s.len() as i32).to_be_bytes());
        out.extend(s.as_bytes());
        out
    }

    fn empty_graph(title_index: u16, title: &str) -> Vec<u8> {
        let mut out = vec![BEGIN_GRAPH];
        out.extend(string(title_index, title));
        out.extend(0i32.to_be_bytes());
        out.extend(0i32.to_be_bytes());
        out
    }

    #[test]
    fn empty_stream_is_an_empty_document() {
        let doc = parse(Vec::new()).unwrap();
        assert!(doc.all_graphs().is_empty());
    }

    #[test]
    fn state_starts_at_root() {
        let parser = BinaryParser::new(Cursor::new(Vec::new()), Document::new());
        assert_eq!(parser.state(), ParserState::Root);
    }

    #[test]
    fn top_level_graph_is_attached_with_name() {
        let doc = parse(empty_graph(0, "After parsing")).unwrap();
        let graphs = doc.all_graphs();
        assert_eq!(graphs.len(), 1);
        assert_eq!(graphs[0].title, "After parsing");
        assert_eq!(graphs[0].properties.get("name"), Some("After parsing"));
        assert!(!graphs[0].is_duplicate());
    }

    #[test]
    fn close_without_open_group_is_unbalanced() {
        let err = parse(vec![CLOSE_GROUP]).unwrap_err();
        assert!(matches!(err, ParseError::UnbalancedGroups));
    }

    #[test]
    fn unknown_top_level_tag_is_fatal() {
        let err = parse(vec![0x09]).unwrap_err();
        assert!(matches!(
            err,
            ParseError::UnknownTag {
                context: TagContext::TopLevel,
                tag: 0x09
            }
        ));
    }

    #[test]
    fn truncated_record_is_end_of_stream() {
        let mut bytes = empty_graph(0, "g");
        bytes.truncate(bytes.len() - 2);
        let err = parse(bytes).unwrap_err();
        assert!(err.is_end_of_stream());
    }

    #[test]
    fn array_of_unknown_element_kind_is_rejected() {
        // Group with one property whose array element kind is 0x05.
        let mut bytes = vec![BEGIN_GROUP];
        bytes.extend(string(0, "g"));
        bytes.extend(string(1, "g"));
        bytes.push(POOL_NULL);
        bytes.extend(0i32.to_be_bytes());
        bytes.extend(1u16.to_be_bytes());
        bytes.extend(string(2, "k"));
        bytes.extend([PROPERTY_ARRAY, 0x05]);
        bytes.extend(0i32.to_be_bytes());
        let err = parse(bytes).unwrap_err();
        assert!(matches!(
            err,
            ParseError::UnknownTag {
                context: TagContext::ArrayElement,
                tag: 0x05
            }
        ));
    }
}
