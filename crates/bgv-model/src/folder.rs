//! Folder tree: the document, its groups, and the graphs they own.
//!
//! Ownership runs strictly top-down. A child never refers back to its
//! parent; writers address folders with a [`FolderPath`] instead, so the
//! "current folder" of a producer is just a cursor into this tree.

use serde::{Deserialize, Serialize};

use crate::error::ModelError;
use crate::graph::Graph;
use crate::id::FolderPath;
use crate::properties::Properties;

/// Method metadata attached to a group (one method compilation unit).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupMethod {
    /// Fully qualified declaring class, if the producer sent one.
    pub holder: Option<String>,
    pub name: String,
    /// Rendered signature, e.g. `(int, java.lang.String)void`.
    pub signature: String,
    pub access_flags: i32,
    pub bytecodes: Option<Vec<u8>>,
}

/// A named container of graphs and nested groups.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Group {
    pub name: String,
    pub short_name: String,
    pub method: Option<GroupMethod>,
    pub bci: i32,
    pub properties: Properties,
    elements: Vec<FolderElement>,
}

impl Group {
    pub fn new(name: impl Into<String>) -> Self {
        Group {
            name: name.into(),
            ..Group::default()
        }
    }

    /// Graphs directly owned by this group.
    pub fn graphs(&self) -> impl Iterator<Item = &Graph> {
        self.elements.iter().filter_map(FolderElement::as_graph)
    }

    /// Groups directly owned by this group.
    pub fn groups(&self) -> impl Iterator<Item = &Group> {
        self.elements.iter().filter_map(FolderElement::as_group)
    }
}

/// One child of a folder.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum FolderElement {
    Group(Group),
    Graph(Graph),
}

impl FolderElement {
    pub fn name(&self) -> &str {
        match self {
            FolderElement::Group(group) => &group.name,
            FolderElement::Graph(graph) => &graph.title,
        }
    }

    pub fn as_group(&self) -> Option<&Group> {
        match self {
            FolderElement::Group(group) => Some(group),
            FolderElement::Graph(_) => None,
        }
    }

    pub fn as_graph(&self) -> Option<&Graph> {
        match self {
            FolderElement::Graph(graph) => Some(graph),
            FolderElement::Group(_) => None,
        }
    }
}

/// Anything that owns an ordered list of folder elements.
pub trait Folder {
    fn elements(&self) -> &[FolderElement];

    fn elements_mut(&mut self) -> &mut Vec<FolderElement>;

    /// Appends `element` and returns its index within this folder.
    fn add_element(&mut self, element: FolderElement) -> usize {
        let elements = self.elements_mut();
        elements.push(element);
        elements.len() - 1
    }
}

impl Folder for Group {
    fn elements(&self) -> &[FolderElement] {
        &self.elements
    }

    fn elements_mut(&mut self) -> &mut Vec<FolderElement> {
        &mut self.elements
    }
}

/// Root of the folder tree.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Document {
    elements: Vec<FolderElement>,
}

impl Folder for Document {
    fn elements(&self) -> &[FolderElement] {
        &self.elements
    }

    fn elements_mut(&mut self) -> &mut Vec<FolderElement> {
        &mut self.elements
    }
}

impl Document {
    pub fn new() -> Self {
        Document::default()
    }

    /// Looks up the element at `path`. The root path has no element.
    pub fn get(&self, path: &FolderPath) -> Option<&FolderElement> {
        let (&last, parents) = path.indices().split_last()?;
        let mut elements = &self.elements;
        for &idx in parents {
            match elements.get(idx)? {
                FolderElement::Group(group) => elements = &group.elements,
                FolderElement::Graph(_) => return None,
            }
        }
        elements.get(last)
    }

    /// Resolves `path` to a mutable folder (the document or a group).
    pub fn folder_mut(&mut self, path: &FolderPath) -> Result<&mut dyn Folder, ModelError> {
        let mut folder: &mut dyn Folder = self;
        for (depth, &idx) in path.indices().iter().enumerate() {
            let walked = || path.prefix(depth + 1);
            folder = match folder.elements_mut().get_mut(idx) {
                Some(FolderElement::Group(group)) => group as &mut dyn Folder,
                Some(FolderElement::Graph(_)) => {
                    return Err(ModelError::NotAFolder { path: walked() })
                }
                None => return Err(ModelError::FolderNotFound { path: walked() }),
            };
        }
        Ok(folder)
    }

    /// Appends `element` to the folder at `parent` and returns the new
    /// element's path.
    pub fn add_element_at(
        &mut self,
        parent: &FolderPath,
        element: FolderElement,
    ) -> Result<FolderPath, ModelError> {
        let index = self.folder_mut(parent)?.add_element(element);
        Ok(parent.child(index))
    }

    /// All graphs in the tree, depth-first in document order.
    pub fn all_graphs(&self) -> Vec<&Graph> {
        fn walk<'a>(elements: &'a [FolderElement], out: &mut Vec<&'a Graph>) {
            for element in elements {
                match element {
                    FolderElement::Graph(graph) => out.push(graph),
                    FolderElement::Group(group) => walk(&group.elements, out),
                }
            }
        }
        let mut out = Vec::new();
        walk(&self.elements, &mut out);
        out
    }

    pub fn groups(&self) -> impl Iterator<Item = &Group> {
        self.elements.iter().filter_map(FolderElement::as_group)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_element_at_nested_path() {
        let mut doc = Document::new();
        let group = doc
            .add_element_at(&FolderPath::root(), FolderElement::Group(Group::new("outer")))
            .unwrap();
        let inner = doc
            .add_element_at(&group, FolderElement::Group(Group::new("inner")))
            .unwrap();
        let graph = doc
            .add_element_at(&inner, FolderElement::Graph(Graph::new("After parsing")))
            .unwrap();

        assert_eq!(graph.indices(), &[0, 0, 0]);
        assert_eq!(doc.get(&graph).unwrap().name(), "After parsing");
        assert_eq!(doc.all_graphs().len(), 1);
    }

    #[test]
    fn graphs_cannot_own_children() {
        let mut doc = Document::new();
        let graph = doc
            .add_element_at(&FolderPath::root(), FolderElement::Graph(Graph::new("g")))
            .unwrap();
        let err = doc
            .add_element_at(&graph, FolderElement::Graph(Graph::new("h")))
            .unwrap_err();
        assert!(matches!(err, ModelError::NotAFolder { .. }));
    }

    #[test]
    fn missing_folder_is_reported() {
        let mut doc = Document::new();
        let err = doc
            .add_element_at(&FolderPath::root().child(3), FolderElement::Graph(Graph::new("g")))
            .unwrap_err();
        match err {
            ModelError::FolderNotFound { path } => assert_eq!(path.indices(), &[3]),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn all_graphs_walks_depth_first() {
        let mut doc = Document::new();
        let root = FolderPath::root();
        doc.add_element_at(&root, FolderElement::Graph(Graph::new("a")))
            .unwrap();
        let group = doc
            .add_element_at(&root, FolderElement::Group(Group::new("m")))
            .unwrap();
        doc.add_element_at(&group, FolderElement::Graph(Graph::new("b")))
            .unwrap();
        doc.add_element_at(&root, FolderElement::Graph(Graph::new("c")))
            .unwrap();

        let titles: Vec<&str> = doc.all_graphs().iter().map(|g| g.title.as_str()).collect();
        assert_eq!(titles, vec!["a", "b", "c"]);
        assert_eq!(doc.groups().next().unwrap().graphs().count(), 1);
    }
}
