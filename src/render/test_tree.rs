//! Arena-backed element tree for renderer tests.

use super::dom::{ComputedStyle, Element, Rect};

#[derive(Debug, Default)]
pub struct NodeData {
    pub tag: String,
    pub attrs: Vec<(String, String)>,
    pub editable: bool,
    pub text: bool,
    pub style: ComputedStyle,
    pub rect: Rect,
    pub parent: Option<usize>,
}

#[derive(Debug, Default)]
pub struct Tree {
    nodes: Vec<NodeData>,
}

impl Tree {
    /// Add a node under `parent` and return its index.
    pub fn add(&mut self, parent: Option<usize>, tag: &str, build: impl FnOnce(&mut NodeData)) -> usize {
        let mut data = NodeData { tag: tag.into(), parent, ..NodeData::default() };
        build(&mut data);
        self.nodes.push(data);
        self.nodes.len() - 1
    }

    pub fn node(&self, id: usize) -> Node<'_> {
        Node { tree: self, id }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Node<'a> {
    tree: &'a Tree,
    pub id: usize,
}

impl Node<'_> {
    fn data(&self) -> &NodeData {
        &self.tree.nodes[self.id]
    }
}

impl Element for Node<'_> {
    fn tag_name(&self) -> &str {
        &self.data().tag
    }

    fn attribute(&self, name: &str) -> Option<&str> {
        self.data()
            .attrs
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    fn is_content_editable(&self) -> bool {
        self.data().editable
    }

    fn has_text_content(&self) -> bool {
        self.data().text
    }

    fn style(&self) -> &ComputedStyle {
        &self.data().style
    }

    fn bounding_rect(&self) -> Rect {
        self.data().rect
    }

    fn parent(&self) -> Option<Self> {
        self.data().parent.map(|id| Node { tree: self.tree, id })
    }
}
