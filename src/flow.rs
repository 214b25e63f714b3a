//! The flow document tree produced by the converter.
//!
//! Nodes live in an arena owned by a [`FlowTree`] and are addressed by
//! [`NodeId`].  A node is created detached and attached to exactly one
//! parent, so the structure reachable from the root is always a tree.

use std::fmt;

/// Handle to a node inside a [`FlowTree`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

/// The kinds of node in a flow document.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FlowKind {
    /// The whole-document root.
    Document,
    /// A group of blocks.
    Section,
    /// A block of inline content.
    Paragraph,
    /// A group of inlines sharing formatting.
    Span,
    /// Plain text.
    Run,
    /// A navigable group of inlines.
    Hyperlink,
    /// A forced line break.
    LineBreak,
    /// A bulleted or numbered list.
    List,
    /// One entry of a list.
    ListItem,
    /// A table.
    Table,
    /// A table column definition.
    TableColumn,
    /// A group of table rows.
    TableRowGroup,
    /// A table row.
    TableRow,
    /// A table cell.
    TableCell,
}

impl FlowKind {
    /// The XAML element name for this kind.
    pub fn element_name(self) -> &'static str {
        use FlowKind::*;
        match self {
            Document => "FlowDocument",
            Section => "Section",
            Paragraph => "Paragraph",
            Span => "Span",
            Run => "Run",
            Hyperlink => "Hyperlink",
            LineBreak => "LineBreak",
            List => "List",
            ListItem => "ListItem",
            Table => "Table",
            TableColumn => "TableColumn",
            TableRowGroup => "TableRowGroup",
            TableRow => "TableRow",
            TableCell => "TableCell",
        }
    }

    /// Returns true for nodes occupying a vertical flow position.
    pub fn is_block(self) -> bool {
        matches!(
            self,
            FlowKind::Section | FlowKind::Paragraph | FlowKind::List | FlowKind::Table
        )
    }

    /// Returns true for nodes flowing within a line.
    pub fn is_inline(self) -> bool {
        matches!(
            self,
            FlowKind::Run | FlowKind::Span | FlowKind::Hyperlink | FlowKind::LineBreak
        )
    }
}

impl fmt::Display for FlowKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.element_name())
    }
}

/// Bullet or numbering scheme of a list.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MarkerStyle {
    /// No marker
    None,
    /// 1, 2, 3
    Decimal,
    /// Filled circle
    Disc,
    /// Hollow circle
    Circle,
    /// Filled square
    Square,
    /// Hollow square
    Box,
    /// a, b, c
    LowerLatin,
    /// A, B, C
    UpperLatin,
    /// i, ii, iii
    LowerRoman,
    /// I, II, III
    UpperRoman,
}

impl MarkerStyle {
    /// Map a CSS `list-style-type` keyword onto a marker.  Unrecognised
    /// keywords give `Disc`.
    pub fn from_css(value: &str) -> MarkerStyle {
        match value.trim().to_ascii_lowercase().as_str() {
            "none" => MarkerStyle::None,
            "decimal" => MarkerStyle::Decimal,
            "disc" => MarkerStyle::Disc,
            "circle" => MarkerStyle::Circle,
            "square" => MarkerStyle::Square,
            "box" => MarkerStyle::Box,
            "lower-latin" => MarkerStyle::LowerLatin,
            "upper-latin" => MarkerStyle::UpperLatin,
            "lower-roman" => MarkerStyle::LowerRoman,
            "upper-roman" => MarkerStyle::UpperRoman,
            _ => MarkerStyle::Disc,
        }
    }

    /// The XAML attribute value.
    pub fn as_str(self) -> &'static str {
        match self {
            MarkerStyle::None => "None",
            MarkerStyle::Decimal => "Decimal",
            MarkerStyle::Disc => "Disc",
            MarkerStyle::Circle => "Circle",
            MarkerStyle::Square => "Square",
            MarkerStyle::Box => "Box",
            MarkerStyle::LowerLatin => "LowerLatin",
            MarkerStyle::UpperLatin => "UpperLatin",
            MarkerStyle::LowerRoman => "LowerRoman",
            MarkerStyle::UpperRoman => "UpperRoman",
        }
    }
}

/// A single node of the flow tree.
#[derive(Clone, Debug)]
pub struct FlowNode {
    kind: FlowKind,
    attributes: Vec<(String, String)>,
    text: String,
    children: Vec<NodeId>,
    parent: Option<NodeId>,
}

impl FlowNode {
    fn new(kind: FlowKind) -> FlowNode {
        FlowNode {
            kind,
            attributes: Vec::new(),
            text: String::new(),
            children: Vec::new(),
            parent: None,
        }
    }

    /// The kind of this node.
    pub fn kind(&self) -> FlowKind {
        self.kind
    }

    /// Formatting attributes in the order they were set.
    pub fn attributes(&self) -> &[(String, String)] {
        &self.attributes
    }

    /// Look up one attribute by name.
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// The text of a `Run`; empty for every other kind.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Child nodes in order.
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    /// The parent, if attached.
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }
}

/// An arena-backed flow document.
#[derive(Clone, Debug)]
pub struct FlowTree {
    nodes: Vec<FlowNode>,
    root: NodeId,
}

impl FlowTree {
    /// Create a tree containing only a root of the given kind.
    pub fn new(root_kind: FlowKind) -> FlowTree {
        FlowTree {
            nodes: vec![FlowNode::new(root_kind)],
            root: NodeId(0),
        }
    }

    /// The root node.
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Make a different node the root.  The node is detached from its
    /// parent first.
    pub fn set_root(&mut self, id: NodeId) {
        self.detach(id);
        self.root = id;
    }

    /// Access a node.
    pub fn node(&self, id: NodeId) -> &FlowNode {
        &self.nodes[id.0]
    }

    /// The kind of a node.
    pub fn kind(&self, id: NodeId) -> FlowKind {
        self.nodes[id.0].kind
    }

    /// Children of a node.
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id.0].children
    }

    /// The last child of a node, if any.
    pub fn last_child(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.0].children.last().copied()
    }

    /// Returns true if the node has at least one child.
    pub fn has_children(&self, id: NodeId) -> bool {
        !self.nodes[id.0].children.is_empty()
    }

    /// Create a new detached node.
    pub fn create(&mut self, kind: FlowKind) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(FlowNode::new(kind));
        id
    }

    /// Create a new detached `Run` holding `text`.
    pub fn create_run(&mut self, text: impl Into<String>) -> NodeId {
        let id = self.create(FlowKind::Run);
        self.nodes[id.0].text = text.into();
        id
    }

    /// Set an attribute, replacing any previous value of the same name.
    pub fn set_attribute(&mut self, id: NodeId, name: &str, value: impl Into<String>) {
        let value = value.into();
        let attrs = &mut self.nodes[id.0].attributes;
        match attrs.iter_mut().find(|(k, _)| k == name) {
            Some(slot) => slot.1 = value,
            None => attrs.push((name.to_string(), value)),
        }
    }

    /// Attach a detached node as the last child of `parent`.
    pub fn append(&mut self, parent: NodeId, child: NodeId) {
        debug_assert!(parent != child);
        debug_assert!(self.nodes[child.0].parent.is_none());
        self.nodes[child.0].parent = Some(parent);
        self.nodes[parent.0].children.push(child);
    }

    /// Detach all children of `id` and return them in order.
    pub fn take_children(&mut self, id: NodeId) -> Vec<NodeId> {
        let children = std::mem::take(&mut self.nodes[id.0].children);
        for &child in &children {
            self.nodes[child.0].parent = None;
        }
        children
    }

    /// Detach a node from its parent.  Does nothing for detached nodes.
    pub fn detach(&mut self, id: NodeId) {
        if let Some(parent) = self.nodes[id.0].parent.take() {
            self.nodes[parent.0].children.retain(|&c| c != id);
        }
    }

    /// All nodes of `kind` reachable from the root, in document order.
    pub fn find_all(&self, kind: FlowKind) -> Vec<NodeId> {
        let mut found = Vec::new();
        let mut stack = vec![self.root];
        while let Some(id) = stack.pop() {
            if self.kind(id) == kind {
                found.push(id);
            }
            stack.extend(self.children(id).iter().rev());
        }
        found
    }

    /// Concatenated text of all runs below `id`.
    pub fn text_content(&self, id: NodeId) -> String {
        let mut text = String::new();
        let mut stack = vec![id];
        while let Some(id) = stack.pop() {
            text.push_str(&self.nodes[id.0].text);
            stack.extend(self.children(id).iter().rev());
        }
        text
    }
}
