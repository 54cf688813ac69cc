use crate::core::Region;
use crate::mondrian::nodes::{LeafNode, SplitNode};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Branch {
    Root,
    Left,
    Right,
}

#[derive(Clone, Debug)]
pub enum NodeKind {
    Leaf(LeafNode),
    Split(SplitNode),
}

/// Structural unit of the partition. Children are owned through the arena;
/// `parent` is a back-reference only.
#[derive(Clone, Debug)]
pub struct Node {
    region: Region,
    extent: f64,
    parent: Option<NodeId>,
    branch: Branch,
    kind: NodeKind,
}

impl Node {
    pub fn new_leaf(region: Region, parent: Option<NodeId>, branch: Branch) -> Self {
        let extent = region.extent();
        Self {
            region,
            extent,
            parent,
            branch,
            kind: NodeKind::Leaf(LeafNode::new()),
        }
    }

    pub fn region(&self) -> &Region {
        &self.region
    }

    pub fn extent(&self) -> f64 {
        self.extent
    }

    pub(crate) fn set_extent(&mut self, extent: f64) {
        self.extent = extent;
    }

    pub(crate) fn add_extent(&mut self, delta: f64) {
        self.extent += delta;
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn branch(&self) -> Branch {
        self.branch
    }

    pub fn kind(&self) -> &NodeKind {
        &self.kind
    }

    pub(crate) fn set_kind(&mut self, kind: NodeKind) {
        self.kind = kind;
    }

    pub fn is_leaf(&self) -> bool {
        matches!(self.kind, NodeKind::Leaf(_))
    }

    pub fn as_leaf(&self) -> Option<&LeafNode> {
        match &self.kind {
            NodeKind::Leaf(leaf) => Some(leaf),
            NodeKind::Split(_) => None,
        }
    }

    pub(crate) fn as_leaf_mut(&mut self) -> Option<&mut LeafNode> {
        match &mut self.kind {
            NodeKind::Leaf(leaf) => Some(leaf),
            NodeKind::Split(_) => None,
        }
    }

    pub fn as_split(&self) -> Option<&SplitNode> {
        match &self.kind {
            NodeKind::Split(split) => Some(split),
            NodeKind::Leaf(_) => None,
        }
    }
}
