mod leaf_node;
mod node;
mod split_node;

pub use leaf_node::LeafNode;
pub use node::{Branch, Node, NodeId, NodeKind};
pub use split_node::SplitNode;
