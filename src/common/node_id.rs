//! Node identifier type.

use std::fmt;

/// Identifies a node by its index in the node store.
///
/// Nodes are addressed by index rather than by pointer: the store may be
/// remapped whenever it grows, but an index stays valid forever.
///
/// # Example
/// ```
/// use persistree::NodeId;
///
/// let id = NodeId::new(42);
/// assert!(!id.is_root());
/// assert!(NodeId::ROOT.is_root());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub u64);

impl NodeId {
    /// The root always lives in slot 0.
    pub const ROOT: NodeId = NodeId(0);

    /// Create a new NodeId.
    #[inline]
    pub fn new(id: u64) -> Self {
        NodeId(id)
    }

    /// Check if this is the root slot.
    #[inline]
    pub fn is_root(&self) -> bool {
        *self == Self::ROOT
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Node({})", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_node_id_new() {
        let id = NodeId::new(42);
        assert_eq!(id.0, 42);
        assert!(!id.is_root());
    }

    #[test]
    fn test_node_id_root() {
        assert!(NodeId::ROOT.is_root());
        assert_eq!(NodeId::new(0), NodeId::ROOT);
    }

    #[test]
    fn test_node_id_display() {
        assert_eq!(format!("{}", NodeId::new(42)), "Node(42)");
    }
}
