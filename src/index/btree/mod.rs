//! B-tree index implementation.
//!
//! A persistent, insert-only multi-way search tree whose nodes live in a
//! memory-mapped [`MmapArray`](crate::storage::MmapArray):
//! - [`BTree`] - Lookup, insertion, node splits and root promotion
//! - [`Node`] - Leaf and internal node records
//! - [`Comparator`] - Three-way ordering, optionally over foreign query types

mod comparator;
mod node;
mod tree;

pub use comparator::{Comparator, NaturalOrder};
pub use node::{Entry, Node, NodeKind, Split};
pub use tree::BTree;
