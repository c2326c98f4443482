//! B-tree node model.
//!
//! A [`Node`] is either a leaf (`key -> value` entries) or an internal node
//! (`key -> child` routing entries). In memory the entries are a `Vec` of at
//! most `N` elements; on disk every node is a fixed-size record with `N`
//! slots, of which the first `key_count` are meaningful.
//!
//! # Record Layout
//! ```text
//! Offset  Size                    Field
//! ------  ----                    -----
//! 0       1                       kind (1 = leaf, 2 = internal)
//! 1       4                       key_count (u32, little-endian)
//! 5       N × (K + max(V, 8))     slots: key bytes, then value or child id
//! ```
//! Unused slots are zero-filled.
//!
//! # Routing
//! In an internal node, `entries[i].key` for `i >= 1` is the smallest key
//! reachable through `entries[i].value`. `entries[0].key` is only a
//! placeholder: lookups that sort before `entries[1].key` always go left.

use std::cmp::Ordering;

use crate::common::{Error, NodeId, Result};
use crate::index::btree::comparator::Comparator;
use crate::storage::Record;

/// One key and what it maps to: a value in a leaf, a child in an internal node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Entry<K, T> {
    pub key: K,
    pub value: T,
}

impl<K, T> Entry<K, T> {
    pub fn new(key: K, value: T) -> Self {
        Self { key, value }
    }
}

/// Node kind tag as persisted in byte 0 of a node record.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Leaf = 1,
    Internal = 2,
}

impl NodeKind {
    /// Convert from u8, or `None` for an unknown tag.
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            1 => Some(NodeKind::Leaf),
            2 => Some(NodeKind::Internal),
            _ => None,
        }
    }
}

/// A tree node with fanout `N`.
#[derive(Debug, Clone, PartialEq)]
pub enum Node<K, V, const N: usize> {
    Leaf(Vec<Entry<K, V>>),
    Internal(Vec<Entry<K, NodeId>>),
}

/// Where a full node's entries were divided.
///
/// `left` keeps the lower half, `right` is the freshly appended sibling and
/// `key` is the first key of `right`, used by the parent as separator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Split<K> {
    pub left: NodeId,
    pub right: NodeId,
    pub key: K,
}

impl<K, V, const N: usize> Node<K, V, N> {
    const NODE_HEADER_SIZE: usize = 5;

    /// An empty leaf.
    pub fn new_leaf() -> Self {
        Node::Leaf(Vec::with_capacity(N))
    }

    /// An internal node over the given routing entries.
    pub fn new_internal(entries: Vec<Entry<K, NodeId>>) -> Self {
        Node::Internal(entries)
    }

    #[inline]
    pub fn kind(&self) -> NodeKind {
        match self {
            Node::Leaf(_) => NodeKind::Leaf,
            Node::Internal(_) => NodeKind::Internal,
        }
    }

    #[inline]
    pub fn is_leaf(&self) -> bool {
        matches!(self, Node::Leaf(_))
    }

    /// Number of entries in use (`key_count`).
    #[inline]
    pub fn len(&self) -> usize {
        match self {
            Node::Leaf(entries) => entries.len(),
            Node::Internal(entries) => entries.len(),
        }
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[inline]
    pub fn is_full(&self) -> bool {
        self.len() >= N
    }

    /// Key of entry `index`.
    ///
    /// # Panics
    /// Panics if `index >= len()`.
    #[inline]
    pub fn key(&self, index: usize) -> &K {
        match self {
            Node::Leaf(entries) => &entries[index].key,
            Node::Internal(entries) => &entries[index].key,
        }
    }

    /// Key of entry 0, if any.
    #[inline]
    pub fn first_key(&self) -> Option<&K> {
        if self.is_empty() {
            None
        } else {
            Some(self.key(0))
        }
    }

    /// Child of routing entry `index`, or `None` for leaves.
    #[inline]
    pub fn child(&self, index: usize) -> Option<NodeId> {
        match self {
            Node::Leaf(_) => None,
            Node::Internal(entries) => entries.get(index).map(|entry| entry.value),
        }
    }

    /// Overwrite the key of entry `index`.
    pub fn set_key(&mut self, index: usize, key: K) {
        match self {
            Node::Leaf(entries) => entries[index].key = key,
            Node::Internal(entries) => entries[index].key = key,
        }
    }

    /// Smallest index whose key is not less than `query`.
    ///
    /// This is both the insertion point and, when the key there compares
    /// equal, the index of an exact match. Binary search: O(log N)
    /// comparator calls, zero on an empty node.
    pub fn find_position<C, Q>(&self, comparator: &C, query: &Q) -> usize
    where
        C: Comparator<K, Q>,
        Q: ?Sized,
    {
        let below = |key: &K| comparator.compare(key, query) == Ordering::Less;
        match self {
            Node::Leaf(entries) => entries.partition_point(|entry| below(&entry.key)),
            Node::Internal(entries) => entries.partition_point(|entry| below(&entry.key)),
        }
    }

    /// Whether entry `position` (as returned by `find_position`) equals `query`.
    pub fn matches_at<C, Q>(&self, position: usize, comparator: &C, query: &Q) -> bool
    where
        C: Comparator<K, Q>,
        Q: ?Sized,
    {
        position < self.len() && comparator.compare(self.key(position), query) == Ordering::Equal
    }

    /// Routing slot to descend through for `query` in an internal node.
    ///
    /// An exact match on a routing key goes straight into that subtree;
    /// anything else goes one slot left of the insertion point, clamped at 0.
    pub fn route<C, Q>(&self, comparator: &C, query: &Q) -> usize
    where
        C: Comparator<K, Q>,
        Q: ?Sized,
    {
        let position = self.find_position(comparator, query);
        if self.matches_at(position, comparator, query) {
            position
        } else {
            position.saturating_sub(1)
        }
    }

    /// Move the upper `N - N/2` entries into a new node of the same kind.
    ///
    /// `self` keeps the lower `N/2` entries.
    pub fn split_off_upper(&mut self) -> Self {
        let at = self.len() / 2;
        match self {
            Node::Leaf(entries) => {
                let mut upper = Vec::with_capacity(N);
                upper.extend(entries.drain(at..));
                Node::Leaf(upper)
            }
            Node::Internal(entries) => {
                let mut upper = Vec::with_capacity(N);
                upper.extend(entries.drain(at..));
                Node::Internal(upper)
            }
        }
    }

    /// Insert a routing entry at `position`, shifting later entries right.
    ///
    /// # Panics
    /// Panics on a leaf.
    pub fn insert_child(&mut self, position: usize, key: K, child: NodeId) {
        match self {
            Node::Internal(entries) => entries.insert(position, Entry::new(key, child)),
            Node::Leaf(_) => panic!("insert_child on a leaf node"),
        }
    }

    /// Insert a value entry at `position`, shifting later entries right.
    ///
    /// # Panics
    /// Panics on an internal node.
    pub fn insert_value(&mut self, position: usize, key: K, value: V) {
        match self {
            Node::Leaf(entries) => entries.insert(position, Entry::new(key, value)),
            Node::Internal(_) => panic!("insert_value on an internal node"),
        }
    }
}

const fn max_size(a: usize, b: usize) -> usize {
    if a > b {
        a
    } else {
        b
    }
}

impl<K: Record, V: Record, const N: usize> Node<K, V, N> {
    const SLOT_SIZE: usize = K::ENCODED_SIZE + max_size(V::ENCODED_SIZE, NodeId::ENCODED_SIZE);

    fn encode_entries<T: Record>(entries: &[Entry<K, T>], buf: &mut [u8]) {
        for (i, entry) in entries.iter().enumerate() {
            let offset = Self::NODE_HEADER_SIZE + i * Self::SLOT_SIZE;
            entry.key.encode_to(&mut buf[offset..]);
            entry
                .value
                .encode_to(&mut buf[offset + K::ENCODED_SIZE..]);
        }
    }

    fn decode_entries<T: Record>(count: usize, buf: &[u8]) -> Vec<Entry<K, T>> {
        let mut entries = Vec::with_capacity(N);
        for i in 0..count {
            let offset = Self::NODE_HEADER_SIZE + i * Self::SLOT_SIZE;
            let key = K::decode_from(&buf[offset..]);
            let value = T::decode_from(&buf[offset + K::ENCODED_SIZE..]);
            entries.push(Entry::new(key, value));
        }
        entries
    }
}

impl<K: Record, V: Record, const N: usize> Record for Node<K, V, N> {
    const ENCODED_SIZE: usize = Self::NODE_HEADER_SIZE + N * Self::SLOT_SIZE;

    fn encode_to(&self, buf: &mut [u8]) {
        let buf = &mut buf[..Self::ENCODED_SIZE];
        buf[0] = self.kind() as u8;
        (self.len() as u32).encode_to(&mut buf[1..]);

        buf[Self::NODE_HEADER_SIZE..].fill(0);

        match self {
            Node::Leaf(entries) => Self::encode_entries(entries, buf),
            Node::Internal(entries) => Self::encode_entries(entries, buf),
        }
    }

    /// Expects bytes that passed [`validate`](Record::validate); an unknown
    /// tag reads as a leaf and `key_count` is clamped to `N`.
    fn decode_from(buf: &[u8]) -> Self {
        let count = (u32::decode_from(&buf[1..]) as usize).min(N);

        match NodeKind::from_u8(buf[0]) {
            Some(NodeKind::Internal) => Node::Internal(Self::decode_entries(count, buf)),
            _ => Node::Leaf(Self::decode_entries(count, buf)),
        }
    }

    fn validate(buf: &[u8]) -> Result<()> {
        if NodeKind::from_u8(buf[0]).is_none() {
            return Err(Error::Corrupted(format!("unknown node kind {}", buf[0])));
        }
        let count = u32::decode_from(&buf[1..]);
        if count as usize > N {
            return Err(Error::Corrupted(format!(
                "node holds {count} entries, fanout is {N}"
            )));
        }
        Ok(())
    }
}
