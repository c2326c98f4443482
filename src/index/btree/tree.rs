//! Persistent B-tree - ordered lookup and insertion over a node store.
//!
//! The [`BTree`] keeps its nodes in an [`MmapArray`]. Child links are node
//! indices, never pointers, and the root always lives at index 0.
//!
//! # Insertion
//! ```text
//!            insert(k)
//!               │
//!     ┌─────────▼─────────┐  child split?   ┌──────────────────────────┐
//!     │ internal: route k ├────────────────▶│ fix left key, stage      │
//!     └─────────┬─────────┘                 │ {sep -> right}, split    │
//!               │                           │ again if full            │
//!     ┌─────────▼─────────┐                 └──────────────────────────┘
//!     │ leaf: shift in k, │
//!     │ split if full     │        root split: lower half is appended,
//!     └───────────────────┘        slot 0 gets a 2-entry internal
//! ```
//!
//! An insert runs in two phases. The descent only appends: right siblings
//! and the relocated root half are pushed, while rewrites of existing nodes
//! are staged as owned copies. Once every append has succeeded the staged
//! rewrites are applied parent first, so a node is linked before its old
//! copy is shrunk and the root slot is the first node to change. A failed
//! append, growth included, leaves every existing node untouched; at worst
//! some unreachable nodes stay behind in the store.
//!
//! Nodes are owned copies decoded from the store, so growth remapping the
//! file in the middle of a descent cannot invalidate them.

use std::cmp::Ordering;
use std::path::Path;

use tracing::{debug, trace};

use crate::common::config::{StoreOptions, DEFAULT_FANOUT};
use crate::common::{Error, NodeId, Result};
use crate::index::btree::comparator::{Comparator, NaturalOrder};
use crate::index::btree::node::{Entry, Node, Split};
use crate::storage::{MmapArray, Record};

/// Tree metadata kept in the store header.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
struct TreeMeta {
    /// Number of key-value pairs in leaves.
    len: u64,
}

impl Record for TreeMeta {
    const ENCODED_SIZE: usize = 8;

    fn encode_to(&self, buf: &mut [u8]) {
        self.len.encode_to(buf);
    }

    fn decode_from(buf: &[u8]) -> Self {
        Self {
            len: u64::decode_from(buf),
        }
    }
}

/// Result of inserting into one subtree.
enum InsertOutcome<K> {
    /// The key was already present; nothing changed.
    Duplicate,
    /// The key was added without splitting this subtree's root.
    Inserted,
    /// The key was added and this subtree's root split in two.
    Split {
        split: Split<K>,
        /// First key of the staged left half.
        left_min: K,
    },
}

/// Rewrites of existing nodes, in the order they were staged (children
/// before parents).
type Staged<K, V, const N: usize> = Vec<(NodeId, Node<K, V, N>)>;

/// A persistent, insert-only ordered map with fanout `N`.
///
/// Keys and values are fixed-size [`Record`]s persisted verbatim. The
/// comparator `C` orders keys and may accept other query types for lookup.
///
/// # Example
/// ```no_run
/// use persistree::{BTree, NaturalOrder};
///
/// let mut tree: BTree<u64, u64, NaturalOrder, 32> =
///     BTree::open("scores.db", NaturalOrder).unwrap();
///
/// assert!(tree.insert(7, 700).unwrap());
/// assert!(!tree.insert(7, 701).unwrap()); // duplicate
/// assert_eq!(tree.get(&7).unwrap(), Some(700));
/// ```
pub struct BTree<K, V, C = NaturalOrder, const N: usize = { DEFAULT_FANOUT }> {
    store: MmapArray<Node<K, V, N>, TreeMeta>,
    comparator: C,
}

impl<K, V, C, const N: usize> BTree<K, V, C, N>
where
    K: Record + Copy,
    V: Record + Copy,
{
    /// Open the tree stored at `path`, creating an empty one if absent.
    ///
    /// # Errors
    /// - `Error::InvalidFanout` if `N < 2`
    /// - I/O and header validation errors from the store
    pub fn open<P: AsRef<Path>>(path: P, comparator: C) -> Result<Self> {
        Self::open_with_options(path, comparator, StoreOptions::default())
    }

    /// Same as [`open`](Self::open) with explicit store options.
    pub fn open_with_options<P: AsRef<Path>>(
        path: P,
        comparator: C,
        options: StoreOptions,
    ) -> Result<Self> {
        if N < 2 {
            return Err(Error::InvalidFanout(N));
        }

        let store: MmapArray<Node<K, V, N>, TreeMeta> = MmapArray::open(path, &options)?;
        debug!(
            len = store.metadata().len,
            nodes = store.len(),
            fanout = N,
            "opened tree"
        );
        Ok(Self { store, comparator })
    }

    // ========================================================================
    // Sizes and accessors
    // ========================================================================

    /// Number of key-value pairs.
    #[inline]
    pub fn len(&self) -> usize {
        self.store.metadata().len as usize
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of nodes allocated in the store, reachable or not.
    #[inline]
    pub fn node_count(&self) -> u64 {
        self.store.len()
    }

    #[inline]
    pub fn comparator(&self) -> &C {
        &self.comparator
    }

    #[inline]
    pub fn path(&self) -> &Path {
        self.store.path()
    }

    /// Sync the whole store to disk.
    pub fn flush(&self) -> Result<()> {
        self.store.flush()
    }

    /// Number of levels from the root down to the leaves.
    ///
    /// 0 before the first insert, 1 while the root is a leaf.
    pub fn height(&self) -> Result<usize> {
        if self.store.is_empty() {
            return Ok(0);
        }

        let mut height = 1;
        let mut id = NodeId::ROOT;
        loop {
            let node = self.store.get(id.0)?;
            match node.child(0) {
                Some(child) => id = child,
                None if node.is_leaf() => return Ok(height),
                None => return Err(Error::Corrupted(format!("{id} has no routing entries"))),
            }
            height += 1;
        }
    }

    // ========================================================================
    // Lookup
    // ========================================================================

    /// Look up `query`, returning the stored key and its value.
    ///
    /// `query` may be any type the comparator can order keys against.
    pub fn find<Q>(&self, query: &Q) -> Result<Option<(K, V)>>
    where
        C: Comparator<K, Q>,
        Q: ?Sized,
    {
        Ok(self
            .locate(query)?
            .map(|(_, _, entry)| (entry.key, entry.value)))
    }

    /// Look up the value stored under `query`.
    pub fn get<Q>(&self, query: &Q) -> Result<Option<V>>
    where
        C: Comparator<K, Q>,
        Q: ?Sized,
    {
        Ok(self.locate(query)?.map(|(_, _, entry)| entry.value))
    }

    /// Check whether `query` is present.
    pub fn contains<Q>(&self, query: &Q) -> Result<bool>
    where
        C: Comparator<K, Q>,
        Q: ?Sized,
    {
        Ok(self.locate(query)?.is_some())
    }

    /// Walk from the root to the leaf that may hold `query`.
    ///
    /// Returns the leaf, the entry index inside it and the entry itself. An
    /// empty tree returns `None` without calling the comparator.
    fn locate<Q>(&self, query: &Q) -> Result<Option<(NodeId, usize, Entry<K, V>)>>
    where
        C: Comparator<K, Q>,
        Q: ?Sized,
    {
        if self.is_empty() || self.store.is_empty() {
            return Ok(None);
        }

        let mut id = NodeId::ROOT;
        // A well-formed tree is never deeper than it has nodes.
        for _ in 0..self.store.len() {
            let node = self.store.get(id.0)?;
            match &node {
                Node::Leaf(entries) => {
                    let position = node.find_position(&self.comparator, query);
                    if node.matches_at(position, &self.comparator, query) {
                        return Ok(Some((id, position, entries[position])));
                    }
                    return Ok(None);
                }
                Node::Internal(_) => {
                    let slot = node.route(&self.comparator, query);
                    id = node.child(slot).ok_or_else(|| {
                        Error::Corrupted(format!("{id} has no routing entries"))
                    })?;
                }
            }
        }
        Err(Error::Corrupted("lookup did not reach a leaf".to_string()))
    }

    // ========================================================================
    // Insertion
    // ========================================================================

    /// Insert `key -> value`.
    ///
    /// Returns `false`, leaving the tree untouched, if `key` is already
    /// present. Otherwise the pair is stored and the persisted length grows
    /// by one.
    ///
    /// # Errors
    /// I/O errors and `Error::CapacityLimit` from growing the store. A failed
    /// insert changes no reachable node and leaves `len` as it was.
    pub fn insert(&mut self, key: K, value: V) -> Result<bool>
    where
        C: Comparator<K>,
    {
        if self.store.is_empty() {
            self.store.push(&Node::new_leaf())?;
        }

        let mut staged = Vec::new();
        match self.insert_into(NodeId::ROOT, key, value, &mut staged)? {
            InsertOutcome::Duplicate => return Ok(false),
            InsertOutcome::Inserted => {}
            InsertOutcome::Split { split, left_min } => {
                self.promote_root(split, left_min, &mut staged)?
            }
        }

        // Every append succeeded; link parents before shrinking children.
        for (id, node) in staged.iter().rev() {
            self.store.set(id.0, node)?;
        }

        let len = self.store.metadata().len + 1;
        self.store.set_metadata(TreeMeta { len })?;
        Ok(true)
    }

    fn insert_into(
        &mut self,
        id: NodeId,
        key: K,
        value: V,
        staged: &mut Staged<K, V, N>,
    ) -> Result<InsertOutcome<K>>
    where
        C: Comparator<K>,
    {
        let mut node = self.store.get(id.0)?;

        if node.is_leaf() {
            let position = node.find_position(&self.comparator, &key);
            if node.matches_at(position, &self.comparator, &key) {
                return Ok(InsertOutcome::Duplicate);
            }
            if !node.is_full() {
                node.insert_value(position, key, value);
                staged.push((id, node));
                return Ok(InsertOutcome::Inserted);
            }

            let mut upper = node.split_off_upper();
            let separator = *upper.key(0);
            let half = self.half_for(&separator, &key, &mut node, &mut upper);
            let position = half.find_position(&self.comparator, &key);
            half.insert_value(position, key, value);
            return self.stage_split(id, node, &upper, separator, staged);
        }

        let slot = node.route(&self.comparator, &key);
        let child = node
            .child(slot)
            .ok_or_else(|| Error::Corrupted(format!("{id} has no routing entries")))?;

        let (split, left_min) = match self.insert_into(child, key, value, staged)? {
            InsertOutcome::Split { split, left_min } => (split, left_min),
            outcome => return Ok(outcome),
        };

        // `node` is an owned copy: appends below could not have moved it,
        // and nothing has been written to its slot yet.
        node.set_key(slot, left_min);

        if !node.is_full() {
            let position = node.find_position(&self.comparator, &split.key);
            node.insert_child(position, split.key, split.right);
            staged.push((id, node));
            return Ok(InsertOutcome::Inserted);
        }

        let mut upper = node.split_off_upper();
        let separator = *upper.key(0);
        let half = self.half_for(&separator, &split.key, &mut node, &mut upper);
        let position = half.find_position(&self.comparator, &split.key);
        half.insert_child(position, split.key, split.right);
        self.stage_split(id, node, &upper, separator, staged)
    }

    /// The half of a split node that `key` belongs in.
    ///
    /// Keys at or past the separator go right.
    fn half_for<'a>(
        &self,
        separator: &K,
        key: &K,
        lower: &'a mut Node<K, V, N>,
        upper: &'a mut Node<K, V, N>,
    ) -> &'a mut Node<K, V, N>
    where
        C: Comparator<K>,
    {
        if self.comparator.compare(separator, key) != Ordering::Greater {
            upper
        } else {
            lower
        }
    }

    /// Append the right sibling of a split and stage the lower half as the
    /// new contents of `id`.
    fn stage_split(
        &mut self,
        id: NodeId,
        lower: Node<K, V, N>,
        upper: &Node<K, V, N>,
        separator: K,
        staged: &mut Staged<K, V, N>,
    ) -> Result<InsertOutcome<K>> {
        let left_min = *lower
            .first_key()
            .ok_or_else(|| Error::Corrupted(format!("split left {id} empty")))?;
        let right = NodeId::new(self.store.push(upper)?);

        trace!(
            left = %id,
            right = %right,
            leaf = lower.is_leaf(),
            "split node"
        );
        staged.push((id, lower));
        Ok(InsertOutcome::Split {
            split: Split {
                left: id,
                right,
                key: separator,
            },
            left_min,
        })
    }

    /// Grow the tree by one level after the root split.
    ///
    /// The root's staged lower half is appended to a new slot instead, and
    /// slot 0 is staged as an internal node routing to it and to the split's
    /// right half. The old root stays intact until that single write.
    fn promote_root(
        &mut self,
        split: Split<K>,
        left_min: K,
        staged: &mut Staged<K, V, N>,
    ) -> Result<()> {
        let lower = match staged.pop() {
            Some((id, lower)) if id.is_root() => lower,
            _ => return Err(Error::Corrupted("root split was not staged".to_string())),
        };

        let moved = NodeId::new(self.store.push(&lower)?);
        let mut entries = Vec::with_capacity(N);
        entries.push(Entry::new(left_min, moved));
        entries.push(Entry::new(split.key, split.right));
        staged.push((NodeId::ROOT, Node::new_internal(entries)));

        debug!(
            moved = %moved,
            right = %split.right,
            nodes = self.store.len(),
            "promoted new root"
        );
        Ok(())
    }

    // ========================================================================
    // Verification
    // ========================================================================

    /// Walk the whole tree and check its structural invariants.
    ///
    /// Checks that entries are strictly ascending, that each routing key
    /// past slot 0 is the minimum of its subtree, that sibling subtrees do
    /// not overlap, that all leaves sit at the same depth and that the leaf
    /// entry count equals [`len`](Self::len).
    ///
    /// # Errors
    /// `Error::Corrupted` describing the first violation found.
    pub fn check_invariants(&self) -> Result<()>
    where
        C: Comparator<K>,
    {
        if self.store.is_empty() {
            if self.is_empty() {
                return Ok(());
            }
            return Err(Error::Corrupted(format!(
                "no root node but len is {}",
                self.len()
            )));
        }

        let summary = self.check_subtree(NodeId::ROOT, 1)?;
        if summary.count != self.len() as u64 {
            return Err(Error::Corrupted(format!(
                "leaves hold {} entries but len is {}",
                summary.count,
                self.len()
            )));
        }
        Ok(())
    }

    fn check_subtree(&self, id: NodeId, depth: u64) -> Result<SubtreeSummary<K>>
    where
        C: Comparator<K>,
    {
        if depth > self.store.len() {
            return Err(Error::Corrupted(format!("cycle through {id}")));
        }

        let node = self.store.get(id.0)?;
        for i in 1..node.len() {
            if self.comparator.compare(node.key(i - 1), node.key(i)) != Ordering::Less {
                return Err(Error::Corrupted(format!(
                    "{id} keys out of order at entry {i}"
                )));
            }
        }

        let entries = match node {
            Node::Leaf(entries) => {
                if entries.is_empty() && !id.is_root() {
                    return Err(Error::Corrupted(format!("{id} is an empty leaf")));
                }
                return Ok(SubtreeSummary {
                    min: entries.first().map(|entry| entry.key),
                    max: entries.last().map(|entry| entry.key),
                    count: entries.len() as u64,
                    leaf_depth: depth,
                });
            }
            Node::Internal(entries) => entries,
        };

        if entries.is_empty() {
            return Err(Error::Corrupted(format!("{id} has no routing entries")));
        }

        let mut summary: Option<SubtreeSummary<K>> = None;
        for (i, entry) in entries.iter().enumerate() {
            let child = self.check_subtree(entry.value, depth + 1)?;
            let child_min = child.min.ok_or_else(|| {
                Error::Corrupted(format!("{} under {id} is empty", entry.value))
            })?;

            if i > 0 && self.comparator.compare(&child_min, &entry.key) != Ordering::Equal {
                return Err(Error::Corrupted(format!(
                    "{id} routing key {i} is not the minimum of {}",
                    entry.value
                )));
            }

            summary = Some(match summary {
                None => child,
                Some(acc) => {
                    if acc.leaf_depth != child.leaf_depth {
                        return Err(Error::Corrupted(format!(
                            "leaves under {id} sit at different depths"
                        )));
                    }
                    let overlaps = acc
                        .max
                        .is_some_and(|max| self.comparator.compare(&max, &child_min) != Ordering::Less);
                    if overlaps {
                        return Err(Error::Corrupted(format!(
                            "{id} subtrees overlap at entry {i}"
                        )));
                    }
                    SubtreeSummary {
                        min: acc.min,
                        max: child.max,
                        count: acc.count + child.count,
                        leaf_depth: acc.leaf_depth,
                    }
                }
            });
        }

        summary.ok_or_else(|| Error::Corrupted(format!("{id} has no routing entries")))
    }
}

/// Key range, entry count and leaf depth of a checked subtree.
struct SubtreeSummary<K> {
    min: Option<K>,
    max: Option<K>,
    count: u64,
    leaf_depth: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    type Tree4 = BTree<u32, u32, NaturalOrder, 4>;
    type Tree5 = BTree<u32, u32, NaturalOrder, 5>;

    fn open4(dir: &tempfile::TempDir) -> Tree4 {
        Tree4::open(dir.path().join("tree.db"), NaturalOrder).unwrap()
    }

    #[test]
    fn test_empty_tree() {
        let dir = tempdir().unwrap();
        let tree = open4(&dir);

        assert!(tree.is_empty());
        assert_eq!(tree.len(), 0);
        assert_eq!(tree.height().unwrap(), 0);
        assert_eq!(tree.node_count(), 0);
        assert_eq!(tree.find(&1).unwrap(), None);
        tree.check_invariants().unwrap();
    }

    #[test]
    fn test_empty_tree_skips_comparator() {
        let dir = tempdir().unwrap();
        let calls = std::cell::Cell::new(0usize);
        let counting = |key: &u32, query: &u32| {
            calls.set(calls.get() + 1);
            key.cmp(query)
        };
        let tree: BTree<u32, u32, _, 4> =
            BTree::open(dir.path().join("tree.db"), &counting).unwrap();

        assert!(!tree.contains(&3).unwrap());
        assert_eq!(calls.get(), 0);
    }

    #[test]
    fn test_root_leaf_created_lazily() {
        let dir = tempdir().unwrap();
        let mut tree = open4(&dir);

        assert!(tree.insert(5, 50).unwrap());
        assert_eq!(tree.node_count(), 1);
        assert_eq!(tree.height().unwrap(), 1);
        assert_eq!(tree.get(&5).unwrap(), Some(50));
    }

    #[test]
    fn test_duplicate_rejected() {
        let dir = tempdir().unwrap();
        let mut tree = open4(&dir);

        assert!(tree.insert(1, 10).unwrap());
        assert!(!tree.insert(1, 11).unwrap());
        assert_eq!(tree.len(), 1);
        assert_eq!(tree.find(&1).unwrap(), Some((1, 10)));
    }

    #[test]
    fn test_first_split_promotes_root() {
        let dir = tempdir().unwrap();
        let mut tree = open4(&dir);

        for key in 0..4 {
            tree.insert(key, key * 10).unwrap();
        }
        assert_eq!(tree.node_count(), 1);

        // Fifth key overflows the root leaf
        tree.insert(4, 40).unwrap();

        // root (internal) + moved lower half + right half
        assert_eq!(tree.node_count(), 3);
        assert_eq!(tree.height().unwrap(), 2);
        for key in 0..5 {
            assert_eq!(tree.get(&key).unwrap(), Some(key * 10));
        }
        tree.check_invariants().unwrap();
    }

    #[test]
    fn test_new_minimum_updates_routing_key() {
        let dir = tempdir().unwrap();
        let mut tree = open4(&dir);

        for key in [10, 20, 30, 40, 50, 60, 70, 80] {
            tree.insert(key, key).unwrap();
        }
        // Smaller keys keep landing in the leftmost leaf and splitting it
        for key in (0..10).rev() {
            assert!(tree.insert(key, key).unwrap());
            tree.check_invariants().unwrap();
        }
        for key in (0..10).chain([10, 20, 30, 40, 50, 60, 70, 80]) {
            assert!(tree.contains(&key).unwrap(), "missing {key}");
        }
    }

    #[test]
    fn test_split_regression_n5() {
        let dir = tempdir().unwrap();
        let mut tree = Tree5::open(dir.path().join("tree.db"), NaturalOrder).unwrap();

        for key in 0..5 {
            tree.insert(key, key).unwrap();
            for seen in 0..=key {
                assert!(tree.contains(&seen).unwrap());
            }
        }
        tree.insert(5, 5).unwrap();
        for key in 0..=5 {
            assert!(tree.contains(&key).unwrap());
        }
        assert!(!tree.contains(&6).unwrap());
    }

    #[test]
    fn test_deep_tree_invariants() {
        let dir = tempdir().unwrap();
        let mut tree = open4(&dir);

        // Multiplicative hash spreads keys without repeats
        for i in 0..2_000u32 {
            let key = i.wrapping_mul(2_654_435_761);
            assert!(tree.insert(key, i).unwrap());
        }

        assert_eq!(tree.len(), 2_000);
        assert!(tree.height().unwrap() >= 5);
        tree.check_invariants().unwrap();
        for i in 0..2_000u32 {
            assert_eq!(tree.get(&i.wrapping_mul(2_654_435_761)).unwrap(), Some(i));
        }
    }

    #[test]
    fn test_invalid_fanout_rejected() {
        let dir = tempdir().unwrap();
        let result = BTree::<u32, u32, NaturalOrder, 1>::open(dir.path().join("t.db"), NaturalOrder);
        assert!(matches!(result, Err(Error::InvalidFanout(1))));
    }

    #[test]
    fn test_fanout_two() {
        let dir = tempdir().unwrap();
        let mut tree = BTree::<u32, (), NaturalOrder, 2>::open(dir.path().join("t.db"), NaturalOrder)
            .unwrap();

        for key in (0..64).rev() {
            assert!(tree.insert(key, ()).unwrap());
        }
        tree.check_invariants().unwrap();
        assert!((0..64).all(|key| tree.contains(&key).unwrap()));
    }

    #[test]
    fn test_failed_root_promotion_keeps_old_root() {
        let dir = tempdir().unwrap();
        let options = StoreOptions {
            initial_capacity: 2,
            max_capacity: Some(2),
            ..StoreOptions::default()
        };
        let mut tree =
            Tree4::open_with_options(dir.path().join("tree.db"), NaturalOrder, options).unwrap();
        for key in 0..4 {
            tree.insert(key, key).unwrap();
        }

        // The right half fits, relocating the root's lower half does not
        let result = tree.insert(4, 4);
        assert!(matches!(result, Err(Error::CapacityLimit { limit: 2 })));

        let root = tree.store.get(NodeId::ROOT.0).unwrap();
        assert!(root.is_leaf());
        assert_eq!(root.len(), 4);
        assert_eq!(tree.len(), 4);
        assert_eq!(tree.height().unwrap(), 1);
        for key in 0..4 {
            assert_eq!(tree.get(&key).unwrap(), Some(key));
        }
        assert!(!tree.contains(&4).unwrap());
        tree.check_invariants().unwrap();
    }

    #[test]
    fn test_failed_leaf_split_leaves_parent_unlinked() {
        let dir = tempdir().unwrap();
        let options = StoreOptions {
            initial_capacity: 3,
            max_capacity: Some(3),
            ..StoreOptions::default()
        };
        let mut tree =
            Tree4::open_with_options(dir.path().join("tree.db"), NaturalOrder, options).unwrap();

        // Root split fills all three slots
        for key in 0..5 {
            tree.insert(key, key).unwrap();
        }
        assert_eq!(tree.node_count(), 3);
        let root_before = tree.store.get(NodeId::ROOT.0).unwrap();

        // Fill the right leaf, then overflow it
        tree.insert(5, 5).unwrap();
        assert!(tree.insert(6, 6).is_err());

        assert_eq!(tree.store.get(NodeId::ROOT.0).unwrap(), root_before);
        assert_eq!(tree.len(), 6);
        for key in 0..6 {
            assert!(tree.contains(&key).unwrap(), "missing {key}");
        }
        assert!(!tree.contains(&6).unwrap());
        tree.check_invariants().unwrap();
    }

    #[test]
    fn test_unknown_node_kind_reported_as_corruption() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("tree.db");
        {
            let mut tree = Tree4::open(&path, NaturalOrder).unwrap();
            tree.insert(1, 1).unwrap();
        }

        // Kind byte of node 0 sits right after the header
        let mut bytes = std::fs::read(&path).unwrap();
        bytes[crate::common::config::HEADER_SIZE] = 0x7F;
        std::fs::write(&path, &bytes).unwrap();

        let tree = Tree4::open(&path, NaturalOrder).unwrap();
        assert!(matches!(tree.find(&1), Err(Error::Corrupted(_))));
        assert!(matches!(tree.check_invariants(), Err(Error::Corrupted(_))));
    }

    #[test]
    fn test_check_invariants_detects_corruption() {
        let dir = tempdir().unwrap();
        let mut tree = open4(&dir);
        for key in 0..20 {
            tree.insert(key, key).unwrap();
        }

        // Swap two keys in some leaf behind the tree's back
        let leaf_id = (0..tree.node_count())
            .find(|&i| tree.store.get(i).unwrap().is_leaf())
            .unwrap();
        let mut leaf = tree.store.get(leaf_id).unwrap();
        let (a, b) = (*leaf.key(0), *leaf.key(1));
        leaf.set_key(0, b);
        leaf.set_key(1, a);
        tree.store.set(leaf_id, &leaf).unwrap();

        assert!(matches!(tree.check_invariants(), Err(Error::Corrupted(_))));
    }
}
