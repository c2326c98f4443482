//! Serialized access to a tree from several threads.
//!
//! [`BTree`] itself is single-writer and takes `&mut self` to insert.
//! [`SharedTree`] puts one behind a `parking_lot::Mutex` so it can be shared
//! through an `Arc`; every call holds the lock for its whole duration.

use std::path::Path;

use parking_lot::{Mutex, MutexGuard};

use crate::common::config::StoreOptions;
use crate::common::Result;
use crate::index::btree::{BTree, Comparator};
use crate::storage::Record;

/// A [`BTree`] that callers on different threads can share.
///
/// # Example
/// ```no_run
/// use std::sync::Arc;
/// use persistree::{NaturalOrder, SharedTree};
///
/// let tree = Arc::new(
///     SharedTree::<u32, u32, NaturalOrder, 16>::open("shared.db", NaturalOrder).unwrap(),
/// );
/// let writer = Arc::clone(&tree);
/// std::thread::spawn(move || writer.insert(1, 10).unwrap())
///     .join()
///     .unwrap();
/// assert!(tree.contains(&1).unwrap());
/// ```
pub struct SharedTree<K, V, C, const N: usize> {
    inner: Mutex<BTree<K, V, C, N>>,
}

impl<K, V, C, const N: usize> SharedTree<K, V, C, N>
where
    K: Record + Copy,
    V: Record + Copy,
{
    /// Wrap an already open tree.
    pub fn new(tree: BTree<K, V, C, N>) -> Self {
        Self {
            inner: Mutex::new(tree),
        }
    }

    /// Open the tree at `path` and wrap it.
    pub fn open<P: AsRef<Path>>(path: P, comparator: C) -> Result<Self> {
        BTree::open(path, comparator).map(Self::new)
    }

    /// Same as [`open`](Self::open) with explicit store options.
    pub fn open_with_options<P: AsRef<Path>>(
        path: P,
        comparator: C,
        options: StoreOptions,
    ) -> Result<Self> {
        BTree::open_with_options(path, comparator, options).map(Self::new)
    }

    /// Insert under the lock. See [`BTree::insert`].
    pub fn insert(&self, key: K, value: V) -> Result<bool>
    where
        C: Comparator<K>,
    {
        self.inner.lock().insert(key, value)
    }

    /// Look up under the lock. See [`BTree::find`].
    pub fn find<Q>(&self, query: &Q) -> Result<Option<(K, V)>>
    where
        C: Comparator<K, Q>,
        Q: ?Sized,
    {
        self.inner.lock().find(query)
    }

    pub fn get<Q>(&self, query: &Q) -> Result<Option<V>>
    where
        C: Comparator<K, Q>,
        Q: ?Sized,
    {
        self.inner.lock().get(query)
    }

    pub fn contains<Q>(&self, query: &Q) -> Result<bool>
    where
        C: Comparator<K, Q>,
        Q: ?Sized,
    {
        self.inner.lock().contains(query)
    }

    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().is_empty()
    }

    pub fn flush(&self) -> Result<()> {
        self.inner.lock().flush()
    }

    /// Hold the lock for a batch of operations.
    pub fn lock(&self) -> MutexGuard<'_, BTree<K, V, C, N>> {
        self.inner.lock()
    }

    /// Unwrap the tree.
    pub fn into_inner(self) -> BTree<K, V, C, N> {
        self.inner.into_inner()
    }
}
