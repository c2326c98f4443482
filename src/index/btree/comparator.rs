//! Three-way comparators over stored keys.

use std::borrow::Borrow;
use std::cmp::Ordering;

/// A total order over stored keys `K`, queryable with `Q`.
///
/// `compare(key, query)` says where `key` sits relative to `query`. A single
/// comparator type may implement this trait for several query types, which
/// is how heterogeneous lookup works: the tree asks for `Comparator<K>` when
/// inserting and `Comparator<K, Q>` when looking up with a `Q`.
///
/// The order must be strict, total and stable for the lifetime of a store
/// file. Comparators may close over read-only data (a string table, say) as
/// long as that data does not change while a tree uses it.
///
/// Any `Fn(&K, &Q) -> Ordering` closure is a comparator.
///
/// # Example
/// ```
/// use std::cmp::Ordering;
/// use persistree::index::btree::{Comparator, NaturalOrder};
///
/// assert_eq!(NaturalOrder.compare(&3u32, &5u32), Ordering::Less);
///
/// let by_len = |key: &[u8; 4], query: &str| key.len().cmp(&query.len());
/// assert_eq!(by_len.compare(b"abcd", "abcd"), Ordering::Equal);
/// ```
pub trait Comparator<K, Q: ?Sized = K> {
    /// Order `key` relative to `query`.
    fn compare(&self, key: &K, query: &Q) -> Ordering;
}

/// The key type's own `Ord`, reached through `Borrow`.
///
/// Covers the plain case (`K == Q`) and borrowed forms such as looking up a
/// `[u8; 16]` key with a `&[u8]` slice.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct NaturalOrder;

impl<K, Q> Comparator<K, Q> for NaturalOrder
where
    K: Borrow<Q>,
    Q: Ord + ?Sized,
{
    #[inline]
    fn compare(&self, key: &K, query: &Q) -> Ordering {
        key.borrow().cmp(query)
    }
}

impl<K, Q, F> Comparator<K, Q> for F
where
    Q: ?Sized,
    F: Fn(&K, &Q) -> Ordering,
{
    #[inline]
    fn compare(&self, key: &K, query: &Q) -> Ordering {
        self(key, query)
    }
}
