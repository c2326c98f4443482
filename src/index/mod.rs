//! Index structures.
//!
//! - [`btree`] - Persistent B-tree over a memory-mapped node store

pub mod btree;
