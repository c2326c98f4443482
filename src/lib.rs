//! persistree - a persistent, insert-only B-tree on a memory-mapped file.
//!
//! # Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                           persistree                            │
//! ├─────────────────────────────────────────────────────────────────┤
//! │  ┌─────────────────────────────────────────────────────────┐   │
//! │  │            Shared access (concurrency/)                  │   │
//! │  │          SharedTree = Mutex<BTree> for many threads      │   │
//! │  └─────────────────────────────────────────────────────────┘   │
//! │                              ↓                                  │
//! │  ┌─────────────────────────────────────────────────────────┐   │
//! │  │              Index Layer (index/btree/)                  │   │
//! │  │      BTree (find / insert / split)  +  Comparator        │   │
//! │  │      Node: Leaf(key → value) | Internal(key → child)     │   │
//! │  └─────────────────────────────────────────────────────────┘   │
//! │                              ↓                                  │
//! │  ┌─────────────────────────────────────────────────────────┐   │
//! │  │              Storage Layer (storage/)                    │   │
//! │  │   MmapArray (growable, remappable) + StoreHeader + Record│   │
//! │  └─────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Nodes refer to each other by [`NodeId`] (an index into the store), so the
//! file can be grown and remapped at any time and reopened by a later process
//! without rebuilding anything.
//!
//! # Modules
//! - [`common`] - Shared primitives (NodeId, Error, config)
//! - [`storage`] - Memory-mapped record store and file header
//! - [`index`] - The B-tree engine, node model and comparators
//! - [`concurrency`] - Mutex-wrapped tree for multi-threaded callers
//!
//! # Quick Start
//! ```no_run
//! use persistree::{BTree, NaturalOrder};
//!
//! // Open (or create) a tree of u64 → u64 with fanout 64
//! let mut tree: BTree<u64, u64> = BTree::open("my_index.db", NaturalOrder).unwrap();
//!
//! tree.insert(42, 4200).unwrap();
//! assert!(tree.contains(&42).unwrap());
//! ```

// Core modules
pub mod common;
pub mod concurrency;
pub mod index;
pub mod storage;

// Re-export commonly used items at crate root for convenience
pub use common::config::{StoreOptions, SyncMode, DEFAULT_FANOUT};
pub use common::{Error, NodeId, Result};

pub use concurrency::SharedTree;
pub use index::btree::{BTree, Comparator, NaturalOrder};
pub use storage::{MmapArray, Record};
