//! Storage layer - the memory-mapped record store.
//!
//! This module handles persistent storage:
//! - [`MmapArray`] - Growable memory-mapped array of fixed-size records
//! - [`StoreHeader`] - Header at the start of every store file
//! - [`Record`] - Fixed-size encoding for everything that gets persisted

mod header;
mod mmap_array;
mod record;

pub use header::StoreHeader;
pub use mmap_array::MmapArray;
pub use record::Record;
