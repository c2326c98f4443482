//! Common types and utilities shared across persistree.
//!
//! This module contains fundamental primitives used throughout the codebase:
//! - Configuration constants and store options
//! - Error types
//! - Node identifiers

pub mod config;
pub mod error;
mod node_id;

pub use error::{Error, Result};
pub use node_id::NodeId;
