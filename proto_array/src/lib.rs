//! The tree-only half of a beacon chain's fork choice: node storage, weight propagation,
//! best-descendant caching, head descent, ancestor queries and pruning.
//!
//! This crate knows nothing about validators, attestations or vote bookkeeping — see the
//! `fork_choice` crate for the outer `Store` that wraps a [`ProtoArray`] with per-validator vote
//! tracking, balance deltas and the public, lock-guarded API.

mod context;
mod error;
mod node;
mod tree;
mod types;

pub use context::Context;
pub use error::Error;
pub use node::ProtoNode;
pub use tree::ProtoArray;
pub use types::{Epoch, Hash256, Slot};
