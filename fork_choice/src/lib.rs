//! The outer half of a beacon chain's fork choice: per-validator vote tracking, balance
//! reconciliation and the lock-guarded [`Store`] that wraps a [`proto_array::ProtoArray`] tree
//! with the public operations callers actually drive (`InsertBlock`, `ProcessAttestation`,
//! `Head`, ...).
//!
//! The tree algorithms themselves -- weight propagation, best-descendant caching, head descent,
//! pruning -- live in the `proto_array` crate this one depends on.

mod config;
mod error;
mod store;
mod vote_tracker;

pub use config::{ForkChoiceConfig, DEFAULT_PRUNE_THRESHOLD};
pub use error::Error;
pub use proto_array::{Context, Epoch, Hash256, Slot};
pub use store::{Checkpoint, Store};
pub use vote_tracker::VoteTracker;
