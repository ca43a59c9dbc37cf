use crate::Hash256;

/// Errors produced by the tree-only half of fork choice.
///
/// This mirrors the taxonomy described for the core as a whole; the outer `fork_choice` crate
/// adds its own variants (`Cancelled`, vote/balance bookkeeping errors) and folds these in via
/// `From`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// `InsertBlock` referenced a `parent_root` that is not present in the tree and is not the
    /// zero-hash anchor sentinel.
    UnknownParent(Hash256),
    /// `InsertBlock` referenced a `root` that is already present in the tree.
    DuplicateRoot(Hash256),
    /// `Head` was asked to descend from a justified root that is not present in the tree.
    UnknownJustifiedRoot(Hash256),
    /// `Prune` was asked to finalize a root that is not present in the tree.
    UnknownFinalizedRoot(Hash256),
    /// `Head` reached a node whose `best_descendant` cache is `None`, or that descendant is no
    /// longer present in the tree. Typically indicates a stale justified checkpoint.
    InvalidBestDescendant(Hash256),
    /// An ancestor walk exited the tree (hit a node with no parent) before reaching a slot at or
    /// below the requested bound.
    NilNode,
    /// The deadline carried by a `Context` passed to a deep traversal expired before the
    /// traversal completed.
    Cancelled,
}
