use crate::{Epoch, Hash256, Slot};
use serde_derive::{Deserialize, Serialize};

/// A single block in the fork-choice tree.
///
/// `parent`, `children`, `best_child` and `best_descendant` are expressed as roots rather than
/// owned references or array indices: the tree is stored as a root-keyed map (see
/// [`crate::ProtoArray`]), so a non-owning identifier is all a node needs to point at its
/// neighbours.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProtoNode {
    /// Not needed for the tree's own bookkeeping, but kept so upstream components (the ancestor
    /// query, logging) don't need a second lookup to find a block's slot.
    pub slot: Slot,
    pub root: Hash256,
    pub parent: Option<Hash256>,
    pub children: Vec<Hash256>,
    pub justified_epoch: Epoch,
    pub finalized_epoch: Epoch,
    pub balance: u64,
    pub weight: u64,
    pub best_child: Option<Hash256>,
    pub best_descendant: Option<Hash256>,
}

impl ProtoNode {
    pub(crate) fn new(
        slot: Slot,
        root: Hash256,
        parent: Option<Hash256>,
        justified_epoch: Epoch,
        finalized_epoch: Epoch,
    ) -> Self {
        Self {
            slot,
            root,
            parent,
            children: vec![],
            justified_epoch,
            finalized_epoch,
            balance: 0,
            weight: 0,
            best_child: None,
            best_descendant: None,
        }
    }
}
