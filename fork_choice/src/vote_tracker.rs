use proto_array::{Epoch, Hash256};
use serde_derive::{Deserialize, Serialize};

/// A validator's latest known vote.
///
/// `current_root` is the root that has actually been folded into the tree's balances;
/// `next_root`/`next_epoch` is the most recent attestation target seen, not yet applied. The two
/// are reconciled by the balance engine's promotion step at `Head()` time, not by
/// `ProcessAttestation` itself -- see [`crate::store::Store::process_attestation`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteTracker {
    pub current_root: Hash256,
    pub next_root: Hash256,
    pub next_epoch: Epoch,
}

impl Default for VoteTracker {
    fn default() -> Self {
        Self {
            current_root: Hash256::zero(),
            next_root: Hash256::zero(),
            next_epoch: Epoch::new(0),
        }
    }
}

impl VoteTracker {
    /// A vote is pending promotion into the tree's balances when its current and next roots
    /// disagree.
    pub fn is_pending(&self) -> bool {
        self.current_root != self.next_root
    }
}
