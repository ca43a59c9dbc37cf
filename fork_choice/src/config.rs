use serde_derive::{Deserialize, Serialize};

/// Below this many live nodes, `UpdateFinalizedCheckpoint` still advances the finalized
/// checkpoint but skips the reachability walk that drops stale nodes. The default is `0` --
/// i.e. the gate never fires and every finalized-checkpoint advance actually drops its losing
/// siblings -- because this crate's finalization semantics keep exactly `f` and its descendants
/// unconditionally; there is no node-count exemption for that. Raising this above `0` is an
/// explicit, caller-opted-into trade of that guarantee for fewer reachability walks on a
/// frequently-finalizing, still-small tree.
pub const DEFAULT_PRUNE_THRESHOLD: usize = 0;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ForkChoiceConfig {
    /// Minimum tree size, in nodes, before a finalized-checkpoint advance triggers a prune.
    pub prune_threshold: usize,
}

impl Default for ForkChoiceConfig {
    fn default() -> Self {
        Self {
            prune_threshold: DEFAULT_PRUNE_THRESHOLD,
        }
    }
}
