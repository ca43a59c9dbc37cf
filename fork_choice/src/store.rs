use crate::error::Error;
use crate::vote_tracker::VoteTracker;
use crate::ForkChoiceConfig;
use parking_lot::RwLock;
use proto_array::{Context, Epoch, Hash256, ProtoArray, Slot};
use serde_derive::{Deserialize, Serialize};
use slog::{debug, trace, warn, Logger};
use std::collections::HashSet;

/// A (root, epoch) pair naming a block treated as justified or finalized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Checkpoint {
    pub root: Hash256,
    pub epoch: Epoch,
}

struct Inner {
    proto_array: ProtoArray,
    votes: Vec<VoteTracker>,
    balances: Vec<u64>,
    slashed_indices: HashSet<u64>,
    justified_checkpoint: Checkpoint,
    finalized_checkpoint: Checkpoint,
    head_root: Hash256,
}

impl Inner {
    /// Grow `votes`/`balances` so index `v` is addressable, zero-initializing any new entries.
    fn ensure_capacity(&mut self, v: u64) {
        let v = v as usize;
        if self.votes.len() <= v {
            self.votes.resize(v + 1, VoteTracker::default());
        }
        if self.balances.len() <= v {
            self.balances.resize(v + 1, 0);
        }
    }

    /// The balance engine: reconcile each validator's pending vote against the freshly supplied
    /// effective-balance snapshot, moving weight from its previous vote target to its new one.
    fn update_balances(&mut self, new_bal: &[u64]) {
        for v in 0..self.votes.len() {
            let old_bal = self.balances.get(v).copied().unwrap_or(0);
            let new_b = new_bal.get(v).copied().unwrap_or(0);

            let (old_bal, new_b) = if self.slashed_indices.contains(&(v as u64)) {
                (0, 0)
            } else {
                (old_bal, new_b)
            };

            let vote = self.votes[v];
            if vote.is_pending() || old_bal != new_b {
                if self.proto_array.contains_block(&vote.current_root) {
                    self.proto_array.subtract_balance(&vote.current_root, old_bal);
                }
                if self.proto_array.contains_block(&vote.next_root) {
                    self.proto_array.add_balance(&vote.next_root, new_b);
                }
                self.votes[v].current_root = vote.next_root;
            }
        }

        self.balances = new_bal.to_vec();
    }
}

/// The outer, lock-guarded fork-choice store: wraps a [`ProtoArray`] tree with per-validator vote
/// tracking, balance reconciliation, checkpoints, the slashed-index set, and the public
/// operations of the fork-choice interface.
///
/// A single `parking_lot::RwLock` guards all mutable state, following this corpus's own
/// fork-choice wrapper: readers (`is_canonical`, `ancestor_root`) take a shared lock, writers
/// (everything else, including `head` -- it mutates balances, weights and caches) take an
/// exclusive one.
pub struct Store {
    inner: RwLock<Inner>,
    log: Logger,
}

impl Store {
    /// Construct a store anchored at a genesis (or any already-finalized) block.
    pub fn from_genesis(
        log: Logger,
        config: ForkChoiceConfig,
        genesis_slot: Slot,
        genesis_root: Hash256,
        genesis_epoch: Epoch,
    ) -> Self {
        let mut proto_array = ProtoArray::new(config.prune_threshold);
        proto_array
            .on_new_block(genesis_slot, genesis_root, None, genesis_epoch, genesis_epoch)
            .expect("inserting the first node into an empty tree cannot fail");
        proto_array.justified_epoch = genesis_epoch;
        proto_array.finalized_epoch = genesis_epoch;

        let genesis_checkpoint = Checkpoint {
            root: genesis_root,
            epoch: genesis_epoch,
        };

        Self {
            inner: RwLock::new(Inner {
                proto_array,
                votes: Vec::new(),
                balances: Vec::new(),
                slashed_indices: HashSet::new(),
                justified_checkpoint: genesis_checkpoint,
                finalized_checkpoint: genesis_checkpoint,
                head_root: genesis_root,
            }),
            log,
        }
    }

    pub fn justified_checkpoint(&self) -> Checkpoint {
        self.inner.read().justified_checkpoint
    }

    pub fn finalized_checkpoint(&self) -> Checkpoint {
        self.inner.read().finalized_checkpoint
    }

    pub fn head_root(&self) -> Hash256 {
        self.inner.read().head_root
    }

    pub fn contains_block(&self, root: &Hash256) -> bool {
        self.inner.read().proto_array.contains_block(root)
    }

    /// `InsertBlock`. The zero hash is the reserved "no parent" sentinel, accepted only for the
    /// very first block anchoring the tree (normally already supplied via `from_genesis`).
    pub fn insert_block(
        &self,
        ctx: &Context,
        slot: Slot,
        root: Hash256,
        parent_root: Hash256,
        justified_epoch: Epoch,
        finalized_epoch: Epoch,
    ) -> Result<(), Error> {
        ctx.check()?;
        let parent = if parent_root == Hash256::zero() {
            None
        } else {
            Some(parent_root)
        };

        let mut inner = self.inner.write();
        inner
            .proto_array
            .on_new_block(slot, root, parent, justified_epoch, finalized_epoch)?;

        debug!(self.log, "block inserted into fork choice";
            "root" => ?root, "slot" => slot.as_u64(), "parent" => ?parent_root);

        Ok(())
    }

    /// `ProcessAttestation`. Only updates the *pending* (`next_root`/`next_epoch`) half of each
    /// validator's vote; promotion into tree balances happens inside `head`.
    pub fn process_attestation(
        &self,
        ctx: &Context,
        validator_indices: &[u64],
        target_root: Hash256,
        target_epoch: Epoch,
    ) -> Result<(), Error> {
        ctx.check()?;
        let mut inner = self.inner.write();

        for &v in validator_indices {
            inner.ensure_capacity(v);
            if inner.slashed_indices.contains(&v) {
                continue;
            }

            let vote = &mut inner.votes[v as usize];
            if target_epoch > vote.next_epoch {
                vote.next_root = target_root;
                vote.next_epoch = target_epoch;
            }
        }

        Ok(())
    }

    /// `InsertSlashedIndex`. Idempotent: a second call for the same index is a true no-op,
    /// enforced by `HashSet::insert` returning `false` rather than by re-running the debit.
    pub fn insert_slashed_index(&self, ctx: &Context, validator_index: u64) -> Result<(), Error> {
        ctx.check()?;
        let mut inner = self.inner.write();
        inner.ensure_capacity(validator_index);

        if !inner.slashed_indices.insert(validator_index) {
            return Ok(());
        }

        let idx = validator_index as usize;
        let old_bal = inner.balances[idx];
        if old_bal > 0 {
            let current_root = inner.votes[idx].current_root;
            if inner.proto_array.contains_block(&current_root) {
                inner.proto_array.subtract_balance(&current_root, old_bal);
            }
        }
        inner.balances[idx] = 0;

        warn!(self.log, "validator slashed, vote weight zeroed"; "validator_index" => validator_index);

        Ok(())
    }

    /// `UpdateJustifiedCheckpoint`. Monotonic: an epoch older than the current justified epoch
    /// is rejected rather than silently ignored, so callers notice a stale update immediately.
    pub fn update_justified_checkpoint(&self, root: Hash256, epoch: Epoch) -> Result<(), Error> {
        let mut inner = self.inner.write();
        if epoch < inner.justified_checkpoint.epoch {
            warn!(self.log, "ignoring non-monotonic justified checkpoint update";
                "current_epoch" => inner.justified_checkpoint.epoch.as_u64(),
                "new_epoch" => epoch.as_u64());
            return Err(Error::NonMonotonicJustifiedCheckpoint {
                current_epoch: inner.justified_checkpoint.epoch,
                new_epoch: epoch,
            });
        }

        inner.justified_checkpoint = Checkpoint { root, epoch };
        Ok(())
    }

    /// `UpdateFinalizedCheckpoint`. A no-op if `epoch` does not strictly advance finality;
    /// otherwise triggers `Prune`. `dropped` (logged below) is the number of nodes `maybe_prune`
    /// actually removed -- with the default `prune_threshold` of `0` this is always the true
    /// count of non-canonical nodes dropped, never a value masking a skipped prune.
    pub fn update_finalized_checkpoint(
        &self,
        ctx: &Context,
        root: Hash256,
        epoch: Epoch,
    ) -> Result<(), Error> {
        let mut inner = self.inner.write();
        if epoch <= inner.finalized_checkpoint.epoch {
            return Ok(());
        }

        let dropped = inner.proto_array.maybe_prune(ctx, root, epoch)?;
        inner.finalized_checkpoint = Checkpoint { root, epoch };

        debug!(self.log, "finality advanced, tree pruned";
            "finalized_epoch" => epoch.as_u64(), "nodes_dropped" => dropped);

        Ok(())
    }

    /// `Head`. A writer, not a reader: folds the supplied effective balances into tree balances
    /// (the balance engine), recomputes subtree weights (the weight propagator), recomputes
    /// best-descendant caches (the head selector), then descends from `justified_root`.
    ///
    /// Callers MUST NOT assume this is read-only; it acquires the store's exclusive lock.
    pub fn head(
        &self,
        ctx: &Context,
        justified_root: Hash256,
        effective_balances: &[u64],
    ) -> Result<Hash256, Error> {
        ctx.check()?;
        let mut inner = self.inner.write();

        inner.update_balances(effective_balances);
        inner.proto_array.recompute_weights();

        let justified_epoch = inner.justified_checkpoint.epoch;
        let finalized_epoch = inner.finalized_checkpoint.epoch;
        inner
            .proto_array
            .update_best_descendants(justified_epoch, finalized_epoch);

        let head = inner.proto_array.find_head(&justified_root)?;
        inner.head_root = head;

        trace!(self.log, "head recomputed"; "root" => ?head);

        Ok(head)
    }

    /// `IsCanonical`. The zero hash is canonical by convention; any other root is canonical iff
    /// it lies on the path from the tree root to the cached head (inclusive).
    pub fn is_canonical(&self, root: Hash256) -> bool {
        if root == Hash256::zero() {
            return true;
        }
        let inner = self.inner.read();
        inner.proto_array.is_descendant(root, inner.head_root)
    }

    /// `AncestorRoot`.
    pub fn ancestor_root(&self, ctx: &Context, root: Hash256, slot: Slot) -> Result<Hash256, Error> {
        let inner = self.inner.read();
        Ok(inner.proto_array.ancestor_at_slot(ctx, root, slot)?)
    }
}
