//! Scenario-based integration tests: each test builds a block tree and a sequence of operations,
//! then asserts on the resulting head (or on an operation failing), the way a fork-choice
//! implementation's own test suite lays out its cases.

use fork_choice::{Context, Epoch, ForkChoiceConfig, Hash256, Slot, Store};
use sloggers::terminal::{Destination, TerminalLoggerBuilder};
use sloggers::types::Severity;
use sloggers::Build;

fn logger() -> slog::Logger {
    let mut builder = TerminalLoggerBuilder::new();
    builder.level(Severity::Critical);
    builder.destination(Destination::Stderr);
    builder.build().unwrap()
}

/// A root that is never the zero hash (the reserved "no parent" sentinel), keyed by index.
fn root(i: u64) -> Hash256 {
    Hash256::from_low_u64_be(i + 1)
}

#[derive(Debug, Clone)]
enum Operation {
    ProcessBlock {
        slot: Slot,
        root: Hash256,
        parent_root: Hash256,
    },
    ProcessAttestation {
        validator_indices: Vec<u64>,
        target_root: Hash256,
        target_epoch: Epoch,
    },
    InsertSlashedIndex {
        validator_index: u64,
    },
    UpdateJustifiedCheckpoint {
        root: Hash256,
        epoch: Epoch,
    },
    UpdateFinalizedCheckpoint {
        root: Hash256,
        epoch: Epoch,
    },
    FindHead {
        justified_root: Hash256,
        balances: Vec<u64>,
        expected_head: Hash256,
    },
}

struct ForkChoiceTestDefinition {
    genesis_root: Hash256,
    operations: Vec<Operation>,
}

impl ForkChoiceTestDefinition {
    fn run(self) {
        let store = Store::from_genesis(
            logger(),
            ForkChoiceConfig::default(),
            Slot::new(0),
            self.genesis_root,
            Epoch::new(0),
        );
        let ctx = Context::none();

        for (i, op) in self.operations.into_iter().enumerate() {
            match op {
                Operation::ProcessBlock { slot, root, parent_root } => {
                    store
                        .insert_block(&ctx, slot, root, parent_root, Epoch::new(0), Epoch::new(0))
                        .unwrap_or_else(|e| {
                            panic!("operation {} (process block) failed: {:?}", i, e)
                        });
                }
                Operation::ProcessAttestation {
                    validator_indices,
                    target_root,
                    target_epoch,
                } => {
                    store
                        .process_attestation(&ctx, &validator_indices, target_root, target_epoch)
                        .unwrap_or_else(|e| {
                            panic!("operation {} (process attestation) failed: {:?}", i, e)
                        });
                }
                Operation::InsertSlashedIndex { validator_index } => {
                    store
                        .insert_slashed_index(&ctx, validator_index)
                        .unwrap_or_else(|e| {
                            panic!("operation {} (insert slashed index) failed: {:?}", i, e)
                        });
                }
                Operation::UpdateJustifiedCheckpoint { root, epoch } => {
                    store
                        .update_justified_checkpoint(root, epoch)
                        .unwrap_or_else(|e| {
                            panic!("operation {} (update justified checkpoint) failed: {:?}", i, e)
                        });
                }
                Operation::UpdateFinalizedCheckpoint { root, epoch } => {
                    store
                        .update_finalized_checkpoint(&ctx, root, epoch)
                        .unwrap_or_else(|e| {
                            panic!("operation {} (update finalized checkpoint) failed: {:?}", i, e)
                        });
                }
                Operation::FindHead {
                    justified_root,
                    balances,
                    expected_head,
                } => {
                    let head = store.head(&ctx, justified_root, &balances).unwrap_or_else(|e| {
                        panic!("operation {} (find head) failed: {:?}", i, e)
                    });
                    assert_eq!(
                        head, expected_head,
                        "operation {} produced an unexpected head",
                        i
                    );
                }
            }
        }
    }
}

/// S1: a single vote on the tip of a four-block line must propagate all the way back to
/// genesis, making the tip the head even though every intermediate node has zero balance of its
/// own.
#[test]
fn linear_chain_balance_propagates_to_tip() {
    let genesis = root(0);
    ForkChoiceTestDefinition {
        genesis_root: genesis,
        operations: vec![
            Operation::ProcessBlock { slot: Slot::new(1), root: root(1), parent_root: genesis },
            Operation::ProcessBlock { slot: Slot::new(2), root: root(2), parent_root: root(1) },
            Operation::ProcessBlock { slot: Slot::new(3), root: root(3), parent_root: root(2) },
            Operation::ProcessAttestation {
                validator_indices: vec![0],
                target_root: root(3),
                target_epoch: Epoch::new(1),
            },
            Operation::FindHead {
                justified_root: genesis,
                balances: vec![100],
                expected_head: root(3),
            },
        ],
    }
    .run();
}

/// S2: a validator's effective balance can shrink between two `FindHead` calls; the balance
/// engine must saturate the subtraction rather than panic or wrap.
#[test]
fn shrinking_balance_does_not_panic() {
    let genesis = root(0);
    ForkChoiceTestDefinition {
        genesis_root: genesis,
        operations: vec![
            Operation::ProcessBlock { slot: Slot::new(1), root: root(1), parent_root: genesis },
            Operation::ProcessAttestation {
                validator_indices: vec![0],
                target_root: root(1),
                target_epoch: Epoch::new(1),
            },
            Operation::FindHead {
                justified_root: genesis,
                balances: vec![32_000_000_000],
                expected_head: root(1),
            },
            Operation::FindHead {
                justified_root: genesis,
                balances: vec![1],
                expected_head: root(1),
            },
        ],
    }
    .run();
}

/// S4: a slashed validator's vote weight is zeroed, which can flip the head back to a
/// previously-losing branch.
#[test]
fn slashing_a_validator_can_reverse_the_head() {
    let genesis = root(0);
    ForkChoiceTestDefinition {
        genesis_root: genesis,
        operations: vec![
            Operation::ProcessBlock { slot: Slot::new(1), root: root(1), parent_root: genesis },
            Operation::ProcessBlock { slot: Slot::new(1), root: root(2), parent_root: genesis },
            Operation::ProcessAttestation {
                validator_indices: vec![0],
                target_root: root(1),
                target_epoch: Epoch::new(1),
            },
            Operation::ProcessAttestation {
                validator_indices: vec![1],
                target_root: root(2),
                target_epoch: Epoch::new(1),
            },
            Operation::FindHead {
                justified_root: genesis,
                balances: vec![100, 40],
                expected_head: root(1),
            },
            Operation::InsertSlashedIndex { validator_index: 0 },
            Operation::FindHead {
                justified_root: genesis,
                balances: vec![100, 40],
                expected_head: root(2),
            },
        ],
    }
    .run();
}

/// S6: `UpdateJustifiedCheckpoint` must reject an epoch older than the one already recorded,
/// leaving the checkpoint untouched.
#[test]
fn justified_checkpoint_cannot_move_backwards() {
    let genesis = root(0);
    let store = Store::from_genesis(
        logger(),
        ForkChoiceConfig::default(),
        Slot::new(0),
        genesis,
        Epoch::new(0),
    );

    store.update_justified_checkpoint(genesis, Epoch::new(5)).unwrap();
    assert!(store.update_justified_checkpoint(genesis, Epoch::new(2)).is_err());
    assert_eq!(store.justified_checkpoint().epoch, Epoch::new(5));
}

/// Advancing the finalized checkpoint through the store, with the default configuration,
/// unconditionally drops the abandoned branch -- no tree-size exemption, per spec.
#[test]
fn finalizing_through_the_store_prunes_the_losing_branch() {
    let genesis = root(0);
    let store = Store::from_genesis(
        logger(),
        ForkChoiceConfig::default(),
        Slot::new(0),
        genesis,
        Epoch::new(0),
    );
    let ctx = Context::none();

    store
        .insert_block(&ctx, Slot::new(1), root(1), genesis, Epoch::new(0), Epoch::new(1))
        .unwrap();
    store
        .insert_block(&ctx, Slot::new(1), root(2), genesis, Epoch::new(0), Epoch::new(0))
        .unwrap();

    store.update_finalized_checkpoint(&ctx, root(1), Epoch::new(1)).unwrap();

    assert!(store.contains_block(&root(1)));
    assert!(!store.contains_block(&root(2)));
    assert_eq!(store.finalized_checkpoint().epoch, Epoch::new(1));
}

/// Raising `prune_threshold` above zero is an explicit opt-out: the finalized checkpoint still
/// advances, but the reachability walk (and the node drop it would have performed) is skipped
/// while the tree stays below the configured size.
#[test]
fn raising_prune_threshold_opts_out_of_the_reachability_walk() {
    let genesis = root(0);
    let config = ForkChoiceConfig { prune_threshold: 100 };
    let store = Store::from_genesis(logger(), config, Slot::new(0), genesis, Epoch::new(0));
    let ctx = Context::none();

    store
        .insert_block(&ctx, Slot::new(1), root(1), genesis, Epoch::new(0), Epoch::new(1))
        .unwrap();
    store
        .insert_block(&ctx, Slot::new(1), root(2), genesis, Epoch::new(0), Epoch::new(0))
        .unwrap();

    store.update_finalized_checkpoint(&ctx, root(1), Epoch::new(1)).unwrap();

    // the checkpoint still advanced, but the losing branch is still live: below threshold, the
    // walk never ran.
    assert!(store.contains_block(&root(2)));
    assert_eq!(store.finalized_checkpoint().epoch, Epoch::new(1));
}
