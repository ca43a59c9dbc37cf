use crate::{Context, Epoch, Error, Hash256, ProtoNode, Slot};
use serde_derive::{Deserialize, Serialize};
use std::collections::HashMap;

/// The tree-only half of fork choice: Node storage, weight propagation, best-descendant caching,
/// head descent and pruning. Knows nothing about validators, votes or balances-by-index — it is
/// handed an already-resolved `balance: u64` per node and leaves vote bookkeeping to the
/// `fork_choice` crate that wraps it.
///
/// Nodes are kept in a root-keyed map rather than a dense array. `order` records the sequence in
/// which nodes were inserted, which — because a node's parent is always inserted before it — is
/// also a valid topological order of the tree. Reversing it yields every node's children before
/// the node itself, which is exactly the traversal order `recompute_weights` and
/// `update_best_descendants` need, without recursion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProtoArray {
    /// Do not attempt to prune the tree unless it has at least this many nodes. Small prunes
    /// simply waste time.
    pub prune_threshold: usize,
    pub justified_epoch: Epoch,
    pub finalized_epoch: Epoch,
    nodes: HashMap<Hash256, ProtoNode>,
    order: Vec<Hash256>,
    tree_root: Option<Hash256>,
}

impl ProtoArray {
    pub fn new(prune_threshold: usize) -> Self {
        Self {
            prune_threshold,
            justified_epoch: Epoch::new(0),
            finalized_epoch: Epoch::new(0),
            nodes: HashMap::new(),
            order: Vec::new(),
            tree_root: None,
        }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn contains_block(&self, root: &Hash256) -> bool {
        self.nodes.contains_key(root)
    }

    pub fn get_block(&self, root: &Hash256) -> Option<&ProtoNode> {
        self.nodes.get(root)
    }

    pub fn tree_root(&self) -> Option<Hash256> {
        self.tree_root
    }

    /// Register a new block with the tree.
    ///
    /// `parent` is `None` only for the very first block inserted (the tree-root / finalized
    /// anchor at construction time). Every subsequent call must supply a parent that is already
    /// present in the tree.
    pub fn on_new_block(
        &mut self,
        slot: Slot,
        root: Hash256,
        parent: Option<Hash256>,
        justified_epoch: Epoch,
        finalized_epoch: Epoch,
    ) -> Result<(), Error> {
        if self.nodes.contains_key(&root) {
            return Err(Error::DuplicateRoot(root));
        }

        match parent {
            None => {
                if self.tree_root.is_some() {
                    // A second "no parent" insert would silently re-anchor the tree; refuse it
                    // under the same error a genuinely unknown parent would produce.
                    return Err(Error::UnknownParent(root));
                }
            }
            Some(parent_root) if !self.nodes.contains_key(&parent_root) => {
                return Err(Error::UnknownParent(parent_root));
            }
            _ => {}
        }

        let node = ProtoNode::new(slot, root, parent, justified_epoch, finalized_epoch);

        if let Some(parent_root) = parent {
            self.nodes
                .get_mut(&parent_root)
                .expect("parent presence checked above")
                .children
                .push(root);
        } else {
            self.tree_root = Some(root);
        }

        self.nodes.insert(root, node);
        self.order.push(root);

        Ok(())
    }

    pub fn node_balance(&self, root: &Hash256) -> Option<u64> {
        self.nodes.get(root).map(|n| n.balance)
    }

    pub fn set_balance(&mut self, root: &Hash256, balance: u64) {
        if let Some(node) = self.nodes.get_mut(root) {
            node.balance = balance;
        }
    }

    pub fn add_balance(&mut self, root: &Hash256, delta: u64) {
        if let Some(node) = self.nodes.get_mut(root) {
            node.balance = node.balance.saturating_add(delta);
        }
    }

    pub fn subtract_balance(&mut self, root: &Hash256, delta: u64) {
        if let Some(node) = self.nodes.get_mut(root) {
            node.balance = node.balance.saturating_sub(delta);
        }
    }

    /// Recompute `weight(n) = balance(n) + Σ weight(children(n))` for every node.
    ///
    /// A full batch traversal, not an incremental one: the reference semantics for this core
    /// (see the weight-propagator notes) recompute every node's weight on each call, amortized
    /// across an attestation burst by only being called once per `Head()`.
    pub fn recompute_weights(&mut self) {
        for root in self.order.iter().rev() {
            let children_weight: u64 = self.nodes[root]
                .children
                .iter()
                .map(|c| self.nodes[c].weight)
                .sum();
            let node = self
                .nodes
                .get_mut(root)
                .expect("root came from self.order");
            node.weight = node.balance.saturating_add(children_weight);
        }
    }

    /// A node is viable for the head iff its justified/finalized epoch matches the store's
    /// current checkpoints, or the store has no constraint yet (`epoch == 0`, i.e. pre-genesis).
    fn node_is_viable_for_head(&self, node: &ProtoNode) -> bool {
        (node.justified_epoch == self.justified_epoch || self.justified_epoch.is_zero())
            && (node.finalized_epoch == self.finalized_epoch || self.finalized_epoch.is_zero())
    }

    /// A node "leads to" a viable head if it is itself viable, or its cached best-descendant is
    /// viable. Only valid to call on a node whose children have already had their own
    /// best-descendant recomputed in this pass (true during the reverse order walk below).
    fn node_leads_to_viable_head(&self, root: &Hash256) -> bool {
        let node = &self.nodes[root];
        let descendant_viable = node
            .best_descendant
            .and_then(|d| self.nodes.get(&d))
            .map(|d| self.node_is_viable_for_head(d))
            .unwrap_or(false);
        descendant_viable || self.node_is_viable_for_head(node)
    }

    /// Recompute `best_child`/`best_descendant` for every node, given the current justified and
    /// finalized epochs (which are also stored, for use by `find_head`'s viability checks on
    /// future calls).
    pub fn update_best_descendants(&mut self, justified_epoch: Epoch, finalized_epoch: Epoch) {
        self.justified_epoch = justified_epoch;
        self.finalized_epoch = finalized_epoch;

        for root in self.order.clone().into_iter().rev() {
            let children = self.nodes[&root].children.clone();

            let mut best: Option<(Hash256, u64)> = None;
            for child in children {
                if !self.node_leads_to_viable_head(&child) {
                    continue;
                }
                let child_weight = self.nodes[&child].weight;
                let take = match best {
                    None => true,
                    Some((best_child, best_weight)) => {
                        if child_weight == best_weight {
                            child >= best_child
                        } else {
                            child_weight > best_weight
                        }
                    }
                };
                if take {
                    best = Some((child, child_weight));
                }
            }

            let (best_child, best_descendant) = match best {
                Some((child, _)) => {
                    let descendant = self.nodes[&child].best_descendant.unwrap_or(child);
                    (Some(child), Some(descendant))
                }
                None => {
                    if self.node_is_viable_for_head(&self.nodes[&root]) {
                        (None, Some(root))
                    } else {
                        (None, None)
                    }
                }
            };

            let node = self.nodes.get_mut(&root).expect("root came from order");
            node.best_child = best_child;
            node.best_descendant = best_descendant;
        }
    }

    /// Follow the best-descendant link from `justified_root` to find the current head.
    ///
    /// Only accurate if `update_best_descendants` has run since the last balance mutation;
    /// callers (the `fork_choice` crate's `Head`) are responsible for sequencing
    /// `recompute_weights` -> `update_best_descendants` -> `find_head`.
    pub fn find_head(&self, justified_root: &Hash256) -> Result<Hash256, Error> {
        let justified = self
            .nodes
            .get(justified_root)
            .ok_or(Error::UnknownJustifiedRoot(*justified_root))?;

        let best_descendant_root = justified
            .best_descendant
            .ok_or(Error::InvalidBestDescendant(*justified_root))?;

        let best_node = self
            .nodes
            .get(&best_descendant_root)
            .ok_or(Error::InvalidBestDescendant(best_descendant_root))?;

        Ok(best_node.root)
    }

    /// Returns the root of the first ancestor of `root` (inclusive) whose slot is `<= slot`.
    pub fn ancestor_at_slot(
        &self,
        ctx: &Context,
        root: Hash256,
        slot: Slot,
    ) -> Result<Hash256, Error> {
        let mut current = self.nodes.get(&root).ok_or(Error::NilNode)?;

        while current.slot > slot {
            ctx.check()?;
            match current.parent {
                Some(parent_root) => {
                    current = self.nodes.get(&parent_root).ok_or(Error::NilNode)?;
                }
                None => return Err(Error::NilNode),
            }
        }

        Ok(current.root)
    }

    /// Returns `true` if `descendant` is `ancestor` or a descendant of it, by walking parent
    /// links from `descendant` up to the tree root.
    pub fn is_descendant(&self, ancestor: Hash256, descendant: Hash256) -> bool {
        let mut current = descendant;
        loop {
            if current == ancestor {
                return true;
            }
            match self.nodes.get(&current).and_then(|n| n.parent) {
                Some(parent) => current = parent,
                None => return false,
            }
        }
    }

    /// Advance finality: drop every node that is not `finalized_root` or a descendant of it.
    ///
    /// A no-op if `finalized_epoch` hasn't advanced. Below `prune_threshold` live nodes the
    /// reachability walk is skipped too -- with the default threshold of `0` this never applies,
    /// so finality always keeps exactly `finalized_root` and its descendants, per spec. A caller
    /// that raises `prune_threshold` above `0` is explicitly trading that guarantee for fewer
    /// walks on a small, frequently-finalizing tree. Returns the number of nodes actually
    /// dropped.
    pub fn maybe_prune(
        &mut self,
        ctx: &Context,
        finalized_root: Hash256,
        finalized_epoch: Epoch,
    ) -> Result<usize, Error> {
        if finalized_epoch <= self.finalized_epoch {
            return Ok(0);
        }

        if !self.nodes.contains_key(&finalized_root) {
            return Err(Error::UnknownFinalizedRoot(finalized_root));
        }

        self.finalized_epoch = finalized_epoch;

        if self.nodes.len() < self.prune_threshold {
            return Ok(0);
        }

        // Forward reachability from the new finalized root is the node set to keep -- equivalent
        // to the spec's per-node "walk parent links up to the root" check, but touches each
        // surviving node once rather than re-walking shared ancestors for every live node.
        let mut keep = std::collections::HashSet::new();
        let mut frontier = vec![finalized_root];
        while let Some(root) = frontier.pop() {
            ctx.check()?;
            if keep.insert(root) {
                if let Some(node) = self.nodes.get(&root) {
                    frontier.extend(node.children.iter().copied());
                }
            }
        }

        let dropped = self.nodes.len() - keep.len();

        self.nodes.retain(|root, _| keep.contains(root));
        self.order.retain(|root| keep.contains(root));

        self.nodes
            .get_mut(&finalized_root)
            .expect("finalized_root presence checked above")
            .parent = None;
        self.tree_root = Some(finalized_root);

        Ok(dropped)
    }
}
