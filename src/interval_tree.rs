//! Augmented interval tree keyed by `(low, high)`.
//!
//! Every node carries `max_high`, the largest `high` in its subtree, so an
//! overlap search can skip a left subtree whose intervals all end before the
//! query starts. Intervals with identical bounds share one node and keep their
//! payloads in a set.
//!
//! The tree does not rebalance. Insertion order decides its shape, so keys that
//! arrive in increasing order degrade it to a list. Nodes live in an arena and
//! every operation walks it iteratively, which keeps a degenerate tree from
//! exhausting the call stack.

use std::collections::HashSet;
use std::hash::Hash;

type NodeId = usize;

/// One `(low, high, payload)` triple as stored or returned by the tree.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Entry<K, P> {
    pub low: K,
    pub high: K,
    pub payload: P,
}

#[derive(Debug)]
struct Node<K, P> {
    low: K,
    high: K,
    /// Max `high` over this node and both subtrees.
    max_high: K,
    payloads: HashSet<P>,
    left: Option<NodeId>,
    right: Option<NodeId>,
}

#[derive(Debug)]
enum Slot<K, P> {
    Occupied(Node<K, P>),
    Vacant,
}

#[derive(Debug)]
pub struct IntervalTree<K, P> {
    slots: Vec<Slot<K, P>>,
    free: Vec<NodeId>,
    root: Option<NodeId>,
    len: usize,
}

impl<K, P> Default for IntervalTree<K, P> {
    fn default() -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
            root: None,
            len: 0,
        }
    }
}

impl<K, P> IntervalTree<K, P>
where
    K: Ord + Copy,
    P: Eq + Hash + Clone,
{
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    /// Number of distinct `(low, high)` ranges.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Number of stored payloads across all ranges.
    pub fn payload_count(&self) -> usize {
        self.slots
            .iter()
            .map(|slot| match slot {
                Slot::Occupied(node) => node.payloads.len(),
                Slot::Vacant => 0,
            })
            .sum()
    }

    /// Insert `payload` for `[low, high)`, merging into an existing node when
    /// the exact range is already present.
    pub fn insert(&mut self, low: K, high: K, payload: P) {
        debug_assert!(low < high, "interval low must be below high");

        let mut parent: Option<(NodeId, bool)> = None;
        let mut cursor = self.root;
        while let Some(id) = cursor {
            let node = self.node_mut(id);
            if node.low == low && node.high == high {
                node.payloads.insert(payload);
                return;
            }
            // Every node on the descent path gains `high` in its subtree.
            if high > node.max_high {
                node.max_high = high;
            }
            let go_left = low < node.low;
            cursor = if go_left { node.left } else { node.right };
            parent = Some((id, go_left));
        }

        let id = self.alloc(Node {
            low,
            high,
            max_high: high,
            payloads: HashSet::from([payload]),
            left: None,
            right: None,
        });
        match parent {
            None => self.root = Some(id),
            Some((pid, true)) => self.node_mut(pid).left = Some(id),
            Some((pid, false)) => self.node_mut(pid).right = Some(id),
        }
        self.len += 1;
    }

    /// Remove `payload` from `[low, high)`, or every payload when `None`.
    /// The node is unlinked once its payload set is empty.
    ///
    /// Returns whether anything was removed; a missing range or payload is a
    /// no-op.
    pub fn remove(&mut self, low: K, high: K, payload: Option<&P>) -> bool {
        let mut path = Vec::new();
        let mut cursor = self.root;
        let target = loop {
            let Some(id) = cursor else { return false };
            let node = self.node(id);
            if low < node.low {
                cursor = node.left;
            } else if low == node.low && high == node.high {
                break id;
            } else {
                // Equal lows with a different high live on the right.
                cursor = node.right;
            }
            path.push(id);
        };

        let node = self.node_mut(target);
        let removed = match payload {
            Some(p) => node.payloads.remove(p),
            None => {
                let had_any = !node.payloads.is_empty();
                node.payloads.clear();
                had_any
            }
        };
        if node.payloads.is_empty() {
            self.unlink(target, &path);
        }
        removed
    }

    /// Every stored `(low, high, payload)` overlapping the half-open query
    /// range, one entry per payload. Bounds given in reverse are swapped; an
    /// empty range overlaps nothing.
    pub fn overlapping(&self, low: K, high: K) -> Vec<Entry<K, P>> {
        let (low, high) = (low.min(high), low.max(high));
        let mut out = Vec::new();
        if low == high {
            return out;
        }
        let mut stack: Vec<NodeId> = self.root.into_iter().collect();
        while let Some(id) = stack.pop() {
            let node = self.node(id);
            if low < node.high && high > node.low {
                push_payloads(node, &mut out);
            }
            if let Some(left) = node.left
                && self.node(left).max_high >= low
            {
                stack.push(left);
            }
            // Ordering by `low` alone does not bound the right side.
            if let Some(right) = node.right {
                stack.push(right);
            }
        }
        out
    }

    /// Every stored interval with `high <= bound`.
    pub fn ending_before(&self, bound: K) -> Vec<Entry<K, P>> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.root.into_iter().collect();
        while let Some(id) = stack.pop() {
            let node = self.node(id);
            if node.high <= bound {
                push_payloads(node, &mut out);
            }
            // A left child's own `low` says nothing about its left subtree.
            if let Some(left) = node.left {
                stack.push(left);
            }
            // Right lows are >= this low, so their highs exceed `bound` too.
            if let Some(right) = node.right
                && node.low < bound
            {
                stack.push(right);
            }
        }
        out
    }

    // ── Structural helpers ───────────────────────────────────

    /// Standard BST deletion of `target`; `path` holds its ancestors, root
    /// first.
    fn unlink(&mut self, target: NodeId, path: &[NodeId]) {
        let (left, right) = {
            let node = self.node(target);
            (node.left, node.right)
        };
        match (left, right) {
            (None, child) | (child, None) => {
                self.replace_child(path.last().copied(), target, child);
                self.release(target);
            }
            (Some(_), Some(right)) => {
                // Splice in the in-order successor: leftmost node on the right.
                let mut succ_path = vec![target];
                let mut succ = right;
                while let Some(next) = self.node(succ).left {
                    succ_path.push(succ);
                    succ = next;
                }
                let succ_right = self.node(succ).right;
                self.replace_child(succ_path.last().copied(), succ, succ_right);
                let succ_node = self.release(succ);

                let node = self.node_mut(target);
                node.low = succ_node.low;
                node.high = succ_node.high;
                node.payloads = succ_node.payloads;
                for &id in succ_path.iter().rev() {
                    self.refresh_max_high(id);
                }
            }
        }
        for &id in path.iter().rev() {
            self.refresh_max_high(id);
        }
        self.len -= 1;
    }

    fn replace_child(&mut self, parent: Option<NodeId>, old: NodeId, new: Option<NodeId>) {
        match parent {
            None => self.root = new,
            Some(pid) => {
                let parent = self.node_mut(pid);
                if parent.left == Some(old) {
                    parent.left = new;
                } else {
                    parent.right = new;
                }
            }
        }
    }

    fn refresh_max_high(&mut self, id: NodeId) {
        let node = self.node(id);
        let mut max_high = node.high;
        for child in [node.left, node.right].into_iter().flatten() {
            max_high = max_high.max(self.node(child).max_high);
        }
        self.node_mut(id).max_high = max_high;
    }

    // ── Arena ────────────────────────────────────────────────

    fn alloc(&mut self, node: Node<K, P>) -> NodeId {
        match self.free.pop() {
            Some(id) => {
                self.slots[id] = Slot::Occupied(node);
                id
            }
            None => {
                self.slots.push(Slot::Occupied(node));
                self.slots.len() - 1
            }
        }
    }

    fn release(&mut self, id: NodeId) -> Node<K, P> {
        match std::mem::replace(&mut self.slots[id], Slot::Vacant) {
            Slot::Occupied(node) => {
                self.free.push(id);
                node
            }
            Slot::Vacant => unreachable!("released vacant slot {id}"),
        }
    }

    fn node(&self, id: NodeId) -> &Node<K, P> {
        match &self.slots[id] {
            Slot::Occupied(node) => node,
            Slot::Vacant => unreachable!("vacant slot {id} linked into the tree"),
        }
    }

    fn node_mut(&mut self, id: NodeId) -> &mut Node<K, P> {
        match &mut self.slots[id] {
            Slot::Occupied(node) => node,
            Slot::Vacant => unreachable!("vacant slot {id} linked into the tree"),
        }
    }
}

fn push_payloads<K: Copy, P: Clone>(node: &Node<K, P>, out: &mut Vec<Entry<K, P>>) {
    out.extend(node.payloads.iter().map(|payload| Entry {
        low: node.low,
        high: node.high,
        payload: payload.clone(),
    }));
}
