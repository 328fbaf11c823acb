use super::node::Node;

/// An in-memory order-statistic B-tree over distinct positive `u64` keys.
///
/// Parameterized by a minimum degree `t >= 2` fixed at construction; every
/// non-root node holds between `t - 1` and `2t - 1` keys. Besides plain
/// membership, the tree answers `rank`, `select`, and two pruned range
/// scans in `O(t log_t n)` via a `size` augmentation kept on every node.
pub struct BTree {
    root: Node,
    t: usize,
}

impl BTree {
    /// Creates an empty tree with the given minimum degree.
    ///
    /// # Panics
    /// Panics if `t < 2` — this is a precondition violation, not a normal
    /// failure mode.
    pub fn new(t: usize) -> Self {
        assert!(t >= 2, "minimum degree must be at least 2, got {t}");
        BTree {
            root: Node::leaf(2 * t - 1),
            t,
        }
    }

    /// Number of distinct keys currently stored.
    pub fn len(&self) -> usize {
        self.root.size
    }

    pub fn is_empty(&self) -> bool {
        self.root.size == 0
    }

    /// Returns whether `x` is present.
    pub fn search(&self, x: u64) -> bool {
        Self::search_node(&self.root, x)
    }

    fn search_node(node: &Node, x: u64) -> bool {
        let i = node.locate(x);
        if i < node.keys.len() && node.keys[i] == x {
            true
        } else if node.is_leaf() {
            false
        } else {
            Self::search_node(&node.children[i], x)
        }
    }

    /// Inserts `x`. A no-op if `x` is already present.
    ///
    /// # Panics
    /// Panics if `x == 0` — keys are positive integers by contract; `0` is
    /// a precondition violation the caller should never produce (the
    /// driver's own parsing already rejects `0` before it reaches here).
    pub fn insert(&mut self, x: u64) {
        assert!(x >= 1, "key must be a positive integer, got {x}");
        if self.search(x) {
            return;
        }

        let max_keys = 2 * self.t - 1;
        if self.root.keys.len() == max_keys {
            let old_root = std::mem::replace(&mut self.root, Node::leaf(max_keys));
            self.root.children.push(old_root);
            self.root.split_child(0, self.t);
        }
        Self::insert_non_full(&mut self.root, x, self.t);
        self.root.recompute_size();
    }

    fn insert_non_full(node: &mut Node, x: u64, t: usize) {
        let mut i = node.locate(x);
        if node.is_leaf() {
            node.keys.insert(i, x);
        } else {
            let max_keys = 2 * t - 1;
            if node.children[i].keys.len() == max_keys {
                node.split_child(i, t);
                if x > node.keys[i] {
                    i += 1;
                }
            }
            Self::insert_non_full(&mut node.children[i], x, t);
        }
        node.recompute_size();
    }

    /// Removes `x` if present. A no-op otherwise, including on an empty
    /// tree.
    pub fn delete(&mut self, x: u64) {
        if !self.search(x) {
            return;
        }
        Self::delete_node(&mut self.root, x, self.t);
        self.root.recompute_size();

        // The only way the tree shrinks in height: a merge at the root
        // pulled its sole key down, leaving it keyless with one child.
        if self.root.keys.is_empty() && !self.root.is_leaf() {
            let remaining_child = self.root.children.pop().unwrap();
            self.root = remaining_child;
        }
    }

    /// Deletes `x` from the subtree rooted at `node`, assuming `x` is
    /// present there. Maintains the precondition that every node this
    /// descends into (other than the tree's root) has at least `t` keys
    /// by rebalancing before stepping down (`ensure_min_keys`).
    fn delete_node(node: &mut Node, x: u64, t: usize) {
        let i = node.locate(x);
        if i < node.keys.len() && node.keys[i] == x {
            if node.is_leaf() {
                node.keys.remove(i);
            } else {
                let left_has_spare = node.children[i].keys.len() >= t;
                let right_has_spare = node.children[i + 1].keys.len() >= t;
                if left_has_spare {
                    let predecessor = Self::max_key(&node.children[i]);
                    node.keys[i] = predecessor;
                    Self::delete_node(&mut node.children[i], predecessor, t);
                } else if right_has_spare {
                    let successor = Self::min_key(&node.children[i + 1]);
                    node.keys[i] = successor;
                    Self::delete_node(&mut node.children[i + 1], successor, t);
                } else {
                    node.merge_children(i);
                    Self::delete_node(&mut node.children[i], x, t);
                }
            }
        } else if !node.is_leaf() {
            let child_index = Self::ensure_min_keys(node, i, t);
            Self::delete_node(&mut node.children[child_index], x, t);
        }
        node.recompute_size();
    }

    /// Rebalances so that `children[i]` has at least `t` keys before the
    /// caller descends into it, by borrowing from a sibling with keys to
    /// spare, or else merging with one. Returns the index of the child to
    /// descend into, which shifts left by one when a merge pulls the
    /// target into its left sibling.
    fn ensure_min_keys(node: &mut Node, i: usize, t: usize) -> usize {
        if node.children[i].keys.len() >= t {
            return i;
        }

        let left_has_spare = i > 0 && node.children[i - 1].keys.len() >= t;
        let right_has_spare = i + 1 < node.children.len() && node.children[i + 1].keys.len() >= t;

        if left_has_spare {
            node.borrow_from_sibling(i, true);
            i
        } else if right_has_spare {
            node.borrow_from_sibling(i, false);
            i
        } else if i > 0 {
            node.merge_children(i - 1);
            i - 1
        } else {
            node.merge_children(i);
            i
        }
    }

    fn max_key(node: &Node) -> u64 {
        if node.is_leaf() {
            *node.keys.last().unwrap()
        } else {
            Self::max_key(node.children.last().unwrap())
        }
    }

    fn min_key(node: &Node) -> u64 {
        if node.is_leaf() {
            node.keys[0]
        } else {
            Self::min_key(&node.children[0])
        }
    }

    /// The 1-based position of `x` in sorted order, or `None` if absent.
    pub fn rank(&self, x: u64) -> Option<usize> {
        Self::rank_node(&self.root, x)
    }

    fn rank_node(node: &Node, x: u64) -> Option<usize> {
        let i = node.locate(x);
        let mut preceding = i;
        if !node.is_leaf() {
            preceding += node.children[..i].iter().map(|child| child.size).sum::<usize>();
        }

        if i < node.keys.len() && node.keys[i] == x {
            Some(preceding + 1)
        } else if node.is_leaf() {
            None
        } else {
            Self::rank_node(&node.children[i], x).map(|contribution| preceding + contribution)
        }
    }

    /// The `k`-th smallest key (1-based), or `None` if `k` is out of
    /// `[1, len()]`.
    pub fn select(&self, k: usize) -> Option<u64> {
        if k < 1 || k > self.root.size {
            return None;
        }
        Some(Self::select_node(&self.root, k))
    }

    fn select_node(node: &Node, k: usize) -> u64 {
        if node.is_leaf() {
            return node.keys[k - 1];
        }

        let mut remaining = k;
        for i in 0..node.children.len() {
            let child_size = node.children[i].size;
            if remaining <= child_size {
                return Self::select_node(&node.children[i], remaining);
            }
            remaining -= child_size;

            if i < node.keys.len() {
                if remaining == 1 {
                    return node.keys[i];
                }
                remaining -= 1;
            }
        }
        unreachable!("k was bounds-checked against root.size before descending")
    }

    /// Every stored key in `[lo, hi]`, ascending. Empty if none match or
    /// `lo > hi`.
    pub fn keys_in_range(&self, lo: u64, hi: u64) -> Vec<u64> {
        self.range_filtered(lo, hi, |_| true)
    }

    /// Every stored prime key in `[lo, hi]`, ascending. Empty if none
    /// match or `lo > hi`. The primality oracle runs only on keys the
    /// range scan actually visits.
    pub fn primes_in_range(&self, lo: u64, hi: u64) -> Vec<u64> {
        self.range_filtered(lo, hi, |&key| crate::primality::is_prime(key))
    }

    fn range_filtered(&self, lo: u64, hi: u64, predicate: impl Fn(&u64) -> bool) -> Vec<u64> {
        let mut out = Vec::new();
        if lo <= hi {
            Self::range_node(&self.root, lo, hi, &predicate, &mut out);
        }
        out
    }

    /// Visits only nodes that can contain a key in `[lo, hi]`, pruning
    /// both below `lo` and above `hi`.
    fn range_node(node: &Node, lo: u64, hi: u64, predicate: &impl Fn(&u64) -> bool, out: &mut Vec<u64>) {
        for i in 0..node.keys.len() {
            let key = node.keys[i];
            if !node.is_leaf() && key > lo {
                Self::range_node(&node.children[i], lo, hi, predicate, out);
            }
            if key > hi {
                return;
            }
            if key >= lo && predicate(&key) {
                out.push(key);
            }
        }
        if !node.is_leaf() {
            Self::range_node(node.children.last().unwrap(), lo, hi, predicate, out);
        }
    }

    /// Walks the whole tree checking every structural invariant: ascending
    /// keys, key bounds against the parent separator, child-count-equals-
    /// key-count-plus-one for internal nodes, size augmentation, and equal
    /// leaf depth. Only exercised by tests, but kept as a regular
    /// (non-test-gated) method so integration tests outside this crate
    /// can call it through the public API surface too.
    #[doc(hidden)]
    pub fn check_invariants(&self) {
        fn check(node: &Node, t: usize, is_root: bool, depth: usize, expected_leaf_depth: &mut Option<usize>) {
            assert!(node.keys.windows(2).all(|pair| pair[0] < pair[1]), "keys must be strictly ascending");

            let min_keys = if is_root { if node.is_leaf() { 0 } else { 1 } } else { t - 1 };
            let max_keys = 2 * t - 1;
            assert!(node.keys.len() <= max_keys, "node exceeds max key count");
            assert!(node.keys.len() >= min_keys, "node below min key count");

            if !node.is_leaf() {
                assert_eq!(node.children.len(), node.keys.len() + 1, "internal node child/key mismatch");
            }

            let own_size = node.keys.len() + node.children.iter().map(|c| c.size).sum::<usize>();
            assert_eq!(node.size, own_size, "size augmentation out of sync");

            if node.is_leaf() {
                match expected_leaf_depth {
                    Some(expected) => assert_eq!(*expected, depth, "leaves at unequal depth"),
                    None => *expected_leaf_depth = Some(depth),
                }
            } else {
                for child in &node.children {
                    check(child, t, false, depth + 1, expected_leaf_depth);
                }
            }
        }

        let mut expected_leaf_depth = None;
        check(&self.root, self.t, true, 0, &mut expected_leaf_depth);

        let mut seen = std::collections::HashSet::new();
        for key in self.keys_in_range(0, u64::MAX) {
            assert!(seen.insert(key), "duplicate key {key} found in tree");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::BTree;

    #[test]
    fn search_finds_inserted_keys() {
        let mut tree = BTree::new(2);
        for key in [10, 20, 5, 6, 12, 30, 7, 17] {
            tree.insert(key);
        }
        assert!(tree.search(17));
        assert!(!tree.search(99));
        tree.check_invariants();
    }

    #[test]
    fn duplicate_insert_is_a_no_op() {
        let mut tree = BTree::new(2);
        tree.insert(7);
        tree.insert(7);
        tree.insert(7);
        assert_eq!(tree.len(), 1);
        tree.delete(7);
        tree.delete(7);
        assert_eq!(tree.len(), 0);
        assert_eq!(tree.select(1), None);
    }

    #[test]
    fn delete_absent_key_is_a_no_op() {
        let mut tree = BTree::new(2);
        tree.insert(10);
        tree.delete(99);
        assert_eq!(tree.len(), 1);
        assert!(tree.search(10));
    }

    #[test]
    fn delete_from_empty_tree_is_a_no_op() {
        let mut tree: BTree = BTree::new(3);
        tree.delete(1);
        assert_eq!(tree.len(), 0);
    }

    #[test]
    fn select_and_rank_scenario_one() {
        let mut tree = BTree::new(2);
        for key in [10, 20, 5, 6, 12, 30, 7, 17] {
            tree.insert(key);
        }
        let selected: Vec<u64> = (1..=8).map(|k| tree.select(k).unwrap()).collect();
        assert_eq!(selected, vec![5, 6, 7, 10, 12, 17, 20, 30]);
        assert_eq!(tree.rank(12), Some(5));
        assert_eq!(tree.rank(99), None);
        tree.check_invariants();
    }

    #[test]
    fn range_queries_scenario_two() {
        let mut tree = BTree::new(2);
        for key in 1..=20 {
            tree.insert(key);
        }
        assert_eq!(tree.keys_in_range(5, 10), vec![5, 6, 7, 8, 9, 10]);
        assert_eq!(
            tree.primes_in_range(1, 20),
            vec![2, 3, 5, 7, 11, 13, 17, 19]
        );
    }

    #[test]
    fn delete_scenario_three() {
        let mut tree = BTree::new(2);
        for key in 1..=10 {
            tree.insert(key);
        }
        for key in [5, 3, 8, 1, 10] {
            tree.delete(key);
        }
        tree.check_invariants();
        let selected: Vec<u64> = (1..=5).map(|k| tree.select(k).unwrap()).collect();
        assert_eq!(selected, vec![2, 4, 6, 7, 9]);
        assert_eq!(tree.rank(4), Some(2));
    }

    #[test]
    fn degree_three_scenario_four() {
        let mut tree = BTree::new(3);
        for key in 1..=30 {
            tree.insert(key);
        }
        assert_eq!(tree.keys_in_range(0, 0), Vec::<u64>::new());
        assert_eq!(tree.keys_in_range(28, 100), vec![28, 29, 30]);
        tree.check_invariants();
    }

    #[test]
    fn primes_in_range_scenario_five() {
        let mut tree = BTree::new(2);
        for key in [97, 100, 101, 103, 104] {
            tree.insert(key);
        }
        assert_eq!(tree.primes_in_range(95, 105), vec![97, 101, 103]);
    }

    #[test]
    fn keys_in_range_with_lo_greater_than_hi_is_empty() {
        let mut tree = BTree::new(2);
        for key in 1..=10 {
            tree.insert(key);
        }
        assert_eq!(tree.keys_in_range(8, 3), Vec::<u64>::new());
    }

    #[test]
    fn select_boundaries_are_absent() {
        let mut tree = BTree::new(2);
        for key in [1, 2, 3] {
            tree.insert(key);
        }
        assert_eq!(tree.select(0), None);
        assert_eq!(tree.select(4), None);
    }

    #[test]
    fn height_shrinks_when_root_merge_empties_it() {
        // t = 2: max 3 keys/node. Four keys force a split, so the root
        // starts with exactly one key and two leaf children.
        let mut tree = BTree::new(2);
        for key in [1, 2, 3, 4] {
            tree.insert(key);
        }
        // Root has one key; its children hold two keys apiece at worst.
        // Delete enough from both sides to force the root-level merge.
        tree.delete(1);
        tree.delete(2);
        tree.check_invariants();
        assert_eq!(tree.keys_in_range(1, 10), vec![3, 4]);
    }

    #[test]
    fn large_random_insert_delete_round_trip_preserves_invariants() {
        use std::collections::BTreeSet;
        use rand::rngs::StdRng;
        use rand::{Rng, SeedableRng};

        let mut reference = BTreeSet::new();
        let mut tree = BTree::new(2);
        let mut rng = StdRng::seed_from_u64(0);

        for _ in 0..400 {
            let key = 1 + rng.gen_range(0..500_u64);
            if rng.gen_range(0..3) == 0 && !reference.is_empty() {
                let victim_index = rng.gen_range(0..reference.len());
                let victim = *reference.iter().nth(victim_index).unwrap();
                reference.remove(&victim);
                tree.delete(victim);
            } else {
                reference.insert(key);
                tree.insert(key);
            }
            tree.check_invariants();
        }

        assert_eq!(tree.len(), reference.len());
        let expected: Vec<u64> = reference.into_iter().collect();
        assert_eq!(tree.keys_in_range(0, u64::MAX), expected);
    }
}
