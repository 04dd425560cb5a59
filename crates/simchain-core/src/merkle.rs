use crate::{sha256_hex, Digest};
use serde::{Deserialize, Serialize};

/// Binary hash-reduction tree over an ordered sequence of digest strings.
///
/// All levels are built eagerly at construction and kept, leaf level
/// included, so callers can display the whole reduction. The tree is a
/// snapshot: rebuild for updated leaves.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct MerkleTree {
    leaves: Vec<Digest>,
    levels: Vec<Vec<Digest>>,
}

impl MerkleTree {
    pub fn new(leaves: Vec<Digest>) -> Self {
        let levels = build_levels(&leaves);
        Self { leaves, levels }
    }

    pub fn leaves(&self) -> &[Digest] {
        &self.leaves
    }

    /// Every reduction level, level 0 being the leaves and the last level
    /// the single root entry. Empty for an empty tree.
    pub fn levels(&self) -> &[Vec<Digest>] {
        &self.levels
    }

    /// The root digest, or `None` for a tree built from zero leaves.
    pub fn root(&self) -> Option<&str> {
        self.levels.last().map(|level| level[0].as_str())
    }
}

/// Reduce pairwise: duplicate the last entry of an odd level, then hash the
/// concatenation of each adjacent pair (left hex literal then right, no
/// separator). Root order-sensitivity follows from the concatenation.
fn build_levels(leaves: &[Digest]) -> Vec<Vec<Digest>> {
    if leaves.is_empty() {
        return Vec::new();
    }

    let mut levels = vec![leaves.to_vec()];
    while levels.last().expect("non-empty").len() > 1 {
        let mut current = levels.last().expect("non-empty").clone();
        if current.len() % 2 != 0 {
            current.push(current.last().expect("non-empty").clone());
        }
        let next = current
            .chunks_exact(2)
            .map(|pair| sha256_hex(&format!("{}{}", pair[0], pair[1])))
            .collect();
        levels.push(next);
    }
    levels
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sha256_hex;
    use rand::{rngs::StdRng, seq::SliceRandom, SeedableRng};

    fn sample_leaves(n: usize) -> Vec<Digest> {
        (0..n).map(|i| sha256_hex(&format!("Block {i}"))).collect()
    }

    #[test]
    fn empty_tree_has_no_root() {
        let tree = MerkleTree::new(Vec::new());
        assert_eq!(tree.root(), None);
        assert!(tree.levels().is_empty());
    }

    #[test]
    fn single_leaf_is_its_own_root() {
        let leaves = sample_leaves(1);
        let tree = MerkleTree::new(leaves.clone());
        assert_eq!(tree.root(), Some(leaves[0].as_str()));
        assert_eq!(tree.levels().len(), 1);
    }

    #[test]
    fn four_leaves_reduce_as_two_pair_hashes() {
        let leaves = sample_leaves(4);
        let left = sha256_hex(&format!("{}{}", leaves[0], leaves[1]));
        let right = sha256_hex(&format!("{}{}", leaves[2], leaves[3]));
        let expected = sha256_hex(&format!("{left}{right}"));

        let tree = MerkleTree::new(leaves);
        assert_eq!(tree.root(), Some(expected.as_str()));
        assert_eq!(tree.levels().len(), 3);
        assert_eq!(tree.levels()[1], vec![left, right]);
    }

    #[test]
    fn odd_level_duplicates_its_last_entry() {
        let mut leaves = sample_leaves(3);
        let tree = MerkleTree::new(leaves.clone());

        leaves.push(leaves[2].clone());
        let padded = MerkleTree::new(leaves);
        assert_eq!(tree.root(), padded.root());
    }

    #[test]
    fn root_is_deterministic() {
        let leaves = sample_leaves(7);
        let a = MerkleTree::new(leaves.clone());
        let b = MerkleTree::new(leaves);
        assert_eq!(a.root(), b.root());
    }

    #[test]
    fn root_depends_on_leaf_order() {
        let leaves = sample_leaves(8);
        let mut shuffled = leaves.clone();
        let mut rng = StdRng::seed_from_u64(42);
        while shuffled == leaves {
            shuffled.shuffle(&mut rng);
        }
        let original = MerkleTree::new(leaves);
        let permuted = MerkleTree::new(shuffled);
        assert_ne!(original.root(), permuted.root());
    }

    #[test]
    fn level_count_is_logarithmic() {
        for (n, expected_levels) in [(2, 2), (4, 3), (5, 4), (8, 4), (16, 5)] {
            let tree = MerkleTree::new(sample_leaves(n));
            assert_eq!(tree.levels().len(), expected_levels, "n = {n}");
        }
    }

    #[test]
    fn leaves_are_snapshotted() {
        let leaves = sample_leaves(2);
        let tree = MerkleTree::new(leaves.clone());
        assert_eq!(tree.leaves(), leaves.as_slice());
        assert_eq!(tree.levels()[0], leaves);
    }
}
