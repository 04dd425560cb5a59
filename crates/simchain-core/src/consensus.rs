use crate::chain::Chain;
use crate::merkle::MerkleTree;
use crate::Digest;
use serde::{Deserialize, Serialize};
use tracing::info;

/// One replica's standing in a cross-replica comparison.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ReplicaStatus {
    /// Merkle root over the replica's block digests (empty string for an
    /// empty chain).
    pub root: Digest,
    /// Result of the replica's own structural validation.
    pub valid: bool,
    /// True iff the replica is valid AND its root equals the majority root.
    pub accepted: bool,
}

/// Outcome of a majority-rule comparison across replicas.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ConsensusReport {
    pub replicas: Vec<ReplicaStatus>,
    pub majority_root: Digest,
    pub majority_count: usize,
}

/// Compute every replica's Merkle root, pick the majority root and flag
/// each replica accepted or rejected.
///
/// This is a simplified majority rule, not a consensus protocol: a tampered
/// majority of replicas sharing one corrupted chain will out-vote an honest
/// minority, and the corrupted root is then reported as the majority root.
pub fn compare_roots(chains: &[Chain]) -> ConsensusReport {
    let roots: Vec<Digest> = chains
        .iter()
        .map(|chain| chain.merkle_root().unwrap_or_default())
        .collect();

    let (majority_root, majority_count) = majority(&roots);

    let replicas = chains
        .iter()
        .zip(&roots)
        .map(|(chain, root)| {
            let valid = chain.is_valid();
            ReplicaStatus {
                root: root.clone(),
                valid,
                accepted: valid && *root == majority_root,
            }
        })
        .collect();

    info!(
        replicas = chains.len(),
        majority_count,
        majority_root = %majority_root,
        "compared replica roots"
    );

    ConsensusReport {
        replicas,
        majority_root,
        majority_count,
    }
}

/// The root with the highest occurrence count. Ties break to the root
/// encountered FIRST in scan order; hash strings carry no natural order
/// worth sorting by, so the tie-break must be explicit.
fn majority(roots: &[Digest]) -> (Digest, usize) {
    let mut tally: Vec<(&Digest, usize)> = Vec::new();
    for root in roots {
        match tally.iter_mut().find(|(seen, _)| *seen == root) {
            Some((_, count)) => *count += 1,
            None => tally.push((root, 1)),
        }
    }

    let mut winner: (Digest, usize) = (Digest::new(), 0);
    for (root, count) in tally {
        // Strictly-greater keeps the earliest maximal entry.
        if count > winner.1 {
            winner = (root.clone(), count);
        }
    }
    winner
}

/// Indices at which two chains' block digests differ, aligned by index up
/// to the shorter chain's length. A longer tail beyond the shared prefix is
/// NOT reported here; a length mismatch still surfaces through differing
/// Merkle roots in `compare_roots`.
pub fn diff_blocks(a: &Chain, b: &Chain) -> Vec<usize> {
    a.blocks
        .iter()
        .zip(&b.blocks)
        .enumerate()
        .filter(|(_, (x, y))| x.digest != y.digest)
        .map(|(i, _)| i)
        .collect()
}
