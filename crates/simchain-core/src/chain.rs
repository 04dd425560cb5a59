use crate::block::{unix_now, Block};
use crate::constants::{GENESIS_PAYLOAD, GENESIS_PREVIOUS_DIGEST};
use crate::merkle::MerkleTree;
use crate::Digest;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

/// Which of the three pairwise invariants a block broke.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Violation {
    /// Stored digest no longer matches a recomputation over the block fields.
    DigestMismatch,
    /// `previous_digest` does not equal the predecessor's digest.
    BrokenLink,
    /// Digest lacks the required number of leading zero hex chars.
    InsufficientWork,
}

impl std::fmt::Display for Violation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Violation::DigestMismatch => "digest mismatch",
            Violation::BrokenLink => "broken link",
            Violation::InsufficientWork => "insufficient work",
        };
        f.write_str(s)
    }
}

/// First invariant violation found while walking the chain. A query result,
/// not a fault: validation itself never panics or mutates.
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq, Serialize, Deserialize)]
#[error("chain invalid at block {index}: {violation}")]
pub struct ValidationError {
    pub index: usize,
    pub violation: Violation,
}

/// Append-only sequence of mined blocks. Index 0 is always the genesis
/// block, mined at construction with the `"0"` sentinel predecessor.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Chain {
    pub difficulty: u32,
    pub blocks: Vec<Block>,
}

impl Chain {
    /// Build a chain whose genesis block is mined immediately at the given
    /// difficulty.
    pub fn new(difficulty: u32, genesis_timestamp: u64) -> Self {
        let mut genesis = Block::new(GENESIS_PAYLOAD, GENESIS_PREVIOUS_DIGEST, genesis_timestamp);
        genesis.mine(difficulty);
        debug!(difficulty, genesis = %genesis.digest, "chain created");
        Self {
            difficulty,
            blocks: vec![genesis],
        }
    }

    pub fn tip(&self) -> &Block {
        self.blocks.last().expect("chain always holds genesis")
    }

    /// Mine and append a block carrying `payload`, timestamped now.
    pub fn add_block(&mut self, payload: impl Into<String>) {
        self.add_block_at(payload, unix_now());
    }

    /// Mine and append a block with an explicit timestamp. Deterministic
    /// inputs give deterministic digests, which tests rely on.
    pub fn add_block_at(&mut self, payload: impl Into<String>, timestamp: u64) {
        let mut block = Block::new(payload, self.tip().digest.clone(), timestamp);
        block.mine(self.difficulty);
        self.blocks.push(block);
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Walk blocks 1..n checking, in order: digest integrity, link
    /// integrity, difficulty compliance. Stops at the first failing index.
    pub fn validate(&self) -> Result<(), ValidationError> {
        for i in 1..self.blocks.len() {
            let current = &self.blocks[i];
            let previous = &self.blocks[i - 1];

            let violation = if current.digest != current.compute_digest() {
                Some(Violation::DigestMismatch)
            } else if current.previous_digest != previous.digest {
                Some(Violation::BrokenLink)
            } else if !current.meets_difficulty(self.difficulty) {
                Some(Violation::InsufficientWork)
            } else {
                None
            };

            if let Some(violation) = violation {
                warn!(index = i, %violation, "chain validation failed");
                return Err(ValidationError { index: i, violation });
            }
        }
        Ok(())
    }

    pub fn is_valid(&self) -> bool {
        self.validate().is_ok()
    }

    /// Ordered block digests, the Merkle leaf source for this chain.
    pub fn block_digests(&self) -> Vec<Digest> {
        self.blocks.iter().map(|b| b.digest.clone()).collect()
    }

    /// Merkle root over this chain's block digests. `None` only for an
    /// empty chain, which cannot be built through the public constructors.
    pub fn merkle_root(&self) -> Option<Digest> {
        MerkleTree::new(self.block_digests())
            .root()
            .map(str::to_owned)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::GENESIS_PREVIOUS_DIGEST;

    fn chain_with(difficulty: u32, payloads: &[&str]) -> Chain {
        let mut chain = Chain::new(difficulty, 1000);
        for (i, payload) in payloads.iter().enumerate() {
            chain.add_block_at(*payload, 1001 + i as u64);
        }
        chain
    }

    #[test]
    fn genesis_has_sentinel_predecessor() {
        let chain = Chain::new(1, 1000);
        assert_eq!(chain.blocks[0].previous_digest, GENESIS_PREVIOUS_DIGEST);
        assert!(chain.blocks[0].meets_difficulty(1));
    }

    #[test]
    fn blocks_are_chained_by_digest() {
        let chain = chain_with(1, &["Bloc 1", "Bloc 2", "Bloc 3"]);
        for i in 1..chain.len() {
            assert_eq!(chain.blocks[i].previous_digest, chain.blocks[i - 1].digest);
        }
    }

    #[test]
    fn freshly_built_chain_validates() {
        let chain = chain_with(2, &["a", "b"]);
        assert_eq!(chain.validate(), Ok(()));
        assert!(chain.is_valid());
    }

    #[test]
    fn every_appended_block_meets_difficulty() {
        let chain = chain_with(2, &["a", "b", "c"]);
        for block in &chain.blocks {
            assert!(block.meets_difficulty(2));
        }
    }

    #[test]
    fn tampered_payload_is_detected_at_its_index() {
        let mut chain = chain_with(2, &["a", "b", "c"]);
        chain.blocks[2].update_data("Corruption malveillante");
        let err = chain.validate().unwrap_err();
        // The rewritten block stays self-consistent (digest recomputed), so
        // it is caught by the difficulty check, or by the successor's link
        // in the rare case the unmined digest happens to meet difficulty.
        match err.violation {
            Violation::InsufficientWork => assert_eq!(err.index, 2),
            Violation::BrokenLink => assert_eq!(err.index, 3),
            other => panic!("unexpected violation: {other}"),
        }
        assert!(!chain.is_valid());
    }

    #[test]
    fn silently_rewritten_digest_breaks_the_link() {
        let mut chain = chain_with(1, &["a", "b", "c"]);
        // Re-hash after tampering, as the classic integrity demo does. The
        // block itself is self-consistent; its successor's link is not.
        chain.blocks[1].update_data("tampered");
        chain.blocks[1].mine(chain.difficulty);
        let err = chain.validate().unwrap_err();
        assert_eq!(err.index, 2);
        assert_eq!(err.violation, Violation::BrokenLink);
    }

    #[test]
    fn stale_stored_digest_is_a_digest_mismatch() {
        let mut chain = chain_with(1, &["a", "b"]);
        chain.blocks[1].payload = "edited in place".into();
        let err = chain.validate().unwrap_err();
        assert_eq!(err.index, 1);
        assert_eq!(err.violation, Violation::DigestMismatch);
    }

    #[test]
    fn validation_short_circuits_on_first_failure() {
        let mut chain = chain_with(1, &["a", "b", "c", "d"]);
        chain.blocks[1].payload = "first".into();
        chain.blocks[3].payload = "second".into();
        let err = chain.validate().unwrap_err();
        assert_eq!(err.index, 1);
    }

    #[test]
    fn add_block_without_timestamp_uses_now_and_stays_valid() {
        let mut chain = Chain::new(1, 1000);
        chain.add_block("implicit timestamp");
        assert_eq!(chain.len(), 2);
        assert!(chain.tip().timestamp >= 1000);
        assert!(chain.is_valid());
    }

    #[test]
    fn identical_inputs_build_identical_chains() {
        let a = chain_with(2, &["Transaction 0", "Transaction 1"]);
        let b = chain_with(2, &["Transaction 0", "Transaction 1"]);
        assert_eq!(a.block_digests(), b.block_digests());
        assert_eq!(a.merkle_root(), b.merkle_root());
    }

    #[test]
    fn merkle_root_present_for_any_built_chain() {
        let chain = Chain::new(1, 1000);
        assert!(chain.merkle_root().is_some());
    }

    #[test]
    fn chain_serialization_round_trip() {
        let chain = chain_with(1, &["a"]);
        let json = serde_json::to_string(&chain).unwrap();
        let back: Chain = serde_json::from_str(&json).unwrap();
        assert_eq!(chain, back);
    }
}
