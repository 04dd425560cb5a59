use crate::{sha256_hex, Digest};
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum MiningError {
    #[error("no nonce satisfying difficulty {difficulty} found within {limit} iterations")]
    IterationLimitReached { difficulty: u32, limit: u64 },
}

/// One ledger entry. The digest is cached and must always equal a fresh
/// recomputation over (timestamp, payload, previous_digest, nonce).
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Block {
    pub timestamp: u64,
    pub payload: String,
    pub previous_digest: Digest,
    pub nonce: u64,
    pub digest: Digest,
}

impl Block {
    pub fn new(payload: impl Into<String>, previous_digest: impl Into<Digest>, timestamp: u64) -> Self {
        let mut block = Self {
            timestamp,
            payload: payload.into(),
            previous_digest: previous_digest.into(),
            nonce: 0,
            digest: Digest::new(),
        };
        block.digest = block.compute_digest();
        block
    }

    pub fn new_at_now(payload: impl Into<String>, previous_digest: impl Into<Digest>) -> Self {
        Self::new(payload, previous_digest, unix_now())
    }

    /// Digest over the canonical concatenation of the four block fields,
    /// decimal string forms, no separators. Pure; the caller stores it.
    pub fn compute_digest(&self) -> Digest {
        sha256_hex(&format!(
            "{}{}{}{}",
            self.timestamp, self.payload, self.previous_digest, self.nonce
        ))
    }

    /// Whether the first `difficulty` hex chars of the digest are all '0'.
    pub fn meets_difficulty(&self, difficulty: u32) -> bool {
        let prefix = difficulty as usize;
        self.digest.len() >= prefix && self.digest.as_bytes()[..prefix].iter().all(|b| *b == b'0')
    }

    /// Proof-of-work search: increment the nonce from its current value until
    /// the digest has `difficulty` leading zero hex chars. Unbounded on
    /// purpose; the search cost is the security property.
    pub fn mine(&mut self, difficulty: u32) {
        while !self.meets_difficulty(difficulty) {
            self.nonce += 1;
            self.digest = self.compute_digest();
        }
        debug!(nonce = self.nonce, digest = %self.digest, "mined block");
    }

    /// Same search as `mine`, but gives up after `limit` additional nonce
    /// attempts. The block is left at its last attempted nonce on failure.
    pub fn mine_with_limit(&mut self, difficulty: u32, limit: u64) -> Result<(), MiningError> {
        let mut attempts = 0u64;
        while !self.meets_difficulty(difficulty) {
            if attempts == limit {
                return Err(MiningError::IterationLimitReached { difficulty, limit });
            }
            self.nonce += 1;
            self.digest = self.compute_digest();
            attempts += 1;
        }
        Ok(())
    }

    /// Overwrite the payload, reset the nonce and recompute the digest
    /// WITHOUT re-mining. The block generally fails the difficulty predicate
    /// afterwards; that asymmetry is what makes tampering detectable.
    pub fn update_data(&mut self, new_payload: impl Into<String>) {
        self.payload = new_payload.into();
        self.nonce = 0;
        self.digest = self.compute_digest();
    }
}

pub(crate) fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("time went backwards")
        .as_secs()
}
