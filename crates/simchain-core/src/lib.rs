pub mod block;
pub mod chain;
pub mod consensus;
pub mod constants;
pub mod merkle;
pub mod scenario;

pub use block::{Block, MiningError};
pub use chain::{Chain, ValidationError, Violation};
pub use merkle::MerkleTree;

use sha2::{Digest as _, Sha256};

/// Lowercase-hex SHA-256 digest, always `DIGEST_HEX_LEN` chars.
pub type Digest = String;

/// Hash an arbitrary string payload to a lowercase-hex digest.
pub fn sha256_hex(input: &str) -> Digest {
    let mut hasher = Sha256::new();
    hasher.update(input.as_bytes());
    hex::encode(hasher.finalize())
}
