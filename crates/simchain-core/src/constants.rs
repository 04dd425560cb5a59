pub const HASH_SIZE: usize = 32;
pub const DIGEST_HEX_SIZE: usize = HASH_SIZE * 2;

/// Sentinel predecessor link carried by every genesis block.
pub const GENESIS_PREVIOUS_DIGEST: &str = "0";
pub const GENESIS_PAYLOAD: &str = "Genesis Block";

pub const DEFAULT_DIFFICULTY: u32 = 3;
pub const DEFAULT_GENESIS_TIMESTAMP: u64 = 1000;
