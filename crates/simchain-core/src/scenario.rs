//! Scenario builders for the replica demos: every scenario takes all of its
//! parameters explicitly and returns owned chains, so there is no hidden
//! state shared between runs and no aliasing between replicas.

use crate::chain::Chain;
use crate::constants::{DEFAULT_DIFFICULTY, DEFAULT_GENESIS_TIMESTAMP};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::info;

#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct ScenarioParams {
    pub replicas: usize,
    pub difficulty: u32,
    pub blocks: usize,
    pub genesis_timestamp: u64,
}

impl Default for ScenarioParams {
    fn default() -> Self {
        Self {
            replicas: 5,
            difficulty: DEFAULT_DIFFICULTY,
            blocks: 4,
            genesis_timestamp: DEFAULT_GENESIS_TIMESTAMP,
        }
    }
}

/// Build N independently constructed replicas from identical inputs:
/// payload `"Transaction {i}"` at timestamp `genesis_timestamp + 1 + i`.
///
/// Replicas are mined in parallel; each chain's nonce/digest state is
/// exclusively owned by its worker for the whole build.
pub fn simulate_replicas(params: &ScenarioParams) -> Vec<Chain> {
    let chains: Vec<Chain> = (0..params.replicas)
        .into_par_iter()
        .map(|_| {
            let mut chain = Chain::new(params.difficulty, params.genesis_timestamp);
            for i in 0..params.blocks {
                chain.add_block_at(
                    format!("Transaction {i}"),
                    params.genesis_timestamp + 1 + i as u64,
                );
            }
            chain
        })
        .collect();

    info!(
        replicas = params.replicas,
        blocks = params.blocks,
        difficulty = params.difficulty,
        "simulated replica set"
    );
    chains
}

/// Overwrite one block's payload in place without re-mining, leaving the
/// chain detectably invalid from that index on.
pub fn tamper_payload(chain: &mut Chain, index: usize, new_payload: impl Into<String>) {
    chain.blocks[index].update_data(new_payload);
}

/// Mine and append one divergent block, forking this replica away from its
/// peers while keeping it structurally valid.
pub fn extend_with_block(chain: &mut Chain, payload: impl Into<String>, timestamp: u64) {
    chain.add_block_at(payload, timestamp);
}

/// Copy the source replica's history into each target replica. Targets
/// receive independently owned clones, never shared references; afterwards
/// the targets hold bit-identical histories to the source.
pub fn overwrite_replicas(chains: &mut [Chain], source: usize, targets: &[usize]) {
    let blocks = chains[source].blocks.clone();
    let difficulty = chains[source].difficulty;
    for &target in targets {
        chains[target].blocks = blocks.clone();
        chains[target].difficulty = difficulty;
    }
}
