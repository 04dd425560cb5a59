use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use simchain_core::consensus::{self, ConsensusReport};
use simchain_core::scenario::{
    extend_with_block, overwrite_replicas, simulate_replicas, tamper_payload, ScenarioParams,
};
use simchain_core::{Chain, MerkleTree};
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser, Debug)]
#[command(name = "simchain")]
#[command(about = "Replicated PoW ledger demos: tampering, Merkle roots, majority rule")]
struct Cli {
    /// Emit the consensus report as JSON instead of a table
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Args, Debug)]
struct ScenarioArgs {
    /// Number of replica chains
    #[arg(long, default_value_t = 5)]
    replicas: usize,
    /// Leading zero hex chars required of every block digest
    #[arg(long, default_value_t = 3)]
    difficulty: u32,
    /// Blocks appended after genesis, identical across replicas
    #[arg(long, default_value_t = 4)]
    blocks: usize,
    /// Fixed genesis timestamp shared by all replicas
    #[arg(long, default_value_t = 1000)]
    genesis_timestamp: u64,
}

impl From<&ScenarioArgs> for ScenarioParams {
    fn from(args: &ScenarioArgs) -> Self {
        Self {
            replicas: args.replicas,
            difficulty: args.difficulty,
            blocks: args.blocks,
            genesis_timestamp: args.genesis_timestamp,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Build identical replicas and compare their Merkle roots
    Simulate {
        #[command(flatten)]
        scenario: ScenarioArgs,
    },
    /// Corrupt one block in one replica, then validate and compare
    Tamper {
        #[command(flatten)]
        scenario: ScenarioArgs,
        /// Replica to corrupt
        #[arg(long, default_value_t = 0)]
        replica: usize,
        /// Block index to overwrite
        #[arg(long, default_value_t = 2)]
        block: usize,
        /// Replacement payload
        #[arg(long, default_value = "Corruption malveillante")]
        payload: String,
    },
    /// Run the 51% scenario: minority fork first, then majority overwrite
    Attack {
        #[command(flatten)]
        scenario: ScenarioArgs,
    },
    /// Build one chain and print every Merkle reduction level
    Tree {
        #[command(flatten)]
        scenario: ScenarioArgs,
    },
}

fn main() -> Result<()> {
    fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    match cli.cmd {
        Command::Simulate { scenario } => {
            let chains = simulate_replicas(&(&scenario).into());
            report(&chains, cli.json)?;
        }
        Command::Tamper {
            scenario,
            replica,
            block,
            payload,
        } => {
            let mut chains = simulate_replicas(&(&scenario).into());
            anyhow::ensure!(replica < chains.len(), "replica {replica} out of range");
            anyhow::ensure!(
                block < chains[replica].len(),
                "block {block} out of range for replica {replica}"
            );
            tamper_payload(&mut chains[replica], block, payload);
            info!(replica, block, "tampered replica payload");
            report(&chains, cli.json)?;
        }
        Command::Attack { scenario } => {
            let mut chains = simulate_replicas(&(&scenario).into());
            anyhow::ensure!(chains.len() >= 5, "the attack scenario needs >= 5 replicas");

            println!("--- After corrupting a single replica (minority) ---");
            extend_with_block(&mut chains[0], "Corruption mineure", 2000);
            report(&chains, cli.json)?;

            println!("\n--- After overwriting the majority (51% attack) ---");
            extend_with_block(&mut chains[0], "Corruption majeure", 3000);
            overwrite_replicas(&mut chains, 0, &[1, 2]);
            report(&chains, cli.json)?;
        }
        Command::Tree { scenario } => {
            let params: ScenarioParams = (&scenario).into();
            let mut chain = Chain::new(params.difficulty, params.genesis_timestamp);
            for i in 0..params.blocks {
                chain.add_block_at(
                    format!("Transaction {i}"),
                    params.genesis_timestamp + 1 + i as u64,
                );
            }
            print_tree(&MerkleTree::new(chain.block_digests()));
        }
    }
    Ok(())
}

fn report(chains: &[Chain], json: bool) -> Result<()> {
    let report = consensus::compare_roots(chains);
    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(chains, &report);
    }
    Ok(())
}

fn print_report(chains: &[Chain], report: &ConsensusReport) {
    println!(
        "{:^8} | {:^6} | {:^64} | {:^8} | {:^8}",
        "replica", "blocks", "merkle root", "valid", "verdict"
    );
    println!("{}", "-".repeat(8 + 6 + 64 + 8 + 8 + 12));
    for (i, (chain, status)) in chains.iter().zip(&report.replicas).enumerate() {
        let validity = match chain.validate() {
            Ok(()) => "yes".to_string(),
            Err(err) => format!("bad@{}", err.index),
        };
        let verdict = if status.accepted { "ACCEPTED" } else { "REJECTED" };
        println!(
            "{:^8} | {:^6} | {} | {:^8} | {:^8}",
            i + 1,
            chain.len(),
            status.root,
            validity,
            verdict
        );
    }
    println!(
        "\nmajority root: {} ({}/{} replicas)",
        report.majority_root,
        report.majority_count,
        report.replicas.len()
    );
}

fn print_tree(tree: &MerkleTree) {
    println!("*** Merkle tree ({} leaves) ***\n", tree.leaves().len());
    for (i, level) in tree.levels().iter().enumerate() {
        println!("level {i} ({} nodes):", level.len());
        for digest in level {
            println!("  {digest}");
        }
        println!();
    }
    match tree.root() {
        Some(root) => println!("root: {root}"),
        None => println!("root: (empty tree)"),
    }
}
