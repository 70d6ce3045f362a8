//! quill-node — a block-replay driver for the state-transition core.
//!
//! This stands in for the block-gossip/production layer spec.md §1 places
//! out of scope: it reads a genesis description and an ordered sequence of
//! blocks (each a list of already-"signed" transactions plus the signing
//! keys a caller asserts are valid for it) from disk, applies every
//! transaction through `quill_state::StateEngine`, runs end-of-block
//! housekeeping in the order spec.md §5 requires, and prints a summary of
//! the resulting state and the virtual operations housekeeping emitted.
//!
//! Real signature verification is out of scope (spec.md §1); this driver
//! uses `quill_crypto::AssumeValid`, which simply trusts the signing keys
//! a block declares — the seam a real wallet/P2P layer would replace.

use std::fs;
use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use serde::Deserialize;
use tracing::{info, warn};

use quill_core::authority::PublicKeyId;
use quill_core::operation::{Transaction, TransactionContext};
use quill_core::types::Timestamp;
use quill_crypto::AssumeValid;
use quill_genesis::GenesisParams;
use quill_state::{run_housekeeping, StateEngine, Store};

#[derive(Parser, Debug)]
#[command(
    name = "quill-node",
    version,
    about = "Quill state-transition core — offline block-replay driver"
)]
struct Args {
    /// Path to a JSON-encoded `GenesisParams`.
    #[arg(long)]
    genesis_params: PathBuf,

    /// Path to a JSON-encoded array of blocks to replay.
    #[arg(long)]
    blocks: PathBuf,

    /// Hardfork level applied to every replayed block (spec.md §9 — passed
    /// as immutable input, never read from ambient mutable state).
    #[arg(long, default_value_t = 0)]
    hardfork: u32,
}

/// One block of already-assembled transactions, plus the keys this driver
/// trusts as having signed them. A real node derives these from P2P
/// gossip and real signature verification; here they are just data.
#[derive(Deserialize)]
struct BlockInput {
    head_block_time: Timestamp,
    #[serde(default)]
    is_producing: bool,
    #[serde(default)]
    signing_keys: Vec<String>,
    transactions: Vec<Transaction>,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".parse().unwrap()),
        )
        .init();

    let args = Args::parse();
    info!("quill-node starting");

    let genesis_json =
        fs::read_to_string(&args.genesis_params).with_context(|| format!("reading {}", args.genesis_params.display()))?;
    let params: GenesisParams = serde_json::from_str(&genesis_json).context("parsing genesis params JSON")?;
    let mut store = quill_genesis::build_genesis_state(&params).context("building genesis state")?;
    info!(founder = %params.founder_name, "genesis applied");

    let blocks_json =
        fs::read_to_string(&args.blocks).with_context(|| format!("reading {}", args.blocks.display()))?;
    let blocks: Vec<BlockInput> = serde_json::from_str(&blocks_json).context("parsing blocks JSON")?;

    let engine = StateEngine::new();
    let mut applied = 0u64;
    let mut rejected = 0u64;

    for (block_num, block) in blocks.iter().enumerate() {
        let signing_keys = parse_keys(&block.signing_keys)?;
        let verifier = AssumeValid { signing_keys: &signing_keys };
        let ctx = TransactionContext {
            head_block_time: block.head_block_time,
            hardfork: args.hardfork,
            signing_keys: &signing_keys,
            is_producing: block.is_producing,
        };

        for tx in &block.transactions {
            match engine.apply(&mut store, &ctx, tx, &verifier) {
                Ok(()) => applied += 1,
                Err(err) => {
                    rejected += 1;
                    warn!(block = block_num, error = %err, "transaction rejected");
                }
            }
        }

        run_housekeeping(&mut store, block.head_block_time);
        let head_block_number = block_num as u32 + 1;
        store.modify_global(|g| {
            g.head_block_number = head_block_number;
            g.time = block.head_block_time;
        });
    }

    info!(applied, rejected, "replay complete");
    print_summary(&store)?;
    Ok(())
}

fn parse_keys(keys: &[String]) -> anyhow::Result<Vec<PublicKeyId>> {
    keys.iter()
        .map(|hex_str| {
            let bytes = hex::decode(hex_str).with_context(|| format!("decoding signing key {hex_str}"))?;
            let arr: [u8; 32] = bytes
                .try_into()
                .map_err(|_| anyhow::anyhow!("signing key must be exactly 32 bytes"))?;
            Ok(PublicKeyId(arr))
        })
        .collect()
}

fn print_summary(store: &Store) -> anyhow::Result<()> {
    let summary = serde_json::json!({
        "head_block_number": store.global().head_block_number,
        "head_block_time": store.global().time,
        "current_supply": store.global().current_supply.to_string(),
        "current_dollar_supply": store.global().current_dollar_supply.to_string(),
        "total_vesting_fund": store.global().total_vesting_fund.to_string(),
        "total_vesting_shares": store.global().total_vesting_shares.to_string(),
        "accounts": store.iter_accounts().count(),
        "witnesses": store.iter_witnesses().count(),
        "virtual_ops": store.virtual_ops.len(),
    });
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}
