//! End-to-end smoke test for quill-node.
//!
//! Writes a genesis-params file and a one-block replay file to a temp
//! directory, runs the binary against them, and checks the summary JSON
//! it prints reflects the founder allocation and seeded witnesses.

use std::path::PathBuf;
use std::process::Command;

fn temp_dir() -> PathBuf {
    let dir = std::env::temp_dir().join(format!("quill_node_smoke_{}", std::process::id()));
    let _ = std::fs::remove_dir_all(&dir);
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

fn key(byte: u8) -> serde_json::Value {
    serde_json::json!([byte; 32])
}

#[test]
fn replay_applies_genesis_and_advances_one_block() {
    let dir = temp_dir();

    let genesis = serde_json::json!({
        "genesis_time": 0,
        "founder_name": "founder1",
        "founder_owner_key": key(1),
        "founder_active_key": key(1),
        "founder_posting_key": key(1),
        "founder_memo_key": key(1),
        "founder_liquid_balance": { "amount": 1_000_000, "symbol": "Liquid" },
        "founder_vesting_liquid": { "amount": 500_000, "symbol": "Liquid" },
        "initial_witnesses": [
            { "owner": "witness1", "signing_key": key(2), "url": "https://example.invalid/w1" },
            { "owner": "witness2", "signing_key": key(3), "url": "https://example.invalid/w2" }
        ],
        "initial_account_creation_fee": { "amount": 0, "symbol": "Liquid" },
        "initial_max_block_size": 131072,
        "initial_dollar_interest_rate": 0,
        "initial_account_subsidy_limit": 100,
        "initial_vote_power_reserve_rate": 40
    });
    let genesis_path = dir.join("genesis-params.json");
    std::fs::write(&genesis_path, serde_json::to_string_pretty(&genesis).unwrap()).unwrap();

    let blocks = serde_json::json!([
        { "head_block_time": 3, "is_producing": true, "signing_keys": [], "transactions": [] }
    ]);
    let blocks_path = dir.join("blocks.json");
    std::fs::write(&blocks_path, serde_json::to_string_pretty(&blocks).unwrap()).unwrap();

    let node_bin = env!("CARGO_BIN_EXE_quill-node");
    let output = Command::new(node_bin)
        .args([
            "--genesis-params",
            genesis_path.to_str().unwrap(),
            "--blocks",
            blocks_path.to_str().unwrap(),
        ])
        .output()
        .expect("failed to run quill-node");

    assert!(output.status.success(), "quill-node exited non-zero: {}", String::from_utf8_lossy(&output.stderr));

    let stdout = String::from_utf8(output.stdout).unwrap();
    let summary: serde_json::Value = serde_json::from_str(stdout.trim())
        .unwrap_or_else(|e| panic!("summary was not valid JSON ({e}): {stdout}"));

    assert_eq!(summary["head_block_number"], 1);
    assert_eq!(summary["head_block_time"], 3);
    assert_eq!(summary["witnesses"], 2);
    // null + temp reserved accounts, the founder, and one account per witness
    assert_eq!(summary["accounts"], 5);

    let _ = std::fs::remove_dir_all(&dir);
}
