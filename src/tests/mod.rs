//! Integration tests against an in-process mock JSON-RPC node and an
//! in-memory SQLite database.

mod client_tests;
mod mock_node;

use crate::config::Config;
use serde_json::{json, Value};
use std::time::Duration;

pub const ADDRESS: &str = "73KyqfAK4g1BSxzbcAdZ3vUn5oBJUGjd7N4nFPooK8uz";

/// Config pointed at a mock node, with every pause shortened.
pub fn test_config(rpc_url: &str) -> Config {
    Config {
        database_url: "sqlite::memory:".to_string(),
        solana_rpc_url: rpc_url.to_string(),
        target_address: Some(ADDRESS.to_string()),
        batch_size: 10,
        max_transactions: 1000,
        page_delay: Duration::ZERO,
        detail_delay: Duration::ZERO,
        rate_limit_backoff: Duration::from_millis(10),
        rpc_timeout_secs: 5,
        ..Config::default()
    }
}

/// Deterministic 64-byte base58 signature.
pub fn sig(n: u8) -> String {
    let mut bytes = [n; 64];
    bytes[0] = 1;
    bs58::encode(bytes).into_string()
}

pub fn signature_json(signature: &str, slot: u64, block_time: Option<i64>) -> Value {
    json!({
        "signature": signature,
        "slot": slot,
        "blockTime": block_time,
        "err": null,
        "memo": null,
        "confirmationStatus": "finalized"
    })
}

/// Newest-first history of `count` signatures with strictly decreasing block
/// times, the order the node serves them in.
pub fn history(count: u8) -> Vec<Value> {
    (0..count)
        .rev()
        .map(|n| signature_json(&sig(n), 1_000 + n as u64, Some(1_700_000_000 + n as i64)))
        .collect()
}

pub fn transaction_json(slot: u64, block_time: i64, err: Value) -> Value {
    json!({
        "slot": slot,
        "blockTime": block_time,
        "meta": {
            "fee": 5000,
            "err": err,
            "computeUnitsConsumed": 150 + slot,
            "preBalances": [1_000_000, 0],
            "postBalances": [995_000, 0],
            "innerInstructions": []
        },
        "transaction": {
            "message": {
                "accountKeys": [{ "pubkey": ADDRESS, "signer": true, "writable": true }],
                "instructions": []
            },
            "signatures": []
        },
        "version": 0
    })
}
