//! Transaction receipts as returned by `eth_getTransactionReceipt`.

use alloy_core::primitives::{Address, B256, Bytes};
use serde::Deserialize;

use crate::rpc::{deserialize_opt_u64_from_hex, deserialize_u64_from_hex, parse_hex_u64};

/// An event emitted by a transaction.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Log {
    pub address: Address,
    pub topics: Vec<B256>,
    #[serde(default)]
    pub data: Bytes,
}

/// The subset of a transaction receipt used by the deployment.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionReceipt {
    pub transaction_hash: B256,
    #[serde(deserialize_with = "deserialize_u64_from_hex")]
    pub block_number: u64,
    /// Set for contract creations.
    #[serde(default)]
    pub contract_address: Option<Address>,
    /// `0x1` on success, `0x0` on revert. Absent on pre-Byzantium chains.
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default, deserialize_with = "deserialize_opt_u64_from_hex")]
    pub gas_used: Option<u64>,
    #[serde(default)]
    pub logs: Vec<Log>,
}

impl TransactionReceipt {
    pub fn succeeded(&self) -> bool {
        match &self.status {
            Some(status) => parse_hex_u64(status).map(|s| s == 1).unwrap_or(false),
            None => true,
        }
    }
}
