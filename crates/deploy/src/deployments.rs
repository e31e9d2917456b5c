//! Persisted deployment records.
//!
//! Each deployed contract is recorded at `{root}/{network}/{Contract}.json`.
//! Records carry a hash of the creation bytecode and the encoded constructor
//! arguments, which is used to detect when a contract can be reused instead
//! of redeployed.

use std::path::{Path, PathBuf};

use alloy_core::primitives::{Address, B256};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::{traits::Deployment, types::AbiArg};

/// Compute the SHA-256 hash identifying a deployment.
///
/// Two deployments with the same hash have identical creation code.
pub fn deployment_hash(bytecode: &[u8], encoded_args: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytecode);
    hasher.update(encoded_args);
    hex::encode(hasher.finalize())
}

/// A deployment as stored on disk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeploymentRecord {
    pub contract_name: String,
    pub address: Address,
    pub transaction_hash: B256,
    pub block_number: u64,
    pub args: Vec<AbiArg>,
    /// Confirmations observed at deployment time.
    pub confirmations: u64,
    /// See [`deployment_hash`].
    pub deployment_hash: String,
    /// Unix timestamp when this deployment was recorded.
    pub deployed_at: i64,
    /// Version of the tool that created this record.
    pub tool_version: String,
}

impl DeploymentRecord {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        contract_name: impl Into<String>,
        address: Address,
        transaction_hash: B256,
        block_number: u64,
        args: Vec<AbiArg>,
        confirmations: u64,
        deployment_hash: String,
    ) -> Self {
        Self {
            contract_name: contract_name.into(),
            address,
            transaction_hash,
            block_number,
            args,
            confirmations,
            deployment_hash,
            deployed_at: chrono::Utc::now().timestamp(),
            tool_version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }

    pub fn into_deployment(self, newly_deployed: bool) -> Deployment {
        Deployment {
            name: self.contract_name,
            address: self.address,
            transaction_hash: Some(self.transaction_hash),
            args: self.args,
            confirmations: self.confirmations,
            newly_deployed,
        }
    }

    /// Save this record to a file as formatted JSON.
    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        let json =
            serde_json::to_string_pretty(self).context("Failed to serialize deployment record")?;

        std::fs::write(path, json).context(format!(
            "Failed to write deployment record to {}",
            path.display()
        ))?;

        Ok(())
    }

    /// Load a record from a file.
    ///
    /// Returns an error if the file doesn't exist, is malformed, or cannot be read.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            anyhow::bail!("Deployment record does not exist: {}", path.display());
        }

        let content = std::fs::read_to_string(path).context(format!(
            "Failed to read deployment record from {}",
            path.display()
        ))?;

        let record: Self =
            serde_json::from_str(&content).context("Failed to parse deployment record JSON")?;

        Ok(record)
    }
}

/// Deployment records of one network, one file per contract.
#[derive(Debug, Clone)]
pub struct DeploymentStore {
    dir: PathBuf,
}

impl DeploymentStore {
    /// Store for `network` under `root` (usually `./deployments`).
    pub fn new(root: impl AsRef<Path>, network: &str) -> Self {
        Self {
            dir: root.as_ref().join(network),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn record_path(&self, contract_name: &str) -> PathBuf {
        self.dir.join(format!("{}.json", contract_name))
    }

    /// Load the record of `contract_name`, if any.
    pub fn load(&self, contract_name: &str) -> Result<Option<DeploymentRecord>> {
        let path = self.record_path(contract_name);
        if !path.exists() {
            return Ok(None);
        }

        DeploymentRecord::load_from_file(&path).map(Some)
    }

    /// Record a deployment, replacing an earlier record of the same contract.
    pub fn save(&self, record: &DeploymentRecord) -> Result<()> {
        std::fs::create_dir_all(&self.dir).context(format!(
            "Failed to create deployments directory {}",
            self.dir.display()
        ))?;

        let path = self.record_path(&record.contract_name);
        record.save_to_file(&path)?;

        tracing::debug!(
            contract = %record.contract_name,
            path = %path.display(),
            "Deployment recorded"
        );

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_core::primitives::U256;
    use tempdir::TempDir;

    fn sample_record() -> DeploymentRecord {
        DeploymentRecord::new(
            "VRFCoordinatorV2Mock",
            Address::repeat_byte(0x5f),
            B256::repeat_byte(0x01),
            1,
            vec![
                AbiArg::Uint(U256::from(250_000_000_000_000_000u64)),
                AbiArg::Uint(U256::from(1_000_000_000u64)),
            ],
            1,
            deployment_hash(&[0x60, 0x80], &[0x00; 64]),
        )
    }

    #[test]
    fn test_hash_determinism() {
        let hash1 = deployment_hash(&[0x60, 0x80, 0x60, 0x40], &[0x01; 32]);
        let hash2 = deployment_hash(&[0x60, 0x80, 0x60, 0x40], &[0x01; 32]);

        assert_eq!(hash1, hash2, "Hash should be deterministic");
        assert_eq!(hash1.len(), 64, "SHA-256 hash should be 64 hex characters");
    }

    #[test]
    fn test_hash_changes_with_args() {
        assert_ne!(
            deployment_hash(&[0x60, 0x80], &[0x01; 32]),
            deployment_hash(&[0x60, 0x80], &[0x02; 32]),
            "Hash should change when constructor arguments change"
        );
    }

    #[test]
    fn test_hash_changes_with_bytecode() {
        assert_ne!(
            deployment_hash(&[0x60, 0x80], &[0x01; 32]),
            deployment_hash(&[0x60, 0x81], &[0x01; 32]),
            "Hash should change when bytecode changes"
        );
    }

    #[test]
    fn test_record_save_and_load() {
        let temp_dir = TempDir::new("raffle-test").expect("Failed to create temp dir");
        let path = temp_dir.path().join("VRFCoordinatorV2Mock.json");

        let original = sample_record();
        original.save_to_file(&path).expect("Failed to save record");

        let loaded = DeploymentRecord::load_from_file(&path).expect("Failed to load record");
        assert_eq!(original, loaded, "Loaded record should match original");
    }

    #[test]
    fn test_record_load_missing_file() {
        let temp_dir = TempDir::new("raffle-test").expect("Failed to create temp dir");
        let path = temp_dir.path().join("nonexistent.json");

        assert!(DeploymentRecord::load_from_file(&path).is_err());
    }

    #[test]
    fn test_record_load_corrupted_file() {
        let temp_dir = TempDir::new("raffle-test").expect("Failed to create temp dir");
        let path = temp_dir.path().join("Raffle.json");

        std::fs::write(&path, "{ invalid json }").expect("Failed to write corrupted file");

        assert!(DeploymentRecord::load_from_file(&path).is_err());
    }

    #[test]
    fn test_store_roundtrip() {
        let temp_dir = TempDir::new("raffle-test").expect("Failed to create temp dir");
        let store = DeploymentStore::new(temp_dir.path(), "localhost");

        assert!(store.load("VRFCoordinatorV2Mock").unwrap().is_none());

        let record = sample_record();
        store.save(&record).unwrap();

        assert!(temp_dir.path().join("localhost/VRFCoordinatorV2Mock.json").exists());
        assert_eq!(store.load("VRFCoordinatorV2Mock").unwrap(), Some(record.clone()));

        let deployment = record.into_deployment(false);
        assert_eq!(deployment.name, "VRFCoordinatorV2Mock");
        assert!(!deployment.newly_deployed);
        assert_eq!(deployment.args.len(), 2);
    }
}
