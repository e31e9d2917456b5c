//! Source verification through an Etherscan-compatible API.

use std::{path::PathBuf, time::Duration};

use alloy_core::primitives::Address;
use anyhow::Context;
use serde::Deserialize;
use url::Url;

use crate::{
    DeployError,
    traits::{ContractVerifier, VerificationStatus},
    types::ConstructorArgs,
};

/// Default delay between two verification status checks.
pub const DEFAULT_STATUS_POLL_INTERVAL: Duration = Duration::from_secs(5);

/// Default number of status checks before giving up.
pub const DEFAULT_MAX_STATUS_POLLS: u32 = 12;

/// The Etherscan API endpoint of a known chain.
pub fn default_api_url(chain_id: u64) -> Option<&'static str> {
    match chain_id {
        1 => Some("https://api.etherscan.io/api"),
        5 => Some("https://api-goerli.etherscan.io/api"),
        11155111 => Some("https://api-sepolia.etherscan.io/api"),
        _ => None,
    }
}

/// Settings of an [`EtherscanVerifier`].
#[derive(Debug, Clone)]
pub struct EtherscanConfig {
    pub api_url: Url,
    pub api_key: String,
    /// Solidity standard-JSON input the raffle was compiled from.
    pub source_path: PathBuf,
    /// Fully qualified contract name, e.g. `contracts/Raffle.sol:Raffle`.
    pub contract_name: String,
    /// Full compiler version, e.g. `v0.8.7+commit.e28d00a7`.
    pub compiler_version: String,
    pub poll_interval: Duration,
    pub max_polls: u32,
}

#[derive(Debug, Deserialize)]
struct EtherscanResponse {
    status: String,
    message: String,
    result: String,
}

/// Classification of an Etherscan `result` message.
#[derive(Debug, Clone, PartialEq, Eq)]
enum ResultKind {
    Pending,
    Verified,
    AlreadyVerified,
    Failed,
}

fn classify_result(result: &str) -> ResultKind {
    let lower = result.to_lowercase();
    if lower.contains("already verified") {
        ResultKind::AlreadyVerified
    } else if lower.contains("pending") {
        ResultKind::Pending
    } else if lower.starts_with("pass") {
        ResultKind::Verified
    } else {
        ResultKind::Failed
    }
}

/// Submits contracts to Etherscan and polls for the verification result.
pub struct EtherscanVerifier {
    client: reqwest::Client,
    config: EtherscanConfig,
    source: String,
}

impl EtherscanVerifier {
    /// Create a verifier, reading the standard-JSON input up front.
    pub fn new(config: EtherscanConfig) -> anyhow::Result<Self> {
        let source = std::fs::read_to_string(&config.source_path).with_context(|| {
            format!(
                "Failed to read verification input {}",
                config.source_path.display()
            )
        })?;

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            config,
            source,
        })
    }

    async fn submit(
        &self,
        address: Address,
        args: &ConstructorArgs,
    ) -> anyhow::Result<EtherscanResponse> {
        let address = address.to_string();
        let constructor_args = hex::encode(args.abi_encode());

        let response = self
            .client
            .post(self.config.api_url.clone())
            .form(&[
                ("apikey", self.config.api_key.as_str()),
                ("module", "contract"),
                ("action", "verifysourcecode"),
                ("contractaddress", address.as_str()),
                ("sourceCode", self.source.as_str()),
                ("codeformat", "solidity-standard-json-input"),
                ("contractname", self.config.contract_name.as_str()),
                ("compilerversion", self.config.compiler_version.as_str()),
                // Sic: the Etherscan API spells it this way.
                ("constructorArguements", constructor_args.as_str()),
            ])
            .send()
            .await
            .context("Failed to send verification request")?;

        if !response.status().is_success() {
            anyhow::bail!("Etherscan API request failed: {}", response.status());
        }

        response
            .json()
            .await
            .context("Failed to parse verification response")
    }

    async fn check_status(&self, guid: &str) -> anyhow::Result<EtherscanResponse> {
        let response = self
            .client
            .get(self.config.api_url.clone())
            .query(&[
                ("apikey", self.config.api_key.as_str()),
                ("module", "contract"),
                ("action", "checkverifystatus"),
                ("guid", guid),
            ])
            .send()
            .await
            .context("Failed to send verification status request")?;

        response
            .json()
            .await
            .context("Failed to parse verification status response")
    }
}

impl ContractVerifier for EtherscanVerifier {
    async fn verify(
        &self,
        address: Address,
        args: &ConstructorArgs,
    ) -> Result<VerificationStatus, DeployError> {
        let submitted = self
            .submit(address, args)
            .await
            .map_err(|err| DeployError::Verification(format!("{:#}", err)))?;

        match classify_result(&submitted.result) {
            ResultKind::AlreadyVerified => return Ok(VerificationStatus::AlreadyVerified),
            _ if submitted.status != "1" => {
                return Err(DeployError::Verification(format!(
                    "{}: {}",
                    submitted.message, submitted.result
                )));
            }
            _ => {}
        }

        let guid = submitted.result;
        tracing::info!(address = %address, guid = %guid, "Verification submitted");

        for _ in 0..self.config.max_polls {
            tokio::time::sleep(self.config.poll_interval).await;

            let status = self
                .check_status(&guid)
                .await
                .map_err(|err| DeployError::Verification(format!("{:#}", err)))?;

            match classify_result(&status.result) {
                ResultKind::Pending => {
                    tracing::debug!(guid = %guid, "Verification pending");
                }
                ResultKind::Verified => return Ok(VerificationStatus::Verified),
                ResultKind::AlreadyVerified => return Ok(VerificationStatus::AlreadyVerified),
                ResultKind::Failed => return Err(DeployError::Verification(status.result)),
            }
        }

        Err(DeployError::Verification(format!(
            "verification still pending after {} checks (guid {})",
            self.config.max_polls, guid
        )))
    }
}
