//! Network profiles and deployment constants.
//!
//! The configuration is an immutable value: it is loaded once at start-up and
//! passed explicitly to the pipeline.

use alloy_core::primitives::{Address, B256, U256, address, b256};
use serde::{Deserialize, Serialize};

use crate::{DeployError, types::SubscriptionId};

/// Confirmations waited for on networks with a public block explorer.
pub const VERIFICATION_BLOCK_CONFIRMATIONS: u64 = 6;

/// Confirmations waited for on local networks.
pub const LOCAL_BLOCK_CONFIRMATIONS: u64 = 1;

/// Chain id of the local Hardhat / Anvil development network.
pub const LOCAL_CHAIN_ID: u64 = 31337;

/// Gas lane shared by the default network profiles (Goerli 150 gwei key hash).
pub const DEFAULT_GAS_LANE: B256 =
    b256!("79d3d8832d904592c0bf9818b621522c988bb8b0c05cdc3b15aea1b6e8db0c15");

/// Default callback gas limit for `fulfillRandomWords`.
pub const DEFAULT_CALLBACK_GAS_LIMIT: u32 = 500_000;

/// Default upkeep interval in seconds.
pub const DEFAULT_INTERVAL: u64 = 30;

/// Serde helpers for native-currency amounts written in ether and stored as
/// wei. Accepts decimal strings ("0.25"), integers (2) and floats (0.25);
/// strings are exact, floats go through their shortest decimal form.
pub(crate) mod ether {
    use alloy_core::primitives::{
        U256,
        utils::{format_ether, parse_ether},
    };
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &U256, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format_ether(*value))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<U256, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Whole(u64),
            Float(f64),
            Decimal(String),
        }

        let text = match Repr::deserialize(deserializer)? {
            Repr::Whole(amount) => amount.to_string(),
            Repr::Float(amount) => amount.to_string(),
            Repr::Decimal(amount) => amount,
        };

        parse_ether(text.trim()).map_err(serde::de::Error::custom)
    }
}

/// Process-wide constants of the deployment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeployConstants {
    /// Flat fee charged by the mock coordinator per request, in wei.
    #[serde(with = "ether")]
    pub base_fee: U256,
    /// LINK price per gas unit used by the mock coordinator.
    pub gas_price_link: u64,
    /// Amount used to fund a freshly created local subscription, in wei.
    #[serde(with = "ether")]
    pub subscription_fund_amount: U256,
    /// Confirmations waited for before submitting source verification.
    pub verification_block_confirmations: u64,
}

impl Default for DeployConstants {
    fn default() -> Self {
        Self {
            base_fee: milliether(250),
            gas_price_link: 1_000_000_000,
            subscription_fund_amount: milliether(2_000),
            verification_block_confirmations: VERIFICATION_BLOCK_CONFIRMATIONS,
        }
    }
}

/// `milli` thousandths of an ether, in wei.
const fn milliether(milli: u64) -> U256 {
    U256::from_limbs([milli * 1_000_000_000_000_000, 0, 0, 0])
}

/// Per-chain deployment parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkProfile {
    pub chain_id: u64,
    /// Human readable name, also used as the deployments sub-directory.
    pub name: String,
    /// Address of a live VRF coordinator. Absent on local networks, where a
    /// mock coordinator is deployed instead.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vrf_coordinator: Option<Address>,
    /// Raffle entrance fee, in wei.
    #[serde(with = "ether")]
    pub entrance_fee: U256,
    /// VRF key hash selecting the gas price tier.
    pub gas_lane: B256,
    pub callback_gas_limit: u32,
    /// Upkeep interval in seconds.
    pub interval: u64,
    /// Pre-existing subscription on the live coordinator.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subscription_id: Option<SubscriptionId>,
    /// Overrides the confirmation depth of the raffle deployment.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub block_confirmations: Option<u64>,
    /// Overrides whether the raffle is submitted for source verification.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verify: Option<bool>,
}

impl NetworkProfile {
    /// Whether a mock coordinator has to be deployed on this network.
    pub fn needs_mock_oracle(&self) -> bool {
        self.vrf_coordinator.is_none()
    }

    /// Whether the deployed raffle should be submitted to a block explorer.
    ///
    /// Defaults to "has a live coordinator" unless set explicitly, so that a
    /// private network with a real oracle but no explorer can opt out.
    pub fn is_publicly_verifiable(&self) -> bool {
        self.verify.unwrap_or(self.vrf_coordinator.is_some())
    }

    /// Confirmations to wait for after deploying the raffle.
    pub fn deploy_confirmations(&self, constants: &DeployConstants) -> u64 {
        self.block_confirmations.unwrap_or(if self.needs_mock_oracle() {
            LOCAL_BLOCK_CONFIRMATIONS
        } else {
            constants.verification_block_confirmations
        })
    }

    /// Check the profile is usable before any transaction is sent.
    pub fn validate(&self) -> Result<(), DeployError> {
        if self.name.trim().is_empty() {
            return Err(DeployError::config(format!(
                "network profile for chain id {} has an empty name",
                self.chain_id
            )));
        }

        if self.vrf_coordinator.is_some() && self.subscription_id.is_none() {
            return Err(DeployError::config(format!(
                "network '{}' (chain id {}) has a VRF coordinator but no subscription_id",
                self.name, self.chain_id
            )));
        }

        if self.callback_gas_limit == 0 {
            return Err(DeployError::config(format!(
                "network '{}' has a zero callback_gas_limit",
                self.name
            )));
        }

        if self.block_confirmations == Some(0) {
            return Err(DeployError::config(format!(
                "network '{}' requests zero block confirmations",
                self.name
            )));
        }

        Ok(())
    }
}

/// The complete configuration: constants plus the network table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkConfig {
    #[serde(default)]
    pub constants: DeployConstants,
    #[serde(default)]
    pub networks: Vec<NetworkProfile>,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            constants: DeployConstants::default(),
            networks: default_networks(),
        }
    }
}

impl NetworkConfig {
    /// Parse a configuration from TOML. Missing sections are left empty, not
    /// defaulted to the built-in network table.
    pub fn from_toml_str(content: &str) -> anyhow::Result<Self> {
        let config: Self = toml::from_str(content)?;
        Ok(config)
    }

    /// Look up the profile of a chain.
    pub fn profile(&self, chain_id: u64) -> Result<&NetworkProfile, DeployError> {
        self.networks
            .iter()
            .find(|profile| profile.chain_id == chain_id)
            .ok_or_else(|| {
                DeployError::config(format!("no network profile for chain id {}", chain_id))
            })
    }
}

/// The built-in network table: Goerli with the live coordinator and a local
/// development chain.
pub fn default_networks() -> Vec<NetworkProfile> {
    vec![
        NetworkProfile {
            chain_id: 5,
            name: "goerli".to_string(),
            vrf_coordinator: Some(address!("2Ca8E0C643bDe4C2E08ab1fA0da3401AdAD7734D")),
            entrance_fee: milliether(10),
            gas_lane: DEFAULT_GAS_LANE,
            callback_gas_limit: DEFAULT_CALLBACK_GAS_LIMIT,
            interval: DEFAULT_INTERVAL,
            subscription_id: Some(SubscriptionId(1560)),
            block_confirmations: None,
            verify: None,
        },
        NetworkProfile {
            chain_id: LOCAL_CHAIN_ID,
            name: "localhost".to_string(),
            vrf_coordinator: None,
            entrance_fee: milliether(10),
            gas_lane: DEFAULT_GAS_LANE,
            callback_gas_limit: DEFAULT_CALLBACK_GAS_LIMIT,
            interval: DEFAULT_INTERVAL,
            subscription_id: None,
            block_confirmations: None,
            verify: None,
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_core::primitives::utils::parse_ether;

    #[test]
    fn test_default_constants() {
        let constants = DeployConstants::default();
        assert_eq!(constants.base_fee, U256::from(250_000_000_000_000_000u64));
        assert_eq!(constants.gas_price_link, 1_000_000_000);
        assert_eq!(
            constants.subscription_fund_amount,
            U256::from(2_000_000_000_000_000_000u64)
        );
        assert_eq!(constants.verification_block_confirmations, 6);
    }

    #[test]
    fn test_default_networks() {
        let config = NetworkConfig::default();

        let goerli = config.profile(5).unwrap();
        assert_eq!(goerli.name, "goerli");
        assert!(!goerli.needs_mock_oracle());
        assert!(goerli.is_publicly_verifiable());
        assert_eq!(goerli.subscription_id, Some(SubscriptionId(1560)));
        assert_eq!(goerli.deploy_confirmations(&config.constants), 6);
        assert!(goerli.validate().is_ok());

        let local = config.profile(LOCAL_CHAIN_ID).unwrap();
        assert_eq!(local.name, "localhost");
        assert!(local.needs_mock_oracle());
        assert!(!local.is_publicly_verifiable());
        assert_eq!(local.deploy_confirmations(&config.constants), 1);
        assert!(local.validate().is_ok());

        assert_eq!(goerli.entrance_fee, U256::from(10_000_000_000_000_000u64));
    }

    #[test]
    fn test_unknown_chain_is_configuration_error() {
        let err = NetworkConfig::default().profile(42).unwrap_err();
        assert!(err.is_configuration());
    }

    #[test]
    fn test_real_coordinator_without_subscription_is_rejected() {
        let mut profile = NetworkConfig::default().profile(5).unwrap().clone();
        profile.subscription_id = None;

        let err = profile.validate().unwrap_err();
        assert!(err.is_configuration());
        assert!(err.to_string().contains("subscription_id"));
    }

    #[test]
    fn test_verification_can_be_disabled_independently() {
        let mut profile = NetworkConfig::default().profile(5).unwrap().clone();
        profile.verify = Some(false);

        assert!(!profile.needs_mock_oracle());
        assert!(!profile.is_publicly_verifiable());
    }

    #[test]
    fn test_confirmation_override() {
        let config = NetworkConfig::default();
        let mut profile = config.profile(5).unwrap().clone();
        profile.block_confirmations = Some(3);
        assert_eq!(profile.deploy_confirmations(&config.constants), 3);

        profile.block_confirmations = Some(0);
        assert!(profile.validate().is_err());
    }

    #[test]
    fn test_parse_toml() {
        let config = NetworkConfig::from_toml_str(
            r#"
            [constants]
            base_fee = "0.5"
            gas_price_link = 2000000000
            subscription_fund_amount = 3
            verification_block_confirmations = 8

            [[networks]]
            chain_id = 11155111
            name = "sepolia"
            vrf_coordinator = "0x8103B0A8A00be2DDC778e6e7eaa21791Cd364625"
            entrance_fee = "0.02"
            gas_lane = "0x474e34a077df58807dbe9c96d3c009b23b3c6d0cce433e59bbf5b34f823bc56c"
            callback_gas_limit = 300000
            interval = 60
            subscription_id = "77"

            [[networks]]
            chain_id = 31337
            name = "localhost"
            entrance_fee = "0.01"
            gas_lane = "0x79d3d8832d904592c0bf9818b621522c988bb8b0c05cdc3b15aea1b6e8db0c15"
            callback_gas_limit = 500000
            interval = 30
            "#,
        )
        .unwrap();

        assert_eq!(config.constants.base_fee, U256::from(500_000_000_000_000_000u64));
        assert_eq!(
            config.constants.subscription_fund_amount,
            U256::from(3_000_000_000_000_000_000u64)
        );
        assert_eq!(config.constants.verification_block_confirmations, 8);

        let sepolia = config.profile(11155111).unwrap();
        assert_eq!(sepolia.subscription_id, Some(SubscriptionId(77)));
        assert_eq!(sepolia.deploy_confirmations(&config.constants), 8);
        assert_eq!(sepolia.entrance_fee, U256::from(20_000_000_000_000_000u64));

        assert!(config.profile(31337).unwrap().needs_mock_oracle());
        assert!(config.profile(5).is_err());
    }

    #[test]
    fn test_amounts_accept_floats() {
        let constants: DeployConstants = toml::from_str(
            r#"
            base_fee = 0.25
            gas_price_link = 1000000000
            subscription_fund_amount = 2.5
            verification_block_confirmations = 6
            "#,
        )
        .unwrap();

        assert_eq!(constants.base_fee, milliether(250));
        assert_eq!(constants.subscription_fund_amount, milliether(2_500));
    }

    #[test]
    fn test_invalid_amount_is_rejected() {
        let result: Result<DeployConstants, _> = toml::from_str(
            r#"
            base_fee = "0.2.5"
            gas_price_link = 1000000000
            subscription_fund_amount = "2"
            verification_block_confirmations = 6
            "#,
        );

        assert!(result.is_err());
    }

    #[test]
    fn test_milliether() {
        assert_eq!(milliether(250), parse_ether("0.25").unwrap());
        assert_eq!(milliether(2_000), parse_ether("2").unwrap());
        assert_eq!(milliether(10), parse_ether("0.01").unwrap());
    }

    #[test]
    fn test_toml_roundtrip_keeps_amounts() {
        let config = NetworkConfig::default();
        let content = toml::to_string_pretty(&config).unwrap();
        assert_eq!(NetworkConfig::from_toml_str(&content).unwrap(), config);
    }
}
