//! Contract-facing value types and their ABI encoding.
//!
//! Every argument the deployment touches is a static 32-byte ABI word, so the
//! encoding is a plain concatenation of words behind a 4-byte selector.

use std::{fmt, str::FromStr};

use alloy_core::primitives::{Address, B256, U256, keccak256};
use anyhow::Context;
use serde::{Deserialize, Deserializer, Serialize};

/// Identifier of a VRF coordinator subscription (`uint64` on-chain).
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    derive_more::Display,
    derive_more::From,
)]
#[serde(transparent)]
pub struct SubscriptionId(pub u64);

impl FromStr for SubscriptionId {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let id = match s.strip_prefix("0x") {
            Some(hex) => u64::from_str_radix(hex, 16),
            None => s.parse(),
        }
        .with_context(|| format!("Invalid subscription id: '{}'", s))?;

        Ok(Self(id))
    }
}

// Network tables write the id either as a number or as a quoted string.
impl<'de> Deserialize<'de> for SubscriptionId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Number(u64),
            Text(String),
        }

        match Repr::deserialize(deserializer)? {
            Repr::Number(id) => Ok(Self(id)),
            Repr::Text(text) => text.parse().map_err(serde::de::Error::custom),
        }
    }
}

/// A single static ABI argument.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "lowercase")]
pub enum AbiArg {
    Uint(U256),
    Address(Address),
    Bytes32(B256),
}

impl AbiArg {
    /// The 32-byte head word of this argument.
    pub fn to_word(&self) -> B256 {
        match self {
            AbiArg::Uint(value) => B256::from(value.to_be_bytes::<32>()),
            AbiArg::Address(address) => address.into_word(),
            AbiArg::Bytes32(bytes) => *bytes,
        }
    }
}

impl fmt::Display for AbiArg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AbiArg::Uint(value) => write!(f, "{}", value),
            AbiArg::Address(address) => write!(f, "{}", address),
            AbiArg::Bytes32(bytes) => write!(f, "{}", bytes),
        }
    }
}

/// ABI-encode a list of static arguments (no selector).
pub fn encode_args(args: &[AbiArg]) -> Vec<u8> {
    args.iter().flat_map(|arg| arg.to_word().0).collect()
}

/// The 4-byte function selector for a canonical signature such as
/// `fundSubscription(uint64,uint96)`.
pub fn selector(signature: &str) -> [u8; 4] {
    let hash = keccak256(signature.as_bytes());
    [hash[0], hash[1], hash[2], hash[3]]
}

/// ABI-encode a function call.
pub fn encode_call(signature: &str, args: &[AbiArg]) -> Vec<u8> {
    let mut data = selector(signature).to_vec();
    data.extend(encode_args(args));
    data
}

/// Constructor arguments of the `Raffle` contract.
///
/// The on-chain signature is
/// `(uint256 entranceFee, address vrfCoordinatorV2, uint64 subscriptionId,
/// bytes32 gasLane, uint32 callbackGasLimit, uint256 interval)`. The order
/// of [`ConstructorArgs::to_abi_args`] must match it exactly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConstructorArgs {
    pub entrance_fee: U256,
    pub vrf_coordinator: Address,
    pub subscription_id: SubscriptionId,
    pub gas_lane: B256,
    pub callback_gas_limit: u32,
    pub interval: u64,
}

impl ConstructorArgs {
    /// Arguments in constructor order.
    pub fn to_abi_args(&self) -> Vec<AbiArg> {
        vec![
            AbiArg::Uint(self.entrance_fee),
            AbiArg::Address(self.vrf_coordinator),
            AbiArg::Uint(U256::from(self.subscription_id.0)),
            AbiArg::Bytes32(self.gas_lane),
            AbiArg::Uint(U256::from(self.callback_gas_limit)),
            AbiArg::Uint(U256::from(self.interval)),
        ]
    }

    pub fn abi_encode(&self) -> Vec<u8> {
        encode_args(&self.to_abi_args())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_core::primitives::address;

    fn sample_args() -> ConstructorArgs {
        ConstructorArgs {
            entrance_fee: U256::from(10_000_000_000_000_000u64),
            vrf_coordinator: address!("2Ca8E0C643bDe4C2E08ab1fA0da3401AdAD7734D"),
            subscription_id: SubscriptionId(1560),
            gas_lane: B256::repeat_byte(0xab),
            callback_gas_limit: 500_000,
            interval: 30,
        }
    }

    #[test]
    fn test_subscription_id_from_str() {
        assert_eq!("1560".parse::<SubscriptionId>().unwrap(), SubscriptionId(1560));
        assert_eq!(" 42 ".parse::<SubscriptionId>().unwrap(), SubscriptionId(42));
        assert_eq!("0x10".parse::<SubscriptionId>().unwrap(), SubscriptionId(16));
        assert!("abc".parse::<SubscriptionId>().is_err());
        assert!("".parse::<SubscriptionId>().is_err());
    }

    #[test]
    fn test_subscription_id_deserializes_from_number_or_string() {
        let from_number: SubscriptionId = serde_json::from_str("1560").unwrap();
        let from_string: SubscriptionId = serde_json::from_str("\"1560\"").unwrap();
        assert_eq!(from_number, SubscriptionId(1560));
        assert_eq!(from_string, SubscriptionId(1560));
        assert_eq!(serde_json::to_string(&from_number).unwrap(), "1560");
    }

    #[test]
    fn test_selector() {
        // Well-known ERC-20 selector.
        assert_eq!(
            hex::encode(selector("transfer(address,uint256)")),
            "a9059cbb"
        );
    }

    #[test]
    fn test_constructor_args_order() {
        let args = sample_args().to_abi_args();

        assert_eq!(args.len(), 6);
        assert_eq!(args[0], AbiArg::Uint(U256::from(10_000_000_000_000_000u64)));
        assert_eq!(
            args[1],
            AbiArg::Address(address!("2Ca8E0C643bDe4C2E08ab1fA0da3401AdAD7734D"))
        );
        assert_eq!(args[2], AbiArg::Uint(U256::from(1560u64)));
        assert_eq!(args[3], AbiArg::Bytes32(B256::repeat_byte(0xab)));
        assert_eq!(args[4], AbiArg::Uint(U256::from(500_000u64)));
        assert_eq!(args[5], AbiArg::Uint(U256::from(30u64)));
    }

    #[test]
    fn test_constructor_args_encoding() {
        let encoded = hex::encode(sample_args().abi_encode());

        // Six static words.
        assert_eq!(encoded.len(), 6 * 64);
        assert_eq!(
            &encoded[0..64],
            "000000000000000000000000000000000000000000000000002386f26fc10000"
        );
        assert_eq!(
            &encoded[64..128],
            "0000000000000000000000002ca8e0c643bde4c2e08ab1fa0da3401adad7734d"
        );
        assert_eq!(
            &encoded[128..192],
            "0000000000000000000000000000000000000000000000000000000000000618"
        );
        assert_eq!(&encoded[192..256], "ab".repeat(32));
        assert_eq!(
            &encoded[256..320],
            "000000000000000000000000000000000000000000000000000000000007a120"
        );
        assert_eq!(
            &encoded[320..384],
            "000000000000000000000000000000000000000000000000000000000000001e"
        );
    }

    #[test]
    fn test_encode_call_prefixes_selector() {
        let data = encode_call(
            "fundSubscription(uint64,uint96)",
            &[AbiArg::Uint(U256::from(1u64)), AbiArg::Uint(U256::from(2u64))],
        );

        assert_eq!(data.len(), 4 + 2 * 32);
        assert_eq!(&data[..4], &selector("fundSubscription(uint64,uint96)"));
        assert_eq!(data[35], 1);
        assert_eq!(data[67], 2);
    }
}
