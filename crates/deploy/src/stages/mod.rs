//! Deployment stages, in execution order.
//!
//! 1. [`mocks`]: deploy the VRF coordinator mock on networks without a live
//!    coordinator.
//! 2. [`subscription`]: resolve (or create and fund) the VRF subscription.
//! 3. [`raffle`]: deploy the raffle and submit it for verification.
//!
//! Each stage depends on the on-chain result of the previous one, so they
//! run strictly one after the other.

pub mod mocks;
pub mod raffle;
pub mod subscription;

use alloy_core::primitives::Address;
use serde::{Deserialize, Serialize};

use crate::config::{DeployConstants, NetworkProfile};

/// Tags selecting which stages of a run execute.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[strum(serialize_all = "kebab-case")]
#[serde(rename_all = "kebab-case")]
pub enum Tag {
    All,
    Mocks,
    Raffle,
}

/// Whether a stage carrying `stage_tags` runs when `requested` was asked for.
pub fn is_selected(stage_tags: &[Tag], requested: &[Tag]) -> bool {
    requested.iter().any(|tag| stage_tags.contains(tag))
}

/// Inputs shared by every stage of a run.
#[derive(Debug, Clone, Copy)]
pub struct StageContext<'a> {
    pub profile: &'a NetworkProfile,
    pub constants: &'a DeployConstants,
    /// Account sending every transaction of the run.
    pub deployer: Address,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_tag_parsing() {
        assert_eq!(Tag::from_str("all").unwrap(), Tag::All);
        assert_eq!(Tag::from_str("mocks").unwrap(), Tag::Mocks);
        assert_eq!(Tag::from_str("raffle").unwrap(), Tag::Raffle);
        assert!(Tag::from_str("verify").is_err());
        assert_eq!(Tag::Mocks.to_string(), "mocks");
    }

    #[test]
    fn test_stage_selection() {
        assert!(is_selected(mocks::TAGS, &[Tag::All]));
        assert!(is_selected(mocks::TAGS, &[Tag::Mocks]));
        assert!(!is_selected(mocks::TAGS, &[Tag::Raffle]));

        assert!(is_selected(raffle::TAGS, &[Tag::All]));
        assert!(is_selected(raffle::TAGS, &[Tag::Mocks, Tag::Raffle]));
        assert!(!is_selected(raffle::TAGS, &[Tag::Mocks]));
        assert!(!is_selected(raffle::TAGS, &[]));
    }
}
