//! Source verification on a block explorer.

use std::{fmt, future::Future};

use alloy_core::primitives::Address;
use serde::Serialize;

use crate::{DeployError, types::ConstructorArgs};

/// Outcome of the verification step of a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "reason", rename_all = "kebab-case")]
pub enum VerificationStatus {
    /// The network is not publicly verifiable.
    NotRequested,
    /// Verification was wanted but could not be attempted.
    Skipped(String),
    Verified,
    AlreadyVerified,
    /// The explorer rejected or failed the request. The deployment stands.
    Failed(String),
}

impl VerificationStatus {
    pub fn is_verified(&self) -> bool {
        matches!(self, Self::Verified | Self::AlreadyVerified)
    }
}

impl fmt::Display for VerificationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotRequested => write!(f, "not requested"),
            Self::Skipped(reason) => write!(f, "skipped ({})", reason),
            Self::Verified => write!(f, "verified"),
            Self::AlreadyVerified => write!(f, "already verified"),
            Self::Failed(reason) => write!(f, "failed ({})", reason),
        }
    }
}

/// Submits a deployed contract for source verification.
pub trait ContractVerifier: Send + Sync {
    /// Verify the contract at `address` deployed with `args`.
    ///
    /// Errors are [`DeployError::Verification`]; callers log them and carry on.
    fn verify(
        &self,
        address: Address,
        args: &ConstructorArgs,
    ) -> impl Future<Output = Result<VerificationStatus, DeployError>> + Send;
}
