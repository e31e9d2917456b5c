//! Error taxonomy of a deployment run.

/// Errors that abort (or, for verification, annotate) a deployment run.
#[derive(Debug, thiserror::Error)]
pub enum DeployError {
    /// Missing or invalid network configuration. Raised before any
    /// transaction is sent.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// A transaction reverted or the chain RPC failed.
    #[error("transaction error while {operation}: {message}")]
    Transaction {
        /// What the pipeline was doing, e.g. `creating subscription`.
        operation: &'static str,
        message: String,
    },

    /// The block explorer rejected or failed the verification request.
    /// Never propagated out of the pipeline.
    #[error("verification error: {0}")]
    Verification(String),
}

impl DeployError {
    pub fn config(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }

    /// Wrap a collaborator error, keeping its full context chain.
    pub fn transaction(operation: &'static str, err: anyhow::Error) -> Self {
        Self::Transaction {
            operation,
            message: format!("{:#}", err),
        }
    }

    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::Configuration(_))
    }

    pub fn is_transaction(&self) -> bool {
        matches!(self, Self::Transaction { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Context;

    #[test]
    fn test_transaction_error_keeps_context_chain() {
        let err = Err::<(), _>(anyhow::anyhow!("execution reverted"))
            .context("Failed to send createSubscription transaction")
            .unwrap_err();

        let err = DeployError::transaction("creating subscription", err);

        assert!(err.is_transaction());
        assert_eq!(
            err.to_string(),
            "transaction error while creating subscription: \
             Failed to send createSubscription transaction: execution reverted"
        );
    }

    #[test]
    fn test_configuration_error_display() {
        let err = DeployError::config("no network profile for chain id 42");
        assert!(err.is_configuration());
        assert_eq!(
            err.to_string(),
            "configuration error: no network profile for chain id 42"
        );
    }
}
