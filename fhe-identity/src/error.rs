//! Error types for the identity workflows.

use thiserror::Error;

use crate::chain::ChainError;
use crate::gateway::GatewayError;
use crate::scenario::ScenarioId;
use crate::types::{AttributeKey, CiphertextHandle};
use crate::wallet::WalletError;

/// Errors from connecting a session.
#[derive(Debug, Error)]
pub enum SessionError {
    /// The wallet granted access to no accounts
    #[error("Wallet returned no accounts")]
    NoAccounts,

    /// Wallet request failed
    #[error("Wallet error: {0}")]
    Wallet(#[from] WalletError),

    /// Gateway could not be initialized
    #[error("Gateway error: {0}")]
    Gateway(#[from] GatewayError),
}

/// Errors from the identity submission workflow.
#[derive(Debug, Error)]
pub enum SubmissionError {
    /// No wallet bound to the session
    #[error("Connect wallet first")]
    NoWallet,

    /// Plaintext input outside its domain
    #[error("{} {constraint}", .field.label())]
    Validation {
        field: AttributeKey,
        constraint: String,
    },

    /// Gateway failed to encrypt an attribute
    #[error("Encryption failed: {0}")]
    Encryption(#[source] GatewayError),

    /// Transaction submission or confirmation failed
    #[error("Transaction failed: {0}")]
    Chain(#[from] ChainError),
}

/// Errors while building or using a decryption authorization.
#[derive(Debug, Error)]
pub enum DecryptionError {
    /// Gateway refused or failed the decryption
    #[error("{0}")]
    Gateway(#[from] GatewayError),

    /// Wallet did not produce a signature
    #[error("Signature failed: {0}")]
    Signature(#[from] WalletError),

    /// Contract returned the zero handle
    #[error("No ciphertext stored for this value")]
    EmptyHandle,

    /// Gateway answered without the requested handle
    #[error("No decrypted value returned for {0}")]
    MissingResult(CiphertextHandle),
}

/// Errors from the access verification and reveal workflows.
#[derive(Debug, Error)]
pub enum VerificationError {
    /// No wallet bound to the session
    #[error("Please connect wallet first")]
    NoWallet,

    /// A check for this scenario is already running
    #[error("Verification already in progress for {0}")]
    InFlight(ScenarioId),

    /// Gateway could not be initialized
    #[error("Gateway not ready: {0}")]
    Gateway(#[source] GatewayError),

    /// Contract call failed
    #[error("Chain error: {0}")]
    Chain(#[from] ChainError),

    /// Decryption authorization or decryption failed
    #[error("Decryption failed: {0}")]
    Decryption(#[from] DecryptionError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_message() {
        let err = SubmissionError::Validation {
            field: AttributeKey::Age,
            constraint: "must be between 1 and 120".to_string(),
        };
        assert_eq!(err.to_string(), "Age must be between 1 and 120");
    }

    #[test]
    fn test_chain_error_wraps() {
        let err: VerificationError = ChainError::Transport("connection refused".into()).into();
        assert!(matches!(err, VerificationError::Chain(_)));
        assert!(err.to_string().contains("connection refused"));
    }
}
