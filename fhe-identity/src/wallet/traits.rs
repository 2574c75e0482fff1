//! Core trait for wallet signers.

use alloy::transports::TransportError;
use alloy_primitives::Address;
use async_trait::async_trait;

use crate::types::Eip712Payload;

/// Error types for wallet operations.
#[derive(Debug, thiserror::Error)]
pub enum WalletError {
    /// No wallet provider is reachable
    #[error("Wallet unavailable: {0}")]
    Unavailable(String),

    /// User or provider refused the request
    #[error("Request rejected: {0}")]
    Rejected(String),

    /// Signing was requested for an account the wallet does not hold
    #[error("Unknown account {0}")]
    UnknownAccount(Address),

    /// Provider returned a JSON-RPC error or malformed data
    #[error("Provider error: {0}")]
    Rpc(String),
}

impl From<TransportError> for WalletError {
    fn from(err: TransportError) -> Self {
        match err.as_error_resp() {
            // EIP-1193 user rejection
            Some(payload) if payload.code == 4001 => {
                WalletError::Rejected(payload.message.to_string())
            }
            Some(payload) => WalletError::Rpc(format!("{}: {}", payload.code, payload.message)),
            None if err.is_transport_error() => WalletError::Unavailable(err.to_string()),
            None => WalletError::Rpc(err.to_string()),
        }
    }
}

/// A wallet holding one or more accounts.
#[async_trait]
pub trait WalletSigner: Send + Sync {
    /// Ask for account access. The first account is the active one.
    async fn request_accounts(&self) -> Result<Vec<Address>, WalletError>;

    /// Sign EIP-712 typed data with `account`. Returns `0x`-prefixed hex.
    async fn sign_typed_data(
        &self,
        account: Address,
        payload: &Eip712Payload,
    ) -> Result<String, WalletError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::transports::TransportErrorKind;

    #[test]
    fn test_transport_failure_is_unavailable() {
        let err: WalletError = TransportErrorKind::custom_str("connection refused").into();
        assert!(matches!(err, WalletError::Unavailable(_)));
        assert!(err.to_string().contains("connection refused"));
    }
}
