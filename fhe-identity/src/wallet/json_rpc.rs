//! JSON-RPC wallet signer.
//!
//! Talks to any EIP-1193 provider reachable over HTTP (a node with unlocked
//! accounts, or a wallet bridge).

use alloy::providers::{Provider, RootProvider};
use alloy_primitives::Address;
use async_trait::async_trait;
use reqwest::Url;
use tracing::debug;

use super::traits::*;
use crate::config::IdentityConfig;
use crate::types::Eip712Payload;

/// Wallet signer backed by `eth_requestAccounts` / `eth_signTypedData_v4`.
pub struct JsonRpcWallet {
    provider: RootProvider,
}

impl JsonRpcWallet {
    pub fn new(url: &str) -> Result<Self, WalletError> {
        let url: Url = url
            .parse()
            .map_err(|e| WalletError::Unavailable(format!("invalid provider URL {}: {}", url, e)))?;

        Ok(Self {
            provider: RootProvider::new_http(url),
        })
    }

    pub fn from_config(config: &IdentityConfig) -> Result<Self, WalletError> {
        Self::new(&config.rpc_url)
    }
}

#[async_trait]
impl WalletSigner for JsonRpcWallet {
    async fn request_accounts(&self) -> Result<Vec<Address>, WalletError> {
        let accounts: Vec<Address> = self
            .provider
            .raw_request("eth_requestAccounts".into(), ())
            .await?;

        debug!(count = accounts.len(), "Accounts granted");
        Ok(accounts)
    }

    async fn sign_typed_data(
        &self,
        account: Address,
        payload: &Eip712Payload,
    ) -> Result<String, WalletError> {
        // v4 takes the typed data as a JSON string
        let typed_data =
            serde_json::to_string(payload).map_err(|e| WalletError::Rpc(e.to_string()))?;

        let signature: String = self
            .provider
            .raw_request("eth_signTypedData_v4".into(), (account, typed_data))
            .await?;

        Ok(signature)
    }
}
