//! Ethereum JSON-RPC chain client.
//!
//! Works with any node that signs for its unlocked accounts
//! (`eth_sendTransaction`), such as Hardhat, Anvil or a wallet bridge.

use alloy::network::ReceiptResponse;
use alloy::providers::{PendingTransactionError, Provider, RootProvider};
use alloy::rpc::client::RpcClient;
use alloy::rpc::types::{TransactionInput, TransactionRequest};
use alloy_primitives::{Address, Bytes};
use async_trait::async_trait;
use reqwest::Url;
use std::time::Duration;
use tracing::{debug, info, warn};

use super::traits::*;
use crate::config::IdentityConfig;

const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Chain client bound to one contract over JSON-RPC.
#[derive(Debug)]
pub struct JsonRpcChainClient {
    provider: RootProvider,
    contract: Address,
}

impl JsonRpcChainClient {
    /// Create a client for `contract` at `rpc_url`.
    pub fn new(rpc_url: &str, contract: Address) -> Result<Self, ChainError> {
        Self::with_poll_interval(rpc_url, contract, DEFAULT_POLL_INTERVAL)
    }

    /// Create a client that polls for receipts every `interval`.
    pub fn with_poll_interval(
        rpc_url: &str,
        contract: Address,
        interval: Duration,
    ) -> Result<Self, ChainError> {
        let url: Url = rpc_url
            .parse()
            .map_err(|e| ChainError::InvalidEndpoint(format!("{}: {}", rpc_url, e)))?;
        let client = RpcClient::new_http(url).with_poll_interval(interval);

        Ok(Self {
            provider: RootProvider::new(client),
            contract,
        })
    }

    /// Create a client from session configuration.
    pub fn from_config(config: &IdentityConfig) -> Result<Self, ChainError> {
        Self::with_poll_interval(
            &config.rpc_url,
            config.contract_address,
            config.receipt_poll_interval(),
        )
    }

    fn request(&self, from: Address, call: &ContractCall) -> TransactionRequest {
        TransactionRequest::default()
            .from(from)
            .to(self.contract)
            .input(TransactionInput::both(call.encode()))
    }
}

fn pending_error(err: PendingTransactionError) -> ChainError {
    match err {
        PendingTransactionError::TransportError(e) => e.into(),
        other => ChainError::Transport(other.to_string()),
    }
}

#[async_trait]
impl ChainClient for JsonRpcChainClient {
    fn contract_address(&self) -> Address {
        self.contract
    }

    async fn send(&self, from: Address, call: ContractCall) -> Result<TxReceipt, ChainError> {
        let method = call.method_name();
        let pending = self
            .provider
            .send_transaction(self.request(from, &call))
            .await?;

        info!(method, tx_hash = %pending.tx_hash(), "Transaction submitted");

        let receipt = pending.get_receipt().await.map_err(pending_error)?;
        let tx_hash = receipt.transaction_hash;

        if !receipt.status() {
            warn!(method, tx_hash = %tx_hash, "Transaction reverted");
            return Err(ChainError::Reverted { tx_hash });
        }

        let block_number = receipt.block_number.unwrap_or_default();
        debug!(method, block_number, "Transaction included");
        Ok(TxReceipt {
            tx_hash,
            block_number,
        })
    }

    async fn static_call(&self, from: Address, call: ContractCall) -> Result<Bytes, ChainError> {
        let output = self.provider.call(self.request(from, &call)).await?;

        debug!(method = call.method_name(), bytes = output.len(), "Static call returned");
        Ok(output)
    }
}
